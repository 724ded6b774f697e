//! Module-pass execution harness.
//!
//! Hosts hand a module (and optionally its call graph) to
//! `run_module_passes`; the harness verifies the module, runs each
//! registered pass in order, and reports what changed.

use std::time::{Duration, Instant};

use tracing::{debug, error, info};

use crate::callgraph::CallGraph;
use crate::error::Result;
use crate::ir::{Module, verify_module};
use crate::passes::promote_verifier_calls;
use crate::run_log;

/// Outcome of one executed pass.
#[derive(Debug, Clone)]
pub struct PassReport {
    pub pass: &'static str,
    pub changed: bool,
    pub duration: Duration,
}

/// Outcome of one pipeline run.
#[derive(Debug, Clone, Default)]
pub struct PipelineReport {
    pub passes: Vec<PassReport>,
}

impl PipelineReport {
    #[must_use]
    pub fn changed(&self) -> bool {
        self.passes.iter().any(|pass| pass.changed)
    }
}

/// Verify `module`, then run every module pass over it in order.
pub fn run_module_passes(
    module: &mut Module,
    mut graph: Option<&mut CallGraph>,
) -> Result<PipelineReport> {
    verify_module(module)?;
    let mut report = PipelineReport::default();
    run_pass(
        &mut report,
        "promote-verifier-calls",
        module,
        graph.as_deref_mut(),
        promote_verifier_calls,
    )?;
    Ok(report)
}

fn run_pass(
    report: &mut PipelineReport,
    pass: &'static str,
    module: &mut Module,
    graph: Option<&mut CallGraph>,
    run: fn(&mut Module, Option<&mut CallGraph>) -> Result<bool>,
) -> Result<()> {
    info!(pass, "running module pass");
    let start = Instant::now();
    let changed = match run(module, graph) {
        Ok(changed) => changed,
        Err(err) => {
            error!(pass, %err, "module pass failed");
            return Err(err);
        }
    };
    let duration = start.elapsed();
    run_log::record_pass(pass, changed, duration);
    debug!(pass, changed, "module pass finished");
    report.passes.push(PassReport {
        pass,
        changed,
        duration,
    });
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::Error;
    use crate::ir::{FnSig, FunctionBuilder, Operand, Ty};

    #[test]
    fn reports_the_executed_passes() {
        let mut module = Module::default();
        let mut builder = FunctionBuilder::new(
            "main",
            FnSig {
                params: vec![Ty::BOOL],
                ret: Ty::Unit,
            },
        );
        builder.call(Operand::func("__VERIFIER_assume"), vec![builder.arg(0)], None);
        builder.ret();
        module.push_function(builder.finish());

        let report = run_module_passes(&mut module, None).unwrap();
        assert_eq!(report.passes.len(), 1);
        assert_eq!(report.passes[0].pass, "promote-verifier-calls");
        assert!(report.changed());
    }

    #[test]
    fn malformed_modules_are_rejected_before_any_pass() {
        let mut module = Module::default();
        // body without a terminator
        let builder = FunctionBuilder::new("main", FnSig::marker());
        module.push_function(builder.finish());

        let err = run_module_passes(&mut module, None).unwrap_err();
        assert!(matches!(err, Error::Verify(_)));
    }

    #[test]
    fn clean_modules_report_no_changes() {
        let mut module = Module::default();
        let mut builder = FunctionBuilder::new("main", FnSig::marker());
        builder.ret();
        module.push_function(builder.finish());

        let report = run_module_passes(&mut module, None).unwrap();
        assert!(!report.changed());
    }
}
