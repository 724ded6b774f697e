//! Structural well-formedness checks for modules.

use std::collections::HashSet;
use std::fmt;

use super::body::{BlockId, Body, LocalId, Operand, Rvalue, StatementKind, Terminator};
use super::module::{Function, Module};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum VerifyError {
    DuplicateSymbol {
        function: String,
    },
    UnknownLocal {
        function: String,
        local: LocalId,
    },
    Reassigned {
        function: String,
        local: LocalId,
    },
    MissingTerminator {
        function: String,
        block: BlockId,
    },
    BadTarget {
        function: String,
        block: BlockId,
        target: BlockId,
    },
}

impl fmt::Display for VerifyError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            VerifyError::DuplicateSymbol { function } => {
                write!(f, "module defines symbol {function} more than once")
            }
            VerifyError::UnknownLocal { function, local } => {
                write!(
                    f,
                    "function {function}: reference to unknown local _{}",
                    local.0
                )
            }
            VerifyError::Reassigned { function, local } => {
                write!(
                    f,
                    "function {function}: local _{} assigned more than once",
                    local.0
                )
            }
            VerifyError::MissingTerminator { function, block } => {
                write!(f, "function {function}: bb{} has no terminator", block.0)
            }
            VerifyError::BadTarget {
                function,
                block,
                target,
            } => {
                write!(
                    f,
                    "function {function}: bb{} jumps to missing bb{}",
                    block.0, target.0
                )
            }
        }
    }
}

/// All structural errors found in one module.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VerifyReport {
    pub errors: Vec<VerifyError>,
}

impl fmt::Display for VerifyReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.errors.as_slice() {
            [] => f.write_str("module verification failed"),
            [only] => write!(f, "{only}"),
            [first, rest @ ..] => write!(f, "{first} (+{} more)", rest.len()),
        }
    }
}

impl std::error::Error for VerifyReport {}

/// Check the whole module; `Err` carries every violation found.
pub fn verify_module(module: &Module) -> Result<(), VerifyReport> {
    let mut errors = Vec::new();
    let mut seen = HashSet::new();
    for function in &module.functions {
        if !seen.insert(function.name.as_str()) {
            errors.push(VerifyError::DuplicateSymbol {
                function: function.name.clone(),
            });
        }
    }
    for function in &module.functions {
        verify_function(function, &mut errors);
    }
    if errors.is_empty() {
        Ok(())
    } else {
        Err(VerifyReport { errors })
    }
}

/// Check one function, appending violations to `errors`. Declarations
/// are vacuously well-formed.
pub fn verify_function(function: &Function, errors: &mut Vec<VerifyError>) {
    let Some(body) = &function.body else {
        return;
    };
    // parameters count as assigned on entry
    let mut assigned: HashSet<LocalId> = (0..body.arg_count).map(LocalId).collect();
    for block in &body.blocks {
        for statement in &block.statements {
            match &statement.kind {
                StatementKind::Assign { dest, value } => {
                    check_dest(&function.name, body, *dest, &mut assigned, errors);
                    check_rvalue(&function.name, body, value, errors);
                }
                StatementKind::Call(call) => {
                    check_operand(&function.name, body, &call.callee, errors);
                    for arg in &call.args {
                        check_operand(&function.name, body, arg, errors);
                    }
                    if let Some(dest) = call.dest {
                        check_dest(&function.name, body, dest, &mut assigned, errors);
                    }
                }
                StatementKind::Nop => {}
            }
        }
        match block.terminator {
            None => errors.push(VerifyError::MissingTerminator {
                function: function.name.clone(),
                block: block.id,
            }),
            Some(Terminator::Goto { target }) => {
                if target.0 >= body.blocks.len() {
                    errors.push(VerifyError::BadTarget {
                        function: function.name.clone(),
                        block: block.id,
                        target,
                    });
                }
            }
            Some(Terminator::Return | Terminator::Unreachable) => {}
        }
    }
}

fn check_dest(
    function: &str,
    body: &Body,
    dest: LocalId,
    assigned: &mut HashSet<LocalId>,
    errors: &mut Vec<VerifyError>,
) {
    if body.local(dest).is_none() {
        errors.push(VerifyError::UnknownLocal {
            function: function.to_string(),
            local: dest,
        });
        return;
    }
    if !assigned.insert(dest) {
        errors.push(VerifyError::Reassigned {
            function: function.to_string(),
            local: dest,
        });
    }
}

fn check_rvalue(function: &str, body: &Body, rvalue: &Rvalue, errors: &mut Vec<VerifyError>) {
    match rvalue {
        Rvalue::Use(operand) | Rvalue::Cast { operand, .. } => {
            check_operand(function, body, operand, errors);
        }
        Rvalue::Cmp { lhs, rhs, .. } => {
            check_operand(function, body, lhs, errors);
            check_operand(function, body, rhs, errors);
        }
    }
}

fn check_operand(function: &str, body: &Body, operand: &Operand, errors: &mut Vec<VerifyError>) {
    if let Operand::Local(local) = operand {
        if body.local(*local).is_none() {
            errors.push(VerifyError::UnknownLocal {
                function: function.to_string(),
                local: *local,
            });
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ir::{FnSig, FunctionBuilder, Operand, Rvalue, Ty};

    #[test]
    fn clean_modules_verify() {
        let mut module = Module::default();
        let mut builder = FunctionBuilder::new(
            "main",
            FnSig {
                params: vec![Ty::int(32)],
                ret: Ty::Unit,
            },
        );
        let copy = builder.local(Ty::int(32));
        builder.assign(copy, Rvalue::Use(builder.arg(0)));
        builder.ret();
        module.push_function(builder.finish());

        assert!(verify_module(&module).is_ok());
    }

    #[test]
    fn reassignment_is_flagged() {
        let mut module = Module::default();
        let mut builder = FunctionBuilder::new("f", FnSig::marker());
        let slot = builder.local(Ty::BOOL);
        builder.assign(slot, Rvalue::Use(Operand::int(1, 0)));
        builder.assign(slot, Rvalue::Use(Operand::int(1, 1)));
        builder.ret();
        module.push_function(builder.finish());

        let report = verify_module(&module).unwrap_err();
        assert_eq!(
            report.errors,
            vec![VerifyError::Reassigned {
                function: "f".to_string(),
                local: slot,
            }]
        );
    }

    #[test]
    fn unknown_locals_and_missing_terminators_are_flagged() {
        let mut module = Module::default();
        let mut builder = FunctionBuilder::new("f", FnSig::marker());
        builder.call(
            Operand::func("g"),
            vec![Operand::Local(crate::ir::LocalId(7))],
            None,
        );
        module.push_function(builder.finish());

        let report = verify_module(&module).unwrap_err();
        assert_eq!(report.errors.len(), 2);
        assert!(matches!(
            report.errors[0],
            VerifyError::UnknownLocal { local, .. } if local.0 == 7
        ));
        assert!(matches!(
            report.errors[1],
            VerifyError::MissingTerminator { .. }
        ));
    }

    #[test]
    fn goto_targets_must_exist() {
        let mut module = Module::default();
        let mut builder = FunctionBuilder::new("f", FnSig::marker());
        builder.goto(BlockId(5));
        module.push_function(builder.finish());

        let report = verify_module(&module).unwrap_err();
        assert_eq!(
            report.errors,
            vec![VerifyError::BadTarget {
                function: "f".to_string(),
                block: BlockId(0),
                target: BlockId(5),
            }]
        );
    }

    #[test]
    fn duplicate_symbols_are_flagged() {
        let mut module = Module::default();
        module.push_function(FunctionBuilder::new("f", FnSig::marker()).finish());
        module.push_function(FunctionBuilder::new("f", FnSig::marker()).finish());

        let report = verify_module(&module).unwrap_err();
        assert!(matches!(
            report.errors.first(),
            Some(VerifyError::DuplicateSymbol { .. })
        ));
        // report text leads with the first error
        assert!(report.to_string().contains("more than once"));
    }
}
