//! Canonicalisation of verifier marker calls.
//!
//! Verification frontends mark assumptions, errors, and failure points by
//! calling loosely-named helper functions with whatever argument types the
//! source language produced. This pass rewrites every recognised marker
//! call into one of four canonical intrinsic calls with a normalised
//! boolean argument, keeps the call graph in step, and removes the
//! original calls. Unrecognised call sites are left byte-for-byte
//! untouched.

use tracing::debug;

use crate::callgraph::CallGraph;
use crate::error::{Error, Result};
use crate::ir::{
    Call, CastKind, CmpOp, ConstValue, FnAttributes, FnSig, FuncId, LocalDecl, LocalDefs, Module,
    Operand, Rvalue, SourceLoc, Statement, StatementKind, Ty,
};

pub const ASSUME_SYMBOL: &str = "verifier.assume";
pub const ASSERT_SYMBOL: &str = "verifier.assert";
pub const ERROR_SYMBOL: &str = "verifier.error";
pub const FAIL_SYMBOL: &str = "verifier.fail";

/// The only function allowed to contain failure markers.
pub const ENTRY_FUNCTION: &str = "main";

/// Handle to one canonical intrinsic declaration.
#[derive(Debug, Clone, Copy)]
pub struct IntrinsicDecl {
    pub id: FuncId,
    pub symbol: &'static str,
}

/// The four canonical intrinsic declarations of one module, created up
/// front and threaded through every per-function rewrite.
#[derive(Debug, Clone, Copy)]
pub struct VerifierIntrinsics {
    pub assume: IntrinsicDecl,
    pub assert: IntrinsicDecl,
    pub error: IntrinsicDecl,
    pub fail: IntrinsicDecl,
}

impl VerifierIntrinsics {
    /// Ensure the four declarations exist in `module`, reusing any that a
    /// previous run (or the frontend) already inserted, and register a
    /// call-graph node for each when a graph is supplied.
    pub fn declare(module: &mut Module, graph: Option<&mut CallGraph>) -> Self {
        let condition = FnSig {
            params: vec![Ty::BOOL],
            ret: Ty::Unit,
        };
        let assume = IntrinsicDecl {
            id: module.get_or_insert_declaration(
                ASSUME_SYMBOL,
                condition.clone(),
                FnAttributes::default(),
            ),
            symbol: ASSUME_SYMBOL,
        };
        let assert = IntrinsicDecl {
            id: module.get_or_insert_declaration(ASSERT_SYMBOL, condition, FnAttributes::default()),
            symbol: ASSERT_SYMBOL,
        };
        let error = IntrinsicDecl {
            id: module.get_or_insert_declaration(
                ERROR_SYMBOL,
                FnSig::marker(),
                FnAttributes::default(),
            ),
            symbol: ERROR_SYMBOL,
        };
        // no-return so downstream passes can prune what follows a failure,
        // but never read-none: optimisers are entitled to delete a
        // no-return function that also has no side effects
        let fail = IntrinsicDecl {
            id: module.get_or_insert_declaration(
                FAIL_SYMBOL,
                FnSig::marker(),
                FnAttributes {
                    no_return: true,
                    read_none: false,
                },
            ),
            symbol: FAIL_SYMBOL,
        };
        if let Some(graph) = graph {
            for decl in [&assume, &assert, &error, &fail] {
                graph.get_or_insert(decl.symbol);
            }
        }
        Self {
            assume,
            assert,
            error,
            fail,
        }
    }
}

/// Canonical rewrite targets. The assertion intrinsic is declared for the
/// downstream vocabulary but no table entry currently produces it: the one
/// assert-spelling frontends ever emitted ships disabled and folds into
/// the assumption target instead.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum CanonicalTarget {
    Assume,
    Error,
    Fail,
}

/// Exact-name classification of a callee against the recognition table.
fn classify(callee: &str) -> Option<CanonicalTarget> {
    match callee {
        // assumption markers, including embedded invariants
        "__VERIFIER_assume" | "llvm.invariant" | "pagai.invariant" => {
            Some(CanonicalTarget::Assume)
        }
        // legacy assertion alias, shipped disabled
        "DISABLED__VERIFIER_assert" => Some(CanonicalTarget::Assume),
        "__VERIFIER_error" => Some(CanonicalTarget::Error),
        // native spelling plus a legacy bounded-model-checker alias
        "__SEAHORN_fail" | "__llbmc_assert" => Some(CanonicalTarget::Fail),
        _ => None,
    }
}

struct Planned {
    block: usize,
    stmt: usize,
    action: Action,
    callee: String,
    loc: Option<SourceLoc>,
}

enum Action {
    /// Insert a canonical assumption call on `cond`; when `compare_zero`
    /// is present, `cond` is not `i1` and a fresh `cond != 0` compare is
    /// materialised first.
    Assume {
        cond: Operand,
        compare_zero: Option<ConstValue>,
    },
    Error,
    Fail,
}

/// Run the whole pass over one module: declare the intrinsics, then
/// rewrite every function. Returns whether anything changed.
pub fn promote_verifier_calls(module: &mut Module, mut graph: Option<&mut CallGraph>) -> Result<bool> {
    debug!("promoting verifier marker calls");
    let intrinsics = VerifierIntrinsics::declare(module, graph.as_deref_mut());
    let mut changed = false;
    for index in 0..module.functions.len() {
        changed |= promote_function(module, FuncId(index), &intrinsics, graph.as_deref_mut())?;
    }
    Ok(changed)
}

/// Rewrite the marker calls of one function. Returns whether the function
/// was modified; an `Err` means a failure marker was found outside the
/// entry function and the module-level run must stop.
pub fn promote_function(
    module: &mut Module,
    function: FuncId,
    intrinsics: &VerifierIntrinsics,
    mut graph: Option<&mut CallGraph>,
) -> Result<bool> {
    let is_entry = module.function_index(ENTRY_FUNCTION) == Some(function);

    let Some(func) = module.function(function) else {
        return Ok(false);
    };
    let Some(body) = func.body.as_ref() else {
        return Ok(false);
    };

    let mut planned: Vec<Planned> = Vec::new();
    let mut violation: Option<String> = None;
    let defs = LocalDefs::collect(body);
    'scan: for (block_index, block) in body.blocks.iter().enumerate() {
        for (stmt_index, statement) in block.statements.iter().enumerate() {
            let StatementKind::Call(call) = &statement.kind else {
                continue;
            };
            let Some(callee) = defs.resolved_callee(&call.callee) else {
                continue;
            };
            let Some(target) = classify(callee) else {
                continue;
            };
            let action = match target {
                CanonicalTarget::Assume => {
                    let Some(argument) = call.args.first() else {
                        debug!(callee, "marker call carries no condition; leaving untouched");
                        continue;
                    };
                    let cond = strip_bool_widening(&defs, argument);
                    let Some(ty) = body.operand_ty(cond) else {
                        debug!(callee, "condition type unknown; leaving untouched");
                        continue;
                    };
                    let compare_zero = if ty.is_bool() {
                        None
                    } else {
                        match ConstValue::zero(&ty) {
                            Some(zero) => Some(zero),
                            None => {
                                debug!(callee, %ty, "condition type has no zero; leaving untouched");
                                continue;
                            }
                        }
                    };
                    Action::Assume {
                        cond: cond.clone(),
                        compare_zero,
                    }
                }
                CanonicalTarget::Error => Action::Error,
                CanonicalTarget::Fail => {
                    if !is_entry {
                        violation = Some(callee.to_string());
                        break 'scan;
                    }
                    Action::Fail
                }
            };
            planned.push(Planned {
                block: block_index,
                stmt: stmt_index,
                action,
                callee: callee.to_string(),
                loc: statement.loc,
            });
        }
    }

    if planned.is_empty() && violation.is_none() {
        return Ok(false);
    }

    // On a location violation the sites already planned keep their new
    // canonical calls but the originals stay in place: the abort is
    // best-effort, not transactional.
    let keep_originals = violation.is_some();

    let Some(func) = module.function_mut(function) else {
        return Ok(false);
    };
    let caller = func.name.clone();
    let Some(body) = func.body.as_mut() else {
        return Ok(false);
    };

    let mut changed = false;
    // apply in reverse program order so recorded positions stay valid
    for rewrite in planned.iter().rev() {
        let mut replacement: Vec<Statement> = Vec::with_capacity(2);
        let canonical = match &rewrite.action {
            Action::Assume { cond, compare_zero } => {
                let cond = match compare_zero {
                    Some(zero) => {
                        let fresh = body.push_local(LocalDecl::temp(Ty::BOOL));
                        replacement.push(Statement {
                            kind: StatementKind::Assign {
                                dest: fresh,
                                value: Rvalue::Cmp {
                                    op: CmpOp::Ne,
                                    lhs: cond.clone(),
                                    rhs: Operand::Const(zero.clone()),
                                },
                            },
                            loc: None,
                        });
                        Operand::Local(fresh)
                    }
                    None => cond.clone(),
                };
                replacement.push(call_statement(intrinsics.assume.symbol, vec![cond], None));
                intrinsics.assume.symbol
            }
            Action::Error => {
                replacement.push(call_statement(
                    intrinsics.error.symbol,
                    Vec::new(),
                    rewrite.loc,
                ));
                intrinsics.error.symbol
            }
            Action::Fail => {
                replacement.push(call_statement(intrinsics.fail.symbol, Vec::new(), None));
                intrinsics.fail.symbol
            }
        };

        let Some(block) = body.blocks.get_mut(rewrite.block) else {
            continue;
        };
        if !keep_originals {
            block.statements.remove(rewrite.stmt);
        }
        for statement in replacement.into_iter().rev() {
            block.statements.insert(rewrite.stmt, statement);
        }

        if let Some(graph) = graph.as_deref_mut() {
            let caller_node = graph.get_or_insert(&caller);
            let callee_node = graph.get_or_insert(canonical);
            graph.add_edge(caller_node, callee_node);
            if !keep_originals {
                if let Some(original) = graph.node(&rewrite.callee) {
                    graph.remove_edge(caller_node, original);
                }
            }
        }
        changed = true;
    }

    if let Some(callee) = violation {
        return Err(Error::transform(format!(
            "{callee} can only be called from the {ENTRY_FUNCTION} function"
        )));
    }
    Ok(changed)
}

/// Undo the frontend idiom of widening a boolean before passing it: when
/// the operand is a local defined by a zero-extension out of `i1`, the
/// pre-widened value is used directly.
fn strip_bool_widening<'a>(defs: &LocalDefs<'a>, operand: &'a Operand) -> &'a Operand {
    if let Operand::Local(local) = operand {
        if let Some(Rvalue::Cast {
            kind: CastKind::ZeroExtend,
            operand: inner,
            source,
            ..
        }) = defs.rvalue(*local)
        {
            if source.is_bool() {
                return inner;
            }
        }
    }
    operand
}

fn call_statement(symbol: &str, args: Vec<Operand>, loc: Option<SourceLoc>) -> Statement {
    Statement {
        kind: StatementKind::Call(Call {
            callee: Operand::Func(symbol.to_string()),
            args,
            dest: None,
        }),
        loc,
    }
}
