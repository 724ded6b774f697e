use std::collections::HashMap;

use super::body::{Body, CastKind, LocalId, Operand, Rvalue, StatementKind};

/// Index of defining rvalues for the locals of one body.
///
/// Bodies are expected to be single-assignment (`verify` flags violations);
/// when a local is assigned more than once anyway, the first definition
/// wins and resolution stays deterministic.
pub struct LocalDefs<'a> {
    defs: HashMap<LocalId, &'a Rvalue>,
    step_limit: usize,
}

impl<'a> LocalDefs<'a> {
    #[must_use]
    pub fn collect(body: &'a Body) -> Self {
        let mut defs = HashMap::new();
        for block in &body.blocks {
            for statement in &block.statements {
                if let StatementKind::Assign { dest, value } = &statement.kind {
                    defs.entry(*dest).or_insert(value);
                }
            }
        }
        Self {
            defs,
            step_limit: body.locals.len() + 1,
        }
    }

    #[must_use]
    pub fn rvalue(&self, local: LocalId) -> Option<&'a Rvalue> {
        self.defs.get(&local).copied()
    }

    /// Strip pointer-cast wrappers from a callee operand and resolve it to
    /// a named function, if any. Pure: inspects defining rvalues only,
    /// never mutates the body.
    #[must_use]
    pub fn resolved_callee(&self, callee: &'a Operand) -> Option<&'a str> {
        let mut current = callee;
        // step cap guards against self-referential defs in malformed bodies
        for _ in 0..self.step_limit {
            match current {
                Operand::Func(name) => return Some(name),
                Operand::Local(local) => match self.rvalue(*local)? {
                    Rvalue::Cast {
                        kind: CastKind::PointerCast,
                        operand,
                        ..
                    } => current = operand,
                    _ => return None,
                },
                Operand::Const(_) => return None,
            }
        }
        None
    }
}
