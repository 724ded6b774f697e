//! Incremental construction of function bodies.

use super::body::{
    BasicBlock, BlockId, Body, Call, LocalDecl, LocalId, Operand, Rvalue, SourceLoc, Statement,
    StatementKind, Terminator,
};
use super::module::{FnAttributes, FnSig, Function};
use super::types::Ty;

/// Builds one function: parameters become the leading locals, statements
/// are appended to the currently selected block.
pub struct FunctionBuilder {
    name: String,
    signature: FnSig,
    attributes: FnAttributes,
    body: Body,
    current: BlockId,
}

impl FunctionBuilder {
    #[must_use]
    pub fn new(name: &str, signature: FnSig) -> Self {
        let mut body = Body {
            arg_count: signature.params.len(),
            locals: Vec::new(),
            blocks: Vec::new(),
        };
        for ty in &signature.params {
            body.locals.push(LocalDecl::temp(ty.clone()));
        }
        body.blocks.push(BasicBlock::new(BlockId(0)));
        Self {
            name: name.to_string(),
            signature,
            attributes: FnAttributes::default(),
            body,
            current: BlockId(0),
        }
    }

    #[must_use]
    pub fn attributes(mut self, attributes: FnAttributes) -> Self {
        self.attributes = attributes;
        self
    }

    /// Operand referring to parameter `index`.
    #[must_use]
    pub fn arg(&self, index: usize) -> Operand {
        Operand::Local(LocalId(index))
    }

    pub fn local(&mut self, ty: Ty) -> LocalId {
        self.body.push_local(LocalDecl::temp(ty))
    }

    /// Append a fresh block and select it for subsequent statements.
    pub fn block(&mut self) -> BlockId {
        let id = BlockId(self.body.blocks.len());
        self.body.blocks.push(BasicBlock::new(id));
        self.current = id;
        id
    }

    pub fn push(&mut self, kind: StatementKind, loc: Option<SourceLoc>) {
        if let Some(block) = self.body.blocks.get_mut(self.current.0) {
            block.statements.push(Statement { kind, loc });
        }
    }

    pub fn assign(&mut self, dest: LocalId, value: Rvalue) {
        self.push(StatementKind::Assign { dest, value }, None);
    }

    pub fn call(&mut self, callee: Operand, args: Vec<Operand>, dest: Option<LocalId>) {
        self.push(StatementKind::Call(Call { callee, args, dest }), None);
    }

    pub fn call_at(
        &mut self,
        callee: Operand,
        args: Vec<Operand>,
        dest: Option<LocalId>,
        loc: SourceLoc,
    ) {
        self.push(StatementKind::Call(Call { callee, args, dest }), Some(loc));
    }

    pub fn terminate(&mut self, terminator: Terminator) {
        if let Some(block) = self.body.blocks.get_mut(self.current.0) {
            block.terminator = Some(terminator);
        }
    }

    pub fn ret(&mut self) {
        self.terminate(Terminator::Return);
    }

    pub fn goto(&mut self, target: BlockId) {
        self.terminate(Terminator::Goto { target });
    }

    pub fn unreachable(&mut self) {
        self.terminate(Terminator::Unreachable);
    }

    #[must_use]
    pub fn finish(self) -> Function {
        Function {
            name: self.name,
            signature: self.signature,
            attributes: self.attributes,
            body: Some(self.body),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parameters_become_leading_locals() {
        let builder = FunctionBuilder::new(
            "f",
            FnSig {
                params: vec![Ty::int(32), Ty::BOOL],
                ret: Ty::Unit,
            },
        );
        let function = builder.finish();
        let body = function.body.unwrap();

        assert_eq!(body.arg_count, 2);
        assert_eq!(body.locals.len(), 2);
        assert_eq!(body.locals[0].ty, Ty::int(32));
        assert_eq!(body.locals[1].ty, Ty::BOOL);
        assert_eq!(body.blocks.len(), 1);
    }

    #[test]
    fn statements_land_in_the_selected_block() {
        let mut builder = FunctionBuilder::new("f", FnSig::marker());
        builder.call(Operand::func("first"), Vec::new(), None);
        let next = builder.block();
        builder.call(Operand::func("second"), Vec::new(), None);
        builder.ret();
        let function = builder.finish();
        let body = function.body.unwrap();

        assert_eq!(body.blocks[0].statements.len(), 1);
        assert_eq!(body.blocks[next.0].statements.len(), 1);
        assert_eq!(body.blocks[next.0].terminator, Some(Terminator::Return));
    }
}
