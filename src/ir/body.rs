use super::types::Ty;

/// Index of a basic block within a function body.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct BlockId(pub usize);

/// Index of a local slot within a function body. The first
/// `Body::arg_count` locals are the function parameters.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct LocalId(pub usize);

/// Source position carried by statements for diagnostic traceability.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SourceLoc {
    pub line: u32,
    pub column: u32,
}

/// A function body: declared locals plus an ordered list of basic blocks.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Body {
    pub arg_count: usize,
    pub locals: Vec<LocalDecl>,
    pub blocks: Vec<BasicBlock>,
}

impl Body {
    #[must_use]
    pub fn local(&self, id: LocalId) -> Option<&LocalDecl> {
        self.locals.get(id.0)
    }

    pub fn push_local(&mut self, decl: LocalDecl) -> LocalId {
        let id = LocalId(self.locals.len());
        self.locals.push(decl);
        id
    }

    /// Type of an operand in the context of this body. Function symbols
    /// carry no type without the enclosing module, so they resolve to
    /// `None`, as do references to missing locals.
    #[must_use]
    pub fn operand_ty(&self, operand: &Operand) -> Option<Ty> {
        match operand {
            Operand::Local(local) => self.local(*local).map(|decl| decl.ty.clone()),
            Operand::Const(value) => Some(value.ty()),
            Operand::Func(_) => None,
        }
    }
}

/// Declaration of a local slot.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LocalDecl {
    pub name: Option<String>,
    pub ty: Ty,
}

impl LocalDecl {
    #[must_use]
    pub fn new(name: Option<String>, ty: Ty) -> Self {
        Self { name, ty }
    }

    #[must_use]
    pub fn temp(ty: Ty) -> Self {
        Self { name: None, ty }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BasicBlock {
    pub id: BlockId,
    pub statements: Vec<Statement>,
    pub terminator: Option<Terminator>,
}

impl BasicBlock {
    #[must_use]
    pub fn new(id: BlockId) -> Self {
        Self {
            id,
            statements: Vec::new(),
            terminator: None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Statement {
    pub kind: StatementKind,
    pub loc: Option<SourceLoc>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StatementKind {
    Assign { dest: LocalId, value: Rvalue },
    Call(Call),
    Nop,
}

/// A call site. The callee is an operand: either a function symbol
/// directly, or a local whose defining rvalue chain leads to one through
/// pointer casts.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Call {
    pub callee: Operand,
    pub args: Vec<Operand>,
    pub dest: Option<LocalId>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Rvalue {
    Use(Operand),
    Cast {
        kind: CastKind,
        operand: Operand,
        source: Ty,
        target: Ty,
    },
    Cmp {
        op: CmpOp,
        lhs: Operand,
        rhs: Operand,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CastKind {
    ZeroExtend,
    SignExtend,
    Truncate,
    PointerCast,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CmpOp {
    Eq,
    Ne,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Operand {
    Local(LocalId),
    Const(ConstValue),
    Func(String),
}

impl Operand {
    #[must_use]
    pub fn func(name: &str) -> Self {
        Self::Func(name.to_string())
    }

    #[must_use]
    pub fn int(bits: u32, value: i128) -> Self {
        Self::Const(ConstValue::Int(IntConst { bits, value }))
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConstValue {
    Int(IntConst),
    Null,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct IntConst {
    pub bits: u32,
    pub value: i128,
}

impl ConstValue {
    /// The zero value of `ty`, when one exists. Unit and function types
    /// have no zero, which makes them ineligible for the "compare against
    /// zero" boolean normalisation.
    #[must_use]
    pub fn zero(ty: &Ty) -> Option<Self> {
        match ty {
            Ty::Int(int) => Some(Self::Int(IntConst {
                bits: int.bits,
                value: 0,
            })),
            Ty::Pointer => Some(Self::Null),
            Ty::Unit | Ty::Fn(_) => None,
        }
    }

    #[must_use]
    pub fn ty(&self) -> Ty {
        match self {
            Self::Int(int) => Ty::int(int.bits),
            Self::Null => Ty::Pointer,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Terminator {
    Return,
    Goto { target: BlockId },
    Unreachable,
}
