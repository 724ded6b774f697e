//! Mid-level IR data structures, construction, and verification.

mod body;
mod builder;
mod defs;
mod module;
mod pretty;
mod types;
mod verify;

pub use body::{
    BasicBlock, BlockId, Body, Call, CastKind, CmpOp, ConstValue, IntConst, LocalDecl, LocalId,
    Operand, Rvalue, SourceLoc, Statement, StatementKind, Terminator,
};
pub use builder::FunctionBuilder;
pub use defs::LocalDefs;
pub use module::{FnAttributes, FnSig, FuncId, Function, Module};
pub use pretty::format_module;
pub use types::{FnTy, IntTy, Ty};
pub use verify::{VerifyError, VerifyReport, verify_function, verify_module};
