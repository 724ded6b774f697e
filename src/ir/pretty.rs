use std::fmt::Write;

use super::body::{
    Body, CastKind, CmpOp, ConstValue, Operand, Rvalue, Statement, StatementKind, Terminator,
};
use super::module::{Function, Module};
use super::types::Ty;

/// Render a module into a deterministic human-readable string.
#[must_use]
pub fn format_module(module: &Module) -> String {
    let items: Vec<String> = module.functions.iter().map(format_function).collect();
    let mut out = items.join("\n\n");
    out.push('\n');
    out
}

fn format_function(function: &Function) -> String {
    match &function.body {
        None => format_declaration(function),
        Some(body) => format_definition(function, body),
    }
}

fn format_declaration(function: &Function) -> String {
    let params: Vec<String> = function
        .signature
        .params
        .iter()
        .map(ToString::to_string)
        .collect();
    let mut line = format!("declare {}({})", function.name, params.join(", "));
    if function.signature.ret != Ty::Unit {
        let _ = write!(line, " -> {}", function.signature.ret);
    }
    if function.attributes.no_return {
        line.push_str(" noreturn");
    }
    if function.attributes.read_none {
        line.push_str(" readnone");
    }
    line
}

fn format_definition(function: &Function, body: &Body) -> String {
    let params: Vec<String> = body
        .locals
        .iter()
        .take(body.arg_count)
        .enumerate()
        .map(|(index, local)| format!("_{index}: {}", local.ty))
        .collect();
    let mut out = format!("fn {}({})", function.name, params.join(", "));
    if function.signature.ret != Ty::Unit {
        let _ = write!(out, " -> {}", function.signature.ret);
    }
    out.push_str(" {\n");

    if body.locals.len() > body.arg_count {
        out.push_str("  locals:\n");
        for (index, local) in body.locals.iter().enumerate().skip(body.arg_count) {
            let _ = writeln!(out, "    _{index}: {}", local.ty);
        }
    }

    for block in &body.blocks {
        let _ = writeln!(out, "  bb{}:", block.id.0);
        for statement in &block.statements {
            let _ = writeln!(out, "    {}", format_statement(statement));
        }
        match &block.terminator {
            Some(terminator) => {
                let _ = writeln!(out, "    {}", format_terminator(terminator));
            }
            None => out.push_str("    // no terminator\n"),
        }
    }

    out.push('}');
    out
}

fn format_statement(statement: &Statement) -> String {
    let text = match &statement.kind {
        StatementKind::Assign { dest, value } => {
            format!("_{} = {}", dest.0, format_rvalue(value))
        }
        StatementKind::Call(call) => {
            let args: Vec<String> = call.args.iter().map(format_operand).collect();
            let callee = format_operand(&call.callee);
            match call.dest {
                Some(dest) => format!("_{} = call {}({})", dest.0, callee, args.join(", ")),
                None => format!("call {}({})", callee, args.join(", ")),
            }
        }
        StatementKind::Nop => "nop".to_string(),
    };
    match statement.loc {
        Some(loc) => format!("{text} // at {}:{}", loc.line, loc.column),
        None => text,
    }
}

fn format_rvalue(rvalue: &Rvalue) -> String {
    match rvalue {
        Rvalue::Use(operand) => format_operand(operand),
        Rvalue::Cast {
            kind,
            operand,
            source,
            target,
        } => {
            let keyword = match kind {
                CastKind::ZeroExtend => "zext",
                CastKind::SignExtend => "sext",
                CastKind::Truncate => "trunc",
                CastKind::PointerCast => "ptrcast",
            };
            format!("{keyword} {} ({source} to {target})", format_operand(operand))
        }
        Rvalue::Cmp { op, lhs, rhs } => {
            let keyword = match op {
                CmpOp::Eq => "eq",
                CmpOp::Ne => "ne",
            };
            format!(
                "cmp {keyword} {}, {}",
                format_operand(lhs),
                format_operand(rhs)
            )
        }
    }
}

fn format_operand(operand: &Operand) -> String {
    match operand {
        Operand::Local(local) => format!("_{}", local.0),
        Operand::Const(ConstValue::Int(int)) => format!("const {}i{}", int.value, int.bits),
        Operand::Const(ConstValue::Null) => "const null".to_string(),
        Operand::Func(name) => format!("@{name}"),
    }
}

fn format_terminator(terminator: &Terminator) -> String {
    match terminator {
        Terminator::Return => "return".to_string(),
        Terminator::Goto { target } => format!("goto bb{}", target.0),
        Terminator::Unreachable => "unreachable".to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ir::{BlockId, FnAttributes, FnSig, FunctionBuilder, SourceLoc};
    use expect_test::expect;

    #[test]
    fn renders_declarations_and_definitions() {
        let mut module = Module::default();
        module.get_or_insert_declaration(
            "check",
            FnSig {
                params: vec![Ty::BOOL],
                ret: Ty::Unit,
            },
            FnAttributes::default(),
        );
        module.get_or_insert_declaration(
            "halt",
            FnSig::marker(),
            FnAttributes {
                no_return: true,
                read_none: false,
            },
        );

        let mut builder = FunctionBuilder::new(
            "main",
            FnSig {
                params: vec![Ty::int(32)],
                ret: Ty::int(32),
            },
        );
        let flag = builder.local(Ty::BOOL);
        builder.assign(
            flag,
            Rvalue::Cmp {
                op: CmpOp::Ne,
                lhs: builder.arg(0),
                rhs: Operand::int(32, 0),
            },
        );
        builder.call_at(
            Operand::func("check"),
            vec![Operand::Local(flag)],
            None,
            SourceLoc { line: 3, column: 5 },
        );
        builder.goto(BlockId(1));
        builder.block();
        builder.call(Operand::func("halt"), Vec::new(), None);
        builder.unreachable();
        module.push_function(builder.finish());

        let rendered = format_module(&module);
        expect![[r#"
declare check(i1)

declare halt() noreturn

fn main(_0: i32) -> i32 {
  locals:
    _1: i1
  bb0:
    _1 = cmp ne _0, const 0i32
    call @check(_1) // at 3:5
    goto bb1
  bb1:
    call @halt()
    unreachable
}
"#]]
        .assert_eq(&rendered);
    }
}
