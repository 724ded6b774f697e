//! End-to-end coverage of the verifier-call canonicalisation pipeline.

use expect_test::expect;

use vcanon::callgraph::CallGraph;
use vcanon::error::Error;
use vcanon::ir::{
    CastKind, FnAttributes, FnSig, FunctionBuilder, Module, Operand, Rvalue, SourceLoc, Ty,
};
use vcanon::passes::promote_verifier::{ASSUME_SYMBOL, ERROR_SYMBOL, FAIL_SYMBOL};
use vcanon::{run_log, run_module_passes};

fn frontend_module() -> Module {
    let mut module = Module::default();
    module.get_or_insert_declaration(
        "__VERIFIER_assume",
        FnSig {
            params: vec![Ty::int(32)],
            ret: Ty::Unit,
        },
        FnAttributes::default(),
    );
    module.get_or_insert_declaration("__VERIFIER_error", FnSig::marker(), FnAttributes::default());
    module.get_or_insert_declaration("__SEAHORN_fail", FnSig::marker(), FnAttributes::default());
    module.get_or_insert_declaration("log_message", FnSig::marker(), FnAttributes::default());

    let mut main = FunctionBuilder::new(
        "main",
        FnSig {
            params: vec![Ty::int(32)],
            ret: Ty::Unit,
        },
    );
    main.call(Operand::func("__VERIFIER_assume"), vec![main.arg(0)], None);
    main.call_at(
        Operand::func("__VERIFIER_error"),
        Vec::new(),
        None,
        SourceLoc { line: 7, column: 5 },
    );
    main.call(Operand::func("__SEAHORN_fail"), Vec::new(), None);
    main.call(Operand::func("log_message"), Vec::new(), None);
    main.unreachable();
    module.push_function(main.finish());

    let mut helper = FunctionBuilder::new(
        "helper",
        FnSig {
            params: vec![Ty::BOOL],
            ret: Ty::Unit,
        },
    );
    let target = helper.local(Ty::Pointer);
    helper.assign(
        target,
        Rvalue::Cast {
            kind: CastKind::PointerCast,
            operand: Operand::func("__VERIFIER_assume"),
            source: Ty::func(vec![Ty::int(32)], Ty::Unit),
            target: Ty::Pointer,
        },
    );
    helper.call(Operand::Local(target), vec![helper.arg(0)], None);
    helper.ret();
    module.push_function(helper.finish());

    module
}

#[test]
fn canonicalises_a_frontend_module() {
    let mut module = frontend_module();
    let report = run_module_passes(&mut module, None).unwrap();
    assert!(report.changed());

    let rendered = vcanon::ir::format_module(&module);
    expect![[r#"
declare __VERIFIER_assume(i32)

declare __VERIFIER_error()

declare __SEAHORN_fail()

declare log_message()

fn main(_0: i32) {
  locals:
    _1: i1
  bb0:
    _1 = cmp ne _0, const 0i32
    call @verifier.assume(_1)
    call @verifier.error() // at 7:5
    call @verifier.fail()
    call @log_message()
    unreachable
}

fn helper(_0: i1) {
  locals:
    _1: ptr
  bb0:
    _1 = ptrcast @__VERIFIER_assume (fn(i32) to ptr)
    call @verifier.assume(_0)
    return
}

declare verifier.assume(i1)

declare verifier.assert(i1)

declare verifier.error()

declare verifier.fail() noreturn
"#]]
    .assert_eq(&rendered);
}

#[test]
fn a_second_pipeline_run_is_idempotent() {
    let mut module = frontend_module();
    run_module_passes(&mut module, None).unwrap();
    let first = vcanon::ir::format_module(&module);

    let report = run_module_passes(&mut module, None).unwrap();
    assert!(!report.changed());
    assert_eq!(vcanon::ir::format_module(&module), first);
}

#[test]
fn call_graph_follows_the_rewrites() {
    let mut module = frontend_module();
    let mut graph = CallGraph::from_module(&module);
    run_module_passes(&mut module, Some(&mut graph)).unwrap();

    let main = graph.node("main").unwrap();
    let helper = graph.node("helper").unwrap();
    for symbol in [ASSUME_SYMBOL, ERROR_SYMBOL, FAIL_SYMBOL] {
        let canonical = graph.node(symbol).unwrap();
        assert_eq!(graph.edge_count(main, canonical), 1, "main -> {symbol}");
    }
    // untouched call keeps its original edge
    let logger = graph.node("log_message").unwrap();
    assert_eq!(graph.edge_count(main, logger), 1);
    // the indirect call in helper resolved through the pointer cast
    let canonical_assume = graph.node(ASSUME_SYMBOL).unwrap();
    assert_eq!(graph.edge_count(helper, canonical_assume), 1);
    let original_assume = graph.node("__VERIFIER_assume").unwrap();
    assert_eq!(graph.edge_count(main, original_assume), 0);
    assert_eq!(graph.edge_count(helper, original_assume), 0);
}

#[test]
fn misplaced_failure_markers_fail_the_pipeline() {
    let mut module = Module::default();
    module.get_or_insert_declaration("__SEAHORN_fail", FnSig::marker(), FnAttributes::default());
    let mut helper = FunctionBuilder::new("helper", FnSig::marker());
    helper.call(Operand::func("__SEAHORN_fail"), Vec::new(), None);
    helper.ret();
    module.push_function(helper.finish());

    let err = run_module_passes(&mut module, None).unwrap_err();
    assert!(matches!(err, Error::Transform { .. }));
    assert!(
        err.to_string()
            .contains("__SEAHORN_fail can only be called from the main function")
    );
}

#[test]
fn run_log_records_the_executed_passes() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("run_log.json");
    run_log::enable(Some(path.clone()));

    let mut module = frontend_module();
    run_module_passes(&mut module, None).unwrap();
    run_log::reset();

    // sibling tests may run pipelines while recording is on, so the log
    // can hold more than our one event; every event is still this pass
    let log = run_log::read_log(&path).unwrap();
    assert_eq!(log.version, run_log::RUN_LOG_VERSION);
    assert!(!log.passes.is_empty());
    assert!(log.passes.iter().all(|event| event.pass == "promote-verifier-calls"));
    assert!(log.passes.iter().any(|event| event.changed));
}
