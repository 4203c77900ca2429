//! Post-error recovery with the bundled compiler program.
//!
//! A failed compile must leave the compiler ready: the next request on the
//! same instance behaves exactly as on a freshly loaded compiler.

use quill_lua::{Compiler, EngineHandle, EngineOptions};
use quill_types::{CompileRequest, ErrorCode, Target};

const BROKEN: &str = "<h1>hi world!</h1></h1>";
const VALID: &str = "<h1>hi world!</h1>";
const UNCLOSED_MESSAGE: &str = "attempted to close an element that was not open";

fn fresh() -> Compiler {
    quill_lua::load().expect("bundled compiler should load")
}

fn req(source: &str) -> CompileRequest {
    CompileRequest::new("App.quill", source)
}

// ─── Core invariant ─────────────────────────────────────────────────

#[test]
fn ssr_recovers_after_invalid_closing_tag() {
    let mut compiler = fresh();

    let err = compiler.compile_ssr(&req(BROKEN)).expect_err("broken template must fail");
    assert!(err.message.contains(UNCLOSED_MESSAGE), "got {}", err.message);
    assert!(err.snippet.contains("<h1>hi world!</h1></h1"), "got {}", err.snippet);
    assert!(err.is_recoverable());

    let ok = compiler.compile_ssr(&req(VALID)).expect("next request must succeed");
    assert!(ok.code.contains("hi world!"));
}

#[test]
fn dom_recovers_after_invalid_closing_tag() {
    let mut compiler = fresh();

    let err = compiler.compile_dom(&req(BROKEN)).expect_err("broken template must fail");
    assert!(err.message.contains(UNCLOSED_MESSAGE));

    let ok = compiler.compile_dom(&req(VALID)).expect("next request must succeed");
    assert!(ok.code.contains("hi world!"));
}

#[test]
fn recovered_output_equals_fresh_output() {
    let mut reused = fresh();
    let _ = reused.compile_ssr(&req(BROKEN));
    let _ = reused.compile_dom(&req(BROKEN));

    for target in Target::all() {
        let recovered = reused.compile(target, &req(VALID)).expect("recovered compile");
        let baseline = fresh().compile(target, &req(VALID)).expect("fresh compile");
        assert_eq!(recovered, baseline, "{target} output differs after recovery");
    }
    assert_eq!(reused.recoveries(), 2);
}

#[test]
fn resubmitting_failure_fails_identically() {
    let mut compiler = fresh();
    let first = compiler.compile_ssr(&req(BROKEN)).expect_err("first attempt");
    let second = compiler.compile_ssr(&req(BROKEN)).expect_err("second attempt");
    assert_eq!(first, second);

    let on_fresh = fresh().compile_ssr(&req(BROKEN)).expect_err("fresh attempt");
    assert_eq!(first, on_fresh);
}

#[test]
fn cross_target_recovery() {
    let mut compiler = fresh();
    compiler.compile_ssr(&req(BROKEN)).expect_err("ssr fails");
    let dom = compiler.compile_dom(&req(VALID)).expect("dom succeeds");
    assert!(dom.code.contains("create_fragment"));
}

#[test]
fn many_alternating_failures() {
    let mut compiler = fresh();
    let baseline = fresh().compile_ssr(&req(VALID)).expect("baseline");

    for round in 0..25 {
        compiler.compile_ssr(&req(BROKEN)).expect_err("broken fails");
        let ok = compiler.compile_ssr(&req(VALID)).expect("valid succeeds");
        assert_eq!(ok, baseline, "round {round}");
    }
    assert!(compiler.is_available());
}

#[test]
fn every_diagnostic_kind_recovers() {
    let cases = [
        ("</div>", "invalid-closing-tag"),
        ("<div><p></div>", "unclosed-element"),
        ("<div>", "unclosed-element"),
        ("<br></br>", "void-element-closing"),
        ("<1a>", "invalid-tag-name"),
        ("<p>{name</p>", "unclosed-mustache"),
        ("<!-- open", "unclosed-comment"),
        ("<p>{a + b}</p>", "invalid-expression"),
        (r#"<p class="a" class="b"></p>"#, "duplicate-attribute"),
        (r#"<p class="a></p>"#, "invalid-attribute"),
    ];

    let mut compiler = fresh();
    for (source, kind) in cases {
        let err = compiler.compile_dom(&req(source)).expect_err(source);
        assert_eq!(err.kind.as_deref(), Some(kind), "source {source:?}: {err}");
        assert!(!err.snippet.is_empty(), "source {source:?} has no frame");
        assert!(err.location.is_some(), "source {source:?} has no location");

        compiler.compile_dom(&req(VALID)).expect("valid after failure");
    }
}

// ─── Mutual exclusivity and determinism ─────────────────────────────

#[test]
fn success_and_failure_are_exclusive() {
    let mut compiler = fresh();
    for source in [VALID, BROKEN, "", "<p>{x}</p>", "<p"] {
        let result = compiler.compile_ssr(&req(source));
        match result {
            Ok(ok) => assert!(!ok.code.is_empty(), "empty success for {source:?}"),
            Err(err) => assert!(!err.message.is_empty(), "empty error for {source:?}"),
        }
    }
}

#[test]
fn deterministic_across_calls_and_handles() {
    let source = r#"<section class="card"><h2>{title}</h2><p>{user.name}</p></section>"#;
    let mut a = fresh();
    let mut b = fresh();

    let first = a.compile_dom(&req(source)).expect("compile");
    let second = a.compile_dom(&req(source)).expect("compile");
    let other = b.compile_dom(&req(source)).expect("compile");
    assert_eq!(first, second);
    assert_eq!(first, other);
}

#[test]
fn ssr_and_dom_outputs_differ() {
    let mut compiler = fresh();
    let ssr = compiler.compile_ssr(&req(VALID)).expect("ssr");
    let dom = compiler.compile_dom(&req(VALID)).expect("dom");

    assert_ne!(ssr.code, dom.code);
    assert!(ssr.code.contains("create_ssr_component"));
    assert!(!ssr.code.contains("create_fragment"));
    assert!(dom.code.contains("create_fragment"));
    assert!(!dom.code.contains("create_ssr_component"));
}

#[test]
fn filename_only_affects_diagnostics() {
    let mut compiler = fresh();
    let a = compiler
        .compile_ssr(&CompileRequest::new("A.quill", VALID))
        .expect("compile");
    let b = compiler
        .compile_ssr(&CompileRequest::new("nested/B.quill", VALID))
        .expect("compile");
    assert_eq!(a, b);

    let err = compiler
        .compile_ssr(&CompileRequest::new("nested/B.quill", BROKEN))
        .expect_err("should fail");
    assert_eq!(err.filename, "nested/B.quill");
    assert!(err.to_string().starts_with("nested/B.quill:1:19: "));
}

#[test]
fn memory_limited_engine_still_compiles() {
    let engine = EngineHandle::start(EngineOptions::default().with_memory_limit(16 * 1024 * 1024))
        .expect("engine should start");
    let mut compiler = Compiler::bundled(engine).expect("should load");
    compiler.compile_ssr(&req(BROKEN)).expect_err("broken fails");
    compiler.compile_ssr(&req(VALID)).expect("valid succeeds");
}
