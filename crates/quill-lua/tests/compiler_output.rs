//! Output shape of the bundled template compiler.

use quill_lua::Compiler;
use quill_types::{CompileError, CompileOptions, CompileRequest, Location};

fn compiler() -> Compiler {
    quill_lua::load().expect("bundled compiler should load")
}

fn ssr(source: &str) -> String {
    compiler()
        .compile_ssr(&CompileRequest::new("Out.quill", source))
        .expect("ssr compile")
        .code
}

fn dom(source: &str) -> String {
    compiler()
        .compile_dom(&CompileRequest::new("Out.quill", source))
        .expect("dom compile")
        .code
}

fn ssr_err(source: &str) -> CompileError {
    compiler()
        .compile_ssr(&CompileRequest::new("Out.quill", source))
        .expect_err("ssr compile should fail")
}

// ─── SSR ────────────────────────────────────────────────────────────

#[test]
fn ssr_static_markup() {
    let code = ssr("<h1>hi world!</h1>");
    assert_eq!(
        code,
        concat!(
            "import { create_ssr_component } from \"quill/internal\";\n",
            "\n",
            "const Component = create_ssr_component(($$result, $$props, $$bindings, slots) => {\n",
            "\treturn `<h1>hi world!</h1>`;\n",
            "});\n",
            "\n",
            "export default Component;\n",
        )
    );
}

#[test]
fn ssr_interpolation_escapes_and_destructures_props() {
    let code = ssr(r#"<p title="Hi {user.name}">{greeting}, {user.name}</p>"#);
    assert!(code.contains("import { create_ssr_component, escape } from \"quill/internal\";"));
    assert!(code.contains("\tlet { user, greeting } = $$props;"));
    assert!(code.contains(r#"title="Hi ${escape(user.name, true)}""#));
    assert!(code.contains("${escape(greeting)}, ${escape(user.name)}"));
}

#[test]
fn ssr_void_and_self_closing_elements() {
    let code = ssr(r#"<div><br/><img src="a.png"><span /></div>"#);
    assert!(code.contains(r#"<div><br><img src="a.png"><span></span></div>"#), "got {code}");
}

#[test]
fn ssr_drops_comments_and_trims_root_whitespace() {
    let code = ssr("\n  <!-- note -->\n<p>x</p>\n\n");
    assert!(code.contains("return `<p>x</p>`;"), "got {code}");
    assert!(!code.contains("note"));
}

#[test]
fn ssr_escapes_template_literal_syntax() {
    let code = ssr("<p>`$x` \\ done</p>");
    assert!(code.contains(r"<p>\`$x\` \\ done</p>"), "got {code}");
}

#[test]
fn ssr_boolean_attribute() {
    let code = ssr("<input disabled>");
    assert!(code.contains("return `<input disabled>`;"), "got {code}");
}

#[test]
fn reserved_words_and_runtime_names_are_rejected_as_roots() {
    for source in ["<p>{class}</p>", "<p>{escape}</p>", "<p title={this.x}></p>", "<p>{slots}</p>"] {
        let err = ssr_err(source);
        assert_eq!(err.kind.as_deref(), Some("invalid-expression"), "{source}");
        assert!(err.message.contains("reserved"), "got {}", err.message);
    }
}

#[test]
fn reserved_words_are_fine_after_the_root() {
    let code = ssr("<p>{post.class}</p>");
    assert!(code.contains("\tlet { post } = $$props;"), "got {code}");
    assert!(code.contains("${escape(post.class)}"));
}

// ─── DOM ────────────────────────────────────────────────────────────

#[test]
fn dom_static_markup() {
    let code = dom("<h1>hi world!</h1>");
    assert_eq!(
        code,
        concat!(
            "import {\n",
            "\tQuillComponent,\n",
            "\tappend,\n",
            "\tdetach,\n",
            "\telement,\n",
            "\tinit,\n",
            "\tinsert,\n",
            "\tnoop,\n",
            "\tsafe_not_equal,\n",
            "\ttext\n",
            "} from \"quill/internal\";\n",
            "\n",
            "function create_fragment(ctx) {\n",
            "\tlet h1;\n",
            "\tlet t;\n",
            "\n",
            "\treturn {\n",
            "\t\tc() {\n",
            "\t\t\th1 = element(\"h1\");\n",
            "\t\t\tt = text(\"hi world!\");\n",
            "\t\t},\n",
            "\t\tm(target, anchor) {\n",
            "\t\t\tinsert(target, h1, anchor);\n",
            "\t\t\tappend(h1, t);\n",
            "\t\t},\n",
            "\t\tp: noop,\n",
            "\t\ti: noop,\n",
            "\t\to: noop,\n",
            "\t\td(detaching) {\n",
            "\t\t\tif (detaching) detach(h1);\n",
            "\t\t}\n",
            "\t};\n",
            "}\n",
            "\n",
            "class Component extends QuillComponent {\n",
            "\tconstructor(options) {\n",
            "\t\tsuper();\n",
            "\t\tinit(this, options, null, create_fragment, safe_not_equal, {});\n",
            "\t}\n",
            "}\n",
            "\n",
            "export default Component;\n",
        )
    );
}

#[test]
fn dom_dynamic_text_and_attributes() {
    let code = dom(r#"<a href="/u/{id}">{name}</a>"#);
    assert!(code.contains("let t_value = /*name*/ ctx[1] + \"\";"), "got {code}");
    assert!(code.contains("attr(a, \"href\", a_href_value = \"/u/\" + /*id*/ ctx[0]);"));
    assert!(code.contains("p(ctx, [dirty]) {"));
    assert!(code.contains(
        "if (dirty & /*name*/ 2 && t_value !== (t_value = /*name*/ ctx[1] + \"\")) set_data(t, t_value);"
    ));
    assert!(code.contains("function instance($$self, $$props, $$invalidate) {"));
    assert!(code.contains("init(this, options, instance, create_fragment, safe_not_equal, { id: 0, name: 1 });"));
}

#[test]
fn dom_dirty_masks_split_into_words_past_31_props() {
    let mut source = String::from("<p>");
    for i in 0..66 {
        source.push_str(&format!("{{v{i}}}"));
    }
    source.push_str(r#"</p><a title="{v0} {v40}">x</a>"#);

    let code = dom(&source);
    assert!(code.contains("p(ctx, dirty) {"), "got {code}");
    assert!(code.contains("if (dirty[0] & /*v0*/ 1 && "));
    assert!(code.contains("if (dirty[0] & /*v30*/ 1073741824 && "));
    assert!(code.contains("if (dirty[1] & /*v31*/ 1 && "));
    assert!(code.contains("if (dirty[1] & /*v32*/ 2 && "));
    assert!(code.contains("if (dirty[2] & /*v64*/ 4 && "));
    assert!(code.contains("if ((dirty[0] & /*v0*/ 1 || dirty[1] & /*v40*/ 512) && "));
    assert!(!code.contains("4294967296"));
    assert!(!code.contains("*/ 0 &&"));
}

#[test]
fn dom_keeps_single_word_mask_up_to_31_props() {
    let source: String = (0..31).map(|i| format!("{{v{i}}}")).collect();
    let code = dom(&source);
    assert!(code.contains("p(ctx, [dirty]) {"), "got {code}");
    assert!(code.contains("if (dirty & /*v30*/ 1073741824 && "));
}

#[test]
fn dom_numbers_repeated_element_names() {
    let code = dom("<ul><li>a</li><li>b</li></ul>");
    assert!(code.contains("li0 = element(\"li\");"));
    assert!(code.contains("li1 = element(\"li\");"));
    assert!(code.contains("append(ul, li0);"));
    assert!(code.contains("t0 = text(\"a\");"));
    assert!(code.contains("t1 = text(\"b\");"));
}

#[test]
fn dom_whitespace_between_elements_becomes_space() {
    let code = dom("<p>a</p> <p>b</p>");
    assert!(code.contains("= space();"), "got {code}");
}

#[test]
fn dom_avoids_shadowing_runtime_helpers() {
    let code = dom("<svg><text>label</text></svg>");
    assert!(code.contains("text_ = element(\"text\");"), "got {code}");
}

#[test]
fn dom_decodes_entities_in_text() {
    let code = dom("<p>a &amp; b &#60;</p>");
    assert!(code.contains(r#"text("a & b <")"#), "got {code}");
}

#[test]
fn dom_leaves_surrogate_references_undecoded() {
    let code = dom("<p>&#xD800; &#55296; &#x41;</p>");
    assert!(code.contains(r#"text("&#xD800; &#55296; A")"#), "got {code}");
}

#[test]
fn empty_template_compiles() {
    let code = dom("   ");
    assert!(code.contains("\t\tc: noop,"));
    assert!(code.contains("\t\td: noop\n"));
}

// ─── Options and diagnostics ────────────────────────────────────────

#[test]
fn dev_banner_does_not_mention_filename() {
    let mut compiler = compiler().with_options(CompileOptions::dev());
    let code = compiler
        .compile_dom(&CompileRequest::new("Secret.quill", "<p>x</p>"))
        .expect("compile")
        .code;
    assert!(code.starts_with("/* quill "));
    assert!(code.contains("dom dev build"));
    assert!(!code.contains("Secret"));
}

#[test]
fn multi_line_frame_points_at_offending_column() {
    let source = "<main>\n  <p>one</p>\n  </div>\n</main>";
    let err = compiler()
        .compile_ssr(&CompileRequest::new("Frame.quill", source))
        .expect_err("should fail");

    assert_eq!(err.location, Some(Location::new(3, 3)));
    assert_eq!(
        err.snippet,
        "1: <main>\n2:   <p>one</p>\n3:   </div>\n     ^\n4: </main>"
    );
}

#[test]
fn column_counts_characters_not_bytes() {
    let err = ssr_err("<p>ééé</h1>");
    assert_eq!(err.location, Some(Location::new(1, 7)));
    assert_eq!(err.snippet, "1: <p>ééé</h1>\n         ^");
}
