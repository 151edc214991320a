//! Block and inline scanner behaviour with stub code transformers.

use mdjsx_transpiler::parser::block::embedded_block;
use mdjsx_transpiler::parser::inline::embedded_inline;
use mdjsx_transpiler::parser::{BlockState, InlineState};
use mdjsx_transpiler::{
    CodeTransformer, CreateElementTransformer, JsxTagGrammar, MarkdownParser, Nesting, Options,
    Pipeline, TokenType, TransformError,
};

fn parser_with(transformer: impl CodeTransformer + 'static) -> MarkdownParser {
    MarkdownParser::new(Options::default(), Box::new(JsxTagGrammar::new()), Box::new(transformer))
}

fn reject_all(_: &str) -> Result<String, TransformError> {
    Err(TransformError::new("rejected"))
}

fn accept_all(source: &str) -> Result<String, TransformError> {
    Ok(format!("markup({})", serde_json::Value::from(source.trim())))
}

/// Accepts exactly `<Foo a="1">...</Foo>`.
fn foo_only(source: &str) -> Result<String, TransformError> {
    let body = source
        .trim()
        .strip_prefix("<Foo a=\"1\">")
        .and_then(|rest| rest.strip_suffix("</Foo>"))
        .ok_or_else(|| TransformError::new("not a Foo element"))?;
    Ok(format!("Foo({{a: \"1\"}}, {});", serde_json::Value::from(body.trim())))
}

/// Accepts spans whose `<Box>` and `</Box>` tags balance.
fn balanced_boxes(source: &str) -> Result<String, TransformError> {
    let opens = source.matches("<Box>").count();
    let closes = source.matches("</Box>").count();
    if opens == closes {
        Ok(format!("Box({})", opens))
    } else {
        Err(TransformError::new(format!("{} opens, {} closes", opens, closes)))
    }
}

/// Brace expressions become their inner text.
fn braces_raw(source: &str) -> Result<String, TransformError> {
    source
        .strip_prefix('{')
        .and_then(|rest| rest.strip_suffix('}'))
        .map(str::to_string)
        .ok_or_else(|| TransformError::new("not an expression"))
}

// === Block scanner ===

#[test]
fn block_spans_open_body_and_close() {
    let md = parser_with(foo_only);
    let tokens = md.parse("<Foo a=\"1\">\nhello\n</Foo>\n");

    assert_eq!(tokens.len(), 1);
    assert_eq!(tokens[0].kind, TokenType::EmbeddedBlock);
    assert_eq!(tokens[0].map, Some((0, 3)));
    assert_eq!(tokens[0].content, "Foo({a: \"1\"}, \"hello\")");
}

#[test]
fn block_rendered_verbatim() {
    let pipeline = Pipeline::custom(
        Options::default(),
        Box::new(JsxTagGrammar::new()),
        Box::new(foo_only),
    );
    let rendered = pipeline.compile("<Foo a=\"1\">\nhello\n</Foo>\n");
    assert_eq!(rendered.code, "Foo({a: \"1\"}, \"hello\")");
    assert!(rendered.tags.is_empty());
}

#[test]
fn self_closing_block_is_one_line() {
    let md = parser_with(accept_all);
    let tokens = md.parse("<Divider />\ntext after\n");

    assert_eq!(tokens[0].kind, TokenType::EmbeddedBlock);
    assert_eq!(tokens[0].map, Some((0, 1)));
    assert_eq!(tokens[0].content, "markup(\"<Divider />\")");
    assert_eq!(tokens[1].kind, TokenType::ParagraphOpen);
}

#[test]
fn nested_same_name_block_resolved_by_transform() {
    // The inner `</Box>` is tried first; it fails to transform, so the scan
    // continues to the outer one.
    let md = parser_with(balanced_boxes);
    let tokens = md.parse("<Box>\n<Box>\ninner\n</Box>\n</Box>\n");

    assert_eq!(tokens.len(), 1);
    assert_eq!(tokens[0].map, Some((0, 5)));
    assert_eq!(tokens[0].content, "Box(2)");
}

#[test]
fn nested_same_name_block_with_permissive_transform_closes_early() {
    // A transformer that accepts the inner span wins over nesting: the block
    // ends at the first close tag and the outer `</Box>` is left as text.
    let md = parser_with(accept_all);
    let tokens = md.parse("<Box>\n<Box>\ninner\n</Box>\n</Box>\n");

    assert_eq!(tokens[0].kind, TokenType::EmbeddedBlock);
    assert_eq!(tokens[0].map, Some((0, 4)));
    assert_eq!(tokens[1].kind, TokenType::ParagraphOpen);
    assert_eq!(tokens[2].children[0].content, "</Box>");
}

#[test]
fn nested_same_name_block_with_real_transformer() {
    let md = parser_with(CreateElementTransformer::new());
    let tokens = md.parse("<Box>\n<Box>\ninner\n</Box>\n</Box>\n");

    assert_eq!(tokens.len(), 1);
    assert_eq!(tokens[0].map, Some((0, 5)));
    assert!(tokens[0].content.starts_with("createElement(\n  Box,"));
}

#[test]
fn sibling_blocks_of_the_same_name() {
    let md = parser_with(balanced_boxes);
    let tokens = md.parse("<Box>\na\n</Box>\n<Box>\nb\n</Box>\n");

    let maps: Vec<_> = tokens.iter().map(|t| t.map).collect();
    assert_eq!(maps, vec![Some((0, 3)), Some((3, 6))]);
}

#[test]
fn unclosed_block_falls_back_to_whole_slice() {
    let md = parser_with(accept_all);
    let tokens = md.parse("<Panel>\none\ntwo\n");

    assert_eq!(tokens.len(), 1);
    assert_eq!(tokens[0].map, Some((0, 3)));
    assert_eq!(tokens[0].content, "markup(\"<Panel>\\none\\ntwo\")");
}

#[test]
fn failed_block_leaves_state_untouched() {
    let md = parser_with(reject_all);
    let src = "<Foo>\nbody\n</Foo>\n";
    let mut state = BlockState::new(src, &md);
    let end = state.line_max;

    assert!(!embedded_block(&mut state, 0, end, false));
    assert_eq!(state.line, 0);
    assert!(state.tokens.is_empty());

    // The lines become an ordinary paragraph instead
    let tokens = md.parse(src);
    assert_eq!(tokens[0].kind, TokenType::ParagraphOpen);
}

#[test]
fn block_silent_mode_only_checks_the_open_tag() {
    let md = parser_with(reject_all);
    let mut state = BlockState::new("<Foo>\n", &md);
    let end = state.line_max;

    assert!(embedded_block(&mut state, 0, end, true));
    assert_eq!(state.line, 0);
    assert!(state.tokens.is_empty());
}

#[test]
fn block_requires_tag_at_line_start() {
    let md = parser_with(accept_all);
    let mut state = BlockState::new("text <Foo />\n", &md);
    let end = state.line_max;
    assert!(!embedded_block(&mut state, 0, end, false));

    let mut state = BlockState::new("< Foo />\n", &md);
    assert!(!embedded_block(&mut state, 0, end, false));
}

#[test]
fn block_interrupts_a_paragraph() {
    let md = parser_with(accept_all);
    let tokens = md.parse("Some text\n<Note />\n");

    let kinds: Vec<_> = tokens.iter().map(|t| t.kind).collect();
    assert_eq!(
        kinds,
        vec![
            TokenType::ParagraphOpen,
            TokenType::Inline,
            TokenType::ParagraphClose,
            TokenType::EmbeddedBlock,
        ]
    );
}

#[test]
fn block_stops_at_outdented_line_inside_list() {
    let md = parser_with(accept_all);
    let tokens = md.parse("- <Card>\n  body\nafter\n");

    let block = tokens
        .iter()
        .find(|t| t.kind == TokenType::EmbeddedBlock)
        .expect("embedded block inside the list item");
    assert_eq!(block.content, "markup(\"<Card>\\nbody\")");
}

// === Inline scanner ===

#[test]
fn brace_expression_is_one_token() {
    let md = parser_with(braces_raw);
    let tokens = md.parse_inline("{x}");

    assert_eq!(tokens.len(), 1);
    assert_eq!(tokens[0].kind, TokenType::EmbeddedInline);
    assert_eq!(tokens[0].nesting, Nesting::SelfClosing);
    assert_eq!(tokens[0].content, "x");
}

#[test]
fn brace_expression_renders_unquoted() {
    let pipeline = Pipeline::custom(
        Options::default(),
        Box::new(JsxTagGrammar::new()),
        Box::new(braces_raw),
    );
    assert_eq!(pipeline.compile("{x}").code, "p({},\n  x,\n)");
}

#[test]
fn self_closing_inline_advances_by_match_length() {
    let md = parser_with(accept_all);
    let src = "ab <Foo a={1} />!";
    let mut state = InlineState::new(src, &md);
    state.pos = 3;

    assert!(embedded_inline(&mut state, false));
    assert_eq!(state.pos, 3 + "<Foo a={1} />".len());
    assert_eq!(state.tokens.len(), 1);
    assert_eq!(state.tokens[0].content, "markup(\"<Foo a={1} />\")");
}

#[test]
fn silent_inline_match_pushes_nothing() {
    let md = parser_with(accept_all);
    let mut state = InlineState::new("<Foo />", &md);

    assert!(embedded_inline(&mut state, true));
    assert_eq!(state.pos, 7);
    assert!(state.tokens.is_empty());
}

#[test]
fn failed_inline_restores_cursor() {
    let cases = [
        // transform failure
        (parser_with(reject_all), "<B>x</B> tail"),
        // close tag never found
        (parser_with(accept_all), "<B>x tail"),
        // grammar mismatch
        (parser_with(accept_all), "<1>x</1>"),
        // invalid second character
        (parser_with(accept_all), "< B>"),
    ];

    for (md, src) in &cases {
        let mut state = InlineState::new(src, md);
        let max = state.pos_max;
        assert!(!embedded_inline(&mut state, false), "{:?} should not match", src);
        assert_eq!(state.pos, 0, "{:?}", src);
        assert_eq!(state.pos_max, max, "{:?}", src);
        assert!(state.tokens.is_empty(), "{:?}", src);
    }
}

#[test]
fn paired_inline_splits_closing_character() {
    let md = parser_with(CreateElementTransformer::new());
    let tokens = md.parse_inline("Press <Kbd>Ctrl</Kbd> now");

    let summary: Vec<_> = tokens
        .iter()
        .map(|t| (t.kind, t.nesting, t.content.as_str()))
        .collect();
    assert_eq!(
        summary,
        vec![
            (TokenType::Text, Nesting::SelfClosing, "Press "),
            (TokenType::EmbeddedInline, Nesting::Opening, "createElement(Kbd, null"),
            (TokenType::Text, Nesting::SelfClosing, "Ctrl"),
            (TokenType::EmbeddedInline, Nesting::Closing, ")"),
            (TokenType::Text, Nesting::SelfClosing, " now"),
        ]
    );
}

#[test]
fn paired_inline_body_is_parsed_as_markdown() {
    let md = parser_with(CreateElementTransformer::new());
    let tokens = md.parse_inline("<Tip>a *b* <Kbd>c</Kbd></Tip>");

    let kinds: Vec<_> = tokens.iter().map(|t| (t.kind, t.nesting)).collect();
    assert_eq!(
        kinds,
        vec![
            (TokenType::EmbeddedInline, Nesting::Opening),
            (TokenType::Text, Nesting::SelfClosing),
            (TokenType::EmOpen, Nesting::Opening),
            (TokenType::Text, Nesting::SelfClosing),
            (TokenType::EmClose, Nesting::Closing),
            (TokenType::Text, Nesting::SelfClosing),
            (TokenType::EmbeddedInline, Nesting::Opening),
            (TokenType::Text, Nesting::SelfClosing),
            (TokenType::EmbeddedInline, Nesting::Closing),
            (TokenType::EmbeddedInline, Nesting::Closing),
        ]
    );
}

#[test]
fn nested_same_name_inline_pairs_with_outer_close() {
    let md = parser_with(CreateElementTransformer::new());
    let tokens = md.parse_inline("<B>x<B>y</B>z</B>!");

    let contents: Vec<_> = tokens.iter().map(|t| t.content.as_str()).collect();
    assert_eq!(
        contents,
        vec!["createElement(B, null", "x", "createElement(B, null", "y", ")", "z", ")", "!"]
    );
}

#[test]
fn empty_paired_body_is_one_token() {
    let md = parser_with(CreateElementTransformer::new());
    let tokens = md.parse_inline("<Spacer></Spacer>");

    assert_eq!(tokens.len(), 1);
    assert_eq!(tokens[0].nesting, Nesting::SelfClosing);
    assert_eq!(tokens[0].content, "createElement(Spacer, null)");
}

#[test]
fn close_tag_inside_code_span_is_skipped() {
    let md = parser_with(CreateElementTransformer::new());
    let tokens = md.parse_inline("<B>`</B>`</B>");

    assert_eq!(tokens[0].nesting, Nesting::Opening);
    assert_eq!(tokens[1].kind, TokenType::CodeInline);
    assert_eq!(tokens[1].content, "</B>");
    assert_eq!(tokens[2].nesting, Nesting::Closing);
    assert_eq!(tokens.len(), 3);
}

#[test]
fn code_span_is_never_markup() {
    let rendered = mdjsx_transpiler::transpile("`a<b`");
    assert_eq!(rendered.code, "p({},\n  code({}, \"a<b\"),\n)");
}

#[test]
fn rejected_inline_markup_stays_text() {
    let md = parser_with(reject_all);
    let tokens = md.parse_inline("a <B>x</B> b");

    assert_eq!(tokens.len(), 1);
    assert_eq!(tokens[0].kind, TokenType::Text);
    assert_eq!(tokens[0].content, "a <B>x</B> b");
}
