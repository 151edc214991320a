use lazy_static::lazy_static;
use regex::{Captures, Regex};
use serde::Serialize;
use std::collections::BTreeSet;

use crate::options::Options;
use crate::parser::unescape_all;
use crate::token::{AttrValue, Nesting, Token, TokenType};

lazy_static! {
    static ref SNAKE_SEGMENT: Regex = Regex::new(r"_(.)").unwrap();
    static ref WHITESPACE: Regex = Regex::new(r"\s+").unwrap();
}

/// Mutable state of one `render` call.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RenderState {
    /// Every element name emitted, camelized
    pub tags: BTreeSet<String>,
    pub indent_level: usize,
}

impl RenderState {
    pub fn new(indent_level: usize) -> Self {
        Self {
            tags: BTreeSet::new(),
            indent_level,
        }
    }

    fn indent(&self, text: &str) -> String {
        let prefix = " ".repeat(self.indent_level);
        text.split('\n')
            .map(|line| format!("{}{}", prefix, line))
            .collect::<Vec<_>>()
            .join("\n")
    }

    fn open(&mut self) {
        self.indent_level += 2;
    }

    fn close(&mut self) {
        self.indent_level = self.indent_level.saturating_sub(2);
    }
}

/// Result of rendering a token stream.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Rendered {
    /// Call expressions joined with `",\n"`
    pub code: String,
    /// Element names the code calls; the caller provides a binding for each
    pub tags: BTreeSet<String>,
}

/// Turns tokens into nested, indented call expressions.
///
/// `p` becomes `p({}`, its children follow at two more columns, and the
/// paragraph close becomes `)` back at the original indent.
pub struct Renderer {
    options: Options,
}

impl Renderer {
    pub fn new(options: Options) -> Self {
        Self { options }
    }

    pub fn options(&self) -> &Options {
        &self.options
    }

    pub fn render(&self, tokens: &[Token]) -> Rendered {
        let mut state = RenderState::new(self.options.initial_indent);
        let mut results = Vec::new();

        for token in tokens {
            if token.kind == TokenType::Inline {
                results.extend(self.render_inline(&token.children, &mut state));
            } else {
                push_result(&mut results, self.render_rule(token, &mut state));
            }
        }

        Rendered {
            code: results.join(",\n"),
            tags: state.tags,
        }
    }

    /// Render inline tokens; blank results are dropped.
    pub fn render_inline(&self, tokens: &[Token], state: &mut RenderState) -> Vec<String> {
        let mut results = Vec::new();
        for token in tokens {
            push_result(&mut results, self.render_rule(token, state));
        }
        results
    }

    /// Plain text of `tokens`: text content plus, recursively, image alt text.
    pub fn render_inline_as_text(&self, tokens: &[Token]) -> String {
        let mut result = String::new();
        for token in tokens {
            match token.kind {
                TokenType::Text => result.push_str(&token.content),
                TokenType::Image => result.push_str(&self.render_inline_as_text(&token.children)),
                _ => {}
            }
        }
        result
    }

    fn render_rule(&self, token: &Token, state: &mut RenderState) -> Option<String> {
        match token.kind {
            TokenType::CodeInline | TokenType::CodeBlock => {
                let child = json_string(&token.content);
                Some(self.render_element(&token.tag, &token.attrs, &[child], state))
            }
            TokenType::Fence => Some(self.render_fence(token, state)),
            TokenType::Image => {
                let mut image = token.clone();
                image.attr_set("alt", self.render_inline_as_text(&token.children));
                self.render_token(&image, state)
            }
            TokenType::Hardbreak => Some(self.render_element("br", &[], &[], state)),
            TokenType::Softbreak if self.options.breaks => {
                Some(self.render_element("br", &[], &[], state))
            }
            TokenType::Softbreak => None,
            TokenType::Text => Some(state.indent(&json_string(&token.content))),
            TokenType::EmbeddedBlock => Some(state.indent(token.content.trim())),
            TokenType::EmbeddedInline => {
                if token.nesting == Nesting::Closing {
                    state.close();
                }
                let result = state.indent(token.content.trim());
                if token.nesting == Nesting::Opening {
                    state.open();
                }
                Some(result)
            }
            _ => self.render_token(token, state),
        }
    }

    fn render_fence(&self, token: &Token, state: &mut RenderState) -> String {
        let info = if token.info.is_empty() {
            String::new()
        } else {
            unescape_all(&token.info).trim().to_string()
        };
        let lang = WHITESPACE.split(&info).next().unwrap_or_default();

        let highlighted = self
            .options
            .highlight
            .as_ref()
            .and_then(|highlight| highlight(&token.content, lang))
            .filter(|h| !h.is_empty())
            .unwrap_or_else(|| token.content.clone());

        // Already a full block of markup: passed through as an expression
        if highlighted.starts_with("<pre") {
            return self.render_element(&token.tag, &token.attrs, &[highlighted], state);
        }

        let child = json_string(&highlighted);
        if info.is_empty() {
            return self.render_element(&token.tag, &token.attrs, &[child], state);
        }

        let class = format!("{}{}", self.options.lang_prefix, lang);
        let mut attrs = token.attrs.clone();
        match attrs.iter_mut().find(|(name, _)| name == "class") {
            Some((_, value)) => {
                let merged = format!("{} {}", value.as_str(), class);
                match value {
                    AttrValue::Text(s) | AttrValue::Expression(s) => *s = merged,
                }
            }
            None => attrs.push(("class".to_string(), AttrValue::Text(class))),
        }
        self.render_element(&token.tag, &attrs, &[child], state)
    }

    /// `name({attrs}, child, ...)` on one indented line.
    pub fn render_element(
        &self,
        tag: &str,
        attrs: &[(String, AttrValue)],
        children: &[String],
        state: &mut RenderState,
    ) -> String {
        let name = camelize(tag);
        let mut args = vec![render_attrs(attrs)];
        args.extend(children.iter().cloned());
        let result = state.indent(&format!("{}({})", name, args.join(", ")));
        state.tags.insert(name);
        result
    }

    /// Generic rule: opening `name({attrs}`, self-closing `name({attrs})`, closing `)`.
    pub fn render_token(&self, token: &Token, state: &mut RenderState) -> Option<String> {
        if token.hidden {
            return None;
        }

        if token.nesting == Nesting::Closing {
            state.close();
            return Some(state.indent(")"));
        }

        let name = camelize(&token.tag);
        let mut result = state.indent(&format!("{}(", name));
        result.push_str(&render_attrs(&token.attrs));
        state.tags.insert(name);

        if token.nesting == Nesting::SelfClosing {
            result.push(')');
        } else {
            state.open();
        }
        Some(result)
    }
}

/// Attribute object literal; `class` becomes `className`.
pub fn render_attrs(attrs: &[(String, AttrValue)]) -> String {
    let fields: Vec<String> = attrs
        .iter()
        .map(|(name, value)| {
            let name = if name == "class" { "className" } else { name.as_str() };
            let value = match value {
                AttrValue::Text(text) => json_string(text),
                AttrValue::Expression(code) => code.clone(),
            };
            format!("{}: {}", json_string(name), value)
        })
        .collect();
    format!("{{{}}}", fields.join(", "))
}

/// `code_block` -> `codeBlock`
pub fn camelize(name: &str) -> String {
    SNAKE_SEGMENT
        .replace_all(name, |caps: &Captures| caps[1].to_uppercase())
        .into_owned()
}

fn json_string(s: &str) -> String {
    serde_json::Value::from(s).to_string()
}

fn push_result(results: &mut Vec<String>, result: Option<String>) {
    if let Some(result) = result {
        if !result.trim().is_empty() {
            results.push(result);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn text(content: &str) -> Token {
        let mut token = Token::new(TokenType::Text, "", Nesting::SelfClosing);
        token.content = content.to_string();
        token
    }

    #[test]
    fn camelize_snake_case() {
        assert_eq!(camelize("code_block"), "codeBlock");
        assert_eq!(camelize("h1"), "h1");
        assert_eq!(camelize("a_b_c"), "aBC");
    }

    #[test]
    fn attrs_rename_class_and_keep_expressions() {
        let attrs = vec![
            ("class".to_string(), AttrValue::Text("note".into())),
            ("onClick".to_string(), AttrValue::Expression("handle".into())),
        ];
        assert_eq!(render_attrs(&attrs), r#"{"className": "note", "onClick": handle}"#);
        assert_eq!(render_attrs(&[]), "{}");
    }

    #[test]
    fn paragraph_nests_children() {
        let renderer = Renderer::new(Options::default());
        let mut inline = Token::new(TokenType::Inline, "", Nesting::SelfClosing);
        inline.children = vec![text("hi")];
        let tokens = vec![
            Token::new(TokenType::ParagraphOpen, "p", Nesting::Opening),
            inline,
            Token::new(TokenType::ParagraphClose, "p", Nesting::Closing),
        ];
        let rendered = renderer.render(&tokens);
        assert_eq!(rendered.code, "p({},\n  \"hi\",\n)");
        assert_eq!(rendered.tags.into_iter().collect::<Vec<_>>(), vec!["p"]);
    }

    #[test]
    fn hidden_tokens_render_nothing() {
        let renderer = Renderer::new(Options::default());
        let mut state = RenderState::new(0);
        let mut open = Token::new(TokenType::ParagraphOpen, "p", Nesting::Opening);
        open.hidden = true;
        assert_eq!(renderer.render_token(&open, &mut state), None);
        assert_eq!(state.indent_level, 0);
        assert!(state.tags.is_empty());
    }

    #[test]
    fn softbreak_depends_on_option() {
        let softbreak = Token::new(TokenType::Softbreak, "br", Nesting::SelfClosing);
        let off = Renderer::new(Options::default());
        assert_eq!(off.render(std::slice::from_ref(&softbreak)).code, "");

        let on = Renderer::new(Options { breaks: true, ..Options::default() });
        let rendered = on.render(&[softbreak]);
        assert_eq!(rendered.code, "br({})");
        assert!(rendered.tags.contains("br"));
    }

    #[test]
    fn inline_as_text_includes_nested_images() {
        let renderer = Renderer::new(Options::default());
        let mut image = Token::new(TokenType::Image, "img", Nesting::SelfClosing);
        image.children = vec![text("inner")];
        let tokens = vec![
            text("a "),
            Token::new(TokenType::EmOpen, "em", Nesting::Opening),
            image,
            Token::new(TokenType::CodeInline, "code", Nesting::SelfClosing),
        ];
        assert_eq!(renderer.render_inline_as_text(&tokens), "a inner");
    }

    #[test]
    fn embedded_inline_pair_balances_indent() {
        let renderer = Renderer::new(Options { initial_indent: 4, ..Options::default() });
        let mut state = RenderState::new(4);
        let mut open = Token::new(TokenType::EmbeddedInline, "", Nesting::Opening);
        open.content = "createElement(B, null".to_string();
        let mut close = Token::new(TokenType::EmbeddedInline, "", Nesting::Closing);
        close.content = ")".to_string();

        let lines = renderer.render_inline(&[open, text("x"), close], &mut state);
        assert_eq!(lines, vec!["    createElement(B, null", "      \"x\"", "    )"]);
        assert_eq!(state.indent_level, 4);
    }
}
