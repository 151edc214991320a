use lazy_static::lazy_static;
use regex::Regex;
use std::cell::RefCell;
use tree_sitter::{Node, Parser, Tree};

use super::CodeTransformer;
use crate::error::TransformError;

lazy_static! {
    static ref IDENTIFIER: Regex = Regex::new(r"^[A-Za-z_$][A-Za-z0-9_$]*$").unwrap();
    // Newlines plus indentation inside attribute strings collapse to one space
    static ref ATTR_LINE_BREAK: Regex = Regex::new(r"\n\s+").unwrap();
}

/// JSX to `createElement(...)` transformer backed by tree-sitter-javascript.
pub struct CreateElementTransformer {
    parser: RefCell<Parser>,
    pragma: String,
}

impl CreateElementTransformer {
    pub fn new() -> Self {
        Self::with_pragma("createElement")
    }

    /// Use `pragma` as the factory function name instead of `createElement`.
    pub fn with_pragma(pragma: impl Into<String>) -> Self {
        let mut parser = Parser::new();
        parser
            .set_language(&tree_sitter_javascript::LANGUAGE.into())
            .expect("Failed to load JavaScript grammar");

        Self {
            parser: RefCell::new(parser),
            pragma: pragma.into(),
        }
    }

    pub fn pragma(&self) -> &str {
        &self.pragma
    }

    fn parse(&self, source: &str) -> Result<Tree, TransformError> {
        let tree = self
            .parser
            .borrow_mut()
            .parse(source, None)
            .ok_or_else(|| TransformError::new("parser returned no tree"))?;
        if tree.root_node().has_error() {
            return Err(TransformError::new("embedded markup does not parse"));
        }
        Ok(tree)
    }

    /// `{expr}` on its own: validated as a parenthesized expression, emitted raw.
    fn transform_expression(&self, source: &str) -> Result<String, TransformError> {
        let inner = source[1..source.len() - 1].trim();
        if inner.is_empty() {
            return Err(TransformError::new("empty expression"));
        }
        let wrapped = format!("({})", inner);
        let tree = self.parse(&wrapped)?;
        let expr = single_expression(tree.root_node())?;
        if expr.kind() != "parenthesized_expression" || expr.end_byte() != wrapped.len() {
            return Err(TransformError::new("braces do not hold a single expression"));
        }
        Ok(inner.to_string())
    }
}

impl Default for CreateElementTransformer {
    fn default() -> Self {
        Self::new()
    }
}

impl CodeTransformer for CreateElementTransformer {
    fn transform(&self, source: &str) -> Result<String, TransformError> {
        let trimmed = source.trim();
        if trimmed.len() >= 2 && trimmed.starts_with('{') && trimmed.ends_with('}') {
            return self.transform_expression(trimmed);
        }

        let tree = self.parse(source)?;
        let element = single_expression(tree.root_node())?;
        match element.kind() {
            "jsx_element" | "jsx_self_closing_element" => {}
            other => {
                return Err(TransformError::new(format!("expected a JSX element, found {}", other)));
            }
        }

        let codegen = Codegen { source, pragma: &self.pragma };
        codegen.element(element)
    }
}

/// The expression of the program's only statement.
fn single_expression(root: Node<'_>) -> Result<Node<'_>, TransformError> {
    let mut cursor = root.walk();
    let statements: Vec<Node> = root
        .named_children(&mut cursor)
        .filter(|n| n.kind() != "comment")
        .collect();
    let [statement] = statements.as_slice() else {
        return Err(TransformError::new(format!(
            "expected one expression, found {} statements",
            statements.len()
        )));
    };
    if statement.kind() != "expression_statement" {
        return Err(TransformError::new(format!("expected an expression, found {}", statement.kind())));
    }
    let mut cursor = statement.walk();
    let expr = statement
        .named_children(&mut cursor)
        .find(|n| n.kind() != "comment")
        .ok_or_else(|| TransformError::new("empty statement"))?;
    Ok(expr)
}

/// Emits `pragma(name, props, ...children)` for a parsed element tree.
struct Codegen<'s> {
    source: &'s str,
    pragma: &'s str,
}

impl<'s> Codegen<'s> {
    fn text(&self, node: Node<'_>) -> Result<&'s str, TransformError> {
        node.utf8_text(self.source.as_bytes())
            .map_err(|e| TransformError::new(e.to_string()))
    }

    fn element(&self, node: Node<'_>) -> Result<String, TransformError> {
        match node.kind() {
            "jsx_self_closing_element" => {
                let name = self.element_name(node)?;
                let props = self.props(node)?;
                Ok(self.call(&name, &props, Vec::new()))
            }
            "jsx_element" => {
                let open = node
                    .child_by_field_name("open_tag")
                    .ok_or_else(|| TransformError::new("element without opening tag"))?;
                let close = node
                    .child_by_field_name("close_tag")
                    .ok_or_else(|| TransformError::new("element without closing tag"))?;

                let name = self.element_name(open)?;
                let open_name = self.raw_name(open)?;
                let close_name = self.raw_name(close)?;
                if open_name != close_name {
                    return Err(TransformError::new(format!(
                        "expected </{}>, found </{}>",
                        open_name, close_name
                    )));
                }

                let props = self.props(open)?;
                let children = self.children(node, open.end_byte(), close.start_byte())?;
                Ok(self.call(&name, &props, children))
            }
            other => Err(TransformError::new(format!("unexpected {}", other))),
        }
    }

    fn raw_name(&self, tag: Node<'_>) -> Result<&'s str, TransformError> {
        match tag.child_by_field_name("name") {
            Some(name) => self.text(name),
            None => Ok(""),
        }
    }

    /// Lowercase and dashed names are intrinsic elements and become strings.
    fn element_name(&self, tag: Node<'_>) -> Result<String, TransformError> {
        let name = self.raw_name(tag)?;
        if name.is_empty() {
            return Err(TransformError::new("fragments are not supported"));
        }
        let intrinsic = !name.contains('.')
            && (name.starts_with(|c: char| c.is_ascii_lowercase()) || !IDENTIFIER.is_match(name));
        if intrinsic {
            Ok(json_string(name))
        } else {
            Ok(name.to_string())
        }
    }

    fn props(&self, tag: Node<'_>) -> Result<String, TransformError> {
        let name_start = tag.child_by_field_name("name").map(|n| n.start_byte());
        let mut cursor = tag.walk();
        let attributes: Vec<Node> = tag
            .named_children(&mut cursor)
            .filter(|n| Some(n.start_byte()) != name_start && n.kind() != "comment")
            .collect();

        // Consecutive plain props are grouped; spreads split the groups
        let mut groups: Vec<String> = Vec::new();
        let mut current: Vec<String> = Vec::new();
        let mut has_spread = false;

        for attr in attributes {
            match attr.kind() {
                "jsx_attribute" => current.push(self.prop(attr)?),
                "jsx_expression" => {
                    let inner = expression_body(self.text(attr)?);
                    let Some(spread) = inner.strip_prefix("...") else {
                        return Err(TransformError::new("expected a spread attribute"));
                    };
                    if !current.is_empty() {
                        groups.push(object(&current));
                        current.clear();
                    } else if groups.is_empty() {
                        groups.push("{}".to_string());
                    }
                    groups.push(spread.trim().to_string());
                    has_spread = true;
                }
                other => return Err(TransformError::new(format!("unexpected attribute {}", other))),
            }
        }

        if !has_spread {
            return Ok(if current.is_empty() { "null".to_string() } else { object(&current) });
        }
        if !current.is_empty() {
            groups.push(object(&current));
        }
        Ok(format!("Object.assign({})", groups.join(", ")))
    }

    fn prop(&self, attr: Node<'_>) -> Result<String, TransformError> {
        let mut cursor = attr.walk();
        let parts: Vec<Node> = attr.named_children(&mut cursor).collect();
        let (name, value) = match parts.as_slice() {
            [name] => (self.text(*name)?, None),
            [name, value] => (self.text(*name)?, Some(*value)),
            _ => return Err(TransformError::new("malformed attribute")),
        };

        let key = if IDENTIFIER.is_match(name) { name.to_string() } else { json_string(name) };
        let value = match value {
            None => "true".to_string(),
            Some(value) => match value.kind() {
                "string" => {
                    let quoted = self.text(value)?;
                    let unquoted = &quoted[1..quoted.len() - 1];
                    let decoded = html_escape::decode_html_entities(unquoted);
                    json_string(&ATTR_LINE_BREAK.replace_all(&decoded, " "))
                }
                "jsx_expression" => {
                    let inner = expression_body(self.text(value)?);
                    if inner.is_empty() {
                        return Err(TransformError::new(format!(
                            "attribute {} must not be an empty expression",
                            name
                        )));
                    }
                    inner.to_string()
                }
                "jsx_element" | "jsx_self_closing_element" => self.element(value)?,
                other => return Err(TransformError::new(format!("unexpected attribute value {}", other))),
            },
        };
        Ok(format!("{}: {}", key, value))
    }

    /// Children between the opening and closing tags. Text is taken from the
    /// gaps between nested elements and expressions.
    fn children(&self, node: Node<'_>, start: usize, end: usize) -> Result<Vec<String>, TransformError> {
        let mut cursor = node.walk();
        let nested: Vec<Node> = node
            .named_children(&mut cursor)
            .filter(|n| n.start_byte() >= start && n.end_byte() <= end)
            .filter(|n| {
                matches!(n.kind(), "jsx_element" | "jsx_self_closing_element" | "jsx_expression")
            })
            .collect();

        let mut children = Vec::new();
        let mut gap_start = start;
        for child in nested {
            if let Some(text) = clean_text(&self.source[gap_start..child.start_byte()]) {
                children.push(json_string(&text));
            }
            if child.kind() == "jsx_expression" {
                if let Some(expr) = self.expression_child(child)? {
                    children.push(expr);
                }
            } else {
                children.push(self.element(child)?);
            }
            gap_start = child.end_byte();
        }
        if let Some(text) = clean_text(&self.source[gap_start..end]) {
            children.push(json_string(&text));
        }
        Ok(children)
    }

    fn expression_child(&self, node: Node<'_>) -> Result<Option<String>, TransformError> {
        let mut cursor = node.walk();
        let mut content = node.named_children(&mut cursor).filter(|n| n.kind() != "comment");
        match content.next() {
            None => Ok(None),
            Some(n) if n.kind() == "spread_element" => {
                Err(TransformError::new("spread children are not supported"))
            }
            Some(_) => Ok(Some(expression_body(self.text(node)?).to_string())),
        }
    }

    fn call(&self, name: &str, props: &str, children: Vec<String>) -> String {
        if children.is_empty() {
            return format!("{}({}, {})", self.pragma, name, props);
        }
        let mut args = vec![name.to_string(), props.to_string()];
        args.extend(children);
        let body: Vec<String> = args.iter().map(|arg| indent(arg)).collect();
        format!("{}(\n{}\n)", self.pragma, body.join(",\n"))
    }
}

/// Strip the surrounding braces of a `jsx_expression`.
fn expression_body(text: &str) -> &str {
    text.strip_prefix('{')
        .and_then(|t| t.strip_suffix('}'))
        .unwrap_or(text)
        .trim()
}

fn object(props: &[String]) -> String {
    format!("{{ {} }}", props.join(", "))
}

fn indent(text: &str) -> String {
    text.lines()
        .map(|line| format!("  {}", line))
        .collect::<Vec<_>>()
        .join("\n")
}

fn json_string(s: &str) -> String {
    serde_json::Value::from(s).to_string()
}

/// JSX text whitespace: tabs become spaces, lines are trimmed at their inner
/// edges, blank lines vanish and the rest join with single spaces.
fn clean_text(raw: &str) -> Option<String> {
    let decoded = html_escape::decode_html_entities(raw);
    let lines: Vec<&str> = decoded.split('\n').collect();
    let last_non_empty = lines
        .iter()
        .rposition(|l| l.chars().any(|c| c != ' ' && c != '\t'))
        .unwrap_or(0);

    let mut out = String::new();
    for (i, line) in lines.iter().enumerate() {
        let is_first = i == 0;
        let is_last = i == lines.len() - 1;
        let mut trimmed = line.replace('\t', " ");
        if !is_first {
            trimmed = trimmed.trim_start_matches(' ').to_string();
        }
        if !is_last {
            trimmed = trimmed.trim_end_matches(' ').to_string();
        }
        if !trimmed.is_empty() {
            if i != last_non_empty {
                trimmed.push(' ');
            }
            out.push_str(&trimmed);
        }
    }

    if out.is_empty() { None } else { Some(out) }
}
