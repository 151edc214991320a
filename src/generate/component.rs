use super::{Output, Rendered};

/// Wrap rendered call expressions into an exported component function.
///
/// Each recorded tag gets a factory binding; callers can override any of
/// them through `factories`. Expects the body to be rendered with an initial
/// indent of 4.
pub fn wrap_component(name: &str, rendered: &Rendered) -> String {
    let mut output = Output::new();

    output.line(&format!(
        "export default function {}({{ createElement, factories = {{}} }}) {{",
        to_pascal_case(name)
    ));
    output.line(
        "  const element = (type) => factories[type] || ((props, ...children) => createElement(type, props, ...children))",
    );
    for tag in &rendered.tags {
        output.line(&format!("  const {} = element({})", tag, serde_json::Value::from(tag.as_str())));
    }

    if rendered.code.is_empty() {
        output.line("  return []");
    } else {
        output.line("  return [");
        output.line(&rendered.code);
        output.line("  ]");
    }
    output.line("}");
    output.finish()
}

/// `getting-started` and `getting_started` -> `GettingStarted`
pub fn to_pascal_case(s: &str) -> String {
    let name: String = s
        .split(|c: char| c == '_' || c == '-' || c == ' ' || c == '.')
        .map(|word| {
            let mut chars = word.chars();
            match chars.next() {
                None => String::new(),
                Some(first) => first.to_uppercase().chain(chars).collect(),
            }
        })
        .collect();

    match name.chars().next() {
        Some(c) if c.is_ascii_alphabetic() || c == '_' || c == '$' => name,
        Some(_) => format!("_{}", name),
        None => "Document".to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::BTreeSet;

    #[test]
    fn pascal_case_names() {
        assert_eq!(to_pascal_case("getting-started"), "GettingStarted");
        assert_eq!(to_pascal_case("api_reference"), "ApiReference");
        assert_eq!(to_pascal_case("2024-notes"), "_2024Notes");
        assert_eq!(to_pascal_case(""), "Document");
    }

    #[test]
    fn wraps_body_with_bindings() {
        let rendered = Rendered {
            code: "    p({},\n      \"hi\",\n    )".to_string(),
            tags: BTreeSet::from(["p".to_string()]),
        };
        let expected = "\
export default function Intro({ createElement, factories = {} }) {
  const element = (type) => factories[type] || ((props, ...children) => createElement(type, props, ...children))
  const p = element(\"p\")
  return [
    p({},
      \"hi\",
    )
  ]
}
";
        assert_eq!(wrap_component("intro", &rendered), expected);
    }

    #[test]
    fn empty_document() {
        let rendered = Rendered { code: String::new(), tags: BTreeSet::new() };
        assert!(wrap_component("x", &rendered).contains("  return []\n"));
    }
}
