/// Which scanner is asking.
///
/// Block scans look at a whole trimmed line; inline scans look at the rest of
/// a text run and additionally accept `{expression}`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Flavor {
    Block,
    Inline,
}

/// A recognized tag at the start of a text slice.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TagMatch {
    /// Tag name; empty for brace expressions.
    pub name: String,
    /// Byte length consumed from the start of the slice.
    pub end: usize,
}

/// Recognizers for embedded tags. Stateless, prefix-anchored.
pub trait TagGrammar {
    /// Open tag (or self-closing tag, or inline brace expression) at the start of `text`.
    fn parse_open(&self, text: &str, flavor: Flavor) -> Option<TagMatch>;

    /// Close tag `</name>` at the start of `text`.
    fn parse_close(&self, text: &str, flavor: Flavor) -> Option<TagMatch>;

    /// Self-closing construct at the start of `text`, returning its byte length.
    fn parse_self_close(&self, text: &str, flavor: Flavor) -> Option<usize>;
}

/// JSX tag recognizer.
#[derive(Debug, Clone, Copy, Default)]
pub struct JsxTagGrammar;

/// Result of scanning an opening tag.
struct OpenTag {
    name: String,
    end: usize,
    self_closing: bool,
}

impl JsxTagGrammar {
    pub fn new() -> Self {
        Self
    }

    fn scan_open(&self, text: &str, flavor: Flavor) -> Option<OpenTag> {
        let bytes = text.as_bytes();
        match bytes.first()? {
            b'{' if flavor == Flavor::Inline => {
                let end = skip_braces(bytes, 0)?;
                Some(OpenTag { name: String::new(), end, self_closing: true })
            }
            b'<' => scan_element_open(bytes),
            _ => None,
        }
    }
}

impl TagGrammar for JsxTagGrammar {
    fn parse_open(&self, text: &str, flavor: Flavor) -> Option<TagMatch> {
        self.scan_open(text, flavor).map(|tag| TagMatch { name: tag.name, end: tag.end })
    }

    fn parse_close(&self, text: &str, _flavor: Flavor) -> Option<TagMatch> {
        let bytes = text.as_bytes();
        if !text.starts_with("</") {
            return None;
        }
        let mut i = skip_whitespace(bytes, 2);
        let name_start = i;
        i = scan_name(bytes, i)?;
        let name = &text[name_start..i];
        i = skip_whitespace(bytes, i);
        if bytes.get(i) != Some(&b'>') {
            return None;
        }
        Some(TagMatch { name: name.to_string(), end: i + 1 })
    }

    fn parse_self_close(&self, text: &str, flavor: Flavor) -> Option<usize> {
        self.scan_open(text, flavor)
            .filter(|tag| tag.self_closing)
            .map(|tag| tag.end)
    }
}

fn is_name_start(b: u8) -> bool {
    b.is_ascii_alphabetic() || b == b'_' || b == b'$'
}

fn is_name_char(b: u8) -> bool {
    b.is_ascii_alphanumeric() || matches!(b, b'_' | b'$' | b'.' | b':' | b'-')
}

fn skip_whitespace(bytes: &[u8], mut i: usize) -> usize {
    while i < bytes.len() && bytes[i].is_ascii_whitespace() {
        i += 1;
    }
    i
}

/// Scan a tag or attribute name starting at `i`; returns the end offset.
fn scan_name(bytes: &[u8], i: usize) -> Option<usize> {
    if !is_name_start(*bytes.get(i)?) {
        return None;
    }
    let mut j = i + 1;
    while j < bytes.len() && is_name_char(bytes[j]) {
        j += 1;
    }
    Some(j)
}

fn scan_element_open(bytes: &[u8]) -> Option<OpenTag> {
    // bytes[0] == '<'
    let name_end = scan_name(bytes, 1)?;
    // Name bytes are ASCII
    let name = String::from_utf8_lossy(&bytes[1..name_end]).into_owned();
    let mut i = name_end;

    loop {
        let before = i;
        i = skip_whitespace(bytes, i);
        match bytes.get(i)? {
            b'>' => return Some(OpenTag { name, end: i + 1, self_closing: false }),
            b'/' => {
                if bytes.get(i + 1) == Some(&b'>') {
                    return Some(OpenTag { name, end: i + 2, self_closing: true });
                }
                return None;
            }
            // Attributes must be separated from the name and from each other
            _ if i == before => return None,
            b'{' => {
                i = skip_braces(bytes, i)?;
            }
            _ => {
                i = scan_attribute(bytes, i)?;
            }
        }
    }
}

/// `name`, `name="v"`, `name='v'` or `name={expr}`.
fn scan_attribute(bytes: &[u8], i: usize) -> Option<usize> {
    let mut j = scan_name(bytes, i)?;
    let after_name = j;
    j = skip_whitespace(bytes, j);
    if bytes.get(j) != Some(&b'=') {
        // Boolean attribute
        return Some(after_name);
    }
    j = skip_whitespace(bytes, j + 1);
    match bytes.get(j)? {
        quote @ (b'"' | b'\'') => {
            let quote = *quote;
            let close = bytes[j + 1..].iter().position(|&b| b == quote)?;
            Some(j + 1 + close + 1)
        }
        b'{' => skip_braces(bytes, j),
        _ => None,
    }
}

/// Skip a balanced `{...}` starting at `i`, honouring JS string and template literals.
/// Returns the offset just past the closing brace.
fn skip_braces(bytes: &[u8], i: usize) -> Option<usize> {
    let mut depth = 0usize;
    let mut j = i;
    while j < bytes.len() {
        match bytes[j] {
            b'{' => depth += 1,
            b'}' => {
                depth -= 1;
                if depth == 0 {
                    return Some(j + 1);
                }
            }
            quote @ (b'"' | b'\'' | b'`') => {
                j = skip_string(bytes, j, quote)?;
                continue;
            }
            _ => {}
        }
        j += 1;
    }
    None
}

/// Skip a quoted string starting at `i` (the opening quote).
fn skip_string(bytes: &[u8], i: usize, quote: u8) -> Option<usize> {
    let mut j = i + 1;
    while j < bytes.len() {
        match bytes[j] {
            b'\\' => j += 2,
            b if b == quote => return Some(j + 1),
            _ => j += 1,
        }
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;

    fn open(text: &str) -> Option<TagMatch> {
        JsxTagGrammar.parse_open(text, Flavor::Inline)
    }

    #[test]
    fn open_tag_with_attributes() {
        let text = "<Foo a=\"1\" b={x > 1} c>rest";
        let m = open(text).unwrap();
        assert_eq!(m.name, "Foo");
        assert_eq!(&text[..m.end], "<Foo a=\"1\" b={x > 1} c>");
        assert_eq!(JsxTagGrammar.parse_self_close(text, Flavor::Inline), None);
    }

    #[test]
    fn self_closing_tag() {
        let text = "<img src='a.png' />!";
        assert_eq!(JsxTagGrammar.parse_self_close(text, Flavor::Block), Some(text.len() - 1));
        assert_eq!(open(text).unwrap().name, "img");
    }

    #[test]
    fn member_and_namespaced_names() {
        assert_eq!(open("<UI.Button>").unwrap().name, "UI.Button");
        assert_eq!(open("<svg:rect/>").unwrap().name, "svg:rect");
    }

    #[test]
    fn spread_attribute() {
        let m = open("<Card {...props} title='x'>").unwrap();
        assert_eq!(m.end, "<Card {...props} title='x'>".len());
    }

    #[test]
    fn brace_in_string_inside_expression() {
        let text = "<A title={\"}\"}>";
        assert_eq!(open(text).unwrap().end, text.len());
    }

    #[test]
    fn multiline_attributes_inline() {
        let text = "<A\n  b=\"1\"\n>";
        assert_eq!(open(text).unwrap().end, text.len());
    }

    #[test]
    fn rejects_non_tags() {
        assert_eq!(open("< Foo>"), None);
        assert_eq!(open("<1a>"), None);
        assert_eq!(open("<!-- c -->"), None);
        assert_eq!(open("<https://example.com>"), None);
        assert_eq!(open("<a b=c>"), None);
        assert_eq!(open("<Foo a=\"1\""), None);
        assert_eq!(open("<a\"b\">"), None);
    }

    #[test]
    fn brace_expression_inline_only() {
        assert_eq!(open("{a + {b: 1}.b} tail").unwrap().end, "{a + {b: 1}.b}".len());
        assert_eq!(JsxTagGrammar.parse_self_close("{x}", Flavor::Inline), Some(3));
        assert_eq!(JsxTagGrammar.parse_open("{x}", Flavor::Block), None);
        assert_eq!(open("{unbalanced"), None);
    }

    #[test]
    fn close_tag() {
        let m = JsxTagGrammar.parse_close("</Foo >tail", Flavor::Block).unwrap();
        assert_eq!(m.name, "Foo");
        assert_eq!(m.end, 7);
        assert_eq!(JsxTagGrammar.parse_close("</>", Flavor::Inline), None);
        assert_eq!(JsxTagGrammar.parse_close("<Foo>", Flavor::Inline), None);
    }

    #[test]
    fn non_ascii_attribute_values() {
        let text = "<Note title=\"héllo ✓\">";
        assert_eq!(open(text).unwrap().end, text.len());
    }
}
