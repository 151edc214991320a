use serde::Serialize;

/// Token type produced by the block and inline rule chains.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum TokenType {
    // === Block ===
    ParagraphOpen,
    ParagraphClose,
    HeadingOpen,
    HeadingClose,
    BlockquoteOpen,
    BlockquoteClose,
    BulletListOpen,
    BulletListClose,
    OrderedListOpen,
    OrderedListClose,
    ListItemOpen,
    ListItemClose,
    Hr,
    CodeBlock,
    Fence,
    /// Container for inline content; its children hold the inline tokens.
    Inline,

    // === Inline ===
    Text,
    CodeInline,
    Softbreak,
    Hardbreak,
    EmOpen,
    EmClose,
    StrongOpen,
    StrongClose,
    LinkOpen,
    LinkClose,
    Image,

    // === Embedded markup ===
    /// Whole-line embedded markup, content is the transformed expression.
    EmbeddedBlock,
    /// Embedded markup inside a text run; may be an opening/closing pair.
    EmbeddedInline,
}

/// Nesting role of a token.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Nesting {
    /// +1: opens an element, children follow.
    Opening,
    /// 0: complete on its own.
    SelfClosing,
    /// -1: closes the most recent opening.
    Closing,
}

impl Nesting {
    pub fn delta(self) -> i8 {
        match self {
            Nesting::Opening => 1,
            Nesting::SelfClosing => 0,
            Nesting::Closing => -1,
        }
    }
}

/// Attribute value
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", content = "value", rename_all = "snake_case")]
pub enum AttrValue {
    /// Literal string, quoted when rendered.
    Text(String),
    /// Pre-rendered expression, inlined raw when rendered.
    Expression(String),
}

impl AttrValue {
    pub fn as_str(&self) -> &str {
        match self {
            AttrValue::Text(s) | AttrValue::Expression(s) => s,
        }
    }
}

impl From<&str> for AttrValue {
    fn from(value: &str) -> Self {
        AttrValue::Text(value.to_string())
    }
}

impl From<String> for AttrValue {
    fn from(value: String) -> Self {
        AttrValue::Text(value)
    }
}

/// A single token of the parsed document.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Token {
    #[serde(rename = "type")]
    pub kind: TokenType,
    /// Element name, e.g. `p`, `h2`, `code`.
    pub tag: String,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub attrs: Vec<(String, AttrValue)>,
    /// Source line range `[start, end)` for block tokens.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub map: Option<(usize, usize)>,
    pub nesting: Nesting,
    pub level: usize,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub children: Vec<Token>,
    #[serde(skip_serializing_if = "String::is_empty")]
    pub content: String,
    #[serde(skip_serializing_if = "String::is_empty")]
    pub markup: String,
    #[serde(skip_serializing_if = "String::is_empty")]
    pub info: String,
    pub block: bool,
    /// Suppressed when rendering (tight list paragraphs).
    #[serde(skip_serializing_if = "std::ops::Not::not")]
    pub hidden: bool,
}

impl Token {
    pub fn new(kind: TokenType, tag: impl Into<String>, nesting: Nesting) -> Self {
        Self {
            kind,
            tag: tag.into(),
            attrs: Vec::new(),
            map: None,
            nesting,
            level: 0,
            children: Vec::new(),
            content: String::new(),
            markup: String::new(),
            info: String::new(),
            block: false,
            hidden: false,
        }
    }

    /// Index of the attribute called `name`, if present.
    pub fn attr_index(&self, name: &str) -> Option<usize> {
        self.attrs.iter().position(|(n, _)| n == name)
    }

    pub fn attr_get(&self, name: &str) -> Option<&AttrValue> {
        self.attrs.iter().find(|(n, _)| n == name).map(|(_, v)| v)
    }

    /// Set `name` to `value`, replacing an existing value.
    pub fn attr_set(&mut self, name: &str, value: impl Into<AttrValue>) {
        let value = value.into();
        match self.attr_index(name) {
            Some(i) => self.attrs[i].1 = value,
            None => self.attrs.push((name.to_string(), value)),
        }
    }

    pub fn attr_push(&mut self, name: &str, value: impl Into<AttrValue>) {
        self.attrs.push((name.to_string(), value.into()));
    }
}
