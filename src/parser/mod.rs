pub mod block;
pub mod inline;
mod ruler;

pub use block::{BlockRule, BlockState, ParentType, ParserBlock};
pub use inline::{InlineRule, InlineState, ParserInline};
pub use ruler::{MAIN_CHAIN, Ruler};

use lazy_static::lazy_static;
use regex::Regex;

use crate::grammar::TagGrammar;
use crate::options::Options;
use crate::token::{Token, TokenType};
use crate::transform::CodeTransformer;

/// Markdown parser hosting the embedded-markup scanners.
///
/// Owns both rule chains and the collaborators the scanners consult. Rules
/// reach it through `state.md`.
pub struct MarkdownParser {
    pub block: ParserBlock,
    pub inline: ParserInline,
    pub grammar: Box<dyn TagGrammar>,
    pub transformer: Box<dyn CodeTransformer>,
    pub options: Options,
}

impl MarkdownParser {
    pub fn new(
        options: Options,
        grammar: Box<dyn TagGrammar>,
        transformer: Box<dyn CodeTransformer>,
    ) -> Self {
        Self {
            block: ParserBlock::new(),
            inline: ParserInline::new(),
            grammar,
            transformer,
            options,
        }
    }

    /// Parse a document into block tokens; `Inline` tokens get their children.
    pub fn parse(&self, source: &str) -> Vec<Token> {
        let source = normalize(source);
        let mut tokens = self.block.parse(&source, self);
        for token in tokens.iter_mut().filter(|t| t.kind == TokenType::Inline) {
            token.children = self.inline.parse(&token.content, self);
        }
        tokens
    }

    /// Parse a single inline run, skipping the block pass.
    pub fn parse_inline(&self, source: &str) -> Vec<Token> {
        let source = normalize(source);
        self.inline.parse(&source, self)
    }

    /// Run the code transformer on embedded markup.
    ///
    /// Failures are not errors for the document: the scanner rejects and other
    /// rules take the text.
    pub(crate) fn transform_embedded(&self, source: &str) -> Option<String> {
        match self.transformer.transform(source) {
            Ok(code) => Some(code.trim().trim_matches(';').trim().to_string()),
            Err(err) => {
                log::debug!("embedded markup rejected: {} (source: {:?})", err, source);
                None
            }
        }
    }
}

lazy_static! {
    static ref ESCAPED_PUNCTUATION: Regex = Regex::new(r##"\\([!"#$%&'()*+,\-./:;<=>?@\[\\\]^_`{|}~])"##).unwrap();
}

/// Resolve backslash escapes and character references.
pub fn unescape_all(text: &str) -> String {
    if !text.contains('\\') && !text.contains('&') {
        return text.to_string();
    }
    let unescaped = ESCAPED_PUNCTUATION.replace_all(text, "$1");
    html_escape::decode_html_entities(&unescaped).into_owned()
}

/// Line endings to `\n`, NUL to U+FFFD.
pub fn normalize(source: &str) -> String {
    source
        .replace("\r\n", "\n")
        .replace('\r', "\n")
        .replace('\0', "\u{FFFD}")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unescape_backslashes_and_entities() {
        assert_eq!(unescape_all(r"a\*b\c"), "a*b\\c");
        assert_eq!(unescape_all("x &amp; y"), "x & y");
        assert_eq!(unescape_all("plain"), "plain");
    }

    #[test]
    fn normalize_line_endings_and_nul() {
        assert_eq!(normalize("a\r\nb\rc\0"), "a\nb\nc\u{FFFD}");
    }
}
