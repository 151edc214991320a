mod embedded;
mod list;
mod rules;

pub use embedded::embedded_block;

use super::MarkdownParser;
use super::ruler::{MAIN_CHAIN, Ruler};
use crate::token::{Nesting, Token, TokenType};

/// Block rule: `(state, start_line, end_line, silent) -> matched`.
///
/// In silent mode a rule only answers whether it could start at `start_line`
/// (used to terminate paragraphs, quotes and lists) and must not touch state.
pub type BlockRule = fn(&mut BlockState<'_>, usize, usize, bool) -> bool;

/// Container a rule is currently running inside.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ParentType {
    Root,
    Paragraph,
    Blockquote,
    List,
}

/// Line-oriented scan state for one block pass.
pub struct BlockState<'a> {
    pub src: &'a str,
    pub md: &'a MarkdownParser,
    pub tokens: Vec<Token>,

    /// Byte offset where each line begins
    pub b_marks: Vec<usize>,
    /// Byte offset where each line ends (before `\n`)
    pub e_marks: Vec<usize>,
    /// Bytes of leading whitespace
    pub t_shift: Vec<usize>,
    /// Columns of leading whitespace (tabs expanded); negative marks lazy continuation lines
    pub s_count: Vec<isize>,

    /// Required indent of the current block
    pub blk_indent: usize,
    pub line: usize,
    pub line_max: usize,
    /// False once a blank line separated two blocks of the current list item
    pub tight: bool,
    pub parent_type: ParentType,
    pub level: usize,
}

impl<'a> BlockState<'a> {
    pub fn new(src: &'a str, md: &'a MarkdownParser) -> Self {
        let mut state = Self {
            src,
            md,
            tokens: Vec::new(),
            b_marks: Vec::new(),
            e_marks: Vec::new(),
            t_shift: Vec::new(),
            s_count: Vec::new(),
            blk_indent: 0,
            line: 0,
            line_max: 0,
            tight: false,
            parent_type: ParentType::Root,
            level: 0,
        };

        let bytes = src.as_bytes();
        let mut start = 0;
        while start < bytes.len() {
            let end = src[start..].find('\n').map_or(bytes.len(), |i| start + i);
            let mut indent = 0;
            let mut offset = 0;
            for &b in &bytes[start..end] {
                match b {
                    b' ' => offset += 1,
                    b'\t' => offset += 4 - offset % 4,
                    _ => break,
                }
                indent += 1;
            }
            state.b_marks.push(start);
            state.e_marks.push(end);
            state.t_shift.push(indent);
            state.s_count.push(offset as isize);
            start = end + 1;
        }

        // Sentinel line so `line + 1` lookups stay in bounds
        state.b_marks.push(bytes.len());
        state.e_marks.push(bytes.len());
        state.t_shift.push(0);
        state.s_count.push(0);
        state.line_max = state.b_marks.len() - 1;

        state
    }

    /// Push a block token, keeping `level` in step with its nesting.
    pub fn push(&mut self, kind: TokenType, tag: &str, nesting: Nesting) -> &mut Token {
        let mut token = Token::new(kind, tag, nesting);
        token.block = true;

        if nesting == Nesting::Closing {
            self.level = self.level.saturating_sub(1);
        }
        token.level = self.level;
        if nesting == Nesting::Opening {
            self.level += 1;
        }

        let index = self.tokens.len();
        self.tokens.push(token);
        &mut self.tokens[index]
    }

    pub fn is_empty(&self, line: usize) -> bool {
        self.b_marks[line] + self.t_shift[line] >= self.e_marks[line]
    }

    pub fn skip_empty_lines(&self, mut line: usize) -> usize {
        while line < self.line_max && self.is_empty(line) {
            line += 1;
        }
        line
    }

    /// First non-whitespace byte offset of `line`.
    pub fn content_start(&self, line: usize) -> usize {
        self.b_marks[line] + self.t_shift[line]
    }

    /// Text of `line` after its leading whitespace.
    pub fn line_text(&self, line: usize) -> &'a str {
        let start = self.content_start(line).min(self.e_marks[line]);
        &self.src[start..self.e_marks[line]]
    }

    /// Indented less than the current block requires.
    pub fn is_outdented(&self, line: usize) -> bool {
        self.s_count[line] < self.blk_indent as isize
    }

    /// Indented enough over the current block to be an indented code block.
    pub fn is_code_indented(&self, line: usize) -> bool {
        self.s_count[line] - self.blk_indent as isize >= 4
    }

    /// Source of lines `begin..end` with up to `indent` columns stripped from each.
    pub fn get_lines(&self, begin: usize, end: usize, indent: usize, keep_last_lf: bool) -> String {
        if begin >= end {
            return String::new();
        }

        let bytes = self.src.as_bytes();
        let mut out = String::new();

        for line in begin..end {
            let mut line_indent = 0;
            let line_start = self.b_marks[line];
            let mut first = line_start;
            let last = if line + 1 < end || keep_last_lf {
                (self.e_marks[line] + 1).min(bytes.len())
            } else {
                self.e_marks[line]
            };

            while first < last && line_indent < indent {
                match bytes[first] {
                    b' ' => line_indent += 1,
                    b'\t' => line_indent += 4 - line_indent % 4,
                    // List markers masked by a patched `t_shift` count as indent
                    _ if first - line_start < self.t_shift[line] => line_indent += 1,
                    _ => break,
                }
                first += 1;
            }

            if line_indent > indent {
                // A tab overshot the requested indent; keep the remainder as spaces
                out.push_str(&" ".repeat(line_indent - indent));
            }
            out.push_str(&self.src[first..last]);
        }

        out
    }
}

/// Block rule chain.
pub struct ParserBlock {
    pub ruler: Ruler<BlockRule>,
}

impl ParserBlock {
    pub fn new() -> Self {
        let mut ruler: Ruler<BlockRule> = Ruler::new();
        ruler.push("code", rules::code, &[]);
        ruler.push("fence", rules::fence, &["paragraph", "blockquote", "list"]);
        ruler.push("blockquote", rules::blockquote, &["paragraph", "blockquote", "list"]);
        ruler.push("hr", rules::hr, &["paragraph", "blockquote", "list"]);
        ruler.push("list", list::list, &["paragraph", "blockquote"]);
        ruler.push("embedded_block", embedded::embedded_block, &["paragraph", "blockquote"]);
        ruler.push("heading", rules::heading, &["paragraph", "blockquote"]);
        ruler.push("paragraph", rules::paragraph, &[]);
        Self { ruler }
    }

    /// Run the chain over `start_line..end_line`.
    pub fn tokenize(&self, state: &mut BlockState<'_>, start_line: usize, end_line: usize) {
        let rules = self.ruler.rules(MAIN_CHAIN);
        let max_nesting = state.md.options.max_nesting;
        let mut line = start_line;
        let mut has_empty_lines = false;

        while line < end_line {
            line = state.skip_empty_lines(line);
            state.line = line;
            if line >= end_line {
                break;
            }

            // Dedented below the current container: the caller resumes
            if state.is_outdented(line) {
                break;
            }

            if state.level >= max_nesting {
                state.line = end_line;
                break;
            }

            let matched = rules.iter().any(|rule| rule(state, line, end_line, false));
            if !matched || state.line <= line {
                log::debug!("no block rule advanced past line {}", line);
                break;
            }

            state.tight = !has_empty_lines;
            if state.is_empty(state.line - 1) {
                has_empty_lines = true;
            }

            line = state.line;
            if line < end_line && state.is_empty(line) {
                has_empty_lines = true;
                line += 1;
                state.line = line;
            }
        }
    }

    pub fn parse(&self, src: &str, md: &MarkdownParser) -> Vec<Token> {
        if src.is_empty() {
            return Vec::new();
        }
        let mut state = BlockState::new(src, md);
        let end = state.line_max;
        self.tokenize(&mut state, 0, end);
        state.tokens
    }
}

impl Default for ParserBlock {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::grammar::JsxTagGrammar;
    use crate::options::Options;
    use crate::error::TransformError;

    fn md() -> MarkdownParser {
        let reject = |_: &str| -> Result<String, TransformError> { Err(TransformError::new("off")) };
        MarkdownParser::new(Options::default(), Box::new(JsxTagGrammar), Box::new(reject))
    }

    #[test]
    fn line_marks() {
        let md = md();
        let state = BlockState::new("a\n  b\n\tc\n\n", &md);
        assert_eq!(state.line_max, 4);
        assert_eq!(state.b_marks, vec![0, 2, 6, 9, 10]);
        assert_eq!(state.e_marks, vec![1, 5, 8, 9, 10]);
        assert_eq!(state.t_shift, vec![0, 2, 1, 0, 0]);
        assert_eq!(state.s_count, vec![0, 2, 4, 0, 0]);
        assert!(state.is_empty(3));
        assert_eq!(state.line_text(1), "b");
    }

    #[test]
    fn get_lines_strips_indent() {
        let md = md();
        let state = BlockState::new("    one\n      two\nthree", &md);
        assert_eq!(state.get_lines(0, 2, 4, false), "one\n  two");
        assert_eq!(state.get_lines(0, 3, 0, true), "    one\n      two\nthree");
        assert_eq!(state.get_lines(1, 1, 0, true), "");
    }

    #[test]
    fn get_lines_tab_overshoot() {
        let md = md();
        let state = BlockState::new("\tx\n", &md);
        assert_eq!(state.get_lines(0, 1, 2, true), "  x\n");
    }

    #[test]
    fn push_tracks_level() {
        let md = md();
        let mut state = BlockState::new("", &md);
        state.push(TokenType::BlockquoteOpen, "blockquote", Nesting::Opening);
        state.push(TokenType::ParagraphOpen, "p", Nesting::Opening);
        state.push(TokenType::ParagraphClose, "p", Nesting::Closing);
        state.push(TokenType::BlockquoteClose, "blockquote", Nesting::Closing);
        let levels: Vec<usize> = state.tokens.iter().map(|t| t.level).collect();
        assert_eq!(levels, vec![0, 1, 1, 0]);
        assert!(state.tokens.iter().all(|t| t.block));
        assert_eq!(state.level, 0);
    }
}
