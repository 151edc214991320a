mod embedded;
mod emphasis;
mod link;
mod rules;

pub use embedded::embedded_inline;

use std::collections::HashMap;

use super::MarkdownParser;
use super::ruler::{MAIN_CHAIN, Ruler};
use crate::token::{Nesting, Token, TokenType};

/// Inline rule: `(state, silent) -> matched`.
///
/// On a match the rule advances `state.pos`; in silent mode it must not push
/// tokens. On rejection `pos` and `pos_max` are left as they were.
pub type InlineRule = fn(&mut InlineState<'_>, bool) -> bool;

/// Scan state for one inline run.
pub struct InlineState<'a> {
    pub src: &'a str,
    pub md: &'a MarkdownParser,
    pub tokens: Vec<Token>,
    pub pos: usize,
    pub pos_max: usize,
    /// Plain text not yet flushed into a `Text` token
    pub pending: String,
    pub level: usize,
    /// `skip_token` results: start -> (end, consumed by a rule)
    cache: HashMap<usize, (usize, bool)>,
}

impl<'a> InlineState<'a> {
    pub fn new(src: &'a str, md: &'a MarkdownParser) -> Self {
        Self {
            src,
            md,
            tokens: Vec::new(),
            pos: 0,
            pos_max: src.len(),
            pending: String::new(),
            level: 0,
            cache: HashMap::new(),
        }
    }

    pub fn push_pending(&mut self) {
        let mut token = Token::new(TokenType::Text, "", Nesting::SelfClosing);
        token.content = std::mem::take(&mut self.pending);
        token.level = self.level;
        self.tokens.push(token);
    }

    /// Push a token, flushing pending text first.
    pub fn push(&mut self, kind: TokenType, tag: &str, nesting: Nesting) -> &mut Token {
        if !self.pending.is_empty() {
            self.push_pending();
        }

        let mut token = Token::new(kind, tag, nesting);
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

    /// Byte at `pos`, if inside the current window.
    pub fn peek(&self) -> Option<u8> {
        if self.pos < self.pos_max {
            Some(self.src.as_bytes()[self.pos])
        } else {
            None
        }
    }

    /// Character at `pos`.
    pub fn current_char(&self) -> Option<char> {
        self.src[self.pos..self.pos_max].chars().next()
    }

    /// Skip the construct at `pos` without emitting anything.
    ///
    /// Every rule is tried in silent mode; when none matches the cursor moves
    /// one character. Returns whether a rule consumed the construct.
    pub fn skip_token(&mut self) -> bool {
        let start = self.pos;
        if let Some(&(end, consumed)) = self.cache.get(&start) {
            // Entries recorded under a wider window may overshoot this one
            if end <= self.pos_max {
                self.pos = end;
                return consumed;
            }
        }

        let md = self.md;
        let mut consumed = false;
        if self.level < md.options.max_nesting {
            for rule in md.inline.ruler.rules(MAIN_CHAIN) {
                self.level += 1;
                let matched = rule(self, true);
                self.level -= 1;
                if matched && self.pos > start {
                    consumed = true;
                    break;
                }
                self.pos = start;
            }
        } else {
            self.pos = self.pos_max;
            consumed = true;
        }

        if !consumed {
            self.pos += self.current_char().map_or(1, char::len_utf8);
        }
        self.cache.insert(start, (self.pos, consumed));
        consumed
    }
}

/// Inline rule chain.
pub struct ParserInline {
    pub ruler: Ruler<InlineRule>,
}

impl ParserInline {
    pub fn new() -> Self {
        let mut ruler: Ruler<InlineRule> = Ruler::new();
        ruler.push("text", rules::text, &[]);
        ruler.push("newline", rules::newline, &[]);
        ruler.push("escape", rules::escape, &[]);
        ruler.push("backticks", rules::backticks, &[]);
        ruler.push("emphasis", emphasis::emphasis, &[]);
        ruler.push("link", link::link, &[]);
        ruler.push("image", link::image, &[]);
        ruler.push("autolink", rules::autolink, &[]);
        ruler.push("embedded_inline", embedded::embedded_inline, &[]);
        ruler.push("entity", rules::entity, &[]);
        Self { ruler }
    }

    /// Tokenize `state.pos..state.pos_max`; unmatched characters become text.
    pub fn tokenize(&self, state: &mut InlineState<'_>) {
        let rules = self.ruler.rules(MAIN_CHAIN);
        let max_nesting = state.md.options.max_nesting;
        let end = state.pos_max;

        while state.pos < end {
            let start = state.pos;
            let mut matched = false;
            if state.level < max_nesting {
                matched = rules.iter().any(|rule| rule(state, false) && state.pos > start);
            }

            if matched {
                continue;
            }

            state.pos = start;
            let Some(ch) = state.current_char() else {
                break;
            };
            state.pending.push(ch);
            state.pos += ch.len_utf8();
        }

        if !state.pending.is_empty() {
            state.push_pending();
        }
    }

    pub fn parse(&self, src: &str, md: &MarkdownParser) -> Vec<Token> {
        let mut state = InlineState::new(src, md);
        self.tokenize(&mut state);
        state.tokens
    }
}

impl Default for ParserInline {
    fn default() -> Self {
        Self::new()
    }
}
