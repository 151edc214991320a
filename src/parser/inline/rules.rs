use lazy_static::lazy_static;
use regex::Regex;

use super::InlineState;
use crate::token::{Nesting, TokenType};

lazy_static! {
    static ref AUTOLINK: Regex = Regex::new(r"^<([a-zA-Z][a-zA-Z0-9+.\-]{1,31}:[^<>\x00-\x20]*)>").unwrap();
    static ref EMAIL: Regex = Regex::new(
        r"^<([a-zA-Z0-9.!#$%&'*+/=?^_`{|}~\-]+@[a-zA-Z0-9](?:[a-zA-Z0-9\-]{0,61}[a-zA-Z0-9])?(?:\.[a-zA-Z0-9](?:[a-zA-Z0-9\-]{0,61}[a-zA-Z0-9])?)*)>"
    ).unwrap();
    static ref ENTITY: Regex = Regex::new(r"^&(?:#[xX][0-9a-fA-F]{1,6}|#[0-9]{1,7}|[a-zA-Z][a-zA-Z0-9]{1,31});").unwrap();
}

/// Characters that may start some other inline construct.
pub(super) fn is_terminator(b: u8) -> bool {
    matches!(
        b,
        b'\n' | b'!' | b'#' | b'$' | b'%' | b'&' | b'*' | b'+' | b'-' | b':' | b'<' | b'='
            | b'>' | b'@' | b'[' | b'\\' | b']' | b'^' | b'_' | b'`' | b'{' | b'}' | b'~'
    )
}

/// Run of plain characters.
pub fn text(state: &mut InlineState<'_>, silent: bool) -> bool {
    let src = state.src;
    let bytes = src.as_bytes();
    let start = state.pos;
    let mut pos = start;
    while pos < state.pos_max && !is_terminator(bytes[pos]) {
        pos += 1;
    }
    if pos == start {
        return false;
    }

    if !silent {
        state.pending.push_str(&src[start..pos]);
    }
    state.pos = pos;
    true
}

/// Line break: hard after two trailing spaces, soft otherwise.
pub fn newline(state: &mut InlineState<'_>, silent: bool) -> bool {
    if state.peek() != Some(b'\n') {
        return false;
    }

    if !silent {
        if state.pending.ends_with(' ') {
            let hard = state.pending.ends_with("  ");
            let trimmed_len = state.pending.trim_end_matches(' ').len();
            state.pending.truncate(trimmed_len);
            if hard {
                state.push(TokenType::Hardbreak, "br", Nesting::SelfClosing);
            } else {
                state.push(TokenType::Softbreak, "br", Nesting::SelfClosing);
            }
        } else {
            state.push(TokenType::Softbreak, "br", Nesting::SelfClosing);
        }
    }

    state.pos += 1;
    skip_leading_spaces(state);
    true
}

fn skip_leading_spaces(state: &mut InlineState<'_>) {
    let src = state.src;
    let bytes = src.as_bytes();
    while state.pos < state.pos_max && bytes[state.pos] == b' ' {
        state.pos += 1;
    }
}

/// Backslash escapes.
pub fn escape(state: &mut InlineState<'_>, silent: bool) -> bool {
    if state.peek() != Some(b'\\') {
        return false;
    }
    let src = state.src;
    let bytes = src.as_bytes();
    state.pos += 1;

    if state.pos < state.pos_max {
        let next = bytes[state.pos];
        if next.is_ascii_punctuation() {
            if !silent {
                state.pending.push(next as char);
            }
            state.pos += 1;
            return true;
        }
        if next == b'\n' {
            if !silent {
                state.push(TokenType::Hardbreak, "br", Nesting::SelfClosing);
            }
            state.pos += 1;
            skip_leading_spaces(state);
            return true;
        }
    }

    if !silent {
        state.pending.push('\\');
    }
    true
}

/// Code span between equal-length backtick runs.
pub fn backticks(state: &mut InlineState<'_>, silent: bool) -> bool {
    if state.peek() != Some(b'`') {
        return false;
    }

    let src = state.src;
    let bytes = src.as_bytes();
    let max = state.pos_max;
    let start = state.pos;
    let mut pos = start;
    while pos < max && bytes[pos] == b'`' {
        pos += 1;
    }
    let marker = &src[start..pos];
    let opener_len = pos - start;

    let mut search = pos;
    while let Some(found) = src[search..max].find('`') {
        let close_start = search + found;
        let mut close_end = close_start;
        while close_end < max && bytes[close_end] == b'`' {
            close_end += 1;
        }

        if close_end - close_start == opener_len {
            if !silent {
                let token = state.push(TokenType::CodeInline, "code", Nesting::SelfClosing);
                token.markup = marker.to_string();
                token.content = code_span_content(&src[pos..close_start]);
            }
            state.pos = close_end;
            return true;
        }
        search = close_end;
    }

    // No closer: the run is literal text
    if !silent {
        state.pending.push_str(marker);
    }
    state.pos = pos;
    true
}

fn code_span_content(raw: &str) -> String {
    let content = raw.replace('\n', " ");
    let padded = content.len() > 2 && content.starts_with(' ') && content.ends_with(' ');
    if padded && !content.trim_matches(' ').is_empty() {
        content[1..content.len() - 1].to_string()
    } else {
        content
    }
}

/// `<scheme:...>` and `<user@host>`.
pub fn autolink(state: &mut InlineState<'_>, silent: bool) -> bool {
    if state.peek() != Some(b'<') {
        return false;
    }

    let src = state.src;
    let text = &src[state.pos..state.pos_max];

    let (url, href) = if let Some(caps) = AUTOLINK.captures(text) {
        let url = caps[1].to_string();
        (url.clone(), url)
    } else if let Some(caps) = EMAIL.captures(text) {
        let email = caps[1].to_string();
        let href = format!("mailto:{}", email);
        (email, href)
    } else {
        return false;
    };

    if !silent {
        let open = state.push(TokenType::LinkOpen, "a", Nesting::Opening);
        open.attr_push("href", href);
        open.markup = "autolink".to_string();
        open.info = "auto".to_string();

        let text = state.push(TokenType::Text, "", Nesting::SelfClosing);
        text.content = url.clone();

        let close = state.push(TokenType::LinkClose, "a", Nesting::Closing);
        close.markup = "autolink".to_string();
        close.info = "auto".to_string();
    }

    state.pos += url.len() + 2;
    true
}

/// Named and numeric character references; a lone `&` stays text.
pub fn entity(state: &mut InlineState<'_>, silent: bool) -> bool {
    if state.peek() != Some(b'&') {
        return false;
    }

    let src = state.src;
    let text = &src[state.pos..state.pos_max];
    if let Some(found) = ENTITY.find(text) {
        let decoded = html_escape::decode_html_entities(found.as_str());
        if decoded != found.as_str() {
            if !silent {
                state.pending.push_str(&decoded);
            }
            state.pos += found.end();
            return true;
        }
    }

    if !silent {
        state.pending.push('&');
    }
    state.pos += 1;
    true
}
