use super::InlineState;
use crate::token::{Nesting, TokenType};

fn char_before(src: &str, pos: usize) -> Option<char> {
    src[..pos].chars().next_back()
}

/// Is the marker run at `pos..pos + len` able to close emphasis?
fn can_close(state: &InlineState<'_>, pos: usize, len: usize, marker: u8) -> bool {
    if char_before(state.src, pos).is_none_or(char::is_whitespace) {
        return false;
    }
    if marker == b'_' {
        // Intraword underscores never close
        let after = state.src[pos + len..state.pos_max].chars().next();
        if after.is_some_and(char::is_alphanumeric) {
            return false;
        }
    }
    true
}

/// `*em*`, `_em_`, `**strong**`, `__strong__`.
///
/// The closer is searched with `skip_token`, so markers inside code spans,
/// links and embedded markup are never taken as closers.
pub fn emphasis(state: &mut InlineState<'_>, silent: bool) -> bool {
    let marker = match state.peek() {
        Some(b @ (b'*' | b'_')) => b,
        _ => return false,
    };

    let src = state.src;
    let bytes = src.as_bytes();
    let start = state.pos;
    let max = state.pos_max;

    let run = bytes[start..max].iter().take_while(|&&b| b == marker).count();
    let count = run.min(2);

    // Opener must be left-flanking
    match src[start + run..max].chars().next() {
        Some(c) if !c.is_whitespace() => {}
        _ => return false,
    }
    if marker == b'_' && char_before(src, start).is_some_and(char::is_alphanumeric) {
        return false;
    }

    let content_start = start + count;
    let mut closer = None;
    state.pos = content_start;
    while state.pos < max {
        let pos = state.pos;
        if bytes[pos] == marker && pos > content_start {
            let len = bytes[pos..max].iter().take_while(|&&b| b == marker).count();
            if len >= count && can_close(state, pos, len, marker) {
                closer = Some(pos);
                break;
            }
        }
        state.skip_token();
    }
    state.pos = start;

    let Some(closer) = closer else {
        return false;
    };

    if !silent {
        let (open_kind, close_kind, tag) = if count == 2 {
            (TokenType::StrongOpen, TokenType::StrongClose, "strong")
        } else {
            (TokenType::EmOpen, TokenType::EmClose, "em")
        };
        let markup = &src[start..content_start];

        state.push(open_kind, tag, Nesting::Opening).markup = markup.to_string();
        state.pos = content_start;
        state.pos_max = closer;
        let md = state.md;
        md.inline.tokenize(state);
        state.pos_max = max;
        state.push(close_kind, tag, Nesting::Closing).markup = markup.to_string();
    }

    state.pos = closer + count;
    true
}
