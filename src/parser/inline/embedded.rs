use super::InlineState;
use crate::grammar::Flavor;
use crate::token::{Nesting, TokenType};

/// Find the close tag for an element whose body starts at `content_start`.
///
/// Nested constructs are skipped whole, so only a close tag sitting where
/// `skip_token` steps a single plain character counts. Returns
/// `(content_end, close_end)`; `pos` is restored either way.
fn find_close(state: &mut InlineState<'_>, content_start: usize, name: &str) -> Option<(usize, usize)> {
    let src = state.src;
    let md = state.md;
    let old_pos = state.pos;
    let max = state.pos_max;
    let mut found = None;

    state.pos = content_start;
    while state.pos < max {
        let prev = state.pos;
        let close = md.grammar.parse_close(&src[prev..max], Flavor::Inline);
        let consumed = state.skip_token();

        if let Some(close) = close {
            if close.name == name && !consumed {
                found = Some((prev, prev + close.end));
                break;
            }
        }
    }

    state.pos = old_pos;
    found
}

/// Embedded markup inside a text run: `<Tag .../>`, `{expression}` or
/// `<Tag ...>body</Tag>` with the body parsed as ordinary inline content.
pub fn embedded_inline(state: &mut InlineState<'_>, silent: bool) -> bool {
    let src = state.src;
    let bytes = src.as_bytes();
    let start = state.pos;
    let max = state.pos_max;

    let Some(&first) = bytes.get(start) else {
        return false;
    };
    if (first != b'<' && first != b'{') || start + 2 >= max {
        return false;
    }
    if first == b'<' {
        let second = bytes[start + 1];
        if !(second.is_ascii_alphabetic() || matches!(second, b'!' | b'?' | b'/')) {
            return false;
        }
    }

    let md = state.md;
    let text = &src[start..max];
    let Some(open) = md.grammar.parse_open(text, Flavor::Inline) else {
        return false;
    };

    if let Some(len) = md.grammar.parse_self_close(text, Flavor::Inline) {
        let Some(code) = md.transform_embedded(&text[..len]) else {
            return false;
        };
        if !silent {
            let token = state.push(TokenType::EmbeddedInline, "", Nesting::SelfClosing);
            token.content = code;
        }
        state.pos = start + len;
        return true;
    }

    let content_start = start + open.end;
    let Some((content_end, close_end)) = find_close(state, content_start, &open.name) else {
        log::debug!("no </{}> for inline <{}> at byte {}", open.name, open.name, start);
        return false;
    };

    // Open tag as a self-closing element gives the call prefix
    let open_tag = &src[start..content_start];
    let synthetic = format!("{}/>", open_tag.strip_suffix('>').unwrap_or(open_tag));
    let Some(code) = md.transform_embedded(&synthetic) else {
        return false;
    };

    if !silent {
        if src[content_start..content_end].trim().is_empty() {
            let token = state.push(TokenType::EmbeddedInline, "", Nesting::SelfClosing);
            token.content = code;
        } else {
            let split = code.char_indices().next_back().map_or(0, |(i, _)| i);
            let (prefix, suffix) = code.split_at(split);

            let token = state.push(TokenType::EmbeddedInline, "", Nesting::Opening);
            token.content = prefix.to_string();

            state.pos = content_start;
            state.pos_max = content_end;
            md.inline.tokenize(state);

            let token = state.push(TokenType::EmbeddedInline, "", Nesting::Closing);
            token.content = suffix.to_string();
        }
    }

    state.pos = close_end;
    state.pos_max = max;
    true
}
