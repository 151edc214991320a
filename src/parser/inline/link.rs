use super::InlineState;
use crate::parser::unescape_all;
use crate::token::{Nesting, TokenType};

/// Offset of the `]` closing the label that opens at `start`.
fn parse_link_label(state: &mut InlineState<'_>, start: usize) -> Option<usize> {
    let src = state.src;
    let bytes = src.as_bytes();
    let old_pos = state.pos;
    let max = state.pos_max;
    let mut level = 1;
    let mut found = None;

    state.pos = start + 1;
    while state.pos < max {
        let marker = bytes[state.pos];
        if marker == b']' {
            level -= 1;
            if level == 0 {
                found = Some(state.pos);
                break;
            }
        }

        let prev = state.pos;
        let consumed = state.skip_token();
        if marker == b'[' && !consumed && state.pos == prev + 1 {
            level += 1;
        }
    }

    state.pos = old_pos;
    found
}

fn skip_whitespace(bytes: &[u8], mut pos: usize, max: usize) -> usize {
    while pos < max && matches!(bytes[pos], b' ' | b'\t' | b'\n') {
        pos += 1;
    }
    pos
}

/// `<dest>` or a bare destination with balanced parentheses.
fn parse_destination(src: &str, start: usize, max: usize) -> Option<(String, usize)> {
    let bytes = src.as_bytes();
    let mut pos = start;

    if bytes[pos] == b'<' {
        pos += 1;
        while pos < max {
            match bytes[pos] {
                b'\n' | b'<' => return None,
                b'>' => return Some((unescape_all(&src[start + 1..pos]), pos + 1)),
                b'\\' if pos + 1 < max => pos += 2,
                _ => pos += 1,
            }
        }
        return None;
    }

    let mut level = 0u32;
    while pos < max {
        match bytes[pos] {
            b' ' => break,
            b if b < 0x20 || b == 0x7f => break,
            b'\\' if pos + 1 < max => {
                pos += 2;
                continue;
            }
            b'(' => {
                level += 1;
                if level > 32 {
                    return None;
                }
            }
            b')' => {
                if level == 0 {
                    break;
                }
                level -= 1;
            }
            _ => {}
        }
        pos += 1;
    }

    if pos == start || level != 0 {
        return None;
    }
    Some((unescape_all(&src[start..pos]), pos))
}

/// `"title"`, `'title'` or `(title)`.
fn parse_title(src: &str, start: usize, max: usize) -> Option<(String, usize)> {
    let bytes = src.as_bytes();
    let close = match bytes[start] {
        b'"' => b'"',
        b'\'' => b'\'',
        b'(' => b')',
        _ => return None,
    };

    let mut pos = start + 1;
    while pos < max {
        match bytes[pos] {
            b if b == close => return Some((unescape_all(&src[start + 1..pos]), pos + 1)),
            b'(' if close == b')' => return None,
            b'\\' if pos + 1 < max => pos += 2,
            _ => pos += 1,
        }
    }
    None
}

/// Everything after the label: `(dest "title")`.
struct Target {
    href: String,
    title: Option<String>,
    end: usize,
}

fn parse_target(src: &str, label_end: usize, max: usize) -> Option<Target> {
    let bytes = src.as_bytes();
    let mut pos = label_end + 1;
    if pos >= max || bytes[pos] != b'(' {
        return None;
    }

    pos = skip_whitespace(bytes, pos + 1, max);
    if pos >= max {
        return None;
    }

    let mut href = String::new();
    let mut title = None;
    if bytes[pos] != b')' {
        let (dest, dest_end) = parse_destination(src, pos, max)?;
        href = dest;
        pos = skip_whitespace(bytes, dest_end, max);
        if pos < max && pos != dest_end {
            if let Some((parsed, title_end)) = parse_title(src, pos, max) {
                title = Some(parsed);
                pos = skip_whitespace(bytes, title_end, max);
            }
        }
    }

    if pos >= max || bytes[pos] != b')' {
        return None;
    }
    Some(Target { href, title, end: pos + 1 })
}

/// Inline link `[label](dest "title")`.
pub fn link(state: &mut InlineState<'_>, silent: bool) -> bool {
    if state.peek() != Some(b'[') {
        return false;
    }

    let start = state.pos;
    let max = state.pos_max;
    let Some(label_end) = parse_link_label(state, start) else {
        return false;
    };
    let Some(target) = parse_target(state.src, label_end, max) else {
        return false;
    };

    if !silent {
        let open = state.push(TokenType::LinkOpen, "a", Nesting::Opening);
        open.attr_push("href", target.href);
        if let Some(title) = target.title {
            open.attr_push("title", title);
        }

        state.pos = start + 1;
        state.pos_max = label_end;
        let md = state.md;
        md.inline.tokenize(state);
        state.pos_max = max;

        state.push(TokenType::LinkClose, "a", Nesting::Closing);
    }

    state.pos = target.end;
    true
}

/// Image `![alt](src "title")`; the alt text is parsed into children.
pub fn image(state: &mut InlineState<'_>, silent: bool) -> bool {
    let src = state.src;
    let start = state.pos;
    if !src[start..state.pos_max].starts_with("![") {
        return false;
    }

    let max = state.pos_max;
    let Some(label_end) = parse_link_label(state, start + 1) else {
        return false;
    };
    let Some(target) = parse_target(src, label_end, max) else {
        return false;
    };

    if !silent {
        let label = &src[start + 2..label_end];
        let md = state.md;
        let children = md.inline.parse(label, md);

        let token = state.push(TokenType::Image, "img", Nesting::SelfClosing);
        token.attr_push("src", target.href);
        token.attr_push("alt", "");
        if let Some(title) = target.title {
            token.attr_push("title", title);
        }
        token.children = children;
        token.content = label.to_string();
    }

    state.pos = target.end;
    true
}
