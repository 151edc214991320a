use super::{BlockState, ParentType};
use crate::token::{Nesting, TokenType};

/// Offset just past a `-`, `+` or `*` marker that is followed by whitespace.
fn skip_bullet_marker(state: &BlockState<'_>, line: usize) -> Option<usize> {
    let bytes = state.src.as_bytes();
    let pos = state.content_start(line);
    let max = state.e_marks[line];
    if pos >= max || !matches!(bytes[pos], b'*' | b'-' | b'+') {
        return None;
    }
    let after = pos + 1;
    if after < max && !matches!(bytes[after], b' ' | b'\t') {
        return None;
    }
    Some(after)
}

/// Offset just past a `1.` or `1)` marker, plus the number.
fn skip_ordered_marker(state: &BlockState<'_>, line: usize) -> Option<(usize, u64)> {
    let bytes = state.src.as_bytes();
    let start = state.content_start(line);
    let max = state.e_marks[line];

    let digits = bytes[start..max].iter().take_while(|b| b.is_ascii_digit()).count();
    if digits == 0 || digits > 9 {
        return None;
    }
    let pos = start + digits;
    if pos >= max || !matches!(bytes[pos], b'.' | b')') {
        return None;
    }
    let after = pos + 1;
    if after < max && !matches!(bytes[after], b' ' | b'\t') {
        return None;
    }
    let value = state.src[start..pos].parse().ok()?;
    Some((after, value))
}

/// Bullet and ordered lists. Tight lists hide their item paragraphs.
pub fn list(state: &mut BlockState<'_>, start_line: usize, end_line: usize, silent: bool) -> bool {
    if state.is_code_indented(start_line) {
        return false;
    }

    // Only a non-empty item (and for ordered lists, one numbered 1) may cut a paragraph short
    let is_terminating_paragraph = silent
        && state.parent_type == ParentType::Paragraph
        && !state.is_outdented(start_line);

    let (is_ordered, mut pos_after_marker, start_value) = match skip_ordered_marker(state, start_line) {
        Some((pos, value)) => {
            if is_terminating_paragraph && value != 1 {
                return false;
            }
            (true, pos, value)
        }
        None => match skip_bullet_marker(state, start_line) {
            Some(pos) => (false, pos, 1),
            None => return false,
        },
    };

    if is_terminating_paragraph
        && state.src[pos_after_marker..state.e_marks[start_line]].trim().is_empty()
    {
        return false;
    }

    if silent {
        return true;
    }

    let md = state.md;
    let src = state.src;
    let bytes = src.as_bytes();
    let marker = bytes[pos_after_marker - 1];
    let terminators = md.block.ruler.rules("list");

    let list_index = state.tokens.len();
    let (open_kind, close_kind, tag) = if is_ordered {
        (TokenType::OrderedListOpen, TokenType::OrderedListClose, "ol")
    } else {
        (TokenType::BulletListOpen, TokenType::BulletListClose, "ul")
    };
    let open = state.push(open_kind, tag, Nesting::Opening);
    open.markup = (marker as char).to_string();
    if is_ordered && start_value != 1 {
        open.attr_push("start", start_value.to_string());
    }

    let old_parent = state.parent_type;
    state.parent_type = ParentType::List;

    let mut next = start_line;
    let mut prev_empty_end = false;
    let mut tight = true;

    while next < end_line {
        let max = state.e_marks[next];
        let marker_columns = (pos_after_marker - state.content_start(next)) as isize;
        let initial = state.s_count[next] + marker_columns;

        let mut offset = initial;
        let mut pos = pos_after_marker;
        while pos < max {
            match bytes[pos] {
                b'\t' => offset += 4 - offset % 4,
                b' ' => offset += 1,
                _ => break,
            }
            pos += 1;
        }
        let content_start = pos;

        // Content more than 4 columns past the marker is an indented code block
        let mut indent_after_marker = if content_start >= max { 1 } else { offset - initial };
        if indent_after_marker > 4 {
            indent_after_marker = 1;
        }
        let indent = (initial + indent_after_marker).max(0) as usize;

        let item_index = state.tokens.len();
        let marker_line_start = state.content_start(next);
        let item = state.push(TokenType::ListItemOpen, "li", Nesting::Opening);
        item.markup = (marker as char).to_string();
        if is_ordered {
            item.info = src[marker_line_start..pos_after_marker - 1].to_string();
        }

        let old_tight = state.tight;
        let old_t_shift = state.t_shift[next];
        let old_s_count = state.s_count[next];
        let old_blk_indent = state.blk_indent;

        state.blk_indent = indent;
        state.tight = true;
        state.t_shift[next] = content_start - state.b_marks[next];
        state.s_count[next] = offset;

        if content_start >= max && state.is_empty(next + 1) {
            // An empty item followed by a blank line ends here
            state.line = (next + 2).min(end_line);
        } else {
            md.block.tokenize(state, next, end_line);
        }

        if !state.tight || prev_empty_end {
            tight = false;
        }
        prev_empty_end = state.line - next > 1 && state.is_empty(state.line - 1);

        state.blk_indent = old_blk_indent;
        state.t_shift[next] = old_t_shift;
        state.s_count[next] = old_s_count;
        state.tight = old_tight;

        let item_end = state.line.max(next + 1);
        state.push(TokenType::ListItemClose, "li", Nesting::Closing).markup = (marker as char).to_string();
        state.tokens[item_index].map = Some((next, item_end));

        next = item_end;
        state.line = next;

        if next >= end_line || state.is_outdented(next) || state.is_code_indented(next) {
            break;
        }
        if terminators.iter().any(|rule| rule(state, next, end_line, true)) {
            break;
        }

        let next_marker = if is_ordered {
            skip_ordered_marker(state, next).map(|(pos, _)| pos)
        } else {
            skip_bullet_marker(state, next)
        };
        match next_marker {
            Some(pos) if bytes[pos - 1] == marker => pos_after_marker = pos,
            _ => break,
        }
    }

    state.push(close_kind, tag, Nesting::Closing).markup = (marker as char).to_string();
    state.tokens[list_index].map = Some((start_line, next));
    state.line = next;
    state.parent_type = old_parent;

    if tight {
        mark_tight_paragraphs(state, list_index);
    }
    true
}

fn mark_tight_paragraphs(state: &mut BlockState<'_>, list_index: usize) {
    let level = state.level + 2;
    let mut i = list_index + 2;
    while i + 2 < state.tokens.len() {
        if state.tokens[i].level == level && state.tokens[i].kind == TokenType::ParagraphOpen {
            state.tokens[i].hidden = true;
            state.tokens[i + 2].hidden = true;
            i += 2;
        }
        i += 1;
    }
}
