use super::{BlockState, ParentType};
use crate::token::{Nesting, TokenType};

fn is_space(b: u8) -> bool {
    b == b' ' || b == b'\t'
}

/// Indented code block: lines indented 4+ columns past the block indent.
pub fn code(state: &mut BlockState<'_>, start_line: usize, end_line: usize, _silent: bool) -> bool {
    if !state.is_code_indented(start_line) {
        return false;
    }

    let mut next = start_line + 1;
    let mut last = next;
    while next < end_line {
        if state.is_empty(next) {
            next += 1;
            continue;
        }
        if state.is_code_indented(next) {
            next += 1;
            last = next;
            continue;
        }
        break;
    }

    state.line = last;
    let content = state.get_lines(start_line, last, 4 + state.blk_indent, false);
    let token = state.push(TokenType::CodeBlock, "code", Nesting::SelfClosing);
    token.content = content;
    token.map = Some((start_line, last));
    true
}

/// Fenced code block: ``` or ~~~, three or more.
pub fn fence(state: &mut BlockState<'_>, start_line: usize, end_line: usize, silent: bool) -> bool {
    if state.is_code_indented(start_line) {
        return false;
    }

    let src = state.src;
    let bytes = src.as_bytes();
    let mut pos = state.content_start(start_line);
    let max = state.e_marks[start_line];
    if pos + 3 > max {
        return false;
    }

    let marker = bytes[pos];
    if marker != b'`' && marker != b'~' {
        return false;
    }

    let mark_start = pos;
    while pos < max && bytes[pos] == marker {
        pos += 1;
    }
    let len = pos - mark_start;
    if len < 3 {
        return false;
    }

    let markup = &src[mark_start..pos];
    let params = &src[pos..max];
    if marker == b'`' && params.contains('`') {
        return false;
    }

    if silent {
        return true;
    }

    let mut next = start_line;
    let mut have_end_marker = false;
    loop {
        next += 1;
        if next >= end_line {
            // Unclosed fence runs to the end of the container
            break;
        }

        let mut pos = state.content_start(next);
        let max = state.e_marks[next];
        if pos < max && state.is_outdented(next) {
            break;
        }
        if pos >= max || bytes[pos] != marker || state.is_code_indented(next) {
            continue;
        }

        let close_start = pos;
        while pos < max && bytes[pos] == marker {
            pos += 1;
        }
        if pos - close_start < len {
            continue;
        }
        while pos < max && is_space(bytes[pos]) {
            pos += 1;
        }
        if pos < max {
            continue;
        }

        have_end_marker = true;
        break;
    }

    let indent = state.s_count[start_line].max(0) as usize;
    state.line = next + usize::from(have_end_marker);

    let content = state.get_lines(start_line + 1, next, indent, true);
    let line = state.line;
    let token = state.push(TokenType::Fence, "code", Nesting::SelfClosing);
    token.info = params.trim().to_string();
    token.content = content;
    token.markup = markup.to_string();
    token.map = Some((start_line, line));
    true
}

/// Consecutive `>` lines, with lazy paragraph continuation.
pub fn blockquote(state: &mut BlockState<'_>, start_line: usize, end_line: usize, silent: bool) -> bool {
    if state.is_code_indented(start_line) {
        return false;
    }

    let src = state.src;
    let bytes = src.as_bytes();
    if bytes.get(state.content_start(start_line)) != Some(&b'>') {
        return false;
    }
    if silent {
        return true;
    }

    let md = state.md;
    let terminators = md.block.ruler.rules("blockquote");
    let old_indent = state.blk_indent;
    let old_parent = state.parent_type;
    state.parent_type = ParentType::Blockquote;

    // Marks are rewritten so the nested pass sees the text after `>`
    let mut saved: Vec<(usize, usize, isize)> = Vec::new();
    let mut last_line_empty = false;
    let mut next = start_line;

    while next < end_line {
        let pos = state.content_start(next);
        let max = state.e_marks[next];
        let is_outdented = state.s_count[next] < old_indent as isize;

        if pos >= max {
            // Blank line ends the quote
            break;
        }

        if bytes[pos] == b'>' && !is_outdented {
            let mut p = pos + 1;
            if p < max && is_space(bytes[p]) {
                p += 1;
            }
            let marker_end = p;
            let mut offset = 0;
            while p < max && is_space(bytes[p]) {
                offset += if bytes[p] == b'\t' { 4 - offset % 4 } else { 1 };
                p += 1;
            }

            saved.push((state.b_marks[next], state.t_shift[next], state.s_count[next]));
            state.b_marks[next] = marker_end;
            state.t_shift[next] = p - marker_end;
            state.s_count[next] = offset as isize;
            last_line_empty = p >= max;
            next += 1;
            continue;
        }

        if last_line_empty {
            break;
        }

        state.blk_indent = 0;
        let terminate = terminators.iter().any(|rule| rule(state, next, end_line, true));
        state.blk_indent = old_indent;
        if terminate {
            break;
        }

        // Lazy continuation of the paragraph above
        saved.push((state.b_marks[next], state.t_shift[next], state.s_count[next]));
        state.s_count[next] = -1;
        next += 1;
    }

    state.blk_indent = 0;
    let open = state.push(TokenType::BlockquoteOpen, "blockquote", Nesting::Opening);
    open.markup = ">".to_string();
    let open_index = state.tokens.len() - 1;

    md.block.tokenize(state, start_line, next);

    let close = state.push(TokenType::BlockquoteClose, "blockquote", Nesting::Closing);
    close.markup = ">".to_string();
    let end = state.line;
    state.tokens[open_index].map = Some((start_line, end));

    for (i, (b_mark, t_shift, s_count)) in saved.into_iter().enumerate() {
        state.b_marks[start_line + i] = b_mark;
        state.t_shift[start_line + i] = t_shift;
        state.s_count[start_line + i] = s_count;
    }
    state.blk_indent = old_indent;
    state.parent_type = old_parent;
    true
}

/// Thematic break: three or more `*`, `-` or `_`, spaces allowed between.
pub fn hr(state: &mut BlockState<'_>, start_line: usize, _end_line: usize, silent: bool) -> bool {
    if state.is_code_indented(start_line) {
        return false;
    }

    let text = state.line_text(start_line).as_bytes();
    let Some(&marker) = text.first() else {
        return false;
    };
    if !matches!(marker, b'*' | b'-' | b'_') {
        return false;
    }

    let mut count = 0;
    for &b in text {
        if b == marker {
            count += 1;
        } else if !is_space(b) {
            return false;
        }
    }
    if count < 3 {
        return false;
    }
    if silent {
        return true;
    }

    state.line = start_line + 1;
    let token = state.push(TokenType::Hr, "hr", Nesting::SelfClosing);
    token.map = Some((start_line, start_line + 1));
    token.markup = (marker as char).to_string().repeat(count);
    true
}

/// ATX heading, `#` through `######`.
pub fn heading(state: &mut BlockState<'_>, start_line: usize, _end_line: usize, silent: bool) -> bool {
    if state.is_code_indented(start_line) {
        return false;
    }

    let text = state.line_text(start_line);
    let bytes = text.as_bytes();
    let level = bytes.iter().take_while(|&&b| b == b'#').count();
    if level == 0 || level > 6 || (level < bytes.len() && !is_space(bytes[level])) {
        return false;
    }
    if silent {
        return true;
    }

    // Drop a closing `#` run when it is separated by whitespace
    let mut content = text[level..].trim_end_matches([' ', '\t']);
    let without_hashes = content.trim_end_matches('#');
    if without_hashes.len() != content.len()
        && (without_hashes.is_empty() || without_hashes.ends_with([' ', '\t']))
    {
        content = without_hashes;
    }
    let content = content.trim().to_string();

    state.line = start_line + 1;
    let tag = format!("h{}", level);
    let map = Some((start_line, state.line));
    let markup = "#".repeat(level);

    let open = state.push(TokenType::HeadingOpen, &tag, Nesting::Opening);
    open.markup = markup.clone();
    open.map = map;

    let inline = state.push(TokenType::Inline, "", Nesting::SelfClosing);
    inline.content = content;
    inline.map = map;

    let close = state.push(TokenType::HeadingClose, &tag, Nesting::Closing);
    close.markup = markup;
    true
}

/// Paragraph: runs until a blank line or a terminator rule.
pub fn paragraph(state: &mut BlockState<'_>, start_line: usize, end_line: usize, _silent: bool) -> bool {
    let md = state.md;
    let terminators = md.block.ruler.rules("paragraph");
    let old_parent = state.parent_type;
    state.parent_type = ParentType::Paragraph;

    let mut next = start_line + 1;
    while next < end_line && !state.is_empty(next) {
        // Indented or lazy lines always continue the paragraph
        if state.is_code_indented(next) || state.s_count[next] < 0 {
            next += 1;
            continue;
        }
        if terminators.iter().any(|rule| rule(state, next, end_line, true)) {
            break;
        }
        next += 1;
    }

    let content = state.get_lines(start_line, next, state.blk_indent, false).trim().to_string();
    state.line = next;
    let map = Some((start_line, next));

    let open = state.push(TokenType::ParagraphOpen, "p", Nesting::Opening);
    open.map = map;

    let inline = state.push(TokenType::Inline, "", Nesting::SelfClosing);
    inline.content = content;
    inline.map = map;

    state.push(TokenType::ParagraphClose, "p", Nesting::Closing);
    state.parent_type = old_parent;
    true
}
