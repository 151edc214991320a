use super::BlockState;
use crate::grammar::Flavor;
use crate::token::{Nesting, TokenType};

/// Embedded markup starting a line, e.g. `<Note kind="tip">` ... `</Note>`.
///
/// The block ends at the first close tag of the same name whose span
/// transforms cleanly. Without one, the lines up to the end of the container
/// are tried as a whole.
pub fn embedded_block(state: &mut BlockState<'_>, start_line: usize, end_line: usize, silent: bool) -> bool {
    let src = state.src;
    if src.as_bytes().get(state.content_start(start_line)) != Some(&b'<') {
        return false;
    }

    let md = state.md;
    let line = state.line_text(start_line).trim();
    let Some(open) = md.grammar.parse_open(line, Flavor::Block) else {
        return false;
    };

    if silent {
        return true;
    }

    let self_closing = md.grammar.parse_self_close(line, Flavor::Block).is_some();
    let mut next = start_line + 1;
    let mut code = None;

    if !self_closing {
        while next < end_line {
            if state.is_outdented(next) {
                break;
            }

            let close = md.grammar.parse_close(state.line_text(next), Flavor::Block);
            if close.is_some_and(|close| close.name == open.name) {
                log::trace!("candidate </{}> for line {} at line {}", open.name, start_line, next);
                let source = state.get_lines(start_line, next + 1, state.blk_indent, true);
                code = md.transform_embedded(&source);
                if code.is_some() {
                    next += 1;
                    break;
                }
            }
            next += 1;
        }
    }

    let code = match code {
        Some(code) => code,
        None => {
            let source = state.get_lines(start_line, next, state.blk_indent, true);
            match md.transform_embedded(&source) {
                Some(code) => code,
                None => {
                    log::debug!("<{}> at line {} is not embedded markup", open.name, start_line);
                    return false;
                }
            }
        }
    };

    state.line = next;
    let token = state.push(TokenType::EmbeddedBlock, "", Nesting::SelfClosing);
    token.map = Some((start_line, next));
    token.content = code;
    true
}
