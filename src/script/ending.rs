use crate::errors::GenResult;

use super::{parse_sysline, Line, SceneKind, ScriptSettings, SysLine, TextLine, Token};

/// Ending scripts keep leading whitespace, since multi-line text may be indented on purpose.
/// A trailing `\` continues the text onto the next line, keeping the break.
pub(super) fn tokenize(source: &str, settings: &ScriptSettings) -> GenResult<Vec<Token>> {
    let mut tokens = Vec::new();
    let mut buffer: Vec<&str> = Vec::new();

    let text_line = |text: String| {
        let duration = settings.durations.duration_of(&text);
        Token::Line(Line::Text(TextLine {
            speaker: None,
            expression: None,
            text,
            duration,
            page: None,
        }))
    };

    for (index, raw) in source.lines().enumerate() {
        let line = raw.trim_end();

        if line.is_empty() || line.starts_with("//") {
            continue;
        }

        if let Some(body) = line.strip_prefix('@') {
            let sysline = parse_sysline(SceneKind::Ending, body, index + 1, settings)?;
            tokens.push(Token::Line(Line::Sys(sysline)));
        } else if line.starts_with("---") {
            tokens.push(Token::Line(Line::Sys(SysLine::PageTurn)));
        } else if let Some(continued) = line.strip_suffix('\\') {
            buffer.push(continued);
        } else {
            buffer.push(line);
            tokens.push(text_line(buffer.join("\n")));
            buffer.clear();
        }
    }

    if !buffer.is_empty() {
        tokens.push(text_line(buffer.join("\n")));
    }

    Ok(tokens)
}
