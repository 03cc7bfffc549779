use crate::errors::{GenError, GenResult};

use super::{is_comment, parse_sysline, Line, SceneKind, ScriptSettings, TextLine, Token};

pub(super) fn tokenize(source: &str, settings: &ScriptSettings) -> GenResult<Vec<Token>> {
    let mut tokens = Vec::new();

    for (index, raw) in source.lines().enumerate() {
        let number = index + 1;
        let line = raw.trim();

        if is_comment(line) {
            continue;
        }

        if let Some(body) = line.strip_prefix('@') {
            let sysline = parse_sysline(SceneKind::Dialogue, body, number, settings)?;
            tokens.push(Token::Line(Line::Sys(sysline)));
        } else if let Some(name) = line.strip_prefix("===") {
            tokens.push(Token::Chapter {
                name: name.trim().to_owned(),
                line: number,
            });
        } else {
            tokens.push(Token::Line(Line::Text(parse_text(line, number, settings)?)));
        }
    }

    Ok(tokens)
}

fn parse_text(line: &str, number: usize, settings: &ScriptSettings) -> GenResult<TextLine> {
    let (captures, expression) = match settings.dialogue_regex.captures(line) {
        Some(captures) => {
            let expression = captures
                .name("expression")
                .map(|found| found.as_str().trim().to_owned())
                .filter(|expression| !expression.is_empty());
            (captures, expression)
        }
        None => match settings.short_dialogue_regex.captures(line) {
            Some(captures) => (captures, None),
            None => {
                return Err(GenError::line_parse(
                    number,
                    format!("unrecognized line: '{line}'"),
                ))
            }
        },
    };

    let group = |name: &str| {
        captures
            .name(name)
            .map(|found| found.as_str().trim())
            .filter(|value| !value.is_empty())
            .ok_or_else(|| {
                GenError::line_parse(number, format!("line has no '{name}' in '{line}'"))
            })
    };

    let speaker = group("name")?.to_lowercase();
    let text = group("text")?.to_owned();
    let duration = settings.durations.duration_of(&text);

    Ok(TextLine {
        speaker: Some(speaker),
        expression,
        text,
        duration,
        page: None,
    })
}
