//! Bio scripts are written as free-form text blocks separated by `---` markers.
//!
//! Outside a block (`Pending`) lines are trimmed and may be comments, syslines,
//! `!` directives or chapter markers. Inside a block every line is text.

use crate::durations::{parse_time, Frames};
use crate::errors::{GenError, GenResult};

use super::{is_comment, parse_sysline, Line, Page, SceneKind, ScriptSettings, SysLine, TextLine, Token};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum State {
    Pending,
    InBlock,
}

/// `!dur`: rewrites the duration of the next block.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum DurationRewrite {
    Add(Frames),
    Subtract(Frames),
    Replace(Frames),
}

#[derive(Debug, Clone, Copy)]
struct PendingRewrite {
    rewrite: DurationRewrite,
    line: usize,
}

impl DurationRewrite {
    fn parse(raw: &str, line: usize, fps: u32) -> GenResult<Self> {
        let frames = |value: &str| {
            parse_time(value, fps).map_err(|error| GenError::line_parse(line, error.to_string()))
        };
        if let Some(value) = raw.strip_prefix('+') {
            Ok(Self::Add(frames(value)?))
        } else if let Some(value) = raw.strip_prefix('-') {
            Ok(Self::Subtract(frames(value)?))
        } else if let Some(value) = raw.strip_prefix('=') {
            Ok(Self::Replace(frames(value)?))
        } else {
            Ok(Self::Replace(frames(raw)?))
        }
    }

    fn apply(self, duration: Frames) -> Frames {
        match self {
            Self::Add(frames) => duration + frames,
            Self::Subtract(frames) => duration - frames,
            Self::Replace(frames) => frames,
        }
    }
}

struct BlockBuilder<'s> {
    settings: &'s ScriptSettings,
    buffer: Vec<String>,
    rewrites: Vec<PendingRewrite>,
    speaker: Option<String>,
    pages: usize,
}

impl BlockBuilder<'_> {
    /// Turns the buffered lines into a block. Blocks with no visible text are
    /// dropped and leave any `!dur` rewrites waiting for the next block.
    fn flush(&mut self) -> GenResult<Option<TextLine>> {
        let lines = std::mem::take(&mut self.buffer);
        let start = lines
            .iter()
            .position(|line| !line.trim().is_empty())
            .unwrap_or(lines.len());
        let end = lines
            .iter()
            .rposition(|line| !line.trim().is_empty())
            .map_or(start, |index| index + 1);
        if start >= end {
            return Ok(None);
        }

        let text = lines[start..end].join("\n");
        let mut duration = self.settings.durations.duration_of(&text);
        for pending in self.rewrites.drain(..) {
            duration = pending.rewrite.apply(duration);
            if duration <= 0 {
                return Err(GenError::line_parse(
                    pending.line,
                    format!("!dur leaves the next bio block with {duration} frames"),
                ));
            }
        }

        self.pages += 1;
        Ok(Some(TextLine {
            speaker: self.speaker.clone(),
            expression: None,
            text,
            duration,
            page: Some(Page {
                number: self.pages,
                total: 0,
            }),
        }))
    }

    fn flush_into(&mut self, tokens: &mut Vec<Token>) -> GenResult<()> {
        if let Some(block) = self.flush()? {
            tokens.push(Token::Line(Line::Text(block)));
        }
        Ok(())
    }

    fn switch_speaker(&mut self, marker_rest: &str) {
        let name = marker_rest.trim();
        if !name.is_empty() {
            self.speaker = Some(name.to_lowercase());
        }
    }
}

pub(super) fn tokenize(source: &str, settings: &ScriptSettings) -> GenResult<Vec<Token>> {
    let mut tokens = Vec::new();
    let mut state = State::Pending;
    let mut builder = BlockBuilder {
        settings,
        buffer: Vec::new(),
        rewrites: Vec::new(),
        speaker: None,
        pages: 0,
    };

    for (index, raw) in source.lines().enumerate() {
        let number = index + 1;

        match state {
            State::Pending => {
                let line = raw.trim();
                if is_comment(line) {
                    continue;
                }

                if let Some(body) = line.strip_prefix('@') {
                    let sysline = parse_sysline(SceneKind::Bio, body, number, settings)?;
                    tokens.push(Token::Line(Line::Sys(sysline)));
                } else if let Some(body) = line.strip_prefix('!') {
                    if let Some(define) = parse_directive(body, number, &mut builder)? {
                        tokens.push(Token::Line(Line::Sys(define)));
                    }
                } else if let Some(rest) = line.strip_prefix("---*") {
                    builder.switch_speaker(rest);
                    state = State::InBlock;
                } else if let Some(rest) = line.strip_prefix("---") {
                    builder.switch_speaker(rest);
                } else if let Some(name) = line.strip_prefix("===") {
                    tokens.push(Token::Chapter {
                        name: name.trim().to_owned(),
                        line: number,
                    });
                } else {
                    builder.buffer.push(line.to_owned());
                    state = State::InBlock;
                }
            }
            State::InBlock => {
                let line = raw.trim_end();

                if let Some(rest) = line.strip_prefix("---*") {
                    builder.flush_into(&mut tokens)?;
                    builder.switch_speaker(rest);
                } else if let Some(rest) = line.strip_prefix("---") {
                    builder.flush_into(&mut tokens)?;
                    builder.switch_speaker(rest);
                    state = State::Pending;
                } else if let Some(name) = line.strip_prefix("===") {
                    builder.flush_into(&mut tokens)?;
                    tokens.push(Token::Chapter {
                        name: name.trim().to_owned(),
                        line: number,
                    });
                    state = State::Pending;
                } else {
                    builder.buffer.push(line.to_owned());
                }
            }
        }
    }
    builder.flush_into(&mut tokens)?;

    let total = builder.pages;
    for token in &mut tokens {
        if let Token::Line(Line::Text(TextLine {
            page: Some(page), ..
        })) = token
        {
            page.total = total;
        }
    }

    Ok(tokens)
}

fn parse_directive(
    body: &str,
    line: usize,
    builder: &mut BlockBuilder<'_>,
) -> GenResult<Option<SysLine>> {
    let (directive, args) = match body.trim().split_once(char::is_whitespace) {
        Some((directive, args)) => (directive, args.trim()),
        None => (body.trim(), ""),
    };

    match directive {
        "dur" if !args.is_empty() => {
            let rewrite = DurationRewrite::parse(args, line, builder.settings.fps)?;
            builder.rewrites.push(PendingRewrite { rewrite, line });
            Ok(None)
        }
        "define" => match args.split_once(char::is_whitespace) {
            Some((name, value)) if !value.trim().is_empty() => Ok(Some(SysLine::Define {
                name: name.to_owned(),
                value: value.trim().to_owned(),
            })),
            _ => Err(GenError::line_parse(
                line,
                format!("invalid !define directive: '!{body}'"),
            )),
        },
        _ => Err(GenError::line_parse(
            line,
            format!("unrecognized directive: '!{body}'"),
        )),
    }
}
