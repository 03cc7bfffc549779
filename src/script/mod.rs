//! Script tokenizing: raw text → ordered [`Line`] values split into chapters.
//!
//! Each scene kind has its own surface syntax (see the submodules) but they all
//! produce the same line model and share the sysline grammar.

mod bio;
mod dialogue;
mod ending;

use log::debug;
use regex::Regex;
use serde_json::Value;

use crate::context::ConfigContext;
use crate::durations::{parse_time, DurationTable, Frames};
use crate::errors::{GenError, GenResult};
use crate::info::SceneInfo;
use crate::schema::{ProjectConfig, Side};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SceneKind {
    Dialogue,
    Bio,
    Ending,
}

impl SceneKind {
    pub fn label(self) -> &'static str {
        match self {
            Self::Dialogue => "dialogue",
            Self::Bio => "bio",
            Self::Ending => "ending",
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum Line {
    Text(TextLine),
    Sys(SysLine),
}

impl Line {
    /// Time the line occupies on the timeline, if any.
    pub fn duration(&self) -> Option<Frames> {
        match self {
            Self::Text(text) => Some(text.duration),
            Self::Sys(sys) => sys.duration(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Page {
    pub number: usize,
    pub total: usize,
}

#[derive(Debug, Clone, PartialEq)]
pub struct TextLine {
    pub speaker: Option<String>,
    pub expression: Option<String>,
    pub text: String,
    pub duration: Frames,
    /// Bio blocks only.
    pub page: Option<Page>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum SysLine {
    Set {
        name: String,
        property: String,
        value: Value,
    },
    Unset {
        name: String,
        property: String,
    },
    Reset {
        name: String,
    },
    ResetAll,
    Alias {
        name: String,
        alias: String,
    },
    Unalias {
        alias: String,
    },
    Nick {
        name: String,
        nick: String,
    },
    Unnick {
        name: String,
    },
    Component {
        group: String,
        component: String,
    },
    Define {
        name: String,
        value: String,
    },
    Expression {
        name: String,
        expression: String,
    },
    Enter {
        name: String,
    },
    Exit {
        name: String,
    },
    EnterAll {
        side: Option<Side>,
    },
    ExitAll {
        side: Option<Side>,
    },
    Wait {
        duration: Frames,
    },
    Sleep {
        duration: Frames,
    },
    Nametag {
        name: String,
    },
    Speaker {
        name: Option<String>,
    },
    BgImage {
        resource: Option<String>,
    },
    PageTurn,
}

impl SysLine {
    pub fn duration(&self) -> Option<Frames> {
        match self {
            Self::Wait { duration } | Self::Sleep { duration } => Some(*duration),
            _ => None,
        }
    }

    /// Config side effects shared by every interpreter. Interpreters run this on each
    /// sysline before their own handling.
    pub fn pre_hook<I: SceneInfo>(&self, ctx: &mut ConfigContext<'_, I>) -> GenResult<()> {
        match self {
            Self::Set {
                name,
                property,
                value,
            } => ctx.set_property(name, property, value.clone()),
            Self::Unset { name, property } => ctx.unset_property(name, property),
            Self::Reset { name } => ctx.reset(name),
            Self::ResetAll => {
                ctx.reset_all();
                Ok(())
            }
            Self::Alias { name, alias } => {
                ctx.add_local_alias(name, alias);
                Ok(())
            }
            Self::Unalias { alias } => ctx.remove_local_alias(alias),
            Self::Nick { name, nick } => ctx.nick(name, nick),
            Self::Unnick { name } => ctx.unnick(name),
            Self::Define { name, value } => {
                ctx.define_resource(name, value);
                Ok(())
            }
            _ => Ok(()),
        }
    }
}

/// Everything the tokenizers need from the loaded config.
#[derive(Debug, Clone)]
pub struct ScriptSettings {
    pub dialogue_regex: Regex,
    pub short_dialogue_regex: Regex,
    pub durations: DurationTable,
    pub fps: u32,
}

impl ScriptSettings {
    pub fn from_config(config: &ProjectConfig) -> GenResult<Self> {
        let compile = |key: &str, pattern: &str| {
            Regex::new(pattern).map_err(|error| GenError::InvalidPropertyValue {
                owner: format!("parsing.{key}"),
                message: error.to_string(),
            })
        };

        Ok(Self {
            dialogue_regex: compile("dialogueRegex", &config.parsing.dialogue_regex)?,
            short_dialogue_regex: compile(
                "shortDialogueRegex",
                &config.parsing.short_dialogue_regex,
            )?,
            durations: DurationTable::new(&config.durations, config.fps())?,
            fps: config.fps(),
        })
    }
}

#[derive(Debug, Clone, PartialEq)]
enum Token {
    Line(Line),
    Chapter { name: String, line: usize },
}

#[derive(Debug, Clone, PartialEq)]
pub struct Chapter {
    pub name: String,
    pub lines: Vec<Line>,
}

/// One interpretation pass: the common prefix plus one chapter, or the whole script.
#[derive(Debug, Clone, PartialEq)]
pub struct Segment {
    pub chapter: Option<String>,
    pub lines: Vec<Line>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Script {
    pub kind: SceneKind,
    pub common: Vec<Line>,
    pub chapters: Vec<Chapter>,
}

impl Script {
    pub fn parse(kind: SceneKind, source: &str, settings: &ScriptSettings) -> GenResult<Self> {
        let tokens = match kind {
            SceneKind::Dialogue => dialogue::tokenize(source, settings)?,
            SceneKind::Bio => bio::tokenize(source, settings)?,
            SceneKind::Ending => ending::tokenize(source, settings)?,
        };
        let script = Self::from_tokens(kind, tokens)?;
        debug!(
            "parsed {} script: {} common lines, {} chapters",
            kind.label(),
            script.common.len(),
            script.chapters.len()
        );
        Ok(script)
    }

    fn from_tokens(kind: SceneKind, tokens: Vec<Token>) -> GenResult<Self> {
        let mut common = Vec::new();
        let mut chapters: Vec<Chapter> = Vec::new();

        for token in tokens {
            match token {
                Token::Chapter { name, line } => {
                    if chapters.iter().any(|chapter| chapter.name == name) {
                        return Err(GenError::line_parse(
                            line,
                            format!("chapter '{name}' is declared twice"),
                        ));
                    }
                    chapters.push(Chapter {
                        name,
                        lines: Vec::new(),
                    });
                }
                Token::Line(line) => match chapters.last_mut() {
                    Some(chapter) => chapter.lines.push(line),
                    None => common.push(line),
                },
            }
        }

        Ok(Self {
            kind,
            common,
            chapters,
        })
    }

    pub fn chapter_names(&self) -> impl Iterator<Item = &str> {
        self.chapters.iter().map(|chapter| chapter.name.as_str())
    }

    /// The passes to run: the whole script when it has no chapters, otherwise common + each chapter.
    pub fn segments(&self) -> Vec<Segment> {
        if self.chapters.is_empty() {
            return vec![Segment {
                chapter: None,
                lines: self.common.clone(),
            }];
        }

        self.chapters
            .iter()
            .map(|chapter| Segment {
                chapter: Some(chapter.name.clone()),
                lines: self
                    .common
                    .iter()
                    .chain(chapter.lines.iter())
                    .cloned()
                    .collect(),
            })
            .collect()
    }
}

fn is_comment(line: &str) -> bool {
    line.is_empty() || line.starts_with('#') || line.starts_with("//") || line.starts_with('(')
}

/// Parses the text after `@`.
fn parse_sysline(
    kind: SceneKind,
    body: &str,
    line: usize,
    settings: &ScriptSettings,
) -> GenResult<SysLine> {
    let body = body.trim();
    let (command, args) = match body.split_once(char::is_whitespace) {
        Some((command, args)) => (command, args.trim()),
        None => (body, ""),
    };
    let fail = |message: String| GenError::line_parse(line, message);
    let words: Vec<&str> = args.split_whitespace().collect();
    let invalid = || fail(format!("invalid args for @{command}: '{args}'"));

    let sysline = match (command, words.as_slice()) {
        ("set", _) => {
            let mut parts = args.splitn(3, char::is_whitespace);
            match (parts.next(), parts.next(), parts.next()) {
                (Some(name), Some(property), Some(value)) if !name.is_empty() => SysLine::Set {
                    name: name.to_lowercase(),
                    property: property.to_owned(),
                    value: parse_literal(value.trim()).ok_or_else(|| {
                        fail(format!("@set value '{}' is not a valid literal", value.trim()))
                    })?,
                },
                _ => return Err(invalid()),
            }
        }
        ("unset", [name, property]) => SysLine::Unset {
            name: name.to_lowercase(),
            property: (*property).to_owned(),
        },
        ("reset", [name]) => SysLine::Reset {
            name: name.to_lowercase(),
        },
        ("resetall", []) => SysLine::ResetAll,
        ("alias", [name, alias]) => SysLine::Alias {
            name: name.to_lowercase(),
            alias: alias.to_lowercase(),
        },
        ("unalias", [alias]) => SysLine::Unalias {
            alias: alias.to_lowercase(),
        },
        ("nick", [name, nick]) => SysLine::Nick {
            name: name.to_lowercase(),
            nick: (*nick).to_owned(),
        },
        ("unnick", [name]) => SysLine::Unnick {
            name: name.to_lowercase(),
        },
        ("component", [group, ..]) if words.len() >= 2 => SysLine::Component {
            group: (*group).to_owned(),
            component: args[group.len()..].trim().to_owned(),
        },

        ("expression", _) if kind != SceneKind::Ending => match args.split_once(char::is_whitespace) {
            Some((name, expression)) if !expression.trim().is_empty() => SysLine::Expression {
                name: name.to_lowercase(),
                expression: expression.trim().to_owned(),
            },
            _ => return Err(invalid()),
        },

        ("enter", [name]) if kind == SceneKind::Dialogue => SysLine::Enter {
            name: name.to_lowercase(),
        },
        ("exit", [name]) if kind == SceneKind::Dialogue => SysLine::Exit {
            name: name.to_lowercase(),
        },
        ("enterall", sides) if kind == SceneKind::Dialogue => SysLine::EnterAll {
            side: parse_side(sides).ok_or_else(invalid)?,
        },
        ("exitall", sides) if kind == SceneKind::Dialogue => SysLine::ExitAll {
            side: parse_side(sides).ok_or_else(invalid)?,
        },
        ("nametag", [name]) if kind == SceneKind::Dialogue => SysLine::Nametag {
            name: name.to_lowercase(),
        },

        ("wait", [duration]) if kind != SceneKind::Bio => SysLine::Wait {
            duration: parse_duration(duration, line, settings)?,
        },
        ("sleep", [duration]) if kind != SceneKind::Bio => SysLine::Sleep {
            duration: parse_duration(duration, line, settings)?,
        },

        ("speaker", [name]) if kind == SceneKind::Ending => SysLine::Speaker {
            name: (!name.eq_ignore_ascii_case("none")).then(|| name.to_lowercase()),
        },
        ("bgimage", _) if kind == SceneKind::Ending && !args.is_empty() => SysLine::BgImage {
            resource: (args != "none").then(|| args.to_owned()),
        },

        (
            "set" | "unset" | "reset" | "resetall" | "alias" | "unalias" | "nick" | "unnick"
            | "component",
            _,
        ) => return Err(invalid()),
        _ => {
            return Err(fail(format!(
                "unrecognized sysline for {} scripts: '@{body}'",
                kind.label()
            )))
        }
    };

    Ok(sysline)
}

fn parse_side(words: &[&str]) -> Option<Option<Side>> {
    match words {
        [] => Some(None),
        [side] => Side::parse(side).map(Some),
        _ => None,
    }
}

fn parse_duration(raw: &str, line: usize, settings: &ScriptSettings) -> GenResult<Frames> {
    let frames = parse_time(raw, settings.fps)
        .map_err(|error| GenError::line_parse(line, error.to_string()))?;
    if frames < 0 {
        return Err(GenError::line_parse(
            line,
            format!("duration '{raw}' is negative"),
        ));
    }
    Ok(frames)
}

/// `@set` values: any JSON literal, or a single-quoted string.
fn parse_literal(raw: &str) -> Option<Value> {
    if let Ok(value) = serde_json::from_str::<Value>(raw) {
        return Some(value);
    }
    raw.strip_prefix('\'')
        .and_then(|rest| rest.strip_suffix('\''))
        .map(|inner| Value::String(inner.to_owned()))
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use serde_json::json;

    pub(crate) fn settings() -> ScriptSettings {
        let config: ProjectConfig = serde_json::from_value(json!({
            "videoMode": { "width": 1280, "height": 720, "fps": 30 },
            "durations": {
                "mode": "char",
                "thresholds": [{ "count": 0, "duration": 30 }, { "count": 10, "duration": 60 }]
            }
        }))
        .expect("config should parse");
        ScriptSettings::from_config(&config).expect("settings should build")
    }

    fn sys(kind: SceneKind, body: &str) -> GenResult<SysLine> {
        parse_sysline(kind, body, 7, &settings())
    }

    #[test]
    fn set_accepts_json_and_single_quoted_literals() {
        assert_eq!(
            sys(SceneKind::Dialogue, "set Alice headerFontSize 40").expect("number"),
            SysLine::Set {
                name: "alice".to_owned(),
                property: "headerFontSize".to_owned(),
                value: json!(40)
            }
        );
        assert_eq!(
            sys(SceneKind::Bio, "set bob displayName 'Mr. Bob'").expect("quoted"),
            SysLine::Set {
                name: "bob".to_owned(),
                property: "displayName".to_owned(),
                value: json!("Mr. Bob")
            }
        );
        let err = sys(SceneKind::Ending, "set bob displayName Mr. Bob").expect_err("bare words");
        assert!(matches!(err, GenError::LineParse { line: 7, .. }));
    }

    #[test]
    fn scene_specific_commands_are_rejected_elsewhere() {
        assert!(sys(SceneKind::Dialogue, "enter alice").is_ok());
        assert!(sys(SceneKind::Bio, "enter alice").is_err());
        assert!(sys(SceneKind::Bio, "wait 10").is_err());
        assert!(sys(SceneKind::Ending, "expression alice smile").is_err());
        assert!(sys(SceneKind::Dialogue, "speaker alice").is_err());
        assert!(sys(SceneKind::Dialogue, "dance alice").is_err());
    }

    #[test]
    fn durations_and_sides_parse() {
        assert_eq!(
            sys(SceneKind::Dialogue, "wait 1.0").expect("seconds"),
            SysLine::Wait { duration: 29 }
        );
        assert_eq!(
            sys(SceneKind::Ending, "sleep 12").expect("frames"),
            SysLine::Sleep { duration: 12 }
        );
        assert!(sys(SceneKind::Dialogue, "wait -3").is_err());
        assert_eq!(
            sys(SceneKind::Dialogue, "exitall e").expect("side"),
            SysLine::ExitAll {
                side: Some(Side::Enemy)
            }
        );
        assert_eq!(
            sys(SceneKind::Dialogue, "enterall").expect("everyone"),
            SysLine::EnterAll { side: None }
        );
        assert!(sys(SceneKind::Dialogue, "enterall both").is_err());
    }

    #[test]
    fn ending_speaker_and_background_accept_none() {
        assert_eq!(
            sys(SceneKind::Ending, "speaker none").expect("none"),
            SysLine::Speaker { name: None }
        );
        assert_eq!(
            sys(SceneKind::Ending, "bgimage !stage!sky.png").expect("resource"),
            SysLine::BgImage {
                resource: Some("!stage!sky.png".to_owned())
            }
        );
        assert_eq!(
            sys(SceneKind::Ending, "bgimage none").expect("none"),
            SysLine::BgImage { resource: None }
        );
    }

    #[test]
    fn component_keeps_the_rest_of_the_line() {
        assert_eq!(
            sys(SceneKind::Dialogue, "component intro fill:!bg!intro.png").expect("component"),
            SysLine::Component {
                group: "intro".to_owned(),
                component: "fill:!bg!intro.png".to_owned()
            }
        );
    }

    #[test]
    fn chapters_share_the_common_prefix() {
        let source = "@alias alice al\n=== one\nal: hi\n=== two\nal: bye\n";
        let script = Script::parse(SceneKind::Dialogue, source, &settings()).expect("parses");
        assert_eq!(script.chapter_names().collect::<Vec<_>>(), ["one", "two"]);

        let segments = script.segments();
        assert_eq!(segments.len(), 2);
        assert_eq!(segments[1].chapter.as_deref(), Some("two"));
        assert_eq!(segments[1].lines.len(), 2);
        assert!(matches!(segments[1].lines[0], Line::Sys(SysLine::Alias { .. })));

        let err = Script::parse(SceneKind::Dialogue, "=== a\n=== a\n", &settings())
            .expect_err("duplicate chapter");
        assert!(matches!(err, GenError::LineParse { line: 2, .. }));
    }

    #[test]
    fn component_declarations_keep_the_full_name() {
        let source = "@component outro tfill:!bg!dusk sky.png\n";
        let script = Script::parse(SceneKind::Dialogue, source, &settings()).expect("parses");
        assert_eq!(
            script.common,
            [Line::Sys(SysLine::Component {
                group: "outro".to_owned(),
                component: "tfill:!bg!dusk sky.png".to_owned()
            })]
        );
    }
}
