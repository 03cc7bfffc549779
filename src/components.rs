//! Component names from the command line: built-ins, script-declared groups and config macros.

use std::fmt;

use anyhow::Result;
use log::{debug, warn};
use serde_json::json;

use crate::error_codes::{CliError, COMPONENT_CYCLE, UNKNOWN_COMPONENT};
use crate::errors::GenError;
use crate::schema::{ProjectConfig, Side};
use crate::script::{Line, SceneKind, SysLine};

/// One generator to run. Each produces one or more tracks.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Component {
    Text,
    Header,
    Nametag,
    Chars(Option<Side>),
    Char(String),
    ProgressBar,
    PageNum,
    Portrait(String),
    Title(String),
    BgImage,
    Fill(String),
    TFill(String),
}

impl Component {
    /// Parses a built-in component name valid for `kind`.
    pub fn parse(kind: SceneKind, raw: &str) -> Option<Self> {
        use SceneKind::{Bio, Dialogue, Ending};

        let (head, arg) = match raw.split_once(':') {
            Some((head, arg)) => (head, Some(arg.trim()).filter(|arg| !arg.is_empty())),
            None => (raw, None),
        };

        let component = match (kind, head, arg) {
            (_, "text", None) => Self::Text,
            (_, "fill", Some(resource)) => Self::Fill(resource.to_owned()),
            (_, "tfill", Some(resource)) => Self::TFill(resource.to_owned()),

            (Dialogue, "header", None) => Self::Header,
            (Dialogue, "nametag", None) => Self::Nametag,
            (Dialogue, "chars", None) => Self::Chars(None),
            (Dialogue, "chars", Some(side)) => Self::Chars(Some(Side::parse(side)?)),
            (Dialogue, "char", Some(name)) => Self::Char(name.to_lowercase()),

            (Bio, "progressbar", None) => Self::ProgressBar,
            (Bio, "pagenum", None) => Self::PageNum,
            (Bio, "portrait", Some(name)) => Self::Portrait(name.to_lowercase()),
            (Bio, "title", Some(name)) => Self::Title(name.to_lowercase()),

            (Ending, "bgimage", None) => Self::BgImage,
            _ => return None,
        };
        Some(component)
    }

    pub fn unsupported(&self, kind: SceneKind) -> GenError {
        GenError::dialogue(format!(
            "'{self}' is not a {} component",
            kind.label()
        ))
    }
}

impl fmt::Display for Component {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Text => f.write_str("text"),
            Self::Header => f.write_str("header"),
            Self::Nametag => f.write_str("nametag"),
            Self::Chars(None) => f.write_str("chars"),
            Self::Chars(Some(Side::Player)) => f.write_str("chars:p"),
            Self::Chars(Some(Side::Enemy)) => f.write_str("chars:e"),
            Self::Char(name) => write!(f, "char:{name}"),
            Self::ProgressBar => f.write_str("progressbar"),
            Self::PageNum => f.write_str("pagenum"),
            Self::Portrait(name) => write!(f, "portrait:{name}"),
            Self::Title(name) => write!(f, "title:{name}"),
            Self::BgImage => f.write_str("bgimage"),
            Self::Fill(resource) => write!(f, "fill:{resource}"),
            Self::TFill(resource) => write!(f, "tfill:{resource}"),
        }
    }
}

/// `@component group component` declarations in script order.
fn declared(lines: &[Line]) -> impl Iterator<Item = (&str, &str)> {
    lines.iter().filter_map(|line| match line {
        Line::Sys(SysLine::Component { group, component }) => {
            Some((group.as_str(), component.as_str()))
        }
        _ => None,
    })
}

struct Expander<'a> {
    kind: SceneKind,
    config: &'a ProjectConfig,
    lines: &'a [Line],
    stack: Vec<String>,
    out: Vec<Component>,
}

impl Expander<'_> {
    fn expand_all<S: AsRef<str>>(&mut self, names: &[S]) -> Result<()> {
        names.iter().try_for_each(|name| self.expand(name.as_ref()))
    }

    fn expand(&mut self, raw: &str) -> Result<()> {
        let name = raw.trim();
        let config = self.config;

        if let Some(macro_body) = config.component_macros.get(name) {
            debug!("expanding macro '{name}' into {macro_body:?}");
            return self.nested(name, |this| this.expand_all(macro_body));
        }

        if name == "groups" {
            let members: Vec<String> = declared(self.lines)
                .map(|(_, component)| component.to_owned())
                .collect();
            return self.nested(name, |this| this.expand_all(&members));
        }

        if let Some(group) = name.strip_prefix("group:") {
            let members: Vec<String> = declared(self.lines)
                .filter(|(declared_group, _)| *declared_group == group)
                .map(|(_, component)| component.to_owned())
                .collect();
            if members.is_empty() {
                warn!("No components found for component group '{group}'");
            }
            return self.nested(name, |this| this.expand_all(&members));
        }

        let component = Component::parse(self.kind, name).ok_or_else(|| {
            CliError::new(
                UNKNOWN_COMPONENT,
                format!("'{name}' is not a valid {} component", self.kind.label()),
            )
            .with_details(json!({ "component": name, "scene": self.kind.label() }))
        })?;
        self.out.push(component);
        Ok(())
    }

    fn nested(&mut self, name: &str, body: impl FnOnce(&mut Self) -> Result<()>) -> Result<()> {
        if self.stack.iter().any(|open| open == name) {
            let mut chain = self.stack.clone();
            chain.push(name.to_owned());
            return Err(CliError::new(
                COMPONENT_CYCLE,
                format!("component '{name}' expands into itself: {}", chain.join(" -> ")),
            )
            .with_details(json!({ "chain": chain }))
            .into());
        }

        self.stack.push(name.to_owned());
        let result = body(self);
        self.stack.pop();
        result
    }
}

/// Resolves the requested names into concrete components, in request order.
/// Groups are read from `lines`, so the same request can differ between chapters.
pub fn expand<S: AsRef<str>>(
    kind: SceneKind,
    requested: &[S],
    lines: &[Line],
    config: &ProjectConfig,
) -> Result<Vec<Component>> {
    let mut expander = Expander {
        kind,
        config,
        lines,
        stack: Vec::new(),
        out: Vec::new(),
    };
    expander.expand_all(requested)?;
    Ok(expander.out)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error_codes::find_cli_error;
    use serde_json::json;

    fn config(macros: serde_json::Value) -> ProjectConfig {
        serde_json::from_value(json!({
            "videoMode": { "width": 1280, "height": 720, "fps": 30 },
            "durations": { "thresholds": [{ "count": 0, "duration": 30 }] },
            "componentMacros": macros
        }))
        .expect("config should parse")
    }

    fn component_line(group: &str, component: &str) -> Line {
        Line::Sys(SysLine::Component {
            group: group.to_owned(),
            component: component.to_owned(),
        })
    }

    #[test]
    fn parses_scene_specific_names() {
        assert_eq!(
            Component::parse(SceneKind::Dialogue, "chars:p"),
            Some(Component::Chars(Some(Side::Player)))
        );
        assert_eq!(
            Component::parse(SceneKind::Dialogue, "char:Alice"),
            Some(Component::Char("alice".to_owned()))
        );
        assert_eq!(
            Component::parse(SceneKind::Bio, "fill:!bg!Blue.png"),
            Some(Component::Fill("!bg!Blue.png".to_owned()))
        );
        assert_eq!(Component::parse(SceneKind::Bio, "header"), None);
        assert_eq!(Component::parse(SceneKind::Ending, "fill:"), None);
        assert_eq!(Component::parse(SceneKind::Dialogue, "chars:x"), None);
    }

    #[test]
    fn display_round_trips_the_cli_spelling() {
        for raw in ["chars", "chars:e", "char:bob", "tfill:color:#000000"] {
            let component = Component::parse(SceneKind::Dialogue, raw).expect("valid");
            assert_eq!(component.to_string(), raw);
        }
    }

    #[test]
    fn macros_expand_recursively_in_order() {
        let config = config(json!({ "base": ["fill:bg.png", "text"], "all": ["header", "base"] }));
        let components = expand(SceneKind::Dialogue, &["all", "nametag"], &[], &config)
            .expect("expands");
        assert_eq!(
            components,
            [
                Component::Header,
                Component::Fill("bg.png".to_owned()),
                Component::Text,
                Component::Nametag
            ]
        );
    }

    #[test]
    fn groups_come_from_the_script() {
        let lines = vec![
            component_line("front", "text"),
            component_line("back", "fill:sky.png"),
            component_line("front", "header"),
        ];
        let config = config(json!({}));

        let front = expand(SceneKind::Dialogue, &["group:front"], &lines, &config).expect("expands");
        assert_eq!(front, [Component::Text, Component::Header]);

        let all = expand(SceneKind::Dialogue, &["groups"], &lines, &config).expect("expands");
        assert_eq!(all.len(), 3);
        assert_eq!(all[1], Component::Fill("sky.png".to_owned()));

        let none = expand(SceneKind::Dialogue, &["group:missing"], &lines, &config).expect("expands");
        assert!(none.is_empty());
    }

    #[test]
    fn macro_cycles_are_reported() {
        let config = config(json!({ "a": ["text", "b"], "b": ["a"] }));
        let err = expand(SceneKind::Ending, &["a"], &[], &config).expect_err("cycle");
        let cli = find_cli_error(&err).expect("coded");
        assert_eq!(cli.code, COMPONENT_CYCLE);
        assert!(cli.message.contains("a -> b -> a"));
    }

    #[test]
    fn unknown_names_are_coded_errors() {
        let config = config(json!({}));
        let err = expand(SceneKind::Ending, &["txt"], &[], &config).expect_err("unknown");
        let cli = find_cli_error(&err).expect("coded");
        assert_eq!(cli.code, UNKNOWN_COMPONENT);
        assert_eq!(
            cli.details,
            Some(json!({ "component": "txt", "scene": "ending" }))
        );
    }
}
