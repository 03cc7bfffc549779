use std::collections::BTreeMap;

use anyhow::{bail, Result};
use serde::Deserialize;
use serde_json::{Map, Value};

use crate::durations::DurationsConfig;

/// Raw, not yet merged presentation fields of one config block.
pub type RawFields = Map<String, Value>;

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct ProjectConfig {
    pub video_mode: VideoMode,
    pub durations: DurationsConfig,
    #[serde(default)]
    pub parsing: ParsingConfig,
    #[serde(default)]
    pub char_info: InfoTable,
    #[serde(default)]
    pub bio_info: InfoTable,
    #[serde(default)]
    pub ending_info: InfoTable,
    #[serde(default)]
    pub characters: BTreeMap<String, RawFields>,
    #[serde(default)]
    pub aliases: BTreeMap<String, String>,
    #[serde(default)]
    pub resource_names: BTreeMap<String, String>,
    #[serde(default)]
    pub component_macros: BTreeMap<String, Vec<String>>,
}

impl ProjectConfig {
    /// Script names are matched case-insensitively, so every name-keyed table is stored lower-cased.
    pub fn normalize_names(&mut self) {
        self.characters = std::mem::take(&mut self.characters)
            .into_iter()
            .map(|(name, fields)| (name.to_lowercase(), fields))
            .collect();
        self.aliases = std::mem::take(&mut self.aliases)
            .into_iter()
            .map(|(alias, name)| (alias.to_lowercase(), name.to_lowercase()))
            .collect();
    }

    pub fn fps(&self) -> u32 {
        self.video_mode.fps
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct VideoMode {
    pub width: u32,
    pub height: u32,
    pub fps: u32,
}

impl VideoMode {
    pub fn validate(&self) -> Result<()> {
        if self.width == 0 || self.height == 0 {
            bail!(
                "videoMode size must be positive, got {}x{}",
                self.width,
                self.height
            );
        }

        if self.fps == 0 {
            bail!("videoMode fps must be > 0");
        }

        Ok(())
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct ParsingConfig {
    #[serde(default = "default_dialogue_regex")]
    pub dialogue_regex: String,
    #[serde(default = "default_short_dialogue_regex")]
    pub short_dialogue_regex: String,
}

impl Default for ParsingConfig {
    fn default() -> Self {
        Self {
            dialogue_regex: default_dialogue_regex(),
            short_dialogue_regex: default_short_dialogue_regex(),
        }
    }
}

fn default_dialogue_regex() -> String {
    r"^(?P<name>[^:\[\]]+?)\s*\[(?P<expression>[^\]]+)\]\s*:\s*(?P<text>.+)$".to_owned()
}

fn default_short_dialogue_regex() -> String {
    r"^(?P<name>[^:]+?)\s*:\s*(?P<text>.+)$".to_owned()
}

/// The `common`/`player`/`enemy` blocks of one scene kind.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct InfoTable {
    #[serde(default)]
    pub common: RawFields,
    #[serde(default)]
    pub player: RawFields,
    #[serde(default)]
    pub enemy: RawFields,
}

impl InfoTable {
    pub fn side(&self, side: Side) -> &RawFields {
        match side {
            Side::Player => &self.player,
            Side::Enemy => &self.enemy,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Side {
    Player,
    Enemy,
}

impl Side {
    pub fn of_player_flag(is_player: bool) -> Self {
        if is_player {
            Self::Player
        } else {
            Self::Enemy
        }
    }

    pub fn parse(raw: &str) -> Option<Self> {
        match raw.to_lowercase().as_str() {
            "p" | "player" => Some(Self::Player),
            "e" | "enemy" => Some(Self::Enemy),
            _ => None,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Self::Player => "player",
            Self::Enemy => "enemy",
        }
    }
}
