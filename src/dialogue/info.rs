use serde::{Deserialize, Serialize};

use crate::durations::Frames;
use crate::geometry::Geometry;
use crate::info::{required_fields, SceneInfo};
use crate::schema::{InfoTable, ProjectConfig};

/// Presentation settings for one dialogue character.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct CharacterInfo {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    display_name: Option<String>,
    #[serde(default)]
    portrait_path_format: Option<String>,
    #[serde(default)]
    is_player: Option<bool>,

    #[serde(default)]
    header_geometry: Option<Geometry>,
    #[serde(default)]
    header_font: Option<String>,
    #[serde(default)]
    header_font_size: Option<u32>,
    #[serde(default = "default_weight")]
    pub header_weight: u32,
    #[serde(default)]
    header_outline_color: Option<String>,
    #[serde(default = "default_fill_color")]
    pub header_fill_color: String,
    #[serde(default = "default_overlay")]
    pub header_overlay_path: String,

    #[serde(default)]
    dialogue_geometry: Option<Geometry>,
    #[serde(default)]
    dialogue_font: Option<String>,
    #[serde(default)]
    dialogue_font_size: Option<u32>,
    #[serde(default = "default_fill_color")]
    pub dialogue_font_color: String,
    #[serde(default)]
    drop_text_mask_path: Option<String>,
    #[serde(default)]
    drop_text_end: Option<Frames>,

    #[serde(default)]
    front_geometry: Option<Geometry>,
    #[serde(default)]
    back_geometry: Option<Geometry>,
    #[serde(default)]
    offstage_geometry: Option<Geometry>,
    #[serde(default)]
    offstage_back_geometry: Option<Geometry>,

    #[serde(default = "default_front_brightness")]
    pub front_brightness: f64,
    #[serde(default = "default_back_brightness")]
    pub back_brightness: f64,
    #[serde(default)]
    brightness_fade_end: Option<Frames>,

    #[serde(default)]
    move_end: Option<Frames>,
    /// MLT keyframe interpolation marker placed after the first keyframe time, e.g. `~`.
    #[serde(default)]
    pub move_curve: String,
    #[serde(default)]
    enter_end: Option<Frames>,
    #[serde(default)]
    exit_duration: Option<Frames>,
    #[serde(default)]
    fade_in_end: Option<Frames>,
    #[serde(default)]
    fade_out_end: Option<Frames>,

    #[serde(default)]
    nametag_path: Option<String>,
    #[serde(default)]
    nametag_dur: Option<Frames>,
    #[serde(default)]
    nametag_in_dur: Option<Frames>,
    #[serde(default)]
    nametag_out_dur: Option<Frames>,
    #[serde(default)]
    nametag_geometry: Option<Geometry>,
    #[serde(default)]
    pub nametag_in_offset: Geometry,
    #[serde(default)]
    pub nametag_out_offset: Geometry,
}

fn default_weight() -> u32 {
    500
}

fn default_fill_color() -> String {
    "#ffffff".to_owned()
}

fn default_overlay() -> String {
    crate::timeline::TRANSPARENT.to_owned()
}

fn default_front_brightness() -> f64 {
    1.0
}

fn default_back_brightness() -> f64 {
    0.7
}

impl CharacterInfo {
    required_fields! {
        display_name: String => "displayName",
        portrait_path_format: String => "portraitPathFormat",
        is_player: bool => "isPlayer",
        header_geometry: Geometry => "headerGeometry",
        header_font: String => "headerFont",
        header_font_size: u32 => "headerFontSize",
        header_outline_color: String => "headerOutlineColor",
        dialogue_geometry: Geometry => "dialogueGeometry",
        dialogue_font: String => "dialogueFont",
        dialogue_font_size: u32 => "dialogueFontSize",
        drop_text_mask_path: String => "dropTextMaskPath",
        drop_text_end: Frames => "dropTextEnd",
        front_geometry: Geometry => "frontGeometry",
        back_geometry: Geometry => "backGeometry",
        offstage_geometry: Geometry => "offstageGeometry",
        offstage_back_geometry: Geometry => "offstageBackGeometry",
        brightness_fade_end: Frames => "brightnessFadeEnd",
        move_end: Frames => "moveEnd",
        enter_end: Frames => "enterEnd",
        exit_duration: Frames => "exitDuration",
        fade_in_end: Frames => "fadeInEnd",
        fade_out_end: Frames => "fadeOutEnd",
        nametag_path: String => "nametagPath",
        nametag_dur: Frames => "nametagDur",
        nametag_in_dur: Frames => "nametagInDur",
        nametag_out_dur: Frames => "nametagOutDur",
        nametag_geometry: Geometry => "nametagGeometry",
    }

    /// Side membership without failing.
    pub fn side_flag(&self) -> Option<bool> {
        self.is_player
    }
}

impl SceneInfo for CharacterInfo {
    const KIND: &'static str = "character info";
    const TIME_FIELDS: &'static [&'static str] = &[
        "dropTextEnd",
        "brightnessFadeEnd",
        "moveEnd",
        "enterEnd",
        "exitDuration",
        "fadeInEnd",
        "fadeOutEnd",
        "nametagDur",
        "nametagInDur",
        "nametagOutDur",
    ];
    const RECT_FIELDS: &'static [&'static str] = &[
        "headerGeometry",
        "dialogueGeometry",
        "frontGeometry",
        "backGeometry",
        "offstageGeometry",
        "offstageBackGeometry",
        "nametagGeometry",
    ];
    const OFFSET_FIELDS: &'static [&'static str] = &["nametagInOffset", "nametagOutOffset"];
    const DISPLAY_NAME_FIELD: Option<&'static str> = Some("displayName");
    const SIDED: bool = true;

    fn table(config: &ProjectConfig) -> &InfoTable {
        &config.char_info
    }

    fn name(&self) -> Option<&str> {
        self.name.as_deref()
    }

    fn finalize(mut self, config: &ProjectConfig) -> Self {
        if self.front_geometry.is_none() {
            self.front_geometry = Some(Geometry::full_frame(&config.video_mode));
        }
        if self.offstage_back_geometry.is_none() {
            self.offstage_back_geometry = self.offstage_geometry;
        }
        if self.enter_end.is_none() {
            self.enter_end = self.move_end;
        }
        if self.display_name.is_none() {
            self.display_name = self.name.clone();
        }
        self
    }
}
