use serde::{Deserialize, Serialize};

use crate::durations::Frames;
use crate::geometry::Geometry;
use crate::info::{required_fields, SceneInfo};
use crate::schema::{InfoTable, ProjectConfig};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct EndingInfo {
    #[serde(default)]
    pub name: Option<String>,

    #[serde(default)]
    dialogue_geometry: Option<Geometry>,
    #[serde(default)]
    dialogue_font: Option<String>,
    #[serde(default)]
    dialogue_font_size: Option<u32>,
    #[serde(default = "default_weight")]
    pub dialogue_font_weight: u32,
    #[serde(default = "white")]
    pub dialogue_font_color: String,
    #[serde(default = "default_outline_size")]
    pub dialogue_outline_size: u32,
    #[serde(default = "black")]
    pub dialogue_outline_color: String,

    #[serde(default)]
    drop_text_mask_path: Option<String>,
    #[serde(default)]
    pub drop_text_dur: Frames,

    #[serde(default)]
    fade_in_dur: Option<Frames>,
    #[serde(default)]
    fade_out_dur: Option<Frames>,
    #[serde(default)]
    text_fade_out_dur: Option<Frames>,
    #[serde(default)]
    bg_fade_in_dur: Option<Frames>,
    #[serde(default)]
    bg_fade_out_dur: Option<Frames>,
}

fn default_weight() -> u32 {
    500
}

fn default_outline_size() -> u32 {
    1
}

fn white() -> String {
    "#ffffff".to_owned()
}

fn black() -> String {
    "#000000".to_owned()
}

impl EndingInfo {
    required_fields! {
        dialogue_geometry: Geometry => "dialogueGeometry",
        dialogue_font: String => "dialogueFont",
        dialogue_font_size: u32 => "dialogueFontSize",
        drop_text_mask_path: String => "dropTextMaskPath",
        fade_in_dur: Frames => "fadeInDur",
        fade_out_dur: Frames => "fadeOutDur",
        text_fade_out_dur: Frames => "textFadeOutDur",
        bg_fade_in_dur: Frames => "bgFadeInDur",
        bg_fade_out_dur: Frames => "bgFadeOutDur",
    }
}

impl SceneInfo for EndingInfo {
    const KIND: &'static str = "ending info";
    const TIME_FIELDS: &'static [&'static str] = &[
        "dropTextDur",
        "fadeInDur",
        "fadeOutDur",
        "textFadeOutDur",
        "bgFadeInDur",
        "bgFadeOutDur",
    ];
    const RECT_FIELDS: &'static [&'static str] = &["dialogueGeometry"];

    fn table(config: &ProjectConfig) -> &InfoTable {
        &config.ending_info
    }

    fn name(&self) -> Option<&str> {
        self.name.as_deref()
    }

    fn finalize(mut self, _config: &ProjectConfig) -> Self {
        if self.text_fade_out_dur.is_none() {
            self.text_fade_out_dur = self.fade_out_dur;
        }
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::info::load;
    use serde_json::json;

    #[test]
    fn text_fade_out_defaults_to_fade_out() {
        let config: ProjectConfig = serde_json::from_value(json!({
            "videoMode": { "width": 1280, "height": 720, "fps": 30 },
            "durations": { "thresholds": [{ "count": 0, "duration": 30 }] },
            "endingInfo": { "common": { "fadeOutDur": 1.0, "dropTextDur": 4 } },
            "characters": { "narrator": { "textFadeOutDur": 3 } }
        }))
        .expect("config should parse");

        let common: EndingInfo = load(&config, None).expect("common");
        assert_eq!(common.text_fade_out_dur().expect("derived"), 29);
        assert_eq!(common.drop_text_dur, 4);

        let narrator: EndingInfo = load(&config, Some("narrator")).expect("narrator");
        assert_eq!(narrator.text_fade_out_dur().expect("own"), 3);
    }
}
