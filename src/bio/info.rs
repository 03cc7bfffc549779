use serde::{Deserialize, Serialize};

use crate::durations::Frames;
use crate::geometry::Geometry;
use crate::info::{required_fields, SceneInfo};
use crate::schema::{InfoTable, ProjectConfig};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct BioInfo {
    #[serde(default)]
    pub name: Option<String>,

    #[serde(default)]
    bio_geometry: Option<Geometry>,
    #[serde(default)]
    bio_font: Option<String>,
    #[serde(default)]
    bio_font_size: Option<u32>,
    #[serde(default = "white")]
    pub bio_font_color: String,
    #[serde(default = "default_align")]
    pub bio_font_align: String,
    /// Marker authors use to eyeball line wraps; stripped from the rendered text.
    #[serde(default)]
    pub line_wrap_guide: String,

    #[serde(default)]
    pub text_shadow_blur: f64,
    #[serde(default = "default_shadow_lightness")]
    pub text_shadow_lightness: f64,
    /// Space separated `r g b` gains.
    #[serde(default = "default_shadow_gain")]
    pub text_shadow_gain: String,

    #[serde(default)]
    portrait_path_format: Option<String>,
    #[serde(default)]
    pub portrait_geometry: Option<Geometry>,

    #[serde(default)]
    title_path_format: Option<String>,
    #[serde(default)]
    pub title_geometry: Option<Geometry>,

    #[serde(default)]
    first_fade_in_dur: Option<Frames>,
    #[serde(default)]
    last_fade_out_dur: Option<Frames>,
    #[serde(default)]
    text_fade_in_dur: Option<Frames>,
    #[serde(default)]
    text_fade_out_dur: Option<Frames>,

    #[serde(default = "default_progbar_color")]
    pub progbar_color: String,
    #[serde(default)]
    progbar_base_y: Option<f64>,
    #[serde(default)]
    progbar_thickness: Option<f64>,
    #[serde(default)]
    progbar_fov: Option<f64>,
    #[serde(default = "default_progbar_amount")]
    pub progbar_amount: f64,
    #[serde(default = "default_true")]
    pub progbar_flip: bool,
    #[serde(default)]
    progbar_geometry: Option<Geometry>,
    #[serde(default)]
    progbar_fade_out_dur: Option<Frames>,

    #[serde(default)]
    pagenum_geometry: Option<Geometry>,
    #[serde(default)]
    pagenum_font: Option<String>,
    #[serde(default)]
    pagenum_font_size: Option<u32>,
    #[serde(default = "default_weight")]
    pub pagenum_weight: u32,
    #[serde(default = "black")]
    pub pagenum_outline_color: String,
    #[serde(default = "white")]
    pub pagenum_fill_color: String,
    #[serde(default)]
    pagenum_crop_x: Option<f64>,
}

fn white() -> String {
    "#ffffff".to_owned()
}

fn black() -> String {
    "#000000".to_owned()
}

fn default_align() -> String {
    "left".to_owned()
}

fn default_shadow_lightness() -> f64 {
    200.0
}

fn default_shadow_gain() -> String {
    "1 1 1".to_owned()
}

fn default_progbar_color() -> String {
    "#42ffffff".to_owned()
}

fn default_progbar_amount() -> f64 {
    100.0
}

fn default_true() -> bool {
    true
}

fn default_weight() -> u32 {
    500
}

impl BioInfo {
    required_fields! {
        bio_geometry: Geometry => "bioGeometry",
        bio_font: String => "bioFont",
        bio_font_size: u32 => "bioFontSize",
        portrait_path_format: String => "portraitPathFormat",
        title_path_format: String => "titlePathFormat",
        first_fade_in_dur: Frames => "firstFadeInDur",
        last_fade_out_dur: Frames => "lastFadeOutDur",
        text_fade_in_dur: Frames => "textFadeInDur",
        text_fade_out_dur: Frames => "textFadeOutDur",
        progbar_base_y: f64 => "progbarBaseY",
        progbar_thickness: f64 => "progbarThickness",
        progbar_fov: f64 => "progbarFov",
        progbar_geometry: Geometry => "progbarGeometry",
        progbar_fade_out_dur: Frames => "progbarFadeOutDur",
        pagenum_geometry: Geometry => "pagenumGeometry",
        pagenum_font: String => "pagenumFont",
        pagenum_font_size: u32 => "pagenumFontSize",
        pagenum_crop_x: f64 => "pagenumCropX",
    }

    /// Fade-in length: the boundary value for the first clip of a scene, the text value otherwise.
    pub fn fade_in(&self, is_first: bool) -> crate::errors::GenResult<Frames> {
        if is_first {
            self.first_fade_in_dur()
        } else {
            self.text_fade_in_dur()
        }
    }

    pub fn fade_out(&self, is_last: bool) -> crate::errors::GenResult<Frames> {
        if is_last {
            self.last_fade_out_dur()
        } else {
            self.text_fade_out_dur()
        }
    }

    pub fn shadow_gain(&self) -> crate::errors::GenResult<[f64; 3]> {
        let values = self
            .text_shadow_gain
            .split_whitespace()
            .map(str::parse::<f64>)
            .collect::<Result<Vec<_>, _>>();
        match values.as_deref() {
            Ok([r, g, b]) => Ok([*r, *g, *b]),
            _ => Err(crate::errors::GenError::InvalidPropertyValue {
                owner: format!("'textShadowGain' of {}", self.name.as_deref().unwrap_or("common")),
                message: format!("expected three numbers, got '{}'", self.text_shadow_gain),
            }),
        }
    }
}

impl SceneInfo for BioInfo {
    const KIND: &'static str = "bio info";
    const TIME_FIELDS: &'static [&'static str] = &[
        "firstFadeInDur",
        "lastFadeOutDur",
        "textFadeInDur",
        "textFadeOutDur",
        "progbarFadeOutDur",
    ];
    const RECT_FIELDS: &'static [&'static str] = &[
        "bioGeometry",
        "portraitGeometry",
        "titleGeometry",
        "progbarGeometry",
        "pagenumGeometry",
    ];

    fn table(config: &ProjectConfig) -> &InfoTable {
        &config.bio_info
    }

    fn name(&self) -> Option<&str> {
        self.name.as_deref()
    }

    fn finalize(mut self, config: &ProjectConfig) -> Self {
        if self.progbar_base_y.is_none() {
            if let Some(thickness) = self.progbar_thickness {
                self.progbar_base_y = Some(f64::from(config.video_mode.height) / 2.0 - thickness / 2.0);
            }
        }
        self
    }
}
