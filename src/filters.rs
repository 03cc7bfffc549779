//! Builders for the MLT filters the generators attach to clips.

use std::fmt::Display;

use crate::durations::Frames;
use crate::geometry::Geometry;
use crate::timeline::{Filter, TRANSPARENT};

/// Position and size, static or keyframed (`0=...;30=...`).
pub fn affine(rect: impl Display) -> Filter {
    affine_with_distort(rect, false)
}

/// Like [`affine`], but the rectangle may change the aspect ratio of the clip.
pub fn affine_with_distort(rect: impl Display, distort: bool) -> Filter {
    Filter::new("affine")
        .with("background", TRANSPARENT)
        .with("transition.fill", 1)
        .with("transition.distort", u8::from(distort))
        .with("transition.rect", rect)
        .with("transition.valign", "middle")
        .with("transition.halign", "center")
}

/// Brightness level, static or keyframed.
pub fn brightness(level: impl Display) -> Filter {
    Filter::new("brightness").with("level", level)
}

/// Opacity keyframes, e.g. `0=0;12=1`.
pub fn opacity(alpha: impl Display) -> Filter {
    Filter::new("brightness").with("level", 1).with("alpha", alpha)
}

pub fn fade_in(end: Frames) -> Filter {
    opacity(format!("0=0;{end}=1"))
}

/// Fade to transparent over the last `length` frames of a clip lasting `duration`.
pub fn fade_out(duration: Frames, length: Frames) -> Filter {
    let start = (duration - length).max(0);
    opacity(format!("{start}=1;{duration}=0"))
}

#[derive(Debug, Clone, PartialEq)]
pub struct TextStyle<'a> {
    pub geometry: Geometry,
    pub font: &'a str,
    pub size: u32,
    pub weight: u32,
    pub color: &'a str,
    pub outline_color: &'a str,
    pub outline: u32,
    pub halign: &'a str,
    pub valign: &'a str,
}

/// Plain single-style text.
pub fn dynamic_text(text: &str, style: &TextStyle<'_>) -> Filter {
    Filter::new("dynamictext")
        .with("argument", text)
        .with("geometry", style.geometry)
        .with("family", style.font)
        .with("size", style.size)
        .with("weight", style.weight)
        .with("style", "normal")
        .with("fgcolour", style.color)
        .with("bgcolour", "0x00000000")
        .with("olcolour", style.outline_color)
        .with("outline", style.outline)
        .with("pad", 0)
        .with("halign", style.halign)
        .with("valign", style.valign)
}

const RICH_TEXT_TEMPLATE: &str = r#"<!DOCTYPE HTML PUBLIC "-//W3C//DTD HTML 4.0//EN" "http://www.w3.org/TR/REC-html40/strict.dtd">
<html><head><meta name="qrichtext" content="1" /><meta charset="utf-8" /><style type="text/css">
p, li { white-space: pre-wrap; }
hr { height: 1px; border-width: 0; }
</style></head><body>
<p align="{ALIGN}" style=" margin-top:0px; margin-bottom:0px; margin-left:0px; margin-right:0px; -qt-block-indent:0; text-indent:0px;"><span style=" font-family:'{FONT}'; font-size:{SIZE}pt; color:{COLOR};">{TEXT}</span></p></body></html>"#;

#[derive(Debug, Clone, PartialEq)]
pub struct RichTextStyle<'a> {
    pub geometry: Geometry,
    pub font: &'a str,
    pub size: u32,
    pub color: &'a str,
    pub align: &'a str,
}

pub fn rich_text_html(text: &str, style: &RichTextStyle<'_>) -> String {
    let body = text
        .replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('\n', "<br />");
    RICH_TEXT_TEMPLATE
        .replace("{ALIGN}", style.align)
        .replace("{FONT}", style.font)
        .replace("{SIZE}", &style.size.to_string())
        .replace("{COLOR}", style.color)
        .replace("{TEXT}", &body)
}

/// Rich (HTML) text, which wraps within its geometry.
pub fn rich_text(text: &str, style: &RichTextStyle<'_>) -> Filter {
    Filter::new("qtext")
        .with("argument", text)
        .with("geometry", style.geometry)
        .with("html", rich_text_html(text, style))
        .with("pixel_ratio", 1)
        .with("overflow-y", 1)
}

/// Reveals the clip through a luma mask that sweeps in over `end` frames.
pub fn drop_text(mask: &str, end: Frames) -> Filter {
    Filter::new("mask_start")
        .with("filter", "shape")
        .with("filter.mix", format!("0=0;{end}=100"))
        .with("filter.resource", mask)
        .with("filter.use_luminance", 1)
        .with("filter.use_mix", 1)
}

/// `lightness` follows the 0..200 scale of the text shadow setting, 100 being unchanged.
pub fn hue(lightness: f64) -> Filter {
    Filter::new("avfilter.hue")
        .with("av.h", 0)
        .with("av.s", 1)
        .with("av.b", (lightness - 100.0) / 10.0)
}

pub fn color_grading(gain: [f64; 3]) -> Filter {
    Filter::new("lift_gamma_gain")
        .with("lift_r", 0)
        .with("lift_g", 0)
        .with("lift_b", 0)
        .with("gamma_r", 1)
        .with("gamma_g", 1)
        .with("gamma_b", 1)
        .with("gain_r", gain[0])
        .with("gain_g", gain[1])
        .with("gain_b", gain[2])
}

pub fn gaussian_blur(sigma: f64) -> Filter {
    Filter::new("avfilter.gblur")
        .with("av.sigma", sigma)
        .with("av.steps", 1)
}

pub fn crop(rect: Geometry) -> Filter {
    Filter::new("qtcrop")
        .with("rect", rect)
        .with("radius", 0)
        .with("color", TRANSPARENT)
}

/// Bends a horizontal strip into a ring.
pub fn eq_to_stereo(fov: f64, amount: f64) -> Filter {
    Filter::new("frei0r.bigsh0t_eq_to_stereo")
        .with("fov", fov)
        .with("amount", amount)
}

pub fn vflip() -> Filter {
    Filter::new("avfilter.vflip")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fades_cover_the_requested_ends() {
        assert_eq!(fade_in(12).property("alpha"), Some("0=0;12=1"));
        assert_eq!(fade_out(60, 15).property("alpha"), Some("45=1;60=0"));
        assert_eq!(fade_out(10, 15).property("alpha"), Some("0=1;10=0"));
    }

    #[test]
    fn rich_text_escapes_markup_and_keeps_breaks() {
        let style = RichTextStyle {
            geometry: Geometry::new(0.0, 0.0, 100.0, 50.0),
            font: "Sans",
            size: 32,
            color: "#ffffff",
            align: "left",
        };
        let html = rich_text_html("a < b\n& c", &style);
        assert!(html.contains("a &lt; b<br />&amp; c"));
        assert!(html.contains("font-family:'Sans'; font-size:32pt"));
        assert!(!html.contains("{TEXT}"));
    }

    #[test]
    fn shadow_lightness_maps_to_hue_brightness() {
        assert_eq!(hue(200.0).property("av.b"), Some("10"));
        assert_eq!(hue(100.0).property("av.b"), Some("0"));
    }
}
