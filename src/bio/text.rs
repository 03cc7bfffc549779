use crate::context::ConfigContext;
use crate::errors::GenResult;
use crate::filters::{
    color_grading, fade_in, fade_out, gaussian_blur, hue, rich_text, RichTextStyle,
};
use crate::schema::ProjectConfig;
use crate::script::Line;
use crate::timeline::{Clip, Track};

use super::info::BioInfo;
use super::{blocks, Block};

fn block_clip(block: &Block<'_>) -> GenResult<Clip> {
    let info = block.info.as_ref();
    let duration = block.line.duration;
    let text = if info.line_wrap_guide.is_empty() {
        block.line.text.clone()
    } else {
        block.line.text.replace(&info.line_wrap_guide, "")
    };

    let geometry = info.bio_geometry()?;
    let font = info.bio_font()?;
    let size = info.bio_font_size()?;
    let mut clip = Clip::transparent(duration);

    if info.text_shadow_blur > 0.0 {
        let shadow = RichTextStyle {
            geometry,
            font: &font,
            size,
            color: "#ffffff",
            align: &info.bio_font_align,
        };
        clip.push_filter(rich_text(&text, &shadow));
        clip.push_filter(hue(info.text_shadow_lightness));
        clip.push_filter(color_grading(info.shadow_gain()?));
        clip.push_filter(gaussian_blur(info.text_shadow_blur));
    }

    let style = RichTextStyle {
        geometry,
        font: &font,
        size,
        color: &info.bio_font_color,
        align: &info.bio_font_align,
    };
    clip.push_filter(rich_text(&text, &style));
    clip.push_filter(fade_in(info.fade_in(block.is_first)?));
    clip.push_filter(fade_out(duration, info.fade_out(block.is_last)?));

    Ok(clip)
}

/// The bio text, one clip per block, with an optional blurred shadow layer underneath.
pub fn generate(lines: &[Line], config: &ProjectConfig) -> GenResult<Track> {
    let mut ctx = ConfigContext::<BioInfo>::new(config);
    let clips = blocks(lines, &mut ctx)?
        .iter()
        .map(block_clip)
        .collect::<GenResult<Vec<_>>>()?;
    Ok(Track::with_clips("text", clips))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bio::tests::{config, lines};

    fn services(clip: &Clip) -> Vec<&str> {
        clip.filters.iter().map(|filter| filter.service.as_str()).collect()
    }

    #[test]
    fn shadowed_blocks_stack_the_shadow_under_the_text() {
        let config = config();
        let track = generate(&lines("--- alice\nfirst\n---\nplain\n"), &config)
            .expect("generates");
        assert_eq!(track.clips.len(), 2);

        assert_eq!(
            services(&track.clips[0]),
            [
                "qtext",
                "avfilter.hue",
                "lift_gamma_gain",
                "avfilter.gblur",
                "qtext",
                "brightness",
                "brightness"
            ]
        );
        assert_eq!(track.clips[0].filters[5].property("alpha"), Some("0=0;10=1"));
        let last = track.clips[1].filters.last().expect("has fades");
        assert_eq!(last.property("alpha"), Some("18=1;30=0"));
    }

    #[test]
    fn line_wrap_guide_is_removed() {
        let mut config = config();
        config
            .bio_info
            .common
            .insert("lineWrapGuide".to_owned(), serde_json::json!("|"));
        let track = generate(&lines("a|b\n"), &config).expect("generates");
        assert_eq!(track.clips[0].filters[0].property("argument"), Some("ab"));
    }
}
