use crate::context::ConfigContext;
use crate::errors::{GenError, GenResult};
use crate::filters::{crop, dynamic_text, fade_in, fade_out, TextStyle};
use crate::geometry::Geometry;
use crate::schema::ProjectConfig;
use crate::script::Line;
use crate::timeline::{Clip, Track};

use super::info::BioInfo;
use super::{blocks, Block};

/// `"n/total"` cropped down to the page number, so only the number fades between pages
/// while the `/total` part stays put.
fn page_clip(block: &Block<'_>, config: &ProjectConfig) -> GenResult<Clip> {
    let info = block.info.as_ref();
    let duration = block.line.duration;
    let page = block.line.page.ok_or_else(|| {
        GenError::dialogue(format!(
            "bio block '{}' has no page number",
            block.line.text.lines().next().unwrap_or_default()
        ))
    })?;

    let style = TextStyle {
        geometry: info.pagenum_geometry()?,
        font: &info.pagenum_font()?,
        size: info.pagenum_font_size()?,
        weight: info.pagenum_weight,
        color: &info.pagenum_fill_color,
        outline_color: &info.pagenum_outline_color,
        outline: 1,
        halign: "right",
        valign: "bottom",
    };
    let crop_rect = Geometry::new(
        0.0,
        0.0,
        info.pagenum_crop_x()?,
        f64::from(config.video_mode.height),
    );

    let mut clip = Clip::transparent(duration)
        .with_filter(dynamic_text(&format!("{}/{}", page.number, page.total), &style))
        .with_filter(crop(crop_rect));

    if !block.is_first {
        clip.push_filter(fade_in(info.text_fade_in_dur()?));
    }
    if !block.is_last {
        clip.push_filter(fade_out(duration, info.text_fade_out_dur()?));
    }

    clip.push_filter(dynamic_text(&format!("/{}", page.total), &style));

    if block.is_first {
        clip.push_filter(fade_in(info.first_fade_in_dur()?));
    }
    if block.is_last {
        clip.push_filter(fade_out(duration, info.last_fade_out_dur()?));
    }

    Ok(clip)
}

pub fn generate(lines: &[Line], config: &ProjectConfig) -> GenResult<Track> {
    let mut ctx = ConfigContext::<BioInfo>::new(config);
    let clips = blocks(lines, &mut ctx)?
        .iter()
        .map(|block| page_clip(block, config))
        .collect::<GenResult<Vec<_>>>()?;
    Ok(Track::with_clips("pagenum", clips))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bio::tests::{config, lines};

    #[test]
    fn middle_pages_fade_the_number_only() {
        let config = config();
        let track = generate(&lines("one\n---\ntwo\n---\nthree\n"), &config).expect("generates");

        let middle = &track.clips[1];
        let layout: Vec<(&str, Option<&str>)> = middle
            .filters
            .iter()
            .map(|filter| (filter.service.as_str(), filter.property("argument")))
            .collect();
        assert_eq!(
            layout,
            [
                ("dynamictext", Some("2/3")),
                ("qtcrop", None),
                ("brightness", None),
                ("brightness", None),
                ("dynamictext", Some("/3"))
            ]
        );
        assert_eq!(middle.filters[1].property("rect"), Some("0 0 1180 720"));
    }

    #[test]
    fn boundary_pages_fade_everything() {
        let config = config();
        let track = generate(&lines("one\n---\ntwo\n"), &config).expect("generates");

        let first = &track.clips[0];
        assert_eq!(first.filters[2].property("alpha"), Some("25=1;30=0"));
        assert_eq!(first.filters[4].property("alpha"), Some("0=0;10=1"));
    }
}
