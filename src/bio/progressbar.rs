use crate::context::ConfigContext;
use crate::errors::GenResult;
use crate::filters::{affine, affine_with_distort, eq_to_stereo, fade_in, fade_out, vflip};
use crate::geometry::Geometry;
use crate::schema::ProjectConfig;
use crate::script::Line;
use crate::timeline::{Clip, Track};

use super::info::BioInfo;
use super::{blocks, Block};

/// A colour strip that shrinks to nothing over the block, bent into a ring.
fn bar_clip(block: &Block<'_>, config: &ProjectConfig) -> GenResult<Clip> {
    let info = block.info.as_ref();
    let duration = block.line.duration;
    let base_y = info.progbar_base_y()?;
    let thickness = info.progbar_thickness()?;
    let width = f64::from(config.video_mode.width);

    let full = Geometry::new(0.0, base_y, width, thickness);
    let empty = Geometry::new(0.0, base_y, 0.0, thickness);

    let mut clip = Clip::resource(format!("color:{}", info.progbar_color), duration)
        .with_filter(affine_with_distort(format!("0={full};{duration}={empty}"), true))
        .with_filter(eq_to_stereo(info.progbar_fov()?, info.progbar_amount));
    if info.progbar_flip {
        clip.push_filter(vflip());
    }
    clip.push_filter(affine(info.progbar_geometry()?));

    clip.push_filter(fade_in(info.fade_in(block.is_first)?));
    let fade_out_length = if block.is_last {
        info.last_fade_out_dur()?
    } else {
        info.progbar_fade_out_dur()?
    };
    clip.push_filter(fade_out(duration, fade_out_length));

    Ok(clip)
}

pub fn generate(lines: &[Line], config: &ProjectConfig) -> GenResult<Track> {
    let mut ctx = ConfigContext::<BioInfo>::new(config);
    let clips = blocks(lines, &mut ctx)?
        .iter()
        .map(|block| bar_clip(block, config))
        .collect::<GenResult<Vec<_>>>()?;
    Ok(Track::with_clips("progressbar", clips))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bio::tests::{config, lines};

    #[test]
    fn bar_drains_over_each_block() {
        let config = config();
        let track = generate(&lines("one\n---\ntwo\n"), &config).expect("generates");
        let first = &track.clips[0];

        let services: Vec<&str> = first.filters.iter().map(|filter| filter.service.as_str()).collect();
        assert_eq!(
            services,
            [
                "affine",
                "frei0r.bigsh0t_eq_to_stereo",
                "avfilter.vflip",
                "affine",
                "brightness",
                "brightness"
            ]
        );
        assert_eq!(
            first.filters[0].property("transition.rect"),
            Some("0=0 350 1280 20;30=0 350 0 20")
        );
        assert_eq!(first.filters[0].property("transition.distort"), Some("1"));
        assert_eq!(first.filters[5].property("alpha"), Some("27=1;30=0"));
        assert_eq!(track.clips[1].filters[4].property("alpha"), Some("0=0;4=1"));
    }

    #[test]
    fn flip_can_be_disabled() {
        let mut config = config();
        config
            .bio_info
            .common
            .insert("progbarFlip".to_owned(), serde_json::json!(false));
        let track = generate(&lines("one\n"), &config).expect("generates");
        assert!(track.clips[0]
            .filters
            .iter()
            .all(|filter| filter.service != "avfilter.vflip"));
    }
}
