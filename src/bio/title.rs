use crate::assemble::lines_span;
use crate::context::ConfigContext;
use crate::errors::GenResult;
use crate::filters::{affine, fade_in, fade_out};
use crate::schema::ProjectConfig;
use crate::script::Line;
use crate::timeline::{Clip, Track};

use super::blocks;
use super::info::BioInfo;

/// The title card of `name`, held for the whole scene.
pub fn generate(lines: &[Line], name: &str, config: &ProjectConfig) -> GenResult<Track> {
    let mut ctx = ConfigContext::<BioInfo>::new(config);
    blocks(lines, &mut ctx)?;

    let info = ctx.get(Some(name))?;
    let total = lines_span(lines);
    let resource = ctx.resolve_resource(&info.title_path_format()?)?;

    let mut clip = Clip::resource(resource, total);
    if let Some(geometry) = info.title_geometry {
        clip.push_filter(affine(geometry));
    }
    clip.push_filter(fade_in(info.first_fade_in_dur()?));
    clip.push_filter(fade_out(total, info.last_fade_out_dur()?));

    Ok(Track::with_clips(format!("title:{name}"), vec![clip]))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bio::tests::{config, lines};
    use crate::timeline::Source;

    #[test]
    fn title_spans_every_block() {
        let mut config = config();
        config
            .characters
            .get_mut("alice")
            .expect("alice")
            .insert("titleGeometry".to_owned(), serde_json::json!("0 0 640 360"));

        let track = generate(&lines("one\n---\ntwo\n---\nthree\n"), "alice", &config)
            .expect("generates");
        let clip = &track.clips[0];
        assert_eq!(clip.source, Source::Resource("/art/title.png".to_owned()));
        assert_eq!(clip.duration, 92);
        assert_eq!(clip.filters[0].property("transition.rect"), Some("0 0 640 360"));
        assert_eq!(clip.filters[2].property("alpha"), Some("80=1;92=0"));
    }
}
