use std::rc::Rc;

use log::warn;

use crate::context::ConfigContext;
use crate::dialogue::info::CharacterInfo;
use crate::durations::{Frames, FRAME_GAP};
use crate::errors::GenResult;
use crate::filters::{affine, fade_in, fade_out};
use crate::schema::ProjectConfig;
use crate::script::{Line, SysLine};
use crate::timeline::{Clip, Track};

/// A `@nametag` and the frame it starts on.
struct Placement {
    start: Frames,
    info: Rc<CharacterInfo>,
}

fn placements(lines: &[Line], config: &ProjectConfig) -> GenResult<Vec<Placement>> {
    let mut ctx = ConfigContext::<CharacterInfo>::new(config);
    let mut elapsed: Frames = 0;
    let mut found = Vec::new();

    for line in lines {
        if let Line::Sys(sys) = line {
            sys.pre_hook(&mut ctx)?;
            if let SysLine::Nametag { name } = sys {
                found.push(Placement {
                    start: elapsed,
                    info: ctx.get(Some(name))?,
                });
            }
        }
        if let Some(duration) = line.duration() {
            elapsed += duration + FRAME_GAP;
        }
    }

    Ok(found)
}

fn nametag_clip(info: &CharacterInfo, ctx: &ConfigContext<'_, CharacterInfo>) -> GenResult<Clip> {
    let duration = info.nametag_dur()?;
    let in_end = info.nametag_in_dur()?;
    let out_start = duration - info.nametag_out_dur()?;
    let rest = info.nametag_geometry()?;
    let from = rest + info.nametag_in_offset;
    let to = rest + info.nametag_out_offset;

    Ok(Clip::resource(ctx.resolve_resource(&info.nametag_path()?)?, duration)
        .with_filter(affine(format!(
            "0={from};{in_end}={rest};{out_start}={rest};{duration}={to}"
        )))
        .with_filter(fade_in(in_end))
        .with_filter(fade_out(duration, duration - out_start)))
}

/// Nametags slide in at the start of the line following their `@nametag`.
/// Overlapping nametags are pushed back to the end of the previous one.
pub fn generate(lines: &[Line], config: &ProjectConfig) -> GenResult<Track> {
    let ctx = ConfigContext::<CharacterInfo>::new(config);
    let mut track = Track::new("nametag");

    for placement in placements(lines, config)? {
        let position = track.length();
        if placement.start > position {
            track.push(Clip::blank(placement.start - position - FRAME_GAP));
        } else if placement.start < position {
            warn!(
                "nametag for '{}' overlaps the previous one and is delayed by {} frames",
                placement.info.name.as_deref().unwrap_or("common"),
                position - placement.start
            );
        }
        track.push(nametag_clip(&placement.info, &ctx)?);
    }

    Ok(track)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::script::tests::settings;
    use crate::script::{SceneKind, Script};
    use serde_json::json;

    fn config() -> ProjectConfig {
        let mut config: ProjectConfig = serde_json::from_value(json!({
            "videoMode": { "width": 1280, "height": 720, "fps": 30 },
            "durations": { "thresholds": [{ "count": 0, "duration": 30 }] },
            "charInfo": {
                "common": {
                    "nametagPath": "/ui/tag.png",
                    "nametagDur": 40,
                    "nametagInDur": 5,
                    "nametagOutDur": 8,
                    "nametagGeometry": "10 20 300 60",
                    "nametagInOffset": "-50 0"
                }
            },
            "characters": { "alice": { "isPlayer": true }, "bob": { "isPlayer": false } }
        }))
        .expect("config should parse");
        config.normalize_names();
        config
    }

    fn lines(source: &str) -> Vec<Line> {
        Script::parse(SceneKind::Dialogue, source, &settings())
            .expect("parses")
            .common
    }

    #[test]
    fn nametag_starts_after_the_preceding_lines() {
        let config = config();
        let track = generate(
            &lines("alice: one\nalice: two\n@nametag bob\nbob: three\n"),
            &config,
        )
        .expect("generates");

        assert!(track.clips[0].is_blank());
        assert_eq!(track.clips[0].length(), 62);
        let tag = &track.clips[1];
        assert_eq!(tag.duration, 40);
        assert_eq!(
            tag.filters[0].property("transition.rect"),
            Some("0=-40 20 300 60;5=10 20 300 60;32=10 20 300 60;40=10 20 300 60")
        );
        assert_eq!(tag.filters[2].property("alpha"), Some("32=1;40=0"));
    }

    #[test]
    fn overlapping_nametags_queue_up() {
        let config = config();
        let track = generate(
            &lines("@nametag alice\nalice: one\n@nametag bob\nbob: two\n"),
            &config,
        )
        .expect("generates");
        assert_eq!(track.clips.len(), 2);
        assert!(!track.clips[0].is_blank());
        assert!(!track.clips[1].is_blank());
        assert_eq!(track.length(), 82);
    }

    #[test]
    fn one_frame_lead_is_held_by_a_one_frame_blank() {
        let config = config();
        let track = generate(&lines("@wait 0\n@nametag alice\nalice: one\n"), &config)
            .expect("generates");
        assert!(track.clips[0].is_blank());
        assert_eq!(track.clips[0].length(), 1);
        assert_eq!(track.length(), 1 + track.clips[1].length());
    }
}
