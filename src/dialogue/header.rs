use crate::context::ConfigContext;
use crate::dialogue::info::CharacterInfo;
use crate::errors::GenResult;
use crate::schema::ProjectConfig;
use crate::script::{Line, SysLine};
use crate::timeline::{Clip, Track};

/// The speaker's header overlay under each spoken line; pauses leave the track empty.
pub fn generate(lines: &[Line], config: &ProjectConfig) -> GenResult<Track> {
    let mut ctx = ConfigContext::<CharacterInfo>::new(config);
    let mut track = Track::new("header");

    for line in lines {
        match line {
            Line::Sys(sys) => {
                sys.pre_hook(&mut ctx)?;
                if let SysLine::Wait { duration } | SysLine::Sleep { duration } = sys {
                    track.push(Clip::blank(*duration));
                }
            }
            Line::Text(text) => {
                let info = ctx.get(text.speaker.as_deref())?;
                let overlay = ctx.resolve_resource(&info.header_overlay_path)?;
                track.push(Clip::resource(overlay, text.duration));
            }
        }
    }

    Ok(track)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::script::tests::settings;
    use crate::script::{SceneKind, Script};
    use crate::timeline::{Source, TRANSPARENT};
    use serde_json::json;

    #[test]
    fn overlays_follow_the_speaker() {
        let mut config: ProjectConfig = serde_json::from_value(json!({
            "videoMode": { "width": 1280, "height": 720, "fps": 30 },
            "durations": { "thresholds": [{ "count": 0, "duration": 30 }] },
            "characters": {
                "alice": { "isPlayer": true, "headerOverlayPath": "/ui/alice.png" },
                "bob": { "isPlayer": false }
            }
        }))
        .expect("config should parse");
        config.normalize_names();

        let lines = Script::parse(
            SceneKind::Dialogue,
            "alice: hi\n@sleep 9\nbob: yo\n",
            &settings(),
        )
        .expect("parses")
        .common;
        let track = generate(&lines, &config).expect("generates");

        assert_eq!(track.clips[0].source, Source::Resource("/ui/alice.png".to_owned()));
        assert!(track.clips[1].is_blank());
        assert_eq!(track.clips[1].duration, 9);
        assert_eq!(track.clips[2].source, Source::Resource(TRANSPARENT.to_owned()));
    }
}
