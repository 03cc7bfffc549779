use std::path::PathBuf;

use scenegen::export::{Exporter, MltExporter};
use scenegen::scene::{compose, RunOptions};
use scenegen::schema::ProjectConfig;
use scenegen::script::{SceneKind, Script, ScriptSettings};
use serde_json::json;

fn ending_config() -> ProjectConfig {
    let mut config: ProjectConfig = serde_json::from_value(json!({
        "videoMode": { "width": 1920, "height": 1080, "fps": 24 },
        "durations": { "mode": "word", "thresholds": [{ "count": 0, "duration": 48 }, { "count": 6, "duration": 96 }] },
        "endingInfo": {
            "common": {
                "dialogueGeometry": "200 200 1520 680",
                "dialogueFont": "Serif",
                "dialogueFontSize": 40,
                "dropTextMaskPath": "!masks!wipe.png",
                "dropTextDur": 12,
                "fadeInDur": 0.5,
                "fadeOutDur": 1.0,
                "bgFadeInDur": 24,
                "bgFadeOutDur": 24
            }
        },
        "characters": { "Narrator": { "dialogueFontColor": "#e0d0b0" } },
        "resourceNames": { "masks": "/masks/", "bg": "/backgrounds/" },
        "componentMacros": { "everything": ["text", "bgimage", "tfill:color:#202020"] }
    }))
    .expect("config should parse");
    config.normalize_names();
    config
}

const ENDING: &str = "\
@bgimage !bg!dawn.png
@speaker narrator
The war was over.
Nobody remembered who had started it, \\
or why.
---
@wait 1.5
@bgimage none
The end.
";

fn options(components: &[&str]) -> RunOptions {
    RunOptions {
        components: components.iter().map(|name| (*name).to_owned()).collect(),
        input: PathBuf::from("ending.txt"),
        output: PathBuf::from("ending"),
        chapters: Vec::new(),
        debug: true,
        background: "#000000".to_owned(),
    }
}

#[test]
fn tokenizing_is_idempotent() {
    let config = ending_config();
    let settings = ScriptSettings::from_config(&config).expect("settings");
    let first = Script::parse(SceneKind::Ending, ENDING, &settings).expect("parses");
    let second = Script::parse(SceneKind::Ending, ENDING, &settings).expect("parses");
    assert_eq!(first, second);
    assert!(first.chapters.is_empty());
}

#[test]
fn ending_macro_lines_every_track_up() {
    let config = ending_config();
    let compositions =
        compose(SceneKind::Ending, ENDING, &config, &options(&["everything"])).expect("composes");
    assert_eq!(compositions.len(), 1);

    let tracks = &compositions[0].tracks;
    let names: Vec<&str> = tracks.iter().map(|track| track.name.as_str()).collect();
    assert_eq!(names, ["text #1", "text #2", "bgimage", "tfill:color:#202020"]);

    let lengths: Vec<i64> = tracks.iter().map(|track| track.length()).collect();
    assert!(
        lengths.windows(2).all(|pair| pair[0] == pair[1]),
        "tracks should end together: {lengths:?}"
    );
}

#[test]
fn exported_project_keeps_cli_order_top_first() {
    let config = ending_config();
    let compositions =
        compose(SceneKind::Ending, ENDING, &config, &options(&["text", "bgimage"])).expect("composes");

    let exporter = MltExporter::new(config.video_mode, "#000000");
    let document = exporter.compose(&compositions[0].tracks);
    let xml = String::from_utf8(exporter.serialize(&document)).expect("utf-8");

    let bgimage = xml.find(">bgimage<").expect("bgimage playlist");
    let text = xml.find(">text #1<").expect("text playlist");
    assert!(bgimage < text, "lower layers are written first");
    assert!(xml.contains("/backgrounds/dawn.png"));
    assert!(xml.contains("/masks/wipe.png"));
    assert!(xml.contains("#e0d0b0"));
}
