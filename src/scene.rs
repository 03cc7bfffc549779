//! Drives one scene run: parse the script, expand components, generate and export per chapter.

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use log::{debug, info, warn};
use serde_json::json;

use crate::bio::BioScene;
use crate::components::{expand, Component};
use crate::dialogue::DialogueScene;
use crate::ending::EndingScene;
use crate::error_codes::{CliError, EMPTY_COMPOSITION, UNKNOWN_CHAPTER};
use crate::errors::GenResult;
use crate::export::{Exporter, MltExporter};
use crate::schema::ProjectConfig;
use crate::script::{Line, SceneKind, Script, ScriptSettings, Segment};
use crate::timeline::Track;

/// A family of generators sharing one script syntax.
pub trait Scene {
    fn kind(&self) -> SceneKind;

    fn generate(
        &self,
        component: &Component,
        lines: &[Line],
        config: &ProjectConfig,
    ) -> GenResult<Vec<Track>>;
}

pub fn scene_for(kind: SceneKind) -> &'static dyn Scene {
    match kind {
        SceneKind::Dialogue => &DialogueScene,
        SceneKind::Bio => &BioScene,
        SceneKind::Ending => &EndingScene,
    }
}

#[derive(Debug, Clone)]
pub struct RunOptions {
    pub components: Vec<String>,
    pub input: PathBuf,
    pub output: PathBuf,
    /// Empty means every chapter.
    pub chapters: Vec<String>,
    pub debug: bool,
    pub background: String,
}

/// One finished project file.
#[derive(Debug, Clone, PartialEq)]
pub struct Composition {
    pub chapter: Option<String>,
    pub tracks: Vec<Track>,
}

/// `out.mlt`, or `out_<chapter>.mlt` when the script has chapters.
pub fn output_path(output: &Path, chapter: Option<&str>) -> PathBuf {
    let base = output.with_extension("mlt");
    let Some(chapter) = chapter else {
        return base;
    };
    let stem = base
        .file_stem()
        .map(|stem| stem.to_string_lossy().into_owned())
        .unwrap_or_default();
    base.with_file_name(format!("{stem}_{chapter}.mlt"))
}

fn select_segments(script: &Script, chapters: &[String]) -> Result<Vec<Segment>> {
    let available: Vec<&str> = script.chapter_names().collect();
    for chapter in chapters {
        if !available.contains(&chapter.as_str()) {
            return Err(CliError::new(
                UNKNOWN_CHAPTER,
                format!("'{chapter}' is not a chapter of this script"),
            )
            .with_details(json!({ "chapter": chapter, "available": available }))
            .into());
        }
    }

    Ok(script
        .segments()
        .into_iter()
        .filter(|segment| match &segment.chapter {
            Some(name) => chapters.is_empty() || chapters.contains(name),
            None => true,
        })
        .collect())
}

fn compose_segment(
    scene: &dyn Scene,
    segment: &Segment,
    components: &[Component],
    config: &ProjectConfig,
    debug_mode: bool,
) -> Result<Composition> {
    let label = segment.chapter.as_deref().unwrap_or("script");
    debug!("{label}: {} lines", segment.lines.len());

    let mut tracks = Vec::new();
    for component in components {
        info!("Generating {component} for {label}");
        match scene.generate(component, &segment.lines, config) {
            Ok(generated) => tracks.extend(generated),
            Err(error) if debug_mode => {
                return Err(anyhow::Error::new(error)
                    .context(format!("failed to generate '{component}' for {label}")))
            }
            Err(error) => warn!("Skipping {component} for {label}: {error}"),
        }
    }

    if tracks.is_empty() {
        return Err(CliError::new(
            EMPTY_COMPOSITION,
            format!("nothing was generated for {label}"),
        )
        .with_details(json!({
            "chapter": segment.chapter,
            "components": components.iter().map(ToString::to_string).collect::<Vec<_>>(),
        }))
        .into());
    }

    Ok(Composition {
        chapter: segment.chapter.clone(),
        tracks,
    })
}

/// Generates every requested composition without touching the filesystem.
pub fn compose(
    kind: SceneKind,
    source: &str,
    config: &ProjectConfig,
    options: &RunOptions,
) -> Result<Vec<Composition>> {
    let settings = ScriptSettings::from_config(config)?;
    let script = Script::parse(kind, source, &settings)
        .with_context(|| format!("failed to parse {}", options.input.display()))?;
    let segments = select_segments(&script, &options.chapters)?;

    let plans = segments
        .iter()
        .map(|segment| expand(kind, &options.components, &segment.lines, config))
        .collect::<Result<Vec<_>>>()?;

    let scene = scene_for(kind);
    segments
        .iter()
        .zip(&plans)
        .map(|(segment, components)| {
            compose_segment(scene, segment, components, config, options.debug)
        })
        .collect()
}

/// Reads the script, writes one project file per composition and returns their paths.
pub fn run(kind: SceneKind, config: &ProjectConfig, options: &RunOptions) -> Result<Vec<PathBuf>> {
    let source = fs::read_to_string(&options.input)
        .with_context(|| format!("failed to read script {}", options.input.display()))?;
    let compositions = compose(kind, &source, config, options)?;

    let exporter = MltExporter::new(config.video_mode, options.background.clone());
    let mut written = Vec::with_capacity(compositions.len());
    for composition in &compositions {
        let path = output_path(&options.output, composition.chapter.as_deref());
        let bytes = exporter.serialize(&exporter.compose(&composition.tracks));
        fs::write(&path, bytes).with_context(|| format!("failed to write {}", path.display()))?;
        info!("Wrote {}", path.display());
        written.push(path);
    }
    Ok(written)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error_codes::{find_cli_error, find_gen_error};
    use crate::errors::GenError;
    use serde_json::json;

    fn config() -> ProjectConfig {
        let mut config: ProjectConfig = serde_json::from_value(json!({
            "videoMode": { "width": 1280, "height": 720, "fps": 30 },
            "durations": { "thresholds": [{ "count": 0, "duration": 30 }] },
            "resourceNames": { "bg": "/bg/" }
        }))
        .expect("config should parse");
        config.normalize_names();
        config
    }

    fn options(components: &[&str], chapters: &[&str], debug: bool) -> RunOptions {
        RunOptions {
            components: components.iter().map(|name| (*name).to_owned()).collect(),
            input: PathBuf::from("script.txt"),
            output: PathBuf::from("out/scene"),
            chapters: chapters.iter().map(|name| (*name).to_owned()).collect(),
            debug,
            background: "#000000".to_owned(),
        }
    }

    const CHAPTERED: &str = "@wait 5\n=== one\n@wait 10\n=== two\n@wait 20\n";

    #[test]
    fn chapters_become_separate_outputs() {
        let compositions = compose(
            SceneKind::Dialogue,
            CHAPTERED,
            &config(),
            &options(&["tfill:!bg!a.png"], &[], false),
        )
        .expect("composes");
        let chapters: Vec<Option<&str>> = compositions
            .iter()
            .map(|composition| composition.chapter.as_deref())
            .collect();
        assert_eq!(chapters, [Some("one"), Some("two")]);
    }

    #[test]
    fn chapter_filter_rejects_unknown_names() {
        let err = compose(
            SceneKind::Dialogue,
            CHAPTERED,
            &config(),
            &options(&["tfill:x.png"], &["three"], false),
        )
        .expect_err("unknown chapter");
        assert_eq!(find_cli_error(&err).map(|cli| cli.code), Some(UNKNOWN_CHAPTER));

        let only_two = compose(
            SceneKind::Dialogue,
            CHAPTERED,
            &config(),
            &options(&["tfill:x.png"], &["two"], false),
        )
        .expect("composes");
        assert_eq!(only_two.len(), 1);
        assert_eq!(only_two[0].chapter.as_deref(), Some("two"));
    }

    #[test]
    fn failed_components_are_skipped_outside_debug() {
        let options = options(&["fill:!missing!a.png", "fill:!bg!a.png"], &[], false);
        let compositions =
            compose(SceneKind::Ending, "hello\n", &config(), &options).expect("composes");
        assert_eq!(compositions[0].tracks.len(), 1);
    }

    #[test]
    fn debug_mode_propagates_generation_errors() {
        let options = options(&["fill:!missing!a.png", "fill:!bg!a.png"], &[], true);
        let err = compose(SceneKind::Ending, "hello\n", &config(), &options).expect_err("fails");
        assert!(matches!(
            find_gen_error(&err),
            Some(GenError::MissingConfig(_))
        ));
    }

    #[test]
    fn all_failing_components_leave_an_empty_composition() {
        let options = options(&["fill:!missing!a.png"], &[], false);
        let err = compose(SceneKind::Ending, "hello\n", &config(), &options).expect_err("empty");
        assert_eq!(find_cli_error(&err).map(|cli| cli.code), Some(EMPTY_COMPOSITION));
    }

    #[test]
    fn output_names_carry_the_chapter() {
        assert_eq!(
            output_path(Path::new("out/scene"), None),
            PathBuf::from("out/scene.mlt")
        );
        assert_eq!(
            output_path(Path::new("out/scene.mlt"), Some("two")),
            PathBuf::from("out/scene_two.mlt")
        );
    }
}
