//! Dialogue scenes: character portraits, the dialogue box text, speaker headers and nametags.

pub mod chars;
pub mod header;
pub mod info;
pub mod nametag;
pub mod text;

use crate::assemble::{lines_span, visibility_sections};
use crate::components::Component;
use crate::context::ConfigContext;
use crate::durations::span;
use crate::errors::GenResult;
use crate::scene::Scene;
use crate::schema::ProjectConfig;
use crate::script::{Line, SceneKind};
use crate::timeline::{Clip, Track};

use info::CharacterInfo;

/// One clip of `resource` across the whole scene, including the final exits.
pub fn fill(lines: &[Line], resource: &str, config: &ProjectConfig) -> GenResult<Track> {
    let mut ctx = ConfigContext::<CharacterInfo>::new(config);
    let exit = ctx.common()?.exit_duration()?;
    let total = span([lines_span(lines), exit]);
    let resource = ctx.resolve_resource(resource)?;
    Ok(Track::with_clips(
        format!("fill:{resource}"),
        vec![Clip::resource(resource, total)],
    ))
}

/// Like [`fill`], but hidden wherever the script sleeps.
pub fn tfill(lines: &[Line], resource: &str, config: &ProjectConfig) -> GenResult<Track> {
    let ctx = ConfigContext::<CharacterInfo>::new(config);
    let resource = ctx.resolve_resource(resource)?;
    let clips = visibility_sections(lines)
        .into_iter()
        .map(|section| {
            if section.state {
                Clip::resource(resource.clone(), section.duration)
            } else {
                Clip::blank(section.duration)
            }
        })
        .collect();
    Ok(Track::with_clips(format!("tfill:{resource}"), clips))
}

pub struct DialogueScene;

impl Scene for DialogueScene {
    fn kind(&self) -> SceneKind {
        SceneKind::Dialogue
    }

    fn generate(
        &self,
        component: &Component,
        lines: &[Line],
        config: &ProjectConfig,
    ) -> GenResult<Vec<Track>> {
        let tracks = match component {
            Component::Text => vec![text::generate(lines, config)?],
            Component::Header => vec![header::generate(lines, config)?],
            Component::Nametag => vec![nametag::generate(lines, config)?],
            Component::Char(name) => vec![chars::generate(lines, name, config)?],
            Component::Chars(side) => {
                let names = chars::find_all_names(lines, *side, config)?;
                chars::generate_sided(lines, &names, &component.to_string(), config)?
            }
            Component::Fill(resource) => vec![fill(lines, resource, config)?],
            Component::TFill(resource) => vec![tfill(lines, resource, config)?],
            other => return Err(other.unsupported(self.kind())),
        };
        Ok(tracks)
    }
}
