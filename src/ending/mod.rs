//! Ending scenes: stacked paragraphs over changing background images.

pub mod bgimage;
pub mod info;
pub mod text;

use crate::assemble::{lines_span, visibility_sections};
use crate::components::Component;
use crate::context::ConfigContext;
use crate::errors::GenResult;
use crate::filters::{fade_in, fade_out};
use crate::scene::Scene;
use crate::schema::ProjectConfig;
use crate::script::{Line, SceneKind};
use crate::timeline::{Clip, Track};

use info::EndingInfo;

fn resolve_after_script(
    lines: &[Line],
    resource: &str,
    ctx: &mut ConfigContext<'_, EndingInfo>,
) -> GenResult<String> {
    for line in lines {
        if let Line::Sys(sys) = line {
            sys.pre_hook(ctx)?;
        }
    }
    ctx.resolve_resource(resource)
}

pub fn fill(lines: &[Line], resource: &str, config: &ProjectConfig) -> GenResult<Track> {
    let mut ctx = ConfigContext::<EndingInfo>::new(config);
    let resource = resolve_after_script(lines, resource, &mut ctx)?;
    Ok(Track::with_clips(
        format!("fill:{resource}"),
        vec![Clip::resource(resource, lines_span(lines))],
    ))
}

/// Shown everywhere except while the script sleeps, fading at every edge.
pub fn tfill(lines: &[Line], resource: &str, config: &ProjectConfig) -> GenResult<Track> {
    let mut ctx = ConfigContext::<EndingInfo>::new(config);
    let resource = resolve_after_script(lines, resource, &mut ctx)?;
    let common = ctx.common()?;

    let clips = visibility_sections(lines)
        .into_iter()
        .map(|section| {
            if !section.state {
                return Ok(Clip::blank(section.duration));
            }
            Ok(Clip::resource(resource.clone(), section.duration)
                .with_filter(fade_in(common.fade_in_dur()?))
                .with_filter(fade_out(section.duration, common.fade_out_dur()?)))
        })
        .collect::<GenResult<Vec<_>>>()?;

    Ok(Track::with_clips(format!("tfill:{resource}"), clips))
}

pub struct EndingScene;

impl Scene for EndingScene {
    fn kind(&self) -> SceneKind {
        SceneKind::Ending
    }

    fn generate(
        &self,
        component: &Component,
        lines: &[Line],
        config: &ProjectConfig,
    ) -> GenResult<Vec<Track>> {
        let tracks = match component {
            Component::Text => text::generate(lines, config)?,
            Component::BgImage => vec![bgimage::generate(lines, config)?],
            Component::Fill(resource) => vec![fill(lines, resource, config)?],
            Component::TFill(resource) => vec![tfill(lines, resource, config)?],
            other => return Err(other.unsupported(self.kind())),
        };
        Ok(tracks)
    }
}
