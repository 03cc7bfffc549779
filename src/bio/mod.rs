//! Bio scenes: paged text blocks with a portrait, a title card, page numbers and a
//! circular progress bar that drains over each page.

pub mod info;
pub mod pagenum;
pub mod portrait;
pub mod progressbar;
pub mod text;
pub mod title;

use std::rc::Rc;

use crate::assemble::{boundaries, lines_span};
use crate::components::Component;
use crate::context::ConfigContext;
use crate::errors::GenResult;
use crate::filters::{fade_in, fade_out};
use crate::scene::Scene;
use crate::schema::ProjectConfig;
use crate::script::{Line, SceneKind, TextLine};
use crate::timeline::{Clip, Track};

use info::BioInfo;

/// A text block with the record of its speaker at that point of the script.
pub struct Block<'l> {
    pub line: &'l TextLine,
    pub info: Rc<BioInfo>,
    pub is_first: bool,
    pub is_last: bool,
}

/// Walks the script, applying every sysline, and collects the text blocks.
pub fn blocks<'l>(
    lines: &'l [Line],
    ctx: &mut ConfigContext<'_, BioInfo>,
) -> GenResult<Vec<Block<'l>>> {
    let mut found = Vec::new();
    for line in lines {
        match line {
            Line::Sys(sys) => sys.pre_hook(ctx)?,
            Line::Text(text) => found.push((text, ctx.get(text.speaker.as_deref())?)),
        }
    }

    let count = found.len();
    Ok(found
        .into_iter()
        .zip(boundaries(count))
        .map(|((line, info), (is_first, is_last))| Block {
            line,
            info,
            is_first,
            is_last,
        })
        .collect())
}

/// One clip of `resource` across every block. `tfill` adds the scene's boundary fades.
pub fn fill(
    lines: &[Line],
    resource: &str,
    with_fades: bool,
    config: &ProjectConfig,
) -> GenResult<Track> {
    let mut ctx = ConfigContext::<BioInfo>::new(config);
    blocks(lines, &mut ctx)?;

    let total = lines_span(lines);
    let resource = ctx.resolve_resource(resource)?;
    let label = if with_fades { "tfill" } else { "fill" };
    let mut clip = Clip::resource(resource.clone(), total);

    if with_fades {
        let common = ctx.common()?;
        clip.push_filter(fade_in(common.first_fade_in_dur()?));
        clip.push_filter(fade_out(total, common.last_fade_out_dur()?));
    }

    Ok(Track::with_clips(format!("{label}:{resource}"), vec![clip]))
}

pub struct BioScene;

impl Scene for BioScene {
    fn kind(&self) -> SceneKind {
        SceneKind::Bio
    }

    fn generate(
        &self,
        component: &Component,
        lines: &[Line],
        config: &ProjectConfig,
    ) -> GenResult<Vec<Track>> {
        let track = match component {
            Component::Text => text::generate(lines, config)?,
            Component::ProgressBar => progressbar::generate(lines, config)?,
            Component::PageNum => pagenum::generate(lines, config)?,
            Component::Portrait(name) => portrait::generate(lines, name, config)?,
            Component::Title(name) => title::generate(lines, name, config)?,
            Component::Fill(resource) => fill(lines, resource, false, config)?,
            Component::TFill(resource) => fill(lines, resource, true, config)?,
            other => return Err(other.unsupported(self.kind())),
        };
        Ok(vec![track])
    }
}
