use std::rc::Rc;

use crate::assemble::boundaries;
use crate::context::ConfigContext;
use crate::durations::Frames;
use crate::errors::{GenError, GenResult};
use crate::filters::{affine, fade_in, fade_out};
use crate::schema::ProjectConfig;
use crate::script::{Line, SysLine};
use crate::timeline::{Clip, Track};

use super::info::BioInfo;

struct Slide {
    info: Rc<BioInfo>,
    resource: String,
    duration: Frames,
}

fn slides(lines: &[Line], name: &str, config: &ProjectConfig) -> GenResult<Vec<Slide>> {
    let mut ctx = ConfigContext::<BioInfo>::new(config);
    let target = ctx.follow_alias(name)?;
    let mut expression: Option<String> = None;
    let mut found = Vec::new();

    for line in lines {
        match line {
            Line::Sys(sys) => {
                sys.pre_hook(&mut ctx)?;
                if let SysLine::Expression {
                    name,
                    expression: label,
                } = sys
                {
                    if ctx.follow_alias(name)? == target {
                        expression = Some(label.clone());
                    }
                }
            }
            Line::Text(text) => {
                let info = ctx.get_with(Some(&target), false)?;
                let label = expression.as_deref().ok_or_else(|| {
                    GenError::dialogue(format!(
                        "'{target}' is trying to appear on screen without an expression"
                    ))
                })?;
                let path = info.portrait_path_format()?.replace("{expression}", label);
                found.push(Slide {
                    resource: ctx.resolve_resource(&path)?,
                    info,
                    duration: text.duration,
                });
            }
        }
    }

    Ok(found)
}

/// The character portrait, switching expression from block to block.
pub fn generate(lines: &[Line], name: &str, config: &ProjectConfig) -> GenResult<Track> {
    let slides = slides(lines, name, config)?;
    let count = slides.len();
    let mut clips = Vec::with_capacity(count);

    for (slide, (is_first, is_last)) in slides.into_iter().zip(boundaries(count)) {
        let info = slide.info.as_ref();
        let mut clip = Clip::resource(slide.resource, slide.duration);
        if let Some(geometry) = info.portrait_geometry {
            clip.push_filter(affine(geometry));
        }
        if is_first {
            clip.push_filter(fade_in(info.first_fade_in_dur()?));
        }
        if is_last {
            clip.push_filter(fade_out(slide.duration, info.last_fade_out_dur()?));
        }
        clips.push(clip);
    }

    Ok(Track::with_clips(format!("portrait:{name}"), clips))
}
