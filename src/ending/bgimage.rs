use crate::assemble::{merge_adjacent, Section};
use crate::context::ConfigContext;
use crate::errors::GenResult;
use crate::filters::{fade_in, fade_out};
use crate::schema::ProjectConfig;
use crate::script::{Line, SysLine};
use crate::timeline::{Clip, Track};

use super::info::EndingInfo;

/// Background images switched by `@bgimage`, each held until the next switch.
pub fn generate(lines: &[Line], config: &ProjectConfig) -> GenResult<Track> {
    let mut ctx = ConfigContext::<EndingInfo>::new(config);
    let mut image: Option<String> = None;
    let mut sections = Vec::new();

    for line in lines {
        if let Line::Sys(sys) = line {
            sys.pre_hook(&mut ctx)?;
            if let SysLine::BgImage { resource } = sys {
                image = resource
                    .as_deref()
                    .map(|resource| ctx.resolve_resource(resource))
                    .transpose()?;
            }
        }
        if let Some(duration) = line.duration() {
            sections.push(Section {
                duration,
                state: image.clone(),
            });
        }
    }

    let common = ctx.common()?;
    let clips = merge_adjacent(sections)
        .into_iter()
        .map(|section| match section.state {
            None => Ok(Clip::blank(section.duration)),
            Some(resource) => Ok(Clip::resource(resource, section.duration)
                .with_filter(fade_in(common.bg_fade_in_dur()?))
                .with_filter(fade_out(section.duration, common.bg_fade_out_dur()?))),
        })
        .collect::<GenResult<Vec<_>>>()?;

    Ok(Track::with_clips("bgimage", clips))
}
