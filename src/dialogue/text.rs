use crate::context::ConfigContext;
use crate::dialogue::info::CharacterInfo;
use crate::errors::GenResult;
use crate::filters::{drop_text, dynamic_text, rich_text, RichTextStyle, TextStyle};
use crate::schema::ProjectConfig;
use crate::script::{Line, SysLine, TextLine};
use crate::timeline::{Clip, Track};

/// The dialogue box text: one transparent clip per line with the spoken text, the
/// drop-in mask and the speaker's name header.
pub fn generate(lines: &[Line], config: &ProjectConfig) -> GenResult<Track> {
    let mut ctx = ConfigContext::<CharacterInfo>::new(config);
    let mut track = Track::new("text");

    for line in lines {
        match line {
            Line::Sys(sys) => {
                sys.pre_hook(&mut ctx)?;
                if let SysLine::Wait { duration } | SysLine::Sleep { duration } = sys {
                    track.push(Clip::transparent(*duration));
                }
            }
            Line::Text(text) => {
                let info = ctx.get(text.speaker.as_deref())?;
                track.push(text_clip(text, &info, &ctx)?);
            }
        }
    }

    Ok(track)
}

fn text_clip(
    line: &TextLine,
    info: &CharacterInfo,
    ctx: &ConfigContext<'_, CharacterInfo>,
) -> GenResult<Clip> {
    let body = RichTextStyle {
        geometry: info.dialogue_geometry()?,
        font: &info.dialogue_font()?,
        size: info.dialogue_font_size()?,
        color: &info.dialogue_font_color,
        align: "left",
    };
    let header = TextStyle {
        geometry: info.header_geometry()?,
        font: &info.header_font()?,
        size: info.header_font_size()?,
        weight: info.header_weight,
        color: &info.header_fill_color,
        outline_color: &info.header_outline_color()?,
        outline: 1,
        halign: "left",
        valign: "middle",
    };
    let mask = ctx.resolve_resource(&info.drop_text_mask_path()?)?;

    Ok(Clip::transparent(line.duration)
        .with_filter(rich_text(&line.text, &body))
        .with_filter(drop_text(&mask, info.drop_text_end()?))
        .with_filter(dynamic_text(&info.display_name()?, &header)))
}
