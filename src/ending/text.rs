use std::rc::Rc;

use crate::assemble::{stack_pages, PageEntry, Paragraph};
use crate::context::ConfigContext;
use crate::errors::GenResult;
use crate::filters::{drop_text, dynamic_text, fade_out, TextStyle};
use crate::schema::ProjectConfig;
use crate::script::{Line, SysLine};
use crate::timeline::{Clip, Track};

use super::info::EndingInfo;

/// The text style in effect for one line, with its drop-in mask already resolved.
#[derive(Debug, Clone)]
struct LineStyle {
    info: Rc<EndingInfo>,
    mask: Option<String>,
}

type Entry = PageEntry<LineStyle>;

fn line_style(
    ctx: &mut ConfigContext<'_, EndingInfo>,
    speaker: Option<&str>,
) -> GenResult<LineStyle> {
    let info = ctx.get(speaker)?;
    let mask = if info.drop_text_dur > 0 {
        Some(ctx.resolve_resource(&info.drop_text_mask_path()?)?)
    } else {
        None
    };
    Ok(LineStyle { info, mask })
}

/// Splits the script at page turns. Pauses stay in the page as text-less entries.
fn pages(lines: &[Line], config: &ProjectConfig) -> GenResult<Vec<Vec<Entry>>> {
    let mut ctx = ConfigContext::<EndingInfo>::new(config);
    let mut speaker: Option<String> = None;
    let mut pages = Vec::new();
    let mut current: Vec<Entry> = Vec::new();

    for line in lines {
        match line {
            Line::Sys(sys) => {
                sys.pre_hook(&mut ctx)?;
                match sys {
                    SysLine::Speaker { name } => speaker = name.clone(),
                    SysLine::PageTurn => pages.push(std::mem::take(&mut current)),
                    SysLine::Wait { duration } | SysLine::Sleep { duration } => {
                        current.push(PageEntry {
                            text: None,
                            payload: line_style(&mut ctx, speaker.as_deref())?,
                            duration: *duration,
                        });
                    }
                    _ => {}
                }
            }
            Line::Text(text) => current.push(PageEntry {
                text: Some(text.text.clone()),
                payload: line_style(&mut ctx, speaker.as_deref())?,
                duration: text.duration,
            }),
        }
    }

    if !current.is_empty() {
        pages.push(current);
    }
    Ok(pages)
}

fn paragraph_clip(paragraph: &Paragraph<LineStyle>) -> GenResult<Clip> {
    let info = paragraph.payload.info.as_ref();
    let style = TextStyle {
        geometry: info.dialogue_geometry()?,
        font: &info.dialogue_font()?,
        size: info.dialogue_font_size()?,
        weight: info.dialogue_font_weight,
        color: &info.dialogue_font_color,
        outline_color: &info.dialogue_outline_color,
        outline: info.dialogue_outline_size,
        halign: "left",
        valign: "top",
    };

    let mut clip =
        Clip::transparent(paragraph.duration).with_filter(dynamic_text(&paragraph.text, &style));
    if let Some(mask) = &paragraph.payload.mask {
        clip.push_filter(drop_text(mask, info.drop_text_dur));
    }
    clip.push_filter(fade_out(paragraph.duration, info.text_fade_out_dur()?));
    Ok(clip)
}

/// One track per paragraph slot; the first paragraph of every page lands on `text #1`.
pub fn generate(lines: &[Line], config: &ProjectConfig) -> GenResult<Vec<Track>> {
    let stacked = stack_pages(pages(lines, config)?, paragraph_clip)?;
    Ok(stacked
        .into_iter()
        .enumerate()
        .map(|(index, clips)| Track::with_clips(format!("text #{}", index + 1), clips))
        .collect())
}
