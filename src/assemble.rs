//! Consolidation passes shared by the generators: merging adjacent sections,
//! full-length fills and paragraph stacks.

use crate::durations::{span, Frames, FRAME_GAP};
use crate::errors::GenResult;
use crate::script::{Line, SysLine};
use crate::timeline::Clip;

/// A stretch of time in one state, before it becomes a clip.
#[derive(Debug, Clone, PartialEq)]
pub struct Section<S> {
    pub duration: Frames,
    pub state: S,
}

/// Joins neighbouring sections in the same state. The gap frame between them is absorbed.
pub fn merge_adjacent<S: PartialEq>(sections: impl IntoIterator<Item = Section<S>>) -> Vec<Section<S>> {
    let mut merged: Vec<Section<S>> = Vec::new();
    for section in sections {
        match merged.last_mut() {
            Some(last) if last.state == section.state => {
                last.duration += section.duration + FRAME_GAP;
            }
            _ => merged.push(section),
        }
    }
    merged
}

/// Total time of every line that occupies the timeline.
pub fn lines_span(lines: &[Line]) -> Frames {
    span(lines.iter().filter_map(Line::duration))
}

/// Show/hide sections for `tfill` components: everything shows except `@sleep`.
pub fn visibility_sections(lines: &[Line]) -> Vec<Section<bool>> {
    let sections = lines.iter().filter_map(|line| {
        let duration = line.duration()?;
        let shown = !matches!(line, Line::Sys(SysLine::Sleep { .. }));
        Some(Section {
            duration,
            state: shown,
        })
    });
    merge_adjacent(sections)
}

/// `(is_first, is_last)` for each of `count` items.
pub fn boundaries(count: usize) -> impl Iterator<Item = (bool, bool)> {
    (0..count).map(move |index| (index == 0, index + 1 == count))
}

/// One line of a page in a paragraph stack. `text` is `None` for a pause.
#[derive(Debug, Clone, PartialEq)]
pub struct PageEntry<T> {
    pub text: Option<String>,
    pub payload: T,
    pub duration: Frames,
}

/// A paragraph placed on its own track, held until the end of its page.
#[derive(Debug, Clone, PartialEq)]
pub struct Paragraph<T> {
    /// Prefixed with the line breaks of the paragraphs above it.
    pub text: String,
    pub payload: T,
    pub duration: Frames,
    /// Frames between the start of the page and the start of this paragraph.
    pub lead: Frames,
}

pub fn flatten_page<T>(page: Vec<PageEntry<T>>) -> Vec<Paragraph<T>> {
    let mut paragraphs: Vec<Paragraph<T>> = Vec::new();
    let mut elapsed: Frames = 0;
    let mut newlines = 0;

    for entry in page {
        for paragraph in &mut paragraphs {
            paragraph.duration += FRAME_GAP + entry.duration;
        }

        if let Some(text) = entry.text {
            let line_count = text.matches('\n').count() + 1;
            paragraphs.push(Paragraph {
                text: format!("{}{}", "\n".repeat(newlines), text),
                payload: entry.payload,
                duration: entry.duration,
                lead: elapsed,
            });
            newlines += line_count;
        }

        elapsed += entry.duration + FRAME_GAP;
    }

    paragraphs
}

/// Lays pages out across tracks: paragraph *k* of every page goes on track *k*, and
/// tracks a page does not reach hold a blank for the whole page.
pub fn stack_pages<T, F>(pages: Vec<Vec<PageEntry<T>>>, mut to_clip: F) -> GenResult<Vec<Vec<Clip>>>
where
    F: FnMut(&Paragraph<T>) -> GenResult<Clip>,
{
    let laid_out: Vec<(Frames, Vec<Paragraph<T>>)> = pages
        .into_iter()
        .filter(|page| !page.is_empty())
        .map(|page| {
            let total = span(page.iter().map(|entry| entry.duration));
            (total, flatten_page(page))
        })
        .collect();

    let track_count = laid_out
        .iter()
        .map(|(_, paragraphs)| paragraphs.len())
        .max()
        .unwrap_or(0);
    let mut tracks: Vec<Vec<Clip>> = vec![Vec::new(); track_count];

    for (total, paragraphs) in &laid_out {
        for (index, track) in tracks.iter_mut().enumerate() {
            match paragraphs.get(index) {
                Some(paragraph) => {
                    if paragraph.lead > 0 {
                        track.push(Clip::blank(paragraph.lead - FRAME_GAP));
                    }
                    track.push(to_clip(paragraph)?);
                }
                None => track.push(Clip::blank(*total)),
            }
        }
    }

    Ok(tracks)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::timeline::Track;

    #[test]
    fn adjacent_equal_sections_absorb_the_gap_frames() {
        let merged = merge_adjacent([
            Section {
                duration: 2,
                state: false,
            },
            Section {
                duration: 3,
                state: false,
            },
            Section {
                duration: 4,
                state: false,
            },
        ]);
        assert_eq!(
            merged,
            [Section {
                duration: 11,
                state: false
            }]
        );
    }

    #[test]
    fn differing_sections_stay_apart() {
        let merged = merge_adjacent([
            Section {
                duration: 5,
                state: Some("a.png"),
            },
            Section {
                duration: 5,
                state: None,
            },
            Section {
                duration: 5,
                state: Some("a.png"),
            },
            Section {
                duration: 1,
                state: Some("a.png"),
            },
        ]);
        let durations: Vec<Frames> = merged.iter().map(|section| section.duration).collect();
        assert_eq!(durations, [5, 5, 7]);
    }

    #[test]
    fn boundaries_mark_first_and_last() {
        assert_eq!(boundaries(1).collect::<Vec<_>>(), [(true, true)]);
        assert_eq!(
            boundaries(3).collect::<Vec<_>>(),
            [(true, false), (false, false), (false, true)]
        );
    }

    fn entry(text: Option<&str>, duration: Frames) -> PageEntry<()> {
        PageEntry {
            text: text.map(str::to_owned),
            payload: (),
            duration,
        }
    }

    #[test]
    fn paragraphs_hold_until_the_end_of_their_page() {
        let paragraphs = flatten_page(vec![
            entry(Some("one\ntwo"), 10),
            entry(None, 5),
            entry(Some("three"), 20),
        ]);
        assert_eq!(paragraphs.len(), 2);
        assert_eq!(paragraphs[0].duration, 10 + 1 + 5 + 1 + 20);
        assert_eq!(paragraphs[0].lead, 0);
        assert_eq!(paragraphs[1].text, "\n\nthree");
        assert_eq!(paragraphs[1].lead, 17);
        assert_eq!(paragraphs[1].duration, 20);
    }

    #[test]
    fn stacked_tracks_line_up_page_by_page() {
        let pages = vec![
            vec![entry(Some("a"), 10), entry(Some("b"), 20)],
            vec![entry(None, 4), entry(Some("c"), 6)],
        ];
        let tracks = stack_pages(pages, |paragraph| Ok(Clip::transparent(paragraph.duration)))
            .expect("stacks");
        assert_eq!(tracks.len(), 2);

        let lengths: Vec<Frames> = tracks
            .into_iter()
            .map(|clips| Track::with_clips("t", clips).length())
            .collect();
        assert_eq!(lengths, [32 + 12, 32 + 12]);
    }

    #[test]
    fn sleep_hides_tfill_sections() {
        let lines = vec![
            Line::Sys(SysLine::Wait { duration: 3 }),
            Line::Sys(SysLine::ResetAll),
            Line::Sys(SysLine::Sleep { duration: 4 }),
            Line::Sys(SysLine::Sleep { duration: 5 }),
        ];
        assert_eq!(
            visibility_sections(&lines),
            [
                Section {
                    duration: 3,
                    state: true
                },
                Section {
                    duration: 10,
                    state: false
                }
            ]
        );
        assert_eq!(lines_span(&lines), 3 + 4 + 5 + 2);
    }
}
