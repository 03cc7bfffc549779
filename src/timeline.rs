//! Exporter-neutral timeline model: tracks of clips, each carrying an ordered filter chain.

use crate::durations::{Frames, FRAME_GAP};

/// A fully transparent color producer, used wherever a track needs to hold time
/// while still carrying filters.
pub const TRANSPARENT: &str = "color:#00000000";

#[derive(Debug, Clone, PartialEq)]
pub enum Source {
    /// Empty playlist space.
    Blank,
    /// A file path or `color:` producer, already resolved.
    Resource(String),
}

#[derive(Debug, Clone, PartialEq)]
pub struct Filter {
    pub service: String,
    pub properties: Vec<(String, String)>,
}

impl Filter {
    pub fn new(service: impl Into<String>) -> Self {
        Self {
            service: service.into(),
            properties: Vec::new(),
        }
    }

    pub fn with(mut self, key: impl Into<String>, value: impl ToString) -> Self {
        self.properties.push((key.into(), value.to_string()));
        self
    }

    pub fn property(&self, key: &str) -> Option<&str> {
        self.properties
            .iter()
            .find(|(name, _)| name == key)
            .map(|(_, value)| value.as_str())
    }
}

/// A clip spans `duration + 1` frames: MLT playlists place it from `in=0` through `out=duration`.
#[derive(Debug, Clone, PartialEq)]
pub struct Clip {
    pub source: Source,
    pub duration: Frames,
    pub filters: Vec<Filter>,
}

impl Clip {
    pub fn blank(duration: Frames) -> Self {
        Self {
            source: Source::Blank,
            duration,
            filters: Vec::new(),
        }
    }

    pub fn resource(resource: impl Into<String>, duration: Frames) -> Self {
        Self {
            source: Source::Resource(resource.into()),
            duration,
            filters: Vec::new(),
        }
    }

    pub fn transparent(duration: Frames) -> Self {
        Self::resource(TRANSPARENT, duration)
    }

    pub fn with_filter(mut self, filter: Filter) -> Self {
        self.filters.push(filter);
        self
    }

    pub fn push_filter(&mut self, filter: Filter) {
        self.filters.push(filter);
    }

    pub fn is_blank(&self) -> bool {
        self.source == Source::Blank
    }

    /// Frames occupied on the track.
    pub fn length(&self) -> Frames {
        self.duration + FRAME_GAP
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Track {
    pub name: String,
    pub clips: Vec<Clip>,
}

impl Track {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            clips: Vec::new(),
        }
    }

    pub fn with_clips(name: impl Into<String>, clips: Vec<Clip>) -> Self {
        Self {
            name: name.into(),
            clips,
        }
    }

    pub fn push(&mut self, clip: Clip) {
        self.clips.push(clip);
    }

    /// Total frames the track spans.
    pub fn length(&self) -> Frames {
        self.clips.iter().map(Clip::length).sum()
    }
}
