//! Frame arithmetic and the text-length → duration threshold table.

use anyhow::{bail, Result};
use serde::{Deserialize, Serialize};

use crate::errors::{GenError, GenResult};

pub type Frames = i64;

/// Every clip ends one frame past its duration, so back-to-back clips are separated by this gap.
pub const FRAME_GAP: Frames = 1;

/// A time written in config or script: integers are frames, floats are seconds.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum TimeValue {
    Frames(i64),
    Seconds(f64),
    Text(String),
}

impl TimeValue {
    pub fn to_frames(&self, fps: u32) -> GenResult<Frames> {
        match self {
            Self::Frames(frames) => Ok(*frames),
            Self::Seconds(seconds) => Ok(seconds_to_frames(*seconds, fps)),
            Self::Text(raw) => parse_time(raw, fps),
        }
    }
}

pub fn seconds_to_frames(seconds: f64, fps: u32) -> Frames {
    (seconds * f64::from(fps) - 0.000001).floor() as Frames
}

/// Parses `"12"` as 12 frames and `"1.5"` as one and a half seconds.
pub fn parse_time(raw: &str, fps: u32) -> GenResult<Frames> {
    let raw = raw.trim();
    if let Ok(frames) = raw.parse::<i64>() {
        return Ok(frames);
    }
    match raw.parse::<f64>() {
        Ok(seconds) if seconds.is_finite() => Ok(seconds_to_frames(seconds, fps)),
        _ => Err(GenError::InvalidPropertyValue {
            owner: "duration".to_owned(),
            message: format!("'{raw}' is neither a frame count nor seconds"),
        }),
    }
}

/// Sums clip durations the way they sit on a track, one frame gap between neighbours.
pub fn span<I>(durations: I) -> Frames
where
    I: IntoIterator<Item = Frames>,
{
    let (total, count) = durations
        .into_iter()
        .fold((0, 0), |(total, count), duration| (total + duration, count + 1));
    if count == 0 {
        0
    } else {
        total + FRAME_GAP * (count - 1)
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CountMode {
    #[default]
    Char,
    Word,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Threshold {
    pub count: usize,
    pub duration: TimeValue,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct DurationsConfig {
    #[serde(default)]
    pub mode: CountMode,
    pub thresholds: Vec<Threshold>,
}

impl DurationsConfig {
    pub fn validate(&self) -> Result<()> {
        if self.thresholds.is_empty() {
            bail!("durations.thresholds must define at least one threshold");
        }

        for pair in self.thresholds.windows(2) {
            if pair[1].count <= pair[0].count {
                bail!(
                    "durations.thresholds must be in increasing count order ({} follows {})",
                    pair[1].count,
                    pair[0].count
                );
            }
        }

        Ok(())
    }
}

/// Thresholds resolved to frames for one video mode.
#[derive(Debug, Clone, PartialEq)]
pub struct DurationTable {
    mode: CountMode,
    buckets: Vec<(usize, Frames)>,
}

impl DurationTable {
    pub fn new(config: &DurationsConfig, fps: u32) -> GenResult<Self> {
        let buckets = config
            .thresholds
            .iter()
            .map(|threshold| Ok((threshold.count, threshold.duration.to_frames(fps)?)))
            .collect::<GenResult<Vec<_>>>()?;
        Ok(Self {
            mode: config.mode,
            buckets,
        })
    }

    pub fn count(&self, text: &str) -> usize {
        match self.mode {
            CountMode::Char => text.chars().count(),
            CountMode::Word => text
                .split(|c: char| !(c.is_alphanumeric() || c == '_'))
                .filter(|word| !word.is_empty())
                .count(),
        }
    }

    /// The last threshold whose count does not exceed `count`; the first one below every threshold.
    pub fn bucket(&self, count: usize) -> Frames {
        let index = self
            .buckets
            .partition_point(|(threshold, _)| *threshold <= count);
        self.buckets
            .get(index.saturating_sub(1))
            .map_or(0, |(_, frames)| *frames)
    }

    pub fn duration_of(&self, text: &str) -> Frames {
        self.bucket(self.count(text))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn table(mode: CountMode) -> DurationTable {
        let config = DurationsConfig {
            mode,
            thresholds: vec![
                Threshold {
                    count: 0,
                    duration: TimeValue::Frames(30),
                },
                Threshold {
                    count: 10,
                    duration: TimeValue::Seconds(3.0),
                },
            ],
        };
        DurationTable::new(&config, 30).expect("table should build")
    }

    #[test]
    fn picks_greatest_threshold_not_above_count() {
        let table = table(CountMode::Char);
        assert_eq!(table.duration_of("abcde"), 30);
        assert_eq!(table.duration_of("abcdefghijklmno"), 89);
        assert_eq!(table.duration_of("abcdefghij"), 89);
        assert_eq!(table.duration_of("abcdefghi"), 30);
    }

    #[test]
    fn word_mode_counts_word_runs() {
        let table = table(CountMode::Word);
        assert_eq!(table.count("well... hello, there_you  go!"), 4);
        assert_eq!(table.duration_of("one two three"), 30);
    }

    #[test]
    fn counts_below_first_threshold_use_first_bucket() {
        let config = DurationsConfig {
            mode: CountMode::Char,
            thresholds: vec![Threshold {
                count: 5,
                duration: TimeValue::Frames(12),
            }],
        };
        let table = DurationTable::new(&config, 24).expect("table should build");
        assert_eq!(table.duration_of("ab"), 12);
    }

    #[test]
    fn seconds_round_down_just_below_the_frame() {
        assert_eq!(seconds_to_frames(1.0, 30), 29);
        assert_eq!(seconds_to_frames(0.5, 24), 11);
        assert_eq!(parse_time("45", 30).expect("frames"), 45);
        assert_eq!(parse_time("2.0", 30).expect("seconds"), 59);
        assert!(parse_time("soon", 30).is_err());
    }

    #[test]
    fn time_values_deserialize_by_number_kind() {
        let frames: TimeValue = serde_json::from_str("12").expect("int");
        let seconds: TimeValue = serde_json::from_str("1.5").expect("float");
        let text: TimeValue = serde_json::from_str("\"0.5\"").expect("string");
        assert_eq!(frames, TimeValue::Frames(12));
        assert_eq!(seconds, TimeValue::Seconds(1.5));
        assert_eq!(text.to_frames(30).expect("parse"), 14);
    }

    #[test]
    fn span_adds_one_gap_between_clips() {
        assert_eq!(span([10, 20, 30]), 62);
        assert_eq!(span([7]), 7);
        assert_eq!(span(Vec::new()), 0);
    }

    #[test]
    fn validate_rejects_unsorted_thresholds() {
        let config = DurationsConfig {
            mode: CountMode::Char,
            thresholds: vec![
                Threshold {
                    count: 10,
                    duration: TimeValue::Frames(1),
                },
                Threshold {
                    count: 10,
                    duration: TimeValue::Frames(2),
                },
            ],
        };
        let err = config.validate().expect_err("duplicate count should fail");
        assert!(err.to_string().contains("increasing"));
    }
}
