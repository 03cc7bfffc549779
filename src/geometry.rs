use std::fmt;
use std::ops::Add;

use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::schema::VideoMode;

/// A Shotcut rectangle, written as `"x y width height"`.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct Geometry {
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
}

impl Geometry {
    pub fn new(x: f64, y: f64, width: f64, height: f64) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    pub fn full_frame(video: &VideoMode) -> Self {
        Self::new(0.0, 0.0, f64::from(video.width), f64::from(video.height))
    }

    /// Parses `"x y"` or `"x y w h"`. A missing size falls back to `default_size`.
    /// Values past the fourth are ignored.
    pub fn parse_with(raw: &str, default_size: (f64, f64)) -> Result<Self, String> {
        let values = raw
            .split_whitespace()
            .map(|part| {
                part.parse::<f64>()
                    .map_err(|_| format!("'{part}' in geometry '{raw}' is not a number"))
            })
            .collect::<Result<Vec<_>, _>>()?;

        match values.as_slice() {
            [x, y, width, height, ..] => Ok(Self::new(*x, *y, *width, *height)),
            [x, y] => Ok(Self::new(*x, *y, default_size.0, default_size.1)),
            _ => Err(format!("cannot parse '{raw}' into a geometry")),
        }
    }

    /// A placement rectangle: omitted size means the whole frame.
    pub fn parse_rect(raw: &str, video: &VideoMode) -> Result<Self, String> {
        Self::parse_with(raw, (f64::from(video.width), f64::from(video.height)))
    }

    /// An offset added to another rectangle: omitted size means no change in size.
    pub fn parse_offset(raw: &str) -> Result<Self, String> {
        Self::parse_with(raw, (0.0, 0.0))
    }
}

impl Add for Geometry {
    type Output = Geometry;

    fn add(self, other: Geometry) -> Geometry {
        Geometry::new(
            self.x + other.x,
            self.y + other.y,
            self.width + other.width,
            self.height + other.height,
        )
    }
}

impl fmt::Display for Geometry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {} {} {}", self.x, self.y, self.width, self.height)
    }
}

impl Serialize for Geometry {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for Geometry {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        let values = raw.split_whitespace().count();
        if values < 4 {
            return Err(serde::de::Error::custom(format!(
                "geometry '{raw}' needs x, y, width and height"
            )));
        }
        Geometry::parse_with(&raw, (0.0, 0.0)).map_err(serde::de::Error::custom)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn video() -> VideoMode {
        VideoMode {
            width: 1920,
            height: 1080,
            fps: 30,
        }
    }

    #[test]
    fn short_form_fills_in_frame_size() {
        let geometry = Geometry::parse_rect("100 -50", &video()).expect("should parse");
        assert_eq!(geometry, Geometry::new(100.0, -50.0, 1920.0, 1080.0));
        assert_eq!(geometry.to_string(), "100 -50 1920 1080");
    }

    #[test]
    fn extra_values_are_ignored() {
        let geometry = Geometry::parse_rect("1 2 3 4 5", &video()).expect("should parse");
        assert_eq!(geometry.to_string(), "1 2 3 4");
    }

    #[test]
    fn offsets_add_componentwise() {
        let base = Geometry::parse_rect("10 20 300 400", &video()).expect("base");
        let offset = Geometry::parse_offset("-10 5").expect("offset");
        assert_eq!((base + offset).to_string(), "0 25 300 400");
    }

    #[test]
    fn rejects_malformed_geometry() {
        assert!(Geometry::parse_rect("10", &video()).is_err());
        assert!(Geometry::parse_rect("10 abc", &video()).is_err());
        assert!(serde_json::from_str::<Geometry>("\"1 2\"").is_err());
    }

    #[test]
    fn fractional_values_keep_their_precision() {
        let geometry = Geometry::parse_rect("0.5 1.25 10 10", &video()).expect("should parse");
        assert_eq!(geometry.to_string(), "0.5 1.25 10 10");
    }
}
