//! Per-character presentation records and the machinery shared by all scene kinds.
//!
//! Records are merged from raw config blocks (`common` → side → character), normalized
//! (times to frames, geometries to full rectangles) and then deserialized into a typed
//! struct. Fields without a literal default are `Option`s read through accessors that
//! fail with [`GenError::MissingInfo`].

use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;

use crate::durations::TimeValue;
use crate::errors::{GenError, GenResult};
use crate::geometry::Geometry;
use crate::schema::{InfoTable, ProjectConfig, RawFields, Side};

pub trait SceneInfo: Clone + Serialize + DeserializeOwned {
    /// Human-readable record kind used in error messages.
    const KIND: &'static str;
    /// Fields holding a [`TimeValue`], stored as frames after normalization.
    const TIME_FIELDS: &'static [&'static str];
    /// Placement rectangles; a missing size means the full frame.
    const RECT_FIELDS: &'static [&'static str];
    /// Offsets added to rectangles; a missing size means zero.
    const OFFSET_FIELDS: &'static [&'static str] = &[];
    /// The field a nickname temporarily replaces, if the record shows a name.
    const DISPLAY_NAME_FIELD: Option<&'static str> = None;
    /// Whether a `player`/`enemy` block sits between `common` and the character.
    const SIDED: bool = false;

    fn table(config: &ProjectConfig) -> &InfoTable;

    fn name(&self) -> Option<&str>;

    /// Fills derived defaults once every field has been merged.
    fn finalize(self, config: &ProjectConfig) -> Self;
}

/// Reads an unset-able field, failing with a message naming the field and the character.
pub fn require<T: Clone>(
    value: &Option<T>,
    property: &str,
    owner: Option<&str>,
) -> GenResult<T> {
    value
        .clone()
        .ok_or_else(|| GenError::missing_info(property, owner))
}

/// Generates `fn field(&self) -> GenResult<T>` accessors for `Option` fields.
macro_rules! required_fields {
    ($($field:ident: $ty:ty => $key:literal),* $(,)?) => {
        $(
            pub fn $field(&self) -> $crate::errors::GenResult<$ty> {
                $crate::info::require(&self.$field, $key, self.name.as_deref())
            }
        )*
    };
}
pub(crate) use required_fields;

/// Merges `common` → side → character for `name`, or just `common` when `name` is `None`.
pub fn merged_fields<I: SceneInfo>(
    config: &ProjectConfig,
    name: Option<&str>,
) -> GenResult<RawFields> {
    let table = I::table(config);
    let mut merged = table.common.clone();

    let Some(name) = name else {
        return Ok(merged);
    };

    let character = config.characters.get(name).ok_or_else(|| {
        GenError::MissingConfig(format!("{} for '{}' not found in config", I::KIND, name))
    })?;

    if I::SIDED {
        let is_player = character
            .get("isPlayer")
            .or_else(|| merged.get("isPlayer"))
            .and_then(Value::as_bool)
            .ok_or_else(|| GenError::missing_info("isPlayer", Some(name)))?;
        let side = table.side(Side::of_player_flag(is_player));
        merged.extend(side.iter().map(|(key, value)| (key.clone(), value.clone())));
    }

    merged.extend(
        character
            .iter()
            .map(|(key, value)| (key.clone(), value.clone())),
    );
    merged.insert("name".to_owned(), Value::String(name.to_owned()));
    Ok(merged)
}

/// Builds the record exactly as the config file describes it, without any script overrides.
pub fn load<I: SceneInfo>(config: &ProjectConfig, name: Option<&str>) -> GenResult<I> {
    build(merged_fields::<I>(config, name)?, config, name)
}

fn build<I: SceneInfo>(
    mut fields: RawFields,
    config: &ProjectConfig,
    owner: Option<&str>,
) -> GenResult<I> {
    normalize::<I>(&mut fields, config, owner)?;
    let info: I = serde_json::from_value(Value::Object(fields)).map_err(|error| {
        GenError::InvalidPropertyValue {
            owner: format!("{} of {}", I::KIND, owner.unwrap_or("common")),
            message: error.to_string(),
        }
    })?;
    Ok(info.finalize(config))
}

fn normalize<I: SceneInfo>(
    fields: &mut RawFields,
    config: &ProjectConfig,
    owner: Option<&str>,
) -> GenResult<()> {
    let invalid = |key: &str, message: String| GenError::InvalidPropertyValue {
        owner: format!("'{}' of {}", key, owner.unwrap_or("common")),
        message,
    };

    for key in I::TIME_FIELDS {
        if let Some(value) = fields.get_mut(*key).filter(|value| !value.is_null()) {
            let time: TimeValue = serde_json::from_value(value.clone())
                .map_err(|error| invalid(*key, error.to_string()))?;
            *value = Value::from(time.to_frames(config.fps())?);
        }
    }

    for (keys, is_offset) in [(I::RECT_FIELDS, false), (I::OFFSET_FIELDS, true)] {
        for key in keys {
            if let Some(value) = fields.get_mut(*key).filter(|value| !value.is_null()) {
                let raw = value
                    .as_str()
                    .ok_or_else(|| invalid(*key, "geometry must be a string".to_owned()))?;
                let geometry = if is_offset {
                    Geometry::parse_offset(raw)
                } else {
                    Geometry::parse_rect(raw, &config.video_mode)
                }
                .map_err(|message| invalid(*key, message))?;
                *value = Value::String(geometry.to_string());
            }
        }
    }

    Ok(())
}

fn to_fields<I: SceneInfo>(info: &I) -> GenResult<RawFields> {
    match serde_json::to_value(info) {
        Ok(Value::Object(fields)) => Ok(fields),
        Ok(_) | Err(_) => Err(GenError::InvalidPropertyValue {
            owner: I::KIND.to_owned(),
            message: "record did not serialize to an object".to_owned(),
        }),
    }
}

/// Current value of `property`, or [`GenError::NonExistentProperty`] for a typo.
pub fn field_value<I: SceneInfo>(info: &I, property: &str) -> GenResult<Value> {
    to_fields(info)?
        .remove(property)
        .ok_or_else(|| GenError::NonExistentProperty {
            property: property.to_owned(),
            kind: I::KIND,
        })
}

/// A copy of `info` with one field replaced. The value goes through the same
/// normalization as config values, so `1.5` seconds or `"10 20"` geometries work.
pub fn with_field<I: SceneInfo>(
    info: &I,
    property: &str,
    value: Value,
    config: &ProjectConfig,
) -> GenResult<I> {
    let mut fields = to_fields(info)?;
    match fields.get_mut(property) {
        Some(slot) => *slot = value,
        None => {
            return Err(GenError::NonExistentProperty {
                property: property.to_owned(),
                kind: I::KIND,
            })
        }
    }
    build(fields, config, info.name())
}
