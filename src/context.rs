//! Per-pass overlay on top of the loaded config.
//!
//! Every component generates from its own [`ConfigContext`], so `@set`, aliases and
//! nicknames introduced by the script never leak from one component into the next.

use std::collections::{HashMap, HashSet};
use std::rc::Rc;

use serde_json::Value;

use crate::errors::{GenError, GenResult};
use crate::info::{self, SceneInfo};
use crate::resource::ResourceNames;
use crate::schema::ProjectConfig;

/// An active nickname and the display name it replaced.
#[derive(Debug, Clone, PartialEq)]
pub struct TrackedNick {
    pub nick: String,
    pub previous_display: Option<Value>,
}

pub struct ConfigContext<'a, I> {
    config: &'a ProjectConfig,
    cache: HashMap<String, Rc<I>>,
    common: Option<Rc<I>>,
    local_aliases: HashMap<String, String>,
    nicks: HashMap<String, TrackedNick>,
    resources: ResourceNames<'a>,
}

impl<'a, I: SceneInfo> ConfigContext<'a, I> {
    pub fn new(config: &'a ProjectConfig) -> Self {
        Self {
            config,
            cache: HashMap::new(),
            common: None,
            local_aliases: HashMap::new(),
            nicks: HashMap::new(),
            resources: ResourceNames::new(&config.resource_names),
        }
    }

    pub fn config(&self) -> &'a ProjectConfig {
        self.config
    }

    /// The record for `name` with aliases followed, or the common record for `None`.
    pub fn get(&mut self, name: Option<&str>) -> GenResult<Rc<I>> {
        self.get_with(name, true)
    }

    pub fn get_with(&mut self, name: Option<&str>, follow_alias: bool) -> GenResult<Rc<I>> {
        let Some(name) = name else {
            return self.common();
        };

        let key = if follow_alias {
            self.follow_alias(name)?
        } else {
            name.to_lowercase()
        };

        if let Some(info) = self.cache.get(&key) {
            return Ok(Rc::clone(info));
        }

        let info = Rc::new(info::load::<I>(self.config, Some(&key))?);
        self.cache.insert(key, Rc::clone(&info));
        Ok(info)
    }

    pub fn common(&mut self) -> GenResult<Rc<I>> {
        if let Some(info) = &self.common {
            return Ok(Rc::clone(info));
        }
        let info = Rc::new(info::load::<I>(self.config, None)?);
        self.common = Some(Rc::clone(&info));
        Ok(info)
    }

    /// The record exactly as the config file describes it, ignoring script overrides.
    pub fn loaded(&self, name: Option<&str>) -> GenResult<I> {
        match name {
            Some(name) => info::load::<I>(self.config, Some(&self.follow_alias(name)?)),
            None => info::load::<I>(self.config, None),
        }
    }

    /// Replaces the cached entry keyed by the record's own name.
    pub fn update(&mut self, info: I) {
        match info.name().map(str::to_owned) {
            Some(name) => {
                self.cache.insert(name, Rc::new(info));
            }
            None => self.common = Some(Rc::new(info)),
        }
    }

    pub fn reset(&mut self, name: &str) -> GenResult<()> {
        let key = self.follow_alias(name)?;
        self.cache.remove(&key);
        Ok(())
    }

    pub fn reset_all(&mut self) {
        self.cache.clear();
        self.common = None;
    }

    /// Resolves local aliases first, then the config's global ones, until a real name remains.
    pub fn follow_alias(&self, name: &str) -> GenResult<String> {
        let mut current = name.to_lowercase();
        let mut visited = HashSet::new();

        loop {
            let next = self
                .local_aliases
                .get(&current)
                .or_else(|| self.config.aliases.get(&current));
            let Some(next) = next else {
                return Ok(current);
            };
            if !visited.insert(current.clone()) {
                return Err(GenError::CyclicAlias(name.to_lowercase()));
            }
            current = next.clone();
        }
    }

    pub fn add_local_alias(&mut self, name: &str, alias: &str) {
        self.local_aliases
            .insert(alias.to_lowercase(), name.to_lowercase());
    }

    pub fn remove_local_alias(&mut self, alias: &str) -> GenResult<()> {
        self.local_aliases
            .remove(&alias.to_lowercase())
            .map(|_| ())
            .ok_or_else(|| GenError::dialogue(format!("'{alias}' is not a local alias")))
    }

    pub fn track_nick(&mut self, name: &str, nick: &str, previous_display: Option<Value>) {
        self.nicks.insert(
            name.to_owned(),
            TrackedNick {
                nick: nick.to_owned(),
                previous_display,
            },
        );
    }

    pub fn pop_nick(&mut self, name: &str) -> Option<TrackedNick> {
        self.nicks.remove(name)
    }

    /// `@set`: replaces one field of the cached record.
    pub fn set_property(&mut self, name: &str, property: &str, value: Value) -> GenResult<()> {
        let current = self.get(Some(name))?;
        let updated = info::with_field(current.as_ref(), property, value, self.config)?;
        self.update(updated);
        Ok(())
    }

    /// `@unset`: puts one field back to its loaded value.
    pub fn unset_property(&mut self, name: &str, property: &str) -> GenResult<()> {
        let current = self.get(Some(name))?;
        let loaded = self.loaded(Some(name))?;
        let original = info::field_value(&loaded, property)?;
        let updated = info::with_field(current.as_ref(), property, original, self.config)?;
        self.update(updated);
        Ok(())
    }

    /// `@nick`: the nickname becomes an alias and, where the record shows a name, its display name.
    pub fn nick(&mut self, name: &str, nick: &str) -> GenResult<()> {
        let canonical = self.follow_alias(name)?;
        let alias = nick.to_lowercase();

        let previous_display = match self.pop_nick(&canonical) {
            Some(tracked) => {
                self.local_aliases.remove(&tracked.nick);
                tracked.previous_display
            }
            None => match I::DISPLAY_NAME_FIELD {
                Some(field) => Some(info::field_value(self.get(Some(&canonical))?.as_ref(), field)?),
                None => None,
            },
        };

        self.add_local_alias(&canonical, &alias);
        if let Some(field) = I::DISPLAY_NAME_FIELD {
            self.set_property(&canonical, field, Value::String(nick.to_owned()))?;
        }
        self.track_nick(&canonical, &alias, previous_display);
        Ok(())
    }

    /// `@unnick`: drops the nickname alias and restores the display name it replaced.
    pub fn unnick(&mut self, name: &str) -> GenResult<()> {
        let canonical = self.follow_alias(name)?;
        let tracked = self
            .pop_nick(&canonical)
            .ok_or_else(|| GenError::dialogue(format!("'{canonical}' has no active nickname")))?;

        self.local_aliases.remove(&tracked.nick);
        if let (Some(field), Some(previous)) = (I::DISPLAY_NAME_FIELD, tracked.previous_display) {
            self.set_property(&canonical, field, previous)?;
        }
        Ok(())
    }

    pub fn define_resource(&mut self, name: &str, value: &str) {
        self.resources.define(name, value);
    }

    pub fn resolve_resource(&self, resource: &str) -> GenResult<String> {
        self.resources.resolve(resource)
    }
}
