use std::collections::{BTreeMap, HashSet};

use crate::errors::{GenError, GenResult};

/// Named resource shortcuts: `!name!rest` expands to the value of `name` followed by `rest`.
/// Script-local `!define`s shadow the names from the config file.
#[derive(Debug, Clone)]
pub struct ResourceNames<'a> {
    global: &'a BTreeMap<String, String>,
    local: BTreeMap<String, String>,
}

impl<'a> ResourceNames<'a> {
    pub fn new(global: &'a BTreeMap<String, String>) -> Self {
        Self {
            global,
            local: BTreeMap::new(),
        }
    }

    pub fn define(&mut self, name: &str, value: &str) {
        self.local.insert(name.to_owned(), value.to_owned());
    }

    fn lookup(&self, name: &str) -> Option<&str> {
        self.local
            .get(name)
            .or_else(|| self.global.get(name))
            .map(String::as_str)
    }

    /// Expands a possibly named resource. Names may expand to further names.
    pub fn resolve(&self, resource: &str) -> GenResult<String> {
        let mut current = resource.to_owned();
        let mut postfixes = Vec::new();
        let mut seen = HashSet::new();

        while let Some(rest) = current.strip_prefix('!') {
            let (name, postfix) = rest.split_once('!').unwrap_or((rest, ""));
            let (name, postfix) = (name.to_owned(), postfix.to_owned());

            if !seen.insert(name.clone()) {
                return Err(GenError::CyclicResource(name));
            }

            let target = self.lookup(&name).ok_or_else(|| {
                GenError::MissingConfig(format!("named resource '{name}' is not defined"))
            })?;
            postfixes.push(postfix);
            current = target.to_owned();
        }

        for postfix in postfixes.iter().rev() {
            current.push_str(postfix);
        }
        Ok(current)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn names() -> BTreeMap<String, String> {
        BTreeMap::from([
            ("assets".to_owned(), "/footage/assets/".to_owned()),
            ("portraits".to_owned(), "!assets!portraits/".to_owned()),
            ("loop_a".to_owned(), "!loop_b".to_owned()),
            ("loop_b".to_owned(), "!loop_a!x".to_owned()),
        ])
    }

    #[test]
    fn plain_resources_pass_through() {
        let global = names();
        let resources = ResourceNames::new(&global);
        assert_eq!(
            resources.resolve("color:#000000").expect("plain"),
            "color:#000000"
        );
    }

    #[test]
    fn nested_names_expand_with_postfixes_in_order() {
        let global = names();
        let resources = ResourceNames::new(&global);
        assert_eq!(
            resources.resolve("!portraits!alice.png").expect("nested"),
            "/footage/assets/portraits/alice.png"
        );
        assert_eq!(
            resources.resolve("!assets").expect("bare name"),
            "/footage/assets/"
        );
    }

    #[test]
    fn local_definitions_shadow_config_names() {
        let global = names();
        let mut resources = ResourceNames::new(&global);
        resources.define("assets", "/tmp/");
        assert_eq!(
            resources.resolve("!portraits!a.png").expect("shadowed"),
            "/tmp/portraits/a.png"
        );
    }

    #[test]
    fn unknown_and_cyclic_names_fail() {
        let global = names();
        let resources = ResourceNames::new(&global);
        assert!(matches!(
            resources.resolve("!missing!x"),
            Err(GenError::MissingConfig(_))
        ));
        assert!(matches!(
            resources.resolve("!loop_a"),
            Err(GenError::CyclicResource(_))
        ));
    }
}
