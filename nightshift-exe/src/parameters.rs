//  PARAMETERS.rs
//    by Lut99
//
//  Created:
//    09 Feb 2023, 09:21:55
//  Last edited:
//    04 Apr 2023, 15:17:40
//  Auto updated?
//    Yes
//
//  Description:
//!   Implements the two-tier parameter namespace with iterative
//!   fixed-point placeholder resolution and cycle detection.
//

use std::collections::HashMap;

use lazy_static::lazy_static;
use regex::Regex;

use nightshift_cfg::ParametersSection;
use nightshift_shr::utilities::json_to_string;

pub use crate::errors::ResolveError as Error;


/***** TESTS *****/
#[cfg(test)]
mod tests {
    use serde_json::json;
    use super::*;


    /// Builds a Parameters for the given section value.
    fn params(hosts: &[&str], section: serde_json::Value) -> Result<Parameters, Error> {
        let hosts: Vec<String> = hosts.iter().map(|h| h.to_string()).collect();
        let section: ParametersSection = serde_json::from_value(section).unwrap();
        Parameters::new("test", &hosts, &section)
    }


    #[test]
    fn test_common_chain() {
        // A chain that needs multiple passes to resolve, regardless of declaration order
        let p: Parameters = params(&[ "h1" ], json!({
            "common": {
                "c": "{{b}}!",
                "b": "{{a}}-b",
                "a": "a"
            }
        })).unwrap();

        assert_eq!(p.value("h1", "a").unwrap(), "a");
        assert_eq!(p.value("h1", "b").unwrap(), "a-b");
        assert_eq!(p.value("h1", "c").unwrap(), "a-b!");
    }

    #[test]
    fn test_common_cycle() {
        let err: Error = params(&[ "h1" ], json!({
            "common": { "a": "{{b}}", "b": "{{a}}" }
        })).unwrap_err();
        assert!(matches!(err, Error::CyclicDependency{ tier: "common", .. }));
    }

    #[test]
    fn test_specific_cycle() {
        let err: Error = params(&[ "h1" ], json!({
            "specific": [ { "hosts": ["h1"], "a": "{{b}}", "b": "{{a}}" } ]
        })).unwrap_err();
        assert!(matches!(err, Error::CyclicDependency{ tier: "specific", .. }));
    }

    #[test]
    fn test_synthetic_host() {
        // 'host' always resolves to the host itself, whatever the namespace contains
        let p: Parameters = params(&[ "node1", "node2" ], json!({
            "specific": [ { "hosts": ["node1", "node2"], "dir": "/data/{{host}}" } ]
        })).unwrap();

        assert_eq!(p.value("node1", "host").unwrap(), "node1");
        assert_eq!(p.value("node2", "host").unwrap(), "node2");
        assert_eq!(p.value("node1", "dir").unwrap(), "/data/node1");
        assert_eq!(p.value("node2", "dir").unwrap(), "/data/node2");
    }

    #[test]
    fn test_specific_shadows_common() {
        let p: Parameters = params(&[ "h1", "h2" ], json!({
            "common": { "role": "client", "greet": "I am a {{role}}" },
            "specific": [ { "hosts": ["h1"], "role": "server" } ]
        })).unwrap();

        // Shadowing applies to direct lookup...
        assert_eq!(p.value("h1", "role").unwrap(), "server");
        assert_eq!(p.value("h2", "role").unwrap(), "client");
        // ...but the common tier resolves against itself only
        assert_eq!(p.value("h1", "greet").unwrap(), "I am a client");
        // Specific values referencing the shadowed name see the specific one
        assert_eq!(p.resolve("h1", "{{role}}").unwrap(), "server");
    }

    #[test]
    fn test_experiment_name_seeded() {
        let p: Parameters = params(&[ "h1" ], json!({
            "common": { "dir": "/tmp/{{experiment-name}}" }
        })).unwrap();
        assert_eq!(p.value("h1", "dir").unwrap(), "/tmp/test");
    }

    #[test]
    fn test_duplicate_specific() {
        let err: Error = params(&[ "h1" ], json!({
            "specific": [
                { "hosts": ["h1"], "a": "1" },
                { "hosts": ["h1"], "a": "2" }
            ]
        })).unwrap_err();
        assert!(matches!(err, Error::DuplicateParameter{ .. }));
    }

    #[test]
    fn test_resolve_and_unknown() {
        let mut p: Parameters = params(&[ "h1" ], json!({
            "common": { "a": "1" }
        })).unwrap();

        assert_eq!(p.resolve("h1", "a = {{a}}").unwrap(), "a = 1");
        assert_eq!(p.resolve_all("h1", &[ "{{a}}".into(), "{{host}}".into() ]).unwrap(), vec![ "1".to_string(), "h1".to_string() ]);
        assert!(matches!(p.resolve("h1", "{{nope}}"), Err(Error::UnknownParameter{ .. })));
        assert!(matches!(p.value("h1", "nope"), Err(Error::UnknownParameter{ .. })));

        // Runtime values become visible after injection
        p.set_runtime("experiment-repetition", "3".into());
        assert_eq!(p.resolve("h1", "run {{experiment-repetition}}").unwrap(), "run 3");
    }

    #[test]
    fn test_non_string_values() {
        // Scalars are stringified before substitution
        let p: Parameters = params(&[ "h1" ], json!({
            "common": { "count": 42, "flag": true, "msg": "{{count}}-{{flag}}" }
        })).unwrap();
        assert_eq!(p.value("h1", "msg").unwrap(), "42-true");
    }
}





/***** CONSTANTS *****/
lazy_static! {
    /// Matches a `{{identifier}}` placeholder; the identifier is `[\w-]+`.
    static ref PLACEHOLDER_REGEX: Regex = Regex::new(r"\{\{(?P<name>[\w-]+?)\}\}").unwrap();
}





/***** HELPER FUNCTIONS *****/
/// Collects the placeholders occurring in the given value as `(block, name)` pairs.
fn placeholders(value: &str) -> Vec<(String, String)> {
    PLACEHOLDER_REGEX.captures_iter(value).map(|caps| (caps[0].into(), caps["name"].into())).collect()
}





/***** LIBRARY *****/
/// The two-tier (common / host-specific) named-value namespace of an experiment.
///
/// Every stored value is fully resolved, i.e., contains no `{{...}}` placeholder. Resolution happens once, at construction; afterwards the namespace is read-only except for runtime values injected by the run controller.
#[derive(Clone, Debug)]
pub struct Parameters {
    /// The values shared by every host.
    common   : HashMap<String, String>,
    /// The per-host values, which shadow common ones of the same name.
    specific : HashMap<String, HashMap<String, String>>,
}

impl Parameters {
    /// Constructor for the Parameters, which resolves both tiers to a fixed point.
    ///
    /// # Arguments
    /// - `experiment_name`: The name of the owning experiment, seeded as the `experiment-name` value.
    /// - `hosts`: The hosts of the experiment; every host gets a specific tier (possibly empty).
    /// - `section`: The raw `parameters` section of the descriptor.
    ///
    /// # Returns
    /// A new Parameters instance with every value placeholder-free.
    ///
    /// # Errors
    /// This function errors if a resolution pass makes no progress (cyclic dependency) or a specific parameter is declared twice for the same host.
    pub fn new(experiment_name: &str, hosts: &[String], section: &ParametersSection) -> Result<Self, Error> {
        let mut this: Self = Self {
            common   : HashMap::from([ ("experiment-name".into(), experiment_name.into()) ]),
            specific : HashMap::new(),
        };

        this.resolve_common(section)?;
        this.resolve_specific(hosts, section)?;
        Ok(this)
    }

    /// Resolves the common tier against itself, to a fixed point.
    fn resolve_common(&mut self, section: &ParametersSection) -> Result<(), Error> {
        let mut unresolved: HashMap<String, String> = section.common.iter().map(|(name, value)| (name.clone(), json_to_string(value))).collect();

        while !unresolved.is_empty() {
            let mut next_unresolved: HashMap<String, String> = HashMap::new();

            for (name, value) in unresolved.iter() {
                let mut resolved_value: String = value.clone();
                let mut is_resolved: bool = true;

                for (block, reference) in placeholders(value) {
                    match self.common.get(&reference) {
                        Some(sub) => { resolved_value = resolved_value.replace(&block, sub); },
                        None      => { is_resolved = false; break; },
                    }
                }

                if is_resolved {
                    self.common.insert(name.clone(), resolved_value);
                } else {
                    next_unresolved.insert(name.clone(), value.clone());
                }
            }

            // A pass that shrinks nothing will never shrink anything
            if next_unresolved.len() == unresolved.len() {
                let mut names: Vec<String> = next_unresolved.into_keys().collect();
                names.sort();
                return Err(Error::CyclicDependency{ tier: "common", host: None, names });
            }
            unresolved = next_unresolved;
        }

        Ok(())
    }

    /// Resolves the specific tier for every host, against the synthetic `host` value, the host's own resolved values and the common tier (in that precedence order).
    fn resolve_specific(&mut self, hosts: &[String], section: &ParametersSection) -> Result<(), Error> {
        for host in hosts {
            // Collect this host's raw values, rejecting duplicates
            let mut unresolved: HashMap<String, String> = HashMap::new();
            for entry in &section.specific {
                if !entry.hosts.iter().any(|h| h == host) { continue; }
                for (name, value) in &entry.values {
                    if unresolved.insert(name.clone(), json_to_string(value)).is_some() {
                        return Err(Error::DuplicateParameter{ host: host.clone(), name: name.clone() });
                    }
                }
            }
            self.specific.insert(host.clone(), HashMap::new());

            // Same fixed-point loop as the common tier, with the layered lookup
            while !unresolved.is_empty() {
                let mut next_unresolved: HashMap<String, String> = HashMap::new();

                for (name, value) in unresolved.iter() {
                    let mut resolved_value: String = value.clone();
                    let mut is_resolved: bool = true;

                    for (block, reference) in placeholders(value) {
                        let sub: Option<&str> = if reference == "host" {
                            Some(host.as_str())
                        } else if let Some(sub) = self.specific.get(host).and_then(|s| s.get(&reference)) {
                            Some(sub.as_str())
                        } else {
                            self.common.get(&reference).map(|s| s.as_str())
                        };

                        match sub {
                            Some(sub) => { resolved_value = resolved_value.replace(&block, sub); },
                            None      => { is_resolved = false; break; },
                        }
                    }

                    if is_resolved {
                        if let Some(specific) = self.specific.get_mut(host) {
                            specific.insert(name.clone(), resolved_value);
                        }
                    } else {
                        next_unresolved.insert(name.clone(), value.clone());
                    }
                }

                if next_unresolved.len() == unresolved.len() {
                    let mut names: Vec<String> = next_unresolved.into_keys().collect();
                    names.sort();
                    return Err(Error::CyclicDependency{ tier: "specific", host: Some(host.clone()), names });
                }
                unresolved = next_unresolved;
            }
        }

        Ok(())
    }



    /// Looks up the value of the given name, as seen from the given host.
    ///
    /// The synthetic name `host` always resolves to the host itself; otherwise, host-specific values shadow common ones.
    ///
    /// # Arguments
    /// - `host`: The host to look from.
    /// - `name`: The name to look up.
    ///
    /// # Returns
    /// The (already resolved) value.
    ///
    /// # Errors
    /// This function errors if the name exists in neither tier.
    pub fn value(&self, host: &str, name: &str) -> Result<String, Error> {
        if name == "host" {
            return Ok(host.into());
        }
        if let Some(value) = self.specific.get(host).and_then(|s| s.get(name)) {
            return Ok(value.clone());
        }
        match self.common.get(name) {
            Some(value) => Ok(value.clone()),
            None        => Err(Error::UnknownParameter{ host: host.into(), name: name.into() }),
        }
    }

    /// Substitutes every placeholder in the given string using the already-resolved namespaces.
    ///
    /// # Arguments
    /// - `host`: The host to resolve for.
    /// - `raw`: The string to substitute in.
    ///
    /// # Returns
    /// The string with every placeholder substituted. The namespace itself is never mutated.
    ///
    /// # Errors
    /// This function errors if a placeholder references an unknown name.
    pub fn resolve(&self, host: &str, raw: &str) -> Result<String, Error> {
        let mut result: String = raw.into();
        for (block, name) in placeholders(raw) {
            result = result.replace(&block, &self.value(host, &name)?);
        }
        Ok(result)
    }

    /// Maps `resolve()` over a list of strings.
    ///
    /// # Arguments
    /// - `host`: The host to resolve for.
    /// - `raw`: The strings to substitute in.
    ///
    /// # Returns
    /// The list with every placeholder substituted.
    ///
    /// # Errors
    /// This function errors if any placeholder references an unknown name.
    pub fn resolve_all(&self, host: &str, raw: &[String]) -> Result<Vec<String>, Error> {
        raw.iter().map(|s| self.resolve(host, s)).collect()
    }

    /// Injects a pre-resolved runtime value into the common tier (e.g., the current repetition index).
    ///
    /// # Arguments
    /// - `name`: The name of the value.
    /// - `value`: The value itself. It is stored as-is, so it must not contain placeholders.
    #[inline]
    pub fn set_runtime(&mut self, name: impl Into<String>, value: String) {
        self.common.insert(name.into(), value);
    }
}
