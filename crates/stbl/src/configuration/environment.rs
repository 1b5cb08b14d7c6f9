use std::collections::hash_map::IntoIter;
use std::collections::HashMap;
use std::ops::Deref;

use serde_json::Value;

use crate::configuration::{Configuration, Profile};
use crate::Error;

pub const ENVIRONMENT_PREFIX: &str = "STBL_";

#[derive(PartialEq, Eq, Hash, Clone, Debug)]
pub struct JSONPath(Vec<String>);

impl Deref for JSONPath {
    type Target = [String];

    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

impl JSONPath {
    pub fn from_str(s: &str) -> Self {
        JSONPath(s.split('.').map(|x| x.to_lowercase()).collect())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Kind {
    Text,
    Value,
}

/// Maps variable names such as `swap_slippage_bps` to their location in the configuration.
/// Known names are the leaves of the default configuration.
#[derive(Debug)]
pub struct VariablesResolver(HashMap<String, (JSONPath, Kind)>);

impl VariablesResolver {
    pub fn initialize() -> Result<Self, Error> {
        fn resolve_variables(path: &[String], value: &Value, resolutions: &mut HashMap<String, (JSONPath, Kind)>) {
            match value {
                Value::Object(fields) => {
                    for (field, value) in fields {
                        resolve_variables(&[path, &[field.clone()]].concat(), value, resolutions)
                    }
                },
                // Optional and textual leaves are taken verbatim, the api key `1234` is not a number
                Value::String(_) | Value::Null => {
                    resolutions.insert(path.join("_"), (JSONPath(path.to_vec()), Kind::Text));
                },
                _ => {
                    resolutions.insert(path.join("_"), (JSONPath(path.to_vec()), Kind::Value));
                },
            }
        }

        let profile = Profile::from_configuration(&Configuration::default())?;

        let mut resolutions = HashMap::new();
        resolve_variables(&[], &Value::Object(profile.0), &mut resolutions);

        Ok(Self(resolutions))
    }

    pub fn resolve_environment(&self) -> Result<Variables, Error> {
        let variables = envy::prefixed(ENVIRONMENT_PREFIX)
            .from_env::<HashMap<String, String>>()
            .map_err(|e| Error::Configuration(e.to_string()))?;

        Ok(self.resolve_variables(variables))
    }

    /// Unknown names are ignored.
    pub fn resolve_variables(&self, variables: HashMap<String, String>) -> Variables {
        let mut resolved_variables = HashMap::new();
        for (name, value) in variables {
            if let Some((path, kind)) = self.0.get(&name.to_lowercase()) {
                resolved_variables.insert(path.clone(), Self::decode_value(*kind, &value));
            }
        }

        Variables(resolved_variables)
    }

    fn decode_value(kind: Kind, value: &str) -> Value {
        match kind {
            Kind::Text => Value::String(value.to_string()),
            Kind::Value => serde_json::from_str(value).unwrap_or_else(|_| Value::String(value.to_string())),
        }
    }
}

pub struct Variables(HashMap<JSONPath, Value>);

impl From<HashMap<JSONPath, Value>> for Variables {
    fn from(map: HashMap<JSONPath, Value>) -> Self {
        Variables(map)
    }
}

impl Variables {
    pub fn get(&self, s: &str) -> Option<&Value> {
        self.0.get(&JSONPath::from_str(s))
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn into_iter(self) -> IntoIter<JSONPath, Value> {
        self.0.into_iter()
    }
}
