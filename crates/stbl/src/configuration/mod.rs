use std::fs;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use serde_with::{serde_as, DurationMilliSeconds, DurationSeconds};
use stbl_common::service::monitoring::VerbosityConfiguration;
use stbl_prices::DEFAULT_POLL_PERIOD;
use stbl_swap::{SwapClientConfigurator, DEFAULT_DEBOUNCE_DELAY};

use crate::configuration::environment::{JSONPath, Variables, VariablesResolver};
use crate::Error;

pub mod environment;

fn default_poll_period() -> Duration {
    DEFAULT_POLL_PERIOD
}

fn default_debounce() -> Duration {
    DEFAULT_DEBOUNCE_DELAY
}

#[serde_as]
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct PriceConfiguration {
    #[serde(flatten)]
    pub provider: stbl_prices::Configuration,

    #[serde_as(as = "DurationSeconds<u64>")]
    #[serde(default = "default_poll_period")]
    pub poll_period: Duration,
}

impl Default for PriceConfiguration {
    fn default() -> Self {
        Self {
            provider: stbl_prices::Configuration::default(),
            poll_period: DEFAULT_POLL_PERIOD,
        }
    }
}

#[serde_as]
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct SwapConfiguration {
    #[serde(flatten)]
    pub provider: SwapClientConfigurator,

    #[serde_as(as = "DurationMilliSeconds<u64>")]
    #[serde(default = "default_debounce")]
    pub debounce: Duration,
}

impl Default for SwapConfiguration {
    fn default() -> Self {
        Self {
            provider: SwapClientConfigurator::default(),
            debounce: DEFAULT_DEBOUNCE_DELAY,
        }
    }
}

#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct Configuration {
    #[serde(default)]
    pub verbosity: VerbosityConfiguration,

    #[serde(default)]
    pub price: PriceConfiguration,
    #[serde(default)]
    pub swap: SwapConfiguration,
}

impl Configuration {
    /// Loads the file on top of the default configuration.
    pub fn from_file(path: &str) -> Result<Self, Error> {
        let mut profile = Profile::from_configuration(&Configuration::default())?;
        profile.merge(&Profile::from_file(path)?);

        profile.into_configuration()
    }

    /// Overrides the configuration with the `STBL_*` variables of the environment.
    pub fn with_environment(self) -> Result<Self, Error> {
        let resolver = VariablesResolver::initialize()?;
        let variables = resolver.resolve_environment()?;

        self.with_variables(variables)
    }

    pub fn with_variables(self, variables: Variables) -> Result<Self, Error> {
        let mut profile = Profile::from_configuration(&self)?;
        profile.insert_variables(variables)?;

        profile.into_configuration()
    }

    pub fn validate(&self) -> Result<(), Error> {
        self.price.provider.validate()?;
        if self.price.poll_period.is_zero() {
            return Err(Error::Configuration("price poll period cannot be zero".to_string()));
        }

        self.swap.provider.validate()?;

        Ok(())
    }
}

/// Untyped configuration document, used to layer sources before deserializing.
#[derive(Clone, Debug, PartialEq)]
pub struct Profile(Map<String, Value>);

impl Profile {
    pub fn empty() -> Self {
        Self(Map::new())
    }

    pub fn from_configuration(configuration: &Configuration) -> Result<Self, Error> {
        match serde_json::to_value(configuration).map_err(|e| Error::Configuration(e.to_string()))? {
            Value::Object(fields) => Ok(Self(fields)),
            _ => Err(Error::Configuration("configuration is not an object".to_string())),
        }
    }

    pub fn from_file(path: &str) -> Result<Self, Error> {
        let data = fs::read(path).map_err(|e| Error::Configuration(format!("{}: {}", path, e)))?;
        let fields: Map<String, Value> = serde_json::from_slice(&data).map_err(|e| Error::Configuration(format!("{}: {}", path, e)))?;

        Ok(Self(fields))
    }

    pub fn into_configuration(self) -> Result<Configuration, Error> {
        serde_json::from_value(Value::Object(self.0)).map_err(|e| Error::Configuration(e.to_string()))
    }

    pub fn merge(&mut self, profile: &Profile) {
        #[rustfmt::skip]
        fn merge_rec(profile: &mut Map<String, Value>, other: &Map<String, Value>) {
            for (k, v) in other {
                match (profile.get_mut(k), v) {
                    (Some(Value::Object(a_obj)), Value::Object(b_obj)) => { merge_rec(a_obj, b_obj); },
                    _ => { profile.insert(k.clone(), v.clone()); },
                }
            }
        }

        merge_rec(&mut self.0, &profile.0)
    }

    pub fn insert_variables(&mut self, variables: Variables) -> Result<(), Error> {
        for (path, value) in variables.into_iter() {
            self.insert_variable(&path, value)?
        }

        Ok(())
    }

    pub fn insert_variable(&mut self, path: &JSONPath, value: Value) -> Result<(), Error> {
        fn insert_rec(object: &mut Map<String, Value>, path: &[String], value: Value) -> Result<(), Error> {
            let Some((head, tail)) = path.split_first() else {
                return Ok(());
            };

            if tail.is_empty() {
                object.insert(head.to_string(), value);
                return Ok(());
            }

            let inner = object
                .entry(head.to_string())
                .or_insert(Value::Object(Map::new()))
                .as_object_mut()
                .ok_or(Error::Configuration(format!("could not merge variable {} in configuration", head)))?;

            insert_rec(inner, tail, value)
        }

        insert_rec(&mut self.0, path, value)
    }
}
