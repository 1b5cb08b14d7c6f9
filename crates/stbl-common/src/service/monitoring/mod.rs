use std::str::FromStr;

use serde::{Deserialize, Serialize};
use tracing_subscriber::filter::LevelFilter;
use tracing_subscriber::Layer;

#[macro_export]
macro_rules! measure_duration {
    ($e: expr) => {{
        let now = std::time::Instant::now();

        let result = $e;
        (result, now.elapsed())
    }};
}

#[macro_export]
macro_rules! metric {
    (counter [ $label: ident ] = $i: expr $(,$field: ident = $value: expr)*) => {
        $crate::service::tracing::debug!(monotonic_counter.$label = $i, $($field = $value),*)
    };
    (on error $e: expr => counter [ $label: ident ] = $i: expr $(,$field: ident = $value: expr)*) => {
        if let Err(ref e) = $e {
            $crate::service::tracing::debug!(counter.$label = $i, $($field = $value,)* error = e.to_string());
        }
    };
    (histogram [ $label: ident ] = $i: expr $(,$field: ident = $value: expr)*) => {
        $crate::service::tracing::debug!(histogram.$label = $i as f64, $($field = $value),*)
    };
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum VerbosityConfiguration {
    Debug,
    #[default]
    Info,
}

impl FromStr for VerbosityConfiguration {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "debug" => Ok(VerbosityConfiguration::Debug),
            "info" => Ok(VerbosityConfiguration::Info),
            _ => Ok(VerbosityConfiguration::Debug),
        }
    }
}

pub struct Fmt;

impl Fmt {
    pub fn layer<S>(verbosity: &VerbosityConfiguration) -> impl Layer<S>
    where
        S: for<'span> tracing_subscriber::registry::LookupSpan<'span> + tracing::Subscriber,
    {
        let filter = match verbosity {
            VerbosityConfiguration::Info => LevelFilter::INFO,
            VerbosityConfiguration::Debug => LevelFilter::DEBUG,
        };

        tracing_subscriber::fmt::layer().with_ansi(false).compact().with_filter(filter)
    }
}
