use async_trait::async_trait;
use thiserror::Error;

mod runner;

pub use runner::TokioServiceManager;

pub mod monitoring;

pub use tracing;

#[macro_export]
macro_rules! log_if_error {
    ($e: expr) => {
        match $e {
            Ok(v) => Ok(v),
            Err(e) => {
                $crate::service::tracing::error!("{}", e);
                Err(e)
            },
        }
    };
}

/// Convenience macro to log a message using the [`Service::NAME`] as target
/// Example
/// ```rust
/// use stbl_common::service::{Error, Service};
///
/// use stbl_common::service_info;
///
/// pub struct MyService;
///
/// impl Service for MyService {
///     const NAME: &'static str = "MyService";
///     type Context = ();
///
///     async fn new(context: Self::Context) -> Self { todo!() }
///
///     async fn run(self) -> Result<(), Error> {
///         service_info!("foo"); // print `[MyService] foo`
///         Ok(())
///     }
/// }
///
/// ```
#[macro_export]
macro_rules! service_info {
    ($s: literal $(, $v: expr)*) => {
        $crate::log::info!(target: <Self as $crate::service::Service>::NAME , $s, $($v),*);
    };
}

/// See [`service_info`]
#[macro_export]
macro_rules! service_warn {
    ($s: literal $(, $v: expr)*) => {
        $crate::log::warn!(target: <Self as $crate::service::Service>::NAME , $s, $($v),*);
    };
}

/// See [`service_info`]
#[macro_export]
macro_rules! service_debug {
    ($s: literal $(, $v: expr)*) => {
        $crate::log::debug!(target: <Self as $crate::service::Service>::NAME , $s, $($v),*);
    };
}

#[derive(Error, Debug)]
#[error("{0}")]
pub struct Error(String);

impl Error {
    pub fn new(s: &str) -> Error {
        Error(s.to_string())
    }

    pub fn from<E: std::error::Error>(e: E) -> Self {
        Self(e.to_string())
    }
}

/// Represent a service. A service is a concurrent entity with its own lifecycle
/// running on a [`Service::Context`]. The service is created using [`Self::new`] and
/// executed by calling [`Self::run`].
///
/// Services are registered on a [`TokioServiceManager`] which owns their lifecycle:
/// dropping the manager tears every service down.
#[async_trait]
pub trait Service {
    const NAME: &'static str;
    type Context: Clone + Send;

    /// Returns a new service instance
    async fn new(context: Self::Context) -> Self;

    /// Runs the given service. Run should never return in general, except if there is
    /// an unrecoverable error in which case the manager will create a new instance and
    /// execute it.
    async fn run(self) -> Result<(), Error>;
}
