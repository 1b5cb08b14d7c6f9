use std::future::Future;
use std::sync::Arc;

use tokio::sync::OnceCell;

/// Result of peeking into a [`Loader`] without triggering a load.
#[derive(Debug, PartialEq, Eq)]
pub enum Loaded<'a, T> {
    NotLoaded,
    Ready(&'a T),
}

/// Process-wide, init-once value that is loaded lazily on first use.
///
/// Concurrent callers of [`Loader::load`] share a single in-flight initialization.
/// A failed initialization leaves the loader in the [`Loaded::NotLoaded`] state so the
/// next caller can try again.
pub struct Loader<T>(Arc<OnceCell<T>>);

impl<T> Clone for Loader<T> {
    fn clone(&self) -> Self {
        Self(self.0.clone())
    }
}

impl<T> Default for Loader<T> {
    fn default() -> Self {
        Self(Arc::new(OnceCell::new()))
    }
}

impl<T> Loader<T> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn peek(&self) -> Loaded<'_, T> {
        match self.0.get() {
            Some(value) => Loaded::Ready(value),
            None => Loaded::NotLoaded,
        }
    }

    pub async fn load<E, F, Fut>(&self, init: F) -> Result<&T, E>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<T, E>>,
    {
        self.0.get_or_try_init(init).await
    }
}
