use std::ops::Deref;
use std::time::Duration;

use tokio::time::Instant;

/// Holds a value together with the instant it was last refreshed. After `validity`
/// the value is stale, though still usable as a fallback.
///
/// Time is measured with [`tokio::time::Instant`] so paused-clock tests can drive it.
#[derive(Clone, Debug)]
pub struct Expirable<T> {
    refreshed_at: Option<Instant>,
    validity: Duration,
    value: T,
}

impl<T> Deref for Expirable<T> {
    type Target = T;

    fn deref(&self) -> &Self::Target {
        &self.value
    }
}

impl<T> Expirable<T> {
    /// Returns true if the value is stale, or was never refreshed.
    pub fn is_stale(&self) -> bool {
        match self.refreshed_at {
            Some(at) => at.elapsed() >= self.validity,
            None => true,
        }
    }

    /// Replaces the value and resets the validity window.
    pub fn refresh_with(&mut self, value: T) {
        self.refreshed_at = Some(Instant::now());
        self.value = value;
    }
}

impl<T: Default> Expirable<T> {
    /// Returns an `Expirable` holding the default value that was never refreshed.
    pub fn empty(validity: Duration) -> Self {
        Self {
            refreshed_at: None,
            validity,
            value: T::default(),
        }
    }
}
