//! Per-hash shared resolutions.
//!
//! The first request for a hash starts a detached task; later requests for
//! the same hash await that task's result instead of starting their own.
//! The task removes its own entry when it finishes, so entries never outlive
//! the resolution even when every waiter has gone away.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use futures::future::{BoxFuture, FutureExt, Shared};

use crate::provider::{PlayableLink, ResolutionError};

pub(crate) type Resolution = Result<PlayableLink, ResolutionError>;
pub(crate) type SharedResolution = Shared<BoxFuture<'static, Resolution>>;

/// What [`InFlight::join`] found for a key.
pub(crate) enum Joined<T> {
    /// A resolution is running (possibly just started by this call).
    Flight(SharedResolution),
    /// Nothing was running and `ready` produced a value.
    Ready(T),
}

/// Resolutions currently running, keyed by normalized hash.
#[derive(Clone, Default)]
pub(crate) struct InFlight {
    flights: Arc<Mutex<HashMap<String, SharedResolution>>>,
}

impl InFlight {
    /// Join the resolution running for `key`, or start one.
    ///
    /// `ready` is consulted under the map lock before starting, so a result
    /// published by a finishing task is seen either as a running flight or
    /// as a ready value. `start` receives the release handle that must be
    /// dropped once the result has been published.
    pub(crate) fn join<T>(
        &self,
        key: &str,
        ready: impl FnOnce() -> Option<T>,
        start: impl FnOnce(FlightRelease) -> BoxFuture<'static, Resolution>,
    ) -> Joined<T> {
        let mut flights = self.map();
        if let Some(flight) = flights.get(key) {
            return Joined::Flight(flight.clone());
        }
        if let Some(value) = ready() {
            return Joined::Ready(value);
        }

        let release = FlightRelease {
            flights: self.clone(),
            key: key.to_string(),
        };
        let flight = start(release).shared();
        flights.insert(key.to_string(), flight.clone());
        Joined::Flight(flight)
    }

    /// Number of resolutions running.
    #[cfg(test)]
    pub(crate) fn len(&self) -> usize {
        self.map().len()
    }

    fn map(&self) -> std::sync::MutexGuard<'_, HashMap<String, SharedResolution>> {
        self.flights.lock().unwrap_or_else(|e| e.into_inner())
    }
}

/// Forgets its key when dropped.
///
/// Owned by the resolution task, not by the requests waiting on it.
pub(crate) struct FlightRelease {
    flights: InFlight,
    key: String,
}

impl Drop for FlightRelease {
    fn drop(&mut self) {
        self.flights.map().remove(&self.key);
    }
}
