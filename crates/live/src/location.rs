//! Viewer location
//!
//! Device position is optional: without it the map still shows every report,
//! only distance filtering and labels are skipped. A moving viewer is followed
//! through [`LocationProvider::watch_position`], which polls the provider and
//! publishes each change.

use crate::error::{LiveError, LiveResult};
use async_trait::async_trait;
use pinmap_geo::Coordinate;
use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;
use tokio::sync::watch;
use tokio::time::MissedTickBehavior;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

/// Outcome of a location permission request
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Permission {
    Granted,
    Denied,
}

/// Source of the viewer's position
#[async_trait]
pub trait LocationProvider: Send + Sync {
    /// Ask for access to the device position
    async fn request_permission(&self) -> Permission;

    /// Read the current position
    async fn current_position(&self) -> LiveResult<Coordinate>;

    /// Poll [`locate`] every `interval` and publish readings that differ from
    /// the previous one. Polling stops when the returned watch is dropped.
    ///
    /// Must be called from within a Tokio runtime.
    fn watch_position(self: Arc<Self>, interval: Duration) -> LocationWatch
    where
        Self: Sized + 'static,
    {
        LocationWatch::spawn(self, interval)
    }
}

/// Result of [`locate`]
#[derive(Debug, Clone, PartialEq)]
pub enum LocationStatus {
    Located(Coordinate),
    Denied,
    Unavailable(String),
}

impl LocationStatus {
    /// Reference point for distance filtering, if any
    pub fn reference(&self) -> Option<Coordinate> {
        match self {
            Self::Located(coord) => Some(*coord),
            Self::Denied | Self::Unavailable(_) => None,
        }
    }

    /// Message to show the user, if the position is missing
    pub fn user_message(&self) -> Option<&'static str> {
        match self {
            Self::Located(_) => None,
            Self::Denied => Some("Location access was denied. Showing all reports."),
            Self::Unavailable(_) => Some("Your location is unavailable. Showing all reports."),
        }
    }
}

/// Request permission and read one position
pub async fn locate<P: LocationProvider + ?Sized>(provider: &P) -> LocationStatus {
    if provider.request_permission().await == Permission::Denied {
        info!("Location permission denied; distance filtering disabled");
        return LocationStatus::Denied;
    }

    match provider.current_position().await {
        Ok(coord) if coord.is_valid() => LocationStatus::Located(coord),
        Ok(coord) => {
            warn!(%coord, "Device reported an invalid position");
            LocationStatus::Unavailable(format!("invalid position {coord}"))
        }
        Err(LiveError::PermissionDenied) => LocationStatus::Denied,
        Err(err) => {
            warn!(error = %err, "Could not read device position");
            LocationStatus::Unavailable(err.to_string())
        }
    }
}

/// Readings from a polled [`LocationProvider`]
#[derive(Debug)]
pub struct LocationWatch {
    readings: watch::Receiver<Option<LocationStatus>>,
    cancel: CancellationToken,
}

impl LocationWatch {
    fn spawn<P: LocationProvider + 'static>(provider: Arc<P>, interval: Duration) -> Self {
        let (tx, rx) = watch::channel(None);
        let cancel = CancellationToken::new();
        let token = cancel.clone();

        tokio::spawn(async move {
            let mut ticker = tokio::time::interval(interval.max(Duration::from_millis(1)));
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

            loop {
                tokio::select! {
                    _ = token.cancelled() => break,
                    _ = ticker.tick() => {}
                }
                let status = tokio::select! {
                    _ = token.cancelled() => break,
                    status = locate(provider.as_ref()) => status,
                };

                tx.send_if_modified(move |current| {
                    if current.as_ref() == Some(&status) {
                        return false;
                    }
                    debug!(?status, "Viewer location changed");
                    *current = Some(status);
                    true
                });
                if tx.is_closed() {
                    break;
                }
            }
            debug!("Location watch stopped");
        });

        Self {
            readings: rx,
            cancel,
        }
    }

    /// Latest reading, if one arrived yet
    pub fn current(&self) -> Option<LocationStatus> {
        self.readings.borrow().clone()
    }

    /// Wait for the next changed reading; `None` once the watch stopped
    pub async fn changed(&mut self) -> Option<LocationStatus> {
        loop {
            self.readings.changed().await.ok()?;
            if let Some(status) = self.readings.borrow_and_update().clone() {
                return Some(status);
            }
        }
    }

    /// Stop polling the provider
    pub fn stop(&self) {
        self.cancel.cancel();
    }
}

impl Drop for LocationWatch {
    fn drop(&mut self) {
        self.cancel.cancel();
    }
}

/// Provider with a fixed answer, for the CLI and tests
#[derive(Debug, Clone)]
pub struct FixedLocation {
    permission: Permission,
    position: Option<Coordinate>,
}

impl FixedLocation {
    /// Permission granted, position known
    pub fn at(position: Coordinate) -> Self {
        Self {
            permission: Permission::Granted,
            position: Some(position),
        }
    }

    /// Permission denied
    pub fn denied() -> Self {
        Self {
            permission: Permission::Denied,
            position: None,
        }
    }

    /// Permission granted, but no fix
    pub fn unavailable() -> Self {
        Self {
            permission: Permission::Granted,
            position: None,
        }
    }
}

#[async_trait]
impl LocationProvider for FixedLocation {
    async fn request_permission(&self) -> Permission {
        self.permission
    }

    async fn current_position(&self) -> LiveResult<Coordinate> {
        match (self.permission, self.position) {
            (Permission::Denied, _) => Err(LiveError::PermissionDenied),
            (Permission::Granted, Some(position)) => Ok(position),
            (Permission::Granted, None) => {
                Err(LiveError::LocationUnavailable("no position fix".to_string()))
            }
        }
    }
}

/// Provider whose answer can change while it is being watched
#[derive(Debug)]
pub struct MovableLocation {
    current: Mutex<FixedLocation>,
}

impl MovableLocation {
    pub fn new(initial: FixedLocation) -> Self {
        Self {
            current: Mutex::new(initial),
        }
    }

    /// Permission granted, starting at `position`
    pub fn at(position: Coordinate) -> Self {
        Self::new(FixedLocation::at(position))
    }

    /// Replace the whole answer, permission included
    pub fn set(&self, answer: FixedLocation) {
        *self.current.lock().unwrap_or_else(PoisonError::into_inner) = answer;
    }

    /// Move to `position` with permission granted
    pub fn move_to(&self, position: Coordinate) {
        self.set(FixedLocation::at(position));
    }

    fn answer(&self) -> FixedLocation {
        self.current
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }
}

#[async_trait]
impl LocationProvider for MovableLocation {
    async fn request_permission(&self) -> Permission {
        self.answer().permission
    }

    async fn current_position(&self) -> LiveResult<Coordinate> {
        let answer = self.answer();
        answer.current_position().await
    }
}
