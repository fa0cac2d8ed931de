//! Report store interface
//!
//! The store owns the reports and pushes change notifications over named
//! channels. Notifications carry no payload the map relies on; they only say
//! that something in a collection changed.

use crate::error::LiveResult;
use crate::model::{Category, ReportEntity};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::fmt;
use tokio::sync::mpsc;

/// Stored collections whose changes affect the map
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Collection {
    Reports,
    EventDetails,
    HazardDetails,
    LostItems,
    FoundItems,
}

impl Collection {
    /// Every collection the map listens to
    pub const ALL: [Collection; 5] = [
        Self::Reports,
        Self::EventDetails,
        Self::HazardDetails,
        Self::LostItems,
        Self::FoundItems,
    ];

    /// Table name in the backing store
    pub fn table_name(self) -> &'static str {
        match self {
            Self::Reports => "reports",
            Self::EventDetails => "event_details",
            Self::HazardDetails => "hazard_details",
            Self::LostItems => "lost_items",
            Self::FoundItems => "found_items",
        }
    }

    /// Extension collection holding details for `category`
    pub fn details_for(category: Category) -> Self {
        match category {
            Category::Event => Self::EventDetails,
            Category::Hazard => Self::HazardDetails,
            Category::Lost => Self::LostItems,
            Category::Found => Self::FoundItems,
        }
    }
}

impl fmt::Display for Collection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.table_name())
    }
}

/// Kind of row change
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChangeKind {
    Inserted,
    Updated,
    Deleted,
}

/// A change notification
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChangeEvent {
    pub collection: Collection,
    pub kind: ChangeKind,
}

impl ChangeEvent {
    pub fn new(collection: Collection, kind: ChangeKind) -> Self {
        Self { collection, kind }
    }
}

/// What arrives on a subscription channel
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ChannelEvent {
    Change(ChangeEvent),
    /// The channel broke; no further events will follow
    Error(String),
}

/// Releases a subscription exactly once, explicitly or on drop
pub struct SubscriptionGuard {
    release: Option<Box<dyn FnOnce() + Send>>,
}

impl SubscriptionGuard {
    pub fn new(release: impl FnOnce() + Send + 'static) -> Self {
        Self {
            release: Some(Box::new(release)),
        }
    }

    /// Release the subscription; returns false if it was already released
    pub fn release(&mut self) -> bool {
        match self.release.take() {
            Some(release) => {
                release();
                true
            }
            None => false,
        }
    }

    pub fn is_released(&self) -> bool {
        self.release.is_none()
    }
}

impl Drop for SubscriptionGuard {
    fn drop(&mut self) {
        self.release();
    }
}

impl fmt::Debug for SubscriptionGuard {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SubscriptionGuard")
            .field("released", &self.is_released())
            .finish()
    }
}

/// An open subscription: its event stream and the guard that ends it
#[derive(Debug)]
pub struct Subscription {
    events: mpsc::UnboundedReceiver<ChannelEvent>,
    guard: SubscriptionGuard,
}

impl Subscription {
    pub fn new(events: mpsc::UnboundedReceiver<ChannelEvent>, guard: SubscriptionGuard) -> Self {
        Self { events, guard }
    }

    pub fn into_parts(self) -> (mpsc::UnboundedReceiver<ChannelEvent>, SubscriptionGuard) {
        (self.events, self.guard)
    }
}

/// Source of reports and change notifications
#[async_trait]
pub trait ReportStore: Send + Sync {
    /// All reports, newest first, joined with their category details
    async fn list_reports(&self) -> LiveResult<Vec<ReportEntity>>;

    /// Open one channel named `channel` covering `collections`
    async fn subscribe(&self, channel: &str, collections: &[Collection])
        -> LiveResult<Subscription>;

    /// Reports of a single category, newest first
    async fn list_by_category(&self, category: Category) -> LiveResult<Vec<ReportEntity>> {
        let mut reports = self.list_reports().await?;
        reports.retain(|r| r.category == category);
        Ok(reports)
    }
}
