//! Live report map engine
//!
//! Keeps an on-screen marker set in step with a remote report store:
//!
//! - **Sync**: one subscription across every collection that can change the
//!   visible reports; bursts of notifications collapse into a single re-fetch
//! - **Layout**: reports are parsed, clustered and spread radially so stacked
//!   pins stay individually selectable
//! - **Filtering**: category and radius filters around the viewer's location,
//!   re-applied as the viewer moves
//! - **Render stabilization**: per-marker readiness so settled markers stop
//!   re-laying out
//!
//! # Example
//!
//! ```rust,no_run
//! use pinmap_core::config::SyncConfig;
//! use pinmap_live::{LiveSyncCoordinator, MapView, MemoryStore, ReportEntity};
//! use std::sync::{Arc, Mutex};
//!
//! #[tokio::main]
//! async fn main() {
//!     let store = Arc::new(MemoryStore::new());
//!     let view = Arc::new(Mutex::new(MapView::default()));
//!
//!     let sink = Arc::clone(&view);
//!     let config = SyncConfig::default();
//!     let handle = LiveSyncCoordinator::mount(store, &config, move |reports: Vec<ReportEntity>| {
//!         if let Ok(mut view) = sink.lock() {
//!             view.apply_refresh(reports);
//!         }
//!     });
//!
//!     // ... later, when the map goes away
//!     handle.unmount();
//! }
//! ```

#![warn(clippy::all)]
#![allow(clippy::module_name_repetitions)]

pub mod error;
pub mod location;
pub mod memory;
pub mod model;
pub mod proximity;
pub mod render;
pub mod store;
pub mod sync;
pub mod view;

pub use error::{LiveError, LiveErrorCode, LiveResult};
pub use location::{
    locate, FixedLocation, LocationProvider, LocationStatus, LocationWatch, MovableLocation,
    Permission,
};
pub use memory::MemoryStore;
pub use model::{BaseReport, Category, CategoryDetails, CategoryFilter, RawReport, ReportEntity};
pub use proximity::{filter_reports, ProximityFilter, Verdict};
pub use render::{RenderMode, RenderStabilizer};
pub use store::{
    ChangeEvent, ChangeKind, ChannelEvent, Collection, ReportStore, Subscription,
    SubscriptionGuard,
};
pub use sync::{LiveSyncCoordinator, LiveSyncHandle, RefreshHandler, SyncState};
pub use view::{follow_location, MapSettings, MapView, Marker};
