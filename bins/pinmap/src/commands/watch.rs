//! `pinmap watch`

use super::load_reports;
use crate::output::{print_json, Status};
use crate::Format;
use anyhow::{bail, Result};
use pinmap_core::config::{Config, SyncConfig};
use pinmap_core::error::exit_codes;
use pinmap_live::{
    ChangeEvent, ChangeKind, Collection, LiveSyncCoordinator, MapSettings, MapView, MemoryStore,
    ReportEntity, SyncState,
};
use pinmap_telemetry::metrics;
use serde::Serialize;
use std::path::Path;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;

/// What a replay produced
#[derive(Debug, Serialize)]
pub struct WatchSummary {
    pub channel: String,
    pub notifications: usize,
    pub refreshes: usize,
    pub store_fetches: usize,
    pub markers: usize,
    pub subscriptions_released: usize,
}

pub async fn run(
    file: &Path,
    changes: usize,
    interval_ms: u64,
    config: &Config,
    format: Format,
) -> Result<i32> {
    let store = MemoryStore::with_reports(load_reports(file)?);
    let settings = MapSettings::try_from(&config.schema.map)?;

    let summary = replay(
        store,
        settings,
        &config.schema.sync,
        changes,
        Duration::from_millis(interval_ms),
    )
    .await?;

    match format {
        Format::Json => print_json(&serde_json::json!({
            "summary": summary,
            "metrics": metrics().export_json(),
        }))?,
        Format::Text => {
            Status::header(&format!("Live sync on {}", summary.channel));
            Status::info(&format!(
                "{} notifications → {} refreshes ({} store fetches)",
                summary.notifications, summary.refreshes, summary.store_fetches
            ));
            Status::success(&format!(
                "{} markers on screen; {} subscription released",
                summary.markers, summary.subscriptions_released
            ));
        }
    }

    Ok(exit_codes::SUCCESS)
}

/// Mount, send `changes` notifications `interval` apart, let the debounce
/// settle, then unmount
pub async fn replay(
    store: MemoryStore,
    settings: MapSettings,
    sync: &SyncConfig,
    changes: usize,
    interval: Duration,
) -> Result<WatchSummary> {
    let store = Arc::new(store);
    let view = Arc::new(Mutex::new(MapView::new(settings)));
    let refreshes = Arc::new(AtomicUsize::new(0));

    let sink = Arc::clone(&view);
    let counter = Arc::clone(&refreshes);
    let handle = LiveSyncCoordinator::mount(
        Arc::clone(&store),
        sync,
        move |reports: Vec<ReportEntity>| {
            counter.fetch_add(1, Ordering::SeqCst);
            sink.lock()
                .unwrap_or_else(PoisonError::into_inner)
                .apply_refresh(reports);
        },
    );

    if !handle.wait_for_state(SyncState::Subscribed).await {
        bail!("Live sync closed before subscribing");
    }

    for i in 0..changes {
        let collection = Collection::ALL[i % Collection::ALL.len()];
        store.notify(ChangeEvent::new(collection, ChangeKind::Updated));
        tokio::time::sleep(interval).await;
    }

    tokio::time::sleep(sync.debounce() + Duration::from_millis(50)).await;

    let channel = handle.channel_name().to_string();
    handle.unmount();

    let markers = view
        .lock()
        .unwrap_or_else(PoisonError::into_inner)
        .render()
        .len();

    Ok(WatchSummary {
        channel,
        notifications: changes,
        refreshes: refreshes.load(Ordering::SeqCst),
        store_fetches: store.list_calls(),
        markers,
        subscriptions_released: store.releases(),
    })
}
