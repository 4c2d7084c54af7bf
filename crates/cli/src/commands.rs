// Command implementations

use anyhow::{Context, Result};
use colored::Colorize;
use std::sync::Arc;
use tabled::{Table, Tabled};
use tracing::info;

use crate::render;
use crate::settings::Settings;
use ticketwatch_core::application::TrackerRegistry;
use ticketwatch_core::domain::{QueueStatus, TicketNumber, PLACEHOLDER};
use ticketwatch_core::port::QueueStatusProvider;
use ticketwatch_infra_http::HttpQueueStatusProvider;

#[derive(Tabled)]
struct StatusRow {
    #[tabled(rename = "Now serving")]
    current: String,
    #[tabled(rename = "Waiting")]
    waiting: String,
}

impl From<&QueueStatus> for StatusRow {
    fn from(status: &QueueStatus) -> Self {
        let show = |value: Option<i64>| {
            value
                .map(|n| n.to_string())
                .unwrap_or_else(|| PLACEHOLDER.to_string())
        };
        Self {
            current: show(status.current_number()),
            waiting: show(status.waiting_count()),
        }
    }
}

/// One-shot fetch of the queue status
pub async fn status(settings: &Settings, json: bool) -> Result<()> {
    let provider = HttpQueueStatusProvider::new(settings.feed.clone())
        .context("Failed to create HTTP client")?;
    let status = provider
        .fetch()
        .await
        .context("Failed to fetch wait info")?;

    if json {
        println!("{}", serde_json::to_string_pretty(&status)?);
        return Ok(());
    }

    println!("{}", "Queue Status".cyan().bold());
    println!();
    println!("{}", Table::new(vec![StatusRow::from(&status)]));
    Ok(())
}

/// Watch `target` until it is reached or Ctrl+C is pressed
pub async fn watch(settings: &Settings, target: TicketNumber, user: String) -> Result<()> {
    let provider = Arc::new(
        HttpQueueStatusProvider::new(settings.feed.clone())
            .context("Failed to create HTTP client")?,
    );
    let config = settings
        .tracker
        .to_config()
        .context("Invalid tracker settings")?;
    let registry = Arc::new(TrackerRegistry::new(provider, config));

    let cleanup = Arc::downgrade(&registry);
    let callbacks = render::terminal_callbacks(target).on_stop(move |tracker| {
        render::emit(render::stopped_message(tracker.target_number(), tracker.state()).bold());
        if let Some(registry) = cleanup.upgrade() {
            registry.release(tracker);
        }
    });

    let tracker = registry
        .create(user.clone(), target, callbacks)
        .context("Failed to create tracker")?;
    let mut handle = tracker.start().context("Failed to start tracker")?;

    tokio::select! {
        joined = &mut handle => joined.context("Tracker task failed")?,
        signal = tokio::signal::ctrl_c() => {
            signal.context("Failed to listen for Ctrl+C")?;
            info!(user_key = %user, "Stop requested");
            registry.stop(&user);
            handle.await.context("Tracker task failed")?;
        }
    }

    info!(
        user_key = %user,
        state = %tracker.state(),
        active = registry.len(),
        "Watch finished"
    );
    Ok(())
}
