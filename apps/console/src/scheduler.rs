//! Background scheduler for periodic feed refreshes.

use std::sync::Arc;
use tokio::time::{interval, Duration, MissedTickBehavior};
use tracing::{debug, info};

use crate::main_lib::{refresh_all, AppState};

/// Starts re-pulling every feed each `period`. The first pull happens at
/// startup, so the first tick is skipped.
pub fn start_refresh_scheduler(state: Arc<AppState>, period: Duration) {
    tokio::spawn(async move {
        info!("Refresh scheduler started ({:?} interval)", period);

        let mut refresh_interval = interval(period);
        refresh_interval.set_missed_tick_behavior(MissedTickBehavior::Delay);
        refresh_interval.tick().await;

        loop {
            refresh_interval.tick().await;
            if !state.session.is_signed_in() {
                debug!("Scheduled refresh skipped: session signed out");
                continue;
            }
            refresh_all(&state).await;
        }
    });
}
