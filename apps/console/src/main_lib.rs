use std::sync::Arc;

use anyhow::Context;
use hrdesk_api::HrApiClient;
use hrdesk_core::events::Feed;
use hrdesk_core::leave::{AttendanceLogView, LeaveRequestView, LeaveStatus};
use hrdesk_core::session::{AuthState, FileCredentialStore, Session};
use hrdesk_core::store::{FeedRouter, MergeStore, PullParams, RecordSource};
use hrdesk_realtime::RealtimeTransport;
use tokio::sync::broadcast::error::RecvError;
use tracing_subscriber::prelude::*;
use tracing_subscriber::{fmt, EnvFilter};

use crate::config::Config;

pub struct AppState {
    pub session: Arc<Session>,
    pub leave_store: Arc<MergeStore>,
    pub attendance_store: Arc<MergeStore>,
    pub transport: Arc<RealtimeTransport>,
}

impl AppState {
    pub fn stores(&self) -> [&Arc<MergeStore>; 2] {
        [&self.leave_store, &self.attendance_store]
    }
}

pub fn init_tracing() {
    let log_format = std::env::var("HRDESK_LOG_FORMAT").unwrap_or_else(|_| "text".to_string());
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let registry = tracing_subscriber::registry().with(filter);

    if log_format.eq_ignore_ascii_case("json") {
        registry
            .with(fmt::layer().json().with_current_span(false))
            .init();
    } else {
        registry
            .with(fmt::layer().with_target(true).with_line_number(true))
            .init();
    }
}

pub fn build_state(config: &Config) -> anyhow::Result<Arc<AppState>> {
    let credential_store = Arc::new(FileCredentialStore::new(config.credentials_path.clone()));
    tracing::info!(
        "Credential file in use: {}",
        credential_store.path().display()
    );
    let session = Arc::new(Session::restore(credential_store).context("restoring session")?);
    if let Some(token) = &config.token {
        session.sign_in(token.as_str())?;
    }

    let client: Arc<dyn RecordSource> = Arc::new(
        HrApiClient::new(config.api_client_config(), session.clone())
            .context("building API client")?,
    );
    let leave_store = Arc::new(MergeStore::new(Feed::Leave, client.clone()));
    let attendance_store = Arc::new(MergeStore::new(Feed::Attendance, client));

    let router = FeedRouter::new()
        .with_store(leave_store.clone())
        .with_store(attendance_store.clone());
    let transport = Arc::new(RealtimeTransport::new(
        config.transport_config(),
        Arc::new(router),
    ));

    Ok(Arc::new(AppState {
        session,
        leave_store,
        attendance_store,
        transport,
    }))
}

/// Pulls every feed once. Failures are logged; the stores keep their data.
pub async fn refresh_all(state: &AppState) {
    for store in state.stores() {
        match store.pull(&PullParams::new()).await {
            Ok(snapshot) => summarize(store, snapshot.len()),
            Err(e) => tracing::warn!("Pull of {} feed failed: {}", store.feed(), e.user_message()),
        }
    }
}

fn summarize(store: &MergeStore, total: usize) {
    let snapshot = store.snapshot();
    match store.feed() {
        Feed::Leave => {
            let pending = snapshot
                .iter()
                .filter_map(|record| LeaveRequestView::from_record(store.schema(), record).ok())
                .filter(|view| view.status == LeaveStatus::Pending)
                .count();
            tracing::info!("Leave requests: {} total, {} pending", total, pending);
        }
        Feed::Attendance => {
            let entries: usize = snapshot
                .iter()
                .filter_map(|record| AttendanceLogView::from_record(store.schema(), record).ok())
                .map(|view| view.entry_keys.len())
                .sum();
            tracing::info!("Attendance logs: {} total, {} entries", total, entries);
        }
    }
}

/// Logs every store change until the store is dropped.
fn spawn_change_logger(store: Arc<MergeStore>) {
    let mut changes = store.subscribe();
    tokio::spawn(async move {
        loop {
            match changes.recv().await {
                Ok(change) => tracing::info!(
                    feed = %change.feed,
                    source = ?change.source,
                    total = change.total,
                    "Collection updated: {} record(s) touched",
                    change.keys.len()
                ),
                Err(RecvError::Lagged(skipped)) => {
                    tracing::debug!("Change logger lagged by {} notifications", skipped)
                }
                Err(RecvError::Closed) => break,
            }
        }
    });
}

/// Pulls every feed, then opens the real-time connection with whatever
/// token the session holds afterwards. A pull rejected with 401 signs the
/// session out, in which case nothing is connected.
pub async fn start(state: &AppState) -> anyhow::Result<()> {
    refresh_all(state).await;

    if !state.session.is_signed_in() {
        anyhow::bail!("session signed out during the initial pull; sign in again");
    }
    let token = state.session.require_token()?;
    state.transport.connect(&token)?;
    Ok(())
}

/// Runs until Ctrl-C or until the session is signed out.
pub async fn run(state: Arc<AppState>, config: &Config) -> anyhow::Result<()> {
    state
        .session
        .require_token()
        .context("no credential: set HRDESK_TOKEN or sign in first")?;

    for store in state.stores() {
        spawn_change_logger(store.clone());
    }

    start(&state).await?;

    if let Some(interval) = config.refresh_interval {
        crate::scheduler::start_refresh_scheduler(state.clone(), interval);
    }

    let mut auth = state.session.subscribe();
    tokio::select! {
        result = tokio::signal::ctrl_c() => {
            result.context("listening for Ctrl-C")?;
            tracing::info!("Shutting down");
        }
        signed_out = auth.wait_for(|s| *s == AuthState::SignedOut) => {
            if signed_out.is_ok() {
                tracing::warn!("Session signed out; sign in again to resume");
            }
        }
    }

    state.transport.disconnect().await;
    Ok(())
}
