//! Polling Controller
//!
//! Keeps a mounted screen approximately fresh by re-running its aggregate
//! fetch on a fixed period.
//!
//! ## Lifecycle
//!
//! - [`PollHandle::mount`]: Idle → Active. One fetch is issued immediately,
//!   then one per period.
//! - [`PollHandle::unmount`]: Active → Idle. The timer is cancelled. Fetches
//!   already in flight run to completion but their results are discarded.
//!
//! Ticks may overlap. Each fetch carries a sequence number assigned at
//! issue time and the view model drops anything older than what it already
//! shows. The first `Unauthorized` result is reported once and ends polling.

use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{mpsc, RwLock};
use tokio::task::JoinHandle;
use tokio::time::{Instant, MissedTickBehavior};

use crate::client::ClientError;
use crate::fetch::{AggregateSource, Endpoint};
use crate::view::{ApplyOutcome, ViewModel};

/// Shortest period accepted; anything lower is raised to this
const MIN_INTERVAL: Duration = Duration::from_millis(100);

/// View model shared between a screen and its poller
pub type SharedView = Arc<RwLock<ViewModel>>;

/// Configuration for polling
#[derive(Debug, Clone)]
pub struct PollConfig {
    /// Time between refreshes
    pub interval: Duration,
}

impl Default for PollConfig {
    fn default() -> Self {
        Self {
            interval: Duration::from_secs(10),
        }
    }
}

/// What happened to an issued fetch
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PollEvent {
    /// Result written to the view model
    Applied { seq: u64 },
    /// Result dropped: stale, or the screen was unmounted
    Discarded { seq: u64 },
    /// Session rejected; the screen must go to login. Sent at most once.
    Unauthorized,
}

struct PollState {
    source: Arc<dyn AggregateSource>,
    endpoints: Vec<Endpoint>,
    view: SharedView,
    mounted: AtomicBool,
    unauthorized: AtomicBool,
    issued: AtomicU64,
    events: mpsc::UnboundedSender<PollEvent>,
}

impl PollState {
    fn is_live(&self) -> bool {
        self.mounted.load(Ordering::SeqCst) && !self.unauthorized.load(Ordering::SeqCst)
    }

    fn emit(&self, event: PollEvent) {
        let _ = self.events.send(event);
    }

    /// Tag a new fetch with the next sequence number and start it
    fn issue(self: &Arc<Self>) -> u64 {
        let seq = self.issued.fetch_add(1, Ordering::SeqCst) + 1;
        let state = Arc::clone(self);
        tokio::spawn(async move { state.refresh(seq).await });
        seq
    }

    async fn refresh(&self, seq: u64) {
        {
            let mut view = self.view.write().await;
            if !self.is_live() {
                self.emit(PollEvent::Discarded { seq });
                return;
            }
            view.begin_loading();
        }

        let result = self.source.fetch_all(&self.endpoints).await;

        // The mounted flag is only cleared under this lock, so nothing is
        // written once unmount has returned.
        let mut view = self.view.write().await;

        if !self.mounted.load(Ordering::SeqCst) {
            tracing::debug!(seq, "Discarding result that resolved after unmount");
            self.emit(PollEvent::Discarded { seq });
            return;
        }

        let outcome = match result {
            Err(ClientError::Unauthorized) => {
                view.end_loading();
                if !self.unauthorized.swap(true, Ordering::SeqCst) {
                    tracing::warn!(seq, "Session rejected, stopping poll");
                    self.emit(PollEvent::Unauthorized);
                }
                return;
            }
            _ if self.unauthorized.load(Ordering::SeqCst) => ApplyOutcome::Stale,
            Ok(aggregate) => view.apply(seq, &self.endpoints, aggregate),
            Err(e) => {
                tracing::warn!(seq, error = %e, "Poll refresh failed");
                view.fail(seq, &e)
            }
        };

        match outcome {
            ApplyOutcome::Applied => self.emit(PollEvent::Applied { seq }),
            ApplyOutcome::Stale => self.emit(PollEvent::Discarded { seq }),
        }
    }
}

/// Handle to an Active poll.
///
/// Dropping the handle stops scheduling and discards results that have not
/// reached the view yet. Only [`PollHandle::unmount`] waits for a refresh
/// that is writing at that moment, so use it when the view must not change
/// afterwards.
pub struct PollHandle {
    state: Arc<PollState>,
    timer: JoinHandle<()>,
}

impl PollHandle {
    /// Mount a screen: fetch now, then every `config.interval`
    pub fn mount(
        source: Arc<dyn AggregateSource>,
        endpoints: Vec<Endpoint>,
        view: SharedView,
        config: &PollConfig,
    ) -> (Self, mpsc::UnboundedReceiver<PollEvent>) {
        let (events, receiver) = mpsc::unbounded_channel();
        let interval = config.interval.max(MIN_INTERVAL);

        let state = Arc::new(PollState {
            source,
            endpoints,
            view,
            mounted: AtomicBool::new(true),
            unauthorized: AtomicBool::new(false),
            issued: AtomicU64::new(0),
            events,
        });

        tracing::info!(
            interval_ms = interval.as_millis() as u64,
            slices = state.endpoints.len(),
            "Mounting poll"
        );

        state.issue();
        let timer = spawn_timer(Arc::clone(&state), interval);

        (Self { state, timer }, receiver)
    }

    /// Whether the poll is still scheduling fetches
    pub fn is_active(&self) -> bool {
        self.state.is_live() && !self.timer.is_finished()
    }

    /// Number of fetches issued so far
    pub fn issued(&self) -> u64 {
        self.state.issued.load(Ordering::SeqCst)
    }

    pub fn view(&self) -> &SharedView {
        &self.state.view
    }

    /// Unmount the screen. When this returns the view model will not be
    /// touched again by this poll.
    pub async fn unmount(self) {
        {
            let _view = self.state.view.write().await;
            self.state.mounted.store(false, Ordering::SeqCst);
        }
        self.timer.abort();
        tracing::info!(issued = self.issued(), "Poll unmounted");
    }
}

impl Drop for PollHandle {
    fn drop(&mut self) {
        // A refresh holding the lock right now may still finish its write.
        let _view = self.state.view.try_write();
        self.state.mounted.store(false, Ordering::SeqCst);
        self.timer.abort();
    }
}

fn spawn_timer(state: Arc<PollState>, interval: Duration) -> JoinHandle<()> {
    tokio::spawn(async move {
        // The immediate fetch is issued by mount.
        let mut ticker = tokio::time::interval_at(Instant::now() + interval, interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

        loop {
            ticker.tick().await;

            if !state.is_live() {
                tracing::debug!("Poll loop stopping");
                break;
            }

            let seq = state.issue();
            tracing::debug!(seq, "Scheduled refresh issued");
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::client::ClientResult;
    use crate::fetch::Aggregate;
    use async_trait::async_trait;
    use serde_json::json;
    use tokio::sync::Notify;

    fn endpoints() -> Vec<Endpoint> {
        vec![Endpoint::object("summary", "/expenses/summary")]
    }

    fn shared_view() -> SharedView {
        Arc::new(RwLock::new(ViewModel::with_defaults(&endpoints())))
    }

    fn summary(income: u64) -> Aggregate {
        let mut agg = Aggregate::default();
        agg.slices
            .insert("summary".into(), json!({ "income": income, "totalExpense": 0 }));
        agg
    }

    /// Answers call N with income N after an optional per-call delay
    struct ScriptedSource {
        calls: AtomicU64,
        delays: Vec<Duration>,
        unauthorized: bool,
    }

    impl ScriptedSource {
        fn new() -> Self {
            Self {
                calls: AtomicU64::new(0),
                delays: Vec::new(),
                unauthorized: false,
            }
        }

        fn calls(&self) -> u64 {
            self.calls.load(Ordering::SeqCst)
        }
    }

    #[async_trait]
    impl AggregateSource for ScriptedSource {
        async fn fetch_all(&self, _endpoints: &[Endpoint]) -> ClientResult<Aggregate> {
            let n = self.calls.fetch_add(1, Ordering::SeqCst) + 1;
            if let Some(delay) = self.delays.get((n - 1) as usize) {
                tokio::time::sleep(*delay).await;
            }
            if self.unauthorized {
                return Err(ClientError::Unauthorized);
            }
            Ok(summary(n))
        }
    }

    /// Blocks every call until released
    struct GatedSource {
        started: Notify,
        release: Notify,
    }

    #[async_trait]
    impl AggregateSource for GatedSource {
        async fn fetch_all(&self, _endpoints: &[Endpoint]) -> ClientResult<Aggregate> {
            self.started.notify_one();
            self.release.notified().await;
            Ok(summary(99))
        }
    }

    fn drain(rx: &mut mpsc::UnboundedReceiver<PollEvent>) -> Vec<PollEvent> {
        let mut events = Vec::new();
        while let Ok(event) = rx.try_recv() {
            events.push(event);
        }
        events
    }

    #[tokio::test(start_paused = true)]
    async fn test_n_ticks_issue_n_plus_one_fetches() {
        let source = Arc::new(ScriptedSource::new());
        let view = shared_view();
        let (handle, mut rx) = PollHandle::mount(
            source.clone(),
            endpoints(),
            Arc::clone(&view),
            &PollConfig::default(),
        );

        // Three ticks at 10s, 20s and 30s.
        tokio::time::sleep(Duration::from_secs(35)).await;

        assert_eq!(source.calls(), 4);
        assert_eq!(handle.issued(), 4);
        assert!(handle.is_active());

        let applied = drain(&mut rx)
            .into_iter()
            .filter(|e| matches!(e, PollEvent::Applied { .. }))
            .count();
        assert_eq!(applied, 4);
        assert_eq!(view.read().await.last_applied_seq(), 4);
        assert_eq!(view.read().await.slice("summary").unwrap()["income"], 4);

        handle.unmount().await;
        tokio::time::sleep(Duration::from_secs(100)).await;
        assert_eq!(source.calls(), 4);
    }

    #[tokio::test]
    async fn test_result_after_unmount_is_discarded() {
        let source = Arc::new(GatedSource {
            started: Notify::new(),
            release: Notify::new(),
        });
        let view = shared_view();
        let before = view.read().await.clone();

        let (handle, mut rx) = PollHandle::mount(
            source.clone(),
            endpoints(),
            Arc::clone(&view),
            &PollConfig::default(),
        );

        source.started.notified().await;
        handle.unmount().await;
        source.release.notify_one();

        assert_eq!(rx.recv().await, Some(PollEvent::Discarded { seq: 1 }));
        assert_eq!(rx.recv().await, None);

        let after = view.read().await;
        assert_eq!(after.last_applied_seq(), 0);
        assert_eq!(after.slices(), before.slices());
    }

    #[tokio::test]
    async fn test_dropping_handle_discards_pending_result() {
        let source = Arc::new(GatedSource {
            started: Notify::new(),
            release: Notify::new(),
        });
        let view = shared_view();

        let (handle, mut rx) = PollHandle::mount(
            source.clone(),
            endpoints(),
            Arc::clone(&view),
            &PollConfig::default(),
        );

        source.started.notified().await;
        drop(handle);
        source.release.notify_one();

        assert_eq!(rx.recv().await, Some(PollEvent::Discarded { seq: 1 }));
        assert_eq!(view.read().await.last_applied_seq(), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_unauthorized_is_signalled_once_and_stops_polling() {
        let source = Arc::new(ScriptedSource {
            unauthorized: true,
            ..ScriptedSource::new()
        });
        let view = shared_view();
        let (handle, mut rx) = PollHandle::mount(
            source.clone(),
            endpoints(),
            Arc::clone(&view),
            &PollConfig::default(),
        );

        tokio::time::sleep(Duration::from_secs(60)).await;

        assert_eq!(drain(&mut rx), vec![PollEvent::Unauthorized]);
        assert_eq!(source.calls(), 1);
        assert!(!handle.is_active());
        assert!(!view.read().await.is_loading());
    }

    #[tokio::test(start_paused = true)]
    async fn test_overlapping_fetches_apply_by_issuance() {
        // Fetch 1 is slow and resolves after fetch 2.
        let source = Arc::new(ScriptedSource {
            delays: vec![Duration::from_secs(15), Duration::from_secs(1)],
            ..ScriptedSource::new()
        });
        let view = shared_view();
        let (handle, mut rx) = PollHandle::mount(
            source.clone(),
            endpoints(),
            Arc::clone(&view),
            &PollConfig::default(),
        );

        tokio::time::sleep(Duration::from_secs(16)).await;

        let events = drain(&mut rx);
        assert_eq!(
            events,
            vec![
                PollEvent::Applied { seq: 2 },
                PollEvent::Discarded { seq: 1 }
            ]
        );
        assert_eq!(view.read().await.last_applied_seq(), 2);
        assert_eq!(view.read().await.slice("summary").unwrap()["income"], 2);

        handle.unmount().await;
    }

    #[test]
    fn test_default_config() {
        assert_eq!(PollConfig::default().interval, Duration::from_secs(10));
    }
}
