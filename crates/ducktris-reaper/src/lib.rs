//! Periodic room eviction for Ducktris.
//!
//! The [`Reaper`] wakes on a fixed period and deletes rooms that nobody is
//! going to finish:
//!
//! - a room still **waiting** for players longer than
//!   [`ReaperConfig::waiting_timeout`] after creation;
//! - a **running** room whose most recent penalty poll is older than
//!   [`ReaperConfig::inactivity_timeout`].
//!
//! A running room that has never been polled is left alone. Each decision
//! is made inside the room's own actor (see
//! [`RoomRegistry::retire_if`]), so a poll can't slip in between the
//! check and the delete.

use std::fmt;
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use ducktris_protocol::RoomId;
use ducktris_room::{RoomActivity, RoomError, RoomRegistry, RoomState};
use tokio::task::JoinHandle;
use tokio::time::{self, Instant, MissedTickBehavior};
use tracing::{debug, error, info, warn};

// ---------------------------------------------------------------------------
// Configuration
// ---------------------------------------------------------------------------

/// Eviction policy and sweep period.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ReaperConfig {
    /// Time between sweeps. Default: 5 s.
    pub period: Duration,
    /// How long a room may wait for its last player. Default: 120 s.
    pub waiting_timeout: Duration,
    /// How long a running room may go without a penalty poll. Default: 10 s.
    pub inactivity_timeout: Duration,
}

impl Default for ReaperConfig {
    fn default() -> Self {
        Self {
            period: Duration::from_secs(5),
            waiting_timeout: Duration::from_secs(120),
            inactivity_timeout: Duration::from_secs(10),
        }
    }
}

impl ReaperConfig {
    /// Shortest sweep period accepted.
    pub const MIN_PERIOD: Duration = Duration::from_millis(10);

    /// Raises a too-short period to [`Self::MIN_PERIOD`].
    ///
    /// Called automatically by [`Reaper::new`].
    pub fn validated(mut self) -> Self {
        if self.period < Self::MIN_PERIOD {
            warn!(
                period_ms = self.period.as_millis() as u64,
                min_ms = Self::MIN_PERIOD.as_millis() as u64,
                "reaper period below minimum, raising"
            );
            self.period = Self::MIN_PERIOD;
        }
        self
    }

    /// Decides whether a room should go, judged at `now`.
    pub fn verdict(&self, activity: &RoomActivity, now: Instant) -> Option<ReapReason> {
        match activity.state {
            RoomState::Waiting => {
                let age = now.saturating_duration_since(activity.created_at);
                (age > self.waiting_timeout).then_some(ReapReason::WaitingTimeout)
            }
            RoomState::Running => {
                let idle = now.saturating_duration_since(activity.last_request?);
                (idle > self.inactivity_timeout).then_some(ReapReason::Inactive)
            }
        }
    }
}

// ---------------------------------------------------------------------------
// Reasons
// ---------------------------------------------------------------------------

/// Why a room was evicted.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReapReason {
    /// Never filled up in time.
    WaitingTimeout,
    /// Running, but nobody has polled recently.
    Inactive,
}

impl ReapReason {
    /// The only reason a room in this state can be evicted for.
    fn for_state(state: RoomState) -> Self {
        match state {
            RoomState::Waiting => Self::WaitingTimeout,
            RoomState::Running => Self::Inactive,
        }
    }
}

impl fmt::Display for ReapReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::WaitingTimeout => write!(f, "waiting timeout"),
            Self::Inactive => write!(f, "inactive"),
        }
    }
}

// ---------------------------------------------------------------------------
// Reaper
// ---------------------------------------------------------------------------

/// Sweeps a shared [`RoomRegistry`] on a fixed period.
#[derive(Clone)]
pub struct Reaper {
    registry: Arc<RoomRegistry>,
    config: ReaperConfig,
}

impl Reaper {
    pub fn new(registry: Arc<RoomRegistry>, config: ReaperConfig) -> Self {
        Self {
            registry,
            config: config.validated(),
        }
    }

    pub fn config(&self) -> &ReaperConfig {
        &self.config
    }

    /// Runs one pass over every live room and returns what was evicted.
    ///
    /// Rooms created during the pass are picked up by the next one. Rooms
    /// deleted by someone else mid-pass are skipped.
    pub async fn sweep(&self) -> Vec<(RoomId, ReapReason)> {
        let room_ids = self.registry.room_ids().await;
        let mut evicted = Vec::new();

        for room_id in &room_ids {
            let config = self.config;
            let check = move |activity: &RoomActivity| {
                config.verdict(activity, Instant::now()).is_some()
            };

            match self.registry.retire_if(*room_id, check).await {
                Ok(Some(activity)) => {
                    let reason = ReapReason::for_state(activity.state);
                    info!(
                        %room_id,
                        %reason,
                        players = activity.player_count,
                        "room reaped"
                    );
                    evicted.push((*room_id, reason));
                }
                Ok(None) => {}
                Err(RoomError::NotFound(_)) => {
                    debug!(%room_id, "room vanished before sweep reached it");
                }
                Err(e) => warn!(%room_id, error = %e, "unexpected error during sweep"),
            }
        }

        debug!(
            checked = room_ids.len(),
            reaped = evicted.len(),
            "reaper sweep complete"
        );
        evicted
    }

    /// Sweeps forever, once per period. The first sweep runs one period
    /// after the call.
    pub async fn run(self) {
        let period = self.config.period;
        let mut interval = time::interval_at(Instant::now() + period, period);
        interval.set_missed_tick_behavior(MissedTickBehavior::Skip);

        info!(
            period_ms = self.config.period.as_millis() as u64,
            waiting_timeout_s = self.config.waiting_timeout.as_secs(),
            inactivity_timeout_s = self.config.inactivity_timeout.as_secs(),
            "reaper started"
        );

        loop {
            interval.tick().await;
            self.sweep().await;
        }
    }

    /// Spawns [`run`](Self::run) on the current runtime.
    pub fn spawn(self) -> JoinHandle<()> {
        tokio::spawn(self.run())
    }

    /// Like [`spawn`](Self::spawn), but a sweep task that dies is logged
    /// and started again.
    ///
    /// Aborting the returned handle stops the restarts. The sweep task
    /// running at that moment keeps going until the runtime shuts down.
    pub fn spawn_supervised(self) -> JoinHandle<()> {
        tokio::spawn(supervise(move || self.clone().run()))
    }
}

/// Runs tasks built by `make` one after another, starting a new one each
/// time the previous one panics.
async fn supervise<F, Fut>(mut make: F)
where
    F: FnMut() -> Fut,
    Fut: Future<Output = ()> + Send + 'static,
{
    loop {
        match tokio::spawn(make()).await {
            Ok(()) => {
                warn!("reaper task exited");
                return;
            }
            Err(e) if e.is_cancelled() => return,
            Err(e) => error!(error = %e, "reaper task failed, restarting"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn activity(state: RoomState, created_at: Instant, last: Option<Instant>) -> RoomActivity {
        RoomActivity {
            room_id: RoomId(0),
            state,
            created_at,
            player_count: 1,
            last_request: last,
        }
    }

    #[test]
    fn test_default_config() {
        let cfg = ReaperConfig::default();
        assert_eq!(cfg.period, Duration::from_secs(5));
        assert_eq!(cfg.waiting_timeout, Duration::from_secs(120));
        assert_eq!(cfg.inactivity_timeout, Duration::from_secs(10));
    }

    #[test]
    fn test_validated_raises_zero_period() {
        let cfg = ReaperConfig {
            period: Duration::ZERO,
            ..ReaperConfig::default()
        }
        .validated();
        assert_eq!(cfg.period, ReaperConfig::MIN_PERIOD);
    }

    #[test]
    fn test_waiting_verdict_is_strict() {
        let cfg = ReaperConfig::default();
        let t0 = Instant::now();
        let a = activity(RoomState::Waiting, t0, None);

        assert_eq!(cfg.verdict(&a, t0 + Duration::from_secs(120)), None);
        assert_eq!(
            cfg.verdict(&a, t0 + Duration::from_millis(120_001)),
            Some(ReapReason::WaitingTimeout)
        );
    }

    #[test]
    fn test_waiting_room_ignores_polls() {
        let cfg = ReaperConfig::default();
        let t0 = Instant::now();
        let now = t0 + Duration::from_secs(200);
        let a = activity(RoomState::Waiting, t0, Some(now));
        assert_eq!(cfg.verdict(&a, now), Some(ReapReason::WaitingTimeout));
    }

    #[test]
    fn test_running_verdict() {
        let cfg = ReaperConfig::default();
        let t0 = Instant::now();
        let polled = t0 + Duration::from_secs(500);

        let never = activity(RoomState::Running, t0, None);
        assert_eq!(cfg.verdict(&never, t0 + Duration::from_secs(10_000)), None);

        let active = activity(RoomState::Running, t0, Some(polled));
        assert_eq!(cfg.verdict(&active, polled + Duration::from_secs(10)), None);
        assert_eq!(
            cfg.verdict(&active, polled + Duration::from_secs(11)),
            Some(ReapReason::Inactive)
        );
    }

    #[tokio::test]
    async fn test_supervise_restarts_after_panic() {
        use std::sync::Arc;
        use std::sync::atomic::{AtomicUsize, Ordering};

        let runs = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&runs);
        supervise(move || {
            let run = counter.fetch_add(1, Ordering::SeqCst);
            async move {
                if run < 2 {
                    panic!("sweep failed");
                }
            }
        })
        .await;

        assert_eq!(runs.load(Ordering::SeqCst), 3);
    }

    #[test]
    fn test_reason_display() {
        assert_eq!(ReapReason::WaitingTimeout.to_string(), "waiting timeout");
        assert_eq!(ReapReason::Inactive.to_string(), "inactive");
    }
}
