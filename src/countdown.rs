//! Cancellable one-tick-per-second countdown.
//!
//! `start(n)` emits `Tick { remaining: n }` immediately, then one tick per
//! second down to 1, then `Elapsed` one second after the last tick. Every
//! run is tagged with a generation; starting again cancels the previous run
//! so a stale run can never fire.

use std::sync::Arc;
use std::time::Duration;

use parking_lot::Mutex;
use serde::Serialize;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

/// Tick interval.
const TICK: Duration = Duration::from_secs(1);

/// Events produced by a countdown run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum CountdownEvent {
    /// `remaining` seconds left.
    Tick { generation: u64, remaining: u32 },
    /// The countdown reached zero.
    Elapsed { generation: u64 },
}

impl CountdownEvent {
    pub fn generation(&self) -> u64 {
        match self {
            CountdownEvent::Tick { generation, .. } | CountdownEvent::Elapsed { generation } => {
                *generation
            },
        }
    }
}

/// Generation of the run that may write, and its remaining seconds.
/// Generation 0 means idle.
#[derive(Debug, Default)]
struct Shared {
    generation: u64,
    remaining: u32,
}

/// Countdown timer. Requires a tokio runtime.
pub struct Countdown {
    next_generation: u64,
    shared: Arc<Mutex<Shared>>,
    token: Option<CancellationToken>,
    handle: Option<JoinHandle<()>>,
    events: mpsc::UnboundedSender<CountdownEvent>,
}

impl Countdown {
    /// Create a timer and the receiver its events are delivered to.
    pub fn new() -> (Self, mpsc::UnboundedReceiver<CountdownEvent>) {
        let (events, rx) = mpsc::unbounded_channel();
        let countdown = Self {
            next_generation: 1,
            shared: Arc::new(Mutex::new(Shared::default())),
            token: None,
            handle: None,
            events,
        };
        (countdown, rx)
    }

    /// Start a new run, cancelling any run in flight. Returns its generation.
    pub fn start(&mut self, duration_secs: u32) -> u64 {
        self.cancel();

        let generation = self.next_generation;
        self.next_generation += 1;
        {
            let mut shared = self.shared.lock();
            shared.generation = generation;
            shared.remaining = duration_secs;
        }

        let token = CancellationToken::new();
        let task_token = token.clone();
        let shared = Arc::clone(&self.shared);
        let events = self.events.clone();

        self.handle = Some(tokio::spawn(async move {
            run(generation, duration_secs, shared, events, task_token).await;
        }));
        self.token = Some(token);

        log::debug!(
            "[COUNTDOWN] Run {} started ({}s)",
            generation,
            duration_secs
        );
        generation
    }

    /// Stop ticking without firing.
    pub fn cancel(&mut self) {
        if let Some(token) = self.token.take() {
            token.cancel();
        }
        if let Some(handle) = self.handle.take() {
            handle.abort();
        }
        let mut shared = self.shared.lock();
        if shared.generation != 0 {
            log::debug!("[COUNTDOWN] Run {} cancelled", shared.generation);
        }
        shared.generation = 0;
        shared.remaining = 0;
    }

    /// Seconds left in the current run; 0 when idle.
    pub fn remaining(&self) -> u32 {
        self.shared.lock().remaining
    }

    pub fn is_running(&self) -> bool {
        self.shared.lock().generation != 0
    }

    /// Generation of the run in flight, if any.
    pub fn active_generation(&self) -> Option<u64> {
        let generation = self.shared.lock().generation;
        (generation != 0).then_some(generation)
    }
}

impl Drop for Countdown {
    fn drop(&mut self) {
        self.cancel();
    }
}

async fn run(
    generation: u64,
    duration_secs: u32,
    shared: Arc<Mutex<Shared>>,
    events: mpsc::UnboundedSender<CountdownEvent>,
    token: CancellationToken,
) {
    for remaining in (1..=duration_secs).rev() {
        if token.is_cancelled() {
            return;
        }
        let _ = events.send(CountdownEvent::Tick {
            generation,
            remaining,
        });

        tokio::select! {
            _ = token.cancelled() => return,
            _ = tokio::time::sleep(TICK) => {},
        }

        let mut state = shared.lock();
        if state.generation != generation {
            return;
        }
        state.remaining = remaining - 1;
    }

    {
        let mut state = shared.lock();
        if state.generation != generation || token.is_cancelled() {
            return;
        }
        state.generation = 0;
        state.remaining = 0;
    }

    log::debug!("[COUNTDOWN] Run {} elapsed", generation);
    let _ = events.send(CountdownEvent::Elapsed { generation });
}
