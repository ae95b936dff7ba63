// Licensed under the MIT license.

//! Tracer-initiated, keyed bulk replay of application state.
//!
//! The core spawns at most one thread total: the statedump agent, created
//! lazily on the first [`StatedumpMode::AgentThread`] registration and
//! stopped when the last such registration is torn down.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::mpsc;
use std::sync::{Arc, Mutex, OnceLock};
use std::thread::JoinHandle;

use crate::error::Error;

/// How a registered statedump request is invoked.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum StatedumpMode {
    /// The application's own thread invokes the callback synchronously,
    /// via [`StatedumpRequestHandle::poll`].
    PollingThread,
    /// The core-owned agent thread invokes the callback asynchronously.
    AgentThread,
}

/// The sentinel key value reserved for ordinary (non-statedump) dispatch;
/// never assigned to a real statedump episode.
pub const LIVE_KEY: u64 = 0;

struct RequestEntry {
    #[allow(dead_code)] // retained for diagnostics/tracer introspection
    name: Box<str>,
    dump_fn: fn(u64),
    mode: StatedumpMode,
    /// Keys queued for a `PollingThread`-mode request awaiting the next
    /// `poll()` call.
    pending: Mutex<Vec<u64>>,
    /// Held for the duration of a `dump_fn` invocation so `unregister`/drop
    /// can wait out any in-flight call.
    in_flight: Mutex<()>,
}

enum AgentMessage {
    Dump(Arc<RequestEntry>, u64),
    Shutdown,
}

struct Agent {
    sender: mpsc::SyncSender<AgentMessage>,
    thread: Option<JoinHandle<()>>,
}

impl Drop for Agent {
    fn drop(&mut self) {
        let _ = self.sender.send(AgentMessage::Shutdown);
        if let Some(thread) = self.thread.take() {
            let _ = thread.join();
        }
    }
}

static AGENT: OnceLock<Mutex<Option<Agent>>> = OnceLock::new();
static REQUESTS: OnceLock<Mutex<Vec<Arc<RequestEntry>>>> = OnceLock::new();
static NEXT_KEY: AtomicU64 = AtomicU64::new(1);

fn requests() -> &'static Mutex<Vec<Arc<RequestEntry>>> {
    REQUESTS.get_or_init(|| Mutex::new(Vec::new()))
}

fn ensure_agent_running() {
    let slot = AGENT.get_or_init(|| Mutex::new(None));
    let mut guard = slot.lock().unwrap();
    if guard.is_some() {
        return;
    }
    let (sender, receiver) = mpsc::sync_channel::<AgentMessage>(64);
    let thread = std::thread::spawn(move || {
        while let Ok(message) = receiver.recv() {
            match message {
                AgentMessage::Dump(entry, key) => {
                    let _in_flight = entry.in_flight.lock().unwrap();
                    (entry.dump_fn)(key);
                }
                AgentMessage::Shutdown => break,
            }
        }
    });
    *guard = Some(Agent {
        sender,
        thread: Some(thread),
    });
}

fn agent_sender() -> mpsc::SyncSender<AgentMessage> {
    ensure_agent_running();
    AGENT
        .get()
        .unwrap()
        .lock()
        .unwrap()
        .as_ref()
        .unwrap()
        .sender
        .clone()
}

/// A registered statedump request: an application-supplied callback that
/// can replay its current state on demand.
pub struct StatedumpRequestHandle {
    entry: Arc<RequestEntry>,
}

impl StatedumpRequestHandle {
    /// Registers a new statedump request under `name`, to be invoked as
    /// `dump_fn(key)` whenever a tracer asks for a statedump.
    pub fn register(
        name: impl Into<Box<str>>,
        dump_fn: fn(u64),
        mode: StatedumpMode,
    ) -> Result<Self, Error> {
        let name = name.into();
        if name.is_empty() {
            return Err(Error::Invalid("statedump request name"));
        }
        let entry = Arc::new(RequestEntry {
            name,
            dump_fn,
            mode,
            pending: Mutex::new(Vec::new()),
            in_flight: Mutex::new(()),
        });
        if mode == StatedumpMode::AgentThread {
            ensure_agent_running();
        }
        requests().lock().unwrap().push(entry.clone());
        Ok(Self { entry })
    }

    /// For a [`StatedumpMode::PollingThread`] request, synchronously runs
    /// `dump_fn` for every key queued since the last `poll()`. A no-op for
    /// [`StatedumpMode::AgentThread`] requests.
    pub fn poll(&self) {
        if self.entry.mode != StatedumpMode::PollingThread {
            return;
        }
        let keys = std::mem::take(&mut *self.entry.pending.lock().unwrap());
        let _in_flight = self.entry.in_flight.lock().unwrap();
        for key in keys {
            (self.entry.dump_fn)(key);
        }
    }

    /// Unregisters this request, first waiting out any invocation of its
    /// callback already in flight.
    pub fn unregister(self) {
        // Consuming `self` and letting `Drop` run performs the wait + the
        // unlink; spelled out as its own method so callers have an
        // explicit, documented way to retire a handle.
    }
}

impl Drop for StatedumpRequestHandle {
    fn drop(&mut self) {
        requests()
            .lock()
            .unwrap()
            .retain(|e| !Arc::ptr_eq(e, &self.entry));
        // Waits out any invocation currently holding `in_flight`.
        let _ = self.entry.in_flight.lock().unwrap();
    }
}

/// Schedules a call to every registered `dump_fn` with a freshly allocated,
/// never-reused key.
/// `AgentThread`-mode requests are invoked asynchronously on the agent
/// thread; `PollingThread`-mode requests are queued for the application to
/// drain via [`StatedumpRequestHandle::poll`].
pub fn request_statedump() -> u64 {
    let key = NEXT_KEY.fetch_add(1, Ordering::Relaxed);
    let entries = requests().lock().unwrap().clone();
    for entry in entries {
        match entry.mode {
            StatedumpMode::AgentThread => {
                let _ = agent_sender().send(AgentMessage::Dump(entry, key));
            }
            StatedumpMode::PollingThread => {
                entry.pending.lock().unwrap().push(key);
            }
        }
    }
    key
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::AtomicUsize;
    use std::time::Duration;

    static POLLED_KEY: AtomicU64 = AtomicU64::new(0);
    static AGENT_CALLS: AtomicUsize = AtomicUsize::new(0);

    fn record_poll(key: u64) {
        POLLED_KEY.store(key, Ordering::SeqCst);
    }

    fn record_agent(_key: u64) {
        AGENT_CALLS.fetch_add(1, Ordering::SeqCst);
    }

    #[test]
    fn polling_mode_queues_until_poll_is_called() {
        let handle =
            StatedumpRequestHandle::register("polling", record_poll, StatedumpMode::PollingThread)
                .unwrap();
        let key = request_statedump();
        assert_ne!(key, LIVE_KEY);
        handle.poll();
        assert_eq!(POLLED_KEY.load(Ordering::SeqCst), key);
    }

    #[test]
    fn agent_mode_runs_asynchronously() {
        let before = AGENT_CALLS.load(Ordering::SeqCst);
        let handle =
            StatedumpRequestHandle::register("agent", record_agent, StatedumpMode::AgentThread)
                .unwrap();
        request_statedump();
        for _ in 0..50 {
            if AGENT_CALLS.load(Ordering::SeqCst) > before {
                break;
            }
            std::thread::sleep(Duration::from_millis(10));
        }
        assert!(AGENT_CALLS.load(Ordering::SeqCst) > before);
        drop(handle);
    }
}
