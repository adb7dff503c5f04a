use std::collections::BTreeSet;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use tokio::sync::mpsc::{unbounded_channel, UnboundedReceiver, UnboundedSender};
use tokio::task::JoinHandle;
use tracing::{debug, warn};

use crate::usecase::ports::backend::CandidateBackend;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DuplicateCheckEvent {
    Started { seq: u64 },
    Finished { seq: u64, outcome: RemoteCheckOutcome },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RemoteCheckOutcome {
    Duplicates(BTreeSet<String>),
    /// Logged only; the panel keeps whatever it knew before.
    Failed(String),
}

/// Coalesces remote duplicate lookups: a new request aborts the pending timer and
/// any request still in flight, and only the newest sequence number reports back.
pub struct DuplicateChecker {
    backend: Arc<dyn CandidateBackend>,
    debounce: Duration,
    latest: Arc<AtomicU64>,
    pending: Mutex<Option<JoinHandle<()>>>,
    events: UnboundedSender<DuplicateCheckEvent>,
}

impl DuplicateChecker {
    pub fn new(
        backend: Arc<dyn CandidateBackend>,
        debounce: Duration,
    ) -> (Self, UnboundedReceiver<DuplicateCheckEvent>) {
        let (events, receiver) = unbounded_channel();
        let checker = Self {
            backend,
            debounce,
            latest: Arc::new(AtomicU64::new(0)),
            pending: Mutex::new(None),
            events,
        };
        (checker, receiver)
    }

    pub fn latest_seq(&self) -> u64 {
        self.latest.load(Ordering::SeqCst)
    }

    /// Debounced check, used for cell edits.
    pub fn schedule(&self, emails: Vec<String>) -> u64 {
        self.start(emails, self.debounce)
    }

    /// Immediate check, used for manual checks and row-count changes.
    pub fn check_now(&self, emails: Vec<String>) -> u64 {
        self.start(emails, Duration::ZERO)
    }

    /// Drops the pending timer and any in-flight request without reporting.
    pub fn cancel(&self) {
        self.latest.fetch_add(1, Ordering::SeqCst);
        self.abort_pending();
    }

    fn abort_pending(&self) {
        let mut pending = match self.pending.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        };
        if let Some(handle) = pending.take() {
            handle.abort();
        }
    }

    fn start(&self, emails: Vec<String>, delay: Duration) -> u64 {
        let seq = self.latest.fetch_add(1, Ordering::SeqCst) + 1;
        self.abort_pending();

        let backend = self.backend.clone();
        let latest = self.latest.clone();
        let events = self.events.clone();

        let handle = tokio::spawn(async move {
            if !delay.is_zero() {
                tokio::time::sleep(delay).await;
            }
            if latest.load(Ordering::SeqCst) != seq {
                return;
            }

            let _ = events.send(DuplicateCheckEvent::Started { seq });
            let outcome = if emails.is_empty() {
                RemoteCheckOutcome::Duplicates(BTreeSet::new())
            } else {
                debug!(seq, count = emails.len(), "checking emails against backend");
                match backend.check_duplicates(&emails).await {
                    Ok(found) => RemoteCheckOutcome::Duplicates(found),
                    Err(err) => {
                        warn!(seq, "duplicate check failed: {err}");
                        RemoteCheckOutcome::Failed(err.to_string())
                    }
                }
            };

            if latest.load(Ordering::SeqCst) == seq {
                let _ = events.send(DuplicateCheckEvent::Finished { seq, outcome });
            } else {
                debug!(seq, "discarding superseded duplicate check");
            }
        });

        let mut pending = match self.pending.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        };
        *pending = Some(handle);
        seq
    }
}

impl Drop for DuplicateChecker {
    fn drop(&mut self) {
        self.cancel();
    }
}
