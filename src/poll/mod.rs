//! Background polling with a "latest wins" guard.
//!
//! Fetches run on worker threads so the UI keeps drawing. Every fetch carries
//! a [`Ticket`]; a result is applied only if its ticket belongs to the current
//! epoch and is newer than anything applied so far. Changing the query
//! (e.g. a new date range) starts a new epoch, which orphans fetches still in
//! flight for the old one.
//!
//! The pipeline itself never sees tickets.

use std::sync::Arc;
use std::sync::mpsc::{self, Receiver, RecvTimeoutError, Sender};
use std::thread;
use std::time::{Duration, Instant};

use tracing::{debug, warn};

use crate::data::MeasurementSource;
use crate::domain::{MeasurementQuery, RawRow};
use crate::error::AppError;

/// Identifies one fetch.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Ticket {
    epoch: u64,
    seq: u64,
}

/// Decides which completed fetches may be applied.
#[derive(Debug, Default)]
pub struct LatestWins {
    epoch: u64,
    next_seq: u64,
    applied_seq: Option<u64>,
}

impl LatestWins {
    pub fn new() -> Self {
        Self::default()
    }

    /// Issue a ticket for a fetch in the current epoch.
    pub fn begin(&mut self) -> Ticket {
        let ticket = Ticket {
            epoch: self.epoch,
            seq: self.next_seq,
        };
        self.next_seq += 1;
        ticket
    }

    /// Orphan every ticket issued so far.
    pub fn invalidate(&mut self) {
        self.epoch += 1;
    }

    /// Returns true (and records the ticket) if its result should be applied.
    pub fn accept(&mut self, ticket: Ticket) -> bool {
        if ticket.epoch != self.epoch {
            return false;
        }
        if self.applied_seq.is_some_and(|applied| ticket.seq <= applied) {
            return false;
        }
        self.applied_seq = Some(ticket.seq);
        true
    }
}

/// An applied fetch outcome.
#[derive(Debug)]
pub enum PollEvent {
    Rows(Vec<RawRow>),
    Failed(AppError),
}

struct Completed {
    ticket: Ticket,
    result: Result<Vec<RawRow>, AppError>,
}

/// Periodic fetcher over a [`MeasurementSource`].
pub struct Poller {
    source: Arc<dyn MeasurementSource>,
    interval: Duration,
    guard: LatestWins,
    tx: Sender<Completed>,
    rx: Receiver<Completed>,
    in_flight: usize,
    last_started: Option<Instant>,
}

impl Poller {
    pub fn new(source: Arc<dyn MeasurementSource>, interval: Duration) -> Self {
        let (tx, rx) = mpsc::channel();
        Self {
            source,
            interval,
            guard: LatestWins::new(),
            tx,
            rx,
            in_flight: 0,
            last_started: None,
        }
    }

    /// True if nothing has been fetched yet or the poll interval has elapsed.
    pub fn is_due(&self, now: Instant) -> bool {
        match self.last_started {
            None => true,
            Some(t) => now.saturating_duration_since(t) >= self.interval,
        }
    }

    pub fn is_loading(&self) -> bool {
        self.in_flight > 0
    }

    /// Start a fetch in the current epoch.
    pub fn start(&mut self, query: MeasurementQuery, now: Instant) -> Ticket {
        let ticket = self.guard.begin();
        self.last_started = Some(now);
        self.in_flight += 1;

        let source = Arc::clone(&self.source);
        let tx = self.tx.clone();
        debug!(?ticket, ?query, "starting fetch");
        thread::spawn(move || {
            let result = source.list(&query);
            // The receiver lives as long as the poller; a send error only
            // means the poller was dropped and nobody wants the result.
            let _ = tx.send(Completed { ticket, result });
        });
        ticket
    }

    /// Start a fetch for a new query, discarding anything still in flight.
    pub fn restart(&mut self, query: MeasurementQuery, now: Instant) -> Ticket {
        self.guard.invalidate();
        self.start(query, now)
    }

    /// Collect finished fetches without blocking; returns the newest applicable one.
    pub fn drain(&mut self) -> Option<PollEvent> {
        let mut latest = None;
        while let Ok(done) = self.rx.try_recv() {
            if let Some(event) = self.complete(done) {
                latest = Some(event);
            }
        }
        latest
    }

    /// Block until an applicable result arrives, nothing is in flight, or
    /// `timeout` elapses.
    pub fn wait(&mut self, timeout: Duration) -> Option<PollEvent> {
        let deadline = Instant::now() + timeout;
        while self.in_flight > 0 {
            let remaining = deadline.saturating_duration_since(Instant::now());
            match self.rx.recv_timeout(remaining) {
                Ok(done) => {
                    if let Some(event) = self.complete(done) {
                        return Some(event);
                    }
                }
                Err(RecvTimeoutError::Timeout) | Err(RecvTimeoutError::Disconnected) => return None,
            }
        }
        None
    }

    fn complete(&mut self, done: Completed) -> Option<PollEvent> {
        self.in_flight = self.in_flight.saturating_sub(1);
        if !self.guard.accept(done.ticket) {
            debug!(ticket = ?done.ticket, "discarding superseded fetch");
            return None;
        }
        match done.result {
            Ok(rows) => Some(PollEvent::Rows(rows)),
            Err(err) => {
                warn!(error = %err, "fetch failed");
                Some(PollEvent::Failed(err))
            }
        }
    }
}
