//! Progress events emitted by long-running operations.
//!
//! Operations never touch presentation state. They push immutable
//! [`ProgressEvent`] values into a [`ProgressSink`], typically the sending half
//! of a channel whose receiver lives on the caller's thread.

use crossbeam_channel::Sender;

/// Pipeline step an event belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    Packing,
    Deriving,
    Encrypting,
    Persisting,
    Decrypting,
    Unpacking,
    Checking,
    Done,
}

impl Phase {
    /// Human-readable label for the phase.
    pub fn label(&self) -> &'static str {
        match self {
            Phase::Packing => "Packing files",
            Phase::Deriving => "Deriving key (this takes a moment)",
            Phase::Encrypting => "Encrypting archive",
            Phase::Persisting => "Saving container",
            Phase::Decrypting => "Deriving key and decrypting",
            Phase::Unpacking => "Extracting files",
            Phase::Checking => "Checking archive contents",
            Phase::Done => "Done",
        }
    }
}

/// A point-in-time progress report.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ProgressEvent {
    /// Completion in percent, 0..=100.
    pub percent: u8,
    /// Current phase.
    pub phase: Phase,
}

/// Receiver of progress events.
pub trait ProgressSink {
    fn report(&self, event: ProgressEvent);
}

impl ProgressSink for Sender<ProgressEvent> {
    fn report(&self, event: ProgressEvent) {
        // A dropped receiver means nobody is watching; the operation goes on.
        let _ = self.send(event);
    }
}

/// Sink that discards every event.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoProgress;

impl ProgressSink for NoProgress {
    fn report(&self, _event: ProgressEvent) {}
}

/// Clamps reported values so a sink never sees progress go backwards.
pub(crate) struct Tracker<'a> {
    sink: &'a dyn ProgressSink,
    last: u8,
}

impl<'a> Tracker<'a> {
    pub(crate) fn new(sink: &'a dyn ProgressSink) -> Self {
        Self { sink, last: 0 }
    }

    /// Report an absolute percentage.
    pub(crate) fn emit(&mut self, percent: u8, phase: Phase) {
        let percent = percent.min(100).max(self.last);
        self.last = percent;
        self.sink.report(ProgressEvent { percent, phase });
    }

    /// Report `done` of `total` work items mapped onto `from..=to`.
    pub(crate) fn span(&mut self, phase: Phase, from: u8, to: u8, done: usize, total: usize) {
        let width = to.saturating_sub(from) as usize;
        let offset = if total == 0 {
            width
        } else {
            width * done.min(total) / total
        };
        self.emit(from.saturating_add(offset as u8), phase);
    }
}
