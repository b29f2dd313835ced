//! Progress-callback contract consumed by GUI frontends
//!
//! One sink, one method. Events are delivered in order from the thread
//! running the operation; a sink that panics surfaces as the operation's
//! failure. Library users get the no-op sink by default, the CLI installs
//! the logging adapter.

/// One progress event.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ProgressEvent {
    /// Percentage completed, 0..=100
    Progress(u8),
    Message(String),
    Error(String),
    /// Frontend list maintenance events
    ClearAllLists,
    Add(String),
    Update(String),
    Delete(String),
}

pub trait ProgressSink: Send + Sync {
    fn emit(&self, event: ProgressEvent);
}

/// Sink that drops every event.
pub struct NoopProgress;

impl ProgressSink for NoopProgress {
    fn emit(&self, _event: ProgressEvent) {}
}

/// Sink that forwards events to the log facade.
pub struct LogProgress;

impl ProgressSink for LogProgress {
    fn emit(&self, event: ProgressEvent) {
        match event {
            ProgressEvent::Progress(pct) => log::debug!("progress: {}%", pct),
            ProgressEvent::Message(msg) => log::info!("{}", msg),
            ProgressEvent::Error(msg) => log::error!("{}", msg),
            ProgressEvent::ClearAllLists => log::debug!("clear_all_lists"),
            ProgressEvent::Add(path) => log::debug!("add: {}", path),
            ProgressEvent::Update(path) => log::debug!("update: {}", path),
            ProgressEvent::Delete(path) => log::debug!("delete: {}", path),
        }
    }
}
