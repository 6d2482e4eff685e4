use std::sync::Arc;

use parking_lot::Mutex;

/// Severity of a user-visible notice.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Level {
    Success,
    Error,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notice {
    pub level: Level,
    pub message: String,
}

/// Notifier
///
/// The global, user-visible notification channel. The pipeline reports
/// request failures here; callers may also report their own outcomes.
pub trait Notifier: Send + Sync {
    fn notify(&self, notice: Notice);

    fn error(&self, message: &str) {
        self.notify(Notice {
            level: Level::Error,
            message: message.to_string(),
        });
    }

    fn success(&self, message: &str) {
        self.notify(Notice {
            level: Level::Success,
            message: message.to_string(),
        });
    }
}

/// Routes notices into the tracing pipeline.
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingNotifier;

impl Notifier for TracingNotifier {
    fn notify(&self, notice: Notice) {
        match notice.level {
            Level::Success => tracing::info!(target: "harbor_console::notice", "{}", notice.message),
            Level::Error => tracing::warn!(target: "harbor_console::notice", "{}", notice.message),
        }
    }
}

/// MemoryNotifier
///
/// Records every notice so tests can assert on exactly what the user saw.
#[derive(Debug, Default)]
pub struct MemoryNotifier {
    notices: Mutex<Vec<Notice>>,
}

impl MemoryNotifier {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn notices(&self) -> Vec<Notice> {
        self.notices.lock().clone()
    }

    /// Messages of the recorded error notices, oldest first.
    pub fn errors(&self) -> Vec<String> {
        self.notices
            .lock()
            .iter()
            .filter(|n| n.level == Level::Error)
            .map(|n| n.message.clone())
            .collect()
    }

    pub fn clear(&self) {
        self.notices.lock().clear();
    }
}

impl Notifier for MemoryNotifier {
    fn notify(&self, notice: Notice) {
        self.notices.lock().push(notice);
    }
}

pub type NotifierState = Arc<dyn Notifier>;
