//! Side-effect dispatch
//!
//! Each parsed lifecycle event lands here once: append to the notification
//! log, then sound/toast keyed by kind with the console's durations and
//! icons. A rejected sound (host autoplay policy) is logged and swallowed;
//! it never blocks the toast or the log append.

use crate::error::PlaybackRejected;
use livry_core::{EventKind, Notification};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tracing::debug;

/// A transient success indicator shown on the console.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Toast {
    pub message: String,
    pub duration: Duration,
    pub icon: &'static str,
}

impl Toast {
    pub fn new(message: impl Into<String>, duration: Duration, icon: &'static str) -> Self {
        Self {
            message: message.into(),
            duration,
            icon,
        }
    }
}

/// The console's side-effect surface. The real implementation plays audio
/// and renders toasts; tests record calls.
pub trait Notifier: Send {
    /// Play the new-delivery chime. Hosts may reject autoplay.
    fn play_sound(&self) -> Result<(), PlaybackRejected>;

    /// Show a success indicator.
    fn toast(&self, toast: Toast);
}

/// Append-only, in-memory sequence of received events. Display-only; never
/// replayed to the server. Clones share the same underlying log.
#[derive(Debug, Clone, Default)]
pub struct NotificationLog {
    entries: Arc<Mutex<Vec<Notification>>>,
}

impl NotificationLog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn append(&self, event: Notification) {
        self.entries.lock().unwrap().push(event);
    }

    pub fn len(&self) -> usize {
        self.entries.lock().unwrap().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// A copy of the current entries, oldest first.
    pub fn snapshot(&self) -> Vec<Notification> {
        self.entries.lock().unwrap().clone()
    }
}

/// Run the side effects for one received event.
pub fn dispatch(notifier: &dyn Notifier, event: &Notification) {
    match event.kind {
        EventKind::NewDelivery => {
            if let Err(err) = notifier.play_sound() {
                debug!(error = %err, "Notification sound rejected by host");
            }
            notifier.toast(Toast::new(&event.message, Duration::from_secs(5), "📦"));
        }
        EventKind::StatusUpdate => {
            notifier.toast(Toast::new(&event.message, Duration::from_secs(4), "🔄"));
        }
        EventKind::Assignment => {
            notifier.toast(Toast::new(&event.message, Duration::from_secs(4), "👤"));
        }
        EventKind::Connected => {
            debug!("Notification stream connected");
        }
        EventKind::Info | EventKind::Unknown => {
            notifier.toast(Toast::new(&event.message, Duration::from_secs(4), "ℹ️"));
        }
    }
}

#[cfg(test)]
pub(crate) mod test_support {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    /// Records every side effect; optionally rejects sound playback.
    #[derive(Clone, Default)]
    pub struct RecordingNotifier {
        pub toasts: Arc<Mutex<Vec<Toast>>>,
        pub sound_attempts: Arc<AtomicUsize>,
        pub reject_sound: bool,
    }

    impl RecordingNotifier {
        pub fn rejecting_sound() -> Self {
            Self {
                reject_sound: true,
                ..Self::default()
            }
        }

        pub fn toasts(&self) -> Vec<Toast> {
            self.toasts.lock().unwrap().clone()
        }

        pub fn sound_attempts(&self) -> usize {
            self.sound_attempts.load(Ordering::SeqCst)
        }
    }

    impl Notifier for RecordingNotifier {
        fn play_sound(&self) -> Result<(), PlaybackRejected> {
            self.sound_attempts.fetch_add(1, Ordering::SeqCst);
            if self.reject_sound {
                Err(PlaybackRejected("NotAllowedError".to_string()))
            } else {
                Ok(())
            }
        }

        fn toast(&self, toast: Toast) {
            self.toasts.lock().unwrap().push(toast);
        }
    }
}
