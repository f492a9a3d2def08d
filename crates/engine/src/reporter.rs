// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Reporting seams: a user-facing reporter and a machine event sink.
//!
//! Both are optional. Reporter calls run on the lifecycle thread and must
//! not block it meaningfully; event posts are fire-and-forget.

use fm_core::Event;

/// User-facing progress reporter.
pub trait Reporter: Send + Sync {
    fn info(&self, message: &str);
    fn warn(&self, message: &str);
}

/// Sink for machine-consumable events.
pub trait EventSink: Send + Sync {
    fn post(&self, event: Event);
}

/// Posting into a channel; a dropped receiver just discards events.
impl EventSink for std::sync::mpsc::Sender<Event> {
    fn post(&self, event: Event) {
        let _ = self.send(event);
    }
}

// Test support - only compiled for tests or when explicitly requested
#[cfg(any(test, feature = "test-support"))]
pub use fakes::{CollectingSink, RecordingReporter};

#[cfg(any(test, feature = "test-support"))]
mod fakes {
    use super::{EventSink, Reporter};
    use fm_core::Event;
    use parking_lot::Mutex;
    use std::sync::Arc;

    /// Reporter that records messages for assertions.
    #[derive(Clone, Default)]
    pub struct RecordingReporter {
        infos: Arc<Mutex<Vec<String>>>,
        warns: Arc<Mutex<Vec<String>>>,
    }

    impl RecordingReporter {
        pub fn new() -> Self {
            Self::default()
        }

        pub fn infos(&self) -> Vec<String> {
            self.infos.lock().clone()
        }

        pub fn warns(&self) -> Vec<String> {
            self.warns.lock().clone()
        }
    }

    impl Reporter for RecordingReporter {
        fn info(&self, message: &str) {
            self.infos.lock().push(message.to_string());
        }

        fn warn(&self, message: &str) {
            self.warns.lock().push(message.to_string());
        }
    }

    /// Event sink that collects posted events.
    #[derive(Clone, Default)]
    pub struct CollectingSink {
        events: Arc<Mutex<Vec<Event>>>,
    }

    impl CollectingSink {
        pub fn new() -> Self {
            Self::default()
        }

        pub fn events(&self) -> Vec<Event> {
            self.events.lock().clone()
        }
    }

    impl EventSink for CollectingSink {
        fn post(&self, event: Event) {
            self.events.lock().push(event);
        }
    }
}

#[cfg(test)]
#[path = "reporter_tests.rs"]
mod tests;
