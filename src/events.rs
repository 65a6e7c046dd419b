//! Build completion events
//!
//! An explicit callback-list seam: the packager invokes every subscribed
//! sink synchronously after a successful write. Fire-and-forget - no return
//! value is consumed and no ordering is guaranteed among subscribers.

use crate::models::{Kind, Version};

/// Event emitted after a package build completes
#[derive(Debug, Clone)]
pub enum BuildEvent {
    /// A style-sheet package was compressed and written
    StylesheetsPacked { package: String, version: Version },

    /// A script package was compressed and written
    ScriptsPacked { package: String, version: Version },
}

impl BuildEvent {
    pub(crate) fn packed(kind: Kind, package: String, version: Version) -> Self {
        match kind {
            Kind::Stylesheet => BuildEvent::StylesheetsPacked { package, version },
            Kind::Script => BuildEvent::ScriptsPacked { package, version },
        }
    }

    /// Name of the package the event concerns
    pub fn package(&self) -> &str {
        match self {
            BuildEvent::StylesheetsPacked { package, .. }
            | BuildEvent::ScriptsPacked { package, .. } => package,
        }
    }

    /// Version embedded in the freshly written artifact
    pub fn version(&self) -> &Version {
        match self {
            BuildEvent::StylesheetsPacked { version, .. }
            | BuildEvent::ScriptsPacked { version, .. } => version,
        }
    }
}

/// Trait for receiving build events
pub trait EventSink: Send + Sync {
    /// Handle a build event
    fn on_event(&self, event: &BuildEvent);
}

/// No-op event sink for silent operation
pub struct NoopEventSink;

impl EventSink for NoopEventSink {
    fn on_event(&self, _event: &BuildEvent) {
        // Do nothing
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::{Arc, Mutex};

    /// Test event sink that records all events
    struct RecordingEventSink {
        events: Arc<Mutex<Vec<BuildEvent>>>,
    }

    impl RecordingEventSink {
        fn new() -> (Self, Arc<Mutex<Vec<BuildEvent>>>) {
            let events = Arc::new(Mutex::new(Vec::new()));
            (
                Self {
                    events: events.clone(),
                },
                events,
            )
        }
    }

    impl EventSink for RecordingEventSink {
        fn on_event(&self, event: &BuildEvent) {
            self.events.lock().unwrap().push(event.clone());
        }
    }

    #[test]
    fn recording_sink_captures_events() {
        let (sink, events) = RecordingEventSink::new();

        sink.on_event(&BuildEvent::packed(
            Kind::Stylesheet,
            "screen".to_string(),
            Version::new("abc123"),
        ));

        let recorded = events.lock().unwrap();
        assert_eq!(recorded.len(), 1);
        assert_eq!(recorded[0].package(), "screen");
        assert_eq!(recorded[0].version().as_str(), "abc123");
    }

    #[test]
    fn packed_picks_variant_by_kind() {
        let event = BuildEvent::packed(Kind::Script, "app".to_string(), Version::new("v"));
        assert!(matches!(event, BuildEvent::ScriptsPacked { .. }));
    }
}
