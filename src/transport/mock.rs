//! In-memory transport for tests.
//!
//! Records every open and every handle call; tests drive the client by
//! emitting events through the recorded [`EventSink`]s.

// ============================================================================
// Imports
// ============================================================================

use std::sync::Arc;

use parking_lot::Mutex;
use url::Url;

use super::{CloseCode, EventSink, Transport, TransportHandle};

// ============================================================================
// Types
// ============================================================================

/// Calls made on one mock handle.
#[derive(Debug, Default)]
struct HandleLog {
    sends: Vec<String>,
    receives: usize,
    closes: Vec<(CloseCode, Option<String>)>,
    dropped: bool,
}

/// One `open` call.
struct Opened {
    url: Url,
    sink: EventSink,
    log: Arc<Mutex<HandleLog>>,
}

// ============================================================================
// MockTransport
// ============================================================================

/// Transport that never touches the network.
#[derive(Clone, Default)]
pub(crate) struct MockTransport {
    opened: Arc<Mutex<Vec<Opened>>>,
}

impl MockTransport {
    pub(crate) fn open_count(&self) -> usize {
        self.opened.lock().len()
    }

    pub(crate) fn url(&self, index: usize) -> Url {
        self.opened.lock()[index].url.clone()
    }

    pub(crate) fn sink(&self, index: usize) -> EventSink {
        self.opened.lock()[index].sink.clone()
    }

    /// Sink of the most recent connection.
    pub(crate) fn last(&self) -> EventSink {
        self.opened
            .lock()
            .last()
            .map(|o| o.sink.clone())
            .expect("no connection opened")
    }

    pub(crate) fn sends(&self, index: usize) -> Vec<String> {
        self.log(index).lock().sends.clone()
    }

    pub(crate) fn receives(&self, index: usize) -> usize {
        self.log(index).lock().receives
    }

    pub(crate) fn closes(&self, index: usize) -> Vec<(CloseCode, Option<String>)> {
        self.log(index).lock().closes.clone()
    }

    pub(crate) fn handle_dropped(&self, index: usize) -> bool {
        self.log(index).lock().dropped
    }

    fn log(&self, index: usize) -> Arc<Mutex<HandleLog>> {
        Arc::clone(&self.opened.lock()[index].log)
    }
}

impl Transport for MockTransport {
    fn open(&self, url: &Url, events: EventSink) -> Box<dyn TransportHandle> {
        let log = Arc::new(Mutex::new(HandleLog::default()));
        self.opened.lock().push(Opened {
            url: url.clone(),
            sink: events,
            log: Arc::clone(&log),
        });
        Box::new(MockHandle { log })
    }
}

// ============================================================================
// MockHandle
// ============================================================================

struct MockHandle {
    log: Arc<Mutex<HandleLog>>,
}

impl TransportHandle for MockHandle {
    fn send(&self, text: String) {
        self.log.lock().sends.push(text);
    }

    fn receive(&self) {
        self.log.lock().receives += 1;
    }

    fn close(&self, code: CloseCode, reason: Option<String>) {
        self.log.lock().closes.push((code, reason));
    }
}

impl Drop for MockHandle {
    fn drop(&mut self) {
        self.log.lock().dropped = true;
    }
}
