//! Events reported by the copy engine.

use std::io::Write;

use serde::Serialize;
use serde_json::Value;

use crate::models::Trade;
use crate::output::{ErrorReport, JsonLines};

/// Outcome of a tick worth telling the operator about.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "event", rename_all = "lowercase")]
pub enum CopyEvent {
    /// Cursor synchronised to the source's latest trade; nothing mirrored.
    Started {
        agent: String,
        #[serde(rename = "lastSeenId")]
        last_seen_id: Option<String>,
    },
    /// A source trade was replayed on our account.
    Mirror { source: Trade, result: Value },
}

/// Destination for engine events and errors.
pub trait EventSink {
    fn emit(&mut self, event: CopyEvent);
    fn report(&mut self, report: ErrorReport);
}

impl<O: Write, E: Write> EventSink for JsonLines<O, E> {
    fn emit(&mut self, event: CopyEvent) {
        self.success(&event);
    }

    fn report(&mut self, report: ErrorReport) {
        self.failure(&report);
    }
}
