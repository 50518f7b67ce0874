//! JSON-lines output: one self-contained object per line.
//!
//! Results go to stdout as `{"ok":true,"data":...}`; failures go to stderr as
//! `{"ok":false,"error":...,"code":...}` with optional extra fields.

use std::io::{self, Stderr, Stdout, Write};

use serde::Serialize;
use tracing::warn;

use crate::api::ApiError;

/// A failure as shown on the error channel.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ErrorReport {
    pub error: String,
    pub code: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub trade_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub retry_after: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub request_id: Option<String>,
}

impl ErrorReport {
    pub fn new(error: impl Into<String>, code: impl Into<String>) -> Self {
        Self {
            error: error.into(),
            code: code.into(),
            trade_id: None,
            retry_after: None,
            request_id: None,
        }
    }

    pub fn with_trade_id(mut self, trade_id: impl Into<String>) -> Self {
        self.trade_id = Some(trade_id.into());
        self
    }
}

impl From<&ApiError> for ErrorReport {
    fn from(err: &ApiError) -> Self {
        let mut report = ErrorReport::new(err.to_string(), err.code());
        report.retry_after = err.retry_after();
        if let ApiError::Service { request_id, .. } = err {
            if !request_id.is_empty() {
                report.request_id = Some(request_id.clone());
            }
        }
        report
    }
}

#[derive(Serialize)]
struct SuccessLine<'a, T: ?Sized> {
    ok: bool,
    data: &'a T,
}

#[derive(Serialize)]
struct FailureLine<'a> {
    ok: bool,
    #[serde(flatten)]
    report: &'a ErrorReport,
}

/// Writer for the two JSON-lines channels.
pub struct JsonLines<O, E> {
    out: O,
    err: E,
}

impl JsonLines<Stdout, Stderr> {
    /// Process stdout/stderr.
    pub fn stdio() -> Self {
        Self::new(io::stdout(), io::stderr())
    }
}

impl<O: Write, E: Write> JsonLines<O, E> {
    pub fn new(out: O, err: E) -> Self {
        Self { out, err }
    }

    pub fn success<T: Serialize + ?Sized>(&mut self, data: &T) {
        write_line(&mut self.out, &SuccessLine { ok: true, data });
    }

    pub fn failure(&mut self, report: &ErrorReport) {
        write_line(&mut self.err, &FailureLine { ok: false, report });
    }

    #[cfg(test)]
    pub fn into_inner(self) -> (O, E) {
        (self.out, self.err)
    }
}

fn write_line<W: Write, T: Serialize>(writer: &mut W, value: &T) {
    let line = match serde_json::to_string(value) {
        Ok(line) => line,
        Err(e) => {
            warn!(error = %e, "Failed to encode output line");
            return;
        }
    };

    if let Err(e) = writeln!(writer, "{}", line).and_then(|_| writer.flush()) {
        warn!(error = %e, "Failed to write output line");
    }
}
