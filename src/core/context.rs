//! Request-scoped context for correlating log lines

use super::field::Field;
use serde::{Deserialize, Serialize};

/// Identifiers of the request a logger is bound to.
///
/// Binding a logger with [`Logger::with_context`](crate::Logger::with_context)
/// attaches one context field per id that is present.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RequestContext {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub request_id: Option<String>,

    /// Trace ID for request correlation
    #[serde(skip_serializing_if = "Option::is_none")]
    pub trace_id: Option<String>,

    /// Span ID for this operation
    #[serde(skip_serializing_if = "Option::is_none")]
    pub span_id: Option<String>,
}

impl RequestContext {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_request_id(mut self, request_id: impl Into<String>) -> Self {
        self.request_id = Some(request_id.into());
        self
    }

    pub fn with_trace(mut self, trace_id: impl Into<String>, span_id: impl Into<String>) -> Self {
        self.trace_id = Some(trace_id.into());
        self.span_id = Some(span_id.into());
        self
    }

    pub fn is_empty(&self) -> bool {
        self.request_id.is_none() && self.trace_id.is_none() && self.span_id.is_none()
    }

    /// Context fields contributed by this request
    pub fn fields(&self) -> Vec<Field> {
        [
            ("request_id", &self.request_id),
            ("trace_id", &self.trace_id),
            ("span_id", &self.span_id),
        ]
        .into_iter()
        .filter_map(|(key, value)| value.as_ref().map(|v| Field::string(key, v.clone())))
        .collect()
    }
}
