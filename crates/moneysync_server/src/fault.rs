//! Fault injection.

use moneysync_protocol::{HttpRequest, Method};

/// How an injected fault manifests.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FaultKind {
    /// Respond with this status and an error body.
    Status(u16),
    /// Drop the connection: the client sees a transport failure.
    Drop,
}

/// A fault armed for requests matching a method and path.
#[derive(Debug, Clone)]
pub struct Fault {
    method: Option<Method>,
    path: String,
    kind: FaultKind,
    remaining: Option<u32>,
}

impl Fault {
    /// Fails matching requests with `status` until removed.
    pub fn status(method: Method, path: impl Into<String>, status: u16) -> Self {
        Self {
            method: Some(method),
            path: path.into(),
            kind: FaultKind::Status(status),
            remaining: None,
        }
    }

    /// Drops matching connections until removed.
    pub fn drop_connection(method: Method, path: impl Into<String>) -> Self {
        Self {
            method: Some(method),
            path: path.into(),
            kind: FaultKind::Drop,
            remaining: None,
        }
    }

    /// Matches every method.
    pub fn any_method(mut self) -> Self {
        self.method = None;
        self
    }

    /// Disarms the fault after `n` hits.
    pub fn times(mut self, n: u32) -> Self {
        self.remaining = Some(n);
        self
    }

    /// The failure this fault produces.
    pub fn kind(&self) -> FaultKind {
        self.kind
    }

    /// Matches `path` itself and anything below it.
    pub(crate) fn matches(&self, request: &HttpRequest) -> bool {
        if self.remaining == Some(0) {
            return false;
        }
        if let Some(method) = self.method {
            if method != request.method {
                return false;
            }
        }
        request.path == self.path
            || request
                .path
                .strip_prefix(self.path.as_str())
                .map(|rest| rest.starts_with('/'))
                .unwrap_or(false)
    }

    /// Consumes one hit. Returns false once the fault is spent.
    pub(crate) fn hit(&mut self) -> bool {
        match self.remaining.as_mut() {
            Some(0) => false,
            Some(n) => {
                *n -= 1;
                true
            }
            None => true,
        }
    }

    pub(crate) fn is_spent(&self) -> bool {
        self.remaining == Some(0)
    }
}
