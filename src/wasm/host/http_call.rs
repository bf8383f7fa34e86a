//! HTTP Call Host Functions
//!
//! No request leaves the process. A dispatched call is parked in the
//! [`HttpCallTable`] until the harness completes it with a fabricated
//! response, or never completes it (the emulated form of cancellation).

use std::collections::BTreeMap;
use std::time::Duration;

use crate::wasm::codec::{deserialize_map, serialize_map};
use crate::wasm::context::HostCalls;
use crate::wasm::error::Status;
use crate::wasm::types::PendingHttpCall;

/// Outstanding HTTP calls keyed by token
#[derive(Debug)]
pub struct HttpCallTable {
    next_token: u32,
    pending: BTreeMap<u32, PendingHttpCall>,
}

impl HttpCallTable {
    pub fn new() -> Self {
        Self {
            next_token: 1,
            pending: BTreeMap::new(),
        }
    }

    /// Allocate a new token
    pub fn allocate_token(&mut self) -> u32 {
        let token = self.next_token;
        self.next_token = self.next_token.wrapping_add(1).max(1);
        token
    }

    pub fn insert(&mut self, call: PendingHttpCall) {
        self.pending.insert(call.token, call);
    }

    pub fn take(&mut self, token: u32) -> Option<PendingHttpCall> {
        self.pending.remove(&token)
    }

    pub fn get(&self, token: u32) -> Option<&PendingHttpCall> {
        self.pending.get(&token)
    }

    /// Drop every call dispatched by `context_id`
    pub fn remove_for_stream(&mut self, context_id: u32) -> usize {
        let before = self.pending.len();
        self.pending.retain(|_, call| call.context_id != context_id);
        before - self.pending.len()
    }

    /// Pending calls in token order
    pub fn iter(&self) -> impl Iterator<Item = &PendingHttpCall> {
        self.pending.values()
    }

    pub fn len(&self) -> usize {
        self.pending.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pending.is_empty()
    }
}

impl Default for HttpCallTable {
    fn default() -> Self {
        Self::new()
    }
}

impl HostCalls<'_> {
    // === Raw ABI ===

    /// proxy_http_call: returns the token synchronously
    pub fn proxy_http_call(
        &mut self,
        upstream: &str,
        headers: &[u8],
        body: &[u8],
        trailers: &[u8],
        timeout_ms: u32,
    ) -> Result<u32, Status> {
        if upstream.is_empty() {
            ftlog::warn!(
                "[wasm:{}] HTTP call denied: empty upstream",
                self.shared.plugin_name
            );
            return Err(Status::BadArgument);
        }

        // Check max calls
        if self.shared.http_calls.len() >= self.shared.max_pending_http_calls {
            ftlog::warn!(
                "[wasm:{}] HTTP call denied: max_pending_http_calls exceeded",
                self.shared.plugin_name
            );
            return Err(Status::InternalFailure);
        }

        let headers = deserialize_map(headers)?;
        let trailers = deserialize_map(trailers)?;

        let token = self.shared.http_calls.allocate_token();
        self.shared.http_calls.insert(PendingHttpCall {
            token,
            context_id: self.context_id,
            upstream: upstream.to_string(),
            headers,
            body: body.to_vec(),
            trailers,
            timeout_ms,
        });

        ftlog::debug!(
            "[wasm:{}] HTTP call dispatched to '{}' with token {} from context {}",
            self.shared.plugin_name,
            upstream,
            token,
            self.context_id
        );

        Ok(token)
    }

    // === Typed helpers ===

    pub fn dispatch_http_call(
        &mut self,
        upstream: &str,
        headers: &[(String, String)],
        body: Option<&[u8]>,
        trailers: &[(String, String)],
        timeout: Duration,
    ) -> Result<u32, Status> {
        let timeout_ms = u32::try_from(timeout.as_millis()).unwrap_or(u32::MAX);
        self.proxy_http_call(
            upstream,
            &serialize_map(headers),
            body.unwrap_or_default(),
            &serialize_map(trailers),
            timeout_ms,
        )
    }
}
