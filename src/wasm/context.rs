//! Per-stream state and the active-context host call handle
//!
//! A [`HostCalls`] value exists only while one extension callback runs. It
//! borrows exactly one [`StreamRecord`], so every raw call issued from that
//! callback is scoped to the active stream without any ambient global.

use super::error::{EmulatorError, EmulatorResult, Status};
use super::host::http_call::HttpCallTable;
use super::types::{
    EmulatorConfig, FilterAction, Headers, HttpCallResponse, LocalResponse, StreamPhase,
};

/// State of one HTTP stream
#[derive(Debug, Clone)]
pub struct StreamRecord {
    pub request_headers: Headers,
    pub response_headers: Headers,
    pub request_trailers: Headers,
    pub response_trailers: Headers,
    pub request_body: Vec<u8>,
    pub response_body: Vec<u8>,
    /// Last flow-control decision
    pub action: FilterAction,
    /// Set at most once by proxy_send_local_response
    pub local_response: Option<LocalResponse>,
    pub phase: StreamPhase,
}

impl StreamRecord {
    pub fn new() -> Self {
        Self {
            request_headers: Vec::new(),
            response_headers: Vec::new(),
            request_trailers: Vec::new(),
            response_trailers: Vec::new(),
            request_body: Vec::new(),
            response_body: Vec::new(),
            action: FilterAction::Continue,
            local_response: None,
            phase: StreamPhase::Created,
        }
    }

    /// Check if a local response was sent
    pub fn should_send_local_response(&self) -> bool {
        self.local_response.is_some()
    }
}

impl Default for StreamRecord {
    fn default() -> Self {
        Self::new()
    }
}

/// Message captured from proxy_log
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LogEntry {
    pub context_id: u32,
    pub level: i32,
    pub message: String,
}

/// Plugin-wide state shared by every stream
#[derive(Debug)]
pub struct HostShared {
    pub plugin_name: String,
    pub plugin_configuration: Vec<u8>,
    pub vm_configuration: Vec<u8>,
    pub max_pending_http_calls: usize,
    pub http_calls: HttpCallTable,
    pub logs: Vec<LogEntry>,
}

impl HostShared {
    pub fn new(config: &EmulatorConfig) -> Self {
        Self {
            plugin_name: config.plugin_name.clone(),
            plugin_configuration: config.plugin_configuration.as_bytes().to_vec(),
            vm_configuration: config.vm_configuration.as_bytes().to_vec(),
            max_pending_http_calls: config.max_pending_http_calls,
            http_calls: HttpCallTable::new(),
            logs: Vec::new(),
        }
    }
}

/// Host call surface handed to extension callbacks.
///
/// Raw `proxy_*` methods live in the `host` submodules, grouped the same way
/// the ABI groups them (headers, buffers, stream control, HTTP calls, logging).
pub struct HostCalls<'a> {
    pub(crate) context_id: u32,
    pub(crate) record: &'a mut StreamRecord,
    pub(crate) shared: &'a mut HostShared,
    /// Response being delivered by on_http_call_response, if any
    pub(crate) call_response: Option<&'a HttpCallResponse>,
    fatal: Option<EmulatorError>,
}

impl<'a> HostCalls<'a> {
    pub(crate) fn new(
        context_id: u32,
        record: &'a mut StreamRecord,
        shared: &'a mut HostShared,
        call_response: Option<&'a HttpCallResponse>,
    ) -> Self {
        Self {
            context_id,
            record,
            shared,
            call_response,
            fatal: None,
        }
    }

    /// Id of the active stream
    pub fn context_id(&self) -> u32 {
        self.context_id
    }

    /// Record an unreachable selector. The extension gets `InternalFailure`;
    /// the driver fails the whole delivery once the callback returns.
    pub(crate) fn unreachable(&mut self, call: &'static str, selector: i32) -> Status {
        ftlog::error!(
            "[wasm:{}] unreachable: {} with selector {} on context {}",
            self.shared.plugin_name,
            call,
            selector,
            self.context_id
        );
        if self.fatal.is_none() {
            self.fatal = Some(EmulatorError::UnreachableSelector { call, selector });
        }
        Status::InternalFailure
    }

    /// End the invocation, surfacing any fatal selector error
    pub(crate) fn finish(self) -> EmulatorResult<()> {
        match self.fatal {
            Some(err) => Err(err),
            None => Ok(()),
        }
    }
}
