//! Host emulator: lifecycle driver
//!
//! Drives the Proxy-Wasm HTTP lifecycle against an in-process extension:
//! creates streams, delivers header/body/trailer events, hands fabricated
//! HTTP call responses back, and tears streams down in the
//! on_log → on_done → on_delete order a real host uses.

use std::collections::HashMap;

use super::constants::ROOT_CONTEXT_ID;
use super::context::{HostCalls, HostShared, LogEntry, StreamRecord};
use super::error::{EmulatorError, EmulatorResult};
use super::registry::StreamRegistry;
use super::traits::{HttpContext, RootContext};
use super::types::{
    EmulatorConfig, FilterAction, Headers, HttpCallResponse, LocalResponse, PendingHttpCall,
    StreamPhase,
};

/// In-process Proxy-Wasm host
pub struct HostEmulator {
    /// Root (plugin) context of the extension
    root: Box<dyn RootContext>,
    /// Stream records, root record included
    streams: StreamRegistry,
    /// HTTP contexts created by the root context
    contexts: HashMap<u32, Box<dyn HttpContext>>,
    /// Plugin-wide state reachable from host calls
    shared: HostShared,
    /// Next HTTP context id
    next_context_id: u32,
}

impl HostEmulator {
    /// Create an emulator with a validated configuration
    pub fn new(config: &EmulatorConfig, root: Box<dyn RootContext>) -> anyhow::Result<Self> {
        config.validate()?;
        Ok(Self::build(config, root))
    }

    /// Create an emulator with the default configuration
    pub fn with_defaults(root: Box<dyn RootContext>) -> Self {
        Self::build(&EmulatorConfig::default(), root)
    }

    fn build(config: &EmulatorConfig, root: Box<dyn RootContext>) -> Self {
        let mut streams = StreamRegistry::new();
        streams.reset(ROOT_CONTEXT_ID);

        ftlog::debug!("[wasm:{}] Host emulator created", config.plugin_name);

        Self {
            root,
            streams,
            contexts: HashMap::new(),
            shared: HostShared::new(config),
            next_context_id: ROOT_CONTEXT_ID + 1,
        }
    }

    // === Root lifecycle ===

    /// on_vm_start with the VM configuration size
    pub fn start_vm(&mut self) -> EmulatorResult<()> {
        let size = self.shared.vm_configuration.len();
        let ok = self.dispatch_root(None, |root, host| root.on_vm_start(host, size))?;
        if !ok {
            return Err(EmulatorError::StartFailed("on_vm_start"));
        }
        Ok(())
    }

    /// on_configure with the plugin configuration size
    pub fn start_plugin(&mut self) -> EmulatorResult<()> {
        let size = self.shared.plugin_configuration.len();
        let ok = self.dispatch_root(None, |root, host| root.on_configure(host, size))?;
        if !ok {
            return Err(EmulatorError::StartFailed("on_configure"));
        }
        Ok(())
    }

    /// Access-log invocation that never went through a full HTTP stream
    pub fn call_on_log_for_access_logger(
        &mut self,
        request_headers: Headers,
        response_headers: Headers,
    ) -> EmulatorResult<()> {
        let record = self.streams.reset(ROOT_CONTEXT_ID);
        record.request_headers = request_headers;
        record.response_headers = response_headers;

        self.dispatch_root(None, |root, host| root.on_log(host))
    }

    // === HTTP stream lifecycle ===

    /// Create a stream and its HTTP context. Returns the new context id.
    pub fn initialize_http_context(&mut self) -> EmulatorResult<u32> {
        let context_id = self.next_context_id;
        self.next_context_id = context_id
            .checked_add(1)
            .ok_or(EmulatorError::ContextIdsExhausted)?;

        self.streams.create(context_id)?;

        match self.root.create_http_context(context_id) {
            Some(ctx) => {
                self.contexts.insert(context_id, ctx);
                ftlog::debug!(
                    "[wasm:{}] proxy_on_context_create({}, {}) OK",
                    self.shared.plugin_name,
                    context_id,
                    ROOT_CONTEXT_ID
                );
                Ok(context_id)
            }
            None => {
                self.streams.delete(context_id)?;
                Err(EmulatorError::ContextCreation(context_id))
            }
        }
    }

    /// Store request headers and run on_http_request_headers
    pub fn call_on_request_headers(
        &mut self,
        context_id: u32,
        headers: Headers,
        end_of_stream: bool,
    ) -> EmulatorResult<FilterAction> {
        let record = self.enter_phase(context_id, StreamPhase::RequestHeaders)?;
        let num_headers = headers.len();
        record.request_headers = headers;

        self.deliver(context_id, "on_http_request_headers", |ctx, host| {
            ctx.on_http_request_headers(host, num_headers, end_of_stream)
        })
    }

    /// Append a request body chunk and run on_http_request_body with the
    /// accumulated size
    pub fn call_on_request_body(
        &mut self,
        context_id: u32,
        body: &[u8],
        end_of_stream: bool,
    ) -> EmulatorResult<FilterAction> {
        let record = self.enter_phase(context_id, StreamPhase::RequestBody)?;
        record.request_body.extend_from_slice(body);
        let body_size = record.request_body.len();

        self.deliver(context_id, "on_http_request_body", |ctx, host| {
            ctx.on_http_request_body(host, body_size, end_of_stream)
        })
    }

    /// Store request trailers and run on_http_request_trailers
    pub fn call_on_request_trailers(
        &mut self,
        context_id: u32,
        trailers: Headers,
    ) -> EmulatorResult<FilterAction> {
        let record = self.enter_phase(context_id, StreamPhase::RequestTrailers)?;
        let num_trailers = trailers.len();
        record.request_trailers = trailers;

        self.deliver(context_id, "on_http_request_trailers", |ctx, host| {
            ctx.on_http_request_trailers(host, num_trailers)
        })
    }

    /// Store response headers and run on_http_response_headers
    pub fn call_on_response_headers(
        &mut self,
        context_id: u32,
        headers: Headers,
        end_of_stream: bool,
    ) -> EmulatorResult<FilterAction> {
        let record = self.enter_phase(context_id, StreamPhase::ResponseHeaders)?;
        let num_headers = headers.len();
        record.response_headers = headers;

        self.deliver(context_id, "on_http_response_headers", |ctx, host| {
            ctx.on_http_response_headers(host, num_headers, end_of_stream)
        })
    }

    /// Append a response body chunk and run on_http_response_body with the
    /// accumulated size
    pub fn call_on_response_body(
        &mut self,
        context_id: u32,
        body: &[u8],
        end_of_stream: bool,
    ) -> EmulatorResult<FilterAction> {
        let record = self.enter_phase(context_id, StreamPhase::ResponseBody)?;
        record.response_body.extend_from_slice(body);
        let body_size = record.response_body.len();

        self.deliver(context_id, "on_http_response_body", |ctx, host| {
            ctx.on_http_response_body(host, body_size, end_of_stream)
        })
    }

    /// Store response trailers and run on_http_response_trailers
    pub fn call_on_response_trailers(
        &mut self,
        context_id: u32,
        trailers: Headers,
    ) -> EmulatorResult<FilterAction> {
        let record = self.enter_phase(context_id, StreamPhase::ResponseTrailers)?;
        let num_trailers = trailers.len();
        record.response_trailers = trailers;

        self.deliver(context_id, "on_http_response_trailers", |ctx, host| {
            ctx.on_http_response_trailers(host, num_trailers)
        })
    }

    /// Tear a stream down: on_log, on_done, on_delete, then the record goes.
    ///
    /// Pending HTTP calls of the stream are dropped with it. Teardown always
    /// runs to the end; if on_log or on_done failed (unreachable selector),
    /// the first such error is returned after the stream is gone.
    pub fn complete_http_context(&mut self, context_id: u32) -> EmulatorResult<()> {
        self.enter_phase(context_id, StreamPhase::Completed)?;

        // on_log must observe the stream before anything is discarded
        let logged = self.dispatch(context_id, None, |ctx, host| ctx.on_log(host));
        let done = self.dispatch(context_id, None, |ctx, host| ctx.on_done(host));

        if let Some(mut ctx) = self.contexts.remove(&context_id) {
            ctx.on_delete();
        }

        let dropped = self.shared.http_calls.remove_for_stream(context_id);
        if dropped > 0 {
            ftlog::debug!(
                "[wasm:{}] Dropped {} pending HTTP calls of context {}",
                self.shared.plugin_name,
                dropped,
                context_id
            );
        }

        self.streams.delete(context_id)?;
        logged.and(done)
    }

    // === HTTP calls ===

    /// Calls dispatched by the extension and not yet completed
    pub fn pending_http_calls(&self) -> Vec<&PendingHttpCall> {
        self.shared.http_calls.iter().collect()
    }

    /// Look up a pending call by token
    pub fn pending_http_call(&self, token: u32) -> Option<&PendingHttpCall> {
        self.shared.http_calls.get(token)
    }

    /// Deliver a fabricated response for `token` to on_http_call_response.
    ///
    /// Calls made from root callbacks go back to the root context. The
    /// pending entry is only consumed once its context is known to exist.
    pub fn complete_http_call(
        &mut self,
        token: u32,
        headers: Headers,
        body: Vec<u8>,
        trailers: Headers,
    ) -> EmulatorResult<()> {
        let context_id = self
            .shared
            .http_calls
            .get(token)
            .map(|call| call.context_id)
            .ok_or(EmulatorError::UnknownHttpCall(token))?;
        if context_id != ROOT_CONTEXT_ID && !self.contexts.contains_key(&context_id) {
            return Err(EmulatorError::UnknownStream(context_id));
        }

        let call = self
            .shared
            .http_calls
            .take(token)
            .ok_or(EmulatorError::UnknownHttpCall(token))?;

        let response = HttpCallResponse {
            headers,
            body,
            trailers,
        };
        let num_headers = response.headers.len();
        let body_size = response.body.len();
        let num_trailers = response.trailers.len();

        ftlog::debug!(
            "[wasm:{}] HTTP call {} to '{}' completed for context {}",
            self.shared.plugin_name,
            token,
            call.upstream,
            context_id
        );

        if context_id == ROOT_CONTEXT_ID {
            self.dispatch_root(Some(&response), |root, host| {
                root.on_http_call_response(host, token, num_headers, body_size, num_trailers)
            })
        } else {
            self.dispatch(context_id, Some(&response), |ctx, host| {
                ctx.on_http_call_response(host, token, num_headers, body_size, num_trailers)
            })
        }
    }

    // === Accessors ===

    pub fn current_action(&self, context_id: u32) -> EmulatorResult<FilterAction> {
        Ok(self.streams.get(context_id)?.action)
    }

    pub fn current_request_headers(&self, context_id: u32) -> EmulatorResult<&Headers> {
        Ok(&self.streams.get(context_id)?.request_headers)
    }

    pub fn current_response_headers(&self, context_id: u32) -> EmulatorResult<&Headers> {
        Ok(&self.streams.get(context_id)?.response_headers)
    }

    pub fn current_request_trailers(&self, context_id: u32) -> EmulatorResult<&Headers> {
        Ok(&self.streams.get(context_id)?.request_trailers)
    }

    pub fn current_response_trailers(&self, context_id: u32) -> EmulatorResult<&Headers> {
        Ok(&self.streams.get(context_id)?.response_trailers)
    }

    pub fn current_request_body(&self, context_id: u32) -> EmulatorResult<&[u8]> {
        Ok(&self.streams.get(context_id)?.request_body)
    }

    pub fn current_response_body(&self, context_id: u32) -> EmulatorResult<&[u8]> {
        Ok(&self.streams.get(context_id)?.response_body)
    }

    pub fn current_phase(&self, context_id: u32) -> EmulatorResult<StreamPhase> {
        Ok(self.streams.get(context_id)?.phase)
    }

    pub fn sent_local_response(&self, context_id: u32) -> EmulatorResult<Option<&LocalResponse>> {
        Ok(self.streams.get(context_id)?.local_response.as_ref())
    }

    /// Direct access to the stream store
    pub fn streams(&self) -> &StreamRegistry {
        &self.streams
    }

    /// Messages logged through proxy_log at `level`
    pub fn logs(&self, level: i32) -> Vec<&str> {
        self.shared
            .logs
            .iter()
            .filter(|entry| entry.level == level)
            .map(|entry| entry.message.as_str())
            .collect()
    }

    /// Every captured proxy_log message
    pub fn all_logs(&self) -> &[LogEntry] {
        &self.shared.logs
    }

    // === Dispatch ===

    /// Move a stream forward. Going back to an earlier phase is an error;
    /// repeating a phase (body chunks) is not.
    fn enter_phase(
        &mut self,
        context_id: u32,
        phase: StreamPhase,
    ) -> EmulatorResult<&mut StreamRecord> {
        if !self.contexts.contains_key(&context_id) {
            return Err(EmulatorError::UnknownStream(context_id));
        }

        let record = self.streams.get_mut(context_id)?;
        if phase < record.phase {
            return Err(EmulatorError::InvalidPhase {
                context_id,
                from: record.phase,
                to: phase,
            });
        }
        record.phase = phase;
        Ok(record)
    }

    /// Run a phase callback and record the action it returns
    fn deliver<F>(
        &mut self,
        context_id: u32,
        callback: &'static str,
        f: F,
    ) -> EmulatorResult<FilterAction>
    where
        F: FnOnce(&mut dyn HttpContext, &mut HostCalls<'_>) -> FilterAction,
    {
        let action = self.dispatch(context_id, None, f)?;
        self.streams.get_mut(context_id)?.action = action;

        ftlog::debug!(
            "[wasm:{}] {}({}) => {:?}",
            self.shared.plugin_name,
            callback,
            context_id,
            action
        );

        Ok(action)
    }

    /// Run `f` with `context_id` as the active stream
    fn dispatch<R, F>(
        &mut self,
        context_id: u32,
        call_response: Option<&HttpCallResponse>,
        f: F,
    ) -> EmulatorResult<R>
    where
        F: FnOnce(&mut dyn HttpContext, &mut HostCalls<'_>) -> R,
    {
        let Self {
            streams,
            contexts,
            shared,
            ..
        } = self;

        let ctx = contexts
            .get_mut(&context_id)
            .ok_or(EmulatorError::UnknownStream(context_id))?;
        let record = streams.get_mut(context_id)?;

        let mut host = HostCalls::new(context_id, record, shared, call_response);
        let out = f(&mut **ctx, &mut host);
        host.finish()?;

        Ok(out)
    }

    /// Run `f` on the root context with the root record active
    fn dispatch_root<R, F>(
        &mut self,
        call_response: Option<&HttpCallResponse>,
        f: F,
    ) -> EmulatorResult<R>
    where
        F: FnOnce(&mut dyn RootContext, &mut HostCalls<'_>) -> R,
    {
        let Self {
            root,
            streams,
            shared,
            ..
        } = self;

        let record = streams.get_mut(ROOT_CONTEXT_ID)?;

        let mut host = HostCalls::new(ROOT_CONTEXT_ID, record, shared, call_response);
        let out = f(&mut **root, &mut host);
        host.finish()?;

        Ok(out)
    }
}
