//! Extension capability interfaces
//!
//! The extension under test implements one method per lifecycle phase. Every
//! method has a default, so an extension only overrides the phases it cares
//! about.

use super::context::HostCalls;
use super::types::FilterAction;

/// Plugin-level (root) context
pub trait RootContext {
    /// VM started. Returning false fails `HostEmulator::start_vm`.
    fn on_vm_start(&mut self, _host: &mut HostCalls<'_>, _vm_configuration_size: usize) -> bool {
        true
    }

    /// Plugin configured. Returning false fails `HostEmulator::start_plugin`.
    fn on_configure(
        &mut self,
        _host: &mut HostCalls<'_>,
        _plugin_configuration_size: usize,
    ) -> bool {
        true
    }

    /// Access-log invocation outside any HTTP stream
    fn on_log(&mut self, _host: &mut HostCalls<'_>) {}

    /// Completion of a call made from a root callback
    fn on_http_call_response(
        &mut self,
        _host: &mut HostCalls<'_>,
        _token_id: u32,
        _num_headers: usize,
        _body_size: usize,
        _num_trailers: usize,
    ) {
    }

    /// Create the HTTP context for a new stream
    fn create_http_context(&mut self, context_id: u32) -> Option<Box<dyn HttpContext>>;
}

/// Per-stream HTTP context
pub trait HttpContext {
    fn on_http_request_headers(
        &mut self,
        _host: &mut HostCalls<'_>,
        _num_headers: usize,
        _end_of_stream: bool,
    ) -> FilterAction {
        FilterAction::Continue
    }

    /// `body_size` is the total buffered request body so far
    fn on_http_request_body(
        &mut self,
        _host: &mut HostCalls<'_>,
        _body_size: usize,
        _end_of_stream: bool,
    ) -> FilterAction {
        FilterAction::Continue
    }

    fn on_http_request_trailers(
        &mut self,
        _host: &mut HostCalls<'_>,
        _num_trailers: usize,
    ) -> FilterAction {
        FilterAction::Continue
    }

    fn on_http_response_headers(
        &mut self,
        _host: &mut HostCalls<'_>,
        _num_headers: usize,
        _end_of_stream: bool,
    ) -> FilterAction {
        FilterAction::Continue
    }

    /// `body_size` is the total buffered response body so far
    fn on_http_response_body(
        &mut self,
        _host: &mut HostCalls<'_>,
        _body_size: usize,
        _end_of_stream: bool,
    ) -> FilterAction {
        FilterAction::Continue
    }

    fn on_http_response_trailers(
        &mut self,
        _host: &mut HostCalls<'_>,
        _num_trailers: usize,
    ) -> FilterAction {
        FilterAction::Continue
    }

    /// Completion of a call made with `proxy_http_call`
    fn on_http_call_response(
        &mut self,
        _host: &mut HostCalls<'_>,
        _token_id: u32,
        _num_headers: usize,
        _body_size: usize,
        _num_trailers: usize,
    ) {
    }

    fn on_log(&mut self, _host: &mut HostCalls<'_>) {}

    fn on_done(&mut self, _host: &mut HostCalls<'_>) {}

    /// Last call before the context is dropped
    fn on_delete(&mut self) {}
}
