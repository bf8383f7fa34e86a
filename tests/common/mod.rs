//! テスト用共通フィルタモジュール
//!
//! 統合テストおよびE2Eテストで使用するエミュレータ上のフィルタ実装を提供します。

#![allow(dead_code)]

use std::cell::RefCell;
use std::rc::Rc;
use std::time::Duration;

use veil_wasm_host::wasm::{
    EmulatorConfig, FilterAction, Headers, HostCalls, HostEmulator, HttpContext, RootContext,
    GRPC_RECEIVE_INITIAL_METADATA,
};

/// 文字列ペアから Headers を作成
pub fn headers(items: &[(&str, &str)]) -> Headers {
    items
        .iter()
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .collect()
}

/// 起動済みのエミュレータを作成
pub fn started(root: Box<dyn RootContext>) -> HostEmulator {
    let mut host = HostEmulator::with_defaults(root);
    host.start_vm().unwrap();
    host.start_plugin().unwrap();
    host
}

/// 設定付きで起動済みのエミュレータを作成
pub fn started_with(config: &EmulatorConfig, root: Box<dyn RootContext>) -> HostEmulator {
    let mut host = HostEmulator::new(config, root).unwrap();
    host.start_vm().unwrap();
    host.start_plugin().unwrap();
    host
}

// ====================
// ボディ検査フィルタ
// ====================

/// Buffers the request, asks the "detector" upstream about it and blocks
/// the request when the detector answers `x-filter-result: ?`.
pub struct DispatchRoot;

impl RootContext for DispatchRoot {
    fn create_http_context(&mut self, context_id: u32) -> Option<Box<dyn HttpContext>> {
        Some(Box::new(DispatchFilter {
            context_id,
            headers: Vec::new(),
            processed: false,
        }))
    }
}

pub struct DispatchFilter {
    context_id: u32,
    headers: Headers,
    processed: bool,
}

impl DispatchFilter {
    fn dispatch_detection(&mut self, host: &mut HostCalls<'_>, body: Option<&[u8]>) -> FilterAction {
        match host.dispatch_http_call(
            "detector",
            &self.headers,
            body,
            &[],
            Duration::from_millis(1000),
        ) {
            Ok(_) => FilterAction::Pause,
            Err(e) => {
                host.log_error(&format!(
                    "ctx_id: {} failed to dispatch http call: {}",
                    self.context_id, e
                ));
                FilterAction::Continue
            }
        }
    }
}

impl HttpContext for DispatchFilter {
    fn on_http_request_headers(
        &mut self,
        host: &mut HostCalls<'_>,
        _num_headers: usize,
        end_of_stream: bool,
    ) -> FilterAction {
        if self.processed {
            return FilterAction::Continue;
        }

        match host.get_http_request_headers() {
            Ok(headers) => self.headers = headers,
            Err(e) => {
                host.log_critical(&format!("failed to get request headers: {}", e));
                self.processed = true;
                return FilterAction::Continue;
            }
        }

        if end_of_stream {
            self.processed = true;
            return self.dispatch_detection(host, None);
        }
        FilterAction::Continue
    }

    fn on_http_request_body(
        &mut self,
        host: &mut HostCalls<'_>,
        body_size: usize,
        end_of_stream: bool,
    ) -> FilterAction {
        if self.processed {
            return FilterAction::Continue;
        }
        if !end_of_stream {
            return FilterAction::Pause;
        }

        self.processed = true;
        match host.get_http_request_body(0, body_size) {
            Ok(body) => self.dispatch_detection(host, body.as_deref()),
            Err(e) => {
                host.log_critical(&format!("failed to get request body: {}", e));
                FilterAction::Continue
            }
        }
    }

    fn on_http_call_response(
        &mut self,
        host: &mut HostCalls<'_>,
        _token_id: u32,
        _num_headers: usize,
        _body_size: usize,
        _num_trailers: usize,
    ) {
        let result = match host.get_http_call_response_headers() {
            Ok(headers) => headers
                .into_iter()
                .find(|(k, _)| k == "x-filter-result")
                .map(|(_, v)| v),
            Err(e) => {
                host.log_critical(&format!("failed to get call response headers: {}", e));
                let _ = host.resume_http_request();
                return;
            }
        };

        if result.as_deref() != Some("?") {
            host.log_debug("result is empty or not blocked, resuming request");
            let _ = host.resume_http_request();
            return;
        }

        let body = "access forbidden";
        host.log_info(body);
        if let Err(e) = host.send_http_response(
            403,
            &[("powered-by", "proxy-wasm")],
            Some(body.as_bytes()),
        ) {
            host.log_error(&format!("failed to send local response: {}", e));
            let _ = host.resume_http_request();
        }
    }
}

// ====================
// 記録フィルタ
// ====================

/// Callback trace shared between a test and [`RecordingFilter`]
pub type Events = Rc<RefCell<Vec<String>>>;

/// Records every callback it receives
pub struct RecordingRoot {
    pub events: Events,
}

impl RecordingRoot {
    pub fn new() -> (Self, Events) {
        let events = Events::default();
        (
            Self {
                events: events.clone(),
            },
            events,
        )
    }
}

impl RootContext for RecordingRoot {
    fn on_vm_start(&mut self, _host: &mut HostCalls<'_>, size: usize) -> bool {
        self.events.borrow_mut().push(format!("vm_start:{}", size));
        true
    }

    fn on_configure(&mut self, host: &mut HostCalls<'_>, size: usize) -> bool {
        let config = host.get_plugin_configuration().ok().flatten().unwrap_or_default();
        self.events.borrow_mut().push(format!(
            "configure:{}:{}",
            size,
            String::from_utf8_lossy(&config)
        ));
        true
    }

    fn on_log(&mut self, host: &mut HostCalls<'_>) {
        let path = host.get_http_request_header(":path").ok().flatten();
        let status = host.get_http_response_header(":status").ok().flatten();
        self.events.borrow_mut().push(format!(
            "access_log:{}:{}",
            path.unwrap_or_default(),
            status.unwrap_or_default()
        ));
    }

    fn create_http_context(&mut self, context_id: u32) -> Option<Box<dyn HttpContext>> {
        self.events.borrow_mut().push(format!("create:{}", context_id));
        Some(Box::new(RecordingFilter {
            events: self.events.clone(),
        }))
    }
}

pub struct RecordingFilter {
    events: Events,
}

impl RecordingFilter {
    fn push(&self, event: String) {
        self.events.borrow_mut().push(event);
    }
}

impl HttpContext for RecordingFilter {
    fn on_http_request_headers(
        &mut self,
        _host: &mut HostCalls<'_>,
        num_headers: usize,
        end_of_stream: bool,
    ) -> FilterAction {
        self.push(format!("request_headers:{}:{}", num_headers, end_of_stream));
        FilterAction::Continue
    }

    fn on_http_request_body(
        &mut self,
        _host: &mut HostCalls<'_>,
        body_size: usize,
        end_of_stream: bool,
    ) -> FilterAction {
        self.push(format!("request_body:{}:{}", body_size, end_of_stream));
        FilterAction::Continue
    }

    fn on_http_request_trailers(
        &mut self,
        _host: &mut HostCalls<'_>,
        num_trailers: usize,
    ) -> FilterAction {
        self.push(format!("request_trailers:{}", num_trailers));
        FilterAction::Continue
    }

    fn on_http_response_headers(
        &mut self,
        _host: &mut HostCalls<'_>,
        num_headers: usize,
        end_of_stream: bool,
    ) -> FilterAction {
        self.push(format!("response_headers:{}:{}", num_headers, end_of_stream));
        FilterAction::Continue
    }

    fn on_http_response_body(
        &mut self,
        _host: &mut HostCalls<'_>,
        body_size: usize,
        end_of_stream: bool,
    ) -> FilterAction {
        self.push(format!("response_body:{}:{}", body_size, end_of_stream));
        FilterAction::Continue
    }

    fn on_http_response_trailers(
        &mut self,
        _host: &mut HostCalls<'_>,
        num_trailers: usize,
    ) -> FilterAction {
        self.push(format!("response_trailers:{}", num_trailers));
        FilterAction::Continue
    }

    fn on_log(&mut self, host: &mut HostCalls<'_>) {
        // The stream must still be readable here
        let method = host.get_http_request_header(":method").ok().flatten();
        self.push(format!("log:{}", method.unwrap_or_default()));
    }

    fn on_done(&mut self, _host: &mut HostCalls<'_>) {
        self.push("done".to_string());
    }

    fn on_delete(&mut self) {
        self.push("delete".to_string());
    }
}

// ====================
// 書き換えフィルタ
// ====================

/// Rewrites the request body once complete and tags responses
pub struct RewriteRoot;

impl RootContext for RewriteRoot {
    fn create_http_context(&mut self, _context_id: u32) -> Option<Box<dyn HttpContext>> {
        Some(Box::new(RewriteFilter))
    }
}

pub struct RewriteFilter;

impl HttpContext for RewriteFilter {
    fn on_http_request_headers(
        &mut self,
        host: &mut HostCalls<'_>,
        _num_headers: usize,
        _end_of_stream: bool,
    ) -> FilterAction {
        let _ = host.remove_http_request_header("content-length");
        let _ = host.set_http_request_header("x-rewritten", "true");
        FilterAction::Continue
    }

    fn on_http_request_body(
        &mut self,
        host: &mut HostCalls<'_>,
        body_size: usize,
        end_of_stream: bool,
    ) -> FilterAction {
        if !end_of_stream {
            return FilterAction::Pause;
        }
        let _ = host.set_http_request_body(0, body_size, b"[redacted]");
        FilterAction::Continue
    }

    fn on_http_response_headers(
        &mut self,
        host: &mut HostCalls<'_>,
        _num_headers: usize,
        _end_of_stream: bool,
    ) -> FilterAction {
        let _ = host.add_http_response_header("via", "emulator");
        FilterAction::Continue
    }

    fn on_http_response_body(
        &mut self,
        host: &mut HostCalls<'_>,
        _body_size: usize,
        end_of_stream: bool,
    ) -> FilterAction {
        if end_of_stream {
            let _ = host.set_http_response_body(usize::MAX, 0, b"\n-- emulated");
        }
        FilterAction::Continue
    }
}

// ====================
// 異常系フィルタ
// ====================

/// Reads gRPC metadata from an HTTP callback
pub struct GrpcMetadataRoot;

impl RootContext for GrpcMetadataRoot {
    fn create_http_context(&mut self, _context_id: u32) -> Option<Box<dyn HttpContext>> {
        Some(Box::new(GrpcMetadataFilter))
    }
}

pub struct GrpcMetadataFilter;

impl HttpContext for GrpcMetadataFilter {
    fn on_http_request_headers(
        &mut self,
        host: &mut HostCalls<'_>,
        _num_headers: usize,
        _end_of_stream: bool,
    ) -> FilterAction {
        let _ = host.proxy_get_header_map_pairs(GRPC_RECEIVE_INITIAL_METADATA);
        FilterAction::Continue
    }
}

/// Never creates HTTP contexts
pub struct DecliningRoot;

impl RootContext for DecliningRoot {
    fn create_http_context(&mut self, _context_id: u32) -> Option<Box<dyn HttpContext>> {
        None
    }
}

/// Fails on_configure when no plugin configuration is present
pub struct StrictConfigRoot;

impl RootContext for StrictConfigRoot {
    fn on_configure(&mut self, host: &mut HostCalls<'_>, size: usize) -> bool {
        if size == 0 {
            host.log_error("plugin configuration required");
            return false;
        }
        true
    }

    fn create_http_context(&mut self, _context_id: u32) -> Option<Box<dyn HttpContext>> {
        Some(Box::new(PassThrough))
    }
}

/// Default callbacks only
pub struct PassThrough;

impl HttpContext for PassThrough {}

// ====================
// ヘッダー一時停止フィルタ
// ====================

/// Pauses on every non-final request headers event; asks "detector" once the
/// request is complete and blocks on `x-filter-result: ?`.
pub struct PausingDispatchRoot;

impl RootContext for PausingDispatchRoot {
    fn create_http_context(&mut self, context_id: u32) -> Option<Box<dyn HttpContext>> {
        Some(Box::new(PausingDispatchFilter {
            inner: DispatchFilter {
                context_id,
                headers: Vec::new(),
                processed: false,
            },
        }))
    }
}

pub struct PausingDispatchFilter {
    inner: DispatchFilter,
}

impl HttpContext for PausingDispatchFilter {
    fn on_http_request_headers(
        &mut self,
        host: &mut HostCalls<'_>,
        num_headers: usize,
        end_of_stream: bool,
    ) -> FilterAction {
        let action = self
            .inner
            .on_http_request_headers(host, num_headers, end_of_stream);
        if end_of_stream {
            action
        } else {
            FilterAction::Pause
        }
    }

    fn on_http_request_body(
        &mut self,
        host: &mut HostCalls<'_>,
        body_size: usize,
        end_of_stream: bool,
    ) -> FilterAction {
        self.inner.on_http_request_body(host, body_size, end_of_stream)
    }

    fn on_http_call_response(
        &mut self,
        host: &mut HostCalls<'_>,
        token_id: u32,
        num_headers: usize,
        body_size: usize,
        num_trailers: usize,
    ) {
        self.inner
            .on_http_call_response(host, token_id, num_headers, body_size, num_trailers)
    }
}

// ====================
// ルートコンテキストからの呼び出し
// ====================

/// Fetches a token from the "auth" upstream while configuring
pub struct AuthRoot {
    pub events: Events,
}

impl AuthRoot {
    pub fn new() -> (Self, Events) {
        let events = Events::default();
        (
            Self {
                events: events.clone(),
            },
            events,
        )
    }
}

impl RootContext for AuthRoot {
    fn on_configure(&mut self, host: &mut HostCalls<'_>, _size: usize) -> bool {
        host.dispatch_http_call(
            "auth",
            &headers(&[(":path", "/token")]),
            None,
            &[],
            Duration::from_millis(500),
        )
        .is_ok()
    }

    fn on_http_call_response(
        &mut self,
        host: &mut HostCalls<'_>,
        token_id: u32,
        _num_headers: usize,
        body_size: usize,
        _num_trailers: usize,
    ) {
        let body = host
            .get_http_call_response_body(0, body_size)
            .ok()
            .flatten()
            .unwrap_or_default();
        self.events.borrow_mut().push(format!(
            "root_call_response:{}:{}:{}",
            token_id,
            host.context_id(),
            String::from_utf8_lossy(&body)
        ));
    }

    fn create_http_context(&mut self, _context_id: u32) -> Option<Box<dyn HttpContext>> {
        Some(Box::new(PassThrough))
    }
}

// ====================
// 終了処理の異常系
// ====================

/// Reads gRPC metadata from on_log and records the rest of the teardown
pub struct FaultyLogRoot {
    pub events: Events,
}

impl RootContext for FaultyLogRoot {
    fn create_http_context(&mut self, _context_id: u32) -> Option<Box<dyn HttpContext>> {
        Some(Box::new(FaultyLogFilter {
            events: self.events.clone(),
        }))
    }
}

pub struct FaultyLogFilter {
    events: Events,
}

impl HttpContext for FaultyLogFilter {
    fn on_http_request_headers(
        &mut self,
        host: &mut HostCalls<'_>,
        _num_headers: usize,
        _end_of_stream: bool,
    ) -> FilterAction {
        let _ = host.dispatch_http_call("audit", &[], None, &[], Duration::from_secs(1));
        FilterAction::Pause
    }

    fn on_log(&mut self, host: &mut HostCalls<'_>) {
        let _ = host.proxy_get_header_map_pairs(GRPC_RECEIVE_INITIAL_METADATA);
        self.events.borrow_mut().push("log".to_string());
    }

    fn on_done(&mut self, _host: &mut HostCalls<'_>) {
        self.events.borrow_mut().push("done".to_string());
    }

    fn on_delete(&mut self) {
        self.events.borrow_mut().push("delete".to_string());
    }
}
