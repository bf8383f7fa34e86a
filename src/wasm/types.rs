//! Types for the Proxy-Wasm host emulator

use std::path::Path;

use serde::{Deserialize, Serialize};

use super::constants::*;
use super::error::Status;

/// Ordered header/trailer pairs. Keys are not unique.
pub type Headers = Vec<(String, String)>;

/// Emulator configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct EmulatorConfig {
    /// Plugin name used as the log prefix
    #[serde(default = "default_plugin_name")]
    pub plugin_name: String,

    /// Plugin configuration handed to on_configure (PLUGIN_CONFIGURATION buffer)
    #[serde(default)]
    pub plugin_configuration: String,

    /// VM configuration handed to on_vm_start (VM_CONFIGURATION buffer)
    #[serde(default)]
    pub vm_configuration: String,

    /// Maximum number of outstanding HTTP calls across all streams
    #[serde(default = "default_max_pending_http_calls")]
    pub max_pending_http_calls: usize,

    /// Logging settings
    #[serde(default)]
    pub log: LogConfig,
}

impl Default for EmulatorConfig {
    fn default() -> Self {
        Self {
            plugin_name: default_plugin_name(),
            plugin_configuration: String::new(),
            vm_configuration: String::new(),
            max_pending_http_calls: default_max_pending_http_calls(),
            log: LogConfig::default(),
        }
    }
}

fn default_plugin_name() -> String {
    "emulated".to_string()
}

fn default_max_pending_http_calls() -> usize {
    64
}

/// Logging configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct LogConfig {
    /// One of trace, debug, info, warn, error, off
    #[serde(default = "default_log_level")]
    pub level: String,
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
        }
    }
}

fn default_log_level() -> String {
    "info".to_string()
}

impl EmulatorConfig {
    /// Parse a TOML document
    pub fn from_toml_str(s: &str) -> anyhow::Result<Self> {
        let config: EmulatorConfig =
            toml::from_str(s).map_err(|e| anyhow::anyhow!("TOML parse error: {}", e))?;
        config.validate()?;
        Ok(config)
    }

    /// Load and validate a TOML file
    pub fn load(path: &Path) -> anyhow::Result<Self> {
        let s = std::fs::read_to_string(path)
            .map_err(|e| anyhow::anyhow!("Failed to read {}: {}", path.display(), e))?;
        Self::from_toml_str(&s)
    }

    /// Validate emulator configuration
    pub fn validate(&self) -> anyhow::Result<()> {
        if self.plugin_name.is_empty() {
            anyhow::bail!("plugin_name must not be empty");
        }

        if self.max_pending_http_calls == 0 {
            anyhow::bail!("max_pending_http_calls must be at least 1");
        }

        // ログレベル名のチェック
        crate::logging::parse_level(&self.log.level)?;

        Ok(())
    }
}

/// Filter action returned by callbacks
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FilterAction {
    /// Continue processing
    Continue,
    /// Pause processing (async operation)
    Pause,
}

impl FilterAction {
    /// ABI numeric value
    pub fn code(self) -> i32 {
        match self {
            FilterAction::Continue => ACTION_CONTINUE,
            FilterAction::Pause => ACTION_PAUSE,
        }
    }
}

/// Header map selector as defined by the ABI
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MapType {
    HttpRequestHeaders,
    HttpRequestTrailers,
    HttpResponseHeaders,
    HttpResponseTrailers,
    GrpcReceiveInitialMetadata,
    GrpcReceiveTrailingMetadata,
    HttpCallResponseHeaders,
    HttpCallResponseTrailers,
}

impl TryFrom<i32> for MapType {
    type Error = Status;

    fn try_from(value: i32) -> Result<Self, Self::Error> {
        match value {
            HTTP_REQUEST_HEADERS => Ok(MapType::HttpRequestHeaders),
            HTTP_REQUEST_TRAILERS => Ok(MapType::HttpRequestTrailers),
            HTTP_RESPONSE_HEADERS => Ok(MapType::HttpResponseHeaders),
            HTTP_RESPONSE_TRAILERS => Ok(MapType::HttpResponseTrailers),
            GRPC_RECEIVE_INITIAL_METADATA => Ok(MapType::GrpcReceiveInitialMetadata),
            GRPC_RECEIVE_TRAILING_METADATA => Ok(MapType::GrpcReceiveTrailingMetadata),
            HTTP_CALL_RESPONSE_HEADERS => Ok(MapType::HttpCallResponseHeaders),
            HTTP_CALL_RESPONSE_TRAILERS => Ok(MapType::HttpCallResponseTrailers),
            _ => Err(Status::BadArgument),
        }
    }
}

impl MapType {
    /// ABI numeric value
    pub fn code(self) -> i32 {
        match self {
            MapType::HttpRequestHeaders => HTTP_REQUEST_HEADERS,
            MapType::HttpRequestTrailers => HTTP_REQUEST_TRAILERS,
            MapType::HttpResponseHeaders => HTTP_RESPONSE_HEADERS,
            MapType::HttpResponseTrailers => HTTP_RESPONSE_TRAILERS,
            MapType::GrpcReceiveInitialMetadata => GRPC_RECEIVE_INITIAL_METADATA,
            MapType::GrpcReceiveTrailingMetadata => GRPC_RECEIVE_TRAILING_METADATA,
            MapType::HttpCallResponseHeaders => HTTP_CALL_RESPONSE_HEADERS,
            MapType::HttpCallResponseTrailers => HTTP_CALL_RESPONSE_TRAILERS,
        }
    }
}

/// Buffer selector as defined by the ABI
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BufferType {
    HttpRequestBody,
    HttpResponseBody,
    DownstreamData,
    UpstreamData,
    HttpCallResponseBody,
    GrpcReceiveBuffer,
    VmConfiguration,
    PluginConfiguration,
}

impl TryFrom<i32> for BufferType {
    type Error = Status;

    fn try_from(value: i32) -> Result<Self, Self::Error> {
        match value {
            HTTP_REQUEST_BODY => Ok(BufferType::HttpRequestBody),
            HTTP_RESPONSE_BODY => Ok(BufferType::HttpResponseBody),
            DOWNSTREAM_DATA => Ok(BufferType::DownstreamData),
            UPSTREAM_DATA => Ok(BufferType::UpstreamData),
            HTTP_CALL_RESPONSE_BODY => Ok(BufferType::HttpCallResponseBody),
            GRPC_RECEIVE_BUFFER => Ok(BufferType::GrpcReceiveBuffer),
            VM_CONFIGURATION => Ok(BufferType::VmConfiguration),
            PLUGIN_CONFIGURATION => Ok(BufferType::PluginConfiguration),
            _ => Err(Status::BadArgument),
        }
    }
}

impl BufferType {
    /// ABI numeric value
    pub fn code(self) -> i32 {
        match self {
            BufferType::HttpRequestBody => HTTP_REQUEST_BODY,
            BufferType::HttpResponseBody => HTTP_RESPONSE_BODY,
            BufferType::DownstreamData => DOWNSTREAM_DATA,
            BufferType::UpstreamData => UPSTREAM_DATA,
            BufferType::HttpCallResponseBody => HTTP_CALL_RESPONSE_BODY,
            BufferType::GrpcReceiveBuffer => GRPC_RECEIVE_BUFFER,
            BufferType::VmConfiguration => VM_CONFIGURATION,
            BufferType::PluginConfiguration => PLUGIN_CONFIGURATION,
        }
    }
}

/// Stream direction for proxy_continue_stream
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StreamType {
    HttpRequest,
    HttpResponse,
}

impl TryFrom<i32> for StreamType {
    type Error = Status;

    fn try_from(value: i32) -> Result<Self, Self::Error> {
        match value {
            STREAM_TYPE_REQUEST => Ok(StreamType::HttpRequest),
            STREAM_TYPE_RESPONSE => Ok(StreamType::HttpResponse),
            _ => Err(Status::BadArgument),
        }
    }
}

/// Lifecycle phase of an HTTP stream. Ordered: a stream only moves forward.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum StreamPhase {
    Created,
    RequestHeaders,
    RequestBody,
    RequestTrailers,
    ResponseHeaders,
    ResponseBody,
    ResponseTrailers,
    Completed,
}

/// Local response to send instead of proxying
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LocalResponse {
    pub status_code: u32,
    pub status_code_detail: String,
    pub body: Vec<u8>,
    pub headers: Headers,
    /// gRPC status, `None` when the extension passed -1
    pub grpc_status: Option<i32>,
}

/// HTTP call dispatched by the extension, waiting for the harness
#[derive(Debug, Clone)]
pub struct PendingHttpCall {
    pub token: u32,
    /// Stream that dispatched the call
    pub context_id: u32,
    pub upstream: String,
    pub headers: Headers,
    pub body: Vec<u8>,
    pub trailers: Headers,
    pub timeout_ms: u32,
}

/// HTTP call response fabricated by the harness
#[derive(Debug, Clone, Default)]
pub struct HttpCallResponse {
    pub headers: Headers,
    pub body: Vec<u8>,
    pub trailers: Headers,
}
