//! Proxy-Wasm v0.2.1 ABI constants
//!
//! Numeric values exchanged with extension code. These are a fixed external
//! contract and must match what the SDK side was compiled against.

// === Status (WasmResult) ===
pub const PROXY_RESULT_OK: i32 = 0;
pub const PROXY_RESULT_NOT_FOUND: i32 = 1;
pub const PROXY_RESULT_BAD_ARGUMENT: i32 = 2;
pub const PROXY_RESULT_SERIALIZATION_FAILURE: i32 = 3;
pub const PROXY_RESULT_PARSE_FAILURE: i32 = 4;
pub const PROXY_RESULT_INVALID_MEMORY_ACCESS: i32 = 6;
pub const PROXY_RESULT_EMPTY: i32 = 7;
pub const PROXY_RESULT_INTERNAL_FAILURE: i32 = 10;
pub const PROXY_RESULT_UNIMPLEMENTED: i32 = 12;

// === Action ===
pub const ACTION_CONTINUE: i32 = 0;
pub const ACTION_PAUSE: i32 = 1;

// === Map types ===
pub const HTTP_REQUEST_HEADERS: i32 = 0;
pub const HTTP_REQUEST_TRAILERS: i32 = 1;
pub const HTTP_RESPONSE_HEADERS: i32 = 2;
pub const HTTP_RESPONSE_TRAILERS: i32 = 3;
pub const GRPC_RECEIVE_INITIAL_METADATA: i32 = 4;
pub const GRPC_RECEIVE_TRAILING_METADATA: i32 = 5;
pub const HTTP_CALL_RESPONSE_HEADERS: i32 = 6;
pub const HTTP_CALL_RESPONSE_TRAILERS: i32 = 7;

// === Buffer types ===
pub const HTTP_REQUEST_BODY: i32 = 0;
pub const HTTP_RESPONSE_BODY: i32 = 1;
pub const DOWNSTREAM_DATA: i32 = 2;
pub const UPSTREAM_DATA: i32 = 3;
pub const HTTP_CALL_RESPONSE_BODY: i32 = 4;
pub const GRPC_RECEIVE_BUFFER: i32 = 5;
pub const VM_CONFIGURATION: i32 = 6;
pub const PLUGIN_CONFIGURATION: i32 = 7;

// === Stream types ===
pub const STREAM_TYPE_REQUEST: i32 = 0;
pub const STREAM_TYPE_RESPONSE: i32 = 1;

// === Log levels ===
pub const LOG_TRACE: i32 = 0;
pub const LOG_DEBUG: i32 = 1;
pub const LOG_INFO: i32 = 2;
pub const LOG_WARN: i32 = 3;
pub const LOG_ERROR: i32 = 4;
pub const LOG_CRITICAL: i32 = 5;

// === Context ids ===
/// Context id of the root (plugin) context. HTTP contexts are numbered after it.
pub const ROOT_CONTEXT_ID: u32 = 1;
