//! Proxy-Wasm v0.2.1 HTTP Host Emulator
//!
//! Runs Proxy-Wasm HTTP filter logic in-process, without a proxy and without
//! a Wasm runtime, and lets a test harness drive it through the HTTP stream
//! lifecycle.
//!
//! # Features
//! - Stream store keyed by context id, one record per HTTP stream
//! - Header map and buffer host calls with Proxy-Wasm status semantics
//! - Serialized header map codec (the ABI wire layout)
//! - Outbound HTTP calls parked until the harness fabricates a response
//! - Local responses, flow control and captured `proxy_log` output
//!
//! # Usage
//! ```ignore
//! let mut host = HostEmulator::with_defaults(Box::new(MyRoot));
//! host.start_plugin()?;
//! let id = host.initialize_http_context()?;
//! let action = host.call_on_request_headers(id, headers, false)?;
//! ```

mod codec;
mod constants;
mod context;
mod engine;
mod error;
mod host;
mod registry;
mod traits;
mod types;


pub use codec::{deserialize_map, serialize_map};
pub use constants::*;
pub use context::{HostCalls, LogEntry, StreamRecord};
pub use engine::HostEmulator;
pub use error::{DecodeError, EmulatorError, EmulatorResult, Status};
pub use host::buffers::{get_bytes, set_bytes};
pub use host::headers::{add_value, get_value, remove_value, replace_value};
pub use host::http_call::HttpCallTable;
pub use registry::StreamRegistry;
pub use traits::{HttpContext, RootContext};
pub use types::*;

/// Create a host emulator from a validated configuration
pub fn init(config: &EmulatorConfig, root: Box<dyn RootContext>) -> anyhow::Result<HostEmulator> {
    HostEmulator::new(config, root)
}
