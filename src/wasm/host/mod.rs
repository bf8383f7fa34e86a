//! Host functions answered by the emulator
//!
//! Each submodule adds the `proxy_*` calls of one ABI group to
//! [`HostCalls`](super::context::HostCalls), plus typed wrappers in the style
//! of the SDKs.

pub mod buffers;
pub mod headers;
pub mod http_call;
pub mod logging;
pub mod stream;
