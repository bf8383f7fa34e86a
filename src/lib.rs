//! veil-wasm-host
//!
//! In-process Proxy-Wasm HTTP host emulator. See [`wasm`] for the emulator
//! and [`logging`] for the ftlog setup shared by harnesses.

pub mod logging;
pub mod wasm;

pub use wasm::{EmulatorConfig, HostEmulator};
