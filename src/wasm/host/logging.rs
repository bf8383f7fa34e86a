//! Logging Host Functions

use ftlog::{debug, error, info, trace, warn};

use crate::wasm::constants::*;
use crate::wasm::context::{HostCalls, LogEntry};
use crate::wasm::error::Status;

impl HostCalls<'_> {
    /// proxy_log: forwarded to ftlog and kept for the harness
    pub fn proxy_log(&mut self, level: i32, message: &str) -> Result<(), Status> {
        let plugin_name = &self.shared.plugin_name;

        match level {
            LOG_TRACE => trace!("[wasm:{}] {}", plugin_name, message),
            LOG_DEBUG => debug!("[wasm:{}] {}", plugin_name, message),
            LOG_INFO => info!("[wasm:{}] {}", plugin_name, message),
            LOG_WARN => warn!("[wasm:{}] {}", plugin_name, message),
            LOG_ERROR => error!("[wasm:{}] {}", plugin_name, message),
            LOG_CRITICAL => error!("[wasm:{}] CRITICAL: {}", plugin_name, message),
            _ => return Err(Status::BadArgument),
        }

        self.shared.logs.push(LogEntry {
            context_id: self.context_id,
            level,
            message: message.to_string(),
        });

        Ok(())
    }

    /// proxy_get_current_time_nanoseconds
    pub fn proxy_get_current_time_nanoseconds(&mut self) -> Result<u64, Status> {
        std::time::SystemTime::now()
            .duration_since(std::time::UNIX_EPOCH)
            .map(|d| d.as_nanos() as u64)
            .map_err(|_| Status::InternalFailure)
    }

    pub fn log_debug(&mut self, message: &str) {
        let _ = self.proxy_log(LOG_DEBUG, message);
    }

    pub fn log_info(&mut self, message: &str) {
        let _ = self.proxy_log(LOG_INFO, message);
    }

    pub fn log_warn(&mut self, message: &str) {
        let _ = self.proxy_log(LOG_WARN, message);
    }

    pub fn log_error(&mut self, message: &str) {
        let _ = self.proxy_log(LOG_ERROR, message);
    }

    pub fn log_critical(&mut self, message: &str) {
        let _ = self.proxy_log(LOG_CRITICAL, message);
    }
}
