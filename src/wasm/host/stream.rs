//! Stream Control Host Functions

use crate::wasm::codec::{deserialize_map, serialize_map};
use crate::wasm::context::HostCalls;
use crate::wasm::error::Status;
use crate::wasm::types::{FilterAction, LocalResponse, StreamType};

impl HostCalls<'_> {
    // === Raw ABI ===

    /// proxy_continue_stream: resume the active stream
    pub fn proxy_continue_stream(&mut self, stream_type: i32) -> Result<(), Status> {
        StreamType::try_from(stream_type)?;
        self.record.action = FilterAction::Continue;
        Ok(())
    }

    /// proxy_send_local_response. A stream gets at most one local response;
    /// later attempts are rejected and the first one is kept.
    pub fn proxy_send_local_response(
        &mut self,
        status_code: u32,
        status_code_detail: &str,
        body: &[u8],
        headers: &[u8],
        grpc_status: i32,
    ) -> Result<(), Status> {
        if self.record.local_response.is_some() {
            ftlog::warn!(
                "[wasm:{}] local response already sent on context {}",
                self.shared.plugin_name,
                self.context_id
            );
            return Err(Status::BadArgument);
        }

        let headers = deserialize_map(headers)?;

        ftlog::debug!(
            "[wasm:{}] local response {} on context {}",
            self.shared.plugin_name,
            status_code,
            self.context_id
        );

        self.record.local_response = Some(LocalResponse {
            status_code,
            status_code_detail: status_code_detail.to_string(),
            body: body.to_vec(),
            headers,
            grpc_status: if grpc_status < 0 {
                None
            } else {
                Some(grpc_status)
            },
        });

        Ok(())
    }

    // === Typed helpers ===

    pub fn resume_http_request(&mut self) -> Result<(), Status> {
        self.proxy_continue_stream(crate::wasm::constants::STREAM_TYPE_REQUEST)
    }

    pub fn resume_http_response(&mut self) -> Result<(), Status> {
        self.proxy_continue_stream(crate::wasm::constants::STREAM_TYPE_RESPONSE)
    }

    /// Send a local response without a gRPC status
    pub fn send_http_response(
        &mut self,
        status_code: u32,
        headers: &[(&str, &str)],
        body: Option<&[u8]>,
    ) -> Result<(), Status> {
        let headers: Vec<(String, String)> = headers
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        self.proxy_send_local_response(
            status_code,
            "",
            body.unwrap_or_default(),
            &serialize_map(&headers),
            -1,
        )
    }
}
