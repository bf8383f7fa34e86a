//! Buffer Host Functions (Body Access)

use crate::wasm::context::HostCalls;
use crate::wasm::error::Status;
use crate::wasm::types::BufferType;

/// Read `[start, start + min(max_size, len - start))`
pub fn get_bytes(buffer: &[u8], start: usize, max_size: usize) -> Result<&[u8], Status> {
    if buffer.is_empty() {
        return Err(Status::NotFound);
    }
    if start >= buffer.len() {
        return Err(Status::BadArgument);
    }

    let len = std::cmp::min(max_size, buffer.len() - start);
    Ok(&buffer[start..start + len])
}

/// Positional write.
///
/// | start        | max_size            | effect            |
/// |--------------|---------------------|-------------------|
/// | 0            | 0                   | prepend           |
/// | 0            | >= len              | replace           |
/// | 0            | 0 < max_size < len  | BadArgument       |
/// | >= len       | any                 | append            |
/// | 0 < s < len  | any                 | BadArgument       |
pub fn set_bytes(
    buffer: &mut Vec<u8>,
    start: usize,
    max_size: usize,
    data: &[u8],
) -> Result<(), Status> {
    if start == 0 {
        if max_size == 0 {
            buffer.splice(0..0, data.iter().copied());
            Ok(())
        } else if max_size >= buffer.len() {
            buffer.clear();
            buffer.extend_from_slice(data);
            Ok(())
        } else {
            Err(Status::BadArgument)
        }
    } else if start >= buffer.len() {
        buffer.extend_from_slice(data);
        Ok(())
    } else {
        Err(Status::BadArgument)
    }
}

impl HostCalls<'_> {
    // === Raw ABI ===

    /// proxy_get_buffer_bytes
    pub fn proxy_get_buffer_bytes(
        &mut self,
        buffer_type: i32,
        start: usize,
        max_size: usize,
    ) -> Result<Vec<u8>, Status> {
        let buffer: &[u8] = match BufferType::try_from(buffer_type)? {
            BufferType::HttpRequestBody => &self.record.request_body,
            BufferType::HttpResponseBody => &self.record.response_body,
            BufferType::HttpCallResponseBody => match self.call_response {
                Some(r) => &r.body,
                None => return Err(Status::NotFound),
            },
            BufferType::VmConfiguration => &self.shared.vm_configuration,
            BufferType::PluginConfiguration => &self.shared.plugin_configuration,
            BufferType::DownstreamData | BufferType::UpstreamData | BufferType::GrpcReceiveBuffer => {
                return Err(self.unreachable("proxy_get_buffer_bytes", buffer_type));
            }
        };

        get_bytes(buffer, start, max_size).map(<[u8]>::to_vec)
    }

    /// proxy_set_buffer_bytes. Only the two body buffers are writable.
    pub fn proxy_set_buffer_bytes(
        &mut self,
        buffer_type: i32,
        start: usize,
        max_size: usize,
        data: &[u8],
    ) -> Result<(), Status> {
        let result = match BufferType::try_from(buffer_type)? {
            BufferType::HttpRequestBody => {
                set_bytes(&mut self.record.request_body, start, max_size, data)
            }
            BufferType::HttpResponseBody => {
                set_bytes(&mut self.record.response_body, start, max_size, data)
            }
            _ => return Err(self.unreachable("proxy_set_buffer_bytes", buffer_type)),
        };

        if result.is_err() {
            ftlog::warn!(
                "[wasm:{}] proxy_set_buffer_bytes rejected: start={} max_size={}",
                self.shared.plugin_name,
                start,
                max_size
            );
        }
        result
    }

    // === Typed helpers ===

    /// `Ok(None)` when the buffer is empty
    pub fn get_buffer(
        &mut self,
        buffer_type: BufferType,
        start: usize,
        max_size: usize,
    ) -> Result<Option<Vec<u8>>, Status> {
        match self.proxy_get_buffer_bytes(buffer_type.code(), start, max_size) {
            Ok(bytes) => Ok(Some(bytes)),
            Err(Status::NotFound) => Ok(None),
            Err(e) => Err(e),
        }
    }

    pub fn get_http_request_body(
        &mut self,
        start: usize,
        max_size: usize,
    ) -> Result<Option<Vec<u8>>, Status> {
        self.get_buffer(BufferType::HttpRequestBody, start, max_size)
    }

    pub fn set_http_request_body(
        &mut self,
        start: usize,
        max_size: usize,
        value: &[u8],
    ) -> Result<(), Status> {
        self.proxy_set_buffer_bytes(BufferType::HttpRequestBody.code(), start, max_size, value)
    }

    pub fn get_http_response_body(
        &mut self,
        start: usize,
        max_size: usize,
    ) -> Result<Option<Vec<u8>>, Status> {
        self.get_buffer(BufferType::HttpResponseBody, start, max_size)
    }

    pub fn set_http_response_body(
        &mut self,
        start: usize,
        max_size: usize,
        value: &[u8],
    ) -> Result<(), Status> {
        self.proxy_set_buffer_bytes(BufferType::HttpResponseBody.code(), start, max_size, value)
    }

    pub fn get_http_call_response_body(
        &mut self,
        start: usize,
        max_size: usize,
    ) -> Result<Option<Vec<u8>>, Status> {
        self.get_buffer(BufferType::HttpCallResponseBody, start, max_size)
    }

    pub fn get_plugin_configuration(&mut self) -> Result<Option<Vec<u8>>, Status> {
        self.get_buffer(BufferType::PluginConfiguration, 0, usize::MAX)
    }

    pub fn get_vm_configuration(&mut self) -> Result<Option<Vec<u8>>, Status> {
        self.get_buffer(BufferType::VmConfiguration, 0, usize::MAX)
    }
}
