//! Header Map Host Functions
//!
//! Keys are compared byte for byte. Case folding, when a protocol needs it,
//! is up to the caller.

use crate::wasm::codec::{deserialize_map, serialize_map};
use crate::wasm::context::HostCalls;
use crate::wasm::error::Status;
use crate::wasm::types::{Headers, MapType};

/// First value stored under `key`
pub fn get_value<'h>(headers: &'h [(String, String)], key: &str) -> Option<&'h str> {
    headers
        .iter()
        .find(|(k, _)| k == key)
        .map(|(_, v)| v.as_str())
}

/// Concatenate onto an existing value in place, or append a new pair
pub fn add_value(headers: &mut Headers, key: &str, value: &str) {
    match headers.iter_mut().find(|(k, _)| k == key) {
        Some((_, v)) => v.push_str(value),
        None => headers.push((key.to_string(), value.to_string())),
    }
}

/// Overwrite an existing value in place, or append a new pair
pub fn replace_value(headers: &mut Headers, key: &str, value: &str) {
    match headers.iter_mut().find(|(k, _)| k == key) {
        Some((_, v)) => *v = value.to_string(),
        None => headers.push((key.to_string(), value.to_string())),
    }
}

/// Remove the first pair with `key`. No-op if absent.
pub fn remove_value(headers: &mut Headers, key: &str) {
    if let Some(pos) = headers.iter().position(|(k, _)| k == key) {
        headers.remove(pos);
    }
}

impl HostCalls<'_> {
    /// Resolve a readable map
    fn read_map(&mut self, call: &'static str, map_type: i32) -> Result<&Headers, Status> {
        match MapType::try_from(map_type)? {
            MapType::HttpRequestHeaders => Ok(&self.record.request_headers),
            MapType::HttpRequestTrailers => Ok(&self.record.request_trailers),
            MapType::HttpResponseHeaders => Ok(&self.record.response_headers),
            MapType::HttpResponseTrailers => Ok(&self.record.response_trailers),
            MapType::HttpCallResponseHeaders => self
                .call_response
                .map(|r| &r.headers)
                .ok_or(Status::NotFound),
            MapType::HttpCallResponseTrailers => self
                .call_response
                .map(|r| &r.trailers)
                .ok_or(Status::NotFound),
            MapType::GrpcReceiveInitialMetadata | MapType::GrpcReceiveTrailingMetadata => {
                Err(self.unreachable(call, map_type))
            }
        }
    }

    /// Resolve a writable map. Only the four stream maps are writable.
    fn write_map(&mut self, call: &'static str, map_type: i32) -> Result<&mut Headers, Status> {
        match MapType::try_from(map_type)? {
            MapType::HttpRequestHeaders => Ok(&mut self.record.request_headers),
            MapType::HttpRequestTrailers => Ok(&mut self.record.request_trailers),
            MapType::HttpResponseHeaders => Ok(&mut self.record.response_headers),
            MapType::HttpResponseTrailers => Ok(&mut self.record.response_trailers),
            _ => Err(self.unreachable(call, map_type)),
        }
    }

    // === Raw ABI ===

    /// proxy_get_header_map_value
    pub fn proxy_get_header_map_value(&mut self, map_type: i32, key: &str) -> Result<String, Status> {
        let headers = self.read_map("proxy_get_header_map_value", map_type)?;
        get_value(headers, key)
            .map(str::to_string)
            .ok_or(Status::NotFound)
    }

    /// proxy_get_header_map_pairs: the whole map in wire format
    pub fn proxy_get_header_map_pairs(&mut self, map_type: i32) -> Result<Vec<u8>, Status> {
        let headers = self.read_map("proxy_get_header_map_pairs", map_type)?;
        Ok(serialize_map(headers))
    }

    /// proxy_set_header_map_pairs: replace the whole map. Malformed input
    /// leaves the map untouched.
    pub fn proxy_set_header_map_pairs(&mut self, map_type: i32, map: &[u8]) -> Result<(), Status> {
        // Selector first, so an unreachable selector is never masked by a bad map
        self.write_map("proxy_set_header_map_pairs", map_type)?;

        let pairs = deserialize_map(map).map_err(|e| {
            ftlog::warn!(
                "[wasm:{}] proxy_set_header_map_pairs rejected: {}",
                self.shared.plugin_name,
                e
            );
            Status::from(e)
        })?;
        *self.write_map("proxy_set_header_map_pairs", map_type)? = pairs;
        Ok(())
    }

    /// proxy_add_header_map_value
    pub fn proxy_add_header_map_value(
        &mut self,
        map_type: i32,
        key: &str,
        value: &str,
    ) -> Result<(), Status> {
        add_value(
            self.write_map("proxy_add_header_map_value", map_type)?,
            key,
            value,
        );
        Ok(())
    }

    /// proxy_replace_header_map_value
    pub fn proxy_replace_header_map_value(
        &mut self,
        map_type: i32,
        key: &str,
        value: &str,
    ) -> Result<(), Status> {
        replace_value(
            self.write_map("proxy_replace_header_map_value", map_type)?,
            key,
            value,
        );
        Ok(())
    }

    /// proxy_remove_header_map_value
    pub fn proxy_remove_header_map_value(&mut self, map_type: i32, key: &str) -> Result<(), Status> {
        remove_value(self.write_map("proxy_remove_header_map_value", map_type)?, key);
        Ok(())
    }

    // === Typed helpers ===

    pub fn get_map(&mut self, map_type: MapType) -> Result<Headers, Status> {
        let bytes = self.proxy_get_header_map_pairs(map_type.code())?;
        Ok(deserialize_map(&bytes)?)
    }

    pub fn set_map(&mut self, map_type: MapType, headers: &[(String, String)]) -> Result<(), Status> {
        self.proxy_set_header_map_pairs(map_type.code(), &serialize_map(headers))
    }

    /// `Ok(None)` when the key is absent
    pub fn get_map_value(&mut self, map_type: MapType, key: &str) -> Result<Option<String>, Status> {
        match self.proxy_get_header_map_value(map_type.code(), key) {
            Ok(value) => Ok(Some(value)),
            Err(Status::NotFound) => Ok(None),
            Err(e) => Err(e),
        }
    }

    pub fn get_http_request_headers(&mut self) -> Result<Headers, Status> {
        self.get_map(MapType::HttpRequestHeaders)
    }

    pub fn set_http_request_headers(&mut self, headers: &[(String, String)]) -> Result<(), Status> {
        self.set_map(MapType::HttpRequestHeaders, headers)
    }

    pub fn get_http_request_header(&mut self, name: &str) -> Result<Option<String>, Status> {
        self.get_map_value(MapType::HttpRequestHeaders, name)
    }

    pub fn add_http_request_header(&mut self, name: &str, value: &str) -> Result<(), Status> {
        self.proxy_add_header_map_value(MapType::HttpRequestHeaders.code(), name, value)
    }

    pub fn set_http_request_header(&mut self, name: &str, value: &str) -> Result<(), Status> {
        self.proxy_replace_header_map_value(MapType::HttpRequestHeaders.code(), name, value)
    }

    pub fn remove_http_request_header(&mut self, name: &str) -> Result<(), Status> {
        self.proxy_remove_header_map_value(MapType::HttpRequestHeaders.code(), name)
    }

    pub fn get_http_request_trailers(&mut self) -> Result<Headers, Status> {
        self.get_map(MapType::HttpRequestTrailers)
    }

    pub fn get_http_response_headers(&mut self) -> Result<Headers, Status> {
        self.get_map(MapType::HttpResponseHeaders)
    }

    pub fn get_http_response_header(&mut self, name: &str) -> Result<Option<String>, Status> {
        self.get_map_value(MapType::HttpResponseHeaders, name)
    }

    pub fn add_http_response_header(&mut self, name: &str, value: &str) -> Result<(), Status> {
        self.proxy_add_header_map_value(MapType::HttpResponseHeaders.code(), name, value)
    }

    pub fn set_http_response_header(&mut self, name: &str, value: &str) -> Result<(), Status> {
        self.proxy_replace_header_map_value(MapType::HttpResponseHeaders.code(), name, value)
    }

    pub fn remove_http_response_header(&mut self, name: &str) -> Result<(), Status> {
        self.proxy_remove_header_map_value(MapType::HttpResponseHeaders.code(), name)
    }

    pub fn get_http_response_trailers(&mut self) -> Result<Headers, Status> {
        self.get_map(MapType::HttpResponseTrailers)
    }

    pub fn get_http_call_response_headers(&mut self) -> Result<Headers, Status> {
        self.get_map(MapType::HttpCallResponseHeaders)
    }

    pub fn get_http_call_response_trailers(&mut self) -> Result<Headers, Status> {
        self.get_map(MapType::HttpCallResponseTrailers)
    }
}
