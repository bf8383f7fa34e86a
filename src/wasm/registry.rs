//! Stream Registry
//!
//! Holds one [`StreamRecord`] per live stream id. Records are created when a
//! context is initialized and removed on explicit teardown only.

use std::collections::HashMap;

use super::context::StreamRecord;
use super::error::{EmulatorError, EmulatorResult};

/// Registry of live stream records
#[derive(Debug, Default)]
pub struct StreamRegistry {
    /// Map from context_id to stream record
    streams: HashMap<u32, StreamRecord>,
}

impl StreamRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Create an empty record for `context_id`
    pub fn create(&mut self, context_id: u32) -> EmulatorResult<&mut StreamRecord> {
        if self.streams.contains_key(&context_id) {
            return Err(EmulatorError::DuplicateStream(context_id));
        }

        ftlog::debug!("[wasm:registry] Created stream {}", context_id);
        Ok(self
            .streams
            .entry(context_id)
            .or_insert_with(StreamRecord::new))
    }

    /// Replace whatever is stored under `context_id` with a fresh record
    pub fn reset(&mut self, context_id: u32) -> &mut StreamRecord {
        let record = self
            .streams
            .entry(context_id)
            .or_insert_with(StreamRecord::new);
        *record = StreamRecord::new();
        record
    }

    pub fn get(&self, context_id: u32) -> EmulatorResult<&StreamRecord> {
        self.streams
            .get(&context_id)
            .ok_or(EmulatorError::UnknownStream(context_id))
    }

    pub fn get_mut(&mut self, context_id: u32) -> EmulatorResult<&mut StreamRecord> {
        self.streams
            .get_mut(&context_id)
            .ok_or(EmulatorError::UnknownStream(context_id))
    }

    /// Remove and return the record
    pub fn delete(&mut self, context_id: u32) -> EmulatorResult<StreamRecord> {
        let record = self
            .streams
            .remove(&context_id)
            .ok_or(EmulatorError::UnknownStream(context_id))?;
        ftlog::debug!("[wasm:registry] Deleted stream {}", context_id);
        Ok(record)
    }

    pub fn contains(&self, context_id: u32) -> bool {
        self.streams.contains_key(&context_id)
    }

    pub fn len(&self) -> usize {
        self.streams.len()
    }

    pub fn is_empty(&self) -> bool {
        self.streams.is_empty()
    }
}
