//! Error types for the host emulator
//!
//! Two audiences: [`Status`] is what extension code sees as the result of a
//! raw host call, [`EmulatorError`] is what the driving harness sees.

use std::fmt;

use super::constants::*;
use super::types::StreamPhase;

/// Proxy-Wasm status returned to extension code
#[repr(i32)]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Status {
    Ok = PROXY_RESULT_OK,
    NotFound = PROXY_RESULT_NOT_FOUND,
    BadArgument = PROXY_RESULT_BAD_ARGUMENT,
    SerializationFailure = PROXY_RESULT_SERIALIZATION_FAILURE,
    ParseFailure = PROXY_RESULT_PARSE_FAILURE,
    InvalidMemoryAccess = PROXY_RESULT_INVALID_MEMORY_ACCESS,
    Empty = PROXY_RESULT_EMPTY,
    InternalFailure = PROXY_RESULT_INTERNAL_FAILURE,
    Unimplemented = PROXY_RESULT_UNIMPLEMENTED,
}

impl Status {
    /// ABI numeric value
    pub fn code(self) -> i32 {
        self as i32
    }
}

impl fmt::Display for Status {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Ok => "OK",
            Self::NotFound => "NOT_FOUND",
            Self::BadArgument => "BAD_ARGUMENT",
            Self::SerializationFailure => "SERIALIZATION_FAILURE",
            Self::ParseFailure => "PARSE_FAILURE",
            Self::InvalidMemoryAccess => "INVALID_MEMORY_ACCESS",
            Self::Empty => "EMPTY",
            Self::InternalFailure => "INTERNAL_FAILURE",
            Self::Unimplemented => "UNIMPLEMENTED",
        };
        write!(f, "{}", name)
    }
}

impl std::error::Error for Status {}

/// Serialized map decoding failure
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DecodeError {
    /// Input ends before the pair count or size table
    Truncated { needed: usize, available: usize },
    /// Key/value data runs past the end of the input
    LengthMismatch { pair: usize },
    /// Key or value is not followed by a NUL byte
    MissingTerminator { pair: usize },
    /// Key or value is not UTF-8
    InvalidUtf8 { pair: usize },
    /// Bytes left over after the last pair
    TrailingBytes(usize),
}

impl fmt::Display for DecodeError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Truncated { needed, available } => {
                write!(f, "Truncated map: need {} bytes, have {}", needed, available)
            }
            Self::LengthMismatch { pair } => {
                write!(f, "Pair {} data exceeds the serialized map", pair)
            }
            Self::MissingTerminator { pair } => write!(f, "Pair {} is not NUL terminated", pair),
            Self::InvalidUtf8 { pair } => write!(f, "Pair {} is not valid UTF-8", pair),
            Self::TrailingBytes(n) => write!(f, "{} trailing bytes after the last pair", n),
        }
    }
}

impl std::error::Error for DecodeError {}

impl From<DecodeError> for Status {
    fn from(_: DecodeError) -> Self {
        Status::BadArgument
    }
}

/// Harness-facing emulator error
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EmulatorError {
    /// No stream record for this id
    UnknownStream(u32),
    /// A record already exists for this id
    DuplicateStream(u32),
    /// No pending HTTP call with this token
    UnknownHttpCall(u32),
    /// The root context declined to create an HTTP context
    ContextCreation(u32),
    /// Every context id has been handed out
    ContextIdsExhausted,
    /// Delivery would move the stream back to an earlier phase
    InvalidPhase {
        context_id: u32,
        from: StreamPhase,
        to: StreamPhase,
    },
    /// on_vm_start / on_configure reported failure
    StartFailed(&'static str),
    /// Extension used an ABI selector this emulator does not serve.
    /// Programming error in the emulator or the extension, never a data condition.
    UnreachableSelector {
        call: &'static str,
        selector: i32,
    },
}

impl fmt::Display for EmulatorError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::UnknownStream(id) => write!(f, "Unknown stream: {}", id),
            Self::DuplicateStream(id) => write!(f, "Stream {} already exists", id),
            Self::UnknownHttpCall(token) => write!(f, "Unknown HTTP call token: {}", token),
            Self::ContextCreation(id) => {
                write!(f, "Root context did not create an HTTP context for {}", id)
            }
            Self::InvalidPhase {
                context_id,
                from,
                to,
            } => write!(
                f,
                "Stream {} cannot move from {:?} back to {:?}",
                context_id, from, to
            ),
            Self::ContextIdsExhausted => write!(f, "No context ids left"),
            Self::StartFailed(callback) => write!(f, "{} reported failure", callback),
            Self::UnreachableSelector { call, selector } => write!(
                f,
                "unreachable: {} called with selector {} (bug in the emulator or extension)",
                call, selector
            ),
        }
    }
}

impl std::error::Error for EmulatorError {}

impl EmulatorError {
    /// Programming-error class, as opposed to harness usage errors
    pub fn is_fatal(&self) -> bool {
        matches!(self, Self::UnreachableSelector { .. })
    }
}

/// Result of a harness-facing emulator call
pub type EmulatorResult<T> = Result<T, EmulatorError>;
