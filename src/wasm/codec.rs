//! Header map wire format
//!
//! Format (little endian):
//! `[num_pairs:4]([key_len:4][val_len:4])*(key \0 value \0)*`

use super::error::DecodeError;
use super::types::Headers;

/// Serialize pairs to the Proxy-Wasm map format
pub fn serialize_map(pairs: &[(String, String)]) -> Vec<u8> {
    let data_len: usize = pairs.iter().map(|(k, v)| k.len() + v.len() + 2).sum();
    let mut buf = Vec::with_capacity(4 + pairs.len() * 8 + data_len);

    buf.extend_from_slice(&(pairs.len() as u32).to_le_bytes());

    for (key, value) in pairs {
        buf.extend_from_slice(&(key.len() as u32).to_le_bytes());
        buf.extend_from_slice(&(value.len() as u32).to_le_bytes());
    }

    for (key, value) in pairs {
        buf.extend_from_slice(key.as_bytes());
        buf.push(0);
        buf.extend_from_slice(value.as_bytes());
        buf.push(0);
    }

    buf
}

/// Deserialize pairs from the Proxy-Wasm map format.
///
/// An empty slice is the empty map.
pub fn deserialize_map(data: &[u8]) -> Result<Headers, DecodeError> {
    if data.is_empty() {
        return Ok(Vec::new());
    }

    let num_pairs = read_u32(data, 0)? as usize;

    // Size table must fit before we trust num_pairs for allocation
    let table_end = num_pairs
        .checked_mul(8)
        .and_then(|n| n.checked_add(4))
        .ok_or(DecodeError::Truncated {
            needed: usize::MAX,
            available: data.len(),
        })?;
    if table_end > data.len() {
        return Err(DecodeError::Truncated {
            needed: table_end,
            available: data.len(),
        });
    }

    let mut pairs = Vec::with_capacity(num_pairs);
    let mut pos = table_end;

    for i in 0..num_pairs {
        let key_len = read_u32(data, 4 + i * 8)? as usize;
        let val_len = read_u32(data, 8 + i * 8)? as usize;

        let key = read_terminated(data, &mut pos, key_len, i)?;
        let value = read_terminated(data, &mut pos, val_len, i)?;

        pairs.push((key, value));
    }

    if pos != data.len() {
        return Err(DecodeError::TrailingBytes(data.len() - pos));
    }

    Ok(pairs)
}

fn read_u32(data: &[u8], pos: usize) -> Result<u32, DecodeError> {
    let bytes = data.get(pos..pos + 4).ok_or(DecodeError::Truncated {
        needed: pos + 4,
        available: data.len(),
    })?;
    Ok(u32::from_le_bytes([bytes[0], bytes[1], bytes[2], bytes[3]]))
}

fn read_terminated(
    data: &[u8],
    pos: &mut usize,
    len: usize,
    pair: usize,
) -> Result<String, DecodeError> {
    let end = pos
        .checked_add(len)
        .filter(|end| *end < data.len())
        .ok_or(DecodeError::LengthMismatch { pair })?;

    if data[end] != 0 {
        return Err(DecodeError::MissingTerminator { pair });
    }

    let s = std::str::from_utf8(&data[*pos..end])
        .map_err(|_| DecodeError::InvalidUtf8 { pair })?
        .to_string();
    *pos = end + 1;
    Ok(s)
}
