//! CRC32 framing for stored lines
//!
//! A stored line is `<crc32 as 8 lowercase hex digits> <json>`.
//! Every read validates the checksum; a mismatch is corruption.

use crc32fast::Hasher;

/// Computes a CRC32 checksum over the provided data.
pub fn compute_checksum(data: &[u8]) -> u32 {
    let mut hasher = Hasher::new();
    hasher.update(data);
    hasher.finalize()
}

/// Verifies that the computed checksum matches the expected checksum.
pub fn verify_checksum(data: &[u8], expected: u32) -> bool {
    compute_checksum(data) == expected
}

/// Prefix a JSON body with its checksum
pub fn frame_line(body: &str) -> String {
    format!("{:08x} {}", compute_checksum(body.as_bytes()), body)
}

/// Split a framed line and check it; returns the JSON body
pub fn unframe_line(line: &str) -> Result<&str, String> {
    let (prefix, body) = line
        .split_once(' ')
        .ok_or_else(|| "missing checksum frame".to_string())?;
    if prefix.len() != 8 {
        return Err(format!("malformed checksum '{}'", prefix));
    }
    let expected = u32::from_str_radix(prefix, 16)
        .map_err(|_| format!("malformed checksum '{}'", prefix))?;
    if !verify_checksum(body.as_bytes(), expected) {
        return Err(format!("checksum mismatch (expected {})", prefix));
    }
    Ok(body)
}
