//! mozLz4 container codec.
//!
//! Firefox wraps compressed session files in a self-contained single-block
//! frame: an 8-byte magic tag, a little-endian u32 uncompressed size, then one
//! raw LZ4 block (not the multi-block LZ4 frame format).

use crate::error::SessionError;

/// Magic tag at the start of every compressed session-store file.
pub const MAGIC: &[u8; 8] = b"mozLz40\0";

/// Largest payload the 4-byte size field can describe.
pub const MAX_SIZE: u64 = u32::MAX as u64;

const HEADER_LEN: usize = MAGIC.len() + 4;

/// Unframes `bytes` into UTF-8 text.
///
/// Input without the magic prefix is treated as already-uncompressed text and
/// passed through. Framed input whose decompressed length disagrees with the
/// declared size fails with [`SessionError::SizeMismatch`].
pub fn decode(bytes: &[u8]) -> Result<String, SessionError> {
    if bytes.len() < HEADER_LEN || &bytes[..MAGIC.len()] != MAGIC {
        return Ok(String::from_utf8(bytes.to_vec())?);
    }

    let mut size_field = [0u8; 4];
    size_field.copy_from_slice(&bytes[MAGIC.len()..HEADER_LEN]);
    let declared = u32::from_le_bytes(size_field) as usize;

    let decompressed = match lz4_flex::block::decompress(&bytes[HEADER_LEN..], declared) {
        Ok(payload) => payload,
        Err(lz4_flex::block::DecompressError::OutputTooSmall { expected, actual }) => {
            return Err(SessionError::SizeMismatch { expected, actual });
        }
        Err(source) => return Err(SessionError::Decompress(source)),
    };
    if decompressed.len() != declared {
        return Err(SessionError::SizeMismatch {
            expected: declared,
            actual: decompressed.len(),
        });
    }

    Ok(String::from_utf8(decompressed)?)
}

/// Frames `text` as a mozLz4 container.
///
/// Fails with [`SessionError::FileTooLarge`] when the UTF-8 byte length does
/// not fit the u32 size field.
pub fn encode(text: &str) -> Result<Vec<u8>, SessionError> {
    let size = text.len() as u64;
    ensure_within_limit(size)?;

    let mut framed = Vec::with_capacity(HEADER_LEN + text.len());
    framed.extend_from_slice(MAGIC);
    framed.extend_from_slice(&(size as u32).to_le_bytes());
    framed.extend_from_slice(&lz4_flex::block::compress(text.as_bytes()));
    Ok(framed)
}

fn ensure_within_limit(size: u64) -> Result<(), SessionError> {
    if size > MAX_SIZE {
        return Err(SessionError::FileTooLarge { size });
    }
    Ok(())
}
