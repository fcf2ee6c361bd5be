//! Container framing and file I/O helpers for artifact encryption.
//!
//! Layout: `SGGCM` magic, 2-byte version, 12-byte nonce,
//! 8-byte LE ciphertext length, ciphertext with GCM tag.

use std::io::{Read, Write};
use std::path::Path;

use super::encryption_core::{CodecError, NONCE_SIZE, TAG_SIZE};

/// Container magic bytes.
pub const MAGIC: &[u8; 5] = b"SGGCM";
/// Current container version (major, minor).
pub const VERSION: [u8; 2] = [1, 0];
/// Bytes preceding the ciphertext.
pub const HEADER_SIZE: usize = MAGIC.len() + VERSION.len() + NONCE_SIZE + 8;

/// Read file bytes.
pub fn read_file_bytes(path: &Path) -> Result<Vec<u8>, CodecError> {
    std::fs::read(path).map_err(|e| CodecError::io(path, e))
}

/// Whether the file at `path` begins with the container magic.
pub fn is_sealed_file(path: &Path) -> Result<bool, CodecError> {
    let file = std::fs::File::open(path).map_err(|e| CodecError::io(path, e))?;
    let mut head = Vec::with_capacity(MAGIC.len());
    file.take(MAGIC.len() as u64)
        .read_to_end(&mut head)
        .map_err(|e| CodecError::io(path, e))?;
    Ok(head == MAGIC)
}

/// Frame a nonce and ciphertext into a container.
pub fn seal_container(nonce: &[u8; NONCE_SIZE], ct: &[u8]) -> Vec<u8> {
    let mut out = Vec::with_capacity(HEADER_SIZE + ct.len());
    out.extend_from_slice(MAGIC);
    out.extend_from_slice(&VERSION);
    out.extend_from_slice(nonce);
    out.extend_from_slice(&(ct.len() as u64).to_le_bytes());
    out.extend_from_slice(ct);
    out
}

/// Split a container into its nonce and ciphertext.
pub fn open_container(data: &[u8]) -> Result<([u8; NONCE_SIZE], &[u8]), CodecError> {
    if data.len() < HEADER_SIZE {
        return Err(CodecError::InvalidCiphertext(format!(
            "{} bytes is shorter than the {} byte header",
            data.len(),
            HEADER_SIZE
        )));
    }

    let (magic, rest) = data.split_at(MAGIC.len());
    if magic != MAGIC {
        return Err(CodecError::InvalidCiphertext("missing SGGCM magic".to_string()));
    }

    let (version, rest) = rest.split_at(VERSION.len());
    if version[0] != VERSION[0] {
        return Err(CodecError::UnsupportedVersion {
            major: version[0],
            minor: version[1],
        });
    }

    let (nonce_bytes, rest) = rest.split_at(NONCE_SIZE);
    let mut nonce = [0u8; NONCE_SIZE];
    nonce.copy_from_slice(nonce_bytes);

    let (len_bytes, ciphertext) = rest.split_at(8);
    let mut len_buf = [0u8; 8];
    len_buf.copy_from_slice(len_bytes);
    let declared = u64::from_le_bytes(len_buf);

    if declared != ciphertext.len() as u64 {
        return Err(CodecError::InvalidCiphertext(format!(
            "declared length {} does not match payload length {}",
            declared,
            ciphertext.len()
        )));
    }
    if ciphertext.len() < TAG_SIZE {
        return Err(CodecError::InvalidCiphertext("payload shorter than GCM tag".to_string()));
    }

    Ok((nonce, ciphertext))
}

/// Replace the contents of `path` atomically.
///
/// Writes to a temporary file in the same directory, then renames it over
/// the original. Existing permissions are carried over.
pub fn overwrite_file(path: &Path, data: &[u8]) -> Result<(), CodecError> {
    let dir = match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    };
    let permissions = std::fs::metadata(path).map(|m| m.permissions()).ok();

    let mut tmp = tempfile::NamedTempFile::new_in(dir).map_err(|e| CodecError::io(path, e))?;
    tmp.write_all(data).map_err(|e| CodecError::io(path, e))?;
    tmp.as_file().sync_all().map_err(|e| CodecError::io(path, e))?;
    if let Some(permissions) = permissions {
        tmp.as_file()
            .set_permissions(permissions)
            .map_err(|e| CodecError::io(path, e))?;
    }

    tmp.persist(path).map_err(|e| CodecError::io(path, e.error))?;
    Ok(())
}
