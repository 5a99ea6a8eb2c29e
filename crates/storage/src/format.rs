//! Checksummed binary frames for dump payloads and snapshot files
//!
//! # Format
//!
//! ```text
//! +------------------+
//! | Magic            | 4 bytes
//! | Format Version   | 2 bytes (u16 LE)
//! | Body Length      | 4 bytes (u32 LE)
//! | Body (bincode)   | variable
//! | CRC32            | 4 bytes (u32 LE, over all preceding bytes)
//! +------------------+
//! ```

use byteorder::{LittleEndian, ReadBytesExt, WriteBytesExt};
use std::fs::{self, File, OpenOptions};
use std::io::{Cursor, Write};
use std::path::Path;
use sugar_core::{Error, Result};
use tracing::debug;

use crate::value::{Entry, StoredValue};

/// Magic bytes of a single-key dump payload
pub const DUMP_MAGIC: [u8; 4] = *b"SGDV";

/// Magic bytes of a whole-store snapshot file
pub const SNAPSHOT_MAGIC: [u8; 4] = *b"SGSN";

/// Current format version
pub const FORMAT_VERSION: u16 = 1;

const HEADER_LEN: usize = 4 + 2 + 4;
const CRC_LEN: usize = 4;

fn frame(magic: [u8; 4], body: &[u8]) -> Result<Vec<u8>> {
    let body_len = u32::try_from(body.len())
        .map_err(|_| Error::Serialization("payload exceeds 4 GiB".to_string()))?;
    let mut bytes = Vec::with_capacity(HEADER_LEN + body.len() + CRC_LEN);
    bytes.extend_from_slice(&magic);
    bytes.write_u16::<LittleEndian>(FORMAT_VERSION)?;
    bytes.write_u32::<LittleEndian>(body_len)?;
    bytes.extend_from_slice(body);
    let crc = crc32fast::hash(&bytes);
    bytes.write_u32::<LittleEndian>(crc)?;
    Ok(bytes)
}

fn unframe(magic: [u8; 4], bytes: &[u8]) -> Result<&[u8]> {
    if bytes.len() < HEADER_LEN + CRC_LEN {
        return Err(Error::Serialization("payload too short".to_string()));
    }
    if bytes[0..4] != magic {
        return Err(Error::Serialization("invalid payload magic".to_string()));
    }

    let (data, trailer) = bytes.split_at(bytes.len() - CRC_LEN);
    let stored_crc = Cursor::new(trailer).read_u32::<LittleEndian>()?;
    let computed_crc = crc32fast::hash(data);
    if stored_crc != computed_crc {
        return Err(Error::Serialization(format!(
            "checksum mismatch: stored {:08x}, computed {:08x}",
            stored_crc, computed_crc
        )));
    }

    let mut header = Cursor::new(&data[4..HEADER_LEN]);
    let version = header.read_u16::<LittleEndian>()?;
    if version != FORMAT_VERSION {
        return Err(Error::Serialization(format!(
            "unsupported format version {}",
            version
        )));
    }
    let body_len = header.read_u32::<LittleEndian>()? as usize;
    let body = &data[HEADER_LEN..];
    if body.len() != body_len {
        return Err(Error::Serialization("payload length mismatch".to_string()));
    }
    Ok(body)
}

fn bincode_err(e: bincode::Error) -> Error {
    Error::Serialization(e.to_string())
}

/// Serialize one value into a dump payload
pub fn encode_dump(value: &StoredValue) -> Result<Vec<u8>> {
    let body = bincode::serialize(value).map_err(bincode_err)?;
    frame(DUMP_MAGIC, &body)
}

/// Parse a dump payload
pub fn decode_dump(bytes: &[u8]) -> Result<StoredValue> {
    let body = unframe(DUMP_MAGIC, bytes)?;
    bincode::deserialize(body).map_err(bincode_err)
}

/// Write every entry to `path` atomically (write, fsync, rename)
pub fn write_snapshot(path: &Path, entries: &[(String, Entry)]) -> Result<()> {
    let body = bincode::serialize(entries).map_err(bincode_err)?;
    let bytes = frame(SNAPSHOT_MAGIC, &body)?;

    let tmp = path.with_extension("tmp");
    {
        let mut file = OpenOptions::new()
            .create(true)
            .write(true)
            .truncate(true)
            .open(&tmp)?;
        file.write_all(&bytes)?;
        file.sync_all()?;
    }
    fs::rename(&tmp, path)?;
    debug!(
        target: "sugar::store",
        path = %path.display(),
        keys = entries.len(),
        "Snapshot written"
    );
    Ok(())
}

/// Read a snapshot written by `write_snapshot`
pub fn read_snapshot(path: &Path) -> Result<Vec<(String, Entry)>> {
    let bytes = {
        let mut file = File::open(path)?;
        let mut buf = Vec::new();
        std::io::Read::read_to_end(&mut file, &mut buf)?;
        buf
    };
    let body = unframe(SNAPSHOT_MAGIC, &bytes)?;
    bincode::deserialize(body).map_err(bincode_err)
}
