//! Bit-exact binary persistence: `[u64 size]` followed by `size` records of
//! `[37-byte NUL-padded UUID][u64 dimension][8*dimension bytes payload]`.
//!
//! The KD-tree is never persisted - [`VectorStore::from_records`] rebuilds
//! it from the loaded sequence, in file order, exactly as `load` is
//! specified to.

use std::io::{Read, Write};
use std::path::Path;

use byteorder::{LittleEndian, ReadBytesExt, WriteBytesExt};
use uuid::Uuid;

use crate::engine::store::VectorRecord;
use crate::errors::ServerError;

/// Canonical UUID strings are always exactly 36 bytes; one more byte for
/// the NUL terminator gives the on-disk field its fixed 37-byte width.
const UUID_FIELD_WIDTH: usize = 37;

pub fn save(path: impl AsRef<Path>, records: &[VectorRecord]) -> Result<(), ServerError> {
    let live: Vec<&VectorRecord> = records
        .iter()
        .filter(|record| {
            if record.payload.is_empty() {
                tracing::warn!(uuid = %record.uuid, "skipping degenerate record with empty payload during save");
                false
            } else {
                true
            }
        })
        .collect();

    let file = std::fs::File::create(path)?;
    let mut writer = std::io::BufWriter::new(file);

    writer.write_u64::<LittleEndian>(live.len() as u64)?;
    for record in live {
        write_uuid(&mut writer, &record.uuid)?;
        writer.write_u64::<LittleEndian>(record.payload.len() as u64)?;
        for value in &record.payload {
            writer.write_f64::<LittleEndian>(*value)?;
        }
    }
    writer.flush()?;
    Ok(())
}

fn write_uuid(writer: &mut impl Write, uuid: &Uuid) -> std::io::Result<()> {
    let text = uuid.hyphenated().to_string();
    debug_assert_eq!(text.len(), UUID_FIELD_WIDTH - 1);
    writer.write_all(text.as_bytes())?;
    writer.write_u8(0)
}

/// Loads a previously-saved file, checking every record's dimension
/// against `expected_dimension`. Any mismatch - wrong dimension, bad
/// UTF-8 in the UUID field, an unparsable UUID, or a truncated record -
/// is reported rather than returning a partially built store.
pub fn load(
    path: impl AsRef<Path>,
    expected_dimension: usize,
) -> Result<Vec<VectorRecord>, ServerError> {
    let file = std::fs::File::open(path)?;
    let mut reader = std::io::BufReader::new(file);

    let size = reader.read_u64::<LittleEndian>()?;
    let mut records = Vec::with_capacity(size as usize);
    for _ in 0..size {
        let uuid = read_uuid(&mut reader)?;
        let dimension = reader.read_u64::<LittleEndian>()? as usize;
        if dimension != expected_dimension {
            return Err(ServerError::InvalidPersistedFormat(format!(
                "record {uuid} has dimension {dimension}, expected {expected_dimension}"
            )));
        }
        let mut payload = Vec::with_capacity(dimension);
        for _ in 0..dimension {
            payload.push(reader.read_f64::<LittleEndian>()?);
        }
        records.push(VectorRecord { uuid, payload });
    }
    Ok(records)
}

fn read_uuid(reader: &mut impl Read) -> Result<Uuid, ServerError> {
    let mut buf = [0u8; UUID_FIELD_WIDTH];
    reader.read_exact(&mut buf)?;
    let text = std::str::from_utf8(&buf[..UUID_FIELD_WIDTH - 1])
        .map_err(|e| ServerError::InvalidPersistedFormat(format!("uuid field is not UTF-8: {e}")))?;
    Uuid::parse_str(text)
        .map_err(|e| ServerError::InvalidPersistedFormat(format!("invalid uuid {text:?}: {e}")))
}
