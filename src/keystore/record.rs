// Keystore container codec
//
// Layout:
//   magic "QKST" | version (2, LE)
//   then zero or more records: length (4, LE) | bincode(StoredRecord)
//
// Records are applied in order when loading, so a later record for an alias
// replaces an earlier one and the container can grow as an append-only log.

use log::debug;
use std::io::{ErrorKind, Read, Write};

use super::entry::{StoredEntry, StoredRecord};
use crate::error::{KeyStoreError, KeyStoreResult};

pub(crate) const CONTAINER_MAGIC: [u8; 4] = *b"QKST";
pub(crate) const CONTAINER_VERSION: u16 = 1;
pub(crate) const HEADER_LEN: usize = 6;

/// Largest record accepted when reading (16 MiB)
const MAX_RECORD_LEN: u32 = 16 << 20;

pub(crate) fn write_header<W: Write>(writer: &mut W) -> KeyStoreResult<()> {
    writer.write_all(&CONTAINER_MAGIC)?;
    writer.write_all(&CONTAINER_VERSION.to_le_bytes())?;
    Ok(())
}

pub(crate) fn write_record<W: Write>(writer: &mut W, record: &StoredRecord) -> KeyStoreResult<()> {
    let body = bincode::serialize(record)?;
    let len = u32::try_from(body.len())
        .ok()
        .filter(|len| *len <= MAX_RECORD_LEN)
        .ok_or_else(|| KeyStoreError::SerializationError(format!("record for {} is too large", record.alias)))?;
    writer.write_all(&len.to_le_bytes())?;
    writer.write_all(&body)?;
    Ok(())
}

fn read_header<R: Read>(reader: &mut R) -> KeyStoreResult<()> {
    let mut header = [0u8; HEADER_LEN];
    reader.read_exact(&mut header)?;
    if header[..4] != CONTAINER_MAGIC {
        return Err(KeyStoreError::SerializationError(
            "not a keystore container".to_string(),
        ));
    }
    let version = u16::from_le_bytes([header[4], header[5]]);
    if version != CONTAINER_VERSION {
        return Err(KeyStoreError::SerializationError(format!(
            "unsupported container version {}",
            version
        )));
    }
    Ok(())
}

/// Read the next record, or `None` at a clean end of stream
fn read_record<R: Read>(reader: &mut R) -> KeyStoreResult<Option<StoredRecord>> {
    let mut len_bytes = [0u8; 4];
    match reader.read_exact(&mut len_bytes) {
        Ok(()) => {}
        Err(e) if e.kind() == ErrorKind::UnexpectedEof => return Ok(None),
        Err(e) => return Err(e.into()),
    }
    let len = u32::from_le_bytes(len_bytes);
    if len > MAX_RECORD_LEN {
        return Err(KeyStoreError::SerializationError(format!(
            "record length {} exceeds limit",
            len
        )));
    }
    let mut body = vec![0u8; len as usize];
    reader.read_exact(&mut body)?;
    let record: StoredRecord = bincode::deserialize(&body)?;
    validate(&record)?;
    Ok(Some(record))
}

fn validate(record: &StoredRecord) -> KeyStoreResult<()> {
    if let StoredEntry::KeyPair {
        spec, public_key, chain, ..
    } = &record.entry
    {
        let leaf = chain.first().ok_or_else(|| {
            KeyStoreError::SerializationError(format!("key pair record {} has an empty chain", record.alias))
        })?;
        if leaf.key_pair().spec != *spec || leaf.key_pair().public_key != *public_key {
            return Err(KeyStoreError::SerializationError(format!(
                "key pair record {} is not certified by its leaf certificate",
                record.alias
            )));
        }
    }
    Ok(())
}

/// Read a whole container, returning its records in file order
pub(crate) fn read_container<R: Read>(reader: &mut R) -> KeyStoreResult<Vec<StoredRecord>> {
    read_header(reader)?;
    let mut records = Vec::new();
    while let Some(record) = read_record(reader)? {
        records.push(record);
    }
    debug!("Read {} keystore records", records.len());
    Ok(records)
}
