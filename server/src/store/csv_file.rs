//! Blocking helpers for the CSV files behind both stores. Callers run these
//! inside `spawn_blocking`.

use std::fs::{File, OpenOptions};
use std::io::{self, Read, Seek, SeekFrom, Write};
use std::path::Path;

use serde::de::DeserializeOwned;
use serde::Serialize;

use crate::error::StoreError;

/// Read every record of a headed CSV file. `Ok(None)` when the file does not
/// exist, so callers can decide what a missing file means.
pub fn read_all<T: DeserializeOwned>(path: &Path) -> Result<Option<Vec<T>>, StoreError> {
    let file = match File::open(path) {
        Ok(f) => f,
        Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(None),
        Err(e) => return Err(e.into()),
    };
    let mut reader = csv::Reader::from_reader(file);
    let records = reader
        .deserialize()
        .collect::<Result<Vec<T>, csv::Error>>()?;
    Ok(Some(records))
}

/// Create a new file holding only the header row. Fails if it already exists.
pub fn create_with_header(path: &Path, header: &[&str]) -> Result<(), StoreError> {
    let mut file = OpenOptions::new().write(true).create_new(true).open(path)?;
    file.write_all(&encode_header(header)?)?;
    file.flush()?;
    Ok(())
}

/// Open `path` for appending, creating it when `create` is set.
pub fn open_for_append(path: &Path, create: bool) -> io::Result<File> {
    OpenOptions::new()
        .read(true)
        .append(true)
        .create(create)
        .open(path)
}

/// Append records to an open file in a single write. An empty file gets the
/// header first, and a file whose last line lacks a newline (hand edits) gets
/// one so the new record starts on its own line.
pub fn append<T: Serialize>(file: &mut File, header: &[&str], records: &[T]) -> Result<(), StoreError> {
    let len = file.metadata()?.len();
    let mut buf = if len == 0 {
        encode_header(header)?
    } else if last_byte(file, len)? != b'\n' {
        b"\n".to_vec()
    } else {
        Vec::new()
    };

    let mut writer = csv::WriterBuilder::new()
        .has_headers(false)
        .from_writer(Vec::new());
    for record in records {
        writer.serialize(record)?;
    }
    buf.extend(writer.into_inner().map_err(|e| e.into_error())?);

    file.write_all(&buf)?;
    file.flush()?;
    Ok(())
}

fn encode_header(header: &[&str]) -> Result<Vec<u8>, StoreError> {
    let mut writer = csv::Writer::from_writer(Vec::new());
    writer.write_record(header)?;
    Ok(writer.into_inner().map_err(|e| e.into_error())?)
}

fn last_byte(file: &mut File, len: u64) -> io::Result<u8> {
    let mut byte = [0u8; 1];
    file.seek(SeekFrom::Start(len - 1))?;
    file.read_exact(&mut byte)?;
    Ok(byte[0])
}
