//! Raw-file persistence for the sensor's spatial map blob.
//!
//! The file holds exactly the exported bytes, no header, so a written map
//! reads back byte-exact. A zero-length file is always treated as corrupt,
//! never as "no map".

use crate::{Result, VitrackError};
use std::fs;
use std::path::Path;

/// Write a map blob to `path`, truncating any existing file.
pub fn write(path: impl AsRef<Path>, bytes: &[u8]) -> Result<()> {
    fs::write(path.as_ref(), bytes)?;
    Ok(())
}

/// Read a map blob from `path`. Fails with `EmptyMapFile` on zero bytes.
pub fn read(path: impl AsRef<Path>) -> Result<Vec<u8>> {
    let path = path.as_ref();
    let bytes = fs::read(path)?;
    if bytes.is_empty() {
        return Err(VitrackError::EmptyMapFile(path.display().to_string()));
    }
    Ok(bytes)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn round_trips_bytes_exactly() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("session.map");
        let blob: Vec<u8> = (0..=255).collect();
        write(&path, &blob).unwrap();
        assert_eq!(read(&path).unwrap(), blob);
    }

    #[test]
    fn empty_file_is_corrupt() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("empty.map");
        std::fs::File::create(&path).unwrap();
        match read(&path) {
            Err(VitrackError::EmptyMapFile(p)) => assert!(p.ends_with("empty.map")),
            other => panic!("expected EmptyMapFile, got {:?}", other),
        }
    }

    #[test]
    fn missing_file_is_io_error() {
        let dir = tempfile::tempdir().unwrap();
        match read(dir.path().join("nope.map")) {
            Err(VitrackError::Io(_)) => {}
            other => panic!("expected Io, got {:?}", other),
        }
    }

    #[test]
    fn unwritable_destination_is_io_error() {
        let dir = tempfile::tempdir().unwrap();
        // Writing to a directory path cannot open a file for writing.
        match write(dir.path(), b"blob") {
            Err(VitrackError::Io(_)) => {}
            other => panic!("expected Io, got {:?}", other),
        }
    }
}
