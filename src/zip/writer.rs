//! In-memory ZIP archive builder.
//!
//! Entries are collected first and encoded in one pass by
//! [`ArchiveBuilder::generate`], so every header is written with its final
//! sizes and CRC. Layout of the produced archive:
//!
//! 1. For each entry: Local File Header, then the (possibly deflated) data
//! 2. Central Directory, one header per entry, in insertion order
//! 3. End of Central Directory record

use crc32fast::Hasher as Crc32;
use flate2::Compression;
use flate2::write::DeflateEncoder;
use std::collections::HashSet;
use std::io::Write;

use super::ArchiveError;
use super::structures::*;

/// Largest entry count a non-ZIP64 EOCD can record.
const MAX_ENTRIES: usize = u16::MAX as usize;

/// Default DEFLATE level, the same trade-off `zip` and `gzip` default to.
pub const DEFAULT_LEVEL: u32 = 6;

struct PendingEntry {
    name: String,
    data: Vec<u8>,
}

/// Accumulates named entries and produces an [`ArchiveBlob`].
///
/// Names are unique within one builder; directories are names ending in `/`.
pub struct ArchiveBuilder {
    entries: Vec<PendingEntry>,
    names: HashSet<String>,
    method: CompressionMethod,
    level: u32,
    modified: DosDateTime,
}

impl ArchiveBuilder {
    /// Builder that deflates entries at the default level.
    pub fn new() -> Self {
        Self::with_method(CompressionMethod::Deflate, DEFAULT_LEVEL)
    }

    /// Builder using `method` for every file entry. `level` is ignored for
    /// [`CompressionMethod::Stored`].
    pub fn with_method(method: CompressionMethod, level: u32) -> Self {
        Self {
            entries: Vec::new(),
            names: HashSet::new(),
            method,
            level: level.min(9),
            modified: DosDateTime::now(),
        }
    }

    /// Override the modification time stamped on every entry.
    pub fn modified_at(mut self, modified: DosDateTime) -> Self {
        self.modified = modified;
        self
    }

    /// Add a directory entry. A trailing `/` is appended when missing.
    pub fn add_directory(&mut self, name: &str) -> Result<(), ArchiveError> {
        let name = if name.ends_with('/') {
            name.to_string()
        } else {
            format!("{}/", name)
        };
        self.push(name, Vec::new())
    }

    /// Add a file entry holding `data`.
    pub fn add_file(&mut self, name: &str, data: Vec<u8>) -> Result<(), ArchiveError> {
        if name.is_empty() || name.ends_with('/') {
            return Err(ArchiveError::InvalidName(name.to_string()));
        }
        if data.len() as u64 > u32::MAX as u64 {
            return Err(ArchiveError::EntryTooLarge {
                name: name.to_string(),
                size: data.len() as u64,
            });
        }
        self.push(name.to_string(), data)
    }

    fn push(&mut self, name: String, data: Vec<u8>) -> Result<(), ArchiveError> {
        if name.len() > u16::MAX as usize || name.starts_with('/') {
            return Err(ArchiveError::InvalidName(name));
        }
        if self.entries.len() >= MAX_ENTRIES {
            return Err(ArchiveError::TooManyEntries);
        }
        if !self.names.insert(name.clone()) {
            return Err(ArchiveError::DuplicateEntry(name));
        }
        self.entries.push(PendingEntry { name, data });
        Ok(())
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn contains(&self, name: &str) -> bool {
        self.names.contains(name)
    }

    /// Encode all entries into a finished archive, consuming the builder.
    pub fn generate(self) -> Result<ArchiveBlob, ArchiveError> {
        let mut out = Vec::new();
        let mut written = Vec::with_capacity(self.entries.len());

        for entry in self.entries {
            let is_directory = entry.name.ends_with('/');
            let uncompressed_size = entry.data.len() as u64;

            let mut crc = Crc32::new();
            crc.update(&entry.data);
            let crc32 = crc.finalize();

            let (method, payload) = if is_directory {
                (CompressionMethod::Stored, entry.data)
            } else {
                compress(self.method, self.level, entry.data)?
            };

            let header = ZipFileEntry {
                file_name: entry.name,
                compression_method: method,
                compressed_size: payload.len() as u64,
                uncompressed_size,
                crc32,
                lfh_offset: offset_u32(out.len())? as u64,
                last_mod_time: self.modified.time,
                last_mod_date: self.modified.date,
                is_directory,
            };

            header.write_local_header(&mut out)?;
            out.write_all(&payload)?;
            written.push(header);
        }

        let cd_offset = offset_u32(out.len())?;
        for header in &written {
            header.write_central_header(&mut out)?;
        }
        let cd_size = offset_u32(out.len())? - cd_offset;

        EndOfCentralDirectory::new(written.len() as u16, cd_size, cd_offset).write_to(&mut out)?;

        Ok(ArchiveBlob(out))
    }
}

impl Default for ArchiveBuilder {
    fn default() -> Self {
        Self::new()
    }
}

/// Offsets in a non-ZIP64 archive must fit in 32 bits.
fn offset_u32(offset: usize) -> Result<u32, ArchiveError> {
    u32::try_from(offset).map_err(|_| ArchiveError::ArchiveTooLarge)
}

/// Compress `data` with `method`, falling back to storing when deflating
/// does not make the entry smaller. Returns the method actually used.
fn compress(
    method: CompressionMethod,
    level: u32,
    data: Vec<u8>,
) -> Result<(CompressionMethod, Vec<u8>), ArchiveError> {
    match method {
        CompressionMethod::Stored => Ok((CompressionMethod::Stored, data)),
        CompressionMethod::Deflate => {
            let mut encoder = DeflateEncoder::new(Vec::new(), Compression::new(level));
            encoder.write_all(&data)?;
            let deflated = encoder.finish()?;
            if deflated.len() < data.len() {
                Ok((CompressionMethod::Deflate, deflated))
            } else {
                Ok((CompressionMethod::Stored, data))
            }
        }
        CompressionMethod::Unknown(m) => Err(ArchiveError::UnsupportedCompression(m)),
    }
}

/// A finished ZIP archive.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArchiveBlob(Vec<u8>);

impl ArchiveBlob {
    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn into_inner(self) -> Vec<u8> {
        self.0
    }
}

impl AsRef<[u8]> for ArchiveBlob {
    fn as_ref(&self) -> &[u8] {
        &self.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::zip::ArchiveReader;

    #[test]
    fn empty_folder_archive() {
        let mut builder = ArchiveBuilder::new();
        builder.add_directory("images").unwrap();
        let blob = builder.generate().unwrap();

        let reader = ArchiveReader::new(blob.as_bytes());
        let entries = reader.list_files().unwrap();
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].file_name, "images/");
        assert!(entries[0].is_directory);
    }

    #[test]
    fn archive_without_entries_is_just_eocd() {
        let blob = ArchiveBuilder::new().generate().unwrap();
        assert_eq!(blob.len(), EndOfCentralDirectory::SIZE);
        assert!(ArchiveReader::new(blob.as_bytes()).list_files().unwrap().is_empty());
    }

    #[test]
    fn compressible_data_is_deflated() {
        let data = b"abcd".repeat(4096);
        let mut builder = ArchiveBuilder::new();
        builder.add_file("images/image1.jpg", data.clone()).unwrap();
        let blob = builder.generate().unwrap();

        let reader = ArchiveReader::new(blob.as_bytes());
        let entries = reader.list_files().unwrap();
        assert_eq!(entries[0].compression_method, CompressionMethod::Deflate);
        assert!(entries[0].compressed_size < entries[0].uncompressed_size);
        assert_eq!(reader.read(&entries[0]).unwrap(), data);
    }

    #[test]
    fn incompressible_data_falls_back_to_stored() {
        // Short input: deflate overhead exceeds any saving.
        let data = vec![0x8f, 0x13, 0xa2];
        let mut builder = ArchiveBuilder::new();
        builder.add_file("a.bin", data.clone()).unwrap();
        let blob = builder.generate().unwrap();

        let reader = ArchiveReader::new(blob.as_bytes());
        let entries = reader.list_files().unwrap();
        assert_eq!(entries[0].compression_method, CompressionMethod::Stored);
        assert_eq!(reader.read(&entries[0]).unwrap(), data);
    }

    #[test]
    fn stored_method_never_deflates() {
        let data = vec![0u8; 10_000];
        let mut builder = ArchiveBuilder::with_method(CompressionMethod::Stored, 0);
        builder.add_file("zeros.bin", data).unwrap();
        let blob = builder.generate().unwrap();

        let entries = ArchiveReader::new(blob.as_bytes()).list_files().unwrap();
        assert_eq!(entries[0].compression_method, CompressionMethod::Stored);
        assert_eq!(entries[0].compressed_size, 10_000);
    }

    #[test]
    fn duplicate_names_are_rejected() {
        let mut builder = ArchiveBuilder::new();
        builder.add_file("images/image1.jpg", vec![1]).unwrap();
        let err = builder
            .add_file("images/image1.jpg", vec![2])
            .unwrap_err();
        assert!(matches!(err, ArchiveError::DuplicateEntry(name) if name == "images/image1.jpg"));
        assert_eq!(builder.len(), 1);
    }

    #[test]
    fn entries_keep_insertion_order_and_timestamp() {
        let modified = DosDateTime::from_datetime(
            &chrono::NaiveDate::from_ymd_opt(2023, 11, 14)
                .unwrap()
                .and_hms_opt(22, 13, 20)
                .unwrap(),
        );
        let mut builder = ArchiveBuilder::new().modified_at(modified);
        builder.add_directory("images/").unwrap();
        builder.add_file("images/image2.jpg", b"two".to_vec()).unwrap();
        builder.add_file("images/image1.jpg", b"one".to_vec()).unwrap();
        let blob = builder.generate().unwrap();

        let entries = ArchiveReader::new(blob.as_bytes()).list_files().unwrap();
        let names: Vec<_> = entries.iter().map(|e| e.file_name.as_str()).collect();
        assert_eq!(names, ["images/", "images/image2.jpg", "images/image1.jpg"]);
        assert!(entries.iter().all(|e| e.mod_date() == (2023, 11, 14)));
    }
}
