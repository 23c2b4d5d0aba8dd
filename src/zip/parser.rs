//! ZIP archive reader over an in-memory buffer.
//!
//! ## Parsing Strategy
//!
//! ZIP files are designed to be read from the end:
//! 1. Find the End of Central Directory (EOCD) at the buffer's end
//! 2. Read the Central Directory to get metadata for all files
//! 3. For extraction, read each file's Local File Header and data
//!
//! Only what [`ArchiveBuilder`](super::ArchiveBuilder) produces needs to be
//! understood here: single-disk, non-ZIP64, STORED or DEFLATE.

use byteorder::{LittleEndian, ReadBytesExt};
use crc32fast::Hasher as Crc32;
use flate2::read::DeflateDecoder;
use std::io::{Cursor, Read};

use super::ArchiveError;
use super::structures::*;

/// Maximum ZIP comment size allowed by the format (65535 bytes).
///
/// This limits the search area when looking for EOCD with a comment.
const MAX_COMMENT_SIZE: usize = 65535;

/// Read-only view of a ZIP archive held in memory.
pub struct ArchiveReader<'a> {
    data: &'a [u8],
}

impl<'a> ArchiveReader<'a> {
    pub fn new(data: &'a [u8]) -> Self {
        Self { data }
    }

    /// Find and parse the End of Central Directory record.
    ///
    /// Returns the record and its offset in the buffer.
    pub fn find_eocd(&self) -> Result<(EndOfCentralDirectory, usize), ArchiveError> {
        let size = self.data.len();
        if size < EndOfCentralDirectory::SIZE {
            return Err(ArchiveError::Invalid("not a ZIP archive"));
        }

        // Common case: no archive comment, EOCD is the last 22 bytes.
        let offset = size - EndOfCentralDirectory::SIZE;
        let tail = &self.data[offset..];
        if &tail[0..4] == EndOfCentralDirectory::SIGNATURE && tail[20..22] == [0, 0] {
            return Ok((EndOfCentralDirectory::from_bytes(tail)?, offset));
        }

        // Otherwise search backwards through the area a comment could cover.
        let search_start = size.saturating_sub(MAX_COMMENT_SIZE + EndOfCentralDirectory::SIZE);
        for i in (search_start..=offset).rev() {
            if &self.data[i..i + 4] == EndOfCentralDirectory::SIGNATURE {
                let comment_len = u16::from_le_bytes([self.data[i + 20], self.data[i + 21]]) as usize;
                if comment_len == size - i - EndOfCentralDirectory::SIZE {
                    let eocd = EndOfCentralDirectory::from_bytes(&self.data[i..])?;
                    return Ok((eocd, i));
                }
            }
        }

        Err(ArchiveError::Invalid("not a ZIP archive"))
    }

    /// List all entries from the Central Directory, in directory order.
    pub fn list_files(&self) -> Result<Vec<ZipFileEntry>, ArchiveError> {
        let (eocd, eocd_offset) = self.find_eocd()?;
        if !eocd.is_single_disk() {
            return Err(ArchiveError::Invalid("multi-disk archives are not supported"));
        }

        let cd_offset = eocd.cd_offset as usize;
        let cd_end = cd_offset + eocd.cd_size as usize;
        if cd_end > eocd_offset {
            return Err(ArchiveError::Invalid("central directory out of bounds"));
        }

        let mut cursor = Cursor::new(&self.data[cd_offset..cd_end]);
        let mut entries = Vec::with_capacity(eocd.total_entries as usize);
        for _ in 0..eocd.total_entries {
            entries.push(parse_cdfh(&mut cursor)?);
        }

        Ok(entries)
    }

    /// Offset where an entry's data begins, read from its Local File Header.
    pub fn data_offset(&self, entry: &ZipFileEntry) -> Result<usize, ArchiveError> {
        let lfh_offset = entry.lfh_offset as usize;
        let lfh = self
            .data
            .get(lfh_offset..lfh_offset + LFH_SIZE)
            .ok_or(ArchiveError::Invalid("local file header out of bounds"))?;

        if &lfh[0..4] != LFH_SIGNATURE {
            return Err(ArchiveError::Invalid("bad local file header"));
        }

        let mut cursor = Cursor::new(&lfh[26..]);
        let file_name_length = cursor.read_u16::<LittleEndian>()? as usize;
        let extra_field_length = cursor.read_u16::<LittleEndian>()? as usize;

        Ok(lfh_offset + LFH_SIZE + file_name_length + extra_field_length)
    }

    /// Decompress an entry and verify its CRC-32.
    pub fn read(&self, entry: &ZipFileEntry) -> Result<Vec<u8>, ArchiveError> {
        let start = self.data_offset(entry)?;
        let raw = self
            .data
            .get(start..start + entry.compressed_size as usize)
            .ok_or(ArchiveError::Invalid("entry data out of bounds"))?;

        let data = match entry.compression_method {
            CompressionMethod::Stored => raw.to_vec(),
            CompressionMethod::Deflate => {
                let mut out = Vec::with_capacity(entry.uncompressed_size as usize);
                DeflateDecoder::new(raw).read_to_end(&mut out)?;
                out
            }
            CompressionMethod::Unknown(m) => return Err(ArchiveError::UnsupportedCompression(m)),
        };

        let mut crc = Crc32::new();
        crc.update(&data);
        if crc.finalize() != entry.crc32 || data.len() as u64 != entry.uncompressed_size {
            return Err(ArchiveError::Corrupt(entry.file_name.clone()));
        }

        Ok(data)
    }
}

/// Parse one Central Directory File Header.
fn parse_cdfh(cursor: &mut Cursor<&[u8]>) -> Result<ZipFileEntry, ArchiveError> {
    let mut sig = [0u8; 4];
    cursor.read_exact(&mut sig)?;
    if sig != CDFH_SIGNATURE {
        return Err(ArchiveError::Invalid("bad central directory file header"));
    }

    let _version_made_by = cursor.read_u16::<LittleEndian>()?;
    let _version_needed = cursor.read_u16::<LittleEndian>()?;
    let _flags = cursor.read_u16::<LittleEndian>()?;
    let compression_method = cursor.read_u16::<LittleEndian>()?;
    let last_mod_time = cursor.read_u16::<LittleEndian>()?;
    let last_mod_date = cursor.read_u16::<LittleEndian>()?;
    let crc32 = cursor.read_u32::<LittleEndian>()?;
    let compressed_size = cursor.read_u32::<LittleEndian>()? as u64;
    let uncompressed_size = cursor.read_u32::<LittleEndian>()? as u64;
    let file_name_length = cursor.read_u16::<LittleEndian>()?;
    let extra_field_length = cursor.read_u16::<LittleEndian>()?;
    let file_comment_length = cursor.read_u16::<LittleEndian>()?;
    let _disk_number_start = cursor.read_u16::<LittleEndian>()?;
    let _internal_attrs = cursor.read_u16::<LittleEndian>()?;
    let _external_attrs = cursor.read_u32::<LittleEndian>()?;
    let lfh_offset = cursor.read_u32::<LittleEndian>()? as u64;

    let mut file_name_bytes = vec![0u8; file_name_length as usize];
    cursor.read_exact(&mut file_name_bytes)?;
    let file_name = String::from_utf8_lossy(&file_name_bytes).to_string();
    let is_directory = file_name.ends_with('/');

    // Extra fields and comments carry nothing we use.
    cursor.set_position(
        cursor.position() + extra_field_length as u64 + file_comment_length as u64,
    );

    Ok(ZipFileEntry {
        file_name,
        compression_method: CompressionMethod::from_u16(compression_method),
        compressed_size,
        uncompressed_size,
        crc32,
        lfh_offset,
        last_mod_time,
        last_mod_date,
        is_directory,
    })
}
