// FSB5 base header and container validation
//
// Base header layout (little-endian):
// - 0x00: "FSB5"
// - 0x04: version (0 or 1)
// - 0x08: subsong count
// - 0x0C: sample header region size
// - 0x10: name table size
// - 0x14: sample data size
// - 0x18: codec id
// - 0x1C: version 0 has an extra (always zero) field here
// - 0x20: flags (version 1 only)
// - base header ends at 0x40 (version 0) or 0x3C (version 1)

use crate::error::{ParseError, Result};
use crate::utils::io::ByteSource;

pub const FSB5_MAGIC: &[u8; 4] = b"FSB5";
pub const FSB5_EXTENSIONS: &[&str] = &["fsb"];

const BASE_HEADER_SIZE_V0: u32 = 0x40;
const BASE_HEADER_SIZE_V1: u32 = 0x3C;
const MIN_RECORD_SIZE: u32 = 0x08;

/// Parsed FSB5 base header
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ContainerHeader {
    pub version: u32,
    /// Declared subsong count; signed on disk, zero or negative is invalid
    pub total_subsongs: i32,
    pub sample_header_size: u32,
    pub name_table_size: u32,
    pub sample_data_size: u32,
    pub codec: u32,
    /// Absent in version 0, read as zero
    pub flags: u32,
    pub base_header_size: u32,
}

impl ContainerHeader {
    /// Validate extension, magic and version, then read the base header.
    /// The region sizes must add up to the source size exactly.
    pub fn read(source: &dyn ByteSource, check_extension: bool) -> Result<Self> {
        if check_extension && !source.check_extensions(FSB5_EXTENSIONS) {
            return Err(ParseError::FormatMismatch("FSB5"));
        }
        if !source.check_signature(0x00, FSB5_MAGIC) {
            return Err(ParseError::FormatMismatch("FSB5"));
        }

        let version = source.read_u32_le(0x04)?;
        let base_header_size = match version {
            0x00 => BASE_HEADER_SIZE_V0,
            0x01 => BASE_HEADER_SIZE_V1,
            other => return Err(ParseError::UnsupportedVersion(other)),
        };

        let header = ContainerHeader {
            version,
            total_subsongs: source.read_i32_le(0x08)?,
            sample_header_size: source.read_u32_le(0x0C)?,
            name_table_size: source.read_u32_le(0x10)?,
            sample_data_size: source.read_u32_le(0x14)?,
            codec: source.read_u32_le(0x18)?,
            flags: if version == 0x01 { source.read_u32_le(0x20)? } else { 0 },
            base_header_size,
        };

        let declared = header.base_header_size as u64
            + header.sample_header_size as u64
            + header.name_table_size as u64
            + header.sample_data_size as u64;
        if declared != source.size() {
            return Err(ParseError::malformed(format!(
                "region sizes {:#x} + {:#x} + {:#x} + {:#x} != file size {:#x}",
                header.base_header_size,
                header.sample_header_size,
                header.name_table_size,
                header.sample_data_size,
                source.size()
            )));
        }

        Ok(header)
    }

    /// Normalize a requested subsong index (0 means the first one)
    pub fn resolve_subsong(&self, requested: u32) -> Result<u32> {
        let target = requested.max(1);
        if self.total_subsongs <= 0 || target > self.total_subsongs as u32 {
            return Err(ParseError::SubsongOutOfRange {
                requested: target,
                total: self.total_subsongs,
            });
        }
        Ok(target)
    }

    /// Declared subsong count, checked against the sample header region.
    /// Every record takes at least two words, so a count the region can't
    /// hold is malformed.
    pub fn subsong_count(&self) -> Result<u32> {
        let total = u32::try_from(self.total_subsongs)
            .ok()
            .filter(|&n| n > 0)
            .ok_or(ParseError::SubsongOutOfRange { requested: 1, total: self.total_subsongs })?;
        if total > self.sample_header_size / MIN_RECORD_SIZE {
            return Err(ParseError::malformed(format!(
                "{} subsongs declared but sample headers hold at most {}",
                total,
                self.sample_header_size / MIN_RECORD_SIZE
            )));
        }
        Ok(total)
    }

    /// Start of the per-subsong header records
    pub fn sample_header_start(&self) -> u64 {
        self.base_header_size as u64
    }

    /// End of the per-subsong header records (start of the name table)
    pub fn sample_header_end(&self) -> u64 {
        self.sample_header_start() + self.sample_header_size as u64
    }

    pub fn name_table_start(&self) -> u64 {
        self.sample_header_end()
    }

    /// Start of the sample data region
    pub fn data_start(&self) -> u64 {
        self.name_table_start() + self.name_table_size as u64
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::utils::io::MemorySource;

    fn base_header(version: u32, subsongs: i32, sizes: (u32, u32, u32)) -> Vec<u8> {
        let base = if version == 0 { 0x40 } else { 0x3C };
        let mut buf = vec![0u8; base];
        buf[0..4].copy_from_slice(FSB5_MAGIC);
        buf[0x04..0x08].copy_from_slice(&version.to_le_bytes());
        buf[0x08..0x0C].copy_from_slice(&subsongs.to_le_bytes());
        buf[0x0C..0x10].copy_from_slice(&sizes.0.to_le_bytes());
        buf[0x10..0x14].copy_from_slice(&sizes.1.to_le_bytes());
        buf[0x14..0x18].copy_from_slice(&sizes.2.to_le_bytes());
        buf[0x18..0x1C].copy_from_slice(&2u32.to_le_bytes());
        buf[0x20..0x24].copy_from_slice(&0x01u32.to_le_bytes());
        buf.resize(base + (sizes.0 + sizes.1 + sizes.2) as usize, 0);
        buf
    }

    #[test]
    fn test_version_dependent_layout() {
        let v0 = ContainerHeader::read(&MemorySource::new("a.fsb", base_header(0, 1, (8, 0, 0x20))), true).unwrap();
        assert_eq!(v0.base_header_size, 0x40);
        // version 0 has no flags field even when the bytes are non-zero
        assert_eq!(v0.flags, 0);

        let v1 = ContainerHeader::read(&MemorySource::new("a.fsb", base_header(1, 1, (8, 0, 0x20))), true).unwrap();
        assert_eq!(v1.base_header_size, 0x3C);
        assert_eq!(v1.flags, 1);
        assert_eq!(v1.data_start(), 0x3C + 8);
    }

    #[test]
    fn test_rejections() {
        let good = base_header(1, 1, (8, 0, 0x20));

        let wrong_ext = MemorySource::new("a.wav", good.clone());
        assert!(matches!(ContainerHeader::read(&wrong_ext, true), Err(ParseError::FormatMismatch(_))));
        assert!(ContainerHeader::read(&wrong_ext, false).is_ok());

        let mut bad_magic = good.clone();
        bad_magic[3] = b'4';
        assert!(matches!(
            ContainerHeader::read(&MemorySource::new("a.fsb", bad_magic), true),
            Err(ParseError::FormatMismatch(_))
        ));

        let mut bad_version = good.clone();
        bad_version[4] = 2;
        assert!(matches!(
            ContainerHeader::read(&MemorySource::new("a.fsb", bad_version), true),
            Err(ParseError::UnsupportedVersion(2))
        ));

        let mut truncated = good;
        truncated.pop();
        assert!(matches!(
            ContainerHeader::read(&MemorySource::new("a.fsb", truncated), true),
            Err(ParseError::MalformedHeader(_))
        ));

        let tiny = MemorySource::new("a.fsb", b"FS".to_vec());
        assert!(matches!(ContainerHeader::read(&tiny, true), Err(ParseError::FormatMismatch(_))));
    }

    #[test]
    fn test_resolve_subsong() {
        let header = ContainerHeader::read(&MemorySource::new("a.fsb", base_header(1, 3, (8, 0, 0x20))), true).unwrap();
        assert_eq!(header.resolve_subsong(0).unwrap(), 1);
        assert_eq!(header.resolve_subsong(1).unwrap(), 1);
        assert_eq!(header.resolve_subsong(3).unwrap(), 3);
        assert!(matches!(
            header.resolve_subsong(4),
            Err(ParseError::SubsongOutOfRange { requested: 4, total: 3 })
        ));

        let empty = ContainerHeader { total_subsongs: 0, ..header.clone() };
        assert!(matches!(empty.resolve_subsong(0), Err(ParseError::SubsongOutOfRange { .. })));
        let negative = ContainerHeader { total_subsongs: -1, ..header };
        assert!(matches!(negative.resolve_subsong(1), Err(ParseError::SubsongOutOfRange { .. })));
    }

    #[test]
    fn test_subsong_count_bounded_by_header_region() {
        // one 8-byte record
        let header = ContainerHeader::read(&MemorySource::new("a.fsb", base_header(1, 1, (8, 0, 0x20))), true).unwrap();
        assert_eq!(header.subsong_count().unwrap(), 1);

        let huge = ContainerHeader { total_subsongs: 0x7FFF_FFFF, ..header.clone() };
        assert!(matches!(huge.subsong_count(), Err(ParseError::MalformedHeader(_))));
        let two = ContainerHeader { total_subsongs: 2, ..header.clone() };
        assert!(matches!(two.subsong_count(), Err(ParseError::MalformedHeader(_))));
        let empty = ContainerHeader { total_subsongs: 0, ..header };
        assert!(matches!(empty.subsong_count(), Err(ParseError::SubsongOutOfRange { .. })));
    }
}
