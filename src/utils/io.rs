// Random-access byte sources for container parsing
//
// Parsers never stream: every field is read at an absolute offset, so the
// trait only needs positioned reads plus a couple of fixed-width helpers.

use std::fs::File;
use std::io::{self, BufReader, Read, Seek, SeekFrom};
use std::path::Path;
use std::sync::Mutex;

/// Seekable source of container bytes
pub trait ByteSource {
    /// Fill `buf` from `offset`; short reads are `UnexpectedEof`
    fn read_at(&self, offset: u64, buf: &mut [u8]) -> io::Result<()>;

    /// Total size in bytes
    fn size(&self) -> u64;

    /// File name used for extension checks, if the source has one
    fn file_name(&self) -> Option<&str>;

    fn read_u8(&self, offset: u64) -> io::Result<u8> {
        let mut buffer = [0u8; 1];
        self.read_at(offset, &mut buffer)?;
        Ok(buffer[0])
    }

    /// Read little-endian 16-bit integer
    fn read_u16_le(&self, offset: u64) -> io::Result<u16> {
        let mut buffer = [0u8; 2];
        self.read_at(offset, &mut buffer)?;
        Ok(u16::from_le_bytes(buffer))
    }

    /// Read big-endian 16-bit integer
    fn read_u16_be(&self, offset: u64) -> io::Result<u16> {
        let mut buffer = [0u8; 2];
        self.read_at(offset, &mut buffer)?;
        Ok(u16::from_be_bytes(buffer))
    }

    fn read_i16_le(&self, offset: u64) -> io::Result<i16> {
        Ok(self.read_u16_le(offset)? as i16)
    }

    fn read_i16_be(&self, offset: u64) -> io::Result<i16> {
        Ok(self.read_u16_be(offset)? as i16)
    }

    /// Read little-endian 32-bit integer
    fn read_u32_le(&self, offset: u64) -> io::Result<u32> {
        let mut buffer = [0u8; 4];
        self.read_at(offset, &mut buffer)?;
        Ok(u32::from_le_bytes(buffer))
    }

    /// Read big-endian 32-bit integer
    fn read_u32_be(&self, offset: u64) -> io::Result<u32> {
        let mut buffer = [0u8; 4];
        self.read_at(offset, &mut buffer)?;
        Ok(u32::from_be_bytes(buffer))
    }

    fn read_i32_le(&self, offset: u64) -> io::Result<i32> {
        Ok(self.read_u32_le(offset)? as i32)
    }

    /// Read a nul-terminated string of at most `max_len` bytes.
    /// Stops early at end of source; the terminator is not included.
    fn read_c_string(&self, offset: u64, max_len: usize) -> io::Result<Vec<u8>> {
        let available = self.size().saturating_sub(offset).min(max_len as u64) as usize;
        let mut buffer = vec![0u8; available];
        self.read_at(offset, &mut buffer)?;
        let end = buffer.iter().position(|&b| b == 0).unwrap_or(buffer.len());
        buffer.truncate(end);
        Ok(buffer)
    }

    /// Lower-cased extension of the source's file name
    fn extension(&self) -> Option<String> {
        let name = self.file_name()?;
        Path::new(name)
            .extension()
            .and_then(|e| e.to_str())
            .map(|e| e.to_ascii_lowercase())
    }

    /// Case-insensitive extension membership check
    fn check_extensions(&self, accepted: &[&str]) -> bool {
        match self.extension() {
            Some(ext) => accepted.iter().any(|a| a.eq_ignore_ascii_case(&ext)),
            None => false,
        }
    }

    /// Check if the source has `signature` at `offset`
    fn check_signature(&self, offset: u64, signature: &[u8]) -> bool {
        let mut buffer = vec![0u8; signature.len()];
        self.read_at(offset, &mut buffer).is_ok() && buffer == signature
    }
}

fn eof(offset: u64, len: usize, size: u64) -> io::Error {
    io::Error::new(
        io::ErrorKind::UnexpectedEof,
        format!("read of {len} bytes at {offset:#x} past end ({size:#x})"),
    )
}

/// In-memory byte source
#[derive(Debug, Clone)]
pub struct MemorySource {
    name: Option<String>,
    data: Vec<u8>,
}

impl MemorySource {
    pub fn new(name: impl Into<String>, data: Vec<u8>) -> Self {
        MemorySource { name: Some(name.into()), data }
    }

    /// Source without a file name; extension checks always fail on it
    pub fn anonymous(data: Vec<u8>) -> Self {
        MemorySource { name: None, data }
    }
}

impl ByteSource for MemorySource {
    fn read_at(&self, offset: u64, buf: &mut [u8]) -> io::Result<()> {
        let size = self.data.len() as u64;
        let end = offset
            .checked_add(buf.len() as u64)
            .filter(|&end| end <= size)
            .ok_or_else(|| eof(offset, buf.len(), size))?;
        buf.copy_from_slice(&self.data[offset as usize..end as usize]);
        Ok(())
    }

    fn size(&self) -> u64 {
        self.data.len() as u64
    }

    fn file_name(&self) -> Option<&str> {
        self.name.as_deref()
    }
}

/// Buffered file source. The reader sits behind a mutex so one source can
/// be shared by threads opening different subsongs.
#[derive(Debug)]
pub struct FileSource {
    name: Option<String>,
    size: u64,
    reader: Mutex<BufReader<File>>,
}

impl FileSource {
    pub fn open(path: impl AsRef<Path>) -> io::Result<Self> {
        let path = path.as_ref();
        let file = File::open(path)?;
        let size = file.metadata()?.len();
        let name = path
            .file_name()
            .and_then(|n| n.to_str())
            .map(|n| n.to_string());

        Ok(FileSource {
            name,
            size,
            reader: Mutex::new(BufReader::new(file)),
        })
    }
}

impl ByteSource for FileSource {
    fn read_at(&self, offset: u64, buf: &mut [u8]) -> io::Result<()> {
        if offset.saturating_add(buf.len() as u64) > self.size {
            return Err(eof(offset, buf.len(), self.size));
        }
        let mut reader = self
            .reader
            .lock()
            .map_err(|_| io::Error::new(io::ErrorKind::Other, "file reader lock poisoned"))?;
        reader.seek(SeekFrom::Start(offset))?;
        reader.read_exact(buf)
    }

    fn size(&self) -> u64 {
        self.size
    }

    fn file_name(&self) -> Option<&str> {
        self.name.as_deref()
    }
}
