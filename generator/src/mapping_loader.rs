// Binary mapping artifact (.mrmap) decoding, used by --view-mapping

use crate::mapping::{MAX_NESTING_DEPTH, MappingFile, MappingNode};
use crate::mapping_writer::{FLAG_DEBUG_NAMES, FORMAT_VERSION, MAGIC, TAG_INTERIOR, TAG_LEAF};
use std::fmt::{Display, Formatter};
use std::fs;
use std::io;
use std::path::Path;

#[derive(Debug, PartialEq, Eq, Clone)]
pub enum InvalidFormat {
    BadMagic,
    UnsupportedVersion(u8),
    UnrecognizedTag(u8),
    EndOfFile,
    TrailingBytes(usize),
    Utf8Error(std::str::Utf8Error),
    IndexOutOfRange { index: u16, len: usize },
    EmptyInterior,
    TooDeep,
}

#[derive(Debug)]
pub enum ReadError {
    Io(io::Error),
    InvalidFormat(InvalidFormat),
}

impl Display for ReadError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            ReadError::Io(e) => write!(f, "Failed to read mapping: {}", e),
            ReadError::InvalidFormat(invalid_format) => {
                f.write_str("Invalid mapping: ")?;
                match invalid_format {
                    InvalidFormat::BadMagic => f.write_str("missing MRMP header"),
                    InvalidFormat::UnsupportedVersion(v) => write!(f, "unsupported format version {}", v),
                    InvalidFormat::UnrecognizedTag(t) => write!(f, "unrecognized node tag {}", t),
                    InvalidFormat::EndOfFile => f.write_str("attempted to read beyond the end of the file"),
                    InvalidFormat::TrailingBytes(n) => write!(f, "{} unexpected bytes after the property tree", n),
                    InvalidFormat::Utf8Error(inner) => Display::fmt(inner, f),
                    InvalidFormat::IndexOutOfRange { index, len } => {
                        write!(f, "leaf index {} outside size table of {} entries", index, len)
                    }
                    InvalidFormat::EmptyInterior => f.write_str("interior node without children"),
                    InvalidFormat::TooDeep => {
                        write!(f, "property tree nests deeper than {} levels", MAX_NESTING_DEPTH)
                    }
                }
            }
        }
    }
}

impl std::error::Error for ReadError {}

impl From<io::Error> for ReadError {
    fn from(value: io::Error) -> Self {
        ReadError::Io(value)
    }
}

impl From<InvalidFormat> for ReadError {
    fn from(value: InvalidFormat) -> Self {
        ReadError::InvalidFormat(value)
    }
}

pub fn load_mapping(path: &Path) -> Result<MappingFile, ReadError> {
    let bytes = fs::read(path)?;
    log::debug!("loaded mapping {} ({} bytes)", path.display(), bytes.len());
    decode_mapping(&bytes)
}

pub fn decode_mapping(bytes: &[u8]) -> Result<MappingFile, ReadError> {
    let mut cursor = Cursor { bytes, pos: 0 };

    if cursor.take(MAGIC.len())? != MAGIC {
        return Err(InvalidFormat::BadMagic.into());
    }
    let version = cursor.u8()?;
    if version != FORMAT_VERSION {
        return Err(InvalidFormat::UnsupportedVersion(version).into());
    }
    let debug_names = cursor.u8()? & FLAG_DEBUG_NAMES != 0;

    let size_count = usize::from(cursor.u16()?);
    let sizes = cursor.take(size_count)?.to_vec();

    let property_count = cursor.u16()?;
    let mut properties = Vec::with_capacity(usize::from(property_count));
    for _ in 0..property_count {
        properties.push(cursor.node(debug_names, sizes.len(), 0)?);
    }

    let remaining = bytes.len() - cursor.pos;
    if remaining != 0 {
        return Err(InvalidFormat::TrailingBytes(remaining).into());
    }

    Ok(MappingFile { sizes, properties })
}

struct Cursor<'a> {
    bytes: &'a [u8],
    pos: usize,
}

impl<'a> Cursor<'a> {
    fn take(&mut self, len: usize) -> Result<&'a [u8], InvalidFormat> {
        let end = self.pos.checked_add(len).ok_or(InvalidFormat::EndOfFile)?;
        let slice = self.bytes.get(self.pos..end).ok_or(InvalidFormat::EndOfFile)?;
        self.pos = end;
        Ok(slice)
    }

    fn u8(&mut self) -> Result<u8, InvalidFormat> {
        Ok(self.take(1)?[0])
    }

    fn u16(&mut self) -> Result<u16, InvalidFormat> {
        let raw = self.take(2)?;
        Ok(u16::from_le_bytes([raw[0], raw[1]]))
    }

    // `depth` counts interior ancestors; bounded so crafted input can't exhaust the stack
    fn node(&mut self, debug_names: bool, size_count: usize, depth: usize) -> Result<MappingNode, InvalidFormat> {
        let tag = self.u8()?;
        let (index, child_count) = match tag {
            TAG_LEAF => {
                let index = self.u16()?;
                if usize::from(index) >= size_count {
                    return Err(InvalidFormat::IndexOutOfRange { index, len: size_count });
                }
                (index, 0)
            }
            TAG_INTERIOR => {
                let child_count = self.u16()?;
                if child_count == 0 {
                    return Err(InvalidFormat::EmptyInterior);
                }
                if depth >= MAX_NESTING_DEPTH {
                    return Err(InvalidFormat::TooDeep);
                }
                (0, child_count)
            }
            other => return Err(InvalidFormat::UnrecognizedTag(other)),
        };

        let debug_name = if debug_names {
            let len = usize::from(self.u16()?);
            let raw = self.take(len)?;
            Some(std::str::from_utf8(raw).map_err(InvalidFormat::Utf8Error)?.to_string())
        } else {
            None
        };

        let mut children = Vec::with_capacity(usize::from(child_count));
        for _ in 0..child_count {
            children.push(self.node(debug_names, size_count, depth + 1)?);
        }

        // Interior indices aren't stored; they are the first descendant leaf
        let index = children.first().map_or(index, |first| first.index);
        Ok(MappingNode {
            index,
            debug_name,
            children,
        })
    }
}
