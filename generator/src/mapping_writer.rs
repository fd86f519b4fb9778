// Binary mapping artifact (.mrmap) encoding
//
// Layout, little-endian:
//   u8[4]  magic "MRMP"
//   u8     format version
//   u8     flags (bit 0: debug names present)
//   u16    size_count, then u8[size_count] sizes
//   u16    property_count, then node[property_count]
//
//   node := u8 tag (0 leaf, 1 interior)
//           leaf: u16 index | interior: u16 child_count
//           [debug names] u16 name_len, u8[name_len] utf-8
//           interior: node[child_count]

use crate::mapping::{MappingFile, MappingNode};
use std::fmt::{Display, Formatter};
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

pub const MAGIC: [u8; 4] = *b"MRMP";
pub const FORMAT_VERSION: u8 = 1;
pub const FLAG_DEBUG_NAMES: u8 = 0b0000_0001;
pub const TAG_LEAF: u8 = 0;
pub const TAG_INTERIOR: u8 = 1;
pub const MAPPING_EXTENSION: &str = "mrmap";

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct WriteOptions {
    /// Emit each node's debug name; nodes without one get an empty name.
    pub debug_names: bool,
}

#[derive(Debug)]
pub enum WriteError {
    Io(io::Error),
    TooLarge { what: &'static str, len: usize },
}

impl Display for WriteError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            WriteError::Io(e) => write!(f, "Failed to write mapping: {}", e),
            WriteError::TooLarge { what, len } => {
                write!(f, "Mapping {} has {} entries, more than {} can be encoded", what, len, u16::MAX)
            }
        }
    }
}

impl std::error::Error for WriteError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            WriteError::Io(e) => Some(e),
            WriteError::TooLarge { .. } => None,
        }
    }
}

impl From<io::Error> for WriteError {
    fn from(value: io::Error) -> Self {
        WriteError::Io(value)
    }
}

pub fn encode_mapping(mapping: &MappingFile, options: WriteOptions) -> Result<Vec<u8>, WriteError> {
    let mut out = Vec::with_capacity(10 + mapping.sizes.len() + mapping.properties.len() * 3);
    out.extend_from_slice(&MAGIC);
    out.push(FORMAT_VERSION);
    out.push(if options.debug_names { FLAG_DEBUG_NAMES } else { 0 });

    put_len(&mut out, mapping.sizes.len(), "size table")?;
    out.extend_from_slice(&mapping.sizes);

    put_len(&mut out, mapping.properties.len(), "property list")?;
    for node in &mapping.properties {
        encode_node(node, options, &mut out)?;
    }

    Ok(out)
}

fn encode_node(node: &MappingNode, options: WriteOptions, out: &mut Vec<u8>) -> Result<(), WriteError> {
    if node.is_leaf() {
        out.push(TAG_LEAF);
        out.extend_from_slice(&node.index.to_le_bytes());
    } else {
        out.push(TAG_INTERIOR);
        put_len(out, node.children.len(), "child list")?;
    }

    if options.debug_names {
        let name = node.name().as_bytes();
        put_len(out, name.len(), "debug name")?;
        out.extend_from_slice(name);
    }

    for child in &node.children {
        encode_node(child, options, out)?;
    }
    Ok(())
}

fn put_len(out: &mut Vec<u8>, len: usize, what: &'static str) -> Result<(), WriteError> {
    let value = u16::try_from(len).map_err(|_| WriteError::TooLarge { what, len })?;
    out.extend_from_slice(&value.to_le_bytes());
    Ok(())
}

/// Encode the whole artifact first, then replace `path` in one rename so a
/// failed write never leaves a partial mapping behind.
pub fn write_mapping(mapping: &MappingFile, path: &Path, options: WriteOptions) -> Result<(), WriteError> {
    let bytes = encode_mapping(mapping, options)?;

    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            fs::create_dir_all(parent)?;
        }
    }

    let tmp_path = temp_path(path);
    let result = fs::write(&tmp_path, &bytes).and_then(|_| fs::rename(&tmp_path, path));
    if let Err(e) = result {
        let _ = fs::remove_file(&tmp_path);
        return Err(WriteError::Io(e));
    }

    log::info!("wrote {} bytes to {}", bytes.len(), path.display());
    Ok(())
}

/// Default artifact path: the schema path with its extension replaced.
pub fn default_output_path(schema_path: &Path) -> PathBuf {
    schema_path.with_extension(MAPPING_EXTENSION)
}

fn temp_path(path: &Path) -> PathBuf {
    let mut name = path.file_name().map(|n| n.to_os_string()).unwrap_or_default();
    name.push(".tmp");
    path.with_file_name(name)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn outer() -> MappingFile {
        MappingFile {
            sizes: vec![2, 1],
            properties: vec![
                MappingNode::leaf(0, Some("y".to_string())),
                MappingNode::interior(1, Some("z".to_string()), vec![MappingNode::leaf(1, Some("x".to_string()))]),
            ],
        }
    }

    #[test]
    fn encodes_without_names() {
        let bytes = encode_mapping(&outer(), WriteOptions::default()).unwrap();
        let expected: Vec<u8> = vec![
            b'M', b'R', b'M', b'P', FORMAT_VERSION, 0, // header
            2, 0, 2, 1, // sizes
            2, 0, // property count
            TAG_LEAF, 0, 0, // y
            TAG_INTERIOR, 1, 0, // z
            TAG_LEAF, 1, 0, // z.x
        ];
        assert_eq!(bytes, expected);
    }

    #[test]
    fn encodes_debug_names() {
        let bytes = encode_mapping(&outer(), WriteOptions { debug_names: true }).unwrap();
        let expected: Vec<u8> = vec![
            b'M', b'R', b'M', b'P', FORMAT_VERSION, FLAG_DEBUG_NAMES,
            2, 0, 2, 1,
            2, 0,
            TAG_LEAF, 0, 0, 1, 0, b'y',
            TAG_INTERIOR, 1, 0, 1, 0, b'z',
            TAG_LEAF, 1, 0, 1, 0, b'x',
        ];
        assert_eq!(bytes, expected);
    }

    #[test]
    fn empty_mapping_is_header_and_counts() {
        let bytes = encode_mapping(&MappingFile::default(), WriteOptions::default()).unwrap();
        assert_eq!(bytes, vec![b'M', b'R', b'M', b'P', FORMAT_VERSION, 0, 0, 0, 0, 0]);
    }

    #[test]
    fn oversized_size_table_is_rejected() {
        let mapping = MappingFile {
            sizes: vec![1; usize::from(u16::MAX) + 1],
            properties: Vec::new(),
        };
        match encode_mapping(&mapping, WriteOptions::default()) {
            Err(WriteError::TooLarge { what, len }) => {
                assert_eq!(what, "size table");
                assert_eq!(len, 65536);
            }
            other => panic!("expected TooLarge, got {:?}", other),
        }
    }

    #[test]
    fn output_path_defaults() {
        assert_eq!(default_output_path(Path::new("types/game.mrtype")), PathBuf::from("types/game.mrmap"));
        assert_eq!(default_output_path(Path::new("game")), PathBuf::from("game.mrmap"));
        assert_eq!(temp_path(Path::new("out/game.mrmap")), PathBuf::from("out/game.mrmap.tmp"));
    }
}
