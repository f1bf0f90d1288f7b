//! On-disk form of an [`InvertedIndex`].
//!
//! `index.bin` layout: `[magic "PDFX"][format version u32 LE][bincode payload][CRC32 u32 LE]`.
//! The checksum covers the payload only. `meta.json` is a human-readable summary
//! and is never needed to answer queries.

use crate::error::IndexError;
use crate::extract::INDEX_DIR_NAME;
use crate::index::InvertedIndex;
use crate::weight::IdfVariant;
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs::{self, create_dir_all, File};
use std::io::{self, Read, Write};
use std::path::{Path, PathBuf};

const MAGIC: &[u8; 4] = b"PDFX";
pub const FORMAT_VERSION: u32 = 1;
const HEADER_LEN: usize = 8;
const FOOTER_LEN: usize = 4;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MetaFile {
    pub num_docs: u32,
    pub num_terms: usize,
    pub created_at: String,
    pub version: u32,
    pub idf: IdfVariant,
}

impl MetaFile {
    pub fn for_index(index: &InvertedIndex, created_at: impl Into<String>) -> Self {
        Self {
            num_docs: index.num_docs(),
            num_terms: index.num_terms(),
            created_at: created_at.into(),
            version: FORMAT_VERSION,
            idf: index.config().idf,
        }
    }
}

#[derive(Debug, Clone)]
pub struct IndexPaths {
    pub root: PathBuf,
}

impl IndexPaths {
    pub fn new<P: AsRef<Path>>(root: P) -> Self {
        Self { root: root.as_ref().to_path_buf() }
    }
    /// Index location for a PDF folder: `<folder>/.pdfsearch`.
    pub fn for_folder<P: AsRef<Path>>(folder: P) -> Self {
        Self::new(folder.as_ref().join(INDEX_DIR_NAME))
    }
    pub fn index(&self) -> PathBuf { self.root.join("index.bin") }
    pub fn meta(&self) -> PathBuf { self.root.join("meta.json") }
    fn index_tmp(&self) -> PathBuf { self.root.join("index.bin.tmp") }

    pub fn index_exists(&self) -> bool { self.index().is_file() }
}

/// Serialize an index into the versioned, checksummed byte format.
pub fn encode_index(index: &InvertedIndex) -> Result<Vec<u8>, IndexError> {
    let payload = bincode::serialize(index)
        .map_err(|e| io::Error::new(io::ErrorKind::InvalidData, e.to_string()))?;
    let crc = crc32fast::hash(&payload);

    let mut out = Vec::with_capacity(HEADER_LEN + payload.len() + FOOTER_LEN);
    out.extend_from_slice(MAGIC);
    out.extend_from_slice(&FORMAT_VERSION.to_le_bytes());
    out.extend_from_slice(&payload);
    out.extend_from_slice(&crc.to_le_bytes());
    Ok(out)
}

/// Inverse of [`encode_index`]. Anything that is not a well-formed index of the
/// current format version is reported as [`IndexError::CorruptIndex`].
pub fn decode_index(bytes: &[u8]) -> Result<InvertedIndex, IndexError> {
    decode_from(bytes, Path::new("<memory>"))
}

fn decode_from(bytes: &[u8], origin: &Path) -> Result<InvertedIndex, IndexError> {
    if bytes.len() < HEADER_LEN + FOOTER_LEN {
        return Err(IndexError::corrupt(origin, format!("truncated ({} bytes)", bytes.len())));
    }
    if &bytes[..4] != MAGIC {
        return Err(IndexError::corrupt(origin, "not an index file"));
    }
    let version = u32::from_le_bytes([bytes[4], bytes[5], bytes[6], bytes[7]]);
    if version != FORMAT_VERSION {
        return Err(IndexError::corrupt(
            origin,
            format!("format version {version}, expected {FORMAT_VERSION}"),
        ));
    }

    let (payload, footer) = bytes[HEADER_LEN..].split_at(bytes.len() - HEADER_LEN - FOOTER_LEN);
    let stored_crc = u32::from_le_bytes([footer[0], footer[1], footer[2], footer[3]]);
    let computed_crc = crc32fast::hash(payload);
    if stored_crc != computed_crc {
        return Err(IndexError::corrupt(
            origin,
            format!("checksum mismatch: stored {stored_crc:#010x}, computed {computed_crc:#010x}"),
        ));
    }

    let index: InvertedIndex = bincode::deserialize(payload)
        .map_err(|e| IndexError::corrupt(origin, format!("decode failed: {e}")))?;
    index.validate().map_err(|reason| IndexError::corrupt(origin, reason))?;
    Ok(index)
}

/// Write the index atomically: temp file, then rename over the previous one.
pub fn save_index(paths: &IndexPaths, index: &InvertedIndex) -> Result<(), IndexError> {
    let bytes = encode_index(index)?;
    create_dir_all(&paths.root)?;
    let tmp = paths.index_tmp();
    {
        let mut f = File::create(&tmp)?;
        f.write_all(&bytes)?;
        f.sync_all()?;
    }
    fs::rename(&tmp, paths.index())?;
    tracing::info!(path = %paths.index().display(), bytes = bytes.len(), num_docs = index.num_docs(), "saved index");
    Ok(())
}

pub fn load_index(paths: &IndexPaths) -> Result<InvertedIndex, IndexError> {
    let path = paths.index();
    let mut f = match File::open(&path) {
        Ok(f) => f,
        Err(e) if e.kind() == io::ErrorKind::NotFound => {
            return Err(IndexError::MissingIndex { path });
        }
        Err(e) => return Err(e.into()),
    };
    let mut buf = Vec::new();
    f.read_to_end(&mut buf)?;
    let index = decode_from(&buf, &path)?;
    tracing::info!(path = %path.display(), num_docs = index.num_docs(), num_terms = index.num_terms(), "loaded index");
    Ok(index)
}

/// Write the `meta.json` summary next to the index.
pub fn save_meta(paths: &IndexPaths, meta: &MetaFile) -> Result<()> {
    create_dir_all(&paths.root)?;
    fs::write(paths.meta(), serde_json::to_vec_pretty(meta)?)
        .with_context(|| format!("cannot write {}", paths.meta().display()))
}

pub fn load_meta(paths: &IndexPaths) -> Result<MetaFile> {
    let raw = fs::read(paths.meta()).with_context(|| format!("cannot read {}", paths.meta().display()))?;
    Ok(serde_json::from_slice(&raw)?)
}
