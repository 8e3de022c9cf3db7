//! On-disk layout for [`FlatIndex`].
//!
//! Two co-located artifacts inside a generation directory:
//!
//! - `gen-<n>/vectors.bin`: a fixed header (magic, format version, dimension, row count)
//!   followed by little-endian `f32` rows.
//! - `gen-<n>/labels.rkyv`: the label table archived with `rkyv`.
//!
//! `CURRENT` names the committed generation. A save writes and syncs both artifacts into a fresh
//! generation, then replaces `CURRENT` with a single rename, so readers see either the old pair
//! or the new pair. A directory without `CURRENT`, or whose current generation lacks either
//! artifact, has no index yet.

use std::fs::{self, File};
use std::io::Write;
use std::path::{Path, PathBuf};

use memmap2::Mmap;
use rkyv::rancor::Error as RkyvError;
use rkyv::{Archive, Deserialize, Serialize};
use tracing::{debug, info, warn};

use super::error::{IndexError, IndexResult};
use super::flat::FlatIndex;

pub const VECTORS_FILENAME: &str = "vectors.bin";
pub const LABELS_FILENAME: &str = "labels.rkyv";
/// Pointer file naming the committed generation directory.
pub const CURRENT_FILENAME: &str = "CURRENT";

const GENERATION_PREFIX: &str = "gen-";

const TEMP_SUFFIX: &str = "tmp";

const VECTORS_MAGIC: [u8; 4] = *b"FNLV";
const VECTORS_VERSION: u32 = 1;
/// magic (4) + version (4) + dimension (4) + count (8).
pub const VECTORS_HEADER_LEN: usize = 20;

#[derive(Archive, Deserialize, Serialize, Debug, PartialEq, Clone)]
/// Archived label table stored next to the vector file.
pub struct LabelTable {
    /// Dimension the vectors were written with.
    pub dimension: u32,
    /// Labels in position order.
    pub labels: Vec<String>,
}

fn temp_path(path: &Path) -> PathBuf {
    let mut name = path.file_name().map(|n| n.to_os_string()).unwrap_or_default();
    name.push(".");
    name.push(TEMP_SUFFIX);
    path.with_file_name(name)
}

fn write_synced(path: &Path, bytes: &[u8]) -> IndexResult<()> {
    let mut file = File::create(path).map_err(|e| IndexError::io(path, e))?;
    file.write_all(bytes).map_err(|e| IndexError::io(path, e))?;
    file.sync_all().map_err(|e| IndexError::io(path, e))?;
    Ok(())
}

fn write_atomic(path: &Path, bytes: &[u8]) -> IndexResult<()> {
    let tmp = temp_path(path);
    write_synced(&tmp, bytes)?;
    fs::rename(&tmp, path).map_err(|e| IndexError::io(path, e))?;
    Ok(())
}

#[cfg(unix)]
fn sync_dir(dir: &Path) -> IndexResult<()> {
    File::open(dir)
        .and_then(|d| d.sync_all())
        .map_err(|e| IndexError::io(dir, e))
}

#[cfg(not(unix))]
fn sync_dir(_dir: &Path) -> IndexResult<()> {
    Ok(())
}

pub(crate) fn generation_name(generation: u64) -> String {
    format!("{}{:08}", GENERATION_PREFIX, generation)
}

fn parse_generation(name: &str) -> Option<u64> {
    name.strip_prefix(GENERATION_PREFIX)?.parse().ok()
}

/// Committed generation number, or `None` when nothing was ever committed.
fn read_current(dir: &Path) -> IndexResult<Option<u64>> {
    let path = dir.join(CURRENT_FILENAME);
    let contents = match fs::read_to_string(&path) {
        Ok(contents) => contents,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
        Err(e) => return Err(IndexError::io(&path, e)),
    };
    parse_generation(contents.trim())
        .map(Some)
        .ok_or_else(|| IndexError::Corrupt {
            path,
            reason: format!("unrecognised generation pointer {:?}", contents.trim()),
        })
}

/// Directory holding the committed artifacts of the index persisted in `dir`, if any.
pub fn current_generation_dir(dir: &Path) -> IndexResult<Option<PathBuf>> {
    Ok(read_current(dir)?.map(|generation| dir.join(generation_name(generation))))
}

/// Removes generation directories other than `keep`. Failures only leave garbage behind.
fn prune_generations(dir: &Path, keep: &str) {
    let entries = match fs::read_dir(dir) {
        Ok(entries) => entries,
        Err(e) => {
            warn!(dir = %dir.display(), error = %e, "Could not list index directory for pruning");
            return;
        }
    };
    for entry in entries.flatten() {
        let name = entry.file_name();
        let Some(name) = name.to_str() else { continue };
        if name == keep || parse_generation(name).is_none() {
            continue;
        }
        if let Err(e) = fs::remove_dir_all(entry.path()) {
            warn!(path = %entry.path().display(), error = %e, "Failed to remove stale index generation");
        }
    }
}

fn map_file(path: &Path) -> IndexResult<Mmap> {
    let file = File::open(path).map_err(|e| IndexError::io(path, e))?;
    let len = file.metadata().map_err(|e| IndexError::io(path, e))?.len();
    if len == 0 {
        return Err(IndexError::Corrupt {
            path: path.to_path_buf(),
            reason: "file is empty".to_string(),
        });
    }

    // SAFETY: The file is opened read-only and index artifacts are only replaced by rename,
    // so the mapped inode is never truncated underneath us.
    let mmap = unsafe { Mmap::map(&file) }.map_err(|e| IndexError::io(path, e))?;
    Ok(mmap)
}

fn encode_vectors(dimension: usize, count: usize, vectors: &[f32]) -> IndexResult<Vec<u8>> {
    let dim = u32::try_from(dimension).map_err(|_| IndexError::Config {
        reason: format!("dimension {} does not fit the vector file header", dimension),
    })?;

    let mut out = Vec::with_capacity(VECTORS_HEADER_LEN + vectors.len() * 4);
    out.extend_from_slice(&VECTORS_MAGIC);
    out.extend_from_slice(&VECTORS_VERSION.to_le_bytes());
    out.extend_from_slice(&dim.to_le_bytes());
    out.extend_from_slice(&(count as u64).to_le_bytes());
    for value in vectors {
        out.extend_from_slice(&value.to_le_bytes());
    }
    Ok(out)
}

fn read_u32(bytes: &[u8], offset: usize) -> u32 {
    let mut buf = [0u8; 4];
    buf.copy_from_slice(&bytes[offset..offset + 4]);
    u32::from_le_bytes(buf)
}

fn read_u64(bytes: &[u8], offset: usize) -> u64 {
    let mut buf = [0u8; 8];
    buf.copy_from_slice(&bytes[offset..offset + 8]);
    u64::from_le_bytes(buf)
}

fn decode_vectors(path: &Path, bytes: &[u8], dimension: usize) -> IndexResult<(usize, Vec<f32>)> {
    let corrupt = |reason: String| IndexError::Corrupt {
        path: path.to_path_buf(),
        reason,
    };

    if bytes.len() < VECTORS_HEADER_LEN {
        return Err(corrupt(format!(
            "header truncated: {} of {} bytes",
            bytes.len(),
            VECTORS_HEADER_LEN
        )));
    }
    if bytes[..4] != VECTORS_MAGIC {
        return Err(corrupt("bad magic".to_string()));
    }

    let version = read_u32(bytes, 4);
    if version != VECTORS_VERSION {
        return Err(corrupt(format!("unsupported format version {}", version)));
    }

    let stored_dim = read_u32(bytes, 8) as usize;
    if stored_dim != dimension {
        return Err(IndexError::DimensionMismatch {
            expected: dimension,
            actual: stored_dim,
        });
    }

    let count = usize::try_from(read_u64(bytes, 12))
        .map_err(|_| corrupt("row count overflows usize".to_string()))?;
    let body = &bytes[VECTORS_HEADER_LEN..];
    let expected_len = count
        .checked_mul(dimension)
        .and_then(|n| n.checked_mul(4))
        .ok_or_else(|| corrupt("row count overflows usize".to_string()))?;
    if body.len() != expected_len {
        return Err(corrupt(format!(
            "expected {} body bytes for {} rows, found {}",
            expected_len,
            count,
            body.len()
        )));
    }

    let mut vectors = vec![0f32; count * dimension];
    bytemuck::cast_slice_mut::<f32, u8>(&mut vectors).copy_from_slice(body);
    if cfg!(target_endian = "big") {
        for value in vectors.iter_mut() {
            *value = f32::from_bits(u32::from_le(value.to_bits()));
        }
    }

    Ok((count, vectors))
}

impl FlatIndex {
    /// Commits both artifacts into `dir` as a new generation, creating `dir` if needed.
    pub fn save(&self, dir: &Path) -> IndexResult<()> {
        fs::create_dir_all(dir).map_err(|e| IndexError::io(dir, e))?;

        let vector_bytes = encode_vectors(self.dimension(), self.size(), self.raw_vectors())?;

        let table = LabelTable {
            dimension: self.dimension() as u32,
            labels: self.labels().to_vec(),
        };
        let label_bytes = rkyv::to_bytes::<RkyvError>(&table)
            .map_err(|e| IndexError::Serialization(format!("{:?}", e)))?;

        let generation = read_current(dir)?.map_or(1, |current| current + 1);
        let name = generation_name(generation);
        let gen_dir = dir.join(&name);

        // Leftover from a save that never committed.
        if gen_dir.exists() {
            fs::remove_dir_all(&gen_dir).map_err(|e| IndexError::io(&gen_dir, e))?;
        }
        fs::create_dir(&gen_dir).map_err(|e| IndexError::io(&gen_dir, e))?;

        write_synced(&gen_dir.join(VECTORS_FILENAME), &vector_bytes)?;
        write_synced(&gen_dir.join(LABELS_FILENAME), &label_bytes)?;
        sync_dir(&gen_dir)?;

        write_atomic(&dir.join(CURRENT_FILENAME), name.as_bytes())?;
        sync_dir(dir)?;

        prune_generations(dir, &name);

        info!(
            dir = %dir.display(),
            generation,
            entries = self.size(),
            dimension = self.dimension(),
            "Index saved"
        );
        Ok(())
    }

    /// Loads the committed index in `dir`, or returns an empty index when there is none.
    pub fn load(dir: &Path, dimension: usize) -> IndexResult<Self> {
        let Some(gen_dir) = current_generation_dir(dir)? else {
            debug!(dir = %dir.display(), "No persisted index; starting empty");
            return Self::new(dimension);
        };

        let vectors_path = gen_dir.join(VECTORS_FILENAME);
        let labels_path = gen_dir.join(LABELS_FILENAME);

        if !vectors_path.exists() || !labels_path.exists() {
            debug!(dir = %gen_dir.display(), "Current generation incomplete; starting empty");
            return Self::new(dimension);
        }

        let vector_map = map_file(&vectors_path)?;
        let (count, vectors) = decode_vectors(&vectors_path, &vector_map, dimension)?;

        let label_map = map_file(&labels_path)?;
        let table = rkyv::from_bytes::<LabelTable, RkyvError>(&label_map).map_err(|e| {
            IndexError::Corrupt {
                path: labels_path.clone(),
                reason: format!("label table failed validation: {:?}", e),
            }
        })?;

        if table.labels.len() != count {
            return Err(IndexError::Corrupt {
                path: labels_path,
                reason: format!(
                    "{} labels for {} vectors",
                    table.labels.len(),
                    count
                ),
            });
        }

        let index = Self::from_parts(dimension, vectors, table.labels)?;
        info!(
            dir = %gen_dir.display(),
            entries = index.size(),
            dimension,
            "Index loaded"
        );
        Ok(index)
    }
}
