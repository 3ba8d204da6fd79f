use std::{
    io::{Read as _, Write as _},
    path::{Path, PathBuf},
    time::SystemTime,
};

use crate::{
    codec::ascache::FILE_EXTENSION,
    foundation::error::{GlyphcastError, GlyphcastResult},
};

/// Replace every character outside `[A-Za-z0-9_.-]` with `_`.
pub fn sanitize_video_id(video_id: &str) -> String {
    video_id
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || matches!(c, '_' | '.' | '-') {
                c
            } else {
                '_'
            }
        })
        .collect()
}

/// File name a video's cache is stored under.
pub fn cache_file_name(video_id: &str) -> String {
    format!("{}.{FILE_EXTENSION}", sanitize_video_id(video_id))
}

/// Size and modification time of a stored cache file.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct CacheFileStat {
    /// File size in bytes.
    pub size_bytes: u64,
    /// Last modification time, if the platform reports one.
    pub modified: Option<SystemTime>,
}

/// Storage backend for persisted cache files, addressed by file name.
pub trait CacheDirectory {
    /// `true` if `file_name` is present.
    fn exists(&self, file_name: &str) -> bool;

    /// Store `bytes` under `file_name`, replacing any previous file as a whole.
    ///
    /// Implementations must never leave a partially written file behind.
    fn write(&self, file_name: &str, bytes: &[u8]) -> GlyphcastResult<()>;

    /// Read the complete file.
    fn read(&self, file_name: &str) -> GlyphcastResult<Vec<u8>>;

    /// Read at most `len` bytes from the start of the file.
    fn read_prefix(&self, file_name: &str, len: usize) -> GlyphcastResult<Vec<u8>> {
        let mut bytes = self.read(file_name)?;
        bytes.truncate(len);
        Ok(bytes)
    }

    /// Remove `file_name`. Returns `false` if it did not exist.
    fn delete(&self, file_name: &str) -> GlyphcastResult<bool>;

    /// Names of all stored cache files.
    fn list(&self) -> GlyphcastResult<Vec<String>>;

    /// Size and modification time of `file_name`.
    fn stat(&self, file_name: &str) -> GlyphcastResult<CacheFileStat>;
}

/// [`CacheDirectory`] backed by a filesystem directory.
///
/// The directory is created on first write. Writes go to a temporary file in the same
/// directory which then replaces the target in one rename.
#[derive(Clone, Debug)]
pub struct FsCacheDirectory {
    root: PathBuf,
}

impl FsCacheDirectory {
    /// Cache directory rooted at `root`.
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// Root directory.
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Full path of `file_name`.
    pub fn path_of(&self, file_name: &str) -> PathBuf {
        self.root.join(file_name)
    }
}

impl CacheDirectory for FsCacheDirectory {
    fn exists(&self, file_name: &str) -> bool {
        self.path_of(file_name).is_file()
    }

    fn write(&self, file_name: &str, bytes: &[u8]) -> GlyphcastResult<()> {
        std::fs::create_dir_all(&self.root).map_err(|e| {
            GlyphcastError::io(format!("create cache dir '{}'", self.root.display()), e)
        })?;
        let target = self.path_of(file_name);

        let mut tmp = tempfile::Builder::new()
            .prefix(".ascache-")
            .suffix(".tmp")
            .tempfile_in(&self.root)
            .map_err(|e| {
                GlyphcastError::io(format!("create temp file in '{}'", self.root.display()), e)
            })?;
        tmp.write_all(bytes)
            .and_then(|()| tmp.as_file().sync_all())
            .map_err(|e| {
                GlyphcastError::io(format!("write temp file for '{}'", target.display()), e)
            })?;
        tmp.persist(&target).map_err(|e| {
            GlyphcastError::io(format!("replace '{}'", target.display()), e.error)
        })?;
        Ok(())
    }

    fn read(&self, file_name: &str) -> GlyphcastResult<Vec<u8>> {
        let path = self.path_of(file_name);
        std::fs::read(&path).map_err(|e| GlyphcastError::io(format!("read '{}'", path.display()), e))
    }

    fn read_prefix(&self, file_name: &str, len: usize) -> GlyphcastResult<Vec<u8>> {
        let path = self.path_of(file_name);
        let file = std::fs::File::open(&path)
            .map_err(|e| GlyphcastError::io(format!("open '{}'", path.display()), e))?;
        let mut out = Vec::with_capacity(len);
        file.take(len as u64)
            .read_to_end(&mut out)
            .map_err(|e| GlyphcastError::io(format!("read '{}'", path.display()), e))?;
        Ok(out)
    }

    fn delete(&self, file_name: &str) -> GlyphcastResult<bool> {
        let path = self.path_of(file_name);
        match std::fs::remove_file(&path) {
            Ok(()) => Ok(true),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(false),
            Err(e) => Err(GlyphcastError::io(format!("delete '{}'", path.display()), e)),
        }
    }

    fn list(&self) -> GlyphcastResult<Vec<String>> {
        let entries = match std::fs::read_dir(&self.root) {
            Ok(entries) => entries,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => {
                return Err(GlyphcastError::io(
                    format!("list '{}'", self.root.display()),
                    e,
                ));
            }
        };

        let mut names = Vec::new();
        for entry in entries {
            let entry = entry
                .map_err(|e| GlyphcastError::io(format!("list '{}'", self.root.display()), e))?;
            let path = entry.path();
            if !path.is_file() || path.extension().and_then(|x| x.to_str()) != Some(FILE_EXTENSION)
            {
                continue;
            }
            if let Some(name) = path.file_name().and_then(|n| n.to_str()) {
                names.push(name.to_string());
            }
        }
        names.sort();
        Ok(names)
    }

    fn stat(&self, file_name: &str) -> GlyphcastResult<CacheFileStat> {
        let path = self.path_of(file_name);
        let meta = std::fs::metadata(&path)
            .map_err(|e| GlyphcastError::io(format!("stat '{}'", path.display()), e))?;
        Ok(CacheFileStat {
            size_bytes: meta.len(),
            modified: meta.modified().ok(),
        })
    }
}

#[cfg(test)]
#[path = "../../tests/unit/cache/directory.rs"]
mod tests;
