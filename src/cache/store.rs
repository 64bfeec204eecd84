/// Cache store: one flat file per command key
///
/// Each entry is plain newline-terminated text, one output line per record.
/// Publishing writes a private temporary file next to the entry and renames it
/// over the old one, so readers see either the previous or the new content.
use std::fs::{self, File};
use std::io::{self, BufRead, BufReader, BufWriter, Write};
use std::path::{Path, PathBuf};
use tracing::debug;

use super::key::CommandKey;
use crate::dedup::trim_line_ending;
use crate::error::{Error, Result};

/// Prefix of in-flight temporary files inside the cache directory
const TEMP_PREFIX: &str = ".fzfcache-";

/// Cache store rooted at a single directory
#[derive(Debug, Clone)]
pub struct CacheStore {
    cache_dir: PathBuf,
}

impl CacheStore {
    /// Open the store, creating the directory (owner-only on Unix) if missing
    pub fn open(cache_dir: impl Into<PathBuf>) -> Result<Self> {
        let cache_dir = cache_dir.into();
        create_private_dir(&cache_dir).map_err(|source| Error::Config {
            path: cache_dir.clone(),
            source,
        })?;

        Ok(Self { cache_dir })
    }

    pub fn cache_dir(&self) -> &Path {
        &self.cache_dir
    }

    /// Path of the entry for a key
    pub fn entry_path(&self, key: &CommandKey) -> PathBuf {
        self.cache_dir.join(key.as_str())
    }

    /// Open the entry for reading. A missing entry is `Ok(None)`, not an error.
    pub fn read(&self, key: &CommandKey) -> Result<Option<CachedLines>> {
        let path = self.entry_path(key);

        match File::open(&path) {
            Ok(file) => {
                debug!(operation = "read", status = "hit", key = %key, "cache entry found");
                Ok(Some(CachedLines {
                    lines: BufReader::new(file).split(b'\n'),
                    path,
                }))
            }
            Err(e) if e.kind() == io::ErrorKind::NotFound => {
                debug!(operation = "read", status = "miss", key = %key, "no cache entry");
                Ok(None)
            }
            Err(e) => Err(Error::io(
                format!("failed to open cache file '{}'", path.display()),
                e,
            )),
        }
    }

    /// Replace the entry for a key with `lines`, each terminated by `\n`
    pub fn publish<L: AsRef<[u8]>>(&self, key: &CommandKey, lines: &[L]) -> Result<()> {
        let path = self.entry_path(key);

        let temp = tempfile::Builder::new()
            .prefix(TEMP_PREFIX)
            .tempfile_in(&self.cache_dir)
            .map_err(|e| {
                Error::io(
                    format!(
                        "failed to create temporary file in '{}'",
                        self.cache_dir.display()
                    ),
                    e,
                )
            })?;
        let temp_path = temp.path().to_path_buf();
        let write_err =
            |e: io::Error| Error::io(format!("failed to write '{}'", temp_path.display()), e);

        let mut writer = BufWriter::new(temp);
        for line in lines {
            writer.write_all(line.as_ref()).map_err(write_err)?;
            writer.write_all(b"\n").map_err(write_err)?;
        }
        let temp = writer
            .into_inner()
            .map_err(|e| write_err(e.into_error()))?;
        temp.as_file().sync_all().map_err(write_err)?;

        // Dropping an unpersisted temp file removes it
        temp.persist(&path).map_err(|e| {
            Error::io(
                format!("failed to replace cache file '{}'", path.display()),
                e.error,
            )
        })?;

        debug!(
            operation = "publish",
            status = "success",
            key = %key,
            line_count = lines.len(),
            "cache entry replaced"
        );

        Ok(())
    }
}

/// Lazy, in-order view of a cache entry's lines
#[derive(Debug)]
pub struct CachedLines {
    lines: io::Split<BufReader<File>>,
    path: PathBuf,
}

impl Iterator for CachedLines {
    type Item = Result<Vec<u8>>;

    fn next(&mut self) -> Option<Self::Item> {
        let line = self.lines.next()?;
        Some(
            line.map(|mut line| {
                let len = trim_line_ending(&line).len();
                line.truncate(len);
                line
            })
            .map_err(|e| {
                Error::io(
                    format!("failed to read cache file '{}'", self.path.display()),
                    e,
                )
            }),
        )
    }
}

fn create_private_dir(path: &Path) -> io::Result<()> {
    let mut builder = fs::DirBuilder::new();
    builder.recursive(true);
    #[cfg(unix)]
    {
        use std::os::unix::fs::DirBuilderExt;
        builder.mode(0o700);
    }
    builder.create(path)
}
