use std::collections::BTreeSet;
use std::fs;
use std::io::Read;
use std::sync::Mutex;

use camino::{Utf8Path, Utf8PathBuf};
use zip::ZipArchive;

use crate::error::Splib07Error;

/// Uniform read-only view over an splib07 archive root: either an extracted
/// directory tree or an uncompressed-member zip distribution.
///
/// All relative paths are resolved against the archive root. Upstream zip
/// distributions wrap everything in a single `usgs_splib07/` directory; that
/// prefix is detected once at open time and applied transparently.
#[derive(Debug)]
pub enum SplibArchive {
    Dir {
        root: Utf8PathBuf,
    },
    Zip {
        location: Utf8PathBuf,
        archive: Mutex<ZipArchive<fs::File>>,
        prefix: String,
    },
}

impl SplibArchive {
    /// Open a directory root or a `.zip` file as an archive view.
    pub fn open(path: impl AsRef<Utf8Path>) -> Result<Self, Splib07Error> {
        let path = path.as_ref();
        let std_path = path.as_std_path();

        if std_path.is_dir() {
            return Ok(SplibArchive::Dir {
                root: path.to_owned(),
            });
        }

        let file = fs::File::open(std_path)
            .map_err(|err| Splib07Error::Archive(format!("open {path}: {err}")))?;
        let archive = ZipArchive::new(file)
            .map_err(|err| Splib07Error::Archive(format!("read zip {path}: {err}")))?;
        let prefix = detect_prefix(&archive);

        Ok(SplibArchive::Zip {
            location: path.to_owned(),
            archive: Mutex::new(archive),
            prefix,
        })
    }

    /// Location the archive was opened from, for error messages.
    pub fn location(&self) -> &Utf8Path {
        match self {
            SplibArchive::Dir { root } => root,
            SplibArchive::Zip { location, .. } => location,
        }
    }

    /// Read a file inside the archive as text.
    pub fn read_to_string(&self, relative: &Utf8Path) -> Result<String, Splib07Error> {
        match self {
            SplibArchive::Dir { root } => {
                let full = root.join(relative);
                fs::read_to_string(full.as_std_path())
                    .map_err(|err| Splib07Error::Archive(format!("read {full}: {err}")))
            }
            SplibArchive::Zip {
                location,
                archive,
                prefix,
            } => {
                let name = format!("{prefix}{relative}");
                let mut guard = archive
                    .lock()
                    .map_err(|_| Splib07Error::Archive(format!("zip handle poisoned: {location}")))?;
                let mut entry = guard.by_name(&name).map_err(|err| {
                    Splib07Error::Archive(format!("read {name} in {location}: {err}"))
                })?;
                let mut content = String::new();
                entry.read_to_string(&mut content).map_err(|err| {
                    Splib07Error::Archive(format!("read {name} in {location}: {err}"))
                })?;
                Ok(content)
            }
        }
    }

    /// Whether a file or directory exists at the given relative path.
    pub fn exists(&self, relative: &Utf8Path) -> bool {
        match self {
            SplibArchive::Dir { root } => root.join(relative).as_std_path().exists(),
            SplibArchive::Zip {
                archive, prefix, ..
            } => {
                let Ok(guard) = archive.lock() else {
                    return false;
                };
                let name = format!("{prefix}{relative}");
                let dir_name = format!("{name}/");
                guard.index_for_name(&name).is_some()
                    || guard
                        .file_names()
                        .any(|entry| entry.starts_with(&dir_name))
            }
        }
    }

    /// Names of the entries directly under the archive root.
    pub fn root_entries(&self) -> Result<Vec<String>, Splib07Error> {
        match self {
            SplibArchive::Dir { root } => {
                let entries = fs::read_dir(root.as_std_path())
                    .map_err(|err| Splib07Error::Archive(format!("list {root}: {err}")))?;
                let mut names = Vec::new();
                for entry in entries {
                    let entry = entry
                        .map_err(|err| Splib07Error::Archive(format!("list {root}: {err}")))?;
                    names.push(entry.file_name().to_string_lossy().into_owned());
                }
                names.sort();
                Ok(names)
            }
            SplibArchive::Zip {
                location,
                archive,
                prefix,
            } => {
                let guard = archive
                    .lock()
                    .map_err(|_| Splib07Error::Archive(format!("zip handle poisoned: {location}")))?;
                let names: BTreeSet<String> = guard
                    .file_names()
                    .filter_map(|name| name.strip_prefix(prefix.as_str()))
                    .filter_map(|rest| rest.split('/').next())
                    .filter(|first| !first.is_empty())
                    .map(str::to_string)
                    .collect();
                Ok(names.into_iter().collect())
            }
        }
    }
}

/// Upstream distributions zip the library under a single top-level
/// directory. If every member shares one first component, treat it as the
/// archive root.
fn detect_prefix(archive: &ZipArchive<fs::File>) -> String {
    if archive.file_names().any(|name| name.starts_with("indexes/")) {
        return String::new();
    }

    let tops: BTreeSet<&str> = archive
        .file_names()
        .filter_map(|name| name.split('/').next())
        .filter(|first| !first.is_empty())
        .collect();

    match tops.iter().next() {
        Some(top) if tops.len() == 1 => format!("{top}/"),
        _ => String::new(),
    }
}
