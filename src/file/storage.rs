//! Local directory drive.
//!
//! Maps identifiers onto a root directory:
//! ```text
//! {root}/
//! ├── photos/
//! │   ├── a.jpg                      -> /photos/a.jpg
//! │   └── .preview/                  (hidden, preview cache)
//! └── notes.txt                      -> /notes.txt
//! ```

use std::fs::{self, File};
use std::io;
use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use sysinfo::Disks;

use super::{
    id_name, join_id, normalize_id, parent_id, validate_name, Drive, DriveStats, FileKind,
    FileMetadata, ListConfig,
};
use crate::{FiledeckError, Result};

/// Drive backed by a directory on the local filesystem.
#[derive(Debug, Clone)]
pub struct LocalDrive {
    root: PathBuf,
}

impl LocalDrive {
    /// Create a drive rooted at `root`.
    ///
    /// The root directory will be created if it doesn't exist.
    pub fn new(root: impl Into<PathBuf>) -> Result<Self> {
        let root = root.into();
        fs::create_dir_all(&root)?;

        Ok(Self { root })
    }

    /// Root directory of this drive.
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Canonical id and filesystem path for an id.
    fn resolve(&self, id: &str) -> Result<(String, PathBuf)> {
        let id = normalize_id(id)?;
        let path = id
            .split('/')
            .filter(|s| !s.is_empty())
            .fold(self.root.clone(), |path, segment| path.join(segment));
        Ok((id, path))
    }

    /// Resolve an id that must name an existing folder.
    fn resolve_folder(&self, id: &str) -> Result<(String, PathBuf)> {
        let (id, path) = self.resolve(id)?;
        match fs::metadata(&path) {
            Ok(m) if m.is_dir() => Ok((id, path)),
            Ok(_) => Err(FiledeckError::Validation(format!("{id} is not a folder"))),
            Err(e) => Err(not_found_or_io(e, &id)),
        }
    }

    fn describe(id: String, meta: &fs::Metadata) -> FileMetadata {
        let name = id_name(&id).to_string();
        let kind = if meta.is_dir() {
            FileKind::Folder
        } else {
            FileKind::from_name(&name)
        };
        let modified = meta
            .modified()
            .map(DateTime::<Utc>::from)
            .unwrap_or_else(|_| DateTime::<Utc>::from(std::time::UNIX_EPOCH));

        FileMetadata {
            id,
            name,
            size: if meta.is_dir() { 0 } else { meta.len() },
            kind,
            modified,
        }
    }

    fn collect(
        &self,
        id: &str,
        path: &Path,
        config: &ListConfig,
        out: &mut Vec<FileMetadata>,
    ) -> Result<()> {
        let mut entries: Vec<(String, fs::Metadata)> = Vec::new();
        for entry in fs::read_dir(path)? {
            let entry = entry?;
            let Ok(name) = entry.file_name().into_string() else {
                tracing::debug!("Skipping non UTF-8 entry in {}", id);
                continue;
            };
            if config.excludes(&name) {
                continue;
            }
            entries.push((name, entry.metadata()?));
        }

        // Folders first, then by name.
        entries.sort_by(|(a_name, a), (b_name, b)| {
            b.is_dir().cmp(&a.is_dir()).then_with(|| a_name.cmp(b_name))
        });

        for (name, meta) in entries {
            let child = join_id(id, &name);
            if config.includes(&name) {
                out.push(Self::describe(child.clone(), &meta));
            }
            if config.sub_folders && meta.is_dir() {
                self.collect(&child, &path.join(&name), config, out)?;
            }
        }
        Ok(())
    }
}

fn not_found_or_io(e: io::Error, id: &str) -> FiledeckError {
    if e.kind() == io::ErrorKind::NotFound {
        FiledeckError::NotFound(id.to_string())
    } else {
        e.into()
    }
}

/// Usage of the mount holding `path`: the mounted disk with the longest
/// mount point that is a prefix of `path`.
fn containing_mount<'a, I>(path: &Path, mounts: I) -> Option<DriveStats>
where
    I: IntoIterator<Item = (&'a Path, u64, u64)>,
{
    mounts
        .into_iter()
        .filter(|(mount_point, _, _)| path.starts_with(mount_point))
        .max_by_key(|(mount_point, _, _)| mount_point.components().count())
        .map(|(_, total, available)| DriveStats {
            used: total.saturating_sub(available),
            free: available,
        })
}

fn copy_recursive(from: &Path, to: &Path) -> io::Result<()> {
    if from.is_dir() {
        fs::create_dir(to)?;
        for entry in fs::read_dir(from)? {
            let entry = entry?;
            copy_recursive(&entry.path(), &to.join(entry.file_name()))?;
        }
    } else {
        fs::copy(from, to)?;
    }
    Ok(())
}

impl Drive for LocalDrive {
    fn info(&self, id: &str) -> Result<FileMetadata> {
        let (id, path) = self.resolve(id)?;
        let meta = fs::metadata(&path).map_err(|e| not_found_or_io(e, &id))?;
        Ok(Self::describe(id, &meta))
    }

    fn read(&self, id: &str) -> Result<File> {
        let (id, path) = self.resolve(id)?;
        if path.is_dir() {
            return Err(FiledeckError::Validation(format!("{id} is a folder")));
        }
        File::open(&path).map_err(|e| not_found_or_io(e, &id))
    }

    fn list(&self, id: &str, config: &ListConfig) -> Result<Vec<FileMetadata>> {
        let (id, path) = self.resolve_folder(id)?;
        let mut out = Vec::new();
        self.collect(&id, &path, config, &mut out)?;
        Ok(out)
    }

    fn make(&self, parent: &str, name: &str, is_folder: bool) -> Result<String> {
        validate_name(name)?;
        let (parent, parent_path) = self.resolve_folder(parent)?;
        let id = join_id(&parent, name);
        let path = parent_path.join(name);

        if path.exists() {
            return Err(FiledeckError::Conflict(id));
        }
        if is_folder {
            fs::create_dir(&path)?;
        } else {
            File::create(&path)?;
        }
        Ok(id)
    }

    fn write(&self, id: &str, content: &[u8]) -> Result<()> {
        let (id, path) = self.resolve(id)?;
        if path.is_dir() {
            return Err(FiledeckError::Validation(format!("{id} is a folder")));
        }
        fs::write(&path, content)?;
        Ok(())
    }

    fn copy(&self, id: &str, target: &str) -> Result<String> {
        let (id, from) = self.resolve(id)?;
        if id == "/" {
            return Err(FiledeckError::Validation("cannot copy the root".to_string()));
        }
        let (target, target_path) = self.resolve_folder(target)?;
        if !from.exists() {
            return Err(FiledeckError::NotFound(id));
        }
        if target == id || target.starts_with(&format!("{id}/")) {
            return Err(FiledeckError::Validation(format!(
                "cannot copy {id} into itself"
            )));
        }

        let name = id_name(&id);
        let new_id = join_id(&target, name);
        let to = target_path.join(name);
        if to.exists() {
            return Err(FiledeckError::Conflict(new_id));
        }
        copy_recursive(&from, &to)?;
        Ok(new_id)
    }

    fn move_to(&self, id: &str, target: &str, name: &str) -> Result<String> {
        let (id, from) = self.resolve(id)?;
        if id == "/" {
            return Err(FiledeckError::Validation("cannot move the root".to_string()));
        }
        if !from.exists() {
            return Err(FiledeckError::NotFound(id));
        }

        let target = if target.is_empty() {
            parent_id(&id).to_string()
        } else {
            target.to_string()
        };
        let (target, target_path) = self.resolve_folder(&target)?;
        let name = if name.is_empty() { id_name(&id) } else { name };
        validate_name(name)?;

        if target == id || target.starts_with(&format!("{id}/")) {
            return Err(FiledeckError::Validation(format!(
                "cannot move {id} into itself"
            )));
        }

        let new_id = join_id(&target, name);
        if new_id == id {
            return Ok(new_id);
        }
        let to = target_path.join(name);
        if to.exists() {
            return Err(FiledeckError::Conflict(new_id));
        }
        fs::rename(&from, &to)?;
        Ok(new_id)
    }

    fn remove(&self, id: &str) -> Result<()> {
        let (id, path) = self.resolve(id)?;
        if id == "/" {
            return Err(FiledeckError::Validation("cannot remove the root".to_string()));
        }
        let meta = fs::metadata(&path).map_err(|e| not_found_or_io(e, &id))?;
        if meta.is_dir() {
            fs::remove_dir_all(&path)?;
        } else {
            fs::remove_file(&path)?;
        }
        Ok(())
    }

    fn exists(&self, id: &str) -> bool {
        self.resolve(id).map(|(_, path)| path.exists()).unwrap_or(false)
    }

    fn local_path(&self, id: &str) -> Result<PathBuf> {
        self.resolve(id).map(|(_, path)| path)
    }

    fn stats(&self) -> Result<DriveStats> {
        let root = fs::canonicalize(&self.root)?;
        let disks = Disks::new_with_refreshed_list();
        let mounts = disks
            .list()
            .iter()
            .map(|disk| (disk.mount_point(), disk.total_space(), disk.available_space()));

        containing_mount(&root, mounts).ok_or_else(|| {
            io::Error::new(
                io::ErrorKind::NotFound,
                format!("no mounted filesystem holds {}", root.display()),
            )
            .into()
        })
    }
}
