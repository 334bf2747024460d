use std::fs;
use std::io::Read;
use std::path::{Path, PathBuf};

use crate::error::DataSourceError;

/// Streams `reader` into a temporary file beside `destination` and renames it
/// into place after the copy completed. Nothing appears under `destination`
/// when the copy fails.
pub fn persist_reader<R: Read + ?Sized>(
    reader: &mut R,
    destination: &Path,
) -> Result<PathBuf, DataSourceError> {
    let parent = destination
        .parent()
        .filter(|parent| !parent.as_os_str().is_empty())
        .unwrap_or_else(|| Path::new("."));
    fs::create_dir_all(parent).map_err(|err| DataSourceError::Filesystem(err.to_string()))?;
    let mut temp = tempfile::Builder::new()
        .prefix(".chem-ds-part")
        .tempfile_in(parent)
        .map_err(|err| DataSourceError::Filesystem(err.to_string()))?;
    std::io::copy(reader, temp.as_file_mut()).map_err(|err| {
        DataSourceError::Filesystem(format!("write {}: {err}", destination.display()))
    })?;
    temp.persist(destination)
        .map_err(|err| DataSourceError::Filesystem(err.to_string()))?;
    Ok(destination.to_path_buf())
}

pub fn open_file(path: &Path) -> Result<fs::File, DataSourceError> {
    fs::File::open(path)
        .map_err(|err| DataSourceError::Filesystem(format!("open {}: {err}", path.display())))
}

/// Every regular file under `root` whose name ends with `suffix`, sorted.
pub fn walk_files(root: &Path, suffix: &str) -> Result<Vec<PathBuf>, DataSourceError> {
    let mut items = Vec::new();
    if !root.exists() {
        return Ok(items);
    }
    let mut stack = vec![root.to_path_buf()];
    while let Some(path) = stack.pop() {
        let entries = fs::read_dir(&path)
            .map_err(|err| DataSourceError::Filesystem(format!("{}: {err}", path.display())))?;
        for entry in entries {
            let entry = entry.map_err(|err| DataSourceError::Filesystem(err.to_string()))?;
            let path = entry.path();
            if path.is_dir() {
                stack.push(path);
            } else if path
                .file_name()
                .map(|name| name.to_string_lossy().ends_with(suffix))
                .unwrap_or(false)
            {
                items.push(path);
            }
        }
    }
    items.sort();
    Ok(items)
}

pub fn file_name_of(path: &Path) -> String {
    path.file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn walk_files_filters_by_suffix_and_sorts() {
        let dir = tempfile::tempdir().unwrap();
        fs::create_dir_all(dir.path().join("b/nested")).unwrap();
        fs::write(dir.path().join("b/nested/two.pb.gz"), b"").unwrap();
        fs::write(dir.path().join("a.pb.gz"), b"").unwrap();
        fs::write(dir.path().join("readme.md"), b"").unwrap();

        let files = walk_files(dir.path(), ".pb.gz").unwrap();
        let names: Vec<_> = files.iter().map(|path| file_name_of(path)).collect();
        assert_eq!(names, vec!["a.pb.gz", "two.pb.gz"]);
    }

    #[test]
    fn failed_copy_leaves_no_file() {
        struct Broken;
        impl Read for Broken {
            fn read(&mut self, _buf: &mut [u8]) -> std::io::Result<usize> {
                Err(std::io::Error::other("connection reset"))
            }
        }

        let dir = tempfile::tempdir().unwrap();
        let target = dir.path().join("out.csv");
        assert!(persist_reader(&mut Broken, &target).is_err());
        assert!(!target.exists());
        assert_eq!(fs::read_dir(dir.path()).unwrap().count(), 0);
    }
}
