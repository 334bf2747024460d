use std::fs;
use std::io::Read;
use std::path::{Component, Path, PathBuf};

use bzip2::read::BzDecoder;
use flate2::read::GzDecoder;
use zip::ZipArchive;
use zip::result::ZipError;

use crate::error::DataSourceError;
use crate::fs_util::{open_file, persist_reader};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TarCompression {
    Gzip,
    Bzip2,
}

pub fn gunzip_file(archive: &Path, output: &Path) -> Result<PathBuf, DataSourceError> {
    let mut decoder = GzDecoder::new(open_file(archive)?);
    persist_reader(&mut decoder, output)
}

pub fn extract_zip_all(archive: &Path, output_dir: &Path) -> Result<Vec<PathBuf>, DataSourceError> {
    extract_zip_matching(archive, output_dir, |_| true)
}

/// Extracts every member whose stored path starts with `prefix`, keeping the
/// stored relative path under `output_dir`.
pub fn extract_zip_prefix(
    archive: &Path,
    prefix: &str,
    output_dir: &Path,
) -> Result<Vec<PathBuf>, DataSourceError> {
    extract_zip_matching(archive, output_dir, |name| name.starts_with(prefix))
}

pub fn extract_zip_member(
    archive: &Path,
    member: &str,
    output: &Path,
) -> Result<PathBuf, DataSourceError> {
    let mut zip = open_zip(archive)?;
    let mut entry = zip.by_name(member).map_err(|err| match err {
        ZipError::FileNotFound => DataSourceError::MissingArchiveMember {
            archive: archive.to_path_buf(),
            member: member.to_string(),
        },
        other => DataSourceError::Archive(other.to_string()),
    })?;
    persist_reader(&mut entry, output)
}

fn open_zip(archive: &Path) -> Result<ZipArchive<fs::File>, DataSourceError> {
    ZipArchive::new(open_file(archive)?)
        .map_err(|err| DataSourceError::Archive(format!("{}: {err}", archive.display())))
}

fn extract_zip_matching<F>(
    archive: &Path,
    output_dir: &Path,
    keep: F,
) -> Result<Vec<PathBuf>, DataSourceError>
where
    F: Fn(&str) -> bool,
{
    let mut zip = open_zip(archive)?;
    let mut written = Vec::new();

    for i in 0..zip.len() {
        let mut entry = zip
            .by_index(i)
            .map_err(|err| DataSourceError::Archive(err.to_string()))?;
        if !keep(entry.name()) {
            continue;
        }
        let entry_path = match entry.enclosed_name() {
            Some(path) => output_dir.join(path),
            None => {
                return Err(DataSourceError::Archive(format!(
                    "zip entry path traversal detected: {}",
                    entry.name()
                )));
            }
        };

        if entry.is_dir() {
            fs::create_dir_all(&entry_path)
                .map_err(|err| DataSourceError::Filesystem(err.to_string()))?;
            continue;
        }
        written.push(persist_reader(&mut entry, &entry_path)?);
    }
    Ok(written)
}

pub fn extract_tar_member(
    archive: &Path,
    compression: TarCompression,
    member: &str,
    output: &Path,
) -> Result<PathBuf, DataSourceError> {
    let file = open_file(archive)?;
    let reader: Box<dyn Read> = match compression {
        TarCompression::Gzip => Box::new(GzDecoder::new(file)),
        TarCompression::Bzip2 => Box::new(BzDecoder::new(file)),
    };
    let mut tar = tar::Archive::new(reader);
    let wanted = normalize_member(Path::new(member));

    let entries = tar
        .entries()
        .map_err(|err| DataSourceError::Archive(format!("{}: {err}", archive.display())))?;
    for entry in entries {
        let mut entry = entry.map_err(|err| DataSourceError::Archive(err.to_string()))?;
        let path = entry
            .path()
            .map_err(|err| DataSourceError::Archive(err.to_string()))?
            .into_owned();
        if normalize_member(&path) == wanted {
            return persist_reader(&mut entry, output);
        }
    }

    Err(DataSourceError::MissingArchiveMember {
        archive: archive.to_path_buf(),
        member: member.to_string(),
    })
}

fn normalize_member(path: &Path) -> PathBuf {
    path.components()
        .filter(|component| !matches!(component, Component::CurDir))
        .collect()
}

pub fn extract_sevenz_all(archive: &Path, output_dir: &Path) -> Result<(), DataSourceError> {
    if !archive.exists() {
        return Err(DataSourceError::Filesystem(format!(
            "open {}: file not found",
            archive.display()
        )));
    }
    fs::create_dir_all(output_dir).map_err(|err| DataSourceError::Filesystem(err.to_string()))?;
    sevenz_rust::decompress_file(archive, output_dir)
        .map_err(|err| DataSourceError::Archive(format!("{}: {err}", archive.display())))
}

#[cfg(test)]
mod tests {
    use std::io::Write;

    use assert_matches::assert_matches;
    use zip::write::SimpleFileOptions;

    use super::*;

    fn write_zip(path: &Path, members: &[(&str, &str)]) {
        let mut writer = zip::ZipWriter::new(fs::File::create(path).unwrap());
        for (name, body) in members {
            writer
                .start_file(*name, SimpleFileOptions::default())
                .unwrap();
            writer.write_all(body.as_bytes()).unwrap();
        }
        writer.finish().unwrap();
    }

    fn write_tar_bz2(path: &Path, members: &[(&str, &str)]) {
        let encoder =
            bzip2::write::BzEncoder::new(fs::File::create(path).unwrap(), bzip2::Compression::fast());
        let mut builder = tar::Builder::new(encoder);
        for (name, body) in members {
            let mut header = tar::Header::new_gnu();
            header.set_size(body.len() as u64);
            header.set_mode(0o644);
            header.set_cksum();
            builder.append_data(&mut header, name, body.as_bytes()).unwrap();
        }
        builder.into_inner().unwrap().finish().unwrap();
    }

    #[test]
    fn zip_prefix_keeps_only_matching_members() {
        let dir = tempfile::tempdir().unwrap();
        let archive = dir.path().join("ord-data-main.zip");
        write_zip(
            &archive,
            &[
                ("ord-data-main/data/ab/one.pb.gz", "x"),
                ("ord-data-main/README.md", "readme"),
            ],
        );
        let out = dir.path().join("out");
        let written = extract_zip_prefix(&archive, "ord-data-main/data", &out).unwrap();
        assert_eq!(written.len(), 1);
        assert!(out.join("ord-data-main/data/ab/one.pb.gz").exists());
        assert!(!out.join("ord-data-main/README.md").exists());
    }

    #[test]
    fn missing_zip_member_leaves_no_file() {
        let dir = tempfile::tempdir().unwrap();
        let archive = dir.path().join("data.zip");
        write_zip(&archive, &[("data/train.txt", "CC>>CO\n")]);
        let output = dir.path().join("test.txt");

        let result = extract_zip_member(&archive, "data/test.txt", &output);
        assert_matches!(result, Err(DataSourceError::MissingArchiveMember { .. }));
        assert!(!output.exists());
    }

    #[test]
    fn tar_bz2_member_is_streamed_out() {
        let dir = tempfile::tempdir().unwrap();
        let archive = dir.path().join("130.tar.bz2");
        write_tar_bz2(
            &archive,
            &[("130/tsv/rhea-reaction-smiles.tsv", "10000\tCC>>CO\n")],
        );
        let output = dir.path().join("rhea-reaction-smiles.tsv");
        extract_tar_member(
            &archive,
            TarCompression::Bzip2,
            "130/tsv/rhea-reaction-smiles.tsv",
            &output,
        )
        .unwrap();
        assert_eq!(fs::read_to_string(&output).unwrap(), "10000\tCC>>CO\n");

        let missing = dir.path().join("missing.tsv");
        let result = extract_tar_member(&archive, TarCompression::Bzip2, "130/other.tsv", &missing);
        assert_matches!(result, Err(DataSourceError::MissingArchiveMember { .. }));
        assert!(!missing.exists());
    }

    #[test]
    fn gunzip_round_trips_content() {
        let dir = tempfile::tempdir().unwrap();
        let archive = dir.path().join("bb.smi.gz");
        let mut encoder = flate2::write::GzEncoder::new(
            fs::File::create(&archive).unwrap(),
            flate2::Compression::default(),
        );
        encoder.write_all(b"CCO ZINC1\n").unwrap();
        encoder.finish().unwrap();

        let output = dir.path().join("bb.smi");
        gunzip_file(&archive, &output).unwrap();
        assert_eq!(fs::read_to_string(output).unwrap(), "CCO ZINC1\n");
    }
}
