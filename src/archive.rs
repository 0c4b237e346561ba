//! Packs rendered project files into a single zip archive in memory.

use crate::project::ProjectFile;
use anyhow::{Context, Result};
use std::collections::BTreeSet;
use std::io::{Cursor, Write};
use zip::write::FileOptions;
use zip::{CompressionMethod, ZipWriter};

/// Build a deflate-compressed archive from the given files.
///
/// File entries are sorted by name and every entry carries a fixed
/// modification time, so identical inputs produce identical archives.
/// Directory entries are derived from `/`-delimited file names.
pub fn build_zip(files: &[ProjectFile]) -> Result<Vec<u8>> {
    let mut sorted: Vec<&ProjectFile> = files.iter().collect();
    sorted.sort_by(|a, b| a.name.cmp(&b.name));

    // BTreeSet keeps directory entries sorted and de-duplicated.
    let mut directories: BTreeSet<String> = BTreeSet::new();
    for file in &sorted {
        let mut path = file.name.as_str();
        while let Some(pos) = path.rfind('/') {
            path = &path[..pos];
            directories.insert(path.to_string());
        }
    }

    let mut cursor = Cursor::new(Vec::new());
    {
        let mut writer = ZipWriter::new(&mut cursor);
        let options = FileOptions::default()
            .compression_method(CompressionMethod::Deflated)
            .last_modified_time(zip::DateTime::default());

        for dir in &directories {
            writer
                .add_directory(dir.as_str(), options)
                .with_context(|| format!("Failed to add directory {dir}"))?;
        }

        for file in &sorted {
            writer
                .start_file(file.name.as_str(), options)
                .with_context(|| format!("Failed to start archive entry {}", file.name))?;
            writer.write_all(file.contents.as_bytes())?;
        }

        writer.finish()?;
    }

    Ok(cursor.into_inner())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Read;
    use zip::ZipArchive;

    fn files() -> Vec<ProjectFile> {
        vec![
            ProjectFile {
                name: "chapters/02-two.qmd".to_string(),
                contents: "chapter two".to_string(),
            },
            ProjectFile {
                name: "_quarto.yml".to_string(),
                contents: "project:\n  type: book\n".to_string(),
            },
            ProjectFile {
                name: "chapters/01-one.qmd".to_string(),
                contents: "chapter one".to_string(),
            },
        ]
    }

    #[test]
    fn test_archive_round_trip() {
        let bytes = build_zip(&files()).unwrap();
        let mut archive = ZipArchive::new(Cursor::new(bytes)).unwrap();

        let mut contents = String::new();
        archive
            .by_name("chapters/01-one.qmd")
            .unwrap()
            .read_to_string(&mut contents)
            .unwrap();
        assert_eq!(contents, "chapter one");

        // Directory entry is present.
        assert!(archive.by_name("chapters/").is_ok());
    }

    #[test]
    fn test_archive_is_deterministic() {
        // Same inputs, byte-identical output regardless of input order.
        let a = build_zip(&files()).unwrap();
        let mut reversed = files();
        reversed.reverse();
        let b = build_zip(&reversed).unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn test_entries_are_sorted() {
        let bytes = build_zip(&files()).unwrap();
        let mut archive = ZipArchive::new(Cursor::new(bytes)).unwrap();
        // by_index reflects central-directory order; file_names() does not.
        let names: Vec<String> = (0..archive.len())
            .map(|i| archive.by_index(i).unwrap().name().to_string())
            .collect();
        let file_positions: Vec<usize> = ["_quarto.yml", "chapters/01-one.qmd", "chapters/02-two.qmd"]
            .iter()
            .map(|n| names.iter().position(|x| x == n).unwrap())
            .collect();
        assert!(file_positions.windows(2).all(|w| w[0] < w[1]));
    }
}
