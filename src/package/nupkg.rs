use std::fs::File;
use std::io::{Read, Write};
use std::path::Path;

use zip::write::SimpleFileOptions;
use zip::{CompressionMethod, ZipArchive, ZipWriter};

use crate::error::{PipelineError, Result};

pub const NUSPEC_EXTENSION: &str = ".nuspec";

/// A root-level nuspec is the package manifest; nested ones are content
pub fn is_root_nuspec(entry_name: &str) -> bool {
    !entry_name.contains('/') && entry_name.ends_with(NUSPEC_EXTENSION)
}

/// Package id named by the first root-level `.nuspec` entry
pub fn read_package_id(path: &Path) -> Result<Option<String>> {
    let archive = open(path)?;

    let id = archive
        .file_names()
        .find(|name| is_root_nuspec(name))
        .and_then(|name| name.strip_suffix(NUSPEC_EXTENSION))
        .map(str::to_string);

    Ok(id)
}

pub fn open(path: &Path) -> Result<ZipArchive<File>> {
    let file = File::open(path)?;
    ZipArchive::new(file)
        .map_err(|e| PipelineError::package(format!("Cannot open {}: {}", path.display(), e)))
}

/// All entries of an archive as `(name, contents)` in archive order
///
/// Directory entries are left out.
pub fn read_entries(path: &Path) -> Result<Vec<(String, Vec<u8>)>> {
    let mut archive = open(path)?;
    let mut entries = Vec::with_capacity(archive.len());

    for index in 0..archive.len() {
        let mut entry = archive.by_index(index)?;
        if entry.is_dir() {
            continue;
        }
        let mut contents = Vec::new();
        entry.read_to_end(&mut contents)?;
        entries.push((entry.name().to_string(), contents));
    }

    Ok(entries)
}

/// Write entries to a new deflate-compressed archive
pub fn write_entries(path: &Path, entries: &[(String, Vec<u8>)]) -> Result<()> {
    let file = File::create(path)?;
    let mut writer = ZipWriter::new(file);
    let options = SimpleFileOptions::default().compression_method(CompressionMethod::Deflated);

    for (name, contents) in entries {
        writer.start_file(name.as_str(), options)?;
        writer.write_all(contents)?;
    }

    writer.finish()?;
    Ok(())
}
