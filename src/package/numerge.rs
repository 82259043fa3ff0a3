//! Merging satellite packages into their main package
//!
//! Driven by `numerge.config.json`: each entry names a main package and
//! the packages folded into it. The merged archive keeps the main
//! package's manifest minus its dependencies on the folded packages.

use std::collections::HashSet;
use std::fs;
use std::path::{Path, PathBuf};

use regex::Regex;
use serde::Deserialize;
use tracing::{debug, info};

use crate::error::{PipelineError, Result};
use crate::package::nupkg::{is_root_nuspec, read_entries, write_entries};
use crate::package::find_files;

pub const NUMERGE_CONFIG_FILE: &str = "numerge.config.json";

pub const PACKAGE_EXTENSION: &str = "nupkg";
pub const SYMBOL_PACKAGE_EXTENSION: &str = "snupkg";

#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "PascalCase")]
pub struct MergeConfiguration {
    #[serde(default)]
    pub packages: Vec<PackageMerge>,
}

#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "PascalCase")]
pub struct PackageMerge {
    pub id: String,
    #[serde(default)]
    pub merge: Vec<MergedPackage>,
}

#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "PascalCase")]
pub struct MergedPackage {
    pub id: String,
}

impl MergeConfiguration {
    pub fn load(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path)?;
        serde_json::from_str(&content).map_err(|e| {
            PipelineError::config(format!("Cannot parse {}: {}", path.display(), e))
        })
    }

    /// File names of every main and merged package at `version`
    pub fn file_names(&self, version: &str, extension: &str) -> HashSet<String> {
        self.packages
            .iter()
            .flat_map(|package| {
                std::iter::once(package.id.as_str())
                    .chain(package.merge.iter().map(|merged| merged.id.as_str()))
            })
            .map(|id| package_file_name(id, version, extension))
            .collect()
    }
}

pub fn package_file_name(id: &str, version: &str, extension: &str) -> String {
    format!("{}.{}.{}", id, version, extension)
}

/// Move the configured packages built in `configuration` into `destination`
///
/// Returns the number of files moved.
pub fn move_packages(
    root: &Path,
    extension: &str,
    configuration: &str,
    file_names: &HashSet<String>,
    destination: &Path,
) -> Result<usize> {
    let mut moved = 0;

    for path in find_files(root, extension)? {
        if !path.to_string_lossy().contains(configuration) {
            continue;
        }
        let Some(file_name) = path.file_name().and_then(|n| n.to_str()) else {
            continue;
        };
        if !file_names.contains(file_name) {
            continue;
        }

        let target = destination.join(file_name);
        debug!("Moving {} to {}", path.display(), target.display());
        move_file(&path, &target)?;
        moved += 1;
    }

    Ok(moved)
}

// rename fails across filesystems, and the temp dir is often on another one
fn move_file(from: &Path, to: &Path) -> Result<()> {
    if fs::rename(from, to).is_err() {
        fs::copy(from, to)?;
        fs::remove_file(from)?;
    }
    Ok(())
}

/// Merge every configured package found in `source` into `output`
///
/// A missing main `.nupkg` fails the merge; a missing main `.snupkg`
/// only means there are no symbols to merge.
pub fn merge(
    source: &Path,
    output: &Path,
    config: &MergeConfiguration,
    version: &str,
) -> Result<Vec<PathBuf>> {
    fs::create_dir_all(output)?;
    let mut written = Vec::new();

    for package in &config.packages {
        for extension in [PACKAGE_EXTENSION, SYMBOL_PACKAGE_EXTENSION] {
            let main = source.join(package_file_name(&package.id, version, extension));
            if !main.exists() {
                if extension == PACKAGE_EXTENSION {
                    return Err(PipelineError::package(format!(
                        "Main package {} not found",
                        main.display()
                    )));
                }
                debug!("No symbol package for {}", package.id);
                continue;
            }

            let mut merged = Vec::new();
            for merged_package in &package.merge {
                let path = source.join(package_file_name(&merged_package.id, version, extension));
                if path.exists() {
                    merged.push(path);
                } else if extension == PACKAGE_EXTENSION {
                    return Err(PipelineError::package(format!(
                        "Package {} to merge into {} not found",
                        path.display(),
                        package.id
                    )));
                }
            }

            let target = output.join(package_file_name(&package.id, version, extension));
            let merged_ids: Vec<&str> = package.merge.iter().map(|m| m.id.as_str()).collect();
            merge_archives(&main, &merged, &merged_ids, &target)?;
            info!("Merged {} package(s) into {}", merged.len(), target.display());
            written.push(target);
        }
    }

    Ok(written)
}

fn is_package_metadata(entry_name: &str) -> bool {
    is_root_nuspec(entry_name)
        || entry_name.starts_with("_rels/")
        || entry_name.starts_with("package/")
        || entry_name == "[Content_Types].xml"
}

/// Combine `main` with the content of `merged` into `target`
pub fn merge_archives(
    main: &Path,
    merged: &[PathBuf],
    merged_ids: &[&str],
    target: &Path,
) -> Result<()> {
    let mut entries = read_entries(main)?;
    let mut seen: HashSet<String> = entries.iter().map(|(name, _)| name.clone()).collect();

    for (name, contents) in entries.iter_mut() {
        if is_root_nuspec(name) {
            let nuspec = String::from_utf8_lossy(contents).into_owned();
            *contents = remove_dependencies(&nuspec, merged_ids)?.into_bytes();
        }
    }

    for path in merged {
        for (name, contents) in read_entries(path)? {
            if is_package_metadata(&name) || seen.contains(&name) {
                continue;
            }
            seen.insert(name.clone());
            entries.push((name, contents));
        }
    }

    write_entries(target, &entries)
}

/// Drop `<dependency id="…"/>` elements naming any of `ids`
pub fn remove_dependencies(nuspec: &str, ids: &[&str]) -> Result<String> {
    let mut result = nuspec.to_string();

    for id in ids {
        let pattern = format!(
            r#"(?i)[ \t]*<dependency\s[^>]*\bid\s*=\s*"{}"[^>]*/>[ \t]*\r?\n?"#,
            regex::escape(id)
        );
        let re = Regex::new(&pattern)
            .map_err(|e| PipelineError::package(format!("Bad dependency pattern: {}", e)))?;
        result = re.replace_all(&result, "").into_owned();
    }

    Ok(result)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::package::nupkg::read_entries;
    use crate::package::nupkg::tests::write_archive;
    use tempfile::TempDir;

    const MAIN_NUSPEC: &str = r#"<package>
  <metadata>
    <id>Acme</id>
    <dependencies>
      <group targetFramework="net8.0">
        <dependency id="Acme.Core" version="1.0.0" exclude="Build,Analyzers" />
        <dependency id="Newtonsoft.Json" version="13.0.3" />
      </group>
    </dependencies>
  </metadata>
</package>"#;

    fn config() -> MergeConfiguration {
        serde_json::from_str(
            r#"{ "Packages": [ { "Id": "Acme", "Merge": [ { "Id": "Acme.Core" } ] } ] }"#,
        )
        .unwrap()
    }

    #[test]
    fn test_config_parses_pascal_case() {
        let config = config();
        assert_eq!(config.packages.len(), 1);
        assert_eq!(config.packages[0].id, "Acme");
        assert_eq!(config.packages[0].merge[0].id, "Acme.Core");
    }

    #[test]
    fn test_file_names_cover_main_and_merged() {
        let names = config().file_names("1.0.0", PACKAGE_EXTENSION);
        assert!(names.contains("Acme.1.0.0.nupkg"));
        assert!(names.contains("Acme.Core.1.0.0.nupkg"));
        assert_eq!(names.len(), 2);
    }

    #[test]
    fn test_remove_dependencies_only_merged_ids() {
        let result = remove_dependencies(MAIN_NUSPEC, &["Acme.Core"]).unwrap();
        assert!(!result.contains("Acme.Core"));
        assert!(result.contains(r#"<dependency id="Newtonsoft.Json" version="13.0.3" />"#));
    }

    #[test]
    fn test_remove_dependencies_does_not_match_prefix() {
        let nuspec = r#"<dependency id="Acme.Core.Extra" version="1.0.0" />"#;
        let result = remove_dependencies(nuspec, &["Acme.Core"]).unwrap();
        assert_eq!(result, nuspec);
    }

    #[test]
    fn test_move_packages_filters_by_configuration_and_name() {
        let root = TempDir::new().unwrap();
        let dest = TempDir::new().unwrap();
        let release = root.path().join("src/Acme/bin/Release");
        let debug = root.path().join("src/Acme/bin/Debug");
        fs::create_dir_all(&release).unwrap();
        fs::create_dir_all(&debug).unwrap();
        fs::write(release.join("Acme.1.0.0.nupkg"), b"x").unwrap();
        fs::write(release.join("Other.1.0.0.nupkg"), b"x").unwrap();
        fs::write(debug.join("Acme.Core.1.0.0.nupkg"), b"x").unwrap();

        let names = config().file_names("1.0.0", PACKAGE_EXTENSION);
        let moved =
            move_packages(root.path(), PACKAGE_EXTENSION, "Release", &names, dest.path()).unwrap();

        assert_eq!(moved, 1);
        assert!(dest.path().join("Acme.1.0.0.nupkg").exists());
        assert!(!release.join("Acme.1.0.0.nupkg").exists());
        assert!(release.join("Other.1.0.0.nupkg").exists());
        assert!(debug.join("Acme.Core.1.0.0.nupkg").exists());
    }

    #[test]
    fn test_merge_combines_content() {
        let source = TempDir::new().unwrap();
        let output = TempDir::new().unwrap();
        write_archive(
            &source.path().join("Acme.1.0.0.nupkg"),
            &[
                ("Acme.nuspec", MAIN_NUSPEC),
                ("[Content_Types].xml", "main types"),
                ("lib/net8.0/Acme.dll", "acme"),
            ],
        );
        write_archive(
            &source.path().join("Acme.Core.1.0.0.nupkg"),
            &[
                ("Acme.Core.nuspec", "<package/>"),
                ("[Content_Types].xml", "core types"),
                ("_rels/.rels", "rels"),
                ("package/services/metadata/core-properties/x.psmdcp", "props"),
                ("lib/net8.0/Acme.dll", "duplicate"),
                ("lib/net8.0/Acme.Core.dll", "core"),
            ],
        );

        let written = merge(source.path(), output.path(), &config(), "1.0.0").unwrap();
        assert_eq!(written, vec![output.path().join("Acme.1.0.0.nupkg")]);

        let entries = read_entries(&written[0]).unwrap();
        let names: Vec<&str> = entries.iter().map(|(n, _)| n.as_str()).collect();
        assert_eq!(
            names,
            vec![
                "Acme.nuspec",
                "[Content_Types].xml",
                "lib/net8.0/Acme.dll",
                "lib/net8.0/Acme.Core.dll"
            ]
        );

        let nuspec = String::from_utf8(entries[0].1.clone()).unwrap();
        assert!(!nuspec.contains("Acme.Core"));
        assert_eq!(entries[1].1, b"main types".to_vec());
        assert_eq!(entries[2].1, b"acme".to_vec());
    }

    #[test]
    fn test_merge_missing_main_package_fails() {
        let source = TempDir::new().unwrap();
        let output = TempDir::new().unwrap();

        let err = merge(source.path(), output.path(), &config(), "1.0.0").unwrap_err();
        assert!(matches!(err, PipelineError::Package(_)));
    }
}
