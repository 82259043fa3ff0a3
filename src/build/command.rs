use crate::domain::pack_version::{escape_commas, PackVersion};
use crate::error::{PipelineError, Result};
use crate::warning::PipelineWarning;

/// Packaging command used when none is configured
pub const DEFAULT_BUILD_COMMAND: &str = "dotnet pack";

const VERSION_PLACEHOLDER: &str = "{VERSION}";
const RELEASE_NOTES_PLACEHOLDER: &str = "{RELEASENOTES}";

/// A program with its arguments and MSBuild property overrides
///
/// Arguments are passed to the program as-is; nothing goes through a shell.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommandSpec {
    pub program: String,
    pub args: Vec<String>,
    /// Rendered as `/p:Key=Value` after the arguments
    pub overrides: Vec<(String, String)>,
}

impl CommandSpec {
    pub fn new(program: impl Into<String>, args: Vec<String>) -> Self {
        CommandSpec {
            program: program.into(),
            args,
            overrides: Vec::new(),
        }
    }

    /// Split a command line into program and arguments
    ///
    /// Quoting follows POSIX shell rules, so `dotnet pack "My Project.csproj"`
    /// yields a single project argument.
    pub fn parse(command_line: &str) -> Result<Self> {
        let mut words = shell_words::split(command_line.trim()).map_err(|e| {
            PipelineError::config(format!("Cannot parse build command '{}': {}", command_line, e))
        })?;

        if words.is_empty() {
            return Err(PipelineError::config("Build command is empty"));
        }

        let program = words.remove(0);
        Ok(CommandSpec::new(program, words))
    }

    /// Build the packaging command for a resolved version
    ///
    /// An unset or blank command falls back to `dotnet pack`. When the
    /// command mentions `{VERSION}` or `{RELEASENOTES}` those are replaced;
    /// otherwise a `dotnet` command gets `Version` and `PackageReleaseNotes`
    /// property overrides. Commas in injected values are escaped for MSBuild.
    pub fn for_pack(
        command_line: Option<&str>,
        pack: &PackVersion,
    ) -> Result<(Self, Option<PipelineWarning>)> {
        let command_line = command_line
            .map(str::trim)
            .filter(|c| !c.is_empty())
            .unwrap_or(DEFAULT_BUILD_COMMAND);

        let mut spec = CommandSpec::parse(command_line)?;
        let version = escape_commas(&pack.version);
        let release_notes = escape_commas(&pack.release_notes);

        if command_line.contains(VERSION_PLACEHOLDER)
            || command_line.contains(RELEASE_NOTES_PLACEHOLDER)
        {
            let substitute = |word: &str| {
                word.replace(VERSION_PLACEHOLDER, &version)
                    .replace(RELEASE_NOTES_PLACEHOLDER, &release_notes)
            };
            spec.program = substitute(&spec.program);
            spec.args = spec.args.iter().map(|arg| substitute(arg)).collect();
            return Ok((spec, None));
        }

        if is_dotnet(&spec.program) {
            spec.overrides.push(("Version".to_string(), version));
            spec.overrides
                .push(("PackageReleaseNotes".to_string(), release_notes));
            return Ok((spec, None));
        }

        let warning = PipelineWarning::VersionNotInjected {
            program: spec.program.clone(),
        };
        Ok((spec, Some(warning)))
    }

    /// Arguments followed by the rendered property overrides
    pub fn arguments(&self) -> Vec<String> {
        self.args
            .iter()
            .cloned()
            .chain(
                self.overrides
                    .iter()
                    .map(|(key, value)| format!("/p:{}={}", key, value)),
            )
            .collect()
    }
}

impl std::fmt::Display for CommandSpec {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let mut words = vec![self.program.clone()];
        words.extend(self.arguments());
        f.write_str(&shell_words::join(words))
    }
}

/// True when the program's file name starts with `dotnet`, with or without a directory or `.exe`
fn is_dotnet(program: &str) -> bool {
    std::path::Path::new(program)
        .file_stem()
        .and_then(|stem| stem.to_str())
        .is_some_and(|stem| stem.starts_with("dotnet"))
}
