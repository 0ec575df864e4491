//! Toolchain Seams
//!
//! wasmjig does not ship a compiler or a WebAssembly engine. The embedding
//! binary supplies both:
//!
//! ```text
//! entry file ──Compiler──► CompileOutput ──Runtime──► Box<dyn GuestModule> ──► TestContext
//!                               │                ▲
//!                               ▼                │
//!                  artifacts next to entry   <stem>.imports.* or [imports]
//! ```
//!
//! Compilation of all entries runs in parallel, so compilers must be `Sync`.
//! Closures with the matching signature implement both traits.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use thiserror::Error;
use wasmjig_host::GuestModule;

/// Compiler flags and their values
pub type CompilerFlags = BTreeMap<String, Vec<String>>;

/// Why an entry produced no binary
#[derive(Debug, Error)]
pub enum CompileError {
    /// The compiler reported errors
    #[error("compilation failed: {message}")]
    Failed {
        /// Compiler diagnostics
        message: String,
    },

    /// The compiler succeeded but emitted nothing
    #[error("no binary was emitted for {}", entry.display())]
    MissingBinary {
        /// Entry that was compiled
        entry: PathBuf,
    },
}

/// A non-binary compiler output, such as a text format or a source map
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Artifact {
    /// Extension without the leading dot, e.g. `wat` or `wasm.map`
    pub extension: String,
    /// File contents
    pub contents: Vec<u8>,
}

/// Everything compiling one entry produced
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CompileOutput {
    /// The WebAssembly binary
    pub binary: Vec<u8>,
    /// Written next to the entry as `<entry stem>.<extension>`
    pub artifacts: Vec<Artifact>,
}

impl CompileOutput {
    /// Attach an extra output
    pub fn with_artifact(
        mut self,
        extension: impl Into<String>,
        contents: impl Into<Vec<u8>>,
    ) -> Self {
        let extension = extension.into();
        self.artifacts.push(Artifact {
            extension: extension.trim_start_matches('.').to_string(),
            contents: contents.into(),
        });
        self
    }
}

impl From<Vec<u8>> for CompileOutput {
    fn from(binary: Vec<u8>) -> Self {
        Self {
            binary,
            artifacts: Vec::new(),
        }
    }
}

impl Artifact {
    /// Where the artifact of `entry` lives: `a/b.spec.ts` + `wat` is `a/b.spec.wat`
    pub fn path_for(&self, entry: &Path) -> PathBuf {
        let stem = entry
            .file_stem()
            .map(|stem| stem.to_string_lossy().into_owned())
            .unwrap_or_default();
        entry.with_file_name(format!("{}.{}", stem, self.extension))
    }
}

/// Turns an entry file into a WebAssembly binary and any side outputs
pub trait Compiler: Sync {
    /// Compile `entry` together with the `added` files
    fn compile(
        &self,
        entry: &Path,
        added: &[PathBuf],
        flags: &CompilerFlags,
    ) -> Result<CompileOutput, CompileError>;
}

impl<F, O> Compiler for F
where
    F: Fn(&Path, &[PathBuf], &CompilerFlags) -> Result<O, CompileError> + Sync,
    O: Into<CompileOutput>,
{
    fn compile(
        &self,
        entry: &Path,
        added: &[PathBuf],
        flags: &CompilerFlags,
    ) -> Result<CompileOutput, CompileError> {
        self(entry, added, flags).map(Into::into)
    }
}

/// Instantiates a binary with every host import wired to `Host::invoke`
pub trait Runtime {
    /// Instantiate the module compiled from `entry`; its start code must not have run yet.
    ///
    /// `imports` names a file of extra guest imports: the entry's
    /// `<stem>.imports.*` companion if one exists, else the configured one.
    fn instantiate(
        &self,
        entry: &Path,
        binary: &[u8],
        imports: Option<&Path>,
    ) -> anyhow::Result<Box<dyn GuestModule>>;
}

impl<F> Runtime for F
where
    F: Fn(&Path, &[u8], Option<&Path>) -> anyhow::Result<Box<dyn GuestModule>>,
{
    fn instantiate(
        &self,
        entry: &Path,
        binary: &[u8],
        imports: Option<&Path>,
    ) -> anyhow::Result<Box<dyn GuestModule>> {
        self(entry, binary, imports)
    }
}

/// The `<stem>.imports.*` file next to `entry`, first by name if several exist
pub fn companion_imports(entry: &Path) -> Option<PathBuf> {
    let stem = glob::Pattern::escape(&entry.file_stem()?.to_string_lossy());
    let pattern = match entry.parent() {
        Some(dir) if !dir.as_os_str().is_empty() => format!(
            "{}/{}.imports.*",
            glob::Pattern::escape(&dir.to_string_lossy()),
            stem
        ),
        _ => format!("{}.imports.*", stem),
    };

    let mut found: Vec<PathBuf> = glob::glob(&pattern)
        .ok()?
        .filter_map(Result::ok)
        .filter(|path| path.is_file())
        .collect();
    found.sort();
    found.into_iter().next()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_compile_error_messages() {
        let failed = CompileError::Failed {
            message: "ERROR TS2304".to_string(),
        };
        assert_eq!(failed.to_string(), "compilation failed: ERROR TS2304");

        let missing = CompileError::MissingBinary {
            entry: PathBuf::from("a.spec.ts"),
        };
        assert_eq!(missing.to_string(), "no binary was emitted for a.spec.ts");
    }

    #[test]
    fn test_closure_compiler() {
        let compiler = |entry: &Path, added: &[PathBuf], flags: &CompilerFlags| {
            let mut out = entry.to_string_lossy().into_owned().into_bytes();
            out.push(added.len() as u8);
            out.push(flags.len() as u8);
            Ok::<_, CompileError>(out)
        };
        let output = compiler
            .compile(Path::new("x"), &[PathBuf::from("y")], &CompilerFlags::new())
            .unwrap();
        assert_eq!(output.binary, vec![b'x', 1, 0]);
        assert!(output.artifacts.is_empty());
    }

    #[test]
    fn test_artifact_path_replaces_entry_extension() {
        let output = CompileOutput::from(vec![0])
            .with_artifact("wat", "(module)")
            .with_artifact(".wasm.map", "{}");

        assert_eq!(output.artifacts[0].contents, b"(module)".to_vec());
        assert_eq!(output.artifacts[1].extension, "wasm.map");

        let entry = Path::new("tests/math.spec.ts");
        assert_eq!(
            output.artifacts[0].path_for(entry),
            PathBuf::from("tests/math.spec.wat")
        );
        assert_eq!(
            output.artifacts[1].path_for(entry),
            PathBuf::from("tests/math.spec.wasm.map")
        );
    }

    #[test]
    fn test_companion_imports_lookup() {
        let dir = tempfile::tempdir().unwrap();
        let entry = dir.path().join("math.spec.ts");
        std::fs::write(&entry, "").unwrap();
        assert!(companion_imports(&entry).is_none());

        std::fs::write(dir.path().join("other.spec.imports.js"), "").unwrap();
        std::fs::create_dir(dir.path().join("math.spec.imports.d")).unwrap();
        assert!(companion_imports(&entry).is_none());

        std::fs::write(dir.path().join("math.spec.imports.wat"), "").unwrap();
        std::fs::write(dir.path().join("math.spec.imports.js"), "").unwrap();
        assert_eq!(
            companion_imports(&entry),
            Some(dir.path().join("math.spec.imports.js"))
        );
    }
}
