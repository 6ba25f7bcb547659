//! Include resolution.
//!
//! `@include { path: "./part.osf"; }` blocks are replaced by the blocks of
//! the referenced file, recursively and in document order.
//!
//! # Rules
//!
//! For every include, in this order:
//!
//! 1. Absolute paths are rejected.
//! 2. The path is resolved against the including file's directory and
//!    normalised lexically; it must stay inside the base directory. The
//!    check never touches the filesystem, so a traversal attempt fails the
//!    same way whether or not its target exists.
//! 3. A file already on the active include chain is a circular reference.
//!    Including the same file from two siblings is fine.
//! 4. Nesting deeper than the configured limit (at most 10) is rejected.
//! 5. The file is read through a [`SourceReader`]; a missing file is a
//!    resolution error naming the requesting file.
//!
//! Errors raised while processing an included file are wrapped in
//! [`OsfError::Included`] so callers see both the inner position and where
//! the include sits.
//!
//! # Example
//!
//! ```
//! use osf_core::config::ParserConfig;
//! use osf_core::include::{IncludeResolver, MemoryReader};
//!
//! let reader = MemoryReader::new()
//!     .with_file("/docs/intro.osf", r#"@doc { content: "Hello"; }"#);
//! let config = ParserConfig::new("/docs");
//! let resolver = IncludeResolver::new(&config, &reader);
//!
//! let doc = resolver.resolve_source(
//!     r#"@include { path: "./intro.osf"; }"#,
//!     None,
//! )?;
//! assert_eq!(doc.len(), 1);
//! # Ok::<(), osf_core::OsfError>(())
//! ```

use std::collections::HashMap;
use std::io;
use std::path::{Component, Path, PathBuf};

use osf_ast::{Block, Document};
use tracing::{debug, trace};

use crate::config::ParserConfig;
use crate::error::{OsfError, Position, ResolutionKind, Result};
use crate::parser::{parse_located, LocatedBlock};
use crate::FORMAT_VERSION;

/// Read access to include targets
pub trait SourceReader {
    /// Read a whole file as UTF-8 text
    fn read(&self, path: &Path) -> io::Result<String>;
}

/// Reads include targets from the filesystem
#[derive(Debug, Clone, Copy, Default)]
pub struct FsReader;

impl SourceReader for FsReader {
    fn read(&self, path: &Path) -> io::Result<String> {
        std::fs::read_to_string(path)
    }
}

/// Serves include targets from memory, keyed by normalised path
#[derive(Debug, Clone, Default)]
pub struct MemoryReader {
    files: HashMap<PathBuf, String>,
}

impl MemoryReader {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a file
    pub fn insert(&mut self, path: impl AsRef<Path>, text: impl Into<String>) {
        self.files.insert(normalize(path.as_ref()), text.into());
    }

    /// Builder form of [`MemoryReader::insert`]
    pub fn with_file(mut self, path: impl AsRef<Path>, text: impl Into<String>) -> Self {
        self.insert(path, text);
        self
    }
}

impl SourceReader for MemoryReader {
    fn read(&self, path: &Path) -> io::Result<String> {
        self.files
            .get(&normalize(path))
            .cloned()
            .ok_or_else(|| io::Error::new(io::ErrorKind::NotFound, path.display().to_string()))
    }
}

/// Normalise `.` and `..` components without consulting the filesystem
///
/// `..` never climbs above a root; leading `..` of a relative path is kept.
pub fn normalize(path: &Path) -> PathBuf {
    let mut out = PathBuf::new();
    for component in path.components() {
        match component {
            Component::CurDir => {}
            Component::ParentDir => match out.components().next_back() {
                Some(Component::Normal(_)) => {
                    out.pop();
                }
                Some(Component::RootDir | Component::Prefix(_)) => {}
                _ => out.push(".."),
            },
            other => out.push(other.as_os_str()),
        }
    }
    out
}

fn absolute(path: &Path) -> Result<PathBuf> {
    if path.is_absolute() {
        return Ok(normalize(path));
    }
    let cwd = std::env::current_dir().map_err(|source| OsfError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    Ok(normalize(&cwd.join(path)))
}

/// Expands include blocks into a fully resolved document
pub struct IncludeResolver<'r> {
    config: &'r ParserConfig,
    reader: &'r dyn SourceReader,
}

impl<'r> IncludeResolver<'r> {
    pub fn new(config: &'r ParserConfig, reader: &'r dyn SourceReader) -> Self {
        Self { config, reader }
    }

    /// Read, parse and resolve a root file
    ///
    /// Without a configured base directory, includes are confined to the
    /// root file's directory.
    pub fn resolve_file(&self, path: &Path) -> Result<Document> {
        let root = absolute(path)?;
        let base = match self.config.base_dir() {
            Some(dir) => absolute(dir)?,
            None => root.parent().map(Path::to_path_buf).unwrap_or_default(),
        };
        let text = self.reader.read(&root).map_err(|source| OsfError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        self.walk(base).root(&text, root)
    }

    /// Parse and resolve in-memory text
    ///
    /// `origin` is the path the text would have on disk; includes resolve
    /// against its directory. Without it they resolve against the base
    /// directory.
    pub fn resolve_source(&self, text: &str, origin: Option<&Path>) -> Result<Document> {
        let base = match self.config.base_dir() {
            Some(dir) => absolute(dir)?,
            None => absolute(Path::new("."))?,
        };
        let origin = match origin {
            Some(path) => absolute(path)?,
            None => base.join("<input>"),
        };
        self.walk(base).root(text, origin)
    }

    fn walk(&self, base: PathBuf) -> Walk<'_> {
        Walk {
            reader: self.reader,
            base,
            limit: self.config.depth_limit(),
        }
    }
}

/// State for one resolution run
struct Walk<'a> {
    reader: &'a dyn SourceReader,
    base: PathBuf,
    limit: usize,
}

impl Walk<'_> {
    fn root(&self, text: &str, origin: PathBuf) -> Result<Document> {
        debug!(base = %self.base.display(), file = %origin.display(), "resolving includes");
        let blocks = parse_located(text)?;
        let mut chain = vec![origin];
        let mut out = Vec::new();
        self.expand(blocks, &mut chain, &mut out)?;

        let mut doc = Document::with_version(FORMAT_VERSION);
        doc.blocks = out;
        Ok(doc)
    }

    /// Path as shown in messages: relative to the base when possible
    fn shown(&self, path: &Path) -> PathBuf {
        path.strip_prefix(&self.base).unwrap_or(path).to_path_buf()
    }

    /// Splice `blocks` into `out`; `chain` holds the active include chain,
    /// ending with the file the blocks came from
    fn expand(
        &self,
        blocks: Vec<LocatedBlock>,
        chain: &mut Vec<PathBuf>,
        out: &mut Vec<Block>,
    ) -> Result<()> {
        for located in blocks {
            let include = match located.block {
                Block::Include(include) => include,
                other => {
                    out.push(other);
                    continue;
                }
            };
            let at = located.position;
            let current = chain.last().cloned().unwrap_or_default();

            let target = self.locate(&include.path, &current, at)?;

            if chain.contains(&target) {
                let cycle = chain
                    .iter()
                    .skip_while(|p| **p != target)
                    .chain(std::iter::once(&target))
                    .map(|p| self.shown(p).display().to_string())
                    .collect::<Vec<_>>()
                    .join(" -> ");
                return Err(OsfError::resolution(
                    ResolutionKind::CircularReference,
                    format!("Circular include detected: {}", cycle),
                    self.shown(&current),
                    include.path,
                    Some(at),
                ));
            }

            let depth = chain.len();
            if depth > self.limit {
                return Err(OsfError::resolution(
                    ResolutionKind::DepthLimit,
                    format!(
                        "Include depth limit of {} exceeded at '{}'",
                        self.limit, include.path
                    ),
                    self.shown(&current),
                    include.path,
                    Some(at),
                ));
            }

            let text = self.read(&target, &current, &include.path, at)?;
            debug!(path = %self.shown(&target).display(), depth, "including file");

            chain.push(target.clone());
            let result = parse_located(&text).and_then(|inner| self.expand(inner, chain, out));
            chain.pop();
            result.map_err(|err| OsfError::included(self.shown(&target), at, err))?;
        }
        Ok(())
    }

    /// Resolve an include path against the including file and check containment
    fn locate(&self, raw: &str, current: &Path, at: Position) -> Result<PathBuf> {
        let requested = Path::new(raw);
        if requested.is_absolute() || requested.has_root() || raw.starts_with(['/', '\\']) {
            return Err(OsfError::security(raw, self.shown(current), Some(at)));
        }

        let dir = current.parent().unwrap_or(Path::new(""));
        let target = normalize(&dir.join(requested));
        trace!(raw, target = %target.display(), "located include");

        if target.starts_with(&self.base) && target != self.base {
            Ok(target)
        } else {
            Err(OsfError::security(raw, self.shown(current), Some(at)))
        }
    }

    /// Read an include target; the handle does not outlive this call
    fn read(&self, target: &Path, current: &Path, raw: &str, at: Position) -> Result<String> {
        self.reader.read(target).map_err(|err| {
            if err.kind() == io::ErrorKind::NotFound {
                OsfError::resolution(
                    ResolutionKind::FileNotFound,
                    format!(
                        "Include file not found: '{}' (requested by {})",
                        raw,
                        self.shown(current).display()
                    ),
                    self.shown(current),
                    raw,
                    Some(at),
                )
            } else {
                OsfError::Io {
                    path: target.to_path_buf(),
                    source: err,
                }
            }
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorKind;

    fn resolve(reader: &MemoryReader, root: &str) -> Result<Document> {
        let config = ParserConfig::new("/docs");
        IncludeResolver::new(&config, reader).resolve_file(Path::new(root))
    }

    #[test]
    fn test_normalize() {
        assert_eq!(normalize(Path::new("/a/./b/../c")), PathBuf::from("/a/c"));
        assert_eq!(normalize(Path::new("/../../etc")), PathBuf::from("/etc"));
        assert_eq!(normalize(Path::new("../x/./y")), PathBuf::from("../x/y"));
        assert_eq!(normalize(Path::new("a/../../b")), PathBuf::from("../b"));
    }

    #[test]
    fn test_splices_in_order() {
        let reader = MemoryReader::new()
            .with_file("/docs/main.osf", "@meta { title: \"Main\"; }\n@include { path: \"./parts/a.osf\"; }\n@doc { content: \"end\"; }")
            .with_file("/docs/parts/a.osf", "@doc { content: \"a\"; }\n@include { path: \"b.osf\"; }")
            .with_file("/docs/parts/b.osf", "@doc { content: \"b\"; }");

        let doc = resolve(&reader, "/docs/main.osf").unwrap();
        let contents: Vec<_> = doc
            .blocks
            .iter()
            .filter_map(|b| match b {
                Block::Doc(d) => Some(d.content.as_str()),
                _ => None,
            })
            .collect();
        assert_eq!(contents, vec!["a", "b", "end"]);
        assert!(doc.is_resolved());
    }

    #[test]
    fn test_traversal_without_target() {
        let reader = MemoryReader::new()
            .with_file("/docs/main.osf", "@include { path: \"../../../../etc/passwd\"; }");
        let err = resolve(&reader, "/docs/main.osf").unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Security);
        assert_eq!(err.position(), Some(Position::new(1, 1)));
    }

    #[test]
    fn test_absolute_path_rejected() {
        let reader = MemoryReader::new()
            .with_file("/docs/main.osf", "@include { path: \"/docs/other.osf\"; }")
            .with_file("/docs/other.osf", "");
        let err = resolve(&reader, "/docs/main.osf").unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Security);
    }

    #[test]
    fn test_dotdot_that_stays_inside_is_allowed() {
        let reader = MemoryReader::new()
            .with_file("/docs/sub/main.osf", "@include { path: \"../shared.osf\"; }")
            .with_file("/docs/shared.osf", "@doc { content: \"shared\"; }");
        assert_eq!(resolve(&reader, "/docs/sub/main.osf").unwrap().len(), 1);
    }

    #[test]
    fn test_cycle() {
        let reader = MemoryReader::new()
            .with_file("/docs/a.osf", "@include { path: \"b.osf\"; }")
            .with_file("/docs/b.osf", "@include { path: \"a.osf\"; }");
        let err = resolve(&reader, "/docs/a.osf").unwrap_err();
        assert_eq!(err.resolution_kind(), Some(ResolutionKind::CircularReference));
        assert!(err.to_string().contains("a.osf -> b.osf -> a.osf"));
    }

    #[test]
    fn test_self_include() {
        let reader = MemoryReader::new().with_file("/docs/a.osf", "@include { path: \"./a.osf\"; }");
        let err = resolve(&reader, "/docs/a.osf").unwrap_err();
        assert_eq!(err.resolution_kind(), Some(ResolutionKind::CircularReference));
    }

    #[test]
    fn test_diamond_is_not_a_cycle() {
        let reader = MemoryReader::new()
            .with_file("/docs/main.osf", "@include { path: \"left.osf\"; }\n@include { path: \"right.osf\"; }")
            .with_file("/docs/left.osf", "@include { path: \"shared.osf\"; }")
            .with_file("/docs/right.osf", "@include { path: \"shared.osf\"; }")
            .with_file("/docs/shared.osf", "@doc { content: \"s\"; }");
        assert_eq!(resolve(&reader, "/docs/main.osf").unwrap().len(), 2);
    }

    #[test]
    fn test_missing_file() {
        let reader = MemoryReader::new()
            .with_file("/docs/main.osf", "\n@include { path: \"./missing.osf\"; }");
        let err = resolve(&reader, "/docs/main.osf").unwrap_err();
        assert_eq!(err.resolution_kind(), Some(ResolutionKind::FileNotFound));
        assert_eq!(
            err.to_string(),
            "Include file not found: './missing.osf' (requested by main.osf) at 2:1"
        );
    }

    #[test]
    fn test_error_inside_include_is_wrapped() {
        let reader = MemoryReader::new()
            .with_file("/docs/main.osf", "@doc { content: \"x\"; }\n\n@include { path: \"bad.osf\"; }")
            .with_file("/docs/bad.osf", "@meta {\n  title: \"unterminated;\n}");
        let err = resolve(&reader, "/docs/main.osf").unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Lex);
        assert_eq!(err.position(), Some(Position::new(2, 10)));
        assert_eq!(err.file(), Some(Path::new("bad.osf")));
        match &err {
            OsfError::Included { position, .. } => assert_eq!(*position, Position::new(3, 1)),
            other => panic!("expected wrapper, got {other:?}"),
        }
    }

    #[test]
    fn test_depth_limit() {
        fn chain(levels: usize) -> MemoryReader {
            let mut reader = MemoryReader::new();
            reader.insert("/docs/f0.osf", "@include { path: \"f1.osf\"; }");
            for i in 1..levels {
                reader.insert(
                    format!("/docs/f{i}.osf"),
                    format!("@include {{ path: \"f{}.osf\"; }}", i + 1),
                );
            }
            reader.insert(format!("/docs/f{levels}.osf"), "@doc { content: \"leaf\"; }");
            reader
        }

        assert_eq!(resolve(&chain(10), "/docs/f0.osf").unwrap().len(), 1);

        let err = resolve(&chain(11), "/docs/f0.osf").unwrap_err();
        assert_eq!(err.resolution_kind(), Some(ResolutionKind::DepthLimit));
    }

    #[test]
    fn test_resolve_source_uses_base() {
        let reader = MemoryReader::new().with_file("/docs/x.osf", "@doc { content: \"x\"; }");
        let config = ParserConfig::new("/docs");
        let doc = IncludeResolver::new(&config, &reader)
            .resolve_source("@include { path: \"x.osf\"; }", None)
            .unwrap();
        assert_eq!(doc.len(), 1);
        assert_eq!(doc.version.as_deref(), Some(FORMAT_VERSION));
    }
}
