//! Document root
//!
//! A [`Document`] is an ordered sequence of blocks plus an optional format
//! version tag. It is built once per parse and treated as immutable by every
//! consumer; include resolution produces a new document rather than editing
//! the partial one.

use serde::{Deserialize, Serialize};

use crate::block::{Block, BlockKind, Meta};

/// A complete document
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct Document {
    /// Format version tag
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub version: Option<String>,
    /// Document content blocks, in source order
    pub blocks: Vec<Block>,
}

impl Document {
    /// Create a new empty document
    pub fn new() -> Self {
        Self::default()
    }

    /// Create an empty document with a version tag
    pub fn with_version(version: impl Into<String>) -> Self {
        Self {
            version: Some(version.into()),
            blocks: Vec::new(),
        }
    }

    /// Add a block to the document
    pub fn push(&mut self, block: Block) {
        self.blocks.push(block);
    }

    /// Check if the document is empty (no blocks)
    pub fn is_empty(&self) -> bool {
        self.blocks.is_empty()
    }

    /// Get the number of blocks
    pub fn len(&self) -> usize {
        self.blocks.len()
    }

    /// The first `@meta` block, if any
    pub fn meta(&self) -> Option<&Meta> {
        self.blocks.iter().find_map(|block| match block {
            Block::Meta(meta) => Some(meta),
            _ => None,
        })
    }

    /// Iterate over blocks of one kind
    pub fn blocks_of(&self, kind: BlockKind) -> impl Iterator<Item = &Block> {
        self.blocks.iter().filter(move |block| block.kind() == kind)
    }

    /// True when no `@include` block is left
    pub fn is_resolved(&self) -> bool {
        self.blocks_of(BlockKind::Include).next().is_none()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::block::{DocBlock, Include};

    #[test]
    fn test_empty_document() {
        let doc = Document::new();
        assert!(doc.is_empty());
        assert_eq!(doc.len(), 0);
        assert!(doc.is_resolved());
    }

    #[test]
    fn test_meta_lookup() {
        let mut doc = Document::with_version("1.2");
        doc.push(Block::Doc(DocBlock {
            content: "# Hi".into(),
        }));
        assert!(doc.meta().is_none());

        doc.push(Block::Meta(Meta {
            title: Some("Report".into()),
            ..Default::default()
        }));
        assert_eq!(doc.meta().and_then(|m| m.title.as_deref()), Some("Report"));
    }

    #[test]
    fn test_unresolved_include() {
        let mut doc = Document::new();
        doc.push(Block::Include(Include {
            path: "./part.osf".into(),
        }));
        assert!(!doc.is_resolved());
        assert_eq!(doc.blocks_of(BlockKind::Include).count(), 1);
    }
}
