//! osf-ast - Document model for the OmniScript Format
//!
//! This crate provides the typed document model produced by the OSF parser
//! and consumed by the serializer, the HTML projector and external
//! converters.

pub mod block;
pub mod cell;
pub mod document;

pub use block::{
    Alignment, Block, BlockKind, Chart, ChartOptions, ChartSeries, ChartType, CodeBlock, Diagram,
    DiagramEngine, DiagramType, DocBlock, Include, Meta, Sheet, Slide, SlideContent, SlideLayout,
    Table, TableStyle, UnknownVariant,
};
pub use cell::{CellRef, CellValue, InvalidCellRef};
pub use document::Document;

/// Crate version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
