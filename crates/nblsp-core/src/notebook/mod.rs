//! Notebook state: tracked documents, virtual text, and text patching.
//!
//! The registry owns every tracked notebook; the virtual document and cell
//! offsets are derived from the current cell sequence on demand.

mod document;
mod edit;
mod registry;
pub mod sync;

pub use document::{CellDocument, CellKind, Notebook, split_lines};
pub use edit::apply_edits;
pub use registry::NotebookRegistry;
