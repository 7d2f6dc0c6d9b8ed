pub mod batch;
pub mod execute;
pub mod export;
pub mod registry;
pub mod rewrite;

pub use batch::{BatchCoordinator, BatchError, BatchErrorKind};
pub use execute::{DanglingEdgePolicy, Executor};
pub use export::{export_mermaid, MermaidExporter};
pub use registry::PlaceholderRegistry;
pub use rewrite::rewrite_batch;
