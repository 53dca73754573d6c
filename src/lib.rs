// Core functionality
pub mod core {
    pub mod config;
    pub mod entry;
    pub mod error;
}

// Indexing pipeline
pub mod indexing {
    pub mod annotations;
    pub mod discovery;
    pub mod extractor;
    pub mod lint;
    pub mod source;
}

// Cached index
pub mod storage {
    pub mod index;
}

// Query parsing, filtering & grouping
pub mod search {
    pub mod engine;
    pub mod grouper;
    pub mod query;
}

// User interfaces
pub mod ui {
    pub mod cli;
    pub mod format;
}

// Re-export commonly used types
pub use crate::core::config::{self, Config};
pub use crate::core::entry::{Annotations, Entry};
pub use crate::core::error::{self, Error, Result};
pub use indexing::annotations::AnnotationExtractor;
pub use indexing::discovery::discover_files;
pub use indexing::extractor::TaskExtractor;
pub use indexing::lint;
pub use indexing::source::{RakeSource, TaskSource};
pub use search::engine::{Engine, MatchContext, SearchOutcome};
pub use search::grouper::{Dimension, Group, ResultGrouper};
pub use search::query::{FilterKey, Query};
pub use storage::index::Index;
pub use ui::cli;
pub use ui::format::ResultFormatter;
