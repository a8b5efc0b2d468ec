pub mod compile;
pub mod loader;
pub mod schema;

pub use compile::compile_file;
pub use loader::{load_from_path, load_from_str, CatalogError};
pub use schema::{
    Action, Catalog, IdiomDefinition, Metadata, PatternContext, Target, TargetKind,
    ValidationError, ValidationIssue,
};
