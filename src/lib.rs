//! Idiom Patcher: syntax-aware cleanup of machine-translated Kotlin
//!
//! Source files are rewritten by structural templates and by fragment
//! insertion into existing declarations, without reformatting anything the
//! edits do not touch.
//!
//! # Architecture
//!
//! All edits compile down to a single primitive: [`Patch`], a byte-span
//! replacement. Intelligence lives in span acquisition (template matching in
//! [`template`], declaration anatomy in [`insert`]), not in the application
//! logic. [`PatchSet`] rejects overlapping patches and applies the rest
//! bottom-to-top, so the result does not depend on patch order.
//!
//! # Safety
//!
//! - Every rewrite and insertion is re-parsed before it is kept
//! - A file that does not parse is never touched
//! - Atomic file writes (tempfile + fsync + rename)
//! - Every pass is idempotent
//!
//! # Example
//!
//! ```no_run
//! use idiom_patcher::{KotlinParser, Pass, Replacement, RewritePass, Rule};
//!
//! let mut parser = KotlinParser::new().unwrap();
//! let rule = Rule::compile(
//!     &mut parser,
//!     "lib-equals",
//!     "Lib.equals(#a#, #b#)",
//!     Replacement::operand_template("#a# == #b#"),
//! )
//! .unwrap();
//!
//! let output = RewritePass::new(rule)
//!     .run(&mut parser, "val same = Lib.equals(x, y)\n")
//!     .unwrap();
//! assert_eq!(output, "val same = x == y\n");
//! ```

pub mod catalog;
pub mod driver;
pub mod insert;
pub mod pass;
pub mod patch;
pub mod syntax;
pub mod template;

// Re-exports
pub use catalog::{compile_file, load_from_path, load_from_str, Catalog, CatalogError};
pub use driver::{BatchReport, Driver, DriverError, FileOutcome, FileReport};
pub use insert::{
    insert_decorator, insert_member, insert_supertype, StructuralEdit, StructuralEditError,
};
pub use pass::{
    builtin_passes, DeclarationKind, DeclarationSelector, Pass, PassError, RedundantVarPass,
    RewritePass, StructuralPass,
};
pub use patch::{apply_patches, Patch, PatchError, PatchSet};
pub use syntax::{
    ExtractionError, FragmentKind, KotlinParser, Node, ParseError, SourceSpan, SyntaxError,
    SyntaxKind, SyntaxTree,
};
pub use template::{find_matches, Match, Replacement, Rule, Template, TemplateError};
