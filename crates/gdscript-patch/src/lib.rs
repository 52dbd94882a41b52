//! GDScript Function Patching
//!
//! This crate rewrites GDScript sources one function at a time. It is the engine
//! behind the `modify_gdscript` tool of `godot-mcp`, and works on plain text: no
//! parser, no AST, just an indentation-aware line scanner.
//!
//! # Example
//!
//! ```
//! use gdscript_patch::{PatchOutcome, PatchRequest};
//!
//! let script = "extends Node\n\nfunc _ready():\n\tpass\n";
//!
//! // Replace an existing function
//! let patched = PatchRequest::new("_ready", "func _ready():\n\tprint(\"hi\")")
//!     .apply(script)
//!     .unwrap();
//! assert_eq!(patched.outcome, PatchOutcome::Replaced { line: 3 });
//!
//! // Patching again with the same body changes nothing
//! let again = PatchRequest::new("_ready", "func _ready():\n\tprint(\"hi\")")
//!     .apply(&patched.text)
//!     .unwrap();
//! assert_eq!(again.text, patched.text);
//! ```
//!
//! # Modules
//!
//! - [`scan`]: Line classification (indentation, brackets, strings, continuations)
//! - [`patch`]: Function replacement and insertion
//! - [`analysis`]: Top-level declaration recognition and script summaries
//! - [`script`]: Composition of new script files
//! - [`file`]: Scoped read/patch/write of script files
//! - [`error`]: Error taxonomy with stable codes

pub mod analysis;
pub mod error;
pub mod file;
pub mod patch;
pub mod scan;
pub mod script;

// Re-export commonly used types at the crate root
pub use analysis::{analyze, ScriptSummary};
pub use error::PatchError;
pub use file::{patch_file, read_source, write_source, FilePatchReport};
pub use patch::{patch, PatchOutcome, PatchRequest, Patched};
pub use script::compose_script;
