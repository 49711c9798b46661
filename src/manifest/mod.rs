//! Gomfile data model, parsing and rendering.
//!
//! - [`model`] - `DependencySpec` and its options
//! - [`parser`] - locating and parsing `Gomfile` / `Gomfile.lock`
//! - [`writer`] - rendering entries back to Gomfile syntax

pub mod model;
pub mod parser;
pub mod writer;

pub use model::{DependencyOptions, DependencySpec, OptionValue};
pub use parser::{LOCK_FILE, MANIFEST_FILE, load, locate, parse_file, parse_str};
pub use writer::{render, render_entry};
