//! Fragment Include — compose HTML documents from remote fragments.
//!
//! Elements carrying a marker attribute (`data-include` by default) are
//! replaced, one at a time and in document order, by the markup fetched from
//! the locator in that attribute.

pub mod config;
pub mod document;
pub mod fetch;
pub mod includer;
pub mod types;

pub use config::{IncludeConfig, DEFAULT_ATTRIBUTE};
pub use document::Document;
pub use fetch::{resolve_locator, FragmentSource, HttpFragmentSource};
pub use includer::{include, FragmentIncluder};
pub use types::*;
