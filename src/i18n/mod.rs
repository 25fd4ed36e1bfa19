//! Language metadata shared by the content catalog and the proxy routes.
//!
//! - `registry`: the fixed set of supported languages and their metadata
//! - `language`: a validated `Language` handle backed by the registry
//!
//! # Example
//!
//! ```rust,ignore
//! use polyglot_tutor::i18n::Language;
//!
//! let portuguese = Language::resolve("lang_pt")?;
//! assert_eq!(portuguese.code(), "pt");
//! ```

mod language;
mod registry;

pub use language::Language;
pub use registry::{LanguageConfig, LanguageRegistry};
