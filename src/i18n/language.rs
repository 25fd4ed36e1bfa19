//! Validated language handle.

use crate::i18n::{LanguageConfig, LanguageRegistry};
use anyhow::{bail, Result};

/// A language that is known to exist in the registry.
///
/// Only constructible through the constants or `resolve`, so `config()` can
/// never miss.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Language {
    /// Catalog identifier (e.g. "lang_pt")
    id: &'static str,
}

impl Language {
    pub const ENGLISH: Language = Language { id: "lang_en" };
    pub const PORTUGUESE: Language = Language { id: "lang_pt" };
    pub const SWAHILI: Language = Language { id: "lang_sw" };

    /// Build a language from a catalog id ("lang_pt") or ISO code ("pt").
    ///
    /// # Returns
    /// * `Ok(Language)` if the value is registered
    /// * `Err` naming the unknown value otherwise
    pub fn resolve(id_or_code: &str) -> Result<Language> {
        match LanguageRegistry::get().resolve(id_or_code) {
            Some(config) => Ok(Language { id: config.id }),
            None => bail!("Unknown language: '{}'", id_or_code),
        }
    }

    pub fn id(&self) -> &'static str {
        self.id
    }

    /// Full registry entry for this language.
    ///
    /// # Panics
    /// Panics only if a `Language` was built without going through the
    /// registry, which the private field prevents.
    pub fn config(&self) -> &'static LanguageConfig {
        LanguageRegistry::get()
            .get_by_id(self.id)
            .expect("Language id should always be registered")
    }

    /// ISO 639-1 code, as expected by translation upstreams.
    pub fn code(&self) -> &'static str {
        self.config().code
    }

    /// English name, used when prompting the chat model.
    pub fn name(&self) -> &'static str {
        self.config().name
    }

    pub fn is_learnable(&self) -> bool {
        self.config().learnable
    }
}
