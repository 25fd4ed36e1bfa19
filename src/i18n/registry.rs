//! Language registry: single source of truth for every language the content
//! catalog and the proxies know about.
//!
//! The registry is a lazily initialized singleton built on `OnceLock`, so it
//! can be consulted from request handlers without threading it through state.

use serde::Serialize;
use std::sync::OnceLock;

/// Metadata for a supported language.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LanguageConfig {
    /// Catalog identifier used by every dataset (e.g. "lang_pt")
    pub id: &'static str,

    /// ISO 639-1 language code (e.g. "pt")
    pub code: &'static str,

    /// English name of the language (e.g. "Portuguese")
    pub name: &'static str,

    /// Native name of the language (e.g. "Português")
    pub native_name: &'static str,

    /// Whether this is the interface language the learner starts from
    pub is_source: bool,

    /// Whether learners can pick this language as a study target
    pub learnable: bool,
}

/// Global language registry.
pub struct LanguageRegistry {
    languages: Vec<LanguageConfig>,
}

static REGISTRY: OnceLock<LanguageRegistry> = OnceLock::new();

impl LanguageRegistry {
    /// Get the global registry, initializing it on first access.
    pub fn get() -> &'static LanguageRegistry {
        REGISTRY.get_or_init(|| LanguageRegistry {
            languages: default_languages(),
        })
    }

    /// Look a language up by its catalog id ("lang_pt").
    pub fn get_by_id(&self, id: &str) -> Option<&LanguageConfig> {
        self.languages.iter().find(|lang| lang.id == id)
    }

    /// Look a language up by its ISO code ("pt").
    pub fn get_by_code(&self, code: &str) -> Option<&LanguageConfig> {
        self.languages.iter().find(|lang| lang.code == code)
    }

    /// Resolve either form. Catalog ids win over codes.
    pub fn resolve(&self, id_or_code: &str) -> Option<&LanguageConfig> {
        let key = id_or_code.trim();
        self.get_by_id(key).or_else(|| self.get_by_code(key))
    }

    /// All registered languages, in registry order.
    pub fn list_all(&self) -> Vec<&LanguageConfig> {
        self.languages.iter().collect()
    }
}

/// English is the interface language; Portuguese and Swahili are taught.
fn default_languages() -> Vec<LanguageConfig> {
    vec![
        LanguageConfig {
            id: "lang_en",
            code: "en",
            name: "English",
            native_name: "English",
            is_source: true,
            learnable: false,
        },
        LanguageConfig {
            id: "lang_pt",
            code: "pt",
            name: "Portuguese",
            native_name: "Português",
            is_source: false,
            learnable: true,
        },
        LanguageConfig {
            id: "lang_sw",
            code: "sw",
            name: "Swahili",
            native_name: "Kiswahili",
            is_source: false,
            learnable: true,
        },
    ]
}
