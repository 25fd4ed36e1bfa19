use crate::config::Config;
use crate::fallback::with_fallback;
use crate::i18n::Language;
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::debug;

/// A hosted translation API.
#[derive(Debug, Clone, PartialEq)]
pub enum TranslationBackend {
    /// Google Cloud Translation v2 (REST, API key auth)
    Google { api_url: String, api_key: String },
    /// A LibreTranslate instance; the key is only needed on hosted instances
    LibreTranslate {
        base_url: String,
        api_key: Option<String>,
    },
}

#[derive(Debug, Serialize)]
struct GoogleRequest<'a> {
    q: &'a str,
    source: &'a str,
    target: &'a str,
    format: &'static str,
}

#[derive(Debug, Deserialize)]
struct GoogleResponse {
    data: GoogleData,
}

#[derive(Debug, Deserialize)]
struct GoogleData {
    translations: Vec<GoogleTranslation>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct GoogleTranslation {
    translated_text: String,
}

#[derive(Debug, Serialize)]
struct LibreRequest<'a> {
    q: &'a str,
    source: &'a str,
    target: &'a str,
    format: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    api_key: Option<&'a str>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct LibreResponse {
    translated_text: String,
}

impl TranslationBackend {
    pub fn name(&self) -> &'static str {
        match self {
            TranslationBackend::Google { .. } => "google",
            TranslationBackend::LibreTranslate { .. } => "libretranslate",
        }
    }

    async fn translate(
        &self,
        client: &reqwest::Client,
        text: &str,
        source: &str,
        target: &str,
    ) -> Result<String> {
        match self {
            TranslationBackend::Google { api_url, api_key } => {
                let response = client
                    .post(api_url)
                    .query(&[("key", api_key.as_str())])
                    .json(&GoogleRequest {
                        q: text,
                        source,
                        target,
                        format: "text",
                    })
                    .send()
                    .await
                    .context("Failed to send request to Google Translate API")?;

                if !response.status().is_success() {
                    let status = response.status();
                    let body = response
                        .text()
                        .await
                        .unwrap_or_else(|e| format!("<failed to read body: {}>", e));
                    anyhow::bail!("Google Translate API error ({}): {}", status, body);
                }

                let parsed: GoogleResponse = response
                    .json()
                    .await
                    .context("Failed to parse Google Translate response")?;

                parsed
                    .data
                    .translations
                    .into_iter()
                    .next()
                    .map(|t| t.translated_text)
                    .context("Google Translate response contained no translations")
            }
            TranslationBackend::LibreTranslate { base_url, api_key } => {
                let url = format!("{}/translate", base_url.trim_end_matches('/'));
                let response = client
                    .post(&url)
                    .json(&LibreRequest {
                        q: text,
                        source,
                        target,
                        format: "text",
                        api_key: api_key.as_deref(),
                    })
                    .send()
                    .await
                    .context("Failed to send request to LibreTranslate")?;

                if !response.status().is_success() {
                    let status = response.status();
                    let body = response
                        .text()
                        .await
                        .unwrap_or_else(|e| format!("<failed to read body: {}>", e));
                    anyhow::bail!("LibreTranslate API error ({}): {}", status, body);
                }

                let parsed: LibreResponse = response
                    .json()
                    .await
                    .context("Failed to parse LibreTranslate response")?;

                Ok(parsed.translated_text)
            }
        }
    }
}

/// Map a registry id ("lang_pt") to its ISO code; anything else is passed
/// through trimmed, so plain codes like "fr" still reach the upstream.
pub fn language_code(value: &str) -> String {
    match Language::resolve(value) {
        Ok(language) => language.code().to_string(),
        Err(_) => value.trim().to_lowercase(),
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Translation {
    pub text: String,
    pub backend: &'static str,
    /// True when the preferred backend failed and a later one answered
    pub fell_back: bool,
}

/// Ordered chain of translation backends sharing one per-attempt timeout.
#[derive(Debug, Clone)]
pub struct Translator {
    backends: Vec<TranslationBackend>,
    per_attempt: Duration,
}

impl Translator {
    pub fn new(backends: Vec<TranslationBackend>, per_attempt: Duration) -> Self {
        Self {
            backends,
            per_attempt,
        }
    }

    /// Google first when a key is set, then LibreTranslate when a URL is set.
    pub fn from_config(config: &Config) -> Self {
        let mut backends = Vec::new();
        if let Some(api_key) = &config.google_translate_api_key {
            backends.push(TranslationBackend::Google {
                api_url: config.google_translate_api_url.clone(),
                api_key: api_key.clone(),
            });
        }
        if let Some(base_url) = &config.libretranslate_url {
            backends.push(TranslationBackend::LibreTranslate {
                base_url: base_url.clone(),
                api_key: config.libretranslate_api_key.clone(),
            });
        }
        Self::new(backends, config.translate_timeout)
    }

    pub fn backends(&self) -> &[TranslationBackend] {
        &self.backends
    }

    pub fn is_configured(&self) -> bool {
        !self.backends.is_empty()
    }

    /// Translate `text` between two languages, given as registry ids or ISO
    /// codes.
    pub async fn translate(
        &self,
        client: &reqwest::Client,
        text: &str,
        source: &str,
        target: &str,
    ) -> Result<Translation> {
        if text.trim().is_empty() {
            anyhow::bail!("Nothing to translate");
        }
        if !self.is_configured() {
            anyhow::bail!("No translation backend configured");
        }

        let source = language_code(source);
        let target = language_code(target);
        debug!(source = %source, target = %target, "Translating {} chars", text.len());

        // A lone backend is called single-shot, without the per-attempt timeout.
        if let [backend] = self.backends.as_slice() {
            let text = backend.translate(client, text, &source, &target).await?;
            return Ok(Translation {
                text,
                backend: backend.name(),
                fell_back: false,
            });
        }

        let success = with_fallback("Translation", &self.backends, self.per_attempt, |backend| {
            backend.translate(client, text, &source, &target)
        })
        .await?;
        let fell_back = success.fell_back();

        Ok(Translation {
            backend: self.backends[success.candidate].name(),
            fell_back,
            text: success.value,
        })
    }
}
