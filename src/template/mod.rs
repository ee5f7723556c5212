//! Template payload cache and `{{field}}` docx rendering.
//!
//! Templates are binary docx packages fetched lazily from a configured
//! location and cached for the rest of the session: at most one fetch per
//! template id after the first success. The renderer rewrites the package's
//! XML parts, substituting `{{field}}` placeholders; a missing field
//! resolves to an empty string rather than failing the render.

use std::collections::HashMap;
use std::io::{Cursor, Read, Write};
use std::path::PathBuf;

use once_cell::sync::Lazy;
use regex::Regex;
use zip::write::SimpleFileOptions;
use zip::{ZipArchive, ZipWriter};

use crate::error::{TemplateError, TemplateResult};

// =============================================================================
// Fetcher
// =============================================================================

/// Where template payloads come from.
pub enum Fetcher {
    /// Fetch `{base_url}/{template_id}` over HTTP.
    Http {
        client: reqwest::Client,
        base_url: String,
    },
    /// Read `{root}/{template_id}` from the filesystem.
    Dir { root: PathBuf },
    /// Fixed in-memory payloads, for tests and offline runs.
    Fixed { payloads: HashMap<String, Vec<u8>> },
}

impl Fetcher {
    async fn fetch(&self, template_id: &str) -> TemplateResult<Vec<u8>> {
        match self {
            Fetcher::Http { client, base_url } => {
                let location = format!("{}/{}", base_url.trim_end_matches('/'), template_id);
                let response = client.get(&location).send().await.map_err(|e| {
                    TemplateError::FetchFailed {
                        location: location.clone(),
                        status: e.to_string(),
                    }
                })?;
                let status = response.status();
                if !status.is_success() {
                    return Err(TemplateError::FetchFailed {
                        location,
                        status: format!("HTTP {}", status.as_u16()),
                    });
                }
                let bytes = response.bytes().await.map_err(|e| TemplateError::FetchFailed {
                    location: location.clone(),
                    status: e.to_string(),
                })?;
                Ok(bytes.to_vec())
            }
            Fetcher::Dir { root } => {
                let location = root.join(template_id);
                std::fs::read(&location).map_err(|e| TemplateError::FetchFailed {
                    location: location.display().to_string(),
                    status: e.to_string(),
                })
            }
            Fetcher::Fixed { payloads } => payloads.get(template_id).cloned().ok_or_else(|| {
                TemplateError::FetchFailed {
                    location: template_id.to_string(),
                    status: "not configured".to_string(),
                }
            }),
        }
    }
}

// =============================================================================
// Template Cache
// =============================================================================

/// Lazily fetched, session-scoped template payloads keyed by template id.
pub struct TemplateCache {
    fetcher: Fetcher,
    entries: HashMap<String, Vec<u8>>,
    fetches: usize,
}

impl TemplateCache {
    pub fn new(fetcher: Fetcher) -> Self {
        Self {
            fetcher,
            entries: HashMap::new(),
            fetches: 0,
        }
    }

    /// Cache over an HTTP base URL.
    pub fn http(base_url: impl Into<String>) -> Self {
        Self::new(Fetcher::Http {
            client: reqwest::Client::new(),
            base_url: base_url.into(),
        })
    }

    /// Cache over a local template directory.
    pub fn dir(root: impl Into<PathBuf>) -> Self {
        Self::new(Fetcher::Dir { root: root.into() })
    }

    /// Cache over fixed in-memory payloads.
    pub fn fixed(payloads: HashMap<String, Vec<u8>>) -> Self {
        Self::new(Fetcher::Fixed { payloads })
    }

    /// Return the cached payload, fetching it on first use.
    ///
    /// Idempotent after the first success; a failed fetch leaves the entry
    /// absent so a later attempt may retry.
    pub async fn ensure_loaded(&mut self, template_id: &str) -> TemplateResult<&[u8]> {
        if !self.entries.contains_key(template_id) {
            self.fetches += 1;
            let payload = self.fetcher.fetch(template_id).await?;
            self.entries.insert(template_id.to_string(), payload);
        }
        Ok(self.entries[template_id].as_slice())
    }

    /// Number of fetches performed so far (cache misses).
    pub fn fetch_count(&self) -> usize {
        self.fetches
    }
}

// =============================================================================
// Docx Rendering
// =============================================================================

/// `{{field}}` placeholder, tolerating XML run boundaries inside the braces
/// (word processors habitually split a typed placeholder across runs).
static PLACEHOLDER: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?s)\{\{(.*?)\}\}").expect("placeholder regex"));

/// XML tags stripped from a matched placeholder to recover the field name.
static XML_TAG: Lazy<Regex> = Lazy::new(|| Regex::new(r"<[^>]*>").expect("xml tag regex"));

/// Parts of the package that get placeholder substitution.
fn is_text_part(name: &str) -> bool {
    name == "word/document.xml"
        || ((name.starts_with("word/header") || name.starts_with("word/footer"))
            && name.ends_with(".xml"))
}

/// Render a docx template by substituting `{{field}}` placeholders in the
/// document body, headers and footers. Missing fields become empty strings;
/// newlines in values become line breaks in the document.
pub fn render_docx(
    template: &[u8],
    fields: &HashMap<String, String>,
) -> TemplateResult<Vec<u8>> {
    let mut archive = ZipArchive::new(Cursor::new(template))
        .map_err(|e| TemplateError::InvalidTemplate(e.to_string()))?;

    let mut writer = ZipWriter::new(Cursor::new(Vec::new()));
    let options = SimpleFileOptions::default();

    for index in 0..archive.len() {
        let mut entry = archive
            .by_index(index)
            .map_err(|e| TemplateError::InvalidTemplate(e.to_string()))?;
        let name = entry.name().to_string();

        let mut raw = Vec::new();
        entry
            .read_to_end(&mut raw)
            .map_err(|e| TemplateError::InvalidTemplate(e.to_string()))?;

        let payload = if is_text_part(&name) {
            let xml = String::from_utf8_lossy(&raw);
            substitute(&xml, fields).into_bytes()
        } else {
            raw
        };

        writer
            .start_file(&*name, options)
            .map_err(|e| TemplateError::Render(e.to_string()))?;
        writer
            .write_all(&payload)
            .map_err(|e| TemplateError::Render(e.to_string()))?;
    }

    let cursor = writer
        .finish()
        .map_err(|e| TemplateError::Render(e.to_string()))?;
    Ok(cursor.into_inner())
}

/// Substitute placeholders in one XML part.
pub fn substitute(xml: &str, fields: &HashMap<String, String>) -> String {
    PLACEHOLDER
        .replace_all(xml, |caps: &regex::Captures<'_>| {
            let inner = XML_TAG.replace_all(&caps[1], "");
            let field = inner.trim();
            match fields.get(field) {
                Some(value) => encode_value(value),
                None => String::new(),
            }
        })
        .into_owned()
}

/// XML-escape a field value and turn newlines into `<w:br/>` line breaks so
/// multi-line values (addresses, office blocks) render as separate lines of
/// the same paragraph.
fn encode_value(value: &str) -> String {
    let escaped = value
        .replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;");
    escaped.replace('\n', "</w:t><w:br/><w:t>")
}
