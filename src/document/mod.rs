//! Rendering Word documents from parameter records.
//!
//! A `.docx` file is a zip archive of XML parts. [`DocxRenderer`] loads the
//! template once, then for each record renders every `word/*.xml` part that
//! contains template markup through Tera, using the record's `data` as the
//! context:
//!
//! ```text
//! Model {{ name }} ({{ version }}) prepared by {{ prepared_by }}
//! {% if if_new %}First release.{% endif %}
//! ```
//!
//! Word frequently splits a placeholder across several runs when it is
//! edited, so markup is first stitched back together (see
//! [`join_split_markup`]). Values are XML-escaped. A placeholder naming a
//! field that the record lacks is a render error.

use anyhow::{Context, Result};
use regex::Regex;
use std::fs::File;
use std::io::{Cursor, Read, Write};
use std::path::{Path, PathBuf};
use std::sync::OnceLock;
use tera::{Context as TeraContext, Tera};
use tracing::debug;
use zip::write::SimpleFileOptions;
use zip::{CompressionMethod, ZipArchive, ZipWriter};

use crate::core::AutodocError;
use crate::params::value::ParamMap;
use crate::utils::fs::atomic_write;

/// Turns one record's data into a document.
pub trait DocumentRenderer {
    fn render(&self, data: &ParamMap) -> Result<RenderedDocument>;
}

/// A rendered document held in memory until saved.
#[derive(Debug, Clone)]
pub struct RenderedDocument {
    bytes: Vec<u8>,
}

impl RenderedDocument {
    pub fn new(bytes: Vec<u8>) -> Self {
        Self {
            bytes,
        }
    }

    pub fn bytes(&self) -> &[u8] {
        &self.bytes
    }

    /// Writes the document atomically, creating parent directories.
    pub fn save(&self, path: &Path) -> Result<()> {
        atomic_write(path, &self.bytes)
            .with_context(|| format!("Failed to save document: {}", path.display()))
    }
}

struct DocxPart {
    name: String,
    compression: CompressionMethod,
    is_dir: bool,
    content: Vec<u8>,
}

impl DocxPart {
    fn is_template_part(&self) -> bool {
        !self.is_dir
            && self.name.starts_with("word/")
            && self.name.ends_with(".xml")
            && !self.name["word/".len()..].contains('/')
    }
}

/// Renders `.docx` templates.
pub struct DocxRenderer {
    template_path: PathBuf,
    parts: Vec<DocxPart>,
}

impl DocxRenderer {
    /// Loads and unpacks the template at `path`.
    ///
    /// # Errors
    ///
    /// Fails if the file cannot be read or is not a zip archive.
    pub fn open(path: &Path) -> Result<Self> {
        let file =
            File::open(path).with_context(|| format!("Failed to open template: {}", path.display()))?;
        let mut archive = ZipArchive::new(file).map_err(|e| AutodocError::TemplateError {
            template: path.display().to_string(),
            reason: format!("not a valid .docx archive: {e}"),
        })?;

        let mut parts = Vec::with_capacity(archive.len());
        for index in 0..archive.len() {
            let mut entry = archive.by_index(index).map_err(|e| AutodocError::TemplateError {
                template: path.display().to_string(),
                reason: e.to_string(),
            })?;
            let mut content = Vec::with_capacity(usize::try_from(entry.size()).unwrap_or(0));
            entry
                .read_to_end(&mut content)
                .with_context(|| format!("Failed to read {} from template", entry.name()))?;
            parts.push(DocxPart {
                name: entry.name().to_string(),
                compression: entry.compression(),
                is_dir: entry.is_dir(),
                content,
            });
        }

        debug!(template = %path.display(), parts = parts.len(), "Document template loaded");
        Ok(Self {
            template_path: path.to_path_buf(),
            parts,
        })
    }

    fn template_error(&self, part: &str, reason: String) -> AutodocError {
        AutodocError::TemplateError {
            template: format!("{} ({part})", self.template_path.display()),
            reason,
        }
    }
}

impl DocumentRenderer for DocxRenderer {
    fn render(&self, data: &ParamMap) -> Result<RenderedDocument> {
        let context = TeraContext::from_serialize(data)
            .context("Failed to build template context from record data")?;

        let mut writer = ZipWriter::new(Cursor::new(Vec::new()));
        for part in &self.parts {
            let options = SimpleFileOptions::default().compression_method(part.compression);
            if part.is_dir {
                writer.add_directory(part.name.as_str(), options)?;
                continue;
            }

            writer.start_file(part.name.as_str(), options)?;
            if part.is_template_part() {
                let xml = std::str::from_utf8(&part.content)
                    .map_err(|e| self.template_error(&part.name, e.to_string()))?;
                if has_markup(xml) {
                    let rendered = Tera::one_off(&join_split_markup(xml), &context, true)
                        .map_err(|e| self.template_error(&part.name, format_tera_error(&e)))?;
                    writer.write_all(rendered.as_bytes())?;
                    continue;
                }
            }
            writer.write_all(&part.content)?;
        }

        let bytes = writer.finish()?.into_inner();
        Ok(RenderedDocument::new(bytes))
    }
}

fn has_markup(xml: &str) -> bool {
    xml.contains("{{") || xml.contains("{%") || marker_split_pattern().is_match(xml)
}

fn marker_split_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| {
        Regex::new(r"\{(?:<[^>]*>)+([{%])|([}%])(?:<[^>]*>)+\}").expect("valid marker pattern")
    })
}

fn markup_span_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| Regex::new(r"(?s)\{\{.*?\}\}|\{%.*?%\}").expect("valid span pattern"))
}

fn xml_tag_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| Regex::new(r"<[^>]*>").expect("valid tag pattern"))
}

/// Removes the XML that Word inserts inside `{{ ... }}` and `{% ... %}`.
///
/// Typographic quotes inside markup are replaced with plain ones.
pub fn join_split_markup(xml: &str) -> String {
    let joined = marker_split_pattern().replace_all(xml, |caps: &regex::Captures<'_>| {
        match (caps.get(1), caps.get(2)) {
            (Some(open), _) => format!("{{{}", open.as_str()),
            (_, Some(close)) => format!("{}}}", close.as_str()),
            _ => caps[0].to_string(),
        }
    });

    markup_span_pattern()
        .replace_all(&joined, |caps: &regex::Captures<'_>| {
            xml_tag_pattern()
                .replace_all(&caps[0], "")
                .replace(['\u{2018}', '\u{2019}'], "'")
                .replace(['\u{201C}', '\u{201D}'], "\"")
        })
        .into_owned()
}

/// Flattens a Tera error chain into one readable message.
fn format_tera_error(error: &tera::Error) -> String {
    use std::error::Error;

    let mut messages = Vec::new();
    let mut current: Option<&dyn Error> = Some(error);
    while let Some(err) = current {
        let cleaned = err
            .to_string()
            .replace("while rendering '__tera_one_off'", "")
            .replace("'__tera_one_off'", "template")
            .trim()
            .to_string();
        if !cleaned.is_empty() && !cleaned.starts_with("Failed to render template") {
            messages.push(cleaned);
        }
        current = err.source();
    }

    if messages.is_empty() {
        "template syntax error".to_string()
    } else {
        messages.join(": ")
    }
}
