//! Run configurations and document templates for tests.

use anyhow::{Context, Result};
use std::fs::File;
use std::io::Write;
use std::path::Path;
use zip::ZipWriter;
use zip::write::SimpleFileOptions;

use crate::config::{RunConfig, RunEntry};
use crate::params::value::{ParamMap, ParamValue};

/// Two-country run configuration in the format users write.
pub const SAMPLE_RUN_CONFIG_YAML: &str = r#"
fulfill_template:
  model_suffix: model_RUN_SUFFIX
  scores_table: analytics.scores_RUN_SUFFIX
  owner: Risk Analytics
run_list:
  - country: FR
    table_suffix: fr01
    training_date: 2024-01-01
    version: v1
    if_new: true
    cutoff: 0.5
  - country: IT
    table_suffix: it02
    training_date: 2023-12-15
    version: v3
    if_new: false
    cutoff: 0.42
"#;

/// Run configuration with one entry per `(country, table_suffix)` pair.
///
/// The template is `{model_suffix: "model_RUN_SUFFIX"}`; every entry uses
/// training date `2024-01-01`, version `v1`, `if_new: true` and cutoff `0.5`.
pub fn sample_run_config(entries: &[(&str, &str)]) -> RunConfig {
    let fulfill_template =
        ParamMap::from([("model_suffix".to_string(), ParamValue::from("model_RUN_SUFFIX"))]);

    let run_list = entries
        .iter()
        .map(|(country, table_suffix)| RunEntry {
            country: (*country).to_string(),
            table_suffix: (*table_suffix).to_string(),
            training_date: ParamValue::from("2024-01-01"),
            version: ParamValue::from("v1"),
            if_new: true,
            cutoff: 0.5,
            extra: ParamMap::new(),
        })
        .collect();

    RunConfig {
        fulfill_template,
        run_list,
    }
}

const CONTENT_TYPES: &str = r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<Types xmlns="http://schemas.openxmlformats.org/package/2006/content-types"><Default Extension="rels" ContentType="application/vnd.openxmlformats-package.relationships+xml"/><Default Extension="xml" ContentType="application/xml"/><Override PartName="/word/document.xml" ContentType="application/vnd.openxmlformats-officedocument.wordprocessingml.document.main+xml"/></Types>"#;

const ROOT_RELS: &str = r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<Relationships xmlns="http://schemas.openxmlformats.org/package/2006/relationships"><Relationship Id="rId1" Type="http://schemas.openxmlformats.org/officeDocument/2006/relationships/officeDocument" Target="word/document.xml"/></Relationships>"#;

/// Writes a minimal `.docx` whose body holds one paragraph per line of `body`.
///
/// Lines are inserted verbatim, so they may contain `{{ placeholders }}`.
pub fn write_docx_template(path: &Path, body: &str) -> Result<()> {
    let paragraphs: String = body
        .lines()
        .map(|line| format!("<w:p><w:r><w:t xml:space=\"preserve\">{line}</w:t></w:r></w:p>"))
        .collect();
    let document = format!(
        "<?xml version=\"1.0\" encoding=\"UTF-8\" standalone=\"yes\"?>\n\
         <w:document xmlns:w=\"http://schemas.openxmlformats.org/wordprocessingml/2006/main\">\
         <w:body>{paragraphs}</w:body></w:document>"
    );

    let file = File::create(path)
        .with_context(|| format!("Failed to create template: {}", path.display()))?;
    let mut zip = ZipWriter::new(file);
    let options = SimpleFileOptions::default();

    for (name, content) in [
        ("[Content_Types].xml", CONTENT_TYPES),
        ("_rels/.rels", ROOT_RELS),
        ("word/document.xml", document.as_str()),
    ] {
        zip.start_file(name, options)?;
        zip.write_all(content.as_bytes())?;
    }
    zip.finish()?;
    Ok(())
}

/// Reads one part of a `.docx` held in memory as text.
pub fn read_docx_part(docx: &[u8], name: &str) -> Result<String> {
    let mut archive = zip::ZipArchive::new(std::io::Cursor::new(docx))?;
    let mut part = archive.by_name(name)?;
    let mut content = String::new();
    std::io::Read::read_to_string(&mut part, &mut content)?;
    Ok(content)
}
