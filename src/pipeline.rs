//! Rendering every cached record and uploading the results.

use anyhow::Result;
use futures::future::try_join_all;
use std::path::{Path, PathBuf};
use tracing::info;

use crate::collaborators::ObjectStorage;
use crate::collaborators::storage::object_name;
use crate::constants::fields;
use crate::core::AutodocError;
use crate::document::DocumentRenderer;
use crate::params::value::{ParamMap, ParamValue};
use crate::params::{Cache, ParamStore};

/// File name of the rendered document for `country`.
///
/// Characters other than ASCII letters, digits, `-` and `_` become `_`.
pub fn document_file_name(prefix: &str, country: &str) -> String {
    let country: String = country
        .chars()
        .map(|c| if c.is_ascii_alphanumeric() || c == '-' || c == '_' { c } else { '_' })
        .collect();
    format!("{prefix}{country}.docx")
}

/// Where rendered documents go.
#[derive(Debug, Clone)]
pub struct OutputLayout {
    pub dir: PathBuf,
    pub prefix: String,
}

impl OutputLayout {
    pub fn path_for(&self, country: &str) -> PathBuf {
        self.dir.join(document_file_name(&self.prefix, country))
    }
}

pub struct Pipeline<'a, R> {
    renderer: &'a R,
    store: &'a ParamStore,
    layout: OutputLayout,
}

impl<'a, R: DocumentRenderer> Pipeline<'a, R> {
    pub fn new(renderer: &'a R, store: &'a ParamStore, layout: OutputLayout) -> Self {
        Self {
            renderer,
            store,
            layout,
        }
    }

    /// Renders one document per record, in cache order.
    ///
    /// After each document is saved its file name is merged into the record as
    /// `document_file` and the cache is persisted. Stops at the first failure;
    /// documents already rendered stay on disk and in the cache.
    pub async fn render_all(&self, cache: &mut Cache) -> Result<Vec<PathBuf>> {
        let countries: Vec<String> = cache.countries().into_iter().map(str::to_string).collect();
        let mut files = Vec::with_capacity(countries.len());

        for country in &countries {
            let data = match cache.get(country) {
                Some(record) => record.data.clone(),
                None => continue,
            };

            let path = self.layout.path_for(country);
            self.renderer.render(&data)?.save(&path)?;
            info!(country = %country, path = %path.display(), "Document for {country} rendered");

            let file_name = document_file_name(&self.layout.prefix, country);
            let patch = ParamMap::from([(fields::DOCUMENT_FILE.to_string(), ParamValue::Text(file_name))]);
            let _ = self.store.update(cache, country, &patch).await?;

            files.push(path);
        }

        Ok(files)
    }

    /// Uploads `files` to `{bucket}/{folder}/{file_name}`.
    pub async fn upload_all<S: ObjectStorage>(
        &self,
        storage: &S,
        bucket: &str,
        folder: &str,
        files: &[PathBuf],
    ) -> Result<Vec<String>> {
        let uploads = files.iter().map(|file| async move {
            let file_name = file_name_of(file)?;
            let remote = object_name(folder, file_name);
            storage.upload(file, bucket, &remote).await?;
            info!(bucket, object = %remote, "{file_name} uploaded to bucket");
            Ok::<_, anyhow::Error>(remote)
        });
        try_join_all(uploads).await
    }
}

fn file_name_of(path: &Path) -> Result<&str> {
    path.file_name().and_then(|n| n.to_str()).ok_or_else(|| {
        AutodocError::Other {
            message: format!("Not a file path: {}", path.display()),
        }
        .into()
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::document::DocxRenderer;
    use crate::params::{ParameterRecord, write_cache};
    use crate::test_utils::{RecordingStorage, read_docx_part, write_docx_template};
    use tempfile::TempDir;

    fn cache() -> Cache {
        Cache::new(vec![
            ParameterRecord::new(
                "FR",
                ParamMap::from([("name".to_string(), ParamValue::from("churn_model"))]),
            ),
            ParameterRecord::new(
                "IT",
                ParamMap::from([("name".to_string(), ParamValue::from("fraud_model"))]),
            ),
        ])
    }

    #[test]
    fn test_document_file_name() {
        assert_eq!(document_file_name("file_to_fill_", "FR"), "file_to_fill_FR.docx");
        assert_eq!(document_file_name("doc_", "../x"), "doc____x.docx");
    }

    #[tokio::test]
    async fn test_render_all_renders_and_records_file_names() {
        let temp = TempDir::new().unwrap();
        let template = temp.path().join("for_test.docx");
        write_docx_template(&template, "Model: {{ name }}").unwrap();

        let store = ParamStore::new(temp.path().join("fulfill_params.json"));
        let mut cache = cache();
        write_cache(&cache, store.path()).unwrap();

        let renderer = DocxRenderer::open(&template).unwrap();
        let layout = OutputLayout {
            dir: temp.path().join("out"),
            prefix: "file_to_fill_".to_string(),
        };
        let files = Pipeline::new(&renderer, &store, layout).render_all(&mut cache).await.unwrap();

        assert_eq!(
            files,
            vec![
                temp.path().join("out/file_to_fill_FR.docx"),
                temp.path().join("out/file_to_fill_IT.docx")
            ]
        );
        let it = std::fs::read(&files[1]).unwrap();
        assert!(read_docx_part(&it, "word/document.xml").unwrap().contains("Model: fraud_model"));

        let on_disk = store.load().unwrap();
        assert_eq!(
            on_disk.get("FR").unwrap().data["document_file"],
            ParamValue::from("file_to_fill_FR.docx")
        );
        assert_eq!(on_disk, cache);
    }

    #[tokio::test]
    async fn test_upload_all_uses_folder_and_file_name() {
        let temp = TempDir::new().unwrap();
        let store = ParamStore::new(temp.path().join("fulfill_params.json"));
        let renderer = DocxRenderer::open(&{
            let template = temp.path().join("for_test.docx");
            write_docx_template(&template, "x").unwrap();
            template
        })
        .unwrap();
        let layout = OutputLayout {
            dir: temp.path().to_path_buf(),
            prefix: "file_to_fill_".to_string(),
        };
        let pipeline = Pipeline::new(&renderer, &store, layout);
        let storage = RecordingStorage::new();
        let files = vec![temp.path().join("file_to_fill_FR.docx")];

        let remotes =
            pipeline.upload_all(&storage, "model-docs", "path/to/docs/", &files).await.unwrap();

        assert_eq!(remotes, vec!["path/to/docs/file_to_fill_FR.docx"]);
        let uploads = storage.uploads();
        assert_eq!(uploads.len(), 1);
        assert_eq!(uploads[0].bucket, "model-docs");
        assert_eq!(uploads[0].local_path, files[0]);
    }

    #[tokio::test]
    async fn test_upload_failure_propagates() {
        let temp = TempDir::new().unwrap();
        let template = temp.path().join("for_test.docx");
        write_docx_template(&template, "x").unwrap();
        let renderer = DocxRenderer::open(&template).unwrap();
        let store = ParamStore::new(temp.path().join("fulfill_params.json"));
        let layout = OutputLayout {
            dir: temp.path().to_path_buf(),
            prefix: String::new(),
        };
        let storage = RecordingStorage::new().failing("403 Forbidden");

        let err = Pipeline::new(&renderer, &store, layout)
            .upload_all(&storage, "b", "", &[template.clone()])
            .await
            .unwrap_err();
        assert!(err.to_string().contains("403"));
    }
}
