//! Rendering documents from a cache and uploading them.

use autodoc_cli::collaborators::LocalStorage;
use autodoc_cli::document::DocxRenderer;
use autodoc_cli::params::{ParamStore, ParamValue};
use autodoc_cli::pipeline::{OutputLayout, Pipeline};
use autodoc_cli::test_utils::{read_docx_part, write_docx_template};

use crate::common::{TWO_COUNTRY_PARAMS, TestProject};

const TEMPLATE: &str = "Model documentation for {{ country }}\n\
    Model: {{ name }} (version {{ version }})\n\
    Prepared by {{ prepared_by }} on {{ date_last_updated }}\n\
    Training date: {{ training_date }}; cutoff {{ cutoff }}\n\
    {% if if_new %}This is a new model.{% else %}This model replaces a previous one.{% endif %}";

fn layout(project: &TestProject) -> OutputLayout {
    OutputLayout {
        dir: project.output_dir(),
        prefix: "file_to_fill_".to_string(),
    }
}

#[tokio::test]
async fn test_render_all_fills_every_document() {
    let project = TestProject::new();
    project.write_params(TWO_COUNTRY_PARAMS);
    write_docx_template(&project.template_path(), TEMPLATE).unwrap();

    let store = ParamStore::new(project.params_path());
    let mut cache = store.load().unwrap();
    let renderer = DocxRenderer::open(&project.template_path()).unwrap();
    let pipeline = Pipeline::new(&renderer, &store, layout(&project));

    let files = pipeline.render_all(&mut cache).await.unwrap();
    assert_eq!(files.len(), 2);

    let fr = std::fs::read(project.output_dir().join("file_to_fill_FR.docx")).unwrap();
    let fr = read_docx_part(&fr, "word/document.xml").unwrap();
    assert!(fr.contains("Model documentation for FR"));
    assert!(fr.contains("Model: churn_model (version v1)"));
    assert!(fr.contains("Prepared by analyst@example.com on 16&#x2F;10&#x2F;2026"));
    assert!(fr.contains("Training date: 2024-01-01; cutoff 0.5"));
    assert!(fr.contains("This is a new model."));

    let it = std::fs::read(project.output_dir().join("file_to_fill_IT.docx")).unwrap();
    let it = read_docx_part(&it, "word/document.xml").unwrap();
    assert!(it.contains("This model replaces a previous one."));

    let on_disk = project.read_params();
    for country in ["FR", "IT"] {
        assert_eq!(
            on_disk.get(country).unwrap().data["document_file"],
            ParamValue::Text(format!("file_to_fill_{country}.docx"))
        );
    }
}

#[tokio::test]
async fn test_upload_to_local_storage() {
    let project = TestProject::new();
    project.write_params(TWO_COUNTRY_PARAMS);
    write_docx_template(&project.template_path(), TEMPLATE).unwrap();

    let store = ParamStore::new(project.params_path());
    let mut cache = store.load().unwrap();
    let renderer = DocxRenderer::open(&project.template_path()).unwrap();
    let pipeline = Pipeline::new(&renderer, &store, layout(&project));
    let files = pipeline.render_all(&mut cache).await.unwrap();

    let uploads = project.path().join("uploads");
    pipeline
        .upload_all(&LocalStorage::new(&uploads), "model-docs", "path/to/gcs", &files)
        .await
        .unwrap();

    for country in ["FR", "IT"] {
        let uploaded = uploads.join(format!("model-docs/path/to/gcs/file_to_fill_{country}.docx"));
        let rendered = project.output_dir().join(format!("file_to_fill_{country}.docx"));
        assert_eq!(std::fs::read(uploaded).unwrap(), std::fs::read(rendered).unwrap());
    }
}

#[tokio::test]
async fn test_render_failure_stops_before_upload() {
    let project = TestProject::new();
    project.write_params(TWO_COUNTRY_PARAMS);
    write_docx_template(&project.template_path(), "{{ sponsor }}").unwrap();

    let store = ParamStore::new(project.params_path());
    let mut cache = store.load().unwrap();
    let renderer = DocxRenderer::open(&project.template_path()).unwrap();
    let pipeline = Pipeline::new(&renderer, &store, layout(&project));

    assert!(pipeline.render_all(&mut cache).await.is_err());
    assert!(!project.output_dir().join("file_to_fill_FR.docx").exists());
    assert!(project.read_params().get("FR").unwrap().data.get("document_file").is_none());
}
