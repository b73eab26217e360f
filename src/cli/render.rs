//! `autodoc render`

use anyhow::Result;
use clap::Args;
use colored::Colorize;
use std::path::PathBuf;
use tracing::info;

use super::common::CommandContext;
use crate::collaborators::{GcsStorage, LocalStorage};
use crate::document::DocxRenderer;
use crate::pipeline::{OutputLayout, Pipeline};

#[derive(Args, Debug)]
pub struct RenderCommand {
    /// Run configuration used if the cache must be built
    #[arg(long, value_name = "PATH")]
    run_config: Option<PathBuf>,

    /// Render only; do not upload
    #[arg(long, conflicts_with = "local_upload")]
    no_upload: bool,

    /// Copy documents to DIR/<bucket>/<folder>/ instead of Cloud Storage
    #[arg(long, value_name = "DIR")]
    local_upload: Option<PathBuf>,
}

impl RenderCommand {
    pub async fn execute(self, ctx: &CommandContext) -> Result<()> {
        let settings = &ctx.settings;
        // Fail on a missing bucket before rendering anything
        let bucket = if self.no_upload {
            None
        } else {
            Some(settings.require_bucket()?.to_string())
        };

        let (store, mut cache) = ctx.load_or_create_cache(self.run_config.as_deref()).await?;
        let renderer = DocxRenderer::open(&settings.doc_template)?;
        let layout = OutputLayout {
            dir: settings.output_dir.clone(),
            prefix: settings.output_prefix.clone(),
        };
        let pipeline = Pipeline::new(&renderer, &store, layout);

        let files = pipeline.render_all(&mut cache).await?;
        for file in &files {
            println!("{} {}", "Rendered".green(), file.display());
        }

        let Some(bucket) = bucket else {
            info!("Upload skipped");
            return Ok(());
        };

        let uploaded = match &self.local_upload {
            Some(dir) => {
                pipeline
                    .upload_all(&LocalStorage::new(dir), &bucket, &settings.bucket_folder, &files)
                    .await?
            }
            None => {
                let storage = GcsStorage::from_settings(settings, ctx.auth.clone())?;
                pipeline.upload_all(&storage, &bucket, &settings.bucket_folder, &files).await?
            }
        };
        for object in &uploaded {
            println!("{} {}/{}", "Uploaded".green(), bucket, object);
        }
        Ok(())
    }
}
