//! Loads PDF templates and the field font, either over HTTP from a base URL
//! or from a local directory. Nothing is cached: every request reads fresh
//! copies so replaced templates take effect immediately.

use std::path::PathBuf;
use std::time::Duration;

use anyhow::Context;
use bytes::Bytes;
use reqwest::Client;
use tracing::{debug, info};

use crate::config::Config;
use crate::errors::AppError;
use crate::pdf::font::{EmbeddedFont, FieldFont};
use crate::pdf::TemplateKind;

const FETCH_TIMEOUT: Duration = Duration::from_secs(20);

#[derive(Debug, Clone)]
pub enum AssetSource {
    Url(String),
    Directory(PathBuf),
}

#[derive(Debug, Clone)]
pub struct TemplateStore {
    source: AssetSource,
    font_file: Option<String>,
    http: Client,
}

/// Path of a template below the asset root. Templates sit at the root next
/// to the `fonts/` directory, e.g. `sablon.pdf`.
pub fn template_path(kind: TemplateKind) -> &'static str {
    kind.file_name()
}

impl TemplateStore {
    pub fn new(source: AssetSource, font_file: Option<String>) -> anyhow::Result<Self> {
        let http = Client::builder()
            .timeout(FETCH_TIMEOUT)
            .build()
            .context("failed to build asset HTTP client")?;
        Ok(Self {
            source,
            font_file,
            http,
        })
    }

    pub fn from_config(config: &Config) -> anyhow::Result<Self> {
        let source = match &config.asset_base_url {
            Some(url) => AssetSource::Url(url.clone()),
            None => AssetSource::Directory(config.asset_dir.clone()),
        };
        info!("PDF assets served from {source:?}");
        Self::new(source, config.font_file.clone())
    }

    async fn fetch(&self, relative: &str) -> Result<Bytes, AppError> {
        let bytes = match &self.source {
            AssetSource::Url(base) => {
                let url = format!("{}/{}", base.trim_end_matches('/'), relative);
                debug!("Fetching asset {url}");
                let response = self
                    .http
                    .get(&url)
                    .send()
                    .await
                    .map_err(|e| AppError::Asset(format!("{url}: {e}")))?;
                if !response.status().is_success() {
                    return Err(AppError::Asset(format!(
                        "{url}: HTTP {}",
                        response.status().as_u16()
                    )));
                }
                response
                    .bytes()
                    .await
                    .map_err(|e| AppError::Asset(format!("{url}: {e}")))?
            }
            AssetSource::Directory(dir) => {
                let path = dir.join(relative);
                debug!("Reading asset {}", path.display());
                tokio::fs::read(&path)
                    .await
                    .map(Bytes::from)
                    .map_err(|e| AppError::Asset(format!("{}: {e}", path.display())))?
            }
        };

        if bytes.is_empty() {
            return Err(AppError::Asset(format!("{relative} is empty")));
        }
        Ok(bytes)
    }

    pub async fn load_template(&self, kind: TemplateKind) -> Result<Bytes, AppError> {
        self.fetch(template_path(kind)).await
    }

    /// Loads the given templates, in order.
    pub async fn load_templates(
        &self,
        kinds: &[TemplateKind],
    ) -> Result<Vec<(TemplateKind, Bytes)>, AppError> {
        let mut templates = Vec::with_capacity(kinds.len());
        for kind in kinds {
            templates.push((*kind, self.load_template(*kind).await?));
        }
        Ok(templates)
    }

    /// The configured field font, or Helvetica when none is configured.
    pub async fn load_font(&self) -> Result<FieldFont, AppError> {
        let Some(font_file) = &self.font_file else {
            return Ok(FieldFont::Standard);
        };
        let bytes = self.fetch(font_file).await?;
        let font = EmbeddedFont::from_bytes(bytes.to_vec())
            .map_err(|e| AppError::Asset(format!("{font_file}: {e}")))?;
        Ok(FieldFont::Embedded(font))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn store(dir: &std::path::Path, font: Option<&str>) -> TemplateStore {
        TemplateStore::new(
            AssetSource::Directory(dir.to_path_buf()),
            font.map(str::to_string),
        )
        .unwrap()
    }

    #[test]
    fn test_template_paths() {
        assert_eq!(template_path(TemplateKind::Main), "sablon.pdf");
        assert_eq!(
            template_path(TemplateKind::Kellekszavatossag),
            "kellekszavatossagi_nyilatkozat.pdf"
        );
        assert_eq!(
            template_path(TemplateKind::Meghatalmazas),
            "meghatalmazas_okmanyiroda.pdf"
        );
    }

    #[tokio::test]
    async fn test_loads_templates_from_directory_in_order() {
        let dir = tempfile::tempdir().unwrap();
        for kind in TemplateKind::ALL {
            std::fs::write(dir.path().join(template_path(kind)), kind.as_str()).unwrap();
        }

        let templates = store(dir.path(), None)
            .load_templates(&[TemplateKind::Meghatalmazas, TemplateKind::Main])
            .await
            .unwrap();
        assert_eq!(templates[0].0, TemplateKind::Meghatalmazas);
        assert_eq!(&templates[0].1[..], b"meghatalmazas");
        assert_eq!(&templates[1].1[..], b"main");
    }

    const DEJAVU_SANS: &[u8] = include_bytes!("../../assets/fonts/DejaVuSans.ttf");

    #[tokio::test]
    async fn test_url_source_reads_flat_layout() {
        use axum::routing::get;

        let app = axum::Router::new()
            .route("/assets/sablon.pdf", get(|| async { "%PDF-main" }))
            .route("/assets/fonts/DejaVuSans.ttf", get(|| async { DEJAVU_SANS }));
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move { axum::serve(listener, app).await.unwrap() });

        let store = TemplateStore::new(
            AssetSource::Url(format!("http://{addr}/assets/")),
            Some("fonts/DejaVuSans.ttf".to_string()),
        )
        .unwrap();

        let template = store.load_template(TemplateKind::Main).await.unwrap();
        assert_eq!(&template[..], b"%PDF-main");
        assert!(matches!(store.load_font().await.unwrap(), FieldFont::Embedded(_)));
        assert!(matches!(
            store.load_template(TemplateKind::Meghatalmazas).await,
            Err(AppError::Asset(_))
        ));
    }

    #[tokio::test]
    async fn test_missing_template_is_asset_error() {
        let dir = tempfile::tempdir().unwrap();
        let result = store(dir.path(), None).load_template(TemplateKind::Main).await;
        assert!(matches!(result, Err(AppError::Asset(_))));
    }

    #[tokio::test]
    async fn test_empty_template_is_asset_error() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("sablon.pdf"), b"").unwrap();
        let result = store(dir.path(), None).load_template(TemplateKind::Main).await;
        assert!(matches!(result, Err(AppError::Asset(_))));
    }

    #[tokio::test]
    async fn test_no_font_configured_uses_standard() {
        let dir = tempfile::tempdir().unwrap();
        let font = store(dir.path(), None).load_font().await.unwrap();
        assert!(matches!(font, FieldFont::Standard));
    }

    #[tokio::test]
    async fn test_unparseable_font_is_asset_error() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::create_dir_all(dir.path().join("fonts")).unwrap();
        std::fs::write(dir.path().join("fonts/DejaVuSans.ttf"), b"not a font").unwrap();
        let result = store(dir.path(), Some("fonts/DejaVuSans.ttf")).load_font().await;
        assert!(matches!(result, Err(AppError::Asset(_))));
    }
}
