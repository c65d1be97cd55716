use std::path::PathBuf;
use thiserror::Error;
use tracing::info;
use url::Url;
use crate::browser::{Browser, BrowserError};
use crate::options::{LaunchSettings, NavigationOptions, RenderOptions, Source, Target};
use crate::page::PageError;

#[derive(Error, Debug)]
pub enum RenderError {
    #[error("Can't read HTML content from {path}: {source}")]
    ReadContent { path: PathBuf, source: std::io::Error },
    #[error("Can't write {path}: {source}")]
    WriteOutput { path: PathBuf, source: std::io::Error },
    #[error("{0}")]
    Browser(#[from] BrowserError),
    #[error("{0}")]
    Page(#[from] PageError),
    #[error("Task failed: {0}")]
    TaskFailed(#[from] tokio::task::JoinError),
}

pub type Result<T> = std::result::Result<T, RenderError>;

/// What the tab navigates to, with files already read
#[derive(Debug, Clone, PartialEq)]
enum Document {
    Url(Url),
    Html(String),
}

impl Document {

    async fn load(source: &Source) -> Result<Self> {
        match source {
            Source::Url(url) => Ok(Document::Url(url.clone())),
            Source::Html(html) => Ok(Document::Html(html.clone())),
            Source::HtmlFile(path) => {
                let html = tokio::fs::read_to_string(path)
                    .await
                    .map_err(|source| RenderError::ReadContent { path: path.clone(), source })?;
                Ok(Document::Html(html))
            }
        }
    }
}

fn render_blocking(document: Document, target: &Target, navigation: &NavigationOptions, launch: &LaunchSettings) -> Result<Vec<u8>> {

    let browser = Browser::launch(launch, target.window_size(), navigation.timeout)?;

    let page = match &document {
        Document::Url(url) => browser.open_page(url.as_str(), navigation)?,
        Document::Html(html) => browser.open_html(html, navigation)?,
    };

    let bytes = match target {
        Target::Pdf { options, .. } => page.to_pdf(options)?,
        Target::Image { options, .. } => page.to_image(options)?,
    };

    Ok(bytes)
}

/// Renders the page and writes it to the target path, returning that path.
/// Chrome is closed when the session is dropped.
pub async fn render(options: RenderOptions) -> Result<PathBuf> {

    let document = Document::load(&options.source).await?;

    let RenderOptions { target, navigation, launch, .. } = options;
    let path = target.path().to_path_buf();

    let bytes = tokio::task::spawn_blocking(move || {
        render_blocking(document, &target, &navigation, &launch)
    }).await??;

    tokio::fs::write(&path, &bytes)
        .await
        .map_err(|source| RenderError::WriteOutput { path: path.clone(), source })?;

    info!(path = %path.display(), bytes = bytes.len(), "written");

    Ok(path)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::options::{ImageOptions, PdfOptions};
    use crate::paper::PaperFormat;

    fn scratch(name: &str) -> PathBuf {
        let dir = std::env::temp_dir().join("webpage2pdf-tests");
        std::fs::create_dir_all(&dir).unwrap();
        dir.join(name)
    }

    #[tokio::test]
    async fn html_file_is_read_before_rendering() {
        let path = scratch("content.html");
        std::fs::write(&path, "<h1>from file</h1>").unwrap();

        let document = Document::load(&Source::HtmlFile(path)).await.unwrap();
        assert_eq!(document, Document::Html("<h1>from file</h1>".to_string()));
    }

    #[tokio::test]
    async fn missing_html_file_is_reported() {
        let path = scratch("does-not-exist.html");
        let err = Document::load(&Source::HtmlFile(path.clone())).await.unwrap_err();
        assert!(matches!(err, RenderError::ReadContent { path: p, .. } if p == path));
    }

    fn inline_request(target: Target) -> RenderOptions {
        RenderOptions {
            source: Source::Html("<title>t</title><h1 style='height:3000px'>tall</h1>".to_string()),
            target,
            navigation: NavigationOptions::default(),
            launch: LaunchSettings::default(),
        }
    }

    #[tokio::test]
    #[ignore = "needs a local Chrome"]
    async fn renders_inline_html_to_pdf() {
        let path = scratch("inline.pdf");
        let request = inline_request(Target::Pdf { path: path.clone(), options: PdfOptions::default() });

        let written = render(request).await.unwrap();
        assert_eq!(written, path);
        let bytes = std::fs::read(&path).unwrap();
        assert!(bytes.starts_with(b"%PDF"));
    }

    #[tokio::test]
    #[ignore = "needs a local Chrome"]
    async fn renders_full_page_png() {
        let path = scratch("inline.png");
        let options = ImageOptions::for_paper(PaperFormat::A4, &path).unwrap();
        let request = inline_request(Target::Image { path: path.clone(), options });

        render(request).await.unwrap();
        let bytes = std::fs::read(&path).unwrap();
        assert!(bytes.starts_with(&[0x89, b'P', b'N', b'G']));

        // IHDR: width at 16..20, height at 20..24, big endian
        let width = u32::from_be_bytes(bytes[16..20].try_into().unwrap());
        let height = u32::from_be_bytes(bytes[20..24].try_into().unwrap());
        assert!(width >= 794, "width {width}");
        assert!(height >= 3000, "height {height} doesn't cover the document");
    }
}
