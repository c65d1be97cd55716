use std::sync::Arc;
use base64::Engine;
use headless_chrome::browser::tab::Tab;
use headless_chrome::protocol::cdp::{Emulation, Page};
use serde::Deserialize;
use thiserror::Error;
use tracing::debug;
use crate::options::{ImageFormat, ImageOptions, PdfOptions};

#[derive(Error, Debug)]
pub enum PageError {
    #[error("Browser Error: {0}")]
    BrowserError(#[from] anyhow::Error),
    #[error("Page didn't report its document size")]
    MissingDocumentSize,
    #[error("Can't read document size: {0}")]
    JsonError(#[from] serde_json::Error),
    #[error("Base64Error when decoding screenshot: {0}")]
    Base64Error(#[from] base64::DecodeError),
}

pub type Result<T> = std::result::Result<T, PageError>;

#[derive(Debug, Deserialize, PartialEq)]
struct DocumentSize {
    width: f64,
    height: f64,
}

impl DocumentSize {
    const SCRIPT: &'static str = r#"JSON.stringify({
        width: Math.max(document.documentElement.scrollWidth, document.body ? document.body.scrollWidth : 0),
        height: Math.max(document.documentElement.scrollHeight, document.body ? document.body.scrollHeight : 0)
    })"#;

    /// Never smaller than the viewport
    fn at_least(self, viewport: (u32, u32)) -> Self {
        Self {
            width: self.width.max(viewport.0 as f64),
            height: self.height.max(viewport.1 as f64),
        }
    }
}

/// A navigated tab, ready to be printed or captured
pub struct WebPage (Arc<Tab>);

impl WebPage {

    pub fn from_tab(tab: Arc<Tab>) -> Self {
        Self(tab)
    }

    pub fn title(&self) -> Result<String> {
        Ok(self.0.get_title()?)
    }

    pub fn to_pdf(&self, options: &PdfOptions) -> Result<Vec<u8>> {
        self.0.call_method(Emulation::SetEmulatedMedia {
            media: Some("screen".to_string()),
            features: None,
        })?;

        let pdf = self.0.print_to_pdf(Some(options.to_print_options()))?;
        debug!(bytes = pdf.len(), "printed PDF");
        Ok(pdf)
    }

    /// Full-page screenshot. Chrome only rasterises outside the window
    /// when `capture_beyond_viewport` is set.
    pub fn to_image(&self, options: &ImageOptions) -> Result<Vec<u8>> {
        let size = self.document_size()?.at_least(options.viewport);

        let screenshot = self.0.call_method(Self::full_page_capture(options.format, &size))?;
        let image = decode_screenshot(&screenshot.data)?;

        debug!(bytes = image.len(), width = size.width, height = size.height, "captured screenshot");
        Ok(image)
    }

    fn full_page_capture(format: ImageFormat, size: &DocumentSize) -> Page::CaptureScreenshot {
        Page::CaptureScreenshot {
            format: Some(format.to_capture_format()),
            quality: None,
            clip: Some(Page::Viewport {
                x: 0.0,
                y: 0.0,
                width: size.width,
                height: size.height,
                scale: 1.0,
            }),
            from_surface: Some(true),
            capture_beyond_viewport: Some(true),
            optimize_for_speed: None,
        }
    }

    fn document_size(&self) -> Result<DocumentSize> {
        let result = self.0.evaluate(DocumentSize::SCRIPT, false)?;
        let json = result
            .value
            .as_ref()
            .and_then(|value| value.as_str())
            .ok_or(PageError::MissingDocumentSize)?;
        Ok(serde_json::from_str(json)?)
    }
}

fn decode_screenshot(data: &str) -> Result<Vec<u8>> {
    Ok(base64::engine::general_purpose::STANDARD.decode(data)?)
}
