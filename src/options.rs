use std::path::{Path, PathBuf};
use std::time::Duration;
use clap::ValueEnum;
use headless_chrome::protocol::cdp::Page::CaptureScreenshotFormatOption;
use headless_chrome::types::PrintToPdfOptions;
use serde::Serialize;
use thiserror::Error;
use url::Url;
use crate::paper::{Margins, PageRanges, PaperFormat};

#[derive(Error, Debug)]
pub enum OptionsError {
    #[error("Nothing to render, pass either --url or --content")]
    MissingSource,
    #[error("UrlError, can't parse given URL: {0}")]
    UrlError(#[from] url::ParseError),
    #[error("Unsupported image extension {0:?}, use .png, .jpg, .jpeg or .webp")]
    ImageExtension(String),
}

pub type Result<T> = std::result::Result<T, OptionsError>;

/// When navigation is considered finished
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum WaitUntil {
    /// The `load` event fired
    #[default]
    Load,
    /// The `DOMContentLoaded` event fired
    #[value(name = "domcontentloaded")]
    DomContentLoaded,
    /// No network connections for at least 500 ms
    #[value(name = "networkidle0")]
    NetworkIdle0,
    /// No more than 2 network connections for at least 500 ms
    #[value(name = "networkidle2")]
    NetworkIdle2,
}

impl WaitUntil {
    /// Name of the matching `Page.lifecycleEvent`
    pub fn lifecycle_event(&self) -> &'static str {
        match self {
            WaitUntil::Load => "load",
            WaitUntil::DomContentLoaded => "DOMContentLoaded",
            WaitUntil::NetworkIdle0 => "networkIdle",
            WaitUntil::NetworkIdle2 => "networkAlmostIdle",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum)]
pub enum ContentType {
    /// `--content` holds the HTML itself
    #[default]
    #[value(name = "string")]
    Inline,
    /// `--content` is the path of an HTML file
    File,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Source {
    Url(Url),
    Html(String),
    HtmlFile(PathBuf),
}

impl Source {

    /// Content wins over the URL when both are given
    pub fn resolve(url: Option<&str>, content: Option<String>, content_type: ContentType) -> Result<Self> {
        match (content, url) {
            (Some(content), _) => Ok(match content_type {
                ContentType::Inline => Source::Html(content),
                ContentType::File => Source::HtmlFile(PathBuf::from(content)),
            }),
            (None, Some(url)) => Ok(Source::Url(Url::parse(url)?)),
            (None, None) => Err(OptionsError::MissingSource),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ImageFormat {
    #[default]
    Png,
    Jpeg,
    Webp,
}

impl ImageFormat {

    pub fn from_path(path: &Path) -> Result<Self> {
        let Some(extension) = path.extension() else {
            return Ok(ImageFormat::Png);
        };
        let extension = extension.to_string_lossy().to_ascii_lowercase();

        match extension.as_str() {
            "png" => Ok(ImageFormat::Png),
            "jpg" | "jpeg" => Ok(ImageFormat::Jpeg),
            "webp" => Ok(ImageFormat::Webp),
            _ => Err(OptionsError::ImageExtension(extension)),
        }
    }

    pub fn to_capture_format(self) -> CaptureScreenshotFormatOption {
        match self {
            ImageFormat::Png => CaptureScreenshotFormatOption::Png,
            ImageFormat::Jpeg => CaptureScreenshotFormatOption::Jpeg,
            ImageFormat::Webp => CaptureScreenshotFormatOption::Webp,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PdfOptions {
    pub format: PaperFormat,
    pub landscape: bool,
    pub scale: f64,
    pub margins: Margins,
    pub display_header_footer: bool,
    pub header_template: Option<String>,
    pub footer_template: Option<String>,
    pub print_background: bool,
    pub prefer_css_page_size: bool,
    pub page_ranges: Option<PageRanges>,
}

impl Default for PdfOptions {
    fn default() -> Self {
        Self {
            format: PaperFormat::default(),
            landscape: false,
            scale: 1.0,
            margins: Margins::default(),
            display_header_footer: false,
            header_template: None,
            footer_template: None,
            print_background: true,
            prefer_css_page_size: false,
            page_ranges: None,
        }
    }
}

impl PdfOptions {

    /// Paper size stays portrait, Chrome swaps it for landscape
    pub fn to_print_options(&self) -> PrintToPdfOptions {
        let (paper_width, paper_height) = self.format.size_in_inches();

        PrintToPdfOptions {
            landscape: Some(self.landscape),
            display_header_footer: Some(self.display_header_footer),
            print_background: Some(self.print_background),
            scale: Some(self.scale),
            paper_width: Some(paper_width),
            paper_height: Some(paper_height),
            margin_top: Some(self.margins.top.inches()),
            margin_bottom: Some(self.margins.bottom.inches()),
            margin_left: Some(self.margins.left.inches()),
            margin_right: Some(self.margins.right.inches()),
            page_ranges: self.page_ranges.as_ref().map(|r| r.as_str().to_string()),
            header_template: self.header_template.clone(),
            footer_template: self.footer_template.clone(),
            prefer_css_page_size: Some(self.prefer_css_page_size),
            ..Default::default()
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
pub struct ImageOptions {
    pub viewport: (u32, u32),
    pub format: ImageFormat,
}

impl ImageOptions {
    pub fn for_paper(format: PaperFormat, path: &Path) -> Result<Self> {
        Ok(Self {
            viewport: format.screenshot_viewport(),
            format: ImageFormat::from_path(path)?,
        })
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum Target {
    Pdf { path: PathBuf, options: PdfOptions },
    Image { path: PathBuf, options: ImageOptions },
}

impl Target {

    pub fn path(&self) -> &Path {
        match self {
            Target::Pdf { path, .. } | Target::Image { path, .. } => path,
        }
    }

    /// Window size the browser is launched with
    pub fn window_size(&self) -> (u32, u32) {
        match self {
            Target::Pdf { options, .. } => options.format.viewport(),
            Target::Image { options, .. } => options.viewport,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct NavigationOptions {
    pub wait_until: Vec<WaitUntil>,
    /// `None` waits forever
    pub timeout: Option<Duration>,
}

impl NavigationOptions {
    pub const DEFAULT_TIMEOUT_MS: u64 = 30_000;

    /// A timeout of 0 disables it
    pub fn new(wait_until: Vec<WaitUntil>, timeout_ms: u64) -> Self {
        let wait_until = if wait_until.is_empty() { vec![WaitUntil::Load] } else { wait_until };
        let timeout = (timeout_ms > 0).then(|| Duration::from_millis(timeout_ms));
        Self { wait_until, timeout }
    }
}

impl Default for NavigationOptions {
    fn default() -> Self {
        Self::new(vec![WaitUntil::Load], Self::DEFAULT_TIMEOUT_MS)
    }
}

#[derive(Debug, Clone, PartialEq, Default, Serialize)]
pub struct LaunchSettings {
    pub chrome_path: Option<PathBuf>,
    pub ignore_https_errors: bool,
}

/// Fully resolved render request, built from the command line by [`crate::cli::Args`]
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RenderOptions {
    pub source: Source,
    pub target: Target,
    pub navigation: NavigationOptions,
    pub launch: LaunchSettings,
}

/// Relative paths are taken from `cwd`
pub fn resolve_output(cwd: &Path, path: &Path) -> PathBuf {
    if path.is_absolute() {
        path.to_path_buf()
    } else {
        cwd.join(path)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::paper::Length;

    #[test]
    fn content_takes_precedence_over_url() {
        let source = Source::resolve(
            Some("https://example.com"),
            Some("<h1>hi</h1>".to_string()),
            ContentType::Inline,
        ).unwrap();
        assert_eq!(source, Source::Html("<h1>hi</h1>".to_string()));

        let source = Source::resolve(None, Some("page.html".to_string()), ContentType::File).unwrap();
        assert_eq!(source, Source::HtmlFile(PathBuf::from("page.html")));
    }

    #[test]
    fn url_source_must_parse() {
        let source = Source::resolve(Some("https://example.com/a"), None, ContentType::Inline).unwrap();
        assert!(matches!(source, Source::Url(u) if u.as_str() == "https://example.com/a"));

        assert!(matches!(
            Source::resolve(Some("example.com"), None, ContentType::Inline),
            Err(OptionsError::UrlError(_))
        ));
        assert!(matches!(
            Source::resolve(None, None, ContentType::Inline),
            Err(OptionsError::MissingSource)
        ));
    }

    #[test]
    fn image_format_from_extension() {
        assert_eq!(ImageFormat::from_path(Path::new("shot.png")).unwrap(), ImageFormat::Png);
        assert_eq!(ImageFormat::from_path(Path::new("shot.JPG")).unwrap(), ImageFormat::Jpeg);
        assert_eq!(ImageFormat::from_path(Path::new("shot.jpeg")).unwrap(), ImageFormat::Jpeg);
        assert_eq!(ImageFormat::from_path(Path::new("dir/shot.webp")).unwrap(), ImageFormat::Webp);
        assert_eq!(ImageFormat::from_path(Path::new("shot")).unwrap(), ImageFormat::Png);
        assert!(matches!(
            ImageFormat::from_path(Path::new("shot.gif")),
            Err(OptionsError::ImageExtension(ext)) if ext == "gif"
        ));
    }

    #[test]
    fn print_options_use_inches() {
        let options = PdfOptions {
            format: PaperFormat::Letter,
            landscape: true,
            scale: 0.5,
            margins: Margins {
                top: Length::from_pixels(96.0),
                bottom: Length::from_pixels(48.0),
                ..Default::default()
            },
            page_ranges: Some("1-2".parse().unwrap()),
            ..Default::default()
        };

        let print = options.to_print_options();
        assert_eq!(print.paper_width, Some(8.5));
        assert_eq!(print.paper_height, Some(11.0));
        assert_eq!(print.landscape, Some(true));
        assert_eq!(print.scale, Some(0.5));
        assert_eq!(print.margin_top, Some(1.0));
        assert_eq!(print.margin_bottom, Some(0.5));
        assert_eq!(print.margin_left, Some(0.0));
        assert_eq!(print.print_background, Some(true));
        assert_eq!(print.page_ranges.as_deref(), Some("1-2"));
        assert_eq!(print.header_template, None);
    }

    #[test]
    fn zero_timeout_disables_it() {
        assert_eq!(NavigationOptions::new(vec![], 0).timeout, None);
        assert_eq!(NavigationOptions::new(vec![], 0).wait_until, vec![WaitUntil::Load]);
        assert_eq!(
            NavigationOptions::default().timeout,
            Some(Duration::from_millis(30_000))
        );
    }

    #[test]
    fn relative_outputs_join_cwd() {
        let cwd = Path::new("/work");
        assert_eq!(resolve_output(cwd, Path::new("out.pdf")), PathBuf::from("/work/out.pdf"));
        assert_eq!(resolve_output(cwd, Path::new("/tmp/out.pdf")), PathBuf::from("/tmp/out.pdf"));
    }

    #[test]
    fn lifecycle_names() {
        assert_eq!(WaitUntil::DomContentLoaded.lifecycle_event(), "DOMContentLoaded");
        assert_eq!(WaitUntil::NetworkIdle0.lifecycle_event(), "networkIdle");
        assert_eq!(WaitUntil::NetworkIdle2.lifecycle_event(), "networkAlmostIdle");
    }
}
