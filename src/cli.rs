use std::path::{Path, PathBuf};
use clap::{ArgAction, Parser};
use crate::options::{
    self, ContentType, ImageOptions, LaunchSettings, NavigationOptions, PdfOptions,
    RenderOptions, Source, Target, WaitUntil,
};
use crate::paper::{Length, Margins, PageRanges, PaperFormat};

/// Converts a webpage or an HTML fragment to a PDF, or a full-page
/// screenshot, using a headless browser
// `-h` is the header template, help is `--help` only
#[derive(Parser, Debug)]
#[command(version, about, long_about = None, disable_help_flag = true)]
pub struct Args {
    /// URL of the website to convert
    #[arg(short, long)]
    pub url: Option<String>,

    /// Output PDF file path
    #[arg(short, long, default_value = "output.pdf")]
    pub output: PathBuf,

    /// Paper format ('A4', 'Letter', etc.)
    #[arg(short, long, default_value = "A4")]
    pub format: PaperFormat,

    /// Print the PDF in landscape orientation
    #[arg(short, long)]
    pub landscape: bool,

    /// Scale of the webpage rendering, between 0.1 and 2
    #[arg(short, long, default_value_t = 1.0, value_parser = parse_scale)]
    pub scale: f64,

    /// Top margin of the PDF file (px, in, cm or mm; bare numbers are px)
    #[arg(short = 'm', long, default_value = "0")]
    pub margin_top: Length,

    /// Bottom margin of the PDF file
    #[arg(short = 'b', long, default_value = "0")]
    pub margin_bottom: Length,

    /// Right margin of the PDF file
    #[arg(short = 'r', long, default_value = "0")]
    pub margin_right: Length,

    /// Left margin of the PDF file
    #[arg(short = 'e', long, default_value = "0")]
    pub margin_left: Length,

    /// HTML template for the header of the PDF file
    #[arg(short = 'h', long)]
    pub header_template: Option<String>,

    /// HTML template for the footer of the PDF file
    #[arg(short = 't', long)]
    pub footer_template: Option<String>,

    /// Display the header and footer of the PDF file
    #[arg(short = 'n', long)]
    pub display_header_footer: bool,

    /// Prefer the CSS page size over the paper format
    #[arg(short = 'c', long)]
    pub prefer_css_page_size: bool,

    /// Page ranges to print, e.g. '1-5, 8, 11-13'
    #[arg(short = 'd', long)]
    pub page_ranges: Option<PageRanges>,

    /// Ignore HTTPS certificate errors during navigation
    #[arg(short = 'a', long)]
    pub ignore_http_errors: bool,

    /// When to consider the navigation succeeded, comma separated
    #[arg(short = 'g', long, value_enum, value_delimiter = ',', default_value = "load")]
    pub wait_until: Vec<WaitUntil>,

    /// Maximum navigation time in milliseconds, 0 disables the timeout
    #[arg(short = 'k', long, env = "WEBPAGE2PDF_TIMEOUT", default_value_t = NavigationOptions::DEFAULT_TIMEOUT_MS)]
    pub timeout: u64,

    /// Display detailed information during execution
    #[arg(short, long)]
    pub verbose: bool,

    /// HTML content to set on the page
    #[arg(short = 'x', long)]
    pub content: Option<String>,

    /// Type of content: the HTML itself or a path to an HTML file
    #[arg(long, value_enum, default_value = "string")]
    pub content_type: ContentType,

    /// Generate an image instead of a PDF
    #[arg(short, long)]
    pub image: bool,

    /// Output image file path (.png, .jpg or .webp)
    #[arg(short = 'p', long, default_value = "output.png")]
    pub image_output: PathBuf,

    /// Chrome or Chromium executable, found automatically if not given
    #[arg(long, env = "CHROME_PATH")]
    pub chrome_path: Option<PathBuf>,

    /// Print help
    #[arg(long, action = ArgAction::Help)]
    pub help: Option<bool>,
}

fn parse_scale(s: &str) -> Result<f64, String> {
    let scale: f64 = s.parse().map_err(|_| format!("{s:?} is not a number"))?;
    if (0.1..=2.0).contains(&scale) {
        Ok(scale)
    } else {
        Err(format!("scale must be between 0.1 and 2, got {scale}"))
    }
}

impl Args {

    /// Relative output paths are resolved against `cwd`
    pub fn into_render_options(self, cwd: &Path) -> options::Result<RenderOptions> {

        let source = Source::resolve(self.url.as_deref(), self.content, self.content_type)?;

        let target = if self.image {
            let path = options::resolve_output(cwd, &self.image_output);
            let image = ImageOptions::for_paper(self.format, &path)?;
            Target::Image { path, options: image }
        } else {
            let pdf = PdfOptions {
                format: self.format,
                landscape: self.landscape,
                scale: self.scale,
                margins: Margins {
                    top: self.margin_top,
                    bottom: self.margin_bottom,
                    left: self.margin_left,
                    right: self.margin_right,
                },
                display_header_footer: self.display_header_footer,
                header_template: self.header_template,
                footer_template: self.footer_template,
                print_background: true,
                prefer_css_page_size: self.prefer_css_page_size,
                page_ranges: self.page_ranges,
            };
            Target::Pdf { path: options::resolve_output(cwd, &self.output), options: pdf }
        };

        Ok(RenderOptions {
            source,
            target,
            navigation: NavigationOptions::new(self.wait_until, self.timeout),
            launch: LaunchSettings {
                chrome_path: self.chrome_path,
                ignore_https_errors: self.ignore_http_errors,
            },
        })
    }
}
