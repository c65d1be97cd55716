use std::ffi::OsStr;
use std::sync::Arc;
use std::time::Duration;
use base64::Engine;
use headless_chrome::LaunchOptions;
use headless_chrome::browser::tab::{RequestInterceptor, RequestPausedDecision, Tab};
use headless_chrome::protocol::cdp::Fetch::events::RequestPausedEvent;
use headless_chrome::protocol::cdp::Fetch::{FulfillRequest, HeaderEntry};
use thiserror::Error;
use tracing::{debug, info, trace};
use url::Url;
use crate::lifecycle::{LifecycleError, LifecycleWatcher};
use crate::options::{LaunchSettings, NavigationOptions};
use crate::page::WebPage;

#[derive(Error, Debug)]
pub enum BrowserError {
    #[error("ChromeError: {0}")]
    ChromeError(#[from] anyhow::Error),
    #[error("Can't build launch options: {0}")]
    LaunchOptions(String),
    #[error("{0}")]
    Lifecycle(#[from] LifecycleError),
}
pub type Result<T> = std::result::Result<T, BrowserError>;

pub struct Browser (headless_chrome::Browser);

impl Browser {

    const LAUNCH_ARGS: [&'static str; 2] = ["--disable-setuid-sandbox", "--disable-dev-shm-usage"];

    /// Stand-in for "no timeout", `Instant + Duration::MAX` would overflow
    const FOREVER: Duration = Duration::from_secs(24 * 60 * 60);

    /// Chrome's own idle timeout must outlive the navigation timeout
    const IDLE_MARGIN: Duration = Duration::from_secs(30);

    pub fn launch(settings: &LaunchSettings, window_size: (u32, u32), navigation_timeout: Option<Duration>) -> Result<Self> {

        let idle_timeout = navigation_timeout.unwrap_or(Self::FOREVER) + Self::IDLE_MARGIN;
        let args = Self::LAUNCH_ARGS.iter().copied().map(OsStr::new).collect();

        let launch_options = LaunchOptions::default_builder()
            .headless(true)
            .sandbox(false)
            .window_size(Some(window_size))
            .ignore_certificate_errors(settings.ignore_https_errors)
            .idle_browser_timeout(idle_timeout)
            .path(settings.chrome_path.clone())
            .args(args)
            .build()
            .map_err(|e| BrowserError::LaunchOptions(e.to_string()))?;

        debug!(?window_size, ?idle_timeout, chrome = ?settings.chrome_path, "launching headless Chrome");

        Ok(Self(headless_chrome::Browser::new(launch_options)?))
    }

    fn new_tab(&self, navigation: &NavigationOptions) -> Result<Arc<Tab>> {
        let tab = self.0.new_tab()?;
        tab.set_default_timeout(navigation.timeout.unwrap_or(Self::FOREVER));
        Ok(tab)
    }

    fn navigate(tab: Arc<Tab>, url: &str, navigation: &NavigationOptions) -> Result<WebPage> {

        let watcher = LifecycleWatcher::attach(&tab)?;

        tab.navigate_to(url)?;
        watcher.wait_for(&navigation.wait_until, navigation.timeout)?;

        Ok(WebPage::from_tab(tab))
    }

    pub fn open_page(&self, url: &str, navigation: &NavigationOptions) -> Result<WebPage> {

        info!(url, wait_until = ?navigation.wait_until, "navigating");

        let tab = self.new_tab(navigation)?;
        Self::navigate(tab, url, navigation)
    }

    /// Loads `html` as the main document. The navigation to [`CONTENT_URL`]
    /// is answered from memory, so the content size isn't bounded by
    /// Chrome's URL length limit.
    pub fn open_html(&self, html: &str, navigation: &NavigationOptions) -> Result<WebPage> {

        info!(bytes = html.len(), wait_until = ?navigation.wait_until, "loading HTML content");

        let tab = self.new_tab(navigation)?;

        let body = base64::engine::general_purpose::STANDARD.encode(html);
        let interceptor: Arc<dyn RequestInterceptor + Send + Sync> = Arc::new(
            move |_transport, _session_id, event: RequestPausedEvent| {
                if is_content_request(&event.params.request.url) {
                    trace!(url = %event.params.request.url, "serving HTML content");
                    RequestPausedDecision::Fulfill(content_response(event.params.request_id.clone(), &body))
                } else {
                    RequestPausedDecision::Continue(None)
                }
            },
        );

        tab.enable_fetch(None, Some(false))?;
        tab.enable_request_interception(interceptor)?;

        Self::navigate(tab, CONTENT_URL, navigation)
    }
}

/// Address inline HTML is served from, never resolved
pub const CONTENT_URL: &str = "http://webpage2pdf.invalid/";

/// Matches on host so an HTTPS upgrade of the navigation is still served
fn is_content_request(url: &str) -> bool {
    Url::parse(url)
        .ok()
        .is_some_and(|url| url.host_str() == Some("webpage2pdf.invalid") && url.path() == "/")
}

fn content_response(request_id: String, base64_body: &str) -> FulfillRequest {
    FulfillRequest {
        request_id,
        response_code: 200,
        response_headers: Some(vec![HeaderEntry {
            name: "Content-Type".to_string(),
            value: "text/html; charset=utf-8".to_string(),
        }]),
        binary_response_headers: None,
        body: Some(base64_body.to_string()),
        response_phrase: None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn only_the_content_address_is_served() {
        assert!(is_content_request(CONTENT_URL));
        assert!(is_content_request("https://webpage2pdf.invalid/"));
        assert!(!is_content_request("http://webpage2pdf.invalid/style.css"));
        assert!(!is_content_request("https://example.com/"));
        assert!(!is_content_request("not a url"));
    }

    #[test]
    fn large_content_is_sent_as_a_response_body() {
        let html = format!("<p>{}</p>", "a".repeat(3 * 1024 * 1024));
        let body = base64::engine::general_purpose::STANDARD.encode(&html);

        let response = content_response("req-1".to_string(), &body);
        assert_eq!(response.request_id, "req-1");
        assert_eq!(response.response_code, 200);

        let decoded = base64::engine::general_purpose::STANDARD
            .decode(response.body.unwrap())
            .unwrap();
        assert_eq!(decoded.len(), html.len());

        let headers = response.response_headers.unwrap();
        assert_eq!(headers[0].name, "Content-Type");
        assert_eq!(headers[0].value, "text/html; charset=utf-8");
    }

    #[test]
    #[ignore = "needs a local Chrome"]
    fn open_inline_html() {
        let browser = Browser::launch(&LaunchSettings::default(), (800, 600), Some(Duration::from_secs(30))).unwrap();
        let page = browser
            .open_html("<title>Hello</title><h1>Hello</h1>", &NavigationOptions::default())
            .unwrap();
        assert_eq!(page.title().unwrap(), "Hello");
    }

    #[test]
    #[ignore = "needs a local Chrome"]
    fn open_content_larger_than_url_limit() {
        let browser = Browser::launch(&LaunchSettings::default(), (800, 600), Some(Duration::from_secs(30))).unwrap();
        let html = format!("<title>Big</title><p>{}</p>", "a".repeat(3 * 1024 * 1024));
        let page = browser.open_html(&html, &NavigationOptions::default()).unwrap();
        assert_eq!(page.title().unwrap(), "Big");
    }
}
