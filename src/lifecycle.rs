use std::collections::HashSet;
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};
use headless_chrome::browser::tab::Tab;
use headless_chrome::protocol::cdp::Page;
use headless_chrome::protocol::cdp::types::Event;
use thiserror::Error;
use tracing::{debug, trace};
use crate::options::WaitUntil;

#[derive(Error, Debug)]
pub enum LifecycleError {
    #[error("ChromeError: {0}")]
    ChromeError(#[from] anyhow::Error),
    #[error("Navigation timed out after {timeout:?} waiting for {missing:?}")]
    Timeout { timeout: Duration, missing: WaitUntil },
}

pub type Result<T> = std::result::Result<T, LifecycleError>;

/// Lifecycle events seen for one frame since its last `init`.
/// Nothing counts until a document has started loading.
#[derive(Debug, Default)]
pub struct FiredEvents(Option<HashSet<String>>);

impl FiredEvents {

    pub fn record(&mut self, name: &str) {
        if name == "init" {
            self.0 = Some(HashSet::from([name.to_string()]));
        } else if let Some(fired) = &mut self.0 {
            fired.insert(name.to_string());
        }
    }

    /// First condition that has not fired yet
    pub fn missing(&self, conditions: &[WaitUntil]) -> Option<WaitUntil> {
        conditions
            .iter()
            .copied()
            .find(|condition| {
                self.0
                    .as_ref()
                    .is_none_or(|fired| !fired.contains(condition.lifecycle_event()))
            })
    }
}

/// Watches `Page.lifecycleEvent` for the main frame of a tab.
/// Attach before navigating so no event is missed.
pub struct LifecycleWatcher {
    fired: Arc<Mutex<FiredEvents>>,
}

impl LifecycleWatcher {

    const POLL_INTERVAL: Duration = Duration::from_millis(50);

    pub fn attach(tab: &Tab) -> Result<Self> {
        tab.call_method(Page::SetLifecycleEventsEnabled { enabled: true })?;

        let main_frame = tab.call_method(Page::GetFrameTree(None))?.frame_tree.frame.id;
        let fired = Arc::new(Mutex::new(FiredEvents::default()));

        let watcher = Self { fired };
        let sink = watcher.sink();
        tab.add_event_listener(Arc::new(move |event: &Event| {
            if let Event::PageLifecycleEvent(lifecycle) = event {
                sink.observe(&main_frame, &lifecycle.params.frame_id, &lifecycle.params.name);
            }
        }))?;

        Ok(watcher)
    }

    fn sink(&self) -> Self {
        Self { fired: Arc::clone(&self.fired) }
    }

    /// Subframe events are ignored
    fn observe(&self, main_frame: &str, frame_id: &str, name: &str) {
        if frame_id != main_frame {
            return;
        }
        trace!(name, "lifecycle event");
        if let Ok(mut fired) = self.fired.lock() {
            fired.record(name);
        }
    }

    pub fn wait_for(&self, conditions: &[WaitUntil], timeout: Option<Duration>) -> Result<()> {
        let started = Instant::now();

        loop {
            let missing = match self.fired.lock() {
                Ok(fired) => fired.missing(conditions),
                Err(poisoned) => poisoned.into_inner().missing(conditions),
            };

            let Some(missing) = missing else {
                debug!(elapsed = ?started.elapsed(), ?conditions, "navigation finished");
                return Ok(());
            };

            if let Some(timeout) = timeout {
                if started.elapsed() >= timeout {
                    return Err(LifecycleError::Timeout { timeout, missing });
                }
            }

            std::thread::sleep(Self::POLL_INTERVAL);
        }
    }
}
