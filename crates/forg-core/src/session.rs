//! Browsing session: ties the disk cache, the network and the history
//! together.

use std::thread::JoinHandle;

use forg_net::{Progress, StopFlag};
use forg_types::error::{ForgError, Result};

use crate::bookmarks::Bookmark;
use crate::cache::DiskCache;
use crate::connection::GopherConnection;
use crate::context::ForgContext;
use crate::history::History;
use crate::resource::Resource;
use crate::response::Response;

/// One visited document.
#[derive(Debug, Clone, PartialEq)]
pub struct HistoryEntry {
    pub response: Response,
    pub resource: Resource,
    /// Opaque handle owned by whatever displays the entry.
    pub presentation: Option<u64>,
}

/// A successful fetch, not yet in the history.
#[derive(Debug, Clone)]
pub struct Outcome {
    pub resource: Resource,
    pub response: Response,
    pub from_cache: bool,
}

/// A fetch running on a worker thread.
pub struct FetchTask {
    handle: Option<JoinHandle<Result<Outcome>>>,
    stop: StopFlag,
    url: String,
}

impl FetchTask {
    pub fn url(&self) -> &str {
        &self.url
    }

    pub fn is_finished(&self) -> bool {
        self.handle.as_ref().is_none_or(JoinHandle::is_finished)
    }

    /// Ask the worker to abandon the transfer. The task then finishes
    /// with a connection error.
    pub fn cancel(&self) {
        log::info!("Cancelling fetch of {}", self.url);
        self.stop.stop();
    }

    /// Block until the worker is done.
    pub fn wait(mut self) -> Result<Outcome> {
        self.join()
    }

    /// The result, if the worker is done. Returns `None` while it runs
    /// and after the result has been taken.
    pub fn try_take(&mut self) -> Option<Result<Outcome>> {
        if self.handle.as_ref()?.is_finished() {
            Some(self.join())
        } else {
            None
        }
    }

    fn join(&mut self) -> Result<Outcome> {
        let handle = self.handle.take().ok_or_else(|| {
            ForgError::Connection(format!("fetch of {} already collected", self.url))
        })?;
        handle
            .join()
            .map_err(|_| ForgError::Connection(format!("fetch of {} panicked", self.url)))?
    }
}

/// Navigation controller for one browsing session.
pub struct Session {
    context: ForgContext,
    connection: GopherConnection,
    cache: DiskCache,
    history: History<HistoryEntry>,
}

impl Session {
    pub fn new(context: ForgContext) -> Self {
        Self {
            connection: context.connection(),
            cache: context.cache(),
            history: History::new(),
            context,
        }
    }

    pub fn context(&self) -> &ForgContext {
        &self.context
    }

    pub fn history(&self) -> &History<HistoryEntry> {
        &self.history
    }

    pub fn history_mut(&mut self) -> &mut History<HistoryEntry> {
        &mut self.history
    }

    pub fn cache(&self) -> &DiskCache {
        &self.cache
    }

    pub fn connection(&self) -> &GopherConnection {
        &self.connection
    }

    pub fn current(&self) -> Option<&HistoryEntry> {
        self.history.current()
    }

    /// A bookmark for the current entry, if there is one.
    pub fn bookmark_current(&self) -> Option<Bookmark> {
        self.history.current().map(|entry| Bookmark::new(&entry.resource))
    }

    /// Attach a display handle to the current entry.
    pub fn set_presentation(&mut self, handle: u64) {
        if let Some(entry) = self.history.current_mut() {
            entry.presentation = Some(handle);
        }
    }

    /// The flag in-flight fetches poll. Clear it from another thread to
    /// cancel.
    pub fn stop_flag(&self) -> StopFlag {
        self.context.stop.clone()
    }

    /// Cancel whatever is in flight.
    pub fn stop(&self) {
        self.context.stop.stop();
    }

    /// Fetch `resource` and make it the current entry, dropping any
    /// forward history.
    pub fn go_to(&mut self, resource: Resource) -> Result<&HistoryEntry> {
        let outcome = self.fetch(resource, None)?;
        self.accept(outcome)
    }

    /// Navigate to the configured home page.
    pub fn go_home(&mut self) -> Result<&HistoryEntry> {
        let home = Resource::parse_url(&self.context.config.home)?;
        self.go_to(home)
    }

    /// Fetch without touching the history, from the cache when allowed.
    pub fn fetch(
        &self,
        resource: Resource,
        progress: Option<&mut dyn FnMut(Progress)>,
    ) -> Result<Outcome> {
        self.context.stop.resume();
        load(
            &self.connection,
            &self.cache,
            self.context.config.use_cache,
            resource,
            progress,
        )
    }

    /// Run [`Session::fetch`] on a worker thread.
    ///
    /// The worker gets its own connection sharing this session's host
    /// cache and stop flag.
    pub fn spawn_fetch(&self, resource: Resource) -> Result<FetchTask> {
        self.context.stop.resume();
        let url = resource.to_url();
        let connection = self.context.connection();
        let cache = self.cache.clone();
        let use_cache = self.context.config.use_cache;

        let handle = std::thread::Builder::new()
            .name("forg-fetch".into())
            .spawn(move || load(&connection, &cache, use_cache, resource, None))
            .map_err(|e| ForgError::Connection(format!("cannot start fetch of {url}: {e}")))?;

        Ok(FetchTask {
            handle: Some(handle),
            stop: self.context.stop.clone(),
            url,
        })
    }

    /// Cache a fetched document and insert it as the current entry.
    ///
    /// Cache failures are logged and otherwise ignored.
    pub fn accept(&mut self, outcome: Outcome) -> Result<&HistoryEntry> {
        let Outcome {
            resource,
            response,
            from_cache,
        } = outcome;

        if !from_cache {
            self.remember(&response, &resource);
        }
        log::info!("Now at {}", resource.to_url());
        self.history.insert(
            HistoryEntry {
                response,
                resource,
                presentation: None,
            },
            true,
        );
        self.current_entry()
    }

    /// Step forward. An entry that holds a failed response is fetched
    /// again.
    pub fn go_forward(&mut self) -> Result<&HistoryEntry> {
        self.history.next()?;
        self.refresh_if_failed()?;
        self.current_entry()
    }

    /// Step back. An entry that holds a failed response is fetched again.
    pub fn go_back(&mut self) -> Result<&HistoryEntry> {
        self.history.prev()?;
        self.refresh_if_failed()?;
        self.current_entry()
    }

    /// Fetch the current entry from the network again and replace it.
    pub fn reload(&mut self) -> Result<&HistoryEntry> {
        let resource = self
            .history
            .current()
            .map(|e| e.resource.clone())
            .ok_or_else(|| ForgError::NavigationBoundary("Nothing to reload".into()))?;

        self.context.stop.resume();
        let outcome = load(&self.connection, &self.cache, false, resource, None)?;
        self.remember(&outcome.response, &outcome.resource);
        self.history.replace_current(HistoryEntry {
            response: outcome.response,
            resource: outcome.resource,
            presentation: None,
        })?;
        self.current_entry()
    }

    /// End the session, emptying the cache if configured to.
    pub fn close(self) -> Result<()> {
        if self.context.config.delete_cache_on_exit && self.cache.root().is_dir() {
            self.cache.purge()?;
        }
        Ok(())
    }

    /// Re-fetch the current entry in place when it holds a failure. If
    /// the fetch fails again the entry is dropped.
    fn refresh_if_failed(&mut self) -> Result<()> {
        let Some(entry) = self.history.current() else {
            return Ok(());
        };
        if !entry.response.is_error() {
            return Ok(());
        }

        let resource = entry.resource.clone();
        log::info!("Fetching {} again after an earlier failure", resource.to_url());
        self.context.stop.resume();
        match load(
            &self.connection,
            &self.cache,
            self.context.config.use_cache,
            resource,
            None,
        ) {
            Ok(outcome) => {
                if !outcome.from_cache {
                    self.remember(&outcome.response, &outcome.resource);
                }
                self.history.replace_current(HistoryEntry {
                    response: outcome.response,
                    resource: outcome.resource,
                    presentation: None,
                })?;
                Ok(())
            },
            Err(e) => {
                self.history.remove_current()?;
                Err(e)
            },
        }
    }

    fn remember(&self, response: &Response, resource: &Resource) {
        if !self.context.config.use_cache || !response.should_cache || !resource.should_cache {
            return;
        }
        if let Err(e) = self.cache.store(response, resource) {
            log::warn!("Not cached: {e}");
        }
    }

    fn current_entry(&self) -> Result<&HistoryEntry> {
        self.history
            .current()
            .ok_or_else(|| ForgError::NavigationBoundary("No current entry".into()))
    }
}

/// Fetch `resource`, from the cache when allowed and possible.
///
/// ASK submissions always go to the network. A failed fetch is an
/// error, never a response.
fn load(
    connection: &GopherConnection,
    cache: &DiskCache,
    use_cache: bool,
    resource: Resource,
    progress: Option<&mut dyn FnMut(Progress)>,
) -> Result<Outcome> {
    if use_cache && resource.data_block.is_none() {
        match cache.load(&resource) {
            Ok(Some(response)) => {
                log::info!("Loaded {} from the cache", resource.to_url());
                return Ok(Outcome {
                    resource,
                    response,
                    from_cache: true,
                });
            },
            Ok(None) => {},
            Err(e) => log::warn!("Ignoring cache entry: {e}"),
        }
    }

    let response = connection.try_get_resource(&resource, progress)?;
    Ok(Outcome {
        resource,
        response,
        from_cache: false,
    })
}
