use std::cell::{Cell, Ref, RefCell, RefMut};
use std::rc::{Rc, Weak};

use tracing::{debug, warn};

use super::backend::DocumentBackend;
use super::{Resource, ResourceState, Source, SourceKind};
use crate::cache::ImageCache;
use crate::error::LoadError;
use crate::signal::ChangeSignal;
use crate::surface::{Bitmap, Surface};

/// Multi-page resource. The document is opened once per source to learn its
/// page count; each page is then rasterised on demand and kept in the shared
/// [`ImageCache`] under `(src, page)`.
pub struct DocumentResource<I> {
    shared: Rc<DocumentShared<I>>,
}

struct DocumentShared<I> {
    state: RefCell<ResourceState<I>>,
    changed: ChangeSignal,
    backend: Rc<dyn DocumentBackend<I>>,
    cache: Rc<RefCell<ImageCache<I>>>,
    /// Source whose page count is known.
    opened: RefCell<Option<String>>,
    /// Set on teardown; completions landing afterwards hand their results
    /// straight back to the backend.
    released: Cell<bool>,
}

impl<I: Bitmap + Clone + 'static> DocumentResource<I> {
    pub fn new(backend: Rc<dyn DocumentBackend<I>>, cache: Rc<RefCell<ImageCache<I>>>) -> Self {
        Self {
            shared: Rc::new(DocumentShared {
                state: RefCell::new(ResourceState::new(true)),
                changed: ChangeSignal::new(),
                backend,
                cache,
                opened: RefCell::new(None),
                released: Cell::new(false),
            }),
        }
    }
}

/// The resource behind `weak`, unless it was dropped or released.
fn live<I>(weak: &Weak<DocumentShared<I>>) -> Option<Rc<DocumentShared<I>>> {
    weak.upgrade().filter(|shared| !shared.released.get())
}

impl<I: Bitmap + Clone + 'static> DocumentShared<I> {
    fn is_open(&self, src: &str) -> bool {
        self.opened.borrow().as_deref() == Some(src)
    }

    /// Close the document whose page count is known, if any.
    fn close(&self) {
        let opened = self.opened.borrow_mut().take();
        if let Some(src) = opened {
            debug!(%src, "closing document");
            self.backend.close(&src);
        }
    }

    fn open(self: &Rc<Self>) {
        let (src, owned_url) = {
            let mut state = self.state.borrow_mut();
            if state.src.is_empty() {
                return;
            }
            let owned_url = state.begin_load();
            (state.src.clone(), owned_url)
        };
        debug!(%src, "opening document");

        let weak = Rc::downgrade(self);
        let backend = self.backend.clone();
        let issued = src.clone();
        self.backend.open(
            &src,
            Box::new(move |result| {
                if let Some(url) = owned_url {
                    backend.revoke_object_url(&url);
                }
                match live(&weak) {
                    Some(shared) => shared.finish_open(&issued, result),
                    None if result.is_ok() => backend.close(&issued),
                    None => {}
                }
            }),
        );
    }

    fn finish_open(self: &Rc<Self>, issued: &str, result: Result<u32, LoadError>) {
        {
            let mut state = self.state.borrow_mut();
            if state.src != issued {
                debug!(src = issued, current = %state.src, "ignoring superseded document open");
                if result.is_ok() {
                    self.backend.close(issued);
                }
                return;
            }
            match result {
                Ok(pages) if pages > 0 => {
                    state.total_item = i32::try_from(pages).unwrap_or(i32::MAX);
                    state.current_item = state.current_item.clamp(1, state.total_item);
                    *self.opened.borrow_mut() = Some(issued.to_string());
                    debug!(src = issued, pages, "document opened");
                }
                Ok(_) => {
                    let error = LoadError::Decode(format!("{issued} has no pages"));
                    warn!(src = issued, %error, "document open failed");
                    state.fail(error);
                }
                Err(error) => {
                    warn!(src = issued, %error, "document open failed");
                    state.fail(error);
                }
            }
        }
        if self.is_open(issued) {
            self.load_page();
        } else {
            self.changed.emit();
        }
    }

    fn load_page(self: &Rc<Self>) {
        let (src, page) = {
            let mut state = self.state.borrow_mut();
            if state.src.is_empty() {
                return;
            }
            if state.current_item < 1 || state.current_item > state.total_item {
                let error = LoadError::PageOutOfRange {
                    page: state.current_item,
                    total: state.total_item,
                };
                warn!(src = %state.src, %error, "page request rejected");
                state.fail(error);
                drop(state);
                self.changed.emit();
                return;
            }
            state.begin_load();
            (state.src.clone(), state.current_item)
        };

        let cached = self.cache.borrow().get(&src, page).cloned();
        if let Some(image) = cached {
            debug!(%src, page, "page served from cache");
            self.finish_page(&src, page, Ok(image));
            return;
        }

        debug!(%src, page, "rendering page");
        let weak = Rc::downgrade(self);
        let backend = self.backend.clone();
        let issued = src.clone();
        self.backend.render_page(
            &src,
            page as u32,
            Box::new(move |result| match live(&weak) {
                Some(shared) => {
                    let result = shared.remember(&issued, page, result);
                    shared.finish_page(&issued, page, result);
                }
                None => {
                    if let Ok(image) = &result
                        && let Some(url) = image.object_url()
                    {
                        backend.revoke_object_url(url);
                    }
                }
            }),
        );
    }

    /// Store a freshly rendered page. If the key is already cached (two
    /// renders of the same page raced), the cached bitmap wins and the
    /// duplicate's object URL is revoked.
    fn remember(&self, src: &str, page: i32, result: Result<I, LoadError>) -> Result<I, LoadError> {
        let image = result?;
        let mut inserted = false;
        let kept = self
            .cache
            .borrow_mut()
            .get_or_insert_with(src, page, || {
                inserted = true;
                image.clone()
            })
            .clone();
        if !inserted
            && let Some(url) = image.object_url()
            && kept.object_url() != Some(url)
        {
            self.backend.revoke_object_url(url);
        }
        Ok(kept)
    }

    fn finish_page(&self, issued: &str, page: i32, result: Result<I, LoadError>) {
        {
            let mut state = self.state.borrow_mut();
            if state.src != issued || state.current_item != page {
                debug!(src = issued, page, "ignoring superseded page render");
                return;
            }
            match result {
                Ok(image) => {
                    state.image = Some(image);
                    state.loading = false;
                    state.loaded = true;
                }
                Err(error) => {
                    warn!(src = issued, page, %error, "page render failed");
                    state.fail(error);
                }
            }
        }
        self.changed.emit();
    }
}

impl<S, I> Resource<S> for DocumentResource<I>
where
    S: Surface<Image = I>,
    I: Bitmap + Clone + 'static,
{
    fn kind(&self) -> SourceKind {
        SourceKind::Document
    }

    fn state(&self) -> Ref<'_, ResourceState<I>> {
        self.shared.state.borrow()
    }

    fn state_mut(&self) -> RefMut<'_, ResourceState<I>> {
        self.shared.state.borrow_mut()
    }

    fn on_change(&self) -> &ChangeSignal {
        &self.shared.changed
    }

    fn set_source(&self, source: &Source) {
        let stale = {
            let mut state = self.shared.state.borrow_mut();
            if state.holds(source) {
                return;
            }
            state.assign(source)
        };
        if let Some(url) = stale {
            self.shared.backend.revoke_object_url(&url);
        }
        self.shared.close();
    }

    fn set_up(&self) {
        let (src, loaded, loading) = {
            let state = self.shared.state.borrow();
            (state.src.clone(), state.loaded, state.loading)
        };
        if loading {
            return;
        }
        if !self.shared.is_open(&src) {
            self.shared.open();
        } else if loaded {
            self.shared.changed.emit();
        } else {
            self.shared.load_page();
        }
    }

    fn load_resource(&self) {
        let src = self.shared.state.borrow().src.clone();
        if self.shared.is_open(&src) {
            self.shared.load_page();
        } else {
            self.shared.open();
        }
    }

    fn release(&self) {
        self.shared.released.set(true);
        let unconsumed = self.shared.state.borrow_mut().take_unconsumed();
        if let Some(url) = unconsumed {
            self.shared.backend.revoke_object_url(&url);
        }
        self.shared.close();
    }
}
