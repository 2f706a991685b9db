use std::cell::{Ref, RefCell, RefMut};
use std::rc::{Rc, Weak};

use tracing::{debug, warn};

use super::backend::ImageBackend;
use super::{Resource, ResourceState, Source, SourceKind};
use crate::error::LoadError;
use crate::signal::ChangeSignal;
use crate::surface::{Bitmap, Surface};

/// Single-bitmap resource: one item, decoded straight from its source.
pub struct ImageResource<I> {
    shared: Rc<ImageShared<I>>,
}

struct ImageShared<I> {
    state: RefCell<ResourceState<I>>,
    changed: ChangeSignal,
    backend: Rc<dyn ImageBackend<I>>,
}

impl<I: Bitmap + Clone + 'static> ImageResource<I> {
    pub fn new(backend: Rc<dyn ImageBackend<I>>) -> Self {
        Self {
            shared: Rc::new(ImageShared {
                state: RefCell::new(ResourceState::new(false)),
                changed: ChangeSignal::new(),
                backend,
            }),
        }
    }

    fn load(&self) {
        let (src, owned_url) = {
            let mut state = self.shared.state.borrow_mut();
            if state.src.is_empty() {
                return;
            }
            let owned_url = state.begin_load();
            (state.src.clone(), owned_url)
        };
        debug!(%src, "loading image");

        let weak: Weak<ImageShared<I>> = Rc::downgrade(&self.shared);
        let backend = self.shared.backend.clone();
        let issued = src.clone();
        self.shared.backend.decode(
            &src,
            Box::new(move |result| {
                if let Some(url) = owned_url {
                    backend.revoke_object_url(&url);
                }
                if let Some(shared) = weak.upgrade() {
                    shared.finish(&issued, result);
                }
            }),
        );
    }
}

impl<I> ImageShared<I> {
    fn finish(&self, issued: &str, result: Result<I, LoadError>) {
        {
            let mut state = self.state.borrow_mut();
            if state.src != issued {
                debug!(src = issued, current = %state.src, "ignoring superseded image load");
                return;
            }
            match result {
                Ok(image) => {
                    state.image = Some(image);
                    state.loading = false;
                    state.loaded = true;
                    state.current_item = 1;
                    state.total_item = 1;
                    debug!(src = issued, "image loaded");
                }
                Err(error) => {
                    warn!(src = issued, %error, "image load failed");
                    state.fail(error);
                }
            }
        }
        self.changed.emit();
    }
}

impl<S, I> Resource<S> for ImageResource<I>
where
    S: Surface<Image = I>,
    I: Bitmap + Clone + 'static,
{
    fn kind(&self) -> SourceKind {
        SourceKind::Image
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
    }

    fn set_up(&self) {
        let (loaded, loading) = {
            let state = self.shared.state.borrow();
            (state.loaded, state.loading)
        };
        if loaded {
            self.shared.changed.emit();
        } else if !loading {
            self.load();
        }
    }

    fn load_resource(&self) {
        self.load();
    }

    fn release(&self) {
        let unconsumed = self.shared.state.borrow_mut().take_unconsumed();
        if let Some(url) = unconsumed {
            self.shared.backend.revoke_object_url(&url);
        }
    }
}
