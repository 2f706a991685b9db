use std::cell::{Cell, RefCell};
use std::rc::Rc;

use wasm_bindgen::prelude::*;

/// Runs a frame callback on every `requestAnimationFrame` until stopped.
///
/// The loop reschedules itself unconditionally; the callback decides whether
/// anything needs drawing. Dropping the loop cancels the pending frame.
pub struct FrameLoop {
    inner: Rc<Inner>,
}

struct Inner {
    window: Option<web_sys::Window>,
    running: Cell<bool>,
    raf_id: Cell<Option<i32>>,
    callback: RefCell<Option<Closure<dyn FnMut()>>>,
}

impl Inner {
    fn schedule(&self) {
        let cb_ref = self.callback.borrow();
        let Some(ref cb) = *cb_ref else {
            return;
        };
        let Some(window) = self.window.as_ref() else {
            self.running.set(false);
            return;
        };
        match window.request_animation_frame(cb.as_ref().unchecked_ref()) {
            Ok(id) => self.raf_id.set(Some(id)),
            Err(_) => {
                web_sys::console::warn_1(&"requestAnimationFrame failed; render loop stopped".into());
                self.running.set(false);
            }
        }
    }
}

impl FrameLoop {
    pub fn start(mut frame: impl FnMut() + 'static) -> Self {
        let inner = Rc::new(Inner {
            window: web_sys::window(),
            running: Cell::new(true),
            raf_id: Cell::new(None),
            callback: RefCell::new(None),
        });

        let inner_cb = inner.clone();
        let cb = Closure::<dyn FnMut()>::new(move || {
            inner_cb.raf_id.set(None);
            if !inner_cb.running.get() {
                return;
            }
            frame();
            if inner_cb.running.get() {
                inner_cb.schedule();
            }
        });
        *inner.callback.borrow_mut() = Some(cb);
        inner.schedule();

        Self { inner }
    }

    pub fn stop(&self) {
        self.inner.running.set(false);
        if let Some(raf_id) = self.inner.raf_id.replace(None)
            && let Some(window) = self.inner.window.as_ref()
        {
            let _ = window.cancel_animation_frame(raf_id);
        }
    }
}

impl Drop for FrameLoop {
    fn drop(&mut self) {
        self.stop();
        // Break the callback->inner reference cycle on teardown.
        self.inner.callback.borrow_mut().take();
    }
}
