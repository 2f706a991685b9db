use wasm_bindgen::JsCast;
use wasm_bindgen::prelude::*;
use web_sys::{AddEventListenerOptions, Event, EventTarget};

/// A DOM event listener that stays attached for as long as this value lives.
pub struct ListenerBinding {
    target: EventTarget,
    event: &'static str,
    handler: Closure<dyn FnMut(Event)>,
}

impl ListenerBinding {
    /// Attach `handler` for `event` on `target`. Events that do not cast to
    /// `E` are skipped. Non-passive listeners may call `prevent_default`.
    pub fn bind<E>(
        target: &EventTarget,
        event: &'static str,
        passive: bool,
        mut handler: impl FnMut(E) + 'static,
    ) -> Option<Self>
    where
        E: JsCast + 'static,
    {
        let handler = Closure::<dyn FnMut(Event)>::new(move |event: Event| {
            if let Ok(event) = event.dyn_into::<E>() {
                handler(event);
            }
        });
        let options = AddEventListenerOptions::new();
        options.set_passive(passive);
        if let Err(err) = target.add_event_listener_with_callback_and_add_event_listener_options(
            event,
            handler.as_ref().unchecked_ref(),
            &options,
        ) {
            web_sys::console::warn_1(&format!("Failed to bind {event} listener: {err:?}").into());
            return None;
        }
        Some(Self {
            target: target.clone(),
            event,
            handler,
        })
    }
}

impl Drop for ListenerBinding {
    fn drop(&mut self) {
        let _ = self
            .target
            .remove_event_listener_with_callback(self.event, self.handler.as_ref().unchecked_ref());
    }
}
