mod backend;
mod component;
mod gesture;
mod listeners;
mod render_loop;
mod surface;

use imageviewer_shared::{Source, ViewerConfig};
use leptos::mount::mount_to;
use leptos::prelude::*;
use std::any::Any;
use std::cell::RefCell;
use wasm_bindgen::JsCast;

use crate::component::{ImageViewer, source_from_file};

thread_local! {
    static APP_MOUNT_HANDLE: RefCell<Option<Box<dyn Any>>> = RefCell::new(None);
}

#[component]
fn App() -> impl IntoView {
    let source = RwSignal::new(None::<Source>);
    let filetype = RwSignal::new(None::<String>);

    let on_file = move |ev: web_sys::Event| {
        let Some(input) = ev
            .target()
            .and_then(|target| target.dyn_into::<web_sys::HtmlInputElement>().ok())
        else {
            return;
        };
        let Some(file) = input.files().and_then(|files| files.get(0)) else {
            return;
        };
        let mime = file.type_();
        let hint = if mime.starts_with("image/") {
            Some("image".to_string())
        } else if mime == "application/pdf" {
            Some("pdf".to_string())
        } else {
            None
        };
        filetype.set(hint);
        source.set(Some(source_from_file(&file)));
    };

    let config = ViewerConfig {
        width: 960.0,
        height: 640.0,
        ..ViewerConfig::default()
    };

    view! {
        <main style="display: flex; flex-direction: column; gap: 8px; padding: 12px;">
            <input type="file" accept="image/*,application/pdf" on:change=on_file />
            <ImageViewer
                src=Signal::derive(move || source.get())
                filetype=Signal::derive(move || filetype.get())
                config=config
            />
        </main>
    }
}

fn main() {
    console_error_panic_hook::set_once();
    // Fails only when re-entered with a subscriber already installed.
    let _ = tracing_wasm::try_set_as_global_default();
    let Some(window) = web_sys::window() else {
        return;
    };
    let Some(document) = window.document() else {
        return;
    };
    let mount_target = document
        .get_element_by_id("app")
        .and_then(|node| node.dyn_into::<web_sys::HtmlElement>().ok())
        .or_else(|| document.body());
    let Some(target) = mount_target else {
        return;
    };

    APP_MOUNT_HANDLE.with(move |slot| {
        // Re-entering main() must not leave a second viewer bound to the page.
        let _old = slot.borrow_mut().take();
        let handle = mount_to(target, App);
        *slot.borrow_mut() = Some(Box::new(handle));
    });
}
