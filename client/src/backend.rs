use std::cell::RefCell;
use std::collections::HashMap;
use std::rc::Rc;
use std::sync::atomic::{AtomicBool, Ordering};

use imageviewer_shared::{Completion, DocumentBackend, ImageBackend, LoadError};
use js_sys::{Array, Function, Object, Promise, Reflect};
use serde::Serialize;
use wasm_bindgen::JsCast;
use wasm_bindgen::prelude::*;
use wasm_bindgen_futures::JsFuture;
use web_sys::{CanvasRenderingContext2d, HtmlCanvasElement, HtmlImageElement, Url};

use crate::surface::WebImage;

/// Page rasterisation scale handed to pdf.js.
const PDF_RENDER_SCALE: f64 = 2.0;
const PDFJS_GLOBAL: &str = "pdfjsLib";

static PDFJS_WARNED: AtomicBool = AtomicBool::new(false);

fn warn(message: &str) {
    web_sys::console::warn_1(&message.into());
}

fn warn_pdfjs_once(message: &str) {
    if PDFJS_WARNED
        .compare_exchange(false, true, Ordering::Relaxed, Ordering::Relaxed)
        .is_ok()
    {
        warn(message);
    }
}

fn describe(err: &JsValue) -> String {
    err.as_string().unwrap_or_else(|| format!("{err:?}"))
}

fn revoke_object_url(url: &str) {
    Url::revoke_object_url(url).ok();
}

/// Create an `<img>`, point it at `src` and wait for the browser to decode it.
async fn decode_image(src: &str) -> Result<HtmlImageElement, LoadError> {
    let image = HtmlImageElement::new().map_err(|err| LoadError::Unavailable(describe(&err)))?;
    image.set_src(src);
    JsFuture::from(image.decode())
        .await
        .map_err(|err| LoadError::Decode(format!("{src}: {}", describe(&err))))?;
    Ok(image)
}

/// Decodes single images through `HtmlImageElement`.
pub struct WebImageBackend;

impl ImageBackend<WebImage> for WebImageBackend {
    fn decode(&self, src: &str, done: Completion<WebImage>) {
        let src = src.to_string();
        wasm_bindgen_futures::spawn_local(async move {
            let result = decode_image(&src).await.map(|element| WebImage {
                element,
                object_url: None,
            });
            if let Err(err) = &result {
                warn(&format!("Failed to load image: {err}"));
            }
            done(result);
        });
    }

    fn revoke_object_url(&self, url: &str) {
        revoke_object_url(url);
    }
}

#[derive(Serialize)]
struct ViewportParams {
    scale: f64,
}

/// Opens PDFs and rasterises pages through the `pdfjsLib` global. Rendered
/// pages are exposed as PNG object URLs owned by the image cache.
#[derive(Default)]
pub struct PdfJsBackend {
    documents: Rc<RefCell<HashMap<String, JsValue>>>,
}

fn call_method(target: &JsValue, name: &str, args: &Array) -> Result<JsValue, LoadError> {
    let method = Reflect::get(target, &JsValue::from_str(name))
        .ok()
        .and_then(|value| value.dyn_into::<Function>().ok())
        .ok_or_else(|| LoadError::Unavailable(format!("pdf.js object has no {name}()")))?;
    method
        .apply(target, args)
        .map_err(|err| LoadError::Decode(describe(&err)))
}

async fn settle(value: JsValue) -> Result<JsValue, LoadError> {
    JsFuture::from(Promise::resolve(&value))
        .await
        .map_err(|err| LoadError::Decode(describe(&err)))
}

/// pdf.js tasks expose their result as a `promise` property.
async fn settle_task(task: JsValue) -> Result<JsValue, LoadError> {
    let promise = Reflect::get(&task, &JsValue::from_str("promise"))
        .map_err(|err| LoadError::Decode(describe(&err)))?;
    settle(promise).await
}

fn number(target: &JsValue, name: &str) -> f64 {
    Reflect::get(target, &JsValue::from_str(name))
        .ok()
        .and_then(|value| value.as_f64())
        .unwrap_or(0.0)
}

async fn open_document(src: &str) -> Result<JsValue, LoadError> {
    let lib = Reflect::get(&js_sys::global(), &JsValue::from_str(PDFJS_GLOBAL))
        .ok()
        .filter(|lib| !lib.is_undefined() && !lib.is_null())
        .ok_or_else(|| {
            warn_pdfjs_once("pdf.js is not loaded; PDF sources cannot be displayed.");
            LoadError::Unavailable(format!("{PDFJS_GLOBAL} global is missing"))
        })?;
    let task = call_method(&lib, "getDocument", &Array::of1(&JsValue::from_str(src)))?;
    settle_task(task).await
}

async fn canvas_to_blob(canvas: &HtmlCanvasElement) -> Result<web_sys::Blob, LoadError> {
    let mut pending: Option<Result<(), LoadError>> = None;
    let promise = Promise::new(&mut |resolve, _reject| {
        let callback = Closure::once_into_js(move |blob: JsValue| {
            let _ = resolve.call1(&JsValue::NULL, &blob);
        });
        pending = Some(
            canvas
                .to_blob(callback.unchecked_ref())
                .map_err(|err| LoadError::Decode(describe(&err))),
        );
    });
    if let Some(Err(err)) = pending {
        return Err(err);
    }
    JsFuture::from(promise)
        .await
        .map_err(|err| LoadError::Decode(describe(&err)))?
        .dyn_into::<web_sys::Blob>()
        .map_err(|_| LoadError::Decode("canvas produced no image data".to_string()))
}

async fn rasterise_page(document: JsValue, page: u32) -> Result<WebImage, LoadError> {
    let page = settle(call_method(
        &document,
        "getPage",
        &Array::of1(&JsValue::from_f64(page as f64)),
    )?)
    .await?;

    let params = serde_wasm_bindgen::to_value(&ViewportParams {
        scale: PDF_RENDER_SCALE,
    })
    .map_err(|err| LoadError::Decode(err.to_string()))?;
    let viewport = call_method(&page, "getViewport", &Array::of1(&params))?;

    let canvas = web_sys::window()
        .and_then(|window| window.document())
        .and_then(|document| document.create_element("canvas").ok())
        .and_then(|element| element.dyn_into::<HtmlCanvasElement>().ok())
        .ok_or_else(|| LoadError::Unavailable("cannot create an offscreen canvas".to_string()))?;
    canvas.set_width(number(&viewport, "width").ceil() as u32);
    canvas.set_height(number(&viewport, "height").ceil() as u32);
    let ctx = canvas
        .get_context("2d")
        .ok()
        .flatten()
        .and_then(|ctx| ctx.dyn_into::<CanvasRenderingContext2d>().ok())
        .ok_or_else(|| LoadError::Unavailable("2d context unavailable".to_string()))?;

    let render_params = Object::new();
    Reflect::set(&render_params, &JsValue::from_str("canvasContext"), &ctx)
        .map_err(|err| LoadError::Decode(describe(&err)))?;
    Reflect::set(&render_params, &JsValue::from_str("viewport"), &viewport)
        .map_err(|err| LoadError::Decode(describe(&err)))?;
    let task = call_method(&page, "render", &Array::of1(&render_params))?;
    settle_task(task).await?;

    let blob = canvas_to_blob(&canvas).await?;
    let url = Url::create_object_url_with_blob(&blob)
        .map_err(|err| LoadError::Decode(describe(&err)))?;
    match decode_image(&url).await {
        Ok(element) => Ok(WebImage {
            element,
            object_url: Some(url),
        }),
        Err(err) => {
            revoke_object_url(&url);
            Err(err)
        }
    }
}

impl DocumentBackend<WebImage> for PdfJsBackend {
    fn open(&self, src: &str, done: Completion<u32>) {
        let src = src.to_string();
        let documents = self.documents.clone();
        wasm_bindgen_futures::spawn_local(async move {
            match open_document(&src).await {
                Ok(document) => {
                    let pages = number(&document, "numPages").max(0.0) as u32;
                    documents.borrow_mut().insert(src, document);
                    done(Ok(pages));
                }
                Err(err) => {
                    warn(&format!("Failed to open document: {err}"));
                    done(Err(err));
                }
            }
        });
    }

    fn render_page(&self, src: &str, page: u32, done: Completion<WebImage>) {
        let Some(document) = self.documents.borrow().get(src).cloned() else {
            done(Err(LoadError::Unavailable(format!("{src} is not open"))));
            return;
        };
        wasm_bindgen_futures::spawn_local(async move {
            let result = rasterise_page(document, page).await;
            if let Err(err) = &result {
                warn(&format!("Failed to render page {page}: {err}"));
            }
            done(result);
        });
    }

    fn close(&self, src: &str) {
        let Some(document) = self.documents.borrow_mut().remove(src) else {
            return;
        };
        if let Err(err) = call_method(&document, "destroy", &Array::new()) {
            warn(&format!("Failed to close document: {err}"));
        }
    }

    fn revoke_object_url(&self, url: &str) {
        revoke_object_url(url);
    }
}
