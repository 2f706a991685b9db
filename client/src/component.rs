use std::cell::{Cell, RefCell};
use std::collections::HashMap;
use std::rc::Rc;
use std::sync::Arc;

use imageviewer_shared::{
    Backends, BlobData, Point, Source, ViewerConfig, Viewer, WheelDirection, to_canvas_point,
};
use leptos::prelude::*;
use web_sys::{File, HtmlCanvasElement, PointerEvent, Url, WheelEvent};

use crate::backend::{PdfJsBackend, WebImageBackend};
use crate::gesture::{PointerTracker, Release};
use crate::listeners::ListenerBinding;
use crate::render_loop::FrameLoop;
use crate::surface::CanvasSurface;

type SharedViewer = Rc<RefCell<Viewer<CanvasSurface>>>;

struct MountedViewer {
    canvas: HtmlCanvasElement,
    viewer: SharedViewer,
    _frame_loop: FrameLoop,
}

thread_local! {
    static MOUNTED_VIEWERS: RefCell<HashMap<u64, MountedViewer>> = RefCell::new(HashMap::new());
    static NEXT_VIEWER_ID: Cell<u64> = const { Cell::new(0) };
    static PICKED_FILES: RefCell<HashMap<u64, File>> = RefCell::new(HashMap::new());
    static NEXT_FILE_ID: Cell<u64> = const { Cell::new(0) };
}

fn next_viewer_id() -> u64 {
    NEXT_VIEWER_ID.with(|next| {
        let id = next.get();
        next.set(id + 1);
        id
    })
}

fn with_mounted<R>(id: u64, f: impl FnOnce(&MountedViewer) -> R) -> Option<R> {
    MOUNTED_VIEWERS.with(|slot| slot.borrow().get(&id).map(f))
}

/// Handle to a picked file. The `File` itself stays in a thread-local
/// registry so the handle can travel through reactive props; the entry goes
/// away with the last handle.
#[derive(Debug)]
struct PickedFile {
    id: u64,
}

impl BlobData for PickedFile {
    fn create_object_url(&self) -> Option<String> {
        PICKED_FILES.with(|files| {
            let files = files.borrow();
            let file = files.get(&self.id)?;
            Url::create_object_url_with_blob(file).ok()
        })
    }
}

impl Drop for PickedFile {
    fn drop(&mut self) {
        let _ = PICKED_FILES.try_with(|files| files.borrow_mut().remove(&self.id));
    }
}

/// Wrap a user-picked file as a blob source. Each load mints its own object
/// URL from the file and revokes it when done.
pub fn source_from_file(file: &File) -> Source {
    let id = NEXT_FILE_ID.with(|next| {
        let id = next.get();
        next.set(id + 1);
        id
    });
    PICKED_FILES.with(|files| files.borrow_mut().insert(id, file.clone()));
    Source::blob(file.name(), Arc::new(PickedFile { id }))
}

fn canvas_point(canvas: &HtmlCanvasElement, client_x: i32, client_y: i32) -> Point {
    let rect = canvas.get_bounding_client_rect();
    to_canvas_point(
        Point::new(client_x as f64, client_y as f64),
        Point::new(rect.left(), rect.top()),
    )
}

/// Run `f` against the viewer unless another handler is already using it.
fn with_viewer(viewer: &SharedViewer, f: impl FnOnce(&mut Viewer<CanvasSurface>)) {
    if let Ok(mut viewer) = viewer.try_borrow_mut() {
        f(&mut viewer);
    }
}

fn bind_input(canvas: &HtmlCanvasElement, viewer: &SharedViewer) -> Vec<ListenerBinding> {
    let tracker = Rc::new(RefCell::new(PointerTracker::default()));
    let target: &web_sys::EventTarget = canvas.as_ref();
    let mut bindings = Vec::new();

    bindings.extend(ListenerBinding::bind(target, "wheel", false, {
        let viewer = viewer.clone();
        move |e: WheelEvent| {
            e.prevent_default();
            let direction = WheelDirection::from_delta_y(e.delta_y());
            with_viewer(&viewer, |viewer| viewer.on_wheel(direction));
        }
    }));

    bindings.extend(ListenerBinding::bind(target, "pointerdown", true, {
        let viewer = viewer.clone();
        let tracker = tracker.clone();
        let canvas = canvas.clone();
        move |e: PointerEvent| {
            let at = canvas_point(&canvas, e.client_x(), e.client_y());
            canvas.set_pointer_capture(e.pointer_id()).ok();
            tracker.borrow_mut().down(e.pointer_id(), at);
            with_viewer(&viewer, |viewer| viewer.on_gesture_start());
        }
    }));

    bindings.extend(ListenerBinding::bind(target, "pointermove", true, {
        let viewer = viewer.clone();
        let tracker = tracker.clone();
        let canvas = canvas.clone();
        move |e: PointerEvent| {
            let at = canvas_point(&canvas, e.client_x(), e.client_y());
            let mut tracker = tracker.borrow_mut();
            if let Some(input) = tracker.moved(e.pointer_id(), at) {
                with_viewer(&viewer, |viewer| viewer.on_gesture_move(input));
            } else if !tracker.is_pressed() {
                with_viewer(&viewer, |viewer| viewer.on_pointer_move(at));
            }
        }
    }));

    bindings.extend(ListenerBinding::bind(target, "pointerup", true, {
        let viewer = viewer.clone();
        let tracker = tracker.clone();
        let canvas = canvas.clone();
        move |e: PointerEvent| {
            let at = canvas_point(&canvas, e.client_x(), e.client_y());
            let release = tracker.borrow_mut().up(e.pointer_id(), at);
            with_viewer(&viewer, |viewer| match release {
                Release::Tap(point) => viewer.on_tap(point),
                Release::GestureEnd => viewer.on_gesture_end(),
                Release::Regrip => viewer.on_gesture_start(),
                Release::Ignored => {}
            });
        }
    }));

    bindings.extend(ListenerBinding::bind(target, "pointercancel", true, {
        let viewer = viewer.clone();
        move |_: PointerEvent| {
            if tracker.borrow_mut().cancel() == Release::GestureEnd {
                with_viewer(&viewer, |viewer| viewer.on_gesture_end());
            }
        }
    }));

    bindings
}

fn mount(id: u64, canvas: HtmlCanvasElement, config: ViewerConfig) {
    if with_mounted(id, |_| ()).is_some() {
        return;
    }
    let Some(mut surface) = CanvasSurface::from_canvas(&canvas) else {
        web_sys::console::warn_1(&"Image viewer: 2D canvas context unavailable.".into());
        return;
    };
    canvas.set_width(config.width.max(0.0) as u32);
    canvas.set_height(config.height.max(0.0) as u32);

    let backends = Backends {
        images: Rc::new(WebImageBackend),
        documents: Rc::new(PdfJsBackend::default()),
    };
    let viewer: SharedViewer = Rc::new(RefCell::new(Viewer::new(config, backends)));

    for binding in bind_input(&canvas, &viewer) {
        viewer.borrow_mut().on_teardown(move || drop(binding));
    }

    let frame_loop = FrameLoop::start({
        let viewer = viewer.clone();
        move || with_viewer(&viewer, |viewer| {
            viewer.tick(&mut surface);
        })
    });

    MOUNTED_VIEWERS.with(|slot| {
        slot.borrow_mut().insert(
            id,
            MountedViewer {
                canvas,
                viewer,
                _frame_loop: frame_loop,
            },
        );
    });
}

fn unmount(id: u64) {
    let Some(mounted) = MOUNTED_VIEWERS.with(|slot| slot.borrow_mut().remove(&id)) else {
        return;
    };
    mounted.viewer.borrow_mut().destroy();
}

/// Canvas-backed image/PDF viewer with pan, zoom, rotate and paging.
///
/// `src` accepts a URL or a blob created with [`source_from_file`];
/// `filetype` (`"image"` or `"pdf"`) overrides name-based detection.
#[component]
pub fn ImageViewer(
    #[prop(into, optional)] src: MaybeProp<Source>,
    #[prop(into, optional)] filetype: MaybeProp<String>,
    #[prop(into, optional)] width: MaybeProp<f64>,
    #[prop(into, optional)] height: MaybeProp<f64>,
    #[prop(optional)] config: Option<ViewerConfig>,
) -> impl IntoView {
    let canvas_ref = NodeRef::<leptos::html::Canvas>::new();
    let id = next_viewer_id();
    let config = config.unwrap_or_default();
    let default_size = (config.width, config.height);

    Effect::new(move || {
        let Some(canvas) = canvas_ref.get() else {
            return;
        };
        let mut config = config.clone();
        config.width = width.get_untracked().unwrap_or(config.width);
        config.height = height.get_untracked().unwrap_or(config.height);
        mount(id, canvas, config);
        with_mounted(id, |mounted| {
            mounted
                .viewer
                .borrow_mut()
                .set_input(src.get_untracked(), filetype.get_untracked());
        });
    });

    Effect::new(move || {
        let source = src.get();
        let hint = filetype.get();
        with_mounted(id, |mounted| mounted.viewer.borrow_mut().set_input(source, hint));
    });

    Effect::new(move || {
        let w = width.get().unwrap_or(default_size.0);
        let h = height.get().unwrap_or(default_size.1);
        with_mounted(id, |mounted| {
            if mounted.canvas.width() != w as u32 || mounted.canvas.height() != h as u32 {
                mounted.canvas.set_width(w.max(0.0) as u32);
                mounted.canvas.set_height(h.max(0.0) as u32);
            }
            mounted.viewer.borrow_mut().set_canvas_size(w, h);
        });
    });

    on_cleanup(move || unmount(id));

    view! {
        <canvas
            node_ref=canvas_ref
            style="display: block; touch-action: none; user-select: none;"
        />
    }
}
