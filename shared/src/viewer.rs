//! The render/input core: owns the dirty flag, the active resource and the
//! on-canvas controls, and turns input into viewport changes.

use std::cell::{Cell, RefCell};
use std::rc::Rc;

use tracing::{debug, info};

use crate::button::{Button, ButtonAction};
use crate::cache::ImageCache;
use crate::config::ViewerConfig;
use crate::error::ViewerError;
use crate::geometry::{Dimension, Point};
use crate::gesture::{GestureBaseline, GestureInput, WheelDirection};
use crate::overlay::{draw_buttons, draw_paginator};
use crate::resource::{
    DocumentBackend, DocumentResource, ImageBackend, ImageResource, Resource, Source, SourceKind,
};
use crate::signal::Subscription;
use crate::surface::Surface;
use crate::viewport::{ScaleBounds, Viewport};

/// Loading backends the viewer builds its resources from.
pub struct Backends<I> {
    pub images: Rc<dyn ImageBackend<I>>,
    pub documents: Rc<dyn DocumentBackend<I>>,
}

impl<I> Clone for Backends<I> {
    fn clone(&self) -> Self {
        Self {
            images: self.images.clone(),
            documents: self.documents.clone(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Control {
    Column(usize),
    NextPage,
    PreviousPage,
}

pub struct Viewer<S: Surface> {
    config: ViewerConfig,
    canvas: Option<Dimension>,
    dirty: bool,
    /// Set by the active resource's change signal, consumed on the next tick.
    changed: Rc<Cell<bool>>,
    source: Option<Source>,
    type_hint: Option<String>,
    image: Option<Box<dyn Resource<S>>>,
    document: Option<Box<dyn Resource<S>>>,
    active: Option<SourceKind>,
    subscription: Option<Subscription>,
    buttons: Vec<Button>,
    before_page_button: Button,
    next_page_button: Button,
    current_tooltip: Option<String>,
    gesture: Option<GestureBaseline>,
    backends: Backends<S::Image>,
    cache: Rc<RefCell<ImageCache<S::Image>>>,
    teardown: Vec<Box<dyn FnOnce()>>,
    destroyed: bool,
}

impl<S> Viewer<S>
where
    S: Surface + 'static,
    S::Image: Clone + 'static,
{
    pub fn new(config: ViewerConfig, backends: Backends<S::Image>) -> Self {
        let style = &config.button_style;
        let mut buttons: Vec<Button> = [
            (&config.zoom_out_button, ButtonAction::ZoomOut),
            (&config.zoom_in_button, ButtonAction::ZoomIn),
            (&config.rotate_left_button, ButtonAction::RotateLeft),
            (&config.rotate_right_button, ButtonAction::RotateRight),
            (&config.reset_button, ButtonAction::Reset),
        ]
        .into_iter()
        .map(|(button, action)| Button::new(button, style).with_action(action))
        .filter(|button| button.display)
        .collect();
        buttons.sort_by_key(|button| button.sort_id);

        let before_page_button = Button::new(&config.before_page_button, style)
            .with_action(ButtonAction::PreviousPage);
        let next_page_button =
            Button::new(&config.next_page_button, style).with_action(ButtonAction::NextPage);

        Self {
            canvas: Some(Dimension::new(config.width, config.height)),
            config,
            dirty: true,
            changed: Rc::new(Cell::new(false)),
            source: None,
            type_hint: None,
            image: None,
            document: None,
            active: None,
            subscription: None,
            buttons,
            before_page_button,
            next_page_button,
            current_tooltip: None,
            gesture: None,
            backends,
            cache: Rc::new(RefCell::new(ImageCache::new())),
            teardown: Vec::new(),
            destroyed: false,
        }
    }

    // --- Accessors ---

    pub fn config(&self) -> &ViewerConfig {
        &self.config
    }

    pub fn canvas(&self) -> Option<Dimension> {
        self.canvas
    }

    pub fn is_dirty(&self) -> bool {
        self.dirty || self.changed.get()
    }

    pub fn is_destroyed(&self) -> bool {
        self.destroyed
    }

    pub fn active_kind(&self) -> Option<SourceKind> {
        self.active
    }

    pub fn current_tooltip(&self) -> Option<&str> {
        self.current_tooltip.as_deref()
    }

    /// Visible toolbar buttons in draw order.
    pub fn buttons(&self) -> &[Button] {
        &self.buttons
    }

    pub fn resource(&self) -> Option<&dyn Resource<S>> {
        match self.active? {
            SourceKind::Image => self.image.as_deref(),
            SourceKind::Document => self.document.as_deref(),
        }
    }

    pub fn viewport(&self) -> Option<Viewport> {
        self.resource().map(|resource| resource.state().viewport)
    }

    pub fn scale_bounds(&self) -> Option<ScaleBounds> {
        self.resource().map(|resource| resource.state().bounds)
    }

    /// `(current_item, total_item)` of the active resource.
    pub fn items(&self) -> Option<(i32, i32)> {
        self.resource().map(|resource| {
            let state = resource.state();
            (state.current_item, state.total_item)
        })
    }

    pub fn is_loaded(&self) -> bool {
        self.resource()
            .is_some_and(|resource| resource.state().loaded)
    }

    /// The failure that ended the most recent load of the active resource.
    pub fn last_error(&self) -> Option<ViewerError> {
        let resource = self.resource()?;
        let state = resource.state();
        let source = state.last_error.clone()?;
        Some(ViewerError::Load {
            src: state.src.clone(),
            source,
        })
    }

    // --- Inputs ---

    pub fn set_canvas_size(&mut self, width: f64, height: f64) {
        let size = Dimension::new(width, height);
        if self.canvas == Some(size) {
            return;
        }
        self.canvas = Some(size);
        self.dirty = true;
        self.reset_image();
    }

    pub fn set_source(&mut self, source: Option<Source>) {
        if self.source == source {
            return;
        }
        self.source = source;
        self.set_up_resource();
    }

    pub fn set_type_hint(&mut self, hint: Option<String>) {
        if self.type_hint == hint {
            return;
        }
        self.type_hint = hint;
        self.set_up_resource();
    }

    /// Replace source and type hint together, setting up at most once.
    pub fn set_input(&mut self, source: Option<Source>, hint: Option<String>) {
        if self.source == source && self.type_hint == hint {
            return;
        }
        self.source = source;
        self.type_hint = hint;
        self.set_up_resource();
    }

    /// Select the resource variant for the current source, hand it the
    /// source and start loading.
    pub fn set_up_resource(&mut self) {
        if self.destroyed {
            return;
        }
        let Some(source) = self.source.clone() else {
            self.deactivate();
            return;
        };
        let Some(kind) = SourceKind::classify(source.name(), self.type_hint.as_deref()) else {
            debug!(name = source.name(), "unrecognised source type");
            self.deactivate();
            return;
        };

        self.subscription = None;
        if self.active != Some(kind) {
            self.ensure_resource(kind);
            self.active = Some(kind);
            debug!(?kind, "resource selected");
        }

        let Some(resource) = self.resource() else {
            return;
        };
        resource.set_source(&source);
        let changed = self.changed.clone();
        let subscription = resource.on_change().subscribe(move || changed.set(true));
        resource.set_up();
        self.subscription = Some(subscription);
        self.gesture = None;
        self.reset_image();
    }

    fn ensure_resource(&mut self, kind: SourceKind) {
        match kind {
            SourceKind::Image => {
                if self.image.is_none() {
                    let resource = ImageResource::new(self.backends.images.clone());
                    self.image = Some(Box::new(resource));
                }
            }
            SourceKind::Document => {
                if self.document.is_none() {
                    let resource =
                        DocumentResource::new(self.backends.documents.clone(), self.cache.clone());
                    self.document = Some(Box::new(resource));
                }
            }
        }
    }

    fn deactivate(&mut self) {
        self.subscription = None;
        self.active = None;
        self.gesture = None;
        self.current_tooltip = None;
        self.dirty = true;
    }

    /// Apply pending change notifications: re-fit and schedule a redraw.
    pub fn process_changes(&mut self) {
        if self.changed.replace(false) {
            self.reset_image();
            self.dirty = true;
        }
    }

    // --- Rendering ---

    /// Run one frame. Draws only when dirty; returns whether it drew.
    pub fn tick(&mut self, ctx: &mut S) -> bool {
        if self.destroyed {
            return false;
        }
        self.process_changes();
        if !self.dirty {
            return false;
        }
        let Some(canvas) = self.canvas else {
            return false;
        };

        let config = &self.config;
        let buttons = &mut self.buttons;
        let before = &mut self.before_page_button;
        let next = &mut self.next_page_button;
        let tooltip = self.current_tooltip.as_deref();
        let resource = match self.active {
            Some(SourceKind::Image) => self.image.as_deref(),
            Some(SourceKind::Document) => self.document.as_deref(),
            None => None,
        };

        match resource {
            Some(resource) => {
                let (loaded, show_pager, current, total) = {
                    let state = resource.state();
                    (
                        state.loaded,
                        state.show_items_quantity,
                        state.current_item,
                        state.total_item,
                    )
                };
                resource.draw(ctx, config, canvas, &mut |ctx: &mut S| {
                    if !loaded {
                        buttons.iter_mut().for_each(Button::forget_geometry);
                        before.forget_geometry();
                        next.forget_geometry();
                        return;
                    }
                    draw_buttons(ctx, buttons, tooltip, config, canvas);
                    if show_pager {
                        draw_paginator(ctx, before, next, current, total, config, canvas);
                    } else {
                        before.forget_geometry();
                        next.forget_geometry();
                    }
                });
            }
            None => {
                ctx.clear_rect(0.0, 0.0, canvas.width, canvas.height);
                ctx.set_fill_style(&config.bg_style);
                ctx.fill_rect(0.0, 0.0, canvas.width, canvas.height);
                buttons.iter_mut().for_each(Button::forget_geometry);
                before.forget_geometry();
                next.forget_geometry();
            }
        }

        self.dirty = false;
        true
    }

    // --- Pointer input ---

    fn hit_control(&self, point: Point) -> Option<Control> {
        if let Some(index) = self
            .buttons
            .iter()
            .position(|button| button.is_within_bounds(point.x, point.y))
        {
            return Some(Control::Column(index));
        }
        if self.next_page_button.is_within_bounds(point.x, point.y) {
            return Some(Control::NextPage);
        }
        if self.before_page_button.is_within_bounds(point.x, point.y) {
            return Some(Control::PreviousPage);
        }
        None
    }

    fn control(&self, control: Control) -> &Button {
        match control {
            Control::Column(index) => &self.buttons[index],
            Control::NextPage => &self.next_page_button,
            Control::PreviousPage => &self.before_page_button,
        }
    }

    fn control_mut(&mut self, control: Control) -> &mut Button {
        match control {
            Control::Column(index) => &mut self.buttons[index],
            Control::NextPage => &mut self.next_page_button,
            Control::PreviousPage => &mut self.before_page_button,
        }
    }

    /// Click at a canvas-space point: run the first control hit, if any.
    pub fn on_tap(&mut self, point: Point) {
        if self.destroyed {
            return;
        }
        if let Some(control) = self.hit_control(point) {
            let action = self.control(control).click();
            self.perform(action);
        }
    }

    pub fn on_wheel(&mut self, direction: WheelDirection) {
        match direction {
            WheelDirection::Up => self.zoom_in(),
            WheelDirection::Down => self.zoom_out(),
        }
    }

    /// Hover tracking. Redraws only when the active tooltip changes.
    pub fn on_pointer_move(&mut self, point: Point) {
        if self.destroyed {
            return;
        }
        self.buttons.iter_mut().for_each(|button| button.hover = false);
        self.before_page_button.hover = false;
        self.next_page_button.hover = false;

        let tooltip = match self.hit_control(point) {
            Some(control) => {
                let button = self.control_mut(control);
                button.hover = true;
                button.tooltip.clone()
            }
            None => None,
        };
        if tooltip != self.current_tooltip {
            self.current_tooltip = tooltip;
            self.dirty = true;
        }
    }

    // --- Gestures ---

    pub fn on_gesture_start(&mut self) {
        self.gesture = None;
    }

    /// Apply a cumulative pan/pinch/rotate reading. The baseline is captured
    /// from the first reading of the gesture.
    pub fn on_gesture_move(&mut self, input: GestureInput) {
        if self.destroyed {
            return;
        }
        let baseline = match self.gesture {
            Some(baseline) => baseline,
            None => {
                let Some(viewport) = self.viewport() else {
                    return;
                };
                let baseline = GestureBaseline::capture(viewport, &input);
                self.gesture = Some(baseline);
                baseline
            }
        };
        let rotate_stepper = self.config.rotate_stepper;
        let Some(resource) = self.resource() else {
            return;
        };
        let mut state = resource.state_mut();
        let bounds = state.bounds;
        baseline.apply(&mut state.viewport, &input, bounds, rotate_stepper);
        drop(state);
        self.dirty = true;
    }

    pub fn on_gesture_end(&mut self) {
        self.gesture = None;
    }

    // --- Actions ---

    pub fn perform(&mut self, action: ButtonAction) {
        match action {
            ButtonAction::NextPage => self.next_page(),
            ButtonAction::PreviousPage => self.previous_page(),
            ButtonAction::ZoomIn => self.zoom_in(),
            ButtonAction::ZoomOut => self.zoom_out(),
            ButtonAction::RotateLeft => self.rotate_left(),
            ButtonAction::RotateRight => self.rotate_right(),
            ButtonAction::Reset => self.reset_image(),
        }
    }

    pub fn next_page(&mut self) {
        if self.destroyed {
            return;
        }
        let Some(resource) = self.resource() else {
            return;
        };
        {
            let mut state = resource.state_mut();
            if state.current_item >= state.total_item {
                return;
            }
            if state.current_item < 1 {
                state.current_item = 0;
            }
            state.current_item += 1;
        }
        resource.load_resource();
        self.dirty = true;
    }

    pub fn previous_page(&mut self) {
        if self.destroyed {
            return;
        }
        let Some(resource) = self.resource() else {
            return;
        };
        {
            let mut state = resource.state_mut();
            if state.current_item <= 1 {
                return;
            }
            if state.current_item > state.total_item {
                state.current_item = state.total_item + 1;
            }
            state.current_item -= 1;
        }
        resource.load_resource();
        self.dirty = true;
    }

    pub fn zoom_in(&mut self) {
        self.zoom_by(1.0 + self.config.scale_step);
    }

    pub fn zoom_out(&mut self) {
        self.zoom_by(1.0 - self.config.scale_step);
    }

    fn zoom_by(&mut self, factor: f64) {
        self.update_viewport(|viewport, bounds| viewport.zoom_by(factor, bounds));
    }

    pub fn rotate_left(&mut self) {
        self.update_viewport(|viewport, _| viewport.rotate_left());
    }

    pub fn rotate_right(&mut self) {
        self.update_viewport(|viewport, _| viewport.rotate_right());
    }

    fn update_viewport(&mut self, update: impl FnOnce(&mut Viewport, ScaleBounds)) {
        if self.destroyed {
            return;
        }
        let Some(resource) = self.resource() else {
            return;
        };
        {
            let mut state = resource.state_mut();
            let bounds = state.bounds;
            update(&mut state.viewport, bounds);
        }
        self.dirty = true;
    }

    /// Re-fit the active resource into the canvas.
    pub fn reset_image(&mut self) {
        if self.destroyed {
            return;
        }
        let Some(resource) = self.resource() else {
            return;
        };
        resource.reset_viewport(self.canvas);
        self.dirty = true;
    }

    // --- Teardown ---

    /// Register a callback to run on `destroy`, e.g. detaching a DOM listener.
    pub fn on_teardown(&mut self, callback: impl FnOnce() + 'static) {
        if self.destroyed {
            callback();
            return;
        }
        self.teardown.push(Box::new(callback));
    }

    /// Detach listeners and release every cached bitmap. Idempotent; all
    /// handlers no-op afterwards.
    pub fn destroy(&mut self) {
        if self.destroyed {
            return;
        }
        self.destroyed = true;
        for callback in self.teardown.drain(..) {
            callback();
        }
        self.subscription = None;
        self.gesture = None;
        for resource in [self.image.as_deref(), self.document.as_deref()]
            .into_iter()
            .flatten()
        {
            resource.release();
        }

        let documents = self.backends.documents.clone();
        let mut cache = self.cache.borrow_mut();
        let released = cache.len();
        cache.dispose_all(|url| documents.revoke_object_url(url));
        info!(released, "image viewer destroyed");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ViewerOptions;
    use crate::resource::backend::memory::{MemoryDocuments, MemoryImages, TestBlob};
    use crate::surface::recording::{RecordingSurface, TestImage};

    fn assert_close(a: f64, b: f64) {
        assert!((a - b).abs() < 1e-9, "{a} != {b}");
    }

    fn viewer(
        images: &Rc<MemoryImages>,
        documents: &Rc<MemoryDocuments>,
        width: f64,
        height: f64,
    ) -> Viewer<RecordingSurface> {
        let config = ViewerConfig::with_options(ViewerOptions {
            width: Some(width),
            height: Some(height),
            ..ViewerOptions::default()
        });
        let backends = Backends::<TestImage> {
            images: images.clone(),
            documents: documents.clone(),
        };
        Viewer::new(config, backends)
    }

    fn url(src: &str) -> Option<Source> {
        Some(Source::Url(src.to_string()))
    }

    fn image_viewer(width: f64, height: f64) -> (Viewer<RecordingSurface>, Rc<MemoryImages>) {
        let images = MemoryImages::with(&[("photo.png", 600.0, 400.0)]);
        let documents = MemoryDocuments::with("doc.pdf", &[]);
        let mut viewer = viewer(&images, &documents, width, height);
        viewer.set_source(url("photo.png"));
        (viewer, images)
    }

    fn document_viewer(pages: usize) -> (Viewer<RecordingSurface>, Rc<MemoryDocuments>) {
        let images = MemoryImages::with(&[]);
        let documents = MemoryDocuments::with("doc.pdf", &vec![(400.0, 600.0); pages]);
        let mut viewer = viewer(&images, &documents, 800.0, 600.0);
        viewer.set_source(url("doc.pdf"));
        (viewer, documents)
    }

    #[test]
    fn fits_a_600x400_image_into_a_300x200_canvas() {
        let (viewer, _) = image_viewer(300.0, 200.0);
        let viewport = viewer.viewport().expect("active resource");
        assert_close(viewport.scale, 0.5);
        assert_close(viewport.width, 300.0);
        assert_close(viewport.height, 200.0);
        assert_close(viewport.x, 0.0);
        assert_close(viewport.y, 0.0);
        assert_eq!(viewer.active_kind(), Some(SourceKind::Image));
    }

    #[test]
    fn failed_load_keeps_placeholder_and_reports_source() {
        let images = MemoryImages::with(&[]);
        let documents = MemoryDocuments::with("doc.pdf", &[]);
        let mut viewer = viewer(&images, &documents, 800.0, 600.0);
        viewer.set_source(url("missing.png"));

        assert!(!viewer.is_loaded());
        let Some(ViewerError::Load { src, .. }) = viewer.last_error() else {
            panic!("expected a load error");
        };
        assert_eq!(src, "missing.png");

        let mut ctx = RecordingSurface::default();
        viewer.tick(&mut ctx);
        assert_eq!(ctx.images_drawn(), 0);
        assert_eq!(ctx.texts(), vec!["Loading...".to_string()]);
    }

    #[test]
    fn clean_ticks_draw_nothing() {
        let (mut viewer, _) = image_viewer(800.0, 600.0);
        let mut ctx = RecordingSurface::default();
        assert!(viewer.tick(&mut ctx));
        assert_eq!(ctx.images_drawn(), 1);
        assert!(!viewer.is_dirty());

        let mut ctx = RecordingSurface::default();
        assert!(!viewer.tick(&mut ctx));
        assert!(ctx.calls.is_empty());
    }

    #[test]
    fn loaded_frame_draws_button_column_without_pager() {
        let (mut viewer, _) = image_viewer(800.0, 600.0);
        let mut ctx = RecordingSurface::default();
        viewer.tick(&mut ctx);
        assert_eq!(ctx.arcs().len(), 5);
        assert_eq!(
            ctx.texts(),
            vec!["zoom_out", "zoom_in", "rotate_left", "rotate_right", "autorenew"]
        );
    }

    #[test]
    fn hidden_buttons_are_filtered_and_order_follows_sort_id() {
        let images = MemoryImages::with(&[]);
        let documents = MemoryDocuments::with("doc.pdf", &[]);
        let config = ViewerConfig::from_json(
            r#"{"zoomOutButton": {"show": false}, "resetButton": {"sortId": -1}}"#,
        )
        .expect("valid options");
        let viewer: Viewer<RecordingSurface> = Viewer::new(
            config,
            Backends::<TestImage> {
                images,
                documents,
            },
        );
        let icons: Vec<&str> = viewer
            .buttons()
            .iter()
            .filter_map(|button| button.icon.as_deref())
            .collect();
        assert_eq!(icons, vec!["autorenew", "zoom_in", "rotate_left", "rotate_right"]);
    }

    #[test]
    fn tooltip_changes_drive_redraws() {
        let (mut viewer, _) = image_viewer(800.0, 600.0);
        let mut ctx = RecordingSurface::default();
        viewer.tick(&mut ctx);

        viewer.on_pointer_move(Point::new(765.0, 565.0));
        assert_eq!(viewer.current_tooltip(), Some("Zoom out"));
        assert!(viewer.is_dirty());
        viewer.tick(&mut ctx);

        viewer.on_pointer_move(Point::new(768.0, 562.0));
        assert!(!viewer.is_dirty());

        viewer.on_pointer_move(Point::new(765.0, 510.0));
        assert_eq!(viewer.current_tooltip(), Some("Zoom in"));
        assert!(viewer.is_dirty());
        viewer.tick(&mut ctx);

        viewer.on_pointer_move(Point::new(10.0, 10.0));
        assert_eq!(viewer.current_tooltip(), None);
        assert!(viewer.is_dirty());
    }

    #[test]
    fn tapping_a_button_runs_its_action() {
        let (mut viewer, _) = image_viewer(800.0, 600.0);
        let mut ctx = RecordingSurface::default();
        viewer.tick(&mut ctx);
        let before = viewer.viewport().map(|v| v.scale).unwrap_or_default();

        viewer.on_tap(Point::new(765.0, 510.0));
        let after = viewer.viewport().map(|v| v.scale).unwrap_or_default();
        assert_close(after, before * 1.1);
        assert!(viewer.is_dirty());

        viewer.on_tap(Point::new(10.0, 10.0));
        assert_close(viewer.viewport().map(|v| v.scale).unwrap_or_default(), after);
    }

    #[test]
    fn buttons_are_not_hit_before_the_first_frame() {
        let (mut viewer, _) = image_viewer(800.0, 600.0);
        let before = viewer.viewport();
        viewer.on_tap(Point::new(765.0, 510.0));
        assert_eq!(viewer.viewport(), before);
    }

    #[test]
    fn zoom_stays_inside_the_envelope() {
        let (mut viewer, _) = image_viewer(300.0, 200.0);
        for _ in 0..100 {
            viewer.zoom_in();
        }
        let bounds = viewer.scale_bounds().expect("bounds");
        assert_close(viewer.viewport().map(|v| v.scale).unwrap_or_default(), bounds.max);
        assert_close(bounds.max, 2.0);

        for _ in 0..200 {
            viewer.on_wheel(WheelDirection::Down);
        }
        assert_close(viewer.viewport().map(|v| v.scale).unwrap_or_default(), bounds.min);
    }

    #[test]
    fn rotation_steps_wrap() {
        let (mut viewer, _) = image_viewer(300.0, 200.0);
        viewer.rotate_left();
        assert_close(viewer.viewport().map(|v| v.rotation).unwrap_or_default(), 270.0);
        viewer.rotate_right();
        assert_close(viewer.viewport().map(|v| v.rotation).unwrap_or_default(), 0.0);
        for _ in 0..4 {
            viewer.rotate_left();
        }
        assert_close(viewer.viewport().map(|v| v.rotation).unwrap_or_default(), 0.0);
    }

    #[test]
    fn reset_refits_after_zoom_and_rotation() {
        let (mut viewer, _) = image_viewer(300.0, 200.0);
        viewer.zoom_in();
        viewer.rotate_right();
        viewer.perform(ButtonAction::Reset);
        let viewport = viewer.viewport().expect("viewport");
        assert_close(viewport.rotation, 90.0);
        assert_close(viewport.scale, 200.0 / 600.0);
    }

    #[test]
    fn canvas_resize_refits_only_when_changed() {
        let (mut viewer, _) = image_viewer(300.0, 200.0);
        let mut ctx = RecordingSurface::default();
        viewer.tick(&mut ctx);

        viewer.set_canvas_size(300.0, 200.0);
        assert!(!viewer.is_dirty());

        viewer.set_canvas_size(600.0, 400.0);
        assert!(viewer.is_dirty());
        assert_close(viewer.viewport().map(|v| v.scale).unwrap_or_default(), 1.0);
    }

    #[test]
    fn pan_gesture_is_cumulative() {
        let (mut viewer, _) = image_viewer(300.0, 200.0);
        viewer.on_gesture_start();
        viewer.on_gesture_move(GestureInput::pan(10.0, 5.0));
        viewer.on_gesture_move(GestureInput::pan(25.0, -5.0));
        let viewport = viewer.viewport().expect("viewport");
        assert_close(viewport.x, 25.0);
        assert_close(viewport.y, -5.0);
        viewer.on_gesture_end();

        viewer.on_gesture_move(GestureInput::pan(1.0, 1.0));
        let viewport = viewer.viewport().expect("viewport");
        assert_close(viewport.x, 26.0);
        assert_close(viewport.y, -4.0);
    }

    #[test]
    fn page_navigation_stops_at_the_ends() {
        let (mut viewer, documents) = document_viewer(3);
        assert_eq!(viewer.items(), Some((1, 3)));

        viewer.previous_page();
        assert_eq!(viewer.items(), Some((1, 3)));
        viewer.next_page();
        viewer.next_page();
        assert_eq!(viewer.items(), Some((3, 3)));
        viewer.next_page();
        assert_eq!(viewer.items(), Some((3, 3)));
        assert_eq!(documents.renders.borrow().len(), 3);

        viewer.previous_page();
        assert_eq!(viewer.items(), Some((2, 3)));
        assert!(viewer.is_loaded());
    }

    #[test]
    fn out_of_range_pages_clamp_before_stepping() {
        let (mut viewer, _) = document_viewer(3);
        if let Some(resource) = viewer.resource() {
            resource.state_mut().current_item = -4;
        }
        viewer.next_page();
        assert_eq!(viewer.items(), Some((1, 3)));

        if let Some(resource) = viewer.resource() {
            resource.state_mut().current_item = 9;
        }
        viewer.previous_page();
        assert_eq!(viewer.items(), Some((3, 3)));
    }

    #[test]
    fn pager_controls_are_drawn_and_clickable_for_documents() {
        let (mut viewer, _) = document_viewer(2);
        let mut ctx = RecordingSurface::default();
        viewer.tick(&mut ctx);
        assert_eq!(ctx.texts().last().map(String::as_str), Some("1/2"));

        viewer.on_pointer_move(Point::new(460.0, 565.0));
        assert_eq!(viewer.current_tooltip(), Some("Next page"));
        viewer.on_tap(Point::new(460.0, 565.0));
        assert_eq!(viewer.items(), Some((2, 2)));
        viewer.on_tap(Point::new(340.0, 565.0));
        assert_eq!(viewer.items(), Some((1, 2)));
    }

    #[test]
    fn placeholder_until_the_change_signal_arrives() {
        let images = MemoryImages::with(&[("photo.png", 600.0, 400.0)]);
        images.defer();
        let documents = MemoryDocuments::with("doc.pdf", &[]);
        let mut viewer = viewer(&images, &documents, 300.0, 200.0);
        viewer.set_source(url("photo.png"));

        let mut ctx = RecordingSurface::default();
        viewer.tick(&mut ctx);
        assert_eq!(ctx.texts(), vec!["Loading..."]);
        assert!(ctx.arcs().is_empty());
        assert!(!viewer.is_dirty());

        images.release("photo.png");
        assert!(viewer.is_dirty());
        let mut ctx = RecordingSurface::default();
        assert!(viewer.tick(&mut ctx));
        assert_eq!(ctx.images_drawn(), 1);
        assert_close(viewer.viewport().map(|v| v.scale).unwrap_or_default(), 0.5);
    }

    #[test]
    fn superseded_load_does_not_replace_the_newer_source() {
        let images = MemoryImages::with(&[("a.png", 600.0, 400.0), ("b.png", 30.0, 20.0)]);
        images.defer();
        let documents = MemoryDocuments::with("doc.pdf", &[]);
        let mut viewer = viewer(&images, &documents, 300.0, 200.0);

        viewer.set_source(url("a.png"));
        viewer.set_source(url("b.png"));
        images.release("a.png");
        viewer.process_changes();
        assert!(!viewer.is_loaded());

        images.release("b.png");
        viewer.process_changes();
        assert!(viewer.is_loaded());
        assert_close(viewer.viewport().map(|v| v.scale).unwrap_or_default(), 10.0);
    }

    #[test]
    fn blob_sources_are_revoked_exactly_once() {
        let images = MemoryImages::with(&[("blob:7/1", 600.0, 400.0), ("b.png", 10.0, 10.0)]);
        let documents = MemoryDocuments::with("doc.pdf", &[]);
        let mut viewer = viewer(&images, &documents, 300.0, 200.0);

        viewer.set_source(Some(Source::blob("upload.png", TestBlob::new("blob:7"))));
        assert!(viewer.is_loaded());
        assert_eq!(*images.revoked.borrow(), vec!["blob:7/1".to_string()]);

        viewer.set_type_hint(Some("image".to_string()));
        viewer.set_source(url("b.png"));
        viewer.destroy();
        assert_eq!(*images.revoked.borrow(), vec!["blob:7/1".to_string()]);
    }

    #[test]
    fn unsupported_blob_never_mints_a_url() {
        let images = MemoryImages::with(&[("b.png", 10.0, 10.0)]);
        let documents = MemoryDocuments::with("doc.pdf", &[]);
        let mut viewer = viewer(&images, &documents, 300.0, 200.0);
        let notes = TestBlob::new("blob:x");

        viewer.set_source(Some(Source::blob("notes.txt", notes.clone())));
        assert_eq!(viewer.active_kind(), None);
        viewer.set_source(url("b.png"));
        viewer.destroy();

        assert_eq!(notes.minted(), 0);
        assert!(images.revoked.borrow().is_empty());
        assert!(documents.revoked.borrow().is_empty());
    }

    #[test]
    fn variant_switch_mints_a_fresh_blob_url() {
        let images = MemoryImages::with(&[("blob:7/1", 600.0, 400.0)]);
        let documents = MemoryDocuments::with("blob:7/2", &[(400.0, 600.0)]);
        let mut viewer = viewer(&images, &documents, 300.0, 200.0);
        let upload = TestBlob::new("blob:7");

        viewer.set_source(Some(Source::blob("upload.png", upload.clone())));
        assert!(viewer.is_loaded());
        assert_eq!(*images.revoked.borrow(), vec!["blob:7/1".to_string()]);

        viewer.set_type_hint(Some("pdf".to_string()));
        assert_eq!(viewer.active_kind(), Some(SourceKind::Document));
        assert!(viewer.is_loaded());
        assert_eq!(*documents.revoked.borrow(), vec!["blob:7/2".to_string()]);

        viewer.set_type_hint(Some("image".to_string()));
        assert!(viewer.is_loaded());
        assert_eq!(upload.minted(), 2);
        assert_eq!(images.requests.borrow().len(), 1);
    }

    #[test]
    fn open_landing_after_destroy_is_handed_back() {
        let images = MemoryImages::with(&[]);
        let documents = MemoryDocuments::with("blob:3/1", &[(10.0, 10.0)]);
        documents.defer_opens();
        let mut viewer = viewer(&images, &documents, 300.0, 200.0);

        viewer.set_source(Some(Source::blob("a.pdf", TestBlob::new("blob:3"))));
        viewer.destroy();
        assert!(documents.revoked.borrow().is_empty());
        assert!(documents.closed.borrow().is_empty());

        documents.release_open("blob:3/1");
        assert_eq!(*documents.revoked.borrow(), vec!["blob:3/1".to_string()]);
        assert_eq!(*documents.closed.borrow(), vec!["blob:3/1".to_string()]);
        assert!(documents.renders.borrow().is_empty());
    }

    #[test]
    fn type_hint_switches_variant() {
        let images = MemoryImages::with(&[("scan", 100.0, 100.0)]);
        let documents = MemoryDocuments::with("scan", &[(50.0, 50.0)]);
        let mut viewer = viewer(&images, &documents, 300.0, 200.0);

        viewer.set_source(url("scan"));
        assert_eq!(viewer.active_kind(), None);

        viewer.set_type_hint(Some("pdf".to_string()));
        assert_eq!(viewer.active_kind(), Some(SourceKind::Document));
        assert!(viewer.is_loaded());

        viewer.set_type_hint(Some("image".to_string()));
        assert_eq!(viewer.active_kind(), Some(SourceKind::Image));
        assert_eq!(viewer.items(), Some((1, 1)));
    }

    #[test]
    fn combined_input_sets_up_once() {
        let images = MemoryImages::with(&[("a.png", 100.0, 100.0), ("scan", 100.0, 100.0)]);
        let documents = MemoryDocuments::with("doc.pdf", &[]);
        let mut viewer = viewer(&images, &documents, 300.0, 200.0);
        viewer.set_source(url("a.png"));

        viewer.set_input(url("scan"), Some("image".to_string()));
        assert_eq!(viewer.active_kind(), Some(SourceKind::Image));
        assert_eq!(
            *images.requests.borrow(),
            vec!["a.png".to_string(), "scan".to_string()]
        );

        viewer.set_input(url("scan"), Some("image".to_string()));
        assert_eq!(images.requests.borrow().len(), 2);
    }

    #[test]
    fn unrecognised_source_leaves_only_the_background() {
        let (mut viewer, _) = image_viewer(300.0, 200.0);
        let mut ctx = RecordingSurface::default();
        viewer.tick(&mut ctx);

        viewer.set_source(url("notes.txt"));
        assert_eq!(viewer.active_kind(), None);
        assert!(viewer.viewport().is_none());

        let mut ctx = RecordingSurface::default();
        assert!(viewer.tick(&mut ctx));
        assert_eq!(ctx.images_drawn(), 0);
        assert!(ctx.texts().is_empty());

        viewer.zoom_in();
        viewer.next_page();
        viewer.on_tap(Point::new(265.0, 165.0));
        viewer.on_gesture_move(GestureInput::pan(5.0, 5.0));
    }

    #[test]
    fn actions_before_any_source_are_harmless() {
        let images = MemoryImages::with(&[]);
        let documents = MemoryDocuments::with("doc.pdf", &[]);
        let mut viewer = viewer(&images, &documents, 300.0, 200.0);
        viewer.zoom_in();
        viewer.zoom_out();
        viewer.rotate_left();
        viewer.previous_page();
        viewer.reset_image();
        viewer.on_wheel(WheelDirection::Up);
        assert!(viewer.viewport().is_none());

        let mut ctx = RecordingSurface::default();
        assert!(viewer.tick(&mut ctx));
        assert!(!viewer.tick(&mut ctx));
    }

    #[test]
    fn destroy_runs_teardown_and_disposes_the_cache() {
        let (mut viewer, documents) = document_viewer(2);
        viewer.next_page();

        let detached = Rc::new(Cell::new(0));
        let counter = detached.clone();
        viewer.on_teardown(move || counter.set(counter.get() + 1));

        viewer.destroy();
        viewer.destroy();
        assert_eq!(detached.get(), 1);
        let mut revoked = documents.revoked.borrow().clone();
        revoked.sort();
        assert_eq!(revoked, vec!["blob:doc.pdf#1", "blob:doc.pdf#2"]);
        assert_eq!(*documents.closed.borrow(), vec!["doc.pdf".to_string()]);

        let mut ctx = RecordingSurface::default();
        assert!(!viewer.tick(&mut ctx));
        assert!(ctx.calls.is_empty());
        viewer.next_page();
        viewer.on_pointer_move(Point::new(460.0, 565.0));
        assert_eq!(viewer.items(), Some((2, 2)));
    }
}
