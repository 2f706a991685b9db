//! Loadable sources the viewer can display: a single image or a paged
//! document. Both variants share [`ResourceState`] and the draw routine;
//! they differ in how the current bitmap is fetched.

use std::cell::{Ref, RefMut};
use std::fmt;
use std::sync::Arc;

use crate::config::ViewerConfig;
use crate::error::LoadError;
use crate::geometry::Dimension;
use crate::signal::ChangeSignal;
use crate::surface::{Bitmap, Surface, TextAlign};
use crate::viewport::{ScaleBounds, Viewport};

pub mod backend;
pub mod document;
pub mod image;

pub use backend::{Completion, DocumentBackend, ImageBackend};
pub use document::DocumentResource;
pub use image::ImageResource;

const IMAGE_PATTERNS: [&str; 5] = [".png", ".jpg", ".jpeg", ".gif", "image/png"];
const DOCUMENT_PATTERNS: [&str; 2] = [".pdf", "application/pdf"];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SourceKind {
    Image,
    Document,
}

impl SourceKind {
    /// Explicit type hint: `"image"` or `"pdf"`, case-insensitive.
    pub fn from_hint(hint: &str) -> Option<Self> {
        match hint.trim().to_ascii_lowercase().as_str() {
            "image" => Some(SourceKind::Image),
            "pdf" => Some(SourceKind::Document),
            _ => None,
        }
    }

    /// Sniff a file name, URL or MIME type.
    pub fn sniff(name: &str) -> Option<Self> {
        let name = name.to_ascii_lowercase();
        if IMAGE_PATTERNS.iter().any(|pattern| name.contains(pattern)) {
            Some(SourceKind::Image)
        } else if DOCUMENT_PATTERNS.iter().any(|pattern| name.contains(pattern)) {
            Some(SourceKind::Document)
        } else {
            None
        }
    }

    /// A recognised hint wins; otherwise fall back to sniffing `name`.
    pub fn classify(name: &str, hint: Option<&str>) -> Option<Self> {
        hint.and_then(Self::from_hint).or_else(|| Self::sniff(name))
    }
}

/// In-memory file data held by the host, exposed to loaders through
/// short-lived object URLs.
pub trait BlobData: fmt::Debug + Send + Sync {
    /// Mint a fresh object URL for the data. The caller owns it and must
    /// revoke it.
    fn create_object_url(&self) -> Option<String>;
}

/// What the host asked the viewer to show.
#[derive(Debug, Clone)]
pub enum Source {
    /// Path or URL, loaded as-is.
    Url(String),
    /// In-memory file. Every resource that takes it mints its own object
    /// URL and revokes it once the load that consumed it completes.
    Blob { name: String, data: Arc<dyn BlobData> },
}

impl Source {
    pub fn blob(name: impl Into<String>, data: Arc<dyn BlobData>) -> Self {
        Source::Blob {
            name: name.into(),
            data,
        }
    }

    /// Name used for type sniffing.
    pub fn name(&self) -> &str {
        match self {
            Source::Url(url) => url,
            Source::Blob { name, .. } => name,
        }
    }

    pub fn is_transient(&self) -> bool {
        matches!(self, Source::Blob { .. })
    }

    /// URL handed to the loading backend, and whether the caller must revoke
    /// it. `None` when the host could not expose the blob.
    fn mint_url(&self) -> Option<(String, bool)> {
        match self {
            Source::Url(url) => Some((url.clone(), false)),
            Source::Blob { data, .. } => data.create_object_url().map(|url| (url, true)),
        }
    }
}

/// Blobs compare by identity: the same file picked twice is two sources.
impl PartialEq for Source {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Source::Url(a), Source::Url(b)) => a == b,
            (Source::Blob { name: a, data: x }, Source::Blob { name: b, data: y }) => {
                a == b && std::ptr::addr_eq(Arc::as_ptr(x), Arc::as_ptr(y))
            }
            _ => false,
        }
    }
}

impl Eq for Source {}

/// Observable state shared by both resource variants.
#[derive(Debug, Clone)]
pub struct ResourceState<I> {
    /// Source as handed over by the host.
    pub source: Option<Source>,
    /// URL the current source loads from.
    pub src: String,
    pub current_item: i32,
    pub total_item: i32,
    pub loaded: bool,
    pub loading: bool,
    pub viewport: Viewport,
    pub bounds: ScaleBounds,
    pub show_items_quantity: bool,
    pub image: Option<I>,
    pub last_error: Option<LoadError>,
    /// Object URL assigned with the current source and not yet handed to a
    /// load. Whichever load takes it owns its revocation.
    pub(crate) transient_url: Option<String>,
}

impl<I> ResourceState<I> {
    pub fn new(show_items_quantity: bool) -> Self {
        Self {
            source: None,
            src: String::new(),
            current_item: 1,
            total_item: 1,
            loaded: false,
            loading: false,
            viewport: Viewport::default(),
            bounds: ScaleBounds::default(),
            show_items_quantity,
            image: None,
            last_error: None,
            transient_url: None,
        }
    }

    /// Whether `source` is the one already assigned.
    pub(crate) fn holds(&self, source: &Source) -> bool {
        self.source.as_ref() == Some(source)
    }

    /// Point the state at a new source, forgetting the previous bitmap.
    /// Blob sources get a freshly minted object URL. Returns the previous
    /// transient URL if no load ever consumed it.
    pub(crate) fn assign(&mut self, source: &Source) -> Option<String> {
        let stale = self.transient_url.take();
        self.source = Some(source.clone());
        self.image = None;
        self.loaded = false;
        self.loading = false;
        self.last_error = None;
        self.current_item = 1;
        self.total_item = 1;
        match source.mint_url() {
            Some((url, transient)) => {
                self.transient_url = transient.then(|| url.clone());
                self.src = url;
            }
            None => {
                self.src = String::new();
                self.last_error = Some(LoadError::Unavailable(format!(
                    "no object URL for {}",
                    source.name()
                )));
            }
        }
        stale
    }

    /// Hand back a transient URL that no load has taken yet.
    pub(crate) fn take_unconsumed(&mut self) -> Option<String> {
        self.transient_url.take()
    }

    /// Mark a load as outstanding and hand over the transient URL it owns.
    pub(crate) fn begin_load(&mut self) -> Option<String> {
        self.loading = true;
        self.loaded = false;
        self.last_error = None;
        self.transient_url.take()
    }

    pub(crate) fn fail(&mut self, error: LoadError) {
        self.loading = false;
        self.loaded = false;
        self.last_error = Some(error);
    }
}

impl<I: Bitmap> ResourceState<I> {
    /// Re-fit the current bitmap into `canvas`, keeping the rotation.
    /// No-op (returns `false`) while not loaded or without a canvas.
    pub fn reset_viewport(&mut self, canvas: Option<Dimension>) -> bool {
        if !self.loaded {
            return false;
        }
        let (Some(canvas), Some(image)) = (canvas, self.image.as_ref()) else {
            return false;
        };
        let Some(fit) = Viewport::fit(image.dimension(), canvas, self.viewport.rotation) else {
            return false;
        };
        self.viewport = fit.viewport;
        self.bounds = fit.bounds;
        true
    }

    pub fn draw<S>(&self, ctx: &mut S, config: &ViewerConfig, canvas: Dimension)
    where
        S: Surface<Image = I>,
    {
        ctx.clear_rect(0.0, 0.0, canvas.width, canvas.height);
        ctx.set_fill_style(&config.bg_style);
        ctx.fill_rect(0.0, 0.0, canvas.width, canvas.height);

        match self.image.as_ref() {
            Some(image) if self.loaded && !self.loading => {
                let centre = self.viewport.centroid();
                ctx.save();
                ctx.translate(centre.x, centre.y);
                ctx.rotate(self.viewport.rotation_radians());
                ctx.scale(self.viewport.scale, self.viewport.scale);
                ctx.draw_image(image, -image.width() / 2.0, -image.height() / 2.0);
                ctx.restore();
            }
            _ => {
                ctx.save();
                ctx.set_fill_style(&config.loading_style);
                ctx.set_font(&config.loading_font);
                ctx.set_text_align(TextAlign::Center);
                ctx.fill_text(
                    &config.loading_message,
                    canvas.width / 2.0,
                    canvas.height / 2.0,
                    None,
                );
                ctx.restore();
            }
        }
    }
}

/// Common interface of the image and paged-document variants.
///
/// State lives behind a `RefCell` so load completions can update it; never
/// hold a `state()`/`state_mut()` guard across a call back into the
/// resource.
pub trait Resource<S: Surface> {
    fn kind(&self) -> SourceKind;

    fn state(&self) -> Ref<'_, ResourceState<S::Image>>;
    fn state_mut(&self) -> RefMut<'_, ResourceState<S::Image>>;

    /// Fires after every completed load, successful or not.
    fn on_change(&self) -> &ChangeSignal;

    /// Assign a new source. Unchanged sources keep their loaded state.
    fn set_source(&self, source: &Source);

    /// Begin the first load for the current source.
    fn set_up(&self);

    /// Load the bitmap for `current_item`.
    fn load_resource(&self);

    /// Give back host handles (unconsumed object URLs, open documents).
    /// Called once on teardown.
    fn release(&self);

    fn reset_viewport(&self, canvas: Option<Dimension>) -> bool {
        self.state_mut().reset_viewport(canvas)
    }

    /// Paint the background and bitmap (or the loading message), then hand
    /// the surface to `on_finish` for overlays.
    fn draw(
        &self,
        ctx: &mut S,
        config: &ViewerConfig,
        canvas: Dimension,
        on_finish: &mut dyn FnMut(&mut S),
    ) {
        self.state().draw(ctx, config, canvas);
        on_finish(ctx);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::resource::backend::memory::TestBlob;
    use crate::surface::recording::{Call, RecordingSurface, TestImage};

    fn assert_close(a: f64, b: f64) {
        assert!((a - b).abs() < 1e-9, "{a} != {b}");
    }

    #[test]
    fn classify_prefers_hint_then_sniffs() {
        assert_eq!(SourceKind::classify("scan.PNG", None), Some(SourceKind::Image));
        assert_eq!(SourceKind::classify("photo.jpeg", None), Some(SourceKind::Image));
        assert_eq!(SourceKind::classify("image/png", None), Some(SourceKind::Image));
        assert_eq!(SourceKind::classify("report.pdf", None), Some(SourceKind::Document));
        assert_eq!(
            SourceKind::classify("application/pdf", None),
            Some(SourceKind::Document)
        );
        assert_eq!(SourceKind::classify("notes.txt", None), None);
        assert_eq!(SourceKind::classify("", None), None);

        assert_eq!(
            SourceKind::classify("download?id=7", Some("PDF")),
            Some(SourceKind::Document)
        );
        assert_eq!(
            SourceKind::classify("report.pdf", Some("image")),
            Some(SourceKind::Image)
        );
        assert_eq!(
            SourceKind::classify("scan.gif", Some("video")),
            Some(SourceKind::Image)
        );
    }

    #[test]
    fn blob_sources_sniff_by_name_and_compare_by_identity() {
        let data = TestBlob::new("blob:abc");
        let blob = Source::blob("upload.pdf", data.clone());
        assert_eq!(blob.name(), "upload.pdf");
        assert!(blob.is_transient());
        assert!(!Source::Url("a.png".to_string()).is_transient());

        assert_eq!(blob, blob.clone());
        assert_ne!(blob, Source::blob("upload.pdf", TestBlob::new("blob:abc")));
        assert_eq!(data.minted(), 0);
    }

    #[test]
    fn reset_viewport_waits_for_load_and_canvas() {
        let mut state = ResourceState::new(false);
        state.image = Some(TestImage::new(600.0, 400.0));
        assert!(!state.reset_viewport(Some(Dimension::new(300.0, 200.0))));

        state.loaded = true;
        assert!(!state.reset_viewport(None));
        assert!(state.reset_viewport(Some(Dimension::new(300.0, 200.0))));
        assert_close(state.viewport.scale, 0.5);
        assert_close(state.bounds.min, 0.125);
        assert_close(state.bounds.max, 2.0);
    }

    #[test]
    fn draw_shows_placeholder_until_loaded() {
        let config = ViewerConfig::default();
        let canvas = Dimension::new(300.0, 200.0);
        let mut state = ResourceState::new(false);
        state.image = Some(TestImage::new(600.0, 400.0));

        let mut ctx = RecordingSurface::default();
        state.draw(&mut ctx, &config, canvas);
        assert_eq!(ctx.calls[0], Call::ClearRect);
        assert_eq!(ctx.calls[1], Call::FillRect);
        assert_eq!(ctx.texts(), vec!["Loading..."]);
        assert_eq!(ctx.images_drawn(), 0);

        state.loaded = true;
        state.reset_viewport(Some(canvas));
        let mut ctx = RecordingSurface::default();
        state.draw(&mut ctx, &config, canvas);
        assert!(ctx.texts().is_empty());
        assert!(ctx.calls.contains(&Call::Translate { x: 150.0, y: 100.0 }));
        assert!(ctx.calls.contains(&Call::Scale(0.5)));
        assert!(ctx.calls.contains(&Call::DrawImage { x: -300.0, y: -200.0 }));
    }

    #[test]
    fn loading_flag_hides_a_stale_bitmap() {
        let mut state = ResourceState::new(true);
        state.image = Some(TestImage::new(10.0, 10.0));
        state.loaded = true;
        state.loading = true;
        let mut ctx = RecordingSurface::default();
        state.draw(&mut ctx, &ViewerConfig::default(), Dimension::new(50.0, 50.0));
        assert_eq!(ctx.images_drawn(), 0);
    }

    #[test]
    fn assign_mints_a_url_per_blob_assignment() {
        let mut state: ResourceState<TestImage> = ResourceState::new(false);
        let data = TestBlob::new("blob:1");
        let first = Source::blob("a.png", data.clone());
        assert_eq!(state.assign(&first), None);
        assert_eq!(state.src, "blob:1/1");
        assert!(state.holds(&first));
        assert_eq!(
            state.assign(&Source::Url("b.png".to_string())),
            Some("blob:1/1".to_string())
        );
        assert_eq!(state.src, "b.png");

        state.assign(&first);
        assert_eq!(state.src, "blob:1/2");
        assert_eq!(state.begin_load(), Some("blob:1/2".to_string()));
        assert!(state.loading);
        assert_eq!(state.assign(&Source::Url("b.png".to_string())), None);
        assert_eq!(data.minted(), 2);
    }

    #[test]
    fn unavailable_blob_leaves_nothing_to_load() {
        let mut state: ResourceState<TestImage> = ResourceState::new(false);
        let data = TestBlob::unavailable();
        assert_eq!(state.assign(&Source::blob("a.png", data)), None);
        assert!(state.src.is_empty());
        assert!(matches!(state.last_error, Some(LoadError::Unavailable(_))));
        assert_eq!(state.take_unconsumed(), None);
    }
}
