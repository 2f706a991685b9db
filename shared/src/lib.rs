pub mod button;
pub mod cache;
pub mod config;
pub mod error;
pub mod geometry;
pub mod gesture;
pub mod overlay;
pub mod resource;
pub mod signal;
pub mod surface;
pub mod viewer;
pub mod viewport;

pub use button::{Button, ButtonAction};
pub use cache::ImageCache;
pub use config::{ViewerConfig, ViewerOptions};
pub use error::{LoadError, ViewerError};
pub use geometry::{Dimension, Point, to_canvas_point, to_square_angle};
pub use gesture::{GestureInput, WheelDirection};
pub use resource::{
    BlobData, Completion, DocumentBackend, ImageBackend, Resource, Source, SourceKind,
};
pub use signal::{ChangeSignal, Subscription};
pub use surface::{Bitmap, Surface, TextAlign};
pub use viewer::{Backends, Viewer};
pub use viewport::{ScaleBounds, Viewport};
