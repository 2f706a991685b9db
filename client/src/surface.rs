use imageviewer_shared::{Bitmap, Surface, TextAlign};
use wasm_bindgen::JsCast;
use web_sys::{CanvasRenderingContext2d, HtmlCanvasElement, HtmlImageElement};

/// Decoded `<img>` plus the object URL backing it, when it came from a
/// rendered PDF page.
#[derive(Clone)]
pub struct WebImage {
    pub element: HtmlImageElement,
    pub object_url: Option<String>,
}

impl Bitmap for WebImage {
    fn width(&self) -> f64 {
        self.element.natural_width() as f64
    }

    fn height(&self) -> f64 {
        self.element.natural_height() as f64
    }

    fn object_url(&self) -> Option<&str> {
        self.object_url.as_deref()
    }
}

/// `Surface` over a 2D canvas context. Drawing errors are dropped: a failed
/// canvas call leaves the frame incomplete but never aborts the loop.
pub struct CanvasSurface {
    ctx: CanvasRenderingContext2d,
}

impl CanvasSurface {
    pub fn from_canvas(canvas: &HtmlCanvasElement) -> Option<Self> {
        let ctx = canvas
            .get_context("2d")
            .ok()
            .flatten()
            .and_then(|ctx| ctx.dyn_into::<CanvasRenderingContext2d>().ok())?;
        Some(Self { ctx })
    }
}

impl Surface for CanvasSurface {
    type Image = WebImage;

    fn save(&mut self) {
        self.ctx.save();
    }

    fn restore(&mut self) {
        self.ctx.restore();
    }

    fn clear_rect(&mut self, x: f64, y: f64, width: f64, height: f64) {
        self.ctx.clear_rect(x, y, width, height);
    }

    fn fill_rect(&mut self, x: f64, y: f64, width: f64, height: f64) {
        self.ctx.fill_rect(x, y, width, height);
    }

    fn set_fill_style(&mut self, style: &str) {
        self.ctx.set_fill_style_str(style);
    }

    fn set_stroke_style(&mut self, style: &str) {
        self.ctx.set_stroke_style_str(style);
    }

    fn set_global_alpha(&mut self, alpha: f64) {
        self.ctx.set_global_alpha(alpha);
    }

    fn set_line_width(&mut self, width: f64) {
        self.ctx.set_line_width(width);
    }

    fn set_font(&mut self, font: &str) {
        self.ctx.set_font(font);
    }

    fn set_text_align(&mut self, align: TextAlign) {
        self.ctx.set_text_align(align.as_str());
    }

    fn fill_text(&mut self, text: &str, x: f64, y: f64, max_width: Option<f64>) {
        match max_width {
            Some(max_width) => self.ctx.fill_text_with_max_width(text, x, y, max_width).ok(),
            None => self.ctx.fill_text(text, x, y).ok(),
        };
    }

    fn measure_text(&mut self, text: &str) -> f64 {
        self.ctx
            .measure_text(text)
            .map(|metrics| metrics.width())
            .unwrap_or(0.0)
    }

    fn begin_path(&mut self) {
        self.ctx.begin_path();
    }

    fn close_path(&mut self) {
        self.ctx.close_path();
    }

    fn move_to(&mut self, x: f64, y: f64) {
        self.ctx.move_to(x, y);
    }

    fn line_to(&mut self, x: f64, y: f64) {
        self.ctx.line_to(x, y);
    }

    fn quadratic_curve_to(&mut self, cpx: f64, cpy: f64, x: f64, y: f64) {
        self.ctx.quadratic_curve_to(cpx, cpy, x, y);
    }

    fn arc(&mut self, x: f64, y: f64, radius: f64, start_angle: f64, end_angle: f64) {
        self.ctx.arc(x, y, radius, start_angle, end_angle).ok();
    }

    fn fill(&mut self) {
        self.ctx.fill();
    }

    fn stroke(&mut self) {
        self.ctx.stroke();
    }

    fn translate(&mut self, x: f64, y: f64) {
        self.ctx.translate(x, y).ok();
    }

    fn rotate(&mut self, radians: f64) {
        self.ctx.rotate(radians).ok();
    }

    fn scale(&mut self, x: f64, y: f64) {
        self.ctx.scale(x, y).ok();
    }

    fn draw_image(&mut self, image: &WebImage, x: f64, y: f64) {
        self.ctx
            .draw_image_with_html_image_element(&image.element, x, y)
            .ok();
    }
}
