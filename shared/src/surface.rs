use crate::geometry::Dimension;

/// A decoded bitmap handle owned by a resource or the image cache.
pub trait Bitmap {
    fn width(&self) -> f64;
    fn height(&self) -> f64;

    /// Object URL backing this bitmap, if any. Revoked on cache disposal.
    fn object_url(&self) -> Option<&str> {
        None
    }

    fn dimension(&self) -> Dimension {
        Dimension::new(self.width(), self.height())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TextAlign {
    Start,
    Center,
    End,
}

impl TextAlign {
    pub fn as_str(self) -> &'static str {
        match self {
            TextAlign::Start => "start",
            TextAlign::Center => "center",
            TextAlign::End => "end",
        }
    }
}

/// The 2D drawing operations the viewer needs from its host canvas.
pub trait Surface {
    type Image: Bitmap;

    fn save(&mut self);
    fn restore(&mut self);

    fn clear_rect(&mut self, x: f64, y: f64, width: f64, height: f64);
    fn fill_rect(&mut self, x: f64, y: f64, width: f64, height: f64);

    fn set_fill_style(&mut self, style: &str);
    fn set_stroke_style(&mut self, style: &str);
    fn set_global_alpha(&mut self, alpha: f64);
    fn set_line_width(&mut self, width: f64);
    fn set_font(&mut self, font: &str);
    fn set_text_align(&mut self, align: TextAlign);

    fn fill_text(&mut self, text: &str, x: f64, y: f64, max_width: Option<f64>);
    /// Advance width of `text` in the current font.
    fn measure_text(&mut self, text: &str) -> f64;

    fn begin_path(&mut self);
    fn close_path(&mut self);
    fn move_to(&mut self, x: f64, y: f64);
    fn line_to(&mut self, x: f64, y: f64);
    fn quadratic_curve_to(&mut self, cpx: f64, cpy: f64, x: f64, y: f64);
    fn arc(&mut self, x: f64, y: f64, radius: f64, start_angle: f64, end_angle: f64);
    fn fill(&mut self);
    fn stroke(&mut self);

    fn translate(&mut self, x: f64, y: f64);
    fn rotate(&mut self, radians: f64);
    fn scale(&mut self, x: f64, y: f64);

    fn draw_image(&mut self, image: &Self::Image, x: f64, y: f64);
}
