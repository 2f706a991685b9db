use std::f64::consts::PI;

use crate::config::{ButtonConfig, ButtonStyle};
use crate::geometry::{Point, within_circle};
use crate::surface::Surface;

/// What a button does when clicked.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ButtonAction {
    NextPage,
    PreviousPage,
    ZoomIn,
    ZoomOut,
    RotateLeft,
    RotateRight,
    Reset,
}

/// A round on-canvas control with an icon glyph and tooltip text.
///
/// Hit-testing uses the geometry recorded by the most recent `draw` call; a
/// button that has never been drawn is never hit.
#[derive(Debug, Clone)]
pub struct Button {
    pub sort_id: i32,
    pub hover: bool,
    pub display: bool,
    pub icon: Option<String>,
    pub tooltip: Option<String>,
    style: ButtonStyle,
    action: Option<ButtonAction>,
    draw_position: Option<Point>,
    draw_radius: f64,
}

impl Button {
    pub fn new(config: &ButtonConfig, style: &ButtonStyle) -> Self {
        Self {
            sort_id: config.sort_id,
            hover: false,
            display: config.show,
            icon: config.icon.clone(),
            tooltip: config.tooltip.clone(),
            style: style.clone(),
            action: None,
            draw_position: None,
            draw_radius: 0.0,
        }
    }

    pub fn with_action(mut self, action: ButtonAction) -> Self {
        self.action = Some(action);
        self
    }

    pub fn action(&self) -> Option<ButtonAction> {
        self.action
    }

    /// Resolve the click action.
    ///
    /// # Panics
    ///
    /// Panics when no action was wired. A button without a handler is a
    /// wiring bug and must not fail silently.
    pub fn click(&self) -> ButtonAction {
        match self.action {
            Some(action) => action,
            None => panic!(
                "no click action set for button {:?}",
                self.tooltip.as_deref().or(self.icon.as_deref()).unwrap_or("<unnamed>")
            ),
        }
    }

    pub fn draw_position(&self) -> Option<Point> {
        self.draw_position
    }

    pub fn draw_radius(&self) -> f64 {
        self.draw_radius
    }

    /// Drop the recorded geometry, e.g. when a frame did not draw this button.
    pub fn forget_geometry(&mut self) {
        self.draw_position = None;
        self.draw_radius = 0.0;
    }

    pub fn draw<S: Surface>(&mut self, ctx: &mut S, x: f64, y: f64, radius: f64) {
        self.draw_position = Some(Point::new(x, y));
        self.draw_radius = radius;

        ctx.save();

        let alpha = if self.hover {
            self.style.hover_alpha
        } else {
            self.style.alpha
        };
        ctx.set_global_alpha(alpha);
        ctx.set_fill_style(&self.style.bg_style);
        ctx.set_line_width(0.0);

        ctx.begin_path();
        ctx.arc(x, y, radius, 0.0, 2.0 * PI);
        ctx.close_path();
        ctx.fill();
        if self.style.border_width > 0.0 {
            ctx.set_line_width(self.style.border_width);
            ctx.set_stroke_style(&self.style.border_style);
            ctx.stroke();
        }

        if let Some(icon) = self.icon.as_deref() {
            ctx.save();
            ctx.set_font(&format!("{}px {}", radius, self.style.icon_font_family));
            ctx.set_fill_style(&self.style.icon_style);
            let text_width = ctx.measure_text(icon);
            ctx.fill_text(icon, x - text_width / 2.0, y + radius / 2.0, None);
            ctx.restore();
        }

        ctx.restore();
    }

    pub fn is_within_bounds(&self, x: f64, y: f64) -> bool {
        match self.draw_position {
            Some(center) => within_circle(center, self.draw_radius, x, y),
            None => false,
        }
    }
}
