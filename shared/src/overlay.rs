//! Controls painted on top of the bitmap: the button column with its
//! tooltip box, and the page navigator.

use crate::button::Button;
use crate::config::ViewerConfig;
use crate::geometry::Dimension;
use crate::surface::{Surface, TextAlign};

/// Narrower canvases have no room for a tooltip beside the buttons.
pub const MIN_TOOLTIP_WIDTH_SPACE: f64 = 500.0;

const TOOLTIP_CORNER_RADIUS: f64 = 8.0;

/// Stack `buttons` upward from the bottom-right corner, then draw the
/// active tooltip to their left.
pub fn draw_buttons<S: Surface>(
    ctx: &mut S,
    buttons: &mut [Button],
    tooltip: Option<&str>,
    config: &ViewerConfig,
    canvas: Dimension,
) {
    let padding = config.tooltips.padding;
    let radius = config.tooltips.radius;
    let gap = 2.0 * radius + padding;
    let x = canvas.width - radius - padding;

    for (i, button) in buttons.iter_mut().enumerate() {
        let y = canvas.height - radius - padding - i as f64 * gap;
        button.draw(ctx, x, y, radius);
    }

    let Some(tooltip) = tooltip else {
        return;
    };
    if !config.tooltips.enabled || canvas.width <= MIN_TOOLTIP_WIDTH_SPACE {
        return;
    }

    ctx.save();
    let font_size = radius;
    ctx.set_font(&format!("{font_size}px sans-serif"));

    let text_width = ctx.measure_text(tooltip);
    let rect_width = text_width + padding;
    let rect_height = font_size * 0.7 + padding;
    let rect_x = canvas.width - (2.0 * radius + 2.0 * padding) - rect_width;
    let rect_y = canvas.height - rect_height - padding;

    ctx.set_global_alpha(config.tooltips.bg_alpha);
    ctx.set_fill_style(&config.tooltips.bg_style);
    round_rect(ctx, rect_x, rect_y, rect_width, rect_height, TOOLTIP_CORNER_RADIUS);
    ctx.fill();

    ctx.set_global_alpha(config.tooltips.text_alpha);
    ctx.set_fill_style(&config.tooltips.text_style);
    ctx.fill_text(
        tooltip,
        rect_x + 0.5 * padding,
        canvas.height - 1.5 * padding,
        None,
    );
    ctx.restore();
}

/// Previous/next buttons either side of a centred `current/total` label.
pub fn draw_paginator<S: Surface>(
    ctx: &mut S,
    before: &mut Button,
    next: &mut Button,
    current: i32,
    total: i32,
    config: &ViewerConfig,
    canvas: Dimension,
) {
    let padding = config.tooltips.padding;
    let radius = config.tooltips.radius;
    let label_width = config.pager.label_width;

    let x_before = (canvas.width - label_width) / 2.0 - radius - padding;
    let x_label = canvas.width / 2.0;
    let x_next = (canvas.width + label_width) / 2.0 + radius + padding;
    let y = canvas.height - radius - padding;

    ctx.save();
    before.draw(ctx, x_before, y, radius);
    next.draw(ctx, x_next, y, radius);
    ctx.restore();

    ctx.save();
    ctx.set_font(&config.pager.font());
    ctx.set_fill_style(&config.pager.text_style);
    ctx.set_text_align(TextAlign::Center);
    ctx.fill_text(
        &format!("{current}/{total}"),
        x_label,
        canvas.height - padding - config.pager.font_size / 2.0,
        Some(label_width),
    );
    ctx.restore();
}

/// Trace a rounded rectangle path; the caller fills or strokes it.
pub fn round_rect<S: Surface>(ctx: &mut S, x: f64, y: f64, width: f64, height: f64, radius: f64) {
    ctx.begin_path();
    ctx.move_to(x + radius, y);
    ctx.line_to(x + width - radius, y);
    ctx.quadratic_curve_to(x + width, y, x + width, y + radius);
    ctx.line_to(x + width, y + height - radius);
    ctx.quadratic_curve_to(x + width, y + height, x + width - radius, y + height);
    ctx.line_to(x + radius, y + height);
    ctx.quadratic_curve_to(x, y + height, x, y + height - radius);
    ctx.line_to(x, y + radius);
    ctx.quadratic_curve_to(x, y, x + radius, y);
    ctx.close_path();
}
