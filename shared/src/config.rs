use serde::{Deserialize, Serialize};

use crate::error::ViewerError;

/// Per-button settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct ButtonConfig {
    pub icon: Option<String>,
    pub tooltip: Option<String>,
    pub sort_id: i32,
    pub show: bool,
}

impl Default for ButtonConfig {
    fn default() -> Self {
        Self {
            icon: None,
            tooltip: None,
            sort_id: 0,
            show: true,
        }
    }
}

impl ButtonConfig {
    pub fn new(icon: &str, tooltip: &str, sort_id: i32) -> Self {
        Self {
            icon: Some(icon.to_string()),
            tooltip: Some(tooltip.to_string()),
            sort_id,
            show: true,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct ButtonStyle {
    pub icon_font_family: String,
    pub alpha: f64,
    pub hover_alpha: f64,
    pub bg_style: String,
    pub icon_style: String,
    pub border_style: String,
    pub border_width: f64,
}

impl Default for ButtonStyle {
    fn default() -> Self {
        Self {
            icon_font_family: "Material Icons".to_string(),
            alpha: 0.5,
            hover_alpha: 0.7,
            bg_style: "#000000".to_string(),
            icon_style: "#FFFFFF".to_string(),
            border_style: "#000000".to_string(),
            border_width: 0.0,
        }
    }
}

/// Tooltip box style. `padding` and `radius` also drive the button layout.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct TooltipStyle {
    pub enabled: bool,
    pub bg_style: String,
    pub bg_alpha: f64,
    pub text_style: String,
    pub text_alpha: f64,
    pub padding: f64,
    pub radius: f64,
}

impl Default for TooltipStyle {
    fn default() -> Self {
        Self {
            enabled: true,
            bg_style: "#FFFFFF".to_string(),
            bg_alpha: 0.5,
            text_style: "#000000".to_string(),
            text_alpha: 0.9,
            padding: 15.0,
            radius: 20.0,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct PagerStyle {
    pub font_size: f64,
    pub font_family: String,
    pub text_style: String,
    pub label_width: f64,
}

impl Default for PagerStyle {
    fn default() -> Self {
        Self {
            font_size: 25.0,
            font_family: "Verdana".to_string(),
            text_style: "#333333".to_string(),
            label_width: 50.0,
        }
    }
}

impl PagerStyle {
    pub fn font(&self) -> String {
        format!("{}px {}", self.font_size, self.font_family)
    }
}

/// Fully resolved viewer configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct ViewerConfig {
    pub width: f64,
    pub height: f64,
    pub bg_style: String,
    pub scale_step: f64,
    pub rotate_stepper: bool,
    pub loading_message: String,
    pub loading_font: String,
    pub loading_style: String,
    pub button_style: ButtonStyle,
    pub tooltips: TooltipStyle,
    pub pager: PagerStyle,
    pub zoom_out_button: ButtonConfig,
    pub zoom_in_button: ButtonConfig,
    pub rotate_left_button: ButtonConfig,
    pub rotate_right_button: ButtonConfig,
    pub reset_button: ButtonConfig,
    pub before_page_button: ButtonConfig,
    pub next_page_button: ButtonConfig,
}

impl Default for ViewerConfig {
    fn default() -> Self {
        Self {
            width: 800.0,
            height: 600.0,
            bg_style: "#ECEFF1".to_string(),
            scale_step: 0.1,
            rotate_stepper: false,
            loading_message: "Loading...".to_string(),
            loading_font: "25px Verdana".to_string(),
            loading_style: "#333333".to_string(),
            button_style: ButtonStyle::default(),
            tooltips: TooltipStyle::default(),
            pager: PagerStyle::default(),
            zoom_out_button: ButtonConfig::new("zoom_out", "Zoom out", 0),
            zoom_in_button: ButtonConfig::new("zoom_in", "Zoom in", 1),
            rotate_left_button: ButtonConfig::new("rotate_left", "Rotate left", 2),
            rotate_right_button: ButtonConfig::new("rotate_right", "Rotate right", 3),
            reset_button: ButtonConfig::new("autorenew", "Reset", 99),
            before_page_button: ButtonConfig::new("keyboard_arrow_left", "Previous page", 0),
            next_page_button: ButtonConfig::new("keyboard_arrow_right", "Next page", 0),
        }
    }
}

// --- Partial overrides ---

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct ButtonOptions {
    pub icon: Option<String>,
    pub tooltip: Option<String>,
    pub sort_id: Option<i32>,
    pub show: Option<bool>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct ButtonStyleOptions {
    pub icon_font_family: Option<String>,
    pub alpha: Option<f64>,
    pub hover_alpha: Option<f64>,
    pub bg_style: Option<String>,
    pub icon_style: Option<String>,
    pub border_style: Option<String>,
    pub border_width: Option<f64>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct TooltipOptions {
    pub enabled: Option<bool>,
    pub bg_style: Option<String>,
    pub bg_alpha: Option<f64>,
    pub text_style: Option<String>,
    pub text_alpha: Option<f64>,
    pub padding: Option<f64>,
    pub radius: Option<f64>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct PagerOptions {
    pub font_size: Option<f64>,
    pub font_family: Option<String>,
    pub text_style: Option<String>,
    pub label_width: Option<f64>,
}

/// Host-supplied overrides. Every field is optional; nested groups merge
/// field by field over the defaults rather than replacing the whole group.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct ViewerOptions {
    pub width: Option<f64>,
    pub height: Option<f64>,
    pub bg_style: Option<String>,
    pub scale_step: Option<f64>,
    pub rotate_stepper: Option<bool>,
    pub loading_message: Option<String>,
    pub loading_font: Option<String>,
    pub loading_style: Option<String>,
    pub button_style: Option<ButtonStyleOptions>,
    pub tooltips: Option<TooltipOptions>,
    pub pager: Option<PagerOptions>,
    pub zoom_out_button: Option<ButtonOptions>,
    pub zoom_in_button: Option<ButtonOptions>,
    pub rotate_left_button: Option<ButtonOptions>,
    pub rotate_right_button: Option<ButtonOptions>,
    pub reset_button: Option<ButtonOptions>,
    pub before_page_button: Option<ButtonOptions>,
    pub next_page_button: Option<ButtonOptions>,
}

fn merge<T>(slot: &mut T, value: Option<T>) {
    if let Some(value) = value {
        *slot = value;
    }
}

impl ButtonConfig {
    fn apply(&mut self, options: ButtonOptions) {
        if options.icon.is_some() {
            self.icon = options.icon;
        }
        if options.tooltip.is_some() {
            self.tooltip = options.tooltip;
        }
        merge(&mut self.sort_id, options.sort_id);
        merge(&mut self.show, options.show);
    }
}

impl ButtonStyle {
    fn apply(&mut self, options: ButtonStyleOptions) {
        merge(&mut self.icon_font_family, options.icon_font_family);
        merge(&mut self.alpha, options.alpha);
        merge(&mut self.hover_alpha, options.hover_alpha);
        merge(&mut self.bg_style, options.bg_style);
        merge(&mut self.icon_style, options.icon_style);
        merge(&mut self.border_style, options.border_style);
        merge(&mut self.border_width, options.border_width);
    }
}

impl TooltipStyle {
    fn apply(&mut self, options: TooltipOptions) {
        merge(&mut self.enabled, options.enabled);
        merge(&mut self.bg_style, options.bg_style);
        merge(&mut self.bg_alpha, options.bg_alpha);
        merge(&mut self.text_style, options.text_style);
        merge(&mut self.text_alpha, options.text_alpha);
        merge(&mut self.padding, options.padding);
        merge(&mut self.radius, options.radius);
    }
}

impl PagerStyle {
    fn apply(&mut self, options: PagerOptions) {
        merge(&mut self.font_size, options.font_size);
        merge(&mut self.font_family, options.font_family);
        merge(&mut self.text_style, options.text_style);
        merge(&mut self.label_width, options.label_width);
    }
}

impl ViewerConfig {
    /// Defaults with `options` deep-merged on top.
    pub fn with_options(options: ViewerOptions) -> Self {
        let mut config = Self::default();
        config.apply(options);
        config
    }

    /// Parse a (possibly partial) JSON options document and merge it over
    /// the defaults.
    pub fn from_json(json: &str) -> Result<Self, ViewerError> {
        let options: ViewerOptions = serde_json::from_str(json)?;
        Ok(Self::with_options(options))
    }

    pub fn apply(&mut self, options: ViewerOptions) {
        merge(&mut self.width, options.width);
        merge(&mut self.height, options.height);
        merge(&mut self.bg_style, options.bg_style);
        merge(&mut self.scale_step, options.scale_step);
        merge(&mut self.rotate_stepper, options.rotate_stepper);
        merge(&mut self.loading_message, options.loading_message);
        merge(&mut self.loading_font, options.loading_font);
        merge(&mut self.loading_style, options.loading_style);
        if let Some(style) = options.button_style {
            self.button_style.apply(style);
        }
        if let Some(tooltips) = options.tooltips {
            self.tooltips.apply(tooltips);
        }
        if let Some(pager) = options.pager {
            self.pager.apply(pager);
        }
        let buttons = [
            (&mut self.zoom_out_button, options.zoom_out_button),
            (&mut self.zoom_in_button, options.zoom_in_button),
            (&mut self.rotate_left_button, options.rotate_left_button),
            (&mut self.rotate_right_button, options.rotate_right_button),
            (&mut self.reset_button, options.reset_button),
            (&mut self.before_page_button, options.before_page_button),
            (&mut self.next_page_button, options.next_page_button),
        ];
        for (button, options) in buttons {
            if let Some(options) = options {
                button.apply(options);
            }
        }
    }
}
