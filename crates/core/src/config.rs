use serde::{Deserialize, Serialize};
use std::time::Duration;

pub const DEFAULT_WIDTH: &str = "auto";
pub const DEFAULT_HEIGHT: &str = "100%";
pub const DEFAULT_BUFFER_AMOUNT: usize = 10;
pub const DEFAULT_ROW_HEIGHT: u32 = 34;
pub const DEFAULT_SCROLL_THROTTLE_MS: u64 = 1000;

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum ColorTheme {
    Dark,
    Light,
    #[default]
    Neutral,
}

/// Presentation and tuning settings of a tree view.
///
/// Only `buffer_amount`, the viewport derived from `height`/`row_height`,
/// `scroll_throttle_ms` and `fill_buffer` influence loading; the rest is passed
/// through to the rendering layer.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct TreeViewConfig {
    pub width: String,
    pub height: String,
    pub color_theme: ColorTheme,
    /// Rows to keep materialised below the viewport.
    pub buffer_amount: usize,
    pub row_height: u32,
    pub scroll_throttle_ms: u64,
    /// Continue with the next expandable node when one runs out of children.
    pub fill_buffer: bool,
}

impl Default for TreeViewConfig {
    fn default() -> Self {
        Self {
            width: DEFAULT_WIDTH.to_owned(),
            height: DEFAULT_HEIGHT.to_owned(),
            color_theme: ColorTheme::default(),
            buffer_amount: DEFAULT_BUFFER_AMOUNT,
            row_height: DEFAULT_ROW_HEIGHT,
            scroll_throttle_ms: DEFAULT_SCROLL_THROTTLE_MS,
            fill_buffer: true,
        }
    }
}

impl TreeViewConfig {
    pub fn from_json_str(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }

    pub fn with_width(mut self, width: impl Into<String>) -> Self {
        self.width = width.into();
        self
    }

    pub fn with_height(mut self, height: impl Into<String>) -> Self {
        self.height = height.into();
        self
    }

    pub fn with_color_theme(mut self, theme: ColorTheme) -> Self {
        self.color_theme = theme;
        self
    }

    pub fn with_buffer_amount(mut self, buffer_amount: usize) -> Self {
        self.buffer_amount = buffer_amount;
        self
    }

    pub fn with_scroll_throttle(mut self, window: Duration) -> Self {
        self.scroll_throttle_ms = u64::try_from(window.as_millis()).unwrap_or(u64::MAX);
        self
    }

    pub fn with_fill_buffer(mut self, fill_buffer: bool) -> Self {
        self.fill_buffer = fill_buffer;
        self
    }

    pub fn scroll_throttle(&self) -> Duration {
        Duration::from_millis(self.scroll_throttle_ms)
    }

    /// Rows that fit into a pixel `height`; `None` for relative heights.
    #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
    pub fn viewport_capacity(&self) -> Option<usize> {
        if self.row_height == 0 {
            return None;
        }
        let pixels = parse_pixels(&self.height)?;
        Some((pixels / f64::from(self.row_height)).floor() as usize)
    }
}

fn parse_pixels(value: &str) -> Option<f64> {
    let value = value.trim();
    let number = value.strip_suffix("px").unwrap_or(value).trim();
    let pixels: f64 = number.parse().ok()?;
    (pixels.is_finite() && pixels >= 0.0).then_some(pixels)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    fn defaults_match_component_defaults() {
        let config = TreeViewConfig::default();
        assert_eq!(config.width, "auto");
        assert_eq!(config.height, "100%");
        assert_eq!(config.color_theme, ColorTheme::Neutral);
        assert_eq!(config.buffer_amount, 10);
        assert_eq!(config.scroll_throttle(), Duration::from_millis(1000));
        assert!(config.fill_buffer);
    }

    #[rstest]
    fn deserializes_camel_case_keys() {
        let config = TreeViewConfig::from_json_str(
            r#"{"width": "250px", "height": "300px", "colorTheme": "DARK", "bufferAmount": 20}"#,
        )
        .unwrap();
        assert_eq!(config.width, "250px");
        assert_eq!(config.color_theme, ColorTheme::Dark);
        assert_eq!(config.buffer_amount, 20);
        assert_eq!(config.row_height, DEFAULT_ROW_HEIGHT);
    }

    #[rstest]
    fn unknown_theme_is_rejected() {
        assert!(TreeViewConfig::from_json_str(r#"{"colorTheme": "LIGHT_BLUE"}"#).is_err());
    }

    #[rstest]
    #[case("300px", Some(8))]
    #[case("340", Some(10))]
    #[case(" 33px ", Some(0))]
    #[case("100%", None)]
    #[case("auto", None)]
    #[case("-10px", None)]
    fn capacity_from_height(#[case] height: &str, #[case] expected: Option<usize>) {
        let config = TreeViewConfig::default().with_height(height);
        assert_eq!(config.viewport_capacity(), expected);
    }

    #[rstest]
    fn zero_row_height_has_no_capacity() {
        let mut config = TreeViewConfig::default().with_height("300px");
        config.row_height = 0;
        assert_eq!(config.viewport_capacity(), None);
    }
}
