//! Plot configuration for the reactor figure

use plotters::prelude::*;

/// Configuration for customizing the reactor figure
///
/// # Fields
///
/// - `width`, `height`: Dimensions in pixels
/// - `title`: Figure title, drawn above the four panels
/// - `xlabel`: Time axis label shared by all panels
/// - `line_color`: Measured / true variables
/// - `setpoint_color`: Dashed setpoint lines
/// - `secondary_color`: Second series of the control panel (feed flow)
/// - `marker_color`: Disturbance markers on the temperature panel
/// - `series_colors`: Optional override of the palette, indexed by panel
///
/// # Example
///
/// ```rust
/// use cstr_rs::output::visualization::PlotConfig;
/// use plotters::prelude::*;
///
/// let mut config = PlotConfig::reactor("Aggressive tuning");
/// config.line_color = BLACK;
/// config.width = 1920;
/// config.height = 1080;
/// assert_eq!(config.xlabel, "Time (min)");
/// ```
#[derive(Clone)]
pub struct PlotConfig {
    /// Image width in pixels (default: 1200)
    pub width: u32,

    /// Image height in pixels (default: 900)
    pub height: u32,

    /// Figure title (default: "CSTR Control System")
    pub title: String,

    /// X-axis label (default: "Time (min)")
    pub xlabel: String,

    /// Default: BLUE
    pub line_color: RGBColor,

    /// Default: RED
    pub setpoint_color: RGBColor,

    /// Default: GREEN
    pub secondary_color: RGBColor,

    /// Default: grey
    pub marker_color: RGBColor,

    /// Optional per-panel line colors
    ///
    /// If None, every panel uses `line_color`
    pub series_colors: Option<Vec<RGBColor>>,

    /// Background color (default: WHITE)
    pub background: RGBColor,

    /// Line width in pixels (default: 2)
    pub line_width: u32,

    /// Show grid lines (default: true)
    pub show_grid: bool,
}

/// Default figure title
pub const REACTOR_TITLE: &str = "CSTR Control System";

impl Default for PlotConfig {
    fn default() -> Self {
        Self {
            width: 1200,
            height: 900,
            title: REACTOR_TITLE.to_string(),
            xlabel: "Time (min)".to_string(),
            line_color: BLUE,
            setpoint_color: RED,
            secondary_color: GREEN,
            marker_color: RGBColor(128, 128, 128),
            series_colors: None,
            background: WHITE,
            line_width: 2,
            show_grid: true,
        }
    }
}

/// Helper trait to accept both `String` and `None` for optional titles
pub trait IntoOptionalTitle {
    fn into_optional_title(self) -> Option<String>;
}

impl IntoOptionalTitle for &str {
    fn into_optional_title(self) -> Option<String> {
        Some(self.to_string())
    }
}

impl IntoOptionalTitle for String {
    fn into_optional_title(self) -> Option<String> {
        Some(self)
    }
}

impl<T: IntoOptionalTitle> IntoOptionalTitle for Option<T> {
    fn into_optional_title(self) -> Option<String> {
        self.and_then(|t| t.into_optional_title())
    }
}

/// Constant for no title (default title will be used)
///
/// # Example
///
/// ```rust
/// use cstr_rs::output::visualization::{PlotConfig, NO_TITLE};
///
/// let config = PlotConfig::reactor(NO_TITLE);
/// assert_eq!(config.title, "CSTR Control System");
/// ```
pub const NO_TITLE: Option<&str> = None;

impl PlotConfig {
    /// Reactor figure with an optional custom title
    ///
    /// # Examples
    ///
    /// ```rust
    /// use cstr_rs::output::visualization::PlotConfig;
    ///
    /// let config = PlotConfig::reactor(format!("Seed {}", 42));
    /// assert_eq!(config.title, "Seed 42");
    ///
    /// let config = PlotConfig::reactor(None::<&str>);
    /// assert_eq!(config.title, "CSTR Control System");
    /// ```
    pub fn reactor(title: impl IntoOptionalTitle) -> Self {
        let mut config = Self::default();
        config.title = title
            .into_optional_title()
            .unwrap_or_else(|| REACTOR_TITLE.to_string());
        config
    }

    /// Color of the main series of panel `panel_index`
    ///
    /// Panels are numbered row by row: Cb, V, T, controls.
    pub(crate) fn panel_color(&self, panel_index: usize) -> RGBColor {
        if let Some(ref colors) = self.series_colors {
            if panel_index < colors.len() {
                return colors[panel_index];
            }
        }
        self.line_color
    }
}

// =================================================================================================
// Tests
// =================================================================================================
