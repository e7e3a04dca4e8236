//! Reactor figure: the rendering collaborator of the simulator
//!
//! Four panels laid out row by row:
//!
//! ```text
//! ┌──────────────────────────┬──────────────────────────┐
//! │ Cb vs setpoint           │ V vs setpoint            │
//! ├──────────────────────────┼──────────────────────────┤
//! │ T (+ disturbance marks)  │ Tc (left) / Fin (right)  │
//! └──────────────────────────┴──────────────────────────┘
//! ```
//!
//! The output format follows the file extension: `.svg` goes through the
//! SVG backend, anything else through the bitmap backend.

use std::error::Error;
use std::ops::Range;
use std::path::{Path, PathBuf};

use plotters::coord::Shift;
use plotters::prelude::*;
use tracing::debug;

use crate::environment::EpisodeLog;
use crate::error::{CstrResult, SimulationError};
use crate::output::visualization::PlotConfig;

// =================================================================================================
// Renderer Trait
// =================================================================================================

/// Consumer of the episode log
///
/// `render` may be called any number of times during an episode; every
/// call reflects the full log so far. `close` must be safe to call
/// repeatedly and without a preceding `render`.
pub trait Renderer: Send {
    fn render(&mut self, log: &EpisodeLog) -> CstrResult<()>;

    fn close(&mut self);
}

/// Renderer writing the reactor figure to a single image file
///
/// Each `render` overwrites the file with the current log. An empty log
/// (no `reset` yet) leaves the file untouched.
///
/// # Example
///
/// ```rust,no_run
/// use cstr_rs::environment::{ClosedLoopSimulator, Environment, EnvironmentConfig};
/// use cstr_rs::output::{PlotRenderer, Renderer};
///
/// let mut env = ClosedLoopSimulator::with_seed(EnvironmentConfig::default(), 7)?;
/// env.attach_renderer(Box::new(PlotRenderer::new("episode.png")));
/// for _ in 0..10 {
///     env.step(&[0.0; 6])?;
/// }
/// env.render()?;
/// env.close();
/// # Ok::<(), cstr_rs::SimulationError>(())
/// ```
pub struct PlotRenderer {
    path: PathBuf,
    config: PlotConfig,
    frames: usize,
    open: bool,
}

impl PlotRenderer {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self::with_config(path, PlotConfig::default())
    }

    pub fn with_config(path: impl Into<PathBuf>, config: PlotConfig) -> Self {
        Self {
            path: path.into(),
            config,
            frames: 0,
            open: false,
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn config(&self) -> &PlotConfig {
        &self.config
    }

    /// Number of figures written so far
    pub fn frames(&self) -> usize {
        self.frames
    }

    /// True between a successful `render` and the next `close`
    pub fn is_open(&self) -> bool {
        self.open
    }
}

impl Renderer for PlotRenderer {
    fn render(&mut self, log: &EpisodeLog) -> CstrResult<()> {
        if log.is_empty() {
            debug!(path = %self.path.display(), "Nothing to render yet");
            return Ok(());
        }

        plot_episode(log, &self.path, Some(&self.config))?;
        self.frames += 1;
        self.open = true;
        Ok(())
    }

    fn close(&mut self) {
        if self.open {
            debug!(path = %self.path.display(), frames = self.frames, "Renderer closed");
            self.open = false;
        }
    }
}

// =================================================================================================
// Public Plot Function
// =================================================================================================

/// Draw the reactor figure for `log` into `output_path`
///
/// # Errors
///
/// Returns [`SimulationError::Render`] if the log is empty or the backend
/// cannot write to `output_path`.
pub fn plot_episode(
    log: &EpisodeLog,
    output_path: impl AsRef<Path>,
    config: Option<&PlotConfig>,
) -> CstrResult<()> {
    if log.is_empty() {
        return Err(SimulationError::Render(
            "Empty data: the episode log has no records".to_string(),
        ));
    }

    let series = EpisodeSeries::from_log(log);
    let default_config = PlotConfig::default();
    let config = config.unwrap_or(&default_config);
    let output_path = output_path.as_ref();

    let ext = output_path
        .extension()
        .and_then(|s| s.to_str())
        .unwrap_or("png");

    let outcome = match ext {
        "svg" => {
            let backend = SVGBackend::new(output_path, (config.width, config.height));
            plot_episode_impl(backend, &series, config)
        }
        _ => {
            let backend = BitMapBackend::new(output_path, (config.width, config.height));
            plot_episode_impl(backend, &series, config)
        }
    };

    outcome.map_err(|error| {
        SimulationError::Render(format!("{}: {}", output_path.display(), error))
    })
}

// =================================================================================================
// Data Extraction
// =================================================================================================

/// Columns of the log needed by the four panels
struct EpisodeSeries {
    time: Vec<f64>,
    cb: Vec<f64>,
    setpoint_cb: Vec<f64>,
    volume: Vec<f64>,
    setpoint_v: Vec<f64>,
    temperature: Vec<f64>,
    tc: Vec<f64>,
    fin: Vec<f64>,
    disturbance_times: Vec<f64>,
}

impl EpisodeSeries {
    fn from_log(log: &EpisodeLog) -> Self {
        Self {
            time: log.times(),
            cb: log.series(|r| r.state.cb()),
            setpoint_cb: log.series(|r| r.setpoint_cb),
            volume: log.series(|r| r.state.volume()),
            setpoint_v: log.series(|r| r.setpoint_v),
            temperature: log.series(|r| r.state.temperature()),
            tc: log.series(|r| r.control.tc()),
            fin: log.series(|r| r.control.fin()),
            disturbance_times: log.disturbances().into_iter().map(|(t, _)| t).collect(),
        }
    }

    fn time_range(&self) -> Range<f64> {
        let max_time = self.time.last().copied().unwrap_or(1.0);
        if max_time > 0.0 {
            0.0..max_time
        } else {
            0.0..1.0
        }
    }
}

/// Value range of the given columns with a 5 % margin
///
/// A flat signal gets a margin relative to its magnitude so the line
/// is not drawn on the frame.
fn padded_range<'a>(columns: impl IntoIterator<Item = &'a [f64]>) -> Range<f64> {
    let (lo, hi) = columns
        .into_iter()
        .flatten()
        .filter(|v| v.is_finite())
        .fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), v| {
            (lo.min(*v), hi.max(*v))
        });

    if !(lo.is_finite() && hi.is_finite()) {
        return 0.0..1.0;
    }

    let span = hi - lo;
    let pad = if span > 1e-12 {
        0.05 * span
    } else {
        0.05 * lo.abs().max(1.0)
    };
    (lo - pad)..(hi + pad)
}

// =================================================================================================
// Private Plot Implementations
// =================================================================================================

/// One variable against its setpoint
struct TrackingPanel<'a> {
    caption: &'a str,
    ylabel: &'a str,
    label: &'a str,
    values: &'a [f64],
    setpoint: &'a [f64],
    color: RGBColor,
}

fn plot_episode_impl<DB: DrawingBackend>(
    backend: DB,
    series: &EpisodeSeries,
    config: &PlotConfig,
) -> Result<(), Box<dyn Error>>
where
    DB::ErrorType: 'static,
{
    let root = backend.into_drawing_area();
    root.fill(&config.background)?;
    let root = root.titled(&config.title, ("sans-serif", 32).into_font())?;

    let panels = root.split_evenly((2, 2));
    let time_range = series.time_range();

    draw_tracking_panel(
        &panels[0],
        &series.time,
        &TrackingPanel {
            caption: "Product concentration",
            ylabel: "Cb (mol/L)",
            label: "Cb",
            values: &series.cb,
            setpoint: &series.setpoint_cb,
            color: config.panel_color(0),
        },
        time_range.clone(),
        config,
    )?;

    draw_tracking_panel(
        &panels[1],
        &series.time,
        &TrackingPanel {
            caption: "Reactor volume",
            ylabel: "V (L)",
            label: "V",
            values: &series.volume,
            setpoint: &series.setpoint_v,
            color: config.panel_color(1),
        },
        time_range.clone(),
        config,
    )?;

    draw_temperature_panel(&panels[2], series, time_range.clone(), config)?;
    draw_control_panel(&panels[3], series, time_range, config)?;

    root.present()?;
    Ok(())
}

fn draw_tracking_panel<DB: DrawingBackend>(
    area: &DrawingArea<DB, Shift>,
    time: &[f64],
    panel: &TrackingPanel<'_>,
    time_range: Range<f64>,
    config: &PlotConfig,
) -> Result<(), Box<dyn Error>>
where
    DB::ErrorType: 'static,
{
    let y_range = padded_range([panel.values, panel.setpoint]);

    let mut chart = ChartBuilder::on(area)
        .caption(panel.caption, ("sans-serif", 20).into_font())
        .margin(10)
        .x_label_area_size(35)
        .y_label_area_size(60)
        .build_cartesian_2d(time_range, y_range)?;

    let x_format = |x: &f64| format!("{:.0}", x);
    let y_format = |y: &f64| format!("{:.3}", y);
    let mut mesh = chart.configure_mesh();
    if !config.show_grid {
        mesh.disable_mesh();
    }
    mesh.x_desc(&config.xlabel)
        .y_desc(panel.ylabel)
        .x_label_formatter(&x_format)
        .y_label_formatter(&y_format)
        .draw()?;

    let color = panel.color;
    chart
        .draw_series(LineSeries::new(
            time.iter().zip(panel.values.iter()).map(|(t, v)| (*t, *v)),
            ShapeStyle::from(&color).stroke_width(config.line_width),
        ))?
        .label(panel.label)
        .legend(move |(x, y)| PathElement::new(vec![(x, y), (x + 20, y)], color));

    let setpoint_color = config.setpoint_color;
    chart
        .draw_series(LineSeries::new(
            time.iter().zip(panel.setpoint.iter()).map(|(t, v)| (*t, *v)),
            ShapeStyle::from(&setpoint_color).stroke_width(1),
        ))?
        .label("Setpoint")
        .legend(move |(x, y)| PathElement::new(vec![(x, y), (x + 20, y)], setpoint_color));

    chart
        .configure_series_labels()
        .background_style(&config.background.mix(0.8))
        .border_style(&BLACK)
        .draw()?;

    Ok(())
}

/// Reactor temperature with one vertical mark per disturbance
fn draw_temperature_panel<DB: DrawingBackend>(
    area: &DrawingArea<DB, Shift>,
    series: &EpisodeSeries,
    time_range: Range<f64>,
    config: &PlotConfig,
) -> Result<(), Box<dyn Error>>
where
    DB::ErrorType: 'static,
{
    let y_range = padded_range([series.temperature.as_slice()]);
    let (y_low, y_high) = (y_range.start, y_range.end);

    let mut chart = ChartBuilder::on(area)
        .caption("Reactor temperature", ("sans-serif", 20).into_font())
        .margin(10)
        .x_label_area_size(35)
        .y_label_area_size(60)
        .build_cartesian_2d(time_range, y_range)?;

    let x_format = |x: &f64| format!("{:.0}", x);
    let y_format = |y: &f64| format!("{:.1}", y);
    let mut mesh = chart.configure_mesh();
    if !config.show_grid {
        mesh.disable_mesh();
    }
    mesh.x_desc(&config.xlabel)
        .y_desc("T (K)")
        .x_label_formatter(&x_format)
        .y_label_formatter(&y_format)
        .draw()?;

    let color = config.panel_color(2);
    chart
        .draw_series(LineSeries::new(
            series
                .time
                .iter()
                .zip(series.temperature.iter())
                .map(|(t, v)| (*t, *v)),
            ShapeStyle::from(&color).stroke_width(config.line_width),
        ))?
        .label("T")
        .legend(move |(x, y)| PathElement::new(vec![(x, y), (x + 20, y)], color));

    if !series.disturbance_times.is_empty() {
        let marker = config.marker_color;
        chart
            .draw_series(
                series
                    .disturbance_times
                    .iter()
                    .map(|t| PathElement::new(vec![(*t, y_low), (*t, y_high)], marker)),
            )?
            .label("Disturbance")
            .legend(move |(x, y)| PathElement::new(vec![(x, y), (x + 20, y)], marker));
    }

    chart
        .configure_series_labels()
        .background_style(&config.background.mix(0.8))
        .border_style(&BLACK)
        .draw()?;

    Ok(())
}

/// Coolant temperature on the left axis, feed flow on the right axis
fn draw_control_panel<DB: DrawingBackend>(
    area: &DrawingArea<DB, Shift>,
    series: &EpisodeSeries,
    time_range: Range<f64>,
    config: &PlotConfig,
) -> Result<(), Box<dyn Error>>
where
    DB::ErrorType: 'static,
{
    let tc_range = padded_range([series.tc.as_slice()]);
    let fin_range = padded_range([series.fin.as_slice()]);

    let mut chart = ChartBuilder::on(area)
        .caption("Control actions", ("sans-serif", 20).into_font())
        .margin(10)
        .x_label_area_size(35)
        .y_label_area_size(60)
        .right_y_label_area_size(60)
        .build_cartesian_2d(time_range.clone(), tc_range)?
        .set_secondary_coord(time_range, fin_range);

    let x_format = |x: &f64| format!("{:.0}", x);
    let y_format = |y: &f64| format!("{:.1}", y);
    let mut mesh = chart.configure_mesh();
    if !config.show_grid {
        mesh.disable_mesh();
    }
    mesh.x_desc(&config.xlabel)
        .y_desc("Tc (K)")
        .x_label_formatter(&x_format)
        .y_label_formatter(&y_format)
        .draw()?;

    chart
        .configure_secondary_axes()
        .y_desc("Fin (L/min)")
        .draw()?;

    let tc_color = config.panel_color(3);
    chart
        .draw_series(LineSeries::new(
            series.time.iter().zip(series.tc.iter()).map(|(t, v)| (*t, *v)),
            ShapeStyle::from(&tc_color).stroke_width(config.line_width),
        ))?
        .label("Tc")
        .legend(move |(x, y)| PathElement::new(vec![(x, y), (x + 20, y)], tc_color));

    let fin_color = config.secondary_color;
    chart
        .draw_secondary_series(LineSeries::new(
            series.time.iter().zip(series.fin.iter()).map(|(t, v)| (*t, *v)),
            ShapeStyle::from(&fin_color).stroke_width(config.line_width),
        ))?
        .label("Fin")
        .legend(move |(x, y)| PathElement::new(vec![(x, y), (x + 20, y)], fin_color));

    chart
        .configure_series_labels()
        .background_style(&config.background.mix(0.8))
        .border_style(&BLACK)
        .draw()?;

    Ok(())
}

// =================================================================================================
// Tests
// =================================================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::environment::{ClosedLoopSimulator, Environment, EnvironmentConfig};
    use crate::solver::SolverType;

    fn short_episode(steps: usize) -> ClosedLoopSimulator {
        let config = EnvironmentConfig {
            simulation_steps: 20,
            solver: SolverType::RungeKutta4 { substeps: 50 },
            ..EnvironmentConfig::default()
        };
        let mut env = ClosedLoopSimulator::with_seed(config, 3).unwrap();
        for _ in 0..steps {
            env.step(&[0.0; 6]).unwrap();
        }
        env
    }

    #[test]
    fn test_padded_range_flat_signal() {
        let flat = [100.0, 100.0, 100.0];
        let range = padded_range([&flat[..]]);
        assert!(range.start < 100.0 && range.end > 100.0);
    }

    #[test]
    fn test_padded_range_ignores_non_finite() {
        let values = [1.0, f64::NAN, 3.0];
        let range = padded_range([&values[..]]);
        assert!((range.start - 0.9).abs() < 1e-12);
        assert!((range.end - 3.1).abs() < 1e-12);
    }

    #[test]
    fn test_plot_episode_png() {
        let env = short_episode(10);
        let tmp = tempfile::NamedTempFile::new().unwrap();
        let path = tmp.path().with_extension("png");
        plot_episode(env.log(), &path, None).unwrap();
        assert!(path.exists());
    }

    #[test]
    fn test_plot_episode_svg() {
        let env = short_episode(10);
        let tmp = tempfile::NamedTempFile::new().unwrap();
        let path = tmp.path().with_extension("svg");
        plot_episode(env.log(), &path, Some(&PlotConfig::reactor("Open loop"))).unwrap();

        let contents = std::fs::read_to_string(&path).unwrap();
        assert!(contents.contains("<svg"));
    }

    #[test]
    fn test_plot_episode_rejects_empty_log() {
        let result = plot_episode(&EpisodeLog::new(), "unused.png", None);
        assert!(matches!(result, Err(SimulationError::Render(_))));
    }

    #[test]
    fn test_renderer_empty_log_is_noop() {
        let tmp = tempfile::NamedTempFile::new().unwrap();
        let path = tmp.path().with_extension("png");
        let mut renderer = PlotRenderer::new(&path);

        renderer.render(&EpisodeLog::new()).unwrap();
        assert_eq!(renderer.frames(), 0);
        assert!(!path.exists());
    }

    #[test]
    fn test_renderer_rerender_overwrites() {
        let env = short_episode(5);
        let tmp = tempfile::NamedTempFile::new().unwrap();
        let path = tmp.path().with_extension("svg");
        let mut renderer = PlotRenderer::new(&path);

        renderer.render(env.log()).unwrap();
        renderer.render(env.log()).unwrap();
        assert_eq!(renderer.frames(), 2);
        assert!(renderer.is_open());
        assert!(path.exists());
    }

    #[test]
    fn test_close_is_idempotent() {
        let mut renderer = PlotRenderer::new("never_written.png");
        renderer.close();
        renderer.close();
        assert!(!renderer.is_open());
        assert_eq!(renderer.frames(), 0);
    }

    #[test]
    fn test_simulator_delegates_to_attached_renderer() {
        let mut env = short_episode(4);
        let tmp = tempfile::NamedTempFile::new().unwrap();
        let path = tmp.path().with_extension("svg");
        env.attach_renderer(Box::new(PlotRenderer::new(&path)));

        env.render().unwrap();
        env.close();
        env.close();
        assert!(path.exists());
    }

    #[test]
    fn test_unwritable_path_is_render_error() {
        let env = short_episode(2);
        let result = plot_episode(env.log(), "/nonexistent-dir/cstr/figure.svg", None);
        assert!(matches!(result, Err(SimulationError::Render(_))));
    }
}
