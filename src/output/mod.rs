//! Output collaborators of the simulator
//!
//! - **Visualization**: PNG/SVG figures of an episode using plotters
//! - **Export**: CSV data export for external analysis
//!
//! ```text
//! output/
//! ├── mod.rs
//! ├── visualization/
//! │   ├── config.rs     ← PlotConfig
//! │   └── reactor.rs    ← Renderer, PlotRenderer, plot_episode
//! └── export/
//!     └── csv.rs        ← export_episode_csv
//! ```
//!
//! Both read the [`EpisodeLog`](crate::environment::EpisodeLog) and never
//! touch the control state.
//!
//! # Quick Start
//!
//! ```rust,no_run
//! use cstr_rs::environment::{ClosedLoopSimulator, Environment, EnvironmentConfig};
//! use cstr_rs::output::{export_episode_csv, PlotRenderer};
//!
//! let mut env = ClosedLoopSimulator::with_seed(EnvironmentConfig::default(), 11)?;
//! env.attach_renderer(Box::new(PlotRenderer::new("run.png")));
//! while !env.is_done() {
//!     env.step(&[0.0; 6])?;
//! }
//! env.render()?;
//! export_episode_csv(env.log(), "run.csv", None)?;
//! # Ok::<(), cstr_rs::SimulationError>(())
//! ```

pub mod export;
pub mod visualization;

pub use export::{export_episode_csv, CsvConfig, CsvMetadata};
pub use visualization::{plot_episode, PlotConfig, PlotRenderer, Renderer};
