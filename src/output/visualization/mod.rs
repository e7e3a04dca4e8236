//! Visualization of episode logs using the `plotters` library
//!
//! # Organization
//!
//! - **config**: Plot configuration (`PlotConfig`)
//! - **reactor**: The four-panel reactor figure and the [`Renderer`]
//!   collaborator of the simulator
//!
//! # Quick Start
//!
//! ```rust,ignore
//! use cstr_rs::output::visualization::{plot_episode, PlotConfig};
//!
//! plot_episode(env.log(), "episode.png", None)?;
//!
//! let config = PlotConfig::reactor("Seed 42");
//! plot_episode(env.log(), "episode.svg", Some(&config))?;
//! ```

pub mod config;
pub mod reactor;

pub use config::{IntoOptionalTitle, PlotConfig, NO_TITLE, REACTOR_TITLE};
pub use reactor::{plot_episode, PlotRenderer, Renderer};
