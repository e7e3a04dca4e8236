//! CSV export of the episode log
//!
//! One row per [`TimeSeriesRecord`](crate::environment::TimeSeriesRecord),
//! readable by pandas, Excel or MATLAB.
//!
//! # Quick Examples
//!
//! ## Minimal Export
//!
//! ```rust,no_run
//! use cstr_rs::environment::{ClosedLoopSimulator, Environment, EnvironmentConfig};
//! use cstr_rs::output::export::export_episode_csv;
//!
//! let mut env = ClosedLoopSimulator::with_seed(EnvironmentConfig::default(), 1)?;
//! env.step(&[0.0; 6])?;
//! export_episode_csv(env.log(), "episode.csv", None)?;
//! # Ok::<(), cstr_rs::SimulationError>(())
//! ```
//!
//! **Output** (`episode.csv`):
//! ```csv
//! Time (min),Ca (mol/L),Cb (mol/L),Cc (mol/L),T (K),V (L),Tc (K),Fin (L/min),Cb setpoint (mol/L),V setpoint (L),Disturbance
//! 0.000000,0.800000,0.000000,0.000000,325.000000,100.000000,300.000000,100.000000,0.700000,100.000000,
//! 1.000000,...
//! ```
//!
//! ## With Metadata
//!
//! ```rust,ignore
//! let metadata = CsvMetadata::from_config(env.config(), env.solver_name(), Some(42));
//! let config = CsvConfig::default().with_metadata(metadata);
//! export_episode_csv(env.log(), "episode.csv", Some(&config))?;
//! ```
//!
//! **Output**:
//! ```csv
//! # CSTR Closed-Loop Simulation Data
//! # Generated: 2026-02-11T15:30:00+00:00
//! # Seed: 42
//! # Solver: Dormand-Prince (RK45)
//! # Simulation Steps: 100
//! # dt: 1 min
//! ...
//! #
//! Time (min),Ca (mol/L),...
//! ```

use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;

use crate::environment::{EnvironmentConfig, EpisodeLog, TimeSeriesRecord};
use crate::error::{CstrResult, SimulationError};

/// Column headers after the time column
pub const EPISODE_COLUMNS: [&str; 10] = [
    "Ca (mol/L)",
    "Cb (mol/L)",
    "Cc (mol/L)",
    "T (K)",
    "V (L)",
    "Tc (K)",
    "Fin (L/min)",
    "Cb setpoint (mol/L)",
    "V setpoint (L)",
    "Disturbance",
];

// =============================================================================
// Configuration Structures
// =============================================================================

/// Configuration for CSV export
///
/// # Example
///
/// ```rust
/// use cstr_rs::output::export::CsvConfig;
///
/// let config = CsvConfig {
///     delimiter: ';',
///     precision: 10,
///     ..Default::default()
/// };
/// assert!(!config.include_metadata);
/// ```
#[derive(Clone, Debug)]
pub struct CsvConfig {
    /// Column delimiter (default: ',')
    pub delimiter: char,

    /// Decimal separator (default: '.')
    pub decimal_separator: char,

    /// Number of decimal places for floating-point values (default: 6)
    pub precision: usize,

    /// Include metadata header comments (default: false)
    pub include_metadata: bool,

    /// Metadata to include in header
    pub metadata: Option<CsvMetadata>,

    /// Custom header for time column (default: "Time (min)")
    pub time_header: String,
}

impl Default for CsvConfig {
    fn default() -> Self {
        Self {
            delimiter: ',',
            decimal_separator: '.',
            precision: 6,
            include_metadata: false,
            metadata: None,
            time_header: "Time (min)".to_string(),
        }
    }
}

impl CsvConfig {
    /// European CSV format (semicolon, comma for decimal)
    pub fn european() -> Self {
        Self {
            delimiter: ';',
            decimal_separator: ',',
            ..Default::default()
        }
    }

    /// High precision (12 decimal places)
    pub fn high_precision() -> Self {
        Self {
            precision: 12,
            ..Default::default()
        }
    }

    /// Builder pattern: set delimiter
    pub fn delimiter(mut self, delimiter: char) -> Self {
        self.delimiter = delimiter;
        self
    }

    /// Builder pattern: set precision
    pub fn precision(mut self, precision: usize) -> Self {
        self.precision = precision;
        self
    }

    /// Builder pattern: enable metadata
    pub fn with_metadata(mut self, metadata: CsvMetadata) -> Self {
        self.include_metadata = true;
        self.metadata = Some(metadata);
        self
    }

    fn validate(&self) -> CstrResult<()> {
        if self.delimiter == self.decimal_separator {
            return Err(SimulationError::Export(format!(
                "Delimiter and decimal separator are both '{}'",
                self.delimiter
            )));
        }
        Ok(())
    }
}

/// Metadata for CSV header comments
///
/// Only non-None fields are written.
#[derive(Clone, Debug, Default)]
pub struct CsvMetadata {
    /// Seed passed to `reset`
    pub seed: Option<u64>,

    /// Solver name (e.g., "Dormand-Prince (RK45)")
    pub solver_name: Option<String>,

    /// Episode horizon
    pub simulation_steps: Option<usize>,

    /// Control interval (min)
    pub dt: Option<f64>,

    pub noise_level: Option<f64>,

    pub uncertainty_level: Option<f64>,

    /// Actuator and transport delay in steps
    pub delays: Option<(usize, usize)>,

    pub disturbances_enabled: Option<bool>,

    /// Additional custom parameters
    pub custom: Vec<(String, String)>,
}

impl CsvMetadata {
    /// Summary of an environment configuration
    ///
    /// # Example
    ///
    /// ```rust
    /// use cstr_rs::environment::EnvironmentConfig;
    /// use cstr_rs::output::export::CsvMetadata;
    ///
    /// let metadata = CsvMetadata::from_config(&EnvironmentConfig::default(), "Forward Euler", Some(3));
    /// assert_eq!(metadata.simulation_steps, Some(100));
    /// assert_eq!(metadata.delays, Some((1, 2)));
    /// ```
    pub fn from_config(config: &EnvironmentConfig, solver: &str, seed: Option<u64>) -> Self {
        Self {
            seed,
            solver_name: Some(solver.to_string()),
            simulation_steps: Some(config.simulation_steps),
            dt: Some(config.dt),
            noise_level: Some(config.noise_level),
            uncertainty_level: Some(config.uncertainty_level),
            delays: Some((config.actuator_delay(), config.transport_delay())),
            disturbances_enabled: Some(config.enable_disturbances),
            custom: Vec::new(),
        }
    }

    /// Add custom parameter
    pub fn add_custom(&mut self, key: impl Into<String>, value: impl Into<String>) {
        self.custom.push((key.into(), value.into()));
    }
}

// =============================================================================
// Helper Functions
// =============================================================================

/// Write metadata header comments
fn write_metadata_header(out: &mut impl Write, metadata: &CsvMetadata) -> CstrResult<()> {
    writeln!(out, "# CSTR Closed-Loop Simulation Data")?;

    let now = chrono::Utc::now();
    writeln!(out, "# Generated: {}", now.to_rfc3339())?;

    if let Some(seed) = metadata.seed {
        writeln!(out, "# Seed: {}", seed)?;
    }
    if let Some(solver) = &metadata.solver_name {
        writeln!(out, "# Solver: {}", solver)?;
    }

    if let Some(steps) = metadata.simulation_steps {
        writeln!(out, "# Simulation Steps: {}", steps)?;
    }
    if let Some(dt) = metadata.dt {
        writeln!(out, "# dt: {} min", dt)?;
    }

    if let Some(noise) = metadata.noise_level {
        writeln!(out, "# Noise Level: {}", noise)?;
    }
    if let Some(uncertainty) = metadata.uncertainty_level {
        writeln!(out, "# Uncertainty Level: {}", uncertainty)?;
    }
    if let Some((actuator, transport)) = metadata.delays {
        writeln!(out, "# Delays: actuator {} / transport {} steps", actuator, transport)?;
    }
    if let Some(enabled) = metadata.disturbances_enabled {
        writeln!(out, "# Disturbances: {}", if enabled { "enabled" } else { "disabled" })?;
    }

    for (key, value) in &metadata.custom {
        writeln!(out, "# {}: {}", key, value)?;
    }

    writeln!(out, "#")?;

    Ok(())
}

/// Format number with configured precision and decimal separator
fn format_number(value: f64, config: &CsvConfig) -> String {
    let formatted = format!("{:.prec$}", value, prec = config.precision);

    if config.decimal_separator != '.' {
        formatted.replace('.', &config.decimal_separator.to_string())
    } else {
        formatted
    }
}

fn record_values(record: &TimeSeriesRecord) -> [f64; 10] {
    let state = record.state.to_array();
    [
        record.time,
        state[0],
        state[1],
        state[2],
        state[3],
        state[4],
        record.control.tc(),
        record.control.fin(),
        record.setpoint_cb,
        record.setpoint_v,
    ]
}

// =============================================================================
// Export Functions
// =============================================================================

/// Write the episode log to a CSV file
///
/// # Errors
///
/// - [`SimulationError::Export`]: empty log, non-finite values, or a
///   delimiter equal to the decimal separator
/// - [`SimulationError::Io`]: file creation or write failure
pub fn export_episode_csv(
    log: &EpisodeLog,
    output_path: impl AsRef<Path>,
    configuration: Option<&CsvConfig>,
) -> CstrResult<()> {
    // ============================= Validation =============================

    if log.is_empty() {
        return Err(SimulationError::Export(
            "Empty data: the episode log has no records".to_string(),
        ));
    }

    if let Some(index) = log
        .records()
        .iter()
        .position(|r| record_values(r).iter().any(|v| !v.is_finite()))
    {
        return Err(SimulationError::Export(format!(
            "Invalid data: NaN or Inf detected in record {}",
            index
        )));
    }

    // ============================= Configuration ==========================

    let binding = CsvConfig::default();
    let configuration = configuration.unwrap_or(&binding);
    configuration.validate()?;

    // ============================= Open File ==============================

    let mut out = BufWriter::new(File::create(output_path)?);

    // ============================= Write Metadata =========================

    if configuration.include_metadata {
        if let Some(metadata) = &configuration.metadata {
            write_metadata_header(&mut out, metadata)?;
        }
    }

    // ============================= Write Header ===========================

    write!(out, "{}", configuration.time_header)?;
    for column in EPISODE_COLUMNS {
        write!(out, "{}{}", configuration.delimiter, column)?;
    }
    writeln!(out)?;

    // ============================= Write Data =============================

    for record in log.records() {
        let values = record_values(record);
        write!(out, "{}", format_number(values[0], configuration))?;
        for value in &values[1..] {
            write!(
                out,
                "{}{}",
                configuration.delimiter,
                format_number(*value, configuration)
            )?;
        }
        let label = record.disturbance.map(|d| d.label()).unwrap_or("");
        writeln!(out, "{}{}", configuration.delimiter, label)?;
    }

    out.flush()?;
    Ok(())
}

// =================================================================================================
// Tests
// =================================================================================================
