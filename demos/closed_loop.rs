//! Example: CSTR Closed Loop - Fixed PID Tuning vs Batch of Seeds
//!
//! Runs the A → B → C reactor under a fixed PID tuning with the default
//! environment: uncertain kinetics, 2 % measurement noise, one step of
//! actuator delay, two steps of transport delay and a disturbance every
//! 20 minutes.
//!
//! **Loops**:
//! - Cb (product concentration) driven by the coolant temperature Tc
//! - V (hold-up volume) driven by the inlet flow Fin
//!
//! **Tuning**:
//! - Cb loop: Kp = 10, Ki = 5, Kd = 0.1
//! - V loop : Kp = 0.5, Ki = 0.5, Kd = 0.1
//!
//! Writes a four-panel figure and a CSV of the episode to the temporary
//! directory, then evaluates the same tuning over a batch of seeds.
//!
//! ```bash
//! RUST_LOG=info cargo run --example closed_loop --features parallel
//! ```

use cstr_rs::{
    control::{GainScaling, LoopGains, PidGains},
    environment::{ClosedLoopSimulator, Environment, EnvironmentConfig},
    output::{export_episode_csv, CsvConfig, CsvMetadata, PlotConfig, PlotRenderer},
    rollout::{run_batch, BatchReport, ConstantPolicy, Policy},
    solver::SolverType,
};

use std::time::Instant;
use tracing_subscriber::EnvFilter;

fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")))
        .init();

    println!("═══════════════════════════════════════════════════════");
    println!("  CSTR Closed Loop - Fixed PID Tuning");
    println!("═══════════════════════════════════════════════════════\n");

    // ====== Tuning ======

    let gains = PidGains {
        cb: LoopGains { kp: 10.0, ki: 5.0, kd: 0.1 },
        v: LoopGains { kp: 0.5, ki: 0.5, kd: 0.1 },
    };
    let mut policy = ConstantPolicy::from_gains(&GainScaling::default(), &gains);

    println!("Tuning:");
    println!("  Cb loop : Kp = {}, Ki = {}, Kd = {}", gains.cb.kp, gains.cb.ki, gains.cb.kd);
    println!("  V loop  : Kp = {}, Ki = {}, Kd = {}", gains.v.kp, gains.v.ki, gains.v.kd);
    println!("  Action  : {:?}\n", policy.action());

    // ====== Environment ======

    let config = EnvironmentConfig {
        solver: SolverType::default(),
        ..EnvironmentConfig::default()
    };
    let seed = 42;

    println!("Environment:");
    println!("  Horizon     : {} steps of {} min", config.simulation_steps, config.dt);
    println!("  Noise       : {} (relative)", config.noise_level);
    println!("  Uncertainty : ±{}", config.uncertainty_level);
    println!(
        "  Delays      : actuator {} / transport {} steps",
        config.actuator_delay(),
        config.transport_delay()
    );
    println!("  Setpoints   : Cb = {} mol/L, V = {} L\n", config.setpoint_cb, config.setpoint_v);

    // =============================================================================================
    // Single episode
    // =============================================================================================

    let tmp_dir = std::env::temp_dir();
    let figure_path = tmp_dir.join("cstr_closed_loop.png");
    let csv_path = tmp_dir.join("cstr_closed_loop.csv");

    let mut env = ClosedLoopSimulator::with_seed(config.clone(), seed)?;
    env.attach_renderer(Box::new(PlotRenderer::with_config(
        &figure_path,
        PlotConfig::reactor(format!("CSTR Closed Loop (seed {})", seed)),
    )));

    let (mut observation, info) = env.reset(Some(seed));
    println!("Sampled parameters:");
    println!("  k0_AB = {:.4e} 1/min", info.parameters.k0_ab);
    println!("  k0_BC = {:.4e} 1/min", info.parameters.k0_bc);
    println!("  UA    = {:.1}\n", info.parameters.ua);

    let start = Instant::now();
    let mut total_reward = 0.0;

    loop {
        let result = env.step(&policy.act(&observation))?;
        total_reward += result.reward;

        if let Some(kind) = result.info.disturbance {
            println!("  step {:>3}: disturbance {}", env.current_step(), kind);
        }

        observation = result.observation;
        if result.done {
            break;
        }
    }
    let elapsed = start.elapsed();

    let last = env.log().last().map(|r| r.state).unwrap_or(*env.true_state());
    println!("\nEpisode:");
    println!("  Total reward : {:.4}", total_reward);
    println!("  Final Cb     : {:.4} mol/L", last.cb());
    println!("  Final V      : {:.2} L", last.volume());
    println!("  Final T      : {:.2} K", last.temperature());
    println!("  Wall time    : {:.2?}\n", elapsed);

    // ====== Output ======

    env.render()?;
    env.close();
    println!("Figure : {}", figure_path.display());

    let mut metadata = CsvMetadata::from_config(env.config(), env.solver_name(), Some(seed));
    metadata.add_custom("Tuning", format!("{:?}", gains.to_array()));
    export_episode_csv(env.log(), &csv_path, Some(&CsvConfig::default().with_metadata(metadata)))?;
    println!("CSV    : {}\n", csv_path.display());

    // =============================================================================================
    // Batch of seeds
    // =============================================================================================

    println!("═══════════════════════════════════════════════════════");
    println!("  Batch Evaluation: 16 Seeds");
    println!("═══════════════════════════════════════════════════════\n");

    let seeds: Vec<u64> = (0..16).collect();
    let start = Instant::now();
    let results = run_batch(&config, &seeds, |_| policy);
    let elapsed = start.elapsed();

    for result in &results {
        match result {
            Ok(summary) => println!(
                "  seed {:>2}: reward {:>9.4}, {} disturbances",
                summary.seed,
                summary.total_reward,
                summary.disturbances.len()
            ),
            Err(e) => println!("  failed: {}", e),
        }
    }

    let report = BatchReport::from_results(&results);
    println!("\nBatch:");
    println!("  Completed   : {} / {}", report.completed, seeds.len());
    println!("  Mean reward : {:?}", report.mean_reward);
    println!("  Best seed   : {:?}", report.best_seed);
    println!("  Wall time   : {:.2?}", elapsed);

    Ok(())
}
