//! Headless flock runner.
//!
//! Usage: flock_headless [AGENTS] [STEPS] [CONFIG.json]
//!
//! Spawns AGENTS boids uniformly inside a ball, a handful of them tagged as
//! predators and targets, runs STEPS pipeline steps and prints a JSON
//! summary. `RUST_LOG` style directives in `FLOCK_LOG` control logging.

use anyhow::{Context, Result};
use flocksim_core::{
    setup_logging, Agent, Flock, FlockBenchmark, FlockPipeline, ProfileId, SimulationConfig,
};
use glam::Vec3;
use rand::{rngs::StdRng, Rng, SeedableRng};
use rand_distr::{Distribution, UnitSphere};
use tracing::info;

const SPAWN_RADIUS: f32 = 40.0;
const PREDATOR_EVERY: usize = 5_000;
const TARGET_EVERY: usize = 2_500;

fn spawn(config: &SimulationConfig, count: usize) -> Result<Flock> {
    let mut rng = StdRng::seed_from_u64(config.seed);
    let mut flock = Flock::with_capacity(count);
    let profiles = config.profiles.len();
    for i in 0..count {
        let id = flock.allocate_id()?;
        let dir: [f32; 3] = UnitSphere.sample(&mut rng);
        // cube root keeps the density uniform over the ball
        let r = SPAWN_RADIUS * rng.gen::<f32>().cbrt();
        let heading: [f32; 3] = UnitSphere.sample(&mut rng);
        let profile = ProfileId(i % profiles);
        let speed = config.profiles[profile.0].max_speed;

        let mut agent = Agent::new(id, profile, Vec3::from(dir) * r, Vec3::from(heading))
            .with_velocity(Vec3::from(heading) * speed);
        if i % PREDATOR_EVERY == PREDATOR_EVERY - 1 {
            agent = agent.as_predator();
        } else if i % TARGET_EVERY == 0 {
            agent = agent.as_target();
        }
        flock.insert(agent);
    }
    Ok(flock)
}

fn main() -> Result<()> {
    setup_logging(std::env::var("FLOCK_LOG").ok());

    let mut args = std::env::args().skip(1);
    let agents: usize = match args.next() {
        Some(raw) => raw.parse().with_context(|| format!("invalid agent count {raw:?}"))?,
        None => 100_000,
    };
    let steps: usize = match args.next() {
        Some(raw) => raw.parse().with_context(|| format!("invalid step count {raw:?}"))?,
        None => 100,
    };
    let config = match args.next() {
        Some(path) => SimulationConfig::from_path(&path)
            .with_context(|| format!("failed to load config from {path}"))?,
        None => SimulationConfig::default(),
    };

    let mut pipeline = FlockPipeline::new(config).context("failed to build pipeline")?;
    let mut flock = spawn(pipeline.config(), agents)?;
    info!("Spawned {} agents inside r={}", agents, SPAWN_RADIUS);

    let summary = FlockBenchmark::new(steps, 1.0 / 60.0).run(&mut pipeline, &mut flock)?;

    println!("{}", serde_json::to_string_pretty(&summary)?);
    println!(
        "mean step: {:?}  |  {:.2}M agent updates/s",
        summary.mean_step(),
        summary.agents_per_second() / 1e6
    );
    Ok(())
}
