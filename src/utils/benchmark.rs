use crate::core::agent::AgentStore;
use crate::core::error::Result;
use crate::swarm::master_pipeline::FlockPipeline;
use serde::Serialize;
use std::time::{Duration, Instant};
use tracing::info;

/// Timing summary of a benchmark run.
#[derive(Clone, Debug, Serialize)]
pub struct BenchmarkSummary {
    pub steps: usize,
    pub agents: usize,
    pub workers: usize,
    pub total: Duration,
    pub fastest: Duration,
    pub slowest: Duration,
    pub predator_overrides: usize,
}

impl BenchmarkSummary {
    pub fn mean_step(&self) -> Duration {
        if self.steps == 0 {
            Duration::ZERO
        } else {
            Duration::from_secs_f64(self.total.as_secs_f64() / self.steps as f64)
        }
    }

    /// Agent updates per wall-clock second.
    pub fn agents_per_second(&self) -> f64 {
        let secs = self.total.as_secs_f64();
        if secs > 0.0 {
            (self.agents * self.steps) as f64 / secs
        } else {
            0.0
        }
    }
}

/// Benchmark - Times repeated pipeline steps over one store
pub struct FlockBenchmark {
    pub steps: usize,
    pub dt: f32,
}

impl Default for FlockBenchmark {
    fn default() -> Self {
        FlockBenchmark {
            steps: 100,
            dt: 1.0 / 60.0,
        }
    }
}

impl FlockBenchmark {
    pub fn new(steps: usize, dt: f32) -> Self {
        FlockBenchmark { steps, dt }
    }

    /// Run `steps` steps and collect timings. Fails on the first step error.
    pub fn run<S: AgentStore + ?Sized>(
        &self,
        pipeline: &mut FlockPipeline,
        store: &mut S,
    ) -> Result<BenchmarkSummary> {
        info!(
            "📊 Running flock benchmark: {} agents × {} steps on {} workers",
            store.agent_count(),
            self.steps,
            pipeline.worker_threads()
        );

        let mut fastest = Duration::MAX;
        let mut slowest = Duration::ZERO;
        let mut predator_overrides = 0;
        let start = Instant::now();
        for _ in 0..self.steps {
            let t = Instant::now();
            let report = pipeline.step(store, self.dt)?;
            let elapsed = t.elapsed();
            fastest = fastest.min(elapsed);
            slowest = slowest.max(elapsed);
            predator_overrides += report.predator_overrides();
        }

        let summary = BenchmarkSummary {
            steps: self.steps,
            agents: store.agent_count(),
            workers: pipeline.worker_threads(),
            total: start.elapsed(),
            fastest: if self.steps == 0 { Duration::ZERO } else { fastest },
            slowest,
            predator_overrides,
        };

        info!(
            "📈 Benchmark complete: mean {:?}/step, {:.0} agents/s",
            summary.mean_step(),
            summary.agents_per_second()
        );
        Ok(summary)
    }
}
