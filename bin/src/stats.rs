use std::time::{Duration, Instant};

/// Wall-clock timings of the pipeline stages, printed under --verbose.
#[derive(Debug, Clone)]
pub(crate) struct Benchmark {
    initial_instant: Instant,
    instant: Instant,
    steps: Vec<StepBenchmark>,
}

#[derive(Debug, Clone)]
pub(crate) struct StepBenchmark {
    name: String,
    duration: Duration,
}

impl Benchmark {
    pub fn now() -> Self {
        Self {
            initial_instant: Instant::now(),
            instant: Instant::now(),
            steps: Vec::new(),
        }
    }

    /// Close the current step under `name` and start timing the next.
    pub fn step(&mut self, name: &str) {
        self.steps.push(StepBenchmark {
            name: name.to_string(),
            duration: self.instant.elapsed(),
        });
        self.instant = Instant::now();
    }

    pub fn print_summary(&self) {
        let total = self.initial_instant.elapsed();
        eprintln!("timing breakdown:");
        for step in &self.steps {
            let percentage = if total.as_secs_f64() > 0.0 {
                step.duration.as_secs_f64() / total.as_secs_f64() * 100.0
            } else {
                0.0
            };
            eprintln!(
                "  {:.<24} {:>8.2}ms ({:>5.1}%)",
                step.name,
                step.duration.as_secs_f64() * 1000.0,
                percentage
            );
        }
        eprintln!("  total: {:.2}ms", total.as_secs_f64() * 1000.0);
    }
}
