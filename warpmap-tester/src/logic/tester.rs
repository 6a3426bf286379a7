use colored::Colorize;
use serde::{Deserialize, Serialize};
use std::time::{Duration, Instant};
use warpmap_core::MapConfig;

use super::policy::WalkPolicy;
use super::scenarios::{ScenarioCtx, TestScenario};
use super::seeds::SeedInfo;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScenarioResult {
    pub scenario_name: String,
    pub seed: u64,
    #[serde(default)]
    pub seed_code: Option<String>,
    pub passed: bool,
    pub iterations_run: usize,
    pub successful_iterations: usize,
    pub failures: Vec<String>,
    #[serde(with = "duration_serde")]
    pub average_duration: Duration,
    #[serde(with = "duration_vec_serde")]
    pub performance_data: Vec<Duration>,
}

impl ScenarioResult {
    /// Sector code for reports, falling back to the numeric seed.
    #[must_use]
    pub fn seed_label(&self) -> String {
        self.seed_code
            .clone()
            .unwrap_or_else(|| self.seed.to_string())
    }
}

pub struct LogicTester {
    config: MapConfig,
    policy: WalkPolicy,
    verbose: bool,
}

impl LogicTester {
    pub const fn new(config: MapConfig, policy: WalkPolicy, verbose: bool) -> Self {
        Self {
            config,
            policy,
            verbose,
        }
    }

    pub fn run_scenario(
        &self,
        scenario: &TestScenario,
        seeds: &[SeedInfo],
        iterations: usize,
    ) -> Vec<ScenarioResult> {
        let mut results = Vec::new();

        for seed in seeds {
            if self.verbose {
                println!(
                    "🧪 Testing scenario: {} (policy: {} seed: {})",
                    scenario.name().bright_white(),
                    self.policy,
                    seed.display_code()
                );
            }

            results.push(self.run_single_scenario(scenario, seed, iterations));
        }

        results
    }

    fn run_single_scenario(
        &self,
        scenario: &TestScenario,
        seed: &SeedInfo,
        iterations: usize,
    ) -> ScenarioResult {
        let mut successes = 0;
        let mut failures = Vec::new();
        let mut performance_data = Vec::new();

        for i in 0..iterations {
            let start_time = Instant::now();
            let iteration_seed = seed
                .seed
                .wrapping_add(u64::try_from(i).unwrap_or(u64::MAX));
            let ctx = ScenarioCtx {
                config: &self.config,
                seed: iteration_seed,
                policy: self.policy,
            };

            match scenario.run(&ctx) {
                Ok(summary) => {
                    successes += 1;
                    let duration = start_time.elapsed();
                    performance_data.push(duration);
                    if self.verbose {
                        println!(
                            "  ✅ Iteration {}/{} passed ({duration:?}) nodes:{} edges:{} jumps:{} draws:{}",
                            i + 1,
                            iterations,
                            summary.nodes,
                            summary.edges,
                            summary.jumps,
                            summary.draws
                        );
                    }
                }
                Err(err) => {
                    let message = format!("Iteration {} (seed {iteration_seed}): {err:#}", i + 1);
                    if self.verbose {
                        println!(
                            "  ❌ Iteration {}/{} failed: {}",
                            i + 1,
                            iterations,
                            message.clone().red()
                        );
                    }
                    log::warn!("{} failed: {message}", scenario.key());
                    failures.push(message);
                }
            }
        }

        let average_duration = if performance_data.is_empty() {
            Duration::ZERO
        } else {
            performance_data.iter().sum::<Duration>()
                / u32::try_from(performance_data.len()).unwrap_or(1)
        };

        ScenarioResult {
            scenario_name: scenario.name().to_string(),
            seed: seed.seed,
            seed_code: seed.sector_code(),
            passed: failures.is_empty(),
            iterations_run: iterations,
            successful_iterations: successes,
            failures,
            average_duration,
            performance_data,
        }
    }
}

mod duration_serde {
    use serde::{Deserialize, Deserializer, Serialize, Serializer};
    use std::time::Duration;

    pub fn serialize<S>(duration: &Duration, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        duration.as_micros().serialize(serializer)
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Duration, D::Error>
    where
        D: Deserializer<'de>,
    {
        let micros = u128::deserialize(deserializer)?;
        Ok(Duration::from_micros(u64::try_from(micros).unwrap_or(0)))
    }
}

mod duration_vec_serde {
    use serde::{Deserialize, Deserializer, Serialize, Serializer};
    use std::time::Duration;

    pub fn serialize<S>(durations: &[Duration], serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        let micros: Vec<u128> = durations.iter().map(Duration::as_micros).collect();
        micros.serialize(serializer)
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Vec<Duration>, D::Error>
    where
        D: Deserializer<'de>,
    {
        let micros = Vec::<u128>::deserialize(deserializer)?;
        Ok(micros
            .into_iter()
            .map(|m| Duration::from_micros(u64::try_from(m).unwrap_or(0)))
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::logic::scenarios::find_scenario;

    #[test]
    fn runs_each_seed_and_counts_iterations() {
        let tester = LogicTester::new(MapConfig::default(), WalkPolicy::Random, false);
        let scenario = find_scenario("traversal").unwrap();
        let seeds = vec![SeedInfo::from_numeric(1), SeedInfo::from_numeric(2)];
        let results = tester.run_scenario(&scenario, &seeds, 3);
        assert_eq!(results.len(), 2);
        for result in &results {
            assert!(result.passed, "{:?}", result.failures);
            assert_eq!(result.iterations_run, 3);
            assert_eq!(result.successful_iterations, 3);
            assert_eq!(result.performance_data.len(), 3);
            assert_eq!(result.seed_code, None);
            assert_eq!(result.seed_label(), result.seed.to_string());
        }
    }

    #[test]
    fn reported_codes_reproduce_the_seed_that_ran() {
        let tester = LogicTester::new(MapConfig::default(), WalkPolicy::First, false);
        let scenario = find_scenario("invariants").unwrap();
        let seed = warpmap_core::decode_sector_code("WM-NEBULA42").unwrap();
        let seeds = vec![SeedInfo::from_numeric(seed), SeedInfo::from_numeric(4242)];
        let results = tester.run_scenario(&scenario, &seeds, 1);
        let code = results[0].seed_code.as_deref().expect("composed seed has a code");
        assert_eq!(warpmap_core::decode_sector_code(code), Some(results[0].seed));
        assert_eq!(results[1].seed_code, None);
    }

    #[test]
    fn failures_are_recorded_per_iteration() {
        let tester = LogicTester::new(MapConfig::sized(0, 1, 1, 0.0), WalkPolicy::First, false);
        let scenario = find_scenario("determinism").unwrap();
        let results = tester.run_scenario(&scenario, &[SeedInfo::from_numeric(5)], 2);
        assert!(!results[0].passed);
        assert_eq!(results[0].failures.len(), 2);
        assert_eq!(results[0].average_duration, Duration::ZERO);
    }

    #[test]
    fn results_serialize_durations_as_micros() {
        let result = ScenarioResult {
            scenario_name: "Traversal".to_string(),
            seed: 1,
            seed_code: Some("WM-NEBULA00".to_string()),
            passed: true,
            iterations_run: 1,
            successful_iterations: 1,
            failures: Vec::new(),
            average_duration: Duration::from_micros(250),
            performance_data: vec![Duration::from_micros(250)],
        };
        let json = serde_json::to_string(&result).unwrap();
        assert!(json.contains("\"average_duration\":250"));
        let back: ScenarioResult = serde_json::from_str(&json).unwrap();
        assert_eq!(back.performance_data, result.performance_data);
    }
}
