//! Scheduler - ordered system list and the per-run loop

use std::collections::VecDeque;
use std::time::{Duration, Instant};

use crate::ecs::error::{EcsError, Result};
use crate::ecs::system::{bind, Binding, System};
use crate::ecs::World;

pub const DEFAULT_STATS_HISTORY: usize = 100;

/// What happened to one system during a run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SystemOutcome {
    /// The system ran; `commands` queued mutations were applied afterwards.
    Ran { commands: usize },
    /// A required resource was missing, so the system was not invoked.
    Skipped { missing: Vec<String> },
}

#[derive(Debug, Clone)]
pub struct SystemReport {
    pub name: String,
    pub outcome: SystemOutcome,
    pub duration: Duration,
}

/// Statistics for a single run
#[derive(Debug, Clone)]
pub struct RunReport {
    pub tick: u64,
    pub duration: Duration,
    pub systems: Vec<SystemReport>,
}

impl RunReport {
    /// Names of the systems that were invoked, in order.
    pub fn ran(&self) -> Vec<&str> {
        self.systems
            .iter()
            .filter(|report| matches!(report.outcome, SystemOutcome::Ran { .. }))
            .map(|report| report.name.as_str())
            .collect()
    }

    pub fn skipped(&self) -> Vec<&str> {
        self.systems
            .iter()
            .filter(|report| matches!(report.outcome, SystemOutcome::Skipped { .. }))
            .map(|report| report.name.as_str())
            .collect()
    }
}

/// Runs systems strictly in registration order.
pub struct Scheduler {
    systems: Vec<Box<dyn System>>,
    tick_count: u64,
    stats_history: VecDeque<RunReport>,
    max_stats_history: usize,
}

impl Scheduler {
    pub fn new(max_stats_history: usize) -> Self {
        Self {
            systems: Vec::new(),
            tick_count: 0,
            stats_history: VecDeque::new(),
            max_stats_history,
        }
    }

    /// Add a system to the scheduler
    pub fn add_system(&mut self, system: Box<dyn System>) {
        self.systems.push(system);
    }

    pub fn len(&self) -> usize {
        self.systems.len()
    }

    pub fn is_empty(&self) -> bool {
        self.systems.is_empty()
    }

    pub fn system_names(&self) -> Vec<&str> {
        self.systems.iter().map(|system| system.name()).collect()
    }

    /// Number of completed runs
    pub fn tick_count(&self) -> u64 {
        self.tick_count
    }

    /// Execute every system once.
    ///
    /// A system that fails, or whose commands fail to apply, aborts the rest
    /// of the run. Changes already made stay in place.
    pub fn run(&mut self, world: &mut World) -> Result<RunReport> {
        let run_start = Instant::now();
        let tick = self.tick_count + 1;
        let mut systems = Vec::with_capacity(self.systems.len());

        for system in &mut self.systems {
            let system_start = Instant::now();
            let outcome = run_system(system.as_mut(), world)?;
            let duration = system_start.elapsed();
            log::trace!("tick {tick}: system '{}' {outcome:?} in {duration:?}", system.name());
            systems.push(SystemReport {
                name: system.name().to_string(),
                outcome,
                duration,
            });
        }

        self.tick_count = tick;
        let report = RunReport {
            tick,
            duration: run_start.elapsed(),
            systems,
        };

        if self.max_stats_history > 0 {
            self.stats_history.push_back(report.clone());
            while self.stats_history.len() > self.max_stats_history {
                self.stats_history.pop_front();
            }
        }

        Ok(report)
    }

    /// Get recent run statistics, oldest first
    pub fn recent_stats(&self) -> impl Iterator<Item = &RunReport> {
        self.stats_history.iter()
    }

    /// Get average run time from recent history
    pub fn average_run_time(&self) -> Option<Duration> {
        if self.stats_history.is_empty() {
            return None;
        }

        let total: Duration = self.stats_history.iter().map(|s| s.duration).sum();
        let count = u32::try_from(self.stats_history.len()).ok()?;
        Some(total / count)
    }
}

impl Default for Scheduler {
    fn default() -> Self {
        Self::new(DEFAULT_STATS_HISTORY)
    }
}

fn run_system(system: &mut dyn System, world: &mut World) -> Result<SystemOutcome> {
    let params = system.params();
    let queue = match bind(system.name(), &params, world)? {
        Binding::Skipped { missing } => {
            log::debug!(
                "skipping system '{}': missing resource(s) {}",
                system.name(),
                missing.join(", ")
            );
            return Ok(SystemOutcome::Skipped { missing });
        }
        Binding::Ready(args) => {
            system.run(&args).map_err(|source| EcsError::System {
                name: system.name().to_string(),
                source,
            })?;
            args.into_commands()
        }
    };
    let commands = queue.apply(world)?;
    Ok(SystemOutcome::Ran { commands })
}
