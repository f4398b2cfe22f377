//  MANAGER.rs
//    by Lut99
//
//  Created:
//    14 Feb 2023, 09:40:31
//  Last edited:
//    04 Apr 2023, 16:33:50
//  Auto updated?
//    Yes
//
//  Description:
//!   Implements the ExperimentManager, which queues deployed experiments
//!   and drives exactly one of them at a time.
//

use std::collections::VecDeque;

use chrono::{DateTime, Local};
use log::info;

use crate::experiment::Experiment;
use crate::run::RunContext;


/***** TESTS *****/
#[cfg(test)]
mod tests {
    use chrono::Duration;
    use nightshift_cmd::DummyFactory;
    use nightshift_cfg::ExperimentFile;
    use serde_json::json;
    use super::*;


    /// Builds an Experiment over a dummy factory that sleeps for the given time in its single phase.
    fn sleeper(name: &str, time: &str) -> Experiment {
        let file: ExperimentFile = ExperimentFile::from_str(&json!({
            "name": name,
            "hosts": [ "h1" ],
            "phases": [ { "name": "p1", "do": { "common": [ { "type": "sleep", "parameters": { "time": time } } ] } } ],
            "run": { "pipeline": [ "p1" ] }
        }).to_string()).unwrap();
        Experiment::new(file, Box::new(DummyFactory::new())).unwrap()
    }


    #[test]
    fn test_fifo_single_active() {
        let mut manager: ExperimentManager = ExperimentManager::new();
        manager.enqueue(sleeper("first", "2s"));
        manager.enqueue(sleeper("second", "2s"));

        let mut ctx: RunContext = RunContext::new();
        let now: DateTime<Local> = Local::now();

        // The first tick promotes and starts 'first'; 'second' stays queued
        manager.tick(&mut ctx, now);
        assert_eq!(manager.current().map(|e| e.name()), Some("first"));
        assert_eq!(manager.queued(), 1);

        // 'first' finishes once its sleep elapses; the successor is promoted on the tick after that
        manager.tick(&mut ctx, now + Duration::seconds(2));
        manager.tick(&mut ctx, now + Duration::seconds(2));
        assert_eq!(manager.current().map(|e| e.name()), Some("second"));
        assert_eq!(manager.queued(), 0);
    }

    #[test]
    fn test_active_slot_empties_when_done() {
        let mut manager: ExperimentManager = ExperimentManager::new();
        manager.enqueue(sleeper("only", "2s"));

        let mut ctx: RunContext = RunContext::new();
        let now: DateTime<Local> = Local::now();

        manager.tick(&mut ctx, now);
        assert!(manager.current().is_some());

        // Not done while the sleep is still pending
        manager.tick(&mut ctx, now + Duration::seconds(1));
        assert!(manager.current().is_some());

        manager.tick(&mut ctx, now + Duration::seconds(2));
        manager.tick(&mut ctx, now + Duration::seconds(2));
        assert!(manager.current().is_none());
        assert!(manager.is_idle());
    }

    #[test]
    fn test_tick_on_empty_manager_is_a_noop() {
        let mut manager: ExperimentManager = ExperimentManager::new();
        manager.tick(&mut RunContext::new(), Local::now());
        assert!(manager.is_idle());
    }
}





/***** LIBRARY *****/
/// Queues deployed experiments and runs them strictly one at a time, in arrival order.
pub struct ExperimentManager {
    /// The experiments waiting for their turn.
    queue   : VecDeque<Experiment>,
    /// The experiment currently being driven, if any.
    current : Option<Experiment>,
}

impl ExperimentManager {
    /// Constructor for the ExperimentManager.
    ///
    /// # Returns
    /// A new, idle ExperimentManager instance.
    #[inline]
    pub fn new() -> Self {
        Self {
            queue   : VecDeque::new(),
            current : None,
        }
    }

    /// Appends the given experiment to the back of the queue.
    ///
    /// # Arguments
    /// - `experiment`: The validated experiment to run once its turn comes.
    pub fn enqueue(&mut self, experiment: Experiment) {
        info!("Experiment '{}' queued at position {}.", experiment.name(), self.queue.len() + 1);
        self.queue.push_back(experiment);
    }

    /// Returns the experiment currently being driven, if any.
    #[inline]
    pub fn current(&self) -> Option<&Experiment> { self.current.as_ref() }

    /// Returns the number of experiments still waiting in the queue.
    #[inline]
    pub fn queued(&self) -> usize { self.queue.len() }

    /// Returns whether there is neither an active nor a queued experiment.
    #[inline]
    pub fn is_idle(&self) -> bool { self.current.is_none() && self.queue.is_empty() }

    /// Advances the manager by one tick.
    ///
    /// Promotes the next queued experiment if the active slot is free, then advances the active experiment by at most one step. Completed experiments are torn down and removed; the successor starts on the next tick.
    ///
    /// # Arguments
    /// - `ctx`: The scheduler context carrying the pause state.
    /// - `now`: The current moment.
    pub fn tick(&mut self, ctx: &mut RunContext, now: DateTime<Local>) {
        if self.current.is_none() {
            if let Some(experiment) = self.queue.pop_front() {
                info!("Starting experiment '{}' ({} more queued).", experiment.name(), self.queue.len());
                self.current = Some(experiment);
            }
        }

        if let Some(experiment) = &mut self.current {
            if experiment.poll(ctx, now) {
                info!("Experiment '{}' completed.", experiment.name());
                experiment.teardown();
                self.current = None;
            }
        }
    }
}

impl Default for ExperimentManager {
    #[inline]
    fn default() -> Self { Self::new() }
}
