//  EXPERIMENT.rs
//    by Lut99
//
//  Created:
//    13 Feb 2023, 14:02:55
//  Last edited:
//    04 Apr 2023, 16:21:18
//  Auto updated?
//    Yes
//
//  Description:
//!   Implements the Experiment, which ties a validated descriptor's
//!   parameters, phases and run controller together with the executor
//!   pool it runs on.
//

use std::path::Path;

use chrono::{DateTime, Local};
use log::{debug, warn};

use nightshift_cfg::ExperimentFile;
use nightshift_cmd::ExecutorFactory;

pub use crate::errors::ExperimentError as Error;
use crate::parameters::Parameters;
use crate::phase::Phase;
use crate::pool::ExecutorPool;
use crate::run::{RunContext, Runner};


/***** TESTS *****/
#[cfg(test)]
mod tests {
    use nightshift_cmd::DummyFactory;
    use serde_json::json;
    use super::*;


    /// Builds an Experiment over a dummy factory from the given raw descriptor.
    fn experiment(raw: serde_json::Value) -> Result<Experiment, Error> {
        let file: ExperimentFile = ExperimentFile::from_str(&raw.to_string()).unwrap();
        Experiment::new(file, Box::new(DummyFactory::new()))
    }


    #[test]
    fn test_load_and_run_descriptor() {
        let mut exp: Experiment = experiment(json!({
            "name": "demo",
            "hosts": [ "h1" ],
            "parameters": { "common": { "greeting": "hello" } },
            "phases": [ { "name": "p1", "do": { "common": [ { "type": "bash", "parameters": { "command": "{{greeting}}" } } ] } } ],
            "run": { "pipeline": [ "p1" ] }
        })).unwrap();

        let mut ctx: RunContext = RunContext::new();
        let now: DateTime<Local> = Local::now();
        assert!(!exp.poll(&mut ctx, now));
        assert!(exp.poll(&mut ctx, now));
    }

    #[test]
    fn test_unknown_task_type_tolerated() {
        assert!(experiment(json!({
            "name": "demo",
            "hosts": [ "h1" ],
            "phases": [ { "name": "p1", "do": { "common": [ { "type": "teleport" } ] } } ],
            "run": { "pipeline": [ "p1" ] }
        })).is_ok());
    }

    #[test]
    fn test_unknown_pipeline_phase_rejected() {
        let res: Result<Experiment, Error> = experiment(json!({
            "name": "demo",
            "hosts": [ "h1" ],
            "phases": [ { "name": "p1", "do": {} } ],
            "run": { "pipeline": [ "p2" ] }
        }));
        assert!(matches!(res, Err(Error::UnknownPhase{ .. })));
    }

    #[test]
    fn test_duplicate_phase_keeps_first() {
        let exp: Experiment = experiment(json!({
            "name": "demo",
            "hosts": [ "h1" ],
            "phases": [
                { "name": "p1", "do": { "common": [ { "type": "echo", "parameters": { "file": "/tmp/a", "lines": [ "first" ] } } ] } },
                { "name": "p1", "do": {} }
            ],
            "run": { "pipeline": [ "p1" ] }
        })).unwrap();
        assert_eq!(exp.phases.len(), 1);
        assert_eq!(exp.phases[0].0, "p1");
    }
}





/***** LIBRARY *****/
/// One loaded, validated experiment, ready to be driven tick-by-tick.
pub struct Experiment {
    /// The experiment's name, as declared in its descriptor.
    name       : String,
    /// The fully resolved parameter namespace.
    parameters : Parameters,
    /// The phases, by name, in declaration order.
    phases     : Vec<(String, Phase)>,
    /// The run controller that walks the pipeline.
    runner     : Runner,
    /// The executor pool all of this experiment's commands run through.
    pool       : ExecutorPool,
}

impl Experiment {
    /// Constructor for the Experiment, which eagerly validates the entire descriptor.
    ///
    /// # Arguments
    /// - `file`: The parsed descriptor to build from.
    /// - `factory`: The factory that connects this experiment's command executors.
    ///
    /// # Returns
    /// A new Experiment instance that has not started running yet.
    ///
    /// # Errors
    /// This function errors if the parameters do not resolve, any recognized task is malformed or the pipeline references an undefined phase.
    pub fn new(file: ExperimentFile, factory: Box<dyn ExecutorFactory>) -> Result<Self, Error> {
        debug!("Validating experiment '{}'...", file.name);

        // Parameters first, so task validation can assume a consistent namespace
        let parameters: Parameters = Parameters::new(&file.name, &file.hosts, &file.parameters)
            .map_err(|err| Error::ParametersError{ name: file.name.clone(), err })?;

        // Build the phases, first declaration winning on name clashes
        let mut phases: Vec<(String, Phase)> = Vec::with_capacity(file.phases.len());
        for section in &file.phases {
            if phases.iter().any(|(name, _)| name == &section.name) {
                warn!("Phase '{}' is declared more than once in experiment '{}'; ignoring all but the first.", section.name, file.name);
                continue;
            }
            let phase: Phase = Phase::new(&file.hosts, section)
                .map_err(|err| Error::TaskCreateError{ name: file.name.clone(), phase: section.name.clone(), err })?;
            phases.push((section.name.clone(), phase));
        }

        // The pipeline may only name phases that exist
        for phase in &file.run.pipeline {
            if !phases.iter().any(|(name, _)| name == phase) {
                return Err(Error::UnknownPhase{ name: file.name.clone(), phase: phase.clone() });
            }
        }

        // Any host with a resolved `ssh-user` parameter gets it registered up-front
        let mut pool: ExecutorPool = ExecutorPool::new(factory);
        for host in &file.hosts {
            if let Ok(user) = parameters.value(host, "ssh-user") {
                pool.set_ssh_user(host, user);
            }
        }

        Ok(Self {
            name   : file.name.clone(),
            parameters,
            phases,
            runner : Runner::new(&file.run),
            pool,
        })
    }

    /// Constructor for the Experiment that reads the descriptor from the given file.
    ///
    /// # Arguments
    /// - `path`: The path of the descriptor file to load.
    /// - `factory`: The factory that connects this experiment's command executors.
    ///
    /// # Returns
    /// A new Experiment instance that has not started running yet.
    ///
    /// # Errors
    /// This function errors if the file cannot be read or parsed, or if validation fails (see `Experiment::new()`).
    pub fn from_path(path: impl AsRef<Path>, factory: Box<dyn ExecutorFactory>) -> Result<Self, Error> {
        let file: ExperimentFile = ExperimentFile::from_path(path).map_err(|err| Error::DescriptorError{ err })?;
        Self::new(file, factory)
    }



    /// Returns the name of this experiment.
    #[inline]
    pub fn name(&self) -> &str { &self.name }

    /// Advances this experiment by at most one step.
    ///
    /// # Arguments
    /// - `ctx`: The scheduler context carrying the pause state.
    /// - `now`: The current moment.
    ///
    /// # Returns
    /// Whether the experiment has terminally completed.
    #[inline]
    pub fn poll(&mut self, ctx: &mut RunContext, now: DateTime<Local>) -> bool {
        self.runner.poll(&self.name, &self.phases, &mut self.parameters, &mut self.pool, ctx, now)
    }

    /// Tears the experiment down, releasing its command executors.
    ///
    /// Also runs implicitly when the experiment is dropped.
    #[inline]
    pub fn teardown(&mut self) {
        self.pool.close();
    }
}
