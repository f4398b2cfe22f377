//  RUN.rs
//    by Lut99
//
//  Created:
//    13 Feb 2023, 09:12:20
//  Last edited:
//    04 Apr 2023, 16:08:32
//  Auto updated?
//    Yes
//
//  Description:
//!   Implements the run controller, which advances an experiment's phase
//!   pipeline across repetitions, and the scheduler context that carries
//!   the shared pause state.
//

use std::collections::VecDeque;

use chrono::{DateTime, Local};
use log::{error, info};

use nightshift_cfg::RunSection;

use crate::parameters::Parameters;
use crate::phase::Phase;
use crate::pool::ExecutorPool;
use crate::status::Status;


/***** TESTS *****/
#[cfg(test)]
mod tests {
    use std::sync::{Arc, Mutex};
    use chrono::Duration;
    use nightshift_cmd::DummyFactory;
    use serde_json::json;
    use super::*;


    /// Builds two trivial phases "a" and "b" whose single bash task records its own name.
    fn phases() -> Vec<(String, Phase)> {
        [ "a", "b" ].iter().map(|name| {
            let section = serde_json::from_value(json!({
                "name": name,
                "do": { "common": [ { "type": "bash", "parameters": { "command": name } } ] }
            })).unwrap();
            (name.to_string(), Phase::new(&[ "h1".into() ], &section).unwrap())
        }).collect()
    }

    /// Builds a Runner for the given repeat count over pipeline [a, b].
    fn runner(repeat: u32) -> Runner {
        Runner::new(&serde_json::from_value(json!({ "repeat": repeat, "pipeline": ["a", "b"] })).unwrap())
    }

    /// Builds an empty Parameters over host "h1".
    fn params() -> Parameters {
        Parameters::new("test", &[ "h1".into() ], &Default::default()).unwrap()
    }

    /// Builds a dummy-backed pool and its shared command log.
    fn pool() -> (ExecutorPool, Arc<Mutex<Vec<String>>>) {
        let factory: DummyFactory = DummyFactory::new();
        let log = factory.log();
        (ExecutorPool::new(Box::new(factory)), log)
    }


    #[test]
    fn test_pipeline_order_and_repeat() {
        let phases: Vec<(String, Phase)> = phases();
        let mut runner: Runner = runner(2);
        let mut params: Parameters = params();
        let (mut pool, log) = pool();
        let mut ctx: RunContext = RunContext::new();
        let now: DateTime<Local> = Local::now();

        // Every dispatch reports not-done; the phases are all fire-and-forget, so each next poll advances
        for _ in 0..4 {
            assert!(!runner.poll("test", &phases, &mut params, &mut pool, &mut ctx, now));
        }
        assert!(runner.poll("test", &phases, &mut params, &mut pool, &mut ctx, now));

        assert_eq!(*log.lock().unwrap(), vec![ "a".to_string(), "b".to_string(), "a".to_string(), "b".to_string() ]);
    }

    #[test]
    fn test_repetition_counters_injected() {
        let phases: Vec<(String, Phase)> = phases();
        let mut runner: Runner = runner(2);
        let mut params: Parameters = params();
        let (mut pool, _) = pool();
        let mut ctx: RunContext = RunContext::new();
        let now: DateTime<Local> = Local::now();

        runner.poll("test", &phases, &mut params, &mut pool, &mut ctx, now);
        assert_eq!(params.value("h1", "experiment-repetition").unwrap(), "1");
        assert_eq!(params.value("h1", "experiment-repetitions").unwrap(), "2");

        // Advance past 'b' into the second repetition
        runner.poll("test", &phases, &mut params, &mut pool, &mut ctx, now);
        runner.poll("test", &phases, &mut params, &mut pool, &mut ctx, now);
        assert_eq!(params.value("h1", "experiment-repetition").unwrap(), "2");
    }

    #[test]
    fn test_empty_pipeline_is_immediately_done() {
        let mut runner: Runner = Runner::new(&serde_json::from_value(json!({})).unwrap());
        let mut params: Parameters = params();
        let (mut pool, _) = pool();
        let mut ctx: RunContext = RunContext::new();

        assert!(runner.poll("test", &[], &mut params, &mut pool, &mut ctx, Local::now()));
    }

    #[test]
    fn test_pause_blocks_dispatch_until_expiry() {
        let phases: Vec<(String, Phase)> = phases();
        let mut runner: Runner = runner(1);
        let mut params: Parameters = params();
        let (mut pool, log) = pool();
        let mut ctx: RunContext = RunContext::new();
        let now: DateTime<Local> = Local::now();

        ctx.pause(now + Duration::seconds(5), now);

        // No dispatch happens while paused
        assert!(!runner.poll("test", &phases, &mut params, &mut pool, &mut ctx, now));
        assert!(!runner.poll("test", &phases, &mut params, &mut pool, &mut ctx, now + Duration::seconds(4)));
        assert!(log.lock().unwrap().is_empty());

        // Once the window expires, dispatch resumes exactly where it left off
        assert!(!runner.poll("test", &phases, &mut params, &mut pool, &mut ctx, now + Duration::seconds(5)));
        assert_eq!(*log.lock().unwrap(), vec![ "a".to_string() ]);
    }

    #[test]
    fn test_resume_lifts_pause() {
        let phases: Vec<(String, Phase)> = phases();
        let mut runner: Runner = runner(1);
        let mut params: Parameters = params();
        let (mut pool, log) = pool();
        let mut ctx: RunContext = RunContext::new();
        let now: DateTime<Local> = Local::now();

        ctx.pause(now + Duration::hours(1), now);
        assert!(!runner.poll("test", &phases, &mut params, &mut pool, &mut ctx, now));
        assert!(log.lock().unwrap().is_empty());

        ctx.resume();
        assert!(!runner.poll("test", &phases, &mut params, &mut pool, &mut ctx, now));
        assert_eq!(*log.lock().unwrap(), vec![ "a".to_string() ]);
    }

    #[test]
    fn test_pause_in_the_past_is_ignored() {
        let now: DateTime<Local> = Local::now();
        let mut ctx: RunContext = RunContext::new();
        ctx.pause(now - Duration::seconds(1), now);
        assert!(!ctx.is_paused(now));
    }
}





/***** LIBRARY *****/
/// The scheduler context shared by every experiment the scheduler drives.
///
/// It carries the pause state, which is deliberately scheduler-wide rather than per-experiment: pausing affects whichever experiment is currently active. It is an explicit object (owned by whoever runs the manager's ticks) so multiple orchestrator instances do not interfere.
#[derive(Clone, Debug)]
pub struct RunContext {
    /// Until when phase dispatch is suspended, if at all.
    pub(crate) pause_until : Option<DateTime<Local>>,
    /// Whether the active pause window still has to be logged (once per window).
    pub(crate) log_pause   : bool,
}

impl RunContext {
    /// Constructor for the RunContext, unpaused.
    ///
    /// # Returns
    /// A new RunContext instance.
    #[inline]
    pub fn new() -> Self {
        Self {
            pause_until : None,
            log_pause   : false,
        }
    }

    /// Suspends phase dispatch until the given moment.
    ///
    /// A deadline that is not in the future is ignored.
    ///
    /// # Arguments
    /// - `until`: The moment dispatch may resume.
    /// - `now`: The current moment.
    pub fn pause(&mut self, until: DateTime<Local>, now: DateTime<Local>) {
        if now >= until { return; }

        self.pause_until = Some(until);
        self.log_pause = true;
        info!("Pause until {} scheduled.", until);
    }

    /// Lifts any active pause, unconditionally.
    #[inline]
    pub fn resume(&mut self) {
        self.pause_until = None;
    }

    /// Returns whether dispatch is currently suspended.
    ///
    /// # Arguments
    /// - `now`: The current moment.
    #[inline]
    pub fn is_paused(&self, now: DateTime<Local>) -> bool {
        matches!(self.pause_until, Some(until) if now < until)
    }
}

impl Default for RunContext {
    #[inline]
    fn default() -> Self { Self::new() }
}



/// Advances an experiment's phase pipeline across the configured number of repetitions.
///
/// The controller is polled cooperatively: while a phase is in flight it only checks that phase's Status; dispatching the next phase happens on the single poll where the previous one completes.
#[derive(Debug)]
pub struct Runner {
    /// The configured repeat count.
    runs                 : u32,
    /// The configured phase-name sequence, refilled once per repetition.
    pipeline             : Vec<String>,
    /// The 1-based repetition currently in progress.
    current_run          : u32,
    /// The phase names still to dispatch this repetition, consumed front-to-back.
    current_pipeline     : VecDeque<String>,
    /// The Status of the most recently dispatched phase, if any.
    current_phase_status : Option<Status>,
}

impl Runner {
    /// Constructor for the Runner.
    ///
    /// # Arguments
    /// - `section`: The `run` section of the descriptor (repeat count + pipeline).
    ///
    /// # Returns
    /// A new Runner instance that has not dispatched anything yet.
    pub fn new(section: &RunSection) -> Self {
        Self {
            runs                 : section.repeat,
            pipeline             : section.pipeline.clone(),
            current_run          : 0,
            current_pipeline     : VecDeque::new(),
            current_phase_status : None,
        }
    }

    /// Returns the 1-based repetition currently in progress (0 before the first dispatch).
    #[inline]
    pub fn current_run(&self) -> u32 { self.current_run }

    /// Advances the pipeline by at most one step.
    ///
    /// Safe to call repeatedly: while the in-flight phase is pending this returns without side effects. When it completes, the next phase is dispatched (refilling the pipeline and bumping the repetition counters when a repetition ends), unless a pause is active.
    ///
    /// # Arguments
    /// - `name`: The experiment's name, for logging.
    /// - `phases`: The experiment's phases, looked up by name.
    /// - `parameters`: The experiment's parameter namespace; the repetition counters are injected here before each repetition.
    /// - `pool`: The experiment's executor pool.
    /// - `ctx`: The scheduler context carrying the pause state.
    /// - `now`: The current moment.
    ///
    /// # Returns
    /// Whether the experiment has terminally completed.
    pub fn poll(&mut self, name: &str, phases: &[(String, Phase)], parameters: &mut Parameters, pool: &mut ExecutorPool, ctx: &mut RunContext, now: DateTime<Local>) -> bool {
        // While a phase is in flight, only its status is checked
        if let Some(status) = &mut self.current_phase_status {
            if !status.poll(now, pool) {
                return false;
            }
            self.current_phase_status = None;
        }

        // A finished repetition refills the pipeline and bumps the counters
        if self.current_pipeline.is_empty() {
            self.current_run += 1;
            self.current_pipeline = self.pipeline.iter().cloned().collect();
            parameters.set_runtime("experiment-repetition", self.current_run.to_string());
            parameters.set_runtime("experiment-repetitions", self.runs.to_string());
        }

        // The pause check comes after the refill so a pause mid-repetition reports the right counters
        if let Some(until) = ctx.pause_until {
            if now < until {
                if ctx.log_pause {
                    info!("EXPERIMENT {} ({} / {}): Paused until {}", name, self.current_run, self.runs, until);
                    ctx.log_pause = false;
                }
                return false;
            }
        }

        if self.current_run > self.runs || self.current_pipeline.is_empty() {
            return true;
        }

        // Dispatch the next phase
        let phase_name: String = match self.current_pipeline.pop_front() {
            Some(name) => name,
            None       => { return true; },
        };
        match phases.iter().find(|(name, _)| name == &phase_name) {
            Some((_, phase)) => {
                info!("EXPERIMENT {} ({} / {}): {}", name, self.current_run, self.runs, phase_name);
                self.current_phase_status = Some(phase.run(parameters, pool, now));
                false
            },
            None => {
                // Construction validates the pipeline, so this only triggers on programmer error
                error!("EXPERIMENT {}: Phase '{}' in pipeline does not exist; aborting experiment.", name, phase_name);
                true
            },
        }
    }
}
