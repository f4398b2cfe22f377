//  PHASE.rs
//    by Lut99
//
//  Created:
//    10 Feb 2023, 13:36:58
//  Last edited:
//    04 Apr 2023, 15:55:41
//  Auto updated?
//    Yes
//
//  Description:
//!   Implements a Phase, a named group of tasks distributed across the
//!   experiment's hosts and executed as one aggregate Status.
//

use chrono::{DateTime, Local};
use log::error;
use serde_json::Value as JValue;

use nightshift_cfg::PhaseSection;

pub use crate::errors::TaskError as Error;
use crate::parameters::Parameters;
use crate::pool::ExecutorPool;
use crate::status::Status;
use crate::task::Task;


/***** TESTS *****/





/***** LIBRARY *****/
/// A named group of tasks, executed together as one aggregate Status.
///
/// Tasks are built once, at construction; `run()` may be called once per repetition and re-executes the same Task objects, collecting their fresh Statuses into a new aggregate.
#[derive(Clone, Debug)]
pub struct Phase {
    /// The name of this phase.
    name           : String,
    /// The common tasks, instantiated once per experiment host (in host order).
    common_tasks   : Vec<(String, Vec<Task>)>,
    /// The host-specific tasks, only for hosts that were explicitly named.
    specific_tasks : Vec<(String, Vec<Task>)>,
}

impl Phase {
    /// Constructor for the Phase, which builds all of its tasks up-front.
    ///
    /// # Arguments
    /// - `hosts`: The experiment's hosts, across which the common tasks are replicated.
    /// - `section`: The raw `phases` entry to build from.
    ///
    /// # Returns
    /// A new Phase instance with validated tasks.
    ///
    /// # Errors
    /// This function errors if any recognized task fails validation. Unrecognized task types are skipped with a warning instead.
    pub fn new(hosts: &[String], section: &PhaseSection) -> Result<Self, Error> {
        // Replicate the common tasks across every host
        let mut common_tasks: Vec<(String, Vec<Task>)> = Vec::with_capacity(hosts.len());
        for host in hosts {
            common_tasks.push((host.clone(), Self::create_tasks(host, &section.tasks.common)?));
        }

        // Specific tasks only exist for the hosts their entry names
        let mut specific_tasks: Vec<(String, Vec<Task>)> = vec![];
        for entry in &section.tasks.specific {
            let entry_hosts: Vec<String> = match entry.get("hosts").and_then(|v| v.as_array()) {
                Some(hosts) => hosts.iter().filter_map(|h| h.as_str().map(|h| h.to_string())).collect(),
                None        => { continue; },
            };

            for host in entry_hosts {
                let tasks: Vec<Task> = Self::create_tasks(&host, std::slice::from_ref(entry))?;
                match specific_tasks.iter_mut().find(|(h, _)| h == &host) {
                    Some((_, existing)) => { existing.extend(tasks); },
                    None                => { specific_tasks.push((host, tasks)); },
                }
            }
        }

        Ok(Self {
            name : section.name.clone(),
            common_tasks,
            specific_tasks,
        })
    }

    /// Builds the tasks for one host from a list of raw entries, skipping unrecognized ones.
    fn create_tasks(host: &str, entries: &[JValue]) -> Result<Vec<Task>, Error> {
        let mut tasks: Vec<Task> = Vec::with_capacity(entries.len());
        for entry in entries {
            if let Some(task) = Task::try_create(host, entry)? {
                tasks.push(task);
            }
        }
        Ok(tasks)
    }



    /// Returns the name of this phase.
    #[inline]
    pub fn name(&self) -> &str { &self.name }

    /// Executes every task of this phase (common before specific) and aggregates their Statuses.
    ///
    /// A task whose execution fails is logged and contributes a permanently-pending member, leaving the aggregate not-done; this surfaces the failure to the operator without tearing down the scheduler.
    ///
    /// # Arguments
    /// - `parameters`: The experiment's parameter namespace.
    /// - `pool`: The experiment's executor pool.
    /// - `now`: The current moment, from which task deadlines count.
    ///
    /// # Returns
    /// A fresh aggregate Status over all executed tasks.
    pub fn run(&self, parameters: &Parameters, pool: &mut ExecutorPool, now: DateTime<Local>) -> Status {
        let mut statuses: Vec<Status> = vec![];
        for (host, tasks) in self.common_tasks.iter().chain(self.specific_tasks.iter()) {
            for task in tasks {
                match task.execute(parameters, pool, now) {
                    Ok(status) => { statuses.push(status); },
                    Err(err)   => {
                        error!("Failed to execute {} task on host '{}': {}", task.kind(), host, err);
                        statuses.push(Status::NotDone);
                    },
                }
            }
        }
        Status::All(statuses)
    }
}
