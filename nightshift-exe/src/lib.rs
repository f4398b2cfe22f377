//  LIB.rs
//    by Lut99
//
//  Created:
//    09 Feb 2023, 08:55:21
//  Last edited:
//    04 Apr 2023, 15:01:36
//  Auto updated?
//    Yes
//
//  Description:
//!   Defines the experiment execution runtime: the parameter resolver, the
//!   task/phase/run state machine and the experiment queue manager.
//

// Define some modules
pub mod errors;
pub mod parameters;
pub mod pool;
pub mod status;
pub mod task;
pub mod phase;
pub mod run;
pub mod experiment;
pub mod manager;

// Pull some stuff into the crate namespace
pub use errors::ExperimentError as Error;
pub use parameters::Parameters;
pub use pool::ExecutorPool;
pub use status::Status;
pub use task::Task;
pub use phase::Phase;
pub use run::{RunContext, Runner};
pub use experiment::Experiment;
pub use manager::ExperimentManager;
