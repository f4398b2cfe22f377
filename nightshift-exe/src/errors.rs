//  ERRORS.rs
//    by Lut99
//
//  Created:
//    09 Feb 2023, 08:58:47
//  Last edited:
//    04 Apr 2023, 15:04:29
//  Auto updated?
//    Yes
//
//  Description:
//!   Defines errors that occur in the `nightshift-exe` crate.
//

use std::error::Error;
use std::fmt::{Display, Formatter, Result as FResult};


/***** LIBRARY *****/
/// Errors that relate to resolving `{{...}}` placeholders in parameters.
#[derive(Debug)]
pub enum ResolveError {
    /// A resolution pass made no progress, i.e., the remaining entries reference each other cyclically.
    CyclicDependency{ tier: &'static str, host: Option<String>, names: Vec<String> },
    /// The same specific parameter was declared twice for the same host.
    DuplicateParameter{ host: String, name: String },
    /// A placeholder (or direct lookup) referenced a name that exists in neither tier.
    UnknownParameter{ host: String, name: String },
}

impl Display for ResolveError {
    fn fmt(&self, f: &mut Formatter<'_>) -> FResult {
        use ResolveError::*;
        match self {
            CyclicDependency{ tier, host, names } => match host {
                Some(host) => write!(f, "Cyclic dependency in {} parameters for host '{}' (unresolved: {})", tier, host, names.join(", ")),
                None       => write!(f, "Cyclic dependency in {} parameters (unresolved: {})", tier, names.join(", ")),
            },
            DuplicateParameter{ host, name }      => write!(f, "Duplicated specific parameter '{}' for host '{}'", name, host),
            UnknownParameter{ host, name }        => write!(f, "Parameter '{}' is defined neither for host '{}' nor commonly", name, host),
        }
    }
}

impl Error for ResolveError {}



/// Errors that relate to constructing and executing tasks.
#[derive(Debug)]
pub enum TaskError {
    /// A declared parameter was missing from the task's parameter map.
    MissingParameter{ task: &'static str, name: &'static str },
    /// A declared parameter had the wrong type.
    ParameterTypeError{ task: &'static str, name: &'static str, expected: &'static str },
    /// A declared parameter did not match its required format.
    ParameterFormatError{ task: &'static str, name: &'static str, raw: String, err: nightshift_shr::errors::TimeError },
    /// A timespan parameter turned out malformed after placeholder resolution.
    TimespanParseError{ task: &'static str, raw: String, err: nightshift_shr::errors::TimeError },
    /// Failed to resolve a parameter's placeholders at execution time.
    ResolveError{ err: ResolveError },
    /// The command-executor boundary failed.
    ExecutorError{ err: nightshift_cmd::Error },
}

impl Display for TaskError {
    fn fmt(&self, f: &mut Formatter<'_>) -> FResult {
        use TaskError::*;
        match self {
            MissingParameter{ task, name }                => write!(f, "Parameter '{}' missing for task '{}'", name, task),
            ParameterTypeError{ task, name, expected }    => write!(f, "Parameter '{}' of '{}' task must be of type {}", name, task, expected),
            ParameterFormatError{ task, name, raw, err }  => write!(f, "Value of parameter '{}' of '{}' task ('{}') has an illegal format: {}", name, task, raw, err),
            TimespanParseError{ task, raw, err }          => write!(f, "Resolved timespan '{}' of '{}' task is illegal: {}", raw, task, err),
            ResolveError{ err }                           => write!(f, "Failed to resolve task parameter: {}", err),
            ExecutorError{ err }                          => write!(f, "Failed to execute command: {}", err),
        }
    }
}

impl Error for TaskError {}



/// Errors that relate to loading an Experiment as a whole.
#[derive(Debug)]
pub enum ExperimentError {
    /// Failed to load the descriptor file itself.
    DescriptorError{ err: nightshift_cfg::Error },
    /// Failed to resolve the experiment's parameter namespace.
    ParametersError{ name: String, err: ResolveError },
    /// Failed to construct a task in one of the phases.
    TaskCreateError{ name: String, phase: String, err: TaskError },
    /// The run pipeline references a phase that was never defined.
    UnknownPhase{ name: String, phase: String },
}

impl Display for ExperimentError {
    fn fmt(&self, f: &mut Formatter<'_>) -> FResult {
        use ExperimentError::*;
        match self {
            DescriptorError{ err }               => write!(f, "Failed to load experiment descriptor: {}", err),
            ParametersError{ name, err }         => write!(f, "Failed to resolve parameters of experiment '{}': {}", name, err),
            TaskCreateError{ name, phase, err }  => write!(f, "Failed to create task in phase '{}' of experiment '{}': {}", phase, name, err),
            UnknownPhase{ name, phase }          => write!(f, "Pipeline of experiment '{}' references unknown phase '{}'", name, phase),
        }
    }
}

impl Error for ExperimentError {}
