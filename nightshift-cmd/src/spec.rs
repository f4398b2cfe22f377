//  SPEC.rs
//    by Lut99
//
//  Created:
//    08 Feb 2023, 11:26:02
//  Last edited:
//    04 Apr 2023, 14:24:59
//  Auto updated?
//    Yes
//
//  Description:
//!   Defines the interfaces of this crate: the command-executor capability
//!   and the factory that produces executors per host.
//

use log::debug;

pub use crate::errors::ExecutorError as Error;
use crate::local::LocalExecutor;
use crate::ssh::SshExecutor;


/***** LIBRARY *****/
/// The capability the experiment runtime needs to issue commands on a host.
///
/// An executor is owned per (experiment, host) and reused across tasks of the same experiment on that host. It must be closed exactly once, during experiment teardown.
pub trait CommandExecutor: Send {
    /// Executes the given shell command on this executor's host.
    ///
    /// # Arguments
    /// - `command`: The command line to execute.
    ///
    /// # Returns
    /// The (non-empty) lines the command printed to stdout, in order.
    ///
    /// # Errors
    /// This function errors if the command could not be issued at all. A command that runs but fails is not an error at this boundary.
    fn execute(&mut self, command: &str) -> Result<Vec<String>, Error>;

    /// Releases any resources this executor holds (e.g., a remote connection).
    ///
    /// # Errors
    /// This function errors if the resources could not be cleanly released.
    fn close(&mut self) -> Result<(), Error>;
}



/// Produces command executors, keyed by host and SSH-usage flag.
pub trait ExecutorFactory: Send {
    /// Connects a new executor for the given host.
    ///
    /// # Arguments
    /// - `host`: The host the executor should issue commands on.
    /// - `user`: The SSH user to connect as, if one is known for this host.
    /// - `use_ssh`: Whether commands should travel over SSH or run locally.
    ///
    /// # Returns
    /// A newly connected executor.
    ///
    /// # Errors
    /// This function errors if the executor could not be set up (e.g., the SSH connection failed).
    fn connect(&self, host: &str, user: Option<&str>, use_ssh: bool) -> Result<Box<dyn CommandExecutor>, Error>;
}



/// The production factory: local commands run in a local shell, SSH commands over an OpenSSH session.
pub struct DefaultFactory;

impl ExecutorFactory for DefaultFactory {
    fn connect(&self, host: &str, user: Option<&str>, use_ssh: bool) -> Result<Box<dyn CommandExecutor>, Error> {
        if !use_ssh {
            return Ok(Box::new(LocalExecutor::new()));
        }

        let user: &str = user.ok_or_else(|| Error::MissingSshUser{ host: host.into() })?;
        Ok(Box::new(SshExecutor::connect(user, host)?))
    }
}





/***** HELPER FUNCTIONS *****/
/// Logs a command and the response it produced, at debug level.
///
/// # Arguments
/// - `header`: Identifies the executor (e.g., `SSH -> user@host`).
/// - `command`: The command that was issued.
/// - `response`: The stdout lines the command produced.
pub(crate) fn log_response(header: &str, command: &str, response: &[String]) {
    let response: String = if !response.is_empty() { response.join("<new line>") } else { "<no response>".into() };
    debug!("{}: {} >> {}", header, command, response);
}
