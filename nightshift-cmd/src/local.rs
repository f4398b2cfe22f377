//  LOCAL.rs
//    by Lut99
//
//  Created:
//    08 Feb 2023, 11:39:17
//  Last edited:
//    21 Mar 2023, 10:10:28
//  Auto updated?
//    Yes
//
//  Description:
//!   Implements the command executor that runs commands in a local shell.
//

use std::process::{Command, Output};

pub use crate::errors::ExecutorError as Error;
use crate::spec::{log_response, CommandExecutor};


/***** TESTS *****/





/***** LIBRARY *****/
/// Executes commands in a local `bash` shell, synchronously.
pub struct LocalExecutor;

impl LocalExecutor {
    /// Constructor for the LocalExecutor.
    ///
    /// # Returns
    /// A new LocalExecutor instance. There is nothing to connect.
    #[inline]
    pub fn new() -> Self { Self }
}

impl Default for LocalExecutor {
    #[inline]
    fn default() -> Self { Self::new() }
}

impl CommandExecutor for LocalExecutor {
    fn execute(&mut self, command: &str) -> Result<Vec<String>, Error> {
        // Run the command to completion and capture its output
        let output: Output = Command::new("bash")
            .arg("-c")
            .arg(command)
            .output()
            .map_err(|err| Error::SpawnError{ what: "bash", command: command.into(), err })?;

        // Only non-empty stdout lines count as the response
        let response: Vec<String> = String::from_utf8_lossy(&output.stdout)
            .lines()
            .filter(|l| !l.is_empty())
            .map(|l| l.to_string())
            .collect();
        log_response("BASH", command, &response);

        Ok(response)
    }

    fn close(&mut self) -> Result<(), Error> {
        // No held resources
        Ok(())
    }
}
