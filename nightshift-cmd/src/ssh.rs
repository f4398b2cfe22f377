//  SSH.rs
//    by Lut99
//
//  Created:
//    08 Feb 2023, 13:05:44
//  Last edited:
//    04 Apr 2023, 14:31:20
//  Auto updated?
//    Yes
//
//  Description:
//!   Implements the command executor that runs commands on a remote host
//!   over an OpenSSH control-master session.
//

use std::path::PathBuf;
use std::process::{Command, Output};

use log::debug;

pub use crate::errors::ExecutorError as Error;
use crate::spec::{log_response, CommandExecutor};


/***** LIBRARY *****/
/// Executes commands on a remote host through a persistent OpenSSH session.
///
/// On construction a control-master connection is established; every `execute()` multiplexes over it, and `close()` tears it down. This mirrors the one-connection-per-host lifecycle the runtime expects.
pub struct SshExecutor {
    /// The `user@host` address of the remote side.
    address      : String,
    /// The path of the control socket for this session.
    control_path : PathBuf,
    /// Whether `close()` has been called.
    closed       : bool,
}

impl SshExecutor {
    /// Establishes a new SSH control-master connection to the given host.
    ///
    /// # Arguments
    /// - `user`: The user to log in as.
    /// - `host`: The host to connect to.
    ///
    /// # Returns
    /// A new SshExecutor with a live connection.
    ///
    /// # Errors
    /// This function errors if the `ssh` process could not be spawned or the remote side refused the connection.
    pub fn connect(user: impl Into<String>, host: impl Into<String>) -> Result<Self, Error> {
        let address: String = format!("{}@{}", user.into(), host.into());

        // One socket per (address, pid) so parallel orchestrator instances do not collide
        let control_path: PathBuf = std::env::temp_dir().join(format!("nightshift-{}-{}.sock", address.replace('@', "-"), std::process::id()));

        // Start the control master; '-fN' backgrounds it without running a remote command
        let output: Output = Command::new("ssh")
            .args([ "-fN", "-o", "ControlMaster=yes", "-o", "BatchMode=yes", "-o" ])
            .arg(format!("ControlPath={}", control_path.display()))
            .arg(&address)
            .output()
            .map_err(|err| Error::ConnectError{ address: address.clone(), err })?;
        if !output.status.success() {
            return Err(Error::ConnectFailure{ address, stderr: String::from_utf8_lossy(&output.stderr).trim().into() });
        }

        debug!("SSH -> {}: Connection established.", address);
        Ok(Self {
            address,
            control_path,
            closed : false,
        })
    }
}

impl CommandExecutor for SshExecutor {
    fn execute(&mut self, command: &str) -> Result<Vec<String>, Error> {
        if self.closed {
            return Err(Error::ExecutorClosed{ address: self.address.clone() });
        }

        // Multiplex the command over the control connection
        let output: Output = Command::new("ssh")
            .arg("-o")
            .arg(format!("ControlPath={}", self.control_path.display()))
            .arg(&self.address)
            .arg("--")
            .arg(command)
            .output()
            .map_err(|err| Error::SpawnError{ what: "ssh", command: command.into(), err })?;

        let response: Vec<String> = String::from_utf8_lossy(&output.stdout)
            .lines()
            .filter(|l| !l.is_empty())
            .map(|l| l.to_string())
            .collect();
        log_response(&format!("SSH -> {}", self.address), command, &response);

        Ok(response)
    }

    fn close(&mut self) -> Result<(), Error> {
        if self.closed {
            return Ok(());
        }
        self.closed = true;

        // Ask the control master to exit
        let output: Output = Command::new("ssh")
            .arg("-O")
            .arg("exit")
            .arg("-o")
            .arg(format!("ControlPath={}", self.control_path.display()))
            .arg(&self.address)
            .output()
            .map_err(|err| Error::SpawnError{ what: "ssh", command: "<control exit>".into(), err })?;
        if !output.status.success() {
            return Err(Error::DisconnectError{ address: self.address.clone(), stderr: String::from_utf8_lossy(&output.stderr).trim().into() });
        }

        debug!("SSH -> {}: Connection closed.", self.address);
        Ok(())
    }
}
