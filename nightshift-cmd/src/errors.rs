//  ERRORS.rs
//    by Lut99
//
//  Created:
//    08 Feb 2023, 11:23:50
//  Last edited:
//    04 Apr 2023, 14:21:35
//  Auto updated?
//    Yes
//
//  Description:
//!   Defines errors that occur in the `nightshift-cmd` crate.
//

use std::error::Error;
use std::fmt::{Display, Formatter, Result as FResult};


/***** LIBRARY *****/
/// Errors that relate to executing commands on a (possibly remote) host.
#[derive(Debug)]
pub enum ExecutorError {
    /// Failed to spawn the process that carries the command.
    SpawnError{ what: &'static str, command: String, err: std::io::Error },
    /// Failed to establish the SSH control connection.
    ConnectError{ address: String, err: std::io::Error },
    /// The SSH control connection was refused by the remote side.
    ConnectFailure{ address: String, stderr: String },
    /// Failed to cleanly terminate the SSH control connection.
    DisconnectError{ address: String, stderr: String },
    /// The executor was used after it was closed.
    ExecutorClosed{ address: String },
    /// An SSH executor was requested for a host without a known SSH user.
    MissingSshUser{ host: String },
}

impl Display for ExecutorError {
    fn fmt(&self, f: &mut Formatter<'_>) -> FResult {
        use ExecutorError::*;
        match self {
            SpawnError{ what, command, err }  => write!(f, "Failed to spawn {} process for command '{}': {}", what, command, err),
            ConnectError{ address, err }      => write!(f, "Failed to establish SSH connection to '{}': {}", address, err),
            ConnectFailure{ address, stderr } => write!(f, "SSH connection to '{}' was refused: {}", address, stderr),
            DisconnectError{ address, stderr} => write!(f, "Failed to close SSH connection to '{}': {}", address, stderr),
            ExecutorClosed{ address }         => write!(f, "Executor for '{}' was already closed", address),
            MissingSshUser{ host }            => write!(f, "No SSH user known for host '{}' (define an 'ssh-user' parameter for it)", host),
        }
    }
}

impl Error for ExecutorError {}
