//  DUMMY.rs
//    by Lut99
//
//  Created:
//    08 Feb 2023, 14:18:09
//  Last edited:
//    04 Apr 2023, 14:36:47
//  Auto updated?
//    Yes
//
//  Description:
//!   Implements a dummy command executor that only logs, for unit tests
//!   and dry runs.
//

use std::sync::{Arc, Mutex};

pub use crate::errors::ExecutorError as Error;
use crate::spec::{log_response, CommandExecutor, ExecutorFactory};


/***** TESTS *****/
#[cfg(test)]
mod tests {
    use super::*;


    #[test]
    fn test_dummy_records() {
        let factory: DummyFactory = DummyFactory::new();
        let mut cmd: Box<dyn CommandExecutor> = factory.connect("node1", Some("alice"), true).unwrap();

        assert!(cmd.execute("echo hello").unwrap().is_empty());
        cmd.close().unwrap();

        assert_eq!(*factory.log().lock().unwrap(), vec![ "echo hello".to_string(), "<close>".to_string() ]);
    }

    #[test]
    fn test_dummy_canned_response() {
        let factory: DummyFactory = DummyFactory::with_response(vec![ "still-running".into() ]);
        let mut cmd: Box<dyn CommandExecutor> = factory.connect("node1", None, false).unwrap();

        assert_eq!(cmd.execute("screen -ls").unwrap(), vec![ "still-running".to_string() ]);
    }
}





/***** LIBRARY *****/
/// A command executor that does no work: it records every command in a shared log and returns a canned response.
pub struct DummyExecutor {
    /// Identifies this executor in log lines (e.g., `DUMMY SSH -> user@host`).
    header   : String,
    /// The response every `execute()` returns.
    response : Vec<String>,
    /// The shared record of issued commands, appended to by every executor of the same factory.
    log      : Arc<Mutex<Vec<String>>>,
}

impl CommandExecutor for DummyExecutor {
    fn execute(&mut self, command: &str) -> Result<Vec<String>, Error> {
        log_response(&self.header, command, &self.response);
        self.log.lock().unwrap().push(command.into());
        Ok(self.response.clone())
    }

    fn close(&mut self) -> Result<(), Error> {
        self.log.lock().unwrap().push("<close>".into());
        Ok(())
    }
}



/// Produces DummyExecutors that share one command log.
pub struct DummyFactory {
    /// The canned response handed to every produced executor.
    response : Vec<String>,
    /// The shared command log.
    log      : Arc<Mutex<Vec<String>>>,
}

impl DummyFactory {
    /// Constructor for the DummyFactory whose executors always return an empty response.
    ///
    /// # Returns
    /// A new DummyFactory instance.
    #[inline]
    pub fn new() -> Self { Self::with_response(vec![]) }

    /// Constructor for the DummyFactory whose executors always return the given response.
    ///
    /// # Arguments
    /// - `response`: The stdout lines every produced executor returns from `execute()`.
    ///
    /// # Returns
    /// A new DummyFactory instance.
    #[inline]
    pub fn with_response(response: Vec<String>) -> Self {
        Self {
            response,
            log : Arc::new(Mutex::new(vec![])),
        }
    }

    /// Returns the shared command log, to inspect what the produced executors were asked to do.
    #[inline]
    pub fn log(&self) -> Arc<Mutex<Vec<String>>> { self.log.clone() }
}

impl Default for DummyFactory {
    #[inline]
    fn default() -> Self { Self::new() }
}

impl ExecutorFactory for DummyFactory {
    fn connect(&self, host: &str, user: Option<&str>, use_ssh: bool) -> Result<Box<dyn CommandExecutor>, Error> {
        let mut header: String = String::from("DUMMY");
        if use_ssh {
            header.push_str(&format!(" SSH -> {}@{}", user.unwrap_or("<nobody>"), host));
        }

        Ok(Box::new(DummyExecutor {
            header,
            response : self.response.clone(),
            log      : self.log.clone(),
        }))
    }
}
