//  POOL.rs
//    by Lut99
//
//  Created:
//    09 Feb 2023, 10:44:12
//  Last edited:
//    04 Apr 2023, 15:22:03
//  Auto updated?
//    Yes
//
//  Description:
//!   Implements the per-experiment executor pool, which owns one command
//!   executor per (host, SSH-usage) pair and tears them down exactly once.
//

use std::collections::hash_map::Entry;
use std::collections::HashMap;

use log::{debug, error};

use nightshift_cmd::{CommandExecutor, Error, ExecutorFactory};


/***** TESTS *****/
#[cfg(test)]
mod tests {
    use std::sync::{Arc, Mutex};
    use nightshift_cmd::DummyFactory;
    use super::*;


    #[test]
    fn test_pool_reuses_and_closes_once() {
        let factory: DummyFactory = DummyFactory::new();
        let log: Arc<Mutex<Vec<String>>> = factory.log();

        let mut pool: ExecutorPool = ExecutorPool::new(Box::new(factory));
        pool.get("h1", true).unwrap().execute("one").unwrap();
        pool.get("h1", true).unwrap().execute("two").unwrap();
        pool.get("h1", false).unwrap().execute("three").unwrap();

        // Two distinct executors were created; closing twice only closes them once
        pool.close();
        pool.close();

        let log: Vec<String> = log.lock().unwrap().clone();
        assert_eq!(&log[..3], &[ "one".to_string(), "two".to_string(), "three".to_string() ]);
        assert_eq!(log.iter().filter(|l| l.as_str() == "<close>").count(), 2);
    }

    #[test]
    fn test_pool_closed_pool_refuses() {
        let mut pool: ExecutorPool = ExecutorPool::new(Box::new(DummyFactory::new()));
        pool.close();
        assert!(pool.get("h1", false).is_err());
    }
}





/***** LIBRARY *****/
/// Owns the command executors of one experiment, keyed by (host, SSH-usage).
///
/// Executors are connected lazily on first use and reused by every task of the experiment targeting the same host. `close()` releases all of them; it is idempotent and also runs on drop, so connections are closed exactly once on every exit path.
pub struct ExecutorPool {
    /// The factory that produces new executors.
    factory   : Box<dyn ExecutorFactory>,
    /// The SSH user per host, as far as the experiment's parameters define one.
    ssh_users : HashMap<String, String>,
    /// The live executors.
    executors : HashMap<(String, bool), Box<dyn CommandExecutor>>,
    /// Whether this pool has been torn down.
    closed    : bool,
}

impl ExecutorPool {
    /// Constructor for the ExecutorPool.
    ///
    /// # Arguments
    /// - `factory`: The factory used to connect new executors.
    ///
    /// # Returns
    /// A new, empty ExecutorPool instance.
    #[inline]
    pub fn new(factory: Box<dyn ExecutorFactory>) -> Self {
        Self {
            factory,
            ssh_users : HashMap::new(),
            executors : HashMap::new(),
            closed    : false,
        }
    }

    /// Registers the SSH user to connect as for the given host.
    ///
    /// # Arguments
    /// - `host`: The host in question.
    /// - `user`: The user to connect as when an SSH executor is requested for it.
    #[inline]
    pub fn set_ssh_user(&mut self, host: impl Into<String>, user: impl Into<String>) {
        self.ssh_users.insert(host.into(), user.into());
    }

    /// Returns the executor for the given host, connecting it first if this is its first use.
    ///
    /// # Arguments
    /// - `host`: The host to execute on.
    /// - `use_ssh`: Whether commands should travel over SSH.
    ///
    /// # Returns
    /// A mutable handle to the (possibly cached) executor.
    ///
    /// # Errors
    /// This function errors if a new executor had to be connected and that failed, or if the pool was already torn down.
    pub fn get(&mut self, host: &str, use_ssh: bool) -> Result<&mut dyn CommandExecutor, Error> {
        if self.closed {
            return Err(Error::ExecutorClosed{ address: host.into() });
        }

        match self.executors.entry((host.into(), use_ssh)) {
            Entry::Occupied(entry) => Ok(entry.into_mut().as_mut()),
            Entry::Vacant(entry)   => {
                debug!("Connecting executor for host '{}' (ssh: {})...", host, use_ssh);
                let executor: Box<dyn CommandExecutor> = self.factory.connect(host, self.ssh_users.get(host).map(|u| u.as_str()), use_ssh)?;
                Ok(entry.insert(executor).as_mut())
            },
        }
    }

    /// Tears the pool down, closing every held executor.
    ///
    /// Idempotent: only the first call does work. Close failures are logged, not propagated, so teardown always completes.
    pub fn close(&mut self) {
        if self.closed { return; }
        self.closed = true;

        for ((host, use_ssh), mut executor) in self.executors.drain() {
            if let Err(err) = executor.close() {
                error!("Failed to close executor for host '{}' (ssh: {}): {}", host, use_ssh, err);
            }
        }
    }
}

impl Drop for ExecutorPool {
    fn drop(&mut self) {
        self.close();
    }
}
