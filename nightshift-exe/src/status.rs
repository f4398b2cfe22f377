//  STATUS.rs
//    by Lut99
//
//  Created:
//    09 Feb 2023, 11:31:46
//  Last edited:
//    04 Apr 2023, 15:30:12
//  Auto updated?
//    Yes
//
//  Description:
//!   Implements the non-blocking completion predicates returned by
//!   executed tasks and phases.
//

use chrono::{DateTime, Duration, Local};
use log::{error, warn};

use crate::pool::ExecutorPool;


/***** TESTS *****/
#[cfg(test)]
mod tests {
    use nightshift_cmd::DummyFactory;
    use super::*;


    /// Builds an empty pool over a dummy factory.
    fn dummy_pool() -> ExecutorPool {
        ExecutorPool::new(Box::new(DummyFactory::new()))
    }


    #[test]
    fn test_done_not_done() {
        let mut pool: ExecutorPool = dummy_pool();
        let now: DateTime<Local> = Local::now();

        assert!(Status::Done.poll(now, &mut pool));
        assert!(!Status::NotDone.poll(now, &mut pool));
    }

    #[test]
    fn test_timer() {
        let mut pool: ExecutorPool = dummy_pool();
        let now: DateTime<Local> = Local::now();

        let mut status: Status = Status::Timer{ deadline: now + Duration::seconds(2) };
        assert!(!status.poll(now, &mut pool));
        assert!(!status.poll(now + Duration::seconds(1), &mut pool));
        assert!(status.poll(now + Duration::seconds(2), &mut pool));
    }

    #[test]
    fn test_all_waits_for_every_member() {
        let mut pool: ExecutorPool = dummy_pool();
        let now: DateTime<Local> = Local::now();

        let mut status: Status = Status::All(vec![
            Status::Done,
            Status::Timer{ deadline: now + Duration::seconds(1) },
            Status::Timer{ deadline: now + Duration::seconds(3) },
        ]);

        assert!(!status.poll(now, &mut pool));
        // Re-polling already-done members must not change the outcome
        assert!(!status.poll(now + Duration::seconds(2), &mut pool));
        assert!(!status.poll(now + Duration::seconds(2), &mut pool));
        assert!(status.poll(now + Duration::seconds(3), &mut pool));
        // And stays done
        assert!(status.poll(now + Duration::seconds(4), &mut pool));
    }

    #[test]
    fn test_all_empty_is_done() {
        let mut pool: ExecutorPool = dummy_pool();
        assert!(Status::All(vec![]).poll(Local::now(), &mut pool));
    }

    #[test]
    fn test_screen_done_when_session_gone() {
        // The dummy executor returns no output, i.e., no such session
        let factory: DummyFactory = DummyFactory::new();
        let log = factory.log();
        let mut pool: ExecutorPool = ExecutorPool::new(Box::new(factory));
        let now: DateTime<Local> = Local::now();

        let mut status: Status = Status::Screen(ScreenStatus::new("h1", false, "job", Duration::seconds(5), Duration::minutes(1), now));
        assert!(status.poll(now, &mut pool));
        assert_eq!(*log.lock().unwrap(), vec![ "screen -ls 'job' | grep 'job'".to_string() ]);
    }

    #[test]
    fn test_screen_respects_check_interval() {
        let factory: DummyFactory = DummyFactory::with_response(vec![ "1234.job (Detached)".into() ]);
        let log = factory.log();
        let mut pool: ExecutorPool = ExecutorPool::new(Box::new(factory));
        let now: DateTime<Local> = Local::now();

        let mut status: Status = Status::Screen(ScreenStatus::new("h1", false, "job", Duration::seconds(10), Duration::minutes(5), now));
        assert!(!status.poll(now, &mut pool));
        // Within the interval no new check is issued
        assert!(!status.poll(now + Duration::seconds(5), &mut pool));
        assert_eq!(log.lock().unwrap().len(), 1);
        // After the interval it checks again
        assert!(!status.poll(now + Duration::seconds(10), &mut pool));
        assert_eq!(log.lock().unwrap().len(), 2);
    }

    #[test]
    fn test_screen_force_quit_on_timeout() {
        let factory: DummyFactory = DummyFactory::with_response(vec![ "1234.job (Detached)".into() ]);
        let log = factory.log();
        let mut pool: ExecutorPool = ExecutorPool::new(Box::new(factory));
        let now: DateTime<Local> = Local::now();

        let mut status: Status = Status::Screen(ScreenStatus::new("h1", false, "job", Duration::seconds(1), Duration::seconds(30), now));
        assert!(!status.poll(now, &mut pool));

        // Past the timeout, the session is killed and the status reports done
        assert!(status.poll(now + Duration::seconds(30), &mut pool));
        assert_eq!(log.lock().unwrap().last().unwrap(), "screen -X -S 'job' quit");
        // And stays done without further commands
        let n_commands: usize = log.lock().unwrap().len();
        assert!(status.poll(now + Duration::seconds(31), &mut pool));
        assert_eq!(log.lock().unwrap().len(), n_commands);
    }
}





/***** AUXILLARY *****/
/// The status of a launched screen session, polled at a fixed interval.
#[derive(Debug)]
pub struct ScreenStatus {
    /// The host the session runs on.
    host       : String,
    /// Whether the session's host is reached over SSH.
    use_ssh    : bool,
    /// The name of the screen session.
    session    : String,
    /// How often to check for session existence, at most.
    interval   : Duration,
    /// The moment the session is forcibly terminated if it has not exited by itself.
    force_quit : DateTime<Local>,
    /// The next moment a check is due.
    next_check : DateTime<Local>,
    /// Whether the session is known to have ended.
    done       : bool,
}

impl ScreenStatus {
    /// Constructor for the ScreenStatus.
    ///
    /// # Arguments
    /// - `host`: The host the session runs on.
    /// - `use_ssh`: Whether that host is reached over SSH.
    /// - `session`: The name of the screen session to watch.
    /// - `interval`: The minimum time between two existence checks.
    /// - `timeout`: How long the session may live before it is forcibly terminated.
    /// - `now`: The current moment, i.e., when the session was launched.
    ///
    /// # Returns
    /// A new ScreenStatus instance that is due for its first check immediately.
    pub fn new(host: impl Into<String>, use_ssh: bool, session: impl Into<String>, interval: Duration, timeout: Duration, now: DateTime<Local>) -> Self {
        Self {
            host       : host.into(),
            use_ssh,
            session    : session.into(),
            interval,
            force_quit : now + timeout,
            next_check : now,
            done       : false,
        }
    }

    /// Polls whether the session still exists, at most once per interval.
    ///
    /// An executor failure during the check is logged and counts as no progress this tick, so the status can be polled again later.
    fn poll(&mut self, now: DateTime<Local>, pool: &mut ExecutorPool) -> bool {
        if self.done || now < self.next_check {
            return self.done;
        }

        // Ask the host whether the session is still listed
        let response: Vec<String> = {
            let cmd = match pool.get(&self.host, self.use_ssh) {
                Ok(cmd)  => cmd,
                Err(err) => { error!("Failed to get executor for host '{}': {}", self.host, err); return false; },
            };
            match cmd.execute(&format!("screen -ls '{0}' | grep '{0}'", self.session)) {
                Ok(response) => response,
                Err(err)     => { error!("Failed to check screen session '{}' on host '{}': {}", self.session, self.host, err); return false; },
            }
        };
        self.done = response.is_empty();
        self.next_check = self.next_check + self.interval;

        // Timed-out sessions are killed rather than waited on forever
        if !self.done && now >= self.force_quit {
            warn!("Screen session '{}' on host '{}' exceeded its timeout; forcing termination.", self.session, self.host);
            match pool.get(&self.host, self.use_ssh) {
                Ok(cmd) => {
                    if let Err(err) = cmd.execute(&format!("screen -X -S '{}' quit", self.session)) {
                        error!("Failed to terminate screen session '{}' on host '{}': {}", self.session, self.host, err);
                    }
                },
                Err(err) => { error!("Failed to get executor for host '{}': {}", self.host, err); },
            }
            self.done = true;
        }

        self.done
    }
}





/***** LIBRARY *****/
/// A non-blocking completion predicate, as returned by an executed task or a phase.
#[derive(Debug)]
pub enum Status {
    /// Immediately complete (fire-and-forget tasks).
    Done,
    /// Never complete; placeholder for tasks whose execution failed.
    NotDone,
    /// Complete once the current time reaches the deadline.
    Timer{ deadline: DateTime<Local> },
    /// Complete once a screen session no longer exists (or its timeout forces termination).
    Screen(ScreenStatus),
    /// Complete once every member is complete. Prunes finished members on every poll, so it must be polled from one place only.
    All(Vec<Status>),
}

impl Status {
    /// Polls whether this status is complete, given the current time.
    ///
    /// Never blocks beyond a single command-executor round trip (for screen checks).
    ///
    /// # Arguments
    /// - `now`: The current moment; injected so tests can simulate time.
    /// - `pool`: The experiment's executor pool, used by externally-polled statuses.
    ///
    /// # Returns
    /// Whether the underlying work has completed.
    pub fn poll(&mut self, now: DateTime<Local>, pool: &mut ExecutorPool) -> bool {
        use Status::*;
        match self {
            Done               => true,
            NotDone            => false,
            Timer{ deadline }  => now >= *deadline,
            Screen(screen)     => screen.poll(now, pool),

            All(members) => {
                // Keep only the members that are still pending
                let mut pending: Vec<Status> = Vec::with_capacity(members.len());
                for mut member in members.drain(..) {
                    if !member.poll(now, pool) {
                        pending.push(member);
                    }
                }
                *members = pending;
                members.is_empty()
            },
        }
    }
}
