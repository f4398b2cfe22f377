//  TASK.rs
//    by Lut99
//
//  Created:
//    10 Feb 2023, 09:02:33
//  Last edited:
//    04 Apr 2023, 15:48:26
//  Auto updated?
//    Yes
//
//  Description:
//!   Implements the five task variants (bash, echo, mkdir, screen, sleep)
//!   and the factory that builds them from raw descriptor entries.
//

use chrono::{DateTime, Duration, Local};
use log::warn;
use serde_json::{Map, Value as JValue};

use nightshift_shr::time::parse_timespan;
use nightshift_shr::utilities::coerce_bool;

pub use crate::errors::TaskError as Error;
use crate::parameters::Parameters;
use crate::pool::ExecutorPool;
use crate::status::{ScreenStatus, Status};


/***** TESTS *****/
#[cfg(test)]
mod tests {
    use std::sync::{Arc, Mutex};
    use nightshift_cmd::DummyFactory;
    use serde_json::json;
    use super::*;


    /// Builds a task from the given raw entry, for host "h1".
    fn create(entry: serde_json::Value) -> Result<Option<Task>, Error> {
        Task::try_create("h1", &entry)
    }

    /// Builds a Parameters over host "h1" with one common value `dir = /tmp/x`.
    fn params() -> Parameters {
        let section = serde_json::from_value(json!({ "common": { "dir": "/tmp/x" } })).unwrap();
        Parameters::new("test", &[ "h1".into() ], &section).unwrap()
    }

    /// Builds a dummy-backed pool and its shared command log.
    fn pool() -> (ExecutorPool, Arc<Mutex<Vec<String>>>) {
        let factory: DummyFactory = DummyFactory::new();
        let log = factory.log();
        (ExecutorPool::new(Box::new(factory)), log)
    }


    #[test]
    fn test_factory_dispatch() {
        assert!(matches!(create(json!({ "type": "bash", "parameters": { "command": "ls" } })).unwrap(), Some(Task::Bash(_))));
        assert!(matches!(create(json!({ "type": "sleep", "parameters": { "time": "5s" } })).unwrap(), Some(Task::Sleep(_))));

        // Unknown types are skipped, not errors
        assert!(create(json!({ "type": "teleport", "parameters": {} })).unwrap().is_none());
        // Entries without a type are skipped too
        assert!(create(json!({ "parameters": {} })).unwrap().is_none());
    }

    #[test]
    fn test_factory_case_insensitive_keys() {
        let task: Task = create(json!({ "Type": "bash", "SSH": false, "Parameters": { "command": "ls" } })).unwrap().unwrap();
        assert!(!task.use_ssh());
        assert_eq!(task.host(), "h1");
    }

    #[test]
    fn test_validation_errors() {
        // Missing required parameter
        assert!(matches!(create(json!({ "type": "bash", "parameters": {} })), Err(Error::MissingParameter{ task: "bash", name: "command" })));
        // Wrong type
        assert!(matches!(create(json!({ "type": "echo", "parameters": { "file": 42, "lines": [] } })), Err(Error::ParameterTypeError{ task: "echo", name: "file", .. })));
        assert!(matches!(create(json!({ "type": "mkdir", "parameters": { "paths": "/tmp" } })), Err(Error::ParameterTypeError{ task: "mkdir", name: "paths", .. })));
        // Bad timespan format
        assert!(matches!(create(json!({ "type": "sleep", "parameters": { "time": "soon" } })), Err(Error::ParameterFormatError{ task: "sleep", name: "time", .. })));
        // ...but placeholders defer the format check to execution time
        assert!(create(json!({ "type": "sleep", "parameters": { "time": "{{pause}}" } })).unwrap().is_some());
    }

    #[test]
    fn test_bash_resolves_and_fires() {
        let (mut pool, log) = pool();
        let task: Task = create(json!({ "type": "bash", "parameters": { "command": "ls {{dir}} on {{host}}" } })).unwrap().unwrap();

        let status: Status = task.execute(&params(), &mut pool, Local::now()).unwrap();
        assert!(matches!(status, Status::Done));
        assert_eq!(*log.lock().unwrap(), vec![ "ls /tmp/x on h1".to_string() ]);
    }

    #[test]
    fn test_echo_overwrite_then_append() {
        let (mut pool, log) = pool();
        let task: Task = create(json!({ "type": "echo", "parameters": { "file": "{{dir}}/out.txt", "lines": [ "one", "two" ], "overwrite": true } })).unwrap().unwrap();

        task.execute(&params(), &mut pool, Local::now()).unwrap();
        assert_eq!(*log.lock().unwrap(), vec![
            "echo \"one\" > /tmp/x/out.txt".to_string(),
            "echo \"two\" >> /tmp/x/out.txt".to_string(),
        ]);
    }

    #[test]
    fn test_echo_append_by_default() {
        let (mut pool, log) = pool();
        let task: Task = create(json!({ "type": "echo", "parameters": { "file": "f", "lines": [ "one" ] } })).unwrap().unwrap();

        task.execute(&params(), &mut pool, Local::now()).unwrap();
        assert_eq!(*log.lock().unwrap(), vec![ "echo \"one\" >> f".to_string() ]);
    }

    #[test]
    fn test_mkdir_cleans_by_default() {
        let (mut pool, log) = pool();
        let task: Task = create(json!({ "type": "mkdir", "parameters": { "paths": [ "/tmp/{{host}}" ] } })).unwrap().unwrap();

        task.execute(&params(), &mut pool, Local::now()).unwrap();
        assert_eq!(*log.lock().unwrap(), vec![ "mkdir -p /tmp/h1 && rm -rf /tmp/h1/*".to_string() ]);
    }

    #[test]
    fn test_mkdir_without_clean() {
        let (mut pool, log) = pool();
        let task: Task = create(json!({ "type": "mkdir", "parameters": { "paths": [ "/tmp/a" ], "clean": false } })).unwrap().unwrap();

        task.execute(&params(), &mut pool, Local::now()).unwrap();
        assert_eq!(*log.lock().unwrap(), vec![ "mkdir -p /tmp/a".to_string() ]);
    }

    #[test]
    fn test_sleep_returns_timer() {
        let (mut pool, _) = pool();
        let task: Task = create(json!({ "type": "sleep", "parameters": { "time": "2s" } })).unwrap().unwrap();

        let now: DateTime<Local> = Local::now();
        let mut status: Status = task.execute(&params(), &mut pool, now).unwrap();
        // The deadline counts from execution, not construction
        assert!(!status.poll(now + Duration::seconds(1), &mut pool));
        assert!(status.poll(now + Duration::seconds(2), &mut pool));
    }

    #[test]
    fn test_screen_launches_detached() {
        let (mut pool, log) = pool();
        let task: Task = create(json!({ "type": "screen", "parameters": { "name": "job-{{host}}", "command": "run.sh", "timeout": "1h", "wait-for-termination": false } })).unwrap().unwrap();

        let status: Status = task.execute(&params(), &mut pool, Local::now()).unwrap();
        assert!(matches!(status, Status::Done));
        assert_eq!(*log.lock().unwrap(), vec![ "screen -m -d -S 'job-h1' bash -c 'run.sh'".to_string() ]);
    }

    #[test]
    fn test_screen_waits_by_default() {
        let (mut pool, _) = pool();
        let task: Task = create(json!({ "type": "screen", "parameters": { "name": "job", "command": "run.sh", "timeout": "1h" } })).unwrap().unwrap();

        let status: Status = task.execute(&params(), &mut pool, Local::now()).unwrap();
        assert!(matches!(status, Status::Screen(_)));
    }
}





/***** HELPER FUNCTIONS *****/
/// Fetches a required string parameter from the given map.
fn required_str(task: &'static str, params: &Map<String, JValue>, name: &'static str) -> Result<String, Error> {
    match params.get(name) {
        Some(JValue::String(value)) => Ok(value.clone()),
        Some(_)                     => Err(Error::ParameterTypeError{ task, name, expected: "string" }),
        None                        => Err(Error::MissingParameter{ task, name }),
    }
}

/// Fetches a required list-of-strings parameter from the given map.
fn required_str_list(task: &'static str, params: &Map<String, JValue>, name: &'static str) -> Result<Vec<String>, Error> {
    match params.get(name) {
        Some(JValue::Array(values)) => values.iter().map(|v| match v {
            JValue::String(s) => Ok(s.clone()),
            _                 => Err(Error::ParameterTypeError{ task, name, expected: "list of strings" }),
        }).collect(),
        Some(_)                     => Err(Error::ParameterTypeError{ task, name, expected: "list of strings" }),
        None                        => Err(Error::MissingParameter{ task, name }),
    }
}

/// Fetches an optional boolean parameter, coerced leniently.
fn optional_bool(params: &Map<String, JValue>, name: &str, default: bool) -> bool {
    params.get(name).map(coerce_bool).unwrap_or(default)
}

/// Checks that the given value matches the timespan grammar, unless it contains a placeholder (in which case the check is deferred to execution time).
fn check_timespan_format(task: &'static str, name: &'static str, value: &str) -> Result<(), Error> {
    if value.contains("{{") { return Ok(()); }
    if let Err(err) = parse_timespan(value) {
        return Err(Error::ParameterFormatError{ task, name, raw: value.into(), err });
    }
    Ok(())
}

/// Resolves a timespan parameter for a host and parses it.
fn resolve_timespan(task: &'static str, raw: &str, host: &str, parameters: &Parameters) -> Result<Duration, Error> {
    let resolved: String = parameters.resolve(host, raw).map_err(|err| Error::ResolveError{ err })?;
    parse_timespan(&resolved).map_err(|err| Error::TimespanParseError{ task, raw: resolved, err })
}





/***** LIBRARY *****/
/// One concrete, host-bound unit of work.
///
/// Tasks are built once per phase load and may be executed once per repetition; every execution returns a fresh Status.
#[derive(Clone, Debug)]
pub enum Task {
    /// Fire a shell command and forget about it.
    Bash(BashTask),
    /// Write lines to a file with `echo`.
    Echo(EchoTask),
    /// Create (and by default clear) directories.
    MkDir(MkDirTask),
    /// Launch a command in a detached screen session, optionally awaiting its termination.
    Screen(ScreenTask),
    /// Wait a fixed amount of time.
    Sleep(SleepTask),
}

impl Task {
    /// Attempts to build a Task from a raw descriptor entry.
    ///
    /// Entries without a `type`, or with a type this runtime does not know, are skipped with at most a warning; this leniency is deliberate and distinct from validation failures.
    ///
    /// # Arguments
    /// - `host`: The host this instantiation of the task is bound to.
    /// - `entry`: The raw JSON task object.
    ///
    /// # Returns
    /// The new Task, or `None` if the entry is to be skipped.
    ///
    /// # Errors
    /// This function errors if the entry's type is recognized but its declared parameters do not validate.
    pub fn try_create(host: &str, entry: &JValue) -> Result<Option<Self>, Error> {
        // Only objects can describe tasks
        let raw: &Map<String, JValue> = match entry.as_object() {
            Some(raw) => raw,
            None      => {
                warn!("Task entry is not an object. Task will be ignored.");
                return Ok(None);
            },
        };

        // Structural keys are case-insensitive
        let mut fields: Map<String, JValue> = Map::new();
        for (key, value) in raw {
            fields.insert(key.to_lowercase(), value.clone());
        }

        let kind: String = match fields.get("type").and_then(|v| v.as_str()) {
            Some(kind) => kind.into(),
            None       => { return Ok(None); },
        };
        let use_ssh: bool = optional_bool(&fields, "ssh", true);
        let params: Map<String, JValue> = fields.get("parameters").and_then(|v| v.as_object()).cloned().unwrap_or_default();
        let host: String = host.into();

        match kind.as_str() {
            "bash"   => Ok(Some(Self::Bash(BashTask::new(host, use_ssh, &params)?))),
            "echo"   => Ok(Some(Self::Echo(EchoTask::new(host, use_ssh, &params)?))),
            "mkdir"  => Ok(Some(Self::MkDir(MkDirTask::new(host, use_ssh, &params)?))),
            "screen" => Ok(Some(Self::Screen(ScreenTask::new(host, use_ssh, &params)?))),
            "sleep"  => Ok(Some(Self::Sleep(SleepTask::new(host, use_ssh, &params)?))),

            unknown => {
                warn!("'{}' is not a known task type. Task will be ignored.", unknown);
                Ok(None)
            },
        }
    }

    /// Returns the host this task is bound to.
    #[inline]
    pub fn host(&self) -> &str {
        use Task::*;
        match self {
            Bash(task)   => &task.host,
            Echo(task)   => &task.host,
            MkDir(task)  => &task.host,
            Screen(task) => &task.host,
            Sleep(task)  => &task.host,
        }
    }

    /// Returns whether this task's commands travel over SSH.
    #[inline]
    pub fn use_ssh(&self) -> bool {
        use Task::*;
        match self {
            Bash(task)   => task.use_ssh,
            Echo(task)   => task.use_ssh,
            MkDir(task)  => task.use_ssh,
            Screen(task) => task.use_ssh,
            Sleep(task)  => task.use_ssh,
        }
    }

    /// Returns the name of this task's kind, for logging.
    #[inline]
    pub fn kind(&self) -> &'static str {
        use Task::*;
        match self {
            Bash(_)   => "bash",
            Echo(_)   => "echo",
            MkDir(_)  => "mkdir",
            Screen(_) => "screen",
            Sleep(_)  => "sleep",
        }
    }

    /// Executes this task once: resolves its parameters, issues its commands and returns a fresh Status.
    ///
    /// # Arguments
    /// - `parameters`: The experiment's parameter namespace, used to resolve placeholders for this task's host.
    /// - `pool`: The experiment's executor pool to issue commands through.
    /// - `now`: The current moment; deadlines count from here.
    ///
    /// # Returns
    /// The Status describing when this task's work completes.
    ///
    /// # Errors
    /// This function errors if a parameter fails to resolve or a command could not be issued.
    pub fn execute(&self, parameters: &Parameters, pool: &mut ExecutorPool, now: DateTime<Local>) -> Result<Status, Error> {
        use Task::*;
        match self {
            Bash(task)   => task.execute(parameters, pool),
            Echo(task)   => task.execute(parameters, pool),
            MkDir(task)  => task.execute(parameters, pool),
            Screen(task) => task.execute(parameters, pool, now),
            Sleep(task)  => task.execute(parameters, now),
        }
    }
}



/// Fires a single shell command, verbatim, and completes immediately.
#[derive(Clone, Debug)]
pub struct BashTask {
    host    : String,
    use_ssh : bool,
    /// The command line to fire.
    command : String,
}

impl BashTask {
    /// Constructor for the BashTask, which validates its declared parameters.
    fn new(host: String, use_ssh: bool, params: &Map<String, JValue>) -> Result<Self, Error> {
        Ok(Self {
            host,
            use_ssh,
            command : required_str("bash", params, "command")?,
        })
    }

    fn execute(&self, parameters: &Parameters, pool: &mut ExecutorPool) -> Result<Status, Error> {
        let command: String = parameters.resolve(&self.host, &self.command).map_err(|err| Error::ResolveError{ err })?;

        let cmd = pool.get(&self.host, self.use_ssh).map_err(|err| Error::ExecutorError{ err })?;
        cmd.execute(&command).map_err(|err| Error::ExecutorError{ err })?;
        Ok(Status::Done)
    }
}



/// Writes lines to a file on the task's host.
#[derive(Clone, Debug)]
pub struct EchoTask {
    host      : String,
    use_ssh   : bool,
    /// The file to write to.
    file      : String,
    /// The lines to write, in order.
    lines     : Vec<String>,
    /// Whether the first line truncates the file (subsequent lines always append).
    overwrite : bool,
}

impl EchoTask {
    /// Constructor for the EchoTask, which validates its declared parameters.
    fn new(host: String, use_ssh: bool, params: &Map<String, JValue>) -> Result<Self, Error> {
        Ok(Self {
            host,
            use_ssh,
            file      : required_str("echo", params, "file")?,
            lines     : required_str_list("echo", params, "lines")?,
            overwrite : optional_bool(params, "overwrite", false),
        })
    }

    fn execute(&self, parameters: &Parameters, pool: &mut ExecutorPool) -> Result<Status, Error> {
        let file: String = parameters.resolve(&self.host, &self.file).map_err(|err| Error::ResolveError{ err })?;
        let lines: Vec<String> = parameters.resolve_all(&self.host, &self.lines).map_err(|err| Error::ResolveError{ err })?;

        let cmd = pool.get(&self.host, self.use_ssh).map_err(|err| Error::ExecutorError{ err })?;
        for (i, line) in lines.iter().enumerate() {
            let operator: &str = if i == 0 && self.overwrite { ">" } else { ">>" };
            cmd.execute(&format!("echo \"{}\" {} {}", line, operator, file)).map_err(|err| Error::ExecutorError{ err })?;
        }
        Ok(Status::Done)
    }
}



/// Creates directories (with parents), by default clearing any existing contents.
#[derive(Clone, Debug)]
pub struct MkDirTask {
    host    : String,
    use_ssh : bool,
    /// The directories to create.
    paths   : Vec<String>,
    /// Whether to clear existing contents.
    clean   : bool,
}

impl MkDirTask {
    /// Constructor for the MkDirTask, which validates its declared parameters.
    fn new(host: String, use_ssh: bool, params: &Map<String, JValue>) -> Result<Self, Error> {
        Ok(Self {
            host,
            use_ssh,
            paths : required_str_list("mkdir", params, "paths")?,
            clean : optional_bool(params, "clean", true),
        })
    }

    fn execute(&self, parameters: &Parameters, pool: &mut ExecutorPool) -> Result<Status, Error> {
        let cmd = pool.get(&self.host, self.use_ssh).map_err(|err| Error::ExecutorError{ err })?;
        for path in &self.paths {
            let path: String = parameters.resolve(&self.host, path).map_err(|err| Error::ResolveError{ err })?;
            let command: String = if self.clean {
                format!("mkdir -p {0} && rm -rf {0}/*", path)
            } else {
                format!("mkdir -p {}", path)
            };
            cmd.execute(&command).map_err(|err| Error::ExecutorError{ err })?;
        }
        Ok(Status::Done)
    }
}



/// Launches a command inside a detached, named screen session.
#[derive(Clone, Debug)]
pub struct ScreenTask {
    host                 : String,
    use_ssh              : bool,
    /// The name of the session.
    name                 : String,
    /// The command to run inside it.
    command              : String,
    /// How long the session may live (timespan format, may contain placeholders).
    timeout              : String,
    /// Whether the returned Status awaits the session's termination.
    wait_for_termination : bool,
    /// How often to check for termination (timespan format, may contain placeholders).
    check_interval       : String,
}

impl ScreenTask {
    /// Constructor for the ScreenTask, which validates its declared parameters.
    fn new(host: String, use_ssh: bool, params: &Map<String, JValue>) -> Result<Self, Error> {
        let timeout: String = required_str("screen", params, "timeout")?;
        check_timespan_format("screen", "timeout", &timeout)?;

        let check_interval: String = match params.get("check-termination-interval") {
            Some(JValue::String(value)) => value.clone(),
            Some(_)                     => { return Err(Error::ParameterTypeError{ task: "screen", name: "check-termination-interval", expected: "string" }); },
            None                        => "1m".into(),
        };
        check_timespan_format("screen", "check-termination-interval", &check_interval)?;

        Ok(Self {
            host,
            use_ssh,
            name                 : required_str("screen", params, "name")?,
            command              : required_str("screen", params, "command")?,
            timeout,
            wait_for_termination : optional_bool(params, "wait-for-termination", true),
            check_interval,
        })
    }

    fn execute(&self, parameters: &Parameters, pool: &mut ExecutorPool, now: DateTime<Local>) -> Result<Status, Error> {
        let name: String = parameters.resolve(&self.host, &self.name).map_err(|err| Error::ResolveError{ err })?;
        let command: String = parameters.resolve(&self.host, &self.command).map_err(|err| Error::ResolveError{ err })?;

        // Launch the session; waiting (if any) is expressed through the returned Status, never by blocking
        let cmd = pool.get(&self.host, self.use_ssh).map_err(|err| Error::ExecutorError{ err })?;
        cmd.execute(&format!("screen -m -d -S '{}' bash -c '{}'", name, command)).map_err(|err| Error::ExecutorError{ err })?;

        if !self.wait_for_termination {
            return Ok(Status::Done);
        }

        let interval: Duration = resolve_timespan("screen", &self.check_interval, &self.host, parameters)?;
        let timeout: Duration = resolve_timespan("screen", &self.timeout, &self.host, parameters)?;
        Ok(Status::Screen(ScreenStatus::new(self.host.clone(), self.use_ssh, name, interval, timeout, now)))
    }
}



/// Waits a fixed amount of time, counted from execution.
#[derive(Clone, Debug)]
pub struct SleepTask {
    host    : String,
    use_ssh : bool,
    /// How long to wait (timespan format, may contain placeholders).
    time    : String,
}

impl SleepTask {
    /// Constructor for the SleepTask, which validates its declared parameters.
    fn new(host: String, use_ssh: bool, params: &Map<String, JValue>) -> Result<Self, Error> {
        let time: String = required_str("sleep", params, "time")?;
        check_timespan_format("sleep", "time", &time)?;

        Ok(Self {
            host,
            use_ssh,
            time,
        })
    }

    fn execute(&self, parameters: &Parameters, now: DateTime<Local>) -> Result<Status, Error> {
        let time: Duration = resolve_timespan("sleep", &self.time, &self.host, parameters)?;
        Ok(Status::Timer{ deadline: now + time })
    }
}
