//  CONSOLE.rs
//    by Lut99
//
//  Created:
//    14 Feb 2023, 13:26:41
//  Last edited:
//    04 Apr 2023, 17:25:09
//  Auto updated?
//    Yes
//
//  Description:
//!   Implements the parsing of the line-oriented operator console, which
//!   maps onto the scheduler's pause/resume operations.
//

use chrono::{DateTime, Local};

use nightshift_shr::time::{parse_datetime, parse_timespan};

pub use crate::errors::ConsoleError as Error;


/***** TESTS *****/
#[cfg(test)]
mod tests {
    use chrono::Duration;
    use super::*;


    #[test]
    fn test_pause_for() {
        let now: DateTime<Local> = Local::now();
        match parse("pause for 1h30m", now).unwrap() {
            Some(Command::Pause(until)) => assert_eq!(until, now + Duration::minutes(90)),
            other                       => panic!("expected pause, got {:?}", other),
        }
    }

    #[test]
    fn test_pause_until() {
        match parse("pause until 2030-01-01 12:00", Local::now()).unwrap() {
            Some(Command::Pause(until)) => assert_eq!(until.to_string()[..16], *"2030-01-01 12:00"),
            other                       => panic!("expected pause, got {:?}", other),
        }
    }

    #[test]
    fn test_resume_and_exit() {
        let now: DateTime<Local> = Local::now();
        assert!(matches!(parse("resume", now).unwrap(), Some(Command::Resume)));
        assert!(matches!(parse("exit", now).unwrap(), Some(Command::Exit)));
        assert!(matches!(parse("  quit  ", now).unwrap(), Some(Command::Exit)));
    }

    #[test]
    fn test_blank_lines_ignored() {
        assert!(parse("", Local::now()).unwrap().is_none());
        assert!(parse("   ", Local::now()).unwrap().is_none());
    }

    #[test]
    fn test_bad_input_is_an_error() {
        let now: DateTime<Local> = Local::now();
        assert!(matches!(parse("launch the missiles", now), Err(Error::UnknownCommand{ .. })));
        assert!(matches!(parse("pause", now), Err(Error::UnknownCommand{ .. })));
        assert!(matches!(parse("pause until", now), Err(Error::MissingArgument{ .. })));
        assert!(matches!(parse("pause for bananas", now), Err(Error::IllegalArgument{ .. })));
    }

    #[test]
    fn test_commands_match_whole_words() {
        let now: DateTime<Local> = Local::now();
        assert!(matches!(parse("pause forever", now), Err(Error::UnknownCommand{ .. })));
        assert!(matches!(parse("pause untilnoon", now), Err(Error::UnknownCommand{ .. })));
        assert!(matches!(parse("resume now", now), Err(Error::UnknownCommand{ .. })));
        assert!(matches!(parse("exiting", now), Err(Error::UnknownCommand{ .. })));
    }
}





/***** LIBRARY *****/
/// A parsed operator command.
#[derive(Clone, Copy, Debug)]
pub enum Command {
    /// Suspend phase dispatch until the given moment.
    Pause(DateTime<Local>),
    /// Lift any active pause.
    Resume,
    /// Shut the driver down.
    Exit,
}



/// Parses one console line into a Command.
///
/// # Arguments
/// - `line`: The raw line as read from standard input.
/// - `now`: The current moment, from which `pause for` offsets count.
///
/// # Returns
/// The parsed Command, or `None` for a blank line.
///
/// # Errors
/// This function errors if the line matches no known command or a pause argument does not parse.
pub fn parse(line: &str, now: DateTime<Local>) -> Result<Option<Command>, Error> {
    // Commands are matched on whole words, so e.g. 'pause forever' is unknown rather than a weird timespan
    let mut tokens = line.split_whitespace();
    let first: &str = match tokens.next() {
        Some(first) => first,
        None        => { return Ok(None); },
    };

    match first {
        "pause" => {
            let mode: Option<&str> = tokens.next();
            let raw: String = tokens.collect::<Vec<&str>>().join(" ");
            match mode {
                Some("until") => {
                    if raw.is_empty() { return Err(Error::MissingArgument{ what: "datetime" }); }
                    let until: DateTime<Local> = parse_datetime(&raw).map_err(|err| Error::IllegalArgument{ raw, err })?;
                    Ok(Some(Command::Pause(until)))
                },
                Some("for") => {
                    if raw.is_empty() { return Err(Error::MissingArgument{ what: "timespan" }); }
                    let span = parse_timespan(&raw).map_err(|err| Error::IllegalArgument{ raw, err })?;
                    Ok(Some(Command::Pause(now + span)))
                },
                _ => Err(Error::UnknownCommand{ raw: line.trim().into() }),
            }
        },

        "resume" => {
            if tokens.next().is_some() { return Err(Error::UnknownCommand{ raw: line.trim().into() }); }
            Ok(Some(Command::Resume))
        },
        "exit" | "quit" => {
            if tokens.next().is_some() { return Err(Error::UnknownCommand{ raw: line.trim().into() }); }
            Ok(Some(Command::Exit))
        },

        _ => Err(Error::UnknownCommand{ raw: line.trim().into() }),
    }
}
