//  ERRORS.rs
//    by Lut99
//
//  Created:
//    07 Feb 2023, 09:06:55
//  Last edited:
//    21 Mar 2023, 09:42:37
//  Auto updated?
//    Yes
//
//  Description:
//!   Defines errors that occur in the `nightshift-cfg` crate.
//

use std::error::Error;
use std::fmt::{Display, Formatter, Result as FResult};
use std::path::PathBuf;


/***** LIBRARY *****/
/// Errors that relate to loading an experiment descriptor.
#[derive(Debug)]
pub enum ExperimentFileError {
    /// Failed to open the given file.
    FileOpenError{ path: PathBuf, err: std::io::Error },
    /// Failed to read/parse the given file as JSON.
    FileParseError{ path: PathBuf, err: serde_json::Error },
    /// Failed to parse the given string as JSON.
    StringParseError{ err: serde_json::Error },
    /// The (normalized) document did not have the expected descriptor shape.
    DescriptorParseError{ err: serde_json::Error },
}

impl Display for ExperimentFileError {
    fn fmt(&self, f: &mut Formatter<'_>) -> FResult {
        use ExperimentFileError::*;
        match self {
            FileOpenError{ path, err }  => write!(f, "Failed to open experiment file '{}': {}", path.display(), err),
            FileParseError{ path, err } => write!(f, "Failed to parse experiment file '{}' as JSON: {}", path.display(), err),
            StringParseError{ err }     => write!(f, "Failed to parse given string as JSON: {}", err),
            DescriptorParseError{ err } => write!(f, "Given document is not a valid experiment descriptor: {}", err),
        }
    }
}

impl Error for ExperimentFileError {}
