//  ERRORS.rs
//    by Lut99
//
//  Created:
//    14 Feb 2023, 10:12:09
//  Last edited:
//    04 Apr 2023, 16:52:44
//  Auto updated?
//    Yes
//
//  Description:
//!   Defines errors that occur in the `nightshift-drv` crate.
//

use std::error::Error;
use std::fmt::{Display, Formatter, Result as FResult};
use std::path::PathBuf;


/***** LIBRARY *****/
/// Errors that relate to watching the deployment directory.
#[derive(Debug)]
pub enum WatcherError {
    /// Failed to create the file-system watcher itself.
    CreateError{ err: notify::Error },
    /// Failed to register the deployment directory with the watcher.
    WatchError{ path: PathBuf, err: notify::Error },
}

impl Display for WatcherError {
    fn fmt(&self, f: &mut Formatter<'_>) -> FResult {
        use WatcherError::*;
        match self {
            CreateError{ err }      => write!(f, "Failed to create file-system watcher: {}", err),
            WatchError{ path, err } => write!(f, "Failed to watch deployment directory '{}': {}", path.display(), err),
        }
    }
}

impl Error for WatcherError {}



/// Errors that relate to ingesting one deployment artifact.
#[derive(Debug)]
pub enum DeployError {
    /// The artifact's extension matches no known unpack strategy.
    UnsupportedExtension{ path: PathBuf },
    /// Failed to prepare the artifact's staging directory.
    StagingDirError{ path: PathBuf, err: std::io::Error },
    /// Failed to open the artifact file itself.
    ArtifactOpenError{ path: PathBuf, err: std::io::Error },
    /// The artifact is not a readable archive.
    ArchiveError{ path: PathBuf, err: zip::result::ZipError },
    /// Failed to extract the archive into the staging directory.
    ExtractError{ path: PathBuf, target: PathBuf, err: zip::result::ZipError },
    /// Failed to copy a bare descriptor into the staging directory.
    CopyError{ source: PathBuf, target: PathBuf, err: std::io::Error },
    /// Failed to list the staged files.
    StagingReadError{ path: PathBuf, err: std::io::Error },
    /// The artifact unpacked into no experiment descriptor at all.
    NoDescriptor{ path: PathBuf },
    /// A staged descriptor failed to load as an experiment.
    ExperimentLoadError{ path: PathBuf, err: nightshift_exe::Error },
}

impl Display for DeployError {
    fn fmt(&self, f: &mut Formatter<'_>) -> FResult {
        use DeployError::*;
        match self {
            UnsupportedExtension{ path }       => write!(f, "Deployment artifact '{}' has an unsupported extension", path.display()),
            StagingDirError{ path, err }       => write!(f, "Failed to prepare staging directory '{}': {}", path.display(), err),
            ArtifactOpenError{ path, err }     => write!(f, "Failed to open deployment artifact '{}': {}", path.display(), err),
            ArchiveError{ path, err }          => write!(f, "Deployment artifact '{}' is not a readable archive: {}", path.display(), err),
            ExtractError{ path, target, err }  => write!(f, "Failed to extract '{}' to '{}': {}", path.display(), target.display(), err),
            CopyError{ source, target, err }   => write!(f, "Failed to copy '{}' to '{}': {}", source.display(), target.display(), err),
            StagingReadError{ path, err }      => write!(f, "Failed to read staging directory '{}': {}", path.display(), err),
            NoDescriptor{ path }               => write!(f, "Deployment artifact '{}' contains no experiment descriptor", path.display()),
            ExperimentLoadError{ path, err }   => write!(f, "Failed to load experiment from '{}': {}", path.display(), err),
        }
    }
}

impl Error for DeployError {}



/// Errors that relate to parsing operator console input.
#[derive(Debug)]
pub enum ConsoleError {
    /// The line matches no known command.
    UnknownCommand{ raw: String },
    /// A `pause` command came without its argument.
    MissingArgument{ what: &'static str },
    /// A `pause` argument could not be parsed.
    IllegalArgument{ raw: String, err: nightshift_shr::errors::TimeError },
}

impl Display for ConsoleError {
    fn fmt(&self, f: &mut Formatter<'_>) -> FResult {
        use ConsoleError::*;
        match self {
            UnknownCommand{ raw }      => write!(f, "Unknown command '{}' (expected 'pause until <datetime>', 'pause for <timespan>', 'resume' or 'exit')", raw),
            MissingArgument{ what }    => write!(f, "Missing {} argument for 'pause'", what),
            IllegalArgument{ raw, err } => write!(f, "Cannot parse pause argument '{}': {}", raw, err),
        }
    }
}

impl Error for ConsoleError {}
