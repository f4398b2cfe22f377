//  EXPERIMENT.rs
//    by Lut99
//
//  Created:
//    07 Feb 2023, 09:11:30
//  Last edited:
//    04 Apr 2023, 14:16:08
//  Auto updated?
//    Yes
//
//  Description:
//!   Defines the experiment descriptor document, i.e., the contents of an
//!   `.experiment` file dropped in the deployment directory.
//

use std::fs::File;
use std::io::BufReader;
use std::path::Path;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value as JValue};

pub use crate::errors::ExperimentFileError as Error;


/***** TESTS *****/





/***** HELPER FUNCTIONS *****/
/// Lowercases the keys of the given JSON object in-place, leaving the values untouched.
fn lowercase_keys(value: &mut JValue) {
    if let JValue::Object(map) = value {
        let old: Map<String, JValue> = std::mem::take(map);
        for (key, val) in old {
            map.insert(key.to_lowercase(), val);
        }
    }
}

/// Normalizes the structural keys of a raw descriptor document to lowercase.
///
/// Only the keys of the descriptor's own sections are normalized; parameter names, task parameter keys and host identifiers keep their case.
///
/// # Arguments
/// - `root`: The raw JSON document to normalize.
///
/// # Returns
/// The same document, with its structural keys lowercased.
fn normalize(mut root: JValue) -> JValue {
    lowercase_keys(&mut root);

    // The parameters section only has the 'common'/'specific' keys as structure
    if let Some(params) = root.get_mut("parameters") {
        lowercase_keys(params);
    }

    // Every phase has 'name' and 'do'; the latter has 'common' and 'specific'.
    // Task objects themselves are kept raw (the task factory normalizes its own keys).
    if let Some(JValue::Array(phases)) = root.get_mut("phases") {
        for phase in phases {
            lowercase_keys(phase);
            if let Some(tasks) = phase.get_mut("do") {
                lowercase_keys(tasks);
            }
        }
    }

    // The run section has 'repeat' and 'pipeline'
    if let Some(run) = root.get_mut("run") {
        lowercase_keys(run);
    }

    root
}





/***** LIBRARY *****/
/// Defines the toplevel experiment descriptor.
#[derive(Clone, Debug, Deserialize, Serialize)]
pub struct ExperimentFile {
    /// The name of the experiment.
    pub name       : String,
    /// The hosts this experiment runs on, in order.
    pub hosts      : Vec<String>,
    /// The two-tier parameter namespace (raw, i.e., placeholders not yet resolved).
    #[serde(default)]
    pub parameters : ParametersSection,
    /// The phases of this experiment, in declaration order.
    #[serde(default)]
    pub phases     : Vec<PhaseSection>,
    /// How to run the phases (repeat count + pipeline).
    #[serde(default)]
    pub run        : RunSection,
}

impl ExperimentFile {
    /// Parses an experiment descriptor from the given string.
    ///
    /// # Arguments
    /// - `raw`: The string to parse as a JSON descriptor.
    ///
    /// # Returns
    /// A new ExperimentFile with the parsed contents.
    ///
    /// # Errors
    /// This function errors if the string is not JSON or not a valid descriptor.
    pub fn from_str(raw: impl AsRef<str>) -> Result<Self, Error> {
        let value: JValue = serde_json::from_str(raw.as_ref()).map_err(|err| Error::StringParseError{ err })?;
        serde_json::from_value(normalize(value)).map_err(|err| Error::DescriptorParseError{ err })
    }

    /// Loads an experiment descriptor from the given file.
    ///
    /// # Arguments
    /// - `path`: The path of the `.experiment` file to load.
    ///
    /// # Returns
    /// A new ExperimentFile with the parsed contents.
    ///
    /// # Errors
    /// This function errors if the file could not be opened, read or parsed.
    pub fn from_path(path: impl AsRef<Path>) -> Result<Self, Error> {
        let path: &Path = path.as_ref();

        // Open the file
        let handle: File = File::open(path).map_err(|err| Error::FileOpenError{ path: path.into(), err })?;

        // Parse it as generic JSON first so we can normalize key casing
        let value: JValue = serde_json::from_reader(BufReader::new(handle)).map_err(|err| Error::FileParseError{ path: path.into(), err })?;
        serde_json::from_value(normalize(value)).map_err(|err| Error::DescriptorParseError{ err })
    }
}



/// Defines the `parameters` section of a descriptor.
#[derive(Clone, Debug, Default, Deserialize, Serialize)]
pub struct ParametersSection {
    /// Parameters shared by every host. Values may be any JSON scalar; they are stringified before resolution.
    #[serde(default)]
    pub common   : Map<String, JValue>,
    /// Parameter sets that apply to an explicit list of hosts only.
    #[serde(default)]
    pub specific : Vec<SpecificParams>,
}

/// Defines one entry in the `specific` parameter list.
#[derive(Clone, Debug, Deserialize, Serialize)]
pub struct SpecificParams {
    /// The hosts this set of values applies to.
    pub hosts  : Vec<String>,
    /// The named values themselves.
    #[serde(flatten)]
    pub values : Map<String, JValue>,
}



/// Defines one entry of the `phases` section.
#[derive(Clone, Debug, Deserialize, Serialize)]
pub struct PhaseSection {
    /// The name of this phase, as referenced from the run pipeline.
    pub name  : String,
    /// The tasks this phase executes.
    #[serde(rename = "do", default)]
    pub tasks : DoSection,
}

/// Defines the `do` section of a phase.
///
/// Task objects are kept as raw JSON values here; the task factory in `nightshift-exe` validates them, since unrecognized task types must be skippable without failing the load.
#[derive(Clone, Debug, Default, Deserialize, Serialize)]
pub struct DoSection {
    /// Tasks instantiated once per experiment host.
    #[serde(default)]
    pub common   : Vec<JValue>,
    /// Tasks instantiated only for the hosts in their own `hosts` list.
    #[serde(default)]
    pub specific : Vec<JValue>,
}



/// Defines the `run` section of a descriptor.
#[derive(Clone, Debug, Deserialize, Serialize)]
pub struct RunSection {
    /// How often to repeat the pipeline.
    #[serde(default = "default_repeat")]
    pub repeat   : u32,
    /// The phase names to run, in order, once per repetition.
    #[serde(default)]
    pub pipeline : Vec<String>,
}

impl Default for RunSection {
    #[inline]
    fn default() -> Self {
        Self {
            repeat   : default_repeat(),
            pipeline : vec![],
        }
    }
}

/// Provides the default repeat count for serde.
#[inline]
fn default_repeat() -> u32 { 1 }
