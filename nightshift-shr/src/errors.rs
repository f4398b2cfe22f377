//  ERRORS.rs
//    by Lut99
//
//  Created:
//    06 Feb 2023, 10:14:02
//  Last edited:
//    21 Mar 2023, 09:31:55
//  Auto updated?
//    Yes
//
//  Description:
//!   Defines errors that occur in the `nightshift-shr` crate.
//

use std::error::Error;
use std::fmt::{Display, Formatter, Result as FResult};


/***** LIBRARY *****/
/// Errors that relate to parsing timespans and date-times.
#[derive(Debug)]
pub enum TimeError {
    /// The given string was not a valid timespan (`<N>d<N>h<N>m<N>s`, every part optional).
    IllegalTimespan{ raw: String },
    /// The given string did not match any of the recognized date-time formats.
    IllegalDatetime{ raw: String },
}

impl Display for TimeError {
    fn fmt(&self, f: &mut Formatter<'_>) -> FResult {
        use TimeError::*;
        match self {
            IllegalTimespan{ raw } => write!(f, "'{}' is not a valid timespan (expected '<N>d<N>h<N>m<N>s', where every part is optional)", raw),
            IllegalDatetime{ raw } => write!(f, "'{}' is not a valid date-time", raw),
        }
    }
}

impl Error for TimeError {}
