//  LIB.rs
//    by Lut99
//
//  Created:
//    07 Feb 2023, 09:04:12
//  Last edited:
//    21 Mar 2023, 09:41:03
//  Auto updated?
//    Yes
//
//  Description:
//!   Defines the `.experiment` deployment descriptor and how to load it.
//

// Define some modules
pub mod errors;
pub mod experiment;

// Pull some stuff into the crate namespace
pub use errors::ExperimentFileError as Error;
pub use experiment::{DoSection, ExperimentFile, ParametersSection, PhaseSection, RunSection, SpecificParams};
