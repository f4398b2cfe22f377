//  LIB.rs
//    by Lut99
//
//  Created:
//    14 Feb 2023, 10:09:55
//  Last edited:
//    04 Apr 2023, 17:29:52
//  Auto updated?
//    Yes
//
//  Description:
//!   Defines the driver side of the orchestrator: the deployment-directory
//!   watcher, the artifact ingestion and the operator console.
//

// Define some modules
pub mod errors;
pub mod console;
pub mod deploy;
pub mod watcher;

// Pull some stuff into the crate namespace
pub use console::Command;
pub use deploy::Deployer;
pub use watcher::DeployWatcher;
