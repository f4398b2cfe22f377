//  LIB.rs
//    by Lut99
//
//  Created:
//    08 Feb 2023, 11:20:31
//  Last edited:
//    21 Mar 2023, 10:02:14
//  Auto updated?
//    Yes
//
//  Description:
//!   Defines the command-executor capability consumed by the experiment
//!   runtime, plus its local, SSH and dummy implementations.
//

// Define some modules
pub mod errors;
pub mod spec;
pub mod local;
pub mod ssh;
pub mod dummy;

// Pull some stuff into the crate namespace
pub use errors::ExecutorError as Error;
pub use spec::{CommandExecutor, ExecutorFactory};
pub use local::LocalExecutor;
pub use ssh::SshExecutor;
pub use dummy::{DummyExecutor, DummyFactory};
pub use spec::DefaultFactory;
