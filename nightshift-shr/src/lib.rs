//  LIB.rs
//    by Lut99
//
//  Created:
//    06 Feb 2023, 10:12:44
//  Last edited:
//    21 Mar 2023, 09:30:18
//  Auto updated?
//    Yes
//
//  Description:
//!   Defines common utilities across the Night-Shift project.
//

// Define some modules
pub mod errors;
pub mod time;
pub mod utilities;
