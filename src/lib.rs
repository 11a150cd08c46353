//! Redline LOC library
//!
//! Folds the version history of a file into one redlined document and
//! measures it in lines of code.

pub mod analyzer;
pub mod config;
pub mod constant;
pub mod diff;
pub mod filter;
pub mod source;
pub mod worker;
