//! Mirror the folder tree of a SugarSync account to the local filesystem.
//!
//! This library provides the core functionality for sugarsync-dl.

pub mod config;
pub mod error;
pub mod mirror;
pub mod sugarsync;
