//! Resolved commands and how they are built and run
//!
//! A config's commands are resolved into a tree: plain commands become
//! actions that run a snippet through the entrypoint, and commands with
//! `imports` become groups holding the merged commands of the imported files.

pub mod command;
pub mod entrypoint;
pub mod tree;
