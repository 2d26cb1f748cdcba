//! Database bootstrap and catalog schema

pub mod init;

pub use init::*;
