// src/lib.rs

//! Release Tracker Library
//!
//! Polls project release feeds, stores every project's release set in an
//! object store and announces newly published releases.

pub mod config;
pub mod error;
#[cfg(feature = "lambda")]
pub mod lambda;
pub mod models;
pub mod notify;
pub mod pipeline;
pub mod services;
pub mod storage;
pub mod utils;

#[cfg(test)]
mod testing;
