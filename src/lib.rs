//! Emotion-driven playlist engine: free text and an optional mood hint go in,
//! a ranked, artist-capped playlist draft comes out.

pub mod catalog;
pub mod classifier;
pub mod client;
pub mod config;
pub mod error;
pub mod models;
pub mod playlist;


pub use error::{Error, Result};
