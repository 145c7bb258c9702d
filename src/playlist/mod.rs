pub mod assembler;
pub mod config;
pub mod generator;
pub mod metadata;
pub mod mood;
pub mod scoring;
pub mod utils;


pub use assembler::PlaylistAssembler;
pub use config::*;
pub use generator::*;
pub use metadata::*;
pub use mood::*;
pub use scoring::{ScoredTrack, TrackScoring};
