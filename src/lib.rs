// src/lib.rs

pub mod config;
pub mod error;
pub mod export;
pub mod gravity;
pub mod grid;
pub mod model;
pub mod sampler;
pub mod scalar_field;
pub mod smoothing;
pub mod source;
pub mod visualisation;
