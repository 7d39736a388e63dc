//! Sampling strategies for the robust-fit loop.

pub mod uniform;

pub use uniform::UniformRandomSampler;
