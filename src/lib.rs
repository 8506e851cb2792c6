pub mod config;
pub mod error;
pub mod export;
pub mod formulation;
pub mod generator;
pub mod harness;
pub mod model;
pub mod render;
pub mod solver;
pub mod types;
