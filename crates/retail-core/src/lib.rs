#![deny(unused_variables)]

pub mod config;
pub mod data_processor;
pub mod error;
pub mod geo;
pub mod splitter;
pub mod traits;
pub mod types;
