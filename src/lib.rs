pub mod app;
pub mod bootstrap;
pub mod cli;
pub mod components;
pub mod config;
pub mod engine;
pub mod error;
pub mod image_pipeline;
pub mod loader;
pub mod message;
pub mod model;
pub mod session;
pub mod tools;
pub mod utils;
pub mod views;
