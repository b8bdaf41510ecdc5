pub mod capture;
pub mod cli;
pub mod config;
pub mod constants;
pub mod domain;
pub mod error;
pub mod inference;
pub mod logging;
pub mod models;
pub mod services;
pub mod storage;
pub mod terminal;
pub mod workflow;

pub use error::{Error, Result};
