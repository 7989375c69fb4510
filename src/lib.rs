pub mod adapters;
pub mod cli;
pub mod domain;
pub mod error;
pub mod logging;
pub mod ports;
pub mod services;
