// src/lib.rs

pub mod config;
pub mod error;
pub mod http;
pub mod platforms;
pub mod status;
pub mod tasks;

pub use config::{Config, ConfigStore};
pub use error::Error;
pub use http::{DefaultHttpClient, HttpClient};
