pub mod auth;
pub mod captcha;
pub mod client;
pub mod config;
pub mod endpoint;
pub mod error;
pub mod gateway;
pub mod model;
pub mod parser;
pub mod session;
pub mod transport;

mod html;

#[cfg(test)]
mod mock;

pub use client::VtopClient;
pub use config::{ClientConfig, Credentials};

pub use error::Error;
pub use error::ErrorKind;
