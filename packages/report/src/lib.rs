pub mod builder;
pub mod config;
pub mod error;
pub mod files;
pub mod models;
pub mod service;
pub mod store;
pub mod validation;

pub use error::{ReportError, Result};
pub use service::ReportService;
