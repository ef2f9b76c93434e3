pub mod adapters;
pub mod app;
pub mod config;
pub mod core;
pub mod domain;
pub mod utils;

pub use crate::adapters::JsonFileStore;
pub use crate::app::{ConversionPipeline, Dashboard};
pub use crate::config::{AppConfig, LocalStorage};
pub use crate::core::etl::EtlEngine;
pub use crate::core::transform::{rows_to_documents, ShortRowPolicy};
pub use crate::utils::error::{EtlError, Result};
