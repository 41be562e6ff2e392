//! `rmcs` - Event device deployment records and Prometheus scrape configs
//!
//! This library keeps a catalog of device types, the events devices are
//! deployed at, and the devices themselves, and turns an event's device set
//! into a Prometheus `scrape_configs` document.

#![warn(missing_docs)]
#![warn(missing_debug_implementations)]
#![deny(unsafe_code)]

pub mod cli;
pub mod config;
pub mod error;
pub mod logging;
pub mod model;
pub mod scrape;
pub mod storage;

pub use config::Config;
pub use error::{Error, Result};
pub use logging::init_logging;
pub use model::{Device, DeviceType, DeviceTypeInput, Event, EventSnapshot};
pub use scrape::{build_scrape_config, build_scrape_config_strict, ScrapeDocument, ScrapeFormat};
pub use storage::{Storage, StorageStats};
