//! `knowledgebank` - A searchable directory of shared resources
//!
//! This library loads a catalog of resources (documents, links, datasets)
//! from a static JSON document or a backend API, filters it by text, type and
//! tag, and renders result cards. It also contains the backend itself: a
//! small HTTP server storing the catalog and uploaded files locally.

#![warn(missing_docs)]
#![warn(missing_debug_implementations)]
#![deny(unsafe_code)]

pub mod cli;
pub mod config;
pub mod error;
pub mod filter;
pub mod logging;
pub mod page;
pub mod render;
pub mod resource;
pub mod server;
pub mod source;
pub mod store;

pub use config::Config;
pub use error::{Error, Result};
pub use logging::init_logging;
pub use resource::Resource;
pub use source::DataSource;
pub use store::Store;
