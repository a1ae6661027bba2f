//! External adapters for the import domain
//!
//! - **HttpExtractionAdapter**: calls the PDF extraction service over HTTP
//! - Mock adapters live in [`crate::ports::mock`] behind the `mock` feature
//!
//! ```rust,ignore
//! use domain_import::adapters::{HttpExtractionAdapter, HttpExtractionConfig};
//!
//! let adapter = HttpExtractionAdapter::new(HttpExtractionConfig::new("http://extractor:8000"))?;
//! let port: Arc<dyn ExtractionPort> = Arc::new(adapter);
//! ```

pub mod http_extraction;

pub use http_extraction::{HttpExtractionAdapter, HttpExtractionConfig};
