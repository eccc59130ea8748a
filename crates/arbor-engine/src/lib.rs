//! Arbor Engine
//!
//! Styled, laid out element trees for in-world user interfaces.
//!
//! # Example
//! ```rust,ignore
//! use arbor_engine::{Config, Document};
//!
//! let mut doc = Document::new(Config::default());
//! let root = doc.root();
//! let div = doc.create_element("div");
//! doc.append_child(root, div)?;
//! doc.add_stylesheet("div { width: 100px; height: 20px; }");
//! let geometry = doc.geometry(div)?;
//! ```

mod config;
mod default_style;
mod document;

pub use config::Config;
pub use default_style::{default_stylesheet, DEFAULT_STYLESHEET};
pub use document::{Document, EngineError, EngineResult};

// Re-export sub-crates for advanced usage
pub use arbor_css as css;
pub use arbor_dom as dom;
pub use arbor_layout as layout;

use tracing_subscriber::EnvFilter;

/// Engine version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Filter used when `RUST_LOG` is not set
const DEFAULT_FILTER: &str = "arbor=info";

/// Install a `fmt` subscriber filtered by `RUST_LOG`, falling back to
/// `arbor=info`. Does nothing if a subscriber is already installed.
pub fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_FILTER));
    install(filter);
}

/// Install a `fmt` subscriber with an explicit filter directive
pub fn init_tracing_with(directives: &str) {
    install(EnvFilter::new(directives));
}

fn install(filter: EnvFilter) {
    if tracing_subscriber::fmt().with_env_filter(filter).try_init().is_ok() {
        tracing::debug!("arbor {} tracing initialized", VERSION);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_init_tracing_twice() {
        init_tracing_with("arbor=debug");
        init_tracing();
    }
}
