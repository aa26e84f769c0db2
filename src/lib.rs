//! amp-ssr - server-side rendering for AMP pages.
//!
//! A source tree of AMP documents is rewritten through an ordered list of
//! [`pipeline::Transformer`] units. Each source file produces two outputs:
//! the untouched original under `<name>.amp.html` and the transformed
//! document under the original name.
//!
//! ```ignore
//! use amp_ssr::pipeline::{TransformOptions, transform_html};
//!
//! let html = transform_html(raw, &TransformOptions {
//!     amp_url: Some("/index.amp.html".into()),
//! })?;
//! ```

pub mod cli;
pub mod config;
pub mod dom;
pub mod logger;
pub mod pipeline;
pub mod utils;
pub mod workflow;
