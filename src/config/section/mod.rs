//! Configuration section definitions.
//!
//! Each module corresponds to a section in `amp-ssr.toml`:
//!
//! | Module     | TOML Section   | Purpose                              |
//! |------------|----------------|--------------------------------------|
//! | `convert`  | `[convert]`    | Source/destination trees, glob, jobs |
//! | `pipeline` | `[pipeline]`   | Transformer list and URL options     |

mod convert;
mod pipeline;

pub use convert::ConvertConfig;
pub use pipeline::PipelineSectionConfig;
