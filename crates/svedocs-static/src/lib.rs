//! Static site builder for svedocs.
//!
//! Renders every page route without dynamic segments to
//! `<out_dir>/<path>/index.html`, writes the theme stylesheet, copies the
//! public directory and generates a sitemap.

pub mod assets;
pub mod builder;

pub use builder::{BuildConfig, BuildError, BuildResult, StaticBuilder};
