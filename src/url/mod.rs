//! URL handling module for Rivalscope
//!
//! This module provides site URL normalization, scheme-insensitive site
//! identity and domain extraction.

mod domain;
mod normalize;

pub use domain::{extract_domain, same_site};
pub use normalize::{normalize_site_url, site_key};
