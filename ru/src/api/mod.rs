//! Remote fetch adapter for reader data
//!
//! Provides the ReaderApi trait, the reqwest-backed RestClient and the
//! permissive parsers that turn raw payloads into model lists.

pub mod client;
mod error;
mod parse;
mod rest;

pub use client::{AuthContext, ReaderApi, StaticAuth};
pub use error::FetchError;
pub use parse::{parse_followed_blogs, parse_recommended_blogs, parse_tags};
pub use rest::RestClient;
