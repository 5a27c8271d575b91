//! Client Module
//!
//! HTTP transport and token exchange.

pub mod http;
pub mod token;

pub use http::HttpClient;
pub use token::TokenProvider;
