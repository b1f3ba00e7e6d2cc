//! HTTP module
//!
//! The transport seam the page fetcher talks through, and its reqwest-backed
//! implementation.
//!
//! # Features
//!
//! - **Transport trait**: one GET, one raw response; no retries at this layer
//! - **Content sniffing**: detects HTML error pages served with a success status,
//!   by declared `Content-Type` or by body
//! - **Rate Limiting**: optional token bucket limiter using governor

mod client;
mod rate_limit;
mod sniff;

pub use client::{HttpClient, HttpClientConfig, RawResponse, Transport};
pub use rate_limit::{RateLimiter, RateLimiterConfig};
pub use sniff::{is_html_content_type, looks_like_html};
