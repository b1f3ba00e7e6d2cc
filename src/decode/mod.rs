//! Response decoder module
//!
//! Turns a page body into a typed `Page<R>`.
//!
//! # Overview
//!
//! Decoding is pure: no I/O and no retries. A body that fails to decode is
//! reported as `Error::Decode`, and the page fetcher decides whether to try
//! again.

mod decoder;

pub use decoder::PageDecoder;
