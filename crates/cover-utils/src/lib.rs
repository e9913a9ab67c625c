//! Shared helpers for cover extraction: file naming and content sniffing.

pub mod mime;
pub mod naming;
