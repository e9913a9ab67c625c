//! Core types for ebook cover extraction: frames, options, the
//! renderer/finalizer traits and the extraction pipeline.

pub mod error;
pub mod frame;
pub mod options;
pub mod pipeline;
pub mod plugin;
pub mod storage;
