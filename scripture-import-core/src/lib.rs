#![doc = "scripture-import-core: core logic library for scripture-import."]

//! This crate holds the decomposition of a scripture directory tree into
//! work, book, chapter and verse records, and the orchestration that writes
//! them through a [`contract::RecordWriter`].
//! Concrete network or file-backed writers live in the CLI crate.
//!
//! # Usage
//! Depend on this crate for record types, the writer contract, layout
//! enumeration, verse extraction and the import pipeline.

pub mod config;
pub mod contract;
pub mod error;
pub mod import;
pub mod layout;
pub mod memory;
pub mod records;
pub mod verses;
