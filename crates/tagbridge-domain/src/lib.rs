//! Tagbridge Domain Layer
//!
//! This crate holds the data model shared by the annotation interpreter and
//! the dispatch engine. It has no behaviour beyond small accessors: parsing
//! lives in `tagbridge-parser`, binding lives in `tagbridge-router`.
//!
//! ## Key Concepts
//!
//! - **Doc record**: one documented symbol as produced by a comment extractor
//!   (description, tags keyed by tag name, lexical context)
//! - **Route descriptor**: one HTTP-invocable method (verb, path pattern,
//!   parameters, return shape)
//! - **Controller descriptor**: the named group of routes from one source unit
//! - **Parameter source**: where a parameter's value is read from at request time
//!
//! ## Architecture
//!
//! - Pure data types, serializable with serde
//! - Trait definitions for the external comment extractor

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod controller;
pub mod route;
pub mod tag;
pub mod traits;

// Re-exports for convenience
pub use controller::ControllerDescriptor;
pub use route::{ParamDescriptor, ParamSource, ReturnDescriptor, RouteDescriptor, Verb};
pub use tag::{DocRecord, TagRecord};
pub use traits::CommentParser;
