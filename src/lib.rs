//! Generate a lightweight human-readable Python SDK from an OpenAPI
//! json file.
//!
//! The document is lowered once into a read-only intermediate
//! representation ([`ir::SchemaTable`] and [`ir::OperationDef`]); the
//! synthesizers then render typed models, an exception hierarchy, an
//! asynchronous and a synchronous client class, packaging scaffolding
//! and an exhaustive pytest contract suite from it.

pub mod client;
pub mod config;
pub mod document;
pub mod error;
pub mod exceptions;
pub mod generator;
pub mod ir;
pub mod model;
pub mod pytype;
pub mod render;
pub mod resolve;
pub mod scaffold;
pub mod testgen;

pub use config::RunConfig;
pub use error::GenError;
pub use generator::{ClientGenerator, GeneratorArgs};
