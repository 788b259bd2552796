//! CadView Document Core
//!
//! This crate contains the document model of the viewer:
//! - Property: typed, observable values grouped per owner
//! - Tree: arena-indexed tree used for assembly structures
//! - Document / DocumentItem: the user-facing data model
//! - Application: documents, format detection, import/export dispatch
//! - Executor: serialized access to the CAD kernel

pub mod application;
pub mod config;
pub mod document;
pub mod error;
pub mod event;
pub mod executor;
pub mod export;
pub mod import;
pub mod progress;
pub mod property;
pub mod tree;

pub use application::*;
pub use config::*;
pub use document::*;
pub use error::*;
pub use event::*;
pub use executor::*;
pub use export::*;
pub use import::*;
pub use progress::*;
pub use property::*;
pub use tree::*;
