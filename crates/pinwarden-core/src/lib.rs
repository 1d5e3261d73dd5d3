//! Pinwarden Core - Board registry, pin normalization and resource occupancy
//!
//! This crate provides the registration layer shared by every hardware
//! component in a Pinwarden process:
//! - Pin identifiers and shape-preserving normalization through a board's I/O transport
//! - Boards with their component register and occupied-resource ledger
//! - An explicit registry of active boards used to resolve which board a component mounts on
//! - The component initialization protocol with advisory conflict detection
//! - A TOML manifest describing boards and components to construct

pub mod board;
pub mod component;
pub mod diagnostic;
pub mod io;
pub mod manifest;
pub mod pin;
pub mod registry;
pub mod resource;

pub use board::{Board, BoardId, BoardOptions, BoardSnapshot, ComponentRecord, ConfigurationError};
pub use component::{Component, ComponentOptions, ComponentState, DEFAULT_KIND};
pub use diagnostic::{Diagnostic, DiagnosticSink, RecordingSink, TracingSink};
pub use io::{IoHandle, IoTransport, MockIo};
pub use manifest::{Manifest, ManifestError};
pub use pin::{PinSpec, PinValue};
pub use registry::{BoardRegistry, MountCriteria};
pub use resource::{ResourceConflict, ResourceDescriptor, ResourceKind};
