//! Claimed resources and the per-board occupancy ledger

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::pin::PinValue;

/// Kind of addressable resource a descriptor claims
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ResourceKind {
    Pin,
}

impl ResourceKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ResourceKind::Pin => "pin",
        }
    }
}

impl fmt::Display for ResourceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One claimed physical or addressable resource.
///
/// `controller` and `address` scope the value to an addressing namespace
/// (an I/O expander, a PWM driver at some bus address). An absent field is
/// its own namespace: it only ever matches another absent field.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ResourceDescriptor {
    /// Normalized pin identifier
    pub value: PinValue,
    #[serde(rename = "type")]
    pub kind: ResourceKind,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub controller: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub address: Option<u32>,
}

impl ResourceDescriptor {
    /// Unscoped pin claim
    pub fn pin(value: impl Into<PinValue>) -> Self {
        Self {
            value: value.into(),
            kind: ResourceKind::Pin,
            controller: None,
            address: None,
        }
    }

    pub fn with_controller(mut self, controller: Option<String>) -> Self {
        self.controller = controller;
        self
    }

    pub fn with_address(mut self, address: Option<u32>) -> Self {
        self.address = address;
        self
    }

    /// Whether `other` claims the same resource in the same namespace
    pub fn claims_same(&self, other: &ResourceDescriptor) -> bool {
        self.value == other.value
            && self.kind == other.kind
            && self.controller == other.controller
            && self.address == other.address
    }
}

/// Renders as `pin: <value>[, controller: <controller>][, address: <address>]`
impl fmt::Display for ResourceDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.kind, self.value)?;
        if let Some(controller) = &self.controller {
            write!(f, ", controller: {}", controller)?;
        }
        if let Some(address) = self.address {
            write!(f, ", address: {}", address)?;
        }
        Ok(())
    }
}

/// A rejected claim. Advisory only: the claiming component is still built.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ResourceConflict {
    /// Type name of the component that made the claim
    pub emitter: String,
    /// The descriptor that was rejected
    pub descriptor: ResourceDescriptor,
}

impl fmt::Display for ResourceConflict {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} is already in use", self.descriptor)
    }
}

/// Outcome of a single acquisition attempt
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Acquisition {
    /// The descriptor was appended to the ledger
    Acquired,
    /// An equal claim already exists; the descriptor is handed back untouched
    Occupied(ResourceDescriptor),
}

/// Append-only ledger of claimed resources, in acquisition order
#[derive(Debug, Clone, Default)]
pub struct Occupancy {
    entries: Vec<ResourceDescriptor>,
}

impl Occupancy {
    pub fn new() -> Self {
        Self::default()
    }

    /// Claim `descriptor` unless an equal claim is already recorded
    pub fn acquire(&mut self, descriptor: ResourceDescriptor) -> Acquisition {
        if self.contains(&descriptor) {
            return Acquisition::Occupied(descriptor);
        }
        self.entries.push(descriptor);
        Acquisition::Acquired
    }

    pub fn contains(&self, descriptor: &ResourceDescriptor) -> bool {
        self.entries.iter().any(|e| e.claims_same(descriptor))
    }

    pub fn entries(&self) -> &[ResourceDescriptor] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
