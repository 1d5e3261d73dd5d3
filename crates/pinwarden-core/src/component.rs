//! Component initialization protocol
//!
//! Every hardware-facing component runs the same steps when it is built:
//! resolve its board, normalize the pins it declares, claim each pin in the
//! board's occupancy ledger, and register itself with the board. A claim
//! that collides with an existing one is reported, never fatal: the
//! component is built and registered regardless.
//!
//! Concrete components embed a [`ComponentState`] next to their own fields
//! and implement [`Component`] to expose it.

use serde::Deserialize;
use std::sync::Arc;

use crate::board::{Board, ComponentRecord, ConfigurationError};
use crate::io::IoHandle;
use crate::pin::{self, PinSpec, PinValue};
use crate::registry::BoardRegistry;
use crate::resource::{ResourceConflict, ResourceDescriptor};

/// Emitter name used when a component does not provide its own
pub const DEFAULT_KIND: &str = "Component";

/// Component configuration.
///
/// Unrecognized fields are ignored when deserializing. `board` and `io` are
/// runtime references and never come from a document.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ComponentOptions {
    pub id: Option<String>,
    /// Single pin
    pub pin: Option<PinValue>,
    /// Several pins as a list or a table of named roles
    pub pins: Option<PinSpec>,
    /// Addressing scheme the pins belong to (e.g. an I/O expander)
    pub controller: Option<String>,
    /// Sub-address within the controller's scheme
    pub address: Option<u32>,
    #[serde(skip)]
    pub board: Option<Arc<Board>>,
    #[serde(skip)]
    pub io: Option<IoHandle>,
}

impl ComponentOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_id(mut self, id: impl Into<String>) -> Self {
        self.id = Some(id.into());
        self
    }

    pub fn with_pin(mut self, pin: impl Into<PinValue>) -> Self {
        self.pin = Some(pin.into());
        self
    }

    pub fn with_pins(mut self, pins: impl Into<PinSpec>) -> Self {
        self.pins = Some(pins.into());
        self
    }

    pub fn with_controller(mut self, controller: impl Into<String>) -> Self {
        self.controller = Some(controller.into());
        self
    }

    pub fn with_address(mut self, address: u32) -> Self {
        self.address = Some(address);
        self
    }

    pub fn on_board(mut self, board: Arc<Board>) -> Self {
        self.board = Some(board);
        self
    }

    pub fn with_io(mut self, io: IoHandle) -> Self {
        self.io = Some(io);
        self
    }
}

/// Registration state shared by every component
#[derive(Debug, Clone)]
pub struct ComponentState {
    pub id: Option<String>,
    pub board: Arc<Board>,
    /// The board's transport
    pub io: IoHandle,
    /// Normalized scalar pin, if one was declared
    pub pin: Option<PinValue>,
    /// Normalized pins, in the declared shape
    pub pins: Option<PinSpec>,
    /// Claims rejected while this component was initialized
    pub conflicts: Vec<ResourceConflict>,
}

impl ComponentState {
    /// Initialize with the generic component type name
    pub fn initialize(
        registry: &BoardRegistry,
        options: &ComponentOptions,
    ) -> Result<Self, ConfigurationError> {
        Self::initialize_as(registry, DEFAULT_KIND, options)
    }

    /// Initialize on behalf of a concrete component type
    pub fn initialize_for<C: Component>(
        registry: &BoardRegistry,
        options: &ComponentOptions,
    ) -> Result<Self, ConfigurationError> {
        Self::initialize_as(registry, C::KIND, options)
    }

    /// Initialize, reporting conflicts under the `kind` type name.
    ///
    /// Only an unresolvable board is an error.
    pub fn initialize_as(
        registry: &BoardRegistry,
        kind: &str,
        options: &ComponentOptions,
    ) -> Result<Self, ConfigurationError> {
        let board = registry.mount(options)?;
        let io = board.io().clone();

        let pin = options
            .pin
            .as_ref()
            .map(|p| pin::normalize_value(p, &board));
        let pins = options.pins.as_ref().map(|p| pin::normalize(p, &board));

        let mut conflicts = Vec::new();
        for value in pin.iter().chain(pins.iter().flat_map(|p| p.values())) {
            let descriptor = ResourceDescriptor::pin(value.clone())
                .with_controller(options.controller.clone())
                .with_address(options.address);
            if let Some(conflict) = board.acquire(kind, descriptor) {
                conflicts.push(conflict);
            }
        }

        board.register_component(ComponentRecord {
            kind: kind.to_string(),
            id: options.id.clone(),
            pin: pin.clone(),
            pins: pins.clone(),
        });

        Ok(Self {
            id: options.id.clone(),
            board,
            io,
            pin,
            pins,
            conflicts,
        })
    }

    /// Every normalized pin this component declared, scalar pin first
    pub fn declared_pins(&self) -> Vec<&PinValue> {
        self.pin
            .iter()
            .chain(self.pins.iter().flat_map(|p| p.values()))
            .collect()
    }

    pub fn has_conflicts(&self) -> bool {
        !self.conflicts.is_empty()
    }
}

/// A concrete component type built around a [`ComponentState`]
pub trait Component {
    /// Type name reported as the emitter of warnings
    const KIND: &'static str;

    fn state(&self) -> &ComponentState;

    fn id(&self) -> Option<&str> {
        self.state().id.as_deref()
    }

    fn board(&self) -> &Arc<Board> {
        &self.state().board
    }
}
