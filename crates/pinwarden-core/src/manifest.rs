//! Board manifest - boards and components declared in TOML
//!
//! A manifest lists boards first and components second. Applying it builds
//! each board in order, then initializes each component in order, so the
//! resulting occupancy ledgers match the declaration order.
//!
//! ```toml
//! [[board]]
//! id = "uno"
//! [board.aliases]
//! A0 = 14
//!
//! [[component]]
//! kind = "Led"
//! id = "status"
//! pin = 13
//! ```

use serde::Deserialize;
use std::collections::{HashMap, HashSet};
use std::path::Path;
use std::sync::Arc;
use thiserror::Error;
use tracing::info;

use crate::board::{BoardId, BoardOptions, ConfigurationError};
use crate::component::{ComponentOptions, ComponentState, DEFAULT_KIND};
use crate::diagnostic::DiagnosticSink;
use crate::io::{IoHandle, MockIo};
use crate::pin::{PinSpec, PinValue};
use crate::registry::BoardRegistry;

#[derive(Error, Debug)]
pub enum ManifestError {
    #[error("Failed to read manifest: {0}")]
    IoError(#[from] std::io::Error),
    #[error("Failed to parse manifest: {0}")]
    ParseError(#[from] toml::de::Error),
    #[error("Board {0} is declared more than once")]
    DuplicateBoard(String),
    #[error("Component {component} refers to unknown board {board}")]
    UnknownBoard { component: String, board: String },
    #[error(transparent)]
    Configuration(#[from] ConfigurationError),
}

/// Transport kinds a manifest can construct
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum IoKind {
    /// In-process transport with no hardware attached
    #[default]
    Mock,
}

/// A `[[board]]` entry
#[derive(Debug, Clone, Deserialize)]
pub struct BoardEntry {
    #[serde(default)]
    pub id: Option<String>,
    #[serde(default)]
    pub io: IoKind,
    /// Transport name; defaults to the board id
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub debug: bool,
    #[serde(default)]
    pub repl: bool,
    /// Named pins the transport resolves (e.g. `A0 = 14`)
    #[serde(default)]
    pub aliases: HashMap<String, PinValue>,
}

impl BoardEntry {
    fn to_options(&self, diagnostics: Arc<dyn DiagnosticSink>) -> BoardOptions {
        let io = match self.io {
            IoKind::Mock => {
                let name = self
                    .name
                    .clone()
                    .or_else(|| self.id.clone())
                    .unwrap_or_else(|| "MockIo".to_string());
                MockIo::new(name).with_aliases(self.aliases.clone())
            }
        };

        let mut options = BoardOptions::new()
            .with_io(IoHandle::new(io))
            .with_debug(self.debug)
            .with_repl(self.repl)
            .with_diagnostics(diagnostics);
        if let Some(id) = &self.id {
            options = options.with_id(id.clone());
        }
        options
    }
}

fn default_kind() -> String {
    DEFAULT_KIND.to_string()
}

/// A `[[component]]` entry
#[derive(Debug, Clone, Deserialize)]
pub struct ComponentEntry {
    /// Type name reported with warnings
    #[serde(default = "default_kind")]
    pub kind: String,
    #[serde(default)]
    pub id: Option<String>,
    /// Board id; the most recently declared board when absent
    #[serde(default)]
    pub board: Option<String>,
    #[serde(default)]
    pub pin: Option<PinValue>,
    #[serde(default)]
    pub pins: Option<PinSpec>,
    #[serde(default)]
    pub controller: Option<String>,
    #[serde(default)]
    pub address: Option<u32>,
}

impl ComponentEntry {
    /// Name used in error messages
    fn label(&self) -> String {
        match &self.id {
            Some(id) => format!("{} \"{}\"", self.kind, id),
            None => self.kind.clone(),
        }
    }

    fn to_options(&self) -> ComponentOptions {
        ComponentOptions {
            id: self.id.clone(),
            pin: self.pin.clone(),
            pins: self.pins.clone(),
            controller: self.controller.clone(),
            address: self.address,
            board: None,
            io: None,
        }
    }
}

/// Boards and components to construct
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Manifest {
    #[serde(default, rename = "board")]
    pub boards: Vec<BoardEntry>,
    #[serde(default, rename = "component")]
    pub components: Vec<ComponentEntry>,
}

impl Manifest {
    /// Load a manifest from a TOML file
    pub fn from_file(path: &Path) -> Result<Self, ManifestError> {
        let content = std::fs::read_to_string(path)?;
        let manifest = Self::from_toml(&content)?;
        info!(
            path = %path.display(),
            boards = manifest.boards.len(),
            components = manifest.components.len(),
            "Loaded manifest"
        );
        Ok(manifest)
    }

    /// Load a manifest from a TOML string
    pub fn from_toml(content: &str) -> Result<Self, ManifestError> {
        let manifest: Manifest = toml::from_str(content)?;
        Ok(manifest)
    }

    /// Construct every board, then initialize every component.
    ///
    /// Board ids must be unique; a repeated id fails before anything is
    /// constructed.
    ///
    /// Boards report warnings to `diagnostics`. Conflicts never fail this
    /// call; they are carried on the returned component states.
    pub fn apply(
        &self,
        registry: &BoardRegistry,
        diagnostics: Arc<dyn DiagnosticSink>,
    ) -> Result<Vec<ComponentState>, ManifestError> {
        let mut seen = HashSet::new();
        for id in self.boards.iter().filter_map(|entry| entry.id.as_deref()) {
            if !seen.insert(id) {
                return Err(ManifestError::DuplicateBoard(id.to_string()));
            }
        }

        for entry in &self.boards {
            registry.construct(entry.to_options(diagnostics.clone()))?;
        }

        let mut components = Vec::with_capacity(self.components.len());
        for entry in &self.components {
            let mut options = entry.to_options();
            if let Some(board_id) = &entry.board {
                let board = registry.find(&BoardId::new(board_id.as_str())).ok_or_else(|| {
                    ManifestError::UnknownBoard {
                        component: entry.label(),
                        board: board_id.clone(),
                    }
                })?;
                options.board = Some(board);
            }
            components.push(ComponentState::initialize_as(registry, &entry.kind, &options)?);
        }

        Ok(components)
    }
}
