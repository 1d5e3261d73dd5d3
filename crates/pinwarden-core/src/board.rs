//! Boards: one connected hardware controller with its component register
//! and occupied-resource ledger

use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use thiserror::Error;
use tracing::{debug, info};
use uuid::Uuid;

use crate::diagnostic::{DiagnosticSink, TracingSink};
use crate::io::IoHandle;
use crate::pin::{PinSpec, PinValue};
use crate::resource::{Acquisition, Occupancy, ResourceConflict, ResourceDescriptor};

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ConfigurationError {
    #[error("Board requires an I/O transport")]
    MissingIo,
    #[error("No active board available to mount component")]
    NoActiveBoard,
}

/// Stable board identifier, explicit or generated
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct BoardId(pub String);

impl BoardId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Generate an identifier for boards constructed without one
    pub fn generate() -> Self {
        Self(Uuid::new_v4().to_string().to_uppercase())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for BoardId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Board construction options
#[derive(Clone, Default)]
pub struct BoardOptions {
    /// Explicit identifier; generated when absent
    pub id: Option<BoardId>,
    /// Hardware transport (required)
    pub io: Option<IoHandle>,
    pub debug: bool,
    pub repl: bool,
    /// Warn channel; defaults to [`TracingSink`]
    pub diagnostics: Option<Arc<dyn DiagnosticSink>>,
}

impl BoardOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_id(mut self, id: impl Into<String>) -> Self {
        self.id = Some(BoardId::new(id));
        self
    }

    pub fn with_io(mut self, io: IoHandle) -> Self {
        self.io = Some(io);
        self
    }

    pub fn with_debug(mut self, debug: bool) -> Self {
        self.debug = debug;
        self
    }

    pub fn with_repl(mut self, repl: bool) -> Self {
        self.repl = repl;
        self
    }

    pub fn with_diagnostics(mut self, sink: Arc<dyn DiagnosticSink>) -> Self {
        self.diagnostics = Some(sink);
        self
    }
}

impl fmt::Debug for BoardOptions {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BoardOptions")
            .field("id", &self.id)
            .field("io", &self.io)
            .field("debug", &self.debug)
            .field("repl", &self.repl)
            .field("diagnostics", &self.diagnostics.is_some())
            .finish()
    }
}

/// A component as recorded in its board's register
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ComponentRecord {
    /// Component type name
    pub kind: String,
    pub id: Option<String>,
    /// Normalized scalar pin
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pin: Option<PinValue>,
    /// Normalized pin declaration, shape preserved
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pins: Option<PinSpec>,
}

/// One connected hardware controller.
///
/// `register` and `occupied` only grow; both keep acquisition order.
pub struct Board {
    id: BoardId,
    io: IoHandle,
    debug: bool,
    repl: bool,
    register: Mutex<Vec<ComponentRecord>>,
    occupied: Mutex<Occupancy>,
    diagnostics: Arc<dyn DiagnosticSink>,
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

impl Board {
    /// Create a board. Fails when no I/O transport is given.
    ///
    /// The board is not active until it is registered with a
    /// [`BoardRegistry`](crate::registry::BoardRegistry).
    pub fn new(options: BoardOptions) -> Result<Self, ConfigurationError> {
        let io = options.io.ok_or(ConfigurationError::MissingIo)?;
        let id = options.id.unwrap_or_else(BoardId::generate);

        info!(board = %id, io = %io.name(), "Board created");

        Ok(Self {
            id,
            io,
            debug: options.debug,
            repl: options.repl,
            register: Mutex::new(Vec::new()),
            occupied: Mutex::new(Occupancy::new()),
            diagnostics: options.diagnostics.unwrap_or_else(|| Arc::new(TracingSink)),
        })
    }

    pub fn id(&self) -> &BoardId {
        &self.id
    }

    pub fn io(&self) -> &IoHandle {
        &self.io
    }

    pub fn debug(&self) -> bool {
        self.debug
    }

    pub fn repl(&self) -> bool {
        self.repl
    }

    /// Registered components, in registration order
    pub fn register(&self) -> Vec<ComponentRecord> {
        lock(&self.register).clone()
    }

    /// Claimed resources, in acquisition order
    pub fn occupied(&self) -> Vec<ResourceDescriptor> {
        lock(&self.occupied).entries().to_vec()
    }

    pub fn is_occupied(&self, descriptor: &ResourceDescriptor) -> bool {
        lock(&self.occupied).contains(descriptor)
    }

    /// Attempt to claim a resource on behalf of `emitter`.
    ///
    /// A duplicate claim is reported through the warn channel and returned;
    /// it is never recorded.
    pub fn acquire(
        &self,
        emitter: &str,
        descriptor: ResourceDescriptor,
    ) -> Option<ResourceConflict> {
        // Scan, insert and warning happen under a single lock, so warnings
        // follow ledger order. Sinks must not call back into this board.
        let mut occupied = lock(&self.occupied);

        match occupied.acquire(descriptor) {
            Acquisition::Acquired => {
                if let Some(resource) = occupied.entries().last() {
                    debug!(
                        board = %self.id,
                        emitter = %emitter,
                        resource = %resource,
                        "Resource acquired"
                    );
                }
                None
            }
            Acquisition::Occupied(descriptor) => {
                let conflict = ResourceConflict {
                    emitter: emitter.to_string(),
                    descriptor,
                };
                self.warn(emitter, &conflict.to_string());
                Some(conflict)
            }
        }
    }

    /// Add a component to the register
    pub fn register_component(&self, record: ComponentRecord) {
        debug!(
            board = %self.id,
            kind = %record.kind,
            id = record.id.as_deref().unwrap_or("-"),
            "Component registered"
        );
        lock(&self.register).push(record);
    }

    /// Report an advisory warning through this board's warn channel
    pub fn warn(&self, emitter: &str, message: &str) {
        self.diagnostics.warn(emitter, message);
    }

    /// Serializable view of the board's current state
    pub fn snapshot(&self) -> BoardSnapshot {
        BoardSnapshot {
            id: self.id.clone(),
            io: self.io.name().to_string(),
            debug: self.debug,
            repl: self.repl,
            register: self.register(),
            occupied: self.occupied(),
        }
    }
}

impl fmt::Debug for Board {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Board")
            .field("id", &self.id)
            .field("io", &self.io)
            .field("debug", &self.debug)
            .field("repl", &self.repl)
            .field("register", &lock(&self.register).len())
            .field("occupied", &lock(&self.occupied).len())
            .finish()
    }
}

/// Point-in-time view of a board for reports and APIs
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BoardSnapshot {
    pub id: BoardId,
    /// Transport name
    pub io: String,
    pub debug: bool,
    pub repl: bool,
    pub register: Vec<ComponentRecord>,
    pub occupied: Vec<ResourceDescriptor>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::diagnostic::RecordingSink;
    use crate::io::MockIo;

    fn mock_board() -> Board {
        Board::new(BoardOptions::new().with_io(IoHandle::new(MockIo::default()))).unwrap()
    }

    #[test]
    fn test_board_requires_io() {
        let err = Board::new(BoardOptions::new().with_id("uno")).unwrap_err();
        assert_eq!(err, ConfigurationError::MissingIo);
    }

    #[test]
    fn test_board_id_explicit_or_generated() {
        let io = IoHandle::new(MockIo::default());
        let board = Board::new(BoardOptions::new().with_id("uno").with_io(io.clone())).unwrap();
        assert_eq!(board.id().as_str(), "uno");

        let a = Board::new(BoardOptions::new().with_io(io.clone())).unwrap();
        let b = Board::new(BoardOptions::new().with_io(io)).unwrap();
        assert_ne!(a.id(), b.id());
        assert!(!a.id().as_str().is_empty());
    }

    #[test]
    fn test_new_board_is_empty() {
        let board = mock_board();
        assert!(board.register().is_empty());
        assert!(board.occupied().is_empty());
        assert!(!board.debug());
        assert!(!board.repl());
    }

    #[test]
    fn test_acquire_reports_conflict_through_sink() {
        let sink = Arc::new(RecordingSink::new());
        let board = Board::new(
            BoardOptions::new()
                .with_io(IoHandle::new(MockIo::default()))
                .with_diagnostics(sink.clone()),
        )
        .unwrap();

        assert!(board.acquire("Led", ResourceDescriptor::pin(13)).is_none());
        let conflict = board.acquire("Button", ResourceDescriptor::pin(13)).unwrap();

        assert_eq!(conflict.emitter, "Button");
        assert_eq!(conflict.to_string(), "pin: 13 is already in use");
        assert_eq!(
            sink.messages(),
            vec![("Button".to_string(), "pin: 13 is already in use".to_string())]
        );
        assert_eq!(board.occupied(), vec![ResourceDescriptor::pin(13)]);
        assert!(board.is_occupied(&ResourceDescriptor::pin(13)));
        assert!(!board.is_occupied(&ResourceDescriptor::pin(12)));
    }

    #[test]
    fn test_snapshot_serializes() {
        let board = Board::new(
            BoardOptions::new()
                .with_id("uno")
                .with_io(IoHandle::new(MockIo::new("Firmata")))
                .with_debug(true),
        )
        .unwrap();
        board.acquire("Led", ResourceDescriptor::pin(13));
        board.register_component(ComponentRecord {
            kind: "Led".to_string(),
            id: Some("status".to_string()),
            pin: Some(PinValue::Number(13)),
            pins: None,
        });

        let json = serde_json::to_value(board.snapshot()).unwrap();
        assert_eq!(
            json,
            serde_json::json!({
                "id": "uno",
                "io": "Firmata",
                "debug": true,
                "repl": false,
                "register": [{ "kind": "Led", "id": "status", "pin": 13 }],
                "occupied": [{ "value": 13, "type": "pin" }],
            })
        );
    }

    /// Sink that checks the ledger lock is held while it is called
    #[derive(Default)]
    struct LockCheckingSink {
        board: std::sync::OnceLock<std::sync::Weak<Board>>,
        held: Mutex<Vec<bool>>,
    }

    impl DiagnosticSink for LockCheckingSink {
        fn warn(&self, _emitter: &str, _message: &str) {
            if let Some(board) = self.board.get().and_then(|b| b.upgrade()) {
                let held = board.occupied.try_lock().is_err();
                self.held.lock().unwrap().push(held);
            }
        }
    }

    #[test]
    fn test_conflict_warning_emitted_under_ledger_lock() {
        let sink = Arc::new(LockCheckingSink::default());
        let board = Arc::new(
            Board::new(
                BoardOptions::new()
                    .with_io(IoHandle::new(MockIo::default()))
                    .with_diagnostics(sink.clone()),
            )
            .unwrap(),
        );
        sink.board.set(Arc::downgrade(&board)).unwrap();

        board.acquire("Led", ResourceDescriptor::pin(7));
        board.acquire("Led", ResourceDescriptor::pin(7));
        board.acquire("Led", ResourceDescriptor::pin(7));

        assert_eq!(*sink.held.lock().unwrap(), vec![true, true]);
    }

    #[test]
    fn test_concurrent_claims_keep_one_entry_per_pin() {
        let sink = Arc::new(RecordingSink::new());
        let board = Arc::new(
            Board::new(
                BoardOptions::new()
                    .with_io(IoHandle::new(MockIo::default()))
                    .with_diagnostics(sink.clone()),
            )
            .unwrap(),
        );

        let handles: Vec<_> = (0..4)
            .map(|_| {
                let board = board.clone();
                std::thread::spawn(move || {
                    for pin in 0..32u32 {
                        board.acquire("Led", ResourceDescriptor::pin(pin));
                    }
                })
            })
            .collect();
        for handle in handles {
            handle.join().unwrap();
        }

        let expected: Vec<_> = (0..32u32).map(ResourceDescriptor::pin).collect();
        assert_eq!(board.occupied(), expected);
        assert_eq!(sink.len(), 3 * 32);
    }

    #[derive(Clone, Default)]
    struct CapturedLogs(Arc<Mutex<Vec<u8>>>);

    impl std::io::Write for CapturedLogs {
        fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
            self.0.lock().unwrap().extend_from_slice(buf);
            Ok(buf.len())
        }

        fn flush(&mut self) -> std::io::Result<()> {
            Ok(())
        }
    }

    #[test]
    fn test_debug_events_do_not_depend_on_debug_flag() {
        let logs = CapturedLogs::default();
        let writer = logs.clone();
        let subscriber = tracing_subscriber::fmt()
            .with_max_level(tracing::Level::DEBUG)
            .with_writer(move || writer.clone())
            .finish();

        tracing::subscriber::with_default(subscriber, || {
            let board = mock_board();
            assert!(!board.debug());
            board.acquire("Led", ResourceDescriptor::pin(13));
            board.register_component(ComponentRecord {
                kind: "Led".to_string(),
                id: None,
                pin: Some(PinValue::Number(13)),
                pins: None,
            });
        });

        let output = String::from_utf8(logs.0.lock().unwrap().clone()).unwrap();
        assert!(output.contains("Resource acquired"));
        assert!(output.contains("Component registered"));
    }
}
