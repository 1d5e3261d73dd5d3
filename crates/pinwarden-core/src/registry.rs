//! Registry of active boards
//!
//! Whatever top-level context drives the hardware owns one registry and
//! hands it to component initialization. Components resolve their board
//! through it instead of being wired to one explicitly.

use std::sync::{Arc, PoisonError, RwLock};
use tracing::{debug, info};

use crate::board::{Board, BoardId, BoardOptions, ConfigurationError};
use crate::component::ComponentOptions;
use crate::io::IoHandle;

/// What a component knows about the board it belongs to
#[derive(Debug, Clone, Default)]
pub struct MountCriteria {
    /// Explicit board; wins over everything else
    pub board: Option<Arc<Board>>,
    /// Transport the board must be driving
    pub io: Option<IoHandle>,
}

impl From<&ComponentOptions> for MountCriteria {
    fn from(options: &ComponentOptions) -> Self {
        Self {
            board: options.board.clone(),
            io: options.io.clone(),
        }
    }
}

/// Active boards, in construction order
#[derive(Debug, Default)]
pub struct BoardRegistry {
    boards: RwLock<Vec<Arc<Board>>>,
}

impl BoardRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a board and make it active
    pub fn construct(&self, options: BoardOptions) -> Result<Arc<Board>, ConfigurationError> {
        let board = Arc::new(Board::new(options)?);
        self.register(board.clone());
        Ok(board)
    }

    /// Make an existing board active. Registering the same board twice is a no-op.
    pub fn register(&self, board: Arc<Board>) {
        let mut boards = self.boards.write().unwrap_or_else(PoisonError::into_inner);
        if boards.iter().any(|b| Arc::ptr_eq(b, &board)) {
            return;
        }
        info!(board = %board.id(), io = %board.io().name(), "Board active");
        boards.push(board);
    }

    /// Resolve the board a component belongs to.
    ///
    /// 1. An explicit board is returned as is.
    /// 2. Otherwise the first active board driving the given transport.
    /// 3. Otherwise the most recently constructed active board.
    pub fn resolve(&self, criteria: &MountCriteria) -> Result<Arc<Board>, ConfigurationError> {
        if let Some(board) = &criteria.board {
            return Ok(board.clone());
        }

        let boards = self.boards.read().unwrap_or_else(PoisonError::into_inner);

        if let Some(io) = &criteria.io {
            if let Some(board) = boards.iter().find(|b| b.io() == io) {
                debug!(board = %board.id(), "Mounted by transport");
                return Ok(board.clone());
            }
        }

        boards
            .last()
            .cloned()
            .ok_or(ConfigurationError::NoActiveBoard)
    }

    /// Resolve the board for a component's options
    pub fn mount(&self, options: &ComponentOptions) -> Result<Arc<Board>, ConfigurationError> {
        self.resolve(&MountCriteria::from(options))
    }

    /// Forget every active board.
    ///
    /// Boards still held by components keep their state but can no longer
    /// be resolved.
    pub fn purge_all(&self) {
        let mut boards = self.boards.write().unwrap_or_else(PoisonError::into_inner);
        let count = boards.len();
        boards.clear();
        info!(count, "Purged active boards");
    }

    /// Find an active board by identifier
    pub fn find(&self, id: &BoardId) -> Option<Arc<Board>> {
        self.boards
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .iter()
            .find(|b| b.id() == id)
            .cloned()
    }

    /// All active boards, in construction order
    pub fn boards(&self) -> Vec<Arc<Board>> {
        self.boards
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    pub fn len(&self) -> usize {
        self.boards
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::io::MockIo;

    fn options(io: &IoHandle) -> BoardOptions {
        BoardOptions::new().with_io(io.clone())
    }

    #[test]
    fn test_construct_registers_board() {
        let registry = BoardRegistry::new();
        assert!(registry.is_empty());

        let io = IoHandle::new(MockIo::default());
        let board = registry.construct(options(&io).with_id("uno")).unwrap();

        assert_eq!(registry.len(), 1);
        assert!(Arc::ptr_eq(&registry.find(&BoardId::new("uno")).unwrap(), &board));
    }

    #[test]
    fn test_construct_without_io_fails() {
        let registry = BoardRegistry::new();
        let err = registry.construct(BoardOptions::new()).unwrap_err();
        assert_eq!(err, ConfigurationError::MissingIo);
        assert!(registry.is_empty());
    }

    #[test]
    fn test_resolve_without_boards_fails() {
        let registry = BoardRegistry::new();
        let err = registry.resolve(&MountCriteria::default()).unwrap_err();
        assert_eq!(err, ConfigurationError::NoActiveBoard);
    }

    #[test]
    fn test_resolve_defaults_to_latest_board() {
        let registry = BoardRegistry::new();
        let io = IoHandle::new(MockIo::default());
        let _first = registry.construct(options(&io)).unwrap();
        let second = registry.construct(options(&io)).unwrap();

        let resolved = registry.resolve(&MountCriteria::default()).unwrap();
        assert!(Arc::ptr_eq(&resolved, &second));
    }

    #[test]
    fn test_resolve_by_transport() {
        let registry = BoardRegistry::new();
        let io_a = IoHandle::new(MockIo::new("a"));
        let io_b = IoHandle::new(MockIo::new("b"));
        let a = registry.construct(options(&io_a)).unwrap();
        let _b = registry.construct(options(&io_b)).unwrap();

        let criteria = MountCriteria {
            board: None,
            io: Some(io_a.clone()),
        };
        assert!(Arc::ptr_eq(&registry.resolve(&criteria).unwrap(), &a));

        // Unknown transport falls back to the latest board
        let criteria = MountCriteria {
            board: None,
            io: Some(IoHandle::new(MockIo::new("c"))),
        };
        assert_eq!(registry.resolve(&criteria).unwrap().io().name(), "b");
    }

    #[test]
    fn test_explicit_board_wins_even_after_purge() {
        let registry = BoardRegistry::new();
        let io = IoHandle::new(MockIo::default());
        let board = registry.construct(options(&io)).unwrap();
        registry.purge_all();

        let criteria = MountCriteria {
            board: Some(board.clone()),
            io: None,
        };
        assert!(Arc::ptr_eq(&registry.resolve(&criteria).unwrap(), &board));
        assert_eq!(
            registry.resolve(&MountCriteria::default()).unwrap_err(),
            ConfigurationError::NoActiveBoard
        );
    }

    #[test]
    fn test_register_is_idempotent() {
        let registry = BoardRegistry::new();
        let io = IoHandle::new(MockIo::default());
        let board = Arc::new(Board::new(options(&io)).unwrap());

        registry.register(board.clone());
        registry.register(board);
        assert_eq!(registry.len(), 1);
    }

    #[test]
    fn test_purge_keeps_board_state() {
        let registry = BoardRegistry::new();
        let io = IoHandle::new(MockIo::default());
        let board = registry.construct(options(&io)).unwrap();
        board.acquire("Led", crate::resource::ResourceDescriptor::pin(13));

        registry.purge_all();

        assert!(registry.is_empty());
        assert!(registry.boards().is_empty());
        assert_eq!(board.occupied().len(), 1);
    }
}
