//! # block-snap
//!
//! Connection engine for block-programming editors: given a block dragged to
//! an arbitrary position, find the nearest compatible connection point among
//! thousands of candidates, validate it, and push overlapping blocks apart
//! after the drop.
//!
//! ## Features
//!
//! - **Y-sorted proximity index** - Binary search plus a bounded scan per
//!   connection type, with a search radius that shrinks as better candidates
//!   are found
//! - **Connection groups** - A dragged tree is isolated so it never snaps to
//!   itself, with sorting deferred until the drop
//! - **Pluggable validation** - [`ConnectionValidator`] policies, composable
//!   with [`CompositeValidator`]
//! - **Bumping** - [`BlockBumper`] resolves overlaps after connect and
//!   disconnect
//! - **Arena handles** - Blocks, connections and groups are addressed by
//!   `slotmap` keys; no reference cycles
//!
//! ## Quick Start
//!
//! ```
//! use block_snap::{BlockBuilder, DragSession, DropOutcome, Workspace, WorkspacePoint};
//!
//! let mut ws = Workspace::default();
//! let stack = ws
//!     .add_block(BlockBuilder::new("start").next((0.0, 30.0)))
//!     .unwrap();
//! let block = ws
//!     .add_block(
//!         BlockBuilder::new("print")
//!             .at(WorkspacePoint::new(300.0, 300.0))
//!             .previous((0.0, 0.0)),
//!     )
//!     .unwrap();
//!
//! let mut drag = DragSession::start(&mut ws, block).unwrap();
//! let candidate = drag.drag_to(&mut ws, WorkspacePoint::new(3.0, 34.0)).unwrap();
//! assert!(candidate.is_some());
//!
//! let outcome = drag.finish(&mut ws).unwrap();
//! assert!(matches!(outcome, DropOutcome::Connected { .. }));
//! assert_eq!(ws.root_block(block), stack);
//! ```
//!
//! ## Core Types
//!
//! - [`Workspace`] - Owns blocks, connections and the [`ConnectionManager`]
//! - [`Connection`] - A typed attachment point and its compatibility rules
//! - [`YSortedList`] - Per-type sorted index with nearest-neighbour search
//! - [`ConnectionGroup`] - Four sorted lists for connections that move together
//! - [`DragSession`] - Start, move, drop and cancel a drag
//! - [`LayoutConfig`] - Snap radius and bump distance

pub mod block;
pub mod bumper;
pub mod config;
pub mod connection;
pub mod drag;
pub mod error;
pub mod graph;
pub mod group;
pub mod manager;
pub mod units;
pub mod validator;
pub mod workspace;
pub mod y_sorted_list;

pub use block::{Block, BlockArena, BlockBuilder, BlockId, ConnectionSpec, Input, InputKind};
pub use bumper::BlockBumper;
pub use config::LayoutConfig;
pub use connection::{CheckResult, Connection, ConnectionArena, ConnectionId, ConnectionType};
pub use drag::{DragSession, DropOutcome};
pub use error::{ConfigError, ConnectionError, ManagerError, WorkspaceError};
pub use graph::ConnectionGraph;
pub use group::{ConnectionGroup, SortState};
pub use manager::{ConnectionManager, ConnectionMatch, GroupId};
pub use units::WorkspacePoint;
pub use validator::{
    CompositeValidator, ConnectionValidator, DefaultConnectionValidator, PermissiveValidator,
};
pub use workspace::Workspace;
pub use y_sorted_list::YSortedList;
