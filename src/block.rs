//! Minimal block model: the connection points a block exposes.
//!
//! Blocks are stored in a [`BlockArena`] owned by the
//! [`Workspace`](crate::Workspace). They are created from a [`BlockBuilder`]
//! which describes the block's connections relative to its top-left corner.

use slotmap::{new_key_type, SlotMap};

use crate::connection::ConnectionId;
use crate::units::WorkspacePoint;

new_key_type! {
    /// Handle of a block inside a [`BlockArena`].
    pub struct BlockId;
}

/// Storage for every block of a workspace.
pub type BlockArena = SlotMap<BlockId, Block>;

/// Whether an input accepts a value block or a statement stack.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InputKind {
    /// Backed by an `InputValue` connection.
    Value,
    /// Backed by a `NextStatement` connection.
    Statement,
}

/// A named input slot on a block.
#[derive(Debug, Clone, PartialEq)]
pub struct Input {
    name: String,
    kind: InputKind,
    connection: ConnectionId,
}

impl Input {
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn kind(&self) -> InputKind {
        self.kind
    }

    pub fn connection(&self) -> ConnectionId {
        self.connection
    }
}

/// A block and the handles of its connections.
#[derive(Debug, Clone, PartialEq)]
pub struct Block {
    name: String,
    shadow: bool,
    movable: bool,
    position: WorkspacePoint,
    previous: Option<ConnectionId>,
    output: Option<ConnectionId>,
    next: Option<ConnectionId>,
    inputs: Vec<Input>,
}

impl Block {
    pub(crate) fn new(name: String, shadow: bool, movable: bool, position: WorkspacePoint) -> Self {
        Self {
            name,
            shadow,
            movable,
            position,
            previous: None,
            output: None,
            next: None,
            inputs: Vec::new(),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn is_shadow(&self) -> bool {
        self.shadow
    }

    pub fn is_movable(&self) -> bool {
        self.movable
    }

    /// Top-left corner in workspace coordinates.
    pub fn position(&self) -> WorkspacePoint {
        self.position
    }

    pub(crate) fn set_position(&mut self, position: WorkspacePoint) {
        self.position = position;
    }

    pub fn previous_connection(&self) -> Option<ConnectionId> {
        self.previous
    }

    pub fn output_connection(&self) -> Option<ConnectionId> {
        self.output
    }

    pub fn next_connection(&self) -> Option<ConnectionId> {
        self.next
    }

    pub fn inputs(&self) -> &[Input] {
        &self.inputs
    }

    pub fn input(&self, name: &str) -> Option<&Input> {
        self.inputs.iter().find(|input| input.name == name)
    }

    /// The plug connecting this block to its parent, if any.
    pub fn inferior_connection(&self) -> Option<ConnectionId> {
        self.previous.or(self.output)
    }

    /// Every connection declared on this block itself, not its descendants.
    ///
    /// Order: previous, output, next, then inputs in declaration order.
    pub fn direct_connections(&self) -> Vec<ConnectionId> {
        let mut out = Vec::with_capacity(3 + self.inputs.len());
        out.extend(self.previous);
        out.extend(self.output);
        out.extend(self.next);
        out.extend(self.inputs.iter().map(|input| input.connection));
        out
    }

    pub(crate) fn set_previous(&mut self, id: ConnectionId) {
        self.previous = Some(id);
    }

    pub(crate) fn set_output(&mut self, id: ConnectionId) {
        self.output = Some(id);
    }

    pub(crate) fn set_next(&mut self, id: ConnectionId) {
        self.next = Some(id);
    }

    pub(crate) fn push_input(&mut self, name: String, kind: InputKind, connection: ConnectionId) {
        self.inputs.push(Input { name, kind, connection });
    }
}

/// Description of one connection point on a block under construction.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ConnectionSpec {
    /// Offset from the block's top-left corner.
    pub offset: WorkspacePoint,
    pub type_checks: Option<Vec<String>>,
    /// Overrides the type's default priority when set.
    pub high_priority: Option<bool>,
}

impl ConnectionSpec {
    pub fn at(x: f64, y: f64) -> Self {
        Self {
            offset: WorkspacePoint::new(x, y),
            ..Self::default()
        }
    }

    pub fn with_checks<I, S>(mut self, checks: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.type_checks = Some(checks.into_iter().map(Into::into).collect());
        self
    }

    pub fn with_high_priority(mut self, high_priority: bool) -> Self {
        self.high_priority = Some(high_priority);
        self
    }
}

impl From<WorkspacePoint> for ConnectionSpec {
    fn from(offset: WorkspacePoint) -> Self {
        Self {
            offset,
            ..Self::default()
        }
    }
}

impl From<(f64, f64)> for ConnectionSpec {
    fn from((x, y): (f64, f64)) -> Self {
        Self::at(x, y)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub(crate) struct InputSpec {
    pub name: String,
    pub kind: InputKind,
    pub connection: ConnectionSpec,
}

/// Builder for blocks added through
/// [`Workspace::add_block`](crate::Workspace::add_block).
///
/// # Example
///
/// ```
/// use block_snap::{BlockBuilder, ConnectionSpec, WorkspacePoint};
///
/// let repeat = BlockBuilder::new("controls_repeat")
///     .at(WorkspacePoint::new(40.0, 40.0))
///     .previous((0.0, 0.0))
///     .next((0.0, 48.0))
///     .value_input("TIMES", ConnectionSpec::at(80.0, 0.0).with_checks(["Number"]))
///     .statement_input("DO", (16.0, 24.0));
/// # let _ = repeat;
/// ```
#[derive(Debug, Clone, PartialEq)]
pub struct BlockBuilder {
    pub(crate) name: String,
    pub(crate) shadow: bool,
    pub(crate) movable: bool,
    pub(crate) position: WorkspacePoint,
    pub(crate) previous: Option<ConnectionSpec>,
    pub(crate) output: Option<ConnectionSpec>,
    pub(crate) next: Option<ConnectionSpec>,
    pub(crate) inputs: Vec<InputSpec>,
}

impl BlockBuilder {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            shadow: false,
            movable: true,
            position: WorkspacePoint::ZERO,
            previous: None,
            output: None,
            next: None,
            inputs: Vec::new(),
        }
    }

    pub fn shadow(mut self, shadow: bool) -> Self {
        self.shadow = shadow;
        self
    }

    pub fn movable(mut self, movable: bool) -> Self {
        self.movable = movable;
        self
    }

    pub fn at(mut self, position: WorkspacePoint) -> Self {
        self.position = position;
        self
    }

    pub fn previous(mut self, spec: impl Into<ConnectionSpec>) -> Self {
        self.previous = Some(spec.into());
        self
    }

    pub fn output(mut self, spec: impl Into<ConnectionSpec>) -> Self {
        self.output = Some(spec.into());
        self
    }

    pub fn next(mut self, spec: impl Into<ConnectionSpec>) -> Self {
        self.next = Some(spec.into());
        self
    }

    pub fn value_input(mut self, name: impl Into<String>, spec: impl Into<ConnectionSpec>) -> Self {
        self.inputs.push(InputSpec {
            name: name.into(),
            kind: InputKind::Value,
            connection: spec.into(),
        });
        self
    }

    pub fn statement_input(
        mut self,
        name: impl Into<String>,
        spec: impl Into<ConnectionSpec>,
    ) -> Self {
        self.inputs.push(InputSpec {
            name: name.into(),
            kind: InputKind::Statement,
            connection: spec.into(),
        });
        self
    }
}
