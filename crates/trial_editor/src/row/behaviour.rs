//! Static per-row configuration

use trial_core::{FrameId, InsertPoint};

/// What the action cell edits
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ActionDescriptor {
    /// No action cell
    #[default]
    None,
    /// A single named action with parameters
    Simple,
    /// A list of contradictions (cross-examination statements)
    Contradiction,
}

/// Which operations a row allows. Supplied by the caller and fixed for the
/// row's lifetime.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct RowBehaviour {
    /// Where this row inserts frames; rows with an insert point are drop targets
    pub insert: Option<InsertPoint>,
    /// Whether the row can be deleted (and therefore dragged)
    pub deletable: bool,
    pub block_insert_enabled: bool,
    /// Merge and wait-timer controls
    pub flow_controls_enabled: bool,
    pub action: ActionDescriptor,
}

impl RowBehaviour {
    /// The usual frame row: inserts before itself, deletable, flow controls,
    /// simple action.
    pub fn standard(frame_id: FrameId) -> Self {
        Self {
            insert: Some(InsertPoint::Before(frame_id)),
            deletable: true,
            block_insert_enabled: true,
            flow_controls_enabled: true,
            action: ActionDescriptor::Simple,
        }
    }

    /// A statement of a cross-examination
    pub fn statement(frame_id: FrameId) -> Self {
        Self {
            block_insert_enabled: false,
            action: ActionDescriptor::Contradiction,
            ..Self::standard(frame_id)
        }
    }

    /// Read-only framing row (e.g. the start of a block)
    pub fn fixed() -> Self {
        Self::default()
    }

    pub fn with_block_insert(mut self, enabled: bool) -> Self {
        self.block_insert_enabled = enabled;
        self
    }
}
