use std::collections::HashMap;
use std::sync::Arc;

use crate::model::ViewNode;
use crate::resolver::NameTable;
use crate::snapshot::Snapshot;

/// Declarative-subtree display mode, cycled off → compact → full → off.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub(super) enum SubtreeMode {
    #[default]
    Off,
    Compact,
    Full,
}

impl SubtreeMode {
    pub(super) fn next(self) -> Self {
        match self {
            SubtreeMode::Off => SubtreeMode::Compact,
            SubtreeMode::Compact => SubtreeMode::Full,
            SubtreeMode::Full => SubtreeMode::Off,
        }
    }
}

/// Messages marshalled onto the UI loop. Background tasks never touch
/// widgets; they deposit state into the session and send one of these.
#[derive(Debug)]
pub(super) enum UiEvent {
    Tick,
    SnapshotLoaded(Result<(), String>),
    SubtreeDone { error: Option<String> },
}

/// Shared session state. All fields are owned by one mutex; both the
/// UI loop and background fetch tasks lock it, and it is never held
/// across an I/O call.
#[derive(Default)]
pub(super) struct Session {
    pub(super) snapshot: Option<Arc<Snapshot>>,
    pub(super) resolved: Option<Arc<NameTable>>,
    pub(super) addr_index: HashMap<String, String>,

    pub(super) detail: Option<ViewNode>,
    pub(super) subtree_raw: Option<Vec<u8>>,
    pub(super) subtree_mode: SubtreeMode,
    pub(super) subtree_fetching: bool,
}

impl Session {
    /// Clears per-node detail state when the selection changes.
    pub(super) fn select_detail(&mut self, detail: ViewNode) {
        self.detail = Some(detail);
        self.subtree_raw = None;
        self.subtree_mode = SubtreeMode::Off;
        self.subtree_fetching = false;
    }
}
