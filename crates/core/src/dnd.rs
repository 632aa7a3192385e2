//! Drag and drop over task rows and day containers.
//!
//! The controller only tracks the gesture. It turns a completed drop into a
//! [`DragCommand`] that the task store applies.

use tracing::debug;

use crate::model::DateKey;

/// What the presentation hands over when a drag starts. An id is required;
/// payloads without one are dropped on the floor.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DragPayload {
    pub id: Option<String>,
    pub date: DateKey,
}

impl DragPayload {
    pub fn task(id: impl Into<String>, date: DateKey) -> Self {
        Self {
            id: Some(id.into()),
            date,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DropTarget {
    /// A day cell, outside any task row.
    Day(DateKey),
    /// A specific task row.
    Row { task_id: String, date: DateKey },
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum DragState {
    #[default]
    Idle,
    Dragging {
        id: String,
        source: DateKey,
    },
    Hovering {
        id: String,
        source: DateKey,
        target: DropTarget,
    },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DragCommand {
    Move {
        id: String,
        to: DateKey,
    },
    Reorder {
        drag_id: String,
        hover_id: String,
        target_date: DateKey,
    },
}

#[derive(Debug, Clone, Default)]
pub struct DragController {
    state: DragState,
}

impl DragController {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn state(&self) -> &DragState {
        &self.state
    }

    pub fn is_dragging(&self) -> bool {
        !matches!(self.state, DragState::Idle)
    }

    pub fn dragged_id(&self) -> Option<&str> {
        match &self.state {
            DragState::Idle => None,
            DragState::Dragging { id, .. } | DragState::Hovering { id, .. } => Some(id),
        }
    }

    pub fn target(&self) -> Option<&DropTarget> {
        match &self.state {
            DragState::Hovering { target, .. } => Some(target),
            _ => None,
        }
    }

    /// Start dragging. Returns `false` when the payload carries no id.
    pub fn begin(&mut self, payload: DragPayload) -> bool {
        let Some(id) = payload.id.filter(|id| !id.is_empty()) else {
            debug!("ignored drag payload without task id");
            return false;
        };
        self.state = DragState::Dragging {
            id,
            source: payload.date,
        };
        true
    }

    /// Record the target under the pointer. Repeating the current target is a
    /// no-op; returns whether the state changed.
    pub fn hover(&mut self, target: DropTarget) -> bool {
        let (id, source) = match &self.state {
            DragState::Idle => return false,
            DragState::Hovering {
                target: current, ..
            } if *current == target => return false,
            DragState::Dragging { id, source } | DragState::Hovering { id, source, .. } => {
                (id.clone(), *source)
            }
        };
        self.state = DragState::Hovering { id, source, target };
        true
    }

    /// Pointer left every target while still dragging.
    pub fn leave(&mut self) {
        if let DragState::Hovering { id, source, .. } = &self.state {
            self.state = DragState::Dragging {
                id: id.clone(),
                source: *source,
            };
        }
    }

    /// Finish the gesture and return to idle. Dropping onto the source day,
    /// onto the dragged row itself, or nowhere yields no command.
    pub fn drop(&mut self) -> Option<DragCommand> {
        let state = std::mem::take(&mut self.state);
        let DragState::Hovering { id, source, target } = state else {
            return None;
        };
        match target {
            DropTarget::Day(date) if date != source => Some(DragCommand::Move { id, to: date }),
            DropTarget::Day(_) => None,
            DropTarget::Row { task_id, .. } if task_id == id => None,
            DropTarget::Row { task_id, date } => Some(DragCommand::Reorder {
                drag_id: id,
                hover_id: task_id,
                target_date: date,
            }),
        }
    }

    pub fn cancel(&mut self) {
        self.state = DragState::Idle;
    }
}
