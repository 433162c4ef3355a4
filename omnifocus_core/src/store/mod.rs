// src/store/mod.rs
// Abstract entity store. The resolver and mutation primitives only ever
// talk to this trait, so they can be exercised against the in-memory
// store without a live OmniFocus.

pub mod memory;
pub mod omnijs;

use async_trait::async_trait;
use serde_json::Value;

use crate::error::OmniFocusError;
use crate::model::{Domain, Entity, FolderStatus, ProjectStatus, TagStatus};

pub use memory::MemoryStore;
pub use omnijs::OmniJsStore;

/// Three-state edit field: leave unchanged, clear to absent, or set.
/// Omitting a field on the wire maps to `Keep`; an explicit JSON `null`
/// maps to `Clear`. The distinction is the difference between a no-op
/// and deleting a value.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum Patch<T> {
    #[default]
    Keep,
    Clear,
    Set(T),
}

impl<T> Patch<T> {
    pub fn from_double_option(value: Option<Option<T>>) -> Self {
        match value {
            None => Patch::Keep,
            Some(None) => Patch::Clear,
            Some(Some(v)) => Patch::Set(v),
        }
    }

    pub fn is_keep(&self) -> bool {
        matches!(self, Patch::Keep)
    }

    /// Apply this patch to a slot in place.
    pub fn apply_to(self, slot: &mut Option<T>) {
        match self {
            Patch::Keep => {}
            Patch::Clear => *slot = None,
            Patch::Set(v) => *slot = Some(v),
        }
    }
}

/// Where to insert an entity inside its destination container.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum Placement {
    Beginning,
    #[default]
    Ending,
    /// Sibling id resolved before the request is built.
    Before(String),
    After(String),
}

/// Destination for a task move: a project or back to the inbox.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TaskDestination {
    Project(String),
    Inbox,
}

/// One mutation against the OmniFocus database, with typed parameters.
/// The live store translates each request into an OmniJS program; the
/// in-memory store applies it directly. All id references are already
/// resolved by the time a request is constructed.
#[derive(Debug, Clone)]
pub enum ScriptRequest {
    CreateFolder {
        name: String,
        parent_id: Option<String>,
        placement: Placement,
    },
    UpdateFolder {
        id: String,
        name: Option<String>,
        status: Option<FolderStatus>,
    },
    DeleteFolder {
        id: String,
    },
    MoveFolder {
        id: String,
        /// None moves to the library root.
        parent_id: Option<String>,
        placement: Placement,
    },

    CreateProject {
        name: String,
        folder_id: Option<String>,
        note: Option<String>,
        sequential: bool,
        contains_singleton_actions: bool,
        defer_date: Option<String>,
        due_date: Option<String>,
        review_interval_weeks: Option<u32>,
        estimated_minutes: Option<u32>,
    },
    UpdateProject {
        id: String,
        name: Option<String>,
        note: Option<String>,
        status: Option<ProjectStatus>,
        sequential: Option<bool>,
        contains_singleton_actions: Option<bool>,
        defer_date: Patch<String>,
        due_date: Patch<String>,
        review_interval_weeks: Patch<u32>,
        estimated_minutes: Patch<u32>,
    },
    DeleteProject {
        id: String,
    },
    MoveProject {
        id: String,
        /// None moves to the library root.
        folder_id: Option<String>,
        placement: Placement,
    },

    CreateTag {
        name: String,
        parent_id: Option<String>,
    },
    UpdateTag {
        id: String,
        name: Option<String>,
        status: Option<TagStatus>,
        allows_next_action: Option<bool>,
    },
    DeleteTag {
        id: String,
    },

    CreateTask {
        name: String,
        project_id: Option<String>,
        parent_task_id: Option<String>,
        note: Option<String>,
        flagged: bool,
        due_date: Option<String>,
        defer_date: Option<String>,
        planned_date: Option<String>,
        tag_ids: Vec<String>,
    },
    UpdateTask {
        id: String,
        name: Option<String>,
        note: Option<String>,
        flagged: Option<bool>,
        due_date: Patch<String>,
        defer_date: Patch<String>,
        planned_date: Patch<String>,
    },
    DeleteTask {
        id: String,
    },
    MoveTask {
        id: String,
        destination: TaskDestination,
    },
    CompleteTask {
        id: String,
    },
    AppendNote {
        task_id: String,
        text: String,
    },
    AddTags {
        task_id: String,
        tag_ids: Vec<String>,
    },
    RemoveTags {
        task_id: String,
        tag_ids: Vec<String>,
    },
}

/// Snapshot reads and id-addressed mutations against the OmniFocus
/// database. No caching: every query re-reads the current state, so two
/// nearly-simultaneous calls may observe different data.
#[async_trait]
pub trait EntityStore: Send + Sync {
    async fn query(&self, domain: Domain) -> Result<Vec<Entity>, OmniFocusError>;
    async fn mutate(&self, request: ScriptRequest) -> Result<Value, OmniFocusError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn patch_from_double_option() {
        assert_eq!(Patch::<String>::from_double_option(None), Patch::Keep);
        assert_eq!(Patch::<String>::from_double_option(Some(None)), Patch::Clear);
        assert_eq!(
            Patch::from_double_option(Some(Some("x".to_string()))),
            Patch::Set("x".to_string())
        );
    }

    #[test]
    fn patch_apply_semantics() {
        let mut slot = Some(10u32);
        Patch::Keep.apply_to(&mut slot);
        assert_eq!(slot, Some(10));
        Patch::Set(7).apply_to(&mut slot);
        assert_eq!(slot, Some(7));
        Patch::<u32>::Clear.apply_to(&mut slot);
        assert_eq!(slot, None);
    }
}
