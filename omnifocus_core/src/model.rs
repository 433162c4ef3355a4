// src/model.rs
// Entity shapes as read from / written to the OmniFocus database. This
// layer owns no persistent state: every value here is a snapshot taken at
// call time through the EntityStore.

use serde::{Deserialize, Serialize};

/// Search domain for lookups.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Domain {
    Folders,
    Projects,
    Tasks,
    Tags,
}

impl Domain {
    /// Singular label used in user-facing error messages.
    pub fn entity_label(&self) -> &'static str {
        match self {
            Domain::Folders => "Folder",
            Domain::Projects => "Project",
            Domain::Tasks => "Task",
            Domain::Tags => "Tag",
        }
    }
}

/// An id-or-name reference to an entity. At least one side must be
/// populated before a lookup is attempted; empty-after-trim names are
/// normalized away at construction so the resolver never sees them.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EntityRef {
    pub id: Option<String>,
    pub name: Option<String>,
}

impl EntityRef {
    pub fn new(id: Option<String>, name: Option<String>) -> Self {
        let id = id.map(|s| s.trim().to_string()).filter(|s| !s.is_empty());
        let name = name.map(|s| s.trim().to_string()).filter(|s| !s.is_empty());
        Self { id, name }
    }

    pub fn by_id(id: impl Into<String>) -> Self {
        Self::new(Some(id.into()), None)
    }

    pub fn by_name(name: impl Into<String>) -> Self {
        Self::new(None, Some(name.into()))
    }

    pub fn is_empty(&self) -> bool {
        self.id.is_none() && self.name.is_none()
    }

    /// The identifier to show in "not found" messages: the id when given,
    /// otherwise the name.
    pub fn describe(&self) -> String {
        self.id
            .clone()
            .or_else(|| self.name.clone())
            .unwrap_or_default()
    }
}

/// Narrows a lookup to the direct children of a parent container.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Scope {
    pub parent_id: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum FolderStatus {
    Active,
    Dropped,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ProjectStatus {
    Active,
    OnHold,
    Done,
    Dropped,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TagStatus {
    Active,
    OnHold,
    Dropped,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TaskStatus {
    Available,
    Blocked,
    DueSoon,
    Next,
    Overdue,
    Completed,
    Dropped,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Folder {
    pub id: String,
    pub name: String,
    pub status: FolderStatus,
    /// None means the folder sits at the library root.
    pub parent_id: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Project {
    pub id: String,
    pub name: String,
    pub status: ProjectStatus,
    pub folder_id: Option<String>,
    pub sequential: bool,
    pub contains_singleton_actions: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub note: Option<String>,
    pub defer_date: Option<String>,
    pub due_date: Option<String>,
    pub review_interval_weeks: Option<u32>,
    pub estimated_minutes: Option<u32>,
    pub task_count: u32,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TagRef {
    pub id: String,
    pub name: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Task {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub note: String,
    pub flagged: bool,
    pub status: TaskStatus,
    pub due_date: Option<String>,
    pub defer_date: Option<String>,
    pub planned_date: Option<String>,
    #[serde(default)]
    pub tags: Vec<TagRef>,
    /// Parent task, for nested actions.
    pub parent_id: Option<String>,
    /// Containing project; None for inbox tasks and child actions.
    pub project_id: Option<String>,
    #[serde(default)]
    pub in_inbox: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Tag {
    pub id: String,
    pub name: String,
    pub status: TagStatus,
    pub parent_id: Option<String>,
    pub allows_next_action: bool,
    pub task_count: u32,
}

/// A domain snapshot entry. The resolver only needs id, name, and parent
/// linkage; tools downcast to the concrete shape after resolution.
#[derive(Debug, Clone)]
pub enum Entity {
    Folder(Folder),
    Project(Project),
    Task(Task),
    Tag(Tag),
}

impl Entity {
    pub fn id(&self) -> &str {
        match self {
            Entity::Folder(f) => &f.id,
            Entity::Project(p) => &p.id,
            Entity::Task(t) => &t.id,
            Entity::Tag(t) => &t.id,
        }
    }

    pub fn name(&self) -> &str {
        match self {
            Entity::Folder(f) => &f.name,
            Entity::Project(p) => &p.name,
            Entity::Task(t) => &t.name,
            Entity::Tag(t) => &t.name,
        }
    }

    /// Container linkage used for scope narrowing. Tasks are considered
    /// children of both their parent task and their containing project.
    pub fn belongs_to(&self, parent_id: &str) -> bool {
        match self {
            Entity::Folder(f) => f.parent_id.as_deref() == Some(parent_id),
            Entity::Project(p) => p.folder_id.as_deref() == Some(parent_id),
            Entity::Task(t) => {
                t.parent_id.as_deref() == Some(parent_id)
                    || t.project_id.as_deref() == Some(parent_id)
            }
            Entity::Tag(t) => t.parent_id.as_deref() == Some(parent_id),
        }
    }

    pub fn as_folder(&self) -> Option<&Folder> {
        match self {
            Entity::Folder(f) => Some(f),
            _ => None,
        }
    }

    pub fn as_project(&self) -> Option<&Project> {
        match self {
            Entity::Project(p) => Some(p),
            _ => None,
        }
    }

    pub fn as_task(&self) -> Option<&Task> {
        match self {
            Entity::Task(t) => Some(t),
            _ => None,
        }
    }

    pub fn as_tag(&self) -> Option<&Tag> {
        match self {
            Entity::Tag(t) => Some(t),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn entity_ref_trims_and_drops_empty() {
        let r = EntityRef::new(Some("  ".into()), Some("  Work  ".into()));
        assert!(r.id.is_none());
        assert_eq!(r.name.as_deref(), Some("Work"));

        let empty = EntityRef::new(Some("".into()), Some("   ".into()));
        assert!(empty.is_empty());
    }

    #[test]
    fn describe_prefers_id() {
        let r = EntityRef::new(Some("abc123".into()), Some("Errands".into()));
        assert_eq!(r.describe(), "abc123");
        assert_eq!(EntityRef::by_name("Errands").describe(), "Errands");
    }
}
