// src/store/memory.rs
// In-memory EntityStore used by the test suite. Mirrors the database's
// native behavior for deletes (cascading), so the primitives that are
// supposed to avoid cascades can be checked against it.

use async_trait::async_trait;
use serde_json::{json, Value};
use tokio::sync::Mutex;

use crate::error::OmniFocusError;
use crate::model::{
    Domain, Entity, Folder, FolderStatus, Project, ProjectStatus, Tag, TagRef, TagStatus, Task,
    TaskStatus,
};
use crate::store::{EntityStore, Placement, ScriptRequest, TaskDestination};

#[derive(Default)]
struct Inner {
    folders: Vec<Folder>,
    projects: Vec<Project>,
    tasks: Vec<Task>,
    tags: Vec<Tag>,
    next_id: u64,
}

impl Inner {
    fn fresh_id(&mut self, prefix: &str) -> String {
        self.next_id += 1;
        format!("{}-{}", prefix, self.next_id)
    }

    fn vanished(class: &str, id: &str) -> OmniFocusError {
        OmniFocusError::External(format!("{} vanished: {}", class, id))
    }

    fn folder_index(&self, id: &str) -> Result<usize, OmniFocusError> {
        self.folders
            .iter()
            .position(|f| f.id == id)
            .ok_or_else(|| Self::vanished("Folder", id))
    }

    fn project_index(&self, id: &str) -> Result<usize, OmniFocusError> {
        self.projects
            .iter()
            .position(|p| p.id == id)
            .ok_or_else(|| Self::vanished("Project", id))
    }

    fn task_index(&self, id: &str) -> Result<usize, OmniFocusError> {
        self.tasks
            .iter()
            .position(|t| t.id == id)
            .ok_or_else(|| Self::vanished("Task", id))
    }

    fn tag_index(&self, id: &str) -> Result<usize, OmniFocusError> {
        self.tags
            .iter()
            .position(|t| t.id == id)
            .ok_or_else(|| Self::vanished("Tag", id))
    }

    /// The folder plus all folders nested under it.
    fn descendant_folder_ids(&self, root: &str) -> Vec<String> {
        let mut ids = vec![root.to_string()];
        let mut frontier = vec![root.to_string()];
        while let Some(current) = frontier.pop() {
            for f in &self.folders {
                if f.parent_id.as_deref() == Some(current.as_str()) {
                    ids.push(f.id.clone());
                    frontier.push(f.id.clone());
                }
            }
        }
        ids
    }

    fn descendant_tag_ids(&self, root: &str) -> Vec<String> {
        let mut ids = vec![root.to_string()];
        let mut frontier = vec![root.to_string()];
        while let Some(current) = frontier.pop() {
            for t in &self.tags {
                if t.parent_id.as_deref() == Some(current.as_str()) {
                    ids.push(t.id.clone());
                    frontier.push(t.id.clone());
                }
            }
        }
        ids
    }
}

/// Insert position within a sibling list, honoring placement.
fn insertion_index<T>(
    items: &[T],
    placement: &Placement,
    id_of: impl Fn(&T) -> &str,
) -> usize {
    match placement {
        Placement::Beginning => 0,
        Placement::Ending => items.len(),
        Placement::Before(sibling) => items
            .iter()
            .position(|i| id_of(i) == sibling)
            .unwrap_or(items.len()),
        Placement::After(sibling) => items
            .iter()
            .position(|i| id_of(i) == sibling)
            .map(|i| i + 1)
            .unwrap_or(items.len()),
    }
}

#[derive(Default)]
pub struct MemoryStore {
    inner: Mutex<Inner>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    // ---- seeding helpers for tests ----

    pub async fn seed_folder(&self, name: &str, parent_id: Option<&str>) -> String {
        let mut inner = self.inner.lock().await;
        let id = inner.fresh_id("folder");
        inner.folders.push(Folder {
            id: id.clone(),
            name: name.to_string(),
            status: FolderStatus::Active,
            parent_id: parent_id.map(str::to_string),
        });
        id
    }

    pub async fn seed_project(&self, name: &str, folder_id: Option<&str>) -> String {
        let mut inner = self.inner.lock().await;
        let id = inner.fresh_id("project");
        inner.projects.push(Project {
            id: id.clone(),
            name: name.to_string(),
            status: ProjectStatus::Active,
            folder_id: folder_id.map(str::to_string),
            sequential: false,
            contains_singleton_actions: false,
            note: None,
            defer_date: None,
            due_date: None,
            review_interval_weeks: None,
            estimated_minutes: None,
            task_count: 0,
        });
        id
    }

    pub async fn seed_task(&self, name: &str, project_id: Option<&str>) -> String {
        let mut inner = self.inner.lock().await;
        let id = inner.fresh_id("task");
        inner.tasks.push(Task {
            id: id.clone(),
            name: name.to_string(),
            note: String::new(),
            flagged: false,
            status: TaskStatus::Available,
            due_date: None,
            defer_date: None,
            planned_date: None,
            tags: Vec::new(),
            parent_id: None,
            project_id: project_id.map(str::to_string),
            in_inbox: project_id.is_none(),
        });
        id
    }

    pub async fn seed_tag(&self, name: &str, parent_id: Option<&str>) -> String {
        let mut inner = self.inner.lock().await;
        let id = inner.fresh_id("tag");
        inner.tags.push(Tag {
            id: id.clone(),
            name: name.to_string(),
            status: TagStatus::Active,
            parent_id: parent_id.map(str::to_string),
            allows_next_action: true,
            task_count: 0,
        });
        id
    }

    /// Counts used by tests to assert cascade vs relocate behavior.
    pub async fn counts(&self) -> (usize, usize, usize, usize) {
        let inner = self.inner.lock().await;
        (
            inner.folders.len(),
            inner.projects.len(),
            inner.tasks.len(),
            inner.tags.len(),
        )
    }
}

#[async_trait]
impl EntityStore for MemoryStore {
    async fn query(&self, domain: Domain) -> Result<Vec<Entity>, OmniFocusError> {
        let inner = self.inner.lock().await;
        Ok(match domain {
            Domain::Folders => inner.folders.iter().cloned().map(Entity::Folder).collect(),
            Domain::Projects => inner
                .projects
                .iter()
                .map(|p| {
                    let mut p = p.clone();
                    p.task_count = inner
                        .tasks
                        .iter()
                        .filter(|t| t.project_id.as_deref() == Some(p.id.as_str()))
                        .count() as u32;
                    Entity::Project(p)
                })
                .collect(),
            Domain::Tasks => inner.tasks.iter().cloned().map(Entity::Task).collect(),
            Domain::Tags => inner
                .tags
                .iter()
                .map(|g| {
                    let mut g = g.clone();
                    g.task_count = inner
                        .tasks
                        .iter()
                        .filter(|t| {
                            t.status != TaskStatus::Completed
                                && t.tags.iter().any(|r| r.id == g.id)
                        })
                        .count() as u32;
                    Entity::Tag(g)
                })
                .collect(),
        })
    }

    async fn mutate(&self, request: ScriptRequest) -> Result<Value, OmniFocusError> {
        let mut inner = self.inner.lock().await;
        match request {
            ScriptRequest::CreateFolder {
                name,
                parent_id,
                placement,
            } => {
                let id = inner.fresh_id("folder");
                let folder = Folder {
                    id: id.clone(),
                    name: name.clone(),
                    status: FolderStatus::Active,
                    parent_id,
                };
                let at = insertion_index(&inner.folders, &placement, |f| &f.id);
                inner.folders.insert(at, folder);
                Ok(json!({"id": id, "name": name}))
            }
            ScriptRequest::UpdateFolder { id, name, status } => {
                let idx = inner.folder_index(&id)?;
                if let Some(n) = name {
                    inner.folders[idx].name = n;
                }
                if let Some(s) = status {
                    inner.folders[idx].status = s;
                }
                Ok(json!({"id": id, "name": inner.folders[idx].name.clone()}))
            }
            ScriptRequest::DeleteFolder { id } => {
                let idx = inner.folder_index(&id)?;
                let name = inner.folders[idx].name.clone();
                // Native cascade: nested folders, their projects, and those
                // projects' tasks all go with the folder.
                let doomed = inner.descendant_folder_ids(&id);
                let doomed_projects: Vec<String> = inner
                    .projects
                    .iter()
                    .filter(|p| {
                        p.folder_id
                            .as_deref()
                            .map(|f| doomed.iter().any(|d| d == f))
                            .unwrap_or(false)
                    })
                    .map(|p| p.id.clone())
                    .collect();
                inner
                    .tasks
                    .retain(|t| match t.project_id.as_deref() {
                        Some(p) => !doomed_projects.iter().any(|d| d == p),
                        None => true,
                    });
                inner
                    .projects
                    .retain(|p| !doomed_projects.iter().any(|d| d == &p.id));
                inner.folders.retain(|f| !doomed.iter().any(|d| d == &f.id));
                Ok(json!({"id": id, "name": name}))
            }
            ScriptRequest::MoveFolder {
                id,
                parent_id,
                placement,
            } => {
                let idx = inner.folder_index(&id)?;
                let mut folder = inner.folders.remove(idx);
                folder.parent_id = parent_id;
                let at = insertion_index(&inner.folders, &placement, |f| &f.id);
                let name = folder.name.clone();
                inner.folders.insert(at, folder);
                Ok(json!({"id": id, "name": name}))
            }

            ScriptRequest::CreateProject {
                name,
                folder_id,
                note,
                sequential,
                contains_singleton_actions,
                defer_date,
                due_date,
                review_interval_weeks,
                estimated_minutes,
            } => {
                let id = inner.fresh_id("project");
                inner.projects.push(Project {
                    id: id.clone(),
                    name: name.clone(),
                    status: ProjectStatus::Active,
                    folder_id,
                    sequential,
                    contains_singleton_actions,
                    note,
                    defer_date,
                    due_date,
                    review_interval_weeks,
                    estimated_minutes,
                    task_count: 0,
                });
                Ok(json!({"id": id, "name": name}))
            }
            ScriptRequest::UpdateProject {
                id,
                name,
                note,
                status,
                sequential,
                contains_singleton_actions,
                defer_date,
                due_date,
                review_interval_weeks,
                estimated_minutes,
            } => {
                let idx = inner.project_index(&id)?;
                let p = &mut inner.projects[idx];
                if let Some(n) = name {
                    p.name = n;
                }
                if let Some(n) = note {
                    p.note = Some(n);
                }
                if let Some(s) = status {
                    p.status = s;
                }
                if let Some(s) = sequential {
                    p.sequential = s;
                }
                if let Some(s) = contains_singleton_actions {
                    p.contains_singleton_actions = s;
                }
                defer_date.apply_to(&mut p.defer_date);
                due_date.apply_to(&mut p.due_date);
                review_interval_weeks.apply_to(&mut p.review_interval_weeks);
                estimated_minutes.apply_to(&mut p.estimated_minutes);
                Ok(json!({"id": id, "name": p.name.clone()}))
            }
            ScriptRequest::DeleteProject { id } => {
                let idx = inner.project_index(&id)?;
                let name = inner.projects[idx].name.clone();
                let before = inner.tasks.len();
                inner
                    .tasks
                    .retain(|t| t.project_id.as_deref() != Some(id.as_str()));
                let task_count = before - inner.tasks.len();
                inner.projects.remove(idx);
                Ok(json!({"id": id, "name": name, "taskCount": task_count}))
            }
            ScriptRequest::MoveProject {
                id,
                folder_id,
                placement,
            } => {
                let idx = inner.project_index(&id)?;
                let mut project = inner.projects.remove(idx);
                project.folder_id = folder_id;
                let at = insertion_index(&inner.projects, &placement, |p| &p.id);
                let name = project.name.clone();
                inner.projects.insert(at, project);
                Ok(json!({"id": id, "name": name}))
            }

            ScriptRequest::CreateTag { name, parent_id } => {
                let id = inner.fresh_id("tag");
                inner.tags.push(Tag {
                    id: id.clone(),
                    name: name.clone(),
                    status: TagStatus::Active,
                    parent_id,
                    allows_next_action: true,
                    task_count: 0,
                });
                Ok(json!({"id": id, "name": name}))
            }
            ScriptRequest::UpdateTag {
                id,
                name,
                status,
                allows_next_action,
            } => {
                let idx = inner.tag_index(&id)?;
                let renamed = name.clone();
                {
                    let g = &mut inner.tags[idx];
                    if let Some(n) = name {
                        g.name = n;
                    }
                    if let Some(s) = status {
                        g.status = s;
                    }
                    if let Some(a) = allows_next_action {
                        g.allows_next_action = a;
                    }
                }
                // Task tag references carry the name; keep them in sync.
                if let Some(new_name) = renamed {
                    for t in &mut inner.tasks {
                        for r in &mut t.tags {
                            if r.id == id {
                                r.name = new_name.clone();
                            }
                        }
                    }
                }
                let name = inner.tags[idx].name.clone();
                Ok(json!({"id": id, "name": name}))
            }
            ScriptRequest::DeleteTag { id } => {
                let idx = inner.tag_index(&id)?;
                let name = inner.tags[idx].name.clone();
                // Native cascade: child tags go too, and every task loses
                // the deleted references.
                let doomed = inner.descendant_tag_ids(&id);
                inner.tags.retain(|t| !doomed.iter().any(|d| d == &t.id));
                for t in &mut inner.tasks {
                    t.tags.retain(|r| !doomed.iter().any(|d| d == &r.id));
                }
                Ok(json!({"id": id, "name": name}))
            }

            ScriptRequest::CreateTask {
                name,
                project_id,
                parent_task_id,
                note,
                flagged,
                due_date,
                defer_date,
                planned_date,
                tag_ids,
            } => {
                let tags: Vec<TagRef> = tag_ids
                    .iter()
                    .filter_map(|id| {
                        inner.tags.iter().find(|g| &g.id == id).map(|g| TagRef {
                            id: g.id.clone(),
                            name: g.name.clone(),
                        })
                    })
                    .collect();
                // A child task inherits its parent's project.
                let project_id = match (&project_id, &parent_task_id) {
                    (Some(p), _) => Some(p.clone()),
                    (None, Some(parent)) => inner
                        .tasks
                        .iter()
                        .find(|t| &t.id == parent)
                        .and_then(|t| t.project_id.clone()),
                    (None, None) => None,
                };
                let id = inner.fresh_id("task");
                let in_inbox = project_id.is_none() && parent_task_id.is_none();
                inner.tasks.push(Task {
                    id: id.clone(),
                    name: name.clone(),
                    note: note.unwrap_or_default(),
                    flagged,
                    status: TaskStatus::Available,
                    due_date,
                    defer_date,
                    planned_date,
                    tags,
                    parent_id: parent_task_id,
                    project_id,
                    in_inbox,
                });
                Ok(json!({"id": id, "name": name}))
            }
            ScriptRequest::UpdateTask {
                id,
                name,
                note,
                flagged,
                due_date,
                defer_date,
                planned_date,
            } => {
                let idx = inner.task_index(&id)?;
                let t = &mut inner.tasks[idx];
                if let Some(n) = name {
                    t.name = n;
                }
                if let Some(n) = note {
                    t.note = n;
                }
                if let Some(f) = flagged {
                    t.flagged = f;
                }
                due_date.apply_to(&mut t.due_date);
                defer_date.apply_to(&mut t.defer_date);
                planned_date.apply_to(&mut t.planned_date);
                Ok(json!({"id": id, "name": t.name.clone()}))
            }
            ScriptRequest::DeleteTask { id } => {
                let idx = inner.task_index(&id)?;
                let name = inner.tasks[idx].name.clone();
                inner.tasks.remove(idx);
                // Children of a deleted task go with it.
                inner
                    .tasks
                    .retain(|t| t.parent_id.as_deref() != Some(id.as_str()));
                Ok(json!({"id": id, "name": name}))
            }
            ScriptRequest::MoveTask { id, destination } => {
                let idx = inner.task_index(&id)?;
                let t = &mut inner.tasks[idx];
                match destination {
                    TaskDestination::Project(pid) => {
                        t.project_id = Some(pid);
                        t.parent_id = None;
                        t.in_inbox = false;
                    }
                    TaskDestination::Inbox => {
                        t.project_id = None;
                        t.parent_id = None;
                        t.in_inbox = true;
                    }
                }
                Ok(json!({"id": id, "name": t.name.clone()}))
            }
            ScriptRequest::CompleteTask { id } => {
                let idx = inner.task_index(&id)?;
                let t = &mut inner.tasks[idx];
                t.status = TaskStatus::Completed;
                Ok(json!({"id": id, "name": t.name.clone(), "completed": true}))
            }
            ScriptRequest::AppendNote { task_id, text } => {
                let idx = inner.task_index(&task_id)?;
                let t = &mut inner.tasks[idx];
                if t.note.is_empty() {
                    t.note = text;
                } else {
                    t.note.push('\n');
                    t.note.push_str(&text);
                }
                Ok(json!({"id": task_id, "name": t.name.clone()}))
            }
            ScriptRequest::AddTags { task_id, tag_ids } => {
                let refs: Vec<TagRef> = tag_ids
                    .iter()
                    .filter_map(|id| {
                        inner.tags.iter().find(|g| &g.id == id).map(|g| TagRef {
                            id: g.id.clone(),
                            name: g.name.clone(),
                        })
                    })
                    .collect();
                let idx = inner.task_index(&task_id)?;
                let t = &mut inner.tasks[idx];
                for r in refs {
                    if !t.tags.iter().any(|existing| existing.id == r.id) {
                        t.tags.push(r);
                    }
                }
                Ok(json!({"id": task_id, "name": t.name.clone()}))
            }
            ScriptRequest::RemoveTags { task_id, tag_ids } => {
                let idx = inner.task_index(&task_id)?;
                let t = &mut inner.tasks[idx];
                t.tags.retain(|r| !tag_ids.iter().any(|id| id == &r.id));
                Ok(json!({"id": task_id, "name": t.name.clone()}))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::Patch;

    #[tokio::test]
    async fn delete_folder_cascades_natively() {
        let store = MemoryStore::new();
        let top = store.seed_folder("Top", None).await;
        let sub = store.seed_folder("Sub", Some(&top)).await;
        let project = store.seed_project("Inside", Some(&sub)).await;
        store.seed_task("One", Some(&project)).await;
        store.seed_folder("Other", None).await;

        store
            .mutate(ScriptRequest::DeleteFolder { id: top.clone() })
            .await
            .unwrap();

        let (folders, projects, tasks, _) = store.counts().await;
        assert_eq!(folders, 1);
        assert_eq!(projects, 0);
        assert_eq!(tasks, 0);
    }

    #[tokio::test]
    async fn delete_tag_strips_task_references() {
        let store = MemoryStore::new();
        let tag = store.seed_tag("errand", None).await;
        let child = store.seed_tag("errand-child", Some(&tag)).await;
        let task = store.seed_task("Buy milk", None).await;
        store
            .mutate(ScriptRequest::AddTags {
                task_id: task.clone(),
                tag_ids: vec![tag.clone(), child.clone()],
            })
            .await
            .unwrap();

        store
            .mutate(ScriptRequest::DeleteTag { id: tag })
            .await
            .unwrap();

        let tasks = store.query(Domain::Tasks).await.unwrap();
        let t = tasks[0].as_task().unwrap();
        assert!(t.tags.is_empty());
        let (_, _, _, tags) = store.counts().await;
        assert_eq!(tags, 0);
    }

    #[tokio::test]
    async fn update_task_patch_clears_dates() {
        let store = MemoryStore::new();
        let id = store.seed_task("Dated", None).await;
        store
            .mutate(ScriptRequest::UpdateTask {
                id: id.clone(),
                name: None,
                note: None,
                flagged: None,
                due_date: Patch::Set("2026-09-01T17:00:00".into()),
                defer_date: Patch::Keep,
                planned_date: Patch::Keep,
            })
            .await
            .unwrap();
        store
            .mutate(ScriptRequest::UpdateTask {
                id: id.clone(),
                name: Some("Renamed".into()),
                note: None,
                flagged: None,
                due_date: Patch::Clear,
                defer_date: Patch::Keep,
                planned_date: Patch::Keep,
            })
            .await
            .unwrap();

        let tasks = store.query(Domain::Tasks).await.unwrap();
        let t = tasks[0].as_task().unwrap();
        assert_eq!(t.name, "Renamed");
        assert!(t.due_date.is_none());
    }

    #[tokio::test]
    async fn move_task_between_inbox_and_project() {
        let store = MemoryStore::new();
        let project = store.seed_project("Dest", None).await;
        let task = store.seed_task("Drifter", None).await;

        store
            .mutate(ScriptRequest::MoveTask {
                id: task.clone(),
                destination: TaskDestination::Project(project.clone()),
            })
            .await
            .unwrap();
        let tasks = store.query(Domain::Tasks).await.unwrap();
        let t = tasks[0].as_task().unwrap();
        assert_eq!(t.project_id.as_deref(), Some(project.as_str()));
        assert!(!t.in_inbox);

        store
            .mutate(ScriptRequest::MoveTask {
                id: task,
                destination: TaskDestination::Inbox,
            })
            .await
            .unwrap();
        let tasks = store.query(Domain::Tasks).await.unwrap();
        let t = tasks[0].as_task().unwrap();
        assert!(t.project_id.is_none());
        assert!(t.in_inbox);
    }

    #[tokio::test]
    async fn project_task_count_is_live() {
        let store = MemoryStore::new();
        let project = store.seed_project("Counted", None).await;
        store.seed_task("a", Some(&project)).await;
        store.seed_task("b", Some(&project)).await;
        let projects = store.query(Domain::Projects).await.unwrap();
        assert_eq!(projects[0].as_project().unwrap().task_count, 2);
    }
}
