// src/ops/tasks.rs
// Task primitives and the task batches. Tasks are the busiest domain:
// they move between inbox, projects, and parent tasks, carry three
// nullable dates, and are the target of every batch operation.

use serde::Deserialize;
use serde_json::{json, Value};

use crate::error::OmniFocusError;
use crate::model::{Domain, EntityRef, TaskStatus};
use crate::ops::batch::apply_to_all;
use crate::ops::{
    date_patch, double_option, move_destination, require_name, validate_date, validate_opt_date,
    MoveTarget,
};
use crate::outcome::BatchItemResult;
use crate::resolver::{resolve_container, resolve_required};
use crate::store::{EntityStore, ScriptRequest, TaskDestination};

#[derive(Debug, Clone, Deserialize, Default)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct CreateTaskInput {
    pub name: Option<String>,
    pub project_id: Option<String>,
    pub project_name: Option<String>,
    pub parent_task_id: Option<String>,
    pub note: Option<String>,
    #[serde(default)]
    pub flagged: bool,
    pub due_date: Option<String>,
    pub defer_date: Option<String>,
    pub planned_date: Option<String>,
    #[serde(default)]
    pub tag_ids: Vec<String>,
    #[serde(default)]
    pub tag_names: Vec<String>,
}

/// Create one task; shared between the single tool and the batch.
async fn create_one(
    store: &dyn EntityStore,
    input: CreateTaskInput,
) -> Result<Value, OmniFocusError> {
    let name = require_name("Task name", input.name)?;
    let project = EntityRef::new(input.project_id, input.project_name);
    if !project.is_empty() && input.parent_task_id.is_some() {
        return Err(OmniFocusError::Validation(
            "Supply either a project or a parent task, not both".to_string(),
        ));
    }
    let project_id = if project.is_empty() {
        None
    } else {
        Some(
            resolve_container(store, Domain::Projects, &project)
                .await?
                .id()
                .to_string(),
        )
    };
    let parent_task_id = match input.parent_task_id {
        Some(id) => Some(
            resolve_container(store, Domain::Tasks, &EntityRef::by_id(id))
                .await?
                .id()
                .to_string(),
        ),
        None => None,
    };
    let due_date = validate_opt_date("dueDate", input.due_date)?;
    let defer_date = validate_opt_date("deferDate", input.defer_date)?;
    let planned_date = validate_opt_date("plannedDate", input.planned_date)?;

    let mut tag_ids = Vec::new();
    for id in &input.tag_ids {
        let tag = resolve_container(store, Domain::Tags, &EntityRef::by_id(id.clone())).await?;
        tag_ids.push(tag.id().to_string());
    }
    for tag_name in &input.tag_names {
        let tag =
            resolve_container(store, Domain::Tags, &EntityRef::by_name(tag_name.clone())).await?;
        tag_ids.push(tag.id().to_string());
    }

    store
        .mutate(ScriptRequest::CreateTask {
            name,
            project_id,
            parent_task_id,
            note: input.note,
            flagged: input.flagged,
            due_date,
            defer_date,
            planned_date,
            tag_ids,
        })
        .await
}

pub async fn create_task(
    store: &dyn EntityStore,
    input: CreateTaskInput,
) -> Result<Value, OmniFocusError> {
    let created = create_one(store, input).await?;
    Ok(json!({
        "success": true,
        "id": created["id"].clone(),
        "name": created["name"].clone(),
    }))
}

#[derive(Debug, Deserialize, Default)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct GetTaskInput {
    pub id: Option<String>,
    pub name: Option<String>,
}

pub async fn get_task(
    store: &dyn EntityStore,
    input: GetTaskInput,
) -> Result<Value, OmniFocusError> {
    let target = EntityRef::new(input.id, input.name);
    let entity = resolve_required(store, Domain::Tasks, &target, None).await?;
    let task = entity
        .as_task()
        .ok_or_else(|| OmniFocusError::InternalError("resolver returned a non-task".into()))?;
    Ok(json!({
        "success": true,
        "task": task,
    }))
}

#[derive(Debug, Deserialize, Default)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct ListTasksInput {
    pub project_id: Option<String>,
    pub project_name: Option<String>,
    pub flagged: Option<bool>,
    #[serde(default)]
    pub inbox_only: bool,
    #[serde(default)]
    pub include_completed: bool,
    pub tag_name: Option<String>,
}

pub async fn list_tasks(
    store: &dyn EntityStore,
    input: ListTasksInput,
) -> Result<Value, OmniFocusError> {
    let project = EntityRef::new(input.project_id, input.project_name);
    let project_id = if project.is_empty() {
        None
    } else {
        Some(
            resolve_required(store, Domain::Projects, &project, None)
                .await?
                .id()
                .to_string(),
        )
    };
    let tasks: Vec<_> = store
        .query(Domain::Tasks)
        .await?
        .into_iter()
        .filter_map(|e| e.as_task().cloned())
        .filter(|t| match &project_id {
            Some(p) => t.project_id.as_deref() == Some(p.as_str()),
            None => true,
        })
        .filter(|t| input.flagged.map(|f| t.flagged == f).unwrap_or(true))
        .filter(|t| !input.inbox_only || t.in_inbox)
        .filter(|t| {
            input.include_completed
                || (t.status != TaskStatus::Completed && t.status != TaskStatus::Dropped)
        })
        .filter(|t| match &input.tag_name {
            Some(name) => t.tags.iter().any(|r| &r.name == name),
            None => true,
        })
        .collect();
    Ok(json!({
        "success": true,
        "count": tasks.len(),
        "tasks": tasks,
    }))
}

#[derive(Debug, Deserialize, Default)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct EditTaskInput {
    pub id: Option<String>,
    pub name: Option<String>,
    pub new_name: Option<String>,
    pub note: Option<String>,
    pub flagged: Option<bool>,
    #[serde(default, deserialize_with = "double_option")]
    pub due_date: Option<Option<String>>,
    #[serde(default, deserialize_with = "double_option")]
    pub defer_date: Option<Option<String>>,
    #[serde(default, deserialize_with = "double_option")]
    pub planned_date: Option<Option<String>>,
}

pub async fn edit_task(
    store: &dyn EntityStore,
    input: EditTaskInput,
) -> Result<Value, OmniFocusError> {
    let target = EntityRef::new(input.id, input.name);
    let new_name = input
        .new_name
        .map(|n| require_name("New task name", Some(n)))
        .transpose()?;
    let due_date = date_patch("dueDate", input.due_date)?;
    let defer_date = date_patch("deferDate", input.defer_date)?;
    let planned_date = date_patch("plannedDate", input.planned_date)?;

    let task = resolve_required(store, Domain::Tasks, &target, None).await?;
    let updated = store
        .mutate(ScriptRequest::UpdateTask {
            id: task.id().to_string(),
            name: new_name,
            note: input.note,
            flagged: input.flagged,
            due_date,
            defer_date,
            planned_date,
        })
        .await?;
    Ok(json!({
        "success": true,
        "id": updated["id"].clone(),
        "name": updated["name"].clone(),
    }))
}

#[derive(Debug, Clone, Deserialize, Default)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct TaskRefInput {
    pub id: Option<String>,
    pub name: Option<String>,
}

pub async fn remove_task(
    store: &dyn EntityStore,
    input: TaskRefInput,
) -> Result<Value, OmniFocusError> {
    let target = EntityRef::new(input.id, input.name);
    let task = resolve_required(store, Domain::Tasks, &target, None).await?;
    let deleted = store
        .mutate(ScriptRequest::DeleteTask {
            id: task.id().to_string(),
        })
        .await?;
    Ok(json!({
        "success": true,
        "id": deleted["id"].clone(),
        "name": deleted["name"].clone(),
    }))
}

pub async fn complete_task(
    store: &dyn EntityStore,
    input: TaskRefInput,
) -> Result<Value, OmniFocusError> {
    let target = EntityRef::new(input.id, input.name);
    let task = resolve_required(store, Domain::Tasks, &target, None).await?;
    let completed = store
        .mutate(ScriptRequest::CompleteTask {
            id: task.id().to_string(),
        })
        .await?;
    Ok(json!({
        "success": true,
        "id": completed["id"].clone(),
        "name": completed["name"].clone(),
        "completed": true,
    }))
}

#[derive(Debug, Deserialize, Default)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct MoveTaskInput {
    pub id: Option<String>,
    pub name: Option<String>,
    pub to_project_id: Option<String>,
    pub to_project_name: Option<String>,
    #[serde(default)]
    pub to_inbox: bool,
}

pub async fn move_task(
    store: &dyn EntityStore,
    input: MoveTaskInput,
) -> Result<Value, OmniFocusError> {
    let destination = move_destination(input.to_project_id, input.to_project_name, input.to_inbox)?;
    let target = EntityRef::new(input.id, input.name);
    let task = resolve_required(store, Domain::Tasks, &target, None).await?;
    let destination = match destination {
        MoveTarget::Top => TaskDestination::Inbox,
        MoveTarget::ById(id) => TaskDestination::Project(
            resolve_required(store, Domain::Projects, &EntityRef::by_id(id), None)
                .await?
                .id()
                .to_string(),
        ),
        MoveTarget::ByName(name) => TaskDestination::Project(
            resolve_required(store, Domain::Projects, &EntityRef::by_name(name), None)
                .await?
                .id()
                .to_string(),
        ),
    };
    let moved = store
        .mutate(ScriptRequest::MoveTask {
            id: task.id().to_string(),
            destination,
        })
        .await?;
    Ok(json!({
        "success": true,
        "id": moved["id"].clone(),
        "name": moved["name"].clone(),
    }))
}

#[derive(Debug, Deserialize, Default)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct AppendNoteInput {
    pub id: Option<String>,
    pub name: Option<String>,
    pub note: Option<String>,
}

pub async fn append_note(
    store: &dyn EntityStore,
    input: AppendNoteInput,
) -> Result<Value, OmniFocusError> {
    let text = input.note.unwrap_or_default();
    if text.is_empty() {
        return Err(OmniFocusError::Validation("Note text is required".to_string()));
    }
    let target = EntityRef::new(input.id, input.name);
    let task = resolve_required(store, Domain::Tasks, &target, None).await?;
    let updated = store
        .mutate(ScriptRequest::AppendNote {
            task_id: task.id().to_string(),
            text,
        })
        .await?;
    Ok(json!({
        "success": true,
        "id": updated["id"].clone(),
        "name": updated["name"].clone(),
    }))
}

#[derive(Debug, Deserialize, Default)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct SetPlannedDateInput {
    pub id: Option<String>,
    pub name: Option<String>,
    #[serde(default, deserialize_with = "double_option")]
    pub planned_date: Option<Option<String>>,
}

pub async fn set_planned_date(
    store: &dyn EntityStore,
    input: SetPlannedDateInput,
) -> Result<Value, OmniFocusError> {
    let patch = match input.planned_date {
        None => {
            return Err(OmniFocusError::Validation(
                "plannedDate is required (pass null to clear it)".to_string(),
            ))
        }
        Some(None) => crate::store::Patch::Clear,
        Some(Some(v)) => crate::store::Patch::Set(validate_date("plannedDate", &v)?),
    };
    let cleared = matches!(patch, crate::store::Patch::Clear);
    let target = EntityRef::new(input.id, input.name);
    let task = resolve_required(store, Domain::Tasks, &target, None).await?;
    let updated = store
        .mutate(ScriptRequest::UpdateTask {
            id: task.id().to_string(),
            name: None,
            note: None,
            flagged: None,
            due_date: crate::store::Patch::Keep,
            defer_date: crate::store::Patch::Keep,
            planned_date: patch,
        })
        .await?;
    Ok(json!({
        "success": true,
        "id": updated["id"].clone(),
        "name": updated["name"].clone(),
        "cleared": cleared,
    }))
}

// ---- batches ----

#[derive(Debug, Deserialize, Default)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct BatchCreateTasksInput {
    #[serde(default)]
    pub tasks: Vec<CreateTaskInput>,
}

pub async fn batch_create_tasks(
    store: &dyn EntityStore,
    input: BatchCreateTasksInput,
) -> Result<Value, OmniFocusError> {
    let outcome = apply_to_all(input.tasks, |item| async move {
        let requested_name = item.name.clone();
        match create_one(store, item).await {
            Ok(created) => BatchItemResult::ok(
                created["id"].as_str().unwrap_or_default(),
                created["name"].as_str().unwrap_or_default(),
            ),
            Err(e) => BatchItemResult::failed(None, requested_name, &e),
        }
    })
    .await;
    Ok(serde_json::to_value(outcome)?)
}

#[derive(Debug, Deserialize, Default)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct BatchTaskRefsInput {
    #[serde(default)]
    pub tasks: Vec<TaskRefInput>,
}

async fn batch_over_refs(
    store: &dyn EntityStore,
    input: BatchTaskRefsInput,
    complete: bool,
) -> Result<Value, OmniFocusError> {
    let outcome = apply_to_all(input.tasks, |item| async move {
        let target = EntityRef::new(item.id.clone(), item.name.clone());
        let resolved = resolve_required(store, Domain::Tasks, &target, None).await;
        match resolved {
            Ok(task) => {
                let request = if complete {
                    ScriptRequest::CompleteTask {
                        id: task.id().to_string(),
                    }
                } else {
                    ScriptRequest::DeleteTask {
                        id: task.id().to_string(),
                    }
                };
                match store.mutate(request).await {
                    Ok(_) => BatchItemResult::ok(task.id(), task.name()),
                    Err(e) => BatchItemResult::failed(
                        Some(task.id().to_string()),
                        Some(task.name().to_string()),
                        &e,
                    ),
                }
            }
            Err(e) => BatchItemResult::failed(item.id.clone(), item.name.clone(), &e),
        }
    })
    .await;
    Ok(serde_json::to_value(outcome)?)
}

pub async fn batch_complete_tasks(
    store: &dyn EntityStore,
    input: BatchTaskRefsInput,
) -> Result<Value, OmniFocusError> {
    batch_over_refs(store, input, true).await
}

pub async fn batch_remove_tasks(
    store: &dyn EntityStore,
    input: BatchTaskRefsInput,
) -> Result<Value, OmniFocusError> {
    batch_over_refs(store, input, false).await
}
