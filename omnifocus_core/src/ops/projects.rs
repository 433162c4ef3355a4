// src/ops/projects.rs
// Project primitives. The one tricky invariant here is sequential vs
// containsSingletonActions: at most one may be true after any call, with
// an explicitly-set true value winning over the other field.

use serde::Deserialize;
use serde_json::{json, Value};

use crate::error::OmniFocusError;
use crate::model::{Domain, EntityRef, ProjectStatus};
use crate::ops::{
    date_patch, double_option, move_destination, parse_project_status, require_name,
    resolve_placement, validate_opt_date, MoveTarget,
};
use crate::resolver::{resolve_container, resolve_required};
use crate::store::{EntityStore, Patch, ScriptRequest};

/// Enforce the mutual exclusion between `sequential` and
/// `containsSingletonActions`. Both requested fields are applied over the
/// current values first; if both end up true, the later explicit `true`
/// wins and the other is forced false.
fn reconcile_exclusive(
    current: (bool, bool),
    sequential: Option<bool>,
    singleton: Option<bool>,
) -> (bool, bool) {
    let mut seq = sequential.unwrap_or(current.0);
    let mut single = singleton.unwrap_or(current.1);
    if seq && single {
        if singleton == Some(true) {
            seq = false;
        } else {
            single = false;
        }
    }
    (seq, single)
}

#[derive(Debug, Deserialize, Default)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct CreateProjectInput {
    pub name: Option<String>,
    pub folder_id: Option<String>,
    pub folder_name: Option<String>,
    pub note: Option<String>,
    #[serde(default)]
    pub sequential: bool,
    #[serde(default)]
    pub contains_singleton_actions: bool,
    pub defer_date: Option<String>,
    pub due_date: Option<String>,
    pub review_interval_weeks: Option<u32>,
    pub estimated_minutes: Option<u32>,
}

pub async fn create_project(
    store: &dyn EntityStore,
    input: CreateProjectInput,
) -> Result<Value, OmniFocusError> {
    let name = require_name("Project name", input.name)?;
    let folder = EntityRef::new(input.folder_id, input.folder_name);
    let folder_id = if folder.is_empty() {
        None
    } else {
        Some(
            resolve_container(store, Domain::Folders, &folder)
                .await?
                .id()
                .to_string(),
        )
    };
    let (sequential, contains_singleton_actions) = reconcile_exclusive(
        (false, false),
        Some(input.sequential),
        Some(input.contains_singleton_actions),
    );
    let defer_date = validate_opt_date("deferDate", input.defer_date)?;
    let due_date = validate_opt_date("dueDate", input.due_date)?;

    let created = store
        .mutate(ScriptRequest::CreateProject {
            name: name.clone(),
            folder_id,
            note: input.note,
            sequential,
            contains_singleton_actions,
            defer_date,
            due_date,
            review_interval_weeks: input.review_interval_weeks,
            estimated_minutes: input.estimated_minutes,
        })
        .await?;
    Ok(json!({
        "success": true,
        "id": created["id"].clone(),
        "name": created["name"].clone(),
    }))
}

#[derive(Debug, Deserialize, Default)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct ListProjectsInput {
    /// Optional status filter: active, onHold, done, or dropped.
    pub status: Option<String>,
    pub folder_id: Option<String>,
    pub folder_name: Option<String>,
}

pub async fn list_projects(
    store: &dyn EntityStore,
    input: ListProjectsInput,
) -> Result<Value, OmniFocusError> {
    let status: Option<ProjectStatus> = input
        .status
        .as_deref()
        .map(parse_project_status)
        .transpose()?;
    let folder = EntityRef::new(input.folder_id, input.folder_name);
    let folder_id = if folder.is_empty() {
        None
    } else {
        Some(
            resolve_required(store, Domain::Folders, &folder, None)
                .await?
                .id()
                .to_string(),
        )
    };
    let projects: Vec<_> = store
        .query(Domain::Projects)
        .await?
        .into_iter()
        .filter_map(|e| e.as_project().cloned())
        .filter(|p| status.map(|s| p.status == s).unwrap_or(true))
        .filter(|p| match &folder_id {
            Some(f) => p.folder_id.as_deref() == Some(f.as_str()),
            None => true,
        })
        .collect();
    Ok(json!({
        "success": true,
        "count": projects.len(),
        "projects": projects,
    }))
}

#[derive(Debug, Deserialize, Default)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct GetProjectInput {
    pub id: Option<String>,
    pub name: Option<String>,
}

pub async fn get_project(
    store: &dyn EntityStore,
    input: GetProjectInput,
) -> Result<Value, OmniFocusError> {
    let target = EntityRef::new(input.id, input.name);
    let entity = resolve_required(store, Domain::Projects, &target, None).await?;
    let project = entity
        .as_project()
        .ok_or_else(|| OmniFocusError::InternalError("resolver returned a non-project".into()))?;
    Ok(json!({
        "success": true,
        "project": project,
    }))
}

#[derive(Debug, Deserialize, Default)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct EditProjectInput {
    pub id: Option<String>,
    pub name: Option<String>,
    pub new_name: Option<String>,
    pub note: Option<String>,
    pub status: Option<String>,
    pub sequential: Option<bool>,
    pub contains_singleton_actions: Option<bool>,
    #[serde(default, deserialize_with = "double_option")]
    pub defer_date: Option<Option<String>>,
    #[serde(default, deserialize_with = "double_option")]
    pub due_date: Option<Option<String>>,
    #[serde(default, deserialize_with = "double_option")]
    pub review_interval_weeks: Option<Option<u32>>,
    #[serde(default, deserialize_with = "double_option")]
    pub estimated_minutes: Option<Option<u32>>,
}

pub async fn edit_project(
    store: &dyn EntityStore,
    input: EditProjectInput,
) -> Result<Value, OmniFocusError> {
    let target = EntityRef::new(input.id, input.name);
    let new_name = input
        .new_name
        .map(|n| require_name("New project name", Some(n)))
        .transpose()?;
    let status = input
        .status
        .as_deref()
        .map(parse_project_status)
        .transpose()?;
    let defer_date = date_patch("deferDate", input.defer_date)?;
    let due_date = date_patch("dueDate", input.due_date)?;
    let review_interval_weeks = Patch::from_double_option(input.review_interval_weeks);
    let estimated_minutes = Patch::from_double_option(input.estimated_minutes);

    let entity = resolve_required(store, Domain::Projects, &target, None).await?;
    let project = entity
        .as_project()
        .ok_or_else(|| OmniFocusError::InternalError("resolver returned a non-project".into()))?;

    let (sequential, contains_singleton_actions) = reconcile_exclusive(
        (project.sequential, project.contains_singleton_actions),
        input.sequential,
        input.contains_singleton_actions,
    );
    let touched_exclusive =
        input.sequential.is_some() || input.contains_singleton_actions.is_some();

    let updated = store
        .mutate(ScriptRequest::UpdateProject {
            id: project.id.clone(),
            name: new_name,
            note: input.note,
            status,
            sequential: touched_exclusive.then_some(sequential),
            contains_singleton_actions: touched_exclusive.then_some(contains_singleton_actions),
            defer_date,
            due_date,
            review_interval_weeks,
            estimated_minutes,
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
pub struct DeleteProjectInput {
    pub id: Option<String>,
    pub name: Option<String>,
}

pub async fn delete_project(
    store: &dyn EntityStore,
    input: DeleteProjectInput,
) -> Result<Value, OmniFocusError> {
    let target = EntityRef::new(input.id, input.name);
    let project = resolve_required(store, Domain::Projects, &target, None).await?;
    let deleted = store
        .mutate(ScriptRequest::DeleteProject {
            id: project.id().to_string(),
        })
        .await?;
    let task_count = deleted["taskCount"].as_u64().unwrap_or(0);
    Ok(json!({
        "success": true,
        "id": deleted["id"].clone(),
        "name": deleted["name"].clone(),
        "tasksDeleted": task_count,
        "message": format!(
            "Project '{}' deleted; {} contained task(s) were deleted with it",
            project.name(),
            task_count
        ),
    }))
}

#[derive(Debug, Deserialize, Default)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct MoveProjectInput {
    pub id: Option<String>,
    pub name: Option<String>,
    pub to_folder_id: Option<String>,
    pub to_folder_name: Option<String>,
    #[serde(default)]
    pub to_root: bool,
    pub position: Option<String>,
    pub relative_to_id: Option<String>,
    pub relative_to_name: Option<String>,
}

pub async fn move_project(
    store: &dyn EntityStore,
    input: MoveProjectInput,
) -> Result<Value, OmniFocusError> {
    let destination = move_destination(input.to_folder_id, input.to_folder_name, input.to_root)?;
    let target = EntityRef::new(input.id, input.name);
    let project = resolve_required(store, Domain::Projects, &target, None).await?;
    let folder_id = match destination {
        MoveTarget::Top => None,
        MoveTarget::ById(id) => Some(
            resolve_required(store, Domain::Folders, &EntityRef::by_id(id), None)
                .await?
                .id()
                .to_string(),
        ),
        MoveTarget::ByName(name) => Some(
            resolve_required(store, Domain::Folders, &EntityRef::by_name(name), None)
                .await?
                .id()
                .to_string(),
        ),
    };
    let placement = resolve_placement(
        store,
        Domain::Projects,
        input.position,
        input.relative_to_id,
        input.relative_to_name,
    )
    .await?;
    let moved = store
        .mutate(ScriptRequest::MoveProject {
            id: project.id().to_string(),
            folder_id,
            placement,
        })
        .await?;
    Ok(json!({
        "success": true,
        "id": moved["id"].clone(),
        "name": moved["name"].clone(),
    }))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn explicit_true_wins_over_existing_true() {
        // sequential currently true, caller sets singleton true
        assert_eq!(
            reconcile_exclusive((true, false), None, Some(true)),
            (false, true)
        );
        // singleton currently true, caller sets sequential true
        assert_eq!(
            reconcile_exclusive((false, true), Some(true), None),
            (true, false)
        );
    }

    #[test]
    fn both_true_in_same_call_leaves_exactly_one() {
        let (seq, single) = reconcile_exclusive((false, false), Some(true), Some(true));
        assert!(seq != single);
        assert!(single);
    }

    #[test]
    fn untouched_fields_pass_through() {
        assert_eq!(reconcile_exclusive((true, false), None, None), (true, false));
        assert_eq!(
            reconcile_exclusive((false, false), Some(false), Some(false)),
            (false, false)
        );
    }
}
