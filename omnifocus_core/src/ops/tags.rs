// src/ops/tags.rs
// Tag primitives, including the tag assignment/removal batches. Tag
// deletion cascades to child tags (native behavior) but tasks only lose
// the reference.

use serde::Deserialize;
use serde_json::{json, Value};

use crate::error::OmniFocusError;
use crate::model::{Domain, Entity, EntityRef, TagStatus};
use crate::ops::batch::apply_to_all;
use crate::ops::{parse_tag_status, require_name};
use crate::outcome::BatchItemResult;
use crate::resolver::{resolve_container, resolve_required};
use crate::store::{EntityStore, ScriptRequest};

#[derive(Debug, Deserialize, Default)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct CreateTagInput {
    pub name: Option<String>,
    pub parent_id: Option<String>,
    pub parent_name: Option<String>,
}

pub async fn create_tag(
    store: &dyn EntityStore,
    input: CreateTagInput,
) -> Result<Value, OmniFocusError> {
    let name = require_name("Tag name", input.name)?;
    let parent = EntityRef::new(input.parent_id, input.parent_name);
    let parent_id = if parent.is_empty() {
        None
    } else {
        Some(
            resolve_container(store, Domain::Tags, &parent)
                .await?
                .id()
                .to_string(),
        )
    };
    let created = store
        .mutate(ScriptRequest::CreateTag {
            name: name.clone(),
            parent_id,
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
pub struct ListTagsInput {
    #[serde(default)]
    pub include_dropped: bool,
}

pub async fn list_tags(
    store: &dyn EntityStore,
    input: ListTagsInput,
) -> Result<Value, OmniFocusError> {
    let tags: Vec<_> = store
        .query(Domain::Tags)
        .await?
        .into_iter()
        .filter_map(|e| e.as_tag().cloned())
        .filter(|t| input.include_dropped || t.status != TagStatus::Dropped)
        .collect();
    Ok(json!({
        "success": true,
        "count": tags.len(),
        "tags": tags,
    }))
}

#[derive(Debug, Deserialize, Default)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct EditTagInput {
    pub id: Option<String>,
    pub name: Option<String>,
    pub new_name: Option<String>,
    pub status: Option<String>,
    pub allows_next_action: Option<bool>,
}

pub async fn edit_tag(
    store: &dyn EntityStore,
    input: EditTagInput,
) -> Result<Value, OmniFocusError> {
    let target = EntityRef::new(input.id, input.name);
    let new_name = input
        .new_name
        .map(|n| require_name("New tag name", Some(n)))
        .transpose()?;
    let status = input.status.as_deref().map(parse_tag_status).transpose()?;
    if new_name.is_none() && status.is_none() && input.allows_next_action.is_none() {
        return Err(OmniFocusError::Validation(
            "Nothing to change: supply newName, status, and/or allowsNextAction".to_string(),
        ));
    }
    let tag = resolve_required(store, Domain::Tags, &target, None).await?;
    let updated = store
        .mutate(ScriptRequest::UpdateTag {
            id: tag.id().to_string(),
            name: new_name,
            status,
            allows_next_action: input.allows_next_action,
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
pub struct DeleteTagInput {
    pub id: Option<String>,
    pub name: Option<String>,
}

pub async fn delete_tag(
    store: &dyn EntityStore,
    input: DeleteTagInput,
) -> Result<Value, OmniFocusError> {
    let target = EntityRef::new(input.id, input.name);
    let tag = resolve_required(store, Domain::Tags, &target, None).await?;
    let tag_id = tag.id().to_string();

    // Count descendants before the delete so the cascade can be reported.
    let tags = store.query(Domain::Tags).await?;
    let mut descendants = 0usize;
    let mut frontier = vec![tag_id.clone()];
    while let Some(current) = frontier.pop() {
        for t in &tags {
            if t.belongs_to(&current) {
                descendants += 1;
                frontier.push(t.id().to_string());
            }
        }
    }

    let deleted = store.mutate(ScriptRequest::DeleteTag { id: tag_id }).await?;
    Ok(json!({
        "success": true,
        "id": deleted["id"].clone(),
        "name": deleted["name"].clone(),
        "childTagsDeleted": descendants,
        "message": format!(
            "Tag '{}' deleted; {} child tag(s) were deleted with it. Tasks keep their other tags.",
            tag.name(),
            descendants
        ),
    }))
}

// ---- tag assignment batches ----

#[derive(Debug, Clone, Deserialize, Default)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct TagAssignmentItem {
    pub task_id: Option<String>,
    pub task_name: Option<String>,
    #[serde(default)]
    pub tag_ids: Vec<String>,
    #[serde(default)]
    pub tag_names: Vec<String>,
}

#[derive(Debug, Deserialize, Default)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct TagAssignmentInput {
    #[serde(default)]
    pub items: Vec<TagAssignmentItem>,
}

/// Resolve the task and every referenced tag for one batch item. Task and
/// tag resolution are independent per item; a bad tag reference fails only
/// this item.
async fn resolve_assignment(
    store: &dyn EntityStore,
    item: &TagAssignmentItem,
) -> Result<(Entity, Vec<String>), OmniFocusError> {
    let task_ref = EntityRef::new(item.task_id.clone(), item.task_name.clone());
    let task = resolve_required(store, Domain::Tasks, &task_ref, None).await?;
    if item.tag_ids.is_empty() && item.tag_names.is_empty() {
        return Err(OmniFocusError::Validation(
            "At least one tag id or name is required".to_string(),
        ));
    }
    let mut tag_ids = Vec::new();
    for id in &item.tag_ids {
        let tag =
            resolve_required(store, Domain::Tags, &EntityRef::by_id(id.clone()), None).await?;
        tag_ids.push(tag.id().to_string());
    }
    for name in &item.tag_names {
        let tag =
            resolve_required(store, Domain::Tags, &EntityRef::by_name(name.clone()), None).await?;
        tag_ids.push(tag.id().to_string());
    }
    Ok((task, tag_ids))
}

async fn assignment_batch(
    store: &dyn EntityStore,
    input: TagAssignmentInput,
    remove: bool,
) -> Result<Value, OmniFocusError> {
    let outcome = apply_to_all(input.items, |item| async move {
        match resolve_assignment(store, &item).await {
            Ok((task, tag_ids)) => {
                let request = if remove {
                    ScriptRequest::RemoveTags {
                        task_id: task.id().to_string(),
                        tag_ids,
                    }
                } else {
                    ScriptRequest::AddTags {
                        task_id: task.id().to_string(),
                        tag_ids,
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
            Err(e) => BatchItemResult::failed(item.task_id.clone(), item.task_name.clone(), &e),
        }
    })
    .await;
    Ok(serde_json::to_value(outcome)?)
}

pub async fn assign_tags(
    store: &dyn EntityStore,
    input: TagAssignmentInput,
) -> Result<Value, OmniFocusError> {
    assignment_batch(store, input, false).await
}

pub async fn remove_tags(
    store: &dyn EntityStore,
    input: TagAssignmentInput,
) -> Result<Value, OmniFocusError> {
    assignment_batch(store, input, true).await
}
