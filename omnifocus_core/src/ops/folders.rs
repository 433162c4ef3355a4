// src/ops/folders.rs
// Folder primitives. Folder removal is the one delete that must not
// cascade: direct child projects and folders are relocated to the library
// root before the folder itself is deleted, and the relocation counts are
// reported back.

use serde::Deserialize;
use serde_json::{json, Value};

use crate::error::OmniFocusError;
use crate::model::{Domain, EntityRef, FolderStatus};
use crate::ops::{
    move_destination, parse_folder_status, require_name, resolve_placement, MoveTarget,
};
use crate::resolver::{resolve_container, resolve_required};
use crate::store::{EntityStore, Placement, ScriptRequest};

#[derive(Debug, Deserialize, Default)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct AddFolderInput {
    pub name: Option<String>,
    pub parent_id: Option<String>,
    pub parent_name: Option<String>,
    pub position: Option<String>,
    pub relative_to_id: Option<String>,
    pub relative_to_name: Option<String>,
}

pub async fn add_folder(
    store: &dyn EntityStore,
    input: AddFolderInput,
) -> Result<Value, OmniFocusError> {
    let name = require_name("Folder name", input.name)?;
    let parent = EntityRef::new(input.parent_id, input.parent_name);
    let parent_id = if parent.is_empty() {
        None
    } else {
        Some(
            resolve_container(store, Domain::Folders, &parent)
                .await?
                .id()
                .to_string(),
        )
    };
    let placement = resolve_placement(
        store,
        Domain::Folders,
        input.position,
        input.relative_to_id,
        input.relative_to_name,
    )
    .await?;
    let created = store
        .mutate(ScriptRequest::CreateFolder {
            name: name.clone(),
            parent_id,
            placement,
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
pub struct ListFoldersInput {
    #[serde(default)]
    pub include_dropped: bool,
}

pub async fn list_folders(
    store: &dyn EntityStore,
    input: ListFoldersInput,
) -> Result<Value, OmniFocusError> {
    let folders: Vec<_> = store
        .query(Domain::Folders)
        .await?
        .into_iter()
        .filter_map(|e| e.as_folder().cloned())
        .filter(|f| input.include_dropped || f.status == FolderStatus::Active)
        .collect();
    Ok(json!({
        "success": true,
        "count": folders.len(),
        "folders": folders,
    }))
}

#[derive(Debug, Deserialize, Default)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct EditFolderInput {
    pub id: Option<String>,
    pub name: Option<String>,
    pub new_name: Option<String>,
    pub status: Option<String>,
}

pub async fn edit_folder(
    store: &dyn EntityStore,
    input: EditFolderInput,
) -> Result<Value, OmniFocusError> {
    let target = EntityRef::new(input.id, input.name);
    let new_name = input
        .new_name
        .map(|n| require_name("New folder name", Some(n)))
        .transpose()?;
    let status = input
        .status
        .as_deref()
        .map(parse_folder_status)
        .transpose()?;
    if new_name.is_none() && status.is_none() {
        return Err(OmniFocusError::Validation(
            "Nothing to change: supply newName and/or status".to_string(),
        ));
    }
    let folder = resolve_required(store, Domain::Folders, &target, None).await?;
    let updated = store
        .mutate(ScriptRequest::UpdateFolder {
            id: folder.id().to_string(),
            name: new_name,
            status,
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
pub struct RemoveFolderInput {
    pub id: Option<String>,
    pub name: Option<String>,
}

pub async fn remove_folder(
    store: &dyn EntityStore,
    input: RemoveFolderInput,
) -> Result<Value, OmniFocusError> {
    let target = EntityRef::new(input.id, input.name);
    let folder = resolve_required(store, Domain::Folders, &target, None).await?;
    let folder_id = folder.id().to_string();
    let folder_name = folder.name().to_string();

    // Relocate direct children to the library root before the delete; the
    // native delete would cascade and destroy them.
    let child_folders: Vec<String> = store
        .query(Domain::Folders)
        .await?
        .iter()
        .filter(|e| e.belongs_to(&folder_id))
        .map(|e| e.id().to_string())
        .collect();
    let child_projects: Vec<String> = store
        .query(Domain::Projects)
        .await?
        .iter()
        .filter(|e| e.belongs_to(&folder_id))
        .map(|e| e.id().to_string())
        .collect();

    for id in &child_folders {
        store
            .mutate(ScriptRequest::MoveFolder {
                id: id.clone(),
                parent_id: None,
                placement: Placement::Ending,
            })
            .await?;
    }
    for id in &child_projects {
        store
            .mutate(ScriptRequest::MoveProject {
                id: id.clone(),
                folder_id: None,
                placement: Placement::Ending,
            })
            .await?;
    }
    store
        .mutate(ScriptRequest::DeleteFolder {
            id: folder_id.clone(),
        })
        .await?;

    Ok(json!({
        "success": true,
        "id": folder_id,
        "name": folder_name,
        "projectsMoved": child_projects.len(),
        "childFoldersMoved": child_folders.len(),
    }))
}

#[derive(Debug, Deserialize, Default)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct MoveFolderInput {
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

pub async fn move_folder(
    store: &dyn EntityStore,
    input: MoveFolderInput,
) -> Result<Value, OmniFocusError> {
    let destination = move_destination(input.to_folder_id, input.to_folder_name, input.to_root)?;
    let target = EntityRef::new(input.id, input.name);
    let folder = resolve_required(store, Domain::Folders, &target, None).await?;
    let parent_id = match destination {
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
    // A folder may not become its own ancestor; the hierarchy is a forest.
    if let Some(dest) = &parent_id {
        if dest.as_str() == folder.id() {
            return Err(OmniFocusError::Validation(
                "Cannot move a folder into itself".to_string(),
            ));
        }
        let folders = store.query(Domain::Folders).await?;
        let mut frontier = vec![folder.id().to_string()];
        while let Some(current) = frontier.pop() {
            for f in &folders {
                if f.belongs_to(&current) {
                    if f.id() == dest.as_str() {
                        return Err(OmniFocusError::Validation(
                            "Cannot move a folder into one of its own subfolders".to_string(),
                        ));
                    }
                    frontier.push(f.id().to_string());
                }
            }
        }
    }
    let placement = resolve_placement(
        store,
        Domain::Folders,
        input.position,
        input.relative_to_id,
        input.relative_to_name,
    )
    .await?;
    let moved = store
        .mutate(ScriptRequest::MoveFolder {
            id: folder.id().to_string(),
            parent_id,
            placement,
        })
        .await?;
    Ok(json!({
        "success": true,
        "id": moved["id"].clone(),
        "name": moved["name"].clone(),
    }))
}
