// src/connector.rs
// The OmniFocus connector: tool catalog, dispatch, and the read-only
// resource surface. Domain errors never cross the tool boundary as
// JSON-RPC errors; they are folded into the result payload with
// isError set on the envelope.

use std::borrow::Cow;
use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use rmcp::model::{
    CallToolRequestParam, CallToolResult, Implementation, InitializeRequestParam, InitializeResult,
    ListResourcesResult, ListToolsResult, PaginatedRequestParam, ProtocolVersion, RawResource,
    ReadResourceRequestParam, Resource, ResourceContents, ServerCapabilities, Tool,
};
use serde::de::DeserializeOwned;
use serde_json::{json, Map as JsonMap, Value};

use crate::error::OmniFocusError;
use crate::model::{Domain, EntityRef, ProjectStatus, TaskStatus};
use crate::ops::{folders, projects, tags, tasks};
use crate::outcome::{failure_result, success_result};
use crate::resolver::resolve_required;
use crate::store::EntityStore;
use crate::Connector;

pub struct OmniFocusConnector {
    store: Arc<dyn EntityStore>,
}

impl OmniFocusConnector {
    pub fn new(store: Arc<dyn EntityStore>) -> Self {
        Self { store }
    }

    fn store(&self) -> &dyn EntityStore {
        self.store.as_ref()
    }
}

fn parse_input<T: DeserializeOwned>(args: JsonMap<String, Value>) -> Result<T, OmniFocusError> {
    serde_json::from_value(Value::Object(args))
        .map_err(|e| OmniFocusError::InvalidParams(e.to_string()))
}

fn tool(name: &'static str, title: &str, description: &'static str, schema: Value) -> Tool {
    Tool {
        name: Cow::Borrowed(name),
        title: Some(title.to_string()),
        description: Some(Cow::Borrowed(description)),
        input_schema: Arc::new(schema.as_object().cloned().unwrap_or_default()),
        output_schema: None,
        annotations: None,
        icons: None,
    }
}

/// Schema for tools that select a single entity by id or exact name.
fn lookup_schema(entity: &str) -> Value {
    json!({
        "type": "object",
        "properties": {
            "id": {
                "type": "string",
                "description": format!("{} id. Takes precedence over name; no name fallback.", entity)
            },
            "name": {
                "type": "string",
                "description": format!("{} name, matched exactly (case-sensitive). Two or more matches return DISAMBIGUATION_REQUIRED with all matching ids.", entity)
            }
        }
    })
}

fn placement_props() -> Value {
    json!({
        "position": {
            "type": "string",
            "enum": ["beginning", "ending", "before", "after"],
            "description": "Insert position within the destination. Defaults to ending. before/after require relativeToId or relativeToName."
        },
        "relativeToId": {"type": "string", "description": "Sibling id for before/after placement."},
        "relativeToName": {"type": "string", "description": "Sibling name for before/after placement."}
    })
}

fn merge_props(base: Value, extra: Value) -> Value {
    let mut base = base;
    if let (Some(obj), Some(add)) = (
        base.get_mut("properties").and_then(|p| p.as_object_mut()),
        extra.as_object(),
    ) {
        for (k, v) in add {
            obj.insert(k.clone(), v.clone());
        }
    }
    base
}

/// Parse any of the date forms the tools accept. Naive values are read
/// as UTC.
fn parse_timestamp(s: &str) -> Option<DateTime<Utc>> {
    use chrono::{NaiveDate, NaiveDateTime};

    if let Ok(d) = DateTime::parse_from_rfc3339(s) {
        return Some(d.with_timezone(&Utc));
    }
    if let Ok(dt) = NaiveDateTime::parse_from_str(s, "%Y-%m-%dT%H:%M:%S") {
        return Some(dt.and_utc());
    }
    NaiveDate::parse_from_str(s, "%Y-%m-%d")
        .ok()
        .and_then(|d| d.and_hms_opt(0, 0, 0))
        .map(|dt| dt.and_utc())
}

#[async_trait]
impl Connector for OmniFocusConnector {
    fn name(&self) -> &'static str {
        "omnifocus"
    }

    fn description(&self) -> &'static str {
        "OmniFocus task management: folders, projects, tasks, and tags, with batch operations and name disambiguation."
    }

    async fn capabilities(&self) -> ServerCapabilities {
        ServerCapabilities {
            tools: Some(rmcp::model::ToolsCapability { list_changed: None }),
            resources: Some(rmcp::model::ResourcesCapability {
                subscribe: None,
                list_changed: None,
            }),
            ..Default::default()
        }
    }

    async fn initialize(
        &self,
        _request: InitializeRequestParam,
    ) -> Result<InitializeResult, OmniFocusError> {
        Ok(InitializeResult {
            protocol_version: ProtocolVersion::LATEST,
            capabilities: self.capabilities().await,
            server_info: Implementation {
                name: self.name().to_string(),
                title: Some("OmniFocus".to_string()),
                version: env!("CARGO_PKG_VERSION").to_string(),
                icons: None,
                website_url: None,
            },
            instructions: Some(
                "OmniFocus.app integration. Entities can be addressed by id or by exact name; \
                 when a name matches several entities the call fails with code \
                 DISAMBIGUATION_REQUIRED and a matchingIds list, and should be retried with \
                 one of those ids. First use may trigger an automation permission prompt."
                    .to_string(),
            ),
        })
    }

    async fn list_resources(
        &self,
        _request: Option<PaginatedRequestParam>,
    ) -> Result<ListResourcesResult, OmniFocusError> {
        let entry = |uri: &str, name: &str, description: &str| Resource {
            raw: RawResource {
                uri: uri.to_string(),
                name: name.to_string(),
                title: None,
                description: Some(description.to_string()),
                mime_type: Some("application/json".to_string()),
                size: None,
                icons: None,
            },
            annotations: None,
        };
        Ok(ListResourcesResult {
            resources: vec![
                entry("omnifocus://inbox", "Inbox", "Unprocessed inbox tasks."),
                entry(
                    "omnifocus://today",
                    "Today",
                    "Tasks due or planned today, plus anything overdue.",
                ),
                entry("omnifocus://flagged", "Flagged", "Flagged incomplete tasks."),
                entry(
                    "omnifocus://stats",
                    "Database statistics",
                    "Counts of folders, projects, tasks, and tags.",
                ),
                entry(
                    "omnifocus://project/{name}",
                    "Project tasks",
                    "Tasks of the named project.",
                ),
                entry(
                    "omnifocus://perspective/{name}",
                    "Perspective",
                    "A built-in perspective view: inbox, today, or flagged.",
                ),
            ],
            next_cursor: None,
        })
    }

    async fn read_resource(
        &self,
        request: ReadResourceRequestParam,
    ) -> Result<Vec<ResourceContents>, OmniFocusError> {
        let uri = request.uri.as_str();
        let Some(path) = uri.strip_prefix("omnifocus://") else {
            return Err(OmniFocusError::ResourceNotFound);
        };
        let view = match path {
            "inbox" => self.inbox_view().await?,
            "today" => self.today_view().await?,
            "flagged" => self.flagged_view().await?,
            "stats" => self.stats_view().await?,
            other => {
                if let Some(name) = other.strip_prefix("project/") {
                    self.project_view(name).await?
                } else if let Some(name) = other.strip_prefix("perspective/") {
                    match name.to_lowercase().as_str() {
                        "inbox" => self.inbox_view().await?,
                        "today" => self.today_view().await?,
                        "flagged" => self.flagged_view().await?,
                        _ => return Err(OmniFocusError::ResourceNotFound),
                    }
                } else {
                    return Err(OmniFocusError::ResourceNotFound);
                }
            }
        };
        let text = serde_json::to_string_pretty(&view)?;
        Ok(vec![ResourceContents::text(text, uri)])
    }

    async fn list_tools(
        &self,
        _request: Option<PaginatedRequestParam>,
    ) -> Result<ListToolsResult, OmniFocusError> {
        let tools = vec![
            // Folders
            tool(
                "add_folder",
                "Add Folder",
                "Create a folder, optionally inside a parent folder.",
                merge_props(
                    json!({
                        "type": "object",
                        "properties": {
                            "name": {"type": "string", "description": "Folder name. Required; trimmed."},
                            "parentId": {"type": "string", "description": "Parent folder id."},
                            "parentName": {"type": "string", "description": "Parent folder name (must be unambiguous)."}
                        },
                        "required": ["name"]
                    }),
                    placement_props(),
                ),
            ),
            tool(
                "list_folders",
                "List Folders",
                "List folders. Dropped folders are hidden unless includeDropped is true.",
                json!({
                    "type": "object",
                    "properties": {
                        "includeDropped": {"type": "boolean", "default": false}
                    }
                }),
            ),
            tool(
                "edit_folder",
                "Edit Folder",
                "Rename a folder and/or change its status.",
                json!({
                    "type": "object",
                    "properties": {
                        "id": {"type": "string"},
                        "name": {"type": "string", "description": "Current name, if no id is given."},
                        "newName": {"type": "string"},
                        "status": {"type": "string", "enum": ["active", "dropped"]}
                    }
                }),
            ),
            tool(
                "remove_folder",
                "Remove Folder",
                "Delete a folder. Child projects and folders are first moved to the library root, never deleted; the response reports projectsMoved and childFoldersMoved.",
                lookup_schema("Folder"),
            ),
            tool(
                "move_folder",
                "Move Folder",
                "Move a folder into another folder or to the library root. Exactly one of toFolderId, toFolderName, toRoot must be given.",
                merge_props(
                    json!({
                        "type": "object",
                        "properties": {
                            "id": {"type": "string"},
                            "name": {"type": "string"},
                            "toFolderId": {"type": "string"},
                            "toFolderName": {"type": "string"},
                            "toRoot": {"type": "boolean", "default": false}
                        }
                    }),
                    placement_props(),
                ),
            ),
            // Projects
            tool(
                "create_project",
                "Create Project",
                "Create a project, optionally inside a folder. sequential and containsSingletonActions are mutually exclusive.",
                json!({
                    "type": "object",
                    "properties": {
                        "name": {"type": "string", "description": "Project name. Required; trimmed."},
                        "folderId": {"type": "string"},
                        "folderName": {"type": "string", "description": "Containing folder name (must be unambiguous)."},
                        "note": {"type": "string"},
                        "sequential": {"type": "boolean", "default": false},
                        "containsSingletonActions": {"type": "boolean", "default": false},
                        "deferDate": {"type": "string", "description": "ISO-8601 date or datetime."},
                        "dueDate": {"type": "string", "description": "ISO-8601 date or datetime."},
                        "reviewIntervalWeeks": {"type": "integer", "minimum": 1},
                        "estimatedMinutes": {"type": "integer", "minimum": 1}
                    },
                    "required": ["name"]
                }),
            ),
            tool(
                "list_projects",
                "List Projects",
                "List projects, optionally filtered by status or containing folder.",
                json!({
                    "type": "object",
                    "properties": {
                        "status": {"type": "string", "enum": ["active", "onHold", "done", "dropped"]},
                        "folderId": {"type": "string"},
                        "folderName": {"type": "string"}
                    }
                }),
            ),
            tool(
                "get_project",
                "Get Project",
                "Fetch one project with all fields.",
                lookup_schema("Project"),
            ),
            tool(
                "edit_project",
                "Edit Project",
                "Edit project fields. Omitted date/interval fields are unchanged; explicit null clears them. Setting sequential or containsSingletonActions true forces the other false.",
                json!({
                    "type": "object",
                    "properties": {
                        "id": {"type": "string"},
                        "name": {"type": "string", "description": "Current name, if no id is given."},
                        "newName": {"type": "string"},
                        "note": {"type": "string", "description": "Replaces the note."},
                        "status": {"type": "string", "enum": ["active", "onHold", "done", "dropped"]},
                        "sequential": {"type": "boolean"},
                        "containsSingletonActions": {"type": "boolean"},
                        "deferDate": {"type": ["string", "null"], "description": "ISO-8601; null clears."},
                        "dueDate": {"type": ["string", "null"], "description": "ISO-8601; null clears."},
                        "reviewIntervalWeeks": {"type": ["integer", "null"]},
                        "estimatedMinutes": {"type": ["integer", "null"]}
                    }
                }),
            ),
            tool(
                "delete_project",
                "Delete Project",
                "Delete a project. Its contained tasks are deleted with it (native cascade); the response says how many.",
                lookup_schema("Project"),
            ),
            tool(
                "move_project",
                "Move Project",
                "Move a project into a folder or to the library root. Exactly one of toFolderId, toFolderName, toRoot must be given.",
                merge_props(
                    json!({
                        "type": "object",
                        "properties": {
                            "id": {"type": "string"},
                            "name": {"type": "string"},
                            "toFolderId": {"type": "string"},
                            "toFolderName": {"type": "string"},
                            "toRoot": {"type": "boolean", "default": false}
                        }
                    }),
                    placement_props(),
                ),
            ),
            // Tags
            tool(
                "create_tag",
                "Create Tag",
                "Create a tag, optionally nested under a parent tag.",
                json!({
                    "type": "object",
                    "properties": {
                        "name": {"type": "string", "description": "Tag name. Required; trimmed."},
                        "parentId": {"type": "string"},
                        "parentName": {"type": "string", "description": "Parent tag name (must be unambiguous)."}
                    },
                    "required": ["name"]
                }),
            ),
            tool(
                "list_tags",
                "List Tags",
                "List tags with remaining-task counts.",
                json!({
                    "type": "object",
                    "properties": {
                        "includeDropped": {"type": "boolean", "default": false}
                    }
                }),
            ),
            tool(
                "edit_tag",
                "Edit Tag",
                "Rename a tag or change its status / next-action availability.",
                json!({
                    "type": "object",
                    "properties": {
                        "id": {"type": "string"},
                        "name": {"type": "string", "description": "Current name, if no id is given."},
                        "newName": {"type": "string"},
                        "status": {"type": "string", "enum": ["active", "onHold", "dropped"]},
                        "allowsNextAction": {"type": "boolean"}
                    }
                }),
            ),
            tool(
                "delete_tag",
                "Delete Tag",
                "Delete a tag and its child tags. Tasks lose the tag reference but are never deleted.",
                lookup_schema("Tag"),
            ),
            tool(
                "assign_tags",
                "Assign Tags",
                "Add tags to tasks. Each item resolves its task and tags independently; one bad item never blocks the rest.",
                json!({
                    "type": "object",
                    "properties": {
                        "items": {
                            "type": "array",
                            "items": {
                                "type": "object",
                                "properties": {
                                    "taskId": {"type": "string"},
                                    "taskName": {"type": "string"},
                                    "tagIds": {"type": "array", "items": {"type": "string"}},
                                    "tagNames": {"type": "array", "items": {"type": "string"}}
                                }
                            }
                        }
                    },
                    "required": ["items"]
                }),
            ),
            tool(
                "remove_tags",
                "Remove Tags",
                "Remove tags from tasks. Same batch semantics as assign_tags.",
                json!({
                    "type": "object",
                    "properties": {
                        "items": {
                            "type": "array",
                            "items": {
                                "type": "object",
                                "properties": {
                                    "taskId": {"type": "string"},
                                    "taskName": {"type": "string"},
                                    "tagIds": {"type": "array", "items": {"type": "string"}},
                                    "tagNames": {"type": "array", "items": {"type": "string"}}
                                }
                            }
                        }
                    },
                    "required": ["items"]
                }),
            ),
            // Tasks
            tool(
                "create_task",
                "Create Task",
                "Create a task in the inbox, a project, or under a parent task.",
                json!({
                    "type": "object",
                    "properties": {
                        "name": {"type": "string", "description": "Task name. Required; trimmed."},
                        "projectId": {"type": "string"},
                        "projectName": {"type": "string", "description": "Containing project name (must be unambiguous)."},
                        "parentTaskId": {"type": "string", "description": "Nest under this task instead of a project."},
                        "note": {"type": "string"},
                        "flagged": {"type": "boolean", "default": false},
                        "dueDate": {"type": "string", "description": "ISO-8601 date or datetime."},
                        "deferDate": {"type": "string"},
                        "plannedDate": {"type": "string"},
                        "tagIds": {"type": "array", "items": {"type": "string"}},
                        "tagNames": {"type": "array", "items": {"type": "string"}}
                    },
                    "required": ["name"]
                }),
            ),
            tool(
                "get_task",
                "Get Task",
                "Fetch one task with all fields.",
                lookup_schema("Task"),
            ),
            tool(
                "list_tasks",
                "List Tasks",
                "List tasks with optional filters. Completed and dropped tasks are hidden unless includeCompleted is true.",
                json!({
                    "type": "object",
                    "properties": {
                        "projectId": {"type": "string"},
                        "projectName": {"type": "string"},
                        "flagged": {"type": "boolean", "description": "Filter by flagged state."},
                        "inboxOnly": {"type": "boolean", "default": false},
                        "includeCompleted": {"type": "boolean", "default": false},
                        "tagName": {"type": "string", "description": "Only tasks carrying this tag."}
                    }
                }),
            ),
            tool(
                "edit_task",
                "Edit Task",
                "Edit task fields. Omitted date fields are unchanged; explicit null clears them.",
                json!({
                    "type": "object",
                    "properties": {
                        "id": {"type": "string"},
                        "name": {"type": "string", "description": "Current name, if no id is given."},
                        "newName": {"type": "string"},
                        "note": {"type": "string", "description": "Replaces the note."},
                        "flagged": {"type": "boolean"},
                        "dueDate": {"type": ["string", "null"], "description": "ISO-8601; null clears."},
                        "deferDate": {"type": ["string", "null"], "description": "ISO-8601; null clears."},
                        "plannedDate": {"type": ["string", "null"], "description": "ISO-8601; null clears."}
                    }
                }),
            ),
            tool("remove_task", "Remove Task", "Delete a task.", lookup_schema("Task")),
            tool(
                "complete_task",
                "Complete Task",
                "Mark a task complete.",
                lookup_schema("Task"),
            ),
            tool(
                "move_task",
                "Move Task",
                "Move a task to a project or back to the inbox. Exactly one of toProjectId, toProjectName, toInbox must be given.",
                json!({
                    "type": "object",
                    "properties": {
                        "id": {"type": "string"},
                        "name": {"type": "string"},
                        "toProjectId": {"type": "string"},
                        "toProjectName": {"type": "string"},
                        "toInbox": {"type": "boolean", "default": false}
                    }
                }),
            ),
            tool(
                "append_note",
                "Append Note",
                "Append text to a task's note, separated by a newline when the note is non-empty.",
                json!({
                    "type": "object",
                    "properties": {
                        "id": {"type": "string"},
                        "name": {"type": "string"},
                        "note": {"type": "string", "description": "Text to append. Required."}
                    },
                    "required": ["note"]
                }),
            ),
            tool(
                "set_planned_date",
                "Set Planned Date",
                "Set or clear a task's planned date. Pass null to clear.",
                json!({
                    "type": "object",
                    "properties": {
                        "id": {"type": "string"},
                        "name": {"type": "string"},
                        "plannedDate": {"type": ["string", "null"], "description": "ISO-8601; null clears."}
                    },
                    "required": ["plannedDate"]
                }),
            ),
            // Batches
            tool(
                "batch_create_tasks",
                "Batch Create Tasks",
                "Create several tasks in one call. Items are processed in order; aggregate success means at least one item succeeded.",
                json!({
                    "type": "object",
                    "properties": {
                        "tasks": {
                            "type": "array",
                            "items": {"type": "object", "description": "Same shape as create_task input."}
                        }
                    },
                    "required": ["tasks"]
                }),
            ),
            tool(
                "batch_complete_tasks",
                "Batch Complete Tasks",
                "Complete several tasks in one call. Per-item failures, including disambiguation, are reported inline.",
                json!({
                    "type": "object",
                    "properties": {
                        "tasks": {
                            "type": "array",
                            "items": {
                                "type": "object",
                                "properties": {
                                    "id": {"type": "string"},
                                    "name": {"type": "string"}
                                }
                            }
                        }
                    },
                    "required": ["tasks"]
                }),
            ),
            tool(
                "batch_remove_tasks",
                "Batch Remove Tasks",
                "Delete several tasks in one call. Same batch semantics as batch_complete_tasks.",
                json!({
                    "type": "object",
                    "properties": {
                        "tasks": {
                            "type": "array",
                            "items": {
                                "type": "object",
                                "properties": {
                                    "id": {"type": "string"},
                                    "name": {"type": "string"}
                                }
                            }
                        }
                    },
                    "required": ["tasks"]
                }),
            ),
        ];

        Ok(ListToolsResult {
            tools,
            next_cursor: None,
        })
    }

    async fn call_tool(
        &self,
        request: CallToolRequestParam,
    ) -> Result<CallToolResult, OmniFocusError> {
        let name = request.name.as_ref().to_string();
        let args = request.arguments.unwrap_or_default();
        match self.dispatch(&name, args).await {
            Ok(value) => success_result(&value),
            Err(OmniFocusError::ToolNotFound) => Err(OmniFocusError::ToolNotFound),
            Err(e) => Ok(failure_result(&e)),
        }
    }
}

impl OmniFocusConnector {
    async fn dispatch(
        &self,
        name: &str,
        args: JsonMap<String, Value>,
    ) -> Result<Value, OmniFocusError> {
        let store = self.store();
        match name {
            "add_folder" => folders::add_folder(store, parse_input(args)?).await,
            "list_folders" => folders::list_folders(store, parse_input(args)?).await,
            "edit_folder" => folders::edit_folder(store, parse_input(args)?).await,
            "remove_folder" => folders::remove_folder(store, parse_input(args)?).await,
            "move_folder" => folders::move_folder(store, parse_input(args)?).await,

            "create_project" => projects::create_project(store, parse_input(args)?).await,
            "list_projects" => projects::list_projects(store, parse_input(args)?).await,
            "get_project" => projects::get_project(store, parse_input(args)?).await,
            "edit_project" => projects::edit_project(store, parse_input(args)?).await,
            "delete_project" => projects::delete_project(store, parse_input(args)?).await,
            "move_project" => projects::move_project(store, parse_input(args)?).await,

            "create_tag" => tags::create_tag(store, parse_input(args)?).await,
            "list_tags" => tags::list_tags(store, parse_input(args)?).await,
            "edit_tag" => tags::edit_tag(store, parse_input(args)?).await,
            "delete_tag" => tags::delete_tag(store, parse_input(args)?).await,
            "assign_tags" => tags::assign_tags(store, parse_input(args)?).await,
            "remove_tags" => tags::remove_tags(store, parse_input(args)?).await,

            "create_task" => tasks::create_task(store, parse_input(args)?).await,
            "get_task" => tasks::get_task(store, parse_input(args)?).await,
            "list_tasks" => tasks::list_tasks(store, parse_input(args)?).await,
            "edit_task" => tasks::edit_task(store, parse_input(args)?).await,
            "remove_task" => tasks::remove_task(store, parse_input(args)?).await,
            "complete_task" => tasks::complete_task(store, parse_input(args)?).await,
            "move_task" => tasks::move_task(store, parse_input(args)?).await,
            "append_note" => tasks::append_note(store, parse_input(args)?).await,
            "set_planned_date" => tasks::set_planned_date(store, parse_input(args)?).await,

            "batch_create_tasks" => tasks::batch_create_tasks(store, parse_input(args)?).await,
            "batch_complete_tasks" => tasks::batch_complete_tasks(store, parse_input(args)?).await,
            "batch_remove_tasks" => tasks::batch_remove_tasks(store, parse_input(args)?).await,

            _ => Err(OmniFocusError::ToolNotFound),
        }
    }

    // ---- resource views ----

    async fn incomplete_tasks(&self) -> Result<Vec<crate::model::Task>, OmniFocusError> {
        Ok(self
            .store()
            .query(Domain::Tasks)
            .await?
            .into_iter()
            .filter_map(|e| e.as_task().cloned())
            .filter(|t| t.status != TaskStatus::Completed && t.status != TaskStatus::Dropped)
            .collect())
    }

    async fn inbox_view(&self) -> Result<Value, OmniFocusError> {
        let tasks: Vec<_> = self
            .incomplete_tasks()
            .await?
            .into_iter()
            .filter(|t| t.in_inbox)
            .collect();
        Ok(json!({"view": "inbox", "count": tasks.len(), "tasks": tasks}))
    }

    async fn today_view(&self) -> Result<Value, OmniFocusError> {
        let today = Utc::now().date_naive();
        let is_today_or_past = |d: &Option<String>| {
            d.as_deref()
                .and_then(parse_timestamp)
                .map(|ts| ts.date_naive() <= today)
                .unwrap_or(false)
        };
        let tasks: Vec<_> = self
            .incomplete_tasks()
            .await?
            .into_iter()
            .filter(|t| is_today_or_past(&t.due_date) || is_today_or_past(&t.planned_date))
            .collect();
        Ok(json!({"view": "today", "count": tasks.len(), "tasks": tasks}))
    }

    async fn flagged_view(&self) -> Result<Value, OmniFocusError> {
        let tasks: Vec<_> = self
            .incomplete_tasks()
            .await?
            .into_iter()
            .filter(|t| t.flagged)
            .collect();
        Ok(json!({"view": "flagged", "count": tasks.len(), "tasks": tasks}))
    }

    async fn stats_view(&self) -> Result<Value, OmniFocusError> {
        let store = self.store();
        let folders = store.query(Domain::Folders).await?.len();
        let projects: Vec<_> = store
            .query(Domain::Projects)
            .await?
            .into_iter()
            .filter_map(|e| e.as_project().cloned())
            .collect();
        let tasks: Vec<_> = store
            .query(Domain::Tasks)
            .await?
            .into_iter()
            .filter_map(|e| e.as_task().cloned())
            .collect();
        let tags = store.query(Domain::Tags).await?.len();
        let completed = tasks
            .iter()
            .filter(|t| t.status == TaskStatus::Completed)
            .count();
        let today = Utc::now().date_naive();
        let due_day = |t: &crate::model::Task| t.due_date.as_deref().and_then(parse_timestamp);
        let overdue = tasks
            .iter()
            .filter(|t| t.status != TaskStatus::Completed && t.status != TaskStatus::Dropped)
            .filter(|t| due_day(t).map(|d| d.date_naive() < today).unwrap_or(false))
            .count();
        let due_today = tasks
            .iter()
            .filter(|t| t.status != TaskStatus::Completed && t.status != TaskStatus::Dropped)
            .filter(|t| due_day(t).map(|d| d.date_naive() == today).unwrap_or(false))
            .count();
        Ok(json!({
            "folders": folders,
            "projects": {
                "total": projects.len(),
                "active": projects.iter().filter(|p| p.status == ProjectStatus::Active).count(),
                "onHold": projects.iter().filter(|p| p.status == ProjectStatus::OnHold).count(),
                "done": projects.iter().filter(|p| p.status == ProjectStatus::Done).count(),
                "dropped": projects.iter().filter(|p| p.status == ProjectStatus::Dropped).count(),
            },
            "tasks": {
                "total": tasks.len(),
                "completed": completed,
                "remaining": tasks.len() - completed,
                "flagged": tasks.iter().filter(|t| t.flagged).count(),
                "inbox": tasks.iter().filter(|t| t.in_inbox).count(),
                "overdue": overdue,
                "dueToday": due_today,
            },
            "tags": tags,
        }))
    }

    async fn project_view(&self, name: &str) -> Result<Value, OmniFocusError> {
        let project = resolve_required(
            self.store(),
            Domain::Projects,
            &EntityRef::by_name(name),
            None,
        )
        .await?;
        let project_id = project.id().to_string();
        let tasks: Vec<_> = self
            .store()
            .query(Domain::Tasks)
            .await?
            .into_iter()
            .filter_map(|e| e.as_task().cloned())
            .filter(|t| t.project_id.as_deref() == Some(project_id.as_str()))
            .collect();
        Ok(json!({
            "view": "project",
            "project": {"id": project_id, "name": project.name()},
            "count": tasks.len(),
            "tasks": tasks,
        }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::MemoryStore;

    fn connector_with(store: Arc<MemoryStore>) -> OmniFocusConnector {
        OmniFocusConnector::new(store)
    }

    fn call(name: &'static str, args: Value) -> CallToolRequestParam {
        CallToolRequestParam {
            name: Cow::Borrowed(name),
            arguments: args.as_object().cloned(),
        }
    }

    #[tokio::test]
    async fn tool_catalog_is_complete() {
        let connector = connector_with(Arc::new(MemoryStore::new()));
        let tools = connector.list_tools(None).await.unwrap().tools;
        assert_eq!(tools.len(), 29);
        assert!(tools.iter().any(|t| t.name == "add_folder"));
        assert!(tools.iter().any(|t| t.name == "batch_remove_tasks"));
        for t in &tools {
            assert!(t.input_schema.contains_key("type"), "{}", t.name);
        }
    }

    #[tokio::test]
    async fn unknown_tool_is_a_protocol_error() {
        let connector = connector_with(Arc::new(MemoryStore::new()));
        let result = connector.call_tool(call("frobnicate", json!({}))).await;
        assert!(matches!(result, Err(OmniFocusError::ToolNotFound)));
    }

    #[tokio::test]
    async fn domain_errors_come_back_as_failed_results() {
        let connector = connector_with(Arc::new(MemoryStore::new()));
        let result = connector
            .call_tool(call("get_task", json!({"name": "no such task"})))
            .await
            .unwrap();
        assert_eq!(result.is_error, Some(true));
        let payload = result.structured_content.unwrap();
        assert_eq!(payload["success"], json!(false));
        assert!(payload["error"].as_str().unwrap().contains("not found"));
    }

    #[tokio::test]
    async fn ambiguous_name_reports_all_ids() {
        let store = Arc::new(MemoryStore::new());
        let a = store.seed_task("Duplicated", None).await;
        let b = store.seed_task("Duplicated", None).await;
        let connector = connector_with(store);
        let result = connector
            .call_tool(call("complete_task", json!({"name": "Duplicated"})))
            .await
            .unwrap();
        assert_eq!(result.is_error, Some(true));
        let payload = result.structured_content.unwrap();
        assert_eq!(payload["code"], json!("DISAMBIGUATION_REQUIRED"));
        assert_eq!(payload["matchingIds"], json!([a, b]));
    }

    #[tokio::test]
    async fn read_inbox_resource() {
        let store = Arc::new(MemoryStore::new());
        store.seed_task("Loose end", None).await;
        let connector = connector_with(store);
        let contents = connector
            .read_resource(ReadResourceRequestParam {
                uri: "omnifocus://inbox".to_string(),
            })
            .await
            .unwrap();
        assert_eq!(contents.len(), 1);
        match &contents[0] {
            ResourceContents::TextResourceContents { text, .. } => {
                assert!(text.contains("Loose end"));
            }
            other => panic!("expected text contents, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn unknown_resource_uri() {
        let connector = connector_with(Arc::new(MemoryStore::new()));
        let result = connector
            .read_resource(ReadResourceRequestParam {
                uri: "omnifocus://nope".to_string(),
            })
            .await;
        assert!(matches!(result, Err(OmniFocusError::ResourceNotFound)));
    }
}
