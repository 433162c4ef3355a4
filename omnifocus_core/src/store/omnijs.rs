// src/store/omnijs.rs
// Live EntityStore backed by OmniFocus. Every query and mutation becomes
// an OmniJS program evaluated through the AppleScript bridge; the program
// returns a JSON string which is parsed back here. Queries always re-read
// the current database state.

use async_trait::async_trait;
use serde_json::Value;
use tracing::debug;

use crate::error::OmniFocusError;
use crate::model::{Domain, Entity, Folder, FolderStatus, Project, ProjectStatus, Tag, TagStatus, Task};
use crate::osa::{escape_omnijs_string, evaluate_omnijs};
use crate::store::{EntityStore, Patch, Placement, ScriptRequest, TaskDestination};

#[derive(Default)]
pub struct OmniJsStore;

impl OmniJsStore {
    pub fn new() -> Self {
        Self {}
    }
}

// ============================================================================
// OmniJS fragments
// ============================================================================

fn js_str(s: &str) -> String {
    format!("\"{}\"", escape_omnijs_string(s))
}

fn js_date(iso: &str) -> String {
    format!("new Date({})", js_str(iso))
}

fn js_opt_date(value: &Option<String>) -> String {
    match value {
        Some(iso) => js_date(iso),
        None => "null".to_string(),
    }
}

fn js_bool(value: bool) -> &'static str {
    if value {
        "true"
    } else {
        "false"
    }
}

/// Insertion location for sections (folders and projects).
fn section_position(parent_id: &Option<String>, placement: &Placement) -> String {
    let container = match parent_id {
        Some(id) => format!("Folder.byIdentifier({})", js_str(id)),
        None => "library".to_string(),
    };
    match placement {
        Placement::Beginning => format!("{}.beginning", container),
        Placement::Ending => format!("{}.ending", container),
        Placement::Before(id) => format!(
            "(Folder.byIdentifier({0}) || Project.byIdentifier({0})).before",
            js_str(id)
        ),
        Placement::After(id) => format!(
            "(Folder.byIdentifier({0}) || Project.byIdentifier({0})).after",
            js_str(id)
        ),
    }
}

fn folder_status_expr(status: FolderStatus) -> &'static str {
    match status {
        FolderStatus::Active => "Folder.Status.Active",
        FolderStatus::Dropped => "Folder.Status.Dropped",
    }
}

fn project_status_expr(status: ProjectStatus) -> &'static str {
    match status {
        ProjectStatus::Active => "Project.Status.Active",
        ProjectStatus::OnHold => "Project.Status.OnHold",
        ProjectStatus::Done => "Project.Status.Done",
        ProjectStatus::Dropped => "Project.Status.Dropped",
    }
}

fn tag_status_expr(status: TagStatus) -> &'static str {
    match status {
        TagStatus::Active => "Tag.Status.Active",
        TagStatus::OnHold => "Tag.Status.OnHold",
        TagStatus::Dropped => "Tag.Status.Dropped",
    }
}

/// Guarded lookup prologue shared by every mutation script. Returns an
/// `{error}` payload instead of throwing when the id has vanished between
/// resolution and mutation.
fn lookup_or_error(var: &str, class: &str, id: &str) -> String {
    format!(
        "const {var} = {class}.byIdentifier({id});\n  if (!{var}) {{ return JSON.stringify({{error: \"{class} vanished: \" + {id}}}); }}",
        var = var,
        class = class,
        id = js_str(id)
    )
}

fn wrap_program(body: &str) -> String {
    format!("(() => {{\n  {}\n}})()", body.trim())
}

// ---- queries ----

pub(crate) fn script_query(domain: Domain) -> String {
    match domain {
        Domain::Folders => wrap_program(
            r#"const out = flattenedFolders.map(f => ({
    id: f.id.primaryKey,
    name: f.name,
    status: f.status === Folder.Status.Active ? "Active" : "Dropped",
    parentId: f.parent ? f.parent.id.primaryKey : null
  }));
  return JSON.stringify(out);"#,
        ),
        Domain::Projects => wrap_program(
            r#"const statusOf = p => {
    if (p.status === Project.Status.Active) return "Active";
    if (p.status === Project.Status.OnHold) return "OnHold";
    if (p.status === Project.Status.Done) return "Done";
    return "Dropped";
  };
  const iso = d => d ? d.toISOString() : null;
  const out = flattenedProjects.map(p => ({
    id: p.id.primaryKey,
    name: p.name,
    status: statusOf(p),
    folderId: p.parentFolder ? p.parentFolder.id.primaryKey : null,
    sequential: p.task.sequential,
    containsSingletonActions: p.containsSingletonActions,
    note: p.task.note && p.task.note.length > 0 ? p.task.note : null,
    deferDate: iso(p.deferDate),
    dueDate: iso(p.dueDate),
    reviewIntervalWeeks: (p.reviewInterval && p.reviewInterval.unit === "weeks") ? p.reviewInterval.steps : null,
    estimatedMinutes: p.task.estimatedMinutes || null,
    taskCount: p.flattenedTasks.length
  }));
  return JSON.stringify(out);"#,
        ),
        Domain::Tasks => wrap_program(
            r#"const statusOf = t => {
    const s = t.taskStatus;
    if (s === Task.Status.Completed) return "Completed";
    if (s === Task.Status.Dropped) return "Dropped";
    if (s === Task.Status.Blocked) return "Blocked";
    if (s === Task.Status.DueSoon) return "DueSoon";
    if (s === Task.Status.Next) return "Next";
    if (s === Task.Status.Overdue) return "Overdue";
    return "Available";
  };
  const iso = d => d ? d.toISOString() : null;
  const out = flattenedTasks.map(t => ({
    id: t.id.primaryKey,
    name: t.name,
    note: t.note || "",
    flagged: t.flagged,
    status: statusOf(t),
    dueDate: iso(t.dueDate),
    deferDate: iso(t.deferDate),
    plannedDate: iso(t.plannedDate),
    tags: t.tags.map(g => ({id: g.id.primaryKey, name: g.name})),
    parentId: (t.parent && !t.parent.project) ? t.parent.id.primaryKey : null,
    projectId: t.containingProject ? t.containingProject.id.primaryKey : null,
    inInbox: t.inInbox
  }));
  return JSON.stringify(out);"#,
        ),
        Domain::Tags => wrap_program(
            r#"const statusOf = t => {
    if (t.status === Tag.Status.Active) return "Active";
    if (t.status === Tag.Status.OnHold) return "OnHold";
    return "Dropped";
  };
  const out = flattenedTags.map(t => ({
    id: t.id.primaryKey,
    name: t.name,
    status: statusOf(t),
    parentId: t.parent ? t.parent.id.primaryKey : null,
    allowsNextAction: t.allowsNextAction,
    taskCount: t.remainingTasks.length
  }));
  return JSON.stringify(out);"#,
        ),
    }
}

// ---- folder mutations ----

fn script_create_folder(name: &str, parent_id: &Option<String>, placement: &Placement) -> String {
    wrap_program(&format!(
        "const f = new Folder({}, {});\n  return JSON.stringify({{id: f.id.primaryKey, name: f.name}});",
        js_str(name),
        section_position(parent_id, placement)
    ))
}

fn script_update_folder(id: &str, name: &Option<String>, status: &Option<FolderStatus>) -> String {
    let mut body = vec![lookup_or_error("f", "Folder", id)];
    if let Some(n) = name {
        body.push(format!("f.name = {};", js_str(n)));
    }
    if let Some(s) = status {
        body.push(format!("f.status = {};", folder_status_expr(*s)));
    }
    body.push("return JSON.stringify({id: f.id.primaryKey, name: f.name});".to_string());
    wrap_program(&body.join("\n  "))
}

fn script_delete_folder(id: &str) -> String {
    let mut body = vec![lookup_or_error("f", "Folder", id)];
    body.push("const name = f.name;".to_string());
    body.push("deleteObject(f);".to_string());
    body.push(format!(
        "return JSON.stringify({{id: {}, name: name}});",
        js_str(id)
    ));
    wrap_program(&body.join("\n  "))
}

fn script_move_section(
    class: &str,
    id: &str,
    folder_id: &Option<String>,
    placement: &Placement,
) -> String {
    let mut body = vec![lookup_or_error("s", class, id)];
    body.push(format!(
        "moveSections([s], {});",
        section_position(folder_id, placement)
    ));
    body.push("return JSON.stringify({id: s.id.primaryKey, name: s.name});".to_string());
    wrap_program(&body.join("\n  "))
}

// ---- project mutations ----

#[allow(clippy::too_many_arguments)]
fn script_create_project(
    name: &str,
    folder_id: &Option<String>,
    note: &Option<String>,
    sequential: bool,
    contains_singleton_actions: bool,
    defer_date: &Option<String>,
    due_date: &Option<String>,
    review_interval_weeks: &Option<u32>,
    estimated_minutes: &Option<u32>,
) -> String {
    let mut body = vec![format!(
        "const p = new Project({}, {});",
        js_str(name),
        section_position(folder_id, &Placement::Ending)
    )];
    if let Some(n) = note {
        body.push(format!("p.task.note = {};", js_str(n)));
    }
    body.push(format!("p.task.sequential = {};", js_bool(sequential)));
    body.push(format!(
        "p.containsSingletonActions = {};",
        js_bool(contains_singleton_actions)
    ));
    if defer_date.is_some() {
        body.push(format!("p.deferDate = {};", js_opt_date(defer_date)));
    }
    if due_date.is_some() {
        body.push(format!("p.dueDate = {};", js_opt_date(due_date)));
    }
    if let Some(weeks) = review_interval_weeks {
        body.push(format!(
            "p.reviewInterval = {{unit: \"weeks\", steps: {}, fixed: false}};",
            weeks
        ));
    }
    if let Some(minutes) = estimated_minutes {
        body.push(format!("p.task.estimatedMinutes = {};", minutes));
    }
    body.push("return JSON.stringify({id: p.id.primaryKey, name: p.name});".to_string());
    wrap_program(&body.join("\n  "))
}

#[allow(clippy::too_many_arguments)]
fn script_update_project(
    id: &str,
    name: &Option<String>,
    note: &Option<String>,
    status: &Option<ProjectStatus>,
    sequential: &Option<bool>,
    contains_singleton_actions: &Option<bool>,
    defer_date: &Patch<String>,
    due_date: &Patch<String>,
    review_interval_weeks: &Patch<u32>,
    estimated_minutes: &Patch<u32>,
) -> String {
    let mut body = vec![lookup_or_error("p", "Project", id)];
    if let Some(n) = name {
        body.push(format!("p.name = {};", js_str(n)));
    }
    if let Some(n) = note {
        body.push(format!("p.task.note = {};", js_str(n)));
    }
    if let Some(s) = status {
        body.push(format!("p.status = {};", project_status_expr(*s)));
    }
    if let Some(s) = sequential {
        body.push(format!("p.task.sequential = {};", js_bool(*s)));
    }
    if let Some(s) = contains_singleton_actions {
        body.push(format!("p.containsSingletonActions = {};", js_bool(*s)));
    }
    push_date_patch(&mut body, "p.deferDate", defer_date);
    push_date_patch(&mut body, "p.dueDate", due_date);
    match review_interval_weeks {
        Patch::Keep => {}
        Patch::Clear => body.push("p.reviewInterval = null;".to_string()),
        Patch::Set(weeks) => body.push(format!(
            "p.reviewInterval = {{unit: \"weeks\", steps: {}, fixed: false}};",
            weeks
        )),
    }
    match estimated_minutes {
        Patch::Keep => {}
        Patch::Clear => body.push("p.task.estimatedMinutes = null;".to_string()),
        Patch::Set(minutes) => body.push(format!("p.task.estimatedMinutes = {};", minutes)),
    }
    body.push("return JSON.stringify({id: p.id.primaryKey, name: p.name});".to_string());
    wrap_program(&body.join("\n  "))
}

fn script_delete_project(id: &str) -> String {
    let mut body = vec![lookup_or_error("p", "Project", id)];
    body.push("const name = p.name;".to_string());
    body.push("const taskCount = p.flattenedTasks.length;".to_string());
    body.push("deleteObject(p);".to_string());
    body.push(format!(
        "return JSON.stringify({{id: {}, name: name, taskCount: taskCount}});",
        js_str(id)
    ));
    wrap_program(&body.join("\n  "))
}

// ---- tag mutations ----

fn script_create_tag(name: &str, parent_id: &Option<String>) -> String {
    let body = match parent_id {
        Some(pid) => format!(
            "const parent = Tag.byIdentifier({});\n  const t = new Tag({}, parent);\n  return JSON.stringify({{id: t.id.primaryKey, name: t.name}});",
            js_str(pid),
            js_str(name)
        ),
        None => format!(
            "const t = new Tag({});\n  return JSON.stringify({{id: t.id.primaryKey, name: t.name}});",
            js_str(name)
        ),
    };
    wrap_program(&body)
}

fn script_update_tag(
    id: &str,
    name: &Option<String>,
    status: &Option<TagStatus>,
    allows_next_action: &Option<bool>,
) -> String {
    let mut body = vec![lookup_or_error("t", "Tag", id)];
    if let Some(n) = name {
        body.push(format!("t.name = {};", js_str(n)));
    }
    if let Some(s) = status {
        body.push(format!("t.status = {};", tag_status_expr(*s)));
    }
    if let Some(a) = allows_next_action {
        body.push(format!("t.allowsNextAction = {};", js_bool(*a)));
    }
    body.push("return JSON.stringify({id: t.id.primaryKey, name: t.name});".to_string());
    wrap_program(&body.join("\n  "))
}

fn script_delete_tag(id: &str) -> String {
    let mut body = vec![lookup_or_error("t", "Tag", id)];
    body.push("const name = t.name;".to_string());
    body.push("deleteObject(t);".to_string());
    body.push(format!(
        "return JSON.stringify({{id: {}, name: name}});",
        js_str(id)
    ));
    wrap_program(&body.join("\n  "))
}

// ---- task mutations ----

#[allow(clippy::too_many_arguments)]
fn script_create_task(
    name: &str,
    project_id: &Option<String>,
    parent_task_id: &Option<String>,
    note: &Option<String>,
    flagged: bool,
    due_date: &Option<String>,
    defer_date: &Option<String>,
    planned_date: &Option<String>,
    tag_ids: &[String],
) -> String {
    let position = if let Some(pid) = project_id {
        format!("Project.byIdentifier({}).ending", js_str(pid))
    } else if let Some(tid) = parent_task_id {
        format!("Task.byIdentifier({}).ending", js_str(tid))
    } else {
        "inbox.ending".to_string()
    };

    let mut body = vec![format!("const t = new Task({}, {});", js_str(name), position)];
    if let Some(n) = note {
        body.push(format!("t.note = {};", js_str(n)));
    }
    if flagged {
        body.push("t.flagged = true;".to_string());
    }
    if due_date.is_some() {
        body.push(format!("t.dueDate = {};", js_opt_date(due_date)));
    }
    if defer_date.is_some() {
        body.push(format!("t.deferDate = {};", js_opt_date(defer_date)));
    }
    if planned_date.is_some() {
        body.push(format!("t.plannedDate = {};", js_opt_date(planned_date)));
    }
    if !tag_ids.is_empty() {
        body.push(format!("t.addTags([{}]);", tag_lookups(tag_ids)));
    }
    body.push("return JSON.stringify({id: t.id.primaryKey, name: t.name});".to_string());
    wrap_program(&body.join("\n  "))
}

fn script_update_task(
    id: &str,
    name: &Option<String>,
    note: &Option<String>,
    flagged: &Option<bool>,
    due_date: &Patch<String>,
    defer_date: &Patch<String>,
    planned_date: &Patch<String>,
) -> String {
    let mut body = vec![lookup_or_error("t", "Task", id)];
    if let Some(n) = name {
        body.push(format!("t.name = {};", js_str(n)));
    }
    if let Some(n) = note {
        body.push(format!("t.note = {};", js_str(n)));
    }
    if let Some(f) = flagged {
        body.push(format!("t.flagged = {};", js_bool(*f)));
    }
    push_date_patch(&mut body, "t.dueDate", due_date);
    push_date_patch(&mut body, "t.deferDate", defer_date);
    push_date_patch(&mut body, "t.plannedDate", planned_date);
    body.push("return JSON.stringify({id: t.id.primaryKey, name: t.name});".to_string());
    wrap_program(&body.join("\n  "))
}

fn script_delete_task(id: &str) -> String {
    let mut body = vec![lookup_or_error("t", "Task", id)];
    body.push("const name = t.name;".to_string());
    body.push("deleteObject(t);".to_string());
    body.push(format!(
        "return JSON.stringify({{id: {}, name: name}});",
        js_str(id)
    ));
    wrap_program(&body.join("\n  "))
}

fn script_move_task(id: &str, destination: &TaskDestination) -> String {
    let position = match destination {
        TaskDestination::Project(pid) => {
            format!("Project.byIdentifier({}).ending", js_str(pid))
        }
        TaskDestination::Inbox => "inbox.ending".to_string(),
    };
    let mut body = vec![lookup_or_error("t", "Task", id)];
    body.push(format!("moveTasks([t], {});", position));
    body.push("return JSON.stringify({id: t.id.primaryKey, name: t.name});".to_string());
    wrap_program(&body.join("\n  "))
}

fn script_complete_task(id: &str) -> String {
    let mut body = vec![lookup_or_error("t", "Task", id)];
    body.push("t.markComplete();".to_string());
    body.push(
        "return JSON.stringify({id: t.id.primaryKey, name: t.name, completed: true});".to_string(),
    );
    wrap_program(&body.join("\n  "))
}

fn script_append_note(task_id: &str, text: &str) -> String {
    let mut body = vec![lookup_or_error("t", "Task", task_id)];
    body.push(format!(
        "if (t.note && t.note.length > 0) {{ t.appendStringToNote(\"\\n\" + {text}); }} else {{ t.appendStringToNote({text}); }}",
        text = js_str(text)
    ));
    body.push("return JSON.stringify({id: t.id.primaryKey, name: t.name});".to_string());
    wrap_program(&body.join("\n  "))
}

fn tag_lookups(tag_ids: &[String]) -> String {
    tag_ids
        .iter()
        .map(|id| format!("Tag.byIdentifier({})", js_str(id)))
        .collect::<Vec<_>>()
        .join(", ")
}

fn script_add_tags(task_id: &str, tag_ids: &[String]) -> String {
    let mut body = vec![lookup_or_error("t", "Task", task_id)];
    body.push(format!("t.addTags([{}]);", tag_lookups(tag_ids)));
    body.push("return JSON.stringify({id: t.id.primaryKey, name: t.name});".to_string());
    wrap_program(&body.join("\n  "))
}

fn script_remove_tags(task_id: &str, tag_ids: &[String]) -> String {
    let mut body = vec![lookup_or_error("t", "Task", task_id)];
    body.push(format!("t.removeTags([{}]);", tag_lookups(tag_ids)));
    body.push("return JSON.stringify({id: t.id.primaryKey, name: t.name});".to_string());
    wrap_program(&body.join("\n  "))
}

fn push_date_patch(body: &mut Vec<String>, target: &str, patch: &Patch<String>) {
    match patch {
        Patch::Keep => {}
        Patch::Clear => body.push(format!("{} = null;", target)),
        Patch::Set(iso) => body.push(format!("{} = {};", target, js_date(iso))),
    }
}

fn script_for(request: &ScriptRequest) -> String {
    match request {
        ScriptRequest::CreateFolder {
            name,
            parent_id,
            placement,
        } => script_create_folder(name, parent_id, placement),
        ScriptRequest::UpdateFolder { id, name, status } => script_update_folder(id, name, status),
        ScriptRequest::DeleteFolder { id } => script_delete_folder(id),
        ScriptRequest::MoveFolder {
            id,
            parent_id,
            placement,
        } => script_move_section("Folder", id, parent_id, placement),
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
        } => script_create_project(
            name,
            folder_id,
            note,
            *sequential,
            *contains_singleton_actions,
            defer_date,
            due_date,
            review_interval_weeks,
            estimated_minutes,
        ),
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
        } => script_update_project(
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
        ),
        ScriptRequest::DeleteProject { id } => script_delete_project(id),
        ScriptRequest::MoveProject {
            id,
            folder_id,
            placement,
        } => script_move_section("Project", id, folder_id, placement),
        ScriptRequest::CreateTag { name, parent_id } => script_create_tag(name, parent_id),
        ScriptRequest::UpdateTag {
            id,
            name,
            status,
            allows_next_action,
        } => script_update_tag(id, name, status, allows_next_action),
        ScriptRequest::DeleteTag { id } => script_delete_tag(id),
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
        } => script_create_task(
            name,
            project_id,
            parent_task_id,
            note,
            *flagged,
            due_date,
            defer_date,
            planned_date,
            tag_ids,
        ),
        ScriptRequest::UpdateTask {
            id,
            name,
            note,
            flagged,
            due_date,
            defer_date,
            planned_date,
        } => script_update_task(id, name, note, flagged, due_date, defer_date, planned_date),
        ScriptRequest::DeleteTask { id } => script_delete_task(id),
        ScriptRequest::MoveTask { id, destination } => script_move_task(id, destination),
        ScriptRequest::CompleteTask { id } => script_complete_task(id),
        ScriptRequest::AppendNote { task_id, text } => script_append_note(task_id, text),
        ScriptRequest::AddTags { task_id, tag_ids } => script_add_tags(task_id, tag_ids),
        ScriptRequest::RemoveTags { task_id, tag_ids } => script_remove_tags(task_id, tag_ids),
    }
}

// ============================================================================
// EntityStore implementation
// ============================================================================

fn parse_entities(domain: Domain, value: Value) -> Result<Vec<Entity>, OmniFocusError> {
    let wrap = |value: Value| -> Result<Vec<Entity>, OmniFocusError> {
        match domain {
            Domain::Folders => Ok(serde_json::from_value::<Vec<Folder>>(value)?
                .into_iter()
                .map(Entity::Folder)
                .collect()),
            Domain::Projects => Ok(serde_json::from_value::<Vec<Project>>(value)?
                .into_iter()
                .map(Entity::Project)
                .collect()),
            Domain::Tasks => Ok(serde_json::from_value::<Vec<Task>>(value)?
                .into_iter()
                .map(Entity::Task)
                .collect()),
            Domain::Tags => Ok(serde_json::from_value::<Vec<Tag>>(value)?
                .into_iter()
                .map(Entity::Tag)
                .collect()),
        }
    };
    wrap(value)
}

#[async_trait]
impl EntityStore for OmniJsStore {
    async fn query(&self, domain: Domain) -> Result<Vec<Entity>, OmniFocusError> {
        let script = script_query(domain);
        debug!(domain = domain.entity_label(), "querying OmniFocus");
        let value = evaluate_omnijs(&script).await?;
        parse_entities(domain, value)
    }

    async fn mutate(&self, request: ScriptRequest) -> Result<Value, OmniFocusError> {
        let script = script_for(&request);
        debug!(?request, "mutating OmniFocus");
        let value = evaluate_omnijs(&script).await?;
        if let Some(message) = value.get("error").and_then(|v| v.as_str()) {
            return Err(OmniFocusError::External(message.to_string()));
        }
        Ok(value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn query_scripts_return_json() {
        for domain in [Domain::Folders, Domain::Projects, Domain::Tasks, Domain::Tags] {
            let script = script_query(domain);
            assert!(script.contains("JSON.stringify"), "{:?}", domain);
            assert!(script.starts_with("(() =>"));
        }
    }

    #[test]
    fn create_folder_at_root_uses_library() {
        let script = script_create_folder("Work", &None, &Placement::Ending);
        assert!(script.contains(r#"new Folder("Work", library.ending)"#));
    }

    #[test]
    fn create_folder_in_parent_uses_folder_position() {
        let script = script_create_folder(
            "Sub",
            &Some("f123".to_string()),
            &Placement::Beginning,
        );
        assert!(script.contains(r#"Folder.byIdentifier("f123").beginning"#));
    }

    #[test]
    fn names_are_escaped_into_the_script() {
        let script = script_create_folder("Say \"hi\"", &None, &Placement::Ending);
        assert!(script.contains(r#"new Folder("Say \"hi\"", library.ending)"#));
    }

    #[test]
    fn update_project_emits_only_supplied_fields() {
        let script = script_update_project(
            "p1",
            &None,
            &None,
            &Some(ProjectStatus::OnHold),
            &Some(true),
            &None,
            &Patch::Keep,
            &Patch::Clear,
            &Patch::Keep,
            &Patch::Keep,
        );
        assert!(script.contains("p.status = Project.Status.OnHold;"));
        assert!(script.contains("p.task.sequential = true;"));
        assert!(script.contains("p.dueDate = null;"));
        assert!(!script.contains("p.deferDate"));
        assert!(!script.contains("p.name ="));
    }

    #[test]
    fn move_task_to_inbox() {
        let script = script_move_task("t9", &TaskDestination::Inbox);
        assert!(script.contains("moveTasks([t], inbox.ending);"));
    }

    #[test]
    fn add_tags_looks_up_each_tag() {
        let script = script_add_tags("t1", &["g1".to_string(), "g2".to_string()]);
        assert!(script.contains(r#"t.addTags([Tag.byIdentifier("g1"), Tag.byIdentifier("g2")]);"#));
    }

    #[test]
    fn mutation_scripts_guard_vanished_ids() {
        let script = script_delete_task("t1");
        assert!(script.contains("if (!t)"));
        assert!(script.contains("vanished"));
    }
}
