// End-to-end tests of the tool surface against the in-memory store:
// resolution precedence, disambiguation, cross-field invariants, folder
// removal relocation, and batch semantics.

use std::borrow::Cow;
use std::sync::Arc;

use serde_json::{json, Value};

use omnifocus_core::connector::OmniFocusConnector;
use omnifocus_core::store::MemoryStore;
use omnifocus_core::{CallToolRequestParam, Connector};

struct Fixture {
    store: Arc<MemoryStore>,
    connector: OmniFocusConnector,
}

fn fixture() -> Fixture {
    let store = Arc::new(MemoryStore::new());
    let connector = OmniFocusConnector::new(store.clone());
    Fixture { store, connector }
}

impl Fixture {
    /// Call a tool and return its structured payload.
    async fn call(&self, name: &'static str, args: Value) -> Value {
        let result = self
            .connector
            .call_tool(CallToolRequestParam {
                name: Cow::Borrowed(name),
                arguments: args.as_object().cloned(),
            })
            .await
            .expect("tool should not fail at the protocol level");
        result.structured_content.expect("structured payload")
    }
}

#[tokio::test]
async fn id_takes_precedence_over_ambiguous_name() {
    let f = fixture();
    let first = f.store.seed_task("Call mom", None).await;
    f.store.seed_task("Call mom", None).await;

    // The name alone would be ambiguous; the id must win without
    // consulting it.
    let payload = f
        .call("complete_task", json!({"id": first, "name": "Call mom"}))
        .await;
    assert_eq!(payload["success"], json!(true));
    assert_eq!(payload["id"], json!(first));
}

#[tokio::test]
async fn unknown_id_never_falls_back_to_name() {
    let f = fixture();
    f.store.seed_task("Water plants", None).await;

    let payload = f
        .call(
            "complete_task",
            json!({"id": "bogus", "name": "Water plants"}),
        )
        .await;
    assert_eq!(payload["success"], json!(false));
    assert!(payload["error"].as_str().unwrap().contains("not found"));
    assert!(payload.get("code").is_none());
}

#[tokio::test]
async fn disambiguation_lists_every_match() {
    let f = fixture();
    let a = f.store.seed_project("Renovation", None).await;
    let b = f.store.seed_project("Renovation", None).await;
    let c = f.store.seed_project("Renovation", None).await;

    let payload = f.call("get_project", json!({"name": "Renovation"})).await;
    assert_eq!(payload["success"], json!(false));
    assert_eq!(payload["code"], json!("DISAMBIGUATION_REQUIRED"));
    let ids = payload["matchingIds"].as_array().unwrap();
    assert_eq!(ids.len(), 3);
    assert_eq!(ids, &vec![json!(a), json!(b), json!(c)]);

    // Retry with one of the reported ids resolves.
    let payload = f.call("get_project", json!({"id": b})).await;
    assert_eq!(payload["success"], json!(true));
    assert_eq!(payload["project"]["id"], json!(b));
}

#[tokio::test]
async fn single_match_never_carries_the_code() {
    let f = fixture();
    f.store.seed_project("Unique", None).await;
    let payload = f.call("get_project", json!({"name": "Unique"})).await;
    assert_eq!(payload["success"], json!(true));
    assert!(payload.get("code").is_none());
}

#[tokio::test]
async fn sequential_and_singleton_are_mutually_exclusive() {
    let f = fixture();
    let id = f.store.seed_project("Exclusive", None).await;

    // Both set true in one call: exactly one must hold afterward.
    let payload = f
        .call(
            "edit_project",
            json!({"id": id, "sequential": true, "containsSingletonActions": true}),
        )
        .await;
    assert_eq!(payload["success"], json!(true));

    let project = f.call("get_project", json!({"id": id})).await;
    let seq = project["project"]["sequential"].as_bool().unwrap();
    let single = project["project"]["containsSingletonActions"]
        .as_bool()
        .unwrap();
    assert!(seq != single);

    // Setting the other one true flips the pair.
    f.call("edit_project", json!({"id": id, "sequential": true}))
        .await;
    let project = f.call("get_project", json!({"id": id})).await;
    assert_eq!(project["project"]["sequential"], json!(true));
    assert_eq!(project["project"]["containsSingletonActions"], json!(false));
}

#[tokio::test]
async fn move_validation_is_strict_xor() {
    let f = fixture();
    let task = f.store.seed_task("Drifting", None).await;
    let project = f.store.seed_project("Dest", None).await;

    let none = f.call("move_task", json!({"id": task})).await;
    assert_eq!(none["success"], json!(false));
    assert!(none["error"]
        .as_str()
        .unwrap()
        .contains("no destination specified"));

    let both = f
        .call(
            "move_task",
            json!({"id": task, "toProjectId": project, "toInbox": true}),
        )
        .await;
    assert_eq!(both["success"], json!(false));
    assert!(both["error"]
        .as_str()
        .unwrap()
        .contains("multiple destinations specified"));

    let one = f
        .call("move_task", json!({"id": task, "toProjectId": project}))
        .await;
    assert_eq!(one["success"], json!(true));
}

#[tokio::test]
async fn remove_folder_relocates_children_instead_of_deleting() {
    let f = fixture();
    let folder = f.store.seed_folder("Doomed", None).await;
    let sub = f.store.seed_folder("Survivor", Some(&folder)).await;
    let p1 = f.store.seed_project("Alpha", Some(&folder)).await;
    let p2 = f.store.seed_project("Beta", Some(&folder)).await;

    let payload = f.call("remove_folder", json!({"id": folder})).await;
    assert_eq!(payload["success"], json!(true));
    assert_eq!(payload["projectsMoved"], json!(2));
    assert_eq!(payload["childFoldersMoved"], json!(1));

    // Everything relocated to the root, nothing deleted.
    let folders = f.call("list_folders", json!({})).await;
    let listed = folders["folders"].as_array().unwrap();
    assert_eq!(listed.len(), 1);
    assert_eq!(listed[0]["id"], json!(sub));
    assert_eq!(listed[0]["parentId"], Value::Null);

    let projects = f.call("list_projects", json!({})).await;
    let listed = projects["projects"].as_array().unwrap();
    assert_eq!(listed.len(), 2);
    for p in listed {
        assert!(p["id"] == json!(p1) || p["id"] == json!(p2));
        assert_eq!(p["folderId"], Value::Null);
    }
}

#[tokio::test]
async fn move_folder_rejects_itself_and_its_descendants() {
    let f = fixture();
    let top = f.store.seed_folder("Top", None).await;
    let sub = f.store.seed_folder("Sub", Some(&top)).await;
    let deeper = f.store.seed_folder("Deeper", Some(&sub)).await;
    let other = f.store.seed_folder("Other", None).await;

    let into_self = f
        .call("move_folder", json!({"id": top, "toFolderId": top}))
        .await;
    assert_eq!(into_self["success"], json!(false));
    assert!(into_self["error"].as_str().unwrap().contains("itself"));

    let into_descendant = f
        .call("move_folder", json!({"id": top, "toFolderId": deeper}))
        .await;
    assert_eq!(into_descendant["success"], json!(false));
    assert!(into_descendant["error"]
        .as_str()
        .unwrap()
        .contains("subfolders"));

    // The hierarchy is untouched and an unrelated destination still works.
    let moved = f
        .call("move_folder", json!({"id": top, "toFolderId": other}))
        .await;
    assert_eq!(moved["success"], json!(true));
    let folders = f.call("list_folders", json!({})).await;
    let listed = folders["folders"].as_array().unwrap();
    let parent_of = |id: &Value| {
        listed
            .iter()
            .find(|f| &f["id"] == id)
            .map(|f| f["parentId"].clone())
            .unwrap()
    };
    assert_eq!(parent_of(&json!(top)), json!(other));
    assert_eq!(parent_of(&json!(sub)), json!(top));
}

#[tokio::test]
async fn before_placement_needs_a_sibling_but_beginning_does_not() {
    let f = fixture();

    let missing = f
        .call("add_folder", json!({"name": "Early", "position": "before"}))
        .await;
    assert_eq!(missing["success"], json!(false));
    assert!(missing["error"]
        .as_str()
        .unwrap()
        .contains("relativeTo is required"));

    let ok = f
        .call("add_folder", json!({"name": "Early", "position": "beginning"}))
        .await;
    assert_eq!(ok["success"], json!(true));
}

#[tokio::test]
async fn batch_reports_items_independently() {
    let f = fixture();
    let one = f.store.seed_task("one", None).await;
    let three = f.store.seed_task("three", None).await;

    let payload = f
        .call(
            "batch_complete_tasks",
            json!({"tasks": [
                {"id": one},
                {"name": "does not exist"},
                {"id": three},
            ]}),
        )
        .await;

    assert_eq!(payload["success"], json!(true));
    let results = payload["results"].as_array().unwrap();
    assert_eq!(results.len(), 3);
    assert_eq!(results[0]["success"], json!(true));
    assert_eq!(results[1]["success"], json!(false));
    assert_eq!(results[2]["success"], json!(true));
}

#[tokio::test]
async fn batch_disambiguation_stays_inline() {
    let f = fixture();
    let a = f.store.seed_task("Twin", None).await;
    let b = f.store.seed_task("Twin", None).await;
    let solo = f.store.seed_task("Solo", None).await;

    let payload = f
        .call(
            "batch_complete_tasks",
            json!({"tasks": [{"name": "Twin"}, {"id": solo}]}),
        )
        .await;

    assert_eq!(payload["success"], json!(true));
    let results = payload["results"].as_array().unwrap();
    assert_eq!(results[0]["success"], json!(false));
    assert_eq!(results[0]["code"], json!("DISAMBIGUATION_REQUIRED"));
    assert_eq!(results[0]["matchingIds"], json!([a, b]));
    assert_eq!(results[1]["success"], json!(true));
}

#[tokio::test]
async fn created_names_are_trimmed_and_resolvable() {
    let f = fixture();
    let created = f.call("create_tag", json!({"name": "  Work  "})).await;
    assert_eq!(created["success"], json!(true));
    assert_eq!(created["name"], json!("Work"));

    let edited = f
        .call("edit_tag", json!({"name": "Work", "newName": "Office"}))
        .await;
    assert_eq!(edited["success"], json!(true));
    assert_eq!(edited["name"], json!("Office"));
}

#[tokio::test]
async fn null_clears_and_omission_keeps_dates() {
    let f = fixture();
    let id = f.store.seed_project("Dated", None).await;

    f.call(
        "edit_project",
        json!({"id": id, "dueDate": "2026-09-01T17:00:00"}),
    )
    .await;
    let project = f.call("get_project", json!({"id": id})).await;
    assert_eq!(project["project"]["dueDate"], json!("2026-09-01T17:00:00"));

    // Omitted: unchanged.
    f.call("edit_project", json!({"id": id, "newName": "Still dated"}))
        .await;
    let project = f.call("get_project", json!({"id": id})).await;
    assert_eq!(project["project"]["dueDate"], json!("2026-09-01T17:00:00"));

    // Explicit null: cleared.
    f.call("edit_project", json!({"id": id, "dueDate": null}))
        .await;
    let project = f.call("get_project", json!({"id": id})).await;
    assert_eq!(project["project"]["dueDate"], Value::Null);
}

#[tokio::test]
async fn invalid_dates_are_rejected_before_mutation() {
    let f = fixture();
    let id = f.store.seed_task("Dated", None).await;
    let payload = f
        .call("edit_task", json!({"id": id, "dueDate": "next tuesday"}))
        .await;
    assert_eq!(payload["success"], json!(false));
    assert!(payload["error"].as_str().unwrap().contains("Invalid date"));
}

#[tokio::test]
async fn create_tools_report_ambiguous_containers_without_the_code() {
    let f = fixture();
    f.store.seed_folder("Dup", None).await;
    f.store.seed_folder("Dup", None).await;

    let payload = f
        .call(
            "create_project",
            json!({"name": "Homeless", "folderName": "Dup"}),
        )
        .await;
    assert_eq!(payload["success"], json!(false));
    // Create tools never speak the disambiguation retry protocol.
    assert!(payload.get("code").is_none());
    assert!(payload["error"].as_str().unwrap().contains("explicit id"));
}

#[tokio::test]
async fn assign_tags_resolves_tasks_and_tags_per_item() {
    let f = fixture();
    let task = f.store.seed_task("Tagged", None).await;
    let other = f.store.seed_task("Other", None).await;
    f.store.seed_tag("errand", None).await;

    let payload = f
        .call(
            "assign_tags",
            json!({"items": [
                {"taskId": task, "tagNames": ["errand"]},
                {"taskId": other, "tagNames": ["missing tag"]},
            ]}),
        )
        .await;

    assert_eq!(payload["success"], json!(true));
    let results = payload["results"].as_array().unwrap();
    assert_eq!(results[0]["success"], json!(true));
    assert_eq!(results[1]["success"], json!(false));

    let got = f.call("get_task", json!({"id": task})).await;
    let tags = got["task"]["tags"].as_array().unwrap();
    assert_eq!(tags.len(), 1);
    assert_eq!(tags[0]["name"], json!("errand"));
}

#[tokio::test]
async fn append_note_separates_with_newline() {
    let f = fixture();
    let id = f.store.seed_task("Noted", None).await;

    f.call("append_note", json!({"id": id, "note": "first"})).await;
    f.call("append_note", json!({"id": id, "note": "second"})).await;

    let got = f.call("get_task", json!({"id": id})).await;
    assert_eq!(got["task"]["note"], json!("first\nsecond"));
}

#[tokio::test]
async fn set_planned_date_requires_the_field_and_clears_on_null() {
    let f = fixture();
    let id = f.store.seed_task("Planned", None).await;

    let missing = f.call("set_planned_date", json!({"id": id})).await;
    assert_eq!(missing["success"], json!(false));

    let set = f
        .call(
            "set_planned_date",
            json!({"id": id, "plannedDate": "2026-08-30"}),
        )
        .await;
    assert_eq!(set["success"], json!(true));
    let got = f.call("get_task", json!({"id": id})).await;
    assert_eq!(got["task"]["plannedDate"], json!("2026-08-30"));

    let cleared = f
        .call("set_planned_date", json!({"id": id, "plannedDate": null}))
        .await;
    assert_eq!(cleared["success"], json!(true));
    assert_eq!(cleared["cleared"], json!(true));
    let got = f.call("get_task", json!({"id": id})).await;
    assert_eq!(got["task"]["plannedDate"], Value::Null);
}

#[tokio::test]
async fn delete_project_reports_task_cascade() {
    let f = fixture();
    let project = f.store.seed_project("Cascading", None).await;
    f.store.seed_task("a", Some(&project)).await;
    f.store.seed_task("b", Some(&project)).await;

    let payload = f.call("delete_project", json!({"id": project})).await;
    assert_eq!(payload["success"], json!(true));
    assert_eq!(payload["tasksDeleted"], json!(2));
    assert!(payload["message"].as_str().unwrap().contains("deleted"));

    let (_, projects, tasks, _) = f.store.counts().await;
    assert_eq!(projects, 0);
    assert_eq!(tasks, 0);
}

#[tokio::test]
async fn batch_create_tasks_validates_each_item() {
    let f = fixture();
    let project = f.store.seed_project("Target", None).await;

    let payload = f
        .call(
            "batch_create_tasks",
            json!({"tasks": [
                {"name": "good one", "projectId": project},
                {"name": "   "},
                {"name": "good two"},
            ]}),
        )
        .await;

    assert_eq!(payload["success"], json!(true));
    let results = payload["results"].as_array().unwrap();
    assert_eq!(results.len(), 3);
    assert_eq!(results[0]["success"], json!(true));
    assert_eq!(results[1]["success"], json!(false));
    assert_eq!(results[2]["success"], json!(true));

    let listed = f.call("list_tasks", json!({"projectId": project})).await;
    assert_eq!(listed["count"], json!(1));
}
