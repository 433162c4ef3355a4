// src/ops/mod.rs
// Mutation primitives, one module per entity domain. Every primitive has
// the same shape: resolve targets, validate cross-field invariants, apply
// the change through the store, report a structured outcome. Validation
// happens before any mutation so a failed call has no partial effects.

pub mod batch;
pub mod folders;
pub mod projects;
pub mod tags;
pub mod tasks;

use serde::{Deserialize, Deserializer};

use crate::error::OmniFocusError;
use crate::model::{EntityRef, FolderStatus, ProjectStatus, TagStatus};
use crate::resolver::resolve_required;
use crate::store::{EntityStore, Patch, Placement};

/// Deserialize helper distinguishing an omitted field from an explicit
/// JSON null. Pair with `#[serde(default)]`: omitted stays `None`, null
/// becomes `Some(None)`, a value becomes `Some(Some(v))`.
pub(crate) fn double_option<'de, T, D>(de: D) -> Result<Option<Option<T>>, D::Error>
where
    T: Deserialize<'de>,
    D: Deserializer<'de>,
{
    Deserialize::deserialize(de).map(Some)
}

/// Trim a required name field, rejecting empty values.
pub(crate) fn require_name(label: &str, value: Option<String>) -> Result<String, OmniFocusError> {
    let trimmed = value.map(|s| s.trim().to_string()).unwrap_or_default();
    if trimmed.is_empty() {
        return Err(OmniFocusError::Validation(format!("{} is required", label)));
    }
    Ok(trimmed)
}

/// Validate a date string against the accepted ISO-8601 forms. The value
/// is passed through verbatim; only its shape is checked here.
pub(crate) fn validate_date(field: &str, value: &str) -> Result<String, OmniFocusError> {
    use chrono::{DateTime, NaiveDate, NaiveDateTime};

    let v = value.trim();
    let ok = NaiveDateTime::parse_from_str(v, "%Y-%m-%dT%H:%M:%S").is_ok()
        || NaiveDate::parse_from_str(v, "%Y-%m-%d").is_ok()
        || DateTime::parse_from_rfc3339(v).is_ok();
    if ok {
        Ok(v.to_string())
    } else {
        Err(OmniFocusError::Validation(format!(
            "Invalid date for {}: '{}' (expected ISO-8601, e.g. 2026-01-15 or 2026-01-15T17:00:00)",
            field, value
        )))
    }
}

pub(crate) fn validate_opt_date(
    field: &str,
    value: Option<String>,
) -> Result<Option<String>, OmniFocusError> {
    value.map(|v| validate_date(field, &v)).transpose()
}

/// Validate a nullable date edit field into a Patch.
pub(crate) fn date_patch(
    field: &str,
    value: Option<Option<String>>,
) -> Result<Patch<String>, OmniFocusError> {
    Ok(match Patch::from_double_option(value) {
        Patch::Set(v) => Patch::Set(validate_date(field, &v)?),
        Patch::Clear => Patch::Clear,
        Patch::Keep => Patch::Keep,
    })
}

/// A move destination before resolution. Exactly one of the three forms
/// must be supplied; zero or multiple are validation errors, checked
/// before anything is looked up.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum MoveTarget {
    ById(String),
    ByName(String),
    Top,
}

pub(crate) fn move_destination(
    id: Option<String>,
    name: Option<String>,
    top: bool,
) -> Result<MoveTarget, OmniFocusError> {
    let id = id.map(|s| s.trim().to_string()).filter(|s| !s.is_empty());
    let name = name.map(|s| s.trim().to_string()).filter(|s| !s.is_empty());
    let supplied = usize::from(id.is_some()) + usize::from(name.is_some()) + usize::from(top);
    match supplied {
        0 => Err(OmniFocusError::Validation(
            "no destination specified".to_string(),
        )),
        1 => Ok(if let Some(id) = id {
            MoveTarget::ById(id)
        } else if let Some(name) = name {
            MoveTarget::ByName(name)
        } else {
            MoveTarget::Top
        }),
        _ => Err(OmniFocusError::Validation(
            "multiple destinations specified".to_string(),
        )),
    }
}

/// Parse a placement request. `relativeTo` is required for before/after
/// and ignored for beginning/ending; the sibling is resolved within
/// `domain` so the store receives a concrete id.
pub(crate) async fn resolve_placement(
    store: &dyn EntityStore,
    domain: crate::model::Domain,
    position: Option<String>,
    relative_to_id: Option<String>,
    relative_to_name: Option<String>,
) -> Result<Placement, OmniFocusError> {
    let position = position
        .map(|s| s.trim().to_lowercase())
        .filter(|s| !s.is_empty());
    match position.as_deref() {
        None | Some("ending") => Ok(Placement::Ending),
        Some("beginning") => Ok(Placement::Beginning),
        Some(p @ ("before" | "after")) => {
            let sibling = EntityRef::new(relative_to_id, relative_to_name);
            if sibling.is_empty() {
                return Err(OmniFocusError::Validation(format!(
                    "relativeTo is required for '{}' placement",
                    p
                )));
            }
            let entity = resolve_required(store, domain, &sibling, None).await?;
            let id = entity.id().to_string();
            Ok(if p == "before" {
                Placement::Before(id)
            } else {
                Placement::After(id)
            })
        }
        Some(other) => Err(OmniFocusError::Validation(format!(
            "Unknown position '{}' (expected beginning, ending, before, or after)",
            other
        ))),
    }
}

pub(crate) fn parse_folder_status(value: &str) -> Result<FolderStatus, OmniFocusError> {
    match value.trim().to_lowercase().as_str() {
        "active" => Ok(FolderStatus::Active),
        "dropped" => Ok(FolderStatus::Dropped),
        other => Err(OmniFocusError::Validation(format!(
            "Unknown folder status '{}' (expected active or dropped)",
            other
        ))),
    }
}

pub(crate) fn parse_project_status(value: &str) -> Result<ProjectStatus, OmniFocusError> {
    match value.trim().to_lowercase().as_str() {
        "active" => Ok(ProjectStatus::Active),
        "onhold" | "on-hold" | "on hold" => Ok(ProjectStatus::OnHold),
        "done" | "completed" => Ok(ProjectStatus::Done),
        "dropped" => Ok(ProjectStatus::Dropped),
        other => Err(OmniFocusError::Validation(format!(
            "Unknown project status '{}' (expected active, onHold, done, or dropped)",
            other
        ))),
    }
}

pub(crate) fn parse_tag_status(value: &str) -> Result<TagStatus, OmniFocusError> {
    match value.trim().to_lowercase().as_str() {
        "active" => Ok(TagStatus::Active),
        "onhold" | "on-hold" | "on hold" => Ok(TagStatus::OnHold),
        "dropped" => Ok(TagStatus::Dropped),
        other => Err(OmniFocusError::Validation(format!(
            "Unknown tag status '{}' (expected active, onHold, or dropped)",
            other
        ))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn move_destination_requires_exactly_one() {
        assert!(matches!(
            move_destination(None, None, false),
            Err(OmniFocusError::Validation(msg)) if msg == "no destination specified"
        ));
        assert!(matches!(
            move_destination(Some("f1".into()), Some("Work".into()), false),
            Err(OmniFocusError::Validation(msg)) if msg == "multiple destinations specified"
        ));
        assert!(matches!(
            move_destination(Some("f1".into()), None, true),
            Err(OmniFocusError::Validation(msg)) if msg == "multiple destinations specified"
        ));
        assert_eq!(
            move_destination(Some("f1".into()), None, false).unwrap(),
            MoveTarget::ById("f1".into())
        );
        assert_eq!(move_destination(None, None, true).unwrap(), MoveTarget::Top);
    }

    #[test]
    fn move_destination_ignores_blank_strings() {
        assert_eq!(
            move_destination(Some("  ".into()), None, true).unwrap(),
            MoveTarget::Top
        );
    }

    #[test]
    fn date_validation_accepts_iso_forms() {
        assert!(validate_date("dueDate", "2026-01-15").is_ok());
        assert!(validate_date("dueDate", "2026-01-15T17:00:00").is_ok());
        assert!(validate_date("dueDate", "2026-01-15T17:00:00+02:00").is_ok());
        assert!(validate_date("dueDate", "next tuesday").is_err());
        assert!(validate_date("dueDate", "").is_err());
    }

    #[test]
    fn require_name_trims() {
        assert_eq!(require_name("Folder name", Some("  Work  ".into())).unwrap(), "Work");
        assert!(require_name("Folder name", Some("   ".into())).is_err());
        assert!(require_name("Folder name", None).is_err());
    }
}
