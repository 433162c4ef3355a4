// src/resolver.rs
// Id-or-name entity resolution. An explicit id always wins and skips name
// matching entirely. Name lookups are exact and case-sensitive against a
// fresh snapshot; two or more matches surface every candidate id so the
// caller can retry with one of them.

use crate::error::OmniFocusError;
use crate::model::{Domain, Entity, EntityRef, Scope};
use crate::store::EntityStore;

/// Outcome of a lookup before it is mapped onto an error policy.
#[derive(Debug, Clone)]
pub enum Resolution {
    One(Entity),
    NotFound,
    /// Every id whose name matched, in snapshot order. Always 2+.
    Ambiguous(Vec<String>),
}

/// Pure matching step, split out so it can be tested without a store.
/// Both branches honor the scope; an id match outside the scope is
/// NotFound, never a fallback to the name.
pub fn resolve_in(entities: &[Entity], reference: &EntityRef, scope: Option<&Scope>) -> Resolution {
    let in_scope = |e: &Entity| match scope {
        Some(s) => e.belongs_to(&s.parent_id),
        None => true,
    };
    if let Some(id) = &reference.id {
        return match entities.iter().filter(|e| in_scope(e)).find(|e| e.id() == id) {
            Some(e) => Resolution::One(e.clone()),
            None => Resolution::NotFound,
        };
    }
    let Some(name) = &reference.name else {
        return Resolution::NotFound;
    };
    let matches: Vec<&Entity> = entities
        .iter()
        .filter(|e| e.name() == name)
        .filter(|e| in_scope(e))
        .collect();
    match matches.len() {
        0 => Resolution::NotFound,
        1 => Resolution::One(matches[0].clone()),
        _ => Resolution::Ambiguous(matches.iter().map(|e| e.id().to_string()).collect()),
    }
}

/// Resolve against the store's current snapshot.
pub async fn resolve(
    store: &dyn EntityStore,
    domain: Domain,
    reference: &EntityRef,
    scope: Option<&Scope>,
) -> Result<Resolution, OmniFocusError> {
    if reference.is_empty() {
        return Err(OmniFocusError::Validation(format!(
            "Either an id or a name is required to identify a {}",
            domain.entity_label().to_lowercase()
        )));
    }
    let entities = store.query(domain).await?;
    Ok(resolve_in(&entities, reference, scope))
}

/// Resolve and require exactly one entity. NotFound and Ambiguous map onto
/// the standard error taxonomy; ambiguity carries the full candidate list.
pub async fn resolve_required(
    store: &dyn EntityStore,
    domain: Domain,
    reference: &EntityRef,
    scope: Option<&Scope>,
) -> Result<Entity, OmniFocusError> {
    match resolve(store, domain, reference, scope).await? {
        Resolution::One(entity) => Ok(entity),
        Resolution::NotFound => Err(OmniFocusError::NotFound {
            entity: domain.entity_label(),
            identifier: reference.describe(),
        }),
        Resolution::Ambiguous(matching_ids) => Err(OmniFocusError::Disambiguation {
            entity: domain.entity_label(),
            name: reference.name.clone().unwrap_or_default(),
            matching_ids,
        }),
    }
}

/// Resolution policy for create-tool container references: ambiguity is a
/// plain validation failure with a hint, never the disambiguation code.
pub async fn resolve_container(
    store: &dyn EntityStore,
    domain: Domain,
    reference: &EntityRef,
) -> Result<Entity, OmniFocusError> {
    match resolve(store, domain, reference, None).await? {
        Resolution::One(entity) => Ok(entity),
        Resolution::NotFound => Err(OmniFocusError::NotFound {
            entity: domain.entity_label(),
            identifier: reference.describe(),
        }),
        Resolution::Ambiguous(ids) => Err(OmniFocusError::Validation(format!(
            "Multiple {}s are named '{}' ({} matches); pass an explicit id instead",
            domain.entity_label().to_lowercase(),
            reference.name.clone().unwrap_or_default(),
            ids.len()
        ))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{Folder, FolderStatus};

    fn folder(id: &str, name: &str, parent: Option<&str>) -> Entity {
        Entity::Folder(Folder {
            id: id.to_string(),
            name: name.to_string(),
            status: FolderStatus::Active,
            parent_id: parent.map(str::to_string),
        })
    }

    #[test]
    fn id_wins_over_name() {
        let entities = vec![folder("f1", "Work", None), folder("f2", "Work", None)];
        let reference = EntityRef::new(Some("f2".into()), Some("Work".into()));
        match resolve_in(&entities, &reference, None) {
            Resolution::One(e) => assert_eq!(e.id(), "f2"),
            other => panic!("expected One, got {:?}", other),
        }
    }

    #[test]
    fn unknown_id_is_not_found_even_with_matching_name() {
        let entities = vec![folder("f1", "Work", None)];
        let reference = EntityRef::new(Some("missing".into()), Some("Work".into()));
        assert!(matches!(
            resolve_in(&entities, &reference, None),
            Resolution::NotFound
        ));
    }

    #[test]
    fn duplicate_names_surface_every_id() {
        let entities = vec![
            folder("f1", "Home", None),
            folder("f2", "Home", None),
            folder("f3", "Home", None),
            folder("f4", "Other", None),
        ];
        match resolve_in(&entities, &EntityRef::by_name("Home"), None) {
            Resolution::Ambiguous(ids) => assert_eq!(ids, vec!["f1", "f2", "f3"]),
            other => panic!("expected Ambiguous, got {:?}", other),
        }
    }

    #[test]
    fn name_match_is_case_sensitive() {
        let entities = vec![folder("f1", "Work", None)];
        assert!(matches!(
            resolve_in(&entities, &EntityRef::by_name("work"), None),
            Resolution::NotFound
        ));
    }

    #[test]
    fn scope_applies_to_id_lookups_too() {
        let entities = vec![folder("f1", "Sub", Some("top-a"))];
        let scope = Scope {
            parent_id: "top-b".to_string(),
        };
        assert!(matches!(
            resolve_in(&entities, &EntityRef::by_id("f1"), Some(&scope)),
            Resolution::NotFound
        ));
        let scope = Scope {
            parent_id: "top-a".to_string(),
        };
        match resolve_in(&entities, &EntityRef::by_id("f1"), Some(&scope)) {
            Resolution::One(e) => assert_eq!(e.id(), "f1"),
            other => panic!("expected One, got {:?}", other),
        }
    }

    #[test]
    fn scope_narrows_duplicates_to_one() {
        let entities = vec![
            folder("f1", "Sub", Some("top-a")),
            folder("f2", "Sub", Some("top-b")),
        ];
        let scope = Scope {
            parent_id: "top-b".to_string(),
        };
        match resolve_in(&entities, &EntityRef::by_name("Sub"), Some(&scope)) {
            Resolution::One(e) => assert_eq!(e.id(), "f2"),
            other => panic!("expected One, got {:?}", other),
        }
    }
}
