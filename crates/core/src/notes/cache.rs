//! Normalized entity cache and its reducer.
//!
//! All UI reads happen against [`CacheState`]; every mutation is produced
//! by [`reduce`] from a typed [`Action`]. The reducer is pure and never
//! panics: actions touching entities that are not in the cache leave the
//! state unchanged.

use std::collections::HashMap;

use chrono::{DateTime, Utc};

use crate::notes::{Group, Note};
use crate::store::Cursor;

/// Page size for note fetches.
pub const NOTE_PAGE_SIZE: u32 = 10;
/// Page size for group fetches.
pub const GROUP_PAGE_SIZE: u32 = 10;

/// One paginated collection: the items fetched so far, the resume cursor
/// of the last page, and the more-may-exist heuristic flag.
#[derive(Debug, Clone, PartialEq)]
pub struct Paginated<T> {
    pub items: Vec<T>,
    pub cursor: Option<Cursor>,
    pub has_more: bool,
}

// Manual impl: deriving would demand `T: Default`, which the entity
// types do not (and should not) provide.
impl<T> Default for Paginated<T> {
    fn default() -> Self {
        Self {
            items: Vec::new(),
            cursor: None,
            has_more: false,
        }
    }
}

impl<T> Paginated<T> {
    fn page(items: Vec<T>, cursor: Option<Cursor>, has_more: bool) -> Self {
        Self {
            items,
            cursor,
            has_more,
        }
    }
}

/// In-memory cache of groups and notes-per-group.
///
/// A `notes_by_group` entry is absent (not empty) until the group's notes
/// have been fetched at least once.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CacheState {
    pub groups: Paginated<Group>,
    pub notes_by_group: HashMap<String, Paginated<Note>>,
    pub loading_groups: bool,
    pub loading_notes: bool,
}

/// Confirmed field changes for an existing note.
#[derive(Debug, Clone, PartialEq)]
pub struct NotePatch {
    pub name: String,
    pub content: String,
    pub image_url: Option<String>,
    pub update_at: DateTime<Utc>,
}

/// Cache mutations. Dispatched only after remote confirmation.
#[derive(Debug, Clone, PartialEq)]
pub enum Action {
    SetLoadingGroups(bool),
    SetLoadingNotes(bool),
    SetGroups {
        groups: Vec<Group>,
        cursor: Option<Cursor>,
        has_more: bool,
    },
    AppendGroups {
        groups: Vec<Group>,
        cursor: Option<Cursor>,
        has_more: bool,
    },
    AddGroup(Group),
    RenameGroup {
        group_id: String,
        new_name: String,
    },
    DeleteGroup {
        group_id: String,
    },
    SetNotes {
        group_id: String,
        notes: Vec<Note>,
        cursor: Option<Cursor>,
        has_more: bool,
    },
    AppendNotes {
        group_id: String,
        notes: Vec<Note>,
        cursor: Option<Cursor>,
        has_more: bool,
    },
    AddNote {
        group_id: String,
        note: Note,
    },
    UpdateNote {
        group_id: String,
        note_id: String,
        patch: NotePatch,
    },
    DeleteNote {
        group_id: String,
        note_id: String,
    },
    /// Removes the note from the source group only. Re-insertion into the
    /// destination is the caller's responsibility (refetch or `AddNote`).
    MoveNote {
        note_id: String,
        from_group_id: String,
        to_group_id: String,
    },
    UpdatePin {
        group_id: String,
        note_id: String,
        pinned: bool,
        update_at: DateTime<Utc>,
    },
    UpdateLock {
        group_id: String,
        note_id: String,
        locked: bool,
        update_at: DateTime<Utc>,
    },
    /// Wipes the groups list (sign-out). Does not clear `notes_by_group`.
    ClearGroups,
}

/// Pure state transition. Exhaustive over [`Action`] so a new variant is
/// a compile error here rather than a silent no-op.
pub fn reduce(state: &CacheState, action: Action) -> CacheState {
    let mut next = state.clone();
    match action {
        Action::SetLoadingGroups(loading) => next.loading_groups = loading,
        Action::SetLoadingNotes(loading) => next.loading_notes = loading,
        Action::SetGroups {
            groups,
            cursor,
            has_more,
        } => next.groups = Paginated::page(groups, cursor, has_more),
        Action::AppendGroups {
            groups,
            cursor,
            has_more,
        } => {
            next.groups.items.extend(groups);
            next.groups.cursor = cursor;
            next.groups.has_more = has_more;
        }
        Action::AddGroup(group) => next.groups.items.insert(0, group),
        Action::RenameGroup { group_id, new_name } => {
            // Rename is an implicit touch: the group moves to the head.
            if let Some(pos) = next.groups.items.iter().position(|g| g.id == group_id) {
                let mut group = next.groups.items.remove(pos);
                group.name = new_name;
                next.groups.items.insert(0, group);
            }
        }
        Action::DeleteGroup { group_id } => {
            next.groups.items.retain(|g| g.id != group_id);
            // Drop the orphaned notes entry so the cache stays bounded.
            next.notes_by_group.remove(&group_id);
        }
        Action::SetNotes {
            group_id,
            notes,
            cursor,
            has_more,
        } => {
            next.notes_by_group
                .insert(group_id, Paginated::page(notes, cursor, has_more));
        }
        Action::AppendNotes {
            group_id,
            notes,
            cursor,
            has_more,
        } => {
            let entry = next.notes_by_group.entry(group_id).or_default();
            entry.items.extend(notes);
            entry.cursor = cursor;
            entry.has_more = has_more;
        }
        Action::AddNote { group_id, note } => {
            next.notes_by_group
                .entry(group_id)
                .or_default()
                .items
                .insert(0, note);
        }
        Action::UpdateNote {
            group_id,
            note_id,
            patch,
        } => {
            if let Some(entry) = next.notes_by_group.get_mut(&group_id) {
                if let Some(pos) = entry.items.iter().position(|n| n.id == note_id) {
                    let mut note = entry.items.remove(pos);
                    note.name = patch.name;
                    note.content = patch.content;
                    note.image_url = patch.image_url;
                    note.update_at = patch.update_at;
                    entry.items.insert(0, note);
                }
            }
        }
        Action::DeleteNote { group_id, note_id } => {
            if let Some(entry) = next.notes_by_group.get_mut(&group_id) {
                entry.items.retain(|n| n.id != note_id);
            }
        }
        Action::MoveNote {
            note_id,
            from_group_id,
            to_group_id: _,
        } => {
            if let Some(entry) = next.notes_by_group.get_mut(&from_group_id) {
                entry.items.retain(|n| n.id != note_id);
            }
        }
        Action::UpdatePin {
            group_id,
            note_id,
            pinned,
            update_at,
        } => {
            if let Some(entry) = next.notes_by_group.get_mut(&group_id) {
                if let Some(pos) = entry.items.iter().position(|n| n.id == note_id) {
                    let mut note = entry.items.remove(pos);
                    note.pinned = pinned;
                    note.update_at = update_at;
                    entry.items.insert(0, note);
                }
            }
        }
        Action::UpdateLock {
            group_id,
            note_id,
            locked,
            update_at,
        } => {
            if let Some(entry) = next.notes_by_group.get_mut(&group_id) {
                if let Some(pos) = entry.items.iter().position(|n| n.id == note_id) {
                    let mut note = entry.items.remove(pos);
                    note.locked = locked;
                    note.update_at = update_at;
                    entry.items.insert(0, note);
                }
            }
        }
        Action::ClearGroups => next.groups = Paginated::default(),
    }
    next
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn ts(secs: i64) -> DateTime<Utc> {
        Utc.timestamp_opt(secs, 0).single().expect("valid ts")
    }

    fn group(id: &str, name: &str) -> Group {
        Group {
            id: id.to_string(),
            name: name.to_string(),
            update_at: Some(ts(1)),
        }
    }

    fn note(id: &str, group_id: &str) -> Note {
        Note {
            id: id.to_string(),
            group_id: group_id.to_string(),
            name: format!("note {id}"),
            content: "body".to_string(),
            image_url: None,
            pinned: false,
            locked: false,
            create_at: ts(1),
            update_at: ts(1),
        }
    }

    #[test]
    fn empty_cache_has_no_pages_and_no_flags() {
        // Entity types carry no Default; the empty cache must still be
        // constructible.
        let state = CacheState::default();
        assert!(state.groups.items.is_empty());
        assert!(state.groups.cursor.is_none());
        assert!(!state.groups.has_more);
        assert!(state.notes_by_group.is_empty());
        assert!(!state.loading_groups && !state.loading_notes);

        let page: Paginated<Note> = Paginated::default();
        assert!(page.items.is_empty());
    }

    fn seeded() -> CacheState {
        let state = reduce(
            &CacheState::default(),
            Action::SetGroups {
                groups: vec![group("g1", "Work"), group("g2", "Personal")],
                cursor: None,
                has_more: false,
            },
        );
        reduce(
            &state,
            Action::SetNotes {
                group_id: "g1".to_string(),
                notes: vec![note("n1", "g1"), note("n2", "g1")],
                cursor: None,
                has_more: false,
            },
        )
    }

    #[test]
    fn reduce_does_not_mutate_input_and_is_deterministic() {
        let state = seeded();
        let before = state.clone();
        let action = Action::RenameGroup {
            group_id: "g2".to_string(),
            new_name: "Home".to_string(),
        };

        let once = reduce(&state, action.clone());
        let twice = reduce(&state, action);

        assert_eq!(state, before);
        assert_eq!(once, twice);
    }

    #[test]
    fn rename_rewrites_name_and_moves_group_to_head() {
        let state = reduce(
            &seeded(),
            Action::RenameGroup {
                group_id: "g2".to_string(),
                new_name: "Home".to_string(),
            },
        );

        assert_eq!(state.groups.items[0].id, "g2");
        assert_eq!(state.groups.items[0].name, "Home");
        assert_eq!(state.groups.items.len(), 2);
    }

    #[test]
    fn update_note_merges_fields_and_moves_note_to_head() {
        let state = reduce(
            &seeded(),
            Action::UpdateNote {
                group_id: "g1".to_string(),
                note_id: "n2".to_string(),
                patch: NotePatch {
                    name: "edited".to_string(),
                    content: "new body".to_string(),
                    image_url: Some("https://img.example/x.jpg".to_string()),
                    update_at: ts(99),
                },
            },
        );

        let notes = &state.notes_by_group["g1"].items;
        assert_eq!(notes[0].id, "n2");
        assert_eq!(notes[0].name, "edited");
        assert_eq!(notes[0].update_at, ts(99));
        assert_eq!(notes.len(), 2);
    }

    #[test]
    fn pin_and_lock_toggles_pair_back_to_original() {
        let state = seeded();
        let original = state.notes_by_group["g1"].items[1].clone();

        let once = reduce(
            &state,
            Action::UpdatePin {
                group_id: "g1".to_string(),
                note_id: original.id.clone(),
                pinned: !original.pinned,
                update_at: ts(10),
            },
        );
        assert_eq!(once.notes_by_group["g1"].items[0].id, original.id);
        assert!(once.notes_by_group["g1"].items[0].pinned);

        let twice = reduce(
            &once,
            Action::UpdatePin {
                group_id: "g1".to_string(),
                note_id: original.id.clone(),
                pinned: original.pinned,
                update_at: ts(11),
            },
        );
        let roundtripped = &twice.notes_by_group["g1"].items[0];
        assert_eq!(roundtripped.pinned, original.pinned);

        let locked = reduce(
            &twice,
            Action::UpdateLock {
                group_id: "g1".to_string(),
                note_id: original.id.clone(),
                locked: true,
                update_at: ts(12),
            },
        );
        let unlocked = reduce(
            &locked,
            Action::UpdateLock {
                group_id: "g1".to_string(),
                note_id: original.id.clone(),
                locked: false,
                update_at: ts(13),
            },
        );
        assert_eq!(
            unlocked.notes_by_group["g1"].items[0].locked,
            original.locked
        );
    }

    #[test]
    fn append_notes_extends_and_replaces_cursor_state() {
        let state = seeded();
        let appended = reduce(
            &state,
            Action::AppendNotes {
                group_id: "g1".to_string(),
                notes: vec![note("n3", "g1")],
                cursor: Some(Cursor::new(serde_json::json!({"after": "n3"}))),
                has_more: true,
            },
        );

        let entry = &appended.notes_by_group["g1"];
        assert_eq!(entry.items.len(), 3);
        assert_eq!(entry.items[2].id, "n3");
        assert!(entry.has_more);
        assert!(entry.cursor.is_some());
    }

    #[test]
    fn delete_group_removes_group_and_its_notes_entry() {
        let state = reduce(
            &seeded(),
            Action::DeleteGroup {
                group_id: "g1".to_string(),
            },
        );

        assert!(state.groups.items.iter().all(|g| g.id != "g1"));
        assert!(!state.notes_by_group.contains_key("g1"));
    }

    #[test]
    fn move_note_removes_from_source_group_only() {
        let state = reduce(
            &seeded(),
            Action::MoveNote {
                note_id: "n1".to_string(),
                from_group_id: "g1".to_string(),
                to_group_id: "g2".to_string(),
            },
        );

        assert!(state.notes_by_group["g1"].items.iter().all(|n| n.id != "n1"));
        // Destination is untouched until the caller refetches it.
        assert!(!state.notes_by_group.contains_key("g2"));
    }

    #[test]
    fn clear_groups_keeps_notes_map() {
        let state = reduce(&seeded(), Action::ClearGroups);
        assert!(state.groups.items.is_empty());
        assert!(state.notes_by_group.contains_key("g1"));
    }

    #[test]
    fn actions_on_unknown_entities_leave_state_unchanged() {
        let state = seeded();
        let after = reduce(
            &state,
            Action::UpdatePin {
                group_id: "g1".to_string(),
                note_id: "missing".to_string(),
                pinned: true,
                update_at: ts(5),
            },
        );
        assert_eq!(after, state);

        let after = reduce(
            &state,
            Action::RenameGroup {
                group_id: "missing".to_string(),
                new_name: "x".to_string(),
            },
        );
        assert_eq!(after, state);
    }
}
