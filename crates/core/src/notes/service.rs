//! Cache action layer for groups and notes.
//!
//! Every operation follows the same confirm-then-apply shape: validate
//! input, perform the remote call(s), dispatch into the cache on success,
//! and report failure through the notifier without touching the cache.
//! The boolean-returning operations never propagate errors to the caller.

use std::sync::Arc;

use chrono::Utc;
use futures::future::try_join_all;
use log::{debug, warn};
use tokio::sync::Mutex;

use crate::errors::{Result, StoreError};
use crate::network::NetworkProbe;
use crate::notes::{
    reduce, Action, CacheState, Group, Note, NotePatch, GROUP_PAGE_SIZE, NOTE_PAGE_SIZE,
};
use crate::notify::{NoticeKind, Notifier};
use crate::store::{
    Cursor, DocumentStore, FieldValue, Query, GROUPS_COLLECTION, NOTES_COLLECTION,
};

/// Confirmed edits for an existing note, as entered by the user.
#[derive(Debug, Clone, PartialEq)]
pub struct NoteUpdate {
    pub name: String,
    pub content: String,
    pub image_url: Option<String>,
}

/// Async operations binding the cache to the remote store.
pub struct NoteService {
    store: Arc<dyn DocumentStore>,
    probe: Arc<dyn NetworkProbe>,
    notifier: Arc<dyn Notifier>,
    cache: Mutex<CacheState>,
}

impl NoteService {
    pub fn new(
        store: Arc<dyn DocumentStore>,
        probe: Arc<dyn NetworkProbe>,
        notifier: Arc<dyn Notifier>,
    ) -> Self {
        Self {
            store,
            probe,
            notifier,
            cache: Mutex::new(CacheState::default()),
        }
    }

    /// Current cache state, cloned for the UI to render from.
    pub async fn snapshot(&self) -> CacheState {
        self.cache.lock().await.clone()
    }

    async fn dispatch(&self, action: Action) {
        let mut cache = self.cache.lock().await;
        *cache = reduce(&cache, action);
    }

    async fn check_stability(&self) -> Result<()> {
        if self.probe.is_stable().await {
            Ok(())
        } else {
            Err(StoreError::connectivity("no stable internet connection"))
        }
    }

    /// Map a failure onto the user notification channel.
    fn report(&self, context: &str, err: &StoreError) {
        warn!("failed to {context}: {err}");
        match err {
            StoreError::Validation(rules) => {
                self.notifier
                    .notify(NoticeKind::Error, "Validation error", Some(&rules.join(", ")));
            }
            StoreError::DuplicateName(_) => {
                self.notifier
                    .notify(NoticeKind::Error, "Group name already exists", None);
            }
            StoreError::Connectivity(_) => {
                self.notifier.notify(
                    NoticeKind::Error,
                    "Network error",
                    Some("Please check your internet connection."),
                );
            }
            StoreError::Auth(_) => {
                self.notifier.notify(
                    NoticeKind::Error,
                    "Session expired",
                    Some("Please sign in again."),
                );
            }
            StoreError::Api { message, .. } => {
                self.notifier.notify(
                    NoticeKind::Error,
                    &format!("Failed to {context}"),
                    Some(message),
                );
            }
            StoreError::Unexpected(message) => {
                self.notifier
                    .notify(NoticeKind::Error, "Unexpected error", Some(message));
            }
        }
    }

    fn success(&self, title: &str) {
        self.notifier.notify(NoticeKind::Success, title, None);
    }

    // ─────────────────────────────────────────────────────────────────────
    // Groups
    // ─────────────────────────────────────────────────────────────────────

    /// Fetch the groups list. `reset` discards the cursor and reloads page
    /// one (toggling the loading flag); otherwise appends after the stored
    /// cursor and is a no-op when no cursor exists yet.
    pub async fn fetch_groups(&self, owner_id: &str, reset: bool) {
        let cursor = self.cache.lock().await.groups.cursor.clone();
        if !reset && cursor.is_none() {
            return;
        }

        if reset {
            self.dispatch(Action::SetLoadingGroups(true)).await;
        }
        if let Err(err) = self.try_fetch_groups(owner_id, reset, cursor).await {
            self.report("fetch groups", &err);
        }
        if reset {
            self.dispatch(Action::SetLoadingGroups(false)).await;
        }
    }

    async fn try_fetch_groups(
        &self,
        owner_id: &str,
        reset: bool,
        cursor: Option<Cursor>,
    ) -> Result<()> {
        self.check_stability().await?;

        let mut query = Query::new()
            .filter("userID", FieldValue::str(owner_id))
            .order_desc("updateAt")
            .limit(GROUP_PAGE_SIZE);
        if !reset {
            if let Some(cursor) = cursor {
                query = query.start_after(cursor);
            }
        }

        let page = self.store.query(GROUPS_COLLECTION, query).await?;
        // More may exist exactly when the page came back full.
        let has_more = page.documents.len() == GROUP_PAGE_SIZE as usize;
        let groups: Vec<Group> = page.documents.iter().map(Group::from_document).collect();
        debug!("fetched {} groups (reset={reset})", groups.len());

        let action = if reset {
            Action::SetGroups {
                groups,
                cursor: page.next_cursor,
                has_more,
            }
        } else {
            Action::AppendGroups {
                groups,
                cursor: page.next_cursor,
                has_more,
            }
        };
        self.dispatch(action).await;
        Ok(())
    }

    /// Fetch the next page of groups, if the last page indicated more.
    pub async fn load_more_groups(&self, owner_id: &str) {
        if !self.cache.lock().await.groups.has_more {
            return;
        }
        self.fetch_groups(owner_id, false).await;
    }

    pub async fn add_group(&self, owner_id: &str, name: &str) -> bool {
        match self.try_add_group(owner_id, name).await {
            Ok(()) => {
                self.success("Group added");
                true
            }
            Err(err) => {
                self.report("add group", &err);
                false
            }
        }
    }

    async fn try_add_group(&self, owner_id: &str, name: &str) -> Result<()> {
        let trimmed = name.trim();
        if trimmed.is_empty() {
            return Err(StoreError::Validation(vec![
                "name cannot be empty".to_string()
            ]));
        }
        if self.group_name_taken(owner_id, trimmed, None).await? {
            return Err(StoreError::DuplicateName(trimmed.to_string()));
        }

        let now = Utc::now();
        let id = self
            .store
            .create(GROUPS_COLLECTION, Group::create_fields(trimmed, owner_id, now))
            .await?;
        self.dispatch(Action::AddGroup(Group {
            id,
            name: trimmed.to_string(),
            update_at: Some(now),
        }))
        .await;
        Ok(())
    }

    pub async fn rename_group(&self, group_id: &str, new_name: &str, owner_id: &str) -> bool {
        match self.try_rename_group(group_id, new_name, owner_id).await {
            Ok(()) => {
                self.success("Group renamed");
                true
            }
            Err(err) => {
                self.report("rename group", &err);
                false
            }
        }
    }

    async fn try_rename_group(&self, group_id: &str, new_name: &str, owner_id: &str) -> Result<()> {
        let trimmed = new_name.trim();
        if trimmed.is_empty() {
            return Err(StoreError::Validation(vec![
                "name cannot be empty".to_string()
            ]));
        }
        if self
            .group_name_taken(owner_id, trimmed, Some(group_id))
            .await?
        {
            return Err(StoreError::DuplicateName(trimmed.to_string()));
        }

        let fields = crate::store::Fields::from([
            ("name".to_string(), FieldValue::str(trimmed)),
            ("updateAt".to_string(), FieldValue::Timestamp(Utc::now())),
        ]);
        self.store
            .patch(GROUPS_COLLECTION, group_id, fields, &["name", "updateAt"])
            .await?;
        self.dispatch(Action::RenameGroup {
            group_id: group_id.to_string(),
            new_name: trimmed.to_string(),
        })
        .await;
        Ok(())
    }

    /// Best-effort duplicate guard: an equality query for name + owner.
    /// Two concurrent creates can still race past it; real uniqueness
    /// would need a server-side index.
    async fn group_name_taken(
        &self,
        owner_id: &str,
        name: &str,
        exclude_id: Option<&str>,
    ) -> Result<bool> {
        let page = self
            .store
            .query(
                GROUPS_COLLECTION,
                Query::new()
                    .filter("name", FieldValue::str(name))
                    .filter("userID", FieldValue::str(owner_id)),
            )
            .await?;
        Ok(page
            .documents
            .iter()
            .any(|doc| exclude_id != Some(doc.id.as_str())))
    }

    /// Delete a group and every note inside it. Note deletes run in
    /// parallel; any failure aborts before the group document is touched,
    /// so the group never disappears while notes remain.
    pub async fn delete_group(&self, group_id: &str, owner_id: &str) -> bool {
        match self.try_delete_group(group_id, owner_id).await {
            Ok(()) => {
                self.success("Group and notes deleted");
                true
            }
            Err(err) => {
                self.report("delete group", &err);
                false
            }
        }
    }

    async fn try_delete_group(&self, group_id: &str, owner_id: &str) -> Result<()> {
        debug!("deleting group {group_id} for owner {owner_id}");
        let children = self
            .store
            .query(
                NOTES_COLLECTION,
                Query::new().filter("groupId", FieldValue::str(group_id)),
            )
            .await?;

        try_join_all(
            children
                .documents
                .iter()
                .map(|doc| self.store.delete(NOTES_COLLECTION, &doc.id)),
        )
        .await?;

        self.store.delete(GROUPS_COLLECTION, group_id).await?;
        self.dispatch(Action::DeleteGroup {
            group_id: group_id.to_string(),
        })
        .await;
        Ok(())
    }

    /// Wipe the groups list on sign-out.
    pub async fn clear_groups(&self) {
        self.dispatch(Action::ClearGroups).await;
    }

    // ─────────────────────────────────────────────────────────────────────
    // Notes
    // ─────────────────────────────────────────────────────────────────────

    /// Fetch a group's notes. Same reset/append contract as
    /// [`Self::fetch_groups`], scoped by group id.
    pub async fn fetch_notes(&self, group_id: &str, reset: bool) {
        let cursor = self
            .cache
            .lock()
            .await
            .notes_by_group
            .get(group_id)
            .and_then(|entry| entry.cursor.clone());
        if !reset && cursor.is_none() {
            return;
        }

        if reset {
            self.dispatch(Action::SetLoadingNotes(true)).await;
        }
        if let Err(err) = self.try_fetch_notes(group_id, reset, cursor).await {
            self.report("fetch notes", &err);
        }
        if reset {
            self.dispatch(Action::SetLoadingNotes(false)).await;
        }
    }

    async fn try_fetch_notes(
        &self,
        group_id: &str,
        reset: bool,
        cursor: Option<Cursor>,
    ) -> Result<()> {
        self.check_stability().await?;

        let mut query = Query::new()
            .filter("groupId", FieldValue::str(group_id))
            .order_desc("pinned")
            .order_desc("updateAt")
            .limit(NOTE_PAGE_SIZE);
        if !reset {
            if let Some(cursor) = cursor {
                query = query.start_after(cursor);
            }
        }

        let page = self.store.query(NOTES_COLLECTION, query).await?;
        let has_more = page.documents.len() == NOTE_PAGE_SIZE as usize;
        let notes: Vec<Note> = page.documents.iter().map(Note::from_document).collect();
        debug!("fetched {} notes for group {group_id} (reset={reset})", notes.len());

        let action = if reset {
            Action::SetNotes {
                group_id: group_id.to_string(),
                notes,
                cursor: page.next_cursor,
                has_more,
            }
        } else {
            Action::AppendNotes {
                group_id: group_id.to_string(),
                notes,
                cursor: page.next_cursor,
                has_more,
            }
        };
        self.dispatch(action).await;
        Ok(())
    }

    /// Fetch the next page of a group's notes. No-op without a cursor.
    pub async fn load_more_notes(&self, group_id: &str) {
        self.fetch_notes(group_id, false).await;
    }

    pub async fn add_note(
        &self,
        group_id: &str,
        title: &str,
        content: &str,
        image_url: Option<&str>,
    ) -> bool {
        match self.try_add_note(group_id, title, content, image_url).await {
            Ok(()) => {
                self.success("Note added");
                true
            }
            Err(err) => {
                self.report("add note", &err);
                false
            }
        }
    }

    async fn try_add_note(
        &self,
        group_id: &str,
        title: &str,
        content: &str,
        image_url: Option<&str>,
    ) -> Result<()> {
        let title = title.trim();
        let content = content.trim();
        let mut violations = Vec::new();
        if title.is_empty() {
            violations.push("title cannot be empty".to_string());
        }
        if content.is_empty() {
            violations.push("content cannot be empty".to_string());
        }
        if !violations.is_empty() {
            return Err(StoreError::Validation(violations));
        }

        let now = Utc::now();
        let id = self
            .store
            .create(
                NOTES_COLLECTION,
                Note::create_fields(group_id, title, content, image_url, now),
            )
            .await?;
        self.dispatch(Action::AddNote {
            group_id: group_id.to_string(),
            note: Note {
                id,
                group_id: group_id.to_string(),
                name: title.to_string(),
                content: content.to_string(),
                image_url: image_url.map(str::to_string),
                pinned: false,
                locked: false,
                create_at: now,
                update_at: now,
            },
        })
        .await;
        Ok(())
    }

    pub async fn update_note(&self, note_id: &str, group_id: &str, update: NoteUpdate) -> bool {
        match self.try_update_note(note_id, group_id, update).await {
            Ok(()) => {
                self.success("Note updated");
                true
            }
            Err(err) => {
                self.report("update note", &err);
                false
            }
        }
    }

    async fn try_update_note(
        &self,
        note_id: &str,
        group_id: &str,
        update: NoteUpdate,
    ) -> Result<()> {
        let now = Utc::now();
        let fields = crate::store::Fields::from([
            ("name".to_string(), FieldValue::str(&update.name)),
            ("content".to_string(), FieldValue::str(&update.content)),
            (
                "imageUrl".to_string(),
                update
                    .image_url
                    .as_deref()
                    .map_or(FieldValue::Null, FieldValue::str),
            ),
            ("updateAt".to_string(), FieldValue::Timestamp(now)),
        ]);
        self.store
            .patch(
                NOTES_COLLECTION,
                note_id,
                fields,
                &["name", "content", "imageUrl", "updateAt"],
            )
            .await?;
        self.dispatch(Action::UpdateNote {
            group_id: group_id.to_string(),
            note_id: note_id.to_string(),
            patch: NotePatch {
                name: update.name,
                content: update.content,
                image_url: update.image_url,
                update_at: now,
            },
        })
        .await;
        Ok(())
    }

    pub async fn delete_note(&self, note_id: &str, group_id: &str) -> bool {
        match self.store.delete(NOTES_COLLECTION, note_id).await {
            Ok(()) => {
                self.dispatch(Action::DeleteNote {
                    group_id: group_id.to_string(),
                    note_id: note_id.to_string(),
                })
                .await;
                self.success("Note deleted");
                true
            }
            Err(err) => {
                self.report("delete note", &err);
                false
            }
        }
    }

    /// Atomically reassign a note to another group. The cache only drops
    /// the note from the source list; the destination shows it after its
    /// next fetch.
    pub async fn move_note(&self, note_id: &str, from_group_id: &str, to_group_id: &str) -> bool {
        let fields = crate::store::Fields::from([
            ("groupId".to_string(), FieldValue::str(to_group_id)),
            ("updateAt".to_string(), FieldValue::Timestamp(Utc::now())),
        ]);
        match self
            .store
            .patch(NOTES_COLLECTION, note_id, fields, &["groupId", "updateAt"])
            .await
        {
            Ok(()) => {
                self.dispatch(Action::MoveNote {
                    note_id: note_id.to_string(),
                    from_group_id: from_group_id.to_string(),
                    to_group_id: to_group_id.to_string(),
                })
                .await;
                self.success("Note moved");
                true
            }
            Err(err) => {
                self.report("move note", &err);
                false
            }
        }
    }

    /// Persist and apply the complement of the caller-supplied pin state.
    /// The caller must pass the note's accurate current value.
    pub async fn toggle_pin_note(
        &self,
        note_id: &str,
        group_id: &str,
        current_pinned: bool,
    ) -> bool {
        let pinned = !current_pinned;
        let now = Utc::now();
        let fields = crate::store::Fields::from([
            ("pinned".to_string(), FieldValue::Bool(pinned)),
            ("updateAt".to_string(), FieldValue::Timestamp(now)),
        ]);
        match self
            .store
            .patch(NOTES_COLLECTION, note_id, fields, &["pinned", "updateAt"])
            .await
        {
            Ok(()) => {
                self.dispatch(Action::UpdatePin {
                    group_id: group_id.to_string(),
                    note_id: note_id.to_string(),
                    pinned,
                    update_at: now,
                })
                .await;
                self.success(if pinned { "Note pinned" } else { "Note unpinned" });
                true
            }
            Err(err) => {
                self.report("toggle pin note", &err);
                false
            }
        }
    }

    /// Persist and apply the complement of the caller-supplied lock state.
    pub async fn toggle_lock_note(
        &self,
        note_id: &str,
        group_id: &str,
        current_locked: bool,
    ) -> bool {
        let locked = !current_locked;
        let now = Utc::now();
        let fields = crate::store::Fields::from([
            ("locked".to_string(), FieldValue::Bool(locked)),
            ("updateAt".to_string(), FieldValue::Timestamp(now)),
        ]);
        match self
            .store
            .patch(NOTES_COLLECTION, note_id, fields, &["locked", "updateAt"])
            .await
        {
            Ok(()) => {
                self.dispatch(Action::UpdateLock {
                    group_id: group_id.to_string(),
                    note_id: note_id.to_string(),
                    locked,
                    update_at: now,
                })
                .await;
                self.success(if locked { "Note locked" } else { "Note unlocked" });
                true
            }
            Err(err) => {
                self.report("toggle lock note", &err);
                false
            }
        }
    }
}
