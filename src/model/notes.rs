use crate::model::{fresh_id, StoreError};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

pub type NoteId = String;

pub const UNTITLED: &str = "Untitled Note";

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq)]
pub struct Note {
    pub id: NoteId,
    pub title: String,
    #[serde(default)]
    pub content: String,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq, Default)]
pub struct Notes {
    #[serde(default)]
    pub notes: Vec<Note>,
    #[serde(default)]
    pub active_note_id: Option<NoteId>,
}

impl Notes {
    pub fn get(&self, id: &str) -> Option<&Note> {
        self.notes.iter().find(|n| n.id == id)
    }

    pub fn active(&self) -> Option<&Note> {
        self.active_note_id.as_deref().and_then(|id| self.get(id))
    }

    /// Creates an empty note at the top of the list and makes it active.
    pub fn add_note(&mut self) -> NoteId {
        let id = fresh_id("note-", |candidate| self.get(candidate).is_some());
        self.notes.insert(
            0,
            Note {
                id: id.clone(),
                title: UNTITLED.into(),
                content: String::new(),
                updated_at: Utc::now(),
            },
        );
        self.active_note_id = Some(id.clone());
        id
    }

    pub fn delete_note(&mut self, id: &str) -> Result<(), StoreError> {
        let before = self.notes.len();
        self.notes.retain(|n| n.id != id);
        if self.notes.len() == before {
            return Err(StoreError::NoteNotFound(id.to_string()));
        }
        if self.active_note_id.as_deref() == Some(id) {
            self.active_note_id = self.notes.first().map(|n| n.id.clone());
        }
        Ok(())
    }

    pub fn update_note<F>(&mut self, id: &str, f: F) -> Result<(), StoreError>
    where
        F: FnOnce(&mut Note),
    {
        let note = self
            .notes
            .iter_mut()
            .find(|n| n.id == id)
            .ok_or_else(|| StoreError::NoteNotFound(id.to_string()))?;
        f(note);
        note.id = id.to_string();
        note.updated_at = Utc::now();
        Ok(())
    }

    pub fn set_active(&mut self, id: Option<&str>) -> Result<(), StoreError> {
        if let Some(id) = id {
            if self.get(id).is_none() {
                return Err(StoreError::NoteNotFound(id.to_string()));
            }
        }
        self.active_note_id = id.map(str::to_string);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_add_note_goes_first_and_active() {
        let mut notes = Notes::default();
        let first = notes.add_note();
        let second = notes.add_note();
        assert_eq!(notes.notes[0].id, second);
        assert_eq!(notes.notes[1].id, first);
        assert_eq!(notes.active().map(|n| n.id.clone()), Some(second));
        assert_eq!(notes.notes[0].title, UNTITLED);
    }

    #[test]
    fn test_delete_active_falls_back_to_first() {
        let mut notes = Notes::default();
        let a = notes.add_note();
        let b = notes.add_note();
        let c = notes.add_note();
        notes.set_active(Some(&b)).unwrap();
        notes.delete_note(&c).unwrap();
        assert_eq!(notes.active_note_id.as_deref(), Some(b.as_str()));
        notes.delete_note(&b).unwrap();
        assert_eq!(notes.active_note_id.as_deref(), Some(a.as_str()));
        notes.delete_note(&a).unwrap();
        assert!(notes.active().is_none());
    }

    #[test]
    fn test_update_bumps_timestamp() {
        let mut notes = Notes::default();
        let id = notes.add_note();
        let before = notes.get(&id).unwrap().updated_at;
        notes
            .update_note(&id, |n| {
                n.title = "Groceries".into();
                n.content = "milk".into();
            })
            .unwrap();
        let note = notes.get(&id).unwrap();
        assert_eq!(note.title, "Groceries");
        assert!(note.updated_at >= before);
        assert_eq!(
            notes.set_active(Some("note-missing")),
            Err(StoreError::NoteNotFound("note-missing".into()))
        );
    }
}
