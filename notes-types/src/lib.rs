//! Shared JSON types for the notes service and its HTTP clients.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

pub const MISSING_FIELDS_MESSAGE: &str = "Title and content are required";
pub const NOT_FOUND_MESSAGE: &str = "Note not found";
pub const DELETED_MESSAGE: &str = "Note deleted";

// =====================================================
// Entity
// =====================================================

/// A stored note. `id` is assigned by the store; timestamps are UTC.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Note {
    pub id: i64,
    pub title: String,
    pub content: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Validated input for creating a note
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewNote {
    pub title: String,
    pub content: String,
}

// =====================================================
// Request Types
// =====================================================

/// Body of `POST /api/notes`. Both fields are required; they are optional here
/// so a missing field surfaces as a validation error rather than a decode error.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CreateNoteRequest {
    pub title: Option<String>,
    pub content: Option<String>,
}

impl CreateNoteRequest {
    pub fn validate(self) -> Result<NewNote, String> {
        match (self.title, self.content) {
            (Some(title), Some(content))
                if !title.trim().is_empty() && !content.trim().is_empty() =>
            {
                Ok(NewNote { title, content })
            }
            _ => Err(MISSING_FIELDS_MESSAGE.to_string()),
        }
    }
}

/// Body of `PUT /api/notes/{id}`. Unset fields keep their stored value.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct UpdateNoteRequest {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub content: Option<String>,
}

impl UpdateNoteRequest {
    pub fn is_empty(&self) -> bool {
        self.title.is_none() && self.content.is_none()
    }

    /// Supplied fields must not be blank
    pub fn validate(&self) -> Result<(), String> {
        if self.title.as_deref().is_some_and(|t| t.trim().is_empty()) {
            return Err("Title cannot be empty".to_string());
        }
        if self.content.as_deref().is_some_and(|c| c.trim().is_empty()) {
            return Err("Content cannot be empty".to_string());
        }
        Ok(())
    }
}

/// Query string of `GET /api/notes/search`
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SearchQuery {
    pub q: Option<String>,
}

// =====================================================
// Response Types
// =====================================================

/// Returned by create and update
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NoteResponse {
    pub success: bool,
    pub note: Note,
}

impl NoteResponse {
    pub fn ok(note: Note) -> Self {
        Self { success: true, note }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DeleteResponse {
    pub success: bool,
    pub message: String,
}

impl DeleteResponse {
    pub fn ok() -> Self {
        Self {
            success: true,
            message: DELETED_MESSAGE.to_string(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub error: String,
}

impl ErrorResponse {
    pub fn new(msg: impl Into<String>) -> Self {
        Self { error: msg.into() }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use serde_json::json;

    #[test]
    fn test_note_field_names() {
        let ts = Utc.with_ymd_and_hms(2024, 3, 1, 12, 30, 0).unwrap();
        let note = Note {
            id: 7,
            title: "Groceries".to_string(),
            content: "eggs".to_string(),
            created_at: ts,
            updated_at: ts,
        };

        let value = serde_json::to_value(&note).unwrap();
        let obj = value.as_object().unwrap();
        let mut keys: Vec<&str> = obj.keys().map(|k| k.as_str()).collect();
        keys.sort();
        assert_eq!(keys, vec!["content", "created_at", "id", "title", "updated_at"]);
        assert_eq!(obj["created_at"], json!("2024-03-01T12:30:00Z"));
    }

    #[test]
    fn test_create_request_requires_both_fields() {
        let missing_content: CreateNoteRequest =
            serde_json::from_value(json!({ "title": "A" })).unwrap();
        assert_eq!(missing_content.validate().unwrap_err(), MISSING_FIELDS_MESSAGE);

        let missing_title: CreateNoteRequest =
            serde_json::from_value(json!({ "content": "B" })).unwrap();
        assert!(missing_title.validate().is_err());

        let blank: CreateNoteRequest =
            serde_json::from_value(json!({ "title": "  ", "content": "B" })).unwrap();
        assert!(blank.validate().is_err());

        let ok: CreateNoteRequest =
            serde_json::from_value(json!({ "title": "A", "content": "B" })).unwrap();
        assert_eq!(
            ok.validate().unwrap(),
            NewNote {
                title: "A".to_string(),
                content: "B".to_string()
            }
        );
    }

    #[test]
    fn test_update_request_partial() {
        let empty: UpdateNoteRequest = serde_json::from_value(json!({})).unwrap();
        assert!(empty.is_empty());
        assert!(empty.validate().is_ok());

        let title_only: UpdateNoteRequest =
            serde_json::from_value(json!({ "title": "New" })).unwrap();
        assert!(!title_only.is_empty());
        assert_eq!(title_only.content, None);

        let blank_content: UpdateNoteRequest =
            serde_json::from_value(json!({ "content": "" })).unwrap();
        assert_eq!(blank_content.validate().unwrap_err(), "Content cannot be empty");
    }

    #[test]
    fn test_delete_response_shape() {
        let value = serde_json::to_value(DeleteResponse::ok()).unwrap();
        assert_eq!(value, json!({ "success": true, "message": "Note deleted" }));
    }
}
