//! Bot API wire types - only the fields the bot reads

use serde::Deserialize;

/// The Bot API envelope around every response
#[derive(Debug, Deserialize)]
pub struct ApiResponse<T> {
    pub ok: bool,
    #[serde(default)]
    pub result: Option<T>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub error_code: Option<i32>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Update {
    pub update_id: i64,
    #[serde(default)]
    pub message: Option<Message>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Message {
    #[serde(default)]
    pub from: Option<Contact>,
    pub chat: Chat,
    #[serde(default)]
    pub text: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Contact {
    pub id: i64,
    #[serde(default)]
    pub username: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Chat {
    pub id: i64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn decodes_a_command_update() {
        let json = r#"{
            "ok": true,
            "result": [{
                "update_id": 612,
                "message": {
                    "message_id": 7,
                    "from": {"id": 42, "is_bot": false, "first_name": "A", "username": "alice"},
                    "chat": {"id": 42, "type": "private"},
                    "date": 1700000000,
                    "text": "/redeem a3f9"
                }
            }]
        }"#;
        let envelope: ApiResponse<Vec<Update>> = serde_json::from_str(json).unwrap();
        assert!(envelope.ok);
        let updates = envelope.result.unwrap();
        assert_eq!(updates.len(), 1);
        let message = updates[0].message.as_ref().unwrap();
        assert_eq!(message.chat.id, 42);
        assert_eq!(message.from.as_ref().unwrap().username.as_deref(), Some("alice"));
        assert_eq!(message.text.as_deref(), Some("/redeem a3f9"));
    }

    #[test]
    fn decodes_an_error_envelope() {
        let json = r#"{"ok": false, "error_code": 403, "description": "Forbidden: bot was blocked by the user"}"#;
        let envelope: ApiResponse<Vec<Update>> = serde_json::from_str(json).unwrap();
        assert!(!envelope.ok);
        assert_eq!(envelope.error_code, Some(403));
        assert!(envelope.result.is_none());
    }

    #[test]
    fn tolerates_non_message_updates() {
        let json = r#"{"update_id": 9, "edited_message": {"message_id": 1}}"#;
        let update: Update = serde_json::from_str(json).unwrap();
        assert!(update.message.is_none());
    }
}
