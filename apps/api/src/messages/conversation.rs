use uuid::Uuid;

use crate::errors::AppError;
use crate::models::message::{
    ConversationActivityRecord, ConversationRecord, ConversationSummary, MessageRow,
    MessageView, Participant,
};
use crate::models::user::UserType;

pub const MAX_MESSAGE_CHARS: usize = 5000;

pub fn student_participant(conv: &ConversationRecord) -> Participant {
    let name = if conv.student_name.trim().is_empty() {
        "Student".to_string()
    } else {
        conv.student_name.clone()
    };
    Participant {
        id: conv.student_id,
        user_id: conv.student_user_id,
        name,
        kind: UserType::Student.as_str(),
        company_name: None,
    }
}

pub fn employer_participant(conv: &ConversationRecord) -> Participant {
    Participant {
        id: conv.employer_id,
        user_id: conv.employer_user_id,
        name: conv.company_name.clone(),
        kind: UserType::Employer.as_str(),
        company_name: Some(conv.company_name.clone()),
    }
}

pub fn is_participant(conv: &ConversationRecord, user_id: Uuid) -> bool {
    conv.student_user_id == user_id || conv.employer_user_id == user_id
}

/// The participant on the other side from `viewer`.
pub fn other_participant(conv: &ConversationRecord, viewer: Uuid) -> Participant {
    if conv.student_user_id == viewer {
        employer_participant(conv)
    } else {
        student_participant(conv)
    }
}

pub fn require_participant(conv: &ConversationRecord, user_id: Uuid) -> Result<(), AppError> {
    if is_participant(conv, user_id) {
        Ok(())
    } else {
        Err(AppError::Forbidden(
            "Not a participant in this conversation".to_string(),
        ))
    }
}

/// Attaches sender and recipient identities to raw message rows.
pub fn thread_view(conv: &ConversationRecord, rows: Vec<MessageRow>) -> Vec<MessageView> {
    let student = student_participant(conv);
    let employer = employer_participant(conv);
    rows.into_iter()
        .map(|row| {
            let (sender, recipient) = if row.sender_user_id == student.user_id {
                (student.clone(), employer.clone())
            } else {
                (employer.clone(), student.clone())
            };
            MessageView {
                id: row.id,
                conversation_id: row.conversation_id,
                subject: conv.subject.clone(),
                message_text: row.message_text,
                is_read: row.is_read,
                created_at: row.created_at,
                sender,
                recipient,
            }
        })
        .collect()
}

pub fn summarize(record: ConversationActivityRecord, viewer: Uuid) -> ConversationSummary {
    let conv = &record.conversation;
    ConversationSummary {
        conversation_id: conv.id,
        subject: conv.subject.clone(),
        other_participant: other_participant(conv, viewer),
        last_message: record.last_message,
        last_message_time: record.last_message_time.unwrap_or(conv.updated_at),
        unread_count: record.unread_count,
        message_count: record.message_count,
    }
}

pub fn default_subject(sender: UserType) -> &'static str {
    match sender {
        UserType::Student => "Message from Student",
        UserType::Employer => "Message from Employer",
    }
}

/// Trims message text and enforces presence and length.
pub fn validate_text(raw: Option<&str>) -> Result<String, AppError> {
    let text = raw.map(str::trim).unwrap_or_default();
    if text.is_empty() {
        return Err(AppError::Validation("Message text is required".to_string()));
    }
    if text.chars().count() > MAX_MESSAGE_CHARS {
        return Err(AppError::Validation(format!(
            "Message text must be at most {MAX_MESSAGE_CHARS} characters"
        )));
    }
    Ok(text.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, Utc};

    fn conversation() -> ConversationRecord {
        ConversationRecord {
            id: Uuid::new_v4(),
            subject: "Internship question".to_string(),
            student_id: Uuid::new_v4(),
            student_user_id: Uuid::new_v4(),
            student_name: "Ada Lovelace".to_string(),
            employer_id: Uuid::new_v4(),
            employer_user_id: Uuid::new_v4(),
            company_name: "Acme".to_string(),
            updated_at: Utc::now() - Duration::days(1),
        }
    }

    fn message(conv: &ConversationRecord, from_student: bool, text: &str) -> MessageRow {
        let (sender, recipient) = if from_student {
            (conv.student_user_id, conv.employer_user_id)
        } else {
            (conv.employer_user_id, conv.student_user_id)
        };
        MessageRow {
            id: Uuid::new_v4(),
            conversation_id: conv.id,
            sender_user_id: sender,
            recipient_user_id: recipient,
            message_text: text.to_string(),
            is_read: false,
            created_at: Utc::now(),
        }
    }

    #[test]
    fn test_thread_view_assigns_sides() {
        let conv = conversation();
        let rows = vec![
            message(&conv, true, "Hello"),
            message(&conv, false, "Hi Ada"),
        ];
        let view = thread_view(&conv, rows);
        assert_eq!(view[0].sender.kind, "student");
        assert_eq!(view[0].recipient.company_name.as_deref(), Some("Acme"));
        assert_eq!(view[1].sender.name, "Acme");
        assert_eq!(view[1].recipient.name, "Ada Lovelace");
        assert!(view.iter().all(|m| m.subject == "Internship question"));
    }

    #[test]
    fn test_other_participant() {
        let conv = conversation();
        assert_eq!(other_participant(&conv, conv.student_user_id).kind, "employer");
        assert_eq!(other_participant(&conv, conv.employer_user_id).kind, "student");
    }

    #[test]
    fn test_outsider_is_forbidden() {
        let conv = conversation();
        assert!(require_participant(&conv, conv.student_user_id).is_ok());
        assert!(matches!(
            require_participant(&conv, Uuid::new_v4()),
            Err(AppError::Forbidden(_))
        ));
    }

    #[test]
    fn test_blank_student_name_falls_back() {
        let mut conv = conversation();
        conv.student_name = "  ".to_string();
        assert_eq!(student_participant(&conv).name, "Student");
    }

    #[test]
    fn test_summary_without_messages_uses_updated_at() {
        let conv = conversation();
        let viewer = conv.employer_user_id;
        let updated_at = conv.updated_at;
        let summary = summarize(
            ConversationActivityRecord {
                conversation: conv,
                last_message: None,
                last_message_time: None,
                unread_count: 0,
                message_count: 0,
            },
            viewer,
        );
        assert_eq!(summary.last_message_time, updated_at);
        assert_eq!(summary.other_participant.name, "Ada Lovelace");
    }

    #[test]
    fn test_validate_text() {
        assert_eq!(validate_text(Some("  hi  ")).unwrap(), "hi");
        assert!(validate_text(Some("   ")).is_err());
        assert!(validate_text(None).is_err());
        let long = "x".repeat(MAX_MESSAGE_CHARS + 1);
        assert!(validate_text(Some(&long)).is_err());
    }
}
