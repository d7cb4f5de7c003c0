//! The in-memory conversation.

use crate::types::{ChatMessage, SoulMessage};

/// An ordered list of user and soul messages.
///
/// Message identifiers are unique within a session.  A soul message is pushed
/// when its turn begins and replaced with each newer snapshot of that turn.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Session {
    messages: Vec<ChatMessage>,
    next_id: u64,
}

impl Session {
    /// An empty session.
    pub fn new() -> Self {
        Self::default()
    }

    fn allocate_id(&mut self) -> String {
        self.next_id += 1;
        format!("msg-{}", self.next_id)
    }

    /// Record what the user said, returning the message's id.
    pub fn push_user(&mut self, text: impl Into<String>) -> String {
        let id = self.allocate_id();
        self.messages.push(ChatMessage::User {
            id: id.clone(),
            text: text.into(),
        });
        id
    }

    /// Start the soul's answer, returning its initial snapshot.
    pub fn begin_soul(&mut self) -> SoulMessage {
        let message = SoulMessage::new(self.allocate_id());
        self.messages.push(ChatMessage::Soul(message.clone()));
        message
    }

    /// Replace the soul message with the snapshot's id.
    ///
    /// Returns false if the session holds no soul message with that id.
    pub fn update_soul(&mut self, snapshot: SoulMessage) -> bool {
        let slot = self.messages.iter_mut().rev().find_map(|message| match message {
            ChatMessage::Soul(soul) if soul.id == snapshot.id => Some(soul),
            _ => None,
        });
        match slot {
            Some(soul) => {
                *soul = snapshot;
                true
            }
            None => false,
        }
    }

    /// Every message, oldest first.
    pub fn messages(&self) -> &[ChatMessage] {
        &self.messages
    }

    /// The most recent soul message.
    pub fn last_soul(&self) -> Option<&SoulMessage> {
        self.messages.iter().rev().find_map(ChatMessage::as_soul)
    }

    /// Number of messages.
    pub fn len(&self) -> usize {
        self.messages.len()
    }

    /// True if nothing has been said.
    pub fn is_empty(&self) -> bool {
        self.messages.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::FacultyStatus;

    #[test]
    fn ids_are_unique_and_ordered() {
        let mut session = Session::new();
        let user = session.push_user("hello");
        let soul = session.begin_soul();
        assert_eq!(user, "msg-1");
        assert_eq!(soul.id, "msg-2");
        assert_eq!(session.push_user("again"), "msg-3");
        assert!(!session.is_empty());
    }

    #[test]
    fn update_replaces_snapshot() {
        let mut session = Session::new();
        session.push_user("hello");
        let mut soul = session.begin_soul();
        soul.mind_status = FacultyStatus::Done;
        assert!(session.update_soul(soul.clone()));
        assert_eq!(session.last_soul(), Some(&soul));
        assert_eq!(session.len(), 2);
    }

    #[test]
    fn update_unknown_id_is_rejected() {
        let mut session = Session::new();
        session.begin_soul();
        assert!(!session.update_soul(SoulMessage::new("msg-99")));
    }
}
