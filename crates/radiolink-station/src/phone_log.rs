use std::collections::BTreeMap;

use radiolink_frame::Message;
use serde::Serialize;

/// Characters of message text kept as a preview.
pub const PREVIEW_CHARS: usize = 32;

/// One entry per station we have heard from.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Contact {
    pub sender_id: u8,
    pub message_count: u64,
    /// Timestamp carried by the most recent message.
    pub last_timestamp: u32,
    pub last_preview: String,
}

/// Contacts keyed by sender id.
#[derive(Debug, Default, Clone)]
pub struct PhoneLog {
    contacts: BTreeMap<u8, Contact>,
}

impl PhoneLog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record an accepted message against its sender.
    pub fn record(&mut self, message: &Message) -> &Contact {
        let preview: String = message.text().chars().take(PREVIEW_CHARS).collect();
        let contact = self
            .contacts
            .entry(message.sender_id)
            .or_insert_with(|| Contact {
                sender_id: message.sender_id,
                message_count: 0,
                last_timestamp: 0,
                last_preview: String::new(),
            });
        contact.message_count += 1;
        contact.last_timestamp = message.timestamp;
        contact.last_preview = preview;
        contact
    }

    pub fn get(&self, sender_id: u8) -> Option<&Contact> {
        self.contacts.get(&sender_id)
    }

    /// Contacts in ascending sender id order.
    pub fn iter(&self) -> impl Iterator<Item = &Contact> {
        self.contacts.values()
    }

    pub fn len(&self) -> usize {
        self.contacts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.contacts.is_empty()
    }
}
