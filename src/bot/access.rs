//! Static access control.
//!
//! Channels and groups are always allowed; private chats only for the
//! single configured user. Updates from anyone else are silently
//! ignored: the dptree filters built on these predicates simply never
//! match, so no handler runs and no response is sent.

use teloxide::types::{CallbackQuery, Chat, Message};

/// Where an update originated, reduced to what the allow rule needs.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChatScope {
    /// Broadcast channel.
    Channel,
    /// Group or supergroup.
    Group,
    /// One-on-one conversation with the given chat ID.
    Private(i64),
}

/// Classify a Telegram chat into a [`ChatScope`].
#[must_use]
pub fn scope_of(chat: &Chat) -> ChatScope {
    if chat.is_channel() {
        ChatScope::Channel
    } else if chat.is_group() || chat.is_supergroup() {
        ChatScope::Group
    } else {
        // In a private chat the chat ID equals the peer's user ID.
        ChatScope::Private(chat.id.0)
    }
}

/// Whether a scope passes the static allow rule.
#[must_use]
pub const fn is_allowed(scope: ChatScope, allowed_user: i64) -> bool {
    match scope {
        ChatScope::Channel | ChatScope::Group => true,
        ChatScope::Private(chat_id) => chat_id == allowed_user,
    }
}

/// Whether a message may be processed.
#[must_use]
pub fn message_allowed(msg: &Message, allowed_user: i64) -> bool {
    is_allowed(scope_of(&msg.chat), allowed_user)
}

/// Whether a callback query may be processed.
///
/// The originating message's chat is checked; a callback whose message
/// is no longer reachable is denied.
#[must_use]
pub fn callback_allowed(q: &CallbackQuery, allowed_user: i64) -> bool {
    q.message
        .as_ref()
        .is_some_and(|m| is_allowed(scope_of(m.chat()), allowed_user))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    const OWNER: i64 = 933_925_222;

    fn chat(value: serde_json::Value) -> Chat {
        serde_json::from_value(value).expect("chat parses")
    }

    #[test]
    fn test_channel_scope_always_allowed() {
        let chat = chat(json!({"id": -1_001_234, "type": "channel", "title": "news"}));

        assert_eq!(scope_of(&chat), ChatScope::Channel);
        assert!(is_allowed(scope_of(&chat), OWNER));
    }

    #[test]
    fn test_group_and_supergroup_always_allowed() {
        let group = chat(json!({"id": -4_567, "type": "group", "title": "friends"}));
        let supergroup = chat(json!({"id": -1_009_876, "type": "supergroup", "title": "big"}));

        assert_eq!(scope_of(&group), ChatScope::Group);
        assert_eq!(scope_of(&supergroup), ChatScope::Group);
        assert!(is_allowed(scope_of(&group), OWNER));
        assert!(is_allowed(scope_of(&supergroup), OWNER));
    }

    #[test]
    fn test_private_chat_only_for_configured_user() {
        let owner = chat(json!({"id": OWNER, "type": "private", "first_name": "Owner"}));
        let stranger = chat(json!({"id": 111, "type": "private", "first_name": "Other"}));

        assert!(message_scope_allowed(&owner));
        assert!(!message_scope_allowed(&stranger));
    }

    fn message_scope_allowed(chat: &Chat) -> bool {
        is_allowed(scope_of(chat), OWNER)
    }

    #[test]
    fn test_allow_rule_matrix() {
        assert!(is_allowed(ChatScope::Channel, OWNER));
        assert!(is_allowed(ChatScope::Group, OWNER));
        assert!(is_allowed(ChatScope::Private(OWNER), OWNER));
        assert!(!is_allowed(ChatScope::Private(OWNER + 1), OWNER));
        assert!(!is_allowed(ChatScope::Private(0), OWNER));
    }
}
