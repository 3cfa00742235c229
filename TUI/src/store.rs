//! Active session plus chat history, kept in step with each other.

use tracing::debug;

use crate::chat::{ChatHistory, Conversation, ConversationId, Message};

/// The conversation currently on screen.
#[derive(Debug, Default)]
pub struct Session {
    pub messages: Vec<Message>,
    pub active_id: Option<ConversationId>,
}

#[derive(Debug, Default)]
pub struct ChatStore {
    session: Session,
    history: ChatHistory,
}

impl ChatStore {
    pub fn new(history: ChatHistory) -> Self {
        Self {
            session: Session::default(),
            history,
        }
    }

    pub fn history(&self) -> &ChatHistory {
        &self.history
    }

    pub fn active_id(&self) -> Option<&ConversationId> {
        self.session.active_id.as_ref()
    }

    pub fn messages(&self) -> &[Message] {
        &self.session.messages
    }

    /// Append a user message to the session and file it in history,
    /// creating the conversation on the first message.
    ///
    /// Returns the conversation the message belongs to; replies to this
    /// message must be filed there.
    pub fn append_user_message(&mut self, content: &str) -> ConversationId {
        self.session.messages.push(Message::user(content));

        let existing = self
            .session
            .active_id
            .clone()
            .filter(|id| self.history.get(id).is_some());

        match existing {
            Some(id) => {
                if let Some(conversation) = self.history.get_mut(&id) {
                    conversation.set_messages(self.session.messages.clone());
                }
                debug!(conversation = %id, "user message filed");
                id
            }
            None => {
                let conversation = Conversation::start(content, self.session.messages.clone());
                let id = conversation.id.clone();
                debug!(conversation = %id, title = %conversation.title, "conversation created");
                self.history.insert_front(conversation);
                self.session.active_id = Some(id.clone());
                id
            }
        }
    }

    /// File an assistant reply into `target`, the conversation captured when
    /// the user message was sent. The visible session only receives the
    /// reply if `target` is still active.
    pub fn append_assistant_message(&mut self, content: &str, target: &ConversationId) {
        let message = Message::assistant(content);

        if self.session.active_id.as_ref() == Some(target) {
            self.session.messages.push(message.clone());
        }

        match self.history.get_mut(target) {
            Some(conversation) => {
                conversation.push(message);
                debug!(conversation = %target, "assistant reply filed");
            }
            None => debug!(conversation = %target, "reply target missing from history"),
        }
    }

    /// Show a stored conversation. Unknown ids leave everything untouched.
    pub fn select_conversation(&mut self, id: &ConversationId) -> bool {
        let Some(conversation) = self.history.get(id) else {
            debug!(conversation = %id, "ignoring selection of unknown conversation");
            return false;
        };
        self.session.messages = conversation.messages.clone();
        self.session.active_id = Some(id.clone());
        true
    }

    pub fn start_new_conversation(&mut self) {
        self.session.messages.clear();
        self.session.active_id = None;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::chat::{Role, WELCOME_CHAT_ID};

    fn store() -> ChatStore {
        ChatStore::new(ChatHistory::new())
    }

    #[test]
    fn test_first_message_creates_conversation() {
        let mut store = store();
        let id = store.append_user_message("Hi");

        assert_eq!(store.active_id(), Some(&id));
        assert_eq!(store.messages().len(), 1);
        let conversation = store.history().get(&id).unwrap();
        assert_eq!(conversation.title, "Hi");
        assert_eq!(conversation.last_message, "Hi");
        assert_eq!(conversation.messages, store.messages());
    }

    #[test]
    fn test_second_message_updates_same_conversation() {
        let mut store = store();
        let first = store.append_user_message("Hi");
        let second = store.append_user_message("Still there?");

        assert_eq!(first, second);
        assert_eq!(store.history().len(), 1);
        let conversation = store.history().get(&first).unwrap();
        assert_eq!(conversation.messages.len(), 2);
        assert_eq!(conversation.last_message, "Still there?");
        assert_eq!(conversation.title, "Hi");
    }

    #[test]
    fn test_reply_to_active_conversation_reaches_both_stores() {
        let mut store = store();
        let id = store.append_user_message("Hi");
        store.append_assistant_message("Hello!", &id);

        assert_eq!(store.messages().len(), 2);
        assert_eq!(store.messages()[1].role, Role::Assistant);
        let conversation = store.history().get(&id).unwrap();
        assert_eq!(conversation.messages, store.messages());
        assert_eq!(conversation.last_message, "Hello!");
    }

    #[test]
    fn test_reply_after_switch_is_filed_in_original_conversation() {
        let mut store = ChatStore::new(ChatHistory::seeded());
        let a = store.append_user_message("Question for A");

        let b = ConversationId::from(WELCOME_CHAT_ID);
        assert!(store.select_conversation(&b));
        let b_len = store.messages().len();

        store.append_assistant_message("Answer for A", &a);

        assert_eq!(store.messages().len(), b_len);
        assert_eq!(store.history().get(&b).unwrap().messages.len(), b_len);
        let conversation_a = store.history().get(&a).unwrap();
        assert_eq!(conversation_a.messages.len(), 2);
        assert_eq!(conversation_a.last_message, "Answer for A");
    }

    #[test]
    fn test_select_unknown_conversation_is_noop() {
        let mut store = store();
        let id = store.append_user_message("Hi");

        assert!(!store.select_conversation(&ConversationId::from("missing")));
        assert_eq!(store.active_id(), Some(&id));
        assert_eq!(store.messages().len(), 1);
    }

    #[test]
    fn test_new_conversation_defers_creation() {
        let mut store = store();
        store.append_user_message("Hi");
        store.start_new_conversation();

        assert!(store.messages().is_empty());
        assert!(store.active_id().is_none());
        assert_eq!(store.history().len(), 1);

        let second = store.append_user_message("Another topic");
        assert_eq!(store.history().len(), 2);
        assert_eq!(store.history().at(0).map(|c| &c.id), Some(&second));
    }

    #[test]
    fn test_select_replaces_session_messages() {
        let mut store = ChatStore::new(ChatHistory::seeded());
        store.append_user_message("Hi");
        let welcome = ConversationId::from(WELCOME_CHAT_ID);

        assert!(store.select_conversation(&welcome));
        assert_eq!(store.messages().len(), 5);
        assert_eq!(store.active_id(), Some(&welcome));
    }
}
