//! Messages, conversations and the chat history list.

use std::fmt;

use chrono::{DateTime, Duration, Utc};
use uuid::Uuid;

/// Titles longer than this many characters are truncated.
pub const TITLE_MAX_CHARS: usize = 40;

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct MessageId(String);

impl MessageId {
    pub fn new() -> Self {
        Self(Uuid::new_v4().to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Default for MessageId {
    fn default() -> Self {
        Self::new()
    }
}

impl From<&str> for MessageId {
    fn from(value: &str) -> Self {
        Self(value.to_string())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ConversationId(String);

impl ConversationId {
    pub fn new() -> Self {
        Self(Uuid::new_v4().to_string())
    }
}

impl Default for ConversationId {
    fn default() -> Self {
        Self::new()
    }
}

impl From<&str> for ConversationId {
    fn from(value: &str) -> Self {
        Self(value.to_string())
    }
}

impl fmt::Display for ConversationId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Role {
    User,
    Assistant,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Message {
    pub id: MessageId,
    pub role: Role,
    pub content: String,
    pub timestamp: DateTime<Utc>,
}

impl Message {
    pub fn user(content: impl Into<String>) -> Self {
        Self::new(Role::User, content)
    }

    pub fn assistant(content: impl Into<String>) -> Self {
        Self::new(Role::Assistant, content)
    }

    fn new(role: Role, content: impl Into<String>) -> Self {
        Self {
            id: MessageId::new(),
            role,
            content: content.into(),
            timestamp: Utc::now(),
        }
    }
}

/// A named conversation with its summary metadata.
///
/// `last_message` and `timestamp` always describe the tail of `messages`
/// once an update has been applied through [`Conversation::set_messages`].
#[derive(Debug, Clone, PartialEq)]
pub struct Conversation {
    pub id: ConversationId,
    pub title: String,
    pub last_message: String,
    pub timestamp: DateTime<Utc>,
    pub messages: Vec<Message>,
}

impl Conversation {
    /// Start a conversation from the messages of a session whose first
    /// user message names it.
    pub fn start(first_user_content: &str, messages: Vec<Message>) -> Self {
        let mut conversation = Self {
            id: ConversationId::new(),
            title: derive_title(first_user_content),
            last_message: String::new(),
            timestamp: Utc::now(),
            messages: Vec::new(),
        };
        conversation.set_messages(messages);
        conversation
    }

    /// Replace the message list and refresh the summary fields.
    pub fn set_messages(&mut self, messages: Vec<Message>) {
        self.messages = messages;
        self.last_message = self
            .messages
            .last()
            .map(|m| m.content.clone())
            .unwrap_or_default();
        self.timestamp = Utc::now();
    }

    pub fn push(&mut self, message: Message) {
        self.last_message = message.content.clone();
        self.messages.push(message);
        self.timestamp = Utc::now();
    }
}

/// Conversation title: the content itself, or its first 40 characters
/// followed by `...`.
pub fn derive_title(content: &str) -> String {
    if content.chars().count() <= TITLE_MAX_CHARS {
        content.to_string()
    } else {
        let head: String = content.chars().take(TITLE_MAX_CHARS).collect();
        format!("{}...", head)
    }
}

/// All known conversations, most recently created first.
#[derive(Debug, Default)]
pub struct ChatHistory {
    conversations: Vec<Conversation>,
}

impl ChatHistory {
    pub fn new() -> Self {
        Self::default()
    }

    /// History pre-populated with the demo conversation.
    pub fn seeded() -> Self {
        Self {
            conversations: vec![welcome_conversation()],
        }
    }

    pub fn insert_front(&mut self, conversation: Conversation) {
        self.conversations.insert(0, conversation);
    }

    pub fn get(&self, id: &ConversationId) -> Option<&Conversation> {
        self.conversations.iter().find(|c| &c.id == id)
    }

    pub fn get_mut(&mut self, id: &ConversationId) -> Option<&mut Conversation> {
        self.conversations.iter_mut().find(|c| &c.id == id)
    }

    pub fn iter(&self) -> impl Iterator<Item = &Conversation> {
        self.conversations.iter()
    }

    pub fn len(&self) -> usize {
        self.conversations.len()
    }

    pub fn is_empty(&self) -> bool {
        self.conversations.is_empty()
    }

    pub fn position(&self, id: &ConversationId) -> Option<usize> {
        self.conversations.iter().position(|c| &c.id == id)
    }

    pub fn at(&self, index: usize) -> Option<&Conversation> {
        self.conversations.get(index)
    }
}

pub const WELCOME_CHAT_ID: &str = "welcome-chat";

fn welcome_conversation() -> Conversation {
    let day_ago = Utc::now() - Duration::days(1);
    let script = [
        (
            "welcome-1",
            Role::Assistant,
            "Hello! I'm your Acme Corp AI Assistant. How can I help you today?",
        ),
        (
            "welcome-2",
            Role::User,
            "Hi! Can you tell me what you can help me with?",
        ),
        (
            "welcome-3",
            Role::Assistant,
            "I'd be happy to help! I can assist you with:\n\n\
             - Answering questions about company policies and procedures\n\
             - Helping with project planning and organization\n\
             - Providing information and analysis\n\
             - Creative brainstorming and problem-solving\n\
             - General productivity and workflow suggestions\n\n\
             What would you like to explore first?",
        ),
        (
            "welcome-4",
            Role::User,
            "That sounds great! I'll start a new conversation when I have questions.",
        ),
        (
            "welcome-5",
            Role::Assistant,
            "Perfect! Feel free to explore and ask me anything. You can start a new chat \
             anytime with Ctrl+N or /new. I'm here whenever you need assistance!",
        ),
    ];

    let messages = script
        .iter()
        .enumerate()
        .map(|(i, (id, role, content))| Message {
            id: MessageId::from(*id),
            role: *role,
            content: content.to_string(),
            timestamp: day_ago + Duration::seconds(30 * i as i64),
        })
        .collect();

    Conversation {
        id: ConversationId::from(WELCOME_CHAT_ID),
        title: "Welcome to Acme Corp Assistant".to_string(),
        last_message: "Feel free to explore and ask me anything!".to_string(),
        timestamp: day_ago,
        messages,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_title_short_content_is_kept() {
        assert_eq!(derive_title("Hi"), "Hi");
        let exactly_forty = "a".repeat(40);
        assert_eq!(derive_title(&exactly_forty), exactly_forty);
    }

    #[test]
    fn test_title_long_content_is_truncated() {
        let long = "b".repeat(41);
        assert_eq!(derive_title(&long), format!("{}...", "b".repeat(40)));
    }

    #[test]
    fn test_title_counts_chars_not_bytes() {
        let accented = "é".repeat(45);
        let title = derive_title(&accented);
        assert_eq!(title.chars().count(), 43);
        assert!(title.ends_with("..."));
    }

    #[test]
    fn test_conversation_start_tracks_tail() {
        let conversation = Conversation::start("Hi", vec![Message::user("Hi")]);
        assert_eq!(conversation.title, "Hi");
        assert_eq!(conversation.last_message, "Hi");
        assert_eq!(conversation.messages.len(), 1);
    }

    #[test]
    fn test_push_updates_last_message() {
        let mut conversation = Conversation::start("Hi", vec![Message::user("Hi")]);
        conversation.push(Message::assistant("Hello"));
        assert_eq!(conversation.last_message, "Hello");
        assert_eq!(conversation.messages.len(), 2);
    }

    #[test]
    fn test_history_insert_front_orders_newest_first() {
        let mut history = ChatHistory::seeded();
        let conversation = Conversation::start("Newer", vec![Message::user("Newer")]);
        let id = conversation.id.clone();
        history.insert_front(conversation);

        assert_eq!(history.len(), 2);
        assert_eq!(history.at(0).map(|c| &c.id), Some(&id));
        assert_eq!(history.position(&ConversationId::from(WELCOME_CHAT_ID)), Some(1));
    }

    #[test]
    fn test_seeded_history_alternates_roles() {
        let history = ChatHistory::seeded();
        let welcome = history.get(&ConversationId::from(WELCOME_CHAT_ID)).unwrap();
        assert_eq!(welcome.messages.len(), 5);
        assert_eq!(welcome.messages[0].role, Role::Assistant);
        assert_eq!(welcome.messages[1].role, Role::User);
        assert!(welcome.messages.windows(2).all(|w| w[0].timestamp < w[1].timestamp));
    }

    #[test]
    fn test_message_ids_are_unique() {
        let a = Message::user("one");
        let b = Message::user("one");
        assert_ne!(a.id, b.id);
    }
}
