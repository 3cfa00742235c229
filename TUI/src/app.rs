use std::collections::HashSet;
use std::path::Path;
use std::time::Instant;

use arboard::Clipboard;
use tracing::{debug, info, warn};

use crate::action::Action;
use crate::chat::{ChatHistory, ConversationId, Message, Role};
use crate::command::CommandParser;
use crate::config::{Config, COMMANDS, SUGGESTED_PROMPTS};
use crate::error::AppError;
use crate::simulator::{PendingReply, ReplyReady, ResponseSimulator};
use crate::store::ChatStore;
use crate::ui_state::{Focus, UiState};
use crate::visibility::VisibilityController;

pub struct App {
    pub config: Config,
    pub store: ChatStore,
    pub visibility: VisibilityController,
    pub ui: UiState,
    pub animation_frame: usize,
    pub animation_tick: u64,
    pub should_quit: bool,
    simulator: ResponseSimulator,
    /// The reply the user can still stop.
    pending: Option<PendingReply>,
    /// Tickets of replies left running after the user moved to a new chat.
    detached: HashSet<u64>,
}

impl App {
    pub fn new(config: Config, now: Instant) -> Self {
        let history = if config.seed_welcome_chat {
            ChatHistory::seeded()
        } else {
            ChatHistory::new()
        };
        let (min_delay, max_delay) = config.reply_delay_range();
        let visibility = VisibilityController::new(now, config.header_intro(), config.thresholds());

        Self {
            store: ChatStore::new(history),
            visibility,
            ui: UiState::new(),
            animation_frame: 0,
            animation_tick: 0,
            should_quit: false,
            simulator: ResponseSimulator::new(min_delay, max_delay),
            pending: None,
            detached: HashSet::new(),
            config,
        }
    }

    pub fn messages(&self) -> &[Message] {
        self.store.messages()
    }

    /// A reply is pending and can be stopped.
    pub fn is_typing(&self) -> bool {
        self.pending.is_some()
    }

    /// The pending reply belongs to the conversation on screen.
    pub fn typing_in_view(&self) -> bool {
        self.pending
            .as_ref()
            .is_some_and(|p| self.store.active_id() == Some(&p.target))
    }

    pub fn showing_welcome(&self) -> bool {
        self.messages().is_empty() && !self.is_typing()
    }

    pub fn tick(&mut self, now: Instant) {
        self.animation_tick += 1;
        self.animation_frame = (self.animation_frame + 1) % self.config.animation_frame_mod.max(1);

        if self.ui.status_message.is_some()
            && self.animation_tick.saturating_sub(self.ui.status_posted_at) >= self.config.status_timeout_ticks
        {
            self.ui.status_message = None;
        }

        self.visibility.tick(now);
    }

    pub fn set_status(&mut self, message: impl Into<String>) {
        self.ui.status_message = Some(message.into());
        self.ui.status_posted_at = self.animation_tick;
    }

    // ------------------------------------------------------------------
    // Chat events
    // ------------------------------------------------------------------

    pub fn on_send(&mut self, content: &str) {
        let content = content.trim();
        if content.is_empty() {
            return;
        }
        if self.pending.is_some() {
            debug!("send ignored while a reply is pending");
            return;
        }

        let target = self.store.append_user_message(content);
        let pending = self.simulator.schedule(target);
        self.pending = Some(pending);
        self.ui.scroll_offset = 0;
        self.ui.prompt_selection = None;
    }

    pub fn on_stop(&mut self) {
        if let Some(pending) = self.pending.take() {
            info!(ticket = pending.ticket, "response stopped");
            pending.cancel();
            self.set_status("Response stopped");
        }
    }

    pub fn on_new_chat(&mut self) {
        if let Some(pending) = self.pending.take() {
            debug!(ticket = pending.ticket, conversation = %pending.target, "reply detached from view");
            self.detached.insert(pending.ticket);
        }
        self.store.start_new_conversation();
        self.visibility.new_chat_started();
        self.ui.scroll_offset = 0;
        self.ui.prompt_selection = None;
        self.ui.focus = Focus::Input;
        info!("new chat started");
    }

    pub fn on_select_chat(&mut self, id: &ConversationId) {
        if self.store.select_conversation(id) {
            self.visibility.conversation_selected();
            self.ui.scroll_offset = 0;
            if let Some(index) = self.store.history().position(id) {
                self.ui.sidebar_cursor = index;
            }
            info!(conversation = %id, "conversation selected");
        }
    }

    /// Apply a completed reply. Replies that were stopped are dropped even if
    /// they fired before the stop was processed.
    pub fn on_reply(&mut self, ready: ReplyReady) {
        let is_pending = self.pending.as_ref().is_some_and(|p| p.ticket == ready.ticket);
        if is_pending {
            self.pending = None;
        } else if !self.detached.remove(&ready.ticket) {
            debug!(ticket = ready.ticket, "discarding stopped reply");
            return;
        }

        self.store.append_assistant_message(&ready.content, &ready.target);
        if self.store.active_id() == Some(&ready.target) {
            self.ui.scroll_offset = 0;
        }
        info!(ticket = ready.ticket, conversation = %ready.target, "reply delivered");
    }

    /// Apply every reply that has already arrived.
    pub fn pump_replies(&mut self) {
        while let Some(ready) = self.simulator.try_recv() {
            self.on_reply(ready);
        }
    }

    pub fn on_upload(&mut self, path: &Path) {
        match describe_upload(path) {
            Ok(summary) => {
                info!(path = %path.display(), "file uploaded");
                self.set_status(summary);
            }
            Err(e) => {
                warn!(error = %e, "upload failed");
                self.set_status(format!("Upload failed: {}", e));
            }
        }
    }

    pub fn last_reply(&self) -> Option<&Message> {
        self.messages().iter().rev().find(|m| m.role == Role::Assistant)
    }

    pub fn on_copy_last_reply(&mut self) {
        let Some(content) = self.last_reply().map(|m| m.content.clone()) else {
            self.set_status("No reply to copy");
            return;
        };
        match copy_to_clipboard(&content) {
            Ok(()) => self.set_status("Message copied to clipboard"),
            Err(e) => {
                warn!(error = %e, "copy failed");
                self.set_status("Failed to copy message");
            }
        }
    }

    pub fn on_feedback(&mut self, positive: bool) {
        let Some(id) = self.last_reply().map(|m| m.id.clone()) else {
            self.set_status("No reply to rate");
            return;
        };
        info!(message = id.as_str(), positive, "feedback recorded");
        self.set_status("Feedback recorded");
    }

    pub fn toggle_sidebar(&mut self) {
        self.visibility.toggle_sidebar();
    }

    // ------------------------------------------------------------------
    // Composer
    // ------------------------------------------------------------------

    /// Enter in the composer: run a command, stop a pending reply, or send.
    pub fn submit_input(&mut self) {
        if self.ui.input.trim_start().starts_with('/') {
            self.handle_command();
            return;
        }

        if self.is_typing() {
            self.on_stop();
            return;
        }

        if self.ui.input.trim().is_empty() {
            if let Some(prompt) = self.ui.prompt_selection.and_then(|i| SUGGESTED_PROMPTS.get(i)) {
                self.on_send(prompt);
            }
            return;
        }

        let content = std::mem::take(&mut self.ui.input);
        self.on_send(&content);
    }

    fn handle_command(&mut self) {
        let input = std::mem::take(&mut self.ui.input);
        self.ui.command_selection = None;

        match CommandParser::parse(&input) {
            Ok(action) => self.dispatch(action),
            Err(message) => self.set_status(message),
        }
    }

    pub fn dispatch(&mut self, action: Action) {
        match action {
            Action::Help => {
                let names: Vec<&str> = COMMANDS.iter().map(|(cmd, _)| *cmd).collect();
                self.set_status(format!("Commands: {}", names.join(" ")));
            }
            Action::NewChat => self.on_new_chat(),
            Action::Stop => self.on_stop(),
            Action::Upload { path } => self.on_upload(Path::new(&path)),
            Action::CopyReply => self.on_copy_last_reply(),
            Action::Feedback { positive } => self.on_feedback(positive),
            Action::ToggleSidebar => self.toggle_sidebar(),
            Action::Quit => self.should_quit = true,
        }
    }

    /// Check if command popup should be shown
    pub fn showing_command_popup(&self) -> bool {
        self.ui.input.starts_with('/') && !self.ui.input.contains(' ')
    }

    /// Get filtered commands based on current input
    pub fn get_filtered_commands(&self) -> Vec<(&'static str, &'static str)> {
        if !self.ui.input.starts_with('/') {
            return vec![];
        }
        let filter = &self.ui.input[1..];
        COMMANDS
            .iter()
            .filter(|(cmd, _)| cmd[1..].starts_with(filter))
            .copied()
            .collect()
    }

    /// Move selection up in command popup
    pub fn command_select_up(&mut self) {
        let count = self.get_filtered_commands().len();
        self.ui.command_selection = cycle_up(self.ui.command_selection, count);
    }

    /// Move selection down in command popup
    pub fn command_select_down(&mut self) {
        let count = self.get_filtered_commands().len();
        self.ui.command_selection = cycle_down(self.ui.command_selection, count);
    }

    /// Apply selected command to input
    pub fn apply_command_selection(&mut self) {
        if let Some(idx) = self.ui.command_selection {
            let filtered = self.get_filtered_commands();
            if let Some((cmd, _)) = filtered.get(idx) {
                self.ui.input = cmd.to_string();
            }
        }
        self.ui.command_selection = None;
    }

    /// Reset command selection when input changes
    pub fn reset_command_selection(&mut self) {
        self.ui.command_selection = None;
    }

    pub fn prompt_select_up(&mut self) {
        self.ui.prompt_selection = cycle_up(self.ui.prompt_selection, SUGGESTED_PROMPTS.len());
    }

    pub fn prompt_select_down(&mut self) {
        self.ui.prompt_selection = cycle_down(self.ui.prompt_selection, SUGGESTED_PROMPTS.len());
    }

    // ------------------------------------------------------------------
    // Navigation
    // ------------------------------------------------------------------

    pub fn cycle_focus(&mut self) {
        self.ui.focus = self.ui.focus.next();
    }

    pub fn sidebar_up(&mut self) {
        self.ui.sidebar_cursor = self.ui.sidebar_cursor.saturating_sub(1);
    }

    pub fn sidebar_down(&mut self) {
        let last = self.store.history().len().saturating_sub(1);
        self.ui.sidebar_cursor = (self.ui.sidebar_cursor + 1).min(last);
    }

    /// Open the conversation under the sidebar cursor.
    pub fn sidebar_activate(&mut self) {
        self.select_history_entry(self.ui.sidebar_cursor);
    }

    pub fn select_history_entry(&mut self, index: usize) {
        let Some(id) = self.store.history().at(index).map(|c| c.id.clone()) else {
            return;
        };
        self.on_select_chat(&id);
    }

    pub fn scroll_up(&mut self) {
        self.ui.scroll_offset = self.ui.scroll_offset.saturating_add(self.config.scroll_step);
    }

    pub fn scroll_down(&mut self) {
        self.ui.scroll_offset = self.ui.scroll_offset.saturating_sub(self.config.scroll_step);
    }

    /// Pointer moved to terminal cell (`column`, `row`).
    pub fn pointer_moved(&mut self, column: u16, row: u16) {
        self.visibility.pointer_moved(self.config.row_to_px(row));
        let sidebar_width = self.sidebar_width();
        self.visibility.pointer_over_sidebar(column < sidebar_width);
    }

    pub fn sidebar_width(&self) -> u16 {
        if self.visibility.sidebar().is_open() {
            self.config.sidebar_expanded_width
        } else {
            self.config.sidebar_collapsed_width
        }
    }
}

// Cycle: None -> last -> ... -> 0 -> None
fn cycle_up(selection: Option<usize>, count: usize) -> Option<usize> {
    if count == 0 {
        return None;
    }
    match selection {
        None => Some(count - 1),
        Some(0) => None,
        Some(n) => Some(n - 1),
    }
}

// Cycle: None -> 0 -> 1 -> ... -> last -> None
fn cycle_down(selection: Option<usize>, count: usize) -> Option<usize> {
    if count == 0 {
        return None;
    }
    match selection {
        None => Some(0),
        Some(n) if n >= count - 1 => None,
        Some(n) => Some(n + 1),
    }
}

fn describe_upload(path: &Path) -> Result<String, AppError> {
    let metadata = std::fs::metadata(path).map_err(|source| AppError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    if !metadata.is_file() {
        return Err(AppError::Upload {
            path: path.to_path_buf(),
            reason: "not a regular file".to_string(),
        });
    }
    let name = path
        .file_name()
        .and_then(|n| n.to_str())
        .unwrap_or("unknown");
    Ok(format!(
        "File uploaded: {} ({:.1} KB)",
        name,
        metadata.len() as f64 / 1024.0
    ))
}

fn copy_to_clipboard(content: &str) -> Result<(), AppError> {
    let mut clipboard = Clipboard::new()?;
    clipboard.set_text(content.to_string())?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::chat::WELCOME_CHAT_ID;
    use crate::simulator::CANNED_REPLIES;
    use std::io::Write;
    use std::time::Duration;

    const MAX_DELAY: Duration = Duration::from_millis(3000);

    fn app() -> App {
        App::new(Config::default(), Instant::now())
    }

    async fn wait_out_delay(app: &mut App) {
        tokio::time::sleep(MAX_DELAY).await;
        app.pump_replies();
    }

    #[tokio::test(start_paused = true)]
    async fn test_send_then_reply_scenario() {
        let mut app = app();
        assert!(app.showing_welcome());

        app.on_send("Hi");
        assert_eq!(app.messages().len(), 1);
        assert!(app.is_typing());
        assert!(app.typing_in_view());
        assert!(!app.showing_welcome());

        let id = app.store.active_id().cloned().unwrap();
        assert_eq!(app.store.history().get(&id).unwrap().title, "Hi");

        wait_out_delay(&mut app).await;

        let messages = app.messages();
        assert_eq!(messages.len(), 2);
        assert_eq!(messages[0].role, Role::User);
        assert_eq!(messages[0].content, "Hi");
        assert_eq!(messages[1].role, Role::Assistant);
        assert!(CANNED_REPLIES.contains(&messages[1].content.as_str()));
        assert!(!app.is_typing());

        let conversation = app.store.history().get(&id).unwrap();
        assert_eq!(conversation.messages, app.messages());
        assert_eq!(conversation.last_message, messages[1].content);
    }

    #[tokio::test(start_paused = true)]
    async fn test_blank_send_is_ignored() {
        let mut app = app();
        app.on_send("   \n\t");
        assert!(app.messages().is_empty());
        assert!(!app.is_typing());
        assert_eq!(app.store.history().len(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_stop_before_delay_prevents_reply() {
        let mut app = app();
        app.on_send("Hi");
        tokio::time::sleep(Duration::from_millis(500)).await;
        app.on_stop();
        assert!(!app.is_typing());

        wait_out_delay(&mut app).await;
        assert_eq!(app.messages().len(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_stop_racing_a_fired_reply_drops_it() {
        let mut app = app();
        app.on_send("Hi");
        // Reply has fired and sits in the channel, not yet applied.
        tokio::time::sleep(MAX_DELAY).await;
        app.on_stop();
        app.on_stop();
        app.pump_replies();

        assert_eq!(app.messages().len(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_stop_after_reply_is_noop() {
        let mut app = app();
        app.on_send("Hi");
        wait_out_delay(&mut app).await;
        app.on_stop();

        assert_eq!(app.messages().len(), 2);
        assert!(app.ui.status_message.is_none());
    }

    #[tokio::test(start_paused = true)]
    async fn test_send_while_pending_is_ignored() {
        let mut app = app();
        app.on_send("first");
        app.on_send("second");
        assert_eq!(app.messages().len(), 1);

        wait_out_delay(&mut app).await;
        assert_eq!(app.messages().len(), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn test_reply_follows_its_conversation_after_switch() {
        let mut app = app();
        app.on_send("Question for A");
        let a = app.store.active_id().cloned().unwrap();

        let b = ConversationId::from(WELCOME_CHAT_ID);
        app.on_select_chat(&b);
        let b_len = app.messages().len();
        assert!(app.is_typing());
        assert!(!app.typing_in_view());

        wait_out_delay(&mut app).await;

        assert_eq!(app.messages().len(), b_len);
        assert_eq!(app.store.history().get(&b).unwrap().messages.len(), b_len);
        let conversation_a = app.store.history().get(&a).unwrap();
        assert_eq!(conversation_a.messages.len(), 2);
        assert_eq!(conversation_a.messages[1].role, Role::Assistant);

        app.on_select_chat(&a);
        assert_eq!(app.messages().len(), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn test_new_chat_detaches_pending_reply() {
        let mut app = app();
        app.on_send("Hi");
        let a = app.store.active_id().cloned().unwrap();

        app.on_new_chat();
        assert!(app.messages().is_empty());
        assert!(!app.is_typing());
        assert!(app.showing_welcome());

        // Stopping from the new view no longer reaches the old reply.
        app.on_stop();
        wait_out_delay(&mut app).await;

        assert!(app.messages().is_empty());
        let conversation_a = app.store.history().get(&a).unwrap();
        assert_eq!(conversation_a.messages.len(), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn test_send_in_new_chat_while_old_reply_in_flight() {
        let mut app = app();
        app.on_send("First topic");
        let a = app.store.active_id().cloned().unwrap();
        app.on_new_chat();

        app.on_send("Second topic");
        let b = app.store.active_id().cloned().unwrap();
        assert_ne!(a, b);

        wait_out_delay(&mut app).await;

        assert_eq!(app.store.history().get(&a).unwrap().messages.len(), 2);
        assert_eq!(app.store.history().get(&b).unwrap().messages.len(), 2);
        assert_eq!(app.messages().len(), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn test_select_unknown_chat_keeps_session() {
        let mut app = app();
        app.on_send("Hi");
        app.on_select_chat(&ConversationId::from("does-not-exist"));
        assert_eq!(app.messages().len(), 1);
        assert_eq!(app.messages()[0].content, "Hi");
    }

    #[tokio::test(start_paused = true)]
    async fn test_enter_while_typing_stops() {
        let mut app = app();
        app.ui.input = "Hi".to_string();
        app.submit_input();
        assert!(app.ui.input.is_empty());
        assert!(app.is_typing());

        app.submit_input();
        assert!(!app.is_typing());
        assert_eq!(app.ui.status_message.as_deref(), Some("Response stopped"));
    }

    #[tokio::test(start_paused = true)]
    async fn test_suggested_prompt_is_sent() {
        let mut app = app();
        app.prompt_select_down();
        app.prompt_select_down();
        app.submit_input();

        assert_eq!(app.messages().len(), 1);
        assert_eq!(app.messages()[0].content, SUGGESTED_PROMPTS[1]);
    }

    #[tokio::test(start_paused = true)]
    async fn test_slash_new_command() {
        let mut app = app();
        app.on_send("Hi");
        app.ui.input = "/new".to_string();
        app.submit_input();
        assert!(app.messages().is_empty());
        assert!(app.store.active_id().is_none());
    }

    #[tokio::test(start_paused = true)]
    async fn test_unknown_command_reports_status() {
        let mut app = app();
        app.ui.input = "/bogus".to_string();
        app.submit_input();
        assert!(app.ui.status_message.as_ref().unwrap().contains("Unknown command"));
        assert!(app.messages().is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn test_sidebar_activation_selects_entry() {
        let mut app = app();
        app.on_send("Hi");
        wait_out_delay(&mut app).await;

        // Newest first: index 1 is the seeded welcome chat.
        app.sidebar_down();
        app.visibility.pointer_entered_sidebar();
        app.sidebar_activate();

        assert_eq!(app.store.active_id(), Some(&ConversationId::from(WELCOME_CHAT_ID)));
        assert!(!app.visibility.sidebar().is_open());
    }

    #[test]
    fn test_upload_reports_size() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(&[0u8; 2048]).unwrap();

        let summary = describe_upload(file.path()).unwrap();
        assert!(summary.starts_with("File uploaded: "));
        assert!(summary.ends_with("(2.0 KB)"));
    }

    #[test]
    fn test_upload_rejects_directory_and_missing() {
        let dir = tempfile::tempdir().unwrap();
        assert!(matches!(describe_upload(dir.path()), Err(AppError::Upload { .. })));
        assert!(matches!(
            describe_upload(&dir.path().join("missing.txt")),
            Err(AppError::Io { .. })
        ));
    }

    #[test]
    fn test_status_clears_after_timeout() {
        let mut app = App::new(Config::default(), Instant::now());
        app.set_status("hello");
        let now = Instant::now();
        for _ in 0..app.config.status_timeout_ticks {
            app.tick(now);
        }
        assert!(app.ui.status_message.is_none());
    }

    #[test]
    fn test_pointer_over_sidebar_expands_it() {
        let mut app = App::new(Config::default(), Instant::now());
        app.pointer_moved(2, 20);
        assert!(app.visibility.sidebar().is_open());
        assert!(!app.visibility.header_visible());

        app.pointer_moved(60, 20);
        assert!(!app.visibility.sidebar().is_open());
        assert!(!app.visibility.header_visible());

        app.pointer_moved(60, 1);
        assert!(app.visibility.header_visible());
    }

    #[test]
    fn test_cycle_helpers() {
        assert_eq!(cycle_down(None, 3), Some(0));
        assert_eq!(cycle_down(Some(2), 3), None);
        assert_eq!(cycle_up(None, 3), Some(2));
        assert_eq!(cycle_up(Some(0), 3), None);
        assert_eq!(cycle_up(None, 0), None);
    }
}
