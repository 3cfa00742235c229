#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Focus {
    Sidebar,
    Chat,
    #[default]
    Input,
}

impl Focus {
    pub fn next(self) -> Self {
        match self {
            Focus::Sidebar => Focus::Chat,
            Focus::Chat => Focus::Input,
            Focus::Input => Focus::Sidebar,
        }
    }
}

/// View-local state; never consulted by the chat store.
#[derive(Debug, Default)]
pub struct UiState {
    pub input: String,
    pub scroll_offset: usize,
    pub status_message: Option<String>,
    /// Tick at which the status message was posted
    pub status_posted_at: u64,

    // Command popup state
    pub command_selection: Option<usize>,

    // Highlighted conversation starter on the welcome screen
    pub prompt_selection: Option<usize>,

    // Highlighted row in the sidebar history list
    pub sidebar_cursor: usize,

    // Which panel is focused
    pub focus: Focus,
}

impl UiState {
    pub fn new() -> Self {
        Self::default()
    }
}
