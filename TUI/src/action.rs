/// User actions that can be triggered by commands or UI events.
#[derive(Debug, Clone, PartialEq)]
pub enum Action {
    /// Show help message
    Help,
    /// Start a new chat
    NewChat,
    /// Stop the pending reply
    Stop,
    /// Upload a file
    Upload {
        path: String,
    },
    /// Copy the most recent reply
    CopyReply,
    /// Rate the most recent reply
    Feedback {
        positive: bool,
    },
    /// Pin or unpin the sidebar
    ToggleSidebar,
    /// Quit application
    Quit,
}
