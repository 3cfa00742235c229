//! Header and sidebar visibility driven by pointer position and explicit
//! toggles.

use std::time::{Duration, Instant};

use tracing::trace;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HeaderVisibility {
    Visible,
    Hidden,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SidebarState {
    #[default]
    Collapsed,
    /// Opened with the toggle; stays open until toggled again.
    Expanded,
    /// Opened by hovering; closes when the pointer leaves.
    HoverExpanded,
}

impl SidebarState {
    pub fn is_open(self) -> bool {
        !matches!(self, SidebarState::Collapsed)
    }
}

#[derive(Debug, Clone, Copy)]
pub struct Thresholds {
    /// Pointer at or above this many pixels from the top reveals the header.
    pub reveal_px: u32,
    /// Pointer below this many pixels hides the header while collapsed.
    pub hide_px: u32,
}

impl Default for Thresholds {
    fn default() -> Self {
        Self {
            reveal_px: 50,
            hide_px: 100,
        }
    }
}

#[derive(Debug)]
pub struct VisibilityController {
    header: HeaderVisibility,
    sidebar: SidebarState,
    thresholds: Thresholds,
    intro_deadline: Option<Instant>,
    pointer_in_sidebar: bool,
}

impl VisibilityController {
    /// Header starts visible and hides once `intro` has elapsed.
    pub fn new(now: Instant, intro: Duration, thresholds: Thresholds) -> Self {
        Self {
            header: HeaderVisibility::Visible,
            sidebar: SidebarState::Collapsed,
            thresholds,
            intro_deadline: Some(now + intro),
            pointer_in_sidebar: false,
        }
    }

    pub fn header(&self) -> HeaderVisibility {
        self.header
    }

    pub fn header_visible(&self) -> bool {
        self.header == HeaderVisibility::Visible
    }

    pub fn sidebar(&self) -> SidebarState {
        self.sidebar
    }

    pub fn tick(&mut self, now: Instant) {
        if let Some(deadline) = self.intro_deadline {
            if now >= deadline {
                self.intro_deadline = None;
                self.header = HeaderVisibility::Hidden;
                trace!("intro elapsed, header hidden");
            }
        }
    }

    /// Pointer moved to `y` pixels from the top of the window.
    pub fn pointer_moved(&mut self, y: u32) {
        if y <= self.thresholds.reveal_px {
            self.intro_deadline = None;
            self.header = HeaderVisibility::Visible;
        } else if y > self.thresholds.hide_px && self.sidebar == SidebarState::Collapsed {
            self.intro_deadline = None;
            self.header = HeaderVisibility::Hidden;
        }
    }

    /// Feed whether the latest pointer sample lies over the sidebar; only
    /// changes are forwarded as enter/leave.
    pub fn pointer_over_sidebar(&mut self, inside: bool) {
        if inside == self.pointer_in_sidebar {
            return;
        }
        self.pointer_in_sidebar = inside;
        if inside {
            self.pointer_entered_sidebar();
        } else {
            self.pointer_left_sidebar();
        }
    }

    pub fn pointer_entered_sidebar(&mut self) {
        if self.sidebar == SidebarState::Collapsed {
            self.sidebar = SidebarState::HoverExpanded;
        }
    }

    pub fn pointer_left_sidebar(&mut self) {
        if self.sidebar == SidebarState::HoverExpanded {
            self.sidebar = SidebarState::Collapsed;
        }
    }

    pub fn toggle_sidebar(&mut self) {
        self.sidebar = match self.sidebar {
            SidebarState::Expanded => SidebarState::Collapsed,
            SidebarState::Collapsed | SidebarState::HoverExpanded => SidebarState::Expanded,
        };
    }

    pub fn conversation_selected(&mut self) {
        if self.sidebar == SidebarState::HoverExpanded {
            self.sidebar = SidebarState::Collapsed;
        }
    }

    pub fn new_chat_started(&mut self) {
        self.sidebar = SidebarState::Collapsed;
    }
}
