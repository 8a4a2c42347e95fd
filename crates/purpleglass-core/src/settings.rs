//! Open/closed state of the settings popover.

use crate::preferences::Theme;

/// Where a click landed, relative to the settings popover.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ClickTarget {
    Panel,
    Toggle,
    Outside,
}

/// Rows of the settings popover, in display order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SettingsItem {
    Theme(Theme),
    Compact,
    Logout,
}

impl SettingsItem {
    pub fn all() -> Vec<SettingsItem> {
        let mut items: Vec<SettingsItem> = Theme::all().into_iter().map(SettingsItem::Theme).collect();
        items.push(SettingsItem::Compact);
        items.push(SettingsItem::Logout);
        items
    }
}

#[derive(Debug, Default)]
pub struct SettingsPanel {
    open: bool,
    selected: usize,
}

impl SettingsPanel {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_open(&self) -> bool {
        self.open
    }

    /// Value for the toggle's `aria-expanded`-style attribute.
    pub fn expanded_attr(&self) -> &'static str {
        if self.open {
            "true"
        } else {
            "false"
        }
    }

    pub fn toggle(&mut self) {
        self.open = !self.open;
        if self.open {
            self.selected = 0;
        }
    }

    pub fn close(&mut self) {
        self.open = false;
    }

    /// Returns true if the click closed the panel.
    ///
    /// A click on the toggle is left to the toggle's own handler.
    pub fn on_click(&mut self, target: ClickTarget) -> bool {
        if self.open && target == ClickTarget::Outside {
            self.open = false;
            return true;
        }
        false
    }

    /// Returns true if Escape closed the panel, in which case focus goes
    /// back to the toggle.
    pub fn on_escape(&mut self) -> bool {
        if self.open {
            self.open = false;
            return true;
        }
        false
    }

    pub fn selected_index(&self) -> usize {
        self.selected
    }

    pub fn selected_item(&self) -> Option<SettingsItem> {
        SettingsItem::all().get(self.selected).copied()
    }

    pub fn select(&mut self, idx: usize) {
        let len = SettingsItem::all().len();
        if len > 0 {
            self.selected = idx.min(len - 1);
        }
    }

    pub fn select_next(&mut self) {
        self.select(self.selected + 1);
    }

    pub fn select_prev(&mut self) {
        self.select(self.selected.saturating_sub(1));
    }
}
