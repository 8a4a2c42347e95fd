//! UI-agnostic application state types
//!
//! This module contains the message list shared by every front end. It
//! doesn't depend on any specific UI framework: a front end reads the list,
//! draws it, and honours the scroll requests it raises.

use serde::{Deserialize, Serialize};

/// Placeholder fragment shown while the assistant is "typing".
pub const TYPING_DOTS: &str =
    r#"<div class="typing-dots" aria-hidden="true"><span></span><span></span><span></span></div>"#;

/// The role of a chat message sender
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChatRole {
    User,
    Assistant,
}

impl ChatRole {
    pub fn avatar(&self) -> &'static str {
        match self {
            ChatRole::User => "🙂",
            ChatRole::Assistant => "🤖",
        }
    }
}

/// A chat message in the conversation
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatMessage {
    pub role: ChatRole,
    /// Safe HTML fragment for the bubble.
    pub content: String,
    /// Set only on the typing indicator.
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub transient: bool,
}

impl ChatMessage {
    /// Build a message node for `role` with `content` placed in its bubble.
    pub fn render(role: ChatRole, content: impl Into<String>) -> Self {
        Self {
            role,
            content: content.into(),
            transient: false,
        }
    }

    pub fn avatar(&self) -> &'static str {
        self.role.avatar()
    }

    fn typing() -> Self {
        Self {
            role: ChatRole::Assistant,
            content: TYPING_DOTS.to_string(),
            transient: true,
        }
    }
}

/// Append-only list of rendered messages, plus at most one transient
/// typing indicator.
#[derive(Debug, Default)]
pub struct MessageList {
    messages: Vec<ChatMessage>,
    scroll_requested: bool,
}

impl MessageList {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a message and ask the front end to scroll to the end.
    pub fn push(&mut self, message: ChatMessage) {
        self.messages.push(message);
        self.scroll_requested = true;
    }

    pub fn show_typing(&mut self) {
        if self.is_typing() {
            return;
        }
        self.push(ChatMessage::typing());
    }

    pub fn hide_typing(&mut self) {
        if let Some(idx) = self.messages.iter().position(|m| m.transient) {
            self.messages.remove(idx);
        }
    }

    pub fn is_typing(&self) -> bool {
        self.messages.iter().any(|m| m.transient)
    }

    /// Consume a pending scroll-to-bottom request.
    pub fn take_scroll_request(&mut self) -> bool {
        std::mem::take(&mut self.scroll_requested)
    }

    /// Everything on screen, typing indicator included.
    pub fn messages(&self) -> &[ChatMessage] {
        &self.messages
    }

    /// The permanent conversation, without the typing indicator.
    pub fn history(&self) -> impl Iterator<Item = &ChatMessage> {
        self.messages.iter().filter(|m| !m.transient)
    }

    pub fn len(&self) -> usize {
        self.messages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.messages.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_render_uses_role_avatar() {
        let user = ChatMessage::render(ChatRole::User, "<p>hi</p>");
        let bot = ChatMessage::render(ChatRole::Assistant, "<p>hello</p>");
        assert_eq!(user.avatar(), "🙂");
        assert_eq!(bot.avatar(), "🤖");
        assert_eq!(user.content, "<p>hi</p>");
        assert!(!user.transient);
    }

    #[test]
    fn test_push_requests_scroll_once() {
        let mut list = MessageList::new();
        assert!(!list.take_scroll_request());
        list.push(ChatMessage::render(ChatRole::User, "<p>a</p>"));
        assert!(list.take_scroll_request());
        assert!(!list.take_scroll_request());
    }

    #[test]
    fn test_typing_indicator_is_single() {
        let mut list = MessageList::new();
        list.show_typing();
        list.show_typing();
        assert_eq!(list.messages().iter().filter(|m| m.transient).count(), 1);
        assert!(list.is_typing());
        assert_eq!(list.messages()[0].content, TYPING_DOTS);
    }

    #[test]
    fn test_hide_typing_is_idempotent() {
        let mut list = MessageList::new();
        list.push(ChatMessage::render(ChatRole::User, "<p>a</p>"));
        list.show_typing();
        list.hide_typing();
        list.hide_typing();
        assert!(!list.is_typing());
        assert_eq!(list.len(), 1);
    }

    #[test]
    fn test_history_skips_transient() {
        let mut list = MessageList::new();
        list.push(ChatMessage::render(ChatRole::User, "<p>a</p>"));
        list.show_typing();
        assert_eq!(list.len(), 2);
        assert_eq!(list.history().count(), 1);
    }

    #[test]
    fn test_role_serializes_lowercase() {
        let msg = ChatMessage::render(ChatRole::Assistant, "<p>x</p>");
        let json = serde_json::to_string(&msg).unwrap();
        assert_eq!(json, r#"{"role":"assistant","content":"<p>x</p>"}"#);
    }
}
