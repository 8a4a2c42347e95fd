//! The chat widget as a view-model.
//!
//! [`ChatController`] owns all widget state and exposes one method per user
//! command. A front end binds keys and clicks to these methods, draws what
//! the accessors return, and forwards [`ReplyReady`] notifications back in
//! through [`ChatController::deliver_reply`].

use tokio::sync::mpsc;
use tracing::{debug, info};

use crate::composer::Composer;
use crate::config::{ChatMode, Config};
use crate::escape::{escape_html, paragraph};
use crate::preferences::{Preferences, PreferencesStore, Theme};
use crate::reply::{PendingReply, ReplyReady, ReplySimulator};
use crate::session::{LoginOutcome, SessionGate};
use crate::settings::{ClickTarget, SettingsItem, SettingsPanel};
use crate::state::{ChatMessage, ChatRole, MessageList};
use crate::storage::KeyValueStore;

/// Which control has keyboard focus.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Focus {
    Composer,
    LoginName,
    SettingsToggle,
    Settings,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SubmitOutcome {
    Sent,
    /// Empty or whitespace-only input.
    Blank,
    /// Not signed in.
    Locked,
    /// A reply is still on its way.
    Busy,
}

/// Components that exist only in gated mode.
struct Gated {
    prefs: PreferencesStore,
    session: SessionGate,
    settings: SettingsPanel,
}

pub struct ChatController {
    messages: MessageList,
    composer: Composer,
    composer_width: u16,
    gated: Option<Gated>,
    replies: ReplySimulator,
    pending: Option<PendingReply>,
    next_ticket: u64,
    focus: Focus,
    notify: mpsc::UnboundedSender<ReplyReady>,
}

impl ChatController {
    /// Build a controller for `config.mode`. Classic mode never touches `store`.
    pub fn new(
        config: &Config,
        store: Box<dyn KeyValueStore>,
        notify: mpsc::UnboundedSender<ReplyReady>,
    ) -> Self {
        let gated = match config.mode {
            ChatMode::Classic => None,
            ChatMode::Gated => {
                let prefs = PreferencesStore::load(store);
                let session = SessionGate::from_display_name(prefs.display_name());
                Some(Gated {
                    prefs,
                    session,
                    settings: SettingsPanel::new(),
                })
            }
        };

        let replies = ReplySimulator::new()
            .with_delay_range(config.reply_delay_min_ms..config.reply_delay_max_ms);

        let mut controller = Self {
            messages: MessageList::new(),
            composer: Composer::new(config.max_input_height),
            composer_width: 80,
            gated,
            replies,
            pending: None,
            next_ticket: 0,
            focus: Focus::Composer,
            notify,
        };
        controller.sync_gate();
        info!(mode = ?config.mode, authenticated = controller.is_authenticated(), "chat ready");
        controller
    }

    /// Swap in a different reply simulator, e.g. a seeded one.
    pub fn with_replies(mut self, replies: ReplySimulator) -> Self {
        self.replies = replies;
        self
    }

    // Accessors

    pub fn mode(&self) -> ChatMode {
        if self.gated.is_some() {
            ChatMode::Gated
        } else {
            ChatMode::Classic
        }
    }

    pub fn messages(&self) -> &[ChatMessage] {
        self.messages.messages()
    }

    pub fn is_typing(&self) -> bool {
        self.messages.is_typing()
    }

    pub fn take_scroll_request(&mut self) -> bool {
        self.messages.take_scroll_request()
    }

    pub fn composer(&self) -> &Composer {
        &self.composer
    }

    pub fn focus(&self) -> Focus {
        self.focus
    }

    pub fn reply_pending(&self) -> bool {
        self.pending.is_some()
    }

    pub fn is_authenticated(&self) -> bool {
        self.gated
            .as_ref()
            .map_or(true, |g| g.session.is_authenticated())
    }

    pub fn overlay_visible(&self) -> bool {
        self.gated.as_ref().is_some_and(|g| g.session.overlay_visible())
    }

    pub fn session(&self) -> Option<&SessionGate> {
        self.gated.as_ref().map(|g| &g.session)
    }

    pub fn settings(&self) -> Option<&SettingsPanel> {
        self.gated.as_ref().map(|g| &g.settings)
    }

    pub fn settings_open(&self) -> bool {
        self.settings().is_some_and(SettingsPanel::is_open)
    }

    pub fn preferences(&self) -> Option<&Preferences> {
        self.gated.as_ref().map(|g| g.prefs.preferences())
    }

    pub fn theme(&self) -> Theme {
        self.gated.as_ref().map(|g| g.prefs.theme()).unwrap_or_default()
    }

    pub fn compact(&self) -> bool {
        self.gated.as_ref().is_some_and(|g| g.prefs.compact())
    }

    /// Name shown in the header; `None` in classic mode.
    pub fn display_label(&self) -> Option<&str> {
        self.gated.as_ref().map(|g| g.session.display_label())
    }

    /// The text field that receives typed characters, if any.
    pub fn focused_field_mut(&mut self) -> Option<&mut Composer> {
        match self.focus {
            Focus::Composer => Some(&mut self.composer),
            Focus::LoginName => self.gated.as_mut().map(|g| &mut g.session.name_field),
            Focus::SettingsToggle | Focus::Settings => None,
        }
    }

    pub fn set_focus(&mut self, focus: Focus) {
        if self.overlay_visible() && focus != Focus::LoginName {
            return;
        }
        self.focus = focus;
    }

    // Composer

    pub fn set_composer_width(&mut self, width: u16) {
        if self.composer_width != width {
            self.composer_width = width;
            self.on_input();
        }
    }

    /// Refit the composer after its content changed.
    pub fn on_input(&mut self) {
        self.composer.fit_height(self.composer_width);
    }

    pub fn submit(&mut self) -> SubmitOutcome {
        if !self.is_authenticated() {
            return SubmitOutcome::Locked;
        }
        if self.pending.is_some() {
            debug!("submit ignored, reply pending");
            return SubmitOutcome::Busy;
        }
        let text = self.composer.trimmed();
        if text.is_empty() {
            return SubmitOutcome::Blank;
        }

        let safe_text = escape_html(text);
        self.messages
            .push(ChatMessage::render(ChatRole::User, paragraph(&safe_text)));

        self.composer.clear();
        self.focus = Focus::Composer;

        self.messages.show_typing();
        self.next_ticket += 1;
        let delay = self.replies.latency();
        self.pending = Some(PendingReply::schedule(
            delay,
            self.next_ticket,
            self.notify.clone(),
        ));
        SubmitOutcome::Sent
    }

    /// Enter submits in gated mode unless shift is held; in classic mode it
    /// always inserts a newline.
    pub fn on_enter_key(&mut self, shift: bool) -> Option<SubmitOutcome> {
        if self.mode() == ChatMode::Gated && !shift {
            return Some(self.submit());
        }
        self.composer.insert_newline();
        self.on_input();
        None
    }

    /// Returns true if the reply was shown, false if it was stale.
    pub fn deliver_reply(&mut self, ready: ReplyReady) -> bool {
        match &self.pending {
            Some(pending) if pending.ticket() == ready.ticket => {}
            _ => {
                debug!(ticket = ready.ticket, "dropping stale reply");
                return false;
            }
        }
        self.pending = None;
        self.messages.hide_typing();
        let reply = self.replies.choose_reply();
        self.messages
            .push(ChatMessage::render(ChatRole::Assistant, paragraph(reply)));
        true
    }

    fn cancel_pending(&mut self) {
        if let Some(pending) = self.pending.take() {
            pending.cancel();
        }
        self.messages.hide_typing();
    }

    // Settings popover

    pub fn toggle_settings(&mut self) {
        let Some(gated) = self.gated.as_mut() else {
            return;
        };
        if gated.session.modal_open() {
            return;
        }
        gated.settings.toggle();
        self.focus = if gated.settings.is_open() {
            Focus::Settings
        } else {
            Focus::SettingsToggle
        };
    }

    pub fn click(&mut self, target: ClickTarget) {
        if target == ClickTarget::Toggle {
            self.toggle_settings();
            return;
        }
        let Some(gated) = self.gated.as_mut() else {
            return;
        };
        if gated.settings.on_click(target) && self.focus == Focus::Settings {
            self.focus = Focus::Composer;
        }
    }

    /// Returns true if Escape closed the settings popover.
    pub fn escape(&mut self) -> bool {
        let closed = self
            .gated
            .as_mut()
            .is_some_and(|g| g.settings.on_escape());
        if closed {
            self.focus = Focus::SettingsToggle;
        }
        closed
    }

    pub fn settings_next(&mut self) {
        if let Some(gated) = self.gated.as_mut() {
            gated.settings.select_next();
        }
    }

    pub fn settings_prev(&mut self) {
        if let Some(gated) = self.gated.as_mut() {
            gated.settings.select_prev();
        }
    }

    pub fn select_setting(&mut self, idx: usize) {
        if let Some(gated) = self.gated.as_mut() {
            gated.settings.select(idx);
        }
    }

    /// Apply the highlighted settings row.
    pub fn activate_setting(&mut self) {
        let item = self.settings().and_then(SettingsPanel::selected_item);
        match item {
            Some(SettingsItem::Theme(theme)) => {
                self.set_theme(theme.as_str());
            }
            Some(SettingsItem::Compact) => {
                let compact = !self.compact();
                self.set_compact(compact);
            }
            Some(SettingsItem::Logout) => self.logout(),
            None => {}
        }
    }

    pub fn set_theme(&mut self, value: &str) -> Option<Theme> {
        let gated = self.gated.as_mut()?;
        let theme = gated.prefs.set_theme(value);
        debug!(theme = theme.as_str(), "theme applied");
        Some(theme)
    }

    pub fn set_compact(&mut self, compact: bool) {
        if let Some(gated) = self.gated.as_mut() {
            gated.prefs.set_compact(compact);
            debug!(compact, "compact mode applied");
        }
    }

    // Session gate

    /// Submit the login overlay's name field. `None` in classic mode.
    pub fn login(&mut self) -> Option<LoginOutcome> {
        let gated = self.gated.as_mut()?;
        let name = gated.session.name_field.text().to_string();
        let outcome = gated.session.submit_login(&name);
        match &outcome {
            LoginOutcome::Rejected => self.focus = Focus::LoginName,
            LoginOutcome::Accepted(name) => {
                gated.prefs.set_user(Some(name.as_str()));
                gated.settings.close();
                self.focus = Focus::Composer;
            }
        }
        self.sync_gate();
        Some(outcome)
    }

    pub fn logout(&mut self) {
        if !self.is_authenticated() || self.gated.is_none() {
            return;
        }
        // A reply already scheduled still lands in the chat.
        if let Some(gated) = self.gated.as_mut() {
            gated.settings.close();
            gated.prefs.set_user(None);
            gated.session.logout();
        }
        self.sync_gate();
    }

    /// Stop any reply still in flight before the app exits.
    pub fn shutdown(&mut self) {
        self.cancel_pending();
    }

    // The composer is enabled exactly when the user is signed in.
    fn sync_gate(&mut self) {
        let authenticated = self.is_authenticated();
        self.composer.set_enabled(authenticated);
        if !authenticated {
            self.focus = Focus::LoginName;
        } else if self.focus == Focus::LoginName {
            self.focus = Focus::Composer;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::reply::SAMPLE_REPLIES;
    use crate::state::TYPING_DOTS;
    use crate::storage::{MemoryStore, USERNAME_KEY};
    use std::time::Duration;

    fn controller_with(
        mode: ChatMode,
        store: MemoryStore,
    ) -> (ChatController, mpsc::UnboundedReceiver<ReplyReady>) {
        let (tx, rx) = mpsc::unbounded_channel();
        let config = Config {
            mode,
            ..Config::new()
        };
        let controller =
            ChatController::new(&config, Box::new(store), tx).with_replies(ReplySimulator::seeded(9));
        (controller, rx)
    }

    fn signed_in_store() -> MemoryStore {
        let mut store = MemoryStore::new();
        store.set(USERNAME_KEY, "Ada").unwrap();
        store
    }

    fn type_text(controller: &mut ChatController, text: &str) {
        if let Some(field) = controller.focused_field_mut() {
            field.insert_str(text);
        }
        controller.on_input();
    }

    async fn wait_for_reply(
        controller: &mut ChatController,
        rx: &mut mpsc::UnboundedReceiver<ReplyReady>,
    ) {
        tokio::time::advance(Duration::from_millis(1400)).await;
        let ready = rx.recv().await.unwrap();
        assert!(controller.deliver_reply(ready));
    }

    #[tokio::test(flavor = "current_thread", start_paused = true)]
    async fn test_submit_renders_user_then_assistant() {
        let (mut chat, mut rx) = controller_with(ChatMode::Gated, signed_in_store());
        type_text(&mut chat, "hello <b>world</b>");

        assert_eq!(chat.submit(), SubmitOutcome::Sent);
        assert_eq!(chat.messages().len(), 2);
        assert_eq!(chat.messages()[0].role, ChatRole::User);
        assert_eq!(chat.messages()[0].content, "<p>hello &lt;b&gt;world&lt;/b&gt;</p>");
        assert_eq!(chat.messages()[1].content, TYPING_DOTS);
        assert!(chat.is_typing());
        assert_eq!(chat.composer().text(), "");
        assert_eq!(chat.composer().height(), 1);
        assert_eq!(chat.focus(), Focus::Composer);

        wait_for_reply(&mut chat, &mut rx).await;

        assert!(!chat.is_typing());
        assert_eq!(chat.messages().len(), 2);
        let reply = &chat.messages()[1];
        assert_eq!(reply.role, ChatRole::Assistant);
        let text = reply
            .content
            .strip_prefix("<p>")
            .and_then(|s| s.strip_suffix("</p>"))
            .unwrap();
        assert!(SAMPLE_REPLIES.contains(&text));
    }

    #[tokio::test(flavor = "current_thread", start_paused = true)]
    async fn test_reply_not_before_minimum_delay() {
        let (mut chat, mut rx) = controller_with(ChatMode::Classic, MemoryStore::new());
        type_text(&mut chat, "hi");
        chat.submit();

        tokio::task::yield_now().await;
        tokio::time::advance(Duration::from_millis(599)).await;
        tokio::task::yield_now().await;
        assert!(rx.try_recv().is_err());
        assert!(chat.is_typing());
    }

    #[tokio::test(flavor = "current_thread", start_paused = true)]
    async fn test_multiline_input_uses_breaks() {
        let (mut chat, _rx) = controller_with(ChatMode::Classic, MemoryStore::new());
        type_text(&mut chat, "  one\ntwo  ");
        chat.submit();
        assert_eq!(chat.messages()[0].content, "<p>one<br>two</p>");
    }

    #[tokio::test(flavor = "current_thread", start_paused = true)]
    async fn test_blank_submit_is_noop() {
        let (mut chat, _rx) = controller_with(ChatMode::Gated, signed_in_store());
        type_text(&mut chat, "   \n  ");
        assert_eq!(chat.submit(), SubmitOutcome::Blank);
        assert!(chat.messages().is_empty());
        assert!(!chat.reply_pending());
    }

    #[tokio::test(flavor = "current_thread", start_paused = true)]
    async fn test_locked_when_signed_out() {
        let (mut chat, _rx) = controller_with(ChatMode::Gated, MemoryStore::new());
        assert!(!chat.is_authenticated());
        assert!(!chat.composer().is_enabled());
        assert_eq!(chat.focus(), Focus::LoginName);
        assert_eq!(chat.submit(), SubmitOutcome::Locked);
        assert!(chat.messages().is_empty());
    }

    #[tokio::test(flavor = "current_thread", start_paused = true)]
    async fn test_second_submit_waits_for_reply() {
        let (mut chat, mut rx) = controller_with(ChatMode::Gated, signed_in_store());
        type_text(&mut chat, "first");
        assert_eq!(chat.submit(), SubmitOutcome::Sent);

        type_text(&mut chat, "second");
        assert_eq!(chat.submit(), SubmitOutcome::Busy);
        assert_eq!(chat.composer().text(), "second");
        assert_eq!(chat.messages().iter().filter(|m| m.transient).count(), 1);

        wait_for_reply(&mut chat, &mut rx).await;
        assert_eq!(chat.submit(), SubmitOutcome::Sent);
        assert_eq!(chat.messages().len(), 4);
        assert_eq!(chat.messages().iter().filter(|m| m.transient).count(), 1);
    }

    #[tokio::test(flavor = "current_thread", start_paused = true)]
    async fn test_stale_ticket_ignored() {
        let (mut chat, _rx) = controller_with(ChatMode::Classic, MemoryStore::new());
        assert!(!chat.deliver_reply(ReplyReady { ticket: 42 }));
        assert!(chat.messages().is_empty());
    }

    #[tokio::test(flavor = "current_thread", start_paused = true)]
    async fn test_enter_key_by_mode() {
        let (mut gated, _rx) = controller_with(ChatMode::Gated, signed_in_store());
        type_text(&mut gated, "line");
        assert_eq!(gated.on_enter_key(true), None);
        assert_eq!(gated.composer().text(), "line\n");
        assert_eq!(gated.on_enter_key(false), Some(SubmitOutcome::Sent));

        let (mut classic, _rx) = controller_with(ChatMode::Classic, MemoryStore::new());
        type_text(&mut classic, "line");
        assert_eq!(classic.on_enter_key(false), None);
        assert_eq!(classic.composer().text(), "line\n");
        assert!(classic.messages().is_empty());
    }

    #[tokio::test(flavor = "current_thread", start_paused = true)]
    async fn test_composer_height_follows_input() {
        let (mut chat, _rx) = controller_with(ChatMode::Classic, MemoryStore::new());
        chat.set_composer_width(20);
        type_text(&mut chat, "a\nb\nc");
        assert_eq!(chat.composer().height(), 3);
    }

    #[tokio::test(flavor = "current_thread", start_paused = true)]
    async fn test_login_logout_roundtrip() {
        let (mut chat, _rx) = controller_with(ChatMode::Gated, MemoryStore::new());
        assert!(chat.overlay_visible());
        assert_eq!(chat.display_label(), Some("Guest"));

        type_text(&mut chat, "   ");
        assert_eq!(chat.login(), Some(LoginOutcome::Rejected));
        assert_eq!(chat.focus(), Focus::LoginName);
        assert!(chat.overlay_visible());

        if let Some(field) = chat.focused_field_mut() {
            field.clear();
        }
        type_text(&mut chat, "Ada");
        assert_eq!(chat.login(), Some(LoginOutcome::Accepted("Ada".into())));
        assert!(chat.is_authenticated());
        assert!(chat.composer().is_enabled());
        assert!(!chat.overlay_visible());
        assert_eq!(chat.display_label(), Some("Ada"));
        assert_eq!(chat.focus(), Focus::Composer);
        assert_eq!(
            chat.preferences().and_then(|p| p.display_name.as_deref()),
            Some("Ada")
        );

        chat.logout();
        assert!(!chat.is_authenticated());
        assert!(chat.overlay_visible());
        assert!(!chat.composer().is_enabled());
        assert_eq!(chat.focus(), Focus::LoginName);
        assert_eq!(chat.display_label(), Some("Guest"));
    }

    #[tokio::test(flavor = "current_thread", start_paused = true)]
    async fn test_reply_arrives_after_logout() {
        let (mut chat, mut rx) = controller_with(ChatMode::Gated, signed_in_store());
        type_text(&mut chat, "hello");
        assert_eq!(chat.submit(), SubmitOutcome::Sent);
        chat.logout();

        assert!(chat.overlay_visible());
        assert!(chat.is_typing());
        assert!(chat.reply_pending());

        wait_for_reply(&mut chat, &mut rx).await;
        assert!(!chat.is_typing());
        assert!(!chat.reply_pending());
        let assistant = chat
            .messages()
            .iter()
            .filter(|m| m.role == ChatRole::Assistant)
            .count();
        assert_eq!(assistant, 1);
        assert!(!chat.composer().is_enabled());
        assert_eq!(chat.focus(), Focus::LoginName);
    }

    #[tokio::test(flavor = "current_thread", start_paused = true)]
    async fn test_settings_dismissal() {
        let (mut chat, _rx) = controller_with(ChatMode::Gated, signed_in_store());

        chat.click(ClickTarget::Toggle);
        assert!(chat.settings_open());
        assert_eq!(chat.focus(), Focus::Settings);
        chat.click(ClickTarget::Panel);
        assert!(chat.settings_open());
        chat.click(ClickTarget::Outside);
        assert!(!chat.settings_open());

        chat.toggle_settings();
        assert!(chat.escape());
        assert!(!chat.settings_open());
        assert_eq!(chat.focus(), Focus::SettingsToggle);
        assert!(!chat.escape());
    }

    #[tokio::test(flavor = "current_thread", start_paused = true)]
    async fn test_settings_close_on_logout_and_login() {
        let (mut chat, _rx) = controller_with(ChatMode::Gated, signed_in_store());
        chat.toggle_settings();
        chat.logout();
        assert!(!chat.settings_open());

        // Overlay is modal: the toggle does nothing while signed out.
        chat.toggle_settings();
        assert!(!chat.settings_open());

        type_text(&mut chat, "Grace");
        chat.login();
        assert!(!chat.settings_open());
        assert_eq!(chat.focus(), Focus::Composer);
    }

    #[tokio::test(flavor = "current_thread", start_paused = true)]
    async fn test_settings_rows_apply_preferences() {
        let (mut chat, _rx) = controller_with(ChatMode::Gated, signed_in_store());
        chat.toggle_settings();

        chat.select_setting(1);
        chat.activate_setting();
        assert_eq!(chat.theme(), Theme::Midnight);

        chat.settings_next();
        chat.activate_setting();
        assert!(chat.compact());

        chat.settings_prev();
        chat.settings_prev();
        chat.activate_setting();
        assert_eq!(chat.theme(), Theme::Glow);

        chat.select_setting(3);
        chat.activate_setting();
        assert!(!chat.is_authenticated());
        assert!(!chat.settings_open());
    }

    #[tokio::test(flavor = "current_thread", start_paused = true)]
    async fn test_classic_mode_has_no_gate() {
        let (mut chat, _rx) = controller_with(ChatMode::Classic, MemoryStore::new());
        assert!(chat.is_authenticated());
        assert!(!chat.overlay_visible());
        assert_eq!(chat.display_label(), None);
        assert_eq!(chat.login(), None);
        assert_eq!(chat.set_theme("midnight"), None);
        chat.toggle_settings();
        assert!(!chat.settings_open());
    }

    #[tokio::test(flavor = "current_thread", start_paused = true)]
    async fn test_shutdown_cancels() {
        let (mut chat, _rx) = controller_with(ChatMode::Classic, MemoryStore::new());
        type_text(&mut chat, "bye");
        chat.submit();
        chat.shutdown();
        assert!(!chat.reply_pending());
        assert!(!chat.is_typing());
    }
}
