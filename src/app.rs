use purpleglass_core::{ChatController, Config, KeyValueStore, ReplyReady};
use ratatui::layout::Rect;
use tokio::sync::mpsc;

pub struct App {
    // Core state
    pub should_quit: bool,
    pub chat: ChatController,

    // Animation state
    pub animation_frame: u8, // 0-2 for the typing dots

    // Chat scrolling. `chat_scroll` eases toward `scroll_target` on ticks.
    pub chat_scroll: u16,
    pub scroll_target: u16,
    pub follow_bottom: bool,
    pub chat_height: u16,
    pub total_chat_lines: u16,

    // Areas for mouse hit-testing (updated during render)
    pub chat_area: Option<Rect>,
    pub composer_area: Option<Rect>,
    pub send_area: Option<Rect>,
    pub toggle_area: Option<Rect>,
    pub settings_area: Option<Rect>,
    pub overlay_area: Option<Rect>,
}

impl App {
    pub fn new(
        config: &Config,
        store: Box<dyn KeyValueStore>,
        notify: mpsc::UnboundedSender<ReplyReady>,
    ) -> Self {
        Self::with_controller(ChatController::new(config, store, notify))
    }

    pub fn with_controller(chat: ChatController) -> Self {
        Self {
            should_quit: false,
            chat,

            animation_frame: 0,

            chat_scroll: 0,
            scroll_target: 0,
            follow_bottom: true,
            chat_height: 0,
            total_chat_lines: 0,

            chat_area: None,
            composer_area: None,
            send_area: None,
            toggle_area: None,
            settings_area: None,
            overlay_area: None,
        }
    }

    /// Tick animation frame and ease the chat toward its scroll target
    pub fn tick(&mut self) {
        if self.chat.is_typing() {
            self.animation_frame = (self.animation_frame + 1) % 3;
        }

        if self.chat_scroll < self.scroll_target {
            let step = ((self.scroll_target - self.chat_scroll) / 2).max(1);
            self.chat_scroll += step;
        } else if self.chat_scroll > self.scroll_target {
            let step = ((self.chat_scroll - self.scroll_target) / 2).max(1);
            self.chat_scroll -= step;
        }
    }

    /// Pick up scroll-to-bottom requests raised by new messages.
    pub fn sync_scroll(&mut self) {
        if self.chat.take_scroll_request() {
            self.follow_bottom = true;
        }
    }

    pub fn max_scroll(&self) -> u16 {
        self.total_chat_lines.saturating_sub(self.chat_height)
    }

    /// Called by the renderer once it knows how tall the conversation is.
    pub fn update_chat_metrics(&mut self, total_lines: u16, height: u16) {
        self.total_chat_lines = total_lines;
        self.chat_height = height;
        if self.follow_bottom {
            self.scroll_target = self.max_scroll();
        }
        self.scroll_target = self.scroll_target.min(self.max_scroll());
        self.chat_scroll = self.chat_scroll.min(self.max_scroll());
    }

    pub fn scroll_up(&mut self, lines: u16) {
        self.follow_bottom = false;
        self.scroll_target = self.scroll_target.saturating_sub(lines);
        self.chat_scroll = self.scroll_target;
    }

    pub fn scroll_down(&mut self, lines: u16) {
        self.scroll_target = (self.scroll_target + lines).min(self.max_scroll());
        self.chat_scroll = self.scroll_target;
        self.follow_bottom = self.scroll_target >= self.max_scroll();
    }

    pub fn quit(&mut self) {
        self.chat.shutdown();
        self.should_quit = true;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use purpleglass_core::{ChatMode, MemoryStore};

    fn classic_app() -> App {
        let (tx, _rx) = mpsc::unbounded_channel();
        let config = Config {
            mode: ChatMode::Classic,
            ..Config::new()
        };
        App::new(&config, Box::new(MemoryStore::new()), tx)
    }

    #[test]
    fn test_tick_eases_toward_target() {
        let mut app = classic_app();
        app.update_chat_metrics(40, 10);
        assert_eq!(app.scroll_target, 30);

        app.tick();
        assert_eq!(app.chat_scroll, 15);
        for _ in 0..10 {
            app.tick();
        }
        assert_eq!(app.chat_scroll, 30);
    }

    #[test]
    fn test_manual_scroll_stops_following() {
        let mut app = classic_app();
        app.update_chat_metrics(40, 10);
        app.scroll_up(5);
        assert!(!app.follow_bottom);
        assert_eq!(app.chat_scroll, 25);

        app.update_chat_metrics(50, 10);
        assert_eq!(app.scroll_target, 25);

        app.scroll_down(100);
        assert!(app.follow_bottom);
        assert_eq!(app.chat_scroll, 40);
    }

    #[test]
    fn test_metrics_clamp_scroll() {
        let mut app = classic_app();
        app.update_chat_metrics(5, 10);
        assert_eq!(app.max_scroll(), 0);
        assert_eq!(app.scroll_target, 0);
    }
}
