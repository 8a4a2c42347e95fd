pub mod composer;
pub mod config;
pub mod controller;
pub mod escape;
pub mod preferences;
pub mod reply;
pub mod session;
pub mod settings;
pub mod state;
pub mod storage;

// Re-export main types for convenience
pub use composer::{Composer, MAX_INPUT_HEIGHT};
pub use config::{ChatMode, Config, ConfigError};
pub use controller::{ChatController, Focus, SubmitOutcome};
pub use escape::{escape_html, paragraph, unescape_html};
pub use preferences::{Preferences, PreferencesStore, Theme};
pub use reply::{PendingReply, ReplyReady, ReplySimulator, SAMPLE_REPLIES};
pub use session::{LoginOutcome, SessionGate, SessionState, GUEST_LABEL};
pub use settings::{ClickTarget, SettingsItem, SettingsPanel};
pub use state::{ChatMessage, ChatRole, MessageList, TYPING_DOTS};
pub use storage::{FileStore, KeyValueStore, MemoryStore, StoreError};
