//! WeChat QR-connect login harness.
//!
//! Builds the authorization URL, persists the connection form and user
//! preferences, and runs a mocked code -> token -> profile exchange with
//! timed stages. Nothing here talks to WeChat: the token and profile
//! endpoints exist only as URL builders in [`endpoints`].

mod authorize;
mod console;
pub mod endpoints;
mod error;
mod notify;
mod providers;
mod simulator;
mod store;
mod token;
mod types;

pub use authorize::AuthorizationUrlBuilder;
pub use console::LoginConsole;
pub use error::LoginError;
pub use notify::{Notifier, Severity, TracingNotifier};
pub use providers::{OAuthProvider, WeChatProvider};
pub use simulator::{LoginSimulator, SimulationRun, SimulatorConfig, Stage, StageEvent};
pub use store::{
    CONFIG_KEY, ConfigStore, FileStore, KeyValueStore, MemoryStore, PREFERENCES_KEY, StoredState,
};
pub use token::generate_state;
pub use tokio_util::sync::CancellationToken;
pub use types::{
    AuthorizationRequest, AuthorizationResponse, ConfigField, ConnectionConfig, Gender,
    MockUserProfile, Preferences,
};
