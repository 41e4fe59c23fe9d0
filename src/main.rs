use std::path::PathBuf;

use clap::{Parser, Subcommand};
use serde::Serialize;
use tracing_subscriber::EnvFilter;
use wechat_connect::{
    AuthorizationResponse, CancellationToken, ConfigField, FileStore, LoginConsole, LoginError,
    Preferences, TracingNotifier, WeChatProvider, endpoints,
};

#[derive(Debug, Parser)]
#[command(
    name = "wechat-connect",
    about = "Build WeChat QR-connect authorization URLs and run a mocked login."
)]
struct Cli {
    /// Directory holding the saved config and settings.
    #[arg(long, env = "WECHAT_CONNECT_STORE", default_value = ".wechat-connect")]
    store: PathBuf,

    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Print the saved config and settings.
    Show,
    /// Set one connection field (appId, appSecret, redirectUri, state).
    Set { field: ConfigField, value: String },
    /// Forget the saved connection config.
    Clear,
    /// Update settings.
    Prefs {
        #[arg(long)]
        theme_color: Option<String>,
        #[arg(long)]
        auto_save: Option<bool>,
    },
    /// Print the authorization URL.
    AuthUrl {
        /// Also open it in the default browser.
        #[arg(long)]
        open: bool,
    },
    /// Run the mocked login and print the resulting profile.
    Simulate,
    /// Extract code and state from a callback URL.
    Callback { url: String },
    /// Print the token and profile endpoint URLs a real exchange would call.
    ExchangeUrls {
        code: String,
        #[arg(long, default_value = "ACCESS_TOKEN")]
        access_token: String,
        #[arg(long, default_value = "OPENID")]
        openid: String,
        #[arg(long, default_value = "REFRESH_TOKEN")]
        refresh_token: String,
    },
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct Snapshot<'a> {
    app_id: &'a str,
    app_secret: &'a str,
    redirect_uri: &'a str,
    state: &'a str,
    preferences: &'a Preferences,
}

#[tokio::main]
async fn main() -> Result<(), LoginError> {
    init_logging();

    let cli = Cli::parse();
    let mut console = LoginConsole::open(FileStore::new(&cli.store), TracingNotifier);
    tracing::debug!(store = %cli.store.display(), "opened store");

    match cli.command {
        Command::Show => {
            let config = console.config();
            let snapshot = Snapshot {
                app_id: &config.app_id,
                app_secret: if config.app_secret.is_empty() { "" } else { "********" },
                redirect_uri: &config.redirect_uri,
                state: &config.state,
                preferences: console.preferences(),
            };
            print_json(&snapshot)?;
        }
        Command::Set { field, value } => {
            console.set_field(field, value)?;
            if !console.preferences().auto_save {
                console.save_config()?;
            }
        }
        Command::Clear => console.clear_config()?,
        Command::Prefs {
            theme_color,
            auto_save,
        } => {
            let mut preferences = console.preferences().clone();
            if let Some(theme_color) = theme_color {
                preferences.theme_color = theme_color;
            }
            if let Some(auto_save) = auto_save {
                preferences.auto_save = auto_save;
            }
            console.save_preferences(preferences)?;
        }
        Command::AuthUrl { open } => {
            let request = console.authorization_url()?;
            println!("{}", request.authorization_url);
            if open {
                if let Err(err) = webbrowser::open(&request.authorization_url) {
                    eprintln!("Failed to open browser automatically: {err}");
                }
            }
        }
        Command::Simulate => {
            let cancel = CancellationToken::new();
            let on_interrupt = cancel.clone();
            tokio::spawn(async move {
                if tokio::signal::ctrl_c().await.is_ok() {
                    on_interrupt.cancel();
                }
            });

            let profile = console.simulate(&cancel).await?;
            print_json(&profile)?;
        }
        Command::Callback { url } => {
            let response = AuthorizationResponse::from_url(&url)?;
            println!("code={}", response.code);
            if let Some(state) = response.state {
                println!("state={state}");
            }
        }
        Command::ExchangeUrls {
            code,
            access_token,
            openid,
            refresh_token,
        } => {
            let config = console.config();
            config.validate()?;
            let provider = WeChatProvider;
            println!(
                "{}",
                endpoints::access_token_url(&provider, &config.app_id, &config.app_secret, &code)?
            );
            println!(
                "{}",
                endpoints::userinfo_url(&provider, &access_token, &openid)?
            );
            println!(
                "{}",
                endpoints::refresh_token_url(&provider, &config.app_id, &refresh_token)?
            );
        }
    }

    Ok(())
}

fn print_json<T: Serialize>(value: &T) -> Result<(), LoginError> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

fn init_logging() {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("wechat_connect=info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();
}
