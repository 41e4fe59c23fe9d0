use std::fmt;
use std::str::FromStr;

use rand::Rng;
use serde::{Deserialize, Serialize};
use url::Url;

use crate::LoginError;

const DEFAULT_THEME_COLOR: &str = "green";

const MOCK_OPEN_ID: &str = "o6_bmjrPTlm6_2sgVt7hMZOPfL2M";
const MOCK_NICKNAME_PREFIX: &str = "WeChatUser_";
const MOCK_AVATAR_BASE: &str = "https://picsum.photos/100/100?random=";
const MOCK_COUNTRY: &str = "China";
const MOCK_PROVINCE: &str = "Guangdong";

/// Connection form as persisted under the config key. Blank means unset.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct ConnectionConfig {
    pub app_id: String,
    pub app_secret: String,
    pub redirect_uri: String,
    pub state: String,
}

impl ConnectionConfig {
    pub fn new(app_id: impl Into<String>, redirect_uri: impl Into<String>) -> Self {
        Self {
            app_id: app_id.into(),
            redirect_uri: redirect_uri.into(),
            ..Self::default()
        }
    }

    pub fn with_app_secret(mut self, app_secret: impl Into<String>) -> Self {
        self.app_secret = app_secret.into();
        self
    }

    pub fn with_state(mut self, state: impl Into<String>) -> Self {
        self.state = state.into();
        self
    }

    pub fn get(&self, field: ConfigField) -> &str {
        match field {
            ConfigField::AppId => &self.app_id,
            ConfigField::AppSecret => &self.app_secret,
            ConfigField::RedirectUri => &self.redirect_uri,
            ConfigField::State => &self.state,
        }
    }

    pub fn set(&mut self, field: ConfigField, value: impl Into<String>) {
        let slot = match field {
            ConfigField::AppId => &mut self.app_id,
            ConfigField::AppSecret => &mut self.app_secret,
            ConfigField::RedirectUri => &mut self.redirect_uri,
            ConfigField::State => &mut self.state,
        };
        *slot = value.into();
    }

    /// Checks that everything a real exchange would need is present.
    pub fn validate(&self) -> Result<(), LoginError> {
        let missing: Vec<&'static str> = [
            ConfigField::AppId,
            ConfigField::AppSecret,
            ConfigField::RedirectUri,
        ]
        .into_iter()
        .filter(|field| self.get(*field).trim().is_empty())
        .map(ConfigField::name)
        .collect();

        if missing.is_empty() {
            Ok(())
        } else {
            Err(LoginError::missing(missing))
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ConfigField {
    AppId,
    AppSecret,
    RedirectUri,
    State,
}

impl ConfigField {
    pub const ALL: [ConfigField; 4] = [
        ConfigField::AppId,
        ConfigField::AppSecret,
        ConfigField::RedirectUri,
        ConfigField::State,
    ];

    pub fn name(self) -> &'static str {
        match self {
            ConfigField::AppId => "appId",
            ConfigField::AppSecret => "appSecret",
            ConfigField::RedirectUri => "redirectUri",
            ConfigField::State => "state",
        }
    }
}

impl fmt::Display for ConfigField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for ConfigField {
    type Err = String;

    // Accepts `appId`, `app-id` and `app_id` alike.
    fn from_str(value: &str) -> Result<Self, Self::Err> {
        let normalized: String = value
            .chars()
            .filter(|c| *c != '-' && *c != '_')
            .collect::<String>()
            .to_ascii_lowercase();
        ConfigField::ALL
            .into_iter()
            .find(|field| field.name().to_ascii_lowercase() == normalized)
            .ok_or_else(|| format!("unknown config field: {value}"))
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct Preferences {
    pub theme_color: String,
    pub auto_save: bool,
}

impl Default for Preferences {
    fn default() -> Self {
        Self {
            theme_color: DEFAULT_THEME_COLOR.to_string(),
            auto_save: false,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AuthorizationRequest {
    pub authorization_url: String,
    pub app_id: String,
    pub redirect_uri: String,
    pub state: String,
    pub response_type: String,
    pub scope: String,
}

#[derive(Debug, Clone)]
pub struct AuthorizationResponse {
    pub code: String,
    pub state: Option<String>,
}

impl AuthorizationResponse {
    pub fn from_url(callback_url: &str) -> Result<Self, LoginError> {
        let url = Url::parse(callback_url)?;
        let mut code = None;
        let mut state = None;

        for (key, value) in url.query_pairs() {
            match key.as_ref() {
                "code" => code = Some(value.to_string()),
                "state" => state = Some(value.to_string()),
                _ => {}
            }
        }

        let code = code
            .filter(|code| !code.is_empty())
            .ok_or(LoginError::MissingAuthorizationCode)?;
        Ok(Self { code, state })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Gender {
    Male,
    Female,
}

impl fmt::Display for Gender {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Gender::Male => f.write_str("male"),
            Gender::Female => f.write_str("female"),
        }
    }
}

/// Synthetic profile handed out at the end of a simulated login.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MockUserProfile {
    pub open_id: String,
    pub nickname: String,
    pub avatar_url: String,
    pub gender: Gender,
    pub country: String,
    pub province: String,
}

impl MockUserProfile {
    pub fn generate<R: Rng + ?Sized>(rng: &mut R) -> Self {
        let suffix: u32 = rng.random_range(0..10_000);
        let avatar_seed: f64 = rng.random();
        let gender = if rng.random_bool(0.5) {
            Gender::Male
        } else {
            Gender::Female
        };

        Self {
            open_id: MOCK_OPEN_ID.to_string(),
            nickname: format!("{MOCK_NICKNAME_PREFIX}{suffix}"),
            avatar_url: format!("{MOCK_AVATAR_BASE}{avatar_seed}"),
            gender,
            country: MOCK_COUNTRY.to_string(),
            province: MOCK_PROVINCE.to_string(),
        }
    }
}
