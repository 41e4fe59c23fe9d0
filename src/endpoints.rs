//! Call shapes of the real WeChat token and profile endpoints.
//!
//! The mocked flow never calls these. They are kept so a future real
//! integration has the exact request URLs and response bodies to work from.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};
use url::Url;

use crate::{LoginError, OAuthProvider};

const USERINFO_LANG: &str = "zh_CN";

pub fn access_token_url<P: OAuthProvider + ?Sized>(
    provider: &P,
    app_id: &str,
    app_secret: &str,
    code: &str,
) -> Result<Url, LoginError> {
    endpoint(
        provider.token_url(),
        &[
            ("appid", app_id),
            ("secret", app_secret),
            ("code", code),
            ("grant_type", "authorization_code"),
        ],
    )
}

pub fn refresh_token_url<P: OAuthProvider + ?Sized>(
    provider: &P,
    app_id: &str,
    refresh_token: &str,
) -> Result<Url, LoginError> {
    endpoint(
        provider.refresh_url(),
        &[
            ("appid", app_id),
            ("grant_type", "refresh_token"),
            ("refresh_token", refresh_token),
        ],
    )
}

pub fn userinfo_url<P: OAuthProvider + ?Sized>(
    provider: &P,
    access_token: &str,
    open_id: &str,
) -> Result<Url, LoginError> {
    endpoint(
        provider.userinfo_url(),
        &[
            ("access_token", access_token),
            ("openid", open_id),
            ("lang", USERINFO_LANG),
        ],
    )
}

fn endpoint(base: &str, params: &[(&str, &str)]) -> Result<Url, LoginError> {
    let mut url = Url::parse(base)?;
    url.query_pairs_mut().extend_pairs(params);
    Ok(url)
}

/// Body of a successful `access_token` or `refresh_token` response.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AccessTokenResponse {
    pub access_token: String,
    pub expires_in: u64,
    pub refresh_token: String,
    pub openid: String,
    pub scope: String,
    pub unionid: Option<String>,
    #[serde(flatten)]
    pub extra: HashMap<String, serde_json::Value>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UserInfoResponse {
    pub openid: String,
    pub nickname: String,
    /// 1 for male, 2 for female, 0 when unknown.
    pub sex: u8,
    pub province: String,
    pub city: String,
    pub country: String,
    pub headimgurl: String,
    #[serde(default)]
    pub privilege: Vec<String>,
    pub unionid: Option<String>,
}

/// Every WeChat endpoint answers failures with HTTP 200 and this body.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiErrorResponse {
    pub errcode: i64,
    pub errmsg: String,
}
