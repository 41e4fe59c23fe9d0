use url::Url;

use crate::token::generate_state;
use crate::{AuthorizationRequest, LoginError, OAuthProvider, WeChatProvider};

/// Builds the QR-connect authorization URL a user is sent to.
#[derive(Debug, Clone, Default)]
pub struct AuthorizationUrlBuilder<P: OAuthProvider = WeChatProvider> {
    provider: P,
}

impl AuthorizationUrlBuilder<WeChatProvider> {
    pub fn new() -> Self {
        Self::with_provider(WeChatProvider)
    }
}

impl<P: OAuthProvider> AuthorizationUrlBuilder<P> {
    pub fn with_provider(provider: P) -> Self {
        Self { provider }
    }

    pub fn provider(&self) -> &P {
        &self.provider
    }

    /// Inputs are trimmed; a blank `state` is replaced with a generated one.
    ///
    /// The supplied `state` is passed through untouched. Nothing ever checks
    /// it against the callback, so it offers no CSRF protection here.
    pub fn build(
        &self,
        app_id: &str,
        redirect_uri: &str,
        state: Option<&str>,
    ) -> Result<AuthorizationRequest, LoginError> {
        let app_id = app_id.trim();
        let redirect_uri = redirect_uri.trim();

        let mut missing = Vec::new();
        if app_id.is_empty() {
            missing.push("appId");
        }
        if redirect_uri.is_empty() {
            missing.push("redirectUri");
        }
        if !missing.is_empty() {
            return Err(LoginError::missing(missing));
        }

        let state = match state.map(str::trim) {
            Some(state) if !state.is_empty() => state.to_string(),
            _ => generate_state(),
        };
        let scope = self.provider.default_scope();
        let response_type = self.provider.response_type();

        // WeChat rejects requests whose parameters are out of this order.
        let mut url = Url::parse(self.provider.authorize_url())?;
        url.query_pairs_mut()
            .append_pair("appid", app_id)
            .append_pair("redirect_uri", redirect_uri)
            .append_pair("response_type", response_type)
            .append_pair("scope", scope)
            .append_pair("state", &state);
        url.set_fragment(self.provider.authorize_fragment());

        tracing::debug!(provider = self.provider.id(), app_id, "built authorization url");

        Ok(AuthorizationRequest {
            authorization_url: url.to_string(),
            app_id: app_id.to_string(),
            redirect_uri: redirect_uri.to_string(),
            state,
            response_type: response_type.to_string(),
            scope: scope.to_string(),
        })
    }
}
