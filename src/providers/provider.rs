pub trait OAuthProvider: Send + Sync {
    fn id(&self) -> &'static str;
    fn authorize_url(&self) -> &'static str;
    fn token_url(&self) -> &'static str;
    fn refresh_url(&self) -> &'static str;
    fn userinfo_url(&self) -> &'static str;
    fn default_scope(&self) -> &'static str;

    fn response_type(&self) -> &'static str {
        "code"
    }

    /// Fragment appended to the authorization URL, if the provider wants one.
    fn authorize_fragment(&self) -> Option<&'static str> {
        None
    }
}
