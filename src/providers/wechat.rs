use crate::OAuthProvider;

// References:
// - https://developers.weixin.qq.com/doc/oplatform/Website_App/WeChat_Login/Wechat_Login.html

const AUTHORIZE_URL: &str = "https://open.weixin.qq.com/connect/qrconnect";
const TOKEN_URL: &str = "https://api.weixin.qq.com/sns/oauth2/access_token";
const REFRESH_URL: &str = "https://api.weixin.qq.com/sns/oauth2/refresh_token";
const USERINFO_URL: &str = "https://api.weixin.qq.com/sns/userinfo";

const DEFAULT_SCOPE: &str = "snsapi_login";
const AUTHORIZE_FRAGMENT: &str = "wechat_redirect";

#[derive(Debug, Clone, Copy, Default)]
pub struct WeChatProvider;

impl OAuthProvider for WeChatProvider {
    fn id(&self) -> &'static str {
        "wechat"
    }

    fn authorize_url(&self) -> &'static str {
        AUTHORIZE_URL
    }

    fn token_url(&self) -> &'static str {
        TOKEN_URL
    }

    fn refresh_url(&self) -> &'static str {
        REFRESH_URL
    }

    fn userinfo_url(&self) -> &'static str {
        USERINFO_URL
    }

    fn default_scope(&self) -> &'static str {
        DEFAULT_SCOPE
    }

    fn authorize_fragment(&self) -> Option<&'static str> {
        Some(AUTHORIZE_FRAGMENT)
    }
}
