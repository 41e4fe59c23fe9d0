mod provider;
mod wechat;

pub use provider::OAuthProvider;
pub use wechat::WeChatProvider;
