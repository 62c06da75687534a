//! Auth Module
//!
//! Loads Google OAuth2 client configuration and tokens from JSON files and
//! refreshes expired access tokens.

mod oauth2;

pub use oauth2::{
    FileConfigProvider, FileTokenProvider, OAuth2Config, OAuth2ConfigProvider, OAuth2Token,
    OAuth2TokenProvider, RefreshingTokenProvider,
};
