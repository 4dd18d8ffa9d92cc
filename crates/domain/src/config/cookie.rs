use serde::{Deserialize, Serialize};

/// DNS Cookies (RFC 7873)
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
pub struct CookieConfig {
    #[serde(default)]
    pub enabled: bool,

    /// 128-bit SipHash key as 32 hex characters. A random key is generated
    /// when omitted, which invalidates issued cookies on restart.
    #[serde(default)]
    pub secret: Option<String>,
}
