//! DNS Cookies (RFC 7873) with the interoperable server cookie of RFC 9018.

use redzone_domain::config::CookieConfig;
use redzone_domain::DomainError;
use ring::rand::{SecureRandom, SystemRandom};
use siphasher::sip::SipHasher24;
use std::hash::Hasher;
use std::net::IpAddr;

pub const CLIENT_COOKIE_LEN: usize = 8;
const SERVER_COOKIE_LEN: usize = 16;
const MIN_FULL_COOKIE_LEN: usize = 16;
const MAX_FULL_COOKIE_LEN: usize = 40;
const COOKIE_VERSION: u8 = 1;

/// Oldest accepted server cookie, in seconds.
const MAX_AGE: u32 = 3600;
/// Tolerated clock skew into the future, in seconds.
const MAX_SKEW: u32 = 300;
/// Age after which a valid server cookie is replaced.
const REISSUE_AGE: u32 = 1800;

/// Outcome of checking the cookie option of a request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CookieStatus {
    Absent,
    /// Length outside RFC 7873 bounds; answered with FORMERR
    Malformed,
    /// Client cookie without a server cookie
    ClientOnly { client: [u8; CLIENT_COOKIE_LEN] },
    Valid {
        client: [u8; CLIENT_COOKIE_LEN],
        server: [u8; SERVER_COOKIE_LEN],
        timestamp: u32,
    },
    /// Server cookie not ours or out of its window; answered with BADCOOKIE
    Invalid { client: [u8; CLIENT_COOKIE_LEN] },
}

impl CookieStatus {
    pub fn is_bad(&self) -> bool {
        matches!(self, Self::Invalid { .. })
    }

    fn client(&self) -> Option<&[u8; CLIENT_COOKIE_LEN]> {
        match self {
            Self::ClientOnly { client } | Self::Valid { client, .. } | Self::Invalid { client } => {
                Some(client)
            }
            Self::Absent | Self::Malformed => None,
        }
    }
}

pub struct CookieVerifier {
    secret: [u8; 16],
}

impl CookieVerifier {
    pub fn new(config: &CookieConfig) -> Result<Self, DomainError> {
        let mut secret = [0u8; 16];
        match &config.secret {
            Some(hex_secret) => {
                let bytes = hex::decode(hex_secret)
                    .map_err(|e| DomainError::IoError(format!("Invalid cookie secret: {e}")))?;
                if bytes.len() != secret.len() {
                    return Err(DomainError::IoError(
                        "Cookie secret must be 16 bytes".to_string(),
                    ));
                }
                secret.copy_from_slice(&bytes);
            }
            None => SystemRandom::new()
                .fill(&mut secret)
                .map_err(|_| DomainError::IoError("Failed to generate cookie secret".to_string()))?,
        }
        Ok(Self { secret })
    }

    pub fn with_secret(secret: [u8; 16]) -> Self {
        Self { secret }
    }

    pub fn check(&self, option: Option<&[u8]>, client_ip: IpAddr, now: u32) -> CookieStatus {
        let Some(cookie) = option else {
            return CookieStatus::Absent;
        };

        let mut client = [0u8; CLIENT_COOKIE_LEN];
        if cookie.len() == CLIENT_COOKIE_LEN {
            client.copy_from_slice(cookie);
            return CookieStatus::ClientOnly { client };
        }
        if !(MIN_FULL_COOKIE_LEN..=MAX_FULL_COOKIE_LEN).contains(&cookie.len()) {
            return CookieStatus::Malformed;
        }
        client.copy_from_slice(&cookie[..CLIENT_COOKIE_LEN]);

        let received = &cookie[CLIENT_COOKIE_LEN..];
        if received.len() != SERVER_COOKIE_LEN || received[0] != COOKIE_VERSION {
            return CookieStatus::Invalid { client };
        }

        let timestamp = u32::from_be_bytes([received[4], received[5], received[6], received[7]]);
        let in_window =
            timestamp >= now.saturating_sub(MAX_AGE) && timestamp <= now.saturating_add(MAX_SKEW);
        let expected = self.server_cookie(&client, client_ip, timestamp);
        if !in_window || expected[..] != received[..] {
            return CookieStatus::Invalid { client };
        }

        CookieStatus::Valid {
            client,
            server: expected,
            timestamp,
        }
    }

    /// Cookie option payload for the response: the client cookie followed
    /// by a server cookie, reused while young and minted fresh otherwise.
    pub fn response_cookie(
        &self,
        status: &CookieStatus,
        client_ip: IpAddr,
        now: u32,
    ) -> Option<Vec<u8>> {
        let client = status.client()?;
        let server = match status {
            CookieStatus::Valid {
                server, timestamp, ..
            } if now.saturating_sub(*timestamp) <= REISSUE_AGE => *server,
            _ => self.server_cookie(client, client_ip, now),
        };

        let mut cookie = Vec::with_capacity(CLIENT_COOKIE_LEN + SERVER_COOKIE_LEN);
        cookie.extend_from_slice(client);
        cookie.extend_from_slice(&server);
        Some(cookie)
    }

    fn server_cookie(
        &self,
        client: &[u8; CLIENT_COOKIE_LEN],
        client_ip: IpAddr,
        timestamp: u32,
    ) -> [u8; SERVER_COOKIE_LEN] {
        let mut server = [0u8; SERVER_COOKIE_LEN];
        server[0] = COOKIE_VERSION;
        server[4..8].copy_from_slice(&timestamp.to_be_bytes());

        let mut hasher = SipHasher24::new_with_key(&self.secret);
        hasher.write(client);
        hasher.write(&server[..8]);
        match client_ip {
            IpAddr::V4(ip) => hasher.write(&ip.octets()),
            IpAddr::V6(ip) => hasher.write(&ip.octets()),
        }
        server[8..].copy_from_slice(&hasher.finish().to_be_bytes());
        server
    }
}
