pub mod cookie;
pub mod ecs;

pub use cookie::{CookieStatus, CookieVerifier};
pub use ecs::{client_subnet, echo_subnet, steering_source, Subnet};

use hickory_proto::op::Edns;
use hickory_proto::rr::rdata::opt::{EdnsCode, EdnsOption};

/// Raw payload of the cookie option of a request.
pub fn cookie_option(edns: &Edns) -> Option<&[u8]> {
    match edns.option(EdnsCode::Cookie) {
        Some(EdnsOption::Unknown(_, bytes)) => Some(bytes.as_slice()),
        _ => None,
    }
}

pub fn cookie_reply(cookie: Vec<u8>) -> EdnsOption {
    EdnsOption::Unknown(u16::from(EdnsCode::Cookie), cookie)
}
