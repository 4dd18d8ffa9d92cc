#[path = "../common/mod.rs"]
mod common;

mod resolution_flow;
mod transport_flow;
