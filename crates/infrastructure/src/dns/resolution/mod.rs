pub mod context;
pub mod engine;

pub use context::{RequestContext, Resolution};
pub use engine::ResolutionEngine;

use redzone_domain::DomainError;
use thiserror::Error;

#[derive(Error, Debug, Clone)]
pub enum ResolveError {
    #[error("Alias chain for {qname} exceeded {hops} hops")]
    LoopBudgetExceeded { qname: String, hops: usize },

    #[error(transparent)]
    Data(#[from] DomainError),
}
