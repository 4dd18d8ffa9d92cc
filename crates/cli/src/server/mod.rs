pub mod dns;

pub use dns::run;
