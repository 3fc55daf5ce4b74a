mod relay_service;
mod sweeper;

pub use relay_service::*;
pub use sweeper::*;
