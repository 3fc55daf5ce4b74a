mod http_api;
mod ws_handler;

pub use http_api::*;
pub use ws_handler::*;
