mod channel;
mod ws_channel;

pub use channel::*;
pub use ws_channel::*;
