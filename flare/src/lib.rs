pub use flare_core::model::{ConnectionId, RoomId, UserId};

pub mod model {
    pub use flare_core::model::*;
}

pub mod error {
    pub use flare_core::error::SignalError;
}

#[cfg(feature = "server")]
pub mod server {
    pub use flare_server::*;
}

#[cfg(feature = "client")]
pub mod client {
    pub use flare_client::*;
}
