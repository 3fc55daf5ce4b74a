pub mod config;
pub mod relay;
pub mod room;
pub mod session;
pub mod signaling;

pub use config::RelayConfig;
pub use relay::{RelayService, RelayStats, spawn_sweeper};
pub use room::{LeaveOutcome, Room, RoomDirectory};
pub use session::{Session, SessionRegistry};
pub use signaling::{router, ws_handler};
