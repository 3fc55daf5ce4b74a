mod mock_signaling;

pub use harness::*;
pub use mock_signaling::*;
pub use mock_transport::*;
pub use recording_observer::*;
