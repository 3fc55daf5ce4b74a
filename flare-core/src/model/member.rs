use crate::model::ids::{ConnectionId, UserId};
use serde::{Deserialize, Serialize};

/// One entry of a room's member list, as reported in `joined` and
/// `room:update` events.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct MemberInfo {
    pub connection_id: ConnectionId,
    pub user_id: UserId,
    pub joined_at: u64,
}
