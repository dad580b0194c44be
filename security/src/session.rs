// security/src/session.rs
use serde::{Deserialize, Serialize};

use simrs_models::{Role, UserId};

/// The authenticated caller, passed explicitly into every engine operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Actor {
    pub user_id: UserId,
    pub role: Role,
}

impl Actor {
    pub fn new(user_id: UserId, role: Role) -> Self {
        Actor { user_id, role }
    }

    pub fn is(&self, user_id: UserId) -> bool {
        self.user_id == user_id
    }
}
