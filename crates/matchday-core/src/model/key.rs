use std::fmt;

use serde::{Deserialize, Serialize};

use super::sport::Sport;
use matchday_api::ClientMessage;

/// One match a viewer can be interested in.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct SubscriptionKey {
    pub match_id: String,
    pub sport: Sport,
}

impl SubscriptionKey {
    pub fn new(match_id: impl Into<String>, sport: Sport) -> Self {
        Self {
            match_id: match_id.into(),
            sport,
        }
    }

    pub fn join_message(&self) -> ClientMessage {
        ClientMessage::Subscribe {
            match_id: self.match_id.clone(),
            sport: self.sport.to_string(),
        }
    }

    pub fn leave_message(&self) -> ClientMessage {
        ClientMessage::Unsubscribe {
            match_id: self.match_id.clone(),
            sport: self.sport.to_string(),
        }
    }
}

impl fmt::Display for SubscriptionKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.sport, self.match_id)
    }
}
