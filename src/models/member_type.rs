use serde::{Deserialize, Serialize};

use crate::store::Record;

/// Membership tier a profile subscribes to. Read-only for the API.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MemberType {
    pub id: String,
    /// Percent discount granted to members of this tier.
    pub discount: u32,
    pub month_posts_limit: u32,
}

impl Record for MemberType {
    const COLLECTION: &'static str = "member_types";

    fn id(&self) -> &str {
        &self.id
    }
}

impl MemberType {
    /// Tiers every store is seeded with.
    pub fn defaults() -> Vec<MemberType> {
        vec![
            MemberType {
                id: "basic".to_string(),
                discount: 0,
                month_posts_limit: 20,
            },
            MemberType {
                id: "business".to_string(),
                discount: 5,
                month_posts_limit: 100,
            },
        ]
    }
}
