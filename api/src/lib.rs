pub mod client;
pub mod denormalize;
pub mod error;
pub mod jsonapi;
pub mod query;

pub use client::{BattleriteApi, BattleriteApiBuilder};
pub use denormalize::denormalize;
pub use error::{ApiError, ApiResult, ConfigError, Error, FetchError, IntegrityError, ValidationError};
pub use query::{MatchQuery, build_query};

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;

/// Flattened attribute map of a resource. `stats` has already been hoisted,
/// and names the owning struct uses for its own fields (`id`, `rounds`, ...)
/// are left out so serialized objects never carry duplicate keys.
pub type Attributes = serde_json::Map<String, Value>;

// ---------------------------------------------------------------------------
// Domain types — denormalized model handed to callers
// ---------------------------------------------------------------------------

/// The resource types this client knows how to link together.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ResourceKind {
    Match,
    Round,
    Roster,
    Participant,
    Asset,
}

impl ResourceKind {
    /// Map a JSON:API `type` member onto a known kind. Unknown types are `None`.
    pub fn from_type(s: &str) -> Option<Self> {
        match s {
            "match" => Some(ResourceKind::Match),
            "round" => Some(ResourceKind::Round),
            "roster" => Some(ResourceKind::Roster),
            "participant" => Some(ResourceKind::Participant),
            "asset" => Some(ResourceKind::Asset),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            ResourceKind::Match => "match",
            ResourceKind::Round => "round",
            ResourceKind::Roster => "roster",
            ResourceKind::Participant => "participant",
            ResourceKind::Asset => "asset",
        }
    }
}

impl fmt::Display for ResourceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A round, participant or asset with its attributes lifted to the top level.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Resource {
    pub id: String,
    #[serde(rename = "type")]
    pub kind: ResourceKind,
    #[serde(flatten)]
    pub attributes: Attributes,
}

impl Resource {
    pub fn get(&self, attribute: &str) -> Option<&Value> {
        self.attributes.get(attribute)
    }
}

/// A team inside a match, carrying its participants in relationship order.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Roster {
    pub id: String,
    #[serde(flatten)]
    pub attributes: Attributes,
    pub participants: Vec<Resource>,
}

impl Roster {
    pub fn get(&self, attribute: &str) -> Option<&Value> {
        self.attributes.get(attribute)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Match {
    pub id: String,
    /// The primary resource's `type` member, normally `"match"`.
    pub game_type: String,
    /// `links.self` of the match resource, when the API sent one.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub link: Option<String>,
    #[serde(flatten)]
    pub attributes: Attributes,
    pub rounds: Vec<Resource>,
    pub rosters: Vec<Roster>,
    pub telemetry_url: Option<String>,
    /// Only populated by [`BattleriteApi::get_full_matches`].
    #[serde(skip_serializing_if = "Option::is_none")]
    pub telemetry: Option<Value>,
}

impl Match {
    pub fn get(&self, attribute: &str) -> Option<&Value> {
        self.attributes.get(attribute)
    }

    /// All participants across every roster, in roster order.
    pub fn participants(&self) -> impl Iterator<Item = &Resource> {
        self.rosters.iter().flat_map(|r| r.participants.iter())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn resource_kind_round_trips_type_names() {
        for kind in [
            ResourceKind::Match,
            ResourceKind::Round,
            ResourceKind::Roster,
            ResourceKind::Participant,
            ResourceKind::Asset,
        ] {
            assert_eq!(ResourceKind::from_type(kind.as_str()), Some(kind));
        }
        assert_eq!(ResourceKind::from_type("spectator"), None);
    }

    #[test]
    fn match_serializes_with_flattened_attributes() {
        let mut attributes = Attributes::new();
        attributes.insert("duration".into(), json!(120));
        let m = Match {
            id: "m1".into(),
            game_type: "match".into(),
            link: None,
            attributes,
            rounds: vec![],
            rosters: vec![],
            telemetry_url: Some("http://x/telemetry.json".into()),
            telemetry: None,
        };
        let value = serde_json::to_value(&m).unwrap();
        assert_eq!(value["duration"], json!(120));
        assert_eq!(value["telemetry_url"], json!("http://x/telemetry.json"));
        assert!(value.get("link").is_none());
        assert!(value.get("telemetry").is_none());
    }
}
