/// JSON:API wire types — serde shapes for the Gamelocker responses.
/// These are reshaped into the domain types by `denormalize.rs`.
use crate::Attributes;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::HashMap;

// ---------------------------------------------------------------------------
// Documents
// ---------------------------------------------------------------------------

/// A JSON:API top-level document. `D` is the shape of primary `data`:
/// `Vec<ResourceObject>` for collections, `ResourceObject` for single lookups.
#[derive(Debug, Deserialize, Serialize, Clone, Default)]
pub struct Document<D = Vec<ResourceObject>> {
    pub data: D,
    #[serde(default)]
    pub included: Vec<ResourceObject>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub links: Option<Links>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub meta: Option<Value>,
}

/// Response of `GET /matches`.
pub type MatchesDocument = Document<Vec<ResourceObject>>;

/// Response of `GET /matches/{id}`, handed back to callers untouched.
pub type MatchDocument = Document<ResourceObject>;

#[derive(Debug, Deserialize, Serialize, Clone, Default, PartialEq)]
pub struct Links {
    #[serde(rename = "self", skip_serializing_if = "Option::is_none")]
    pub self_link: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub next: Option<String>,
}

// ---------------------------------------------------------------------------
// Resources and relationships
// ---------------------------------------------------------------------------

#[derive(Debug, Deserialize, Serialize, Clone, Default, PartialEq)]
pub struct ResourceObject {
    pub id: String,
    #[serde(rename = "type")]
    pub kind: String,
    #[serde(default)]
    pub attributes: Attributes,
    #[serde(default)]
    pub relationships: HashMap<String, Relationship>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub links: Option<Links>,
}

impl ResourceObject {
    /// References of the named relationship. Missing or `null` linkage is empty.
    pub fn related(&self, name: &str) -> &[ResourceIdentifier] {
        self.relationships
            .get(name)
            .map(Relationship::identifiers)
            .unwrap_or(&[])
    }
}

#[derive(Debug, Deserialize, Serialize, Clone, Default, PartialEq)]
pub struct Relationship {
    #[serde(default)]
    pub data: Option<Linkage>,
}

impl Relationship {
    pub fn identifiers(&self) -> &[ResourceIdentifier] {
        match &self.data {
            Some(Linkage::Many(ids)) => ids,
            Some(Linkage::One(id)) => std::slice::from_ref(id),
            None => &[],
        }
    }
}

/// To-many relationships carry an array, to-one relationships a single object.
#[derive(Debug, Deserialize, Serialize, Clone, PartialEq)]
#[serde(untagged)]
pub enum Linkage {
    Many(Vec<ResourceIdentifier>),
    One(ResourceIdentifier),
}

#[derive(Debug, Deserialize, Serialize, Clone, Default, PartialEq)]
pub struct ResourceIdentifier {
    pub id: String,
    /// Some fixtures omit the type; lookups only ever use the id.
    #[serde(rename = "type", default)]
    pub kind: String,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn to_one_and_to_many_linkage_both_parse() {
        let raw = json!({
            "id": "m1",
            "type": "match",
            "relationships": {
                "rosters": { "data": [{ "type": "roster", "id": "ro1" }, { "type": "roster", "id": "ro2" }] },
                "assets": { "data": { "type": "asset", "id": "a1" } },
                "spectators": { "data": null }
            }
        });
        let resource: ResourceObject = serde_json::from_value(raw).unwrap();
        let rosters: Vec<&str> = resource.related("rosters").iter().map(|r| r.id.as_str()).collect();
        assert_eq!(rosters, vec!["ro1", "ro2"]);
        assert_eq!(resource.related("assets").len(), 1);
        assert!(resource.related("spectators").is_empty());
        assert!(resource.related("rounds").is_empty());
    }

    #[test]
    fn document_without_included_defaults_to_empty() {
        let doc: MatchesDocument = serde_json::from_value(json!({ "data": [] })).unwrap();
        assert!(doc.data.is_empty());
        assert!(doc.included.is_empty());
    }

    #[test]
    fn single_match_document_parses_links() {
        let raw = json!({
            "data": {
                "id": "m1",
                "type": "match",
                "attributes": { "duration": 300 },
                "links": { "self": "https://api.example/matches/m1" }
            },
            "included": []
        });
        let doc: MatchDocument = serde_json::from_value(raw).unwrap();
        assert_eq!(doc.data.id, "m1");
        assert_eq!(
            doc.data.links.and_then(|l| l.self_link).as_deref(),
            Some("https://api.example/matches/m1")
        );
    }
}
