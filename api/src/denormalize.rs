use crate::jsonapi::{MatchesDocument, ResourceIdentifier, ResourceObject};
use crate::{Attributes, IntegrityError, Match, Resource, ResourceKind, Roster};
use log::debug;
use serde_json::Value;
use std::collections::HashMap;

// ---------------------------------------------------------------------------
// Denormalization: JSON:API data + included → nested Match tree
// ---------------------------------------------------------------------------

/// Re-link a matches document into one [`Match`] per entry of `data`, in order.
///
/// Rounds, rosters and assets are looked up by id in `included`, and each
/// roster carries its participants. References are resolved within the bucket
/// of the type the relationship expects; a reference that is not there is an
/// [`IntegrityError`]. Included resources of unknown type are ignored.
pub fn denormalize(document: &MatchesDocument) -> Result<Vec<Match>, IntegrityError> {
    let index = ResourceIndex::build(&document.included);
    let rosters = link_rosters(&document.included, &index)?;

    document
        .data
        .iter()
        .map(|resource| link_match(resource, &index, &rosters))
        .collect()
}

/// Copy a resource's attributes with `stats` hoisted one level up.
///
/// Stats keys overwrite attributes of the same name. A `null` stats block is
/// dropped; a non-object one is kept as-is.
pub fn flatten_attributes(attributes: &Attributes) -> Attributes {
    let mut flat = Attributes::new();
    let mut stats = None;
    for (name, value) in attributes {
        if name == "stats" {
            stats = Some(value);
        } else {
            flat.insert(name.clone(), value.clone());
        }
    }

    match stats {
        Some(Value::Object(stats)) => flat.extend(stats.clone()),
        Some(Value::Null) | None => {}
        Some(other) => {
            flat.insert("stats".into(), other.clone());
        }
    }
    flat
}

// Names the output structs already use. Attributes with these names would
// serialize as duplicate keys next to the flattened map, so they are dropped.
const RESOURCE_FIELDS: &[&str] = &["id", "type"];
const ROSTER_FIELDS: &[&str] = &["id", "participants"];
const MATCH_FIELDS: &[&str] = &[
    "id",
    "game_type",
    "link",
    "rounds",
    "rosters",
    "telemetry_url",
    "telemetry",
];

/// Flattened attributes minus the names the output struct owns.
fn owned_attributes(attributes: &Attributes, fields: &[&str]) -> Attributes {
    let mut flat = flatten_attributes(attributes);
    for field in fields {
        if flat.remove(*field).is_some() {
            debug!("dropping attribute `{field}`, it collides with an output field");
        }
    }
    flat
}

/// Per-type id lookup over `included`. Borrows the document; lives for one call.
#[derive(Default)]
struct ResourceIndex<'a> {
    rounds: HashMap<&'a str, &'a ResourceObject>,
    rosters: HashMap<&'a str, &'a ResourceObject>,
    participants: HashMap<&'a str, &'a ResourceObject>,
    assets: HashMap<&'a str, &'a ResourceObject>,
}

impl<'a> ResourceIndex<'a> {
    fn build(included: &'a [ResourceObject]) -> Self {
        let mut index = Self::default();
        for resource in included {
            let bucket = match ResourceKind::from_type(&resource.kind) {
                Some(ResourceKind::Round) => &mut index.rounds,
                Some(ResourceKind::Roster) => &mut index.rosters,
                Some(ResourceKind::Participant) => &mut index.participants,
                Some(ResourceKind::Asset) => &mut index.assets,
                Some(ResourceKind::Match) | None => continue,
            };
            bucket.insert(resource.id.as_str(), resource);
        }
        index
    }

    fn bucket(&self, kind: ResourceKind) -> Option<&HashMap<&'a str, &'a ResourceObject>> {
        match kind {
            ResourceKind::Round => Some(&self.rounds),
            ResourceKind::Roster => Some(&self.rosters),
            ResourceKind::Participant => Some(&self.participants),
            ResourceKind::Asset => Some(&self.assets),
            ResourceKind::Match => None,
        }
    }

    fn resolve(
        &self,
        kind: ResourceKind,
        reference: &ResourceIdentifier,
    ) -> Result<&'a ResourceObject, IntegrityError> {
        self.bucket(kind)
            .and_then(|bucket| bucket.get(reference.id.as_str()))
            .copied()
            .ok_or_else(|| unresolved(reference, kind))
    }

    /// Resolve every reference in order into a flattened [`Resource`].
    fn resolve_all(
        &self,
        kind: ResourceKind,
        references: &[ResourceIdentifier],
    ) -> Result<Vec<Resource>, IntegrityError> {
        references
            .iter()
            .map(|reference| self.resolve(kind, reference).map(|r| to_resource(r, kind)))
            .collect()
    }
}

/// Build every included roster with its participants, keyed by roster id.
fn link_rosters<'a>(
    included: &'a [ResourceObject],
    index: &ResourceIndex<'a>,
) -> Result<HashMap<&'a str, Roster>, IntegrityError> {
    let mut rosters = HashMap::new();
    for resource in included {
        if ResourceKind::from_type(&resource.kind) != Some(ResourceKind::Roster) {
            continue;
        }
        let participants =
            index.resolve_all(ResourceKind::Participant, resource.related("participants"))?;
        rosters.insert(
            resource.id.as_str(),
            Roster {
                id: resource.id.clone(),
                attributes: owned_attributes(&resource.attributes, ROSTER_FIELDS),
                participants,
            },
        );
    }
    Ok(rosters)
}

fn link_match(
    resource: &ResourceObject,
    index: &ResourceIndex<'_>,
    rosters: &HashMap<&str, Roster>,
) -> Result<Match, IntegrityError> {
    let rounds = index.resolve_all(ResourceKind::Round, resource.related("rounds"))?;

    let rosters = resource
        .related("rosters")
        .iter()
        .map(|reference| {
            rosters
                .get(reference.id.as_str())
                .cloned()
                .ok_or_else(|| unresolved(reference, ResourceKind::Roster))
        })
        .collect::<Result<Vec<_>, _>>()?;

    // Every asset must resolve; the first one carrying a URL is the telemetry.
    let mut telemetry_url = None;
    for reference in resource.related("assets") {
        let asset = index.resolve(ResourceKind::Asset, reference)?;
        if telemetry_url.is_none() {
            telemetry_url = asset
                .attributes
                .get("URL")
                .and_then(Value::as_str)
                .map(str::to_owned);
        }
    }

    Ok(Match {
        id: resource.id.clone(),
        game_type: resource.kind.clone(),
        link: resource.links.as_ref().and_then(|l| l.self_link.clone()),
        attributes: owned_attributes(&resource.attributes, MATCH_FIELDS),
        rounds,
        rosters,
        telemetry_url,
        telemetry: None,
    })
}

fn to_resource(resource: &ResourceObject, kind: ResourceKind) -> Resource {
    Resource {
        id: resource.id.clone(),
        kind,
        attributes: owned_attributes(&resource.attributes, RESOURCE_FIELDS),
    }
}

fn unresolved(reference: &ResourceIdentifier, kind: ResourceKind) -> IntegrityError {
    IntegrityError::UnresolvedReference {
        id: reference.id.clone(),
        kind,
    }
}
