use crate::ValidationError;
use chrono::{DateTime, SecondsFormat, Utc};

/// Query options accepted by `GET /matches`.
pub const ALLOWED_OPTIONS: [&str; 9] = [
    "page[offset]",
    "page[limit]",
    "sort",
    "filter[createdAt-start]",
    "filter[createdAt-end]",
    "filter[playerNames]",
    "filter[playerIds]",
    "filter[teamNames]",
    "filter[gameMode]",
];

/// Build `?k1=v1&k2=v2` from options, keeping their order.
///
/// Keys must come from [`ALLOWED_OPTIONS`] and are written as-is. Values are
/// percent-encoded here, so callers pass them raw. No options yields `""`.
pub fn build_query<I, K, V>(options: I) -> Result<String, ValidationError>
where
    I: IntoIterator<Item = (K, V)>,
    K: AsRef<str>,
    V: AsRef<str>,
{
    let mut pairs = Vec::new();
    for (key, value) in options {
        let key = key.as_ref();
        if !ALLOWED_OPTIONS.iter().any(|allowed| *allowed == key) {
            return Err(ValidationError::UnknownFilter(key.to_owned()));
        }
        pairs.push(format!("{key}={}", urlencoding::encode(value.as_ref())));
    }

    if pairs.is_empty() {
        Ok(String::new())
    } else {
        Ok(format!("?{}", pairs.join("&")))
    }
}

/// Ordered options for a matches lookup.
///
/// Setting an option twice replaces the earlier value but keeps its position.
/// Keys are only checked when the query string is built.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MatchQuery {
    options: Vec<(String, String)>,
}

impl MatchQuery {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        let key = key.into();
        let value = value.into();
        match self.options.iter_mut().find(|(k, _)| *k == key) {
            Some(slot) => slot.1 = value,
            None => self.options.push((key, value)),
        }
        self
    }

    pub fn offset(self, offset: u32) -> Self {
        self.insert("page[offset]", offset.to_string())
    }

    pub fn limit(self, limit: u32) -> Self {
        self.insert("page[limit]", limit.to_string())
    }

    /// Sort field, e.g. `createdAt` or `-createdAt` for newest first.
    pub fn sort(self, field: impl Into<String>) -> Self {
        self.insert("sort", field)
    }

    pub fn created_after(self, start: DateTime<Utc>) -> Self {
        self.insert(
            "filter[createdAt-start]",
            start.to_rfc3339_opts(SecondsFormat::Secs, true),
        )
    }

    pub fn created_before(self, end: DateTime<Utc>) -> Self {
        self.insert(
            "filter[createdAt-end]",
            end.to_rfc3339_opts(SecondsFormat::Secs, true),
        )
    }

    pub fn player_names<S: AsRef<str>>(self, names: &[S]) -> Self {
        self.insert("filter[playerNames]", join(names))
    }

    pub fn player_ids<S: AsRef<str>>(self, ids: &[S]) -> Self {
        self.insert("filter[playerIds]", join(ids))
    }

    pub fn team_names<S: AsRef<str>>(self, names: &[S]) -> Self {
        self.insert("filter[teamNames]", join(names))
    }

    pub fn game_mode(self, mode: impl Into<String>) -> Self {
        self.insert("filter[gameMode]", mode)
    }

    pub fn is_empty(&self) -> bool {
        self.options.is_empty()
    }

    pub fn pairs(&self) -> impl Iterator<Item = (&str, &str)> {
        self.options.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    pub fn to_query_string(&self) -> Result<String, ValidationError> {
        build_query(self.pairs())
    }
}

impl<K: Into<String>, V: Into<String>> FromIterator<(K, V)> for MatchQuery {
    fn from_iter<T: IntoIterator<Item = (K, V)>>(iter: T) -> Self {
        iter.into_iter()
            .fold(MatchQuery::new(), |query, (k, v)| query.insert(k, v))
    }
}

fn join<S: AsRef<str>>(items: &[S]) -> String {
    items
        .iter()
        .map(AsRef::as_ref)
        .collect::<Vec<_>>()
        .join(",")
}
