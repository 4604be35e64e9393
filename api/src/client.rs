use crate::denormalize::denormalize;
use crate::jsonapi::{MatchDocument, MatchesDocument};
use crate::query::MatchQuery;
use crate::{ApiError, ApiResult, ConfigError, FetchError, Match, ValidationError};
use futures_util::{StreamExt, TryStreamExt, stream};
use log::{debug, warn};
use reqwest::header::{ACCEPT, ACCEPT_ENCODING, AUTHORIZATION, HeaderValue};
use reqwest::{Client, StatusCode, Url};
use serde::de::DeserializeOwned;
use serde_json::Value;
use std::time::Duration;

pub const GAMELOCKER_BASE_URL: &str = "https://api.dc01.gamelockerapp.com/shards/global";
pub const TELEMETRY_CDN_URL: &str =
    "https://cdn.gamelockerapp.com/stunlock-studios-battlerite/global/";

const JSON_API: &str = "application/vnd.api+json";
const DEFAULT_TIMEOUT: Duration = Duration::from_secs(10);
const DEFAULT_TELEMETRY_CONCURRENCY: usize = 4;

/// Battlerite client for the Gamelocker match and player endpoints.
#[derive(Debug, Clone)]
pub struct BattleriteApi {
    client: Client,
    api_key: HeaderValue,
    base_url: String,
    telemetry_base: Url,
    timeout: Duration,
    telemetry_concurrency: usize,
}

#[derive(Debug, Clone)]
pub struct BattleriteApiBuilder {
    api_key: String,
    base_url: String,
    telemetry_base: String,
    timeout: Duration,
    telemetry_concurrency: usize,
    user_agent: String,
}

impl BattleriteApiBuilder {
    pub fn base_url(mut self, url: impl Into<String>) -> Self {
        self.base_url = url.into();
        self
    }

    /// Base that relative telemetry references are resolved against.
    pub fn telemetry_base(mut self, url: impl Into<String>) -> Self {
        self.telemetry_base = url.into();
        self
    }

    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// How many telemetry documents `get_full_matches` downloads at once.
    pub fn telemetry_concurrency(mut self, n: usize) -> Self {
        self.telemetry_concurrency = n.max(1);
        self
    }

    pub fn user_agent(mut self, user_agent: impl Into<String>) -> Self {
        self.user_agent = user_agent.into();
        self
    }

    pub fn build(self) -> ApiResult<BattleriteApi> {
        let key = self.api_key.trim();
        if key.is_empty() {
            return Err(ConfigError::MissingApiKey.into());
        }
        let mut api_key = HeaderValue::from_str(key).map_err(|_| ConfigError::InvalidApiKey)?;
        api_key.set_sensitive(true);

        Url::parse(&self.base_url).map_err(|_| ConfigError::InvalidUrl(self.base_url.clone()))?;

        // `Url::join` replaces the last path segment unless the base ends in '/'.
        let mut telemetry_base = self.telemetry_base.clone();
        if !telemetry_base.ends_with('/') {
            telemetry_base.push('/');
        }
        let telemetry_base = Url::parse(&telemetry_base)
            .map_err(|_| ConfigError::InvalidUrl(self.telemetry_base.clone()))?;

        Ok(BattleriteApi {
            client: Client::builder()
                .user_agent(self.user_agent)
                .build()
                .unwrap_or_default(),
            api_key,
            base_url: self.base_url.trim_end_matches('/').to_owned(),
            telemetry_base,
            timeout: self.timeout,
            telemetry_concurrency: self.telemetry_concurrency,
        })
    }
}

impl BattleriteApi {
    /// Client with the default endpoints. Fails if `api_key` is empty.
    pub fn new(api_key: impl Into<String>) -> ApiResult<Self> {
        Self::builder(api_key).build()
    }

    pub fn builder(api_key: impl Into<String>) -> BattleriteApiBuilder {
        BattleriteApiBuilder {
            api_key: api_key.into(),
            base_url: GAMELOCKER_BASE_URL.to_owned(),
            telemetry_base: TELEMETRY_CDN_URL.to_owned(),
            timeout: DEFAULT_TIMEOUT,
            telemetry_concurrency: DEFAULT_TELEMETRY_CONCURRENCY,
            user_agent: concat!("battlerite-api/", env!("CARGO_PKG_VERSION")).to_owned(),
        }
    }

    /// Fetch a collection of matches and link each one with its rounds,
    /// rosters, participants and telemetry URL.
    ///
    /// See <http://battlerite-docs.readthedocs.io/en/latest/matches/matches.html>
    /// for the filters the service understands.
    pub async fn get_matches(&self, query: &MatchQuery) -> ApiResult<Vec<Match>> {
        let url = format!("{}/matches{}", self.base_url, query.to_query_string()?);
        let document: MatchesDocument = self.get(&url).await?;
        let matches = denormalize(&document)?;
        debug!("linked {} matches from {url}", matches.len());
        Ok(matches)
    }

    /// [`get_matches`](Self::get_matches), then download every match's telemetry.
    ///
    /// Downloads run concurrently up to the configured limit; the result keeps
    /// the order of the matches. The first failed download fails the call.
    pub async fn get_full_matches(&self, query: &MatchQuery) -> ApiResult<Vec<Match>> {
        let matches = self.get_matches(query).await?;
        stream::iter(matches)
            .map(|m| self.attach_telemetry(m))
            .buffered(self.telemetry_concurrency)
            .try_collect::<Vec<_>>()
            .await
    }

    /// Fetch a single match. The JSON:API document is returned as sent.
    pub async fn get_match(&self, match_id: &str) -> ApiResult<MatchDocument> {
        let url = format!("{}/matches/{}", self.base_url, urlencoding::encode(match_id));
        self.get(&url).await
    }

    pub async fn get_player(&self, player_id: &str) -> ApiResult<Value> {
        let url = format!("{}/players/{}", self.base_url, urlencoding::encode(player_id));
        self.fetch(&url).await
    }

    /// Fetch a telemetry document.
    ///
    /// `reference` is normally a match's `telemetry_url` and is used as-is.
    /// A relative reference such as `2017/11/22/15/37/<id>.json` is resolved
    /// against the telemetry CDN base.
    pub async fn get_telemetry(&self, reference: &str) -> ApiResult<Value> {
        let url = self.telemetry_location(reference)?;
        self.fetch(url.as_str()).await
    }

    /// Authenticated GET returning the parsed JSON body.
    ///
    /// 401 and 400 map to [`ApiError::Unauthorized`] and
    /// [`ApiError::MalformedRequest`], a 200 body with a top-level `errors`
    /// member to [`ApiError::Rejected`]. Anything else that is not a 200 is a
    /// [`FetchError`].
    pub async fn fetch(&self, url: &str) -> ApiResult<Value> {
        debug!("GET {url}");
        let response = self
            .client
            .get(url)
            .header(ACCEPT, JSON_API)
            .header(AUTHORIZATION, self.api_key.clone())
            .header(ACCEPT_ENCODING, "gzip")
            .timeout(self.timeout)
            .send()
            .await
            .map_err(|e| transport_error(e, url))?;

        match response.status() {
            StatusCode::OK => {}
            StatusCode::UNAUTHORIZED => {
                warn!("{url} rejected the API key");
                return Err(ApiError::Unauthorized.into());
            }
            StatusCode::BAD_REQUEST => {
                warn!("{url} reported a malformed request");
                return Err(ApiError::MalformedRequest.into());
            }
            status => {
                warn!("{url} answered {status}");
                return Err(FetchError::RequestFailed {
                    url: url.to_owned(),
                    status: Some(status),
                    source: None,
                }
                .into());
            }
        }

        let body = response.bytes().await.map_err(|e| transport_error(e, url))?;
        let mut document: Value =
            serde_json::from_slice(&body).map_err(|e| FetchError::Parsing(e, url.to_owned()))?;

        if let Some(errors) = document.as_object_mut().and_then(|doc| doc.remove("errors")) {
            warn!("{url} returned errors: {errors}");
            return Err(ApiError::Rejected(errors).into());
        }

        debug!("GET {url} ok ({} bytes)", body.len());
        Ok(document)
    }

    async fn get<T: DeserializeOwned>(&self, url: &str) -> ApiResult<T> {
        let value = self.fetch(url).await?;
        serde_json::from_value(value).map_err(|e| FetchError::Parsing(e, url.to_owned()).into())
    }

    async fn attach_telemetry(&self, mut m: Match) -> ApiResult<Match> {
        if let Some(url) = m.telemetry_url.clone() {
            m.telemetry = Some(self.get_telemetry(&url).await?);
        }
        Ok(m)
    }

    fn telemetry_location(&self, reference: &str) -> Result<Url, ValidationError> {
        // An absolute reference replaces the base entirely.
        self.telemetry_base
            .join(reference.trim())
            .map_err(|_| ValidationError::InvalidUrl(reference.to_owned()))
    }
}

fn transport_error(e: reqwest::Error, url: &str) -> FetchError {
    warn!("GET {url} failed: {e}");
    if e.is_timeout() {
        FetchError::Timeout { url: url.to_owned() }
    } else {
        FetchError::RequestFailed {
            url: url.to_owned(),
            status: e.status(),
            source: Some(e),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Error;

    #[test]
    fn missing_api_key_is_a_config_error() {
        assert!(matches!(
            BattleriteApi::new(""),
            Err(Error::Config(ConfigError::MissingApiKey))
        ));
        assert!(matches!(
            BattleriteApi::new("   "),
            Err(Error::Config(ConfigError::MissingApiKey))
        ));
    }

    #[test]
    fn api_key_with_newline_is_rejected() {
        assert!(matches!(
            BattleriteApi::new("abc\ndef"),
            Err(Error::Config(ConfigError::InvalidApiKey))
        ));
    }

    #[test]
    fn unparseable_base_url_is_a_config_error() {
        let result = BattleriteApi::builder("key").base_url("not a url").build();
        assert!(matches!(result, Err(Error::Config(ConfigError::InvalidUrl(_)))));
    }

    #[test]
    fn base_url_trailing_slash_is_trimmed() {
        let api = BattleriteApi::builder("key")
            .base_url("http://localhost:1234/shards/global/")
            .build()
            .unwrap();
        assert_eq!(api.base_url, "http://localhost:1234/shards/global");
    }

    #[test]
    fn telemetry_concurrency_is_at_least_one() {
        let api = BattleriteApi::builder("key").telemetry_concurrency(0).build().unwrap();
        assert_eq!(api.telemetry_concurrency, 1);
    }

    #[test]
    fn absolute_telemetry_url_is_used_as_is() {
        let api = BattleriteApi::new("key").unwrap();
        let url = api
            .telemetry_location("https://cdn.example/2017/11/22/telemetry.json")
            .unwrap();
        assert_eq!(url.as_str(), "https://cdn.example/2017/11/22/telemetry.json");
    }

    #[test]
    fn relative_telemetry_reference_resolves_against_cdn() {
        let api = BattleriteApi::builder("key")
            .telemetry_base("https://cdn.example/battlerite/global")
            .build()
            .unwrap();
        let url = api.telemetry_location("2017/11/22/15/37/abc.json").unwrap();
        assert_eq!(url.as_str(), "https://cdn.example/battlerite/global/2017/11/22/15/37/abc.json");
    }
}
