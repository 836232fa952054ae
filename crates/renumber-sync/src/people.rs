use crate::error::{Result, SyncError};
use reqwest::blocking::{Client, RequestBuilder, Response};
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::debug;
use url::Url;

pub const PEOPLE_API_BASE: &str = "https://people.googleapis.com/v1";
pub const SEARCH_READ_MASK: &str = "names,phoneNumbers";
pub const PHONE_FIELDS: &str = "phoneNumbers";
pub const MOBILE_TYPE: &str = "mobile";

const RESOURCE_PREFIX: &str = "people/";

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Person {
    #[serde(default)]
    pub resource_name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub etag: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub names: Vec<PersonName>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub phone_numbers: Vec<PhoneNumber>,
}

impl Person {
    pub fn display_name(&self) -> Option<&str> {
        self.names
            .iter()
            .filter_map(|name| name.display_name.as_deref())
            .map(str::trim)
            .find(|name| !name.is_empty())
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PersonName {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub display_name: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PhoneNumber {
    pub value: String,
    #[serde(rename = "type", default, skip_serializing_if = "Option::is_none")]
    pub kind: Option<String>,
}

impl PhoneNumber {
    pub fn mobile(value: impl Into<String>) -> Self {
        Self {
            value: value.into(),
            kind: Some(MOBILE_TYPE.to_string()),
        }
    }
}

/// Body of an `updateContact` call that replaces the phone field.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PhoneUpdate {
    pub etag: String,
    pub phone_numbers: Vec<PhoneNumber>,
}

/// The three People API operations the updater relies on.
pub trait PeopleApi {
    fn search_contacts(&mut self, query: &str, read_mask: &str) -> Result<Vec<Person>>;
    fn get_person(&mut self, resource_name: &str, person_fields: &str) -> Result<Person>;
    fn update_contact(
        &mut self,
        resource_name: &str,
        update_person_fields: &str,
        body: &PhoneUpdate,
    ) -> Result<Person>;
}

#[derive(Debug, Deserialize)]
struct SearchResponse {
    #[serde(default)]
    results: Vec<SearchResult>,
}

#[derive(Debug, Deserialize)]
struct SearchResult {
    person: Person,
}

#[derive(Debug, Deserialize)]
struct ErrorEnvelope {
    error: ErrorBody,
}

#[derive(Debug, Deserialize)]
struct ErrorBody {
    #[serde(default)]
    message: String,
}

/// Blocking People API client authenticated with a bearer token.
pub struct PeopleClient {
    client: Client,
    base_url: String,
    access_token: String,
    warmed_up: bool,
}

impl std::fmt::Debug for PeopleClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PeopleClient")
            .field("base_url", &self.base_url)
            .field("access_token", &"[REDACTED]")
            .finish()
    }
}

impl PeopleClient {
    pub fn new(access_token: impl Into<String>) -> Result<Self> {
        Self::with_base_url(PEOPLE_API_BASE, access_token)
    }

    pub fn with_base_url(base_url: &str, access_token: impl Into<String>) -> Result<Self> {
        let base = Url::parse(base_url)?;
        if base.scheme() != "https" && base.host_str() != Some("127.0.0.1") {
            return Err(SyncError::Parse("people api url must use https".to_string()));
        }
        let client = Client::builder()
            .user_agent(concat!("renumber/", env!("CARGO_PKG_VERSION")))
            .timeout(Duration::from_secs(30))
            .connect_timeout(Duration::from_secs(10))
            .build()?;
        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            access_token: access_token.into(),
            warmed_up: false,
        })
    }

    fn endpoint(&self, path: &str, query: &[(&str, &str)]) -> Result<Url> {
        let mut url = Url::parse(&format!("{}/{}", self.base_url, path))?;
        if !query.is_empty() {
            let mut pairs = url.query_pairs_mut();
            for (key, value) in query {
                pairs.append_pair(key, value);
            }
        }
        Ok(url)
    }

    fn send(&self, request: RequestBuilder) -> Result<Response> {
        let response = request.bearer_auth(&self.access_token).send()?;
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }
        let body = response.text().unwrap_or_default();
        Err(SyncError::http(status.as_u16(), error_message(&body, status)))
    }

    // Search results come from a cache that an empty query populates.
    fn warm_up(&mut self) {
        if self.warmed_up {
            return;
        }
        self.warmed_up = true;
        let result = self
            .endpoint(
                "people:searchContacts",
                &[("query", ""), ("readMask", SEARCH_READ_MASK)],
            )
            .and_then(|url| self.send(self.client.get(url)));
        if let Err(err) = result {
            debug!(error = %err, "search warm-up request failed");
        }
    }
}

impl PeopleApi for PeopleClient {
    fn search_contacts(&mut self, query: &str, read_mask: &str) -> Result<Vec<Person>> {
        self.warm_up();
        let url = self.endpoint(
            "people:searchContacts",
            &[("query", query), ("readMask", read_mask)],
        )?;
        debug!(query, "searching contacts");
        let response: SearchResponse = self.send(self.client.get(url))?.json()?;
        Ok(response
            .results
            .into_iter()
            .map(|result| result.person)
            .collect())
    }

    fn get_person(&mut self, resource_name: &str, person_fields: &str) -> Result<Person> {
        ensure_resource_name(resource_name)?;
        let url = self.endpoint(resource_name, &[("personFields", person_fields)])?;
        debug!(resource_name, "fetching contact");
        Ok(self.send(self.client.get(url))?.json()?)
    }

    fn update_contact(
        &mut self,
        resource_name: &str,
        update_person_fields: &str,
        body: &PhoneUpdate,
    ) -> Result<Person> {
        ensure_resource_name(resource_name)?;
        let url = self.endpoint(
            &format!("{resource_name}:updateContact"),
            &[("updatePersonFields", update_person_fields)],
        )?;
        debug!(resource_name, "updating contact");
        Ok(self.send(self.client.patch(url).json(body))?.json()?)
    }
}

fn ensure_resource_name(resource_name: &str) -> Result<()> {
    let id = resource_name.strip_prefix(RESOURCE_PREFIX).unwrap_or_default();
    if id.is_empty() || !id.chars().all(|ch| ch.is_ascii_alphanumeric()) {
        return Err(SyncError::Parse(format!(
            "invalid resource name: {resource_name}"
        )));
    }
    Ok(())
}

fn error_message(body: &str, status: reqwest::StatusCode) -> String {
    if let Ok(envelope) = serde_json::from_str::<ErrorEnvelope>(body) {
        if !envelope.error.message.trim().is_empty() {
            return envelope.error.message;
        }
    }
    let trimmed = body.trim();
    if trimmed.is_empty() {
        return status
            .canonical_reason()
            .unwrap_or("request failed")
            .to_string();
    }
    trimmed.chars().take(240).collect()
}
