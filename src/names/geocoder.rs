//! Geocoding service client used to canonicalize municipality names.

use serde::Deserialize;
use std::cell::Cell;
use std::collections::HashMap;
use std::time::{Duration, Instant};
use tracing::debug;
use url::Url;

use crate::config::GeocoderConfig;
use crate::error::GeocodeError;

/// A free-text place search
pub trait Geocoder {
    /// Results in the service's own ranking order
    fn search(&self, query: &str) -> Result<Vec<Place>, GeocodeError>;
}

/// One search result, reduced to the fields name resolution needs
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct Place {
    #[serde(rename = "type", default)]
    pub place_type: String,

    #[serde(default)]
    pub class: String,

    #[serde(default)]
    pub display_name: Option<String>,

    /// Locale-keyed names: {"name": "...", "name:he": "...", "name:en": "..."}
    #[serde(default)]
    pub namedetails: Option<HashMap<String, String>>,
}

impl Place {
    pub fn is_administrative_boundary(&self) -> bool {
        self.place_type == "administrative" && self.class == "boundary"
    }

    /// `name:<locale>`, falling back to the generic `name`; empty strings count as missing
    pub fn localized_name(&self, locale: &str) -> Option<&str> {
        let names = self.namedetails.as_ref()?;
        names
            .get(&format!("name:{}", locale))
            .filter(|n| !n.is_empty())
            .or_else(|| names.get("name").filter(|n| !n.is_empty()))
            .map(String::as_str)
    }
}

/// Blocking client for a Nominatim-compatible `/search` endpoint
pub struct NominatimClient {
    client: reqwest::blocking::Client,
    endpoint: Url,
    country_codes: String,
    request_interval: Duration,
    last_request: Cell<Option<Instant>>,
}

impl NominatimClient {
    pub fn new(config: &GeocoderConfig) -> Result<Self, GeocodeError> {
        let mut builder =
            reqwest::blocking::Client::builder().user_agent(config.user_agent.clone());
        if let Some(secs) = config.timeout_secs {
            builder = builder.timeout(Duration::from_secs(secs));
        }

        Ok(Self {
            client: builder.build()?,
            endpoint: Url::parse(&config.endpoint)?,
            country_codes: config.country_codes.clone(),
            request_interval: Duration::from_millis(config.request_interval_ms),
            last_request: Cell::new(None),
        })
    }

    fn search_url(&self, query: &str) -> Url {
        let mut url = self.endpoint.clone();
        url.query_pairs_mut()
            .append_pair("q", query)
            .append_pair("format", "json")
            .append_pair("namedetails", "1")
            .append_pair("type", "administrative")
            .append_pair("countrycodes", &self.country_codes);
        url
    }

    /// Keep at least `request_interval` between consecutive requests
    fn throttle(&self) {
        if let Some(last) = self.last_request.get() {
            let elapsed = last.elapsed();
            if elapsed < self.request_interval {
                std::thread::sleep(self.request_interval - elapsed);
            }
        }
        self.last_request.set(Some(Instant::now()));
    }
}

impl Geocoder for NominatimClient {
    fn search(&self, query: &str) -> Result<Vec<Place>, GeocodeError> {
        self.throttle();

        let url = self.search_url(query);
        debug!("Geocoding '{}': {}", query, url);

        let response = self.client.get(url).send()?;
        let status = response.status();
        if !status.is_success() {
            return Err(GeocodeError::Status {
                status: status.as_u16(),
                query: query.to_string(),
            });
        }

        let places: Vec<Place> = response.json().map_err(|source| GeocodeError::Decode {
            query: query.to_string(),
            source,
        })?;

        debug!("Geocoder returned {} results for '{}'", places.len(), query);
        Ok(places)
    }
}
