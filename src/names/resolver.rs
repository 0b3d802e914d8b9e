//! Name resolution: raw source name -> canonical reference record.

use std::fmt;
use tracing::{debug, warn};

use super::fuzzy::{extract_one, Score, Similarity, WeightedRatio};
use super::{AliasTable, Geocoder};
use crate::cache::{CacheEntry, ResolutionCache};
use crate::error::GeocodeError;
use crate::models::{AttributeRecord, ReferenceTable};

/// Matches must score strictly above this
pub const DEFAULT_THRESHOLD: Score = 70;

/// Default `namedetails` locale
pub const DEFAULT_LOCALE: &str = "he";

/// What happened to one name
#[derive(Debug, Clone, PartialEq)]
pub enum Outcome {
    /// Already cached (resolved or not); nothing was queried
    Cached,
    Resolved { matched: String, score: Score },
    Unresolved(Unresolved),
}

/// Why a name ended up unresolved
#[derive(Debug, Clone, PartialEq)]
pub enum Unresolved {
    NoAdministrativeBoundary {
        query: String,
    },
    NoLocalizedName {
        query: String,
    },
    BelowThreshold {
        localized: String,
        best: Option<(String, Score)>,
    },
}

impl fmt::Display for Unresolved {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Unresolved::NoAdministrativeBoundary { query } => {
                write!(f, "no administrative boundary found for '{}'", query)
            }
            Unresolved::NoLocalizedName { query } => {
                write!(f, "boundary for '{}' has no usable name", query)
            }
            Unresolved::BelowThreshold {
                localized,
                best: Some((key, score)),
            } => write!(
                f,
                "'{}' best matches '{}' with score {}, not above threshold",
                localized, key, score
            ),
            Unresolved::BelowThreshold {
                localized,
                best: None,
            } => write!(f, "'{}' has no candidates in the reference table", localized),
        }
    }
}

/// Accepted reference row for a localized name
struct Match<'a> {
    key: &'a str,
    record: &'a AttributeRecord,
    score: Score,
}

/// Resolves raw municipality names through the geocoder and the reference table.
///
/// Every attempted name ends up in the cache, resolved or not, so re-runs only
/// query names that were never attempted.
pub struct NameResolver<'a, G, S = WeightedRatio> {
    geocoder: G,
    reference: &'a ReferenceTable,
    aliases: &'a AliasTable,
    scorer: S,
    threshold: Score,
    locale: String,
}

impl<'a, G: Geocoder> NameResolver<'a, G, WeightedRatio> {
    pub fn new(geocoder: G, reference: &'a ReferenceTable, aliases: &'a AliasTable) -> Self {
        Self {
            geocoder,
            reference,
            aliases,
            scorer: WeightedRatio,
            threshold: DEFAULT_THRESHOLD,
            locale: DEFAULT_LOCALE.to_string(),
        }
    }
}

impl<'a, G: Geocoder, S: Similarity> NameResolver<'a, G, S> {
    pub fn with_scorer<T: Similarity>(self, scorer: T) -> NameResolver<'a, G, T> {
        NameResolver {
            geocoder: self.geocoder,
            reference: self.reference,
            aliases: self.aliases,
            scorer,
            threshold: self.threshold,
            locale: self.locale,
        }
    }

    pub fn with_threshold(mut self, threshold: Score) -> Self {
        self.threshold = threshold;
        self
    }

    pub fn with_locale(mut self, locale: &str) -> Self {
        self.locale = locale.to_string();
        self
    }

    pub fn geocoder(&self) -> &G {
        &self.geocoder
    }

    /// Resolve `name`, recording the result in `cache` under `name` itself.
    ///
    /// A geocoder failure is returned as an error and leaves the cache untouched.
    pub fn resolve(
        &self,
        name: &str,
        cache: &mut ResolutionCache,
    ) -> Result<Outcome, GeocodeError> {
        if cache.contains(name) {
            debug!("'{}' already cached", name);
            return Ok(Outcome::Cached);
        }

        let outcome = match self.attempt(name)? {
            Ok(Match {
                key: matched,
                record,
                score,
            }) => {
                cache.put(name, CacheEntry::resolved(record));
                if score < 100 {
                    debug!("Translated '{}' -> '{}' ({})", name, matched, score);
                }
                Outcome::Resolved {
                    matched: matched.to_string(),
                    score,
                }
            }
            Err(reason) => {
                warn!("Not translated '{}': {}", name, reason);
                cache.put(name, CacheEntry::Unresolved);
                Outcome::Unresolved(reason)
            }
        };

        Ok(outcome)
    }

    /// Geocode and match one name without touching the cache
    fn attempt(&self, name: &str) -> Result<Result<Match<'a>, Unresolved>, GeocodeError> {
        let query = self.aliases.query_for(name);
        let places = self.geocoder.search(query)?;

        // The service ranking is trusted: first qualifying result only
        let Some(place) = places.iter().find(|p| p.is_administrative_boundary()) else {
            return Ok(Err(Unresolved::NoAdministrativeBoundary {
                query: query.to_string(),
            }));
        };

        let Some(localized) = place.localized_name(&self.locale) else {
            return Ok(Err(Unresolved::NoLocalizedName {
                query: query.to_string(),
            }));
        };

        let localized = self.aliases.normalize(localized);
        Ok(self.match_reference(localized))
    }

    fn match_reference(&self, localized: String) -> Result<Match<'a>, Unresolved> {
        let reference: &'a ReferenceTable = self.reference;
        let best = extract_one(&self.scorer, &localized, reference.keys());
        match best.and_then(|(key, score)| Some((key, reference.get(key)?, score))) {
            Some((key, record, score)) if score > self.threshold => Ok(Match { key, record, score }),
            _ => Err(Unresolved::BelowThreshold {
                localized,
                best: best.map(|(key, score)| (key.to_string(), score)),
            }),
        }
    }
}
