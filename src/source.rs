use std::fmt;

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use log::{info, warn};
use reqwest::blocking::Client;

use crate::config::Config;
use crate::fallback::fallback_json;
use crate::http_client::http_client;
use crate::records::Payload;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Endpoint {
    Overview,
    TeamPerformance,
    VenueAnalysis,
    PlayerStats,
    SeasonTrends,
    MatchDetails,
    BatsmanClusters,
    TeamClusters,
}

impl Endpoint {
    pub const ALL: [Endpoint; 8] = [
        Endpoint::Overview,
        Endpoint::TeamPerformance,
        Endpoint::VenueAnalysis,
        Endpoint::PlayerStats,
        Endpoint::SeasonTrends,
        Endpoint::MatchDetails,
        Endpoint::BatsmanClusters,
        Endpoint::TeamClusters,
    ];

    /// Path below the api base url.
    pub fn path(self) -> &'static str {
        match self {
            Endpoint::Overview => "/data/overview",
            Endpoint::TeamPerformance => "/data/team-performance",
            Endpoint::VenueAnalysis => "/data/venue-analysis",
            Endpoint::PlayerStats => "/data/player-stats",
            Endpoint::SeasonTrends => "/data/season-trends",
            Endpoint::MatchDetails => "/data/match-details",
            Endpoint::BatsmanClusters => "/clustering/batsman-clusters",
            Endpoint::TeamClusters => "/clustering/team-clusters",
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Endpoint::Overview => "overview",
            Endpoint::TeamPerformance => "team performance",
            Endpoint::VenueAnalysis => "venue analysis",
            Endpoint::PlayerStats => "player stats",
            Endpoint::SeasonTrends => "season trends",
            Endpoint::MatchDetails => "match details",
            Endpoint::BatsmanClusters => "batsman clusters",
            Endpoint::TeamClusters => "team clusters",
        }
    }
}

impl fmt::Display for Endpoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Something that can hand back the raw JSON body of an endpoint.
pub trait DataSource: Sync {
    fn name(&self) -> &str;

    fn fetch_raw(&self, endpoint: Endpoint) -> Result<String>;
}

pub struct RemoteSource {
    base_url: String,
    client: &'static Client,
}

impl RemoteSource {
    pub fn new(cfg: &Config) -> Result<Self> {
        let client = http_client(cfg.http_timeout)?;
        Ok(Self {
            base_url: cfg.api_base.trim_end_matches('/').to_string(),
            client,
        })
    }

    pub fn url_for(&self, endpoint: Endpoint) -> String {
        format!("{}{}", self.base_url, endpoint.path())
    }
}

impl DataSource for RemoteSource {
    fn name(&self) -> &str {
        "remote"
    }

    fn fetch_raw(&self, endpoint: Endpoint) -> Result<String> {
        let url = self.url_for(endpoint);
        let resp = self
            .client
            .get(&url)
            .send()
            .with_context(|| format!("{endpoint} request failed"))?;
        let status = resp.status();
        let body = resp.text().context("failed reading body")?;
        if !status.is_success() {
            return Err(anyhow::anyhow!("http {}: {}", status, body));
        }
        Ok(body)
    }
}

/// Hardcoded datasets used whenever the backend cannot be reached.
#[derive(Debug, Clone, Copy, Default)]
pub struct StaticFallbackSource;

impl DataSource for StaticFallbackSource {
    fn name(&self) -> &str {
        "static fallback"
    }

    fn fetch_raw(&self, endpoint: Endpoint) -> Result<String> {
        Ok(fallback_json(endpoint).to_string())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Origin {
    Primary,
    Fallback,
}

#[derive(Debug, Clone)]
pub struct Loaded<P> {
    pub payload: P,
    pub origin: Origin,
    pub source: String,
    /// Why the primary source was not used, if it was tried.
    pub primary_error: Option<String>,
    pub fetched_at: DateTime<Utc>,
}

pub fn load_from<P: Payload>(source: &dyn DataSource) -> Result<P> {
    let raw = source.fetch_raw(P::ENDPOINT)?;
    P::parse(&raw).with_context(|| format!("decode {} from {}", P::ENDPOINT, source.name()))
}

/// Try the primary source, substituting the fallback on any failure.
pub struct SourceChain<'a> {
    primary: Option<&'a dyn DataSource>,
    fallback: &'a dyn DataSource,
}

impl<'a> SourceChain<'a> {
    pub fn new(primary: Option<&'a dyn DataSource>, fallback: &'a dyn DataSource) -> Self {
        Self { primary, fallback }
    }

    /// Only a failing fallback is reported as an error.
    pub fn load<P: Payload>(&self) -> Result<Loaded<P>> {
        let mut primary_error = None;
        if let Some(primary) = self.primary {
            match load_from::<P>(primary) {
                Ok(payload) => return Ok(self.primary_loaded(primary, payload)),
                Err(err) => {
                    warn!(
                        "{} unavailable from {}, using {}: {err:#}",
                        P::ENDPOINT,
                        primary.name(),
                        self.fallback.name()
                    );
                    primary_error = Some(format!("{err:#}"));
                }
            }
        }
        self.fallback_loaded(primary_error)
    }

    /// Load two payloads in parallel; returns once both have resolved.
    ///
    /// The pair falls back together: if either primary load fails, both
    /// sides come from the fallback and carry the failure as their
    /// `primary_error`.
    pub fn load_pair<A, B>(&self) -> (Result<Loaded<A>>, Result<Loaded<B>>)
    where
        A: Payload + Send,
        B: Payload + Send,
    {
        let Some(primary) = self.primary else {
            return rayon::join(|| self.fallback_loaded::<A>(None), || self.fallback_loaded::<B>(None));
        };

        let (a, b) = rayon::join(|| load_from::<A>(primary), || load_from::<B>(primary));
        let reason = match (a, b) {
            (Ok(a), Ok(b)) => {
                return (Ok(self.primary_loaded(primary, a)), Ok(self.primary_loaded(primary, b)));
            }
            (a, b) => [(A::ENDPOINT, a.err()), (B::ENDPOINT, b.err())]
                .into_iter()
                .filter_map(|(endpoint, err)| err.map(|err| format!("{endpoint}: {err:#}")))
                .collect::<Vec<_>>()
                .join("; "),
        };
        warn!(
            "{} and {} unavailable from {}, using {} for both: {reason}",
            A::ENDPOINT,
            B::ENDPOINT,
            primary.name(),
            self.fallback.name()
        );
        rayon::join(
            || self.fallback_loaded::<A>(Some(reason.clone())),
            || self.fallback_loaded::<B>(Some(reason.clone())),
        )
    }

    fn primary_loaded<P: Payload>(&self, primary: &dyn DataSource, payload: P) -> Loaded<P> {
        info!(
            "loaded {} from {} ({} dropped records)",
            P::ENDPOINT,
            primary.name(),
            payload.issues().len()
        );
        Loaded {
            payload,
            origin: Origin::Primary,
            source: primary.name().to_string(),
            primary_error: None,
            fetched_at: Utc::now(),
        }
    }

    fn fallback_loaded<P: Payload>(&self, primary_error: Option<String>) -> Result<Loaded<P>> {
        let payload = load_from::<P>(self.fallback)?;
        Ok(Loaded {
            payload,
            origin: Origin::Fallback,
            source: self.fallback.name().to_string(),
            primary_error,
            fetched_at: Utc::now(),
        })
    }
}
