//! Accept-Language normalization.
//!
//! # Responsibilities
//! - Leave requests that already carry a non-blank `Accept-Language` alone
//! - Otherwise derive a locale from the first `locale` query parameter,
//!   falling back to the configured default, and inject it as the header
//!
//! # Design Decisions
//! - Tags are canonicalized (`fr_fr` → `fr-FR`) before being forwarded
//! - An unparseable `locale` parameter behaves as if it were absent
//! - The query string is left untouched; stripping it is `QueryStripper`'s job

use std::fmt;
use std::str::FromStr;

use axum::http::{header, HeaderValue};

use crate::filter::{Filter, FilterError, FilterOutcome};
use crate::http::GatewayRequest;

/// Query parameter consulted when the header is missing.
pub const LOCALE_PARAM: &str = "locale";

/// A syntactically valid BCP 47 language tag in canonical case.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct LanguageTag(String);

impl LanguageTag {
    /// Parse and canonicalize a tag. `_` is accepted as a subtag separator.
    pub fn parse(raw: &str) -> Option<Self> {
        let raw = raw.trim();
        if raw.is_empty() {
            return None;
        }

        let mut out = Vec::new();
        for (i, subtag) in raw.split(['-', '_']).enumerate() {
            if subtag.is_empty() || subtag.len() > 8 || !subtag.bytes().all(|b| b.is_ascii_alphanumeric()) {
                return None;
            }
            let canonical = if i == 0 {
                if subtag.len() < 2 || !subtag.bytes().all(|b| b.is_ascii_alphabetic()) {
                    return None;
                }
                subtag.to_ascii_lowercase()
            } else if subtag.len() == 2 && subtag.bytes().all(|b| b.is_ascii_alphabetic()) {
                // region
                subtag.to_ascii_uppercase()
            } else if subtag.len() == 4 && subtag.bytes().all(|b| b.is_ascii_alphabetic()) {
                // script
                let lower = subtag.to_ascii_lowercase();
                format!("{}{}", lower[..1].to_ascii_uppercase(), &lower[1..])
            } else {
                subtag.to_ascii_lowercase()
            };
            out.push(canonical);
        }

        Some(Self(out.join("-")))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl FromStr for LanguageTag {
    type Err = FilterError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s).ok_or_else(|| FilterError::InvalidConfig {
            filter: "locale",
            reason: format!("{:?} is not a valid language tag", s),
        })
    }
}

impl fmt::Display for LanguageTag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Injects `Accept-Language` when the client did not send one.
#[derive(Debug, Clone)]
pub struct LocaleNormalizer {
    default_locale: LanguageTag,
}

impl LocaleNormalizer {
    pub fn new(default_locale: LanguageTag) -> Self {
        Self { default_locale }
    }

    pub fn with_default(default_locale: &str) -> Result<Self, FilterError> {
        Ok(Self::new(default_locale.parse()?))
    }

    pub fn default_locale(&self) -> &LanguageTag {
        &self.default_locale
    }

    fn has_accept_language(request: &GatewayRequest) -> bool {
        request
            .headers()
            .get_all(header::ACCEPT_LANGUAGE)
            .iter()
            .any(|v| !v.as_bytes().iter().all(u8::is_ascii_whitespace))
    }
}

impl Filter for LocaleNormalizer {
    fn name(&self) -> &'static str {
        "locale"
    }

    fn apply(&self, request: &GatewayRequest) -> Result<FilterOutcome, FilterError> {
        if Self::has_accept_language(request) {
            tracing::debug!(
                request_id = %request.request_id(),
                accept_language = ?request.headers().get(header::ACCEPT_LANGUAGE),
                "Accept-Language already present"
            );
            return Ok(FilterOutcome::Continue(request.clone()));
        }

        let locale = request
            .query()
            .first(LOCALE_PARAM)
            .and_then(LanguageTag::parse)
            .unwrap_or_else(|| self.default_locale.clone());

        let value = HeaderValue::from_str(locale.as_str()).map_err(|e| FilterError::Failed {
            filter: "locale",
            reason: e.to_string(),
        })?;

        tracing::info!(
            request_id = %request.request_id(),
            accept_language = %locale,
            "Injected Accept-Language header"
        );

        Ok(FilterOutcome::Continue(
            request.clone().with_header(header::ACCEPT_LANGUAGE, value),
        ))
    }
}
