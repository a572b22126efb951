//! Pipeline configuration.

use chrono::NaiveDate;

use pubrag_core::{defaults, DateRange, Error, Result};

/// Tunables for one pipeline run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PipelineConfig {
    /// Live articles requested from the literature database.
    pub result_limit: usize,
    /// Nearest neighbors requested from the semantic cache.
    pub lookup_k: usize,
    /// Concurrent per-article fetches.
    pub fetch_concurrency: usize,
    /// Publication window used when the query names no dates.
    pub date_range: DateRange,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            result_limit: defaults::RESULT_LIMIT,
            lookup_k: defaults::LOOKUP_K,
            fetch_concurrency: defaults::FETCH_CONCURRENCY,
            date_range: DateRange::default(),
        }
    }
}

impl PipelineConfig {
    /// Read `PUBRAG_*` environment variables over the defaults.
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Build from an arbitrary variable source.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let number = |name: &str, default: usize| -> Result<usize> {
            match lookup(name) {
                Some(raw) => raw.trim().parse().map_err(|_| {
                    Error::Config(format!("{} must be a non-negative integer, got {:?}", name, raw))
                }),
                None => Ok(default),
            }
        };

        let start = lookup("PUBRAG_DATE_START")
            .unwrap_or_else(|| defaults::DATE_RANGE_START.to_string());
        let end =
            lookup("PUBRAG_DATE_END").unwrap_or_else(|| defaults::DATE_RANGE_END.to_string());

        let config = Self {
            result_limit: number("PUBRAG_RESULT_LIMIT", defaults::RESULT_LIMIT)?,
            lookup_k: number("PUBRAG_LOOKUP_K", defaults::LOOKUP_K)?,
            fetch_concurrency: number("PUBRAG_FETCH_CONCURRENCY", defaults::FETCH_CONCURRENCY)?,
            date_range: DateRange::new(start.trim(), end.trim()),
        };
        config.validate()?;
        Ok(config)
    }

    /// Check the date window and concurrency.
    pub fn validate(&self) -> Result<()> {
        if self.fetch_concurrency == 0 {
            return Err(Error::Config(
                "PUBRAG_FETCH_CONCURRENCY must be at least 1".to_string(),
            ));
        }

        let start = parse_date("PUBRAG_DATE_START", self.date_range.start.as_deref())?;
        let end = parse_date("PUBRAG_DATE_END", self.date_range.end.as_deref())?;
        if start > end {
            return Err(Error::Config(format!(
                "date window starts after it ends: {}",
                self.date_range
            )));
        }
        Ok(())
    }
}

fn parse_date(name: &str, value: Option<&str>) -> Result<NaiveDate> {
    let value = value.ok_or_else(|| Error::Config(format!("{} is not set", name)))?;
    NaiveDate::parse_from_str(value, "%Y-%m-%d")
        .map_err(|e| Error::Config(format!("{} must be YYYY-MM-DD, got {:?}: {}", name, value, e)))
}
