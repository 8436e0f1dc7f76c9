#![deny(unsafe_code)]
#![warn(missing_docs)]
#![doc = include_str!("../README.md")]

use std::sync::OnceLock;

pub use regex_tagged::{BuildError, ParseError};

mod catalog;
pub use catalog::Crawler;

/// The curated crawler catalog shipped with the crate.
const CRAWLERS_JSON: &str = include_str!("../crawler-user-agents.json");

/// Error returned when building a [`Detector`] fails.
#[derive(Debug)]
pub enum Error {
    /// The catalog could not be deserialized: malformed JSON, an
    /// empty pattern, or a malformed addition date.
    Catalog(serde_json::Error),
    /// A catalog pattern could not be parsed or indexed.
    ParseError(ParseError),
    /// The literal index could not be built.
    BuildError(BuildError),
}
impl std::error::Error for Error {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Error::Catalog(c) => Some(c),
            Error::ParseError(p) => Some(p),
            Error::BuildError(b) => Some(b),
        }
    }
}
impl std::fmt::Display for Error {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{self:?}")
    }
}
impl From<serde_json::Error> for Error {
    fn from(value: serde_json::Error) -> Self {
        Self::Catalog(value)
    }
}
impl From<ParseError> for Error {
    fn from(value: ParseError) -> Self {
        Self::ParseError(value)
    }
}
impl From<BuildError> for Error {
    fn from(value: BuildError) -> Self {
        Self::BuildError(value)
    }
}

/// Crawler detector: a catalog compiled into a literal-tagging
/// pattern index, queried through [`Detector::is_crawler`] and
/// [`Detector::matching_crawlers`].
///
/// Most users want the free functions of the same names, which run
/// against the embedded catalog; building a `Detector` explicitly is
/// for embedders bringing their own catalog.
#[derive(Debug)]
pub struct Detector {
    patterns: regex_tagged::Patterns,
}

impl Detector {
    /// Builds a detector from catalog records.
    pub fn from_crawlers<'a, I>(crawlers: I) -> Result<Self, Error>
    where
        I: IntoIterator<Item = &'a Crawler>,
    {
        let builder = crawlers
            .into_iter()
            .try_fold(regex_tagged::Builder::new(), |b, c| b.push(&c.pattern))?;
        Ok(Self {
            patterns: builder.build()?,
        })
    }

    /// Parses a JSON catalog (an array of records in the
    /// `crawler-user-agents.json` shape) and builds a detector from
    /// it.
    pub fn from_json(json: &str) -> Result<Self, Error> {
        let crawlers: Vec<Crawler> = serde_json::from_str(json)?;
        Self::from_crawlers(&crawlers)
    }

    /// Returns whether the User-Agent matches any catalog pattern.
    pub fn is_crawler(&self, user_agent: &str) -> bool {
        self.patterns.is_match(user_agent)
    }

    /// Returns the index of every catalog pattern matching the
    /// User-Agent, each at most once, ordered by the hit that first
    /// proved it in the scan.
    pub fn matching_crawlers(&self, user_agent: &str) -> Vec<usize> {
        self.patterns.matching(user_agent)
    }
}

/// The loaded crawler catalog, in the order the indices returned by
/// [`matching_crawlers`] refer to.
///
/// Parsed from the embedded JSON on first use.
pub fn crawlers() -> &'static [Crawler] {
    static CRAWLERS: OnceLock<Vec<Crawler>> = OnceLock::new();
    CRAWLERS.get_or_init(|| {
        serde_json::from_str(CRAWLERS_JSON).expect("embedded crawler catalog deserializes")
    })
}

fn detector() -> &'static Detector {
    static DETECTOR: OnceLock<Detector> = OnceLock::new();
    DETECTOR
        .get_or_init(|| Detector::from_crawlers(crawlers()).expect("embedded crawler catalog builds"))
}

/// Returns whether the User-Agent string matches any pattern of the
/// embedded catalog.
pub fn is_crawler(user_agent: &str) -> bool {
    detector().is_crawler(user_agent)
}

/// Finds all crawlers matching the User-Agent string and returns
/// their indices into [`crawlers()`], each at most once, in scan
/// order of the hit that first proved it.
pub fn matching_crawlers(user_agent: &str) -> Vec<usize> {
    detector().matching_crawlers(user_agent)
}
