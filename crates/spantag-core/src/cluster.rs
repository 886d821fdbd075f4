//! BIO cluster builder
//!
//! Groups labeled containers into maximal contiguous spans of one tag. A new
//! cluster starts at the first container, at every container flagged as a
//! beginning (two adjacent authors stay apart), and at every tag change.
//! Clusters always partition their input exactly.

use crate::label::{Label, BEGINNING_PREFIX};
use crate::token::Token;
use serde::Serialize;

/// A label and the contiguous tokens it covers
///
/// Covers one content token plus the separator tokens before it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LabeledTokens<'a> {
    label: Label,
    tokens: &'a [Token],
}

impl<'a> LabeledTokens<'a> {
    #[must_use]
    pub fn new(label: Label, tokens: &'a [Token]) -> Self {
        Self { label, tokens }
    }

    #[inline]
    #[must_use]
    pub fn label(&self) -> &Label {
        &self.label
    }

    #[inline]
    #[must_use]
    pub fn tag(&self) -> &str {
        self.label.tag()
    }

    #[inline]
    #[must_use]
    pub fn is_beginning(&self) -> bool {
        self.label.is_beginning()
    }

    #[inline]
    #[must_use]
    pub fn tokens(&self) -> &'a [Token] {
        self.tokens
    }
}

/// Maximal run of containers sharing one tag
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Cluster<'a> {
    tag: String,
    containers: Vec<LabeledTokens<'a>>,
    /// Index of the first covered token in the whole input
    start: usize,
}

impl<'a> Cluster<'a> {
    fn open(container: LabeledTokens<'a>, start: usize) -> Self {
        Self {
            tag: container.tag().to_string(),
            containers: vec![container],
            start,
        }
    }

    /// Tag shared by every container, without the beginning prefix
    #[inline]
    #[must_use]
    pub fn label(&self) -> &str {
        &self.tag
    }

    #[inline]
    #[must_use]
    pub fn containers(&self) -> &[LabeledTokens<'a>] {
        &self.containers
    }

    /// Every covered token, in order
    pub fn tokens(&self) -> impl Iterator<Item = &'a Token> + '_ {
        self.containers.iter().flat_map(|c| c.tokens().iter())
    }

    /// Concatenated raw token text, trimmed
    #[must_use]
    pub fn text(&self) -> String {
        let text: String = self.tokens().map(Token::text).collect();
        text.trim().to_string()
    }

    /// Number of containers
    #[inline]
    #[must_use]
    pub fn len(&self) -> usize {
        self.containers.len()
    }

    /// Always false, a cluster holds at least one container
    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.containers.is_empty()
    }

    /// Token index range `[start, end)` covered in the clustered input
    #[must_use]
    pub fn token_range(&self) -> (usize, usize) {
        let count: usize = self.containers.iter().map(|c| c.tokens().len()).sum();
        (self.start, self.start + count)
    }

    #[must_use]
    pub fn to_span(&self) -> ClusterSpan {
        let (start, end) = self.token_range();
        ClusterSpan {
            label: self.tag.clone(),
            text: self.text(),
            start,
            end,
        }
    }
}

/// Serializable summary of a cluster
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ClusterSpan {
    pub label: String,
    pub text: String,
    pub start: usize,
    pub end: usize,
}

/// Cluster selection by tag
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum ClusterFilter {
    #[default]
    All,
    /// Keep clusters with exactly this tag
    Label(String),
    /// Drop clusters with any of these tags
    Excluding(Vec<String>),
}

fn bare_tag(tag: &str) -> &str {
    tag.strip_prefix(BEGINNING_PREFIX).unwrap_or(tag)
}

impl ClusterFilter {
    #[must_use]
    pub fn label(tag: &str) -> Self {
        Self::Label(bare_tag(tag).to_string())
    }

    #[must_use]
    pub fn excluding(tags: &[&str]) -> Self {
        Self::Excluding(tags.iter().map(|t| bare_tag(t).to_string()).collect())
    }

    #[must_use]
    pub fn matches(&self, cluster: &Cluster<'_>) -> bool {
        match self {
            Self::All => true,
            Self::Label(tag) => cluster.label() == tag,
            Self::Excluding(tags) => !tags.iter().any(|t| t == cluster.label()),
        }
    }
}

/// Builds clusters from containers in document order
#[derive(Debug, Clone, Default)]
pub struct ClusterBuilder {
    filter: ClusterFilter,
}

impl ClusterBuilder {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Only return clusters accepted by `filter`; partitioning is unaffected
    #[must_use]
    pub fn with_filter(mut self, filter: ClusterFilter) -> Self {
        self.filter = filter;
        self
    }

    /// Partition `containers` into clusters
    pub fn cluster<'a, I>(&self, containers: I) -> Vec<Cluster<'a>>
    where
        I: IntoIterator<Item = LabeledTokens<'a>>,
    {
        let mut clusters: Vec<Cluster<'a>> = Vec::new();
        let mut previous: Option<String> = None;
        let mut position = 0;

        for container in containers {
            let width = container.tokens().len();
            let starts_new = match &previous {
                None => true,
                Some(tag) => container.is_beginning() || container.tag() != tag,
            };

            if starts_new {
                previous = Some(container.tag().to_string());
                clusters.push(Cluster::open(container, position));
            } else if let Some(current) = clusters.last_mut() {
                current.containers.push(container);
            }
            position += width;
        }

        if self.filter != ClusterFilter::All {
            clusters.retain(|c| self.filter.matches(c));
        }
        clusters
    }
}
