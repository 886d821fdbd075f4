//! Static (element, attribute) -> tag mapping tables
//!
//! A [`FieldScheme`] names the record element of a corpus and maps each field
//! element to a tag. Element and attribute names are matched on the lowercased
//! local name, so `tei:biblScope` and `biblscope` resolve identically.

use crate::label::OTHER_TAG;
use std::collections::HashMap;
use std::fmt;
use std::str::FromStr;

/// How a field element resolves to a tag
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FieldRule {
    /// The element name alone decides the tag
    Tag(String),
    /// The value of one of `attributes` decides the tag
    Attribute {
        attributes: Vec<String>,
        cases: Vec<(String, String)>,
        /// Tag used when no attribute value matches; `None` means [`OTHER_TAG`]
        fallback: Option<String>,
    },
}

/// Mapping table for one corpus flavor
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldScheme {
    record_element: String,
    rules: HashMap<String, FieldRule>,
}

impl FieldScheme {
    /// Create an empty scheme whose records are `record_element` elements
    #[must_use = "creates an empty field scheme"]
    pub fn new(record_element: &str) -> Self {
        Self {
            record_element: record_element.to_lowercase(),
            rules: HashMap::new(),
        }
    }

    /// Map each of `elements` directly to `tag`
    #[must_use]
    pub fn with_tag(mut self, elements: &[&str], tag: &str) -> Self {
        for element in elements {
            self.rules
                .insert(element.to_lowercase(), FieldRule::Tag(tag.to_string()));
        }
        self
    }

    /// Map `element` to a tag chosen by the value of one of `attributes`
    #[must_use]
    pub fn with_attribute_rule(
        mut self,
        element: &str,
        attributes: &[&str],
        cases: &[(&str, &str)],
        fallback: Option<&str>,
    ) -> Self {
        self.rules.insert(
            element.to_lowercase(),
            FieldRule::Attribute {
                attributes: attributes.iter().map(|a| a.to_lowercase()).collect(),
                cases: cases
                    .iter()
                    .map(|(value, tag)| ((*value).to_string(), (*tag).to_string()))
                    .collect(),
                fallback: fallback.map(str::to_string),
            },
        );
        self
    }

    /// Lowercased local name of the record element
    #[inline]
    #[must_use]
    pub fn record_element(&self) -> &str {
        &self.record_element
    }

    /// True when `element` has a rule in this scheme
    #[must_use]
    pub fn is_field(&self, element: &str) -> bool {
        self.rules.contains_key(element)
    }

    /// Resolve the tag of a field element from its lowercased local name and attributes
    ///
    /// Unknown elements resolve to [`OTHER_TAG`].
    #[must_use]
    pub fn resolve(&self, element: &str, attributes: &[(String, String)]) -> String {
        match self.rules.get(element) {
            None => OTHER_TAG.to_string(),
            Some(FieldRule::Tag(tag)) => tag.clone(),
            Some(FieldRule::Attribute {
                attributes: names,
                cases,
                fallback,
            }) => attributes
                .iter()
                .filter(|(name, _)| names.iter().any(|n| n == name))
                .find_map(|(_, value)| {
                    cases
                        .iter()
                        .find(|(case, _)| case == value)
                        .map(|(_, tag)| tag.clone())
                })
                .or_else(|| fallback.clone())
                .unwrap_or_else(|| OTHER_TAG.to_string()),
        }
    }

    /// Bibliographical references (`<bibl>` records)
    #[must_use]
    pub fn citation() -> Self {
        Self::new("bibl")
            .with_tag(&["author", "authors"], "<author>")
            .with_tag(&["editor", "editors"], "<editor>")
            .with_tag(&["date"], "<date>")
            .with_tag(&["keyword", "keywords"], "<keyword>")
            .with_tag(&["pubplace"], "<location>")
            .with_tag(&["publisher"], "<publisher>")
            .with_tag(&["idno", "pubnum"], "<pubnum>")
            // Flat legacy field names
            .with_tag(&["journal"], "<journal>")
            .with_tag(&["booktitle"], "<booktitle>")
            .with_tag(&["institution"], "<institution>")
            .with_tag(&["tech"], "<tech>")
            .with_tag(&["volume"], "<volume>")
            .with_tag(&["issue"], "<issue>")
            .with_tag(&["pages", "page"], "<pages>")
            .with_tag(&["web"], "<web>")
            .with_attribute_rule(
                "title",
                &["level"],
                &[
                    ("a", "<title>"),
                    ("j", "<journal>"),
                    ("m", "<booktitle>"),
                    ("s", "<series>"),
                ],
                None,
            )
            .with_attribute_rule(
                "orgname",
                &["type"],
                &[("collaboration", "<collaboration>")],
                Some("<institution>"),
            )
            .with_attribute_rule("note", &["type"], &[("report", "<tech>")], Some("<note>"))
            .with_attribute_rule(
                "biblscope",
                &["unit", "type"],
                &[
                    ("vol", "<volume>"),
                    ("volume", "<volume>"),
                    ("issue", "<issue>"),
                    ("number", "<issue>"),
                    ("pp", "<pages>"),
                    ("page", "<pages>"),
                ],
                None,
            )
            .with_attribute_rule("ptr", &["type"], &[("web", "<web>")], None)
    }

    /// Date expressions (`<date>` records)
    #[must_use]
    pub fn date() -> Self {
        Self::new("date")
            .with_tag(&["day"], "<day>")
            .with_tag(&["month"], "<month>")
            .with_tag(&["year"], "<year>")
    }

    /// Table zones (`<figure>` records)
    #[must_use]
    pub fn table() -> Self {
        Self::new("figure")
            .with_tag(&["head"], "<figure_head>")
            .with_tag(&["label"], "<label>")
            .with_tag(&["figdesc"], "<figDesc>")
            .with_tag(&["table"], "<content>")
            .with_tag(&["note"], "<note>")
    }
}

/// Built-in scheme selector
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum SchemeKind {
    #[default]
    Citation,
    Date,
    Table,
}

impl SchemeKind {
    #[must_use]
    pub fn scheme(self) -> FieldScheme {
        match self {
            Self::Citation => FieldScheme::citation(),
            Self::Date => FieldScheme::date(),
            Self::Table => FieldScheme::table(),
        }
    }
}

impl fmt::Display for SchemeKind {
    #[inline]
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Citation => "citation",
            Self::Date => "date",
            Self::Table => "table",
        };
        write!(f, "{s}")
    }
}

impl FromStr for SchemeKind {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "citation" | "bibl" => Ok(Self::Citation),
            "date" => Ok(Self::Date),
            "table" | "figure" => Ok(Self::Table),
            _ => Err(format!(
                "unknown scheme: '{s}' (expected: citation, date, table)"
            )),
        }
    }
}
