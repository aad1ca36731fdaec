//! Typed library metadata.
//!
//! These types follow the CDISC Library JSON shape so documents fetched from
//! the library (or read from disk) deserialize directly:
//!
//! ```text
//! model:    { "datasets": [{ "name": "AE", "datasetVariables": [...] }],
//!             "classes":  [{ "name": "Events", "classVariables": [...] }] }
//! standard: { "domains": ["AE", "DM"], "classes": [{ "name": ..., "datasets": [...] }] }
//! ct:       { "package": "sdtmct-2020-03-27",
//!             "C49487": { "extensible": false, "allowed_terms": ["A", "B"] } }
//! ```

use std::collections::{BTreeMap, BTreeSet};
use std::fmt;

use serde::{Deserialize, Deserializer, Serialize};

/// Name of the class holding identifier and timing variables shared by
/// every general observation class.
pub const GENERAL_OBSERVATIONS_CLASS: &str = "GENERAL OBSERVATIONS";

// =============================================================================
// Variables
// =============================================================================

/// Role of a model variable.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum VariableRole {
    Identifier,
    Topic,
    Timing,
    GroupingQualifier,
    ResultQualifier,
    SynonymQualifier,
    RecordQualifier,
    VariableQualifier,
    Rule,
}

impl VariableRole {
    /// Parse a library role label, case-insensitively.
    pub fn parse(label: &str) -> Option<Self> {
        let normalized = label.trim().to_ascii_lowercase();
        let role = match normalized.as_str() {
            "identifier" => Self::Identifier,
            "topic" => Self::Topic,
            "timing" => Self::Timing,
            "grouping qualifier" => Self::GroupingQualifier,
            "result qualifier" => Self::ResultQualifier,
            "synonym qualifier" => Self::SynonymQualifier,
            "record qualifier" => Self::RecordQualifier,
            "variable qualifier" => Self::VariableQualifier,
            "rule" => Self::Rule,
            _ => return None,
        };
        Some(role)
    }
}

/// A variable of a model dataset or class.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModelVariable {
    pub name: String,
    /// Position within its dataset or class. The library sends this as a
    /// number or a numeric string.
    #[serde(default, deserialize_with = "deserialize_ordinal")]
    pub ordinal: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub role: Option<String>,
}

impl ModelVariable {
    pub fn role(&self) -> Option<VariableRole> {
        self.role.as_deref().and_then(VariableRole::parse)
    }

    pub fn has_role(&self, role: VariableRole) -> bool {
        self.role() == Some(role)
    }
}

fn deserialize_ordinal<'de, D>(deserializer: D) -> Result<Option<u32>, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Raw {
        Number(u32),
        Text(String),
    }

    Ok(match Option::<Raw>::deserialize(deserializer)? {
        Some(Raw::Number(n)) => Some(n),
        Some(Raw::Text(text)) => text.trim().parse().ok(),
        None => None,
    })
}

/// Variable names sorted by ordinal. Variables without an ordinal sort last;
/// ties keep declaration order.
pub fn names_by_ordinal(variables: &[ModelVariable]) -> Vec<String> {
    let mut sorted: Vec<&ModelVariable> = variables.iter().collect();
    sorted.sort_by_key(|v| v.ordinal.unwrap_or(u32::MAX));
    sorted.into_iter().map(|v| v.name.clone()).collect()
}

// =============================================================================
// Model metadata
// =============================================================================

/// A dataset defined by the model.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModelDataset {
    pub name: String,
    #[serde(rename = "datasetVariables", default)]
    pub variables: Vec<ModelVariable>,
    /// Observation class the dataset belongs to.
    #[serde(rename = "parentClass", default, skip_serializing_if = "Option::is_none")]
    pub parent_class: Option<String>,
}

/// A class of the model with its generic (`--` prefixed) variables.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModelClass {
    pub name: String,
    #[serde(rename = "classVariables", default)]
    pub variables: Vec<ModelVariable>,
}

/// Data model metadata for one standard version.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ModelMetadata {
    #[serde(default)]
    pub datasets: Vec<ModelDataset>,
    #[serde(default)]
    pub classes: Vec<ModelClass>,
}

impl ModelMetadata {
    /// Dataset by domain name.
    pub fn dataset(&self, domain: &str) -> Option<&ModelDataset> {
        self.datasets
            .iter()
            .find(|d| d.name.eq_ignore_ascii_case(domain))
    }

    /// Class by name, ignoring case.
    pub fn class(&self, name: &str) -> Option<&ModelClass> {
        self.classes
            .iter()
            .find(|c| c.name.eq_ignore_ascii_case(name))
    }
}

// =============================================================================
// Observation classes
// =============================================================================

/// Observation classes the engine distinguishes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ObservationClass {
    Interventions,
    Events,
    Findings,
    FindingsAbout,
    SpecialPurpose,
    TrialDesign,
    Relationship,
    StudyReference,
}

impl ObservationClass {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Interventions => "INTERVENTIONS",
            Self::Events => "EVENTS",
            Self::Findings => "FINDINGS",
            Self::FindingsAbout => "FINDINGS ABOUT",
            Self::SpecialPurpose => "SPECIAL-PURPOSE",
            Self::TrialDesign => "TRIAL DESIGN",
            Self::Relationship => "RELATIONSHIP",
            Self::StudyReference => "STUDY REFERENCE",
        }
    }

    /// Parse a class name, case-insensitively.
    pub fn parse(name: &str) -> Option<Self> {
        let upper = name.trim().to_ascii_uppercase().replace('_', " ");
        let class = match upper.as_str() {
            "INTERVENTIONS" => Self::Interventions,
            "EVENTS" => Self::Events,
            "FINDINGS" => Self::Findings,
            "FINDINGS ABOUT" => Self::FindingsAbout,
            "SPECIAL-PURPOSE" | "SPECIAL PURPOSE" => Self::SpecialPurpose,
            "TRIAL DESIGN" => Self::TrialDesign,
            "RELATIONSHIP" => Self::Relationship,
            "STUDY REFERENCE" => Self::StudyReference,
            _ => return None,
        };
        Some(class)
    }

    /// Whether the class inherits the general observation identifiers and
    /// timing variables.
    pub fn is_general_observation(&self) -> bool {
        matches!(
            self,
            Self::Interventions | Self::Events | Self::Findings | Self::FindingsAbout
        )
    }

    /// Detect the class of a custom domain from its topic variable.
    pub fn detect(domain: &str, columns: &[String]) -> Option<Self> {
        let has = |suffix: &str| {
            let name = format!("{domain}{suffix}");
            columns.iter().any(|c| *c == name)
        };
        if has("TRT") {
            Some(Self::Interventions)
        } else if has("TERM") {
            Some(Self::Events)
        } else if has("TESTCD") {
            if has("OBJ") {
                Some(Self::FindingsAbout)
            } else {
                Some(Self::Findings)
            }
        } else {
            None
        }
    }
}

impl fmt::Display for ObservationClass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// =============================================================================
// Standard metadata
// =============================================================================

/// A dataset listed under a standard class.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StandardDataset {
    pub name: String,
}

/// A class of the standard with the datasets it contains.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StandardClass {
    pub name: String,
    #[serde(default)]
    pub datasets: Vec<StandardDataset>,
}

/// Implementation guide metadata for one standard version.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct StandardMetadata {
    /// Domains defined by the standard.
    #[serde(default)]
    pub domains: BTreeSet<String>,
    #[serde(default)]
    pub classes: Vec<StandardClass>,
}

impl StandardMetadata {
    pub fn from_domains<I, S>(domains: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            domains: domains.into_iter().map(Into::into).collect(),
            classes: Vec::new(),
        }
    }

    /// Every known domain: the explicit list plus datasets under classes.
    pub fn domain_names(&self) -> BTreeSet<&str> {
        self.domains
            .iter()
            .map(String::as_str)
            .chain(
                self.classes
                    .iter()
                    .flat_map(|c| c.datasets.iter().map(|d| d.name.as_str())),
            )
            .collect()
    }

    pub fn has_domain(&self, domain: &str) -> bool {
        self.domain_names().contains(domain)
    }

    /// Name of the class a domain is listed under.
    pub fn class_of(&self, domain: &str) -> Option<&str> {
        self.classes
            .iter()
            .find(|c| c.datasets.iter().any(|d| d.name == domain))
            .map(|c| c.name.as_str())
    }
}

// =============================================================================
// Controlled terminology
// =============================================================================

/// One codelist of a CT package.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Codelist {
    #[serde(default)]
    pub extensible: bool,
    #[serde(default)]
    pub allowed_terms: Vec<String>,
}

/// A controlled-terminology package: codelist code to codelist.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CtPackage {
    pub package: String,
    #[serde(flatten)]
    pub codelists: BTreeMap<String, Codelist>,
}

impl CtPackage {
    pub fn new(package: impl Into<String>) -> Self {
        Self {
            package: package.into(),
            codelists: BTreeMap::new(),
        }
    }

    #[must_use]
    pub fn with_codelist<I, S>(mut self, code: impl Into<String>, extensible: bool, terms: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.codelists.insert(
            code.into(),
            Codelist {
                extensible,
                allowed_terms: terms.into_iter().map(Into::into).collect(),
            },
        );
        self
    }

    pub fn codes(&self) -> impl Iterator<Item = &str> {
        self.codelists.keys().map(String::as_str)
    }

    pub fn codelist(&self, code: &str) -> Option<&Codelist> {
        self.codelists.get(code)
    }
}
