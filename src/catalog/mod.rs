//! Pattern catalog
//!
//! Single source of truth for which symbol shapes map to which legacy async
//! pattern. The catalog is plain data (YAML or JSON); `Classifier` compiles it.
//!
//! 1. The default table is embedded from `resources/catalog.yaml`
//! 2. Projects may load their own table or merge wrapper aliases into the default
//! 3. Rules may depend on other tags (`tagged`), evaluated in dependency order

use std::fmt;
use std::path::Path;
use std::str::FromStr;

use anyhow::{anyhow, bail, Context, Result};
use once_cell::sync::Lazy;
use serde::{Deserialize, Serialize};

/// Embedded default catalog.
const BUILTIN_CATALOG: &str = include_str!("../../resources/catalog.yaml");

static BUILTIN: Lazy<PatternCatalog> = Lazy::new(|| {
    PatternCatalog::from_yaml_str(BUILTIN_CATALOG).expect("embedded catalog must parse")
});

/// Legacy asynchronous pattern a method may use. Tags are not exclusive.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum PatternTag {
    #[serde(rename = "TAP")]
    Tap,
    #[serde(rename = "APMBegin")]
    ApmBegin,
    #[serde(rename = "APMEnd")]
    ApmEnd,
    #[serde(rename = "EAP")]
    Eap,
    TaskCreation,
    ThreadPoolQueue,
    BackgroundWorker,
    ThreadStart,
    ParallelFor,
    ParallelForEach,
    ParallelInvoke,
    AsyncDelegate,
    ISynchronizeInvoke,
    ControlBeginInvoke,
    DispatcherBeginInvoke,
    DispatcherInvoke,
}

/// Grouping of tags by what the legacy code is doing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PatternFamily {
    /// TAP / APM / EAP
    Main,
    /// Moving work to another thread
    Offloading,
    /// Marshalling back to the UI thread
    GuiUpdate,
}

impl PatternTag {
    pub const ALL: [PatternTag; 16] = [
        PatternTag::Tap,
        PatternTag::ApmBegin,
        PatternTag::ApmEnd,
        PatternTag::Eap,
        PatternTag::TaskCreation,
        PatternTag::ThreadPoolQueue,
        PatternTag::BackgroundWorker,
        PatternTag::ThreadStart,
        PatternTag::ParallelFor,
        PatternTag::ParallelForEach,
        PatternTag::ParallelInvoke,
        PatternTag::AsyncDelegate,
        PatternTag::ISynchronizeInvoke,
        PatternTag::ControlBeginInvoke,
        PatternTag::DispatcherBeginInvoke,
        PatternTag::DispatcherInvoke,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            PatternTag::Tap => "TAP",
            PatternTag::ApmBegin => "APMBegin",
            PatternTag::ApmEnd => "APMEnd",
            PatternTag::Eap => "EAP",
            PatternTag::TaskCreation => "TaskCreation",
            PatternTag::ThreadPoolQueue => "ThreadPoolQueue",
            PatternTag::BackgroundWorker => "BackgroundWorker",
            PatternTag::ThreadStart => "ThreadStart",
            PatternTag::ParallelFor => "ParallelFor",
            PatternTag::ParallelForEach => "ParallelForEach",
            PatternTag::ParallelInvoke => "ParallelInvoke",
            PatternTag::AsyncDelegate => "AsyncDelegate",
            PatternTag::ISynchronizeInvoke => "ISynchronizeInvoke",
            PatternTag::ControlBeginInvoke => "ControlBeginInvoke",
            PatternTag::DispatcherBeginInvoke => "DispatcherBeginInvoke",
            PatternTag::DispatcherInvoke => "DispatcherInvoke",
        }
    }

    pub fn family(&self) -> PatternFamily {
        match self {
            PatternTag::Tap | PatternTag::ApmBegin | PatternTag::ApmEnd | PatternTag::Eap => {
                PatternFamily::Main
            }
            PatternTag::ISynchronizeInvoke
            | PatternTag::ControlBeginInvoke
            | PatternTag::DispatcherBeginInvoke
            | PatternTag::DispatcherInvoke => PatternFamily::GuiUpdate,
            _ => PatternFamily::Offloading,
        }
    }
}

impl fmt::Display for PatternTag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for PatternTag {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        PatternTag::ALL
            .iter()
            .copied()
            .find(|tag| tag.as_str() == s.trim())
            .ok_or_else(|| anyhow!("unknown pattern tag: {s}"))
    }
}

// ============================================================================
// Rule data
// ============================================================================

/// Part of the symbol a text condition looks at.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Subject {
    /// Full identity rendering, parameter list included
    Identity,
    QualifiedName,
    Namespace,
    ContainingType,
    MemberName,
    /// Full return type rendering
    ReturnType,
    /// Return type without namespace or generic arguments
    ReturnTypeName,
    /// Simple type name of any parameter
    ParameterTypeName,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TextOp {
    Contains,
    StartsWith,
    EndsWith,
    Equals,
    /// Regular expression
    Matches,
}

/// Text test against one subject. Holds if any value matches.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct TextCondition {
    pub subject: Subject,
    pub op: TextOp,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub value: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub values: Vec<String>,
    #[serde(default, skip_serializing_if = "is_false")]
    pub negate: bool,
    #[serde(default, skip_serializing_if = "is_false")]
    pub ignore_case: bool,
}

impl TextCondition {
    pub fn new(subject: Subject, op: TextOp, value: &str) -> Self {
        Self {
            subject,
            op,
            value: Some(value.to_string()),
            values: Vec::new(),
            negate: false,
            ignore_case: false,
        }
    }

    pub fn negated(mut self) -> Self {
        self.negate = true;
        self
    }

    /// `value` followed by `values`.
    pub fn all_values(&self) -> impl Iterator<Item = &str> {
        self.value.iter().chain(self.values.iter()).map(String::as_str)
    }
}

/// Dependency on another tag's outcome.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct TagCondition {
    pub tag: PatternTag,
    #[serde(default, skip_serializing_if = "is_false")]
    pub negate: bool,
}

/// Conjunction of constraints; unset constraints are ignored.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Clause {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub returns_void: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub returns_task: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub has_declaration: Option<bool>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub text: Vec<TextCondition>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub tagged: Vec<TagCondition>,
}

impl Clause {
    pub fn is_unconstrained(&self) -> bool {
        self.returns_void.is_none()
            && self.returns_task.is_none()
            && self.has_declaration.is_none()
            && self.text.is_empty()
            && self.tagged.is_empty()
    }
}

/// Tag applied when any clause holds.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct TagRule {
    pub tag: PatternTag,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    pub clauses: Vec<Clause>,
}

impl TagRule {
    /// Tags this rule's clauses refer to.
    pub fn dependencies(&self) -> impl Iterator<Item = PatternTag> + '_ {
        self.clauses
            .iter()
            .flat_map(|clause| clause.tagged.iter().map(|dep| dep.tag))
    }
}

fn is_false(value: &bool) -> bool {
    !*value
}

// ============================================================================
// PatternCatalog
// ============================================================================

/// Table of tag rules.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct PatternCatalog {
    #[serde(default)]
    pub rules: Vec<TagRule>,
}

impl PatternCatalog {
    /// Embedded default catalog.
    pub fn builtin() -> &'static PatternCatalog {
        &BUILTIN
    }

    pub fn from_yaml_str(text: &str) -> Result<Self> {
        serde_yaml::from_str(text).context("invalid YAML pattern catalog")
    }

    pub fn from_json_str(text: &str) -> Result<Self> {
        serde_json::from_str(text).context("invalid JSON pattern catalog")
    }

    /// Loads a catalog file; `.json` is read as JSON, anything else as YAML.
    pub fn load(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read pattern catalog {}", path.display()))?;
        let is_json = path
            .extension()
            .and_then(|ext| ext.to_str())
            .is_some_and(|ext| ext.eq_ignore_ascii_case("json"));
        let catalog = if is_json {
            Self::from_json_str(&text)
        } else {
            Self::from_yaml_str(&text)
        };
        catalog.with_context(|| format!("failed to load pattern catalog {}", path.display()))
    }

    pub fn to_yaml_string(&self) -> Result<String> {
        serde_yaml::to_string(self).context("failed to serialize pattern catalog")
    }

    pub fn rule(&self, tag: PatternTag) -> Option<&TagRule> {
        self.rules.iter().find(|rule| rule.tag == tag)
    }

    /// Adds `other`'s rules. Clauses for a tag already present are appended
    /// to the existing rule; new tags are added as new rules.
    pub fn merge(&mut self, other: PatternCatalog) {
        for rule in other.rules {
            match self.rules.iter_mut().find(|existing| existing.tag == rule.tag) {
                Some(existing) => existing.clauses.extend(rule.clauses),
                None => self.rules.push(rule),
            }
        }
    }

    /// Shape checks that do not need compilation.
    pub fn validate(&self) -> Result<()> {
        for (i, rule) in self.rules.iter().enumerate() {
            if self.rules[..i].iter().any(|earlier| earlier.tag == rule.tag) {
                bail!("duplicate rule for tag {}", rule.tag);
            }
            if rule.clauses.is_empty() {
                bail!("rule {} has no clauses", rule.tag);
            }
            for clause in &rule.clauses {
                if clause.is_unconstrained() {
                    bail!("rule {} has a clause without constraints", rule.tag);
                }
                for text in &clause.text {
                    if text.all_values().next().is_none() {
                        bail!("rule {}: {:?} condition has no value", rule.tag, text.subject);
                    }
                }
            }
        }
        Ok(())
    }
}
