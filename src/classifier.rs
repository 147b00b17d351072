// ============================================================================
// Symbol classifier - compiled pattern catalog
// ============================================================================
//
// `Classifier::new` compiles a `PatternCatalog` once:
// - regexes are built up front
// - rules are ordered so every `tagged` dependency is decided first
//   (TaskCreation before TAP, AsyncDelegate before APMBegin)
// - dependency cycles are rejected
//
// Classification itself is pure and never fails.

use std::collections::{BTreeSet, HashMap};

use anyhow::{bail, Context, Result};
use once_cell::sync::Lazy;
use rayon::prelude::*;
use regex::{Regex, RegexBuilder};
use serde::Serialize;
use tracing::{debug, trace};

use crate::catalog::{Clause, PatternCatalog, PatternTag, Subject, TagCondition, TextCondition, TextOp};
use crate::qualifier::Invocation;
use crate::symbol::{simple_type_name, MethodIdentity, MethodSymbol};

static DEFAULT_CLASSIFIER: Lazy<Classifier> = Lazy::new(|| {
    Classifier::new(PatternCatalog::builtin()).expect("embedded catalog must compile")
});

/// Tags plus the auxiliary facts the rules were evaluated against.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Classification {
    pub tags: BTreeSet<PatternTag>,
    pub returns_task: bool,
    pub has_declaration: bool,
    /// Task-returning method with no source body in scope.
    ///
    /// Cross-project references look like this too, which is a known source
    /// of false TAP positives.
    pub is_external_task: bool,
}

pub struct Classifier {
    /// In evaluation order.
    rules: Vec<CompiledRule>,
}

struct CompiledRule {
    tag: PatternTag,
    clauses: Vec<CompiledClause>,
}

struct CompiledClause {
    returns_void: Option<bool>,
    returns_task: Option<bool>,
    has_declaration: Option<bool>,
    text: Vec<CompiledText>,
    tagged: Vec<TagCondition>,
}

struct CompiledText {
    subject: Subject,
    matcher: Matcher,
    negate: bool,
    ignore_case: bool,
}

enum Matcher {
    Literal { op: TextOp, values: Vec<String> },
    Regex(Vec<Regex>),
}

/// Symbol data the rules look at, extracted once per classification.
struct SymbolFacts<'a> {
    identity: &'a str,
    parsed: MethodIdentity,
    qualified_name: String,
    return_type: &'a str,
    parameter_types: Vec<&'a str>,
    returns_void: bool,
    returns_task: bool,
    has_declaration: bool,
}

impl Classifier {
    pub fn new(catalog: &PatternCatalog) -> Result<Self> {
        catalog.validate()?;

        let mut compiled = Vec::with_capacity(catalog.rules.len());
        for rule in &catalog.rules {
            let clauses = rule
                .clauses
                .iter()
                .map(compile_clause)
                .collect::<Result<Vec<_>>>()
                .with_context(|| format!("failed to compile rule {}", rule.tag))?;
            compiled.push(CompiledRule { tag: rule.tag, clauses });
        }

        let order = evaluation_order(catalog)?;
        let mut slots: Vec<Option<CompiledRule>> = compiled.into_iter().map(Some).collect();
        let rules: Vec<CompiledRule> = order.into_iter().filter_map(|i| slots[i].take()).collect();

        debug!(
            rules = rules.len(),
            order = ?rules.iter().map(|r| r.tag.as_str()).collect::<Vec<_>>(),
            "pattern catalog compiled"
        );
        Ok(Self { rules })
    }

    /// Shared classifier over the embedded catalog.
    pub fn default_catalog() -> &'static Classifier {
        &DEFAULT_CLASSIFIER
    }

    /// Tags in evaluation order.
    pub fn evaluation_order(&self) -> Vec<PatternTag> {
        self.rules.iter().map(|rule| rule.tag).collect()
    }

    pub fn classify<S: MethodSymbol + ?Sized>(&self, method: &S) -> BTreeSet<PatternTag> {
        self.analyze(method).tags
    }

    pub fn analyze<S: MethodSymbol + ?Sized>(&self, method: &S) -> Classification {
        let facts = SymbolFacts::of(method);
        let mut tags = BTreeSet::new();
        for rule in &self.rules {
            if rule.clauses.iter().any(|clause| clause.holds(&facts, &tags)) {
                tags.insert(rule.tag);
            }
        }
        trace!(identity = facts.identity, tags = ?tags, "classified method");

        Classification {
            tags,
            returns_task: facts.returns_task,
            has_declaration: facts.has_declaration,
            is_external_task: facts.returns_task && !facts.has_declaration,
        }
    }

    /// Classifies independent methods in parallel; output order follows input.
    pub fn classify_all<S: MethodSymbol + Sync>(&self, methods: &[S]) -> Vec<BTreeSet<PatternTag>> {
        methods.par_iter().map(|method| self.classify(method)).collect()
    }

    /// Symbol tags at a call site, plus `EAP` when the invocation follows the
    /// `XAsync` / `XCompleted` convention.
    pub fn classify_call_site<S: MethodSymbol + ?Sized>(
        &self,
        method: &S,
        invocation: &Invocation<'_>,
    ) -> BTreeSet<PatternTag> {
        let mut tags = self.classify(method);
        if invocation.is_eap() {
            tags.insert(PatternTag::Eap);
        }
        tags
    }
}

impl<'a> SymbolFacts<'a> {
    fn of<S: MethodSymbol + ?Sized>(method: &'a S) -> Self {
        let parsed = method.method_identity();
        Self {
            identity: method.identity(),
            qualified_name: parsed.qualified_name(),
            parsed,
            return_type: method.return_type(),
            parameter_types: method
                .parameters()
                .iter()
                .map(|p| p.simple_type_name())
                .collect(),
            returns_void: method.returns_void(),
            returns_task: method.returns_task(),
            has_declaration: method.declaring_node_count() > 0,
        }
    }

    /// True when `test` holds for some value of `subject`.
    fn any_subject(&self, subject: Subject, mut test: impl FnMut(&str) -> bool) -> bool {
        match subject {
            Subject::Identity => test(self.identity),
            Subject::QualifiedName => test(&self.qualified_name),
            Subject::Namespace => test(&self.parsed.namespace),
            Subject::ContainingType => test(&self.parsed.containing_type),
            Subject::MemberName => test(&self.parsed.member),
            Subject::ReturnType => test(self.return_type),
            Subject::ReturnTypeName => test(simple_type_name(self.return_type)),
            Subject::ParameterTypeName => self.parameter_types.iter().any(|ty| test(ty)),
        }
    }
}

impl CompiledClause {
    fn holds(&self, facts: &SymbolFacts<'_>, decided: &BTreeSet<PatternTag>) -> bool {
        if self.returns_void.is_some_and(|want| want != facts.returns_void) {
            return false;
        }
        if self.returns_task.is_some_and(|want| want != facts.returns_task) {
            return false;
        }
        if self.has_declaration.is_some_and(|want| want != facts.has_declaration) {
            return false;
        }
        if !self
            .tagged
            .iter()
            .all(|dep| decided.contains(&dep.tag) != dep.negate)
        {
            return false;
        }
        self.text.iter().all(|text| text.holds(facts))
    }
}

impl CompiledText {
    fn holds(&self, facts: &SymbolFacts<'_>) -> bool {
        let matched = facts.any_subject(self.subject, |candidate| {
            if self.ignore_case {
                self.matcher.matches(&candidate.to_lowercase())
            } else {
                self.matcher.matches(candidate)
            }
        });
        matched != self.negate
    }
}

impl Matcher {
    fn matches(&self, candidate: &str) -> bool {
        match self {
            Matcher::Literal { op, values } => values.iter().any(|value| match op {
                TextOp::Contains => candidate.contains(value.as_str()),
                TextOp::StartsWith => candidate.starts_with(value.as_str()),
                TextOp::EndsWith => candidate.ends_with(value.as_str()),
                TextOp::Equals => candidate == value.as_str(),
                TextOp::Matches => false,
            }),
            Matcher::Regex(regexes) => regexes.iter().any(|re| re.is_match(candidate)),
        }
    }
}

fn compile_clause(clause: &Clause) -> Result<CompiledClause> {
    Ok(CompiledClause {
        returns_void: clause.returns_void,
        returns_task: clause.returns_task,
        has_declaration: clause.has_declaration,
        text: clause.text.iter().map(compile_text).collect::<Result<_>>()?,
        tagged: clause.tagged.clone(),
    })
}

fn compile_text(text: &TextCondition) -> Result<CompiledText> {
    let matcher = match text.op {
        TextOp::Matches => Matcher::Regex(
            text.all_values()
                .map(|pattern| {
                    RegexBuilder::new(pattern)
                        .case_insensitive(text.ignore_case)
                        .build()
                        .with_context(|| format!("invalid regex {pattern:?}"))
                })
                .collect::<Result<_>>()?,
        ),
        op => Matcher::Literal {
            op,
            values: text
                .all_values()
                .map(|value| {
                    if text.ignore_case {
                        value.to_lowercase()
                    } else {
                        value.to_string()
                    }
                })
                .collect(),
        },
    };
    Ok(CompiledText {
        subject: text.subject,
        matcher,
        negate: text.negate,
        // regexes handle case themselves
        ignore_case: text.ignore_case && text.op != TextOp::Matches,
    })
}

/// Topological order of rule indices (Kahn), stable with respect to catalog
/// order. Dependencies on tags without a rule are ignored.
fn evaluation_order(catalog: &PatternCatalog) -> Result<Vec<usize>> {
    let index: HashMap<PatternTag, usize> = catalog
        .rules
        .iter()
        .enumerate()
        .map(|(i, rule)| (rule.tag, i))
        .collect();

    let n = catalog.rules.len();
    let mut pending = vec![0usize; n];
    let mut dependents: Vec<Vec<usize>> = vec![Vec::new(); n];
    for (i, rule) in catalog.rules.iter().enumerate() {
        let deps: BTreeSet<usize> = rule
            .dependencies()
            .filter_map(|tag| index.get(&tag).copied())
            .collect();
        pending[i] = deps.len();
        for dep in deps {
            dependents[dep].push(i);
        }
    }

    let mut ready: BTreeSet<usize> = (0..n).filter(|&i| pending[i] == 0).collect();
    let mut order = Vec::with_capacity(n);
    while let Some(i) = ready.pop_first() {
        order.push(i);
        for &next in &dependents[i] {
            pending[next] -= 1;
            if pending[next] == 0 {
                ready.insert(next);
            }
        }
    }

    if order.len() != n {
        let stuck: Vec<&str> = (0..n)
            .filter(|i| pending[*i] > 0)
            .map(|i| catalog.rules[i].tag.as_str())
            .collect();
        bail!("dependency cycle among rules: {}", stuck.join(", "));
    }
    Ok(order)
}
