//! Ancestor-closure matching of classes against capability rules.

use super::models::CapabilityRule;
use super::rules::CapabilityRules;
use crate::config::AnalysisConfig;
use crate::graph::{HierarchyGraph, NodeId, TypeRef};
use crate::types::CapabilityKind;
use rayon::prelude::*;
use rustc_hash::FxHashMap;
use serde::Serialize;
use std::collections::BTreeMap;

/// Outcome of a rule's member predicate for one class.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum MemberShape {
    NotRequired,
    Satisfied,
    Missing,
}

/// A class reaching a rule's target type.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CapabilityMatch {
    pub class: String,
    #[serde(skip)]
    pub node: NodeId,
    pub kind: CapabilityKind,
    /// Id of the rule that produced the match
    pub rule: String,
    /// 0 for a direct supertype, N for N intermediate ancestors
    pub origin_depth: usize,
    /// First supertype on the shortest path; `None` when the class is the target
    #[serde(skip_serializing_if = "Option::is_none")]
    pub via: Option<String>,
    pub shape: MemberShape,
    /// Outermost analyzed class declaring this one, for nested and anonymous classes
    #[serde(skip_serializing_if = "Option::is_none")]
    pub enclosing: Option<String>,
}

impl CapabilityMatch {
    /// Whether this match is a capability fact (shape satisfied or not required).
    pub fn is_fact(&self) -> bool {
        self.shape != MemberShape::Missing
    }
}

#[derive(Debug, Clone, Copy)]
struct Ancestor<'a> {
    /// Edges from the class to this ancestor
    distance: usize,
    via: Option<&'a str>,
}

/// Every type reachable from one class, with the shortest distance to each.
struct AncestorClosure<'a> {
    ancestors: FxHashMap<&'a str, Ancestor<'a>>,
    /// The class itself followed by its in-set ancestors, nearest first
    classes: Vec<NodeId>,
}

pub struct CapabilityMatcher<'a> {
    graph: &'a HierarchyGraph,
    rules: &'a CapabilityRules,
    config: &'a AnalysisConfig,
}

impl<'a> CapabilityMatcher<'a> {
    pub fn new(graph: &'a HierarchyGraph, rules: &'a CapabilityRules, config: &'a AnalysisConfig) -> Self {
        Self { graph, rules, config }
    }

    /// Match every subject class against every rule.
    ///
    /// Output is sorted by kind, depth, class name and rule id.
    pub fn match_all(&self) -> Vec<CapabilityMatch> {
        let _span = tracing::info_span!("match_capabilities", rules = self.rules.len()).entered();

        let mut matches: Vec<CapabilityMatch> = (0..self.graph.len())
            .into_par_iter()
            .filter(|id| self.config.is_subject(&self.graph.node(*id).descriptor))
            .flat_map_iter(|id| self.match_node(id))
            .collect();

        matches.sort_by(|a, b| {
            a.kind
                .cmp(&b.kind)
                .then(a.origin_depth.cmp(&b.origin_depth))
                .then_with(|| a.class.cmp(&b.class))
                .then_with(|| a.rule.cmp(&b.rule))
        });

        tracing::info!("Matched {} capability candidates", matches.len());
        matches
    }

    /// All rule matches for one class.
    pub fn match_node(&self, id: NodeId) -> Vec<CapabilityMatch> {
        let closure = self.closure(id);
        let class = self.graph.node(id).name();
        let top_level = self.graph.top_level(id);
        let enclosing = (top_level != id).then(|| self.graph.node(top_level).name().to_string());

        self.rules
            .rules()
            .iter()
            .filter_map(|rule| {
                let ancestor = closure.ancestors.get(rule.target.as_str())?;
                let shape = self.member_shape(rule, &closure);
                tracing::debug!(
                    "{} matches {} at distance {} ({:?})",
                    class,
                    rule.id,
                    ancestor.distance,
                    shape
                );
                Some(CapabilityMatch {
                    class: class.to_string(),
                    node: id,
                    kind: rule.kind,
                    rule: rule.id.clone(),
                    origin_depth: ancestor.distance.saturating_sub(1),
                    via: ancestor.via.map(str::to_string),
                    shape,
                    enclosing: enclosing.clone(),
                })
            })
            .collect()
    }

    fn member_shape(&self, rule: &CapabilityRule, closure: &AncestorClosure<'_>) -> MemberShape {
        let Some(predicate) = &rule.members else {
            return MemberShape::NotRequired;
        };
        let satisfied = closure.classes.iter().any(|id| {
            self.graph
                .node(*id)
                .descriptor
                .members
                .iter()
                .any(|member| predicate.matches(member))
        });
        if satisfied {
            MemberShape::Satisfied
        } else {
            MemberShape::Missing
        }
    }

    /// Breadth-first walk over parent and interface edges.
    ///
    /// Equal-length paths to one ancestor keep the lexicographically smallest
    /// first hop.
    fn closure(&self, id: NodeId) -> AncestorClosure<'a> {
        let graph = self.graph;
        let mut ancestors = FxHashMap::default();
        ancestors.insert(graph.node(id).name(), Ancestor { distance: 0, via: None });
        let mut classes = vec![id];

        let mut frontier: Vec<(NodeId, Option<&'a str>)> = vec![(id, None)];
        let mut distance = 0;
        while !frontier.is_empty() {
            distance += 1;
            let mut level: BTreeMap<&'a str, (&'a str, Option<NodeId>)> = BTreeMap::new();
            for (node, via) in &frontier {
                for supertype in graph.node(*node).supertypes() {
                    let name = graph.type_name(supertype);
                    if ancestors.contains_key(name) {
                        continue;
                    }
                    let first_hop = via.unwrap_or(name);
                    let target = match supertype {
                        TypeRef::Class(target) => Some(*target),
                        TypeRef::External(_) => None,
                    };
                    level
                        .entry(name)
                        .and_modify(|(best, _)| {
                            if first_hop < *best {
                                *best = first_hop;
                            }
                        })
                        .or_insert((first_hop, target));
                }
            }

            frontier.clear();
            for (name, (via, target)) in level {
                ancestors.insert(name, Ancestor { distance, via: Some(via) });
                if let Some(target) = target {
                    classes.push(target);
                    frontier.push((target, Some(via)));
                }
            }
        }

        AncestorClosure { ancestors, classes }
    }
}
