//! Ancestry, descendant and chain-lookup queries over an inheritance graph

use crate::chain::Ancestors;
use crate::graph::InheritanceGraph;
use cfg_text::{BlockSource, Value, extract_value, find_section, has_property};
use std::collections::{BTreeSet, HashMap, HashSet};
use tracing::debug;

/// Memoized "does this struct reach `target`" answers for a single target.
///
/// Each walk records every name it passed through, so repeated queries over
/// a large graph stay close to linear. A walk that revisits a name is a
/// cycle and answers `false`.
pub struct AncestryQuery<'g> {
    graph: &'g InheritanceGraph,
    target: String,
    memo: HashMap<String, bool>,
}

impl<'g> AncestryQuery<'g> {
    pub fn new(graph: &'g InheritanceGraph, target: impl Into<String>) -> Self {
        Self {
            graph,
            target: target.into(),
            memo: HashMap::new(),
        }
    }

    /// The ancestor every query is tested against.
    pub fn target(&self) -> &str {
        &self.target
    }

    /// Whether `candidate` is the target or reaches it through one or more
    /// parent edges.
    pub fn inherits(&mut self, candidate: &str) -> bool {
        let mut walked: HashSet<&str> = HashSet::new();
        let mut current = candidate;

        let result = loop {
            if current == self.target {
                break true;
            }
            if let Some(&known) = self.memo.get(current) {
                break known;
            }
            if !walked.insert(current) {
                debug!("Inheritance cycle through {} while resolving {}", current, candidate);
                break false;
            }
            match self.graph.parent(current) {
                Some(parent) => current = parent,
                None => break false,
            }
        };

        for name in walked {
            self.memo.insert(name.to_string(), result);
        }
        result
    }
}

/// Query front-end over a borrowed graph
pub struct Resolver<'g> {
    graph: &'g InheritanceGraph,
}

impl<'g> Resolver<'g> {
    pub fn new(graph: &'g InheritanceGraph) -> Self {
        Self { graph }
    }

    pub fn graph(&self) -> &'g InheritanceGraph {
        self.graph
    }

    /// One-off ancestry test; `candidate == target` counts as a match.
    pub fn inherits_from(&self, candidate: &str, target: &str) -> bool {
        AncestryQuery::new(self.graph, target).inherits(candidate)
    }

    /// Strict ancestry: `candidate` reaches `ancestor` in one or more steps
    /// and is not `ancestor` itself.
    pub fn is_descendant_of(&self, candidate: &str, ancestor: &str) -> bool {
        candidate != ancestor && self.inherits_from(candidate, ancestor)
    }

    /// Every declared struct whose ancestry reaches `target`.
    ///
    /// `target` itself is only part of the result when `include_self` is set.
    pub fn descendants(&self, target: &str, include_self: bool) -> BTreeSet<String> {
        let mut query = AncestryQuery::new(self.graph, target);
        let mut found: BTreeSet<String> = self
            .graph
            .names()
            .filter(|name| *name != target)
            .filter(|name| query.inherits(name))
            .map(str::to_string)
            .collect();
        if include_self {
            found.insert(target.to_string());
        }
        found
    }

    /// `start` followed by its ancestors, see [`Ancestors`].
    pub fn ancestors<'a>(&'a self, start: &'a str) -> Ancestors<'a> {
        Ancestors::new(self.graph, start)
    }

    /// First struct in the chain of `start` whose block satisfies
    /// `predicate`. Names the source has no block for are skipped.
    pub fn find_in_chain<S, F>(&self, source: &S, start: &str, mut predicate: F) -> Option<String>
    where
        S: BlockSource + ?Sized,
        F: FnMut(&str) -> bool,
    {
        self.ancestors(start)
            .find(|name| source.block(name).is_some_and(&mut predicate))
            .map(str::to_string)
    }

    /// Struct in the chain of `start` that declares `property`.
    pub fn property_owner<S>(&self, source: &S, start: &str, property: &str) -> Option<String>
    where
        S: BlockSource + ?Sized,
    {
        self.find_in_chain(source, start, |block| has_property(block, property))
    }

    /// Struct in the chain of `start` where the nested section path resolves.
    pub fn section_owner<S, P>(&self, source: &S, start: &str, path: &[P]) -> Option<String>
    where
        S: BlockSource + ?Sized,
        P: AsRef<str>,
    {
        self.find_in_chain(source, start, |block| find_section(block, path).is_some())
    }

    pub fn has_property_in_chain<S>(&self, source: &S, start: &str, property: &str) -> bool
    where
        S: BlockSource + ?Sized,
    {
        self.property_owner(source, start, property).is_some()
    }

    pub fn has_section_in_chain<S, P>(&self, source: &S, start: &str, path: &[P]) -> bool
    where
        S: BlockSource + ?Sized,
        P: AsRef<str>,
    {
        self.section_owner(source, start, path).is_some()
    }

    /// Inherited value of `key`: the first struct in the chain whose
    /// `section` path resolves and declares `key` inside it.
    pub fn value_in_chain<S, P>(
        &self,
        source: &S,
        start: &str,
        section: &[P],
        key: &str,
    ) -> Option<Value>
    where
        S: BlockSource + ?Sized,
        P: AsRef<str>,
    {
        self.ancestors(start).find_map(|name| {
            let block = source.block(name)?;
            let scoped = find_section(block, section)?;
            extract_value(scoped, key)
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn graph(edges: &[(&str, Option<&str>)]) -> InheritanceGraph {
        let mut g = InheritanceGraph::new();
        for (child, parent) in edges {
            g.insert(*child, parent.map(str::to_string));
        }
        g
    }

    #[test]
    fn test_ancestry_transitive() {
        let g = graph(&[("A", Some("B")), ("B", Some("C")), ("C", None)]);
        let r = Resolver::new(&g);
        assert!(r.inherits_from("A", "C"));
        assert!(r.inherits_from("A", "B"));
        assert!(!r.inherits_from("C", "A"));
        assert!(r.inherits_from("A", "A"));
        assert!(!r.is_descendant_of("A", "A"));
        assert!(r.is_descendant_of("A", "C"));
    }

    #[test]
    fn test_ancestry_cycle_terminates() {
        let g = graph(&[("A", Some("B")), ("B", Some("A"))]);
        let r = Resolver::new(&g);
        assert!(r.inherits_from("A", "B"));
        assert!(r.inherits_from("B", "A"));
        assert!(!r.inherits_from("A", "Z"));
        assert!(!r.is_descendant_of("A", "A"));
        assert!(r.descendants("Z", false).is_empty());
        assert_eq!(
            r.descendants("A", false),
            BTreeSet::from(["B".to_string()])
        );
    }

    #[test]
    fn test_memo_reuse_across_queries() {
        let g = graph(&[
            ("A", Some("B")),
            ("B", Some("C")),
            ("C", None),
            ("D", Some("B")),
            ("E", Some("X")),
        ]);
        let mut query = AncestryQuery::new(&g, "C");
        assert!(query.inherits("A"));
        assert!(query.inherits("D"));
        assert!(!query.inherits("E"));
        assert!(!query.inherits("X"));
        assert_eq!(query.target(), "C");
    }

    #[test]
    fn test_descendants_with_and_without_self() {
        let g = graph(&[
            ("NPCBase", None),
            ("Bandit", Some("NPCBase")),
            ("BanditBoss", Some("Bandit")),
            ("Mutant", None),
        ]);
        let r = Resolver::new(&g);
        let without: Vec<String> = r.descendants("NPCBase", false).into_iter().collect();
        assert_eq!(without, vec!["Bandit", "BanditBoss"]);
        let with: Vec<String> = r.descendants("NPCBase", true).into_iter().collect();
        assert_eq!(with, vec!["Bandit", "BanditBoss", "NPCBase"]);
    }

    #[test]
    fn test_descendants_independent_of_insertion_order() {
        let forward = graph(&[("A", Some("R")), ("B", Some("A")), ("C", Some("B")), ("R", None)]);
        let backward = graph(&[("R", None), ("C", Some("B")), ("B", Some("A")), ("A", Some("R"))]);
        assert_eq!(
            Resolver::new(&forward).descendants("R", false),
            Resolver::new(&backward).descendants("R", false)
        );
    }

    const DOC: &str = "\
Alpha : struct.begin {refkey=Base}
   Value = 10
struct.end
Base : struct.begin {refkey=Root}
   Value = 5
   Other = 1
struct.end
Root : struct.begin
   Deep = 3
   CombatParameters : struct.begin
      CheckEnemyTime = 20.0f
   struct.end
struct.end
";

    #[test]
    fn test_property_chain_lookup() {
        let g = InheritanceGraph::from_text(DOC, cfg_text::Scope::TopLevel);
        let r = Resolver::new(&g);
        assert!(r.has_property_in_chain(DOC, "Alpha", "Other"));
        assert_eq!(r.property_owner(DOC, "Alpha", "Other").as_deref(), Some("Base"));
        assert_eq!(r.property_owner(DOC, "Alpha", "Deep").as_deref(), Some("Root"));
        assert_eq!(r.property_owner(DOC, "Alpha", "Value").as_deref(), Some("Alpha"));
        assert!(!r.has_property_in_chain(DOC, "Alpha", "Nothing"));
    }

    #[test]
    fn test_section_chain_lookup() {
        let g = InheritanceGraph::from_text(DOC, cfg_text::Scope::TopLevel);
        let r = Resolver::new(&g);
        assert_eq!(
            r.section_owner(DOC, "Alpha", &["CombatParameters"]).as_deref(),
            Some("Root")
        );
        assert!(!r.has_section_in_chain(DOC, "Alpha", &["CombatParameters", "Missing"]));
    }

    #[test]
    fn test_value_in_chain() {
        let g = InheritanceGraph::from_text(DOC, cfg_text::Scope::TopLevel);
        let r = Resolver::new(&g);
        assert_eq!(
            r.value_in_chain(DOC, "Alpha", &["CombatParameters"], "CheckEnemyTime"),
            Some(Value::Float(20.0))
        );
        assert_eq!(
            r.value_in_chain::<str, &str>(DOC, "Alpha", &[], "Value"),
            Some(Value::Integer(10))
        );
        assert_eq!(r.value_in_chain::<str, &str>(DOC, "Alpha", &[], "Nope"), None);
    }

    #[test]
    fn test_chain_lookup_on_cycle_terminates() {
        let text = "A : struct.begin {refkey=B}\nstruct.end\nB : struct.begin {refkey=A}\nstruct.end\n";
        let g = InheritanceGraph::from_text(text, cfg_text::Scope::TopLevel);
        let r = Resolver::new(&g);
        assert!(!r.has_property_in_chain(text, "A", "Missing"));
        assert!(!r.has_section_in_chain(text, "A", &["Missing"]));
    }
}
