//! Stable names for sub-expressions
//!
//! Elasticsearch named queries attach a label to each sub-query and report,
//! per document, which labels matched. This module assigns deterministic
//! names to the matchable parts of a tree, resolves names back to nodes, and
//! propagates a set of matched names through the operator semantics to tell
//! which parts of the query held and which did not.

use std::collections::{BTreeMap, HashSet};

use crate::error::{LuceqError, Result};
use crate::tree::{BoolOperator, Node, NodeKind};

/// Mapping from assigned name to the path of the named node, where a path is
/// the sequence of child indices leading from the root
pub type NameIndex = BTreeMap<String, Vec<usize>>;

/// True for the nodes that receive names: the matchable leaves
fn nameable(node: &Node) -> bool {
    matches!(
        node.kind,
        NodeKind::Word { .. }
            | NodeKind::Phrase { .. }
            | NodeKind::Regex { .. }
            | NodeKind::Range { .. }
            | NodeKind::Fuzzy { .. }
            | NodeKind::Proximity { .. }
    )
}

/// Number to letter name: `a`..`z`, `aa`, `ab`, …
fn letter_name(mut index: usize) -> String {
    let mut name = Vec::new();
    loop {
        name.push(b'a' + (index % 26) as u8);
        index /= 26;
        if index == 0 {
            break;
        }
        index -= 1;
    }
    name.reverse();
    String::from_utf8(name).expect("ascii letters")
}

/// Assign names to the matchable leaves of `tree`, in document order.
///
/// Operators, groups, search fields and unary wrappers are descended
/// through, never named; previously assigned names are replaced. Returns
/// the index mapping each name to its path.
pub fn auto_name(tree: &mut Node) -> NameIndex {
    let mut index = NameIndex::new();
    let mut counter = 0;
    let mut path = Vec::new();
    assign_names(tree, &mut path, &mut counter, &mut index);
    index
}

fn assign_names(
    node: &mut Node,
    path: &mut Vec<usize>,
    counter: &mut usize,
    index: &mut NameIndex,
) {
    if nameable(node) {
        let name = letter_name(*counter);
        *counter += 1;
        node.name = Some(name.clone());
        index.insert(name, path.clone());
        return;
    }
    node.name = None;
    for (i, child) in node.children_mut().into_iter().enumerate() {
        path.push(i);
        assign_names(child, path, counter, index);
        path.pop();
    }
}

/// Fetch the node at `path`
pub fn element_from_path<'a>(tree: &'a Node, path: &[usize]) -> Result<&'a Node> {
    let mut node = tree;
    for &i in path {
        node = node
            .children()
            .get(i)
            .copied()
            .ok_or_else(|| LuceqError::InvalidPath(path.to_vec()))?;
    }
    Ok(node)
}

/// Fetch the node bearing `name`, as recorded in `index`
pub fn element_from_name<'a>(tree: &'a Node, name: &str, index: &NameIndex) -> Result<&'a Node> {
    let path = index
        .get(name)
        .ok_or_else(|| LuceqError::UnknownName(name.to_string()))?;
    element_from_path(tree, path)
}

/// Verdicts of [`MatchingPropagator::propagate`]: paths of the nodes that
/// matched (`ok`) and of those in a position that should have matched but
/// did not (`ko`). The two sets are disjoint.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Matching {
    pub ok: Vec<Vec<usize>>,
    pub ko: Vec<Vec<usize>>,
}

/// Propagate a set of engine-reported matched names through a tree.
///
/// A named leaf matched if its name was reported. An AND matched if all its
/// operands did, an OR if any did, NOT and `-` invert their operand, and the
/// transparent wrappers follow their child. Unknown operations follow the
/// configured default operator.
pub struct MatchingPropagator {
    default_operation: BoolOperator,
}

impl Default for MatchingPropagator {
    fn default() -> Self {
        Self {
            default_operation: BoolOperator::And,
        }
    }
}

impl MatchingPropagator {
    pub fn new(default_operation: BoolOperator) -> Self {
        Self { default_operation }
    }

    /// Compute ok and ko paths for every node down to the named leaves
    pub fn propagate(&self, tree: &Node, matched_names: &HashSet<String>) -> Matching {
        let mut matching = Matching::default();
        let mut path = Vec::new();
        self.status(tree, &mut path, matched_names, &mut matching);
        matching
    }

    fn status(
        &self,
        node: &Node,
        path: &mut Vec<usize>,
        matched: &HashSet<String>,
        out: &mut Matching,
    ) -> bool {
        let ok = if nameable(node) {
            node.name
                .as_ref()
                .map(|name| matched.contains(name))
                .unwrap_or(false)
        } else {
            match &node.kind {
                NodeKind::And { .. } => self.operand_statuses(node, path, matched, out, true),
                NodeKind::Or { .. } => self.operand_statuses(node, path, matched, out, false),
                NodeKind::Unknown { .. } => {
                    let all = self.default_operation == BoolOperator::And;
                    self.operand_statuses(node, path, matched, out, all)
                }
                NodeKind::Not { expr } | NodeKind::Prohibit { expr } => {
                    path.push(0);
                    let inner = self.status(expr, path, matched, out);
                    path.pop();
                    !inner
                }
                NodeKind::SearchField { expr, .. }
                | NodeKind::Group { expr }
                | NodeKind::FieldGroup { expr }
                | NodeKind::Plus { expr }
                | NodeKind::Boost { expr, .. } => {
                    path.push(0);
                    let inner = self.status(expr, path, matched, out);
                    path.pop();
                    inner
                }
                _ => false,
            }
        };
        if ok {
            out.ok.push(path.clone());
        } else {
            out.ko.push(path.clone());
        }
        ok
    }

    fn operand_statuses(
        &self,
        node: &Node,
        path: &mut Vec<usize>,
        matched: &HashSet<String>,
        out: &mut Matching,
        all: bool,
    ) -> bool {
        // every operand is evaluated so each one gets its verdict recorded
        let mut statuses = Vec::new();
        for (i, child) in node.children().into_iter().enumerate() {
            path.push(i);
            statuses.push(self.status(child, path, matched, out));
            path.pop();
        }
        if all {
            statuses.iter().all(|&s| s)
        } else {
            statuses.iter().any(|&s| s)
        }
    }
}

/// Reprint a tree as HTML, wrapping the nodes listed in the ok and ko path
/// sets in `<span class="ok">` / `<span class="ko">` elements
pub struct HtmlMarker {
    ok: HashSet<Vec<usize>>,
    ko: HashSet<Vec<usize>>,
}

impl HtmlMarker {
    pub fn new(ok: &[Vec<usize>], ko: &[Vec<usize>]) -> Self {
        Self {
            ok: ok.iter().cloned().collect(),
            ko: ko.iter().cloned().collect(),
        }
    }

    /// Produce the annotated reprint of `tree`
    pub fn mark(&self, tree: &Node) -> String {
        let mut out = String::new();
        let mut path = Vec::new();
        self.write(tree, &mut path, &mut out);
        out
    }

    fn write(&self, node: &Node, path: &mut Vec<usize>, out: &mut String) {
        out.push_str(&escape(&node.head));
        let class = if self.ok.contains(path) {
            Some("ok")
        } else if self.ko.contains(path) {
            Some("ko")
        } else {
            None
        };
        if let Some(class) = class {
            out.push_str(&format!("<span class=\"{}\">", class));
        }
        self.write_surface(node, path, out);
        if class.is_some() {
            out.push_str("</span>");
        }
        out.push_str(&escape(&node.tail));
    }

    fn write_child(&self, node: &Node, path: &mut Vec<usize>, index: usize, out: &mut String) {
        path.push(index);
        self.write(node, path, out);
        path.pop();
    }

    fn write_surface(&self, node: &Node, path: &mut Vec<usize>, out: &mut String) {
        match &node.kind {
            NodeKind::None => {}
            NodeKind::Word { value }
            | NodeKind::Phrase { value }
            | NodeKind::Regex { value } => out.push_str(&escape(value)),
            NodeKind::SearchField { name, expr } => {
                out.push_str(&escape(name));
                out.push(':');
                self.write_child(expr, path, 0, out);
            }
            NodeKind::Group { expr } | NodeKind::FieldGroup { expr } => {
                out.push('(');
                self.write_child(expr, path, 0, out);
                out.push(')');
            }
            NodeKind::Range {
                low,
                high,
                include_low,
                include_high,
            } => {
                out.push(if *include_low { '[' } else { '{' });
                self.write_child(low, path, 0, out);
                out.push_str("TO");
                self.write_child(high, path, 1, out);
                out.push(if *include_high { ']' } else { '}' });
            }
            NodeKind::Fuzzy { term, degree } => {
                self.write_child(term, path, 0, out);
                out.push('~');
                if let Some(d) = degree {
                    out.push_str(&d.to_string());
                }
            }
            NodeKind::Proximity { term, degree } => {
                self.write_child(term, path, 0, out);
                out.push('~');
                if let Some(d) = degree {
                    out.push_str(&d.to_string());
                }
            }
            NodeKind::Boost { expr, force } => {
                self.write_child(expr, path, 0, out);
                out.push('^');
                out.push_str(&force.to_string());
            }
            NodeKind::Not { expr } => {
                out.push_str("NOT");
                self.write_child(expr, path, 0, out);
            }
            NodeKind::Plus { expr } => {
                out.push('+');
                self.write_child(expr, path, 0, out);
            }
            NodeKind::Prohibit { expr } => {
                out.push('-');
                self.write_child(expr, path, 0, out);
            }
            NodeKind::And { operands }
            | NodeKind::Or { operands }
            | NodeKind::Unknown { operands } => {
                let glyph = node.operator_glyph();
                for (i, operand) in operands.iter().enumerate() {
                    if i > 0 {
                        out.push_str(glyph);
                    }
                    self.write_child(operand, path, i, out);
                }
            }
        }
    }
}

fn escape(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for ch in text.chars() {
        match ch {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            _ => out.push(ch),
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parse;

    fn names_of(index: &NameIndex) -> Vec<&str> {
        index.keys().map(|k| k.as_str()).collect()
    }

    #[test]
    fn test_letter_names() {
        assert_eq!(letter_name(0), "a");
        assert_eq!(letter_name(25), "z");
        assert_eq!(letter_name(26), "aa");
        assert_eq!(letter_name(27), "ab");
        assert_eq!(letter_name(26 + 26 * 26), "aaa");
    }

    #[test]
    fn test_auto_name_covers_matchable_leaves() {
        let mut tree = parse("foo~2 OR (bar AND baz)").unwrap();
        let index = auto_name(&mut tree);
        assert_eq!(names_of(&index), vec!["a", "b", "c"]);
        assert_eq!(index["a"], vec![0]);
        assert_eq!(index["b"], vec![1, 0, 0]);
        assert_eq!(index["c"], vec![1, 0, 1]);
    }

    #[test]
    fn test_auto_name_skips_operators_and_wrappers() {
        let mut tree = parse("title:(a OR [1 TO 2]) AND NOT \"p q\"~3").unwrap();
        let index = auto_name(&mut tree);
        // named: word a, the range, the proximity
        assert_eq!(names_of(&index), vec!["a", "b", "c"]);
        let range = element_from_name(&tree, "b", &index).unwrap();
        assert_eq!(range.kind_name(), "range");
        let proximity = element_from_name(&tree, "c", &index).unwrap();
        assert_eq!(proximity.kind_name(), "proximity");
    }

    #[test]
    fn test_names_are_stored_on_nodes() {
        let mut tree = parse("a b").unwrap();
        auto_name(&mut tree);
        assert_eq!(tree.children()[0].name.as_deref(), Some("a"));
        assert_eq!(tree.children()[1].name.as_deref(), Some("b"));
        assert_eq!(tree.name, None);
    }

    #[test]
    fn test_element_from_path() {
        let tree = parse("a OR (b AND c)").unwrap();
        let node = element_from_path(&tree, &[1, 0, 1]).unwrap();
        assert_eq!(node.to_string(), " c");
        assert!(element_from_path(&tree, &[5]).is_err());
    }

    #[test]
    fn test_element_from_unknown_name() {
        let mut tree = parse("a").unwrap();
        let index = auto_name(&mut tree);
        assert_eq!(
            element_from_name(&tree, "zz", &index),
            Err(LuceqError::UnknownName("zz".to_string()))
        );
    }

    #[test]
    fn test_propagation_through_and_or() {
        let mut tree = parse("foo~2 OR (bar AND baz)").unwrap();
        auto_name(&mut tree);
        // the fuzzy term and bar matched, baz did not
        let matched: HashSet<String> = ["a", "b"].iter().map(|s| s.to_string()).collect();
        let matching = MatchingPropagator::default().propagate(&tree, &matched);

        let ok: HashSet<_> = matching.ok.iter().cloned().collect();
        let ko: HashSet<_> = matching.ko.iter().cloned().collect();
        assert!(ok.contains(&vec![0]), "matched fuzzy is ok");
        assert!(ok.contains(&vec![1, 0, 0]), "bar is ok");
        assert!(ko.contains(&vec![1, 0, 1]), "baz is ko");
        assert!(ko.contains(&vec![1, 0]), "the AND is ko");
        assert!(ok.contains(&vec![]), "the top OR is ok");
        assert!(ok.is_disjoint(&ko));
    }

    #[test]
    fn test_propagation_inverts_not() {
        let mut tree = parse("NOT foo").unwrap();
        auto_name(&mut tree);
        let matching = MatchingPropagator::default().propagate(&tree, &HashSet::new());
        assert_eq!(matching.ok, vec![Vec::<usize>::new()]);
        assert_eq!(matching.ko, vec![vec![0]]);
    }

    #[test]
    fn test_propagation_unknown_follows_default() {
        let mut tree = parse("foo bar").unwrap();
        auto_name(&mut tree);
        let matched: HashSet<String> = ["a".to_string()].into_iter().collect();

        let as_and = MatchingPropagator::new(BoolOperator::And).propagate(&tree, &matched);
        assert!(as_and.ko.contains(&vec![]));

        let as_or = MatchingPropagator::new(BoolOperator::Or).propagate(&tree, &matched);
        assert!(as_or.ok.contains(&vec![]));
    }

    #[test]
    fn test_html_marker() {
        let mut tree = parse("foo OR bar").unwrap();
        auto_name(&mut tree);
        let matched: HashSet<String> = ["a".to_string()].into_iter().collect();
        let matching = MatchingPropagator::default().propagate(&tree, &matched);
        let html = HtmlMarker::new(&matching.ok, &matching.ko).mark(&tree);
        assert_eq!(
            html,
            "<span class=\"ok\"><span class=\"ok\">foo</span> OR <span class=\"ko\">bar</span></span>"
        );
    }

    #[test]
    fn test_html_marker_escapes_text() {
        let tree = parse("title:\"a <b> & c\"").unwrap();
        let html = HtmlMarker::new(&[], &[]).mark(&tree);
        assert_eq!(html, "title:&quot;a &lt;b&gt; &amp; c&quot;");
    }
}
