//! Netlist Equivalence Verifier
//!
//! Two netlists number their nodes independently. They are equivalent when
//! some one-to-one renaming of nodes lets every ground-truth component pair
//! with a distinct test component whose nodes correspond under the renaming,
//! lead by lead. Lead order is significant: `[R1 1 2, R2 2 3]` and
//! `[R1 1 2, R2 1 3]` differ in which lead of `R1` is shared.
//!
//! The search walks ground-truth components in listed order and tries, for
//! each one:
//!
//! 1. **Set match**: unused test components with literally the same node
//!    set, binding each node to itself. Cheap when both netlists already
//!    agree on part of the numbering.
//! 2. **Positional mapping**: unused test components with the same node
//!    count, binding node `i` to node `i`.
//!
//! A binding that contradicts an earlier one (either direction) rejects the
//! candidate. Every attempt snapshots the search state and restores it on
//! failure. The first complete pairing wins.

use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet, HashMap};

use crate::netlist::{Netlist, NetlistEntry};

/// Search options
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct VerifyOptions {
    /// Require both netlists to list the same number of components
    pub strict: bool,
    /// Only pair components of the same type (label prefix before `_`)
    pub match_types: bool,
}

/// Witness of an equivalence: the first solution found
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Correspondence {
    /// Ground-truth node -> test node
    pub node_mapping: BTreeMap<u32, u32>,
    /// `(ground-truth index, test index)` in ground-truth order
    pub pairs: Vec<(usize, usize)>,
}

/// Bidirectional node binding
#[derive(Debug, Clone, Default)]
struct NodeMapping {
    forward: HashMap<u32, u32>,
    reverse: HashMap<u32, u32>,
}

impl NodeMapping {
    /// Bind `truth -> test`; false if either side is already bound elsewhere
    fn bind(&mut self, truth: u32, test: u32) -> bool {
        if let Some(&bound) = self.forward.get(&truth) {
            if bound != test {
                tracing::trace!("Locked node {} -> {} conflicts with {}", truth, bound, test);
                return false;
            }
        }
        if let Some(&owner) = self.reverse.get(&test) {
            if owner != truth {
                tracing::trace!("Test node {} already taken by {}", test, owner);
                return false;
            }
        }
        self.forward.insert(truth, test);
        self.reverse.insert(test, truth);
        true
    }
}

/// Mutable state threaded through the recursion
#[derive(Debug, Clone)]
struct SearchState {
    used: Vec<bool>,
    mapping: NodeMapping,
    pairs: Vec<(usize, usize)>,
}

struct Search<'a> {
    ground_truth: &'a Netlist,
    test: &'a Netlist,
    test_sets: Vec<BTreeSet<u32>>,
    options: &'a VerifyOptions,
}

impl<'a> Search<'a> {
    fn new(ground_truth: &'a Netlist, test: &'a Netlist, options: &'a VerifyOptions) -> Self {
        Self {
            ground_truth,
            test,
            test_sets: test.iter().map(NetlistEntry::node_set).collect(),
            options,
        }
    }

    fn candidates(&self, truth: &'a NetlistEntry) -> impl Iterator<Item = (usize, &'a NetlistEntry)> + '_ {
        self.test
            .iter()
            .enumerate()
            .filter(move |(_, t)| !self.options.match_types || t.component_type() == truth.component_type())
    }

    fn backtrack(&self, index: usize, state: &mut SearchState) -> bool {
        let Some(truth) = self.ground_truth.entries.get(index) else {
            return true;
        };
        tracing::trace!("Matching ground truth {}", truth);

        let truth_set = truth.node_set();
        for (ti, candidate) in self.candidates(truth) {
            if state.used[ti] || self.test_sets[ti] != truth_set {
                continue;
            }

            let snapshot = state.mapping.clone();
            if truth_set.iter().all(|&n| state.mapping.bind(n, n)) {
                tracing::trace!("Set match {} == {}", truth, candidate);
                if self.commit(index, ti, state) {
                    return true;
                }
                tracing::trace!("Backtracking from set match {} / {}", truth, candidate);
            }
            state.mapping = snapshot;
        }

        for (ti, candidate) in self.candidates(truth) {
            if state.used[ti] {
                continue;
            }
            if candidate.nodes.len() != truth.nodes.len() {
                tracing::trace!("Skipping {}: node count differs from {}", candidate, truth);
                continue;
            }

            let snapshot = state.mapping.clone();
            let consistent = truth
                .nodes
                .iter()
                .zip(&candidate.nodes)
                .all(|(&t, &c)| state.mapping.bind(t, c));
            if consistent {
                tracing::trace!("Positional mapping {} -> {}", truth, candidate);
                if self.commit(index, ti, state) {
                    return true;
                }
                tracing::trace!("Backtracking from positional mapping {} / {}", truth, candidate);
            }
            state.mapping = snapshot;
        }

        false
    }

    /// Pair `index` with test component `ti` and search the rest
    fn commit(&self, index: usize, ti: usize, state: &mut SearchState) -> bool {
        state.used[ti] = true;
        state.pairs.push((index, ti));
        if self.backtrack(index + 1, state) {
            return true;
        }
        state.pairs.pop();
        state.used[ti] = false;
        false
    }
}

/// Search for a node renaming that makes `test` match `ground_truth`
pub fn find_correspondence(
    ground_truth: &Netlist,
    test: &Netlist,
    options: &VerifyOptions,
) -> Option<Correspondence> {
    if options.strict && ground_truth.len() != test.len() {
        tracing::debug!(
            "Component count differs: {} in ground truth, {} in test",
            ground_truth.len(),
            test.len()
        );
        return None;
    }

    let search = Search::new(ground_truth, test, options);
    let mut state = SearchState {
        used: vec![false; test.len()],
        mapping: NodeMapping::default(),
        pairs: Vec::with_capacity(ground_truth.len()),
    };

    if search.backtrack(0, &mut state) {
        let correspondence = Correspondence {
            node_mapping: state.mapping.forward.into_iter().collect(),
            pairs: state.pairs,
        };
        tracing::debug!("Netlists match with {} node bindings", correspondence.node_mapping.len());
        Some(correspondence)
    } else {
        tracing::debug!("No consistent node mapping found");
        None
    }
}

/// True if the two netlists describe the same topology
pub fn verify(ground_truth: &Netlist, test: &Netlist) -> bool {
    find_correspondence(ground_truth, test, &VerifyOptions::default()).is_some()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn netlist(text: &str) -> Netlist {
        Netlist::parse(text).unwrap()
    }

    #[test]
    fn test_reflexive() {
        let n = netlist("R_1 1 2\nC_1 2 3\nV_1 1 3\nR_2 3 4\n");
        assert!(verify(&n, &n.clone()));
    }

    #[test]
    fn test_renumbered_netlist_matches() {
        let truth = netlist("R1 1 2\nR2 2 3\n");
        let test = netlist("R1 9 8\nR2 8 7\n");

        let found = find_correspondence(&truth, &test, &VerifyOptions::default()).unwrap();
        assert_eq!(
            found.node_mapping,
            BTreeMap::from([(1, 9), (2, 8), (3, 7)])
        );
        assert_eq!(found.pairs, vec![(0, 0), (1, 1)]);
    }

    #[test]
    fn test_topology_change_rejected() {
        let truth = netlist("R1 1 2\nR2 2 3\n");
        let test = netlist("R1 1 2\nR2 1 3\n");
        assert!(!verify(&truth, &test));
    }

    #[test]
    fn test_loop_with_matching_lead_order() {
        let truth = netlist("V_1 1 2\nR_1 2 3\nC_1 3 1\n");
        let test = netlist("V_1 4 5\nR_1 5 6\nC_1 6 4\n");

        let found = find_correspondence(&truth, &test, &VerifyOptions::default()).unwrap();
        assert_eq!(found.node_mapping, BTreeMap::from([(1, 4), (2, 5), (3, 6)]));
    }

    #[test]
    fn test_identical_numbering_uses_identity() {
        let truth = netlist("R_1 1 2\nC_1 3 2\nL_1 3 4\n");
        let test = netlist("L_1 4 3\nR_1 2 1\nC_1 2 3\n");

        let found = find_correspondence(&truth, &test, &VerifyOptions::default()).unwrap();
        assert!(found.node_mapping.iter().all(|(k, v)| k == v));
        assert_eq!(found.pairs, vec![(0, 1), (1, 2), (2, 0)]);
    }

    #[test]
    fn test_set_match_then_positional() {
        let truth = netlist("R1 1 2\nR2 2 3\n");
        let test = netlist("R1 1 2\nR2 2 7\n");

        let found = find_correspondence(&truth, &test, &VerifyOptions::default()).unwrap();
        assert_eq!(found.node_mapping.get(&3), Some(&7));
    }

    #[test]
    fn test_backtracks_out_of_wrong_pairing() {
        let truth = netlist("X 1 2\nY 2 3\n");
        let test = netlist("Y 5 6\nX 4 5\n");

        let found = find_correspondence(&truth, &test, &VerifyOptions::default()).unwrap();
        assert_eq!(found.pairs, vec![(0, 1), (1, 0)]);
        assert_eq!(found.node_mapping, BTreeMap::from([(1, 4), (2, 5), (3, 6)]));
    }

    #[test]
    fn test_mapping_is_one_to_one() {
        let truth = netlist("R1 1 2\nR2 3 4\n");
        let test = netlist("R1 7 8\nR2 7 8\n");
        assert!(!verify(&truth, &test));
    }

    #[test]
    fn test_node_count_mismatch_disqualifies() {
        let truth = netlist("Q1 1 2 3\n");
        let test = netlist("Q1 1 2\n");
        assert!(!verify(&truth, &test));
    }

    #[test]
    fn test_extra_test_components_allowed_unless_strict() {
        let truth = netlist("R1 1 2\n");
        let test = netlist("R1 5 6\nC1 6 7\n");

        assert!(verify(&truth, &test));
        let strict = VerifyOptions {
            strict: true,
            ..VerifyOptions::default()
        };
        assert!(find_correspondence(&truth, &test, &strict).is_none());
    }

    #[test]
    fn test_match_types_restricts_pairing() {
        let truth = netlist("R_1 1 2\nC_1 2 3\n");
        let test = netlist("R_1 5 6\nC_1 4 5\n");

        assert!(verify(&truth, &test));
        let typed = VerifyOptions {
            match_types: true,
            ..VerifyOptions::default()
        };
        assert!(find_correspondence(&truth, &test, &typed).is_none());
    }

    #[test]
    fn test_empty_ground_truth_matches_anything() {
        assert!(verify(&Netlist::new(), &netlist("R1 1 2\n")));
        assert!(!verify(&netlist("R1 1 2\n"), &Netlist::new()));
    }
}
