use crate::core::error::NettingError;
use crate::core::party::{PartyId, PartyIndex};
use crate::graph::obligation_graph::ObligationGraph;
use crate::graph::scc::StronglyConnectedComponent;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;

/// A closed path of parties: each party owes the next, the last owes the first.
///
/// The vertex order is significant. `[A, B, C]` and `[B, C, A]` describe the
/// same geometric cycle but are distinct values; see [`Cycle::canonical`].
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Cycle {
    vertices: Vec<PartyIndex>,
}

impl Cycle {
    pub fn new(vertices: Vec<PartyIndex>) -> Self {
        Self { vertices }
    }

    /// Number of parties, which is also the number of edges.
    pub fn len(&self) -> usize {
        self.vertices.len()
    }

    pub fn is_empty(&self) -> bool {
        self.vertices.is_empty()
    }

    pub fn vertices(&self) -> &[PartyIndex] {
        &self.vertices
    }

    /// Consecutive `(from, to)` pairs, including the closing `last -> first`.
    pub fn pairs(&self) -> impl Iterator<Item = (PartyIndex, PartyIndex)> + '_ {
        let n = self.vertices.len();
        (0..n).map(move |i| (self.vertices[i], self.vertices[(i + 1) % n]))
    }

    /// The rotation starting at the smallest party index.
    pub fn canonical(&self) -> Cycle {
        let start = self
            .vertices
            .iter()
            .enumerate()
            .min_by_key(|(_, v)| **v)
            .map_or(0, |(i, _)| i);
        let mut vertices = self.vertices.clone();
        vertices.rotate_left(start);
        Cycle { vertices }
    }

    pub fn party_ids<'g>(&self, graph: &'g ObligationGraph) -> Vec<&'g PartyId> {
        self.vertices.iter().map(|&v| graph.party(v)).collect()
    }
}

/// How rotations of the same geometric cycle are treated before netting.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CyclePolicy {
    /// Keep only the first-discovered rotation of each cycle.
    #[default]
    Canonical,
    /// Keep every rotation; each is netted in turn.
    EveryRotation,
}

/// Bounded enumeration of simple cycles inside one strongly connected component.
///
/// From every member, a depth-first search walks outgoing positive edges to
/// other members and records a cycle whenever it steps back onto its start.
/// Paths never grow beyond `max_cycle_length` edges. Because every member is
/// tried as a start, a cycle of length `k` is discovered `k` times, once per
/// rotation, before [`CyclePolicy`] is applied.
///
/// If `max_cycles` is set, discovering more than that many cycles (rotations
/// included) aborts with [`NettingError::ExplorationLimitExceeded`].
#[derive(Debug, Clone)]
pub struct CycleEnumerator {
    max_cycle_length: usize,
    max_cycles: Option<usize>,
    policy: CyclePolicy,
}

impl CycleEnumerator {
    pub fn new(max_cycle_length: usize) -> Self {
        Self {
            max_cycle_length,
            max_cycles: None,
            policy: CyclePolicy::EveryRotation,
        }
    }

    pub fn with_max_cycles(mut self, max_cycles: Option<usize>) -> Self {
        self.max_cycles = max_cycles;
        self
    }

    pub fn with_policy(mut self, policy: CyclePolicy) -> Self {
        self.policy = policy;
        self
    }

    /// Enumerate cycles within `scc`, in discovery order.
    pub fn enumerate(
        &self,
        graph: &ObligationGraph,
        scc: &StronglyConnectedComponent,
    ) -> Result<Vec<Cycle>, NettingError> {
        let n = graph.party_count();

        // Successors restricted to the component; other vertices cannot close a cycle.
        let mut adjacency: Vec<Vec<PartyIndex>> = vec![Vec::new(); n];
        for &p in &scc.parties {
            adjacency[p.index()] = graph
                .successors(p)
                .into_iter()
                .filter(|&s| scc.contains(s))
                .collect();
        }

        let mut cycles = Vec::new();
        let mut on_path = vec![false; n];

        for &start in &scc.parties {
            self.search_from(start, &adjacency, &mut on_path, &mut cycles)?;
        }

        if self.policy == CyclePolicy::Canonical {
            let mut seen: HashSet<Cycle> = HashSet::new();
            cycles.retain(|cycle| seen.insert(cycle.canonical()));
        }
        Ok(cycles)
    }

    fn search_from(
        &self,
        start: PartyIndex,
        adjacency: &[Vec<PartyIndex>],
        on_path: &mut [bool],
        cycles: &mut Vec<Cycle>,
    ) -> Result<(), NettingError> {
        // Each frame is a vertex on the current path plus its next successor slot.
        let mut path: Vec<(PartyIndex, usize)> = vec![(start, 0)];
        on_path[start.index()] = true;

        while let Some(&(v, next)) = path.last() {
            let Some(&w) = adjacency[v.index()].get(next) else {
                path.pop();
                on_path[v.index()] = false;
                continue;
            };
            if let Some(top) = path.last_mut() {
                top.1 += 1;
            }

            let depth = path.len();
            if w == start {
                cycles.push(Cycle::new(path.iter().map(|&(p, _)| p).collect()));
                if let Some(limit) = self.max_cycles {
                    if cycles.len() > limit {
                        // Leave the scratch buffer clean for the caller.
                        for &(p, _) in &path {
                            on_path[p.index()] = false;
                        }
                        log::warn!("cycle enumeration stopped after {} cycles", limit);
                        return Err(NettingError::ExplorationLimitExceeded { limit });
                    }
                }
            } else if !on_path[w.index()] && depth < self.max_cycle_length {
                on_path[w.index()] = true;
                path.push((w, 0));
            }
        }
        Ok(())
    }
}

/// Enumerate cycles of at most `max_cycle_length` edges in one component,
/// keeping every rotation and without an exploration limit.
pub fn find_cycles(
    graph: &ObligationGraph,
    scc: &StronglyConnectedComponent,
    max_cycle_length: usize,
) -> Result<Vec<Cycle>, NettingError> {
    CycleEnumerator::new(max_cycle_length).enumerate(graph, scc)
}
