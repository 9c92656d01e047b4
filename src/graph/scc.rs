use crate::core::party::{PartyId, PartyIndex};
use crate::graph::obligation_graph::ObligationGraph;

/// A strongly connected component of the obligation graph.
///
/// Every party in the component can reach every other one through a chain
/// of outstanding obligations, so circular flows between them may be
/// netted. Parties in different components never share a cycle.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StronglyConnectedComponent {
    /// Members, sorted by arena index.
    pub parties: Vec<PartyIndex>,
}

impl StronglyConnectedComponent {
    pub fn len(&self) -> usize {
        self.parties.len()
    }

    pub fn is_empty(&self) -> bool {
        self.parties.is_empty()
    }

    pub fn contains(&self, party: PartyIndex) -> bool {
        self.parties.binary_search(&party).is_ok()
    }

    /// Resolve member handles to party identifiers.
    pub fn party_ids<'g>(&self, graph: &'g ObligationGraph) -> Vec<&'g PartyId> {
        self.parties.iter().map(|&p| graph.party(p)).collect()
    }
}

/// Find all strongly connected components with at least two members.
///
/// Uses Tarjan's algorithm over positive-amount edges. A single-party
/// component can never carry a multi-party cycle, so it is dropped.
///
/// The traversal keeps its own frame stack instead of recursing, so path
/// length is bounded by heap memory rather than the thread's stack.
pub fn find_sccs(graph: &ObligationGraph) -> Vec<StronglyConnectedComponent> {
    let adjacency: Vec<Vec<PartyIndex>> = graph
        .party_indices()
        .map(|p| graph.successors(p))
        .collect();

    let mut state = TarjanState::new(adjacency.len());

    for root in graph.party_indices() {
        if state.indices[root.index()].is_none() {
            strongconnect(root, &adjacency, &mut state);
        }
    }

    state
        .result
        .into_iter()
        .filter(|parties| parties.len() > 1)
        .map(|parties| StronglyConnectedComponent { parties })
        .collect()
}

struct TarjanState {
    index_counter: usize,
    stack: Vec<PartyIndex>,
    on_stack: Vec<bool>,
    indices: Vec<Option<usize>>,
    lowlinks: Vec<usize>,
    result: Vec<Vec<PartyIndex>>,
}

impl TarjanState {
    fn new(party_count: usize) -> Self {
        Self {
            index_counter: 0,
            stack: Vec::new(),
            on_stack: vec![false; party_count],
            indices: vec![None; party_count],
            lowlinks: vec![0; party_count],
            result: Vec::new(),
        }
    }

    fn discover(&mut self, v: PartyIndex) {
        self.indices[v.index()] = Some(self.index_counter);
        self.lowlinks[v.index()] = self.index_counter;
        self.index_counter += 1;
        self.stack.push(v);
        self.on_stack[v.index()] = true;
    }
}

/// One suspended `strongconnect` call: the vertex and the next successor to look at.
struct Frame {
    vertex: PartyIndex,
    next: usize,
}

fn strongconnect(root: PartyIndex, adjacency: &[Vec<PartyIndex>], state: &mut TarjanState) {
    state.discover(root);
    let mut frames = vec![Frame {
        vertex: root,
        next: 0,
    }];

    while let Some(frame) = frames.last_mut() {
        let v = frame.vertex;

        if let Some(&w) = adjacency[v.index()].get(frame.next) {
            frame.next += 1;
            match state.indices[w.index()] {
                None => {
                    state.discover(w);
                    frames.push(Frame { vertex: w, next: 0 });
                }
                Some(idx_w) if state.on_stack[w.index()] => {
                    let low_v = &mut state.lowlinks[v.index()];
                    *low_v = (*low_v).min(idx_w);
                }
                Some(_) => {}
            }
            continue;
        }

        // All successors of v explored: v's call returns.
        frames.pop();

        if state.indices[v.index()] == Some(state.lowlinks[v.index()]) {
            let mut component = Vec::new();
            while let Some(w) = state.stack.pop() {
                state.on_stack[w.index()] = false;
                component.push(w);
                if w == v {
                    break;
                }
            }
            component.sort();
            state.result.push(component);
        }

        if let Some(parent) = frames.last() {
            let low_w = state.lowlinks[v.index()];
            let low_p = &mut state.lowlinks[parent.vertex.index()];
            *low_p = (*low_p).min(low_w);
        }
    }
}
