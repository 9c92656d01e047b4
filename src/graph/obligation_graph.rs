use crate::core::error::NettingError;
use crate::core::intent::Intent;
use crate::core::party::{PartyId, PartyIndex};
use crate::core::token::TokenId;
use std::collections::{BTreeSet, HashMap};

/// An outgoing obligation stored under its source party.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Edge {
    pub to: PartyIndex,
    pub token: TokenId,
    pub amount: u64,
}

/// A directed, token-labelled graph of outstanding obligations.
///
/// Parties are interned into an arena on first appearance, whether as
/// sender or receiver, and addressed by [`PartyIndex`]. Each party owns an
/// ordered list of outgoing edges with at most one edge per
/// `(to, token)`: inserting a duplicate merges the amounts.
///
/// The graph is built once per netting run, mutated in place by the netting
/// stage and then turned back into intents.
///
/// # Examples
///
/// ```
/// use intent_netting::prelude::*;
///
/// let mut graph = ObligationGraph::new();
/// graph.add_edge("A", "B", "ETH", 100).unwrap();
/// graph.add_edge("A", "B", "ETH", 50).unwrap();
///
/// assert_eq!(graph.party_count(), 2);
/// assert_eq!(graph.edge_count(), 1);
/// assert_eq!(graph.to_intents(), vec![Intent::new("A", "B", "ETH", 150)]);
/// ```
#[derive(Debug, Clone, Default)]
pub struct ObligationGraph {
    parties: Vec<PartyId>,
    index: HashMap<PartyId, PartyIndex>,
    /// Outgoing edges, indexed by the source party's arena slot.
    edges: Vec<Vec<Edge>>,
}

impl ObligationGraph {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a graph by merging every intent in order.
    pub fn from_intents<'a>(
        intents: impl IntoIterator<Item = &'a Intent>,
    ) -> Result<Self, NettingError> {
        let mut graph = Self::new();
        for intent in intents {
            graph.add_edge(
                intent.sender.clone(),
                intent.receiver.clone(),
                intent.token.clone(),
                intent.amount,
            )?;
        }
        Ok(graph)
    }

    /// Add an obligation, merging into an existing `(from, to, token)` edge.
    ///
    /// A zero amount is a legal no-op that still registers both parties.
    /// Fails only if the merged amount would not fit in a `u64`.
    pub fn add_edge(
        &mut self,
        from: impl Into<PartyId>,
        to: impl Into<PartyId>,
        token: impl Into<TokenId>,
        amount: u64,
    ) -> Result<(), NettingError> {
        let from = self.intern(from.into());
        let to = self.intern(to.into());
        let token = token.into();

        let slot = &mut self.edges[from.index()];
        if let Some(edge) = slot.iter_mut().find(|e| e.to == to && e.token == token) {
            edge.amount = edge
                .amount
                .checked_add(amount)
                .ok_or_else(|| NettingError::AmountOverflow {
                    from: self.parties[from.index()].clone(),
                    to: self.parties[to.index()].clone(),
                    token: token.clone(),
                })?;
            return Ok(());
        }
        slot.push(Edge { to, token, amount });
        Ok(())
    }

    fn intern(&mut self, party: PartyId) -> PartyIndex {
        if let Some(&idx) = self.index.get(&party) {
            return idx;
        }
        let idx = PartyIndex::new(self.parties.len());
        self.parties.push(party.clone());
        self.index.insert(party, idx);
        self.edges.push(Vec::new());
        idx
    }

    /// Number of parties (vertices), including receive-only parties.
    pub fn party_count(&self) -> usize {
        self.parties.len()
    }

    /// Number of stored edges, including ones netted down to zero.
    pub fn edge_count(&self) -> usize {
        self.edges.iter().map(Vec::len).sum()
    }

    /// All party handles in arena order.
    pub fn party_indices(&self) -> impl Iterator<Item = PartyIndex> + '_ {
        (0..self.parties.len()).map(PartyIndex::new)
    }

    pub fn party(&self, idx: PartyIndex) -> &PartyId {
        &self.parties[idx.index()]
    }

    pub fn index_of(&self, party: &PartyId) -> Option<PartyIndex> {
        self.index.get(party).copied()
    }

    /// Outgoing edges of a party, in insertion order.
    pub fn edges_from(&self, idx: PartyIndex) -> &[Edge] {
        &self.edges[idx.index()]
    }

    pub(crate) fn edges_from_mut(&mut self, idx: PartyIndex) -> &mut [Edge] {
        &mut self.edges[idx.index()]
    }

    /// The edge `from -> to` carrying `token`, if any.
    pub fn edge(&self, from: PartyIndex, to: PartyIndex, token: &TokenId) -> Option<&Edge> {
        self.edges[from.index()]
            .iter()
            .find(|e| e.to == to && &e.token == token)
    }

    /// Current amount owed `from -> to` in `token`; zero if no such edge.
    pub fn edge_amount(&self, from: &PartyId, to: &PartyId, token: &TokenId) -> u64 {
        match (self.index_of(from), self.index_of(to)) {
            (Some(f), Some(t)) => self.edge(f, t, token).map_or(0, |e| e.amount),
            _ => 0,
        }
    }

    /// Distinct targets reachable over positive-amount edges, in first-edge order.
    ///
    /// Zero-amount edges are logically absent and are skipped.
    pub fn successors(&self, idx: PartyIndex) -> Vec<PartyIndex> {
        let mut out: Vec<PartyIndex> = Vec::new();
        for edge in &self.edges[idx.index()] {
            if edge.amount > 0 && !out.contains(&edge.to) {
                out.push(edge.to);
            }
        }
        out
    }

    /// All tokens present on any edge.
    pub fn tokens(&self) -> BTreeSet<TokenId> {
        self.edges
            .iter()
            .flatten()
            .map(|e| e.token.clone())
            .collect()
    }

    /// Sum of all edge amounts across every token.
    pub fn gross_total(&self) -> u128 {
        self.edges.iter().flatten().map(|e| e.amount as u128).sum()
    }

    /// Every edge with a positive amount, converted back into an intent.
    ///
    /// Order is deterministic: parties in arena order, then each party's
    /// edges in insertion order.
    pub fn to_intents(&self) -> Vec<Intent> {
        let mut intents = Vec::new();
        for (from, edges) in self.edges.iter().enumerate() {
            for edge in edges.iter().filter(|e| e.amount > 0) {
                intents.push(Intent {
                    sender: self.parties[from].clone(),
                    receiver: self.parties[edge.to.index()].clone(),
                    token: edge.token.clone(),
                    amount: edge.amount,
                });
            }
        }
        intents
    }
}
