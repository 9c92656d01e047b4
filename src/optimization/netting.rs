use crate::core::error::NettingError;
use crate::core::intent::Intent;
use crate::core::ledger::Ledger;
use crate::core::party::PartyIndex;
use crate::core::token::TokenId;
use crate::graph::cycle_detection::{Cycle, CycleEnumerator, CyclePolicy};
use crate::graph::obligation_graph::ObligationGraph;
use crate::graph::scc::find_sccs;
use log::{debug, info, trace};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};

/// Default bound on cycle length, in edges.
pub const DEFAULT_MAX_CYCLE_LENGTH: usize = 4;

/// Default bound on cycles discovered per component.
pub const DEFAULT_MAX_CYCLES: usize = 100_000;

/// Tunables for a netting run.
///
/// Every field has a default, so a partial JSON document is a valid config:
///
/// ```
/// use intent_netting::prelude::*;
///
/// let config: NettingConfig = serde_json::from_str(r#"{ "max_cycle_length": 3 }"#).unwrap();
/// assert_eq!(config.max_cycle_length, 3);
/// assert_eq!(config.cycle_policy, CyclePolicy::Canonical);
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct NettingConfig {
    /// Longest cycle (in edges) the enumerator will follow.
    pub max_cycle_length: usize,
    /// Cap on cycles discovered within one component, rotations included.
    /// `None` disables the cap.
    pub max_cycles: Option<usize>,
    /// Whether rotations of the same cycle are netted once or once each.
    pub cycle_policy: CyclePolicy,
}

impl Default for NettingConfig {
    fn default() -> Self {
        Self {
            max_cycle_length: DEFAULT_MAX_CYCLE_LENGTH,
            max_cycles: Some(DEFAULT_MAX_CYCLES),
            cycle_policy: CyclePolicy::Canonical,
        }
    }
}

impl NettingConfig {
    pub fn validate(&self) -> Result<(), NettingError> {
        if self.max_cycle_length == 0 {
            return Err(NettingError::InvalidConfig(
                "max_cycle_length must be at least 1".into(),
            ));
        }
        if self.max_cycles == Some(0) {
            return Err(NettingError::InvalidConfig(
                "max_cycles must be at least 1 when set".into(),
            ));
        }
        Ok(())
    }
}

/// Every token labelling an edge between consecutive parties of `cycle`.
pub fn tokens_on_cycle(graph: &ObligationGraph, cycle: &Cycle) -> BTreeSet<TokenId> {
    let mut tokens = BTreeSet::new();
    for (from, to) in cycle.pairs() {
        for edge in graph.edges_from(from).iter().filter(|e| e.to == to) {
            tokens.insert(edge.token.clone());
        }
    }
    tokens
}

/// The amount of `token` that can be cancelled around `cycle`.
///
/// This is the smallest `token` edge on the cycle. Returns `None` when some
/// consecutive pair has no outstanding `token` edge: the cycle cannot be
/// netted in that token at all.
pub fn calculate_netting_amount(
    graph: &ObligationGraph,
    cycle: &Cycle,
    token: &TokenId,
) -> Option<u64> {
    if cycle.is_empty() {
        return None;
    }
    let mut min: Option<u64> = None;
    for (from, to) in cycle.pairs() {
        let amount = graph
            .edge(from, to, token)
            .map(|e| e.amount)
            .filter(|&a| a > 0)?;
        min = Some(min.map_or(amount, |m| m.min(amount)));
    }
    min
}

/// Subtract `amount` of `token` from every edge of `cycle`.
///
/// All edges are checked before any is modified, so on error the graph is
/// unchanged. Both errors mean the caller broke the contract of
/// [`calculate_netting_amount`].
pub fn apply_netting(
    graph: &mut ObligationGraph,
    cycle: &Cycle,
    token: &TokenId,
    amount: u64,
) -> Result<(), NettingError> {
    // (source party, slot in its edge list, amount left after netting)
    let mut pending: Vec<(PartyIndex, usize, u64)> = Vec::with_capacity(cycle.len());

    for (from, to) in cycle.pairs() {
        let slot = graph
            .edges_from(from)
            .iter()
            .position(|e| e.to == to && &e.token == token)
            .ok_or_else(|| NettingError::MissingEdge {
                from: graph.party(from).clone(),
                to: graph.party(to).clone(),
                token: token.clone(),
            })?;

        let available = pending
            .iter()
            .find(|(f, s, _)| *f == from && *s == slot)
            .map_or(graph.edges_from(from)[slot].amount, |&(_, _, left)| left);

        let left = available
            .checked_sub(amount)
            .ok_or_else(|| NettingError::Underflow {
                from: graph.party(from).clone(),
                to: graph.party(to).clone(),
                token: token.clone(),
                available,
                requested: amount,
            })?;

        match pending.iter_mut().find(|(f, s, _)| *f == from && *s == slot) {
            Some(entry) => entry.2 = left,
            None => pending.push((from, slot, left)),
        }
    }

    for (from, slot, left) in pending {
        graph.edges_from_mut(from)[slot].amount = left;
    }
    Ok(())
}

/// Counters describing one netting run.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct NettingStats {
    pub party_count: usize,
    /// Components with two or more parties.
    pub scc_count: usize,
    /// Cycles handed to the netting stage, after the rotation policy.
    pub cycles_found: usize,
    /// (cycle, token) pairs that actually cancelled something.
    pub cycles_netted: usize,
    /// Total edge amount before netting, all tokens.
    pub gross_before: u128,
    /// Total edge amount after netting, all tokens.
    pub gross_after: u128,
    /// Amount removed from the graph per token, summed over all cycle edges.
    pub cancelled_by_token: BTreeMap<TokenId, u128>,
}

/// Outcome of a netting run: the residual intents and what it took to get there.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NettingReport {
    residual: Vec<Intent>,
    stats: NettingStats,
    /// Net positions implied by the residual intents.
    ledger: Ledger,
}

impl NettingReport {
    /// Non-zero intents left after netting.
    pub fn residual(&self) -> &[Intent] {
        &self.residual
    }

    pub fn into_residual(self) -> Vec<Intent> {
        self.residual
    }

    pub fn stats(&self) -> &NettingStats {
        &self.stats
    }

    pub fn ledger(&self) -> &Ledger {
        &self.ledger
    }

    /// Total amount cancelled, across every token.
    pub fn savings(&self) -> u128 {
        self.stats.gross_before - self.stats.gross_after
    }

    /// Savings as a percentage of the gross input.
    pub fn savings_percent(&self) -> f64 {
        if self.stats.gross_before == 0 {
            return 0.0;
        }
        self.savings() as f64 * 100.0 / self.stats.gross_before as f64
    }

    /// True when the residual leaves every party's per-token net position
    /// exactly where `input` put it.
    pub fn is_conserved(&self, input: &[Intent]) -> bool {
        Ledger::from_intents(input).same_positions(&self.ledger)
    }

    /// The residual ledger balances to zero in every token.
    pub fn is_valid(&self) -> bool {
        self.ledger.is_balanced()
    }
}

impl std::fmt::Display for NettingReport {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        writeln!(f, "=== Netting Result ===")?;
        writeln!(f, "Parties:        {}", self.stats.party_count)?;
        writeln!(f, "Components:     {}", self.stats.scc_count)?;
        writeln!(f, "Cycles found:   {}", self.stats.cycles_found)?;
        writeln!(f, "Cycles netted:  {}", self.stats.cycles_netted)?;
        writeln!(f, "Gross before:   {}", self.stats.gross_before)?;
        writeln!(f, "Gross after:    {}", self.stats.gross_after)?;
        writeln!(f, "Savings %:      {:.1}%", self.savings_percent())?;

        for (token, cancelled) in &self.stats.cancelled_by_token {
            writeln!(f, "  {:<10} cancelled {}", token, cancelled)?;
        }

        writeln!(f, "\n--- Residual intents ({}) ---", self.residual.len())?;
        for intent in &self.residual {
            writeln!(f, "  {}", intent)?;
        }
        Ok(())
    }
}

/// Cycle netting over an [`ObligationGraph`].
///
/// # Algorithm
///
/// 1. Split the graph into strongly connected components.
/// 2. In each component, enumerate cycles up to `max_cycle_length` edges.
/// 3. For every cycle and every token on it, cancel the smallest edge
///    amount of that token from all edges of the cycle.
/// 4. Read the remaining positive edges back out as intents.
///
/// Cycles are processed greedily in discovery order. The result is an
/// equivalent set of obligations, not necessarily the smallest one.
#[derive(Debug, Clone, Default)]
pub struct NettingEngine {
    config: NettingConfig,
}

impl NettingEngine {
    pub fn new(config: NettingConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &NettingConfig {
        &self.config
    }

    /// Build a graph from `intents`, net it and extract the residual.
    pub fn run(&self, intents: &[Intent]) -> Result<NettingReport, NettingError> {
        self.config.validate()?;
        let mut graph = ObligationGraph::from_intents(intents)?;
        let stats = self.net_graph(&mut graph)?;
        let residual = graph.to_intents();
        let ledger = Ledger::from_intents(&residual);

        info!(
            "netted {} intents into {} ({} cycles netted, {:.1}% cancelled)",
            intents.len(),
            residual.len(),
            stats.cycles_netted,
            percent(stats.gross_before - stats.gross_after, stats.gross_before),
        );

        Ok(NettingReport {
            residual,
            stats,
            ledger,
        })
    }

    /// Net every discovered cycle in place.
    pub fn net_graph(&self, graph: &mut ObligationGraph) -> Result<NettingStats, NettingError> {
        self.config.validate()?;

        let sccs = find_sccs(graph);
        let enumerator = CycleEnumerator::new(self.config.max_cycle_length)
            .with_max_cycles(self.config.max_cycles)
            .with_policy(self.config.cycle_policy);

        let mut stats = NettingStats {
            party_count: graph.party_count(),
            scc_count: sccs.len(),
            gross_before: graph.gross_total(),
            ..Default::default()
        };

        for scc in &sccs {
            let cycles = enumerator.enumerate(graph, scc)?;
            debug!(
                "component of {} parties: {} cycles of <= {} edges",
                scc.len(),
                cycles.len(),
                self.config.max_cycle_length
            );
            stats.cycles_found += cycles.len();

            for cycle in &cycles {
                for token in tokens_on_cycle(graph, cycle) {
                    let Some(amount) = calculate_netting_amount(graph, cycle, &token) else {
                        continue;
                    };
                    apply_netting(graph, cycle, &token, amount)?;
                    trace!(
                        "netted {} {} around {:?}",
                        amount,
                        token,
                        cycle.party_ids(graph)
                    );
                    stats.cycles_netted += 1;
                    *stats.cancelled_by_token.entry(token).or_insert(0) +=
                        amount as u128 * cycle.len() as u128;
                }
            }
        }

        stats.gross_after = graph.gross_total();
        Ok(stats)
    }
}

fn percent(part: u128, whole: u128) -> f64 {
    if whole == 0 {
        0.0
    } else {
        part as f64 * 100.0 / whole as f64
    }
}

/// Net `intents` with the default configuration and return the residual.
pub fn process_netting(intents: &[Intent]) -> Result<Vec<Intent>, NettingError> {
    NettingEngine::default()
        .run(intents)
        .map(NettingReport::into_residual)
}
