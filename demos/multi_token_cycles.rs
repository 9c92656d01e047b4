//! Cycle enumeration across tokens.
//!
//! Shows which cycles the engine finds in each strongly connected
//! component and how much of each token every cycle could cancel.

use intent_netting::core::error::NettingError;
use intent_netting::graph::cycle_detection::CycleEnumerator;
use intent_netting::graph::obligation_graph::ObligationGraph;
use intent_netting::graph::scc::find_sccs;
use intent_netting::optimization::netting::{calculate_netting_amount, tokens_on_cycle};

fn main() -> Result<(), NettingError> {
    println!("╔═══════════════════════════════════════════════╗");
    println!("║  intent-netting: Multi-Token Cycle Detection  ║");
    println!("╚═══════════════════════════════════════════════╝\n");

    let mut graph = ObligationGraph::new();
    graph.add_edge("alice", "bob", "ETH", 100)?;
    graph.add_edge("bob", "carol", "ETH", 80)?;
    graph.add_edge("carol", "alice", "ETH", 120)?;
    graph.add_edge("bob", "alice", "USDC", 5_000)?;
    graph.add_edge("alice", "bob", "USDC", 3_500)?;
    graph.add_edge("carol", "dave", "USDC", 900)?;

    println!("━━━ Strongly Connected Components ━━━\n");
    let sccs = find_sccs(&graph);
    for (i, scc) in sccs.iter().enumerate() {
        let parties: Vec<String> = scc.party_ids(&graph).iter().map(|p| p.to_string()).collect();
        println!("  SCC {}: [{}]", i, parties.join(", "));
    }
    println!();

    println!("━━━ Cycles (length <= 4) ━━━\n");
    let enumerator = CycleEnumerator::new(4);
    for scc in &sccs {
        for cycle in enumerator.enumerate(&graph, scc)? {
            let parties: Vec<String> =
                cycle.party_ids(&graph).iter().map(|p| p.to_string()).collect();
            println!("  {} -> (back to start)", parties.join(" -> "));
            for token in tokens_on_cycle(&graph, &cycle) {
                match calculate_netting_amount(&graph, &cycle, &token) {
                    Some(amount) => println!("    {:<6} nettable: {}", token, amount),
                    None => println!("    {:<6} not present on every edge", token),
                }
            }
        }
    }

    println!("\n━━━ Interpretation ━━━\n");
    println!("  Every rotation of a cycle is listed. The engine nets each cycle");
    println!("  once per token, by the smallest edge of that token.");
    Ok(())
}
