use intent_netting::core::error::NettingError;
use intent_netting::core::intent::{Intent, IntentSet};
use intent_netting::core::ledger::Ledger;
use intent_netting::core::party::PartyId;
use intent_netting::core::token::TokenId;
use intent_netting::graph::cycle_detection::{CycleEnumerator, CyclePolicy};
use intent_netting::graph::obligation_graph::ObligationGraph;
use intent_netting::graph::scc::find_sccs;
use intent_netting::optimization::netting::{
    process_netting, NettingConfig, NettingEngine, NettingReport,
};

fn sorted(mut intents: Vec<Intent>) -> Vec<Intent> {
    intents.sort_by(|a, b| {
        (&a.sender, &a.receiver, &a.token, a.amount)
            .cmp(&(&b.sender, &b.receiver, &b.token, b.amount))
    });
    intents
}

/// Full pipeline on a mixed two-token network.
#[test]
fn full_pipeline_two_token_scenario() {
    let intents = vec![
        Intent::new("A", "B", "ETH", 100),
        Intent::new("B", "C", "ETH", 50),
        Intent::new("C", "A", "ETH", 30),
        Intent::new("D", "E", "USDC", 200),
        Intent::new("E", "D", "USDC", 200),
    ];

    let residual = process_netting(&intents).unwrap();
    assert_eq!(
        sorted(residual),
        vec![
            Intent::new("A", "B", "ETH", 70),
            Intent::new("B", "C", "ETH", 20),
        ]
    );
}

#[test]
fn merge_invariant() {
    let mut graph = ObligationGraph::new();
    graph.add_edge("A", "B", "ETH", 40).unwrap();
    graph.add_edge("A", "B", "ETH", 2).unwrap();
    assert_eq!(graph.to_intents(), vec![Intent::new("A", "B", "ETH", 42)]);
}

#[test]
fn duplicate_intents_merge_before_netting() {
    let residual = process_netting(&[
        Intent::new("A", "B", "ETH", 60),
        Intent::new("A", "B", "ETH", 40),
        Intent::new("B", "A", "ETH", 100),
    ])
    .unwrap();
    assert!(residual.is_empty());
}

#[test]
fn acyclic_input_is_unchanged() {
    let intents = vec![
        Intent::new("A", "B", "ETH", 10),
        Intent::new("B", "C", "ETH", 20),
        Intent::new("A", "C", "USDC", 30),
        Intent::new("C", "D", "ETH", 40),
    ];
    let residual = process_netting(&intents).unwrap();
    assert_eq!(sorted(residual), sorted(intents));
}

#[test]
fn zero_amount_intents_are_never_emitted() {
    let residual = process_netting(&[
        Intent::new("A", "B", "ETH", 0),
        Intent::new("B", "C", "ETH", 5),
    ])
    .unwrap();
    assert_eq!(residual, vec![Intent::new("B", "C", "ETH", 5)]);
}

#[test]
fn token_isolation_on_shared_pair() {
    // ETH forms a cycle, USDC on the same pairs only flows one way.
    let intents = vec![
        Intent::new("A", "B", "ETH", 50),
        Intent::new("B", "A", "ETH", 80),
        Intent::new("A", "B", "USDC", 500),
    ];
    let residual = sorted(process_netting(&intents).unwrap());
    assert_eq!(
        residual,
        vec![
            Intent::new("A", "B", "USDC", 500),
            Intent::new("B", "A", "ETH", 30),
        ]
    );
}

#[test]
fn mixed_token_cycle_is_not_netted() {
    let intents = vec![
        Intent::new("A", "B", "ETH", 50),
        Intent::new("B", "C", "ETH", 50),
        Intent::new("C", "A", "USDC", 50),
    ];
    let report = NettingEngine::default().run(&intents).unwrap();
    assert_eq!(report.stats().scc_count, 1);
    assert_eq!(report.stats().cycles_found, 1);
    assert_eq!(report.stats().cycles_netted, 0);
    assert_eq!(report.residual(), intents.as_slice());
}

#[test]
fn rerun_is_idempotent() {
    let intents = vec![
        Intent::new("A", "B", "ETH", 100),
        Intent::new("B", "C", "ETH", 60),
        Intent::new("C", "A", "ETH", 30),
        Intent::new("B", "A", "ETH", 45),
        Intent::new("C", "D", "USDC", 10),
        Intent::new("D", "C", "USDC", 4),
    ];
    let first = process_netting(&intents).unwrap();
    let second = process_netting(&first).unwrap();
    assert_eq!(sorted(first), sorted(second));
}

#[test]
fn bound_respected_end_to_end() {
    let ring = vec![
        Intent::new("A", "B", "ETH", 10),
        Intent::new("B", "C", "ETH", 10),
        Intent::new("C", "D", "ETH", 10),
        Intent::new("D", "E", "ETH", 10),
        Intent::new("E", "A", "ETH", 10),
    ];

    let bounded = NettingEngine::default().run(&ring).unwrap();
    assert_eq!(bounded.residual(), ring.as_slice());

    let wide = NettingEngine::new(NettingConfig {
        max_cycle_length: 5,
        ..Default::default()
    })
    .run(&ring)
    .unwrap();
    assert!(wide.residual().is_empty());

    let graph = ObligationGraph::from_intents(&ring).unwrap();
    for scc in find_sccs(&graph) {
        for k in 1..=5 {
            let cycles = CycleEnumerator::new(k)
                .with_policy(CyclePolicy::EveryRotation)
                .enumerate(&graph, &scc)
                .unwrap();
            assert!(cycles.iter().all(|c| c.len() <= k));
        }
    }
}

#[test]
fn exploration_limit_fails_fast() {
    // Complete digraph on six parties has far more than ten short cycles.
    let parties = ["A", "B", "C", "D", "E", "F"];
    let mut intents = Vec::new();
    for from in parties {
        for to in parties {
            if from != to {
                intents.push(Intent::new(from, to, "ETH", 1));
            }
        }
    }
    let err = NettingEngine::new(NettingConfig {
        max_cycles: Some(10),
        ..Default::default()
    })
    .run(&intents)
    .unwrap_err();
    assert_eq!(err, NettingError::ExplorationLimitExceeded { limit: 10 });
    assert!(!err.is_internal());
}

#[test]
fn net_positions_are_conserved() {
    let intents = vec![
        Intent::new("alice", "bob", "ETH", 7),
        Intent::new("bob", "carol", "ETH", 9),
        Intent::new("carol", "alice", "ETH", 11),
        Intent::new("carol", "bob", "ETH", 3),
        Intent::new("bob", "alice", "DAI", 1_000),
        Intent::new("alice", "bob", "DAI", 999),
    ];
    let report = NettingEngine::default().run(&intents).unwrap();
    assert!(report.is_conserved(&intents));
    assert!(report.is_valid());
    assert_eq!(
        report
            .ledger()
            .position(&PartyId::new("alice"), &TokenId::new("DAI")),
        Ledger::from_intents(&intents).position(&PartyId::new("alice"), &TokenId::new("DAI"))
    );
    for ((party, token), position) in Ledger::from_intents(&intents).all_positions() {
        assert_eq!(report.ledger().position(party, token), *position);
    }
    assert!(report.savings_percent() > 0.0);
    approx::assert_relative_eq!(
        report.savings_percent(),
        report.savings() as f64 * 100.0 / IntentSet::from(intents).gross_total() as f64
    );
}

#[test]
fn report_serializes() {
    let intents = vec![
        Intent::new("A", "B", "ETH", 100),
        Intent::new("B", "A", "ETH", 60),
    ];
    let report = NettingEngine::default().run(&intents).unwrap();
    let json = serde_json::to_string_pretty(&report).unwrap();

    let parsed: serde_json::Value = serde_json::from_str(&json).unwrap();
    assert_eq!(parsed["residual"][0]["sender"], "A");
    assert_eq!(parsed["residual"][0]["amount"], 40);
    assert!(parsed.get("stats").is_some());
    assert!(parsed.get("ledger").is_some());

    let back: NettingReport = serde_json::from_str(&json).unwrap();
    assert_eq!(back.residual(), report.residual());
}

#[test]
fn report_ledger_round_trips_namespaced_ids() {
    let intents = vec![
        Intent::new("A", "B", "eip155:1/erc20:0xabc", 100),
        Intent::new("vault:7", "A", "eip155:1/erc20:0xabc", 40),
    ];
    let report = NettingEngine::default().run(&intents).unwrap();
    let json = serde_json::to_string(&report).unwrap();
    let back: NettingReport = serde_json::from_str(&json).unwrap();

    assert_eq!(back.ledger(), &Ledger::from_intents(&intents));
    assert_eq!(
        back.ledger()
            .position(&PartyId::new("A"), &TokenId::new("eip155:1/erc20:0xabc")),
        -60
    );
    assert!(back.is_conserved(&intents));
}

#[test]
fn empty_input_produces_empty_output() {
    let report = NettingEngine::default().run(&[]).unwrap();
    assert!(report.residual().is_empty());
    assert_eq!(report.savings(), 0);
    assert_eq!(report.savings_percent(), 0.0);
    assert!(report.is_valid());
}
