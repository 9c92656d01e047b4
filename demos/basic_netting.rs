//! Basic cycle netting example.
//!
//! Nets a three-party ETH cycle and a two-party USDC loop, then prints
//! what is left to settle.

use intent_netting::core::intent::Intent;
use intent_netting::optimization::netting::NettingEngine;

fn main() {
    println!("╔══════════════════════════════════════════╗");
    println!("║  intent-netting: Basic Netting Example   ║");
    println!("╚══════════════════════════════════════════╝\n");

    let intents = vec![
        Intent::new("A", "B", "ETH", 100),
        Intent::new("B", "C", "ETH", 50),
        Intent::new("C", "A", "ETH", 30),
        Intent::new("D", "E", "USDC", 200),
        Intent::new("E", "D", "USDC", 200),
    ];

    println!("━━━ Original intents ━━━\n");
    for intent in &intents {
        println!("  {}", intent);
    }
    println!();

    match NettingEngine::default().run(&intents) {
        Ok(report) => {
            println!("{}", report);
            println!("━━━ Net positions ━━━\n");
            let mut positions: Vec<_> = report.ledger().all_positions().iter().collect();
            positions.sort();
            for ((party, token), position) in positions {
                println!("  {:<4} {:<6} {:>6}", party, token, position);
            }
            println!("\nNet positions preserved: {}", report.is_conserved(&intents));
        }
        Err(e) => eprintln!("netting failed: {}", e),
    }
}
