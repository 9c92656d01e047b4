//! # intent-netting
//!
//! Multi-token obligation netting engine.
//!
//! Given a set of directed payment intents between parties, each
//! denominated in some token, this engine finds circular chains of debt
//! and cancels the common amount around every cycle it discovers,
//! leaving a smaller equivalent set of residual intents.
//!
//! ## Architecture
//!
//! - **core**: intents, parties, tokens, ledger and errors
//! - **graph**: Obligation graph, strongly connected components, cycle enumeration
//! - **optimization**: Per-cycle netting and the end-to-end pipeline
//! - **simulation**: Random intent networks for stress testing
//!
//! ```
//! use intent_netting::prelude::*;
//!
//! let intents = vec![
//!     Intent::new("A", "B", "ETH", 100),
//!     Intent::new("B", "C", "ETH", 50),
//!     Intent::new("C", "A", "ETH", 30),
//! ];
//!
//! let residual = process_netting(&intents).unwrap();
//! assert_eq!(residual.len(), 2);
//! ```

pub mod core;
pub mod graph;
pub mod optimization;

/// Convenience re-exports for common usage.
pub mod prelude {
    pub use crate::core::error::NettingError;
    pub use crate::core::intent::{Intent, IntentSet};
    pub use crate::core::ledger::Ledger;
    pub use crate::core::party::{PartyId, PartyIndex};
    pub use crate::core::token::TokenId;
    pub use crate::graph::cycle_detection::{Cycle, CyclePolicy};
    pub use crate::graph::obligation_graph::ObligationGraph;
    pub use crate::optimization::netting::{
        process_netting, NettingConfig, NettingEngine, NettingReport, NettingStats,
    };
}
