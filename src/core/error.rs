use crate::core::party::PartyId;
use crate::core::token::TokenId;
use thiserror::Error;

/// Errors raised by graph construction, cycle enumeration and netting.
///
/// `Underflow` and `MissingEdge` indicate a defect in the netting
/// calculator rather than bad input; see [`NettingError::is_internal`].
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum NettingError {
    #[error(
        "internal invariant violated: cannot net {requested} {token} on {from} -> {to}, \
         only {available} outstanding"
    )]
    Underflow {
        from: PartyId,
        to: PartyId,
        token: TokenId,
        available: u64,
        requested: u64,
    },

    #[error("internal invariant violated: no {token} edge {from} -> {to} on netted cycle")]
    MissingEdge {
        from: PartyId,
        to: PartyId,
        token: TokenId,
    },

    #[error("exploration limit exceeded: more than {limit} cycles discovered")]
    ExplorationLimitExceeded { limit: usize },

    #[error("amount overflow merging {token} obligation {from} -> {to}")]
    AmountOverflow {
        from: PartyId,
        to: PartyId,
        token: TokenId,
    },

    #[error("invalid netting configuration: {0}")]
    InvalidConfig(String),
}

impl NettingError {
    /// True for errors that can only come from a bug in the engine itself.
    pub fn is_internal(&self) -> bool {
        matches!(
            self,
            NettingError::Underflow { .. } | NettingError::MissingEdge { .. }
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_internal_classification() {
        let underflow = NettingError::Underflow {
            from: PartyId::new("A"),
            to: PartyId::new("B"),
            token: TokenId::new("ETH"),
            available: 10,
            requested: 20,
        };
        assert!(underflow.is_internal());
        assert!(!NettingError::ExplorationLimitExceeded { limit: 5 }.is_internal());
    }

    #[test]
    fn test_error_messages() {
        let err = NettingError::ExplorationLimitExceeded { limit: 100 };
        assert_eq!(
            err.to_string(),
            "exploration limit exceeded: more than 100 cycles discovered"
        );

        let err = NettingError::MissingEdge {
            from: PartyId::new("A"),
            to: PartyId::new("B"),
            token: TokenId::new("USDC"),
        };
        assert!(err.to_string().contains("no USDC edge A -> B"));
    }
}
