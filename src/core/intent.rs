use crate::core::party::PartyId;
use crate::core::token::TokenId;
use serde::{Deserialize, Serialize};
use std::fmt;

/// A directed payment obligation between two parties.
///
/// States that `sender` owes `receiver` an `amount` of `token`. This is the
/// unit of both the engine's input and its residual output.
///
/// A zero `amount` is accepted on input (it merges as a no-op) but the
/// engine never emits one.
///
/// # Examples
///
/// ```
/// use intent_netting::core::intent::Intent;
///
/// let intent = Intent::new("alice", "bob", "ETH", 100);
/// assert_eq!(intent.sender.as_str(), "alice");
/// assert_eq!(intent.amount, 100);
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Intent {
    /// The party that owes the amount.
    pub sender: PartyId,
    /// The party that is owed the amount.
    pub receiver: PartyId,
    /// The asset of denomination.
    pub token: TokenId,
    /// Amount in the token's smallest unit.
    pub amount: u64,
}

impl Intent {
    pub fn new(
        sender: impl Into<PartyId>,
        receiver: impl Into<PartyId>,
        token: impl Into<TokenId>,
        amount: u64,
    ) -> Self {
        Self {
            sender: sender.into(),
            receiver: receiver.into(),
            token: token.into(),
            amount,
        }
    }
}

impl fmt::Display for Intent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} -> {}: {} {}",
            self.sender, self.receiver, self.amount, self.token
        )
    }
}

/// An ordered collection of intents submitted to, or produced by, the engine.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct IntentSet {
    intents: Vec<Intent>,
}

impl IntentSet {
    pub fn new() -> Self {
        Self {
            intents: Vec::new(),
        }
    }

    pub fn add(&mut self, intent: Intent) {
        self.intents.push(intent);
    }

    pub fn intents(&self) -> &[Intent] {
        &self.intents
    }

    pub fn into_intents(self) -> Vec<Intent> {
        self.intents
    }

    pub fn len(&self) -> usize {
        self.intents.len()
    }

    pub fn is_empty(&self) -> bool {
        self.intents.is_empty()
    }

    /// Sum of all amounts, across every token.
    ///
    /// Widened to `u128` so that many `u64` amounts cannot overflow.
    pub fn gross_total(&self) -> u128 {
        self.intents.iter().map(|i| i.amount as u128).sum()
    }

    /// Sum of all amounts in a single token.
    pub fn gross_total_for(&self, token: &TokenId) -> u128 {
        self.intents
            .iter()
            .filter(|i| &i.token == token)
            .map(|i| i.amount as u128)
            .sum()
    }

    /// All unique parties referenced in this set, sorted.
    pub fn parties(&self) -> Vec<PartyId> {
        let mut parties: Vec<PartyId> = self
            .intents
            .iter()
            .flat_map(|i| [i.sender.clone(), i.receiver.clone()])
            .collect();
        parties.sort();
        parties.dedup();
        parties
    }

    /// All unique tokens referenced in this set, sorted.
    pub fn tokens(&self) -> Vec<TokenId> {
        let mut tokens: Vec<TokenId> = self.intents.iter().map(|i| i.token.clone()).collect();
        tokens.sort();
        tokens.dedup();
        tokens
    }
}

impl FromIterator<Intent> for IntentSet {
    fn from_iter<T: IntoIterator<Item = Intent>>(iter: T) -> Self {
        Self {
            intents: iter.into_iter().collect(),
        }
    }
}

impl From<Vec<Intent>> for IntentSet {
    fn from(intents: Vec<Intent>) -> Self {
        Self { intents }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_intent_creation() {
        let intent = Intent::new("A", "B", "USDC", 1000);
        assert_eq!(intent.sender.as_str(), "A");
        assert_eq!(intent.receiver.as_str(), "B");
        assert_eq!(intent.token.as_str(), "USDC");
        assert_eq!(intent.amount, 1000);
        assert_eq!(intent.to_string(), "A -> B: 1000 USDC");
    }

    #[test]
    fn test_intent_set_gross() {
        let set: IntentSet = vec![
            Intent::new("A", "B", "ETH", 100),
            Intent::new("B", "C", "ETH", 200),
            Intent::new("B", "C", "USDC", 7),
        ]
        .into_iter()
        .collect();
        assert_eq!(set.gross_total(), 307);
        assert_eq!(set.gross_total_for(&TokenId::new("ETH")), 300);
        assert_eq!(set.len(), 3);
    }

    #[test]
    fn test_gross_total_does_not_overflow() {
        let set = IntentSet::from(vec![
            Intent::new("A", "B", "ETH", u64::MAX),
            Intent::new("B", "A", "ETH", u64::MAX),
        ]);
        assert_eq!(set.gross_total(), 2 * u64::MAX as u128);
    }

    #[test]
    fn test_intent_set_parties_and_tokens() {
        let set = IntentSet::from(vec![
            Intent::new("C", "A", "USDC", 1),
            Intent::new("A", "B", "ETH", 1),
        ]);
        assert_eq!(
            set.parties(),
            vec![PartyId::new("A"), PartyId::new("B"), PartyId::new("C")]
        );
        assert_eq!(set.tokens(), vec![TokenId::new("ETH"), TokenId::new("USDC")]);
    }

    #[test]
    fn test_intent_json_shape() {
        let json = serde_json::to_value(Intent::new("A", "B", "ETH", 5)).unwrap();
        assert_eq!(json["sender"], "A");
        assert_eq!(json["receiver"], "B");
        assert_eq!(json["token"], "ETH");
        assert_eq!(json["amount"], 5);
    }
}
