use crate::core::intent::Intent;
use crate::core::party::PartyId;
use crate::core::token::TokenId;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Net position of each party in each token.
///
/// A positive balance means the party is owed (net receiver), a negative
/// balance means the party owes (net sender). Cycle netting must leave
/// every position unchanged, which is what makes the residual intents
/// equivalent to the input.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Ledger {
    /// (PartyId, TokenId) -> net balance
    #[serde(with = "positions_serde")]
    positions: HashMap<(PartyId, TokenId), i128>,
}

/// Positions travel as `{party, token, position}` records so that neither
/// identifier is ever parsed back out of a joined key. Amounts are strings
/// because JSON numbers cannot hold every `i128`.
mod positions_serde {
    use super::*;
    use serde::de;

    #[derive(Serialize, Deserialize)]
    struct PositionRecord {
        party: PartyId,
        token: TokenId,
        position: String,
    }

    pub fn serialize<S: serde::Serializer>(
        positions: &HashMap<(PartyId, TokenId), i128>,
        serializer: S,
    ) -> Result<S::Ok, S::Error> {
        let mut records: Vec<PositionRecord> = positions
            .iter()
            .map(|((party, token), amount)| PositionRecord {
                party: party.clone(),
                token: token.clone(),
                position: amount.to_string(),
            })
            .collect();
        records.sort_by(|a, b| (&a.party, &a.token).cmp(&(&b.party, &b.token)));
        records.serialize(serializer)
    }

    pub fn deserialize<'de, D: serde::Deserializer<'de>>(
        deserializer: D,
    ) -> Result<HashMap<(PartyId, TokenId), i128>, D::Error> {
        let records = Vec::<PositionRecord>::deserialize(deserializer)?;
        let mut positions = HashMap::with_capacity(records.len());
        for record in records {
            let amount: i128 = record.position.parse().map_err(|_| {
                de::Error::custom(format!("invalid position: {}", record.position))
            })?;
            let key = (record.party, record.token);
            if positions.insert(key.clone(), amount).is_some() {
                return Err(de::Error::custom(format!(
                    "duplicate position for {} in {}",
                    key.0, key.1
                )));
            }
        }
        Ok(positions)
    }
}

impl Ledger {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a ledger from a sequence of intents.
    pub fn from_intents<'a>(intents: impl IntoIterator<Item = &'a Intent>) -> Self {
        let mut ledger = Self::new();
        for intent in intents {
            ledger.apply_intent(intent);
        }
        ledger
    }

    /// Apply an intent: sender loses, receiver gains.
    pub fn apply_intent(&mut self, intent: &Intent) {
        if intent.amount == 0 {
            return;
        }
        let amount = intent.amount as i128;
        *self
            .positions
            .entry((intent.sender.clone(), intent.token.clone()))
            .or_insert(0) -= amount;
        *self
            .positions
            .entry((intent.receiver.clone(), intent.token.clone()))
            .or_insert(0) += amount;
    }

    /// Net position of a party in a specific token.
    pub fn position(&self, party: &PartyId, token: &TokenId) -> i128 {
        self.positions
            .get(&(party.clone(), token.clone()))
            .copied()
            .unwrap_or(0)
    }

    /// All positions for a given party across all tokens.
    pub fn positions_for_party(&self, party: &PartyId) -> HashMap<TokenId, i128> {
        self.positions
            .iter()
            .filter(|((p, _), _)| p == party)
            .map(|((_, t), &v)| (t.clone(), v))
            .collect()
    }

    pub fn all_positions(&self) -> &HashMap<(PartyId, TokenId), i128> {
        &self.positions
    }

    /// Sum of all positions per token is zero.
    pub fn is_balanced(&self) -> bool {
        let mut sums: HashMap<&TokenId, i128> = HashMap::new();
        for ((_, token), amount) in &self.positions {
            *sums.entry(token).or_insert(0) += amount;
        }
        sums.values().all(|sum| *sum == 0)
    }

    /// True when both ledgers agree on every non-zero position.
    ///
    /// Zero entries are ignored: a party whose intents all cancelled may be
    /// missing from one side and present with 0 on the other.
    pub fn same_positions(&self, other: &Ledger) -> bool {
        let covers = |a: &Ledger, b: &Ledger| {
            a.positions
                .iter()
                .filter(|(_, v)| **v != 0)
                .all(|((p, t), v)| b.position(p, t) == *v)
        };
        covers(self, other) && covers(other, self)
    }

    /// Sum of all positive positions, i.e. the amount that must actually move.
    pub fn total_net_settlement(&self) -> u128 {
        self.positions
            .values()
            .filter(|v| **v > 0)
            .map(|v| *v as u128)
            .sum()
    }
}
