//! Card entity model
//!
//! A card is one order/ticket node. It owns a tag map (line items) and an
//! ordered list of sub-cards. Every mutation returns a new `Card`; nothing is
//! updated in place.
//!
//! # Balance
//!
//! ```text
//! tag.balance  = (debit - credit) * max(quantity, 1)
//! card.balance = Σ tag.balance + Σ child.balance
//! ```
//!
//! # Lookup policy
//!
//! All id-based traversal (`replace_child`, `replace_card`, `without_child`)
//! uses exact matching and returns [`CardError::CardNotFound`] when the id is
//! absent. There is no silent no-op.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashSet};
use thiserror::Error;

/// Reserved tag holding the card lifecycle status
pub const STATUS_TAG: &str = "Status";
/// `Status` value marking a finalized card
pub const CLOSED_STATUS: &str = "Closed";
/// Tag used as the display label when present
pub const NAME_TAG: &str = "Name";

/// Card tree errors
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum CardError {
    #[error("Card not found: {0}")]
    CardNotFound(String),

    #[error("Duplicate card id in tree: {0}")]
    DuplicateCard(String),

    #[error("Balance overflow in card {0}")]
    BalanceOverflow(String),
}

impl CardError {
    /// Whether this error means the tree itself is malformed
    pub fn is_invariant_violation(&self) -> bool {
        matches!(self, CardError::DuplicateCard(_) | CardError::BalanceOverflow(_))
    }
}

/// One line item on a card
///
/// Amounts serialize as decimal strings and accept strings or JSON numbers.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CardTag {
    pub name: String,
    #[serde(default)]
    pub value: String,
    #[serde(default)]
    pub quantity: Decimal,
    #[serde(default)]
    pub debit: Decimal,
    #[serde(default)]
    pub credit: Decimal,
}

impl CardTag {
    pub fn new(name: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            value: value.into(),
            quantity: Decimal::ZERO,
            debit: Decimal::ZERO,
            credit: Decimal::ZERO,
        }
    }

    pub fn with_quantity(mut self, quantity: Decimal) -> Self {
        self.quantity = quantity;
        self
    }

    pub fn with_debit(mut self, debit: Decimal) -> Self {
        self.debit = debit;
        self
    }

    pub fn with_credit(mut self, credit: Decimal) -> Self {
        self.credit = credit;
        self
    }

    /// Quantity used for balance: zero and negative counts as one.
    /// The stored quantity is left untouched.
    pub fn effective_quantity(&self) -> Decimal {
        self.quantity.max(Decimal::ONE)
    }

    /// `(debit - credit) * max(quantity, 1)`
    ///
    /// Panics on decimal overflow. Use [`CardTag::checked_balance`] when the
    /// amounts come from untrusted input.
    pub fn balance(&self) -> Decimal {
        (self.debit - self.credit) * self.effective_quantity()
    }

    pub fn checked_balance(&self) -> Option<Decimal> {
        self.debit
            .checked_sub(self.credit)?
            .checked_mul(self.effective_quantity())
    }
}

/// Order/ticket tree node
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Card {
    pub id: String,
    /// Creation time (Unix milliseconds)
    pub time: i64,
    #[serde(default)]
    pub tags: BTreeMap<String, CardTag>,
    #[serde(default)]
    pub cards: Vec<Card>,
}

impl Card {
    pub fn new(id: impl Into<String>, time: i64) -> Self {
        Self {
            id: id.into(),
            time,
            tags: BTreeMap::new(),
            cards: Vec::new(),
        }
    }

    /// Create an empty card with a fresh id stamped with the current time
    pub fn create() -> Self {
        Self::new(
            uuid::Uuid::new_v4().to_string(),
            chrono::Utc::now().timestamp_millis(),
        )
    }

    // ========== Derived values ==========

    /// Sum of own tag balances plus all sub-card balances.
    ///
    /// Computed on every call; there is no cache to invalidate.
    pub fn balance(&self) -> Decimal {
        let tag_balance: Decimal = self.tags.values().map(CardTag::balance).sum();
        tag_balance + self.sub_card_balance()
    }

    pub fn sub_card_balance(&self) -> Decimal {
        self.cards.iter().map(Card::balance).sum()
    }

    /// Balance with overflow reported as an invariant violation
    pub fn checked_balance(&self) -> Result<Decimal, CardError> {
        let overflow = || CardError::BalanceOverflow(self.id.clone());
        let mut total = Decimal::ZERO;
        for tag in self.tags.values() {
            let balance = tag.checked_balance().ok_or_else(overflow)?;
            total = total.checked_add(balance).ok_or_else(overflow)?;
        }
        for child in &self.cards {
            total = total
                .checked_add(child.checked_balance()?)
                .ok_or_else(overflow)?;
        }
        Ok(total)
    }

    pub fn is_closed(&self) -> bool {
        self.tags
            .get(STATUS_TAG)
            .is_some_and(|tag| tag.value == CLOSED_STATUS)
    }

    /// Display label: the `Name` tag, else `name: value` pairs, else the id
    pub fn display(&self) -> String {
        if let Some(name) = self.tags.get(NAME_TAG).filter(|t| !t.value.is_empty()) {
            return name.value.clone();
        }
        if self.tags.is_empty() {
            return self.id.clone();
        }
        self.tags
            .values()
            .map(|t| format!("{}: {}", t.name, t.value))
            .collect::<Vec<_>>()
            .join(", ")
    }

    /// Number of cards in this subtree, including self
    pub fn card_count(&self) -> usize {
        1 + self.cards.iter().map(Card::card_count).sum::<usize>()
    }

    // ========== Lookup ==========

    pub fn find(&self, id: &str) -> Option<&Card> {
        if self.id == id {
            return Some(self);
        }
        self.cards.iter().find_map(|c| c.find(id))
    }

    pub fn contains(&self, id: &str) -> bool {
        self.find(id).is_some()
    }

    /// Child indices leading from self to `id`. Empty path means self.
    pub fn find_path(&self, id: &str) -> Option<Vec<usize>> {
        if self.id == id {
            return Some(Vec::new());
        }
        self.cards.iter().enumerate().find_map(|(index, child)| {
            child.find_path(id).map(|mut path| {
                path.insert(0, index);
                path
            })
        })
    }

    /// Check that every id in the subtree is unique and the balance is
    /// representable.
    pub fn validate(&self) -> Result<(), CardError> {
        let mut seen = HashSet::new();
        self.collect_ids(&mut seen)?;
        self.checked_balance().map(|_| ())
    }

    fn collect_ids<'a>(&'a self, seen: &mut HashSet<&'a str>) -> Result<(), CardError> {
        if !seen.insert(self.id.as_str()) {
            return Err(CardError::DuplicateCard(self.id.clone()));
        }
        self.cards.iter().try_for_each(|c| c.collect_ids(seen))
    }

    // ========== Mutation (returns new cards) ==========

    /// Insert or replace a tag. The tag is stored under `name`.
    pub fn with_tag(&self, name: impl Into<String>, tag: CardTag) -> Card {
        let name = name.into();
        let mut next = self.clone();
        next.tags.insert(name.clone(), CardTag { name, ..tag });
        next
    }

    pub fn without_tag(&self, name: &str) -> Card {
        let mut next = self.clone();
        next.tags.remove(name);
        next
    }

    /// Append a sub-card. Fails when any id of `child` already exists in
    /// this subtree.
    pub fn with_child(&self, child: Card) -> Result<Card, CardError> {
        let mut existing = HashSet::new();
        self.collect_ids(&mut existing)?;
        let mut incoming = HashSet::new();
        child.collect_ids(&mut incoming)?;
        if let Some(dup) = incoming.iter().find(|id| existing.contains(*id)) {
            return Err(CardError::DuplicateCard((*dup).to_string()));
        }
        let mut next = self.clone();
        next.cards.push(child);
        Ok(next)
    }

    /// Transform a direct child by exact id
    pub fn replace_child<F>(&self, id: &str, f: F) -> Result<Card, CardError>
    where
        F: FnOnce(&Card) -> Card,
    {
        let index = self
            .cards
            .iter()
            .position(|c| c.id == id)
            .ok_or_else(|| CardError::CardNotFound(id.to_string()))?;
        self.rebuild(&[index], |c| Ok(f(c)))
    }

    /// Transform any card in the subtree (self included) by exact id.
    ///
    /// Ancestors of the target are copied; siblings are cloned unchanged.
    pub fn replace_card<F, E>(&self, id: &str, f: F) -> Result<Card, E>
    where
        F: FnOnce(&Card) -> Result<Card, E>,
        E: From<CardError>,
    {
        let path = self
            .find_path(id)
            .ok_or_else(|| CardError::CardNotFound(id.to_string()))?;
        self.rebuild(&path, f)
    }

    /// Remove a card anywhere below self
    pub fn without_child(&self, id: &str) -> Result<Card, CardError> {
        let mut path = self.find_path(id).unwrap_or_default();
        let Some(last) = path.pop() else {
            return Err(CardError::CardNotFound(id.to_string()));
        };
        self.rebuild(&path, |parent| {
            let mut next = parent.clone();
            next.cards.remove(last);
            Ok(next)
        })
    }

    fn rebuild<F, E>(&self, path: &[usize], f: F) -> Result<Card, E>
    where
        F: FnOnce(&Card) -> Result<Card, E>,
    {
        let Some((&index, rest)) = path.split_first() else {
            return f(self);
        };
        let replacement = self.cards[index].rebuild(rest, f)?;

        let mut cards = Vec::with_capacity(self.cards.len());
        cards.extend_from_slice(&self.cards[..index]);
        cards.push(replacement);
        cards.extend_from_slice(&self.cards[index + 1..]);

        Ok(Card {
            id: self.id.clone(),
            time: self.time,
            tags: self.tags.clone(),
            cards,
        })
    }

    // ========== Drift detection ==========

    /// Content hash of the whole subtree (hex, 32 chars).
    ///
    /// Used to compare a locally replayed state with the state a commit
    /// carries.
    pub fn checksum(&self) -> String {
        use sha2::{Digest, Sha256};

        let mut hasher = Sha256::new();
        self.hash_into(&mut hasher);
        let result = hasher.finalize();
        hex::encode(&result[..16])
    }

    fn hash_into(&self, hasher: &mut sha2::Sha256) {
        use sha2::Digest;

        hasher.update(self.id.as_bytes());
        hasher.update(self.time.to_le_bytes());
        for tag in self.tags.values() {
            hasher.update(tag.name.as_bytes());
            hasher.update([0u8]);
            hasher.update(tag.value.as_bytes());
            hasher.update([0u8]);
            hasher.update(tag.quantity.normalize().to_string().as_bytes());
            hasher.update(tag.debit.normalize().to_string().as_bytes());
            hasher.update(tag.credit.normalize().to_string().as_bytes());
        }
        hasher.update((self.cards.len() as u64).to_le_bytes());
        for child in &self.cards {
            child.hash_into(hasher);
        }
    }
}
