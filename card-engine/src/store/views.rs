//! Derived card lists for presentation
//!
//! ```ignore
//! let open = store.view().open_only().search("table").sorted(SortKey::TimeDesc);
//! ```

use rust_decimal::Decimal;
use shared::Card;

/// Ordering of a card list
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SortKey {
    Time,
    TimeDesc,
    /// Highest balance first
    Balance,
    Display,
}

type Predicate<'a> = Box<dyn Fn(&Card) -> bool + 'a>;

/// Lazy filter chain over a list of cards
pub struct CardView<'a> {
    cards: Vec<&'a Card>,
    predicates: Vec<Predicate<'a>>,
}

impl<'a> CardView<'a> {
    pub fn new(cards: impl IntoIterator<Item = &'a Card>) -> Self {
        Self {
            cards: cards.into_iter().collect(),
            predicates: Vec::new(),
        }
    }

    /// Case-insensitive match on id, display label and tag values.
    /// Blank text matches everything.
    pub fn search(self, text: &str) -> Self {
        let needle = text.trim().to_lowercase();
        if needle.is_empty() {
            return self;
        }
        self.filter(move |card| matches_text(card, &needle))
    }

    pub fn open_only(self) -> Self {
        self.filter(|card| !card.is_closed())
    }

    pub fn with_tag(self, name: &'a str) -> Self {
        self.filter(move |card| card.tags.contains_key(name))
    }

    pub fn filter(mut self, predicate: impl Fn(&Card) -> bool + 'a) -> Self {
        self.predicates.push(Box::new(predicate));
        self
    }

    pub fn collect(self) -> Vec<&'a Card> {
        let predicates = self.predicates;
        self.cards
            .into_iter()
            .filter(|card| predicates.iter().all(|p| p(*card)))
            .collect()
    }

    pub fn sorted(self, key: SortKey) -> Vec<&'a Card> {
        let mut cards = self.collect();
        match key {
            SortKey::Time => cards.sort_by_key(|c| c.time),
            SortKey::TimeDesc => cards.sort_by_key(|c| std::cmp::Reverse(c.time)),
            SortKey::Balance => cards.sort_by_cached_key(|c| {
                std::cmp::Reverse(c.checked_balance().unwrap_or(Decimal::MAX))
            }),
            SortKey::Display => cards.sort_by_cached_key(|c| c.display().to_lowercase()),
        }
        cards
    }

    pub fn count(self) -> usize {
        self.collect().len()
    }
}

fn matches_text(card: &Card, needle: &str) -> bool {
    card.id.to_lowercase().contains(needle)
        || card.display().to_lowercase().contains(needle)
        || card
            .tags
            .values()
            .any(|t| t.value.to_lowercase().contains(needle))
}
