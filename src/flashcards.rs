//! Flashcard review rounds.
//!
//! A round walks the cards that are still unknown. Marking a card known
//! drops it from the rotation; running past the end of a round starts the
//! next one with whatever is left, in deck order. Once every card is known
//! the session is complete.

use crate::content::Flashcard;
use rand::seq::SliceRandom;
use rand::Rng;
use serde::Serialize;
use std::collections::HashSet;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionProgress {
    pub known: usize,
    pub total: usize,
    pub round: u32,
}

#[derive(Debug, Clone)]
pub struct FlashcardSession {
    deck: Vec<Flashcard>,
    remaining: Vec<Flashcard>,
    index: usize,
    flipped: bool,
    known: HashSet<String>,
    round: u32,
}

impl FlashcardSession {
    pub fn new(cards: Vec<Flashcard>) -> Self {
        Self {
            remaining: cards.clone(),
            deck: cards,
            index: 0,
            flipped: false,
            known: HashSet::new(),
            round: 1,
        }
    }

    /// Start with some cards already known, e.g. from a learner's history.
    pub fn with_known<'a>(cards: Vec<Flashcard>, known: impl IntoIterator<Item = &'a str>) -> Self {
        let mut session = Self::new(cards);
        let deck_ids: HashSet<&str> = session.deck.iter().map(|c| c.id.as_str()).collect();
        session.known = known
            .into_iter()
            .filter(|id| deck_ids.contains(id))
            .map(str::to_string)
            .collect();
        session.remaining.retain(|c| !session.known.contains(&c.id));
        session
    }

    pub fn current(&self) -> Option<&Flashcard> {
        self.remaining.get(self.index)
    }

    /// Cards left in the current round, from the current one onwards.
    pub fn upcoming(&self) -> &[Flashcard] {
        self.remaining.get(self.index..).unwrap_or_default()
    }

    pub fn is_flipped(&self) -> bool {
        self.flipped
    }

    pub fn flip(&mut self) {
        if self.current().is_some() {
            self.flipped = !self.flipped;
        }
    }

    pub fn next(&mut self) -> Option<&Flashcard> {
        self.flipped = false;
        if self.remaining.is_empty() {
            return None;
        }

        self.index += 1;
        if self.index >= self.remaining.len() {
            self.start_round();
        }
        self.current()
    }

    /// Step back one card. Stays on the first card of the round.
    pub fn previous(&mut self) -> Option<&Flashcard> {
        self.flipped = false;
        self.index = self.index.saturating_sub(1);
        self.current()
    }

    /// Mark the current card known and move on to the card after it.
    pub fn mark_known(&mut self) -> Option<&Flashcard> {
        if self.index >= self.remaining.len() {
            return None;
        }

        let card = self.remaining.remove(self.index);
        self.known.insert(card.id);
        self.flipped = false;

        if self.index >= self.remaining.len() {
            self.start_round();
        }
        self.current()
    }

    /// Fisher-Yates over the cards still in rotation.
    pub fn shuffle<R: Rng + ?Sized>(&mut self, rng: &mut R) {
        self.remaining.shuffle(rng);
        self.index = 0;
        self.flipped = false;
    }

    pub fn restart(&mut self) {
        self.remaining = self.deck.clone();
        self.known.clear();
        self.index = 0;
        self.flipped = false;
        self.round = 1;
    }

    pub fn is_complete(&self) -> bool {
        self.remaining.is_empty()
    }

    pub fn progress(&self) -> SessionProgress {
        SessionProgress {
            known: self.known.len(),
            total: self.deck.len(),
            round: self.round,
        }
    }

    fn start_round(&mut self) {
        self.remaining = self
            .deck
            .iter()
            .filter(|c| !self.known.contains(&c.id))
            .cloned()
            .collect();
        self.index = 0;
        if !self.remaining.is_empty() {
            self.round += 1;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    fn card(id: &str) -> Flashcard {
        Flashcard {
            id: id.to_string(),
            deck_id: "deck_1".to_string(),
            front_text: format!("front {}", id),
            back_text: format!("back {}", id),
            example: None,
            image_url: None,
            audio_url: None,
        }
    }

    fn deck(n: usize) -> Vec<Flashcard> {
        (1..=n).map(|i| card(&format!("card_{}", i))).collect()
    }

    fn current_id(session: &FlashcardSession) -> Option<&str> {
        session.current().map(|c| c.id.as_str())
    }

    // ==================== Navigation Tests ====================

    #[test]
    fn test_new_session_starts_at_first_card() {
        let session = FlashcardSession::new(deck(3));

        assert_eq!(current_id(&session), Some("card_1"));
        assert!(!session.is_flipped());
        assert_eq!(session.progress(), SessionProgress { known: 0, total: 3, round: 1 });
    }

    #[test]
    fn test_flip_and_next_resets_flip() {
        let mut session = FlashcardSession::new(deck(3));

        session.flip();
        assert!(session.is_flipped());

        session.next();
        assert!(!session.is_flipped());
        assert_eq!(current_id(&session), Some("card_2"));
    }

    #[test]
    fn test_previous_stops_at_first_card() {
        let mut session = FlashcardSession::new(deck(3));
        session.flip();

        session.previous();
        assert_eq!(current_id(&session), Some("card_1"));
        assert!(!session.is_flipped());
    }

    #[test]
    fn test_next_past_end_starts_new_round() {
        let mut session = FlashcardSession::new(deck(2));

        session.next();
        session.next();

        assert_eq!(current_id(&session), Some("card_1"));
        assert_eq!(session.progress().round, 2);
    }

    // ==================== Known Card Tests ====================

    #[test]
    fn test_mark_known_removes_card_from_rotation() {
        let mut session = FlashcardSession::new(deck(3));

        session.next();
        let next = session.mark_known().map(|c| c.id.clone());

        assert_eq!(next.as_deref(), Some("card_3"));
        assert_eq!(session.progress().known, 1);
    }

    #[test]
    fn test_new_round_keeps_unknown_cards_in_deck_order() {
        let mut session = FlashcardSession::new(deck(4));

        session.shuffle(&mut StdRng::seed_from_u64(3));
        // Mark the first card of the shuffled round known, skip the rest
        let known_id = session.current().unwrap().id.clone();
        session.mark_known();
        while session.progress().round == 1 {
            session.next();
        }

        let expected: Vec<String> = deck(4)
            .into_iter()
            .map(|c| c.id)
            .filter(|id| *id != known_id)
            .collect();
        let actual: Vec<String> = session.upcoming().iter().map(|c| c.id.clone()).collect();
        assert_eq!(actual, expected);
    }

    #[test]
    fn test_marking_every_card_completes_session() {
        let mut session = FlashcardSession::new(deck(3));

        session.mark_known();
        session.mark_known();
        session.mark_known();

        assert!(session.is_complete());
        assert!(session.current().is_none());
        assert!(session.next().is_none());
        assert!(session.mark_known().is_none());
        assert_eq!(session.progress().known, 3);
    }

    #[test]
    fn test_with_known_skips_known_cards() {
        let session = FlashcardSession::with_known(deck(3), ["card_1", "card_9"]);

        assert_eq!(current_id(&session), Some("card_2"));
        // card_9 is not in this deck
        assert_eq!(session.progress().known, 1);
    }

    #[test]
    fn test_restart_resets_everything() {
        let mut session = FlashcardSession::new(deck(2));
        session.mark_known();
        session.next();

        session.restart();

        assert_eq!(current_id(&session), Some("card_1"));
        assert_eq!(session.progress(), SessionProgress { known: 0, total: 2, round: 1 });
    }

    #[test]
    fn test_empty_deck_is_complete() {
        let mut session = FlashcardSession::new(Vec::new());

        assert!(session.is_complete());
        session.flip();
        assert!(!session.is_flipped());
        assert!(session.previous().is_none());
    }

    // ==================== Property Tests ====================

    proptest! {
        #[test]
        fn test_shuffle_is_permutation(n in 0usize..30, seed in any::<u64>()) {
            let mut session = FlashcardSession::new(deck(n));
            session.shuffle(&mut StdRng::seed_from_u64(seed));

            let mut before: Vec<String> = deck(n).into_iter().map(|c| c.id).collect();
            let mut after: Vec<String> = session.upcoming().iter().map(|c| c.id.clone()).collect();
            before.sort();
            after.sort();
            prop_assert_eq!(before, after);
        }

        #[test]
        fn test_cycling_terminates(n in 0usize..20, skips in proptest::collection::vec(0usize..4, 0..20)) {
            let mut session = FlashcardSession::new(deck(n));

            // Interleave skipping with marking; each mark shrinks the unknown set
            for skip in skips.iter().cycle().take(n) {
                for _ in 0..*skip {
                    session.next();
                }
                session.mark_known();
            }
            while !session.is_complete() {
                session.mark_known();
            }

            prop_assert_eq!(session.progress().known, n);
        }
    }
}
