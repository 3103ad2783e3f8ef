//! Blackjack against the house with one seat played on behalf of chat.
//!
//! Round flow: `deal` (P, D, P, D) → `hit` / `stand` / `split` on each player
//! hand → dealer draws → resolved. Naturals resolve straight off the deal.

use rand::{CryptoRng, Rng};
use serde::{Deserialize, Serialize};
use std::{cmp::Ordering, fmt};

use super::{
    GameConfig, GameError, Phase,
    cards::{ACE, Card, Shoe, show_cards},
};

/// Score of a blackjack hand.
#[derive(Clone, Copy, Debug, Deserialize, Eq, PartialEq, Serialize)]
pub struct HandValue {
    pub total: u8,
    /// An ace is being counted as 11.
    pub soft: bool,
}

impl HandValue {
    pub fn is_bust(&self) -> bool {
        self.total > 21
    }
}

impl fmt::Display for HandValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.soft {
            write!(f, "soft {}", self.total)
        } else {
            write!(f, "{}", self.total)
        }
    }
}

fn card_points(card: &Card) -> u8 {
    match card.rank() {
        ACE => 1,
        r if r >= 10 => 10,
        r => r,
    }
}

/// Scores a hand. Every ace counts 1, then one ace is promoted to 11 when that
/// keeps the total at 21 or under (two elevens would always bust).
pub fn hand_value(cards: &[Card]) -> HandValue {
    let hard: u8 = cards.iter().map(card_points).sum();
    if cards.iter().any(Card::is_ace) && hard + 10 <= 21 {
        HandValue {
            total: hard + 10,
            soft: true,
        }
    } else {
        HandValue {
            total: hard,
            soft: false,
        }
    }
}

#[derive(Clone, Copy, Debug, Deserialize, Eq, PartialEq, Serialize)]
pub enum HandStatus {
    Playing,
    Stood,
    Busted,
}

#[derive(Clone, Debug, Deserialize, Eq, PartialEq, Serialize)]
pub struct Hand {
    pub cards: Vec<Card>,
    /// Hand came out of a split and can no longer count as a natural.
    pub split: bool,
    pub status: HandStatus,
}

impl Hand {
    pub fn new(cards: Vec<Card>, split: bool) -> Self {
        Self {
            cards,
            split,
            status: HandStatus::Playing,
        }
    }

    pub fn value(&self) -> HandValue {
        hand_value(&self.cards)
    }

    pub fn is_natural(&self) -> bool {
        !self.split && self.cards.len() == 2 && self.value().total == 21
    }

    fn can_split(&self) -> bool {
        !self.split && self.cards.len() == 2 && self.cards[0].rank() == self.cards[1].rank()
    }
}

impl fmt::Display for Hand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({})", show_cards(&self.cards), self.value())
    }
}

#[derive(Clone, Copy, Debug, Deserialize, Eq, PartialEq, Serialize)]
pub enum HandResult {
    Win,
    Lose,
    Push,
}

impl fmt::Display for HandResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let repr = match self {
            Self::Win => "wins",
            Self::Lose => "loses",
            Self::Push => "pushes",
        };
        write!(f, "{repr}")
    }
}

/// Final state of a blackjack round.
#[derive(Clone, Debug, Deserialize, Eq, PartialEq, Serialize)]
pub struct BlackjackOutcome {
    pub hands: Vec<(Hand, HandResult)>,
    pub dealer: Hand,
    /// The player's opening hand was a natural blackjack.
    pub natural: bool,
}

impl BlackjackOutcome {
    pub fn wins(&self) -> usize {
        self.count(HandResult::Win)
    }

    pub fn losses(&self) -> usize {
        self.count(HandResult::Lose)
    }

    fn count(&self, result: HandResult) -> usize {
        self.hands.iter().filter(|(_, r)| *r == result).count()
    }
}

impl fmt::Display for BlackjackOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let hands = self
            .hands
            .iter()
            .map(|(hand, result)| format!("{hand} {result}"))
            .collect::<Vec<_>>()
            .join(", ");
        write!(f, "Player: {hands} | Dealer: {}", self.dealer)?;
        if self.natural {
            write!(f, " | Blackjack!")?;
        }
        Ok(())
    }
}

/// Cards that must be left in the shoe for a round to be dealt: a split,
/// several hits on each hand and a long dealer draw.
pub const ROUND_RESERVE: usize = 20;

/// A blackjack table: shoe, player hands and dealer hand.
#[derive(Debug)]
pub struct BlackjackTable {
    shoe: Shoe,
    reserve: usize,
    dealer_hits_soft_17: bool,
    phase: Phase,
    hands: Vec<Hand>,
    active: usize,
    dealer: Hand,
    pending: Option<BlackjackOutcome>,
}

impl BlackjackTable {
    /// Builds a table with a freshly shuffled shoe.
    pub fn new<R: Rng + CryptoRng + ?Sized>(config: &GameConfig, rng: &mut R) -> Self {
        let mut shoe = Shoe::new(config.blackjack_decks, config.blackjack_penetration);
        shoe.shuffle(rng);
        Self::with_shoe(shoe, config.dealer_hits_soft_17)
    }

    /// A shoe shorter than [`ROUND_RESERVE`] (a stacked one) is dealt down to
    /// its last card.
    pub fn with_shoe(shoe: Shoe, dealer_hits_soft_17: bool) -> Self {
        Self {
            reserve: ROUND_RESERVE.min(shoe.len()),
            shoe,
            dealer_hits_soft_17,
            phase: Phase::Idle,
            hands: Vec::new(),
            active: 0,
            dealer: Hand::new(Vec::new(), false),
            pending: None,
        }
    }

    pub fn phase(&self) -> Phase {
        self.phase
    }

    pub fn hands(&self) -> &[Hand] {
        &self.hands
    }

    pub fn dealer(&self) -> &Hand {
        &self.dealer
    }

    pub fn needs_reshuffle(&self) -> bool {
        self.shoe.needs_reshuffle()
    }

    pub fn pending(&self) -> Option<&BlackjackOutcome> {
        self.pending.as_ref()
    }

    pub fn mark_settled(&mut self) {
        self.pending = None;
        self.phase = Phase::Idle;
    }

    /// Deals a new round, reshuffling first when the cut card has been
    /// reached. Returns the outcome straight away when either side holds a
    /// natural.
    pub fn deal<R: Rng + CryptoRng + ?Sized>(
        &mut self,
        rng: &mut R,
    ) -> Result<Option<BlackjackOutcome>, GameError> {
        match self.phase {
            Phase::Dealt => return Err(GameError::RoundInProgress),
            Phase::Resolved => return Err(GameError::UnsettledRound),
            Phase::Idle => {}
        }
        if self.shoe.needs_reshuffle() {
            log::info!("Reshuffling the blackjack shoe");
            self.shoe.shuffle(rng);
        }
        if self.shoe.remaining() < self.reserve.max(4) {
            return Err(GameError::ShoeExhausted);
        }

        let p1 = self.shoe.draw()?;
        let d1 = self.shoe.draw()?;
        let p2 = self.shoe.draw()?;
        let d2 = self.shoe.draw()?;
        self.hands = vec![Hand::new(vec![p1, p2], false)];
        self.dealer = Hand::new(vec![d1, d2], false);
        self.active = 0;
        self.phase = Phase::Dealt;

        if self.hands[0].is_natural() || self.dealer.is_natural() {
            self.hands[0].status = HandStatus::Stood;
            return Ok(Some(self.resolve()));
        }
        Ok(None)
    }

    pub fn hit(&mut self) -> Result<Option<BlackjackOutcome>, GameError> {
        self.act(|table| {
            let card = table.shoe.draw()?;
            table.active_hand()?.cards.push(card);
            table.advance()
        })
    }

    pub fn stand(&mut self) -> Result<Option<BlackjackOutcome>, GameError> {
        self.act(|table| {
            table.active_hand()?.status = HandStatus::Stood;
            table.advance()
        })
    }

    /// Splits the opening pair into two hands, each drawing one card.
    pub fn split(&mut self) -> Result<Option<BlackjackOutcome>, GameError> {
        self.act(|table| {
            if table.hands.len() != 1 || !table.hands[0].can_split() {
                return Err(GameError::IllegalSplit);
            }
            let replacement = table.shoe.draw()?;
            let second_card = table.shoe.draw()?;

            let first = &mut table.hands[0];
            let moved = first.cards.pop().ok_or(GameError::IllegalSplit)?;
            first.split = true;
            first.cards.push(replacement);

            table.hands.push(Hand::new(vec![moved, second_card], true));
            table.advance()
        })
    }

    /// Runs a player action. A failed action leaves the shoe and every hand
    /// as they were, so it can be retried.
    fn act<F>(&mut self, action: F) -> Result<Option<BlackjackOutcome>, GameError>
    where
        F: FnOnce(&mut Self) -> Result<Option<BlackjackOutcome>, GameError>,
    {
        self.require_dealt()?;
        let checkpoint = (
            self.shoe.clone(),
            self.hands.clone(),
            self.active,
            self.dealer.clone(),
        );
        let result = action(self);
        if result.is_err() {
            (self.shoe, self.hands, self.active, self.dealer) = checkpoint;
        }
        result
    }

    fn active_hand(&mut self) -> Result<&mut Hand, GameError> {
        self.hands
            .get_mut(self.active)
            .ok_or(GameError::NoHandToPlay)
    }

    fn require_dealt(&self) -> Result<(), GameError> {
        match self.phase {
            Phase::Dealt => Ok(()),
            Phase::Resolved => Err(GameError::UnsettledRound),
            Phase::Idle => Err(GameError::NoRoundInProgress),
        }
    }

    /// Closes out finished hands (stood, busted or sitting on 21) and moves
    /// to the dealer once no player hand is left to act.
    fn advance(&mut self) -> Result<Option<BlackjackOutcome>, GameError> {
        while let Some(hand) = self.hands.get_mut(self.active) {
            let value = hand.value();
            if value.is_bust() {
                hand.status = HandStatus::Busted;
            } else if value.total == 21 {
                hand.status = HandStatus::Stood;
            }
            if hand.status == HandStatus::Playing {
                return Ok(None);
            }
            self.active += 1;
        }

        if self.hands.iter().any(|h| h.status != HandStatus::Busted) {
            self.play_dealer()?;
        }
        Ok(Some(self.resolve()))
    }

    fn play_dealer(&mut self) -> Result<(), GameError> {
        loop {
            let value = self.dealer.value();
            let draws = value.total < 17 || (self.dealer_hits_soft_17 && value.soft && value.total == 17);
            if !draws {
                break;
            }
            let card = self.shoe.draw()?;
            self.dealer.cards.push(card);
        }
        self.dealer.status = if self.dealer.value().is_bust() {
            HandStatus::Busted
        } else {
            HandStatus::Stood
        };
        Ok(())
    }

    fn resolve(&mut self) -> BlackjackOutcome {
        let dealer_value = self.dealer.value();
        let dealer_natural = self.dealer.is_natural();

        let hands = self
            .hands
            .iter()
            .map(|hand| {
                let value = hand.value();
                let result = if value.is_bust() {
                    HandResult::Lose
                } else if hand.is_natural() || dealer_natural {
                    match (hand.is_natural(), dealer_natural) {
                        (true, true) => HandResult::Push,
                        (true, false) => HandResult::Win,
                        _ => HandResult::Lose,
                    }
                } else if dealer_value.is_bust() {
                    HandResult::Win
                } else {
                    match value.total.cmp(&dealer_value.total) {
                        Ordering::Greater => HandResult::Win,
                        Ordering::Less => HandResult::Lose,
                        Ordering::Equal => HandResult::Push,
                    }
                };
                (hand.clone(), result)
            })
            .collect();

        let outcome = BlackjackOutcome {
            hands,
            dealer: self.dealer.clone(),
            natural: self.hands.first().is_some_and(Hand::is_natural),
        };
        self.phase = Phase::Resolved;
        self.pending = Some(outcome.clone());
        outcome
    }

    pub fn status(&self) -> String {
        match self.phase {
            Phase::Idle if self.hands.is_empty() => "Blackjack is idle. Place your bets!".to_string(),
            Phase::Idle | Phase::Resolved => {
                let hands = self
                    .hands
                    .iter()
                    .map(ToString::to_string)
                    .collect::<Vec<_>>()
                    .join(", ");
                format!(
                    "Blackjack is {}. Player: {hands} | Dealer: {}",
                    self.phase, self.dealer
                )
            }
            Phase::Dealt => {
                let hands = self
                    .hands
                    .iter()
                    .enumerate()
                    .map(|(i, hand)| {
                        if i == self.active {
                            format!("[{hand}]")
                        } else {
                            hand.to_string()
                        }
                    })
                    .collect::<Vec<_>>()
                    .join(", ");
                let upcard = self
                    .dealer
                    .cards
                    .first()
                    .map(ToString::to_string)
                    .unwrap_or_default();
                format!("Blackjack in progress. Player: {hands} | Dealer: {upcard} ??")
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::games::cards::{JACK, KING, QUEEN, Suit};

    fn c(value: u8) -> Card {
        Card(value, Suit::Spade)
    }

    fn table(cards: Vec<Card>) -> BlackjackTable {
        BlackjackTable::with_shoe(Shoe::stacked(cards), false)
    }

    #[test]
    fn test_soft_ace() {
        let value = hand_value(&[c(ACE), c(6)]);
        assert_eq!(value, HandValue { total: 17, soft: true });
    }

    #[test]
    fn test_ace_demotes_when_it_would_bust() {
        let value = hand_value(&[c(ACE), c(6), c(9)]);
        assert_eq!(value, HandValue { total: 16, soft: false });
    }

    #[test]
    fn test_two_aces_only_one_soft() {
        assert_eq!(hand_value(&[c(ACE), c(ACE)]), HandValue { total: 12, soft: true });
        assert_eq!(hand_value(&[c(ACE), c(ACE), c(9)]), HandValue { total: 21, soft: true });
    }

    #[test]
    fn test_face_cards_count_ten() {
        assert_eq!(hand_value(&[c(JACK), c(QUEEN)]).total, 20);
        assert_eq!(hand_value(&[c(KING), c(ACE)]), HandValue { total: 21, soft: true });
    }

    #[test]
    fn test_stand_dealer_draws_to_seventeen() {
        // P: 10, 8 | D: 6, 10 then draws 5 -> 21
        let mut table = table(vec![c(10), c(6), c(8), c(10), c(5)]);
        assert!(table.deal(&mut rand::rng()).unwrap().is_none());
        assert_eq!(table.phase(), Phase::Dealt);

        let outcome = table.stand().unwrap().unwrap();
        assert_eq!(outcome.dealer.value().total, 21);
        assert_eq!(outcome.hands[0].1, HandResult::Lose);
        assert_eq!(outcome.losses(), 1);
        assert!(!outcome.natural);
        assert_eq!(table.phase(), Phase::Resolved);
        assert_eq!(table.pending(), Some(&outcome));
    }

    #[test]
    fn test_player_bust_skips_dealer() {
        // P: 10, 6 | D: 9, 7 ; hit 10 -> bust
        let mut table = table(vec![c(10), c(9), c(6), c(7), c(KING)]);
        table.deal(&mut rand::rng()).unwrap();
        let outcome = table.hit().unwrap().unwrap();
        assert_eq!(outcome.hands[0].0.status, HandStatus::Busted);
        assert_eq!(outcome.hands[0].1, HandResult::Lose);
        assert_eq!(outcome.dealer.cards.len(), 2);
    }

    #[test]
    fn test_natural_resolves_on_deal() {
        let mut table = table(vec![c(ACE), c(9), c(KING), c(8)]);
        let outcome = table.deal(&mut rand::rng()).unwrap().unwrap();
        assert!(outcome.natural);
        assert_eq!(outcome.wins(), 1);
        assert_eq!(table.hit(), Err(GameError::UnsettledRound));
    }

    #[test]
    fn test_both_naturals_push() {
        let mut table = table(vec![c(ACE), c(ACE), c(KING), c(QUEEN)]);
        let outcome = table.deal(&mut rand::rng()).unwrap().unwrap();
        assert!(outcome.natural);
        assert_eq!(outcome.hands[0].1, HandResult::Push);
    }

    #[test]
    fn test_dealer_natural_beats_player() {
        let mut table = table(vec![c(10), c(ACE), c(9), c(KING)]);
        let outcome = table.deal(&mut rand::rng()).unwrap().unwrap();
        assert!(!outcome.natural);
        assert_eq!(outcome.hands[0].1, HandResult::Lose);
    }

    #[test]
    fn test_split_makes_two_hands_without_natural() {
        // P: 8, 8 | D: 10, 7 ; the split hands draw a 3 and an ace
        let mut table = table(vec![c(8), c(10), c(8), c(7), c(3), c(ACE)]);
        table.deal(&mut rand::rng()).unwrap();
        assert!(table.split().unwrap().is_none());

        let hands = table.hands();
        assert_eq!(hands.len(), 2);
        assert!(hands.iter().all(|h| h.split && h.cards.len() == 2));
        assert_eq!(hands[0].cards, vec![c(8), c(3)]);
        assert_eq!(hands[1].cards, vec![c(8), c(ACE)]);

        // first hand 11 stands, second hand is soft 19
        assert!(table.stand().unwrap().is_none());
        let outcome = table.stand().unwrap().unwrap();
        assert_eq!(outcome.hands[0].1, HandResult::Lose);
        assert_eq!(outcome.hands[1].1, HandResult::Win);
        assert!(!outcome.natural);
    }

    #[test]
    fn test_split_hand_with_twenty_one_is_not_natural() {
        let mut table = table(vec![c(ACE), c(10), c(ACE), c(8), c(KING), c(5), c(10)]);
        table.deal(&mut rand::rng()).unwrap();
        table.split().unwrap();
        assert_eq!(table.hands()[0].value().total, 21);
        assert!(!table.hands()[0].is_natural());
    }

    #[test]
    fn test_split_requires_matching_rank() {
        let mut table = table(vec![c(10), c(9), c(KING), c(7)]);
        table.deal(&mut rand::rng()).unwrap();
        assert_eq!(table.split(), Err(GameError::IllegalSplit));
        assert_eq!(table.hands().len(), 1);
    }

    #[test]
    fn test_no_split_after_hit() {
        let mut table = table(vec![c(2), c(10), c(2), c(7), c(2)]);
        table.deal(&mut rand::rng()).unwrap();
        table.hit().unwrap();
        assert_eq!(table.split(), Err(GameError::IllegalSplit));
    }

    #[test]
    fn test_dealer_soft_seventeen_rule() {
        let cards = vec![c(10), c(ACE), c(8), c(6), c(4)];

        let mut stands = BlackjackTable::with_shoe(Shoe::stacked(cards.clone()), false);
        stands.deal(&mut rand::rng()).unwrap();
        let outcome = stands.stand().unwrap().unwrap();
        assert_eq!(outcome.dealer.cards.len(), 2);
        assert_eq!(outcome.hands[0].1, HandResult::Win);

        let mut hits = BlackjackTable::with_shoe(Shoe::stacked(cards), true);
        hits.deal(&mut rand::rng()).unwrap();
        let outcome = hits.stand().unwrap().unwrap();
        assert_eq!(outcome.dealer.cards.len(), 3);
        assert_eq!(outcome.dealer.value().total, 21);
    }

    #[test]
    fn test_actions_need_a_round_and_settlement_reopens() {
        let mut table = table(vec![c(10), c(ACE), c(9), c(KING), c(5), c(5), c(5), c(5)]);
        assert_eq!(table.stand(), Err(GameError::NoRoundInProgress));
        table.deal(&mut rand::rng()).unwrap();
        assert_eq!(table.deal(&mut rand::rng()), Err(GameError::UnsettledRound));
        table.mark_settled();
        assert_eq!(table.phase(), Phase::Idle);
        assert!(table.pending().is_none());
    }

    #[test]
    fn test_dry_shoe_during_dealer_draw_changes_nothing() {
        // Player 10 2, dealer 5 6, nothing left for the dealer to draw
        let mut table = table(vec![c(10), c(5), c(2), c(6)]);
        assert_eq!(table.deal(&mut rand::rng()), Ok(None));

        assert_eq!(table.stand(), Err(GameError::ShoeExhausted));
        assert_eq!(table.phase(), Phase::Dealt);
        assert_eq!(table.active, 0);
        assert_eq!(table.hands()[0].status, HandStatus::Playing);
        assert_eq!(table.dealer().cards.len(), 2);

        // Retrying fails the same way instead of running off the hands
        assert_eq!(table.stand(), Err(GameError::ShoeExhausted));
        assert_eq!(table.hit(), Err(GameError::ShoeExhausted));
        assert_eq!(table.hands()[0].cards.len(), 2);
        assert_eq!(table.deal(&mut rand::rng()), Err(GameError::RoundInProgress));
    }

    #[test]
    fn test_split_without_cards_changes_nothing() {
        let mut table = table(vec![c(8), c(10), c(8), c(9)]);
        table.deal(&mut rand::rng()).unwrap();
        assert_eq!(table.split(), Err(GameError::ShoeExhausted));
        assert_eq!(table.hands().len(), 1);
        assert_eq!(table.hands()[0].cards.len(), 2);
        assert!(!table.hands()[0].split);
    }

    #[test]
    fn test_deal_keeps_a_reserve_behind() {
        let mut table = BlackjackTable::with_shoe(Shoe::new(1, 1.0), false);
        let mut refused = None;
        for _ in 0..52 {
            match table.deal(&mut rand::rng()) {
                Ok(_) => {
                    while table.pending().is_none() {
                        table.stand().unwrap();
                    }
                    table.mark_settled();
                }
                Err(err) => {
                    refused = Some(err);
                    break;
                }
            }
        }
        assert_eq!(refused, Some(GameError::ShoeExhausted));
        assert!(table.shoe.remaining() < ROUND_RESERVE);
    }

    #[test]
    fn test_reshuffles_between_rounds_once_cut_passed() {
        let config = GameConfig {
            blackjack_decks: 1,
            blackjack_penetration: 0.05,
            ..GameConfig::default()
        };
        let mut rng = rand::rng();
        let mut table = BlackjackTable::new(&config, &mut rng);
        table.deal(&mut rng).unwrap();
        while table.pending().is_none() {
            table.stand().unwrap();
        }
        table.mark_settled();
        assert!(table.needs_reshuffle());

        table.deal(&mut rng).unwrap();
        assert_eq!(table.shoe.cursor(), 4);
    }
}
