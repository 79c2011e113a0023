use crate::domain::card::Card;
use crate::domain::deck::Deck;
use crate::engine::RandomSource;

/// Ниже этого остатка шуз «просит» перетасовки. Только подсказка:
/// посреди раунда движок ничего по этому флагу не делает.
pub const RESHUFFLE_THRESHOLD: usize = 10;

/// Рабочий запас карт стола.
///
/// Пустой шуз молча пересобирается и перемешивается при следующем `draw`,
/// поэтому `draw` никогда не падает.
pub struct Shoe {
    deck: Deck,
    rng: Box<dyn RandomSource + Send>,
}

impl Shoe {
    /// Новый перемешанный шуз.
    pub fn new(rng: Box<dyn RandomSource + Send>) -> Self {
        let mut shoe = Self {
            deck: Deck { cards: Vec::new() },
            rng,
        };
        shoe.initialize();
        shoe
    }

    /// Собрать все 52 карты заново и перемешать.
    pub fn initialize(&mut self) {
        self.deck = Deck::standard_52();
        self.rng.shuffle(&mut self.deck.cards);
    }

    /// Взять верхнюю карту. Пустой шуз сначала пересобирается.
    pub fn draw(&mut self) -> Card {
        loop {
            if let Some(card) = self.deck.draw_one() {
                return card;
            }
            tracing::debug!("shoe exhausted, reshuffling");
            self.initialize();
        }
    }

    pub fn remaining(&self) -> usize {
        self.deck.len()
    }

    pub fn needs_reshuffle(&self) -> bool {
        self.remaining() < RESHUFFLE_THRESHOLD
    }
}

impl std::fmt::Debug for Shoe {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Shoe")
            .field("remaining", &self.remaining())
            .finish()
    }
}
