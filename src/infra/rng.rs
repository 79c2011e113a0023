use crate::domain::card::Card;
use crate::engine::RandomSource;

/// Системный RNG (`thread_rng`).
#[derive(Clone, Debug, Default)]
pub struct SystemRng;

impl RandomSource for SystemRng {
    fn shuffle(&mut self, cards: &mut [Card]) {
        use rand::seq::SliceRandom;
        use rand::thread_rng;

        cards.shuffle(&mut thread_rng());
    }
}

/// Детерминированный RNG для тестов и реплея.
/// Позволяет воспроизводить одни и те же раунды при одинаковом seed.
#[derive(Clone, Debug)]
pub struct DeterministicRng {
    inner: rand::rngs::StdRng,
}

impl DeterministicRng {
    pub fn from_seed(seed: u64) -> Self {
        use rand::SeedableRng;
        Self {
            inner: rand::rngs::StdRng::seed_from_u64(seed),
        }
    }
}

impl RandomSource for DeterministicRng {
    fn shuffle(&mut self, cards: &mut [Card]) {
        use rand::seq::SliceRandom;
        cards.shuffle(&mut self.inner);
    }
}

/// «Подтасованный» шуз: заданные карты выходят первыми и именно в этом порядке,
/// остальные лежат под ними в исходном порядке. Применяется при каждой сборке шуза.
///
/// Удобно для сценарных тестов: раздача идёт игрокам по местам, потом дилеру,
/// потом доборы.
#[derive(Clone, Debug, Default)]
pub struct PresetRng {
    top: Vec<Card>,
}

impl PresetRng {
    pub fn new(top: Vec<Card>) -> Self {
        Self { top }
    }
}

impl RandomSource for PresetRng {
    fn shuffle(&mut self, cards: &mut [Card]) {
        let mut top: Vec<Card> = Vec::with_capacity(self.top.len());
        for card in &self.top {
            if cards.contains(card) && !top.contains(card) {
                top.push(*card);
            }
        }

        // Верх шуза: конец слайса, поэтому первая карта сценария идёт последней.
        let mut arranged: Vec<Card> = cards.iter().copied().filter(|c| !top.contains(c)).collect();
        arranged.extend(top.iter().rev().copied());
        cards.copy_from_slice(&arranged);
    }
}
