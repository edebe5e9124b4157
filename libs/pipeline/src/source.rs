use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use epm_api::{Record, ValueSource};

/// Верхняя граница (не включительно) случайного номера записи.
const VALUE_SPACE: u32 = 10_000;

/// Тестовые значения полей для номера `n`.
pub fn values_for(n: u32) -> Record {
    Record::new(
        format!("DN-{n}"),
        format!("LegalName-{n}"),
        format!("user{n}@example.com"),
        format!("+1-555-{n:04}"),
    )
}

/// Случайные тестовые записи: номер `n` из `[0, 10000)` на каждую запись.
pub struct RandomValues {
    rng: StdRng,
}

impl RandomValues {
    pub fn new() -> Self {
        Self { rng: StdRng::from_entropy() }
    }

    /// Воспроизводимая последовательность.
    pub fn seeded(seed: u64) -> Self {
        Self { rng: StdRng::seed_from_u64(seed) }
    }

    /// `Some(seed)` даёт воспроизводимую последовательность, `None` берёт энтропию ОС.
    pub fn from_seed(seed: Option<u64>) -> Self {
        seed.map_or_else(Self::new, Self::seeded)
    }
}

impl Default for RandomValues {
    fn default() -> Self {
        Self::new()
    }
}

impl ValueSource for RandomValues {
    fn next_record(&mut self, _index: usize) -> Record {
        values_for(self.rng.gen_range(0..VALUE_SPACE))
    }
}
