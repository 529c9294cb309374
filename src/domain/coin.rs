/// Coin sides and the source of randomness for a flip.

#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum CoinSide {
    Heads,
    Tails,
}

impl CoinSide {
    /// Parse a prediction: "heads"/"h" or "tails"/"t", any case.
    pub fn parse(input: &str) -> Option<Self> {
        match input.trim().to_lowercase().as_str() {
            "heads" | "h" => Some(CoinSide::Heads),
            "tails" | "t" => Some(CoinSide::Tails),
            _ => None,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            CoinSide::Heads => "heads",
            CoinSide::Tails => "tails",
        }
    }
}

/// Produces the result of one coin flip.
pub trait CoinToss {
    fn toss(&mut self) -> CoinSide;
}

/// Fair coin backed by a fastrand generator.
pub struct FairCoin {
    rng: fastrand::Rng,
}

impl FairCoin {
    pub fn new() -> Self {
        FairCoin { rng: fastrand::Rng::new() }
    }

    #[allow(dead_code)]
    pub fn with_seed(seed: u64) -> Self {
        FairCoin { rng: fastrand::Rng::with_seed(seed) }
    }
}

impl CoinToss for FairCoin {
    fn toss(&mut self) -> CoinSide {
        if self.rng.bool() { CoinSide::Heads } else { CoinSide::Tails }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_prediction() {
        assert_eq!(CoinSide::parse("H"), Some(CoinSide::Heads));
        assert_eq!(CoinSide::parse("tails"), Some(CoinSide::Tails));
        assert_eq!(CoinSide::parse("edge"), None);
    }

    #[test]
    fn fair_coin_lands_both_ways() {
        let mut coin = FairCoin::with_seed(42);
        let heads = (0..1000).filter(|_| coin.toss() == CoinSide::Heads).count();
        // Loose bound: a seeded fair coin should not be wildly lopsided.
        assert!(heads > 400 && heads < 600, "heads = {heads}");
    }
}
