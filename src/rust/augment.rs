//! Random token-level perturbation of normalized item names.
//!
//! Short catalog titles often arrive with words missing or reordered; training
//! on perturbed copies makes the classifier tolerant of both.

use rand::seq::SliceRandom;
use rand::Rng;

/// The perturbation applied to one sample.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Augmentation {
    /// Remove one token at a uniformly random position.
    DropOne,
    /// Uniformly permute all tokens.
    ShuffleAll,
    /// Leave the text as is.
    Keep,
}

impl Augmentation {
    const ALL: [Augmentation; 3] = [Self::DropOne, Self::ShuffleAll, Self::Keep];

    /// Draws one of the three operations with equal probability.
    pub fn sample<R: Rng + ?Sized>(rng: &mut R) -> Self {
        Self::ALL[rng.random_range(0..Self::ALL.len())]
    }

    /// Applies this operation to whitespace-separated `text`.
    ///
    /// Texts with fewer than two tokens are returned unchanged regardless of
    /// the operation.
    pub fn apply<R: Rng + ?Sized>(self, text: &str, rng: &mut R) -> String {
        let mut words: Vec<&str> = text.split_whitespace().collect();
        if words.len() < 2 {
            return text.to_string();
        }
        match self {
            Self::DropOne => {
                let idx = rng.random_range(0..words.len());
                words.remove(idx);
            }
            Self::ShuffleAll => words.shuffle(rng),
            Self::Keep => return text.to_string(),
        }
        words.join(" ")
    }
}

/// Perturbs `text` with a randomly chosen [`Augmentation`].
pub fn augment<R: Rng + ?Sized>(text: &str, rng: &mut R) -> String {
    if text.split_whitespace().nth(1).is_none() {
        return text.to_string();
    }
    Augmentation::sample(rng).apply(text, rng)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    fn sorted_tokens(text: &str) -> Vec<&str> {
        let mut tokens: Vec<&str> = text.split_whitespace().collect();
        tokens.sort_unstable();
        tokens
    }

    #[test]
    fn test_short_text_is_unchanged() {
        let mut rng = StdRng::seed_from_u64(0);
        for _ in 0..50 {
            assert_eq!(augment("", &mut rng), "");
            assert_eq!(augment("milk", &mut rng), "milk");
        }
        for op in Augmentation::ALL {
            assert_eq!(op.apply("bread", &mut rng), "bread");
        }
    }

    #[test]
    fn test_drop_removes_exactly_one_token() {
        let mut rng = StdRng::seed_from_u64(1);
        let text = "fresh whole milk one liter";
        for _ in 0..50 {
            let out = Augmentation::DropOne.apply(text, &mut rng);
            assert_eq!(out.split_whitespace().count(), 4);
            let original = sorted_tokens(text);
            assert!(out.split_whitespace().all(|t| original.contains(&t)));
        }
    }

    #[test]
    fn test_shuffle_preserves_token_multiset() {
        let mut rng = StdRng::seed_from_u64(2);
        let text = "dark chocolate dark bar";
        for _ in 0..50 {
            let out = Augmentation::ShuffleAll.apply(text, &mut rng);
            assert_eq!(sorted_tokens(&out), sorted_tokens(text));
        }
    }

    #[test]
    fn test_keep_is_identity() {
        let mut rng = StdRng::seed_from_u64(3);
        assert_eq!(Augmentation::Keep.apply("a b c", &mut rng), "a b c");
    }

    #[test]
    fn test_all_operations_are_drawn() {
        let mut rng = StdRng::seed_from_u64(4);
        let mut seen = [false; 3];
        for _ in 0..200 {
            match Augmentation::sample(&mut rng) {
                Augmentation::DropOne => seen[0] = true,
                Augmentation::ShuffleAll => seen[1] = true,
                Augmentation::Keep => seen[2] = true,
            }
        }
        assert_eq!(seen, [true; 3]);
    }

    #[test]
    fn test_augment_is_reproducible_with_seed() {
        let text = "organic red apples pack of six";
        let mut a = StdRng::seed_from_u64(42);
        let mut b = StdRng::seed_from_u64(42);
        let left: Vec<String> = (0..20).map(|_| augment(text, &mut a)).collect();
        let right: Vec<String> = (0..20).map(|_| augment(text, &mut b)).collect();
        assert_eq!(left, right);
    }
}
