/// Short affirmations ("a reason I love you").
///
/// The generator is an external collaborator behind [`AffirmationGenerator`].
/// The crate ships an offline phrase book; a hosted text model can be plugged in
/// by implementing the trait with [`PROMPT`] as its single static prompt.
use anyhow::{bail, Result};
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::SeedableRng;
use tracing::{error, warn};

/// Static prompt for text-generation backends.
pub const PROMPT: &str = "You are a love expert, skilled at articulating heartfelt reasons why \
someone might love their girlfriend. Generate a unique and touching reason, keeping it concise \
and emotionally resonant. Focus on genuine affection and appreciation. Use no more than 20 words.";

/// Returned whenever the generator fails or answers with something unusable.
pub const FALLBACK_REASON: &str = "My love for you is beyond words right now.";

pub const MAX_WORDS: usize = 20;

pub trait AffirmationGenerator {
    fn generate(&mut self) -> Result<String>;
}

const PHRASES: &[&str] = &[
    "Because your laugh turns ordinary evenings into my favourite memories.",
    "Because you listen to my silences as carefully as my words.",
    "Because every plan feels brighter when it has you in it.",
    "Because you make home a person, not a place.",
    "Because you are kind even when nobody is watching.",
    "Because your hand in mine makes every crowd feel quiet.",
    "Because you believe in me on the days I forget to.",
    "Because you remember the little things that matter to me.",
    "Because with you, even waiting in line feels like an adventure.",
    "Because your curiosity makes the world feel new again.",
];

/// Offline generator picking one phrase at random
pub struct PhraseBook {
    rng: StdRng,
}

impl PhraseBook {
    pub fn new() -> Self {
        Self {
            rng: StdRng::from_entropy(),
        }
    }

    pub fn with_seed(seed: u64) -> Self {
        Self {
            rng: StdRng::seed_from_u64(seed),
        }
    }
}

impl Default for PhraseBook {
    fn default() -> Self {
        Self::new()
    }
}

impl AffirmationGenerator for PhraseBook {
    fn generate(&mut self) -> Result<String> {
        match PHRASES.choose(&mut self.rng) {
            Some(phrase) => Ok((*phrase).to_string()),
            None => bail!("Phrase book is empty"),
        }
    }
}

/// Ask the generator once and fall back to [`FALLBACK_REASON`] on any failure.
///
/// Empty answers and answers longer than [`MAX_WORDS`] words count as failures.
pub fn generate_reason(generator: &mut dyn AffirmationGenerator) -> String {
    match generator.generate() {
        Ok(reason) => {
            let reason = reason.trim();
            let words = reason.split_whitespace().count();
            if words == 0 || words > MAX_WORDS {
                warn!("Discarding affirmation with {} words", words);
                FALLBACK_REASON.to_string()
            } else {
                reason.to_string()
            }
        }
        Err(e) => {
            error!("Error generating reason: {:#}", e);
            FALLBACK_REASON.to_string()
        }
    }
}
