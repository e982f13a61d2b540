use rand::seq::SliceRandom;
use rand::Rng;

use crate::core::text::ends_with_punc;
use crate::models::Corpus;

/// Longest walk before a sentence is abandoned.
const MAX_WORDS: usize = 60;
const MAX_ATTEMPTS: usize = 10;

pub trait Generator: Send + Sync {
    /// Produces a sentence no longer than `max_chars`, or `None` when the
    /// corpus cannot yield one.
    fn generate(&self, corpus: &Corpus, max_chars: usize) -> Option<String>;
}

/// Walks the word-pair corpus, picking uniformly among recorded next words.
#[derive(Default)]
pub struct MarkovGenerator;

impl MarkovGenerator {
    pub fn new() -> Self {
        MarkovGenerator
    }

    pub fn generate_with<R: Rng>(
        &self,
        corpus: &Corpus,
        max_chars: usize,
        rng: &mut R,
    ) -> Option<String> {
        let mut starts: Vec<&String> = corpus
            .keys()
            .filter(|key| key.chars().next().is_some_and(char::is_uppercase))
            .collect();
        if starts.is_empty() {
            return None;
        }
        // HashMap order is random per process; sort so a seeded rng is repeatable.
        starts.sort();

        for _ in 0..MAX_ATTEMPTS {
            let start = starts.choose(rng)?;
            if let Some(sentence) = self.walk(corpus, start, rng) {
                if sentence.chars().count() <= max_chars {
                    return Some(sentence);
                }
            }
        }

        None
    }

    fn walk<R: Rng>(&self, corpus: &Corpus, start: &str, rng: &mut R) -> Option<String> {
        let mut words: Vec<String> = start.split(' ').map(str::to_string).collect();
        if words.len() != 2 {
            return None;
        }

        while words.len() < MAX_WORDS {
            let key = format!("{} {}", words[words.len() - 2], words[words.len() - 1]);
            let next = match corpus.get(&key).and_then(|obs| obs.choose(rng)) {
                Some(observation) => observation.word.clone(),
                None => break,
            };

            let done = ends_with_punc(&next);
            words.push(next);
            if done {
                break;
            }
        }

        Some(words.join(" "))
    }
}

impl Generator for MarkovGenerator {
    fn generate(&self, corpus: &Corpus, max_chars: usize) -> Option<String> {
        self.generate_with(corpus, max_chars, &mut rand::thread_rng())
    }
}
