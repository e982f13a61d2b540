use chrono::Local;
use tracing::info;

use crate::core::text;
use crate::models::{Corpus, Observation, Tweet};

/// Minimum filtered tokens for a tweet to yield a pair plus a next word.
const MIN_WORDS: usize = 3;

/// Where word-pair observations end up. Implemented for the in-memory
/// `Corpus` map; a store with eviction can implement it later.
pub trait CorpusStorage {
    fn record(&mut self, pair: String, observation: Observation);
}

impl CorpusStorage for Corpus {
    fn record(&mut self, pair: String, observation: Observation) {
        self.entry(pair).or_default().push(observation);
    }
}

/// Current time as `YYYYMMDDhhmm`.
pub fn coarse_timestamp() -> u64 {
    let now = Local::now();
    now.format("%Y%m%d%H%M")
        .to_string()
        .parse()
        .unwrap_or_default()
}

pub struct CorpusBuilder {
    clock: fn() -> u64,
}

impl Default for CorpusBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl CorpusBuilder {
    pub fn new() -> Self {
        Self::with_clock(coarse_timestamp)
    }

    pub fn with_clock(clock: fn() -> u64) -> Self {
        CorpusBuilder { clock }
    }

    /// Learns a batch of tweets and returns the new observations as a delta.
    pub fn process_tweets(&self, tweets: &[Tweet]) -> Corpus {
        let mut delta = Corpus::new();
        self.process_into(tweets, &mut delta);
        delta
    }

    pub fn process_into<S: CorpusStorage>(&self, tweets: &[Tweet], storage: &mut S) {
        info!("Processing {} new tweets", tweets.len());

        for tweet in tweets.iter().filter(|t| !t.is_retweet()) {
            let decoded = html_escape::decode_html_entities(&tweet.text);
            let mut words = text::filter_words(decoded.split(' '));
            if words.len() < MIN_WORDS {
                continue;
            }

            text::normalize(&mut words);
            self.append_words(storage, &words);
        }
    }

    fn append_words<S: CorpusStorage>(&self, storage: &mut S, words: &[String]) {
        for window in words.windows(MIN_WORDS) {
            storage.record(
                format!("{} {}", window[0], window[1]),
                Observation {
                    word: window[2].clone(),
                    time: (self.clock)(),
                },
            );
        }
    }
}

/// Appends every observation of `delta` to `corpus`. Nothing is replaced.
pub fn merge(corpus: &mut Corpus, delta: Corpus) {
    for (pair, observations) in delta {
        corpus.entry(pair).or_default().extend(observations);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn fixed_clock() -> u64 {
        201701011200
    }

    fn builder() -> CorpusBuilder {
        CorpusBuilder::with_clock(fixed_clock)
    }

    fn observation(word: &str) -> Observation {
        Observation {
            word: word.to_string(),
            time: fixed_clock(),
        }
    }

    #[test]
    fn test_process_single_tweet() {
        let tweets = vec![Tweet::new("001", "1", "the quick brown fox")];
        let corpus = builder().process_tweets(&tweets);

        assert_eq!(corpus.len(), 2);
        assert_eq!(corpus["The quick"], vec![observation("brown")]);
        assert_eq!(corpus["quick brown"], vec![observation("fox.")]);
    }

    #[test]
    fn test_entry_count_matches_filtered_tokens() {
        let tweets = vec![Tweet::new(
            "001",
            "1",
            "@friend one two three four five http://link.example six",
        )];
        let corpus = builder().process_tweets(&tweets);
        // six filtered tokens, all pairs distinct
        assert_eq!(corpus.len(), 4);
        assert!(corpus.keys().all(|k| !k.contains('@') && !k.contains("http")));
    }

    #[test]
    fn test_short_tweets_are_skipped() {
        let tweets = vec![
            Tweet::new("001", "1", "two words"),
            Tweet::new("001", "2", "@a @b only two"),
        ];
        assert!(builder().process_tweets(&tweets).is_empty());
    }

    #[test]
    fn test_retweets_are_skipped() {
        let tweets = vec![Tweet::new("001", "1", "a b c").retweeted()];
        assert!(builder().process_tweets(&tweets).is_empty());
    }

    #[test]
    fn test_repeated_pairs_append() {
        let tweets = vec![
            Tweet::new("001", "1", "i like cats"),
            Tweet::new("002", "2", "I LIKE dogs!"),
        ];
        let corpus = builder().process_tweets(&tweets);
        assert_eq!(corpus.len(), 1);
        assert_eq!(
            corpus["I like"],
            vec![observation("cats."), observation("dogs!")]
        );
    }

    #[test]
    fn test_html_entities_are_decoded() {
        let tweets = vec![Tweet::new("001", "1", "salt &amp; pepper &lt;3")];
        let corpus = builder().process_tweets(&tweets);
        assert_eq!(corpus["Salt &"], vec![observation("pepper")]);
        assert_eq!(corpus["& pepper"], vec![observation("<3.")]);
    }

    #[test]
    fn test_sentence_boundaries_inside_tweet() {
        let tweets = vec![Tweet::new("001", "1", "done now. next thing")];
        let corpus = builder().process_tweets(&tweets);
        assert_eq!(corpus["now. Next"], vec![observation("thing.")]);
        assert_eq!(corpus["Done now."], vec![observation("Next")]);
    }

    #[test]
    fn test_merge_appends() {
        let mut corpus = Corpus::new();
        corpus.insert("A b".to_string(), vec![observation("c")]);

        let mut delta = Corpus::new();
        delta.insert("A b".to_string(), vec![observation("d")]);
        delta.insert("B c".to_string(), vec![observation("e")]);

        merge(&mut corpus, delta);
        assert_eq!(corpus["A b"], vec![observation("c"), observation("d")]);
        assert_eq!(corpus["B c"], vec![observation("e")]);
    }

    #[test]
    fn test_coarse_timestamp_shape() {
        let ts = coarse_timestamp();
        assert_eq!(ts.to_string().len(), 12);
    }
}
