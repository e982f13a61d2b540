use futures::future::try_join_all;
use std::collections::HashSet;
use std::future::Future;
use tokio::time::{interval, Duration, MissedTickBehavior};
use tracing::{debug, error, info, warn};

use crate::{
    core::corpus::{self, CorpusBuilder},
    core::generator::Generator,
    core::tracking,
    error::BotResult,
    memory::DataStore,
    models::{BotState, Corpus, ReplyTarget, Tweet},
    providers::Transport,
};

const MAX_TWEET_CHARS: usize = 280;

/// Owns the bot state and runs update cycles: sync tracked users, learn their
/// new tweets, reply to mentions, post one tweet, save if anything changed.
pub struct Runtime {
    transport: Box<dyn Transport>,
    store: Box<dyn DataStore>,
    generator: Box<dyn Generator>,
    builder: CorpusBuilder,
    state: BotState,
    corpus: Corpus,
    // learned observations not yet written to the store
    corpus_dirty: bool,
    tweet_mode: bool,
}

impl Runtime {
    pub fn new(
        transport: Box<dyn Transport>,
        store: Box<dyn DataStore>,
        generator: Box<dyn Generator>,
        tweet_mode: bool,
    ) -> Self {
        Runtime {
            transport,
            store,
            generator,
            builder: CorpusBuilder::new(),
            state: BotState::default(),
            corpus: Corpus::new(),
            corpus_dirty: false,
            tweet_mode,
        }
    }

    pub fn state(&self) -> &BotState {
        &self.state
    }

    /// Loads the saved state, or starts blank when none exists. A store that
    /// fails to read is fatal.
    pub async fn init_state(&mut self) -> BotResult<()> {
        match self.store.read_state().await? {
            Some(state) => {
                info!(
                    "Loaded saved state: {} tracked users",
                    state.tracked_users.len()
                );
                self.state = state;
            }
            None => {
                info!("No saved state found, starting fresh");
                self.state = BotState::default();
            }
        }
        Ok(())
    }

    pub async fn load_corpus(&mut self) -> BotResult<()> {
        self.corpus = self.store.read_corpus().await?;
        info!("Loaded corpus with {} word pairs", self.corpus.len());
        Ok(())
    }

    /// One full cycle. Every phase failure is logged and absorbed.
    pub async fn run_update(&mut self) {
        debug!("Running update");

        let new_tweets = match self.handle_tweets().await {
            Ok(found) => found,
            Err(e) if e.is_retrieval() => {
                error!("Could not retrieve new tweets: {}", e);
                false
            }
            Err(e) => {
                error!("Failed to handle new tweets: {}", e);
                false
            }
        };

        let new_mentions = self.handle_mentions().await;

        if let Err(e) = self.send_tweet(None).await {
            error!("Failed to post tweet: {}", e);
        }

        if new_tweets || new_mentions || self.corpus_dirty {
            self.persist().await;
        }
    }

    /// Saves the state, then the corpus. The corpus is only written after the
    /// state save succeeds, and stays pending until it is written.
    async fn persist(&mut self) {
        if let Err(e) = self.store.save_state(&self.state).await {
            error!("Failed to save state: {}", e);
            return;
        }
        debug!("State saved");

        if self.corpus_dirty {
            match self.store.save_corpus(&self.corpus).await {
                Ok(()) => self.corpus_dirty = false,
                Err(e) => error!("Failed to save corpus: {}", e),
            }
        }
    }

    /// Syncs tracked users, pulls their new tweets and learns them. Returns
    /// whether any tweet survived the merge.
    async fn handle_tweets(&mut self) -> BotResult<bool> {
        self.update_tracked().await?;

        let retrievals = self.retrieve_tracked().await?;
        let tweets = tracking::process_retrievals(&mut self.state, retrievals);
        if tweets.is_empty() {
            debug!("No new tweets found");
            return Ok(false);
        }

        info!("Found {} new tweets", tweets.len());
        let delta = self.builder.process_tweets(&tweets);
        if !delta.is_empty() {
            corpus::merge(&mut self.corpus, delta);
            self.corpus_dirty = true;
        }

        Ok(true)
    }

    async fn update_tracked(&mut self) -> BotResult<()> {
        let following = self.transport.get_following().await?;
        let live: HashSet<String> = following.ids.into_iter().collect();
        tracking::reconcile(&mut self.state, &live);
        Ok(())
    }

    async fn retrieve_tracked(&self) -> BotResult<Vec<Vec<Tweet>>> {
        let requests = self
            .state
            .tracked_users
            .iter()
            .map(|(user_id, since_id)| {
                self.transport
                    .retrieve_tweets(user_id, since_id.as_deref())
            });

        try_join_all(requests).await
    }

    /// Replies to every mention newer than `last_mention` and advances it to
    /// the newest one. A failed retrieval counts as no new mentions.
    async fn handle_mentions(&mut self) -> bool {
        let mentions = match self
            .transport
            .retrieve_mentions(self.state.last_mention.as_deref())
            .await
        {
            Ok(mentions) => mentions,
            Err(e) => {
                error!("Failed to retrieve mentions: {}", e);
                return false;
            }
        };

        let newest = match mentions.first() {
            Some(mention) => mention.id_str.clone(),
            None => {
                debug!("No new mentions");
                return false;
            }
        };

        info!("Found {} new mentions", mentions.len());
        for mention in &mentions {
            let target = ReplyTarget::from(mention);
            if let Err(e) = self.send_tweet(Some(&target)).await {
                error!("Failed to reply to @{}: {}", target.screen_name, e);
            }
        }

        self.state.last_mention = Some(newest);
        true
    }

    /// Generates and posts one tweet, or a reply when `reply_to` is set.
    async fn send_tweet(&self, reply_to: Option<&ReplyTarget>) -> BotResult<bool> {
        // replies are prefixed with "@handle "
        let max_chars = match reply_to {
            Some(target) => {
                MAX_TWEET_CHARS.saturating_sub(target.screen_name.chars().count() + 2)
            }
            None => MAX_TWEET_CHARS,
        };

        let text = match self.generator.generate(&self.corpus, max_chars) {
            Some(text) => text,
            None => {
                warn!("Not enough data to generate a tweet");
                return Ok(false);
            }
        };

        if !self.tweet_mode {
            info!("Tweet mode disabled, generated: {}", text);
            return Ok(false);
        }

        let sent = self.transport.send_tweet(&text, reply_to).await?;
        if !sent {
            warn!("Tweet was not accepted: {}", text);
        }
        Ok(sent)
    }

    /// Loads persisted data, then runs a cycle now and every `period` until
    /// Ctrl+C. Cycles never overlap since each one holds `&mut self`.
    pub async fn run_periodically(&mut self, period: Duration) -> BotResult<()> {
        self.run_until(period, tokio::signal::ctrl_c()).await
    }

    /// Like `run_periodically`, stopping once `shutdown` completes. A signal
    /// that lands mid-cycle lets that cycle finish, then stops.
    pub async fn run_until<F>(&mut self, period: Duration, shutdown: F) -> BotResult<()>
    where
        F: Future,
    {
        self.init_state().await?;
        self.load_corpus().await?;

        info!("=== Starting bot ===");
        info!("Tracked users: {}", self.state().tracked_users.len());
        info!("Tweet mode enabled: {}", self.tweet_mode);
        info!("Update interval: {}s", period.as_secs());

        let mut ticker = interval(period);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);

        // Created once so a signal arriving during a cycle is not lost.
        tokio::pin!(shutdown);

        loop {
            tokio::select! {
                biased;
                _ = &mut shutdown => {
                    info!("Received shutdown signal, stopping");
                    return Ok(());
                }
                _ = ticker.tick() => self.run_update().await,
            }
        }
    }
}
