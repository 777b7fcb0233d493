//! Typing test against a countdown.
//!
//! The passage is `word_count` words picked from [`WORDS`] at start, one
//! draw per word. Typed characters are compared position by position;
//! a wrong character stays wrong until it is backspaced over.

use std::time::Duration;

use playfield_random::{Checkpoint, Fingerprint, RandomError};
use serde::{Deserialize, Serialize};

use crate::lifecycle::Lifecycle;
use crate::{AchievementId, GameError, GameEvent, GameKind, GameSession, GameStats, GameStatus};

/// The word list passages are drawn from. Changing it changes every
/// passage for every seed.
pub const WORDS: &[&str] = &[
    "the", "of", "and", "to", "in", "is", "you", "that", "it", "he", "was", "for", "on", "are",
    "as", "with", "his", "they", "at", "be", "this", "have", "from", "or", "one", "had", "by",
    "word", "but", "not", "what", "all", "were", "we", "when", "your", "can", "said", "there",
    "use", "an", "each", "which", "she", "do", "how", "their", "if", "will", "up", "other",
    "about", "out", "many", "then", "them", "these", "so", "some", "her", "would", "make",
    "like", "him", "into", "time", "has", "look", "two", "more", "write", "go", "see", "number",
    "no", "way", "could", "people", "my", "than", "first", "water", "been", "call", "who",
    "oil", "its", "now", "find", "long", "down", "day", "did", "get", "come", "made", "may",
    "part",
];

const _: () = assert!(!WORDS.is_empty(), "the passage word list must not be empty");

/// Characters per word when computing words per minute.
const CHARS_PER_WORD: f64 = 5.0;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct TypingConfig {
    pub word_count: usize,
    pub duration_secs: u64,
}

impl Default for TypingConfig {
    fn default() -> Self {
        Self {
            word_count: 25,
            duration_secs: 60,
        }
    }
}

impl TypingConfig {
    pub fn duration(&self) -> Duration {
        Duration::from_secs(self.duration_secs)
    }

    fn validate(&self) -> Result<(), GameError> {
        if self.word_count == 0 || self.duration_secs == 0 {
            return Err(GameError::InvalidConfig(
                "typing test needs at least one word and one second".into(),
            ));
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TypingInput {
    Char(char),
    Backspace,
}

/// A typing session.
#[derive(Debug, Clone)]
pub struct Typing {
    config: TypingConfig,
    life: Lifecycle,
    words: Vec<&'static str>,
    passage: Vec<char>,
    typed: Vec<char>,
    keystrokes: u32,
    errors: u32,
}

impl Typing {
    pub fn new(config: TypingConfig, seed: i64) -> Result<Self, GameError> {
        config.validate()?;
        Ok(Self {
            life: Lifecycle::new(GameKind::Typing, seed),
            words: Vec::new(),
            passage: Vec::new(),
            typed: Vec::new(),
            keystrokes: 0,
            errors: 0,
            config,
        })
    }

    /// The words of the passage, in order.
    pub fn words(&self) -> &[&'static str] {
        &self.words
    }

    pub fn passage(&self) -> String {
        self.passage.iter().collect()
    }

    pub fn typed(&self) -> String {
        self.typed.iter().collect()
    }

    pub fn remaining(&self) -> Duration {
        self.config.duration().saturating_sub(self.life.elapsed())
    }

    fn correct_chars(&self) -> u32 {
        self.typed
            .iter()
            .zip(&self.passage)
            .filter(|(typed, expected)| typed == expected)
            .count() as u32
    }

    pub fn wpm(&self) -> f64 {
        let minutes = self.life.elapsed().as_secs_f64() / 60.0;
        if minutes == 0.0 {
            return 0.0;
        }
        f64::from(self.correct_chars()) / CHARS_PER_WORD / minutes
    }

    /// Fraction of keystrokes that were right when typed.
    pub fn accuracy(&self) -> f64 {
        if self.keystrokes == 0 {
            return 0.0;
        }
        f64::from(self.keystrokes - self.errors) / f64::from(self.keystrokes)
    }

    fn type_char(&mut self, c: char) -> bool {
        let position = self.typed.len();
        let Some(&expected) = self.passage.get(position) else {
            return false;
        };
        self.typed.push(c);
        self.keystrokes += 1;
        if c != expected {
            self.errors += 1;
        }
        if self.typed == self.passage {
            if self.errors == 0 {
                self.life.achieve(AchievementId::TypingPerfect);
            }
            self.end(GameStatus::Won);
        }
        true
    }

    fn end(&mut self, outcome: GameStatus) {
        if self.life.finish(outcome) {
            let stats = self.stats();
            let score = self.score();
            self.life.report(stats, score, score > 0);
        }
    }
}

/// Draws `count` words from [`WORDS`], one draw each. Only fails if the
/// list is empty, which the assertion next to it rules out.
fn draw_passage(life: &mut Lifecycle, count: usize) -> Result<Vec<&'static str>, RandomError> {
    (0..count)
        .map(|_| -> Result<&'static str, RandomError> {
            let index = life.rng.next_index(WORDS.len())?;
            life.artifacts.record(&[index as u64]);
            Ok(WORDS[index])
        })
        .collect()
}

impl GameSession for Typing {
    type Input = TypingInput;

    fn kind(&self) -> GameKind {
        GameKind::Typing
    }

    fn status(&self) -> GameStatus {
        self.life.status()
    }

    fn start(&mut self) -> bool {
        if self.life.status() != GameStatus::Idle {
            return false;
        }
        // Drawn before the transition so a failed draw leaves the session
        // idle instead of playing a short passage.
        self.words = match draw_passage(&mut self.life, self.config.word_count) {
            Ok(words) => words,
            Err(e) => {
                tracing::error!(error = %e, "passage draw failed");
                return false;
            }
        };
        self.passage = self.words.join(" ").chars().collect();
        self.life.start();
        tracing::debug!(
            words = self.words.len(),
            chars = self.passage.len(),
            "passage chosen"
        );
        true
    }

    fn pause(&mut self) -> bool {
        self.life.pause()
    }

    fn resume(&mut self) -> bool {
        self.life.resume()
    }

    fn apply(&mut self, input: TypingInput) -> bool {
        if !self.life.is_playing() {
            return false;
        }
        match input {
            TypingInput::Char(c) => self.type_char(c),
            TypingInput::Backspace => self.typed.pop().is_some(),
        }
    }

    fn tick(&mut self, dt: Duration) -> bool {
        if !self.life.advance(dt) {
            return false;
        }
        let limit = self.config.duration();
        if self.life.elapsed() < limit {
            return false;
        }
        self.life.clamp_elapsed(limit);
        self.end(GameStatus::Lost);
        true
    }

    /// Characters currently typed correctly.
    fn score(&self) -> u64 {
        u64::from(self.correct_chars())
    }

    fn elapsed(&self) -> Duration {
        self.life.elapsed()
    }

    fn rng_checkpoint(&self) -> Checkpoint {
        self.life.rng.checkpoint()
    }

    fn fingerprint(&self) -> Fingerprint {
        self.life.artifacts
    }

    fn stats(&self) -> GameStats {
        GameStats::Typing {
            wpm: self.wpm(),
            accuracy: self.accuracy(),
            correct_chars: self.correct_chars(),
            errors: self.errors,
            elapsed_ms: self.elapsed().as_millis() as u64,
        }
    }

    fn drain_events(&mut self) -> Vec<GameEvent> {
        self.life.drain_events()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn started(word_count: usize, seed: i64) -> Typing {
        let config = TypingConfig {
            word_count,
            ..TypingConfig::default()
        };
        let mut game = Typing::new(config, seed).unwrap();
        game.start();
        game
    }

    fn type_str(game: &mut Typing, text: &str) {
        for c in text.chars() {
            game.apply(TypingInput::Char(c));
        }
    }

    #[test]
    fn test_passage_uses_one_draw_per_word() {
        let game = started(25, 12);
        assert_eq!(game.words().len(), 25);
        assert_eq!(game.rng_checkpoint().draws, 25);
        assert!(game.words().iter().all(|w| WORDS.contains(w)));
        assert_eq!(game.passage(), game.words().join(" "));
    }

    #[test]
    fn test_passage_is_never_short() {
        for seed in [1, 12, 99, 4_242] {
            let game = started(40, seed);
            assert_eq!(game.words().len(), 40);
            assert_eq!(game.fingerprint().count, 40);
        }
    }

    #[test]
    fn test_start_after_pause_keeps_passage() {
        let mut game = started(5, 31);
        let passage = game.passage();
        assert!(game.pause());
        assert!(!game.start());
        assert_eq!(game.passage(), passage);
        assert_eq!(game.rng_checkpoint().draws, 5);
        assert!(game.resume());
    }

    #[test]
    fn test_same_seed_same_passage() {
        assert_eq!(started(10, 99).passage(), started(10, 99).passage());
    }

    #[test]
    fn test_perfect_run_wins() {
        let mut game = started(3, 4);
        game.tick(Duration::from_secs(6));
        let passage = game.passage();
        type_str(&mut game, &passage);

        assert_eq!(game.status(), GameStatus::Won);
        assert_eq!(game.accuracy(), 1.0);
        assert_eq!(game.score(), passage.chars().count() as u64);
        let events = game.drain_events();
        assert!(events.contains(&GameEvent::Achievement {
            id: AchievementId::TypingPerfect
        }));
        assert!(events.contains(&GameEvent::Achievement {
            id: AchievementId::FirstWin
        }));
    }

    #[test]
    fn test_mistake_must_be_corrected() {
        let mut game = started(1, 4);
        let passage = game.passage();
        let mut chars: Vec<char> = passage.chars().collect();
        let last = chars.pop().unwrap();

        type_str(&mut game, &chars.iter().collect::<String>());
        assert!(game.apply(TypingInput::Char(if last == 'x' { 'y' } else { 'x' })));
        assert_eq!(game.status(), GameStatus::Playing);
        // Nothing past the end of the passage.
        assert!(!game.apply(TypingInput::Char(last)));

        assert!(game.apply(TypingInput::Backspace));
        assert!(game.apply(TypingInput::Char(last)));
        assert_eq!(game.status(), GameStatus::Won);
        assert!(game.accuracy() < 1.0);
        assert!(!game.drain_events().contains(&GameEvent::Achievement {
            id: AchievementId::TypingPerfect
        }));
    }

    #[test]
    fn test_backspace_on_empty_is_ignored() {
        let mut game = started(2, 4);
        assert!(!game.apply(TypingInput::Backspace));
    }

    #[test]
    fn test_countdown_expiry_loses() {
        let mut game = started(5, 4);
        let first = game.passage().chars().next().unwrap();
        game.apply(TypingInput::Char(first));

        assert!(!game.tick(Duration::from_secs(59)));
        assert_eq!(game.remaining(), Duration::from_secs(1));
        assert!(game.tick(Duration::from_secs(5)));
        assert_eq!(game.status(), GameStatus::Lost);
        assert_eq!(game.elapsed(), Duration::from_secs(60));
        assert!((game.wpm() - 0.2).abs() < 1e-9);
    }
}
