//! Glyph alphabets and the random glyph stream
//!
//! Receipt text is not language, just plausible-looking runs of characters.
//! Spaces are drawn often enough that word lengths average out close to
//! natural English.

use rand::Rng;

/// Average English word length; spaces are drawn with probability `1 / (L - 1)`
pub const AVERAGE_WORD_LENGTH: f64 = 5.1;

/// Chance that a non-space glyph is alphanumeric rather than punctuation
pub const ALPHANUMERIC_WEIGHT: f64 = 0.8;

/// Letters and digits, drawn uniformly
pub const ALPHANUMERIC: &[u8] = b"abcdefghijklmnopqrstuvwxyzABCDEFGHIJKLMNOPQRSTUVWXYZ0123456789";

/// Punctuation marks, drawn uniformly
pub const PUNCTUATION: &[u8] = b"!@#$%*&()-+='\",?/.";

/// Every glyph that can be printed on a receipt, space included
pub fn print_glyphs() -> String {
    let mut glyphs = orientation_glyphs();
    glyphs.push(' ');
    glyphs
}

/// Every visible glyph; used where a space has no meaningful orientation
pub fn orientation_glyphs() -> String {
    ('A'..='Z')
        .chain('a'..='z')
        .chain('0'..='9')
        .chain(PUNCTUATION.iter().map(|&b| char::from(b)))
        .collect()
}

/// Infinite, demand-driven stream of random glyphs
///
/// Owns its random source so that a frame's text is reproducible from a seed.
/// Also usable as an `Iterator<Item = char>` that never ends.
#[derive(Debug, Clone)]
pub struct GlyphStream<R> {
    rng: R,
    space_probability: f64,
}

impl<R: Rng> GlyphStream<R> {
    /// Create a stream tuned to [`AVERAGE_WORD_LENGTH`]
    pub fn new(rng: R) -> Self {
        Self::with_average_word_length(rng, AVERAGE_WORD_LENGTH)
    }

    /// Create a stream tuned to a different average word length
    pub fn with_average_word_length(rng: R, average_word_length: f64) -> Self {
        Self {
            rng,
            space_probability: 1.0 / (average_word_length - 1.0),
        }
    }

    /// Probability that [`next_glyph`](Self::next_glyph) yields a space
    pub fn space_probability(&self) -> f64 {
        self.space_probability
    }

    /// Draw one glyph
    pub fn next_glyph(&mut self) -> char {
        if self.rng.gen::<f64>() <= self.space_probability {
            return ' ';
        }

        let pool = if self.rng.gen::<f64>() < ALPHANUMERIC_WEIGHT {
            ALPHANUMERIC
        } else {
            PUNCTUATION
        };
        char::from(pool[self.rng.gen_range(0..pool.len())])
    }

    /// Draw one word, including its trailing space
    ///
    /// Leading spaces are discarded, so a word always starts with a visible glyph.
    pub fn next_word(&mut self) -> String {
        let mut glyph = ' ';
        while glyph == ' ' {
            glyph = self.next_glyph();
        }

        let mut word = String::new();
        word.push(glyph);
        while glyph != ' ' {
            glyph = self.next_glyph();
            word.push(glyph);
        }
        word
    }
}

impl<R: Rng> Iterator for GlyphStream<R> {
    type Item = char;

    fn next(&mut self) -> Option<char> {
        Some(self.next_glyph())
    }
}
