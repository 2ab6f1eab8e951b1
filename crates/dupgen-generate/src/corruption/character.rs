use dupgen_config::{CharRange, TypoProbabilities};
use rand::Rng;
use rand::seq::IndexedRandom;
use rand_distr::{Distribution, Normal};

const LETTERS: &str = "abcdefghijklmnopqrstuvwxyz";
const DIGITS: &str = "0123456789";
const ALPHANUMERIC: &str = "abcdefghijklmnopqrstuvwxyz0123456789";

/// Redraws allowed when looking for a position that is not next to a space.
const MAX_SPACE_POSITION_ATTEMPTS: usize = 10;

/// Keys left and right of `key` on a QWERTY keyboard.
fn row_neighbors(key: char) -> Option<&'static str> {
    let neighbors = match key {
        'a' => "s",
        'b' => "vn",
        'c' => "xv",
        'd' => "sf",
        'e' => "wr",
        'f' => "dg",
        'g' => "fh",
        'h' => "gj",
        'i' => "uo",
        'j' => "hk",
        'k' => "jl",
        'l' => "k",
        'm' => "n",
        'n' => "bm",
        'o' => "ip",
        'p' => "o",
        'q' => "w",
        'r' => "et",
        's' => "ad",
        't' => "ry",
        'u' => "yi",
        'v' => "cb",
        'w' => "qe",
        'x' => "zc",
        'y' => "tu",
        'z' => "x",
        '1' => "2",
        '2' => "13",
        '3' => "24",
        '4' => "35",
        '5' => "46",
        '6' => "57",
        '7' => "68",
        '8' => "79",
        '9' => "80",
        '0' => "9",
        _ => return None,
    };
    Some(neighbors)
}

/// Keys above and below `key` on a QWERTY keyboard.
fn column_neighbors(key: char) -> Option<&'static str> {
    let neighbors = match key {
        'a' => "qzw",
        'b' => "gh",
        'c' => "df",
        'd' => "erc",
        'e' => "d",
        'f' => "rvc",
        'g' => "tbv",
        'h' => "ybn",
        'i' => "k",
        'j' => "umn",
        'k' => "im",
        'l' => "o",
        'm' => "jk",
        'n' => "hj",
        'o' => "l",
        'p' => "l",
        'q' => "a",
        'r' => "f",
        's' => "wxz",
        't' => "gf",
        'u' => "j",
        'v' => "fg",
        'w' => "s",
        'x' => "sd",
        'y' => "h",
        'z' => "as",
        _ => return None,
    };
    Some(neighbors)
}

fn alphabet(range: CharRange) -> &'static str {
    match range {
        CharRange::Alpha => LETTERS,
        CharRange::Digit => DIGITS,
        CharRange::Alphanumeric => ALPHANUMERIC,
    }
}

fn pick<R: Rng + ?Sized>(choices: &str, rng: &mut R) -> Option<char> {
    let chars: Vec<char> = choices.chars().collect();
    chars.choose(rng).copied()
}

/// Uniform character of `range` other than `input`.
fn other_character<R: Rng + ?Sized>(input: char, range: CharRange, rng: &mut R) -> char {
    let choices: Vec<char> = alphabet(range).chars().filter(|ch| *ch != input).collect();
    choices.choose(rng).copied().unwrap_or(input)
}

/// Position for an error in a string of `len` characters.
///
/// Errors rarely hit the first characters, so the position is drawn from a
/// normal distribution centred one place behind the middle of the string.
/// The result lies in `[0, len - 1 + offset]`; `None` for an empty string.
pub fn error_position<R: Rng + ?Sized>(len: usize, offset: i64, rng: &mut R) -> Option<usize> {
    if len == 0 {
        return None;
    }
    let max = len as i64 - 1 + offset;
    if max < 0 {
        return None;
    }
    let mean = (len as i64 + offset) as f64 / 2.0 + 1.0;
    let normal = Normal::new(mean, 1.0).ok()?;
    let drawn = normal.sample(rng).round_ties_even() as i64;
    Some(drawn.clamp(0, max) as usize)
}

/// Keyboard-based model of single character typos.
#[derive(Debug, Clone, Copy)]
pub struct CharacterErrorModel {
    typo: TypoProbabilities,
}

impl CharacterErrorModel {
    pub fn new(typo: TypoProbabilities) -> Self {
        Self { typo }
    }

    /// Replacement for `input`: a row neighbor with probability `same_row`,
    /// a column neighbor with probability `same_col`, otherwise a uniformly
    /// chosen different character of the range.
    ///
    /// Digits only have row neighbors.
    pub fn error_character<R: Rng + ?Sized>(
        &self,
        input: char,
        range: CharRange,
        rng: &mut R,
    ) -> char {
        let draw: f64 = rng.random();
        let key = input.to_ascii_lowercase();
        let same_row = draw <= self.typo.same_row;
        let same_col = !same_row && draw <= self.typo.same_row + self.typo.same_col;

        let neighbors = match range {
            CharRange::Digit if input.is_ascii_digit() && same_row => row_neighbors(key),
            CharRange::Digit => None,
            CharRange::Alpha if !input.is_alphabetic() => None,
            CharRange::Alpha | CharRange::Alphanumeric if same_row => row_neighbors(key),
            CharRange::Alpha | CharRange::Alphanumeric if same_col => column_neighbors(key),
            CharRange::Alpha | CharRange::Alphanumeric => None,
        };

        neighbors
            .and_then(|choices| pick(choices, rng))
            .unwrap_or_else(|| other_character(input, range, rng))
    }

    /// Replace one character with a keyboard typo.
    pub fn substitute<R: Rng + ?Sized>(
        &self,
        value: &str,
        range: CharRange,
        rng: &mut R,
    ) -> Option<String> {
        let mut chars: Vec<char> = value.chars().collect();
        let pos = error_position(chars.len(), 0, rng)?;
        chars[pos] = self.error_character(chars[pos], range, rng);
        Some(chars.into_iter().collect())
    }

    /// Insert a random character of the range.
    pub fn insert<R: Rng + ?Sized>(
        &self,
        value: &str,
        range: CharRange,
        rng: &mut R,
    ) -> Option<String> {
        let mut chars: Vec<char> = value.chars().collect();
        let pos = error_position(chars.len(), 1, rng)?;
        let ch = pick(alphabet(range), rng)?;
        chars.insert(pos, ch);
        Some(chars.into_iter().collect())
    }

    /// Delete one character; values need at least two characters.
    pub fn delete<R: Rng + ?Sized>(&self, value: &str, rng: &mut R) -> Option<String> {
        let mut chars: Vec<char> = value.chars().collect();
        if chars.len() < 2 {
            return None;
        }
        let pos = error_position(chars.len(), 0, rng)?;
        chars.remove(pos);
        Some(chars.into_iter().collect())
    }

    /// Exchange two neighboring characters.
    pub fn transpose<R: Rng + ?Sized>(&self, value: &str, rng: &mut R) -> Option<String> {
        let mut chars: Vec<char> = value.chars().collect();
        if chars.len() < 2 {
            return None;
        }
        let pos = error_position(chars.len(), -1, rng)?;
        chars.swap(pos, pos + 1);
        Some(chars.into_iter().collect())
    }

    /// Insert a space between two non-space characters of the trimmed value.
    pub fn insert_space<R: Rng + ?Sized>(&self, value: &str, rng: &mut R) -> Option<String> {
        let mut chars: Vec<char> = value.trim().chars().collect();
        if chars.len() < 2 {
            return None;
        }
        for _ in 0..MAX_SPACE_POSITION_ATTEMPTS {
            let Some(pos) = error_position(chars.len(), 0, rng) else {
                break;
            };
            if pos == 0 || chars[pos - 1] == ' ' || chars[pos] == ' ' {
                continue;
            }
            chars.insert(pos, ' ');
            return Some(chars.into_iter().collect());
        }
        None
    }

    /// Remove one uniformly chosen space.
    pub fn delete_space<R: Rng + ?Sized>(&self, value: &str, rng: &mut R) -> Option<String> {
        let mut chars: Vec<char> = value.chars().collect();
        let spaces: Vec<usize> = chars
            .iter()
            .enumerate()
            .filter(|(_, ch)| **ch == ' ')
            .map(|(idx, _)| idx)
            .collect();
        let pos = *spaces.choose(rng)?;
        chars.remove(pos);
        Some(chars.into_iter().collect())
    }

    /// Exchange two neighboring words; with two words the pair is fixed.
    pub fn swap_words<R: Rng + ?Sized>(&self, value: &str, rng: &mut R) -> Option<String> {
        let mut words: Vec<&str> = value.split(' ').collect();
        if words.len() < 2 {
            return None;
        }
        let idx = if words.len() == 2 {
            0
        } else {
            rng.random_range(0..words.len() - 1)
        };
        words.swap(idx, idx + 1);
        Some(words.join(" "))
    }

    /// Replace one character with a space, as an unreadable OCR glyph.
    pub fn blank_character<R: Rng + ?Sized>(&self, value: &str, rng: &mut R) -> Option<String> {
        let mut chars: Vec<char> = value.chars().collect();
        if chars.len() < 2 {
            return None;
        }
        let pos = error_position(chars.len(), 0, rng)?;
        chars[pos] = ' ';
        Some(chars.into_iter().collect())
    }
}

#[cfg(test)]
mod tests {
    use rand::SeedableRng;
    use rand_chacha::ChaCha8Rng;

    use super::*;

    #[test]
    fn neighbor_tables_cover_every_letter() {
        for ch in LETTERS.chars() {
            assert!(row_neighbors(ch).is_some(), "row {ch}");
            assert!(column_neighbors(ch).is_some(), "column {ch}");
        }
        for ch in DIGITS.chars() {
            assert!(row_neighbors(ch).is_some(), "row {ch}");
        }
    }

    #[test]
    fn uniform_fallback_never_returns_the_input() {
        let mut rng = ChaCha8Rng::seed_from_u64(3);
        for _ in 0..200 {
            assert_ne!(other_character('a', CharRange::Alpha, &mut rng), 'a');
            assert_ne!(other_character('7', CharRange::Digit, &mut rng), '7');
        }
    }
}
