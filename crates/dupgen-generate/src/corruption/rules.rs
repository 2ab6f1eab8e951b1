use std::fmt;
use std::path::Path;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::errors::ResourceLoadError;
use crate::resources::SourceLine;

const VOWELS: &str = "aeiouy";
/// Replacement text standing for the empty string.
const EMPTY_REPLACEMENT: &str = "@";

/// Where a rule's match pattern must occur.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RuleScope {
    Start,
    Middle,
    End,
    All,
}

impl RuleScope {
    pub fn as_str(&self) -> &'static str {
        match self {
            RuleScope::Start => "start",
            RuleScope::Middle => "middle",
            RuleScope::End => "end",
            RuleScope::All => "all",
        }
    }

    fn admits(&self, start: usize, pattern_len: usize, value_len: usize) -> bool {
        match self {
            RuleScope::Start => start == 0,
            RuleScope::Middle => start > 0 && start + pattern_len < value_len,
            RuleScope::End => start + pattern_len == value_len,
            RuleScope::All => true,
        }
    }
}

impl FromStr for RuleScope {
    type Err = String;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_lowercase().as_str() {
            "start" => Ok(RuleScope::Start),
            "middle" => Ok(RuleScope::Middle),
            "end" => Ok(RuleScope::End),
            "all" => Ok(RuleScope::All),
            other => Err(format!("unknown rule scope '{other}'")),
        }
    }
}

impl fmt::Display for RuleScope {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// `flag;offset;pattern[;pattern...]`: does any pattern occur at the offset?
#[derive(Debug, Clone, PartialEq, Eq)]
struct OffsetTest {
    negated: bool,
    offset: i64,
    patterns: Vec<Vec<char>>,
}

impl OffsetTest {
    fn parse(text: &str) -> Result<Self, String> {
        let parts: Vec<&str> = text.split(';').collect();
        if parts.len() < 3 {
            return Err(format!("condition '{text}' needs a flag, an offset and a pattern"));
        }
        let offset = parts[1]
            .trim()
            .parse()
            .map_err(|_| format!("invalid offset '{}' in condition '{text}'", parts[1]))?;
        Ok(Self {
            negated: parts[0].trim() == "n",
            offset,
            patterns: parts[2..].iter().map(|p| p.chars().collect()).collect(),
        })
    }

    /// Negative offsets count back from the match start, others forward
    /// from the last matched character.
    fn holds(&self, chars: &[char], start: usize, pattern_len: usize) -> bool {
        let anchor = if self.offset < 0 {
            start as i64 + self.offset
        } else {
            (start + pattern_len) as i64 - 1 + self.offset
        };
        let found = anchor >= 0
            && self
                .patterns
                .iter()
                .any(|pattern| occurs_at(chars, pattern, anchor as usize));
        found != self.negated
    }
}

/// Pre- or post-condition on the characters around a match.
#[derive(Debug, Clone, PartialEq, Eq)]
enum ContextCondition {
    Vowel,
    Consonant,
    /// Every test must hold.
    Offsets(Vec<OffsetTest>),
}

impl ContextCondition {
    fn parse(text: &str) -> Result<Option<Self>, String> {
        match text {
            "None" => Ok(None),
            "V" => Ok(Some(ContextCondition::Vowel)),
            "C" => Ok(Some(ContextCondition::Consonant)),
            _ if text.contains(';') => {
                let tests = text
                    .split('|')
                    .map(OffsetTest::parse)
                    .collect::<Result<Vec<_>, _>>()?;
                Ok(Some(ContextCondition::Offsets(tests)))
            }
            _ => Err(format!("unknown condition '{text}'")),
        }
    }

    /// `neighbor` is the character the V/C forms look at.
    fn holds(&self, chars: &[char], start: usize, pattern_len: usize, neighbor: usize) -> bool {
        match self {
            ContextCondition::Vowel => is_vowel(chars[neighbor]),
            ContextCondition::Consonant => !is_vowel(chars[neighbor]),
            ContextCondition::Offsets(tests) => {
                tests.iter().all(|test| test.holds(chars, start, pattern_len))
            }
        }
    }
}

/// Whole-value condition.
#[derive(Debug, Clone, PartialEq, Eq)]
enum ValueCondition {
    /// The value looks Slavic or Germanic (contains w, k, cz or witz).
    SlavoGermanic { negated: bool },
    /// The value contains one of the patterns.
    Contains { negated: bool, patterns: Vec<String> },
    /// The value starts with one of the patterns; negated: contains none.
    StartsWith { negated: bool, patterns: Vec<String> },
}

impl ValueCondition {
    fn parse_exist(text: &str) -> Result<Option<Self>, String> {
        if text == "None" {
            return Ok(None);
        }
        let (negated, patterns) = flag_and_patterns(text)?;
        if patterns.len() == 1 && patterns[0] == "slavo" {
            return Ok(Some(ValueCondition::SlavoGermanic { negated }));
        }
        Ok(Some(ValueCondition::Contains { negated, patterns }))
    }

    fn parse_start(text: &str) -> Result<Option<Self>, String> {
        if text == "None" {
            return Ok(None);
        }
        let (negated, patterns) = flag_and_patterns(text)?;
        Ok(Some(ValueCondition::StartsWith { negated, patterns }))
    }

    fn holds(&self, value: &str) -> bool {
        match self {
            ValueCondition::SlavoGermanic { negated } => {
                let slavic = ["w", "k", "cz", "witz"]
                    .iter()
                    .any(|pattern| value.contains(pattern));
                slavic != *negated
            }
            ValueCondition::Contains { negated, patterns } => {
                patterns.iter().any(|pattern| value.contains(pattern.as_str())) != *negated
            }
            ValueCondition::StartsWith { negated, patterns } => {
                if *negated {
                    !patterns.iter().any(|pattern| value.contains(pattern.as_str()))
                } else {
                    patterns.iter().any(|pattern| value.starts_with(pattern.as_str()))
                }
            }
        }
    }
}

fn flag_and_patterns(text: &str) -> Result<(bool, Vec<String>), String> {
    let parts: Vec<&str> = text.split(';').collect();
    if parts.len() < 2 {
        return Err(format!("condition '{text}' needs a flag and a pattern"));
    }
    Ok((
        parts[0].trim() == "n",
        parts[1..].iter().map(|part| part.to_string()).collect(),
    ))
}

fn is_vowel(ch: char) -> bool {
    VOWELS.contains(ch.to_ascii_lowercase())
}

fn occurs_at(chars: &[char], pattern: &[char], at: usize) -> bool {
    !pattern.is_empty() && chars.get(at..at + pattern.len()) == Some(pattern)
}

fn find_from(chars: &[char], pattern: &[char], from: usize) -> Option<usize> {
    if pattern.is_empty() || pattern.len() > chars.len() {
        return None;
    }
    (from..=chars.len() - pattern.len()).find(|idx| occurs_at(chars, pattern, *idx))
}

/// One line of a rule table:
/// `scope, match, replacement[, pre, post, exist, start]`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Rule {
    pub scope: RuleScope,
    pub pattern: String,
    pub replacement: String,
    pre: Option<ContextCondition>,
    post: Option<ContextCondition>,
    exist: Option<ValueCondition>,
    start: Option<ValueCondition>,
}

impl FromStr for Rule {
    type Err = String;

    fn from_str(line: &str) -> Result<Self, Self::Err> {
        let tokens: Vec<&str> = line
            .split(',')
            .map(str::trim)
            .filter(|token| !token.is_empty())
            .collect();
        let conditions = match tokens.len() {
            3 => ["None"; 4],
            7 => [tokens[3], tokens[4], tokens[5], tokens[6]],
            count => {
                return Err(format!(
                    "expected 3 or 7 comma separated values, got {count}"
                ));
            }
        };
        Ok(Rule {
            scope: tokens[0].parse()?,
            pattern: tokens[1].to_string(),
            replacement: tokens[2].to_string(),
            pre: ContextCondition::parse(conditions[0])?,
            post: ContextCondition::parse(conditions[1])?,
            exist: ValueCondition::parse_exist(conditions[2])?,
            start: ValueCondition::parse_start(conditions[3])?,
        })
    }
}

impl Rule {
    /// First occurrence of the pattern in `value` that satisfies the scope
    /// and every condition.
    fn first_match(&self, value: &str, chars: &[char]) -> Option<usize> {
        if self.exist.as_ref().is_some_and(|cond| !cond.holds(value))
            || self.start.as_ref().is_some_and(|cond| !cond.holds(value))
        {
            return None;
        }

        let pattern: Vec<char> = self.pattern.chars().collect();
        let len = pattern.len();
        let mut from = 0;
        while let Some(start) = find_from(chars, &pattern, from) {
            from = start + 1;
            if !self.scope.admits(start, len, chars.len()) {
                continue;
            }
            let pre_ok = match &self.pre {
                None => true,
                Some(_) if start == 0 => false,
                Some(cond) => cond.holds(chars, start, len, start - 1),
            };
            let post_ok = match &self.post {
                None => true,
                Some(_) if start + len >= chars.len() => false,
                Some(cond) => cond.holds(chars, start, len, start + len),
            };
            if pre_ok && post_ok {
                return Some(start);
            }
        }
        None
    }
}

/// Candidate replacement produced by a rule, rendered `pattern>replacement>scope`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct RuleChange {
    pub pattern: String,
    /// `@` stands for the empty string.
    pub replacement: String,
    pub scope: RuleScope,
}

impl RuleChange {
    fn replacement_text(&self) -> &str {
        if self.replacement == EMPTY_REPLACEMENT {
            ""
        } else {
            &self.replacement
        }
    }

    /// Apply the change to the first occurrence of the pattern, searched
    /// from index 0 (start, all), 1 (middle) or `len - pattern_len` (end).
    ///
    /// The value is returned unchanged when the pattern is not found.
    pub fn apply(&self, value: &str) -> String {
        let chars: Vec<char> = value.chars().collect();
        let pattern: Vec<char> = self.pattern.chars().collect();
        let from = match self.scope {
            RuleScope::End => chars.len().saturating_sub(pattern.len()),
            RuleScope::Middle => 1,
            RuleScope::Start | RuleScope::All => 0,
        };
        let Some(start) = find_from(&chars, &pattern, from) else {
            return value.to_string();
        };
        let mut changed: String = chars[..start].iter().collect();
        changed.push_str(self.replacement_text());
        changed.extend(&chars[start + pattern.len()..]);
        changed
    }
}

impl fmt::Display for RuleChange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}>{}>{}", self.pattern, self.replacement, self.scope)
    }
}

impl FromStr for RuleChange {
    type Err = String;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        let parts: Vec<&str> = value.split('>').collect();
        let [pattern, replacement, scope] = parts.as_slice() else {
            return Err(format!("expected 'pattern>replacement>scope', got '{value}'"));
        };
        if pattern.is_empty() {
            return Err(format!("empty pattern in change '{value}'"));
        }
        Ok(RuleChange {
            pattern: pattern.to_string(),
            replacement: replacement.to_string(),
            scope: scope.parse()?,
        })
    }
}

/// Ordered table of phonetic or OCR rewrite rules.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RuleInterpreter {
    rules: Vec<Rule>,
}

impl RuleInterpreter {
    pub fn new(rules: Vec<Rule>) -> Self {
        Self { rules }
    }

    /// Parse the lines of a rule file.
    pub fn parse(path: &Path, lines: &[SourceLine]) -> Result<Self, ResourceLoadError> {
        let rules = lines
            .iter()
            .map(|line| {
                line.text
                    .parse::<Rule>()
                    .map_err(|message| ResourceLoadError::Malformed {
                        path: path.to_path_buf(),
                        line: line.number,
                        message,
                    })
            })
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Self { rules })
    }

    pub fn rules(&self) -> &[Rule] {
        &self.rules
    }

    pub fn len(&self) -> usize {
        self.rules.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }

    /// Candidate changes for `value`, one per applicable rule in table
    /// order, without repeats.
    pub fn transform(&self, value: &str) -> Vec<RuleChange> {
        let chars: Vec<char> = value.chars().collect();
        let mut changes: Vec<RuleChange> = Vec::new();
        if chars.is_empty() {
            return changes;
        }
        for rule in &self.rules {
            if rule.first_match(value, &chars).is_none() {
                continue;
            }
            let change = RuleChange {
                pattern: rule.pattern.clone(),
                replacement: rule.replacement.clone(),
                scope: rule.scope,
            };
            if !changes.contains(&change) {
                changes.push(change);
            }
        }
        changes
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn offset_tests_look_around_the_match() {
        let chars: Vec<char> = "schmidt".chars().collect();
        let after = OffsetTest::parse("y;1;m").expect("parse");
        assert!(after.holds(&chars, 1, 2));
        let before = OffsetTest::parse("n;-1;s").expect("parse");
        assert!(!before.holds(&chars, 1, 2));
        let outside = OffsetTest::parse("y;-3;s").expect("parse");
        assert!(!outside.holds(&chars, 1, 2));
    }
}
