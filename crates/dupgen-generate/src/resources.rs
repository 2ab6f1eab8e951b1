use std::collections::{BTreeMap, BTreeSet};
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::RwLock;

use dupgen_config::{CorruptionCategory, FieldKind, ValidatedConfig};
use rand::Rng;
use rand::seq::{IndexedRandom, SliceRandom};
use tracing::debug;

use crate::corruption::RuleInterpreter;
use crate::errors::ResourceLoadError;

/// Directory of the data files shipped with the crate.
pub fn bundled_data_dir() -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("assets")
}

/// Non-blank, non-comment line of a data file with its 1-based number.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceLine {
    pub number: usize,
    pub text: String,
}

/// Value pool of a frequency file, each value repeated by its count.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FrequencyPool {
    values: Vec<String>,
}

impl FrequencyPool {
    pub fn from_values(values: Vec<String>) -> Self {
        Self { values }
    }

    /// Parse `value,count` lines.
    pub fn parse(path: &Path, lines: &[SourceLine]) -> Result<Self, ResourceLoadError> {
        let mut values = Vec::new();
        for line in lines {
            let columns: Vec<&str> = line.text.split(',').collect();
            if columns.len() != 2 {
                return Err(ResourceLoadError::Malformed {
                    path: path.to_path_buf(),
                    line: line.number,
                    message: format!("expected 'value,count', got '{}'", line.text),
                });
            }
            let value = columns[0].trim();
            let count: usize =
                columns[1]
                    .trim()
                    .parse()
                    .map_err(|_| ResourceLoadError::Malformed {
                        path: path.to_path_buf(),
                        line: line.number,
                        message: format!("invalid count '{}'", columns[1].trim()),
                    })?;
            values.extend(std::iter::repeat_n(value.to_string(), count));
        }
        if values.is_empty() {
            return Err(ResourceLoadError::Invalid {
                path: path.to_path_buf(),
                message: "frequency file holds no values".to_string(),
            });
        }
        Ok(Self { values })
    }

    pub fn shuffle<R: Rng + ?Sized>(&mut self, rng: &mut R) {
        self.values.shuffle(rng);
    }

    pub fn sample<R: Rng + ?Sized>(&self, rng: &mut R) -> Option<&str> {
        self.values.choose(rng).map(String::as_str)
    }

    pub fn values(&self) -> &[String] {
        &self.values
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}

/// Lower-cased key to candidate values, as read from misspelling and
/// lookup files.
///
/// Plain values are de-duplicated and sorted; weighted lookup values
/// (`value;count`) follow them, repeated `count` times.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct KeyedTable {
    entries: BTreeMap<String, Vec<String>>,
}

#[derive(Default)]
struct KeyedValues {
    plain: BTreeSet<String>,
    weighted: Vec<String>,
}

impl KeyedTable {
    /// Parse a misspelling file: `correct: wrong, wrong` lines, optionally
    /// continued by lines of bare values.
    pub fn parse_misspellings(
        path: &Path,
        lines: &[SourceLine],
    ) -> Result<Self, ResourceLoadError> {
        parse_keyed(path, lines, false)
    }

    /// Parse a lookup file: `key: value, value;count` lines, optionally
    /// continued by lines of bare values.
    pub fn parse_lookup(path: &Path, lines: &[SourceLine]) -> Result<Self, ResourceLoadError> {
        parse_keyed(path, lines, true)
    }

    pub fn get(&self, key: &str) -> Option<&[String]> {
        self.entries.get(key).map(Vec::as_slice)
    }

    pub fn choose<R: Rng + ?Sized>(&self, key: &str, rng: &mut R) -> Option<&str> {
        self.entries.get(key)?.choose(rng).map(String::as_str)
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.entries.keys().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

fn parse_keyed(
    path: &Path,
    lines: &[SourceLine],
    weighted: bool,
) -> Result<KeyedTable, ResourceLoadError> {
    let malformed = |line: usize, message: String| ResourceLoadError::Malformed {
        path: path.to_path_buf(),
        line,
        message,
    };

    let mut collected: BTreeMap<String, KeyedValues> = BTreeMap::new();
    let mut current: Option<String> = None;

    for line in lines {
        let mut parts: Vec<&str> = line.text.split(':').collect();
        if parts.len() > 1 && parts[0].is_empty() {
            parts.remove(0);
        }

        let values = match parts.as_slice() {
            [key, values] => {
                let key = key.trim().to_lowercase();
                if key.is_empty() {
                    return Err(malformed(line.number, "empty key".to_string()));
                }
                if values.trim().is_empty() {
                    return Err(malformed(line.number, format!("no values given for '{key}'")));
                }
                current = Some(key);
                *values
            }
            [values] => {
                if current.is_none() {
                    return Err(malformed(
                        line.number,
                        "values given before any key".to_string(),
                    ));
                }
                *values
            }
            _ => {
                return Err(malformed(
                    line.number,
                    format!("illegal line format '{}'", line.text),
                ));
            }
        };

        let Some(key) = current.as_ref() else {
            continue;
        };
        let entry = collected.entry(key.clone()).or_default();
        for raw in values.to_lowercase().split(',') {
            if weighted && raw.contains(';') {
                let (value, count) = raw.split_once(';').unwrap_or((raw, "1"));
                let count: usize = count.trim().parse().map_err(|_| {
                    malformed(line.number, format!("invalid frequency '{}'", count.trim()))
                })?;
                entry
                    .weighted
                    .extend(std::iter::repeat_n(value.trim().to_string(), count));
                continue;
            }
            let value = raw.trim();
            if value.is_empty() {
                continue;
            }
            if !weighted && value == key.as_str() {
                return Err(malformed(
                    line.number,
                    format!("misspelling '{value}' equals the correct spelling"),
                ));
            }
            entry.plain.insert(value.to_string());
        }
    }

    let entries = collected
        .into_iter()
        .map(|(key, values)| {
            let mut list: Vec<String> = values.plain.into_iter().collect();
            list.extend(values.weighted);
            (key, list)
        })
        .filter(|(_, list)| !list.is_empty())
        .collect();
    Ok(KeyedTable { entries })
}

/// Every data file a validated configuration needs, keyed by field name.
#[derive(Debug, Clone, Default)]
pub struct ResourceTables {
    pub frequencies: BTreeMap<String, FrequencyPool>,
    pub misspellings: BTreeMap<String, KeyedTable>,
    pub lookups: BTreeMap<String, KeyedTable>,
    pub phonetic: RuleInterpreter,
    pub ocr: RuleInterpreter,
}

/// Reads data files below a root directory, caching their lines.
#[derive(Debug)]
pub struct ResourceLoader {
    root: PathBuf,
    cache: RwLock<BTreeMap<String, Vec<SourceLine>>>,
}

impl ResourceLoader {
    pub fn new(root: PathBuf) -> Self {
        Self {
            root,
            cache: RwLock::new(BTreeMap::new()),
        }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Lines of a data file, trimmed, without blanks and `#` comments.
    pub fn load_lines(&self, relative: &str) -> Result<Vec<SourceLine>, ResourceLoadError> {
        if let Some(lines) = self.cached(relative) {
            return Ok(lines);
        }

        let path = self.root.join(relative);
        let contents = fs::read_to_string(&path).map_err(|source| ResourceLoadError::Read {
            path: path.clone(),
            source,
        })?;
        let lines: Vec<SourceLine> = contents
            .lines()
            .enumerate()
            .map(|(idx, line)| SourceLine {
                number: idx + 1,
                text: line.trim().to_string(),
            })
            .filter(|line| !line.text.is_empty() && !line.text.starts_with('#'))
            .collect();

        let mut cache = self
            .cache
            .write()
            .map_err(|_| ResourceLoadError::CachePoisoned)?;
        cache.insert(relative.to_string(), lines.clone());
        debug!(path = %path.display(), lines = lines.len(), "data file loaded");

        Ok(lines)
    }

    fn cached(&self, relative: &str) -> Option<Vec<SourceLine>> {
        let cache = self.cache.read().ok()?;
        cache.get(relative).cloned()
    }

    /// Frequency pool shuffled once with the run's generator.
    pub fn frequency_pool<R: Rng + ?Sized>(
        &self,
        relative: &str,
        rng: &mut R,
    ) -> Result<FrequencyPool, ResourceLoadError> {
        let lines = self.load_lines(relative)?;
        let mut pool = FrequencyPool::parse(&self.root.join(relative), &lines)?;
        pool.shuffle(rng);
        Ok(pool)
    }

    pub fn misspellings(&self, relative: &str) -> Result<KeyedTable, ResourceLoadError> {
        let lines = self.load_lines(relative)?;
        KeyedTable::parse_misspellings(&self.root.join(relative), &lines)
    }

    pub fn lookup(&self, relative: &str) -> Result<KeyedTable, ResourceLoadError> {
        let lines = self.load_lines(relative)?;
        KeyedTable::parse_lookup(&self.root.join(relative), &lines)
    }

    pub fn rules(&self, relative: &str) -> Result<RuleInterpreter, ResourceLoadError> {
        let lines = self.load_lines(relative)?;
        RuleInterpreter::parse(&self.root.join(relative), &lines)
    }

    /// Load every table the configuration refers to, in field order.
    ///
    /// Rule tables are only read when the run can draw their category.
    pub fn load_tables<R: Rng + ?Sized>(
        &self,
        config: &ValidatedConfig,
        rng: &mut R,
    ) -> Result<ResourceTables, ResourceLoadError> {
        let mut tables = ResourceTables::default();

        for field in &config.fields {
            if let FieldKind::Frequency { freq_file } = &field.kind {
                let pool = self.frequency_pool(freq_file, rng)?;
                tables.frequencies.insert(field.name.clone(), pool);
            }
            if let Some(file) = &field.misspell_file {
                tables
                    .misspellings
                    .insert(field.name.clone(), self.misspellings(file)?);
            }
            if let Some(file) = &field.lookup_file {
                tables.lookups.insert(field.name.clone(), self.lookup(file)?);
            }
        }

        let uses =
            |category: CorruptionCategory| config.categories.items().any(|c| *c == category);
        if uses(CorruptionCategory::Phonetic) {
            tables.phonetic = self.rules(&config.phonetic_rules_file)?;
        }
        if uses(CorruptionCategory::Ocr) {
            tables.ocr = self.rules(&config.ocr_rules_file)?;
        }

        Ok(tables)
    }
}
