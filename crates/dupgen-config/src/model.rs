use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

/// Top-level configuration file.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
#[serde(deny_unknown_fields)]
pub struct ConfigFile {
    /// Field descriptions in declaration order.
    pub attributes: Vec<AttributeConfig>,
    /// Field pairs whose values may be swapped in typographical duplicates.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub field_swap_prob: Vec<FieldSwapConfig>,
    /// Keyboard-neighbor probabilities for character substitutions.
    #[serde(default)]
    pub single_typo_prob: TypoProbabilities,
    /// Category mix used when the modification mode is `all`.
    #[serde(default)]
    pub error_type_distribution: CategoryMix,
    /// Field that is never set to missing and can be pinned to a locale value.
    #[serde(default = "default_locale_field")]
    pub locale_field: Option<String>,
    /// Phonetic rule table, relative to the data directory.
    #[serde(default = "default_phonetic_rules_file")]
    pub phonetic_rules_file: String,
    /// OCR rule table, relative to the data directory.
    #[serde(default = "default_ocr_rules_file")]
    pub ocr_rules_file: String,
    /// Value written for missing fields.
    #[serde(default)]
    pub missing_value: String,
}

/// Raw description of one field.
///
/// Every probability defaults to 0.0 when absent.
#[derive(Debug, Clone, Default, Serialize, Deserialize, JsonSchema)]
#[serde(deny_unknown_fields)]
pub struct AttributeConfig {
    pub name: String,
    /// One of `freq`, `date`, `phone`, `ident`, `others`.
    #[serde(rename = "type")]
    pub kind: String,
    /// One of `alpha`, `digit`, `alphanum`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub char_range: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub freq_file: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub misspell_file: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub lookup_file: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub start_date: Option<DateBound>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub end_date: Option<DateBound>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub area_codes: Option<AreaCodes>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub num_digits: Option<u32>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub start_id: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub end_id: Option<i64>,
    /// Cosmetic formatting applied to identifier values.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id_format: Option<IdentifierFormat>,

    /// Constant value of an `others` field.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub value: Option<String>,

    /// Earlier fields this one depends on.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub depend: Option<DependList>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub depend_prob: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub select_prob: Option<f64>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ins_prob: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub del_prob: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sub_prob: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub trans_prob: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub val_swap_prob: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub wrd_swap_prob: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub spc_ins_prob: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub spc_del_prob: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub miss_prob: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub misspell_prob: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub new_val_prob: Option<f64>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pho_prob: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ocr_prob: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ocr_fail_prob: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ocr_ins_sp_prob: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ocr_del_sp_prob: Option<f64>,
}

/// Date bound as `[day, month, year]` or the legacy `"(d,m,y)"` text form.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(untagged)]
pub enum DateBound {
    Parts(u32, u32, i32),
    Text(String),
}

/// Area codes as a list or a comma separated string.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(untagged)]
pub enum AreaCodes {
    List(Vec<String>),
    Text(String),
}

impl AreaCodes {
    pub fn to_list(&self) -> Vec<String> {
        match self {
            AreaCodes::List(codes) => codes.iter().map(|code| code.trim().to_string()).collect(),
            AreaCodes::Text(text) => split_list(text),
        }
    }
}

/// Dependency names as a list or a comma separated string.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(untagged)]
pub enum DependList {
    List(Vec<String>),
    Text(String),
}

impl DependList {
    pub fn to_list(&self) -> Vec<String> {
        match self {
            DependList::List(names) => names
                .iter()
                .map(|name| name.trim().to_string())
                .filter(|name| !name.is_empty())
                .collect(),
            DependList::Text(text) => split_list(text),
        }
    }
}

fn split_list(text: &str) -> Vec<String> {
    text.split(|ch: char| ch == ',' || ch.is_whitespace())
        .map(str::trim)
        .filter(|item| !item.is_empty())
        .map(str::to_string)
        .collect()
}

/// Cosmetic identifier formatting.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum IdentifierFormat {
    /// Append `count` random upper-case letters.
    LetterSuffix { count: usize },
    /// Prepend a prefix drawn uniformly from `prefixes`.
    CategoryPrefix {
        prefixes: Vec<String>,
        #[serde(default = "default_prefix_separator")]
        separator: String,
    },
}

/// Swap probability for a pair of fields.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(deny_unknown_fields)]
pub struct FieldSwapConfig {
    pub fields: [String; 2],
    pub prob: f64,
}

/// Keyboard-neighbor probabilities for substituted characters.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(deny_unknown_fields)]
pub struct TypoProbabilities {
    pub same_row: f64,
    pub same_col: f64,
}

impl Default for TypoProbabilities {
    fn default() -> Self {
        Self {
            same_row: 0.40,
            same_col: 0.30,
        }
    }
}

/// Corruption category weights for the `all` modification mode.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(deny_unknown_fields)]
pub struct CategoryMix {
    pub typ: f64,
    pub pho: f64,
    pub ocr: f64,
}

impl Default for CategoryMix {
    fn default() -> Self {
        Self {
            typ: 0.3,
            pho: 0.3,
            ocr: 0.4,
        }
    }
}

fn default_locale_field() -> Option<String> {
    Some("culture".to_string())
}

fn default_phonetic_rules_file() -> String {
    "phonetic-rules.csv".to_string()
}

fn default_ocr_rules_file() -> String {
    "ocr-rules.csv".to_string()
}

fn default_prefix_separator() -> String {
    "-".to_string()
}
