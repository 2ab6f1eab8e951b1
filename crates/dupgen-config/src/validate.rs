use std::collections::{HashMap, HashSet};

use dupgen_core::{CumulativeTable, RECORD_ID_FIELD, date_to_epoch};

use crate::PROBABILITY_TOLERANCE;
use crate::errors::{ConfigurationError, ValidationIssue};
use crate::model::{
    AttributeConfig, CategoryMix, ConfigFile, DateBound, IdentifierFormat, TypoProbabilities,
};
use crate::params::{CorruptionCategory, GeneratorParams, ModificationMode};
use crate::spec::{CharRange, FieldKind, FieldSpec, FieldSwap, OcrProbabilities, Operation};

/// Optional `name -> select_prob` override restricting the configured fields.
pub type FieldSelection = [(String, f64)];

/// Configuration ready for generation, with accumulated warnings.
#[derive(Debug, Clone)]
pub struct ValidatedConfig {
    pub params: GeneratorParams,
    pub fields: Vec<FieldSpec>,
    /// Field selection table over indices into `fields`.
    pub field_selection: CumulativeTable<usize>,
    pub swaps: Vec<FieldSwap>,
    pub typo: TypoProbabilities,
    pub categories: CumulativeTable<CorruptionCategory>,
    pub locale_field: Option<String>,
    pub phonetic_rules_file: String,
    pub ocr_rules_file: String,
    pub missing_value: String,
    pub warnings: Vec<ValidationIssue>,
}

impl ValidatedConfig {
    pub fn field(&self, name: &str) -> Option<&FieldSpec> {
        self.fields.iter().find(|field| field.name == name)
    }

    pub fn field_index(&self, name: &str) -> Option<usize> {
        self.fields.iter().position(|field| field.name == name)
    }

    pub fn field_names(&self) -> Vec<&str> {
        self.fields.iter().map(|field| field.name.as_str()).collect()
    }
}

/// Validate with the default tolerance and no field selection override.
pub fn validate_config(
    config: &ConfigFile,
    params: &GeneratorParams,
) -> Result<ValidatedConfig, ConfigurationError> {
    FieldSpecValidator::default().validate(config, params, None)
}

/// Turns raw attribute tables into immutable [`FieldSpec`]s.
#[derive(Debug, Clone, Copy)]
pub struct FieldSpecValidator {
    tolerance: f64,
}

impl Default for FieldSpecValidator {
    fn default() -> Self {
        Self {
            tolerance: PROBABILITY_TOLERANCE,
        }
    }
}

impl FieldSpecValidator {
    pub fn with_tolerance(tolerance: f64) -> Self {
        Self { tolerance }
    }

    pub fn validate(
        &self,
        config: &ConfigFile,
        params: &GeneratorParams,
        selection: Option<&FieldSelection>,
    ) -> Result<ValidatedConfig, ConfigurationError> {
        params.validate()?;

        let declared: HashSet<&str> = config
            .attributes
            .iter()
            .map(|attribute| attribute.name.as_str())
            .collect();
        let attributes = select_attributes(config, selection)?;
        let selected: HashSet<&str> = attributes
            .iter()
            .map(|attribute| attribute.name.as_str())
            .collect();

        let mut warnings = Vec::new();
        let mut fields: Vec<FieldSpec> = Vec::with_capacity(attributes.len());
        for raw in &attributes {
            let spec = self.validate_attribute(raw, &fields, &selected, &declared, &mut warnings)?;
            fields.push(spec);
        }
        if fields.is_empty() {
            return Err(ConfigurationError::global(
                "attributes",
                "at least one attribute must be configured",
            ));
        }

        let select_sum: f64 = fields.iter().map(|field| field.select_prob).sum();
        if (select_sum - 1.0).abs() > self.tolerance {
            return Err(ConfigurationError::global(
                "select_prob",
                format!("field selection probabilities sum to {select_sum}, expected 1.0"),
            ));
        }
        let field_selection = CumulativeTable::from_weights(
            fields
                .iter()
                .enumerate()
                .map(|(idx, field)| (idx, field.select_prob)),
        )
        .map_err(|err| ConfigurationError::global("select_prob", err.to_string()))?;

        let swaps = self.validate_swaps(config, &fields, &declared, &mut warnings)?;
        let typo = self.validate_typo(&config.single_typo_prob)?;
        let categories = self.category_table(&config.error_type_distribution, params.modification)?;

        let locale_field = config
            .locale_field
            .clone()
            .filter(|name| fields.iter().any(|field| &field.name == name));

        for field in &fields {
            if field.select_prob > 0.0 && !is_modifiable(field, params.modification) {
                warnings.push(ValidationIssue::new(
                    "field_never_modified",
                    field.name.clone(),
                    format!(
                        "field is selectable but has no probabilities for modification type '{}'",
                        params.modification
                    ),
                ));
            }
        }

        Ok(ValidatedConfig {
            params: params.clone(),
            fields,
            field_selection,
            swaps,
            typo,
            categories,
            locale_field,
            phonetic_rules_file: config.phonetic_rules_file.clone(),
            ocr_rules_file: config.ocr_rules_file.clone(),
            missing_value: config.missing_value.clone(),
            warnings,
        })
    }

    /// Validate one attribute against the fields accepted before it.
    pub fn validate_attribute(
        &self,
        raw: &AttributeConfig,
        earlier: &[FieldSpec],
        selected: &HashSet<&str>,
        declared: &HashSet<&str>,
        warnings: &mut Vec<ValidationIssue>,
    ) -> Result<FieldSpec, ConfigurationError> {
        let name = raw.name.trim();
        if name.is_empty() {
            return Err(ConfigurationError::global("name", "attribute name must not be empty"));
        }
        if name == RECORD_ID_FIELD {
            return Err(ConfigurationError::field(
                name,
                "name",
                format!("'{RECORD_ID_FIELD}' is reserved for record identifiers"),
            ));
        }
        if earlier.iter().any(|field| field.name == name) {
            return Err(ConfigurationError::field(name, "name", "attribute is declared twice"));
        }

        let char_range = parse_char_range(name, raw.char_range.as_deref())?;
        let kind = parse_kind(name, raw)?;

        let select_prob = probability(name, "select_prob", raw.select_prob)?;
        let depend_prob = probability(name, "depend_prob", raw.depend_prob)?;
        let pho_prob = probability(name, "pho_prob", raw.pho_prob)?;
        let ocr = OcrProbabilities {
            rule: probability(name, "ocr_prob", raw.ocr_prob)?,
            fail: probability(name, "ocr_fail_prob", raw.ocr_fail_prob)?,
            insert_space: probability(name, "ocr_ins_sp_prob", raw.ocr_ins_sp_prob)?,
            delete_space: probability(name, "ocr_del_sp_prob", raw.ocr_del_sp_prob)?,
        };

        let mut operation_probs = [0.0; 11];
        for (slot, operation) in operation_probs.iter_mut().zip(Operation::ALL) {
            *slot = probability(name, operation.config_key(), raw_operation_prob(raw, operation))?;
        }
        let operations = self.operation_table(name, &operation_probs)?;

        let misspell_file = non_empty(raw.misspell_file.as_deref());
        if operation_probs[Operation::Misspell as usize] > 0.0 && misspell_file.is_none() {
            return Err(ConfigurationError::field(
                name,
                "misspell_file",
                "misspell_prob is set but no misspellings file is configured",
            ));
        }
        let lookup_file = non_empty(raw.lookup_file.as_deref());

        let mut depends_on = Vec::new();
        for dependency in raw.depend.as_ref().map(|depend| depend.to_list()).unwrap_or_default() {
            if earlier.iter().any(|field| field.name == dependency) {
                depends_on.push(dependency);
            } else if selected.contains(dependency.as_str()) {
                return Err(ConfigurationError::field(
                    name,
                    "depend",
                    format!("dependency '{dependency}' must be declared before this field"),
                ));
            } else if declared.contains(dependency.as_str()) {
                warnings.push(ValidationIssue::new(
                    "dependency_dropped",
                    name,
                    format!("dependency '{dependency}' is not part of the selected fields"),
                ));
            } else {
                return Err(ConfigurationError::field(
                    name,
                    "depend",
                    format!("dependency '{dependency}' is not a configured field"),
                ));
            }
        }

        if !depends_on.is_empty() {
            match kind {
                FieldKind::Date { .. } if depends_on.len() > 1 => {
                    return Err(ConfigurationError::field(
                        name,
                        "depend",
                        "a date field may depend on a single age field",
                    ));
                }
                FieldKind::Date { .. } => {}
                _ if lookup_file.is_none() => {
                    return Err(ConfigurationError::field(
                        name,
                        "lookup_file",
                        "fields with dependencies need a lookup file",
                    ));
                }
                _ => {}
            }
        }

        Ok(FieldSpec {
            name: name.to_string(),
            kind,
            char_range,
            select_prob,
            depends_on,
            depend_prob,
            operation_probs,
            operations,
            pho_prob,
            ocr,
            misspell_file,
            lookup_file,
        })
    }

    fn operation_table(
        &self,
        name: &str,
        probs: &[f64; 11],
    ) -> Result<CumulativeTable<Operation>, ConfigurationError> {
        let sum: f64 = probs.iter().sum();
        if sum <= self.tolerance {
            return CumulativeTable::from_weights(std::iter::empty()).map_err(|err| {
                ConfigurationError::field(name, "modification probabilities", err.to_string())
            });
        }
        if (sum - 1.0).abs() > self.tolerance {
            return Err(ConfigurationError::field(
                name,
                "modification probabilities",
                format!("modification probabilities sum to {sum}, expected 0.0 or 1.0"),
            ));
        }
        CumulativeTable::from_weights(Operation::ALL.into_iter().zip(probs.iter().copied())).map_err(
            |err| ConfigurationError::field(name, "modification probabilities", err.to_string()),
        )
    }

    fn validate_swaps(
        &self,
        config: &ConfigFile,
        fields: &[FieldSpec],
        declared: &HashSet<&str>,
        warnings: &mut Vec<ValidationIssue>,
    ) -> Result<Vec<FieldSwap>, ConfigurationError> {
        let mut swaps = Vec::new();
        for pair in &config.field_swap_prob {
            let [left, right] = &pair.fields;
            let label = format!("{left}/{right}");
            if !(0.0..=1.0).contains(&pair.prob) {
                return Err(ConfigurationError::field(
                    label,
                    "field_swap_prob",
                    format!("probability {} is outside [0, 1]", pair.prob),
                ));
            }
            if left == right {
                return Err(ConfigurationError::field(
                    label,
                    "field_swap_prob",
                    "a field cannot be swapped with itself",
                ));
            }
            for name in [left, right] {
                if !declared.contains(name.as_str()) {
                    return Err(ConfigurationError::field(
                        label.clone(),
                        "field_swap_prob",
                        format!("'{name}' is not a configured field"),
                    ));
                }
            }
            let present = |name: &str| fields.iter().any(|field| field.name == name);
            if !present(left) || !present(right) {
                warnings.push(ValidationIssue::new(
                    "swap_dropped",
                    label,
                    "swap pair refers to a field outside the selected fields",
                ));
                continue;
            }
            if pair.prob > 0.0 {
                swaps.push(FieldSwap {
                    left: left.clone(),
                    right: right.clone(),
                    prob: pair.prob,
                });
            }
        }
        Ok(swaps)
    }

    fn validate_typo(&self, typo: &TypoProbabilities) -> Result<TypoProbabilities, ConfigurationError> {
        probability_global("single_typo_prob.same_row", typo.same_row)?;
        probability_global("single_typo_prob.same_col", typo.same_col)?;
        if typo.same_row + typo.same_col > 1.0 + self.tolerance {
            return Err(ConfigurationError::global(
                "single_typo_prob",
                "same_row and same_col probabilities must not sum above 1.0",
            ));
        }
        Ok(*typo)
    }

    fn category_table(
        &self,
        mix: &CategoryMix,
        mode: ModificationMode,
    ) -> Result<CumulativeTable<CorruptionCategory>, ConfigurationError> {
        if let ModificationMode::Only(category) = mode {
            return Ok(CumulativeTable::single(category));
        }
        let key = "error_type_distribution";
        probability_global("error_type_distribution.typ", mix.typ)?;
        probability_global("error_type_distribution.pho", mix.pho)?;
        probability_global("error_type_distribution.ocr", mix.ocr)?;
        let sum = mix.typ + mix.pho + mix.ocr;
        if (sum - 1.0).abs() > self.tolerance {
            return Err(ConfigurationError::global(
                key,
                format!("category probabilities sum to {sum}, expected 1.0"),
            ));
        }
        CumulativeTable::from_weights([
            (CorruptionCategory::Typographical, mix.typ),
            (CorruptionCategory::Phonetic, mix.pho),
            (CorruptionCategory::Ocr, mix.ocr),
        ])
        .map_err(|err| ConfigurationError::global(key, err.to_string()))
    }
}

fn select_attributes(
    config: &ConfigFile,
    selection: Option<&FieldSelection>,
) -> Result<Vec<AttributeConfig>, ConfigurationError> {
    let Some(selection) = selection else {
        return Ok(config.attributes.clone());
    };

    let mut overrides: HashMap<&str, f64> = HashMap::new();
    for (name, prob) in selection {
        if !config.attributes.iter().any(|attribute| &attribute.name == name) {
            return Err(ConfigurationError::field(
                name.clone(),
                "select_prob",
                "field selection names an unknown field",
            ));
        }
        if overrides.insert(name.as_str(), *prob).is_some() {
            return Err(ConfigurationError::field(
                name.clone(),
                "select_prob",
                "field is selected more than once",
            ));
        }
    }

    Ok(config
        .attributes
        .iter()
        .filter_map(|attribute| {
            overrides.get(attribute.name.as_str()).map(|prob| AttributeConfig {
                select_prob: Some(*prob),
                ..attribute.clone()
            })
        })
        .collect())
}

fn parse_char_range(name: &str, value: Option<&str>) -> Result<CharRange, ConfigurationError> {
    let value = value.ok_or_else(|| {
        ConfigurationError::field(name, "char_range", "missing character range")
    })?;
    match value.trim().to_lowercase().as_str() {
        "alpha" => Ok(CharRange::Alpha),
        "digit" => Ok(CharRange::Digit),
        "alphanum" | "alphanumeric" => Ok(CharRange::Alphanumeric),
        other => Err(ConfigurationError::field(
            name,
            "char_range",
            format!("unknown character range '{other}' (expected alpha, digit or alphanum)"),
        )),
    }
}

fn parse_kind(name: &str, raw: &AttributeConfig) -> Result<FieldKind, ConfigurationError> {
    let missing = |key: &str| ConfigurationError::field(name, key, format!("required for type '{}'", raw.kind));

    match raw.kind.trim().to_lowercase().as_str() {
        "freq" | "frequency" => {
            let freq_file = non_empty(raw.freq_file.as_deref()).ok_or_else(|| missing("freq_file"))?;
            Ok(FieldKind::Frequency { freq_file })
        }
        "date" => {
            let start = raw.start_date.as_ref().ok_or_else(|| missing("start_date"))?;
            let end = raw.end_date.as_ref().ok_or_else(|| missing("end_date"))?;
            let start_epoch = date_bound_epoch(name, "start_date", start)?;
            let end_epoch = date_bound_epoch(name, "end_date", end)?;
            if start_epoch >= end_epoch {
                return Err(ConfigurationError::field(
                    name,
                    "end_date",
                    "end date must be after start date",
                ));
            }
            Ok(FieldKind::Date {
                start_epoch,
                end_epoch,
            })
        }
        "phone" => {
            let area_codes = raw
                .area_codes
                .as_ref()
                .map(|codes| codes.to_list())
                .filter(|codes| !codes.is_empty())
                .ok_or_else(|| missing("area_codes"))?;
            let num_digits = raw.num_digits.ok_or_else(|| missing("num_digits"))?;
            if !(1..=18).contains(&num_digits) {
                return Err(ConfigurationError::field(
                    name,
                    "num_digits",
                    format!("number of digits must be between 1 and 18, got {num_digits}"),
                ));
            }
            Ok(FieldKind::Phone {
                area_codes,
                num_digits,
            })
        }
        "ident" | "identifier" => {
            let start_id = raw.start_id.ok_or_else(|| missing("start_id"))?;
            let end_id = raw.end_id.ok_or_else(|| missing("end_id"))?;
            if start_id >= end_id {
                return Err(ConfigurationError::field(
                    name,
                    "end_id",
                    format!("end_id ({end_id}) must be greater than start_id ({start_id})"),
                ));
            }
            if let Some(format) = &raw.id_format {
                validate_id_format(name, format)?;
            }
            Ok(FieldKind::Identifier {
                start_id,
                end_id,
                format: raw.id_format.clone(),
            })
        }
        "other" | "others" => Ok(FieldKind::Other {
            value: raw.value.clone(),
        }),
        other => Err(ConfigurationError::field(
            name,
            "type",
            format!("unknown field type '{other}' (expected freq, date, phone, ident or others)"),
        )),
    }
}

fn validate_id_format(name: &str, format: &IdentifierFormat) -> Result<(), ConfigurationError> {
    match format {
        IdentifierFormat::LetterSuffix { count } if *count == 0 => Err(ConfigurationError::field(
            name,
            "id_format",
            "letter suffix needs at least one letter",
        )),
        IdentifierFormat::CategoryPrefix { prefixes, .. } if prefixes.is_empty() => {
            Err(ConfigurationError::field(name, "id_format", "prefix list must not be empty"))
        }
        _ => Ok(()),
    }
}

fn date_bound_epoch(name: &str, key: &str, bound: &DateBound) -> Result<i64, ConfigurationError> {
    let (day, month, year) = match bound {
        DateBound::Parts(day, month, year) => (*day, *month, *year),
        DateBound::Text(text) => parse_date_text(text).ok_or_else(|| {
            ConfigurationError::field(name, key, format!("'{text}' is not a (day, month, year) date"))
        })?,
    };
    date_to_epoch(day, month, year).map_err(|err| ConfigurationError::field(name, key, err.to_string()))
}

fn parse_date_text(text: &str) -> Option<(u32, u32, i32)> {
    let inner = text.trim().trim_start_matches('(').trim_end_matches(')');
    let parts: Vec<&str> = inner.split([',', '/']).map(str::trim).collect();
    let [day, month, year] = parts.as_slice() else {
        return None;
    };
    Some((day.parse().ok()?, month.parse().ok()?, year.parse().ok()?))
}

fn raw_operation_prob(raw: &AttributeConfig, operation: Operation) -> Option<f64> {
    match operation {
        Operation::Insert => raw.ins_prob,
        Operation::Delete => raw.del_prob,
        Operation::Substitute => raw.sub_prob,
        Operation::Transpose => raw.trans_prob,
        Operation::ValueSwap => raw.val_swap_prob,
        Operation::WordSwap => raw.wrd_swap_prob,
        Operation::SpaceInsert => raw.spc_ins_prob,
        Operation::SpaceDelete => raw.spc_del_prob,
        Operation::Missing => raw.miss_prob,
        Operation::Misspell => raw.misspell_prob,
        Operation::NewValue => raw.new_val_prob,
    }
}

fn probability(name: &str, key: &str, value: Option<f64>) -> Result<f64, ConfigurationError> {
    let value = value.unwrap_or(0.0);
    if !(0.0..=1.0).contains(&value) {
        return Err(ConfigurationError::field(
            name,
            key,
            format!("probability {value} is outside [0, 1]"),
        ));
    }
    Ok(value)
}

fn probability_global(key: &str, value: f64) -> Result<f64, ConfigurationError> {
    if !(0.0..=1.0).contains(&value) {
        return Err(ConfigurationError::global(
            key,
            format!("probability {value} is outside [0, 1]"),
        ));
    }
    Ok(value)
}

fn non_empty(value: Option<&str>) -> Option<String> {
    value
        .map(str::trim)
        .filter(|value| !value.is_empty())
        .map(str::to_string)
}

fn is_modifiable(field: &FieldSpec, mode: ModificationMode) -> bool {
    let typographical = !field.operations.is_empty();
    let phonetic = field.pho_prob > 0.0;
    let ocr = field.ocr.rule > 0.0
        || field.ocr.fail > 0.0
        || field.ocr.insert_space > 0.0
        || field.ocr.delete_space > 0.0;
    match mode {
        ModificationMode::Only(CorruptionCategory::Typographical) => typographical,
        ModificationMode::Only(CorruptionCategory::Phonetic) => phonetic,
        ModificationMode::Only(CorruptionCategory::Ocr) => ocr,
        ModificationMode::All => typographical || phonetic || ocr,
    }
}
