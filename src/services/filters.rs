//! Search filter normalization
//!
//! Turns raw query-string parameters (field name → ordered list of string
//! tokens) into canonical filter descriptors the search repository can
//! translate into SQL. Each known field has a fixed semantic kind; the
//! kind decides how its tokens are interpreted:
//!
//! - string: one token is an equality match, several become set membership
//! - integer: `"3"` is exact, `"0_5"` means "more than 5", several tokens
//!   become set membership
//! - boolean: only the first token counts
//! - decimal: a single `"min_max"` token; both bounds non-zero is an
//!   inclusive range, a zero bound opens the range on that side
//!
//! Fields absent from the classification table pass through untouched and
//! are ignored by the executor.

use serde::Serialize;
use std::collections::BTreeMap;

/// Semantic kind of a query parameter, from the static classification table.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldKind {
    Str,
    Integer,
    Boolean,
    Decimal,
}

/// String-typed filter fields.
pub const STR_FIELDS: &[&str] = &["availability_type", "type_local", "type_property"];
/// Integer-typed filter fields.
pub const INTEGER_FIELDS: &[&str] = &["rooms", "bathrooms", "floors"];
/// Boolean-typed filter fields.
pub const BOOLEAN_FIELDS: &[&str] = &["all", "parking_lot", "garages", "garden"];
/// Decimal-typed filter fields.
pub const DECIMAL_FIELDS: &[&str] = &["price_usd", "discovered_meters", "covered_meters"];

/// Look up a field's semantic kind. Unknown fields return `None` and are
/// passed through unmodified by [`normalize`].
pub fn classify(field: &str) -> Option<FieldKind> {
    if STR_FIELDS.contains(&field) {
        Some(FieldKind::Str)
    } else if INTEGER_FIELDS.contains(&field) {
        Some(FieldKind::Integer)
    } else if BOOLEAN_FIELDS.contains(&field) {
        Some(FieldKind::Boolean)
    } else if DECIMAL_FIELDS.contains(&field) {
        Some(FieldKind::Decimal)
    } else {
        None
    }
}

/// A single scalar filter value.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum FilterValue {
    Str(String),
    Int(i64),
    Bool(bool),
    Num(f64),
}

/// Canonical filter descriptor: the comparison semantics applied to a field.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type_query", rename_all = "lowercase")]
pub enum Filter {
    /// Equality
    Exact { value: FilterValue },
    /// Set membership
    Multiple { value: Vec<FilterValue> },
    /// Greater-or-equal
    Gte { value: FilterValue },
    /// Less-or-equal
    Lte { value: FilterValue },
    /// Inclusive range
    Range { min_value: f64, max_value: f64 },
}

/// A filter mapping entry: either raw tokens as parsed from the query
/// string, or an already-normalized descriptor.
#[derive(Debug, Clone, PartialEq)]
pub enum FilterEntry {
    Raw(Vec<String>),
    Descriptor(Filter),
}

/// Raw or normalized filter mapping, keyed by field name.
pub type FilterMap = BTreeMap<String, FilterEntry>;

/// Errors produced while normalizing raw filter tokens.
///
/// These are client input errors; the API layer surfaces them as HTTP 400.
#[derive(Debug, thiserror::Error, PartialEq)]
pub enum FilterError {
    #[error("field '{field}': '{token}' is not a valid integer")]
    InvalidInteger { field: String, token: String },

    #[error("field '{field}': '{token}' is not a valid decimal range")]
    InvalidDecimal { field: String, token: String },

    #[error("field '{field}': '{token}' is not a valid boolean")]
    InvalidBoolean { field: String, token: String },

    #[error("field '{field}': both range bounds are zero")]
    EmptyRange { field: String },

    #[error("field '{field}': no values supplied")]
    MissingValue { field: String },
}

impl FilterError {
    /// The field the offending value belonged to.
    pub fn field(&self) -> &str {
        match self {
            FilterError::InvalidInteger { field, .. }
            | FilterError::InvalidDecimal { field, .. }
            | FilterError::InvalidBoolean { field, .. }
            | FilterError::EmptyRange { field }
            | FilterError::MissingValue { field } => field,
        }
    }
}

/// Normalize every raw entry whose field appears in the classification
/// table. Unknown fields and entries that are already descriptors are left
/// as they are, which makes the operation idempotent.
pub fn normalize(mut filters: FilterMap) -> Result<FilterMap, FilterError> {
    for (field, entry) in filters.iter_mut() {
        let FilterEntry::Raw(tokens) = entry else {
            continue;
        };
        let Some(kind) = classify(field) else {
            continue;
        };
        let descriptor = normalize_field(field, kind, tokens)?;
        *entry = FilterEntry::Descriptor(descriptor);
    }
    Ok(filters)
}

/// Normalize one field's token list according to its semantic kind.
pub fn normalize_field(
    field: &str,
    kind: FieldKind,
    tokens: &[String],
) -> Result<Filter, FilterError> {
    if tokens.is_empty() {
        return Err(FilterError::MissingValue {
            field: field.to_string(),
        });
    }
    match kind {
        FieldKind::Str => Ok(normalize_str(tokens)),
        FieldKind::Integer => normalize_integer(field, tokens),
        FieldKind::Boolean => normalize_boolean(field, tokens),
        FieldKind::Decimal => normalize_decimal(field, tokens),
    }
}

fn normalize_str(tokens: &[String]) -> Filter {
    if tokens.len() >= 2 {
        Filter::Multiple {
            value: tokens
                .iter()
                .map(|t| FilterValue::Str(t.clone()))
                .collect(),
        }
    } else {
        Filter::Exact {
            value: FilterValue::Str(tokens[0].clone()),
        }
    }
}

fn normalize_integer(field: &str, tokens: &[String]) -> Result<Filter, FilterError> {
    let parse = |token: &str| -> Result<i64, FilterError> {
        token.parse().map_err(|_| FilterError::InvalidInteger {
            field: field.to_string(),
            token: token.to_string(),
        })
    };

    if tokens.len() == 1 {
        let token = tokens[0].as_str();
        // "0_5" reads as "more than 5". For integers that is >= 6, so the
        // bound is the suffix after '_' plus one.
        return match token.rsplit_once('_') {
            Some((_, suffix)) => Ok(Filter::Gte {
                value: FilterValue::Int(parse(suffix)? + 1),
            }),
            None => Ok(Filter::Exact {
                value: FilterValue::Int(parse(token)?),
            }),
        };
    }

    // Multi-valued integer fields are independent exact values, not a range.
    let values = tokens
        .iter()
        .map(|t| parse(t).map(FilterValue::Int))
        .collect::<Result<Vec<_>, _>>()?;
    Ok(Filter::Multiple { value: values })
}

fn normalize_boolean(field: &str, tokens: &[String]) -> Result<Filter, FilterError> {
    // Only the first token counts, extra values are discarded.
    let token = tokens[0].as_str();
    let value = match token.to_ascii_lowercase().as_str() {
        "true" | "1" => true,
        "false" | "0" => false,
        _ => {
            return Err(FilterError::InvalidBoolean {
                field: field.to_string(),
                token: token.to_string(),
            })
        }
    };
    Ok(Filter::Exact {
        value: FilterValue::Bool(value),
    })
}

fn normalize_decimal(field: &str, tokens: &[String]) -> Result<Filter, FilterError> {
    let token = tokens[0].as_str();
    let invalid = || FilterError::InvalidDecimal {
        field: field.to_string(),
        token: token.to_string(),
    };

    let (min_raw, max_raw) = token.split_once('_').ok_or_else(invalid)?;
    let min_value: f64 = min_raw.parse().map_err(|_| invalid())?;
    let max_value: f64 = max_raw.parse().map_err(|_| invalid())?;

    if min_value != 0.0 && max_value != 0.0 {
        Ok(Filter::Range {
            min_value,
            max_value,
        })
    } else if min_value == 0.0 && max_value != 0.0 {
        // "0_X" is an open-ended "greater than X".
        Ok(Filter::Gte {
            value: FilterValue::Num(max_value),
        })
    } else if min_value != 0.0 && max_value == 0.0 {
        // "X_0" is an open-ended "less than X".
        Ok(Filter::Lte {
            value: FilterValue::Num(min_value),
        })
    } else {
        Err(FilterError::EmptyRange {
            field: field.to_string(),
        })
    }
}
