//! HTML-style constraint validation for a single field.
//!
//! Checks run in the order browsers report them: missing value, bad input,
//! type mismatch, pattern, length, range, step. Only the first failure is
//! reported.

use std::sync::OnceLock;

use chrono::{Datelike, NaiveDate, NaiveDateTime, NaiveTime, Timelike, Weekday};
use fancy_regex::Regex as PatternRegex;
use regex::Regex;
use shared::domain::SelectedFile;
use thiserror::Error;

use crate::field::{Field, FieldKind, FieldValue};

#[derive(Debug, Clone, Default)]
pub struct Constraints {
    pub required: bool,
    pub pattern: Option<PatternRegex>,
    pub title: Option<String>,
    pub min_length: Option<usize>,
    pub max_length: Option<usize>,
    pub min: Option<String>,
    pub max: Option<String>,
    pub step: Option<String>,
    pub multiple: bool,
    pub accept: Vec<String>,
}

impl Constraints {
    /// Compiles an HTML `pattern` attribute. Patterns are written for
    /// ECMAScript, so lookaround and backreferences must be supported. The
    /// pattern must match the whole value, so it is anchored here.
    pub fn compile_pattern(pattern: &str) -> Result<PatternRegex, fancy_regex::Error> {
        PatternRegex::new(&format!("^(?:{pattern})$"))
    }

    pub fn parse_accept(raw: &str) -> Vec<String> {
        raw.split(',')
            .map(|token| token.trim().to_ascii_lowercase())
            .filter(|token| !token.is_empty())
            .collect()
    }

    /// `.ext` tokens match the file name, `type/*` the mime family, anything
    /// else the exact mime type.
    pub fn accepts(&self, file: &SelectedFile) -> bool {
        if self.accept.is_empty() {
            return true;
        }
        let name = file.name.to_ascii_lowercase();
        let mime_type = file
            .mime_type
            .as_deref()
            .map(str::to_ascii_lowercase)
            .unwrap_or_default();
        self.accept.iter().any(|token| {
            if token.starts_with('.') {
                name.ends_with(token.as_str())
            } else if let Some(family) = token.strip_suffix("/*") {
                mime_type
                    .split_once('/')
                    .is_some_and(|(prefix, _)| prefix == family)
            } else {
                mime_type == *token
            }
        })
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConstraintViolation {
    #[error("Please fill out this field.")]
    ValueMissing,
    #[error("Please select an item in the list.")]
    SelectionMissing,
    #[error("Please check this box if you want to proceed.")]
    CheckboxUnchecked,
    #[error("Please select one of these options.")]
    RadioUnselected,
    #[error("Please select a file.")]
    FileMissing,
    #[error("Please select only one file.")]
    TooManyFiles,
    #[error("\"{file_name}\" is not an accepted file type.")]
    FileTypeMismatch { file_name: String },
    #[error("Please enter a number.")]
    BadNumber,
    #[error("Please enter a valid date.")]
    BadDate,
    #[error("Please enter a valid time.")]
    BadTime,
    #[error("Please enter an email address.")]
    EmailMismatch,
    #[error("Please enter a URL.")]
    UrlMismatch,
    #[error("Please match the requested format.{}", title_suffix(.title))]
    PatternMismatch { title: Option<String> },
    #[error("Please lengthen this text to {min} characters or more (you are currently using {current} characters).")]
    TooShort { min: usize, current: usize },
    #[error("Please shorten this text to {max} characters or less (you are currently using {current} characters).")]
    TooLong { max: usize, current: usize },
    #[error("Value must be greater than or equal to {min}.")]
    RangeUnderflow { min: String },
    #[error("Value must be less than or equal to {max}.")]
    RangeOverflow { max: String },
    #[error("Please enter a valid value.{}", nearest_suffix(.nearest))]
    StepMismatch { nearest: Option<(String, String)> },
    #[error("{0}")]
    Custom(String),
}

fn title_suffix(title: &Option<String>) -> String {
    match title {
        Some(title) if !title.trim().is_empty() => format!(" {}", title.trim()),
        _ => String::new(),
    }
}

fn nearest_suffix(nearest: &Option<(String, String)>) -> String {
    match nearest {
        Some((lower, upper)) => {
            format!(" The two nearest valid values are {lower} and {upper}.")
        }
        None => String::new(),
    }
}

fn email_regex() -> &'static Regex {
    static EMAIL: OnceLock<Regex> = OnceLock::new();
    EMAIL.get_or_init(|| {
        Regex::new(
            r"^[a-zA-Z0-9.!#$%&'*+/=?^_`{|}~-]+@[a-zA-Z0-9](?:[a-zA-Z0-9-]{0,61}[a-zA-Z0-9])?(?:\.[a-zA-Z0-9](?:[a-zA-Z0-9-]{0,61}[a-zA-Z0-9])?)*$",
        )
        .expect("static email pattern compiles")
    })
}

pub(crate) fn check(field: &Field) -> Result<(), ConstraintViolation> {
    let constraints = field.constraints();
    match field.value() {
        FieldValue::Checked(checked) => {
            if constraints.required && !checked {
                return Err(match field.kind() {
                    FieldKind::Radio => ConstraintViolation::RadioUnselected,
                    _ => ConstraintViolation::CheckboxUnchecked,
                });
            }
            Ok(())
        }
        FieldValue::Files(files) => check_files(constraints, files),
        FieldValue::Text(value) => check_text(field.kind(), constraints, value),
    }
}

fn check_files(constraints: &Constraints, files: &[SelectedFile]) -> Result<(), ConstraintViolation> {
    if files.is_empty() {
        if constraints.required {
            return Err(ConstraintViolation::FileMissing);
        }
        return Ok(());
    }
    if !constraints.multiple && files.len() > 1 {
        return Err(ConstraintViolation::TooManyFiles);
    }
    match files.iter().find(|file| !constraints.accepts(file)) {
        Some(file) => Err(ConstraintViolation::FileTypeMismatch {
            file_name: file.name.clone(),
        }),
        None => Ok(()),
    }
}

fn check_text(
    kind: &FieldKind,
    constraints: &Constraints,
    value: &str,
) -> Result<(), ConstraintViolation> {
    if value.is_empty() {
        if constraints.required {
            return Err(match kind {
                FieldKind::Select { .. } => ConstraintViolation::SelectionMissing,
                _ => ConstraintViolation::ValueMissing,
            });
        }
        return Ok(());
    }

    match kind {
        FieldKind::Number => {
            let number = parse_number(value).ok_or(ConstraintViolation::BadNumber)?;
            check_range_and_step(kind, constraints, number)
        }
        FieldKind::Date | FieldKind::Month | FieldKind::Week | FieldKind::DateTimeLocal => {
            let position = temporal_position(kind, value).ok_or(ConstraintViolation::BadDate)?;
            check_range_and_step(kind, constraints, position)
        }
        FieldKind::Time => {
            let position = temporal_position(kind, value).ok_or(ConstraintViolation::BadTime)?;
            check_range_and_step(kind, constraints, position)
        }
        FieldKind::Email => {
            if !email_regex().is_match(value) {
                return Err(ConstraintViolation::EmailMismatch);
            }
            check_pattern_and_length(constraints, value)
        }
        FieldKind::Url => {
            if url::Url::parse(value).is_err() {
                return Err(ConstraintViolation::UrlMismatch);
            }
            check_pattern_and_length(constraints, value)
        }
        FieldKind::Text | FieldKind::Tel | FieldKind::Password => {
            check_pattern_and_length(constraints, value)
        }
        FieldKind::TextArea => check_length(constraints, value),
        FieldKind::Select { .. }
        | FieldKind::Hidden
        | FieldKind::Checkbox
        | FieldKind::Radio
        | FieldKind::File => Ok(()),
    }
}

fn check_pattern_and_length(
    constraints: &Constraints,
    value: &str,
) -> Result<(), ConstraintViolation> {
    if let Some(pattern) = &constraints.pattern {
        // A match that exhausts the backtracking limit counts as a mismatch.
        if !pattern.is_match(value).unwrap_or(false) {
            return Err(ConstraintViolation::PatternMismatch {
                title: constraints.title.clone(),
            });
        }
    }
    check_length(constraints, value)
}

fn check_length(constraints: &Constraints, value: &str) -> Result<(), ConstraintViolation> {
    let current = value.chars().count();
    if let Some(max) = constraints.max_length {
        if current > max {
            return Err(ConstraintViolation::TooLong { max, current });
        }
    }
    if let Some(min) = constraints.min_length {
        if current < min {
            return Err(ConstraintViolation::TooShort { min, current });
        }
    }
    Ok(())
}

fn parse_number(raw: &str) -> Option<f64> {
    raw.trim().parse::<f64>().ok().filter(|value| value.is_finite())
}

// Position on the axis that `min`, `max` and `step` are measured on.
fn temporal_position(kind: &FieldKind, raw: &str) -> Option<f64> {
    let epoch = NaiveDate::from_ymd_opt(1970, 1, 1)?;
    match kind {
        FieldKind::Date => {
            let date = NaiveDate::parse_from_str(raw, "%Y-%m-%d").ok()?;
            Some((date - epoch).num_days() as f64)
        }
        FieldKind::Month => {
            let first = NaiveDate::parse_from_str(&format!("{raw}-01"), "%Y-%m-%d").ok()?;
            Some(((first.year() as i64 - 1970) * 12 + first.month0() as i64) as f64)
        }
        FieldKind::Week => {
            let (year, week) = raw.split_once("-W")?;
            let monday =
                NaiveDate::from_isoywd_opt(year.parse().ok()?, week.parse().ok()?, Weekday::Mon)?;
            let first_monday = NaiveDate::from_ymd_opt(1969, 12, 29)?;
            Some(((monday - first_monday).num_days() / 7) as f64)
        }
        FieldKind::Time => {
            let time = NaiveTime::parse_from_str(raw, "%H:%M:%S%.f")
                .or_else(|_| NaiveTime::parse_from_str(raw, "%H:%M"))
                .ok()?;
            Some(time.num_seconds_from_midnight() as f64 + time.nanosecond() as f64 / 1e9)
        }
        FieldKind::DateTimeLocal => {
            let moment = NaiveDateTime::parse_from_str(raw, "%Y-%m-%dT%H:%M:%S%.f")
                .or_else(|_| NaiveDateTime::parse_from_str(raw, "%Y-%m-%dT%H:%M"))
                .ok()?;
            let utc = moment.and_utc();
            Some(utc.timestamp() as f64 + utc.timestamp_subsec_nanos() as f64 / 1e9)
        }
        _ => None,
    }
}

fn position(kind: &FieldKind, raw: &str) -> Option<f64> {
    match kind {
        FieldKind::Number => parse_number(raw),
        _ => temporal_position(kind, raw.trim()),
    }
}

/// Step in axis units; `None` when `step="any"`. Missing or unusable
/// attributes fall back to the type's default step.
fn allowed_step(kind: &FieldKind, constraints: &Constraints) -> Option<f64> {
    let default = match kind {
        FieldKind::Time | FieldKind::DateTimeLocal => 60.0,
        _ => 1.0,
    };
    match constraints.step.as_deref().map(str::trim) {
        Some(raw) if raw.eq_ignore_ascii_case("any") => None,
        Some(raw) => Some(parse_number(raw).filter(|step| *step > 0.0).unwrap_or(default)),
        None => Some(default),
    }
}

fn check_range_and_step(
    kind: &FieldKind,
    constraints: &Constraints,
    value: f64,
) -> Result<(), ConstraintViolation> {
    let min = constraints
        .min
        .as_deref()
        .and_then(|raw| position(kind, raw).map(|bound| (raw, bound)));
    if let Some((raw, min)) = min {
        if value < min {
            return Err(ConstraintViolation::RangeUnderflow {
                min: raw.to_string(),
            });
        }
    }
    if let Some(max) = constraints.max.as_deref() {
        if position(kind, max).is_some_and(|bound| value > bound) {
            return Err(ConstraintViolation::RangeOverflow {
                max: max.to_string(),
            });
        }
    }

    let Some(step) = allowed_step(kind, constraints) else {
        return Ok(());
    };
    let base = min.map(|(_, bound)| bound).unwrap_or(0.0);
    let steps = (value - base) / step;
    if (steps - steps.round()).abs() <= 1e-9 * steps.abs().max(1.0) {
        return Ok(());
    }
    let nearest = matches!(kind, FieldKind::Number).then(|| {
        let lower = base + steps.floor() * step;
        (format_number(lower), format_number(lower + step))
    });
    Err(ConstraintViolation::StepMismatch { nearest })
}

fn format_number(value: f64) -> String {
    let rounded = (value * 1e9).round() / 1e9;
    format!("{rounded}")
}
