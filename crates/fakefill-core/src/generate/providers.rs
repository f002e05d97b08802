//! # Value Synthesizer
//!
//! Two-tier resolution of a column's generator:
//!
//! 1. The normalized column name is looked up in the semantic category table
//!    (`classify::rules`). A hit picks a category generator and the declared
//!    type is ignored, so `idade VARCHAR` still gets an age in [18, 80].
//! 2. Otherwise the declared type decides (`int`, `float`, `varchar`, `text`,
//!    `boolean`, `date`, `datetime`).
//!
//! Anything else is rejected with `UnsupportedFieldType`. Realistic text comes
//! from the `fake` crate in the configured locale; all randomness flows from
//! the caller's RNG so a fixed seed reproduces the same rows.

use std::borrow::Cow;
use std::fmt;
use std::str::FromStr;

use chrono::{Duration as ChronoDuration, NaiveDateTime, SubsecRound};
use fake::faker::address::raw::{BuildingNumber, CityName, CountryName, StateName, StreetName};
use fake::faker::impls::address::CityNameGenFn;
use fake::faker::company::raw::{CompanyName, Profession};
use fake::faker::internet::raw::SafeEmail;
use fake::faker::lorem::raw::{Sentence, Word};
use fake::faker::name::raw::{FirstName, LastName, Name};
use fake::faker::phone_number::raw::PhoneNumber;
use fake::locales::{Data, EN, PT_BR};
use fake::Fake;
use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::classify::rules::detect_category;
use crate::classify::semantic::FieldCategory;
use crate::error::{FakeFillError, Result};
use crate::generate::value::Value;
use crate::schema::types::FieldType;

/// Upper bound on characters produced for `text` columns.
pub const TEXT_MAX_CHARS: usize = 200;

/// Span covered by generated `date`/`datetime` values, ending at the base time.
const TEMPORAL_WINDOW_DAYS: i64 = 3650;

/// Locale used for names, places and other realistic text.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum Locale {
    #[default]
    #[serde(rename = "pt_BR", alias = "pt_br")]
    PtBr,
    #[serde(rename = "en_US", alias = "en_us", alias = "en")]
    EnUs,
}

impl FromStr for Locale {
    type Err = FakeFillError;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.trim().to_lowercase().replace('-', "_").as_str() {
            "pt_br" => Ok(Locale::PtBr),
            "en_us" | "en" => Ok(Locale::EnUs),
            other => Err(FakeFillError::config(format!(
                "Unknown locale '{}'. Supported: pt_BR, en_US",
                other
            ))),
        }
    }
}

impl fmt::Display for Locale {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Locale::PtBr => write!(f, "pt_BR"),
            Locale::EnUs => write!(f, "en_US"),
        }
    }
}

/// Produces a value for a column from its name and declared type.
#[derive(Debug, Clone)]
pub struct Synthesizer {
    locale: Locale,
    base_time: NaiveDateTime,
}

impl Default for Synthesizer {
    fn default() -> Self {
        Self::new(Locale::default())
    }
}

impl Synthesizer {
    /// The base time is pinned to "now" (whole seconds); temporal values are
    /// derived from it so one run is internally consistent.
    pub fn new(locale: Locale) -> Self {
        Self {
            locale,
            base_time: chrono::Utc::now().naive_utc().trunc_subsecs(0),
        }
    }

    /// Pin the anchor for `date`/`datetime` values, e.g. for reproducible tests.
    pub fn with_base_time(mut self, base_time: NaiveDateTime) -> Self {
        self.base_time = base_time.trunc_subsecs(0);
        self
    }

    /// Generate a value for `column_name` declared as `field_type`.
    pub fn synthesize<R: Rng>(
        &self,
        column_name: &str,
        field_type: &FieldType,
        rng: &mut R,
    ) -> Result<Value> {
        if let Some(category) = detect_category(column_name) {
            return Ok(match self.locale {
                Locale::PtBr => category_value(category, PT_BR, rng),
                Locale::EnUs => category_value(category, EN, rng),
            });
        }

        let value = match self.locale {
            Locale::PtBr => declared_type_value(field_type, PT_BR, self.base_time, rng),
            Locale::EnUs => declared_type_value(field_type, EN, self.base_time, rng),
        };
        value.ok_or_else(|| FakeFillError::UnsupportedFieldType {
            column: column_name.to_string(),
            field_type: field_type.to_string(),
        })
    }
}

/// A random UUID v4 drawn from `rng` (not the OS), for reproducible ids.
pub fn generate_identifier<R: Rng>(rng: &mut R) -> Value {
    let mut bytes = [0u8; 16];
    rng.fill(&mut bytes);
    Value::Uuid(uuid::Builder::from_random_bytes(bytes).into_uuid())
}

#[inline]
fn owned(s: String) -> Value {
    Value::String(Cow::Owned(s))
}

#[inline]
fn round2(v: f64) -> f64 {
    (v * 100.0_f64).round() / 100.0_f64
}

fn category_value<L: Data + CityNameGenFn + Copy, R: Rng>(
    category: FieldCategory,
    locale: L,
    rng: &mut R,
) -> Value {
    match category {
        FieldCategory::Name => owned(Name(locale).fake_with_rng(rng)),
        FieldCategory::FirstName => owned(FirstName(locale).fake_with_rng(rng)),
        FieldCategory::LastName => owned(LastName(locale).fake_with_rng(rng)),
        FieldCategory::City => owned(CityName(locale).fake_with_rng(rng)),
        FieldCategory::Email => owned(SafeEmail(locale).fake_with_rng(rng)),
        FieldCategory::Phone => owned(PhoneNumber(locale).fake_with_rng(rng)),
        FieldCategory::Address => {
            let street: String = StreetName(locale).fake_with_rng(rng);
            let number: String = BuildingNumber(locale).fake_with_rng(rng);
            owned(format!("{}, {}", street, number))
        }
        FieldCategory::State => owned(StateName(locale).fake_with_rng(rng)),
        FieldCategory::Country => owned(CountryName(locale).fake_with_rng(rng)),
        FieldCategory::Company => owned(CompanyName(locale).fake_with_rng(rng)),
        FieldCategory::Job => owned(Profession(locale).fake_with_rng(rng)),
        FieldCategory::Product | FieldCategory::Category => owned(Word(locale).fake_with_rng(rng)),
        FieldCategory::Age => Value::Int(rng.random_range(18..=80)),
        FieldCategory::Value => Value::Float(round2(rng.random_range(1.0_f64..=10_000.0_f64))),
    }
}

fn declared_type_value<L: Data + Copy, R: Rng>(
    field_type: &FieldType,
    locale: L,
    base_time: NaiveDateTime,
    rng: &mut R,
) -> Option<Value> {
    let value = match field_type {
        FieldType::Int => Value::Int(rng.random_range(1..=1000)),
        FieldType::Float => Value::Float(round2(rng.random_range(1.0_f64..=1000.0_f64))),
        FieldType::Varchar => owned(Word(locale).fake_with_rng(rng)),
        FieldType::Text => owned(bounded_text(locale, rng, TEXT_MAX_CHARS)),
        FieldType::Boolean => Value::Bool(rng.random_bool(0.5)),
        FieldType::Date => {
            let days_ago = rng.random_range(0..TEMPORAL_WINDOW_DAYS);
            Value::Date(base_time.date() - ChronoDuration::days(days_ago))
        }
        FieldType::Datetime => {
            let seconds_ago = rng.random_range(0..TEMPORAL_WINDOW_DAYS * 86_400);
            Value::Timestamp(base_time - ChronoDuration::seconds(seconds_ago))
        }
        FieldType::Other(_) => return None,
    };
    Some(value)
}

/// Whole sentences up to `max_chars`; a lone overlong sentence is cut.
fn bounded_text<L: Data + Copy, R: Rng>(locale: L, rng: &mut R, max_chars: usize) -> String {
    let sentence_count = rng.random_range(1..=4);
    let mut text = String::new();
    let mut len = 0usize;

    for _ in 0..sentence_count {
        let sentence: String = Sentence(locale, 3..10).fake_with_rng(rng);
        let sentence_len = sentence.chars().count();
        if text.is_empty() {
            if sentence_len > max_chars {
                return sentence.chars().take(max_chars).collect();
            }
            len = sentence_len;
            text = sentence;
            continue;
        }
        if len + 1 + sentence_len > max_chars {
            break;
        }
        text.push(' ');
        text.push_str(&sentence);
        len += 1 + sentence_len;
    }
    text
}
