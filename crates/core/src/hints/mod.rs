//! Generation hints
//!
//! A [`Hint`] is the serializable description of how values at one path are
//! produced. Hints carry everything needed for generation and nothing about
//! the samples they were learned from.

pub mod choice;
pub mod format;
pub mod number;
pub mod pattern;
pub mod temporal;
pub mod text;

use rand::Rng;
use serde::{Deserialize, Serialize};
use serde_json::Value;

pub use choice::ChoiceParams;
pub use format::{Format, FormatParams, IntRange, VersionParams};
pub use number::{Family, NumberParams, TailParams};
pub use pattern::{AlphanumericParams, MiddleParams};
pub use temporal::{
    DateParams, DateTimeFormat, DateTimeParams, DurationFormat, DurationParams,
};
pub use text::TextParams;

/// Longest string, array or mapping a spec may ask the generator for
pub const MAX_GENERATED_LEN: usize = 1 << 20;

/// Trait for producing values from hint parameters
pub trait ValueGenerator {
    /// Generate one value using the given RNG
    fn generate<R: Rng>(&self, rng: &mut R) -> Value;
}

/// How values at one path are generated
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum Hint {
    /// Always the same value
    #[serde(rename = "CONST")]
    Constant { value: Value },

    #[serde(rename = "CHOICE")]
    Choice(ChoiceParams),

    #[serde(rename = "NUMBER")]
    Number(NumberParams),

    /// A number carried as a string
    #[serde(rename = "NUMSTR")]
    NumberString(NumberParams),

    #[serde(rename = "ALPHA")]
    Alphanumeric(AlphanumericParams),

    #[serde(rename = "DATE")]
    Date(DateParams),

    #[serde(rename = "DATETIME")]
    DateTime(DateTimeParams),

    #[serde(rename = "DURATION")]
    Duration(DurationParams),

    #[serde(rename = "FORMAT")]
    Format(FormatParams),

    #[serde(rename = "VERSION")]
    Version(VersionParams),

    #[serde(rename = "TEXT")]
    Text(TextParams),
}

impl Hint {
    /// Wire name of this hint kind
    pub fn kind(&self) -> &'static str {
        match self {
            Hint::Constant { .. } => "CONST",
            Hint::Choice(_) => "CHOICE",
            Hint::Number(_) => "NUMBER",
            Hint::NumberString(_) => "NUMSTR",
            Hint::Alphanumeric(_) => "ALPHA",
            Hint::Date(_) => "DATE",
            Hint::DateTime(_) => "DATETIME",
            Hint::Duration(_) => "DURATION",
            Hint::Format(_) => "FORMAT",
            Hint::Version(_) => "VERSION",
            Hint::Text(_) => "TEXT",
        }
    }

    /// Whether generated strings stay within [`MAX_GENERATED_LEN`]
    pub fn check_size(&self) -> Result<(), String> {
        let longest = match self {
            Hint::Text(params) => params.max_len,
            Hint::Alphanumeric(params) => params.generated_len(),
            _ => return Ok(()),
        };
        if longest > MAX_GENERATED_LEN {
            return Err(format!(
                "generated length {} exceeds the limit of {}",
                longest, MAX_GENERATED_LEN
            ));
        }
        Ok(())
    }

    /// Problems with the hint's parameters, if any
    pub fn check(&self) -> Result<(), String> {
        match self {
            Hint::Constant { .. } | Hint::Format(_) => Ok(()),
            Hint::Choice(params) => params.check(),
            Hint::Number(params) | Hint::NumberString(params) => params.check(),
            Hint::Alphanumeric(params) => params.check(),
            Hint::Date(params) => params.check(),
            Hint::DateTime(params) => params.check(),
            Hint::Duration(params) => params.check(),
            Hint::Version(params) => params.check(),
            Hint::Text(params) => params.check(),
        }
    }
}

impl ValueGenerator for Hint {
    fn generate<R: Rng>(&self, rng: &mut R) -> Value {
        match self {
            Hint::Constant { value } => value.clone(),
            Hint::Choice(params) => params.generate(rng),
            Hint::Number(params) => params.generate(rng),
            Hint::NumberString(params) => {
                let value = params.sample(rng);
                Value::String(params.render(value))
            }
            Hint::Alphanumeric(params) => params.generate(rng),
            Hint::Date(params) => params.generate(rng),
            Hint::DateTime(params) => params.generate(rng),
            Hint::Duration(params) => params.generate(rng),
            Hint::Format(params) => params.generate(rng),
            Hint::Version(params) => params.generate(rng),
            Hint::Text(params) => params.generate(rng),
        }
    }
}
