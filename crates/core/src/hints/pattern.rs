//! Alphanumeric pattern hints

use std::collections::{BTreeMap, BTreeSet};

use rand::Rng;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::ValueGenerator;

/// Characters used for positions with no recorded character set
pub const DEFAULT_CHARSET: &str = "0123456789ABCDEFGHIJKLMNOPQRSTUVWXYZabcdefghijklmnopqrstuvwxyz";

/// Variable-length middle between a fixed prefix and suffix
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MiddleParams {
    pub charset: String,
    pub min_len: usize,
    pub max_len: usize,
}

/// Structured string shape
///
/// The fixed-length form records, for each character set, the positions it
/// fills (`chrs`). The affix form keeps a common prefix and suffix around a
/// variable `middle`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AlphanumericParams {
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub prefix: String,

    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub suffix: String,

    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub chrs: BTreeMap<String, Vec<usize>>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub middle: Option<MiddleParams>,
}

impl AlphanumericParams {
    /// Length of the positional body
    pub fn body_len(&self) -> usize {
        self.chrs
            .values()
            .flat_map(|positions| positions.iter())
            .max()
            .map(|max| max.saturating_add(1))
            .unwrap_or(0)
    }

    /// Longest string this pattern can produce
    pub fn generated_len(&self) -> usize {
        let body = match &self.middle {
            Some(middle) => middle.max_len,
            None => self.body_len(),
        };
        body.saturating_add(self.prefix.len())
            .saturating_add(self.suffix.len())
    }

    pub fn check(&self) -> Result<(), String> {
        if !self.chrs.is_empty() && self.middle.is_some() {
            return Err("positional charsets and a variable middle are exclusive".to_string());
        }
        if self.chrs.keys().any(|charset| charset.is_empty()) {
            return Err("character sets must not be empty".to_string());
        }
        let mut seen = BTreeSet::new();
        for position in self.chrs.values().flatten() {
            if !seen.insert(*position) {
                return Err(format!("position {} has more than one charset", position));
            }
        }
        if let Some(middle) = &self.middle {
            if middle.charset.is_empty() {
                return Err("middle charset must not be empty".to_string());
            }
            if middle.min_len > middle.max_len {
                return Err(format!(
                    "middle minLen {} exceeds maxLen {}",
                    middle.min_len, middle.max_len
                ));
            }
        }
        Ok(())
    }

    fn positional_body<R: Rng>(&self, rng: &mut R) -> String {
        let mut slots: Vec<Option<&str>> = vec![None; self.body_len()];
        for (charset, positions) in &self.chrs {
            for position in positions {
                slots[*position] = Some(charset);
            }
        }
        slots
            .into_iter()
            .map(|charset| pick_char(rng, charset.unwrap_or(DEFAULT_CHARSET)))
            .collect()
    }

    fn middle_body<R: Rng>(&self, rng: &mut R, middle: &MiddleParams) -> String {
        let len = if middle.max_len > middle.min_len {
            rng.gen_range(middle.min_len..=middle.max_len)
        } else {
            middle.min_len
        };
        (0..len).map(|_| pick_char(rng, &middle.charset)).collect()
    }
}

impl ValueGenerator for AlphanumericParams {
    fn generate<R: Rng>(&self, rng: &mut R) -> Value {
        let body = match &self.middle {
            Some(middle) => self.middle_body(rng, middle),
            None => self.positional_body(rng),
        };
        Value::String(format!("{}{}{}", self.prefix, body, self.suffix))
    }
}

fn pick_char<R: Rng>(rng: &mut R, charset: &str) -> char {
    let count = charset.chars().count();
    if count == 0 {
        return '?';
    }
    charset.chars().nth(rng.gen_range(0..count)).unwrap_or('?')
}
