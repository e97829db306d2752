//! Free text hints

use rand::Rng;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::ValueGenerator;

const LOREM: &[&str] = &[
    "lorem", "ipsum", "dolor", "sit", "amet", "consectetur", "adipiscing", "elit", "sed", "do",
    "eiusmod", "tempor", "incididunt", "ut", "labore", "et", "dolore", "magna", "aliqua", "enim",
    "ad", "minim", "veniam", "quis", "nostrud", "exercitation", "ullamco", "laboris", "nisi",
    "aliquip", "ex", "ea", "commodo", "consequat", "duis", "aute", "irure", "in",
    "reprehenderit", "voluptate", "velit", "esse", "cillum", "fugiat", "nulla", "pariatur",
    "excepteur", "sint", "occaecat", "cupidatat", "non", "proident", "sunt", "culpa", "qui",
    "officia", "deserunt", "mollit", "anim", "id", "est", "laborum",
];

/// Placeholder prose with a character length between two bounds
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TextParams {
    pub min_len: usize,
    pub max_len: usize,
}

impl TextParams {
    pub fn check(&self) -> Result<(), String> {
        if self.min_len > self.max_len {
            return Err(format!(
                "minLen {} exceeds maxLen {}",
                self.min_len, self.max_len
            ));
        }
        Ok(())
    }
}

impl ValueGenerator for TextParams {
    fn generate<R: Rng>(&self, rng: &mut R) -> Value {
        let target = if self.max_len > self.min_len {
            rng.gen_range(self.min_len..=self.max_len)
        } else {
            self.min_len
        };
        let mut text = String::with_capacity(target + 16);
        while text.len() < target {
            if !text.is_empty() {
                text.push(' ');
            }
            text.push_str(LOREM[rng.gen_range(0..LOREM.len())]);
        }
        // Words are ASCII, so byte truncation lands on a char boundary
        text.truncate(target);
        if text.ends_with(' ') {
            text.pop();
            text.push('x');
        }
        Value::String(text)
    }
}
