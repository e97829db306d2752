//! Well-known string formats and version strings

use rand::Rng;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::ValueGenerator;

const EMAIL_DOMAINS: &[&str] = &["example.com", "example.org", "example.net"];
const LOWER: &[u8] = b"abcdefghijklmnopqrstuvwxyz";

/// A string format recognized by fixed rules
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Format {
    /// UUID/GUID
    Uuid,
    /// MAC address (colon separated)
    MacAddress,
    /// IPv4 address
    Ipv4,
    /// IPv6 address
    Ipv6,
    /// Email address
    Email,
    /// HTTP(S) URL
    Uri,
}

impl std::fmt::Display for Format {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Format::Uuid => write!(f, "uuid"),
            Format::MacAddress => write!(f, "mac-address"),
            Format::Ipv4 => write!(f, "ipv4"),
            Format::Ipv6 => write!(f, "ipv6"),
            Format::Email => write!(f, "email"),
            Format::Uri => write!(f, "uri"),
        }
    }
}

/// Format hint parameters
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FormatParams {
    pub format: Format,

    /// Hex digits are upper case
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub uppercase: bool,
}

impl ValueGenerator for FormatParams {
    fn generate<R: Rng>(&self, rng: &mut R) -> Value {
        let text = match self.format {
            Format::Uuid => {
                let mut bytes = [0u8; 16];
                rng.fill(&mut bytes);
                uuid::Builder::from_random_bytes(bytes)
                    .into_uuid()
                    .hyphenated()
                    .to_string()
            }
            Format::MacAddress => {
                let mut bytes = [0u8; 6];
                rng.fill(&mut bytes);
                // Locally administered unicast
                bytes[0] = (bytes[0] & 0xfc) | 0x02;
                bytes
                    .iter()
                    .map(|b| format!("{:02x}", b))
                    .collect::<Vec<_>>()
                    .join(":")
            }
            Format::Ipv4 => format!(
                "{}.{}.{}.{}",
                rng.gen_range(1..=223u8),
                rng.gen_range(0..=255u8),
                rng.gen_range(0..=255u8),
                rng.gen_range(1..=254u8)
            ),
            Format::Ipv6 => (0..8)
                .map(|_| format!("{:x}", rng.gen_range(0..=0xffffu32)))
                .collect::<Vec<_>>()
                .join(":"),
            Format::Email => {
                let domain = EMAIL_DOMAINS[rng.gen_range(0..EMAIL_DOMAINS.len())];
                format!("{}@{}", lower_word(rng, 5, 10), domain)
            }
            Format::Uri => format!(
                "https://{}.example.com/{}",
                lower_word(rng, 3, 8),
                lower_word(rng, 4, 12)
            ),
        };
        if self.uppercase {
            Value::String(text.to_uppercase())
        } else {
            Value::String(text)
        }
    }
}

/// Inclusive integer range
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct IntRange {
    pub min: i64,
    pub max: i64,
}

/// Dotted version strings, one range per component
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VersionParams {
    pub parts: Vec<IntRange>,
}

impl VersionParams {
    pub fn check(&self) -> Result<(), String> {
        if self.parts.is_empty() {
            return Err("version needs at least one component".to_string());
        }
        for (i, part) in self.parts.iter().enumerate() {
            if part.min < 0 || part.min > part.max {
                return Err(format!("invalid range for version component {}", i));
            }
        }
        Ok(())
    }
}

impl ValueGenerator for VersionParams {
    fn generate<R: Rng>(&self, rng: &mut R) -> Value {
        let parts: Vec<String> = self
            .parts
            .iter()
            .map(|part| {
                if part.max > part.min {
                    rng.gen_range(part.min..=part.max).to_string()
                } else {
                    part.min.to_string()
                }
            })
            .collect();
        Value::String(parts.join("."))
    }
}

fn lower_word<R: Rng>(rng: &mut R, min: usize, max: usize) -> String {
    let len = rng.gen_range(min..=max);
    (0..len)
        .map(|_| LOWER[rng.gen_range(0..LOWER.len())] as char)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analysis::formats::detect_format;
    use rand::SeedableRng;
    use rand::rngs::StdRng;

    #[test]
    fn test_generated_formats_detect_as_themselves() {
        let mut rng = StdRng::seed_from_u64(42);
        for format in [
            Format::Uuid,
            Format::MacAddress,
            Format::Ipv4,
            Format::Ipv6,
            Format::Email,
            Format::Uri,
        ] {
            let params = FormatParams {
                format,
                uppercase: false,
            };
            for _ in 0..20 {
                let value = params.generate(&mut rng);
                assert_eq!(
                    detect_format(value.as_str().unwrap()),
                    Some(format),
                    "generated {:?} for {}",
                    value,
                    format
                );
            }
        }
    }

    #[test]
    fn test_uuid_is_v4() {
        let mut rng = StdRng::seed_from_u64(1);
        let params = FormatParams {
            format: Format::Uuid,
            uppercase: true,
        };
        let value = params.generate(&mut rng);
        let parsed = uuid::Uuid::parse_str(value.as_str().unwrap()).unwrap();
        assert_eq!(parsed.get_version_num(), 4);
        assert!(value.as_str().unwrap().chars().all(|c| !c.is_ascii_lowercase()));
    }

    #[test]
    fn test_version_ranges() {
        let params = VersionParams {
            parts: vec![
                IntRange { min: 1, max: 2 },
                IntRange { min: 0, max: 9 },
                IntRange { min: 5, max: 5 },
            ],
        };
        params.check().unwrap();
        let mut rng = StdRng::seed_from_u64(3);
        for _ in 0..20 {
            let value = params.generate(&mut rng);
            let parts: Vec<i64> = value
                .as_str()
                .unwrap()
                .split('.')
                .map(|p| p.parse().unwrap())
                .collect();
            assert!((1..=2).contains(&parts[0]));
            assert!((0..=9).contains(&parts[1]));
            assert_eq!(parts[2], 5);
        }
    }
}
