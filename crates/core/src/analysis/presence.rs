//! Missing and null rates

use super::stats::round_to;
use crate::extract::Observation;
use crate::spec::Presence;

/// Presence of a field given how often its parent object was present
///
/// `parent_present` is `None` for array elements and dynamic-key values,
/// which are never missing. Both rates land in `[0, 1]`.
pub fn analyze_presence(observations: &[&Observation], parent_present: Option<usize>) -> Presence {
    let present = observations.len();
    let nulls = observations.iter().filter(|o| o.value.is_null()).count();

    let missing = match parent_present {
        Some(parents) if parents > 0 => 1.0 - present as f64 / parents as f64,
        _ => 0.0,
    };
    let null = if present > 0 {
        nulls as f64 / present as f64
    } else {
        0.0
    };

    Presence {
        missing: round_to(missing.clamp(0.0, 1.0), 6),
        null: round_to(null.clamp(0.0, 1.0), 6),
    }
}
