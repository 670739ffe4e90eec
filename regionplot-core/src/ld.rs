//! LD resolution: orchestrates an external genotype/LD engine and
//! normalizes its output for rendering.
//!
//! The numeric work lives entirely behind [`LdEngine`]; this module applies
//! the keep-first duplicate policy and the "unknown LD renders as
//! uncorrelated" default. Diagnostics are returned in [`LdResolution`]
//! rather than logged here.

use std::collections::{HashMap, HashSet};

use crate::error::RegionResult;

/// External genotype/LD engine.
///
/// Implementations may be backed by different genotype storage formats;
/// that polymorphism is invisible here beyond this contract. Pairs come
/// back in engine order and may contain duplicate marker ids.
pub trait LdEngine {
    fn compute_ld(
        &self,
        anchor: &str,
        markers: &HashSet<String>,
        keep_samples: Option<&HashSet<String>>,
    ) -> RegionResult<Vec<(String, f64)>>;
}

/// Normalized LD table for one locus.
#[derive(Clone, Debug, Default)]
pub struct LdResolution {
    /// r² per candidate marker; every candidate is present, never NaN.
    pub r2: HashMap<String, f64>,
    /// Marker ids discarded by the keep-first duplicate policy, in the
    /// order they were seen.
    pub duplicates: Vec<String>,
    /// Candidates absent (or non-finite) in the engine output, set to 0.
    pub defaulted: usize,
}

/// Compute r² between `anchor` and every candidate marker.
///
/// Fails with a Resolution error when the engine cannot be read or the
/// anchor is unknown to it; this is fatal for the current locus only.
pub fn resolve_ld(
    engine: &dyn LdEngine,
    anchor: &str,
    candidates: &HashSet<String>,
    keep_samples: Option<&HashSet<String>>,
) -> RegionResult<LdResolution> {
    let raw = engine.compute_ld(anchor, candidates, keep_samples)?;

    let mut r2: HashMap<String, f64> = HashMap::with_capacity(candidates.len());
    let mut duplicates = Vec::new();
    for (id, value) in raw {
        if !candidates.contains(&id) {
            continue;
        }
        if r2.contains_key(&id) {
            duplicates.push(id);
        } else {
            r2.insert(id, value);
        }
    }

    let mut defaulted = 0;
    for id in candidates {
        match r2.get_mut(id) {
            Some(v) if v.is_finite() => {}
            Some(v) => {
                *v = 0.0;
                defaulted += 1;
            }
            None => {
                r2.insert(id.clone(), 0.0);
                defaulted += 1;
            }
        }
    }

    Ok(LdResolution {
        r2,
        duplicates,
        defaulted,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::RegionError;

    /// Engine returning a canned list of pairs.
    struct FixedEngine(Vec<(String, f64)>);

    impl LdEngine for FixedEngine {
        fn compute_ld(
            &self,
            anchor: &str,
            _markers: &HashSet<String>,
            _keep_samples: Option<&HashSet<String>>,
        ) -> RegionResult<Vec<(String, f64)>> {
            if anchor == "missing" {
                return Err(RegionError::resolution("anchor 'missing' not in source"));
            }
            Ok(self.0.clone())
        }
    }

    fn candidates(ids: &[&str]) -> HashSet<String> {
        ids.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_missing_markers_default_to_zero() {
        let engine = FixedEngine(vec![("A".to_string(), 0.9)]);
        let res = resolve_ld(&engine, "A", &candidates(&["A", "B", "C"]), None).unwrap();
        assert_eq!(res.r2["A"], 0.9);
        assert_eq!(res.r2["B"], 0.0);
        assert_eq!(res.r2["C"], 0.0);
        assert_eq!(res.defaulted, 2);
    }

    #[test]
    fn test_duplicates_keep_first_and_warn() {
        let engine = FixedEngine(vec![("A".to_string(), 0.7), ("A".to_string(), 0.3)]);
        let res = resolve_ld(&engine, "A", &candidates(&["A"]), None).unwrap();
        assert_eq!(res.r2["A"], 0.7);
        assert_eq!(res.duplicates, vec!["A".to_string()]);
    }

    #[test]
    fn test_non_finite_values_default_to_zero() {
        let engine = FixedEngine(vec![("A".to_string(), f64::NAN)]);
        let res = resolve_ld(&engine, "A", &candidates(&["A"]), None).unwrap();
        assert_eq!(res.r2["A"], 0.0);
        assert_eq!(res.defaulted, 1);
    }

    #[test]
    fn test_extraneous_engine_entries_are_ignored() {
        let engine = FixedEngine(vec![
            ("A".to_string(), 0.9),
            ("not_asked_for".to_string(), 0.5),
        ]);
        let res = resolve_ld(&engine, "A", &candidates(&["A"]), None).unwrap();
        assert_eq!(res.r2.len(), 1);
        assert!(!res.r2.contains_key("not_asked_for"));
    }

    #[test]
    fn test_missing_anchor_is_resolution_error() {
        let engine = FixedEngine(vec![]);
        let err = resolve_ld(&engine, "missing", &candidates(&["A"]), None).unwrap_err();
        assert!(matches!(err, RegionError::Resolution { .. }));
    }
}
