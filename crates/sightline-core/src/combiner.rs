//! Id-list builders that merge several targets' buckets into one play order

use std::fmt;
use std::str::FromStr;

use crate::registry::ViewpointRegistry;
use crate::viewpoint::{TargetKey, ViewpointId};

/// How buckets are merged.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum CombineMode {
    /// Every viewpoint of the first target, then the second, ...
    #[default]
    Sequential,
    /// Round-robin by index: first of each target, second of each, ...
    Interleave,
}

impl FromStr for CombineMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "sequential" => Ok(CombineMode::Sequential),
            "interleave" => Ok(CombineMode::Interleave),
            other => Err(format!("unknown combine mode: {}", other)),
        }
    }
}

impl fmt::Display for CombineMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CombineMode::Sequential => f.write_str("sequential"),
            CombineMode::Interleave => f.write_str("interleave"),
        }
    }
}

/// Merge the buckets of `target_keys` into one id list.
///
/// Both modes emit every id exactly once; only the order differs. Unknown
/// targets contribute nothing.
pub fn create_combined_sequence(
    registry: &ViewpointRegistry,
    target_keys: &[TargetKey],
    mode: CombineMode,
) -> Vec<ViewpointId> {
    let buckets: Vec<Vec<ViewpointId>> = target_keys.iter().map(|key| registry.ids(key)).collect();

    match mode {
        CombineMode::Sequential => buckets.into_iter().flatten().collect(),
        CombineMode::Interleave => {
            let longest = buckets.iter().map(Vec::len).max().unwrap_or(0);
            (0..longest)
                .flat_map(|i| buckets.iter().filter_map(move |bucket| bucket.get(i).copied()))
                .collect()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scene::SceneGraph;

    fn registry_with(sizes: &[(&str, usize)]) -> (ViewpointRegistry, Vec<Vec<ViewpointId>>) {
        let scene = SceneGraph::default();
        let mut registry = ViewpointRegistry::new();
        let ids = sizes
            .iter()
            .map(|(key, n)| {
                (0..*n)
                    .map(|_| registry.add_view_point(&scene, None, (*key).into(), false).id)
                    .collect()
            })
            .collect();
        (registry, ids)
    }

    #[test]
    fn test_sequential_concatenates() {
        let (registry, ids) = registry_with(&[("a", 2), ("b", 3)]);
        let combined =
            create_combined_sequence(&registry, &["a".into(), "b".into()], CombineMode::Sequential);

        assert_eq!(combined.len(), 5);
        assert_eq!(&combined[..2], &ids[0][..]);
        assert_eq!(&combined[2..], &ids[1][..]);
    }

    #[test]
    fn test_interleave_round_robin() {
        let (registry, ids) = registry_with(&[("a", 2), ("b", 3), ("c", 1)]);
        let (a, b, c) = (&ids[0], &ids[1], &ids[2]);
        let combined = create_combined_sequence(
            &registry,
            &["a".into(), "b".into(), "c".into()],
            CombineMode::Interleave,
        );

        assert_eq!(combined, vec![a[0], b[0], c[0], a[1], b[1], b[2]]);
    }

    #[test]
    fn test_key_order_drives_output() {
        let (registry, ids) = registry_with(&[("a", 1), ("b", 1)]);
        let combined =
            create_combined_sequence(&registry, &["b".into(), "a".into()], CombineMode::Sequential);
        assert_eq!(combined, vec![ids[1][0], ids[0][0]]);
    }

    #[test]
    fn test_unknown_targets_are_skipped() {
        let (registry, ids) = registry_with(&[("a", 2)]);
        let combined = create_combined_sequence(
            &registry,
            &["missing".into(), "a".into()],
            CombineMode::Interleave,
        );
        assert_eq!(combined, ids[0]);
        assert!(create_combined_sequence(&registry, &[], CombineMode::Sequential).is_empty());
    }

    #[test]
    fn test_mode_parsing() {
        assert_eq!("interleave".parse(), Ok(CombineMode::Interleave));
        assert_eq!("Sequential".parse(), Ok(CombineMode::Sequential));
        assert!("zigzag".parse::<CombineMode>().is_err());
    }
}
