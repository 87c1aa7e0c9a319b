use std::collections::BTreeMap;

/// Merges two record sets by key. Remote entries go in first and local
/// entries overwrite them on collision. Output is ordered by key.
pub fn merge_prefer_local<T, K, F>(remote: Vec<T>, local: Vec<T>, key: F) -> Vec<T>
where
    K: Ord,
    F: Fn(&T) -> K,
{
    let mut merged = BTreeMap::new();
    for item in remote.into_iter().chain(local) {
        merged.insert(key(&item), item);
    }
    merged.into_values().collect()
}
