use crate::types::FeatureMatch;

/// Counts matches whose distance does not exceed `distance_threshold`.
///
/// Sorts the set ascending by distance, then counts the prefix up to the
/// first match above the threshold. Equivalent to filtering the whole set;
/// the sorted form is what the downstream diagnostics expect to see.
pub fn count_good_matches(matches: &mut [FeatureMatch], distance_threshold: f32) -> usize {
    matches.sort_by(|a, b| a.distance.total_cmp(&b.distance));
    matches
        .iter()
        .take_while(|m| m.distance <= distance_threshold)
        .count()
}
