/// Computes the arithmetic mean of a slice of values. Returns `None` for empty input.
///
/// Values are summed in ascending order so the result is identical for any
/// permutation of the input.
pub fn mean(values: &[f64]) -> Option<f64> {
    if values.is_empty() {
        return None;
    }
    let mut sorted = values.to_vec();
    sorted.sort_by(f64::total_cmp);
    Some(sorted.iter().sum::<f64>() / sorted.len() as f64)
}
