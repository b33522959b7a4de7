// Min-max normalization for metric columns.
//
// Bounds are computed over the values that are actually present in a column;
// missing entries neither move the bounds nor receive a normalized value.
// A column whose observed range collapses to a point carries no signal, so
// every present value normalizes to 0.0 rather than dividing by zero.

/// Spread below this is treated as a degenerate (constant) column.
pub const RANGE_EPSILON: f64 = 1e-9;

/// Observed min/max of one metric column.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MetricBounds {
    pub lo: f64,
    pub hi: f64,
}

impl MetricBounds {
    /// True when the column has no usable spread.
    pub fn is_degenerate(&self) -> bool {
        (self.hi - self.lo).abs() < RANGE_EPSILON
    }
}

/// Bounds over the present values in a column, or `None` when the column is
/// entirely missing.
pub fn column_bounds<'a, I>(values: I) -> Option<MetricBounds>
where
    I: IntoIterator<Item = &'a Option<f64>>,
{
    let mut bounds: Option<MetricBounds> = None;
    for v in values.into_iter().flatten() {
        bounds = Some(match bounds {
            None => MetricBounds { lo: *v, hi: *v },
            Some(b) => MetricBounds {
                lo: b.lo.min(*v),
                hi: b.hi.max(*v),
            },
        });
    }
    bounds
}

/// Scale one value into [0, 1] against the column bounds. Degenerate bounds
/// map every value to 0.0.
pub fn normalize(value: f64, bounds: MetricBounds) -> f64 {
    if bounds.is_degenerate() {
        return 0.0;
    }
    (value - bounds.lo) / (bounds.hi - bounds.lo)
}

/// Normalize a whole column, preserving missing entries.
pub fn normalize_column(values: &[Option<f64>]) -> Vec<Option<f64>> {
    match column_bounds(values.iter()) {
        Some(bounds) => values
            .iter()
            .map(|v| v.map(|x| normalize(x, bounds)))
            .collect(),
        None => vec![None; values.len()],
    }
}
