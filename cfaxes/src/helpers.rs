use ndarray::ArrayView1;
use num_traits::Float;

use crate::errors::{Error, Result};

/// Position of the first label exactly equal to `label`.
///
pub fn label_index<N>(labels: ArrayView1<N>, label: N) -> Option<usize>
where
    N: Float,
{
    labels.iter().position(|value| *value == label)
}

/// Positions of the labels falling inside an inclusive label range.
///
/// Bounds follow the direction of the labels, so on descending labels (pressure levels, for
/// instance) `start` is the larger bound. `step` is a positional stride applied to the
/// selected positions and must be a positive whole number.
///
pub fn slice_indices<N>(
    labels: ArrayView1<N>,
    start: Option<N>,
    stop: Option<N>,
    step: Option<N>,
) -> Result<Vec<usize>>
where
    N: Float,
{
    let stride = match step {
        None => 1,
        Some(step) => {
            if step <= N::zero() || step.fract() != N::zero() {
                return Err(Error::InvalidStep(step.to_f64().unwrap_or(f64::NAN)));
            }
            step.to_usize().ok_or(Error::InvalidStep(step.to_f64().unwrap_or(f64::NAN)))?
        }
    };

    let descending = labels.len() > 1 && labels[0] > labels[labels.len() - 1];
    let (lower, upper) = if descending {
        (stop, start)
    } else {
        (start, stop)
    };

    let indices = labels
        .iter()
        .enumerate()
        .filter(|(_, value)| {
            lower.map_or(true, |lower| **value >= lower) && upper.map_or(true, |upper| **value <= upper)
        })
        .map(|(index, _)| index)
        .step_by(stride)
        .collect();

    Ok(indices)
}
