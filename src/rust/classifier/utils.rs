use ndarray::{Array2, ArrayView1, Axis};

/// Row-wise softmax. Each row is shifted by its maximum before exponentiation.
pub(crate) fn softmax(logits: &Array2<f32>) -> Array2<f32> {
    let mut out = logits.clone();
    for mut row in out.axis_iter_mut(Axis(0)) {
        let max = row.iter().cloned().fold(f32::NEG_INFINITY, f32::max);
        row.mapv_inplace(|x| (x - max).exp());
        let sum = row.sum();
        row.mapv_inplace(|x| x / sum);
    }
    out
}

pub(crate) fn relu(z: &Array2<f32>) -> Array2<f32> {
    z.mapv(|x| x.max(0.0))
}

/// Index of the largest value; the first one wins on ties.
pub(crate) fn argmax(values: ArrayView1<f32>) -> usize {
    values
        .iter()
        .enumerate()
        .fold((0, f32::NEG_INFINITY), |best, (i, &v)| if v > best.1 { (i, v) } else { best })
        .0
}
