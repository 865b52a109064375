use nalgebra::DMatrix;

/// Horizontally stack two matrices, appending the columns of `right` to `left`.
///
/// A side without columns takes the row count of the other one.
/// Returns `None` if both sides have columns but their row counts differ.
pub fn hstack(left: &DMatrix<f64>, right: &DMatrix<f64>) -> Option<DMatrix<f64>> {
    if right.ncols() == 0 {
        return Some(left.clone());
    }
    if left.ncols() == 0 {
        return Some(right.clone());
    }
    if left.nrows() != right.nrows() {
        return None;
    }

    let (r, c_left) = (left.nrows(), left.ncols());
    let mut out = DMatrix::zeros(r, c_left + right.ncols());
    out.view_mut((0, 0), (r, c_left)).copy_from(left);
    out.view_mut((0, c_left), (r, right.ncols())).copy_from(right);
    Some(out)
}
