//! Smoothing

/// Creates a normalized gaussian kernel.
///
/// The kernel spans `-size/2..=size/2`, so even sizes are rounded up.
#[must_use]
pub fn gaussian_kernel(size: usize, sigma: f64) -> Vec<f64> {
	let half = (size / 2) as i64;
	let kernel = (-half..=half)
		.map(|x| (-(x as f64).powi(2) / (2.0 * sigma.powi(2))).exp())
		.collect::<Vec<_>>();

	let sum = kernel.iter().sum::<f64>();
	kernel.into_iter().map(|value| value / sum).collect()
}

/// Convolves `data` with `kernel`, keeping the central `max(len)` values
#[must_use]
pub fn convolve_same(data: &[f64], kernel: &[f64]) -> Vec<f64> {
	if data.is_empty() || kernel.is_empty() {
		return vec![];
	}

	let len = data.len().max(kernel.len());
	let offset = (data.len().min(kernel.len()) - 1) / 2;

	(offset..offset + len)
		.map(|k| {
			// Note: `j` must satisfy `j < data.len()` and `k - j < kernel.len()`
			let start = (k + 1).saturating_sub(kernel.len());
			let end = (k + 1).min(data.len());
			(start..end).map(|j| data[j] * kernel[k - j]).sum::<f64>()
		})
		.collect()
}

/// Smooths a series with a gaussian kernel of at most `max_size`.
///
/// Series too short to smooth are returned as-is.
#[must_use]
pub fn smooth(data: &[f64], max_size: usize, sigma: f64) -> Vec<f64> {
	let size = max_size.min(data.len().saturating_sub(1));
	if size == 0 {
		return data.to_vec();
	}

	self::convolve_same(data, &self::gaussian_kernel(size, sigma))
}

#[cfg(test)]
mod tests {
	use super::*;

	fn assert_close(lhs: &[f64], rhs: &[f64]) {
		assert_eq!(lhs.len(), rhs.len(), "{lhs:?} != {rhs:?}");
		for (lhs, rhs) in lhs.iter().zip(rhs) {
			assert!((lhs - rhs).abs() < 1e-9, "{lhs} != {rhs}");
		}
	}

	#[test]
	fn kernel_is_normalized_and_symmetric() {
		let kernel = gaussian_kernel(31, 5.0);
		assert_eq!(kernel.len(), 31);
		assert!((kernel.iter().sum::<f64>() - 1.0).abs() < 1e-12);
		assert!(kernel.iter().zip(kernel.iter().rev()).all(|(lhs, rhs)| lhs == rhs));
		assert!(kernel[15] > kernel[14]);

		assert_eq!(gaussian_kernel(4, 1.0).len(), 5);
	}

	#[test]
	fn convolution_keeps_center() {
		assert_close(&convolve_same(&[1.0, 2.0, 3.0], &[0.0, 1.0, 0.5]), &[1.0, 2.5, 4.0]);
		assert_close(&convolve_same(&[1.0, 2.0], &[1.0, 1.0, 1.0]), &[1.0, 3.0, 3.0]);
		assert_close(&convolve_same(&[1.0, 2.0, 3.0, 4.0], &[1.0, 2.0]), &[1.0, 4.0, 7.0, 10.0]);
		assert!(convolve_same(&[], &[1.0]).is_empty());
	}

	#[test]
	fn smoothing_preserves_constant_interior() {
		let data = vec![2.0; 64];
		let smoothed = smooth(&data, 31, 5.0);
		assert_eq!(smoothed.len(), data.len());
		assert!((smoothed[32] - 2.0).abs() < 1e-9);
		assert_eq!(smooth(&[7.0], 31, 5.0), [7.0]);
	}
}
