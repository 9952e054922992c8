//! Linear band resampling between two wavelength/bandwidth grids.
//!
//! Each band is modeled as a Gaussian response centered on its wavelength
//! with the given FWHM. The transform is an N2 x N1 weight matrix: for every
//! target band, the source bands whose nominal extents overlap it contribute
//! proportionally to the Gaussian mass both responses place on the overlap,
//! normalized so each defined row sums to one. Target bands with no
//! overlapping source band resolve to NaN rather than zero.

const SQRT_8LOG2: f64 = 2.354_820_045_030_949_3;

/// Sparse resampling matrix from one band model to another.
pub struct BandResampler {
    source_len: usize,
    /// Per target band: (source index, weight) pairs; empty means no overlap.
    rows: Vec<Vec<(usize, f64)>>,
}

impl BandResampler {
    /// Build the transform from bands (`centers1`, `fwhm1`) to bands
    /// (`centers2`, `fwhm2`). Both center sequences must be ascending.
    pub fn new(centers1: &[f64], fwhm1: &[f64], centers2: &[f64], fwhm2: &[f64]) -> Self {
        let bounds1 = band_bounds(centers1, fwhm1);
        let bounds2 = band_bounds(centers2, fwhm2);

        let mut rows = Vec::with_capacity(centers2.len());
        let mut scan_start = 0;

        for (i, target) in bounds2.iter().enumerate() {
            // Source bands are ascending, so the overlap window only moves
            // forward as the target bands do.
            while scan_start < bounds1.len() && bounds1[scan_start].1 <= target.0 {
                scan_start += 1;
            }

            let mut row = Vec::new();
            let mut total = 0.0;
            let mut j = scan_start;
            while j < bounds1.len() && bounds1[j].0 < target.1 {
                let lo = bounds1[j].0.max(target.0);
                let hi = bounds1[j].1.min(target.1);
                if lo < hi {
                    let source_mass = gaussian_mass(centers1[j], fwhm1[j], lo, hi);
                    let target_mass = gaussian_mass(centers2[i], fwhm2[i], lo, hi);
                    let contribution = source_mass * target_mass;
                    if contribution > 0.0 {
                        row.push((j, contribution));
                        total += contribution;
                    }
                }
                j += 1;
            }

            for (_, weight) in &mut row {
                *weight /= total;
            }
            rows.push(row);
        }

        Self {
            source_len: centers1.len(),
            rows,
        }
    }

    /// Number of target bands.
    pub fn target_len(&self) -> usize {
        self.rows.len()
    }

    /// Apply the transform to source band values. NaN source values
    /// propagate into every target band they contribute to; target bands
    /// with no source overlap are NaN.
    pub fn resample(&self, values: &[f64]) -> Vec<f64> {
        debug_assert_eq!(values.len(), self.source_len);

        self.rows
            .iter()
            .map(|row| {
                if row.is_empty() {
                    f64::NAN
                } else {
                    row.iter()
                        .map(|(index, weight)| weight * values[*index])
                        .sum()
                }
            })
            .collect()
    }
}

/// Estimate FWHM bandwidths from the spacing of band centers: boundary bands
/// use the adjacent gap, interior bands half the span of their two
/// neighbors.
pub fn build_fwhm(centers: &[f64]) -> Vec<f64> {
    let n = centers.len();
    if n < 2 {
        return vec![0.0; n];
    }

    let mut fwhm = vec![0.0; n];
    fwhm[0] = centers[1] - centers[0];
    fwhm[n - 1] = centers[n - 1] - centers[n - 2];
    for i in 1..n - 1 {
        fwhm[i] = (centers[i + 1] - centers[i - 1]) / 2.0;
    }
    fwhm
}

/// Nominal extent of each band: center +/- half its FWHM.
fn band_bounds(centers: &[f64], fwhm: &[f64]) -> Vec<(f64, f64)> {
    centers
        .iter()
        .zip(fwhm)
        .map(|(center, width)| (center - width / 2.0, center + width / 2.0))
        .collect()
}

/// Mass a band's Gaussian response places on the interval [lo, hi].
fn gaussian_mass(center: f64, fwhm: f64, lo: f64, hi: f64) -> f64 {
    let sigma = (fwhm / SQRT_8LOG2).max(f64::EPSILON);
    normal_integral((lo - center) / sigma, (hi - center) / sigma)
}

/// Standard normal probability mass on [a, b].
fn normal_integral(a: f64, b: f64) -> f64 {
    const FRAC_1_SQRT_2: f64 = std::f64::consts::FRAC_1_SQRT_2;
    0.5 * (erf(b * FRAC_1_SQRT_2) - erf(a * FRAC_1_SQRT_2))
}

/// Error function, Abramowitz & Stegun 7.1.26 (max error ~1.5e-7).
fn erf(x: f64) -> f64 {
    const A1: f64 = 0.254829592;
    const A2: f64 = -0.284496736;
    const A3: f64 = 1.421413741;
    const A4: f64 = -1.453152027;
    const A5: f64 = 1.061405429;
    const P: f64 = 0.3275911;

    let sign = if x < 0.0 { -1.0 } else { 1.0 };
    let x = x.abs();

    let t = 1.0 / (1.0 + P * x);
    let y = 1.0 - ((((A5 * t + A4) * t + A3) * t + A2) * t + A1) * t * (-x * x).exp();
    sign * y
}
