//! Raw frame container, normalization, and grayscale reduction.
//!
//! A frame arrives from an external loader as a 2-D (monochrome) or 3-D
//! (color, channel-last) array of real sensor values plus an opaque metadata
//! record. The canonical working form is float in [0, 1]: the global minimum
//! maps to 0.0 and the global maximum to 1.0 across all channels jointly.
//!
//! Per-channel normalization exists only for exporting a human-viewable
//! rendering of a multi-channel source, see [`normalize_channels`].

use ndarray::{Array2, Array3, ArrayView2, Axis};
use serde::{Deserialize, Serialize};

use crate::error::{ReduceError, ReduceResult};

/// Metadata record carried alongside a frame.
///
/// Opaque to the pipeline; preserved so callers can re-export results with
/// provenance (e.g. FITS header cards from the original container).
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FrameMeta {
    entries: Vec<(String, String)>,
}

impl FrameMeta {
    /// Empty metadata record.
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a keyword/value pair.
    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<String>) {
        self.entries.push((key.into(), value.into()));
    }

    /// Look up the first value stored under `key`.
    pub fn get(&self, key: &str) -> Option<&str> {
        self.entries
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    }

    /// Iterate over all keyword/value pairs in insertion order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }
}

/// Pixel data for a frame: monochrome or color (channel-last).
#[derive(Debug, Clone, PartialEq)]
pub enum FrameData {
    /// 2-D monochrome frame (rows, cols).
    Mono(Array2<f32>),
    /// 3-D color frame (rows, cols, 3).
    Color(Array3<f32>),
}

impl FrameData {
    /// Build color frame data, transposing channel-first input if needed.
    ///
    /// FITS loaders commonly deliver color planes as `(3, height, width)`;
    /// when the leading axis is 3 the data is permuted to channel-last
    /// `(height, width, 3)`. Channel-last input passes through unchanged.
    pub fn color(planes: Array3<f32>) -> Self {
        let shape = planes.dim();
        if shape.0 == 3 && shape.2 != 3 {
            let transposed = planes.permuted_axes([1, 2, 0]);
            FrameData::Color(transposed.as_standard_layout().to_owned())
        } else {
            FrameData::Color(planes)
        }
    }

    /// Spatial shape (rows, cols).
    pub fn dim(&self) -> (usize, usize) {
        match self {
            FrameData::Mono(a) => a.dim(),
            FrameData::Color(a) => {
                let (h, w, _) = a.dim();
                (h, w)
            }
        }
    }

    /// Normalize to [0, 1] over all channels jointly.
    ///
    /// A flat frame (global min == max) normalizes to all zeros; the division
    /// is never performed in that case.
    pub fn normalized(&self) -> FrameData {
        match self {
            FrameData::Mono(a) => FrameData::Mono(normalize(&a.view())),
            FrameData::Color(a) => {
                let (min, max) = min_max(a.iter().copied());
                if max <= min {
                    return FrameData::Color(Array3::zeros(a.dim()));
                }
                let span = max - min;
                FrameData::Color(a.mapv(|v| (v - min) / span))
            }
        }
    }

    /// Collapse to a single-channel intensity image.
    ///
    /// Color frames use the unweighted mean over the channel axis. This is
    /// deliberately not a luminance-weighted conversion; star geometry, not
    /// perceptual brightness, drives everything downstream.
    pub fn to_grayscale(&self) -> Array2<f32> {
        match self {
            FrameData::Mono(a) => a.clone(),
            FrameData::Color(a) => {
                a.map_axis(Axis(2), |px| px.iter().sum::<f32>() / px.len() as f32)
            }
        }
    }
}

/// A raw frame: pixel data plus its metadata record.
#[derive(Debug, Clone)]
pub struct RawFrame {
    /// Pixel data.
    pub data: FrameData,
    /// Metadata carried through to output artifacts.
    pub meta: FrameMeta,
}

impl RawFrame {
    /// Frame from pixel data and metadata.
    pub fn new(data: FrameData, meta: FrameMeta) -> Self {
        Self { data, meta }
    }

    /// Monochrome frame with empty metadata.
    pub fn mono(data: Array2<f32>) -> Self {
        Self::new(FrameData::Mono(data), FrameMeta::new())
    }

    /// Color frame with empty metadata; accepts channel-first input.
    pub fn color(planes: Array3<f32>) -> Self {
        Self::new(FrameData::color(planes), FrameMeta::new())
    }
}

fn min_max(values: impl Iterator<Item = f32>) -> (f32, f32) {
    values.fold((f32::INFINITY, f32::NEG_INFINITY), |(lo, hi), v| {
        (lo.min(v), hi.max(v))
    })
}

/// Normalize a 2-D image to [0, 1]: min maps to 0.0, max to 1.0.
///
/// A flat image returns all zeros rather than dividing by zero.
pub fn normalize(image: &ArrayView2<f32>) -> Array2<f32> {
    let (min, max) = min_max(image.iter().copied());
    if max <= min {
        return Array2::zeros(image.dim());
    }
    let span = max - min;
    image.mapv(|v| (v - min) / span)
}

/// Normalize each channel of a color frame independently to [0, 1].
///
/// Used only when exporting a viewable composite of a multi-channel source.
/// A flat channel is an error here, unlike the joint normalization's
/// all-zero policy.
pub fn normalize_channels(image: &Array3<f32>) -> ReduceResult<Array3<f32>> {
    let (h, w, channels) = image.dim();
    let mut out = Array3::zeros((h, w, channels));
    for c in 0..channels {
        let channel = image.index_axis(Axis(2), c);
        let (min, max) = min_max(channel.iter().copied());
        if max <= min {
            return Err(ReduceError::NormalizationDegenerate);
        }
        let span = max - min;
        let mut target = out.index_axis_mut(Axis(2), c);
        target.assign(&channel.mapv(|v| (v - min) / span));
    }
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use ndarray::array;

    #[test]
    fn normalize_spans_unit_interval() {
        let image = array![[2.0_f32, 6.0], [10.0, 4.0]];
        let norm = normalize(&image.view());

        let min = norm.iter().cloned().fold(f32::INFINITY, f32::min);
        let max = norm.iter().cloned().fold(f32::NEG_INFINITY, f32::max);
        assert_relative_eq!(min, 0.0);
        assert_relative_eq!(max, 1.0);
        assert_relative_eq!(norm[[0, 0]], 0.0);
        assert_relative_eq!(norm[[1, 0]], 1.0);
        assert_relative_eq!(norm[[0, 1]], 0.5);
    }

    #[test]
    fn flat_image_normalizes_to_zeros() {
        let image = Array2::from_elem((4, 4), 7.5_f32);
        let norm = normalize(&image.view());
        assert!(norm.iter().all(|&v| v == 0.0));
        assert!(norm.iter().all(|v| v.is_finite()));
    }

    #[test]
    fn channel_first_input_is_transposed() {
        // (3, 2, 4) planes become (2, 4, 3)
        let planes = Array3::from_shape_fn((3, 2, 4), |(c, y, x)| (c * 100 + y * 10 + x) as f32);
        let data = FrameData::color(planes);
        match &data {
            FrameData::Color(a) => {
                assert_eq!(a.dim(), (2, 4, 3));
                assert_eq!(a[[1, 3, 2]], 213.0);
            }
            FrameData::Mono(_) => panic!("expected color data"),
        }
    }

    #[test]
    fn channel_last_input_passes_through() {
        let planes = Array3::from_elem((5, 6, 3), 1.0_f32);
        match FrameData::color(planes) {
            FrameData::Color(a) => assert_eq!(a.dim(), (5, 6, 3)),
            FrameData::Mono(_) => panic!("expected color data"),
        }
    }

    #[test]
    fn grayscale_is_channel_mean() {
        let mut planes = Array3::zeros((2, 2, 3));
        planes[[0, 0, 0]] = 0.3;
        planes[[0, 0, 1]] = 0.6;
        planes[[0, 0, 2]] = 0.9;
        let gray = FrameData::Color(planes).to_grayscale();
        assert_relative_eq!(gray[[0, 0]], 0.6, epsilon = 1e-6);
        assert_relative_eq!(gray[[1, 1]], 0.0);
    }

    #[test]
    fn joint_normalization_shares_one_span() {
        let mut planes = Array3::zeros((1, 2, 3));
        planes[[0, 0, 0]] = 4.0; // global max lives in channel 0
        planes[[0, 1, 1]] = 2.0;
        let norm = FrameData::Color(planes).normalized();
        match norm {
            FrameData::Color(a) => {
                assert_relative_eq!(a[[0, 0, 0]], 1.0);
                assert_relative_eq!(a[[0, 1, 1]], 0.5);
            }
            FrameData::Mono(_) => panic!("expected color data"),
        }
    }

    #[test]
    fn per_channel_normalization_rejects_flat_channel() {
        let mut planes = Array3::zeros((2, 2, 3));
        planes[[0, 0, 0]] = 1.0;
        planes[[0, 0, 1]] = 1.0;
        // channel 2 stays flat
        assert!(matches!(
            normalize_channels(&planes),
            Err(ReduceError::NormalizationDegenerate)
        ));
    }

    #[test]
    fn meta_preserves_insertion_order() {
        let mut meta = FrameMeta::new();
        meta.insert("OBJECT", "M31");
        meta.insert("EXPTIME", "120");
        assert_eq!(meta.get("OBJECT"), Some("M31"));
        assert_eq!(meta.iter().count(), 2);
    }
}
