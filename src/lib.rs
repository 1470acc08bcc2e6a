//! SSVEP frequency classification.
//!
//! Given a fixed-length multichannel EEG segment and a set of candidate
//! flicker frequencies, decide which frequency the user attends to:
//!
//! - [`CcaClassifier`] scores each target by canonical correlation against
//!   synthetic sine/cosine references, stacked or per harmonic
//! - [`FbccaClassifier`] runs the same scoring on a bank of band-passed
//!   copies of the segment and fuses the sub-band scores
//! - [`SnrEstimator`] reports a Welch-based SNR at each target
//!
//! ```
//! use ssvepcore::{CcaClassifier, ClassifierConfig, EegSegment, SsvepClassifier};
//!
//! let fs = 250.0;
//! let n = 500;
//! let tone: Vec<f64> = (0..n)
//!     .map(|i| (2.0 * core::f64::consts::PI * 15.0 * i as f64 / fs).sin())
//!     .collect();
//!
//! let config = ClassifierConfig::new([10.0, 12.0, 15.0], [1, 2, 3], fs, n);
//! let result = CcaClassifier::new(config)
//!     .classify(&EegSegment::replicate(&tone, 2))
//!     .unwrap();
//! assert_eq!(result.frequency, Some(15.0));
//! ```
//!
//! Enable the `parallel` feature to score targets and sub-bands on rayon,
//! and `serde` to (de)serialize configuration types.

pub mod cca;
pub mod classifier;
pub mod config;
pub mod error;
pub mod fbcca;
pub mod filter;
pub mod linalg;
mod parallel;
pub mod preprocess;
pub mod reference;
pub mod segment;
pub mod snr;
pub mod stats;
pub mod welch;
pub mod window;

pub use classifier::{CcaClassifier, Classification, SsvepClassifier};
pub use config::{ClassifierConfig, FilterBankConfig, ScoringMode};
pub use error::{Result, SsvepError};
pub use fbcca::FbccaClassifier;
pub use preprocess::{channel_features, ChannelFeatures, Preprocessor};
pub use reference::{ReferenceSet, ReferenceShape, ReferenceSignal};
pub use segment::EegSegment;
pub use snr::{ChannelCombine, SnrConfig, SnrEstimator, SnrResult};
pub use stats::OnlineStats;
pub use welch::{PowerSpectrum, Welch};
