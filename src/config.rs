//! Configuration types for LatticeDB.
//!
//! The [`Config`] struct controls a [`StoreCore`](crate::StoreCore)'s
//! behavior: the fixed embedding dimension `D`, HNSW index tuning, and the
//! thresholds that govern automatic-rebuild advice.
//!
//! # Example
//! ```rust
//! use latticedb::{Config, HnswParams};
//!
//! let config = Config::default();
//! assert_eq!(config.dimension, 384);
//!
//! let config = Config {
//!     dimension: 768,
//!     hnsw: HnswParams {
//!         m: 32,
//!         ..HnswParams::default()
//!     },
//!     ..Default::default()
//! };
//! ```

use serde::{Deserialize, Serialize};

use crate::error::ValidationError;

/// Store configuration options.
///
/// All fields have sensible defaults. Use struct update syntax to override
/// specific settings.
#[derive(Clone, Debug, PartialEq)]
pub struct Config {
    /// Fixed embedding dimension `D` for this store. All non-null
    /// embeddings must have exactly this many components.
    ///
    /// Default: 384
    pub dimension: usize,

    /// HNSW vector index parameters. See [`HnswParams`] for tuning
    /// guidelines.
    pub hnsw: HnswParams,

    /// Soft-delete count above which [`StoreCore::should_rebuild`](crate::StoreCore::should_rebuild)
    /// reports true.
    ///
    /// Default: 1000
    pub rebuild_threshold_count: u64,

    /// Soft-delete ratio (deleted / total) above which
    /// [`StoreCore::should_rebuild`](crate::StoreCore::should_rebuild) reports true.
    ///
    /// Default: 0.1
    pub rebuild_threshold_ratio: f64,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            dimension: 384,
            hnsw: HnswParams::default(),
            rebuild_threshold_count: 1000,
            rebuild_threshold_ratio: 0.1,
        }
    }
}

impl Config {
    /// Creates a new `Config` with default settings.
    pub fn new() -> Self {
        Self::default()
    }

    /// Validates the configuration.
    ///
    /// Called automatically by `StoreCore::open()`. Can also be called
    /// explicitly to check configuration before attempting to open.
    ///
    /// # Errors
    /// Returns `ValidationError` if `dimension` is 0, or any HNSW
    /// parameter is 0.
    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.dimension == 0 {
            return Err(ValidationError::invalid_field(
                "dimension",
                "must be greater than 0",
            ));
        }
        if self.hnsw.m == 0 {
            return Err(ValidationError::invalid_field("hnsw.m", "must be greater than 0"));
        }
        if self.hnsw.ef_construction == 0 {
            return Err(ValidationError::invalid_field(
                "hnsw.ef_construction",
                "must be greater than 0",
            ));
        }
        if self.hnsw.ef_search_default == 0 {
            return Err(ValidationError::invalid_field(
                "hnsw.ef_search_default",
                "must be greater than 0",
            ));
        }
        if !(0.0..=1.0).contains(&self.rebuild_threshold_ratio) {
            return Err(ValidationError::invalid_field(
                "rebuild_threshold_ratio",
                "must be between 0.0 and 1.0",
            ));
        }
        Ok(())
    }
}

/// Configuration for the HNSW vector index.
///
/// Controls the trade-off between index build time, memory usage, and
/// search accuracy.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct HnswParams {
    /// Maximum bidirectional connections per node above layer 0.
    ///
    /// Default: 32
    pub m: usize,

    /// Candidate list size tracked during index construction.
    ///
    /// Default: 200
    pub ef_construction: usize,

    /// Default candidate list size used during search when the caller
    /// doesn't override `ef_search` on the request.
    ///
    /// Default: 400
    pub ef_search_default: usize,

    /// Pre-allocated capacity (number of vectors).
    ///
    /// Default: 100,000
    pub expected_capacity: usize,

    /// Fixed seed for the level-assignment RNG, so that graph shape (and
    /// therefore query ordering for tied distances) is reproducible.
    ///
    /// Default: 42
    pub random_seed: u64,
}

impl HnswParams {
    /// `levelFactor = 1 / ln(M)`, used to scale the exponential draw that
    /// assigns each inserted node's top layer.
    #[inline]
    pub fn level_factor(&self) -> f64 {
        1.0 / (self.m as f64).ln()
    }
}

impl Default for HnswParams {
    fn default() -> Self {
        Self {
            m: 32,
            ef_construction: 200,
            ef_search_default: 400,
            expected_capacity: 100_000,
            random_seed: 42,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert_eq!(config.dimension, 384);
        assert_eq!(config.rebuild_threshold_count, 1000);
        assert!((config.rebuild_threshold_ratio - 0.1).abs() < f64::EPSILON);
    }

    #[test]
    fn test_validate_success() {
        assert!(Config::default().validate().is_ok());
    }

    #[test]
    fn test_validate_dimension_zero() {
        let config = Config {
            dimension: 0,
            ..Default::default()
        };
        let err = config.validate().unwrap_err();
        assert!(matches!(err, ValidationError::InvalidField { field, .. } if field == "dimension"));
    }

    #[test]
    fn test_validate_hnsw_zero_m() {
        let config = Config {
            hnsw: HnswParams { m: 0, ..HnswParams::default() },
            ..Default::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_validate_ratio_out_of_range() {
        let config = Config {
            rebuild_threshold_ratio: 1.5,
            ..Default::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_hnsw_defaults_match_spec() {
        let hnsw = HnswParams::default();
        assert_eq!(hnsw.m, 32);
        assert_eq!(hnsw.ef_construction, 200);
        assert_eq!(hnsw.ef_search_default, 400);
        assert_eq!(hnsw.expected_capacity, 100_000);
        assert_eq!(hnsw.random_seed, 42);
    }

    #[test]
    fn test_level_factor() {
        let hnsw = HnswParams::default();
        let expected = 1.0 / (32f64).ln();
        assert!((hnsw.level_factor() - expected).abs() < 1e-12);
    }

    #[test]
    fn test_hnsw_params_serialization() {
        let params = HnswParams::default();
        let bytes = bincode::serialize(&params).unwrap();
        let restored: HnswParams = bincode::deserialize(&bytes).unwrap();
        assert_eq!(params, restored);
    }
}
