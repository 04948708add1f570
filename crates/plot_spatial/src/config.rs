//! Configuration system

pub use serde::{Deserialize, Serialize};

/// Configuration trait
pub trait Config: Serialize + for<'de> Deserialize<'de> + Default {
    /// Load configuration from file
    fn load_from_file(path: &str) -> Result<Self, ConfigError> {
        let contents = std::fs::read_to_string(path).map_err(ConfigError::Io)?;

        // Try different formats
        if path.ends_with(".toml") {
            toml::from_str(&contents).map_err(|e| ConfigError::Parse(e.to_string()))
        } else if path.ends_with(".ron") {
            ron::from_str(&contents).map_err(|e| ConfigError::Parse(e.to_string()))
        } else {
            Err(ConfigError::UnsupportedFormat(path.to_string()))
        }
    }

    /// Save configuration to file
    fn save_to_file(&self, path: &str) -> Result<(), ConfigError> {
        let contents = if path.ends_with(".toml") {
            toml::to_string_pretty(self).map_err(|e| ConfigError::Serialize(e.to_string()))?
        } else if path.ends_with(".ron") {
            ron::ser::to_string_pretty(self, Default::default())
                .map_err(|e| ConfigError::Serialize(e.to_string()))?
        } else {
            return Err(ConfigError::UnsupportedFormat(path.to_string()));
        };

        std::fs::write(path, contents).map_err(ConfigError::Io)
    }
}

/// Configuration errors
#[derive(thiserror::Error, Debug)]
pub enum ConfigError {
    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Parse error
    #[error("Parse error: {0}")]
    Parse(String),

    /// Serialization error
    #[error("Serialization error: {0}")]
    Serialize(String),

    /// Unsupported format
    #[error("Unsupported format: {0}")]
    UnsupportedFormat(String),

    /// `max_depth` must allow at least the root level
    #[error("max_depth must be at least 1, got 0")]
    ZeroMaxDepth,

    /// Leaf capacity must admit at least one entity
    #[error("max_entities_per_leaf must be at least 1, got 0")]
    ZeroLeafCapacity,

    /// Tolerances are distances and cannot be negative
    #[error("{name} must be non-negative, got {value}")]
    NegativeTolerance {
        /// Name of the offending field
        name: &'static str,
        /// The rejected value
        value: f64,
    },
}

/// Tuning knobs for tree construction and ray queries
///
/// An immutable value passed at construction; changing configuration on a
/// live index invalidates the built tree (see
/// [`SpatialIndex::set_config`](crate::spatial::SpatialIndex::set_config)).
///
/// The `enable_caching`/`cache_size` fields are reserved surface for a
/// query-result cache in a higher layer; the trees themselves never cache.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SpatialIndexConfig {
    /// Maximum subdivision depth; at this depth entities accumulate in the
    /// node's local list regardless of capacity
    pub max_depth: u32,

    /// Maximum entities per leaf before subdivision
    pub max_entities_per_leaf: usize,

    /// Perpendicular distance within which a ray counts an entity as hit
    pub ray_intersection_tolerance: f64,

    /// Tighter distance classifying a ray hit as direct
    pub point_query_tolerance: f64,

    /// Reserved: whether a higher layer should cache query results
    pub enable_caching: bool,

    /// Reserved: capacity of the higher-layer query cache
    pub cache_size: usize,
}

impl Default for SpatialIndexConfig {
    fn default() -> Self {
        Self {
            max_depth: 8,
            max_entities_per_leaf: 8,
            ray_intersection_tolerance: 5.0,
            point_query_tolerance: 1.0,
            enable_caching: false,
            cache_size: 128,
        }
    }
}

impl SpatialIndexConfig {
    /// Validate the configuration
    ///
    /// Rejected at construction time rather than surfacing later as
    /// degenerate trees or queries.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.max_depth == 0 {
            return Err(ConfigError::ZeroMaxDepth);
        }
        if self.max_entities_per_leaf == 0 {
            return Err(ConfigError::ZeroLeafCapacity);
        }
        if self.ray_intersection_tolerance < 0.0 {
            return Err(ConfigError::NegativeTolerance {
                name: "ray_intersection_tolerance",
                value: self.ray_intersection_tolerance,
            });
        }
        if self.point_query_tolerance < 0.0 {
            return Err(ConfigError::NegativeTolerance {
                name: "point_query_tolerance",
                value: self.point_query_tolerance,
            });
        }
        Ok(())
    }
}

impl Config for SpatialIndexConfig {}
