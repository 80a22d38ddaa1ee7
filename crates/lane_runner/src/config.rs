//! Game configuration
//!
//! Every setting has a default, so a config file only needs the values it
//! changes. [`GameConfig::validate`] enforces the preconditions the
//! streaming and spawning code relies on.

use lane_engine::config::{Config, ConfigError};
use lane_engine::foundation::math::{utils::yaw, Transform, Vec3};
use lane_engine::EngineConfig;
use serde::{Deserialize, Serialize};

/// Game configuration
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GameConfig {
    /// Main loop settings
    pub engine: EngineConfig,

    /// Platform streaming settings
    pub streamer: StreamerConfig,

    /// Obstacle spawning settings
    pub spawner: SpawnerConfig,

    /// Runner settings
    pub player: PlayerConfig,

    /// Segment decoration settings
    pub decor: DecorConfig,
}

/// A position + yaw in config form
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Placement {
    /// Position `[x, y, z]`
    pub position: [f32; 3],

    /// Rotation about +y in degrees
    pub yaw_degrees: f32,
}

impl Placement {
    /// Placement at a position with no rotation
    pub fn at(x: f32, y: f32, z: f32) -> Self {
        Self {
            position: [x, y, z],
            yaw_degrees: 0.0,
        }
    }

    /// Convert to a transform
    pub fn to_transform(self) -> Transform {
        Transform::from_position_rotation(Vec3::from(self.position), yaw(self.yaw_degrees))
    }
}

impl Default for Placement {
    fn default() -> Self {
        Self::at(0.0, 0.0, 0.0)
    }
}

/// Marker definition inside a segment blueprint
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MarkerConfig {
    /// Marker name
    pub name: String,

    /// Optional tag, matched when no marker has the requested name
    #[serde(default)]
    pub tag: Option<String>,

    /// Frame relative to the segment
    #[serde(default)]
    pub local: Placement,
}

/// Layout of one platform variant
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SegmentBlueprint {
    /// Variant name, used for entity names
    pub name: String,

    /// Where the next platform attaches; `None` models a broken asset
    #[serde(default)]
    pub attachment: Option<MarkerConfig>,

    /// Static obstacle lane slots (at most three)
    #[serde(default)]
    pub static_slots: Vec<[f32; 3]>,

    /// Score item lane slots
    #[serde(default)]
    pub score_slots: Vec<[f32; 3]>,
}

impl SegmentBlueprint {
    /// Standard straight platform: attachment at the far end, statics at
    /// mid-length and score items further along, one slot per lane
    pub fn straight(name: impl Into<String>, length: f32, lanes: &[f32]) -> Self {
        Self {
            name: name.into(),
            attachment: Some(MarkerConfig {
                name: NEXT_PLATFORM_MARKER.to_string(),
                tag: None,
                local: Placement::at(0.0, 0.0, length),
            }),
            static_slots: lanes.iter().map(|&x| [x, 0.5, length / 3.0]).collect(),
            score_slots: lanes.iter().map(|&x| [x, 1.0, length * 2.0 / 3.0]).collect(),
        }
    }
}

/// Well-known name of the attachment marker
pub const NEXT_PLATFORM_MARKER: &str = "NextPlatformPosition";

/// Platform streaming settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StreamerConfig {
    /// Platform variants, in variant-index order
    pub segments: Vec<SegmentBlueprint>,

    /// Where the first platform goes
    pub start: Placement,

    /// Platforms spawned before the first frame
    pub initial_segment_count: usize,

    /// Pooled platforms per variant
    pub max_pool_size: usize,

    /// Spawn when the runner is closer than this to the newest platform
    pub player_threshold: f32,

    /// Recycle when the runner is this far past a platform's far end
    pub recycle_threshold: f32,

    /// Length of every platform along +z
    pub segment_length: f32,

    /// Marker name (or tag) locating the next attachment point
    pub attachment_marker: String,
}

impl Default for StreamerConfig {
    fn default() -> Self {
        let lanes = DEFAULT_LANES;
        Self {
            segments: ["PlatformA", "PlatformB", "PlatformC", "PlatformD", "PlatformE"]
                .into_iter()
                .map(|name| SegmentBlueprint::straight(name, 30.0, &lanes))
                .collect(),
            start: Placement::default(),
            initial_segment_count: 5,
            max_pool_size: 10,
            player_threshold: 5.0,
            recycle_threshold: 20.0,
            segment_length: 30.0,
            attachment_marker: NEXT_PLATFORM_MARKER.to_string(),
        }
    }
}

const DEFAULT_LANES: [f32; 3] = [-2.0, 0.0, 2.0];

/// Obstacle spawning settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SpawnerConfig {
    /// Obstacle variant names, in variant-index order
    pub obstacle_variants: Vec<String>,

    /// Spawn position for each lane
    pub lane_positions: Vec<[f32; 3]>,

    /// Offset lane positions along +z by the runner's position
    pub follow_player: bool,

    /// Pre-warmed obstacles; live count is capped at twice this
    pub max_pool_size: usize,

    /// Seconds an obstacle stays active
    pub obstacle_lifetime: f64,

    /// Shortest wait between spawn cycles
    pub min_spawn_interval: f64,

    /// Longest wait between spawn cycles
    pub max_spawn_interval: f64,
}

impl Default for SpawnerConfig {
    fn default() -> Self {
        Self {
            obstacle_variants: vec!["Rock".to_string(), "Barrel".to_string(), "Crate".to_string()],
            lane_positions: DEFAULT_LANES.iter().map(|&x| [x, 1.0, 60.0]).collect(),
            follow_player: true,
            max_pool_size: 10,
            obstacle_lifetime: 10.0,
            min_spawn_interval: 1.0,
            max_spawn_interval: 3.0,
        }
    }
}

/// Runner settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PlayerConfig {
    /// Start position
    pub start: Placement,

    /// Units per second along +z
    pub forward_speed: f32,

    /// Distance between adjacent lanes
    pub lane_distance: f32,

    /// Sideways interpolation rate
    pub lerp_speed: f32,

    /// Score items closer than this are picked up
    pub pickup_radius: f32,
}

impl Default for PlayerConfig {
    fn default() -> Self {
        Self {
            start: Placement::at(0.0, 1.0, 0.0),
            forward_speed: 5.0,
            lane_distance: 2.0,
            lerp_speed: 5.0,
            pickup_radius: 1.0,
        }
    }
}

/// A kind of score item
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScoreKind {
    /// Display name
    pub name: String,

    /// Points awarded on pickup
    pub value: u32,
}

/// Segment decoration settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DecorConfig {
    /// Score item kinds, picked uniformly per item
    pub score_kinds: Vec<ScoreKind>,
}

impl Default for DecorConfig {
    fn default() -> Self {
        Self {
            score_kinds: vec![
                ScoreKind {
                    name: "Coin".to_string(),
                    value: 1,
                },
                ScoreKind {
                    name: "Gem".to_string(),
                    value: 5,
                },
            ],
        }
    }
}

impl GameConfig {
    /// Load configuration from file or return default if file doesn't exist
    ///
    /// A file that exists but fails to parse or validate is an error.
    pub fn load_or_default(path: &str) -> Result<Self, ConfigError> {
        match Self::load_from_file(path) {
            Ok(config) => {
                log::info!("Loaded configuration from {path}");
                Ok(config)
            }
            Err(ConfigError::Io(e)) if e.kind() == std::io::ErrorKind::NotFound => {
                log::info!("No configuration at {path}, using defaults");
                Ok(Self::default())
            }
            Err(e) => Err(e),
        }
    }

    /// Check the preconditions of the streaming and spawning code
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.engine.validate()?;

        let streamer = &self.streamer;
        if streamer.segments.is_empty() {
            return invalid("streamer.segments must not be empty");
        }
        if streamer.max_pool_size == 0 {
            return invalid("streamer.max_pool_size must be at least 1");
        }
        if streamer.segment_length.is_nan() || streamer.segment_length <= 0.0 {
            return invalid("streamer.segment_length must be positive");
        }
        if let Some(segment) = streamer.segments.iter().find(|s| s.static_slots.len() > 3) {
            return invalid(&format!(
                "segment {} has {} static slots, at most 3 are supported",
                segment.name,
                segment.static_slots.len()
            ));
        }

        let spawner = &self.spawner;
        if spawner.obstacle_variants.is_empty() {
            return invalid("spawner.obstacle_variants must not be empty");
        }
        if spawner.lane_positions.len() != 3 {
            return invalid(&format!(
                "spawner.lane_positions must list 3 lanes, got {}",
                spawner.lane_positions.len()
            ));
        }
        if spawner.obstacle_lifetime.is_nan() || spawner.obstacle_lifetime <= 0.0 {
            return invalid("spawner.obstacle_lifetime must be positive");
        }
        let interval_ok = spawner.min_spawn_interval > 0.0 && spawner.min_spawn_interval <= spawner.max_spawn_interval;
        if !interval_ok {
            return invalid(&format!(
                "spawn interval [{}, {}] must be positive and ordered",
                spawner.min_spawn_interval, spawner.max_spawn_interval
            ));
        }

        if self.player.lane_distance < 0.0 || self.player.forward_speed < 0.0 {
            return invalid("player speeds and lane distance must not be negative");
        }
        if self.decor.score_kinds.is_empty() && self.streamer.segments.iter().any(|s| !s.score_slots.is_empty()) {
            return invalid("decor.score_kinds must not be empty when segments have score slots");
        }
        Ok(())
    }
}

fn invalid(message: &str) -> Result<(), ConfigError> {
    Err(ConfigError::Invalid(message.to_string()))
}

impl Config for GameConfig {
    fn validate(&self) -> Result<(), ConfigError> {
        GameConfig::validate(self)
    }
}
