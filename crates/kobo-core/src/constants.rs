//! Simulation constants and tuning parameters.

/// Simulation tick rate (Hz).
pub const TICK_RATE: u32 = 60;

// --- World ---

/// Side length of the square toroidal playfield in pixels. Power of two.
pub const WORLD_SIZE: i16 = 2048;

/// Partitions per side of the spatial grid. Power of two.
pub const PARTITION_GRID_COUNT: usize = 8;

/// Largest extent of any actor. Bounds the spill of an actor into
/// neighbouring partitions.
pub const MAX_ACTOR_SIZE: i16 = 16;

/// Default sprite extent.
pub const SPRITE_SIZE: i16 = 16;

/// Background cell side in pixels. `WORLD_SIZE / BACKGROUND_CELL_SIZE` must fit a byte.
pub const BACKGROUND_CELL_SIZE: i16 = 16;

/// Sub-images per image group (4-bit index on the wire).
pub const IMAGE_GROUP_SIZE: u8 = 16;

// --- View ---

/// Default viewport width in pixels.
pub const VIEW_WIDTH: i16 = 320;

/// Default viewport height in pixels.
pub const VIEW_HEIGHT: i16 = 240;

/// Camera closes `(N-1)/N` of the gap to its target every tick.
pub const CAMERA_FOLLOW_DIVISOR: i32 = 4;

// --- Movers ---

pub const PLAYER_SPEED: i16 = 2;

pub const PLAYER_MISSILE_SPEED: i16 = 6;

/// Missiles leave the ship this far ahead of its position.
pub const PLAYER_MISSILE_OFFSET: i16 = 16;

pub const ENEMY_SPEED: i16 = 1;

pub const ENEMY_SHOT_SPEED: i16 = 2;

/// Projectiles live `PROJECTILE_RANGE / speed` ticks.
pub const PROJECTILE_RANGE: i32 = 400;

/// Projectiles blink during their final ticks.
pub const PROJECTILE_FLASH_TICKS: i32 = 15;

pub const EXPLOSION_TTL: i32 = 16;

pub const FORTRESS_EXPLOSION_SPEED: i16 = 2;

// --- Enemies ---

/// Distance within which an enemy notices a player.
pub const ENEMY_SENSE_RANGE: i32 = 256;

/// Largest heading change per steering decision, in eighth-turns.
pub const ENEMY_MAX_TURN: i32 = 2;

/// Enemies steer on average once every `relaxed` ticks,
/// `relaxed` in `[ENEMY_RELAXED_MIN, ENEMY_RELAXED_MIN + ENEMY_RELAXED_SPREAD)`.
pub const ENEMY_RELAXED_MIN: u32 = 10;

pub const ENEMY_RELAXED_SPREAD: u32 = 50;

// --- Fortresses ---

/// Ticks between a fortress node being unlinked and its neighbour reacting.
pub const FORTRESS_CHAIN_DELAY: i32 = 2;

/// Fortress grid pitch in pixels.
pub const FORTRESS_CELL_SIZE: i16 = 16;

// --- Scoring ---

pub const SCORE_FORTRESS_CORE: i32 = 100;

pub const SCORE_FORTRESS_DESTRUCTIBLE: i32 = 10;

pub const SCORE_FORTRESS_CHAINED: i32 = 1;

pub const SCORE_ENEMY: i32 = 10;

// --- Round flow ---

pub const STARTING_LIVES: i32 = 3;

/// Ticks between losing a ship and the replacement appearing.
pub const RESPAWN_DELAY_TICKS: u32 = 90;

/// Ticks between the last fortress falling and the next level loading.
pub const LEVEL_CLEAR_DELAY_TICKS: u32 = 120;

/// Player slots. Slot 1 is only active in two-player mode.
pub const MAX_PLAYERS: usize = 2;

// --- Network ---

pub const DEFAULT_PORT: u16 = 12345;

/// Sent by both sides right after connecting.
pub const GREETING: &[u8; 3] = b"HI!";

/// Reader tasks sleep this long when no data is available (ms).
pub const READER_IDLE_SLEEP_MS: u64 = 16;

/// Longest wait for the peer's greeting (ms).
pub const GREETING_TIMEOUT_MS: u64 = 5_000;
