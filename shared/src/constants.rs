/// Payload size above which envelope payloads are compressed before hitting
/// the wire. A static tuning constant, not configurable per message.
pub const COMPRESSION_THRESHOLD_BYTES: usize = 100_000;

/// Fallback radius (in world units) for distance-limited delivery when a
/// property does not specify its own.
pub const DEFAULT_SYNC_DISTANCE: f64 = 3_000.0;
