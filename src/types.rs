//! Sample, frame, and message types shared across the session layer.
//!
//! Vectors are `[x, y, z]` and quaternions `[qx, qy, qz, qw]` throughout.

bitflags::bitflags! {
    /// Capability bitmap reported by a tracking device.
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub struct Capabilities: u32 {
        const POSE           = 1 << 0;
        const FISHEYE        = 1 << 1;
        const MAPPING        = 1 << 2;
        const RELOCALIZATION = 1 << 3;
        const WHEEL_ODOMETRY = 1 << 4;
    }
}

/// Identification and capabilities of an enumerated tracking device.
#[derive(Debug, Clone)]
pub struct DeviceDescriptor {
    pub serial: String,
    pub firmware: String,
    pub physical_port: String,
    pub product_id: u16,
    pub capabilities: Capabilities,
}

/// Sensor-reported quality of the current pose estimate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum TrackerConfidence {
    Failed = 0,
    Low = 1,
    Medium = 2,
    High = 3,
}

impl TrackerConfidence {
    /// Map a raw confidence byte to a level; out-of-range values saturate to High.
    pub fn from_raw(raw: u8) -> TrackerConfidence {
        match raw {
            0 => TrackerConfidence::Failed,
            1 => TrackerConfidence::Low,
            2 => TrackerConfidence::Medium,
            _ => TrackerConfidence::High,
        }
    }

    /// Ordinal level 0..=3 as used by the covariance scaling exponents.
    pub fn level(self) -> i32 {
        self as i32
    }
}

/// One 6DOF measurement from the tracking sensor, in its native frame.
#[derive(Debug, Clone, Copy)]
pub struct PoseSample {
    /// Sensor timestamp in microseconds.
    pub timestamp_us: u64,
    /// Translation in meters.
    pub translation: [f64; 3],
    /// Orientation quaternion [qx, qy, qz, qw].
    pub rotation: [f64; 4],
    /// Linear velocity in m/s.
    pub velocity: [f64; 3],
    /// Angular velocity in rad/s.
    pub angular_velocity: [f64; 3],
    pub confidence: TrackerConfidence,
}

/// One undecoded fisheye image.
#[derive(Debug, Clone)]
pub struct FisheyeFrame {
    /// Sensor index (1 = left, 2 = right).
    pub index: u8,
    pub width: u32,
    pub height: u32,
    pub data: Vec<u8>,
}

/// A set of fisheye images delivered together.
#[derive(Debug, Clone)]
pub struct ImageSet {
    pub timestamp_us: u64,
    pub frames: Vec<FisheyeFrame>,
}

/// A frame delivered by the streaming session.
#[derive(Debug, Clone)]
pub enum Frame {
    Pose(PoseSample),
    Images(ImageSet),
    /// Anything the driver could not classify. Ignored by the dispatcher.
    Unclassified,
}

/// Category of an out-of-band sensor notification.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NotificationCategory {
    FramesTimeout,
    FrameCorrupted,
    HardwareError,
    HardwareEvent,
    PoseRelocalization,
    UnknownError,
}

/// Out-of-band notification raised by the sensor.
#[derive(Debug, Clone)]
pub struct Notification {
    pub category: NotificationCategory,
    pub timestamp_us: u64,
    pub description: String,
}

/// Pose in a named frame.
#[derive(Debug, Clone)]
pub struct PoseStamped {
    pub frame_id: String,
    pub timestamp_us: u64,
    pub position: [f64; 3],
    pub orientation: [f64; 4],
}

/// Transform between a parent and a child frame.
#[derive(Debug, Clone)]
pub struct TransformStamped {
    pub frame_id: String,
    pub child_frame_id: String,
    pub timestamp_us: u64,
    pub translation: [f64; 3],
    pub rotation: [f64; 4],
}

/// Odometry estimate: pose in the odom frame, twist in the child frame.
///
/// Covariance matrices are row-major 6x6, translation/linear terms first.
#[derive(Debug, Clone)]
pub struct Odometry {
    pub frame_id: String,
    pub child_frame_id: String,
    pub timestamp_us: u64,
    pub position: [f64; 3],
    pub orientation: [f64; 4],
    pub linear_velocity: [f64; 3],
    pub angular_velocity: [f64; 3],
    pub pose_covariance: [f64; 36],
    pub twist_covariance: [f64; 36],
}

/// Messages emitted by the session layer, consumed by external transport.
#[derive(Debug, Clone)]
pub enum OutputEvent {
    Pose(PoseStamped),
    Odometry(Odometry),
    Transform(TransformStamped),
    Relocalization(PoseStamped),
}
