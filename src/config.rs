//! Session configuration and live parameter updates.

use crate::driver::StreamSelection;

/// Full configuration surface of a tracking camera session.
///
/// Set at construction, mutable afterwards through [`ParamUpdate`]s applied
/// under the shared session lock. Per-frame readers (frame ids, covariance
/// bases, publish flags) snapshot values under the same lock; device and
/// stream selection fields only take effect at the next `configure()` cycle.
#[derive(Debug, Clone)]
pub struct SessionConfig {
    /// Issue a hardware reset to the chosen device during configure.
    pub hardware_reset: bool,
    /// Device serial filter; empty matches any device.
    pub serial_number: String,
    pub enable_fisheye_streams: bool,
    pub enable_pose_stream: bool,
    pub enable_mapping: bool,
    pub enable_dynamic_calibration: bool,
    pub enable_relocalization: bool,
    pub enable_pose_jumping: bool,
    pub enable_map_preservation: bool,
    pub publish_odom: bool,
    pub publish_tf: bool,
    pub odom_frame: String,
    pub child_frame: String,
    /// Frame id used for relocalization anchor poses.
    pub mounted_frame: String,
    /// Base scale for position/linear covariance diagonal entries.
    pub position_covariance: f64,
    /// Base scale for rotation/angular covariance diagonal entries.
    pub rotation_covariance: f64,
}

impl Default for SessionConfig {
    fn default() -> SessionConfig {
        SessionConfig {
            hardware_reset: true,
            serial_number: String::new(),
            enable_fisheye_streams: true,
            enable_pose_stream: true,
            enable_mapping: true,
            enable_dynamic_calibration: true,
            enable_relocalization: true,
            enable_pose_jumping: true,
            enable_map_preservation: false,
            publish_odom: true,
            publish_tf: false,
            odom_frame: "odom".into(),
            child_frame: "base_link".into(),
            mounted_frame: "camera_link".into(),
            position_covariance: 0.1,
            rotation_covariance: 0.1,
        }
    }
}

impl SessionConfig {
    /// Stream selection derived from the enable flags.
    pub fn stream_selection(&self) -> StreamSelection {
        StreamSelection {
            pose: self.enable_pose_stream,
            fisheye: self.enable_fisheye_streams,
        }
    }

    /// Apply one live parameter update.
    pub fn apply(&mut self, update: ParamUpdate) {
        log::debug!("parameter update: {:?}", update);
        match update {
            ParamUpdate::HardwareReset(v) => self.hardware_reset = v,
            ParamUpdate::SerialNumber(v) => self.serial_number = v,
            ParamUpdate::EnableFisheyeStreams(v) => self.enable_fisheye_streams = v,
            ParamUpdate::EnablePoseStream(v) => self.enable_pose_stream = v,
            ParamUpdate::EnableMapping(v) => self.enable_mapping = v,
            ParamUpdate::EnableDynamicCalibration(v) => self.enable_dynamic_calibration = v,
            ParamUpdate::EnableRelocalization(v) => self.enable_relocalization = v,
            ParamUpdate::EnablePoseJumping(v) => self.enable_pose_jumping = v,
            ParamUpdate::EnableMapPreservation(v) => self.enable_map_preservation = v,
            ParamUpdate::PublishOdom(v) => self.publish_odom = v,
            ParamUpdate::PublishTf(v) => self.publish_tf = v,
            ParamUpdate::OdomFrame(v) => self.odom_frame = v,
            ParamUpdate::ChildFrame(v) => self.child_frame = v,
            ParamUpdate::MountedFrame(v) => self.mounted_frame = v,
            ParamUpdate::PositionCovariance(v) => self.position_covariance = v,
            ParamUpdate::RotationCovariance(v) => self.rotation_covariance = v,
        }
    }
}

/// One field change issued by an external reconfiguration channel.
#[derive(Debug, Clone)]
pub enum ParamUpdate {
    HardwareReset(bool),
    SerialNumber(String),
    EnableFisheyeStreams(bool),
    EnablePoseStream(bool),
    EnableMapping(bool),
    EnableDynamicCalibration(bool),
    EnableRelocalization(bool),
    EnablePoseJumping(bool),
    EnableMapPreservation(bool),
    PublishOdom(bool),
    PublishTf(bool),
    OdomFrame(String),
    ChildFrame(String),
    MountedFrame(String),
    PositionCovariance(f64),
    RotationCovariance(f64),
}
