//! Frame and notification dispatch.
//!
//! The dispatch loop drains the sensor event channel on a dedicated thread,
//! routing pose frames through the transform pipeline and relocalization
//! notifications through the anchor query. Per-frame errors are logged and
//! the frame dropped; only a gone output consumer ends the loop.

use crate::driver::SensorEvent;
use crate::session::{Shared, MAP_ANCHOR_GUID};
use crate::transform;
use crate::types::{
    Frame, Notification, NotificationCategory, Odometry, OutputEvent, PoseSample, PoseStamped,
    TransformStamped,
};
use crate::{Result, VitrackError};
use crossbeam_channel::{Receiver, RecvTimeoutError, Sender, TrySendError};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

/// Emit without blocking the delivery context. A full channel drops the
/// message; a disconnected one ends the dispatch loop.
fn emit(output: &Sender<OutputEvent>, event: OutputEvent) -> Result<()> {
    match output.try_send(event) {
        Ok(()) => Ok(()),
        Err(TrySendError::Full(_)) => {
            log::trace!("output channel full, dropping message");
            Ok(())
        }
        Err(TrySendError::Disconnected(_)) => Err(VitrackError::ChannelDisconnected),
    }
}

/// Classifies incoming frames and converts pose frames into output
/// messages.
pub(crate) struct FrameDispatcher {
    shared: Arc<Mutex<Shared>>,
    output: Sender<OutputEvent>,
}

impl FrameDispatcher {
    pub(crate) fn new(shared: Arc<Mutex<Shared>>, output: Sender<OutputEvent>) -> Self {
        FrameDispatcher { shared, output }
    }

    pub(crate) fn on_frame(&self, frame: Frame) -> Result<()> {
        match frame {
            Frame::Pose(sample) => self.on_pose(sample),
            Frame::Images(set) => {
                // Fisheye decoding happens elsewhere; we only note arrival.
                log::trace!(
                    "fisheye image set at {} ({} frames), not decoded",
                    set.timestamp_us,
                    set.frames.len()
                );
                Ok(())
            }
            // Intentional: frames that are neither pose nor image set carry
            // nothing we publish.
            Frame::Unclassified => Ok(()),
        }
    }

    fn on_pose(&self, sample: PoseSample) -> Result<()> {
        if !sample_is_finite(&sample) {
            log::warn!("dropping malformed pose sample at {}", sample.timestamp_us);
            return Ok(());
        }

        // Snapshot per-frame configuration under the shared lock.
        let (odom_frame, child_frame, publish_odom, publish_tf, position_cov, rotation_cov) = {
            let shared = self.shared.lock().unwrap();
            let c = &shared.config;
            (
                c.odom_frame.clone(),
                c.child_frame.clone(),
                c.publish_odom,
                c.publish_tf,
                c.position_covariance,
                c.rotation_covariance,
            )
        };

        let position = transform::remap_position(sample.translation);
        let orientation = transform::remap_orientation(sample.rotation);

        emit(
            &self.output,
            OutputEvent::Pose(PoseStamped {
                frame_id: odom_frame.clone(),
                timestamp_us: sample.timestamp_us,
                position,
                orientation,
            }),
        )?;

        if publish_tf {
            emit(
                &self.output,
                OutputEvent::Transform(TransformStamped {
                    frame_id: odom_frame.clone(),
                    child_frame_id: child_frame.clone(),
                    timestamp_us: sample.timestamp_us,
                    translation: position,
                    rotation: orientation,
                }),
            )?;
        }

        if publish_odom {
            let out = transform::transform(&sample, position_cov, rotation_cov);
            emit(
                &self.output,
                OutputEvent::Odometry(Odometry {
                    frame_id: odom_frame,
                    child_frame_id: child_frame,
                    timestamp_us: sample.timestamp_us,
                    position: out.position,
                    orientation: out.orientation,
                    linear_velocity: out.linear_velocity,
                    angular_velocity: out.angular_velocity,
                    pose_covariance: out.pose_covariance,
                    twist_covariance: out.twist_covariance,
                }),
            )?;
        }

        Ok(())
    }
}

fn sample_is_finite(sample: &PoseSample) -> bool {
    sample.translation.iter().all(|v| v.is_finite())
        && sample.rotation.iter().all(|v| v.is_finite())
        && sample.velocity.iter().all(|v| v.is_finite())
        && sample.angular_velocity.iter().all(|v| v.is_finite())
}

/// Reacts to relocalization notifications by publishing the reference
/// landmark's pose in the mounted frame.
pub(crate) struct RelocalizationMonitor {
    shared: Arc<Mutex<Shared>>,
    output: Sender<OutputEvent>,
}

impl RelocalizationMonitor {
    pub(crate) fn new(shared: Arc<Mutex<Shared>>, output: Sender<OutputEvent>) -> Self {
        RelocalizationMonitor { shared, output }
    }

    pub(crate) fn on_notification(&self, notification: Notification) -> Result<()> {
        if notification.category != NotificationCategory::PoseRelocalization {
            log::debug!(
                "sensor notification {:?}: {}",
                notification.category,
                notification.description
            );
            return Ok(());
        }

        log::info!("relocalization event detected");

        let (mounted_frame, anchor) = {
            let mut shared = self.shared.lock().unwrap();
            let mounted_frame = shared.config.mounted_frame.clone();
            let anchor = match shared.session.as_mut() {
                Some(session) => session.get_static_node(MAP_ANCHOR_GUID),
                None => Ok(None),
            };
            (mounted_frame, anchor)
        };

        match anchor {
            Ok(Some((translation, rotation))) => emit(
                &self.output,
                OutputEvent::Relocalization(PoseStamped {
                    frame_id: mounted_frame,
                    timestamp_us: notification.timestamp_us,
                    position: transform::remap_position(translation),
                    orientation: transform::remap_orientation(rotation),
                }),
            ),
            Ok(None) => {
                // Expected when no map was ever saved or loaded.
                log::debug!("no map anchor set, skipping relocalization message");
                Ok(())
            }
            Err(e) => {
                log::warn!("map anchor query failed: {e}");
                Ok(())
            }
        }
    }
}

/// Drain sensor events until the stop flag is set or both channel ends go
/// away. Runs on the `vitrack-dispatch` thread.
pub(crate) fn run(
    events: Receiver<SensorEvent>,
    dispatcher: FrameDispatcher,
    monitor: RelocalizationMonitor,
    stop_flag: Arc<AtomicBool>,
) {
    log::info!("dispatch loop started");

    loop {
        if stop_flag.load(Ordering::Relaxed) {
            log::info!("dispatch loop stopping (stop flag set)");
            break;
        }

        // 100ms timeout to periodically check the stop flag.
        let event = match events.recv_timeout(Duration::from_millis(100)) {
            Ok(event) => event,
            Err(RecvTimeoutError::Timeout) => continue,
            Err(RecvTimeoutError::Disconnected) => {
                log::info!("sensor event channel closed, dispatch loop exiting");
                break;
            }
        };

        let result = match event {
            SensorEvent::Frame(frame) => dispatcher.on_frame(frame),
            SensorEvent::Notification(notification) => monitor.on_notification(notification),
        };
        if let Err(e) = result {
            log::info!("output consumer gone ({e}), dispatch loop exiting");
            break;
        }
    }
}
