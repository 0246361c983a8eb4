//! Session lifecycle state machine.
//!
//! [`SessionController`] owns the driver and session handles and sequences
//! configure -> start -> stop -> cleanup, guarding map import/export against
//! concurrent streaming. Frames and notifications are drained by a
//! background dispatch thread; all three entry points (frames,
//! notifications, lifecycle operations) serialize on one shared mutex.

use crate::config::{ParamUpdate, SessionConfig};
use crate::dispatch::{self, FrameDispatcher, RelocalizationMonitor};
use crate::driver::{SensorOption, TrackingDriver, TrackingSession};
use crate::types::{Capabilities, OutputEvent};
use crate::{map_store, Result, VitrackError};
use crossbeam_channel::{Receiver, Sender};
use std::path::Path;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};

/// GUID of the reference landmark written into every saved map. A freshly
/// saved map always carries this anchor at the identity pose, giving a
/// reloaded map a known pose to relocalize against.
pub const MAP_ANCHOR_GUID: &str = "map_anchor";

const IDENTITY_TRANSLATION: [f64; 3] = [0.0, 0.0, 0.0];
const IDENTITY_ROTATION: [f64; 4] = [0.0, 0.0, 0.0, 1.0];

/// Where the session is in its lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    Unconfigured,
    Configured,
    Streaming,
    Stopped,
    /// Resources released; reconfigure from scratch to continue.
    Cleaned,
}

/// State shared between the controller, the dispatch thread, and live
/// parameter updates: one mutual-exclusion domain for the configuration
/// fields read per-frame and the session handle.
pub(crate) struct Shared {
    pub(crate) config: SessionConfig,
    pub(crate) session: Option<Box<dyn TrackingSession>>,
}

/// Handle for applying live parameter updates from an independent channel.
#[derive(Clone)]
pub struct ConfigHandle {
    shared: Arc<Mutex<Shared>>,
}

impl ConfigHandle {
    pub fn apply(&self, update: ParamUpdate) {
        self.shared.lock().unwrap().config.apply(update);
    }

    /// Clone of the current effective configuration.
    pub fn snapshot(&self) -> SessionConfig {
        self.shared.lock().unwrap().config.clone()
    }
}

struct DispatchWorker {
    stop_flag: Arc<AtomicBool>,
    thread: Option<std::thread::JoinHandle<()>>,
}

impl DispatchWorker {
    fn shutdown(&mut self) {
        self.stop_flag.store(true, Ordering::Relaxed);
        if let Some(thread) = self.thread.take() {
            let _ = thread.join();
        }
    }
}

/// Owns the device/session lifecycle.
pub struct SessionController {
    driver: Box<dyn TrackingDriver>,
    shared: Arc<Mutex<Shared>>,
    state: SessionState,
    output: Sender<OutputEvent>,
    worker: Option<DispatchWorker>,
}

impl SessionController {
    /// Create a controller around a driver. Returns the controller and the
    /// channel on which output messages are emitted.
    pub fn new(
        driver: Box<dyn TrackingDriver>,
        config: SessionConfig,
    ) -> (SessionController, Receiver<OutputEvent>) {
        let (output, messages) = crossbeam_channel::bounded(256);
        let controller = SessionController {
            driver,
            shared: Arc::new(Mutex::new(Shared {
                config,
                session: None,
            })),
            state: SessionState::Unconfigured,
            output,
            worker: None,
        };
        (controller, messages)
    }

    pub fn state(&self) -> SessionState {
        self.state
    }

    /// Handle for live parameter updates. Device and stream-selection
    /// fields apply lazily at the next `configure()` cycle.
    pub fn config_handle(&self) -> ConfigHandle {
        ConfigHandle {
            shared: self.shared.clone(),
        }
    }

    /// Enumerate devices, pick the first one matching the serial filter,
    /// resolve a session, and push the sensor options.
    ///
    /// Fails with `DeviceNotFound` when no device matches; the session then
    /// stays in its previous state and no stream can start.
    pub fn configure(&mut self) -> Result<()> {
        if self.state == SessionState::Streaming {
            return Err(VitrackError::InvalidStateTransition {
                operation: "configure",
                state: self.state,
            });
        }

        let devices = self.driver.enumerate()?;
        let mut shared = self.shared.lock().unwrap();

        let mut chosen = None;
        for device in devices {
            log::info!(
                "tracking device detected: serial={} fw={} port={} product=0x{:04x}",
                device.serial,
                device.firmware,
                device.physical_port,
                device.product_id
            );
            if chosen.is_none()
                && (shared.config.serial_number.is_empty()
                    || shared.config.serial_number == device.serial)
            {
                chosen = Some(device);
            }
        }
        let device = chosen
            .ok_or_else(|| VitrackError::DeviceNotFound(shared.config.serial_number.clone()))?;

        log::info!("connecting to device with serial number {}", device.serial);
        shared.config.serial_number = device.serial.clone();

        if shared.config.hardware_reset {
            self.driver.hardware_reset(&device.serial)?;
            log::info!("hardware reset issued");
        }

        // Pose jumping and relocalization both need the internal map;
        // auto-correct the conflict instead of failing.
        if !shared.config.enable_mapping
            && (shared.config.enable_pose_jumping || shared.config.enable_relocalization)
        {
            log::warn!(
                "mapping disabled conflicts with pose jumping/relocalization; forcing both off"
            );
            shared.config.enable_pose_jumping = false;
            shared.config.enable_relocalization = false;
        }

        let streams = shared.config.stream_selection();
        if streams.pose && !device.capabilities.contains(Capabilities::POSE) {
            log::warn!("device {} does not report a pose stream", device.serial);
        }

        let mut session = self.driver.resolve(&device.serial, streams)?;
        session.set_option(SensorOption::Mapping, shared.config.enable_mapping)?;
        session.set_option(SensorOption::PoseJumping, shared.config.enable_pose_jumping)?;
        session.set_option(
            SensorOption::Relocalization,
            shared.config.enable_relocalization,
        )?;
        session.set_option(
            SensorOption::DynamicCalibration,
            shared.config.enable_dynamic_calibration,
        )?;
        session.set_option(
            SensorOption::MapPreservation,
            shared.config.enable_map_preservation,
        )?;
        shared.session = Some(session);
        drop(shared);

        self.state = SessionState::Configured;
        Ok(())
    }

    /// Begin asynchronous frame and notification delivery.
    ///
    /// Valid from Configured or Stopped. Calling start while already
    /// Streaming is an `InvalidStateTransition` error.
    pub fn start(&mut self) -> Result<()> {
        match self.state {
            SessionState::Configured | SessionState::Stopped => {}
            state => {
                return Err(VitrackError::InvalidStateTransition {
                    operation: "start",
                    state,
                })
            }
        }

        let events = {
            let mut shared = self.shared.lock().unwrap();
            let session = shared
                .session
                .as_mut()
                .ok_or_else(|| VitrackError::Driver("no resolved session".into()))?;
            session.start()?
        };

        let stop_flag = Arc::new(AtomicBool::new(false));
        let dispatcher = FrameDispatcher::new(self.shared.clone(), self.output.clone());
        let monitor = RelocalizationMonitor::new(self.shared.clone(), self.output.clone());
        let stop_clone = stop_flag.clone();
        let thread = std::thread::Builder::new()
            .name("vitrack-dispatch".into())
            .spawn(move || dispatch::run(events, dispatcher, monitor, stop_clone))
            .map_err(|e| VitrackError::Driver(format!("failed to spawn dispatch thread: {e}")))?;

        self.worker = Some(DispatchWorker {
            stop_flag,
            thread: Some(thread),
        });
        self.state = SessionState::Streaming;
        Ok(())
    }

    /// Halt frame and notification delivery. Idempotent from Stopped.
    pub fn stop(&mut self) -> Result<()> {
        match self.state {
            SessionState::Streaming => {}
            SessionState::Stopped => return Ok(()),
            state => {
                return Err(VitrackError::InvalidStateTransition {
                    operation: "stop",
                    state,
                })
            }
        }

        // Join the dispatch thread before touching the session so no
        // callback runs past this point.
        if let Some(mut worker) = self.worker.take() {
            worker.shutdown();
        }
        self.state = SessionState::Stopped;

        let mut shared = self.shared.lock().unwrap();
        if let Some(session) = shared.session.as_mut() {
            session.stop()?;
        }
        Ok(())
    }

    /// Tag the reference landmark with the identity pose and export the
    /// current map to `path`. Allowed regardless of streaming state.
    pub fn save_map(&mut self, path: impl AsRef<Path>) -> Result<()> {
        let blob = {
            let mut shared = self.shared.lock().unwrap();
            let session = shared
                .session
                .as_mut()
                .ok_or_else(|| VitrackError::MapExportFailed("no resolved session".into()))?;
            session.set_static_node(MAP_ANCHOR_GUID, IDENTITY_TRANSLATION, IDENTITY_ROTATION)?;
            session.export_map()?
        };
        map_store::write(&path, &blob)?;
        log::info!("saved map ({} bytes) to {}", blob.len(), path.as_ref().display());
        Ok(())
    }

    /// Import a map from `path`, then resume streaming.
    ///
    /// The blob is read before anything else, so a read failure mutates no
    /// state. Importing requires stopped delivery; streaming is stopped,
    /// the blob imported, and streaming restarted. A restart failure after
    /// a successful import surfaces as `RestartFailed`.
    pub fn load_map(&mut self, path: impl AsRef<Path>) -> Result<()> {
        let blob = map_store::read(&path)?;

        if self.state == SessionState::Streaming {
            self.stop()?;
        }

        let imported = {
            let mut shared = self.shared.lock().unwrap();
            match shared.session.as_mut() {
                Some(session) => session.import_map(&blob),
                None => Err(VitrackError::MapImportFailed("no resolved session".into())),
            }
        };

        if let Err(err) = imported {
            // Surface the import failure, but still bring the stream back.
            if let Err(restart) = self.start() {
                log::error!("restart after failed map import also failed: {restart}");
            }
            return Err(err);
        }

        log::info!("loaded map ({} bytes) from {}", blob.len(), path.as_ref().display());
        self.start()
            .map_err(|e| VitrackError::RestartFailed(Box::new(e)))
    }

    /// Release the device and session handles. Valid from Stopped or
    /// Configured.
    pub fn cleanup(&mut self) -> Result<()> {
        match self.state {
            SessionState::Stopped | SessionState::Configured => {}
            state => {
                return Err(VitrackError::InvalidStateTransition {
                    operation: "cleanup",
                    state,
                })
            }
        }
        self.shared.lock().unwrap().session = None;
        self.state = SessionState::Cleaned;
        log::info!("session resources released");
        Ok(())
    }
}

impl Drop for SessionController {
    fn drop(&mut self) {
        if let Some(mut worker) = self.worker.take() {
            worker.shutdown();
        }
    }
}
