//! Simulated tracking driver for tests and demos.
//!
//! One fake device, an injection handle for pushing frames and
//! notifications while streaming, operation counters so tests can assert
//! lifecycle ordering (e.g. that a map is never imported while frames are
//! being delivered), and armable faults for import/start failures.

use crate::driver::{
    SensorEvent, SensorOption, StreamSelection, TrackingDriver, TrackingSession,
};
use crate::types::{
    Capabilities, DeviceDescriptor, Frame, Notification, NotificationCategory, PoseSample,
};
use crate::{Result, VitrackError};
use crossbeam_channel::{Receiver, Sender};
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

/// Operation counters recorded by the simulated session.
#[derive(Debug, Default)]
pub struct SimStats {
    pub hardware_resets: AtomicUsize,
    pub exports: AtomicUsize,
    pub imports: AtomicUsize,
    /// Imports observed while delivery was active. Always zero when the
    /// controller honors the stop-before-import ordering.
    pub imports_while_streaming: AtomicUsize,
    pub anchor_sets: AtomicUsize,
}

/// Pending fault injections, armed through [`SimHandle`].
#[derive(Debug, Default)]
struct SimFaults {
    fail_imports: AtomicUsize,
    fail_starts: AtomicUsize,
}

/// Consume one pending fault from `counter` if any is armed.
fn take_fault(counter: &AtomicUsize) -> bool {
    counter
        .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| n.checked_sub(1))
        .is_ok()
}

type StaticNodes = Arc<Mutex<HashMap<String, ([f64; 3], [f64; 4])>>>;

fn seed_map(serial: &str) -> Vec<u8> {
    let mut blob = b"SIMMAP".to_vec();
    blob.extend_from_slice(serial.as_bytes());
    blob
}

/// In-process driver exposing a single simulated tracking device.
pub struct SimDriver {
    descriptor: DeviceDescriptor,
    stats: Arc<SimStats>,
    faults: Arc<SimFaults>,
    nodes: StaticNodes,
    injector: Arc<Mutex<Option<Sender<SensorEvent>>>>,
    streaming: Arc<AtomicBool>,
}

impl SimDriver {
    pub fn new() -> SimDriver {
        SimDriver::with_serial("SIM000001")
    }

    pub fn with_serial(serial: &str) -> SimDriver {
        SimDriver {
            descriptor: DeviceDescriptor {
                serial: serial.into(),
                firmware: "0.2.0.951".into(),
                physical_port: "sim/usb0".into(),
                product_id: 0x0B37,
                capabilities: Capabilities::POSE
                    | Capabilities::FISHEYE
                    | Capabilities::MAPPING
                    | Capabilities::RELOCALIZATION,
            },
            stats: Arc::new(SimStats::default()),
            faults: Arc::new(SimFaults::default()),
            nodes: Arc::new(Mutex::new(HashMap::new())),
            injector: Arc::new(Mutex::new(None)),
            streaming: Arc::new(AtomicBool::new(false)),
        }
    }

    /// Injection handle, valid for the lifetime of the simulated device.
    /// Grab it before handing the driver to the controller.
    pub fn handle(&self) -> SimHandle {
        SimHandle {
            injector: self.injector.clone(),
            stats: self.stats.clone(),
            faults: self.faults.clone(),
            nodes: self.nodes.clone(),
            streaming: self.streaming.clone(),
        }
    }
}

impl Default for SimDriver {
    fn default() -> SimDriver {
        SimDriver::new()
    }
}

impl TrackingDriver for SimDriver {
    fn enumerate(&mut self) -> Result<Vec<DeviceDescriptor>> {
        Ok(vec![self.descriptor.clone()])
    }

    fn hardware_reset(&mut self, _serial: &str) -> Result<()> {
        self.stats.hardware_resets.fetch_add(1, Ordering::Relaxed);
        Ok(())
    }

    fn resolve(
        &mut self,
        serial: &str,
        _streams: StreamSelection,
    ) -> Result<Box<dyn TrackingSession>> {
        if serial != self.descriptor.serial {
            return Err(VitrackError::DeviceNotFound(serial.to_string()));
        }
        Ok(Box::new(SimSession {
            serial: self.descriptor.serial.clone(),
            map: Some(seed_map(&self.descriptor.serial)),
            nodes: self.nodes.clone(),
            injector: self.injector.clone(),
            streaming: self.streaming.clone(),
            stats: self.stats.clone(),
            faults: self.faults.clone(),
        }))
    }
}

struct SimSession {
    serial: String,
    map: Option<Vec<u8>>,
    nodes: StaticNodes,
    injector: Arc<Mutex<Option<Sender<SensorEvent>>>>,
    streaming: Arc<AtomicBool>,
    stats: Arc<SimStats>,
    faults: Arc<SimFaults>,
}

impl TrackingSession for SimSession {
    fn set_option(&mut self, option: SensorOption, enabled: bool) -> Result<()> {
        log::debug!("sim option {:?} = {}", option, enabled);
        if option == SensorOption::Mapping {
            if enabled {
                if self.map.is_none() {
                    self.map = Some(seed_map(&self.serial));
                }
            } else {
                self.map = None;
            }
        }
        Ok(())
    }

    fn start(&mut self) -> Result<Receiver<SensorEvent>> {
        if take_fault(&self.faults.fail_starts) {
            return Err(VitrackError::Driver("stream start refused".into()));
        }
        let (tx, rx) = crossbeam_channel::bounded(256);
        *self.injector.lock().unwrap() = Some(tx);
        self.streaming.store(true, Ordering::SeqCst);
        Ok(rx)
    }

    fn stop(&mut self) -> Result<()> {
        self.streaming.store(false, Ordering::SeqCst);
        *self.injector.lock().unwrap() = None;
        Ok(())
    }

    fn export_map(&mut self) -> Result<Vec<u8>> {
        self.stats.exports.fetch_add(1, Ordering::Relaxed);
        self.map
            .clone()
            .ok_or_else(|| VitrackError::MapExportFailed("mapping disabled, no map available".into()))
    }

    fn import_map(&mut self, blob: &[u8]) -> Result<()> {
        self.stats.imports.fetch_add(1, Ordering::Relaxed);
        if self.streaming.load(Ordering::SeqCst) {
            self.stats
                .imports_while_streaming
                .fetch_add(1, Ordering::Relaxed);
        }
        if take_fault(&self.faults.fail_imports) {
            return Err(VitrackError::MapImportFailed("map blob rejected".into()));
        }
        if blob.is_empty() {
            return Err(VitrackError::MapImportFailed("empty blob".into()));
        }
        self.map = Some(blob.to_vec());
        Ok(())
    }

    fn set_static_node(
        &mut self,
        guid: &str,
        translation: [f64; 3],
        rotation: [f64; 4],
    ) -> Result<()> {
        self.stats.anchor_sets.fetch_add(1, Ordering::Relaxed);
        self.nodes
            .lock()
            .unwrap()
            .insert(guid.to_string(), (translation, rotation));
        Ok(())
    }

    fn get_static_node(&mut self, guid: &str) -> Result<Option<([f64; 3], [f64; 4])>> {
        Ok(self.nodes.lock().unwrap().get(guid).copied())
    }
}

/// Injects sensor events into the active stream and exposes the counters.
#[derive(Clone)]
pub struct SimHandle {
    injector: Arc<Mutex<Option<Sender<SensorEvent>>>>,
    stats: Arc<SimStats>,
    faults: Arc<SimFaults>,
    nodes: StaticNodes,
    streaming: Arc<AtomicBool>,
}

impl SimHandle {
    pub fn is_streaming(&self) -> bool {
        self.streaming.load(Ordering::SeqCst)
    }

    pub fn stats(&self) -> &SimStats {
        &self.stats
    }

    /// Arm the session to reject the next `n` map imports.
    pub fn fail_next_imports(&self, n: usize) {
        self.faults.fail_imports.store(n, Ordering::SeqCst);
    }

    /// Arm the session to refuse the next `n` streaming starts.
    pub fn fail_next_starts(&self, n: usize) {
        self.faults.fail_starts.store(n, Ordering::SeqCst);
    }

    /// Write a static node directly, as device firmware might between
    /// controller operations.
    pub fn set_static_node(&self, guid: &str, translation: [f64; 3], rotation: [f64; 4]) {
        self.nodes
            .lock()
            .unwrap()
            .insert(guid.to_string(), (translation, rotation));
    }

    /// Read a static node without going through the session.
    pub fn static_node(&self, guid: &str) -> Option<([f64; 3], [f64; 4])> {
        self.nodes.lock().unwrap().get(guid).copied()
    }

    /// Push an event into the stream. Returns false when delivery is not
    /// active.
    pub fn send(&self, event: SensorEvent) -> bool {
        match self.injector.lock().unwrap().as_ref() {
            Some(tx) => tx.send(event).is_ok(),
            None => false,
        }
    }

    pub fn send_frame(&self, frame: Frame) -> bool {
        self.send(SensorEvent::Frame(frame))
    }

    pub fn send_pose(&self, sample: PoseSample) -> bool {
        self.send_frame(Frame::Pose(sample))
    }

    pub fn notify_relocalization(&self, timestamp_us: u64) -> bool {
        self.send(SensorEvent::Notification(Notification {
            category: NotificationCategory::PoseRelocalization,
            timestamp_us,
            description: "pose relocalized".into(),
        }))
    }
}
