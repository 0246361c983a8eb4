//! Abstract capability surface of the underlying sensor driver.
//!
//! The session layer never talks to hardware directly; it consumes these
//! traits. A concrete implementation wraps the vendor SDK, [`crate::sim`]
//! provides an in-process one for tests and demos.

use crate::types::{DeviceDescriptor, Frame, Notification};
use crate::Result;
use crossbeam_channel::Receiver;

/// Boolean sensor options resolved against the chosen device at configure
/// time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SensorOption {
    Mapping,
    PoseJumping,
    Relocalization,
    DynamicCalibration,
    MapPreservation,
}

/// Which streams the resolved session should deliver.
#[derive(Debug, Clone, Copy, Default)]
pub struct StreamSelection {
    pub pose: bool,
    pub fisheye: bool,
}

/// Everything the streaming session can deliver asynchronously.
#[derive(Debug, Clone)]
pub enum SensorEvent {
    Frame(Frame),
    Notification(Notification),
}

/// Device enumeration and session resolution.
pub trait TrackingDriver: Send {
    /// List connected tracking devices of the supported product family.
    fn enumerate(&mut self) -> Result<Vec<DeviceDescriptor>>;

    /// Issue a hardware reset to the device with the given serial.
    fn hardware_reset(&mut self, serial: &str) -> Result<()>;

    /// Resolve a streaming session for the device, enabling the requested
    /// streams.
    fn resolve(&mut self, serial: &str, streams: StreamSelection)
        -> Result<Box<dyn TrackingSession>>;
}

/// A resolved device session: streaming, options, map and landmark access.
pub trait TrackingSession: Send {
    fn set_option(&mut self, option: SensorOption, enabled: bool) -> Result<()>;

    /// Begin asynchronous delivery. Events arrive on the returned channel
    /// from the driver's own delivery context.
    fn start(&mut self) -> Result<Receiver<SensorEvent>>;

    /// Halt delivery. Must complete before `import_map` may be called.
    fn stop(&mut self) -> Result<()>;

    /// Export the current spatial map as an opaque blob.
    fn export_map(&mut self) -> Result<Vec<u8>>;

    /// Import a previously exported blob. Undefined on the underlying
    /// session while frames are being delivered; callers stop streaming
    /// first.
    fn import_map(&mut self, blob: &[u8]) -> Result<()>;

    /// Store a named fixed-pose landmark in the map.
    fn set_static_node(
        &mut self,
        guid: &str,
        translation: [f64; 3],
        rotation: [f64; 4],
    ) -> Result<()>;

    /// Query a named landmark; `None` when it was never set.
    fn get_static_node(&mut self, guid: &str) -> Result<Option<([f64; 3], [f64; 4])>>;
}
