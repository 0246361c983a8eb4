//! Save the spatial map, reload it, and watch the relocalization anchor.
//!
//! Usage: cargo run --example map_roundtrip

use std::time::Duration;
use vitrack::sim::SimDriver;
use vitrack::{OutputEvent, SessionConfig, SessionController};

fn main() {
    env_logger::init();

    let driver = SimDriver::new();
    let handle = driver.handle();
    let (mut controller, messages) =
        SessionController::new(Box::new(driver), SessionConfig::default());

    controller.configure().expect("configure failed");
    controller.start().expect("start failed");

    let path = std::env::temp_dir().join("vitrack-demo.map");
    controller.save_map(&path).expect("save failed");
    println!("map saved to {}", path.display());

    controller.load_map(&path).expect("load failed");
    println!("map reloaded, streaming resumed");

    handle.notify_relocalization(1_000);
    match messages.recv_timeout(Duration::from_secs(2)) {
        Ok(OutputEvent::Relocalization(pose)) => {
            println!(
                "relocalized against anchor in frame '{}': pos={:?} quat={:?}",
                pose.frame_id, pose.position, pose.orientation
            );
        }
        other => eprintln!("unexpected result: {:?}", other),
    }

    controller.stop().ok();
    controller.cleanup().ok();
    std::fs::remove_file(&path).ok();
}
