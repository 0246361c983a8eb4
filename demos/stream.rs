//! Stream simulated tracking poses through the session layer to stdout.
//!
//! Usage: cargo run --example stream

use std::thread;
use std::time::Duration;
use vitrack::sim::SimDriver;
use vitrack::{OutputEvent, PoseSample, SessionConfig, SessionController, TrackerConfidence};

fn main() {
    env_logger::init();

    let driver = SimDriver::new();
    let handle = driver.handle();
    let (mut controller, messages) =
        SessionController::new(Box::new(driver), SessionConfig::default());

    if let Err(e) = controller.configure() {
        eprintln!("configure failed: {}", e);
        std::process::exit(1);
    }
    if let Err(e) = controller.start() {
        eprintln!("start failed: {}", e);
        std::process::exit(1);
    }

    // Feed a circular trajectory at 200 Hz from a producer thread.
    let producer = thread::spawn(move || {
        for i in 0..1000u64 {
            let t = i as f64 / 200.0;
            let sample = PoseSample {
                timestamp_us: i * 5_000,
                translation: [t.cos() - 1.0, 0.1 * t, t.sin()],
                rotation: [0.0, (t / 2.0).sin(), 0.0, (t / 2.0).cos()],
                velocity: [-t.sin(), 0.1, t.cos()],
                angular_velocity: [0.0, 0.5, 0.0],
                confidence: TrackerConfidence::High,
            };
            if !handle.send_pose(sample) {
                break;
            }
            thread::sleep(Duration::from_millis(5));
        }
    });

    let mut count: u64 = 0;
    let mut odom_count: u64 = 0;
    while let Ok(msg) = messages.recv_timeout(Duration::from_secs(2)) {
        count += 1;
        if let OutputEvent::Odometry(odom) = &msg {
            odom_count += 1;
            // Print every ~50th odometry to avoid flooding the terminal
            if odom_count % 50 == 1 {
                println!(
                    "ts={:<10} pos=[{:+.3}, {:+.3}, {:+.3}]  vel=[{:+.3}, {:+.3}, {:+.3}]  cov={:.3}",
                    odom.timestamp_us,
                    odom.position[0],
                    odom.position[1],
                    odom.position[2],
                    odom.linear_velocity[0],
                    odom.linear_velocity[1],
                    odom.linear_velocity[2],
                    odom.pose_covariance[0],
                );
            }
        }
        if count >= 2000 {
            break;
        }
    }

    producer.join().ok();
    controller.stop().ok();
    println!("received {} messages ({} odometry)", count, odom_count);
}
