// firecam/examples/camera_demo.rs

use anyhow::Result;
use firecam::imgcodecs;
use firecam::prelude::*;
use firecam_simulation::{SimCameraSpec, SimDriver, TestPattern};
use std::thread;
use std::time::{Duration, Instant};

fn main() -> Result<()> {
    tracing_subscriber::fmt::init();

    // 1. 一条挂着单目 Bayer 相机的模拟总线
    let driver = SimDriver::new()
        .with_camera(SimCameraSpec::new(0x00b0_9d01_00a0_1a4e, "Flea2").with_pattern(TestPattern::Gradient));
    let handle = driver.camera(0).expect("camera 0 is mounted");
    let contexts = ContextManager::new(driver);

    println!("Cameras on bus: {}", Camera::camera_count(&contexts)?);

    // 2. setup 之前暂存配置
    let mut cam = Camera::new(&contexts)?;
    cam.set_format7(true, 0)?;
    cam.set_size(643, 481)?; // 会被量化到 640x480
    cam.set_position(10, 10)?;
    cam.set_bayer_mode(ColorFilter::Rggb, BayerMethod::Bilinear)?;
    cam.set_frame_rate(30.0)?;
    cam.set_1394b(true)?;
    cam.set_blocking(true);

    println!("Opening camera...");
    cam.setup(0)?;
    println!(
        "Ready: {} {}x{} ({:?})",
        cam.get_guid().unwrap_or_default(),
        cam.get_width(),
        cam.get_height(),
        cam.get_image_type()
    );

    // 3. Feature 控制
    cam.print_features()?;
    cam.set_shutter_abs(0.01)?;
    cam.set_gain(0.25)?;
    println!(
        "Shutter {:.4}s (raw {}), gain {:.2}",
        cam.get_shutter_abs()?,
        cam.get_shutter_raw()?,
        cam.get_gain()?
    );

    // 4. 模拟相机按 30fps 持续出帧
    let producer = {
        let handle = handle.clone();
        thread::spawn(move || {
            for _ in 0..90 {
                handle.emit_frames(1);
                thread::sleep(Duration::from_millis(33));
            }
        })
    };

    // 5. 主循环
    let mut frame = Image::empty();
    let mut last_time = Instant::now();
    let mut frame_count = 0;

    println!("Start capturing...");
    for i in 0..60 {
        if !cam.grab_video(&mut frame, true)? {
            continue;
        }

        frame_count += 1;
        if frame_count % 10 == 0 {
            let now = Instant::now();
            let fps = 10.0 / now.duration_since(last_time).as_secs_f64();
            last_time = now;
            println!("FPS: {:.1}  Res: {}x{}", fps, frame.width, frame.height);
        }

        if i == 30 {
            imgcodecs::imwrite("firecam_demo.png", &frame)?;
            println!("Saved firecam_demo.png");
        }
    }

    // 6. 清理 (Drop 会自动处理，但显式调用更规范)
    cam.stop()?;
    cam.close();
    let _ = producer.join();

    println!("Dropped by driver: {}", handle.dropped_frames());
    Ok(())
}
