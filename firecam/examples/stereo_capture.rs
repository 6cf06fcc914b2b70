// firecam/examples/stereo_capture.rs

use anyhow::Result;
use firecam::imgcodecs;
use firecam::prelude::*;
use firecam_simulation::{SimCameraSpec, SimDriver, TestPattern};

fn main() -> Result<()> {
    tracing_subscriber::fmt::init();

    let driver = SimDriver::new().with_camera(
        SimCameraSpec::stereo(0x00b0_9d01_0070_1234, "Bumblebee2").with_pattern(TestPattern::Pairs(40, 200)),
    );
    let handle = driver.camera(0).expect("camera 0 is mounted");
    let contexts = ContextManager::new(driver);

    // 1. 单流立体相机：一个 16-bit 帧拆成左右两幅图像
    let mut cam = Camera::new_stereo(&contexts)?;
    cam.set_stereo_method(StereoMethod::Interlaced)?;
    cam.set_frame_rate(15.0)?;
    cam.setup_guid("00b09d0100701234")?;
    println!("Stereo camera ready, rate {:?}", cam.get_frame_rate_actual());

    // 2. One-Shot
    let (mut left, mut right) = (Image::empty(), Image::empty());
    if cam.grab_still_stereo(&mut left, &mut right)? {
        println!(
            "Still: left[0]={} right[0]={}",
            left.data[0], right.data[0]
        );
    }

    // 3. 连续采集，按顺序消费每一帧
    cam.start()?;
    handle.emit_frames(3);
    while cam.grab_video_stereo(&mut left, &mut right, false)? {
        println!("Video frame {}x{} x2", left.width, left.height);
    }

    imgcodecs::imwrite("stereo_left.png", &left)?;
    imgcodecs::imwrite("stereo_right.png", &right)?;

    // 4. 总线复位不影响本相机状态
    cam.reset_bus(0)?;
    println!("Bus resets: {}, state: {}", handle.bus_resets(), cam.state());
    Ok(())
}
