use firecam::prelude::*;
use firecam_simulation::{SimCameraSpec, SimDriver};

const GUID: u64 = 0x00b0_9d01_00a0_1a4e;

fn rig() -> (SimDriver, ContextManager) {
    let driver = SimDriver::new()
        .with_camera(SimCameraSpec::new(GUID, "Flea2"))
        .with_camera(SimCameraSpec::new(0x42, "Dragonfly").with_bus(1));
    let contexts = ContextManager::new(driver.clone());
    (driver, contexts)
}

#[test]
fn setup_by_index_walks_the_state_machine() -> anyhow::Result<()> {
    let (driver, contexts) = rig();
    let mut cam = Camera::new(&contexts)?;
    assert_eq!(cam.state(), CameraState::Uninitialized);
    assert!(!cam.is_ready());

    cam.setup(0)?;
    assert_eq!(cam.state(), CameraState::Configured);
    assert!(cam.is_ready());
    assert_eq!(driver.camera(0).unwrap().capture_buffers(), Some(4));
    assert_eq!(cam.device_info().unwrap().model, "Flea2");

    cam.start()?;
    assert_eq!(cam.state(), CameraState::Streaming);
    assert!(driver.camera(0).unwrap().is_transmitting());

    cam.stop()?;
    assert_eq!(cam.state(), CameraState::Stopped);
    assert!(!driver.camera(0).unwrap().is_transmitting());
    assert!(cam.is_ready());

    cam.close();
    assert_eq!(cam.state(), CameraState::Closed);
    assert!(!driver.camera(0).unwrap().is_open());
    Ok(())
}

#[test]
fn setup_by_guid_string() -> anyhow::Result<()> {
    let (driver, contexts) = rig();
    let mut cam = Camera::new(&contexts)?;
    cam.setup_guid("0x42")?;
    assert_eq!(cam.get_guid().as_deref(), Some("0000000000000042"));
    assert!(driver.camera(1).unwrap().is_open());
    assert!(!driver.camera(0).unwrap().is_open());
    Ok(())
}

#[test]
fn bad_index_or_guid_leaves_camera_unready() -> anyhow::Result<()> {
    let (driver, contexts) = rig();
    let mut cam = Camera::new(&contexts)?;

    assert!(matches!(cam.setup(7), Err(CameraError::DeviceNotFound(_))));
    assert!(!cam.is_ready());
    assert_eq!(cam.state(), CameraState::Uninitialized);

    assert!(matches!(
        cam.setup_guid("deadbeef"),
        Err(CameraError::DeviceNotFound(_))
    ));
    assert!(matches!(
        cam.setup_guid("not-a-guid"),
        Err(CameraError::DeviceNotFound(_))
    ));
    assert!(!cam.is_ready());

    // 没有分配 DMA 缓冲区，上下文只有这一份引用
    assert_eq!(driver.camera(0).unwrap().capture_buffers(), None);
    assert_eq!(driver.contexts_created(), 1);
    assert_eq!(contexts.ref_count(), 1);
    Ok(())
}

#[test]
fn close_is_idempotent() -> anyhow::Result<()> {
    let (_driver, contexts) = rig();
    let mut never_opened = Camera::new(&contexts)?;
    never_opened.close();
    never_opened.close();
    assert!(!never_opened.is_ready());

    let mut cam = Camera::new(&contexts)?;
    cam.setup(0)?;
    cam.close();
    cam.close();
    assert!(!cam.is_ready());
    assert_eq!(cam.get_guid(), None);
    Ok(())
}

#[test]
fn setup_after_close_reopens() -> anyhow::Result<()> {
    let (driver, contexts) = rig();
    let mut cam = Camera::new(&contexts)?;
    cam.setup(0)?;
    cam.close();
    cam.setup(1)?;
    assert!(cam.is_ready());
    assert!(!driver.camera(0).unwrap().is_open());
    assert!(driver.camera(1).unwrap().is_open());
    Ok(())
}

#[test]
fn second_camera_cannot_open_same_device() -> anyhow::Result<()> {
    let (_driver, contexts) = rig();
    let mut a = Camera::new(&contexts)?;
    let mut b = Camera::new(&contexts)?;
    a.setup(0)?;
    assert!(matches!(b.setup(0), Err(CameraError::DeviceBusy)));
    assert!(!b.is_ready());
    Ok(())
}

#[test]
fn format7_request_is_quantized() -> anyhow::Result<()> {
    let (driver, contexts) = rig();
    let mut cam = Camera::new(&contexts)?;
    cam.set_format7(true, 0)?;
    cam.set_size(643, 479)?;
    cam.set_position(7, 3)?;
    cam.setup(0)?;

    assert_eq!((cam.get_width(), cam.get_height()), (640, 478));
    assert_eq!(driver.camera(0).unwrap().roi(), Some((4, 2, 640, 478)));
    assert_eq!(cam.video_mode(), Some(VideoMode::Format7(0)));
    assert_eq!(cam.get_frame_rate_actual(), None);
    Ok(())
}

#[test]
fn format7_frame_rate_goes_through_the_feature() -> anyhow::Result<()> {
    let (driver, contexts) = rig();
    let mut cam = Camera::new(&contexts)?;
    cam.set_format7(true, 0)?;
    cam.set_frame_rate(120.0)?;
    cam.setup(0)?;

    let handle = driver.camera(0).unwrap();
    // 钳位到 FrameRate Feature 的绝对范围上限 60
    assert_eq!(handle.absolute_register(Feature::FrameRate), Some(60.0));
    assert_eq!(handle.absolute_control(Feature::FrameRate), Some(true));
    Ok(())
}

#[test]
fn bus_generation_is_applied() -> anyhow::Result<()> {
    let (driver, contexts) = rig();
    let mut cam = Camera::new(&contexts)?;
    cam.set_1394b(true)?;
    cam.setup(0)?;
    let config = driver.camera(0).unwrap().bus_config().unwrap();
    assert_eq!(config.operation_mode, OperationMode::B1394);
    assert_eq!(config.iso_speed, IsoSpeed::S800);
    Ok(())
}

#[test]
fn legacy_only_device_rejects_1394b() -> anyhow::Result<()> {
    let driver = SimDriver::new().with_camera(SimCameraSpec::new(1, "Old").legacy_only());
    let contexts = ContextManager::new(driver);
    let mut cam = Camera::new(&contexts)?;
    cam.set_1394b(true)?;
    assert!(matches!(
        cam.setup(0),
        Err(CameraError::ConfigurationRejected(_))
    ));
    assert_eq!(cam.state(), CameraState::Opened);
    Ok(())
}

#[test]
fn bus_reset_does_not_touch_camera_state() -> anyhow::Result<()> {
    let (driver, contexts) = rig();
    let mut cam = Camera::new(&contexts)?;
    cam.setup(0)?;

    cam.reset_bus(1)?;
    cam.reset_bus_guid("42")?;
    assert_eq!(driver.camera(1).unwrap().bus_resets(), 2);
    assert_eq!(cam.state(), CameraState::Configured);
    assert!(matches!(cam.reset_bus(9), Err(CameraError::DeviceNotFound(_))));
    assert!(matches!(
        cam.reset_bus_guid("zz:zz"),
        Err(CameraError::DeviceNotFound(_))
    ));
    Ok(())
}

#[test]
fn camera_count_lists_bus() -> anyhow::Result<()> {
    let (driver, contexts) = rig();
    assert_eq!(Camera::camera_count(&contexts)?, 2);
    driver.camera(1).unwrap().unplug();
    assert_eq!(Camera::camera_count(&contexts)?, 1);
    Ok(())
}
