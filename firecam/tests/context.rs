use std::sync::{Arc, Barrier};
use std::thread;

use firecam::prelude::*;
use firecam_simulation::{SimCameraSpec, SimDriver};

#[test]
fn cameras_share_one_context() {
    let driver = SimDriver::new().with_camera(SimCameraSpec::new(1, "Flea"));
    let contexts = ContextManager::new(driver.clone());

    let cams: Vec<Camera> = (0..5).map(|_| Camera::new(&contexts).unwrap()).collect();
    assert_eq!(contexts.ref_count(), 5);
    assert_eq!(driver.contexts_created(), 1);

    // 乱序析构
    let mut cams: Vec<Option<Camera>> = cams.into_iter().map(Some).collect();
    for i in [3, 0, 4, 1] {
        cams[i] = None;
        assert!(contexts.is_active());
        assert_eq!(driver.contexts_released(), 0);
    }
    cams[2] = None;

    assert_eq!(contexts.ref_count(), 0);
    assert_eq!(driver.contexts_created(), 1);
    assert_eq!(driver.contexts_released(), 1);
    assert_eq!(driver.live_contexts(), 0);
}

#[test]
fn context_is_recreated_after_full_release() {
    let driver = SimDriver::new();
    let contexts = ContextManager::new(driver.clone());

    drop(Camera::new(&contexts).unwrap());
    drop(Camera::new(&contexts).unwrap());

    assert_eq!(driver.contexts_created(), 2);
    assert_eq!(driver.contexts_released(), 2);
    assert!(!contexts.is_active());
}

#[test]
fn close_keeps_the_context_reference() {
    let driver = SimDriver::new().with_camera(SimCameraSpec::new(1, "Flea"));
    let contexts = ContextManager::new(driver.clone());

    let mut cam = Camera::new(&contexts).unwrap();
    cam.setup(0).unwrap();
    cam.close();
    assert_eq!(contexts.ref_count(), 1);

    drop(cam);
    assert_eq!(driver.live_contexts(), 0);
}

#[test]
fn failed_init_surfaces_as_context_error() {
    let driver = SimDriver::new();
    driver.fail_context_init(true);
    let contexts = ContextManager::new(driver.clone());

    assert!(matches!(
        Camera::new(&contexts),
        Err(CameraError::ContextInit(_))
    ));
    assert!(matches!(
        Camera::camera_count(&contexts),
        Err(CameraError::ContextInit(_))
    ));
    assert_eq!(contexts.ref_count(), 0);

    driver.fail_context_init(false);
    assert!(Camera::new(&contexts).is_ok());
}

#[test]
fn concurrent_construction_balances_contexts() {
    let driver = SimDriver::new().with_camera(SimCameraSpec::new(1, "Flea"));
    let contexts = Arc::new(ContextManager::new(driver.clone()));
    let barrier = Arc::new(Barrier::new(8));

    let workers: Vec<_> = (0..8)
        .map(|_| {
            let contexts = Arc::clone(&contexts);
            let barrier = Arc::clone(&barrier);
            thread::spawn(move || {
                for _ in 0..25 {
                    barrier.wait();
                    let cam = Camera::new(&contexts).unwrap();
                    assert!(contexts.is_active());
                    drop(cam);
                }
            })
        })
        .collect();

    for worker in workers {
        worker.join().unwrap();
    }

    assert_eq!(contexts.ref_count(), 0);
    assert_eq!(driver.contexts_created(), driver.contexts_released());
    assert_eq!(driver.live_contexts(), 0);
    assert!(driver.contexts_created() >= 1);
}

#[test]
fn cameras_move_across_threads() {
    let driver = SimDriver::new().with_camera(SimCameraSpec::new(1, "Flea"));
    let handle = driver.camera(0).unwrap();
    let contexts = ContextManager::new(driver.clone());

    let mut cam = Camera::new(&contexts).unwrap();
    cam.setup(0).unwrap();
    cam.start().unwrap();
    handle.emit_frames(1);

    let cam = thread::spawn(move || {
        let mut cam = cam;
        let mut img = Image::empty();
        assert!(cam.grab_video(&mut img, true).unwrap());
        cam
    })
    .join()
    .unwrap();

    assert!(cam.is_ready());
    drop(cam);
    assert_eq!(driver.live_contexts(), 0);
}
