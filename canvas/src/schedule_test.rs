use super::*;

#[test]
fn first_request_schedules() {
    let mut s = RedrawScheduler::new();
    assert!(s.request());
    assert!(s.is_pending());
}

#[test]
fn burst_of_requests_yields_one_frame() {
    let mut s = RedrawScheduler::new();
    let scheduled = (0..50).filter(|_| s.request()).count();
    assert_eq!(scheduled, 1);
    assert!(s.begin_frame());
    assert!(!s.begin_frame());
    assert_eq!(s.frames(), 1);
}

#[test]
fn request_after_frame_schedules_again() {
    let mut s = RedrawScheduler::new();
    assert!(s.request());
    s.begin_frame();
    assert!(s.request());
    s.begin_frame();
    assert_eq!(s.frames(), 2);
}

#[test]
fn cancel_allows_rescheduling() {
    let mut s = RedrawScheduler::new();
    assert!(s.request());
    s.cancel();
    assert!(!s.is_pending());
    assert!(s.request());
}

#[test]
fn spurious_frame_is_ignored() {
    let mut s = RedrawScheduler::new();
    assert!(!s.begin_frame());
    assert_eq!(s.frames(), 0);
}
