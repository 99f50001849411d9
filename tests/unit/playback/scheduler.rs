use super::*;

#[test]
fn manual_scheduler_queues_and_cancels() {
    let mut s = ManualScheduler::new();
    let a = s.request_frame();
    let b = s.request_frame();
    assert_ne!(a, b);
    assert_eq!(s.pending_count(), 2);

    s.cancel_frame(a);
    s.cancel_frame(FrameRequest(999));
    assert_eq!(s.take_due(), vec![b]);
    assert_eq!(s.pending_count(), 0);
}

#[test]
fn start_is_idempotent() {
    let mut lp = RenderLoop::new(ManualScheduler::new());
    assert!(!lp.is_running());
    lp.start();
    lp.start();
    assert!(lp.is_running());
    assert_eq!(lp.scheduler().pending_count(), 1);
}

#[test]
fn each_tick_requests_exactly_one_successor() {
    let mut lp = RenderLoop::new(ManualScheduler::new());
    lp.start();

    let mut ticks = 0;
    for _ in 0..5 {
        let due = lp.scheduler_mut().take_due();
        assert_eq!(due.len(), 1);
        let ran = lp
            .fire(due[0], || {
                ticks += 1;
                Ok(ticks)
            })
            .unwrap();
        assert_eq!(ran, Some(ticks));
        assert_eq!(lp.scheduler().pending_count(), 1);
    }
    assert_eq!(ticks, 5);
}

#[test]
fn stop_cancels_outstanding_request() {
    let mut lp = RenderLoop::new(ManualScheduler::new());
    lp.start();
    let req = lp.pending().unwrap();
    lp.stop();

    assert!(!lp.is_running());
    assert!(lp.pending().is_none());
    assert_eq!(lp.scheduler().pending_count(), 0);
    let ran = lp.fire(req, || -> FlipResult<()> { panic!("tick after stop") });
    assert!(ran.unwrap().is_none());
}

#[test]
fn stale_request_is_ignored() {
    let mut lp = RenderLoop::new(ManualScheduler::new());
    lp.start();
    let first = lp.scheduler_mut().take_due()[0];
    lp.fire(first, || Ok(())).unwrap();

    // `first` already fired; only its successor may run.
    assert!(lp.fire(first, || Ok(1)).unwrap().is_none());
    let second = lp.scheduler_mut().take_due()[0];
    assert_eq!(lp.fire(second, || Ok(2)).unwrap(), Some(2));
}

#[test]
fn failing_tick_stops_loop() {
    let mut lp = RenderLoop::new(ManualScheduler::new());
    lp.start();
    let req = lp.scheduler_mut().take_due()[0];
    let err = lp
        .fire(req, || -> FlipResult<()> {
            Err(FlipError::render("boom"))
        })
        .unwrap_err();
    assert!(err.to_string().contains("boom"));
    assert!(!lp.is_running());
    assert_eq!(lp.scheduler().pending_count(), 0);
}

#[test]
fn ticker_rejects_bad_rate() {
    assert!(TickerScheduler::new(0.0).is_err());
    assert!(TickerScheduler::new(-60.0).is_err());
    assert!(TickerScheduler::new(f64::NAN).is_err());
}

#[test]
fn ticker_delivers_requests_in_order() {
    let mut s = TickerScheduler::new(500.0).unwrap();
    assert_eq!(s.interval(), Duration::from_millis(2));
    assert!(s.wait_next().is_none());

    let a = s.request_frame();
    let b = s.request_frame();
    let c = s.request_frame();
    s.cancel_frame(b);
    assert_eq!(s.wait_next(), Some(a));
    assert_eq!(s.wait_next(), Some(c));
    assert!(s.wait_next().is_none());
}
