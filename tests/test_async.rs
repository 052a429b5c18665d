use std::cell::RefCell;

use traceable::{prep_async_stack, CapturedError, ErrorLike, Marker, Trace, TraceOptions};

fn failed() -> CapturedError {
    CapturedError::from_stack(
        "boom",
        "Error: boom\n    at fail (/srv/app/fail.js:3:9)\n    at tick (/srv/app/loop.js:1:1)\n",
    )
}

#[test]
fn test_only_asynchronous_errors_get_origin() {
    let queue: RefCell<Vec<Marker>> = RefCell::new(Vec::new());
    let finisher = prep_async_stack(0, |marker| queue.borrow_mut().push(marker));

    let mut err = failed();
    assert!(!finisher.crossed_boundary());
    assert!(!finisher.finish(&mut err));
    assert_eq!(err.async_stack(), None);

    for marker in queue.into_inner() {
        marker();
    }
    assert!(finisher.crossed_boundary());
    assert!(finisher.finish(&mut err));

    let async_stack = err.async_stack().unwrap();
    assert!(async_stack.starts_with("Error\n"));
    assert!(!async_stack.contains("prep_async_stack"));

    let trace = Trace::from_error(&err, TraceOptions::default());
    assert_eq!(trace.len(), 2);
    assert!(trace[1].async_origin().is_some());
    assert!(trace.to_string().contains("[async]"));
}

#[test]
fn test_captured_error_round_trip() {
    let err = CapturedError::new("boom");
    assert_eq!(err.message(), "boom");

    let trace = traceable::trace_error(&err);
    assert!(trace.iter().all(|frame| !frame.raw_function_name().contains("CapturedError")));
}

#[test]
fn test_trace_here() {
    let trace = traceable::trace_here(0);
    assert!(trace.iter().all(|frame| {
        let name = frame.raw_function_name();
        !name.starts_with("traceable.trace_here") && !name.starts_with("traceable.capture")
    }));
}

#[cfg(feature = "tokio")]
#[tokio::test]
async fn test_tokio_boundary() {
    let finisher = traceable::prep_async_stack_tokio(0);
    let mut err = failed();
    assert!(!finisher.finish(&mut err));

    for _ in 0..4 {
        tokio::task::yield_now().await;
    }
    assert!(finisher.finish(&mut err));
    assert!(err.async_stack().is_some());
}
