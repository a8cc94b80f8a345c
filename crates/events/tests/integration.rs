//! Integration tests for the event channel

use kiln_events::{channel, AppEvent, BuildEvent, EventEmitter, GeneralEvent};

#[tokio::test]
async fn test_channel_delivers_in_order() {
    let (tx, mut rx) = channel();

    tx.emit_operation_started("build mad 0.16.4");
    tx.emit(AppEvent::Build(BuildEvent::StepStarted {
        step_index: 0,
        command: "autoreconf -fiv".into(),
    }));
    tx.emit(AppEvent::Build(BuildEvent::StepCompleted { step_index: 0 }));
    drop(tx);

    let first = rx.recv().await.unwrap();
    assert!(matches!(
        first,
        AppEvent::General(GeneralEvent::OperationStarted { .. })
    ));
    let second = rx.recv().await.unwrap();
    assert!(matches!(
        second,
        AppEvent::Build(BuildEvent::StepStarted { step_index: 0, .. })
    ));
    let third = rx.recv().await.unwrap();
    assert!(matches!(
        third,
        AppEvent::Build(BuildEvent::StepCompleted { step_index: 0 })
    ));
    assert!(rx.recv().await.is_none());
}

#[test]
fn test_emit_without_receiver_is_silent() {
    let (tx, rx) = channel();
    drop(rx);
    // emit drops the event when nobody is listening
    tx.emit_warning("receiver gone");
}
