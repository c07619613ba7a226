use std::io::{self, Cursor, Write};
use std::os::unix::net::UnixStream;
use std::sync::{Arc, Mutex};
use std::thread;

use gui_session_runtime::protocol::{read_frame, write_frame};
use gui_session_runtime::{
    ErrorCode, Event, HeadlessPlatform, Interrupter, Platform, Response, ServerFrame, Session,
    SessionConfig, Termination, serve_unix_stream,
};

const CAP: usize = 1 << 20;

#[derive(Clone, Default)]
struct Capture(Arc<Mutex<Vec<u8>>>);

impl Write for Capture {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.0.lock().expect("capture lock").extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

fn input(requests: &[&str]) -> Cursor<Vec<u8>> {
    let mut bytes = Vec::new();
    for request in requests {
        write_frame(&mut bytes, request.as_bytes(), CAP).expect("encode request frame");
    }
    Cursor::new(bytes)
}

fn decode(bytes: &[u8]) -> (Vec<Response>, Vec<Event>) {
    let mut cursor = Cursor::new(bytes);
    let mut responses = Vec::new();
    let mut events = Vec::new();
    while (cursor.position() as usize) < bytes.len() {
        let payload = read_frame(&mut cursor, CAP).expect("read server frame");
        match serde_json::from_slice(&payload).expect("decode server frame") {
            ServerFrame::Response(response) => responses.push(response),
            ServerFrame::Event(event) => events.push(event),
        }
    }
    (responses, events)
}

struct Outcome {
    termination: Termination,
    responses: Vec<Response>,
    events: Vec<Event>,
}

fn run(platform: Arc<HeadlessPlatform>, requests: &[&str]) -> Outcome {
    let capture = Capture::default();
    let session = Session::new(platform, capture.clone(), &SessionConfig::default())
        .expect("start session");
    let termination = session.run(&mut input(requests));
    drop(session);

    let bytes = capture.0.lock().expect("capture lock").clone();
    let (responses, events) = decode(&bytes);
    Outcome {
        termination,
        responses,
        events,
    }
}

#[test]
fn new_activity_reports_create_start_resume() {
    let outcome = run(Arc::new(HeadlessPlatform::new()), &[r#"{"newActivity":{}}"#]);

    assert!(
        matches!(outcome.termination, Termination::EndOfStream),
        "got {:?}",
        outcome.termination
    );
    assert_eq!(
        outcome.responses,
        vec![Response::NewActivity {
            aid: 0,
            tid: 1,
            code: None
        }]
    );
    assert_eq!(
        outcome.events,
        vec![
            Event::Create { aid: 0 },
            Event::Start { aid: 0 },
            Event::Resume { aid: 0 },
        ]
    );
}

#[test]
fn failed_request_does_not_stop_the_session() {
    let outcome = run(
        Arc::new(HeadlessPlatform::new()),
        &[
            r#"{"newActivity":{}}"#,
            r#"{"setText":{"aid":0,"id":7,"text":"x"}}"#,
            r#"{"version":{}}"#,
        ],
    );

    assert_eq!(
        outcome.responses,
        vec![
            Response::NewActivity {
                aid: 0,
                tid: 1,
                code: None
            },
            Response::failed(ErrorCode::NotFound),
            Response::Version { version_code: 1 },
        ]
    );
}

#[test]
fn denied_overlay_allocates_nothing() {
    let platform = Arc::new(HeadlessPlatform::new());
    platform.set_overlay_permission(false);

    let outcome = run(
        platform.clone(),
        &[
            r#"{"newActivity":{"type":"overlay"}}"#,
            r#"{"newActivity":{}}"#,
        ],
    );

    assert_eq!(
        outcome.responses,
        vec![
            Response::NewActivity {
                aid: -1,
                tid: -1,
                code: Some(ErrorCode::PermissionDenied)
            },
            Response::NewActivity {
                aid: 0,
                tid: 1,
                code: None
            },
        ]
    );
    assert_eq!(platform.overlay_permission_requests(), 1);
    assert!(platform.live_overlays().is_empty());
}

#[test]
fn empty_request_ends_the_session() {
    let outcome = run(
        Arc::new(HeadlessPlatform::new()),
        &[r#"{"version":{}}"#, "{}", r#"{"version":{}}"#],
    );

    assert!(
        matches!(outcome.termination, Termination::EmptyRequest),
        "got {:?}",
        outcome.termination
    );
    assert_eq!(
        outcome.responses,
        vec![Response::Version { version_code: 1 }]
    );
}

#[test]
fn deleting_a_layout_deletes_its_children() {
    let outcome = run(
        Arc::new(HeadlessPlatform::new()),
        &[
            r#"{"newActivity":{}}"#,
            r#"{"createLinearLayout":{"aid":0}}"#,
            r#"{"createTextView":{"aid":0,"parent":2,"text":"a"}}"#,
            r#"{"deleteView":{"aid":0,"id":2}}"#,
            r#"{"setText":{"aid":0,"id":3,"text":"b"}}"#,
            r#"{"createSpace":{"aid":0}}"#,
        ],
    );

    assert_eq!(
        outcome.responses[1..],
        [
            Response::created(2),
            Response::created(3),
            Response::ok(),
            Response::failed(ErrorCode::NotFound),
            // Released handles are not reissued right away.
            Response::created(4),
        ]
    );
}

#[test]
fn hardware_buffer_backs_a_surface_until_destroyed() {
    let outcome = run(
        Arc::new(HeadlessPlatform::new()),
        &[
            r#"{"newActivity":{}}"#,
            r#"{"createSurfaceView":{"aid":0}}"#,
            r#"{"createHardwareBuffer":{"width":4,"height":4}}"#,
            r#"{"setSurfaceBuffer":{"aid":0,"id":2,"buffer":3}}"#,
            r#"{"destroyHardwareBuffer":{"buffer":3}}"#,
            r#"{"setSurfaceBuffer":{"aid":0,"id":2,"buffer":3}}"#,
        ],
    );

    assert_eq!(
        outcome.responses[1..],
        [
            Response::created(2),
            Response::created(3),
            Response::ok(),
            Response::ok(),
            Response::failed(ErrorCode::NotFound),
        ]
    );
}

#[test]
fn teardown_finishes_activities_and_is_idempotent() {
    let platform = Arc::new(HeadlessPlatform::new());
    let session = Session::new(platform.clone(), Capture::default(), &SessionConfig::default())
        .expect("start session");
    session.run(&mut input(&[
        r#"{"newActivity":{}}"#,
        r#"{"newActivity":{"tid":1}}"#,
    ]));

    assert!(platform.live_activities().is_empty());
    assert_eq!(platform.finished_activities().len(), 2);
    assert_eq!(platform.listener_removals(), 1);

    session.teardown();
    drop(session);
    assert_eq!(platform.finished_activities().len(), 2);
    assert_eq!(platform.listener_removals(), 1);
}

fn read_server_frame(stream: &mut UnixStream) -> ServerFrame {
    let payload = read_frame(stream, CAP).expect("read server frame");
    serde_json::from_slice(&payload).expect("decode server frame")
}

#[test]
fn platform_events_stream_in_order_until_interrupted() {
    let (client, server) = UnixStream::pair().expect("socket pair");
    let platform = Arc::new(HeadlessPlatform::new());
    let interrupter = Interrupter::default();

    let session_platform: Arc<dyn Platform> = platform.clone();
    let session_interrupter = interrupter.clone();
    let handle = thread::spawn(move || {
        serve_unix_stream(
            server,
            session_platform,
            &SessionConfig::default(),
            session_interrupter,
        )
    });

    let mut client_out = client.try_clone().expect("clone client");
    let mut client_in = client;
    write_frame(&mut client_out, br#"{"newActivity":{}}"#, CAP).expect("send request");
    client_out.flush().expect("flush request");

    let mut responses = Vec::new();
    let mut events = Vec::new();
    while responses.len() + events.len() < 4 {
        match read_server_frame(&mut client_in) {
            ServerFrame::Response(response) => responses.push(response),
            ServerFrame::Event(event) => events.push(event),
        }
    }
    assert_eq!(
        responses,
        vec![Response::NewActivity {
            aid: 0,
            tid: 1,
            code: None
        }]
    );

    platform.kill_activity(0);
    while events.len() < 6 {
        match read_server_frame(&mut client_in) {
            ServerFrame::Event(event) => events.push(event),
            other => panic!("expected event, got {other:?}"),
        }
    }
    assert_eq!(
        events,
        vec![
            Event::Create { aid: 0 },
            Event::Start { aid: 0 },
            Event::Resume { aid: 0 },
            Event::Pause {
                aid: 0,
                finishing: false
            },
            Event::Stop {
                aid: 0,
                finishing: false
            },
            Event::Destroy {
                aid: 0,
                finishing: false
            },
        ]
    );

    interrupter.interrupt();
    let termination = handle
        .join()
        .expect("session thread")
        .expect("session setup");
    assert!(
        matches!(termination, Termination::Interrupted),
        "got {termination:?}"
    );
    assert_eq!(platform.listener_count(), 0);
}
