use crate::{
    AUTO_SEND_PERIOD, Color, ColorSink, Dispatcher, HttpColorSink, NotificationKind, Notifier,
    SinkResponse, describe_response, testing::CountingSink,
};

use std::{sync::Arc, time::Duration};

use axum::{Json, Router, http::StatusCode, routing::post};
use tokio::sync::watch;

async fn spawn_color_service(status: StatusCode, body: &'static str) -> String {
    let app = Router::new().route("/api/color", post(move || async move { (status, body) }));
    spawn(app).await
}

#[allow(clippy::unwrap_used)]
async fn spawn(app: Router) -> String {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        let _ = axum::serve(listener, app).await;
    });
    format!("http://{}", addr)
}

fn dispatcher_with<S: ColorSink>(sink: Arc<S>, color: Color) -> (Dispatcher<S>, Notifier) {
    let notifier = Notifier::new();
    let (_tx, rx) = watch::channel(color);
    (Dispatcher::new(sink, rx, notifier.clone()), notifier)
}

/// WHAT: 503 with a message surfaces that message as an error
/// WHY: The service explains why the bulb is unreachable
#[tokio::test]
#[allow(clippy::unwrap_used)]
async fn given_503_with_message_when_sending_then_error_with_message() {
    // Given: A service answering 503 {"message":"no ip"}
    let url = spawn_color_service(StatusCode::SERVICE_UNAVAILABLE, r#"{"message":"no ip"}"#).await;
    let sink = Arc::new(HttpColorSink::new(&url).unwrap());
    let (dispatcher, notifier) = dispatcher_with(sink, Color::from_rgb(1, 2, 3));

    // When: Sending once
    let kind = dispatcher.send_color().await;

    // Then: One error notification with the service's text
    assert_eq!(kind, NotificationKind::Error);
    let shown = notifier.active();
    assert_eq!(shown.len(), 1);
    assert_eq!(shown[0].text, "no ip");
    assert_eq!(shown[0].kind, NotificationKind::Error);
}

/// WHAT: 503 without a body falls back to the not-configured message
/// WHY: The status alone means the bulb address is not set up
#[tokio::test]
#[allow(clippy::unwrap_used)]
async fn given_503_with_empty_body_when_sending_then_default_message() {
    let url = spawn_color_service(StatusCode::SERVICE_UNAVAILABLE, "").await;
    let sink = Arc::new(HttpColorSink::new(&url).unwrap());
    let (dispatcher, notifier) = dispatcher_with(sink, Color::default());

    dispatcher.send_color().await;

    assert_eq!(
        notifier.active()[0].text,
        "Bulb IP not configured. Set shelly.ip or SHELLY_IP."
    );
}

/// WHAT: The request carries the current color as JSON
/// WHY: The service validates r, g, b and w as a JSON object
#[tokio::test]
#[allow(clippy::unwrap_used)]
async fn given_current_color_when_sending_then_service_receives_it() {
    // Given: A service accepting only rgbw(9,8,7,0)
    let app = Router::new().route(
        "/api/color",
        post(|Json(color): Json<Color>| async move {
            if color == Color::from_rgb(9, 8, 7) {
                (StatusCode::OK, r#"{"status":"ok"}"#)
            } else {
                (StatusCode::BAD_REQUEST, r#"{"message":"wrong color"}"#)
            }
        }),
    );
    let url = spawn(app).await;
    let sink = Arc::new(HttpColorSink::new(&format!("{}/", url)).unwrap());
    let (dispatcher, notifier) = dispatcher_with(sink, Color::from_rgb(9, 8, 7));

    // When: Sending
    let kind = dispatcher.send_color().await;

    // Then: Success naming the sent values
    assert_eq!(kind, NotificationKind::Ok);
    assert_eq!(notifier.active()[0].text, "Sent color rgbw(9,8,7,0)");
}

/// WHAT: Unreachable service reports the transport failure
/// WHY: No response at all still resolves into one notification
#[tokio::test]
#[allow(clippy::unwrap_used)]
async fn given_unreachable_service_when_sending_then_request_failed_error() {
    // Given: A port nothing listens on
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let url = format!("http://{}", listener.local_addr().unwrap());
    drop(listener);
    let sink = Arc::new(HttpColorSink::new(&url).unwrap());
    let (dispatcher, notifier) = dispatcher_with(sink, Color::default());

    // When: Sending
    let kind = dispatcher.send_color().await;

    // Then: A single error
    assert_eq!(kind, NotificationKind::Error);
    let shown = notifier.active();
    assert_eq!(shown.len(), 1);
    assert!(shown[0].text.starts_with("Request failed: "));
}

/// WHAT: Status codes map to the documented texts
/// WHY: Each failure class has its own fallback message
#[test]
fn given_statuses_when_describing_then_documented_texts() {
    let color = Color::from_rgb(4, 5, 6);
    let response = |status, message: Option<&str>| SinkResponse {
        status,
        message: message.map(str::to_string),
    };

    let cases = [
        (response(200, None), "Sent color rgbw(4,5,6,0)", NotificationKind::Ok),
        (response(204, Some("ignored")), "Sent color rgbw(4,5,6,0)", NotificationKind::Ok),
        (response(400, None), "Invalid color payload", NotificationKind::Error),
        (response(400, Some("bad r")), "bad r", NotificationKind::Error),
        (response(500, None), "Network error (500)", NotificationKind::Error),
        (response(418, Some("teapot")), "teapot", NotificationKind::Error),
    ];

    for (resp, text, kind) in cases {
        assert_eq!(describe_response(color, &resp), (text.to_string(), kind));
    }
}

/// WHAT: Starting auto twice yields a single repeating send
/// WHY: Restart must replace the timer, never duplicate ticks
#[tokio::test(start_paused = true)]
async fn given_auto_started_twice_when_time_passes_then_one_send_per_period() {
    // Given: Auto mode started twice
    let sink = Arc::new(CountingSink::responding(200, None));
    let (mut dispatcher, _notifier) = dispatcher_with(Arc::clone(&sink), Color::from_rgb(1, 1, 1));
    dispatcher.start_auto();
    dispatcher.start_auto();

    // When: 10.5 seconds pass
    tokio::time::sleep(Duration::from_millis(10_500)).await;

    // Then: Exactly three sends happened (t=3s, 6s, 9s)
    assert_eq!(sink.calls(), 3);
    assert!(dispatcher.is_auto_running());
}

/// WHAT: Auto sends whatever the color is at tick time
/// WHY: Auto mode is independent of the sampler and may be stale
#[tokio::test(start_paused = true)]
async fn given_changing_color_when_auto_running_then_each_tick_sends_latest() {
    let sink = Arc::new(CountingSink::responding(200, None));
    let (tx, rx) = watch::channel(Color::from_rgb(1, 0, 0));
    let mut dispatcher = Dispatcher::new(Arc::clone(&sink), rx, Notifier::new());
    dispatcher.start_auto();

    tokio::time::sleep(AUTO_SEND_PERIOD + Duration::from_millis(10)).await;
    tx.send_replace(Color::from_rgb(0, 2, 0));
    tokio::time::sleep(AUTO_SEND_PERIOD).await;

    assert_eq!(
        sink.colors(),
        vec![Color::from_rgb(1, 0, 0), Color::from_rgb(0, 2, 0)]
    );
}

/// WHAT: Stop auto halts sends and is idempotent
/// WHY: Toggling auto off must stop traffic immediately
#[tokio::test(start_paused = true)]
async fn given_running_auto_when_stopped_then_no_further_sends() {
    let sink = Arc::new(CountingSink::failing("connection refused"));
    let (mut dispatcher, notifier) = dispatcher_with(Arc::clone(&sink), Color::default());
    dispatcher.start_auto();
    tokio::time::sleep(AUTO_SEND_PERIOD + Duration::from_millis(10)).await;

    // Failures in auto mode are reported like any other send.
    let shown = notifier.active();
    assert_eq!(shown.len(), 1);
    assert_eq!(shown[0].text, "Request failed: connection refused");

    dispatcher.stop_auto();
    dispatcher.stop_auto();
    tokio::time::sleep(AUTO_SEND_PERIOD * 3).await;

    assert_eq!(sink.calls(), 1);
    assert!(!dispatcher.is_auto_running());
}

/// WHAT: A detached send returns at once and reports when the answer arrives
/// WHY: Callers on the event loop must never wait on the color service
#[tokio::test(start_paused = true)]
#[allow(clippy::unwrap_used)]
async fn given_detached_send_when_service_hangs_then_caller_not_blocked() {
    // Given: One sink that never answers and one that answers 200
    let hung = Arc::new(CountingSink::hanging());
    let (hung_dispatcher, hung_notifier) = dispatcher_with(Arc::clone(&hung), Color::default());
    let ok = Arc::new(CountingSink::responding(200, None));
    let (ok_dispatcher, ok_notifier) = dispatcher_with(ok, Color::from_rgb(9, 8, 7));

    // When: Sending detached through both
    let pending = hung_dispatcher.spawn_send();
    let answered = ok_dispatcher.spawn_send();

    // Then: The answered send resolves to exactly one success notification
    assert_eq!(answered.await.unwrap(), NotificationKind::Ok);
    let shown = ok_notifier.active();
    assert_eq!(shown.len(), 1);
    assert_eq!(shown[0].text, "Sent color rgbw(9,8,7,0)");

    // Then: The hung send is still outstanding without any notification
    tokio::time::sleep(Duration::from_secs(60)).await;
    assert_eq!(hung.calls(), 1);
    assert!(!pending.is_finished());
    assert!(hung_notifier.active().is_empty());
    pending.abort();
}
