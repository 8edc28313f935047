use axum::body::Body;
use axum::http::{Request, StatusCode};
use ivr_api::build_app;
use ivr_api::config::RecordSource;
use ivr_tests::{app, app_with_originator, form_post, records_path, send, test_config};

#[tokio::test]
async fn root_and_health_are_public() {
    let app = app().await;

    let (status, _, body) = send(
        app.clone(),
        Request::builder().uri("/").body(Body::empty()).unwrap(),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    let parsed: serde_json::Value = serde_json::from_str(&body).unwrap();
    assert_eq!(parsed["message"], "Server Running");

    let (status, _, body) = send(
        app,
        Request::builder().uri("/health").body(Body::empty()).unwrap(),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    let parsed: serde_json::Value = serde_json::from_str(&body).unwrap();
    assert_eq!(parsed["status"], "ok");
    assert_eq!(parsed["record_backend"], "json");
    assert_eq!(parsed["capabilities"]["outbound_calls"], false);
}

#[tokio::test]
async fn entry_welcomes_and_asks_for_language() {
    let (status, content_type, body) = send(app().await, form_post("/voice", "CallSid=CA1")).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(content_type.as_deref(), Some("application/xml"));
    assert!(body.starts_with(r#"<?xml version="1.0" encoding="UTF-8"?><Response>"#));
    assert!(body.contains(r#"<Gather action="/language" method="POST" numDigits="1">"#));
    assert!(body.contains("Welcome to IRCTC Railway Enquiry System."));
    assert!(body.ends_with("<Say>No input received. Goodbye.</Say><Hangup/></Response>"));
}

#[tokio::test]
async fn english_selection_opens_main_menu() {
    let (_, _, body) = send(app().await, form_post("/language", "Digits=1&CallSid=CA1")).await;

    assert!(body.contains(r#"<Gather action="/main-menu" method="POST" numDigits="1">"#));
    assert!(body.contains("Press 0 to exit."));
    assert!(!body.contains("<Hangup/>"));
}

#[tokio::test]
async fn hindi_selection_over_get_hangs_up() {
    let request = Request::builder()
        .uri("/language?Digits=2")
        .body(Body::empty())
        .unwrap();
    let (_, _, body) = send(app().await, request).await;

    assert!(body.contains("<Say>Hindi option is under development.</Say><Hangup/>"));
}

#[tokio::test]
async fn missing_language_input_restarts_the_call() {
    let request = Request::builder()
        .method("POST")
        .uri("/language")
        .body(Body::empty())
        .unwrap();
    let (status, _, body) = send(app().await, request).await;

    assert_eq!(status, StatusCode::OK);
    assert!(body.contains(
        r#"<Say>Invalid selection.</Say><Redirect method="POST">/voice</Redirect>"#
    ));
}

#[tokio::test]
async fn pnr_option_collects_ten_digits() {
    let (_, _, body) = send(app().await, form_post("/main-menu", "Digits=1")).await;

    assert!(body.contains(r#"<Gather action="/pnr" method="POST" numDigits="10">"#));
    assert!(body.contains("Please enter your 10 digit PNR number."));
}

#[tokio::test]
async fn train_options_collect_five_digits() {
    let app = app().await;

    let (_, _, status_body) = send(app.clone(), form_post("/main-menu", "Digits=2")).await;
    assert!(
        status_body.contains(r#"<Gather action="/train-status" method="POST" numDigits="5">"#)
    );

    let (_, _, schedule_body) = send(app, form_post("/main-menu", "Digits=3")).await;
    assert!(
        schedule_body.contains(r#"<Gather action="/train-schedule" method="POST" numDigits="5">"#)
    );
}

#[tokio::test]
async fn nine_redirects_to_entry() {
    let (_, _, body) = send(app().await, form_post("/main-menu", "Digits=9")).await;

    assert!(body.ends_with(r#"<Response><Redirect method="POST">/voice</Redirect></Response>"#));
}

#[tokio::test]
async fn invalid_menu_digit_redirects_with_notice() {
    let app = app().await;
    for digits in ["6", "7", "8", "*", "42"] {
        let request = form_post("/main-menu", &format!("Digits={digits}"));
        let (_, _, body) = send(app.clone(), request).await;
        assert!(
            body.contains(
                r#"<Say>Invalid option selected.</Say><Redirect method="POST">/voice</Redirect>"#
            ),
            "digits {digits} should restart the call"
        );
    }
}

#[tokio::test]
async fn booking_info_returns_to_repeat_menu() {
    let (_, _, body) = send(app().await, form_post("/main-menu", "Digits=4")).await;

    assert!(body.contains("Booking opens 120 days before departure."));
    assert!(body.contains(r#"<Redirect method="POST">/repeat-menu</Redirect>"#));
}

#[tokio::test]
async fn exit_thanks_the_caller_and_hangs_up() {
    let (_, _, body) = send(app().await, form_post("/main-menu", "Digits=0")).await;

    assert!(body.contains("<Say>Thank you for calling IRCTC. Goodbye.</Say><Hangup/>"));
}

#[tokio::test]
async fn pnr_result_always_returns_to_repeat_menu() {
    let app = app().await;

    let (_, _, body) = send(app.clone(), form_post("/pnr", "Digits=1234567890")).await;
    assert!(body.contains(
        "<Say>PNR number 1234567890. Your ticket is confirmed. Coach S 3. Seat 45.</Say>"
    ));
    assert!(body.contains(r#"<Redirect method="POST">/repeat-menu</Redirect>"#));

    let (_, _, body) = send(app, form_post("/pnr", "")).await;
    assert!(body.contains(r#"<Redirect method="POST">/repeat-menu</Redirect>"#));
}

#[tokio::test]
async fn train_status_announces_on_time_running() {
    let (_, _, body) = send(app().await, form_post("/train-status", "Digits=12627")).await;

    assert!(body.contains("Train number 12627 is running on time. Expected arrival at 4 PM."));
    assert!(body.contains(r#"<Redirect method="POST">/repeat-menu</Redirect>"#));
}

// Known discrepancy: the repeat menu emits both a gather and a hangup. The
// hangup is rendered after the gather so it only runs when the caller enters
// nothing; this depends on the provider processing verbs in document order.
#[tokio::test]
async fn repeat_menu_gathers_then_hangs_up_on_silence() {
    let (_, _, body) = send(app().await, form_post("/repeat-menu", "")).await;

    assert!(body.contains(r#"<Gather action="/main-menu" method="POST" numDigits="1">"#));
    assert!(body.ends_with("</Gather><Hangup/></Response>"));
}

#[tokio::test]
async fn process_train_text_reads_record_and_hangs_up() {
    let (status, content_type, body) = send(
        app().await,
        form_post("/process", "simulated_text=show+my+train+status"),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(content_type.as_deref(), Some("application/xml"));
    assert!(body.ends_with(
        "<Say>Train departs at 10:00 AM and arrives at 4:00 PM.</Say><Hangup/></Response>"
    ));
}

#[tokio::test]
async fn process_pnr_text_uses_configured_demo_pnr() {
    let mut config = test_config();
    config.demo_ids.pnr = "4521098761".to_string();
    let app = build_app(config).await.unwrap();

    let (_, _, body) = send(
        app,
        form_post("/process", "simulated_text=My+PNR+for+the+train"),
    )
    .await;

    assert!(body.contains("<Say>Your ticket is Waitlisted in coach B1 seat 12.</Say><Hangup/>"));
}

#[tokio::test]
async fn process_without_text_is_not_understood() {
    let (status, _, body) = send(app().await, form_post("/process", "")).await;

    assert_eq!(status, StatusCode::OK);
    assert!(body.contains("<Say>Sorry, I did not understand your request.</Say><Hangup/>"));
}

#[tokio::test]
async fn missing_record_file_fails_startup() {
    let mut config = test_config();
    config.record_source = RecordSource::JsonFile(records_path().with_file_name("absent.json"));

    assert!(build_app(config).await.is_err());
}

#[tokio::test]
async fn trigger_call_without_telephony_is_unavailable() {
    let request = Request::builder()
        .uri("/trigger-call")
        .body(Body::empty())
        .unwrap();
    let (status, _, _) = send(app().await, request).await;

    assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
}

#[tokio::test]
async fn trigger_call_returns_call_sid_and_status() {
    let request = Request::builder()
        .uri("/trigger-call")
        .body(Body::empty())
        .unwrap();
    let (status, _, body) = send(app_with_originator(None, false).await, request).await;

    assert_eq!(status, StatusCode::OK);
    let parsed: serde_json::Value = serde_json::from_str(&body).unwrap();
    assert!(parsed["call_sid"].as_str().unwrap().starts_with("CA"));
    assert_eq!(parsed["status"], "queued");
}

#[tokio::test]
async fn trigger_call_requires_api_key_when_configured() {
    let app = app_with_originator(Some("ops-key"), false).await;

    let missing = Request::builder()
        .uri("/trigger-call")
        .body(Body::empty())
        .unwrap();
    let (status, _, _) = send(app.clone(), missing).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let with_key = Request::builder()
        .uri("/trigger-call")
        .header("x-api-key", "ops-key")
        .body(Body::empty())
        .unwrap();
    let (status, _, _) = send(app.clone(), with_key).await;
    assert_eq!(status, StatusCode::OK);

    let (status, _, _) = send(app, form_post("/main-menu", "Digits=1")).await;
    assert_eq!(status, StatusCode::OK);
}

#[tokio::test]
async fn provider_failure_maps_to_bad_gateway() {
    let request = Request::builder()
        .uri("/trigger-call")
        .body(Body::empty())
        .unwrap();
    let (status, _, body) = send(app_with_originator(None, true).await, request).await;

    assert_eq!(status, StatusCode::BAD_GATEWAY);
    assert!(body.contains("call_origination_failed"));
}
