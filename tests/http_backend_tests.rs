//! HttpBackend against a mock booking service

use museum_chat::backend::{
    BookingData, BookingInfo, CancelBookingRequest, OtpRequest, PaymentVerification,
    TicketRequest, UserInfoRequest,
};
use museum_chat::payment::{verification_payload, CheckoutSuccess};
use museum_chat::{BackendError, HttpBackend, MuseumBackend};
use wiremock::matchers::{body_json, body_partial_json, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn backend(server: &MockServer) -> HttpBackend {
    HttpBackend::with_base_url(server.uri()).unwrap()
}

fn user_info() -> UserInfoRequest {
    UserInfoRequest {
        name: "Asha Rao".to_string(),
        phone: "9876543210".to_string(),
        email: "asha@example.com".to_string(),
        age: Some("34".to_string()),
        gender: Some("female".to_string()),
        country: Some("India".to_string()),
        state: Some("Karnataka".to_string()),
        pincode: Some("560001".to_string()),
    }
}

fn booking() -> BookingInfo {
    BookingInfo {
        amount: 10_000,
        currency: "INR".to_string(),
        receipt: "receipt#abcd1234".to_string(),
        booking_data: BookingData {
            name: "Asha Rao".to_string(),
            mail: "asha@example.com".to_string(),
            phone: "9876543210".to_string(),
            ticket: "1".to_string(),
            date: "2026-10-20".to_string(),
            time: "11:15".to_string(),
            location: "Museum of Natural History, New York".to_string(),
            passengers: vec![],
        },
    }
}

fn verification() -> PaymentVerification {
    verification_payload(
        CheckoutSuccess {
            razorpay_order_id: "order_9".to_string(),
            razorpay_payment_id: "pay_9".to_string(),
            razorpay_signature: "sig_9".to_string(),
        },
        &booking(),
    )
}

#[tokio::test]
async fn test_validate_user_info_posts_form() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/validate-user-info"))
        .and(body_partial_json(serde_json::json!({
            "email": "asha@example.com",
            "state": "Karnataka"
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "message": "OTP sent to asha@example.com"
        })))
        .expect(1)
        .mount(&server)
        .await;

    let reply = backend(&server).validate_user_info(&user_info()).await.unwrap();
    assert_eq!(reply.message.as_deref(), Some("OTP sent to asha@example.com"));
}

#[tokio::test]
async fn test_rejection_carries_message_and_field_errors() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/validate-user-info"))
        .respond_with(ResponseTemplate::new(422).set_body_json(serde_json::json!({
            "message": "Invalid data",
            "errors": {"phone": "Phone number must have 10 digits"}
        })))
        .mount(&server)
        .await;

    let err = backend(&server)
        .validate_user_info(&user_info())
        .await
        .unwrap_err();

    match err {
        BackendError::Rejected {
            status,
            message,
            field_errors,
            ..
        } => {
            assert_eq!(status, 422);
            assert_eq!(message.as_deref(), Some("Invalid data"));
            assert_eq!(
                field_errors.get("phone").map(String::as_str),
                Some("Phone number must have 10 digits")
            );
        }
        other => panic!("expected rejection, got {:?}", other),
    }
}

#[tokio::test]
async fn test_rejection_without_json_body() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/verify-otp"))
        .respond_with(ResponseTemplate::new(500).set_body_string("Internal Server Error"))
        .mount(&server)
        .await;

    let err = backend(&server)
        .verify_otp(&OtpRequest {
            email: "asha@example.com".to_string(),
            otp: "111111".to_string(),
        })
        .await
        .unwrap_err();

    assert!(matches!(
        err,
        BackendError::Rejected {
            status: 500,
            message: None,
            ..
        }
    ));
}

#[tokio::test]
async fn test_create_order_decodes_descriptor() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/create-order"))
        .and(body_partial_json(serde_json::json!({
            "amount": 10000,
            "receipt": "receipt#abcd1234",
            "bookingData": {"mail": "asha@example.com"}
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "status": "success",
            "orderId": "order_9",
            "amount": 10000,
            "currency": "INR"
        })))
        .mount(&server)
        .await;

    let order = backend(&server).create_order(&booking()).await.unwrap();
    assert!(order.is_success());
    assert_eq!(order.order_id, "order_9");
}

#[tokio::test]
async fn test_verify_payment_merges_booking_info() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/verify-payment"))
        .and(body_partial_json(serde_json::json!({
            "razorpay_order_id": "order_9",
            "razorpay_payment_id": "pay_9",
            "razorpay_signature": "sig_9",
            "bookingInfo": {"ticketCount": "1", "email": "asha@example.com"},
            "amount": 10000,
            "currency": "INR"
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "status": "success"
        })))
        .expect(1)
        .mount(&server)
        .await;

    let reply = backend(&server)
        .verify_payment(&verification(), &booking())
        .await
        .unwrap();
    assert!(reply.is_success());
}

#[tokio::test]
async fn test_generate_ticket_returns_bytes() {
    let server = MockServer::start().await;
    let png = vec![0x89, b'P', b'N', b'G', 0x0d, 0x0a];

    Mock::given(method("POST"))
        .and(path("/generate-ticket"))
        .and(body_json(serde_json::json!({
            "payment_id": "pay_9",
            "date": "20-10-2026",
            "name": "Asha Rao",
            "ticket": "1",
            "valid_status": 1,
            "email": "asha@example.com"
        })))
        .respond_with(
            ResponseTemplate::new(200)
                .insert_header("content-type", "image/png")
                .set_body_bytes(png.clone()),
        )
        .mount(&server)
        .await;

    let image = backend(&server)
        .generate_ticket(&TicketRequest {
            payment_id: "pay_9".to_string(),
            date: "20-10-2026".to_string(),
            name: "Asha Rao".to_string(),
            ticket: "1".to_string(),
            valid_status: 1,
            email: "asha@example.com".to_string(),
        })
        .await
        .unwrap();

    assert_eq!(image.bytes, png);
    assert_eq!(image.content_type.as_deref(), Some("image/png"));
}

#[tokio::test]
async fn test_cancellation_endpoints() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/send-otp"))
        .and(body_json(serde_json::json!({"email": "asha@example.com"})))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "status": "success",
            "message": "OTP sent"
        })))
        .mount(&server)
        .await;

    Mock::given(method("POST"))
        .and(path("/cancel-booking"))
        .and(body_json(serde_json::json!({
            "email": "asha@example.com",
            "date": "20-10-2026"
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "status": "success",
            "message": "Booking cancelled"
        })))
        .mount(&server)
        .await;

    let backend = backend(&server);
    let sent = backend.send_cancellation_otp("asha@example.com").await.unwrap();
    assert!(sent.is_success());

    let cancelled = backend
        .cancel_booking(&CancelBookingRequest {
            email: "asha@example.com".to_string(),
            date: "20-10-2026".to_string(),
        })
        .await
        .unwrap();
    assert_eq!(cancelled.message.as_deref(), Some("Booking cancelled"));
}

#[tokio::test]
async fn test_undecodable_reply() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/create-order"))
        .respond_with(ResponseTemplate::new(200).set_body_string("not json"))
        .mount(&server)
        .await;

    let err = backend(&server).create_order(&booking()).await.unwrap_err();
    assert!(matches!(err, BackendError::Decode { .. }));
}

#[tokio::test]
async fn test_unreachable_backend() {
    // Nothing listens on port 9 of localhost
    let backend = HttpBackend::with_base_url("http://127.0.0.1:9").unwrap();
    let err = backend
        .send_cancellation_otp("asha@example.com")
        .await
        .unwrap_err();
    assert!(matches!(err, BackendError::Transport { .. }));
}
