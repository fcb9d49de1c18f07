//! Integration tests for the saved-address API and background saving.
//!
//! These tests use mockito to stand in for the delivery backend.
//!
//! Run with: `cargo test -p delivery-integration-tests --test profile_api`

#![allow(clippy::unwrap_used, clippy::indexing_slicing)]

use std::time::Duration;

use delivery_checkout::{
    AddressInput, AddressMode, ApiConfig, CheckoutConfig, ProfileClient, ProfileError,
    SavedAddress, Session,
};
use delivery_core::{AddressForm, CartItem, StructuredAddress, UserId};
use mockito::{Matcher, Server};
use rust_decimal::Decimal;
use secrecy::SecretString;
use serde_json::json;
use url::Url;

// ============================================================================
// Test Helpers
// ============================================================================

const TOKEN: &str = "k9Qm2vXr7TzL4pWb8NcY";

fn api_config(server: &Server) -> ApiConfig {
    ApiConfig {
        base_url: Url::parse(&format!("{}/api/", server.url())).unwrap(),
        token: Some(SecretString::from(TOKEN.to_string())),
    }
}

fn session_config(server: &Server, user_id: i64) -> CheckoutConfig {
    CheckoutConfig {
        api: Some(api_config(server)),
        user_id: Some(UserId::new(user_id)),
        ..CheckoutConfig::default()
    }
}

fn sample_form() -> AddressForm {
    AddressForm {
        street: "Rua A".to_string(),
        number: "10".to_string(),
        complement: String::new(),
        neighborhood: "Centro".to_string(),
        city: "SP".to_string(),
        state: "SP".to_string(),
        zipcode: "01000-000".to_string(),
    }
}

// ============================================================================
// Fetching the Saved Address
// ============================================================================

#[tokio::test]
async fn test_get_structured_address_with_bearer_token() {
    let mut server = Server::new_async().await;
    let mock = server
        .mock("GET", "/api/users/1/address")
        .match_header("authorization", format!("Bearer {TOKEN}").as_str())
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body(
            json!({
                "street": "Rua A",
                "number": "10",
                "complement": null,
                "neighborhood": "Centro",
                "city": "SP",
                "state": "SP",
                "zipcode": "01000-000"
            })
            .to_string(),
        )
        .create_async()
        .await;

    let client = ProfileClient::new(&api_config(&server)).unwrap();
    let saved = client.get_address(UserId::new(1)).await.unwrap().unwrap();

    mock.assert_async().await;
    assert_eq!(saved, SavedAddress::Structured(sample_form()));
    assert_eq!(saved.display_line(), "Rua A, 10, Centro, SP - SP, 01000-000");
}

#[tokio::test]
async fn test_get_plain_text_address() {
    let mut server = Server::new_async().await;
    let _mock = server
        .mock("GET", "/api/users/2/address")
        .with_status(200)
        .with_body(r#""Av. Paulista, 1000""#)
        .create_async()
        .await;

    let client = ProfileClient::new(&api_config(&server)).unwrap();
    let saved = client.get_address(UserId::new(2)).await.unwrap();
    assert_eq!(saved, Some(SavedAddress::Text("Av. Paulista, 1000".to_string())));
}

#[tokio::test]
async fn test_missing_address_is_none() {
    let mut server = Server::new_async().await;
    let _not_found = server
        .mock("GET", "/api/users/3/address")
        .with_status(404)
        .create_async()
        .await;
    let _null = server
        .mock("GET", "/api/users/4/address")
        .with_status(200)
        .with_body("null")
        .create_async()
        .await;

    let client = ProfileClient::new(&api_config(&server)).unwrap();
    assert!(client.get_address(UserId::new(3)).await.unwrap().is_none());
    assert!(client.get_address(UserId::new(4)).await.unwrap().is_none());
}

#[tokio::test]
async fn test_server_error_is_reported() {
    let mut server = Server::new_async().await;
    let _mock = server
        .mock("GET", "/api/users/5/address")
        .with_status(500)
        .with_body("boom")
        .create_async()
        .await;

    let client = ProfileClient::new(&api_config(&server)).unwrap();
    match client.get_address(UserId::new(5)).await {
        Err(ProfileError::Api { status, message }) => {
            assert_eq!(status, 500);
            assert_eq!(message, "boom");
        }
        other => panic!("Expected Api error, got {other:?}"),
    }
}

// ============================================================================
// Saving and Deleting
// ============================================================================

#[tokio::test]
async fn test_update_sends_full_form() {
    let mut server = Server::new_async().await;
    let mock = server
        .mock("PUT", "/api/users/6/address")
        .match_body(Matcher::Json(json!({
            "street": "Rua A",
            "number": "10",
            "complement": "",
            "neighborhood": "Centro",
            "city": "SP",
            "state": "SP",
            "zipcode": "01000-000"
        })))
        .with_status(200)
        .with_body(r#"{"message":"Endereço atualizado"}"#)
        .create_async()
        .await;

    let client = ProfileClient::new(&api_config(&server)).unwrap();
    let address = StructuredAddress::try_from(sample_form()).unwrap();
    let message = client.update_address(UserId::new(6), &address).await.unwrap();

    mock.assert_async().await;
    assert_eq!(message, "Endereço atualizado");
}

#[tokio::test]
async fn test_delete_address() {
    let mut server = Server::new_async().await;
    let mock = server
        .mock("DELETE", "/api/users/7/address")
        .with_status(200)
        .with_body(r#"{"message":"Endereço removido"}"#)
        .create_async()
        .await;

    let client = ProfileClient::new(&api_config(&server)).unwrap();
    let message = client.delete_address(UserId::new(7)).await.unwrap();

    mock.assert_async().await;
    assert_eq!(message, "Endereço removido");
}

// ============================================================================
// Session Wiring
// ============================================================================

#[tokio::test]
async fn test_session_loads_saved_address_once() {
    let mut server = Server::new_async().await;
    let mock = server
        .mock("GET", "/api/users/8/address")
        .with_status(200)
        .with_body(r#""Rua das Flores, 5""#)
        .expect(1)
        .create_async()
        .await;

    let mut session = Session::connect(&session_config(&server, 8)).await.unwrap();
    assert_eq!(session.resolver().default_mode(), AddressMode::Saved);

    session.add_to_cart(CartItem::new("Pizza", Decimal::new(1000, 2)));
    session.proceed().unwrap();
    session.submit_address(&AddressInput::Saved).unwrap();
    session.back().unwrap();
    session.submit_address(&AddressInput::Saved).unwrap();
    session.finish_order().unwrap();

    mock.assert_async().await;
    let view = session.invoice();
    assert_eq!(view.invoice().unwrap().delivery_address(), "Rua das Flores, 5");
}

#[tokio::test]
async fn test_failed_fetch_does_not_block_checkout() {
    let mut server = Server::new_async().await;
    let _mock = server
        .mock("GET", "/api/users/9/address")
        .with_status(503)
        .create_async()
        .await;

    let mut session = Session::connect(&session_config(&server, 9)).await.unwrap();
    assert!(session.resolver().saved_address().is_none());

    session.add_to_cart(CartItem::new("Pizza", Decimal::new(1000, 2)));
    let order = session
        .quick_checkout(&AddressInput::Manual("Rua B, 2".to_string()))
        .unwrap();
    assert_eq!(order.delivery_address(), "Rua B, 2");
}

#[tokio::test]
async fn test_save_failure_is_captured_not_propagated() {
    let mut server = Server::new_async().await;
    let _get = server
        .mock("GET", "/api/users/10/address")
        .with_status(404)
        .create_async()
        .await;
    let put = server
        .mock("PUT", "/api/users/10/address")
        .with_status(500)
        .with_body("database down")
        .create_async()
        .await;

    let mut session = Session::connect(&session_config(&server, 10)).await.unwrap();
    session.add_to_cart(CartItem::new("Pizza", Decimal::new(1000, 2)));
    session.proceed().unwrap();
    session
        .submit_address(&AddressInput::Form {
            form: sample_form(),
            save: true,
        })
        .unwrap();
    session.finish_order().unwrap();
    assert!(session.cart().is_empty());

    assert!(session.settle_saves(Duration::from_secs(5)).await);
    put.assert_async().await;

    let failures = session.end();
    assert_eq!(failures.len(), 1);
    assert_eq!(failures[0].user_id, UserId::new(10));
    assert!(failures[0].message.contains("database down"));
}

#[tokio::test]
async fn test_back_transition_does_not_trigger_save() {
    let mut server = Server::new_async().await;
    let _get = server
        .mock("GET", "/api/users/11/address")
        .with_status(404)
        .create_async()
        .await;
    let put = server
        .mock("PUT", "/api/users/11/address")
        .with_status(200)
        .expect(0)
        .create_async()
        .await;

    let mut session = Session::connect(&session_config(&server, 11)).await.unwrap();
    session.add_to_cart(CartItem::new("Pizza", Decimal::new(1000, 2)));
    session.proceed().unwrap();
    session
        .submit_address(&AddressInput::Form {
            form: sample_form(),
            save: true,
        })
        .unwrap();
    session.back().unwrap();
    session.back().unwrap();

    assert!(session.settle_saves(Duration::from_secs(1)).await);
    put.assert_async().await;
    assert!(session.end().is_empty());
}
