mod common;

use reqwest::StatusCode;
use serde_json::json;

use common::{body_of, spawn_app};

#[tokio::test]
async fn cart_requires_a_token() {
    let app = spawn_app().await;

    let response = app
        .client
        .get(app.url("/api/cart"))
        .send()
        .await
        .expect("request");
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    let body = body_of(response).await;
    assert_eq!(body["success"], false);
}

#[tokio::test]
async fn new_shopper_sees_an_empty_cart() {
    let app = spawn_app().await;
    let token = app.shopper_token("empty@shoppy.test").await;

    let response = app
        .client
        .get(app.url("/api/cart"))
        .bearer_auth(&token)
        .send()
        .await
        .expect("request");
    assert_eq!(response.status(), StatusCode::OK);

    let body = body_of(response).await;
    assert_eq!(body["success"], true);
    assert_eq!(body["message"], "Cart is empty");
    assert_eq!(body["data"]["cart"]["items"], json!([]));
    assert_eq!(body["data"]["cart"]["total_items"], 0);
    assert_eq!(body["data"]["cart"]["total_price_cents"], 0);
}

#[tokio::test]
async fn adding_twice_merges_into_one_line() {
    let app = spawn_app().await;
    let admin = app.admin_token().await;
    let token = app.shopper_token("merge@shoppy.test").await;
    let product_id = app.create_product(&admin, "Keyboard", 4_999, 5).await;

    for quantity in [2, 1] {
        let response = app
            .client
            .post(app.url("/api/cart"))
            .bearer_auth(&token)
            .json(&json!({ "productId": product_id, "quantity": quantity }))
            .send()
            .await
            .expect("request");
        assert_eq!(response.status(), StatusCode::OK);
    }

    let response = app
        .client
        .get(app.url("/api/cart"))
        .bearer_auth(&token)
        .send()
        .await
        .expect("request");
    let body = body_of(response).await;
    let cart = &body["data"]["cart"];
    assert_eq!(cart["items"].as_array().map(Vec::len), Some(1));
    assert_eq!(cart["items"][0]["product_id"], product_id);
    assert_eq!(cart["items"][0]["quantity"], 3);
    assert_eq!(cart["items"][0]["product"]["name"], "Keyboard");
    assert_eq!(cart["total_items"], 3);
    assert_eq!(cart["total_price_cents"], 3 * 4_999);
}

#[tokio::test]
async fn add_rejects_missing_products_and_short_stock() {
    let app = spawn_app().await;
    let admin = app.admin_token().await;
    let token = app.shopper_token("stock@shoppy.test").await;
    let product_id = app.create_product(&admin, "Mouse", 1_500, 2).await;

    let missing = app
        .client
        .post(app.url("/api/cart"))
        .bearer_auth(&token)
        .json(&json!({ "product_id": 9_999, "quantity": 1 }))
        .send()
        .await
        .expect("request");
    assert_eq!(missing.status(), StatusCode::NOT_FOUND);

    let too_many = app
        .client
        .post(app.url("/api/cart"))
        .bearer_auth(&token)
        .json(&json!({ "product_id": product_id, "quantity": 3 }))
        .send()
        .await
        .expect("request");
    assert_eq!(too_many.status(), StatusCode::BAD_REQUEST);

    let zero = app
        .client
        .post(app.url("/api/cart"))
        .bearer_auth(&token)
        .json(&json!({ "product_id": product_id, "quantity": 0 }))
        .send()
        .await
        .expect("request");
    assert_eq!(zero.status(), StatusCode::BAD_REQUEST);

    let fits = app
        .client
        .post(app.url("/api/cart"))
        .bearer_auth(&token)
        .json(&json!({ "product_id": product_id, "quantity": 2 }))
        .send()
        .await
        .expect("request");
    assert_eq!(fits.status(), StatusCode::OK);

    // the combined quantity would exceed stock
    let combined = app
        .client
        .post(app.url("/api/cart"))
        .bearer_auth(&token)
        .json(&json!({ "product_id": product_id, "quantity": 1 }))
        .send()
        .await
        .expect("request");
    assert_eq!(combined.status(), StatusCode::BAD_REQUEST);
    let body = body_of(combined).await;
    assert_eq!(body["success"], false);
}

#[tokio::test]
async fn update_and_remove_items() {
    let app = spawn_app().await;
    let admin = app.admin_token().await;
    let token = app.shopper_token("update@shoppy.test").await;
    let lamp = app.create_product(&admin, "Lamp", 2_000, 10).await;
    let desk = app.create_product(&admin, "Desk", 15_000, 1).await;

    // no cart yet
    let response = app
        .client
        .put(app.url(&format!("/api/cart/{lamp}")))
        .bearer_auth(&token)
        .json(&json!({ "quantity": 2 }))
        .send()
        .await
        .expect("request");
    assert_eq!(response.status(), StatusCode::NOT_FOUND);

    app.client
        .post(app.url("/api/cart"))
        .bearer_auth(&token)
        .json(&json!({ "product_id": lamp, "quantity": 1 }))
        .send()
        .await
        .expect("request");

    let response = app
        .client
        .put(app.url(&format!("/api/cart/{lamp}")))
        .bearer_auth(&token)
        .json(&json!({ "quantity": 4 }))
        .send()
        .await
        .expect("request");
    assert_eq!(response.status(), StatusCode::OK);
    let body = body_of(response).await;
    assert_eq!(body["data"]["cart"]["items"][0]["quantity"], 4);
    assert_eq!(body["data"]["cart"]["total_price_cents"], 8_000);

    let not_in_cart = app
        .client
        .put(app.url(&format!("/api/cart/{desk}")))
        .bearer_auth(&token)
        .json(&json!({ "quantity": 1 }))
        .send()
        .await
        .expect("request");
    assert_eq!(not_in_cart.status(), StatusCode::NOT_FOUND);

    let over_stock = app
        .client
        .put(app.url(&format!("/api/cart/{lamp}")))
        .bearer_auth(&token)
        .json(&json!({ "quantity": 11 }))
        .send()
        .await
        .expect("request");
    assert_eq!(over_stock.status(), StatusCode::BAD_REQUEST);

    let response = app
        .client
        .delete(app.url(&format!("/api/cart/{lamp}")))
        .bearer_auth(&token)
        .send()
        .await
        .expect("request");
    assert_eq!(response.status(), StatusCode::OK);
    let body = body_of(response).await;
    assert_eq!(body["data"]["cart"]["items"], json!([]));
    assert_eq!(body["data"]["cart"]["total_items"], 0);

    let again = app
        .client
        .delete(app.url(&format!("/api/cart/{lamp}")))
        .bearer_auth(&token)
        .send()
        .await
        .expect("request");
    assert_eq!(again.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn clear_empties_the_cart() {
    let app = spawn_app().await;
    let admin = app.admin_token().await;
    let token = app.shopper_token("clear@shoppy.test").await;
    let a = app.create_product(&admin, "Pen", 150, 10).await;
    let b = app.create_product(&admin, "Notebook", 450, 10).await;

    let no_cart = app
        .client
        .delete(app.url("/api/cart"))
        .bearer_auth(&token)
        .send()
        .await
        .expect("request");
    assert_eq!(no_cart.status(), StatusCode::NOT_FOUND);

    for product_id in [a, b] {
        app.client
            .post(app.url("/api/cart"))
            .bearer_auth(&token)
            .json(&json!({ "product_id": product_id, "quantity": 2 }))
            .send()
            .await
            .expect("request");
    }

    let response = app
        .client
        .delete(app.url("/api/cart"))
        .bearer_auth(&token)
        .send()
        .await
        .expect("request");
    assert_eq!(response.status(), StatusCode::OK);
    let body = body_of(response).await;
    assert_eq!(body["message"], "Cart cleared successfully");
    assert_eq!(body["data"]["cart"]["items"], json!([]));
    assert_eq!(body["data"]["cart"]["total_price_cents"], 0);
}

#[tokio::test]
async fn deactivated_products_drop_out_of_the_cart_view() {
    let app = spawn_app().await;
    let admin = app.admin_token().await;
    let token = app.shopper_token("hidden@shoppy.test").await;
    let kept = app.create_product(&admin, "Kept", 1_000, 10).await;
    let gone = app.create_product(&admin, "Gone", 2_000, 10).await;

    for product_id in [kept, gone] {
        app.client
            .post(app.url("/api/cart"))
            .bearer_auth(&token)
            .json(&json!({ "product_id": product_id, "quantity": 1 }))
            .send()
            .await
            .expect("request");
    }

    let response = app
        .client
        .delete(app.url(&format!("/api/products/{gone}")))
        .bearer_auth(&admin)
        .send()
        .await
        .expect("request");
    assert_eq!(response.status(), StatusCode::OK);

    let response = app
        .client
        .get(app.url("/api/cart"))
        .bearer_auth(&token)
        .send()
        .await
        .expect("request");
    let body = body_of(response).await;
    let cart = &body["data"]["cart"];
    assert_eq!(cart["items"].as_array().map(Vec::len), Some(1));
    assert_eq!(cart["items"][0]["product_id"], kept);
    assert_eq!(cart["total_items"], 1);
    assert_eq!(cart["total_price_cents"], 1_000);

    let re_add = app
        .client
        .post(app.url("/api/cart"))
        .bearer_auth(&token)
        .json(&json!({ "product_id": gone, "quantity": 1 }))
        .send()
        .await
        .expect("request");
    assert_eq!(re_add.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn concurrent_adds_never_oversell() {
    let app = spawn_app().await;
    let admin = app.admin_token().await;
    let token = app.shopper_token("race@shoppy.test").await;
    let product_id = app.create_product(&admin, "Last one", 9_900, 1).await;

    let requests = (0..4).map(|_| {
        app.client
            .post(app.url("/api/cart"))
            .bearer_auth(&token)
            .json(&json!({ "product_id": product_id, "quantity": 1 }))
            .send()
    });
    let statuses: Vec<StatusCode> = futures_statuses(requests).await;

    assert_eq!(statuses.iter().filter(|s| **s == StatusCode::OK).count(), 1);
    assert_eq!(
        statuses
            .iter()
            .filter(|s| **s == StatusCode::BAD_REQUEST)
            .count(),
        3
    );

    let response = app
        .client
        .get(app.url("/api/cart"))
        .bearer_auth(&token)
        .send()
        .await
        .expect("request");
    let body = body_of(response).await;
    assert_eq!(body["data"]["cart"]["items"][0]["quantity"], 1);
}

async fn futures_statuses<I, F>(requests: I) -> Vec<StatusCode>
where
    I: Iterator<Item = F>,
    F: std::future::Future<Output = reqwest::Result<reqwest::Response>> + Send + 'static,
{
    let handles: Vec<_> = requests.map(tokio::spawn).collect();
    let mut statuses = Vec::new();
    for handle in handles {
        statuses.push(handle.await.expect("join").expect("request").status());
    }
    statuses
}
