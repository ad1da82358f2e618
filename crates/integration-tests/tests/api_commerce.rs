//! Integration tests for coupons, addresses, orders and uploads.
//!
//! These tests require a migrated database, an admin account and the admin
//! server running (see the crate docs).

use reqwest::StatusCode;
use reqwest::multipart::{Form, Part};
use serde_json::json;
use storedesk_integration_tests::{TestContext, base_url, id_of, read, unique_suffix};

/// `data` of `GET path`, asserting a 200.
async fn show(ctx: &TestContext, path: &str) -> serde_json::Value {
    let (status, body) = read(ctx.get(path).send().await.expect("get")).await;
    assert_eq!(status, StatusCode::OK, "GET {path}: {body}");
    body["data"].clone()
}

#[tokio::test]
#[ignore = "Requires running admin server and database"]
async fn test_coupon_validate() {
    let ctx = TestContext::admin().await;
    let code = format!("SAVE{}", unique_suffix()).to_uppercase();

    let coupon = ctx
        .create(
            "/coupons",
            &json!({
                "code": code.to_lowercase(),
                "type": "percentage",
                "value": 10,
                "minPurchase": 50,
                "startDate": "2020-01-01T00:00:00Z",
                "endDate": "2099-01-01T00:00:00Z",
                "usageLimit": 5
            }),
        )
        .await;
    assert_eq!(coupon["code"], code.as_str());

    let (status, body) = read(
        ctx.post("/coupons/validate")
            .json(&json!({"code": code, "subtotal": 200}))
            .send()
            .await
            .expect("validate"),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["discount"], 20.0);
    assert_eq!(body["data"]["total"], 180.0);

    // Below the minimum purchase.
    let (status, _) = read(
        ctx.post("/coupons/validate")
            .json(&json!({"code": code, "subtotal": 20}))
            .send()
            .await
            .expect("validate"),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    ctx.cleanup(&format!("/coupons/{}", id_of(&coupon))).await;
}

#[tokio::test]
#[ignore = "Requires running admin server and database"]
async fn test_single_default_address() {
    let ctx = TestContext::admin().await;
    let user = ctx.user["_id"].clone();

    let address = |line: &str| {
        json!({
            "user": user,
            "type": "shipping",
            "fullName": "Mai Tran",
            "phoneNumber": "0905000000",
            "addressLine1": line,
            "city": "Da Nang",
            "country": "VN",
            "isDefault": true
        })
    };
    let first = ctx.create("/addresses", &address("1 Bach Dang")).await;
    let second = ctx.create("/addresses", &address("2 Tran Phu")).await;
    assert_eq!(second["isDefault"], true);

    let (_, body) = read(
        ctx.get(&format!("/addresses/{}", id_of(&first)))
            .send()
            .await
            .expect("get address"),
    )
    .await;
    assert_eq!(body["data"]["isDefault"], false);

    ctx.cleanup(&format!("/addresses/{}", id_of(&first))).await;
    ctx.cleanup(&format!("/addresses/{}", id_of(&second))).await;
}

#[tokio::test]
#[ignore = "Requires running admin server and database"]
async fn test_default_address_changing_type_displaces_default() {
    let ctx = TestContext::admin().await;
    let user = ctx.user["_id"].clone();

    let address = |kind: &str, line: &str| {
        json!({
            "user": user,
            "type": kind,
            "fullName": "Mai Tran",
            "phoneNumber": "0905000000",
            "addressLine1": line,
            "city": "Hue",
            "country": "VN",
            "isDefault": true
        })
    };
    let billing = ctx.create("/addresses", &address("billing", "3 Le Loi")).await;
    let shipping = ctx.create("/addresses", &address("shipping", "4 Hung Vuong")).await;

    let (status, body) = read(
        ctx.put(&format!("/addresses/{}", id_of(&shipping)))
            .json(&json!({"type": "billing"}))
            .send()
            .await
            .expect("update address"),
    )
    .await;
    assert_eq!(status, StatusCode::OK, "{body}");
    assert_eq!(body["data"]["type"], "billing");
    assert_eq!(body["data"]["isDefault"], true);

    let old = show(&ctx, &format!("/addresses/{}", id_of(&billing))).await;
    assert_eq!(old["isDefault"], false);

    ctx.cleanup(&format!("/addresses/{}", id_of(&billing))).await;
    ctx.cleanup(&format!("/addresses/{}", id_of(&shipping))).await;
}

#[tokio::test]
#[ignore = "Requires running admin server and database"]
async fn test_default_payment_method_moved_to_another_user() {
    let ctx = TestContext::admin().await;
    let suffix = unique_suffix();
    let other = ctx
        .create(
            "/users",
            &json!({
                "userName": format!("buyer-{suffix}"),
                "fullName": "Lan Pham",
                "email": format!("buyer-{suffix}@example.org"),
                "password": "Buyer#2026pass"
            }),
        )
        .await;

    let method = |user: &serde_json::Value, account: &str| {
        json!({
            "user": user,
            "type": "bank_account",
            "provider": "Vietcombank",
            "accountNumber": account,
            "isDefault": true
        })
    };
    let mine = ctx.create("/payment-methods", &method(&ctx.user["_id"], "0071000111")).await;
    let theirs = ctx.create("/payment-methods", &method(&other["_id"], "0071000222")).await;

    let (status, body) = read(
        ctx.put(&format!("/payment-methods/{}", id_of(&theirs)))
            .json(&json!({"user": ctx.user["_id"]}))
            .send()
            .await
            .expect("update payment method"),
    )
    .await;
    assert_eq!(status, StatusCode::OK, "{body}");
    assert_eq!(body["data"]["isDefault"], true);

    let displaced = show(&ctx, &format!("/payment-methods/{}", id_of(&mine))).await;
    assert_eq!(displaced["isDefault"], false);

    ctx.cleanup(&format!("/payment-methods/{}", id_of(&mine))).await;
    ctx.cleanup(&format!("/payment-methods/{}", id_of(&theirs))).await;
    ctx.cleanup(&format!("/users/{}", id_of(&other))).await;
}

#[tokio::test]
#[ignore = "Requires running admin server and database"]
async fn test_order_number_generated() {
    let ctx = TestContext::admin().await;

    let order = ctx
        .create(
            "/orders",
            &json!({
                "user": ctx.user["_id"],
                "products": [{"name": "Green tea", "quantity": 1, "price": 4.5}],
                "paymentMethod": "cod",
                "shippingAddress": {"city": "Da Nang"}
            }),
        )
        .await;
    assert!(order["orderNumber"].as_str().is_some_and(|n| n.starts_with("ORD")));
    assert_eq!(order["status"], "pending");

    ctx.cleanup(&format!("/orders/{}", id_of(&order))).await;
}

#[tokio::test]
#[ignore = "Requires running admin server and database"]
async fn test_order_coupon_counts_one_use() {
    let ctx = TestContext::admin().await;
    let code = format!("ONCE{}", unique_suffix()).to_uppercase();
    let coupon = ctx
        .create(
            "/coupons",
            &json!({
                "code": code,
                "type": "fixed",
                "value": 15,
                "startDate": "2020-01-01T00:00:00Z",
                "endDate": "2099-01-01T00:00:00Z",
                "usageLimit": 1
            }),
        )
        .await;
    assert_eq!(coupon["usageCount"], 0);
    let coupon_path = format!("/coupons/{}", id_of(&coupon));

    let order_body = json!({
        "user": ctx.user["_id"],
        "products": [{"name": "Oolong", "quantity": 2, "price": 50}],
        "couponCode": code.to_lowercase(),
        "paymentMethod": "cod",
        "shippingAddress": {"city": "Hoi An"}
    });
    let order = ctx.create("/orders", &order_body).await;
    assert_eq!(order["discount"].as_f64(), Some(15.0));
    assert_eq!(order["totalAmount"].as_f64(), Some(85.0));
    assert_eq!(show(&ctx, &coupon_path).await["usageCount"], 1);

    // Same code again on update: no second use, stored discount kept.
    let (status, body) = read(
        ctx.put(&format!("/orders/{}", id_of(&order)))
            .json(&json!({
                "couponCode": code,
                "products": [{"name": "Oolong", "quantity": 3, "price": 50}]
            }))
            .send()
            .await
            .expect("update order"),
    )
    .await;
    assert_eq!(status, StatusCode::OK, "{body}");
    assert_eq!(body["data"]["discount"].as_f64(), Some(15.0));
    assert_eq!(body["data"]["totalAmount"].as_f64(), Some(135.0));
    assert_eq!(show(&ctx, &coupon_path).await["usageCount"], 1);

    let (status, body) = read(
        ctx.post("/orders")
            .json(&order_body)
            .send()
            .await
            .expect("second order"),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["errors"][0]["field"], "couponCode");
    assert_eq!(show(&ctx, &coupon_path).await["usageCount"], 1);

    ctx.cleanup(&format!("/orders/{}", id_of(&order))).await;
    ctx.cleanup(&coupon_path).await;
}

#[tokio::test]
#[ignore = "Requires running admin server and database"]
async fn test_oversized_cart_is_rejected() {
    let ctx = TestContext::admin().await;
    let (status, body) = read(
        ctx.post("/carts")
            .json(&json!({
                "user": ctx.user["_id"],
                "items": [{"name": "Big", "quantity": 1000, "price": 1.0e20}]
            }))
            .send()
            .await
            .expect("create cart"),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["statusCode"], 400);
    assert_eq!(body["errors"][0]["field"], "items[0].price");
}

#[tokio::test]
#[ignore = "Requires running admin server and database"]
async fn test_upload_single_image() {
    let ctx = TestContext::admin().await;
    // 1x1 transparent GIF.
    let gif: &[u8] = b"GIF89a\x01\x00\x01\x00\x80\x00\x00\x00\x00\x00\xff\xff\xff!\xf9\x04\x01\x00\x00\x00\x00,\x00\x00\x00\x00\x01\x00\x01\x00\x00\x02\x02D\x01\x00;";
    let part = Part::bytes(gif.to_vec())
        .file_name(format!("pixel-{}.gif", unique_suffix()))
        .mime_str("image/gif")
        .expect("mime");

    let (status, body) = read(
        ctx.post("/uploads/single/products")
            .multipart(Form::new().part("file", part))
            .send()
            .await
            .expect("upload"),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    let url = body["data"]["url"].as_str().expect("url").to_owned();
    assert!(url.contains("/uploads/products/"));
    assert!(url.ends_with(".gif"));

    let path = url.split("/uploads/").nth(1).expect("path");
    let resp = ctx
        .client
        .get(format!("{}/uploads/{path}", base_url()))
        .send()
        .await
        .expect("fetch upload");
    assert_eq!(resp.status(), StatusCode::OK);
}

#[tokio::test]
#[ignore = "Requires running admin server and database"]
async fn test_upload_rejects_unknown_collection() {
    let ctx = TestContext::admin().await;
    let part = Part::bytes(b"not really".to_vec())
        .file_name("x.png")
        .mime_str("image/png")
        .expect("mime");

    let resp = ctx
        .post("/uploads/single/bad.name")
        .multipart(Form::new().part("file", part))
        .send()
        .await
        .expect("upload");
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
}
