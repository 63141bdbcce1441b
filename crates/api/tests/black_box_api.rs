use std::net::SocketAddr;

use galley_api::config::ApiConfig;
use galley_infra::GalleyConfig;
use reqwest::StatusCode;
use rust_decimal_macros::dec;
use serde_json::{Value, json};

struct TestServer {
    base_url: String,
    client: reqwest::Client,
    handle: tokio::task::JoinHandle<()>,
}

impl TestServer {
    async fn spawn() -> Self {
        // Same router as prod, bound to an ephemeral port.
        let config = ApiConfig {
            bind_addr: SocketAddr::from(([127, 0, 0, 1], 0)),
            galley: GalleyConfig {
                tax_rate: dec!(8.5),
                delivery_fee: dec!(5.00),
                chefs: vec!["Ana".into(), "Ben".into()],
                stations: vec!["Grill".into(), "Fry".into()],
                tables: vec![1, 2, 3],
            },
        };
        let app = galley_api::app::build_app(&config).expect("failed to build app");
        let listener = tokio::net::TcpListener::bind(config.bind_addr)
            .await
            .expect("failed to bind ephemeral port");
        let addr = listener.local_addr().unwrap();

        let handle = tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });

        Self {
            base_url: format!("http://{addr}"),
            client: reqwest::Client::new(),
            handle,
        }
    }

    async fn post(&self, path: &str, body: Value) -> (StatusCode, Value) {
        let res = self
            .client
            .post(format!("{}{path}", self.base_url))
            .header("x-galley-user", "tester")
            .json(&body)
            .send()
            .await
            .unwrap();
        let status = res.status();
        (status, res.json().await.unwrap_or(Value::Null))
    }

    async fn put(&self, path: &str, body: Value) -> (StatusCode, Value) {
        let res = self
            .client
            .put(format!("{}{path}", self.base_url))
            .json(&body)
            .send()
            .await
            .unwrap();
        let status = res.status();
        (status, res.json().await.unwrap_or(Value::Null))
    }

    async fn get(&self, path: &str) -> (StatusCode, Value) {
        let res = self
            .client
            .get(format!("{}{path}", self.base_url))
            .send()
            .await
            .unwrap();
        let status = res.status();
        (status, res.json().await.unwrap_or(Value::Null))
    }

    async fn delete(&self, path: &str) -> (StatusCode, Value) {
        let res = self
            .client
            .delete(format!("{}{path}", self.base_url))
            .send()
            .await
            .unwrap();
        let status = res.status();
        (status, res.json().await.unwrap_or(Value::Null))
    }

    async fn create_item(&self, name: &str, stock: &str, min: &str, cost: &str) -> String {
        let (status, body) = self
            .post(
                "/inventory/items",
                json!({
                    "name": name,
                    "category": "produce",
                    "unit": "kg",
                    "initial_stock": stock,
                    "min_stock": min,
                    "cost_per_unit": cost,
                }),
            )
            .await;
        assert_eq!(status, StatusCode::CREATED, "create item failed: {body}");
        body["id"].as_str().unwrap().to_string()
    }
}

impl Drop for TestServer {
    fn drop(&mut self) {
        self.handle.abort();
    }
}

#[tokio::test]
async fn health_is_public() {
    let srv = TestServer::spawn().await;
    let res = srv
        .client
        .get(format!("{}/health", srv.base_url))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::OK);
}

#[tokio::test]
async fn stock_adjustments_guard_against_negative_stock() {
    let srv = TestServer::spawn().await;
    let id = srv.create_item("Flour", "100", "10", "1.20").await;

    let (status, body) = srv
        .post(
            &format!("/inventory/items/{id}/adjust"),
            json!({ "quantity": "95", "adjustment_type": "subtract", "reason": "count" }),
        )
        .await;
    assert_eq!(status, StatusCode::OK, "adjust failed: {body}");
    assert_eq!(body["new_stock"], "5");
    assert_eq!(body["transaction"]["performed_by"], "tester");

    let (status, body) = srv
        .post(
            &format!("/inventory/items/{id}/adjust"),
            json!({ "quantity": "10", "adjustment_type": "subtract" }),
        )
        .await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(body["error"], "insufficient_stock");

    let (_, item) = srv.get(&format!("/inventory/items/{id}")).await;
    assert_eq!(item["current_stock"], "5");

    let (_, alerts) = srv.get("/inventory/alerts").await;
    assert_eq!(alerts["summary"]["low_stock"], 1);

    let (_, ledger) = srv.get(&format!("/inventory/items/{id}/transactions")).await;
    assert_eq!(ledger["total"], 2);

    let (_, balance) = srv.get(&format!("/inventory/items/{id}/ledger-balance")).await;
    assert_eq!(balance["ledger_balance"], balance["current_stock"]);
}

#[tokio::test]
async fn bad_ids_and_unknown_items_are_reported() {
    let srv = TestServer::spawn().await;

    let (status, body) = srv.get("/inventory/items/not-a-uuid").await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "invalid_id");

    let (status, body) = srv
        .get("/inventory/items/0190f7a4-0000-7000-8000-000000000000")
        .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["error"], "not_found");
}

#[tokio::test]
async fn purchase_receipt_delivers_and_restocks() {
    let srv = TestServer::spawn().await;
    let onions = srv.create_item("Onions", "5", "2", "0.80").await;

    let (status, supplier) = srv
        .post("/suppliers", json!({ "name": "Acme Produce" }))
        .await;
    assert_eq!(status, StatusCode::CREATED);

    let (status, purchase) = srv
        .post(
            "/purchases",
            json!({
                "supplier_id": supplier["id"],
                "order_date": "2026-03-14",
                "items": [
                    { "item": { "existing": onions }, "quantity": "20", "unit_cost": "0.75" },
                    {
                        "item": { "new": { "name": "Shallots", "category": "produce", "unit": "kg" } },
                        "quantity": "3",
                        "unit_cost": "4.10"
                    }
                ],
                "shipping": "5"
            }),
        )
        .await;
    assert_eq!(status, StatusCode::CREATED, "create purchase failed: {purchase}");
    assert_eq!(purchase["purchase_number"], "PO-20260314-0001");
    assert_eq!(purchase["status"], "pending");

    let lines: Vec<Value> = purchase["items"]
        .as_array()
        .unwrap()
        .iter()
        .map(|l| json!({ "purchase_item_id": l["id"], "received_quantity": l["quantity"] }))
        .collect();
    let id = purchase["id"].as_str().unwrap();
    let (status, outcome) = srv
        .post(&format!("/purchases/{id}/receive"), json!({ "items": lines }))
        .await;
    assert_eq!(status, StatusCode::OK, "receive failed: {outcome}");
    assert_eq!(outcome["purchase"]["status"], "delivered");
    assert_eq!(outcome["purchase"]["received_by"], "tester");
    assert_eq!(outcome["lines"]["applied"].as_array().unwrap().len(), 2);

    let (_, item) = srv.get(&format!("/inventory/items/{onions}")).await;
    assert_eq!(item["current_stock"], "25");

    let (status, body) = srv
        .delete(&format!("/suppliers/{}", supplier["id"].as_str().unwrap()))
        .await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(body["error"], "conflict");
}

#[tokio::test]
async fn waste_is_costed_and_restored_on_delete() {
    let srv = TestServer::spawn().await;
    let milk = srv.create_item("Milk", "50", "5", "2.50").await;

    let (status, waste) = srv
        .post(
            "/waste",
            json!({
                "inventory_id": milk,
                "quantity": "20",
                "reason": "spoiled",
                "waste_date": "2026-03-14"
            }),
        )
        .await;
    assert_eq!(status, StatusCode::CREATED, "create waste failed: {waste}");
    assert_eq!(waste["total_cost"], "50.00");
    assert_eq!(waste["recorded_by"], "tester");

    let (_, cost) = srv.get("/waste/cost?from=2026-03-01&to=2026-03-31").await;
    assert_eq!(cost["total_cost"], "50.00");

    let (status, _) = srv
        .delete(&format!("/waste/{}", waste["id"].as_str().unwrap()))
        .await;
    assert_eq!(status, StatusCode::OK);

    let (_, item) = srv.get(&format!("/inventory/items/{milk}")).await;
    assert_eq!(item["current_stock"], "50");
    let (_, ledger) = srv
        .get(&format!("/inventory/items/{milk}/transactions?type=waste"))
        .await;
    assert_eq!(ledger["total"], 1);
}

#[tokio::test]
async fn kitchen_order_flow() {
    let srv = TestServer::spawn().await;
    let tomato = srv.create_item("Tomato", "10", "0", "0.50").await;

    let recipe_id = "0190f7a4-0000-7000-8000-00000000beef";
    let (status, _) = srv
        .put(
            &format!("/kitchen/recipes/{recipe_id}"),
            json!({
                "name": "Pasta",
                "price": "9.25",
                "ingredients": [
                    { "name": "tomato", "quantity": "0.5" },
                    { "name": "Saffron", "quantity": "0.01" }
                ]
            }),
        )
        .await;
    assert_eq!(status, StatusCode::OK);

    let (status, body) = srv
        .post(
            "/orders",
            json!({ "order_type": "dine-in", "table_number": 42, "items": [{ "recipe_id": recipe_id, "quantity": 1 }] }),
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST, "unknown table accepted: {body}");

    let (status, order) = srv
        .post(
            "/orders",
            json!({ "order_type": "dine-in", "table_number": 1, "items": [{ "recipe_id": recipe_id, "quantity": 3 }] }),
        )
        .await;
    assert_eq!(status, StatusCode::CREATED, "create order failed: {order}");
    assert_eq!(order["totals"]["subtotal"], "27.75");
    assert_eq!(order["totals"]["tax"], "2.36");
    assert_eq!(order["totals"]["total"], "30.11");
    let id = order["id"].as_str().unwrap();

    let (status, assigned) = srv.post(&format!("/orders/{id}/auto-assign"), json!({})).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(assigned["assignment"]["chef"], "Ana");

    let (_, workload) = srv.get("/kitchen/workload/chef/Ana").await;
    assert_eq!(workload["active_orders"], 1);

    let (status, deduction) = srv.post(&format!("/orders/{id}/deduct-stock"), json!({})).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(deduction["applied"].as_array().unwrap().len(), 1);
    assert_eq!(deduction["unmatched"][0]["ingredient"], "Saffron");

    let (_, item) = srv.get(&format!("/inventory/items/{tomato}")).await;
    assert_eq!(item["current_stock"], "8.5");

    let (status, body) = srv.delete("/kitchen/roster/chefs/Ana").await;
    assert_eq!(status, StatusCode::CONFLICT, "busy chef removed: {body}");

    let (status, _) = srv.post(&format!("/orders/{id}/complete"), json!({})).await;
    assert_eq!(status, StatusCode::OK);
    let (_, board) = srv.get("/kitchen/board?sort=priority").await;
    assert!(board.as_array().unwrap().is_empty());

    let (status, body) = srv
        .post(&format!("/orders/{id}/status"), json!({ "status": "preparing" }))
        .await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(body["error"], "invariant_violation");
}

#[tokio::test]
async fn tax_rate_changes_apply_to_new_orders() {
    let srv = TestServer::spawn().await;
    let recipe_id = "0190f7a4-0000-7000-8000-00000000cafe";
    srv.put(
        &format!("/kitchen/recipes/{recipe_id}"),
        json!({ "name": "Soup", "price": "10.00" }),
    )
    .await;

    let (status, _) = srv
        .put("/settings/tax_rate", json!({ "type": "number", "value": "10" }))
        .await;
    assert_eq!(status, StatusCode::OK);
    let (status, body) = srv
        .put("/settings/tax_rate", json!({ "type": "string", "value": "ten" }))
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST, "bad tax rate accepted: {body}");

    let (_, order) = srv
        .post(
            "/orders",
            json!({ "order_type": "delivery", "items": [{ "recipe_id": recipe_id, "quantity": 1 }] }),
        )
        .await;
    assert_eq!(order["totals"]["tax"], "1.00");
    assert_eq!(order["totals"]["delivery_fee"], "5.00");
    assert_eq!(order["totals"]["total"], "16.00");
}
