//! HTTP integration tests for the designer API.
//!
//! Each test starts a real server on a random port with its own data
//! directory and drives it with reqwest.

mod common;

use common::TestServer;
use reqwest::StatusCode;
use serde_json::{json, Value};

async fn get_json(client: &reqwest::Client, url: &str) -> Value {
    let response = client.get(url).send().await.expect("request");
    assert_eq!(response.status(), StatusCode::OK, "GET {url}");
    response.json().await.expect("json")
}

fn sections_of_kind<'a>(layout: &'a Value, kind: &str) -> Vec<&'a Value> {
    layout["sections"]
        .as_array()
        .expect("sections")
        .iter()
        .filter(|s| s["kind"] == kind)
        .collect()
}

// ===========================================================================
// Layout and reconciliation
// ===========================================================================

#[tokio::test]
async fn test_first_visit_reconciles_catalog() {
    let server = TestServer::start().await;
    server
        .seed_catalog(
            "dinner",
            &[("starters", "Starters", 2), ("mains", "Mains", 3), ("desserts", "Desserts", 1)],
        )
        .await;
    let client = reqwest::Client::new();

    let layout = get_json(&client, &server.menu_url("dinner", "/layout")).await;
    assert_eq!(layout["menuKey"], "dinner");
    assert_eq!(layout["sections"].as_array().map(Vec::len), Some(6));
    assert_eq!(sections_of_kind(&layout, "category").len(), 3);

    let mains_items = sections_of_kind(&layout, "items")
        .into_iter()
        .find(|s| s["categoryId"] == "mains")
        .expect("mains items");
    assert_eq!(mains_items["items"].as_array().map(Vec::len), Some(3));
    assert_eq!(mains_items["categoryName"], "Mains");

    // Nothing changed in the catalog: reconcile is a no-op.
    let report: Value = client
        .post(server.menu_url("dinner", "/reconcile"))
        .send()
        .await
        .expect("reconcile")
        .json()
        .await
        .expect("json");
    assert_eq!(report["added"], json!([]));
    assert_eq!(report["pruned"], json!([]));

    server.shutdown().await;
}

#[tokio::test]
async fn test_reconcile_picks_up_catalog_changes() {
    let server = TestServer::start().await;
    server
        .seed_catalog("dinner", &[("mains", "Mains", 2), ("desserts", "Desserts", 2)])
        .await;
    let client = reqwest::Client::new();
    get_json(&client, &server.menu_url("dinner", "/layout")).await;

    server.seed_catalog("dinner", &[("mains", "Mains", 2)]).await;
    let report: Value = client
        .post(server.menu_url("dinner", "/reconcile"))
        .send()
        .await
        .expect("reconcile")
        .json()
        .await
        .expect("json");
    assert_eq!(report["pruned"].as_array().map(Vec::len), Some(2));

    let layout = get_json(&client, &server.menu_url("dinner", "/layout")).await;
    assert_eq!(layout["sections"].as_array().map(Vec::len), Some(2));

    server.shutdown().await;
}

// ===========================================================================
// Section editing
// ===========================================================================

#[tokio::test]
async fn test_add_sections_follow_nearest_free_slot() {
    let server = TestServer::start().await;
    let client = reqwest::Client::new();
    let url = server.menu_url("specials", "/sections");

    let first = client
        .post(&url)
        .json(&json!({
            "kind": "promotion",
            "position": {"row": 0, "col": 0},
            "size": {"rowSpan": 1, "colSpan": 2},
            "content": {"text": "Happy hour", "backgroundColor": "#FFEB3B"},
            "title": "Happy hour banner"
        }))
        .send()
        .await
        .expect("add");
    assert_eq!(first.status(), StatusCode::CREATED);
    let first: Value = first.json().await.expect("json");
    assert_eq!(first["section"]["position"], json!({"row": 0, "col": 0}));
    assert_eq!(first["section"]["content"]["backgroundColor"], "#FFEB3B");
    assert_eq!(first["section"]["title"], "Happy hour banner");

    let second: Value = client
        .post(&url)
        .json(&json!({
            "kind": "ad",
            "position": {"row": 0, "col": 0},
            "size": {"rowSpan": 1, "colSpan": 4}
        }))
        .send()
        .await
        .expect("add")
        .json()
        .await
        .expect("json");
    assert_eq!(second["section"]["position"], json!({"row": 1, "col": 0}));

    server.shutdown().await;
}

#[tokio::test]
async fn test_update_and_delete_custom_section() {
    let server = TestServer::start().await;
    let client = reqwest::Client::new();

    let added: Value = client
        .post(server.menu_url("specials", "/sections"))
        .json(&json!({"kind": "special", "content": {"text": "Chef's pick"}}))
        .send()
        .await
        .expect("add")
        .json()
        .await
        .expect("json");
    let id = added["section"]["id"].as_str().expect("id").to_string();
    let section_url = server.menu_url("specials", &format!("/sections/{id}"));

    let updated: Value = client
        .patch(&section_url)
        .json(&json!({
            "content": {"text": "Chef's special", "alignment": "right"},
            "position": {"row": 3, "col": 1},
            "size": {"rowSpan": 2, "colSpan": 2}
        }))
        .send()
        .await
        .expect("patch")
        .json()
        .await
        .expect("json");
    assert_eq!(updated["section"]["content"]["text"], "Chef's special");
    assert_eq!(updated["section"]["content"]["alignment"], "right");
    assert_eq!(updated["section"]["position"], json!({"row": 3, "col": 1}));
    assert_eq!(updated["section"]["size"], json!({"rowSpan": 2, "colSpan": 2}));

    let deleted = client.delete(&section_url).send().await.expect("delete");
    assert_eq!(deleted.status(), StatusCode::NO_CONTENT);
    let again = client.delete(&section_url).send().await.expect("delete");
    assert_eq!(again.status(), StatusCode::NOT_FOUND);

    server.shutdown().await;
}

#[tokio::test]
async fn test_rejections_map_to_status_codes() {
    let server = TestServer::start().await;
    server.seed_catalog("dinner", &[("mains", "Mains", 1)]).await;
    let client = reqwest::Client::new();
    get_json(&client, &server.menu_url("dinner", "/layout")).await;

    // Structural sections are locked.
    let locked = client
        .delete(server.menu_url("dinner", "/sections/category-mains"))
        .send()
        .await
        .expect("delete");
    assert_eq!(locked.status(), StatusCode::CONFLICT);
    let body: Value = locked.json().await.expect("json");
    assert_eq!(body["code"], "not_editable");

    // Structural kinds cannot be added by hand.
    let structural = client
        .post(server.menu_url("dinner", "/sections"))
        .json(&json!({"kind": "items"}))
        .send()
        .await
        .expect("add");
    assert_eq!(structural.status(), StatusCode::BAD_REQUEST);

    // Larger than the grid.
    let oversize = client
        .post(server.menu_url("dinner", "/sections"))
        .json(&json!({"kind": "ad", "size": {"rowSpan": 1, "colSpan": 5}}))
        .send()
        .await
        .expect("add");
    assert_eq!(oversize.status(), StatusCode::UNPROCESSABLE_ENTITY);

    // Bad color.
    let bad_color = client
        .post(server.menu_url("dinner", "/sections"))
        .json(&json!({"kind": "ad", "content": {"textColor": "red"}}))
        .send()
        .await
        .expect("add");
    assert_eq!(bad_color.status(), StatusCode::BAD_REQUEST);

    // Invalid menu key.
    let bad_key = client
        .get(server.url("/api/menus/no.dots/layout"))
        .send()
        .await
        .expect("get");
    assert_eq!(bad_key.status(), StatusCode::BAD_REQUEST);

    server.shutdown().await;
}

// ===========================================================================
// Drag
// ===========================================================================

#[tokio::test]
async fn test_drag_snaps_past_right_edge() {
    let server = TestServer::start().await;
    let client = reqwest::Client::new();
    let added: Value = client
        .post(server.menu_url("specials", "/sections"))
        .json(&json!({
            "kind": "promotion",
            "position": {"row": 2, "col": 0},
            "size": {"rowSpan": 1, "colSpan": 2}
        }))
        .send()
        .await
        .expect("add")
        .json()
        .await
        .expect("json");
    let id = added["section"]["id"].clone();
    let drag_url = server.menu_url("specials", "/drag");

    // Default cells are 120x80 px.
    let down: Value = client
        .post(&drag_url)
        .json(&json!({"phase": "down", "sectionId": id, "x": 10.0, "y": 170.0}))
        .send()
        .await
        .expect("down")
        .json()
        .await
        .expect("json");
    assert_eq!(down["dragging"], true);

    let second_down = client
        .post(&drag_url)
        .json(&json!({"phase": "down", "sectionId": id, "x": 10.0, "y": 170.0}))
        .send()
        .await
        .expect("down");
    assert_eq!(second_down.status(), StatusCode::CONFLICT);

    let moved: Value = client
        .post(&drag_url)
        .json(&json!({"phase": "move", "x": 370.0, "y": 410.0}))
        .send()
        .await
        .expect("move")
        .json()
        .await
        .expect("json");
    assert_eq!(moved["position"], json!({"row": 5, "col": 2}));

    let up: Value = client
        .post(&drag_url)
        .json(&json!({"phase": "up"}))
        .send()
        .await
        .expect("up")
        .json()
        .await
        .expect("json");
    assert_eq!(up["dragging"], false);
    assert_eq!(up["outcome"]["from"], json!({"row": 2, "col": 0}));
    assert_eq!(up["outcome"]["to"], json!({"row": 5, "col": 2}));

    server.shutdown().await;
}

#[tokio::test]
async fn test_far_coordinates_land_inside_grid() {
    let server = TestServer::start().await;
    let client = reqwest::Client::new();
    let added: Value = client
        .post(server.menu_url("specials", "/sections"))
        .json(&json!({
            "kind": "ad",
            "position": {"row": u64::MAX, "col": 0},
            "size": {"rowSpan": 1, "colSpan": 2}
        }))
        .send()
        .await
        .expect("add")
        .json()
        .await
        .expect("json");
    assert_eq!(added["section"]["position"], json!({"row": 11, "col": 0}));
    let id = added["section"]["id"].clone();

    let drag_url = server.menu_url("specials", "/drag");
    client
        .post(&drag_url)
        .json(&json!({"phase": "down", "sectionId": id, "x": 10.0, "y": 890.0}))
        .send()
        .await
        .expect("down");
    let moved: Value = client
        .post(&drag_url)
        .json(&json!({"phase": "move", "x": 1e30, "y": 1e30}))
        .send()
        .await
        .expect("move")
        .json()
        .await
        .expect("json");
    assert_eq!(moved["position"], json!({"row": 11, "col": 2}));

    server.shutdown().await;
}

// ===========================================================================
// Theme, layout type, persistence
// ===========================================================================

#[tokio::test]
async fn test_theme_and_layout_type() {
    let server = TestServer::start().await;
    server.seed_catalog("dinner", &[("mains", "Mains", 3)]).await;
    let client = reqwest::Client::new();
    get_json(&client, &server.menu_url("dinner", "/layout")).await;

    let theme = json!({
        "backgroundColor": "#FAFAFA",
        "cardColor": "#FFFFFF",
        "textColor": "#000000",
        "primaryColor": "#D32F2F",
        "elevation": 2,
        "borderRadius": 4.0
    });
    let layout: Value = client
        .put(server.menu_url("dinner", "/theme"))
        .json(&theme)
        .send()
        .await
        .expect("theme")
        .json()
        .await
        .expect("json");
    let header = sections_of_kind(&layout, "category")[0];
    assert_eq!(header["content"]["backgroundColor"], "#D32F2F");
    assert_eq!(layout["theme"]["primaryColor"], "#D32F2F");

    let bad = client
        .put(server.menu_url("dinner", "/theme"))
        .json(&json!({
            "backgroundColor": "white",
            "cardColor": "#FFFFFF",
            "textColor": "#000000",
            "primaryColor": "#D32F2F",
            "elevation": 2,
            "borderRadius": 4.0
        }))
        .send()
        .await
        .expect("theme");
    assert_eq!(bad.status(), StatusCode::BAD_REQUEST);

    let listed: Value = client
        .put(server.menu_url("dinner", "/layout-type"))
        .json(&json!({"layoutType": "list"}))
        .send()
        .await
        .expect("layout type")
        .json()
        .await
        .expect("json");
    assert_eq!(listed["layoutType"], "list");
    let items = sections_of_kind(&listed, "items")[0];
    assert_eq!(items["size"]["rowSpan"], 3);

    server.shutdown().await;
}

#[tokio::test]
async fn test_save_and_duplicate() {
    let server = TestServer::start().await;
    server.seed_catalog("dinner", &[("mains", "Mains", 2)]).await;
    let client = reqwest::Client::new();
    client
        .post(server.menu_url("dinner", "/sections"))
        .json(&json!({
            "kind": "ad",
            "position": {"row": 6, "col": 0},
            "size": {"rowSpan": 1, "colSpan": 4}
        }))
        .send()
        .await
        .expect("add");

    let saved: Value = client
        .post(server.menu_url("dinner", "/save"))
        .send()
        .await
        .expect("save")
        .json()
        .await
        .expect("json");
    assert_eq!(saved["saved"], true);
    assert!(server.data_dir().join("layouts/dinner.json").exists());

    let nothing_pending: Value = client
        .post(server.menu_url("dinner", "/save"))
        .send()
        .await
        .expect("save")
        .json()
        .await
        .expect("json");
    assert_eq!(nothing_pending["saved"], false);

    let duplicated = client
        .post(server.menu_url("dinner", "/duplicate"))
        .json(&json!({"newMenuKey": "dinner-copy"}))
        .send()
        .await
        .expect("duplicate");
    assert_eq!(duplicated.status(), StatusCode::CREATED);
    let duplicated: Value = duplicated.json().await.expect("json");
    assert_eq!(duplicated["menuKey"], "dinner-copy");
    assert_eq!(duplicated["sections"], 3);

    let copy = get_json(&client, &server.menu_url("dinner-copy", "/layout")).await;
    assert_eq!(sections_of_kind(&copy, "ad").len(), 1);

    server.shutdown().await;
}

#[tokio::test]
async fn test_health_probes() {
    let server = TestServer::start().await;
    let client = reqwest::Client::new();

    let live = client.get(server.url("/health/live")).send().await.expect("live");
    assert_eq!(live.status(), StatusCode::OK);

    let ready = get_json(&client, &server.url("/health/ready")).await;
    assert_eq!(ready["status"], "healthy");
    assert_eq!(ready["checks"]["layout_store"], true);

    server.shutdown().await;
}
