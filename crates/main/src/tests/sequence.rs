//! A coach's session against the HTTP interface, on the happy path and the
//! rejections they are most likely to run into.

use rocket::{
    http::{ContentType, Status},
    local::blocking::Client,
};
use serde_json::{json, Value};

use crate::{config::AppConfig, make_rocket, seed::seed_reference_data};

fn get_test_rocket_instance(dir: &tempfile::TempDir) -> Client {
    let path = dir.path().join("meet_assist.db");
    let path = path.to_str().unwrap();

    let client = Client::tracked(make_rocket(path)).unwrap();

    // The server only seeds teams and event groups by default.
    let mut conn = db::open_connection(path).unwrap();
    seed_reference_data(
        &mut conn,
        &AppConfig {
            seed_events: true,
            ..AppConfig::default()
        },
    )
    .unwrap();

    client
}

fn post(client: &Client, uri: String, body: Value) -> (Status, Value) {
    let response = client
        .post(uri)
        .header(ContentType::JSON)
        .body(body.to_string())
        .dispatch();
    let status = response.status();
    (status, response.into_json::<Value>().unwrap_or(Value::Null))
}

fn get(client: &Client, uri: String) -> (Status, Value) {
    let response = client.get(uri).dispatch();
    let status = response.status();
    (status, response.into_json::<Value>().unwrap_or(Value::Null))
}

fn id_of(items: &Value, key: &str, name: &str) -> i64 {
    items
        .as_array()
        .unwrap()
        .iter()
        .find(|item| item["name"] == name)
        .and_then(|item| item[key].as_i64())
        .unwrap()
}

#[test]
fn basic_test_sequence() {
    let dir = tempfile::tempdir().unwrap();
    let client = get_test_rocket_instance(&dir);

    let health = client.get("/health").dispatch();
    assert_eq!(health.status(), Status::Ok);
    assert!(health.headers().get_one("X-Request-Id").is_some());

    let (_, teams) = get(&client, "/api/teams".into());
    assert_eq!(teams.as_array().unwrap().len(), 3);
    let varsity = id_of(&teams, "team_id", "Varsity");
    let (_, groups) = get(&client, "/api/event-groups".into());
    let sprints = id_of(&groups, "event_group_id", "Sprints");

    // (1) register athletes
    let (status, ava) = post(
        &client,
        "/api/athletes".into(),
        json!({
            "first_name": "Ava",
            "last_name": "Nguyen",
            "gender": "F",
            "team_id": varsity,
            "event_group_id": sprints,
            "varsity": "yes",
        }),
    );
    assert_eq!(status, Status::Created);
    assert_eq!(ava["varsity"], true);
    let ava = ava["athlete_id"].as_i64().unwrap();

    let (status, body) = post(
        &client,
        "/api/athletes".into(),
        json!({
            "first_name": "Eli",
            "last_name": "Brooks",
            "gender": "M",
            "team_id": varsity,
            "event_group_id": sprints,
            "varsity": "sometimes",
        }),
    );
    assert_eq!(status, Status::BadRequest);
    assert!(body["error"].as_str().unwrap().contains("varsity"));

    // (2) create a meet; its offerings come from the catalog
    let (status, meet) = post(
        &client,
        "/api/meets".into(),
        json!({ "name": "Spring Dual", "venue_type": "outdoor" }),
    );
    assert_eq!(status, Status::Created);
    let meet = meet["meet_id"].as_i64().unwrap();

    let (status, page) =
        get(&client, format!("/api/meets/{meet}/page?gender=F"));
    assert_eq!(status, Status::Ok);
    assert_eq!(page["gender"], "F");
    assert_eq!(page["athletes"][0]["athlete_id"], ava);
    let girls_100 = page["meet_events"][0]["meet_event_id"].as_i64().unwrap();
    assert_eq!(page["meet_events"][0]["event_name"], "100m");

    // (3) enter Ava, twice
    let entries = format!("/api/meet-events/{girls_100}/entries");
    let (status, entry) =
        post(&client, entries.clone(), json!({ "athlete_id": ava }));
    assert_eq!(status, Status::Created);
    assert_eq!(entry["entry_status"], "entered");

    let (status, body) =
        post(&client, entries.clone(), json!({ "athlete_id": ava }));
    assert_eq!(status, Status::Conflict);
    assert!(body["error"].is_string());

    let (_, page) = get(&client, format!("/api/meets/{meet}/page?gender=F"));
    assert_eq!(page["meet_events"][0]["entries"][0]["athlete_id"], ava);
    assert_eq!(page["meet_events"][0]["entries"][0]["last_name"], "Nguyen");

    // (4) the boys' page (the default) does not take her
    let (_, boys) = get(&client, format!("/api/meets/{meet}/page"));
    assert_eq!(boys["gender"], "M");
    let boys_100 = boys["meet_events"][0]["meet_event_id"].as_i64().unwrap();
    let (status, _) = post(
        &client,
        format!("/api/meet-events/{boys_100}/entries"),
        json!({ "athlete_id": ava }),
    );
    assert_eq!(status, Status::UnprocessableEntity);

    // (5) removing is idempotent
    for _ in 0..2 {
        let response = client
            .delete(format!("/api/meet-events/{girls_100}/entries/{ava}"))
            .dispatch();
        assert_eq!(response.status(), Status::Ok);
        assert_eq!(response.into_json::<Value>().unwrap(), json!({ "ok": true }));
    }

    // (6) rejections
    let (status, _) = get(&client, format!("/api/meets/{meet}/page?gender=X"));
    assert_eq!(status, Status::BadRequest);
    let (status, body) = get(&client, format!("/api/meets/{}", meet + 1000));
    assert_eq!(status, Status::NotFound);
    assert_eq!(body["error"], "meet not found");

    // (7) archive and delete
    let response = client
        .patch(format!("/api/meets/{meet}"))
        .header(ContentType::JSON)
        .body(json!({ "is_archived": "1" }).to_string())
        .dispatch();
    assert_eq!(response.status(), Status::Ok);
    let (_, meets) = get(&client, "/api/meets".into());
    assert!(meets.as_array().unwrap().is_empty());
    let (_, meets) = get(&client, "/api/meets?include_archived=yes".into());
    assert_eq!(meets[0]["meet_id"], meet);

    let response = client.delete(format!("/api/meets/{meet}")).dispatch();
    assert_eq!(response.status(), Status::NoContent);
    let (status, _) = get(&client, format!("/api/meets/{meet}"));
    assert_eq!(status, Status::NotFound);
}
