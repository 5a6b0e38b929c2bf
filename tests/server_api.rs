//! HTTP surface tests using rocket's local client and a wiremock GitHub.

use portfolio_stats::config::{CacheConfig, GithubConfig};
use portfolio_stats::contact::ContactLog;
use portfolio_stats::server::{ServerState, build_rocket};
use portfolio_stats::{Config, StatsAggregator, StatsView};
use rocket::http::{ContentType, Status};
use rocket::local::asynchronous::Client;
use serde_json::{Value, json};
use wiremock::matchers::{body_string_contains, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

async fn client(server: &MockServer, token: Option<&str>) -> (Client, ContactLog) {
    let config = Config {
        github: GithubConfig {
            graphql_url: format!("{}/graphql", server.uri()),
            rest_url: server.uri(),
            token: token.map(str::to_string),
            ..GithubConfig::default()
        },
        ..Config::default()
    };

    let contacts = ContactLog::open_in_memory().unwrap();
    let state = ServerState {
        view: StatsView::new(
            StatsAggregator::from_config(&config).unwrap(),
            &CacheConfig::default(),
        ),
        contacts: contacts.clone(),
    };

    let client = Client::tracked(build_rocket(state)).await.unwrap();
    (client, contacts)
}

async fn mount_graphql(server: &MockServer, expected_profiles: u64) {
    Mock::given(method("POST"))
        .and(path("/graphql"))
        .and(body_string_contains("contributionsCollection"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "data": {
                "user": {
                    "repositories": {
                        "totalCount": 1,
                        "nodes": [{
                            "name": "portfolio",
                            "stargazerCount": 9,
                            "forkCount": 2,
                            "primaryLanguage": { "name": "TypeScript", "color": "#3178c6" },
                            "pushedAt": null,
                            "defaultBranchRef": null
                        }]
                    },
                    "contributionsCollection": {
                        "totalCommitContributions": 120,
                        "restrictedContributionsCount": 30
                    }
                }
            }
        })))
        .with_priority(1)
        .expect(expected_profiles)
        .mount(server)
        .await;

    Mock::given(method("POST"))
        .and(path("/graphql"))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(json!({ "data": { "user": { "id": "U_1" } } })),
        )
        .mount(server)
        .await;
}

#[tokio::test]
async fn stats_are_served_and_cached() {
    let server = MockServer::start().await;
    mount_graphql(&server, 1).await;
    let (client, _) = client(&server, Some("test-token")).await;

    for _ in 0..2 {
        let response = client.get("/api/github?username=octocat").dispatch().await;
        assert_eq!(response.status(), Status::Ok);

        let body: Value = response.into_json().await.unwrap();
        assert_eq!(body["totalRepos"], 1);
        assert_eq!(body["totalStars"], 9);
        assert_eq!(body["totalCommits"], 150);
        assert_eq!(body["languages"][0]["name"], "TypeScript");
        assert_eq!(body["recentActivity"], json!([]));
    }
}

#[tokio::test]
async fn refresh_bypasses_cache() {
    let server = MockServer::start().await;
    mount_graphql(&server, 2).await;
    let (client, _) = client(&server, Some("test-token")).await;

    let first = client.get("/api/github?username=octocat").dispatch().await;
    assert_eq!(first.status(), Status::Ok);
    let second = client
        .get("/api/github?username=octocat&refresh=true")
        .dispatch()
        .await;
    assert_eq!(second.status(), Status::Ok);
}

#[tokio::test]
async fn missing_username_is_bad_request() {
    let server = MockServer::start().await;
    let (client, _) = client(&server, Some("test-token")).await;

    for uri in ["/api/github", "/api/github?username="] {
        let response = client.get(uri).dispatch().await;
        assert_eq!(response.status(), Status::BadRequest);
        let body: Value = response.into_json().await.unwrap();
        assert_eq!(body["error"], "Username parameter is required");
    }
}

#[tokio::test]
async fn missing_token_is_server_error() {
    let server = MockServer::start().await;
    let (client, _) = client(&server, None).await;

    let response = client.get("/api/github?username=octocat").dispatch().await;
    assert_eq!(response.status(), Status::InternalServerError);
    let body: Value = response.into_json().await.unwrap();
    assert!(body["error"].as_str().unwrap().contains("GitHub token is required"));
}

#[tokio::test]
async fn contact_submission_is_stored() {
    let server = MockServer::start().await;
    let (client, contacts) = client(&server, None).await;

    let response = client
        .post("/api/contact")
        .header(ContentType::JSON)
        .body(
            json!({
                "name": "Ada",
                "email": "ada@example.com",
                "subject": "Hi",
                "message": "Nice portfolio"
            })
            .to_string(),
        )
        .dispatch()
        .await;
    assert_eq!(response.status(), Status::Ok);

    let stored = contacts.entries().await.unwrap();
    assert_eq!(stored.len(), 1);
    assert_eq!(stored[0].subject, "Hi");
}

#[tokio::test]
async fn incomplete_contact_is_rejected() {
    let server = MockServer::start().await;
    let (client, contacts) = client(&server, None).await;

    let response = client
        .post("/api/contact")
        .header(ContentType::JSON)
        .body(json!({ "name": "Ada", "email": "ada@example.com" }).to_string())
        .dispatch()
        .await;
    assert_eq!(response.status(), Status::BadRequest);
    let body: Value = response.into_json().await.unwrap();
    assert_eq!(body["error"], "All fields are required.");
    assert!(contacts.entries().await.unwrap().is_empty());
}

#[tokio::test]
async fn malformed_contact_bodies_get_json_errors() {
    let server = MockServer::start().await;
    let (client, contacts) = client(&server, None).await;

    let cases = [
        ("{not json", Status::BadRequest),
        (
            r#"{"name":5,"email":"ada@example.com","subject":"Hi","message":"Hello"}"#,
            Status::UnprocessableEntity,
        ),
    ];
    for (body, status) in cases {
        let response = client
            .post("/api/contact")
            .header(ContentType::JSON)
            .body(body)
            .dispatch()
            .await;
        assert_eq!(response.status(), status, "{body}");
        assert_eq!(response.content_type(), Some(ContentType::JSON));
        let body: Value = response.into_json().await.unwrap();
        assert!(body["error"].is_string());
    }
    assert!(contacts.entries().await.unwrap().is_empty());
}

#[tokio::test]
async fn health_reports_service() {
    let server = MockServer::start().await;
    let (client, _) = client(&server, None).await;

    let response = client.get("/api/health").dispatch().await;
    assert_eq!(response.status(), Status::Ok);
    let body: Value = response.into_json().await.unwrap();
    assert_eq!(body["service"], "portfolio-stats");
}
