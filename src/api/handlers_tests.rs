// Integration tests for the research log HTTP surface

use axum::{
    body::Body,
    http::{Method, Request, StatusCode},
    Router,
};
use serde_json::{json, Value};
use std::sync::Arc;
use tower::ServiceExt;

use crate::api::{create_router, ApiState};
use crate::engine::events::Notifier;
use crate::engine::workflow::ReviewEngine;
use crate::models::{User, UserRole};
use crate::realtime::ConnectionManager;
use crate::store::{InMemoryStore, LabStore};

struct TestApp {
    app: Router,
    student: User,
    supervisor: User,
}

async fn setup() -> TestApp {
    let store: Arc<InMemoryStore> = Arc::new(InMemoryStore::new());
    let connections = Arc::new(ConnectionManager::new());
    let notifier = Notifier::new(store.clone() as Arc<dyn LabStore>, connections.clone());
    let engine = Arc::new(ReviewEngine::new(store.clone(), notifier));
    let state = ApiState {
        engine,
        store: store.clone(),
        connections,
    };
    let app = create_router(state, false);

    let supervisor = store
        .create_user(User::new("Dr. Ortega", "ortega@lab.example", UserRole::Supervisor))
        .await
        .unwrap();
    let student = store
        .create_user(
            User::new("Mina Park", "mina@lab.example", UserRole::Student)
                .with_supervisor(supervisor.id.clone()),
        )
        .await
        .unwrap();

    TestApp {
        app,
        student,
        supervisor,
    }
}

/// Identity headers as the trusted gateway would attach them
struct Identity<'a> {
    id: &'a str,
    role: &'a str,
    supervisor: Option<&'a str>,
}

impl<'a> Identity<'a> {
    fn of(user: &'a User) -> Self {
        Identity {
            id: &user.id,
            role: user.role.as_str(),
            supervisor: user.supervisor_id.as_deref(),
        }
    }
}

fn request(
    method: Method,
    uri: &str,
    identity: Option<&Identity<'_>>,
    body: Option<Value>,
) -> Request<Body> {
    let mut builder = Request::builder().method(method).uri(uri);
    if let Some(identity) = identity {
        builder = builder
            .header("x-user-id", identity.id)
            .header("x-user-role", identity.role);
        if let Some(supervisor) = identity.supervisor {
            builder = builder.header("x-user-supervisor", supervisor);
        }
    }
    match body {
        Some(value) => builder
            .header("content-type", "application/json")
            .body(Body::from(value.to_string()))
            .unwrap(),
        None => builder.body(Body::empty()).unwrap(),
    }
}

async fn send(app: &Router, req: Request<Body>) -> (StatusCode, Value) {
    let response = app.clone().oneshot(req).await.unwrap();
    let status = response.status();
    let bytes = hyper::body::to_bytes(response.into_body()).await.unwrap();
    let value = if bytes.is_empty() {
        Value::Null
    } else {
        // Most responses are JSON, but some built-in extractor rejections
        // (e.g. a deny_unknown_fields 422) come back as plain text. Fall
        // back to the raw string instead of panicking on those.
        serde_json::from_slice(&bytes)
            .unwrap_or_else(|_| Value::String(String::from_utf8_lossy(&bytes).into_owned()))
    };
    (status, value)
}

#[tokio::test]
async fn test_missing_identity_is_unauthorized() {
    let t = setup().await;
    let (status, body) = send(&t.app, request(Method::GET, "/research-logs", None, None)).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert!(body["error"].as_str().unwrap().contains("x-user-id"));
}

#[tokio::test]
async fn test_health_needs_no_identity() {
    let t = setup().await;
    let (status, body) = send(&t.app, request(Method::GET, "/health", None, None)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "ok");
}

#[tokio::test]
async fn test_full_workflow_over_http() {
    let t = setup().await;
    let student = Identity::of(&t.student);
    let supervisor = Identity::of(&t.supervisor);

    // create a draft
    let (status, created) = send(
        &t.app,
        request(
            Method::POST,
            "/research-logs",
            Some(&student),
            Some(json!({ "title": "X", "activity_type": "experiment", "description": "d" })),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(created["status"], "DRAFT");
    assert_eq!(created["student_id"], t.student.id.as_str());
    assert_eq!(created["supervisor_id"], t.supervisor.id.as_str());
    let id = created["id"].as_str().unwrap().to_string();

    // submit
    let submit_uri = format!("/research-logs/{id}/submit");
    let (status, submitted) = send(
        &t.app,
        request(Method::POST, &submit_uri, Some(&student), None),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(submitted["status"], "SUBMITTED");
    assert!(!submitted["submitted_at"].is_null());

    // duplicate submit: success, state unchanged
    let (status, duplicate) = send(
        &t.app,
        request(Method::POST, &submit_uri, Some(&student), None),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(duplicate["status"], "SUBMITTED");
    assert_eq!(duplicate["submitted_at"], submitted["submitted_at"]);

    // the supervisor's listing includes the submitted log, enriched
    let (status, listing) = send(
        &t.app,
        request(Method::GET, "/research-logs", Some(&supervisor), None),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    let row = listing["logs"]
        .as_array()
        .unwrap()
        .iter()
        .find(|l| l["id"] == id.as_str())
        .expect("supervisor view must include the submitted log");
    assert_eq!(row["status"], "SUBMITTED");
    assert_eq!(row["student_name"], "Mina Park");

    // return for revision
    let (status, returned) = send(
        &t.app,
        request(
            Method::POST,
            &format!("/research-logs/{id}/return"),
            Some(&supervisor),
            Some(json!({ "comment": "add detail" })),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(returned["status"], "RETURNED");
    assert_eq!(returned["review_comment"], "add detail");
    assert_eq!(returned["reviewer_id"], t.supervisor.id.as_str());

    // revise and resubmit
    let (status, _) = send(
        &t.app,
        request(
            Method::PUT,
            &format!("/research-logs/{id}"),
            Some(&student),
            Some(json!({ "findings": "more detail" })),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    let (status, resubmitted) = send(
        &t.app,
        request(Method::POST, &submit_uri, Some(&student), None),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(resubmitted["status"], "SUBMITTED");

    // accept with an explicit comment
    let (status, accepted) = send(
        &t.app,
        request(
            Method::POST,
            &format!("/research-logs/{id}/accept"),
            Some(&supervisor),
            Some(json!({ "comment": "approved" })),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(accepted["status"], "ACCEPTED");
    assert_eq!(accepted["review_comment"], "approved");

    // terminal: a further submit is an invalid transition naming the state
    let (status, error) = send(
        &t.app,
        request(Method::POST, &submit_uri, Some(&student), None),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(error["error"].as_str().unwrap().contains("ACCEPTED"));
}

#[tokio::test]
async fn test_review_by_unassigned_supervisor_is_forbidden() {
    let t = setup().await;
    let student = Identity::of(&t.student);

    let (_, created) = send(
        &t.app,
        request(
            Method::POST,
            "/research-logs",
            Some(&student),
            Some(json!({ "title": "X", "submit": true })),
        ),
    )
    .await;
    let id = created["id"].as_str().unwrap();

    let stranger = Identity {
        id: "other-pi",
        role: "supervisor",
        supervisor: None,
    };
    for action in ["return", "accept", "decline"] {
        let (status, _) = send(
            &t.app,
            request(
                Method::POST,
                &format!("/research-logs/{id}/{action}"),
                Some(&stranger),
                Some(json!({ "comment": "mine now" })),
            ),
        )
        .await;
        assert_eq!(status, StatusCode::FORBIDDEN, "action {action}");
    }
}

#[tokio::test]
async fn test_return_without_comment_is_rejected() {
    let t = setup().await;
    let student = Identity::of(&t.student);
    let supervisor = Identity::of(&t.supervisor);

    let (_, created) = send(
        &t.app,
        request(
            Method::POST,
            "/research-logs",
            Some(&student),
            Some(json!({ "title": "X", "submit": true })),
        ),
    )
    .await;
    let id = created["id"].as_str().unwrap();

    let (status, body) = send(
        &t.app,
        request(
            Method::POST,
            &format!("/research-logs/{id}/return"),
            Some(&supervisor),
            None,
        ),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["error"].as_str().unwrap().contains("comment"));
}

#[tokio::test]
async fn test_student_status_endpoint() {
    let t = setup().await;
    let student = Identity::of(&t.student);
    let supervisor = Identity::of(&t.supervisor);

    let (_, created) = send(
        &t.app,
        request(
            Method::POST,
            "/research-logs",
            Some(&student),
            Some(json!({ "title": "X", "submit": true })),
        ),
    )
    .await;
    let id = created["id"].as_str().unwrap();
    send(
        &t.app,
        request(
            Method::POST,
            &format!("/research-logs/{id}/return"),
            Some(&supervisor),
            Some(json!({ "comment": "add detail" })),
        ),
    )
    .await;

    let (status, body) = send(
        &t.app,
        request(
            Method::GET,
            "/research-logs/student/status",
            Some(&student),
            None,
        ),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    let rows = body["logs"].as_array().unwrap();
    assert_eq!(rows.len(), 1);
    assert_eq!(rows[0]["display_status"], "Returned for revision");
    assert_eq!(rows[0]["review_comment"], "add detail");
    assert_eq!(rows[0]["reviewer_name"], "Dr. Ortega");

    // the condensed view is student-only
    let (status, _) = send(
        &t.app,
        request(
            Method::GET,
            "/research-logs/student/status",
            Some(&supervisor),
            None,
        ),
    )
    .await;
    assert_eq!(status, StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn test_patch_with_unknown_field_is_rejected() {
    let t = setup().await;
    let student = Identity::of(&t.student);

    let (_, created) = send(
        &t.app,
        request(
            Method::POST,
            "/research-logs",
            Some(&student),
            Some(json!({ "title": "X" })),
        ),
    )
    .await;
    let id = created["id"].as_str().unwrap();

    // LogPatch carries deny_unknown_fields; axum turns the serde error
    // into a 422 before the handler runs
    let (status, _) = send(
        &t.app,
        request(
            Method::PUT,
            &format!("/research-logs/{id}"),
            Some(&student),
            Some(json!({ "title": "Y", "rating": 5 })),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
}

#[tokio::test]
async fn test_notifications_flow() {
    let t = setup().await;
    let student = Identity::of(&t.student);
    let supervisor = Identity::of(&t.supervisor);

    send(
        &t.app,
        request(
            Method::POST,
            "/research-logs",
            Some(&student),
            Some(json!({ "title": "X", "submit": true })),
        ),
    )
    .await;

    // the supervisor has one unread durable notification
    let (status, body) = send(
        &t.app,
        request(Method::GET, "/notifications", Some(&supervisor), None),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["unread"], 1);
    let notification_id = body["notifications"][0]["id"].as_str().unwrap().to_string();
    assert_eq!(body["notifications"][0]["kind"], "log_submitted");

    // only the addressee can mark it read
    let (status, _) = send(
        &t.app,
        request(
            Method::POST,
            &format!("/notifications/{notification_id}/read"),
            Some(&student),
            None,
        ),
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (status, _) = send(
        &t.app,
        request(
            Method::POST,
            &format!("/notifications/{notification_id}/read"),
            Some(&supervisor),
            None,
        ),
    )
    .await;
    assert_eq!(status, StatusCode::OK);

    let (_, body) = send(
        &t.app,
        request(Method::GET, "/notifications", Some(&supervisor), None),
    )
    .await;
    assert_eq!(body["unread"], 0);
}

#[tokio::test]
async fn test_user_administration_requires_admin_role() {
    let t = setup().await;
    let student = Identity::of(&t.student);
    let admin = Identity {
        id: "root-1",
        role: "admin",
        supervisor: None,
    };

    let new_user = json!({ "name": "New Student", "email": "new@lab.example", "role": "student" });
    let (status, _) = send(
        &t.app,
        request(Method::POST, "/users", Some(&student), Some(new_user.clone())),
    )
    .await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let (status, created) = send(
        &t.app,
        request(Method::POST, "/users", Some(&admin), Some(new_user)),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(created["role"], "student");

    let (status, listing) = send(
        &t.app,
        request(Method::GET, "/users", Some(&admin), None),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    // supervisor + student from setup, plus the one just created
    assert_eq!(listing["total"], 3);
}

#[tokio::test]
async fn test_delete_requires_admin_role() {
    let t = setup().await;
    let student = Identity::of(&t.student);
    let admin = Identity {
        id: "root-1",
        role: "admin",
        supervisor: None,
    };

    let (_, created) = send(
        &t.app,
        request(
            Method::POST,
            "/research-logs",
            Some(&student),
            Some(json!({ "title": "X" })),
        ),
    )
    .await;
    let id = created["id"].as_str().unwrap();
    let uri = format!("/research-logs/{id}");

    let (status, _) = send(&t.app, request(Method::DELETE, &uri, Some(&student), None)).await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let (status, body) = send(&t.app, request(Method::DELETE, &uri, Some(&admin), None)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["deleted"], true);

    let (status, _) = send(&t.app, request(Method::GET, &uri, Some(&admin), None)).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_unknown_log_returns_not_found() {
    let t = setup().await;
    let student = Identity::of(&t.student);
    let (status, _) = send(
        &t.app,
        request(
            Method::POST,
            "/research-logs/no-such-id/submit",
            Some(&student),
            None,
        ),
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}
