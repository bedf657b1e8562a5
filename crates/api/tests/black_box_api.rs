use std::sync::Arc;

use reqwest::StatusCode;
use serde_json::json;

use instihub_api::app::{self, AppServices};
use instihub_auth::{DirectoryReader, IdentityProvider};

struct TestServer {
    base_url: String,
    services: Arc<AppServices>,
    handle: tokio::task::JoinHandle<()>,
}

impl TestServer {
    async fn spawn() -> Self {
        // Build app (same router as prod), but bind to an ephemeral port.
        let services = Arc::new(app::build_services("test-secret"));
        let router = app::build_app(services.clone());
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
            .await
            .expect("failed to bind ephemeral port");
        let addr = listener.local_addr().unwrap();
        let base_url = format!("http://{}", addr);

        let handle = tokio::spawn(async move {
            axum::serve(listener, router).await.unwrap();
        });

        Self {
            base_url,
            services,
            handle,
        }
    }

    /// Sign up a fresh principal and return a bearer token for it.
    async fn signed_up(&self, email: &str, password: &str) -> (String, String) {
        let user = self
            .services
            .identity
            .sign_up(email, password, "Test Person")
            .await
            .expect("sign up failed");
        let session = self
            .services
            .identity
            .sign_in(email, password)
            .await
            .expect("sign in failed");
        (session.access_token, user.id.to_string())
    }

    /// Sign up + claim an institute; returns (token, institute id).
    async fn bootstrap_admin(&self, client: &reqwest::Client, email: &str) -> (String, String) {
        let (token, user_id) = self.signed_up(email, "admin-pw").await;
        let res = client
            .post(format!("{}/setup-institute", self.base_url))
            .bearer_auth(&token)
            .json(&json!({
                "userId": user_id,
                "instituteName": "North Campus",
                "email": email,
            }))
            .send()
            .await
            .unwrap();
        assert_eq!(res.status(), StatusCode::OK);
        let body: serde_json::Value = res.json().await.unwrap();
        let institute_id = body["instituteId"].as_str().unwrap().to_string();
        (token, institute_id)
    }
}

impl Drop for TestServer {
    fn drop(&mut self) {
        self.handle.abort();
    }
}

#[tokio::test]
async fn auth_required_for_protected_endpoints() {
    let srv = TestServer::spawn().await;

    let client = reqwest::Client::new();
    let res = client
        .get(format!("{}/whoami", srv.base_url))
        .send()
        .await
        .unwrap();

    assert_eq!(res.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn whoami_reflects_the_bearer_token() {
    let srv = TestServer::spawn().await;
    let client = reqwest::Client::new();

    let (token, user_id) = srv.signed_up("me@campus.test", "pw-123456").await;

    let res = client
        .get(format!("{}/whoami", srv.base_url))
        .bearer_auth(&token)
        .send()
        .await
        .unwrap();

    assert_eq!(res.status(), StatusCode::OK);
    let body: serde_json::Value = res.json().await.unwrap();
    assert_eq!(body["principal_id"].as_str().unwrap(), user_id);
    assert_eq!(body["email"].as_str().unwrap(), "me@campus.test");
}

#[tokio::test]
async fn setup_institute_is_single_shot() {
    let srv = TestServer::spawn().await;
    let client = reqwest::Client::new();

    let (token, user_id) = srv.signed_up("owner@campus.test", "admin-pw").await;

    let setup = json!({
        "userId": user_id,
        "instituteName": "North Campus",
        "email": "owner@campus.test",
    });

    let res = client
        .post(format!("{}/setup-institute", srv.base_url))
        .bearer_auth(&token)
        .json(&setup)
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::OK);

    // The same principal cannot claim a second institute.
    let res = client
        .post(format!("{}/setup-institute", srv.base_url))
        .bearer_auth(&token)
        .json(&setup)
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::FORBIDDEN);

    assert_eq!(srv.services.directory.institute_count(), 1);
}

#[tokio::test]
async fn cross_tenant_account_creation_is_forbidden() {
    let srv = TestServer::spawn().await;
    let client = reqwest::Client::new();

    let (token_a, _institute_a) = srv.bootstrap_admin(&client, "a@campus.test").await;
    let (_token_b, institute_b) = srv.bootstrap_admin(&client, "b@campus.test").await;

    // Admin of A targets institute B.
    let res = client
        .post(format!("{}/create-student-account", srv.base_url))
        .bearer_auth(&token_a)
        .json(&json!({
            "email": "intruder@campus.test",
            "password": "student-pw",
            "fullName": "In Truder",
            "instituteId": institute_b,
        }))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::FORBIDDEN);

    let institute_b_id: instihub_core::InstituteId = institute_b.parse().unwrap();
    assert!(srv.services.directory.students_in(institute_b_id).is_empty());
}

#[tokio::test]
async fn create_teacher_assigns_an_employee_id() {
    let srv = TestServer::spawn().await;
    let client = reqwest::Client::new();

    let (token, institute_id) = srv.bootstrap_admin(&client, "owner@campus.test").await;

    let res = client
        .post(format!("{}/create-teacher-account", srv.base_url))
        .bearer_auth(&token)
        .json(&json!({
            "email": "tess@campus.test",
            "password": "teacher-pw",
            "fullName": "Tess Teacher",
            "instituteId": institute_id,
            "subjects": ["physics"],
            "salary": 42000.0,
        }))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::OK);
    let body: serde_json::Value = res.json().await.unwrap();

    let employee_id = body["employeeId"].as_str().unwrap();
    assert!(employee_id.starts_with("EMP"));
    assert_eq!(employee_id.len(), 11);

    // Exactly one teacher role and one detail row for the new account.
    let user_id: instihub_core::PrincipalId = body["userId"].as_str().unwrap().parse().unwrap();
    let roles = srv.services.directory.roles(user_id).await.unwrap();
    assert_eq!(roles.len(), 1);
    assert!(roles.is_teacher());
    let institute: instihub_core::InstituteId = institute_id.parse().unwrap();
    let teachers = srv.services.directory.teachers_in(institute);
    assert_eq!(teachers.len(), 1);
    assert_eq!(teachers[0].profile_id, user_id);

    // The generated id works for identifier-based login.
    let res = client
        .post(format!("{}/login-with-id", srv.base_url))
        .json(&json!({
            "userType": "teacher",
            "identifier": employee_id,
            "password": "teacher-pw",
        }))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::OK);
    let body: serde_json::Value = res.json().await.unwrap();
    assert_eq!(body["user"]["email"].as_str().unwrap(), "tess@campus.test");
}

#[tokio::test]
async fn student_logs_in_with_registration_number() {
    let srv = TestServer::spawn().await;
    let client = reqwest::Client::new();

    let (token, institute_id) = srv.bootstrap_admin(&client, "owner@campus.test").await;

    let res = client
        .post(format!("{}/create-student-account", srv.base_url))
        .bearer_auth(&token)
        .json(&json!({
            "email": "sam@campus.test",
            "password": "student-pw",
            "fullName": "Sam Student",
            "instituteId": institute_id,
            "registrationNumber": "REG-2026-001",
            "totalFee": 1000.0,
            "paidFee": 250.0,
        }))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::OK);

    let res = client
        .post(format!("{}/login-with-id", srv.base_url))
        .json(&json!({
            "userType": "student",
            "identifier": "REG-2026-001",
            "password": "student-pw",
        }))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::OK);
    let body: serde_json::Value = res.json().await.unwrap();
    assert_eq!(body["success"], json!(true));
    assert_eq!(body["user"]["email"].as_str().unwrap(), "sam@campus.test");
    assert!(body["session"]["access_token"].as_str().unwrap().len() > 0);
}

#[tokio::test]
async fn login_failures_share_one_error_shape() {
    let srv = TestServer::spawn().await;
    let client = reqwest::Client::new();

    let (token, institute_id) = srv.bootstrap_admin(&client, "owner@campus.test").await;
    let res = client
        .post(format!("{}/create-student-account", srv.base_url))
        .bearer_auth(&token)
        .json(&json!({
            "email": "sam@campus.test",
            "password": "student-pw",
            "fullName": "Sam Student",
            "instituteId": institute_id,
            "registrationNumber": "REG-1",
        }))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::OK);

    let attempt = |identifier: &str, password: &str| {
        let client = client.clone();
        let url = format!("{}/login-with-id", srv.base_url);
        let body = json!({
            "userType": "student",
            "identifier": identifier,
            "password": password,
        });
        async move { client.post(url).json(&body).send().await.unwrap() }
    };

    let unknown = attempt("REG-NOPE", "student-pw").await;
    let wrong_pw = attempt("REG-1", "wrong").await;

    assert_eq!(unknown.status(), StatusCode::UNAUTHORIZED);
    assert_eq!(wrong_pw.status(), StatusCode::UNAUTHORIZED);

    let unknown: serde_json::Value = unknown.json().await.unwrap();
    let wrong_pw: serde_json::Value = wrong_pw.json().await.unwrap();
    assert_eq!(unknown, wrong_pw);
}
