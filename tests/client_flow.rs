use std::collections::HashMap;

use actix_web::{App, HttpRequest, HttpResponse, HttpServer, dev::ServerHandle, web};
use serde_json::json;

use fieldops::client::{ApiClient, AppState, ClientError, SessionStore, actions};
use fieldops::domain::collection::Achievement;
use fieldops::model::role::Role;
use fieldops::models::{LoginReqDto, LoginResponse};

const GOOD_TOKEN: &str = "good-token";

fn session(token: &str) -> LoginResponse {
    LoginResponse {
        token: token.to_string(),
        role: Role::Manager,
        role_id: Role::Manager.id(),
        user_id: 2,
        name: "Meera Shah".to_string(),
        username: "meera".to_string(),
    }
}

fn check_token(req: &HttpRequest) -> Result<(), HttpResponse> {
    let header = req
        .headers()
        .get("Authorization")
        .and_then(|h| h.to_str().ok())
        .unwrap_or_default();

    if header == format!("Bearer {GOOD_TOKEN}") {
        Ok(())
    } else {
        Err(HttpResponse::Unauthorized()
            .json(json!({ "message": "Session expired, please log in again" })))
    }
}

async fn login(body: web::Json<LoginReqDto>) -> HttpResponse {
    if body.username == "meera" && body.password == "right" {
        HttpResponse::Ok().json(session(GOOD_TOKEN))
    } else {
        HttpResponse::Unauthorized().json(json!({ "message": "Invalid credentials" }))
    }
}

async fn logout() -> HttpResponse {
    HttpResponse::NoContent().finish()
}

async fn planned(req: HttpRequest, query: web::Query<HashMap<String, String>>) -> HttpResponse {
    if let Err(resp) = check_token(&req) {
        return resp;
    }
    if query.get("month").map(String::as_str) != Some("2025-03") {
        return HttpResponse::Ok().json(json!([]));
    }

    HttpResponse::Ok().json(json!([
        {
            "id": 1, "month": "2025-03", "supervisorName": "Ravi",
            "productKey": "Acme Bank - Home Loans", "numCases": 20,
            "pos": 0.0, "basic": 0.0, "moneyCollection": 20000.0
        },
        {
            "id": 2, "month": "2025-03", "supervisorName": "Ravi",
            "productKey": "acme bank -  home loans", "numCases": 20,
            "pos": 0.0, "basic": 0.0, "moneyCollection": 30000.0
        }
    ]))
}

async fn received(req: HttpRequest) -> HttpResponse {
    if let Err(resp) = check_token(&req) {
        return resp;
    }

    HttpResponse::Ok().json(json!([
        {
            "id": 9, "month": "2025-03", "processKey": "Acme Bank - Home Loans",
            "billAmount": 45000.0, "tds": 0.0, "balance": 45000.0, "rate": 0.0,
            "grossSalary": 0.0, "netSalary": 0.0, "total": 45000.0
        }
    ]))
}

async fn distributions(req: HttpRequest) -> HttpResponse {
    if let Err(resp) = check_token(&req) {
        return resp;
    }

    HttpResponse::Ok().json(json!([
        {
            "id": 4, "month": "2025-03", "supervisorId": 3, "supervisorName": "Ravi",
            "teamMemberIds": [5, 6], "productKey": "Acme Bank - Home Loans",
            "moneyCollection": 20000.0, "incentiveReceived": 10000.0, "employeeIncentive": 0.0,
            "incentive": {
                "incentive": 10000.0, "supervisorIncentive": 6000.0,
                "teamIncentivePool": 4000.0, "individualTeamIncentive": 2000.0,
                "memberCount": 2, "poolUnassigned": false
            }
        }
    ]))
}

async fn empty_list(req: HttpRequest) -> HttpResponse {
    if let Err(resp) = check_token(&req) {
        return resp;
    }
    HttpResponse::Ok().json(json!([]))
}

struct MockServer {
    base_url: String,
    handle: ServerHandle,
}

impl MockServer {
    async fn start() -> Self {
        let server = HttpServer::new(|| {
            App::new().service(
                web::scope("/api")
                    .route("/users/login", web::post().to(login))
                    .route("/users/logout", web::post().to(logout))
                    .route("/planned-collections", web::get().to(planned))
                    .route("/planned-collections/recived", web::get().to(received))
                    .route("/planned-collections/distributions", web::get().to(distributions))
                    .route("/payout-verifications", web::get().to(empty_list))
                    .route("/attendance", web::get().to(empty_list)),
            )
        })
        .workers(1)
        .bind(("127.0.0.1", 0))
        .unwrap();

        let addr = server.addrs()[0];
        let server = server.run();
        let handle = server.handle();
        actix_web::rt::spawn(server);

        Self {
            base_url: format!("http://{addr}/api"),
            handle,
        }
    }

    async fn stop(self) {
        self.handle.stop(false).await;
    }
}

#[actix_web::test]
async fn login_failure_surfaces_server_message() {
    let server = MockServer::start().await;
    let dir = tempfile::tempdir().unwrap();
    let store = SessionStore::new(dir.path().join("userInfo.json"));
    let client = ApiClient::new(&server.base_url, store.clone()).unwrap();
    let mut state = AppState::hydrate(client.session());

    let err = actions::login(&client, &mut state, "meera", "wrong")
        .await
        .unwrap_err();

    assert!(matches!(err, ClientError::Api { status: 401, .. }));
    assert_eq!(state.user_info.error.as_deref(), Some("Invalid credentials"));
    assert!(!state.is_logged_in());
    assert_eq!(store.load().unwrap(), None);

    server.stop().await;
}

#[actix_web::test]
async fn session_survives_restart_and_report_is_reconciled() {
    let server = MockServer::start().await;
    let dir = tempfile::tempdir().unwrap();
    let store = SessionStore::new(dir.path().join("userInfo.json"));

    {
        let client = ApiClient::new(&server.base_url, store.clone()).unwrap();
        let mut state = AppState::hydrate(client.session());
        actions::login(&client, &mut state, "meera", "right")
            .await
            .unwrap();
        assert_eq!(state.user_info.data, Some(session(GOOD_TOKEN)));
    }

    // a fresh client hydrates from the stored session
    let client = ApiClient::new(&server.base_url, store).unwrap();
    let mut state = AppState::hydrate(client.session());
    assert!(state.is_logged_in());

    actions::load_report(&client, &mut state, Some("March 2025"))
        .await
        .unwrap();

    let report = state.report.data.as_ref().unwrap();
    assert_eq!(report.month, "2025-03");
    assert_eq!(report.planned.len(), 2);
    assert_eq!(report.distributions[0].incentive.member_count, 2);

    assert_eq!(report.summary.len(), 1);
    let row = &report.summary[0];
    assert_eq!(row.label, "Acme Bank - Home Loans");
    assert_eq!(row.total_planned_money, 50_000.0);
    assert_eq!(row.total_received_money, 45_000.0);
    assert_eq!(row.achievement, Achievement::Percent(90.0));
    assert!(!state.report.loading);

    actions::logout(&client, &mut state).await.unwrap();
    assert!(!state.is_logged_in());
    assert_eq!(client.session(), None);

    server.stop().await;
}

#[actix_web::test]
async fn unauthorized_response_clears_session() {
    let server = MockServer::start().await;
    let dir = tempfile::tempdir().unwrap();
    let store = SessionStore::new(dir.path().join("userInfo.json"));
    store.save(&session("revoked-token")).unwrap();

    let client = ApiClient::new(&server.base_url, store.clone()).unwrap();
    let mut state = AppState::hydrate(client.session());
    assert!(state.is_logged_in());

    let err = actions::load_report(&client, &mut state, Some("2025-03"))
        .await
        .unwrap_err();

    assert!(err.is_unauthorized());
    assert_eq!(err.to_string(), "Session expired, please log in again");
    assert!(!state.is_logged_in());
    assert!(state.report.data.is_none());
    assert_eq!(client.session(), None);
    assert_eq!(store.load().unwrap(), None);

    server.stop().await;
}

#[actix_web::test]
async fn bad_month_fails_before_any_request() {
    let server = MockServer::start().await;
    let dir = tempfile::tempdir().unwrap();
    let store = SessionStore::new(dir.path().join("userInfo.json"));
    store.save(&session(GOOD_TOKEN)).unwrap();

    let client = ApiClient::new(&server.base_url, store).unwrap();
    let mut state = AppState::hydrate(client.session());

    let err = actions::load_report(&client, &mut state, Some("2025-13"))
        .await
        .unwrap_err();

    assert!(matches!(err, ClientError::Api { status: 400, .. }));
    assert_eq!(state.report.error.as_deref(), Some("Invalid month: 2025-13"));
    assert!(state.is_logged_in());

    server.stop().await;
}
