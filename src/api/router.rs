//! HTTP router.
//!
//! Three route groups share one `ApiContext`:
//! - public: `/`, `/login`, `/logout`, `/contact`
//! - patient: gated by `require_patient`
//! - doctor: gated by `require_doctor`
//!
//! Middleware stack (outermost → innermost):
//! Extension → Audit → [Cache-Control → Session gate] → Handler
//!
//! The gate and header are route layers, so unmatched paths fall through
//! to the plain 404 fallback.

use std::sync::Arc;

use axum::http::{header, HeaderValue};
use axum::middleware::from_fn;
use axum::routing::{get, post};
use axum::Router;
use tower_http::set_header::SetResponseHeaderLayer;

use crate::api::endpoints::{appointments, contact, doctor, labs, login, patient};
use crate::api::middleware;
use crate::api::types::ApiContext;
use crate::core_state::CoreState;

/// Build the application router.
///
/// Middleware uses `Extension<ApiContext>` (injected as the outermost layer).
/// Handlers use `State<ApiContext>` (provided via `with_state`).
pub fn app_router(core: Arc<CoreState>) -> Router {
    build_router(ApiContext::new(core))
}

fn no_store() -> SetResponseHeaderLayer<HeaderValue> {
    SetResponseHeaderLayer::overriding(header::CACHE_CONTROL, HeaderValue::from_static("no-store"))
}

fn build_router(ctx: ApiContext) -> Router {
    let public = Router::new()
        .route("/", get(login::index))
        .route("/login", get(login::page).post(login::submit))
        .route("/logout", get(login::logout))
        .route("/contact", get(contact::directory))
        .with_state(ctx.clone());

    // NOTE: Path params use `:param` syntax (matchit 0.7 / axum 0.7).
    let patient_routes = Router::new()
        .route("/patient", get(patient::dashboard))
        .route("/log", post(patient::log_health))
        .route("/book", get(appointments::booking_page).post(appointments::book))
        .route("/message_care_team", post(contact::send_message))
        .route("/labs", get(labs::list))
        .with_state(ctx.clone())
        .route_layer(from_fn(middleware::session::require_patient))
        .route_layer(no_store());

    let doctor_routes = Router::new()
        .route("/doctor", get(doctor::dashboard))
        .route(
            "/recommend/:patient_id",
            get(doctor::recommend_page).post(doctor::recommend),
        )
        .route("/appointments/:id/status", post(appointments::update_status))
        .with_state(ctx.clone())
        .route_layer(from_fn(middleware::session::require_doctor))
        .route_layer(no_store());

    Router::new()
        .merge(public)
        .merge(patient_routes)
        .merge(doctor_routes)
        .layer(from_fn(middleware::audit::log_request))
        // Extension must be outermost so middleware can extract ApiContext
        .layer(axum::Extension(ctx))
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use axum::body::Body;
    use axum::http::{Request, Response, StatusCode};
    use http_body_util::BodyExt;
    use tower::ServiceExt;

    use super::*;
    use crate::advisory::{MockAdvisoryClient, FALLBACK_MESSAGE};
    use crate::api::endpoints::appointments::{
        APPOINTMENT_BOOKED, APPOINTMENT_NOT_FOUND, APPOINTMENT_UPDATED, NO_DOCTOR_ASSIGNED,
    };
    use crate::api::endpoints::contact::MESSAGE_SENT;
    use crate::api::endpoints::doctor::{PATIENT_NOT_ASSIGNED, RECOMMENDATION_SAVED};
    use crate::api::endpoints::patient::LOG_SAVED;
    use crate::auth::{INVALID_DOCTOR_CREDENTIALS, INVALID_PATIENT_CREDENTIALS, INVALID_ROLE};
    use crate::core_state::test_support::*;
    use crate::db::repository::test_support::{at, make_doctor, make_patient};
    use crate::db::repository::*;
    use crate::models::enums::AppointmentStatus;

    struct Harness {
        app: Router,
        core: Arc<CoreState>,
        _dir: tempfile::TempDir,
    }

    impl Harness {
        fn new(reply: &str) -> Self {
            let (core, dir) = test_core_with_reply(reply);
            Self {
                app: app_router(core.clone()),
                core,
                _dir: dir,
            }
        }

        fn conn(&self) -> rusqlite::Connection {
            self.core.open_db().unwrap()
        }

        async fn send(&self, req: Request<Body>) -> Response<Body> {
            self.app.clone().oneshot(req).await.unwrap()
        }

        async fn get(&self, uri: &str, cookie: Option<&str>) -> Response<Body> {
            self.send(request("GET", uri, cookie, None)).await
        }

        async fn post(&self, uri: &str, cookie: Option<&str>, form: &str) -> Response<Body> {
            self.send(request("POST", uri, cookie, Some(form))).await
        }

        /// Log in and return the `Cookie` header value for the session.
        async fn login(&self, role: &str, email: &str, password: &str) -> String {
            let form = format!("role={role}&email={email}&password={password}");
            let response = self.post("/login", None, &form).await;
            assert_eq!(response.status(), StatusCode::SEE_OTHER);
            session_cookie_of(&response).expect("login should set a session cookie")
        }
    }

    fn request(method: &str, uri: &str, cookie: Option<&str>, form: Option<&str>) -> Request<Body> {
        let mut builder = Request::builder().method(method).uri(uri);
        if let Some(c) = cookie {
            builder = builder.header("Cookie", c);
        }
        match form {
            Some(body) => builder
                .header("Content-Type", "application/x-www-form-urlencoded")
                .body(Body::from(body.to_string()))
                .unwrap(),
            None => builder.body(Body::empty()).unwrap(),
        }
    }

    fn session_cookie_of(response: &Response<Body>) -> Option<String> {
        let raw = response.headers().get("Set-Cookie")?.to_str().ok()?;
        let pair = raw.split(';').next()?.trim();
        pair.starts_with("telecare_session=").then(|| pair.to_string())
    }

    fn location(response: &Response<Body>) -> &str {
        response.headers().get("Location").unwrap().to_str().unwrap()
    }

    async fn json(response: Response<Body>) -> serde_json::Value {
        let bytes = response.into_body().collect().await.unwrap().to_bytes();
        serde_json::from_slice(&bytes).unwrap()
    }

    fn assert_redirect(response: &Response<Body>, to: &str) {
        assert_eq!(response.status(), StatusCode::SEE_OTHER);
        assert_eq!(location(response), to);
    }

    // ── Public routes ─────────────────────────────────────

    #[tokio::test]
    async fn root_redirects_to_login() {
        let h = Harness::new("stable");
        assert_redirect(&h.get("/", None).await, "/login");
    }

    #[tokio::test]
    async fn login_page_lists_roles() {
        let h = Harness::new("stable");
        let response = h.get("/login", None).await;
        assert_eq!(response.status(), StatusCode::OK);
        let body = json(response).await;
        assert_eq!(body["roles"], serde_json::json!(["patient", "caregiver", "doctor"]));
        assert!(body["signed_in_as"].is_null());
    }

    #[tokio::test]
    async fn unknown_route_is_404() {
        let h = Harness::new("stable");
        assert_eq!(h.get("/nonexistent", None).await.status(), StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn unknown_route_with_session_is_404_and_keeps_session() {
        let h = Harness::new("stable");
        make_doctor(&h.conn(), "Dr One");
        let cookie = h.login("doctor", "dr.one@clinic.test", "doc-pass").await;

        let response = h.get("/nonexistent", Some(&cookie)).await;
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
        assert!(response.headers().get("Cache-Control").is_none());

        assert_eq!(h.get("/doctor", Some(&cookie)).await.status(), StatusCode::OK);
    }

    // ── Session gate ──────────────────────────────────────

    #[tokio::test]
    async fn gated_routes_redirect_without_session() {
        let h = Harness::new("stable");
        for uri in ["/patient", "/book", "/labs", "/doctor", "/recommend/1"] {
            assert_redirect(&h.get(uri, None).await, "/login");
        }
    }

    #[tokio::test]
    async fn gated_posts_without_session_mutate_nothing() {
        let h = Harness::new("stable");
        let (pat, doc) = {
            let conn = h.conn();
            let doc = make_doctor(&conn, "Dr One");
            (make_patient(&conn, "Ann", Some(doc)), doc)
        };

        assert_redirect(&h.post("/log", None, "symptoms=cough&medication=none").await, "/login");
        assert_redirect(&h.post("/book", None, "date=2024-07-01&time=10:00").await, "/login");
        assert_redirect(
            &h.post("/message_care_team", None, "recipient_id=1&subject=s&body=b").await,
            "/login",
        );
        assert_redirect(&h.post(&format!("/recommend/{pat}"), None, "advice=x").await, "/login");

        let conn = h.conn();
        assert!(recent_health_logs(&conn, pat, 10).unwrap().is_empty());
        assert!(list_patient_appointments(&conn, pat).unwrap().is_empty());
        assert!(list_messages_for_patient(&conn, pat).unwrap().is_empty());
        assert!(list_recommendations(&conn, pat).unwrap().is_empty());
        assert!(pending_appointments_for_doctor(&conn, doc).unwrap().is_empty());
    }

    #[tokio::test]
    async fn forged_cookie_is_rejected() {
        let h = Harness::new("stable");
        let response = h.get("/patient", Some("telecare_session=forged")).await;
        assert_redirect(&response, "/login");
    }

    #[tokio::test]
    async fn wrong_role_is_redirected() {
        let h = Harness::new("stable");
        {
            let conn = h.conn();
            let doc = make_doctor(&conn, "Dr One");
            make_patient(&conn, "Ann", Some(doc));
        }
        let patient = h.login("patient", "ann@mail.test", "pat-pass").await;
        let doctor = h.login("doctor", "dr.one@clinic.test", "doc-pass").await;

        assert_redirect(&h.get("/doctor", Some(&patient)).await, "/login");
        assert_redirect(&h.get("/patient", Some(&doctor)).await, "/login");
    }

    #[tokio::test]
    async fn expired_session_behaves_like_none() {
        let client = Arc::new(MockAdvisoryClient::new("stable"));
        let dir = tempfile::tempdir().unwrap();
        let db_path = dir.path().join("telecare.db");
        crate::db::open_database(&db_path).unwrap();
        let core = Arc::new(CoreState::new(db_path, Duration::ZERO, client));
        make_patient(&core.open_db().unwrap(), "Ann", None);
        let app = app_router(core);

        let response = app
            .clone()
            .oneshot(request(
                "POST",
                "/login",
                None,
                Some("role=patient&email=ann@mail.test&password=pat-pass"),
            ))
            .await
            .unwrap();
        let cookie = session_cookie_of(&response).unwrap();

        let response = app
            .oneshot(request("GET", "/patient", Some(&cookie), None))
            .await
            .unwrap();
        assert_redirect(&response, "/login");
    }

    // ── Login ─────────────────────────────────────────────

    #[tokio::test]
    async fn patient_login_sets_cookie_and_lands_on_dashboard() {
        let h = Harness::new("stable");
        {
            let conn = h.conn();
            let doc = make_doctor(&conn, "Dr One");
            make_patient(&conn, "Ann", Some(doc));
        }

        let response = h
            .post("/login", None, "role=patient&email=ann@mail.test&password=pat-pass")
            .await;
        assert_redirect(&response, "/patient");
        let set_cookie = response.headers().get("Set-Cookie").unwrap().to_str().unwrap();
        assert!(set_cookie.contains("HttpOnly"));
        assert!(set_cookie.contains("SameSite=Lax"));

        let cookie = session_cookie_of(&response).unwrap();
        let response = h.get("/patient", Some(&cookie)).await;
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(response.headers().get("Cache-Control").unwrap(), "no-store");
        let body = json(response).await;
        assert_eq!(body["patient_name"], "Ann");
        assert_eq!(body["is_caregiver"], false);
        assert_eq!(body["doctor_name"], "Dr One");
    }

    #[tokio::test]
    async fn caregiver_login_marks_session() {
        let h = Harness::new("stable");
        make_patient(&h.conn(), "Ann", None);
        let cookie = h.login("caregiver", "ann@mail.test", "pat-pass").await;
        let body = json(h.get("/patient", Some(&cookie)).await).await;
        assert_eq!(body["is_caregiver"], true);
    }

    #[tokio::test]
    async fn doctor_login_lands_on_doctor_dashboard() {
        let h = Harness::new("stable");
        make_doctor(&h.conn(), "Dr One");
        let response = h
            .post("/login", None, "role=doctor&email=dr.one@clinic.test&password=doc-pass")
            .await;
        assert_redirect(&response, "/doctor");

        let cookie = session_cookie_of(&response).unwrap();
        let body = json(h.get("/doctor", Some(&cookie)).await).await;
        assert_eq!(body["doctor_name"], "Dr One");
    }

    #[tokio::test]
    async fn bad_credentials_show_generic_message_and_create_no_session() {
        let h = Harness::new("stable");
        {
            let conn = h.conn();
            make_doctor(&conn, "Dr One");
            make_patient(&conn, "Ann", None);
        }

        let response = h
            .post("/login", None, "role=patient&email=ann@mail.test&password=wrong")
            .await;
        assert_eq!(response.status(), StatusCode::OK);
        assert!(response.headers().get("Set-Cookie").is_none());
        assert_eq!(json(response).await["flashes"][0], INVALID_PATIENT_CREDENTIALS);

        let response = h
            .post("/login", None, "role=doctor&email=nobody@clinic.test&password=doc-pass")
            .await;
        assert_eq!(json(response).await["flashes"][0], INVALID_DOCTOR_CREDENTIALS);

        assert!(h.core.lock_sessions().unwrap().is_empty());
    }

    #[tokio::test]
    async fn unknown_role_is_rejected() {
        let h = Harness::new("stable");
        let response = h.post("/login", None, "role=nurse&email=a@b&password=c").await;
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(json(response).await["flashes"][0], INVALID_ROLE);
    }

    #[tokio::test]
    async fn login_assigns_a_doctor_once() {
        let h = Harness::new("stable");
        let pat = {
            let conn = h.conn();
            make_doctor(&conn, "Dr One");
            make_doctor(&conn, "Dr Two");
            make_patient(&conn, "Ann", None)
        };

        h.login("patient", "ann@mail.test", "pat-pass").await;
        let first = get_patient(&h.conn(), pat).unwrap().unwrap().doctor_id;
        assert!(first.is_some());

        for _ in 0..5 {
            h.login("patient", "ann@mail.test", "pat-pass").await;
        }
        assert_eq!(get_patient(&h.conn(), pat).unwrap().unwrap().doctor_id, first);
    }

    #[tokio::test]
    async fn logout_ends_session() {
        let h = Harness::new("stable");
        make_patient(&h.conn(), "Ann", None);
        let cookie = h.login("patient", "ann@mail.test", "pat-pass").await;

        let response = h.get("/logout", Some(&cookie)).await;
        assert_redirect(&response, "/login");
        let set_cookie = response.headers().get("Set-Cookie").unwrap().to_str().unwrap();
        assert!(set_cookie.contains("Max-Age=0"));

        assert_redirect(&h.get("/patient", Some(&cookie)).await, "/login");
    }

    // ── Patient pages ─────────────────────────────────────

    #[tokio::test]
    async fn health_log_appears_first_and_only_for_its_patient() {
        let h = Harness::new("Your condition is improving. Keep it up.");
        let (ann, ben) = {
            let conn = h.conn();
            let doc = make_doctor(&conn, "Dr One");
            let ann = make_patient(&conn, "Ann", Some(doc));
            let ben = make_patient(&conn, "Ben", Some(doc));
            insert_health_log(&conn, ann, "older", "none", &at("2024-01-01 08:00:00")).unwrap();
            (ann, ben)
        };
        let cookie = h.login("patient", "ann@mail.test", "pat-pass").await;

        let response = h
            .post("/log", Some(&cookie), "symptoms=mild+headache&medication=ibuprofen")
            .await;
        assert_redirect(&response, "/patient");

        let conn = h.conn();
        assert_eq!(recent_health_logs(&conn, ann, 10).unwrap().len(), 2);
        assert!(recent_health_logs(&conn, ben, 10).unwrap().is_empty());

        let body = json(h.get("/patient", Some(&cookie)).await).await;
        assert_eq!(body["logs"][0]["symptoms"], "mild headache");
        assert_eq!(body["logs"][1]["symptoms"], "older");
        assert_eq!(body["flashes"][0], LOG_SAVED);
        assert_eq!(body["advisory"]["trend"], "improving");
        assert_eq!(body["advisory"]["trend_series"], serde_json::json!([2, 3, 4, 5, 6, 7, 8]));

        // Flashes are shown once.
        let body = json(h.get("/patient", Some(&cookie)).await).await;
        assert!(body["flashes"].as_array().unwrap().is_empty());
    }

    #[tokio::test]
    async fn advisory_failure_shows_apology() {
        let client = Arc::new(MockAdvisoryClient::failing("upstream exploded"));
        let (core, _dir) = test_core(client);
        let pat = {
            let conn = core.open_db().unwrap();
            let pat = make_patient(&conn, "Ann", None);
            insert_health_log(&conn, pat, "cough", "none", &at("2024-01-01 08:00:00")).unwrap();
            pat
        };
        let app = app_router(core.clone());
        let token = core.lock_sessions().unwrap().create(crate::session::Identity::Patient {
            patient_id: pat,
            name: "Ann".into(),
            is_caregiver: false,
        });
        let cookie = format!("telecare_session={token}");

        let response = app
            .oneshot(request("GET", "/patient", Some(&cookie), None))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let body = json(response).await;
        assert_eq!(body["advisory"]["message"], FALLBACK_MESSAGE);
        assert_eq!(body["advisory"]["trend"], "stable");
    }

    #[tokio::test]
    async fn booking_without_doctor_inserts_nothing() {
        let h = Harness::new("stable");
        let pat = make_patient(&h.conn(), "Ann", None);
        // No doctors exist, so login cannot assign one.
        let cookie = h.login("patient", "ann@mail.test", "pat-pass").await;

        let response = h.post("/book", Some(&cookie), "date=2024-07-01&time=10:00").await;
        assert_redirect(&response, "/patient");
        assert!(list_patient_appointments(&h.conn(), pat).unwrap().is_empty());

        let body = json(h.get("/patient", Some(&cookie)).await).await;
        assert_eq!(body["flashes"][0], NO_DOCTOR_ASSIGNED);
    }

    #[tokio::test]
    async fn booking_with_doctor_inserts_one_pending_row() {
        let h = Harness::new("stable");
        let (pat, doc) = {
            let conn = h.conn();
            let doc = make_doctor(&conn, "Dr One");
            (make_patient(&conn, "Ann", Some(doc)), doc)
        };
        let cookie = h.login("patient", "ann@mail.test", "pat-pass").await;

        let response = h.post("/book", Some(&cookie), "date=2024-07-01&time=10:30").await;
        assert_redirect(&response, "/patient");

        let appointments = list_patient_appointments(&h.conn(), pat).unwrap();
        assert_eq!(appointments.len(), 1);
        assert_eq!(appointments[0].doctor_id, doc);
        assert_eq!(appointments[0].status, AppointmentStatus::Pending);

        let body = json(h.get("/book", Some(&cookie)).await).await;
        assert_eq!(body["flashes"][0], APPOINTMENT_BOOKED);
        assert_eq!(body["doctor"]["name"], "Dr One");
        assert_eq!(body["appointments"].as_array().unwrap().len(), 1);
        assert!(body["doctor"].get("password_hash").is_none());
    }

    #[tokio::test]
    async fn booking_with_bad_slot_returns_to_form() {
        let h = Harness::new("stable");
        let pat = {
            let conn = h.conn();
            let doc = make_doctor(&conn, "Dr One");
            make_patient(&conn, "Ann", Some(doc))
        };
        let cookie = h.login("patient", "ann@mail.test", "pat-pass").await;

        let response = h.post("/book", Some(&cookie), "date=someday&time=10:30").await;
        assert_redirect(&response, "/book");
        assert!(list_patient_appointments(&h.conn(), pat).unwrap().is_empty());
    }

    #[tokio::test]
    async fn contact_is_public_and_hides_credentials() {
        let h = Harness::new("stable");
        {
            let conn = h.conn();
            make_doctor(&conn, "Dr One");
            insert_nurse(&conn, "Nina", Some("Triage"), Some("555-0101"), None).unwrap();
        }
        let response = h.get("/contact", None).await;
        assert_eq!(response.status(), StatusCode::OK);
        let body = json(response).await;
        assert_eq!(body["doctors"][0]["name"], "Dr One");
        assert!(body["doctors"][0].get("password_hash").is_none());
        assert_eq!(body["nurses"][0]["name"], "Nina");
        assert!(body["sent_messages"].as_array().unwrap().is_empty());
    }

    #[tokio::test]
    async fn message_is_stored_and_listed() {
        let h = Harness::new("stable");
        let (pat, doc) = {
            let conn = h.conn();
            let doc = make_doctor(&conn, "Dr One");
            (make_patient(&conn, "Ann", Some(doc)), doc)
        };
        let cookie = h.login("patient", "ann@mail.test", "pat-pass").await;

        let form = format!("recipient_id={doc}&subject=Refill&body=Need+more+inhaler");
        let response = h.post("/message_care_team", Some(&cookie), &form).await;
        assert_redirect(&response, "/contact");

        let messages = list_messages_for_patient(&h.conn(), pat).unwrap();
        assert_eq!(messages.len(), 1);
        assert_eq!(messages[0].body, "Need more inhaler");

        let body = json(h.get("/contact", Some(&cookie)).await).await;
        assert_eq!(body["flashes"][0], MESSAGE_SENT);
        assert_eq!(body["sent_messages"][0]["subject"], "Refill");
    }

    #[tokio::test]
    async fn labs_filter_by_test_name() {
        let h = Harness::new("stable");
        {
            let conn = h.conn();
            let pat = make_patient(&conn, "Ann", None);
            for (date, test, value) in [
                ("2024-01-10", "Glucose", "92"),
                ("2024-02-10", "TSH", "2.0"),
                ("2024-03-10", "Glucose", "99"),
            ] {
                insert_lab_result(
                    &conn,
                    &NewLabResult {
                        patient_id: pat,
                        date: chrono::NaiveDate::parse_from_str(date, "%Y-%m-%d").unwrap(),
                        test_name: test.into(),
                        value: value.into(),
                        unit: None,
                        reference_range: None,
                        status: None,
                        clinician_notes: None,
                    },
                )
                .unwrap();
            }
        }
        let cookie = h.login("patient", "ann@mail.test", "pat-pass").await;

        let body = json(h.get("/labs", Some(&cookie)).await).await;
        assert_eq!(body["results"].as_array().unwrap().len(), 3);
        assert_eq!(body["test_names"], serde_json::json!(["Glucose", "TSH"]));
        assert!(body["selected_test"].is_null());

        let body = json(h.get("/labs?test=Glucose", Some(&cookie)).await).await;
        let results = body["results"].as_array().unwrap();
        assert_eq!(results.len(), 2);
        assert_eq!(results[0]["value"], "99");
        assert_eq!(body["selected_test"], "Glucose");

        let body = json(h.get("/labs?test=", Some(&cookie)).await).await;
        assert_eq!(body["results"].as_array().unwrap().len(), 3);
    }

    // ── Doctor pages ──────────────────────────────────────

    #[tokio::test]
    async fn doctor_dashboard_lists_assigned_patients_with_advisories() {
        let h = Harness::new("The patient seems to be worsening; schedule a visit.");
        {
            let conn = h.conn();
            let doc = make_doctor(&conn, "Dr One");
            let other = make_doctor(&conn, "Dr Two");
            let ann = make_patient(&conn, "Ann", Some(doc));
            make_patient(&conn, "Ben", Some(other));
            insert_health_log(&conn, ann, "fever", "none", &at("2024-01-01 08:00:00")).unwrap();
        }
        let cookie = h.login("doctor", "dr.one@clinic.test", "doc-pass").await;

        let response = h.get("/doctor", Some(&cookie)).await;
        assert_eq!(response.headers().get("Cache-Control").unwrap(), "no-store");
        let body = json(response).await;
        let patients = body["patients"].as_array().unwrap();
        assert_eq!(patients.len(), 1);
        assert_eq!(patients[0]["name"], "Ann");
        assert_eq!(patients[0]["logs"][0]["symptoms"], "fever");
        assert_eq!(patients[0]["advisory"]["trend"], "worsening");
    }

    #[tokio::test]
    async fn assigned_doctor_can_recommend() {
        let h = Harness::new("stable");
        let pat = {
            let conn = h.conn();
            let doc = make_doctor(&conn, "Dr One");
            make_patient(&conn, "Ann", Some(doc))
        };
        let doctor = h.login("doctor", "dr.one@clinic.test", "doc-pass").await;

        let response = h
            .post(&format!("/recommend/{pat}"), Some(&doctor), "advice=Drink+more+water")
            .await;
        assert_redirect(&response, "/doctor");

        let body = json(h.get(&format!("/recommend/{pat}"), Some(&doctor)).await).await;
        assert_eq!(body["patient_name"], "Ann");
        assert_eq!(body["recommendations"][0]["advice"], "Drink more water");
        assert_eq!(body["flashes"][0], RECOMMENDATION_SAVED);

        let patient = h.login("patient", "ann@mail.test", "pat-pass").await;
        let body = json(h.get("/patient", Some(&patient)).await).await;
        assert_eq!(body["recommendation"], "Drink more water");
    }

    #[tokio::test]
    async fn unassigned_doctor_cannot_read_or_write_recommendations() {
        let h = Harness::new("stable");
        let pat = {
            let conn = h.conn();
            let doc = make_doctor(&conn, "Dr One");
            make_doctor(&conn, "Dr Two");
            let pat = make_patient(&conn, "Ann", Some(doc));
            insert_recommendation(&conn, pat, doc, "Private advice", &at("2024-01-01 08:00:00"))
                .unwrap();
            pat
        };
        let intruder = h.login("doctor", "dr.two@clinic.test", "doc-pass").await;

        assert_redirect(&h.get(&format!("/recommend/{pat}"), Some(&intruder)).await, "/doctor");
        let response = h
            .post(&format!("/recommend/{pat}"), Some(&intruder), "advice=Hijack")
            .await;
        assert_redirect(&response, "/doctor");
        assert_eq!(list_recommendations(&h.conn(), pat).unwrap().len(), 1);

        let body = json(h.get("/doctor", Some(&intruder)).await).await;
        assert_eq!(body["flashes"][0], PATIENT_NOT_ASSIGNED);

        // Unknown patient takes the same path.
        assert_redirect(&h.get("/recommend/9999", Some(&intruder)).await, "/doctor");
    }

    #[tokio::test]
    async fn doctor_updates_only_own_appointments() {
        let h = Harness::new("stable");
        let (mine, theirs) = {
            let conn = h.conn();
            let doc = make_doctor(&conn, "Dr One");
            let other = make_doctor(&conn, "Dr Two");
            let ann = make_patient(&conn, "Ann", Some(doc));
            let ben = make_patient(&conn, "Ben", Some(other));
            let date = chrono::NaiveDate::from_ymd_opt(2024, 7, 1).unwrap();
            let time = chrono::NaiveTime::from_hms_opt(9, 0, 0).unwrap();
            (
                insert_appointment(&conn, ann, doc, &date, &time).unwrap(),
                insert_appointment(&conn, ben, other, &date, &time).unwrap(),
            )
        };
        let cookie = h.login("doctor", "dr.one@clinic.test", "doc-pass").await;

        let response = h
            .post(&format!("/appointments/{mine}/status"), Some(&cookie), "status=confirmed")
            .await;
        assert_redirect(&response, "/doctor");
        let body = json(h.get("/doctor", Some(&cookie)).await).await;
        assert_eq!(body["flashes"][0], APPOINTMENT_UPDATED);
        // No longer pending.
        assert!(body["pending_appointments"].as_array().unwrap().is_empty());

        let response = h
            .post(&format!("/appointments/{theirs}/status"), Some(&cookie), "status=cancelled")
            .await;
        assert_redirect(&response, "/doctor");
        let body = json(h.get("/doctor", Some(&cookie)).await).await;
        assert_eq!(body["flashes"][0], APPOINTMENT_NOT_FOUND);

        let other = h.login("doctor", "dr.two@clinic.test", "doc-pass").await;
        let body = json(h.get("/doctor", Some(&other)).await).await;
        assert_eq!(body["pending_appointments"].as_array().unwrap().len(), 1);
    }
}
