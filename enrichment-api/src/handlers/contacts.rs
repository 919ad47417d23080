use actix_web::{web, HttpRequest, HttpResponse};
use serde::Deserialize;
use shared_types::{
    BulkCreateContactsRequest, ContactResponse, CreateContactRequest, EnrichContactsRequest,
    EnrichContactsResponse, ImportContactsRequest,
};
use std::collections::BTreeMap;

use super::AppState;
use crate::contacts::{queries, stats, ImportRows, ListContactsParams};
use crate::error::{ContactError, ContactResult};

pub async fn create_contact(
    state: web::Data<AppState>,
    req: HttpRequest,
    body: web::Json<CreateContactRequest>,
) -> ContactResult<HttpResponse> {
    let user_id = state.authenticate(&req).await?;
    let contact = state
        .importer
        .create_contact(user_id, body.into_inner().original_contact)
        .await?;

    Ok(HttpResponse::Created().json(ContactResponse { contact }))
}

pub async fn bulk_create_contacts(
    state: web::Data<AppState>,
    req: HttpRequest,
    body: web::Json<BulkCreateContactsRequest>,
) -> ContactResult<HttpResponse> {
    let user_id = state.authenticate(&req).await?;
    let result = state
        .importer
        .import_batch(user_id, ImportRows::Typed(body.into_inner().contacts))
        .await?;

    Ok(HttpResponse::Created().json(result))
}

pub async fn import_contacts(
    state: web::Data<AppState>,
    req: HttpRequest,
    body: web::Json<ImportContactsRequest>,
) -> ContactResult<HttpResponse> {
    let user_id = state.authenticate(&req).await?;
    let request = body.into_inner();
    let result = state
        .importer
        .import_batch(
            user_id,
            ImportRows::Raw {
                rows: request.contacts,
                field_mapping: request.field_mapping,
            },
        )
        .await?;

    Ok(HttpResponse::Created().json(result))
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CsvImportParams {
    /// JSON object of column overrides, e.g. `{"Team":"department"}`
    pub field_mapping: Option<String>,
}

pub async fn import_csv(
    state: web::Data<AppState>,
    req: HttpRequest,
    query: web::Query<CsvImportParams>,
    body: web::Bytes,
) -> ContactResult<HttpResponse> {
    let user_id = state.authenticate(&req).await?;

    let field_mapping = match query.field_mapping.as_deref() {
        Some(raw) => Some(
            serde_json::from_str::<BTreeMap<String, String>>(raw)
                .map_err(|e| ContactError::InvalidInput(format!("fieldMapping: {e}")))?,
        ),
        None => None,
    };

    let result = state
        .importer
        .import_csv(user_id, &body, field_mapping)
        .await?;

    Ok(HttpResponse::Created().json(result))
}

pub async fn list_contacts(
    state: web::Data<AppState>,
    req: HttpRequest,
    query: web::Query<ListContactsParams>,
) -> ContactResult<HttpResponse> {
    let user_id = state.authenticate(&req).await?;
    let page = queries::list_contacts(state.store.as_ref(), user_id, &query).await?;

    Ok(HttpResponse::Ok().json(page))
}

pub async fn contact_stats(
    state: web::Data<AppState>,
    req: HttpRequest,
) -> ContactResult<HttpResponse> {
    let user_id = state.authenticate(&req).await?;
    let stats = stats::contact_stats(state.store.as_ref(), user_id).await?;

    Ok(HttpResponse::Ok().json(stats))
}

pub async fn get_contact(
    state: web::Data<AppState>,
    req: HttpRequest,
    path: web::Path<String>,
) -> ContactResult<HttpResponse> {
    let user_id = state.authenticate(&req).await?;
    let contact = queries::get_contact(state.store.as_ref(), user_id, &path).await?;

    Ok(HttpResponse::Ok().json(ContactResponse { contact }))
}

pub async fn enrich_contact(
    state: web::Data<AppState>,
    req: HttpRequest,
    path: web::Path<String>,
) -> ContactResult<HttpResponse> {
    let user_id = state.authenticate(&req).await?;
    let contact = state.enrichment.enrich_one(user_id, &path).await?;

    Ok(HttpResponse::Ok().json(ContactResponse { contact }))
}

pub async fn enrich_bulk(
    state: web::Data<AppState>,
    req: HttpRequest,
    body: web::Json<EnrichContactsRequest>,
) -> ContactResult<HttpResponse> {
    let user_id = state.authenticate(&req).await?;
    let count = state
        .enrichment
        .enrich_many(user_id, &body.contact_ids)
        .await;

    Ok(HttpResponse::Accepted().json(EnrichContactsResponse {
        message: "Bulk enrichment started".to_string(),
        count,
    }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{AuthConfig, TokenEntry};
    use crate::database::contacts::tests::test_store;
    use crate::database::SqliteContactStore;
    use crate::handlers::configure;
    use crate::helpers::identity::StaticTokenIdentity;
    use crate::jobs::EnrichmentManager;
    use crate::test_support::StubProvider;
    use actix_web::http::StatusCode;
    use actix_web::{test, App};
    use importers::FieldNormalizer;
    use serde_json::{json, Value};
    use std::sync::Arc;
    use std::time::Duration;
    use uuid::Uuid;

    const TOKEN: &str = "test-token";

    fn app_state(store: SqliteContactStore, provider: StubProvider) -> (web::Data<AppState>, Uuid) {
        let user = Uuid::new_v4();
        let store: Arc<dyn crate::database::ContactStore> = Arc::new(store);
        let identity = StaticTokenIdentity::from_config(&AuthConfig {
            tokens: vec![TokenEntry {
                token: TOKEN.to_string(),
                user_id: user.to_string(),
            }],
        })
        .unwrap();

        let state = AppState {
            store: store.clone(),
            importer: crate::contacts::ContactImporter::new(
                store.clone(),
                FieldNormalizer::default(),
                100,
            ),
            enrichment: Arc::new(EnrichmentManager::new(
                store,
                Arc::new(provider),
                Duration::from_secs(5),
                None,
            )),
            identity: Arc::new(identity),
        };
        (web::Data::new(state), user)
    }

    fn auth() -> (&'static str, String) {
        ("Authorization", format!("Bearer {TOKEN}"))
    }

    #[actix_web::test]
    async fn test_requests_without_token_are_rejected() {
        let (_dir, store) = test_store();
        let (state, _) = app_state(store, StubProvider::succeed(80));
        let app = test::init_service(App::new().app_data(state).configure(configure)).await;

        let req = test::TestRequest::get().uri("/api/contacts").to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);

        let body: Value = test::read_body_json(resp).await;
        assert_eq!(body["error"]["code"], "UNAUTHENTICATED");

        let req = test::TestRequest::get()
            .uri("/api/contacts")
            .insert_header(("Authorization", "Bearer wrong"))
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);
    }

    #[actix_web::test]
    async fn test_bulk_import_then_list_and_stats() {
        let (_dir, store) = test_store();
        let (state, _) = app_state(store, StubProvider::succeed(80));
        let app = test::init_service(App::new().app_data(state).configure(configure)).await;

        let req = test::TestRequest::post()
            .uri("/api/contacts/bulk")
            .insert_header(auth())
            .set_json(json!({
                "contacts": [
                    {"name": "A", "email": "a@x.com"},
                    {"name": "B", "email": "a@x.com"}
                ]
            }))
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::CREATED);

        let body: Value = test::read_body_json(resp).await;
        assert_eq!(body["totalCreated"], 1);
        assert_eq!(
            body["errors"][0],
            "Row 2: Duplicate email a@x.com (first seen in row 1)"
        );

        let req = test::TestRequest::get()
            .uri("/api/contacts?page=0&pageSize=1000")
            .insert_header(auth())
            .to_request();
        let body: Value = test::call_and_read_body_json(&app, req).await;
        assert_eq!(body["total"], 1);
        assert_eq!(body["page"], 1);
        assert_eq!(body["pageSize"], 10);
        assert_eq!(body["contacts"][0]["status"], "imported");

        let req = test::TestRequest::get()
            .uri("/api/contacts/stats")
            .insert_header(auth())
            .to_request();
        let body: Value = test::call_and_read_body_json(&app, req).await;
        assert_eq!(body["totalContacts"], 1);
        assert_eq!(body["importedContacts"], 1);
        assert_eq!(body["averageConfidence"], 0);
    }

    #[actix_web::test]
    async fn test_raw_and_csv_import() {
        let (_dir, store) = test_store();
        let (state, _) = app_state(store, StubProvider::succeed(80));
        let app = test::init_service(App::new().app_data(state).configure(configure)).await;

        let req = test::TestRequest::post()
            .uri("/api/contacts/import")
            .insert_header(auth())
            .set_json(json!({
                "contacts": [{"Full Name": "Ada", "E-Mail": "ada@example.com", "Pet": "cat"}],
                "fieldMapping": {"Pet": ""}
            }))
            .to_request();
        let body: Value = test::call_and_read_body_json(&app, req).await;
        assert_eq!(body["totalCreated"], 1);
        assert_eq!(body["processedContacts"][0]["originalContact"]["name"], "Ada");
        assert!(body["processedContacts"][0]["originalContact"]["customFields"].is_null());

        let req = test::TestRequest::post()
            .uri("/api/contacts/import/csv?fieldMapping=%7B%22Team%22%3A%22department%22%7D")
            .insert_header(auth())
            .insert_header(("Content-Type", "text/csv"))
            .set_payload("Name,Email,Team\nGrace,grace@navy.mil,Navy\n")
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::CREATED);
        let body: Value = test::read_body_json(resp).await;
        assert_eq!(
            body["processedContacts"][0]["originalContact"]["department"],
            "Navy"
        );

        let req = test::TestRequest::post()
            .uri("/api/contacts/import/csv")
            .insert_header(auth())
            .set_payload("")
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    }

    #[actix_web::test]
    async fn test_create_get_and_enrich() {
        let (_dir, store) = test_store();
        let (state, _) = app_state(store, StubProvider::succeed(90));
        let app = test::init_service(App::new().app_data(state).configure(configure)).await;

        let req = test::TestRequest::post()
            .uri("/api/contacts")
            .insert_header(auth())
            .set_json(json!({"originalContact": {"name": "Ada", "email": "ada@example.com"}}))
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::CREATED);
        let body: Value = test::read_body_json(resp).await;
        let id = body["contact"]["id"].as_str().unwrap().to_string();

        let req = test::TestRequest::post()
            .uri("/api/contacts")
            .insert_header(auth())
            .set_json(json!({"originalContact": {"name": "Ada", "email": "ADA@example.com"}}))
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::CONFLICT);

        let req = test::TestRequest::post()
            .uri(&format!("/api/contacts/{id}/enrich"))
            .insert_header(auth())
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::OK);
        let body: Value = test::read_body_json(resp).await;
        assert_eq!(body["contact"]["status"], "enriched");
        assert_eq!(body["contact"]["enrichmentSummary"]["overallConfidence"], 90);

        let req = test::TestRequest::get()
            .uri(&format!("/api/contacts/{id}"))
            .insert_header(auth())
            .to_request();
        let body: Value = test::call_and_read_body_json(&app, req).await;
        assert!(body["contact"]["enrichedAt"].is_i64());

        let req = test::TestRequest::get()
            .uri("/api/contacts/not-a-uuid")
            .insert_header(auth())
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);

        let req = test::TestRequest::get()
            .uri(&format!("/api/contacts/{}", Uuid::new_v4()))
            .insert_header(auth())
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::NOT_FOUND);
    }

    #[actix_web::test]
    async fn test_enrich_failure_maps_to_gateway_status() {
        let (_dir, store) = test_store();
        let (state, _) = app_state(store, StubProvider::fail());
        let app = test::init_service(App::new().app_data(state).configure(configure)).await;

        let req = test::TestRequest::post()
            .uri("/api/contacts")
            .insert_header(auth())
            .set_json(json!({"originalContact": {"name": "Ada", "email": "ada@example.com"}}))
            .to_request();
        let body: Value = test::call_and_read_body_json(&app, req).await;
        let id = body["contact"]["id"].as_str().unwrap().to_string();

        let req = test::TestRequest::post()
            .uri(&format!("/api/contacts/{id}/enrich"))
            .insert_header(auth())
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::BAD_GATEWAY);
    }

    #[actix_web::test]
    async fn test_enrich_bulk_is_accepted() {
        let (_dir, store) = test_store();
        let (state, _) = app_state(store, StubProvider::succeed(60));
        let manager = state.enrichment.clone();
        let app = test::init_service(App::new().app_data(state).configure(configure)).await;

        let req = test::TestRequest::post()
            .uri("/api/contacts")
            .insert_header(auth())
            .set_json(json!({"originalContact": {"name": "Ada", "email": "ada@example.com"}}))
            .to_request();
        let body: Value = test::call_and_read_body_json(&app, req).await;
        let id = body["contact"]["id"].as_str().unwrap().to_string();

        let req = test::TestRequest::post()
            .uri("/api/contacts/enrich-bulk")
            .insert_header(auth())
            .set_json(json!({"contactIds": [id, "bogus"]}))
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::ACCEPTED);
        let body: Value = test::read_body_json(resp).await;
        assert_eq!(body["count"], 1);

        manager.wait_idle().await;

        let req = test::TestRequest::get()
            .uri("/api/contacts/stats")
            .insert_header(auth())
            .to_request();
        let body: Value = test::call_and_read_body_json(&app, req).await;
        assert_eq!(body["enrichedContacts"], 1);
        assert_eq!(body["averageConfidence"], 60);
    }

    #[actix_web::test]
    async fn test_malformed_json_uses_error_shape() {
        let (_dir, store) = test_store();
        let (state, _) = app_state(store, StubProvider::succeed(60));
        let app = test::init_service(App::new().app_data(state).configure(configure)).await;

        let req = test::TestRequest::post()
            .uri("/api/contacts/bulk")
            .insert_header(auth())
            .insert_header(("Content-Type", "application/json"))
            .set_payload("{not json")
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
        let body: Value = test::read_body_json(resp).await;
        assert_eq!(body["error"]["code"], "INVALID_INPUT");
    }

    #[actix_web::test]
    async fn test_health() {
        let (_dir, store) = test_store();
        let (state, _) = app_state(store, StubProvider::succeed(60));
        let app = test::init_service(App::new().app_data(state).configure(configure)).await;

        let req = test::TestRequest::get().uri("/health").to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::OK);
    }
}
