pub mod contacts;

use actix_web::{web, HttpRequest, HttpResponse};
use std::sync::Arc;
use uuid::Uuid;

use crate::contacts::ContactImporter;
use crate::database::ContactStore;
use crate::error::{ContactError, ContactResult};
use crate::helpers::identity::IdentityProvider;
use crate::jobs::EnrichmentManager;

/// Request bodies larger than this are rejected before parsing
const MAX_BODY_BYTES: usize = 32 * 1024 * 1024;

/// Shared services handed to every handler
pub struct AppState {
    pub store: Arc<dyn ContactStore>,
    pub importer: ContactImporter,
    pub enrichment: Arc<EnrichmentManager>,
    pub identity: Arc<dyn IdentityProvider>,
}

impl AppState {
    /// Resolve the caller from `Authorization: Bearer <token>`
    pub async fn authenticate(&self, req: &HttpRequest) -> ContactResult<Uuid> {
        let token = bearer_token(req).ok_or(ContactError::Unauthenticated)?;
        self.identity.authenticate(token).await
    }
}

fn bearer_token(req: &HttpRequest) -> Option<&str> {
    let header = req.headers().get("Authorization")?.to_str().ok()?;
    let (scheme, token) = header.split_once(' ')?;
    if scheme.eq_ignore_ascii_case("bearer") {
        Some(token.trim())
    } else {
        None
    }
}

pub async fn health(state: web::Data<AppState>) -> HttpResponse {
    match state.store.ping().await {
        Ok(()) => HttpResponse::Ok().json(serde_json::json!({
            "status": "healthy",
            "database": "connected"
        })),
        Err(e) => {
            tracing::warn!("Health check failed: {}", e);
            HttpResponse::ServiceUnavailable().json(serde_json::json!({
                "status": "unhealthy",
                "database": "disconnected"
            }))
        }
    }
}

/// Route table shared by the server binary and the handler tests
pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.app_data(
        web::JsonConfig::default()
            .limit(MAX_BODY_BYTES)
            .error_handler(|err, _| ContactError::InvalidInput(err.to_string()).into()),
    )
    .app_data(
        web::QueryConfig::default()
            .error_handler(|err, _| ContactError::InvalidInput(err.to_string()).into()),
    )
    .app_data(web::PayloadConfig::new(MAX_BODY_BYTES))
    .route("/health", web::get().to(health))
    .route("/api/contacts", web::post().to(contacts::create_contact))
    .route("/api/contacts", web::get().to(contacts::list_contacts))
    .route("/api/contacts/bulk", web::post().to(contacts::bulk_create_contacts))
    .route("/api/contacts/import", web::post().to(contacts::import_contacts))
    .route("/api/contacts/import/csv", web::post().to(contacts::import_csv))
    .route("/api/contacts/stats", web::get().to(contacts::contact_stats))
    .route("/api/contacts/enrich-bulk", web::post().to(contacts::enrich_bulk))
    .route("/api/contacts/{id}", web::get().to(contacts::get_contact))
    .route("/api/contacts/{id}/enrich", web::post().to(contacts::enrich_contact));
}
