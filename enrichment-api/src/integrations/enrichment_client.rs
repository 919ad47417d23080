use async_trait::async_trait;
use shared_types::{EnrichmentRequest, EnrichmentResponse, OriginalContact};
use std::time::Duration;
use thiserror::Error;

use crate::config::EnrichmentConfig;

#[derive(Debug, Error)]
pub enum ProviderError {
    #[error("timed out after {}ms", .0.as_millis())]
    Timeout(Duration),

    #[error("provider returned HTTP {status}: {body}")]
    Status { status: u16, body: String },

    #[error("request failed: {0}")]
    Transport(String),

    #[error("could not decode provider response: {0}")]
    Decode(String),
}

/// External service that augments a contact with additional profile data
#[async_trait]
pub trait EnrichmentProvider: Send + Sync {
    async fn enrich(&self, contact: &OriginalContact) -> Result<EnrichmentResponse, ProviderError>;
}

/// Enrichment over HTTP: POSTs `{"contactInfo": ...}` and decodes the JSON reply
pub struct HttpEnrichmentProvider {
    client: reqwest::Client,
    api_url: String,
    api_key: Option<String>,
    deadline: Duration,
}

impl HttpEnrichmentProvider {
    pub fn new(config: &EnrichmentConfig, deadline: Duration) -> Result<Self, ProviderError> {
        let client = reqwest::Client::builder()
            .timeout(deadline)
            .build()
            .map_err(|e| ProviderError::Transport(e.to_string()))?;

        Ok(Self {
            client,
            api_url: config.api_url.clone(),
            api_key: config.api_key.clone().filter(|key| !key.is_empty()),
            deadline,
        })
    }

    fn map_reqwest_error(&self, e: reqwest::Error) -> ProviderError {
        if e.is_timeout() {
            ProviderError::Timeout(self.deadline)
        } else if e.is_decode() {
            ProviderError::Decode(e.to_string())
        } else {
            ProviderError::Transport(e.to_string())
        }
    }
}

#[async_trait]
impl EnrichmentProvider for HttpEnrichmentProvider {
    async fn enrich(&self, contact: &OriginalContact) -> Result<EnrichmentResponse, ProviderError> {
        let mut request = self
            .client
            .post(&self.api_url)
            .json(&EnrichmentRequest {
                contact_info: contact,
            });

        if let Some(api_key) = &self.api_key {
            request = request.bearer_auth(api_key);
        }

        let response = request
            .send()
            .await
            .map_err(|e| self.map_reqwest_error(e))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(ProviderError::Status {
                status: status.as_u16(),
                body,
            });
        }

        let bytes = response
            .bytes()
            .await
            .map_err(|e| self.map_reqwest_error(e))?;
        let enrichment: EnrichmentResponse =
            serde_json::from_slice(&bytes).map_err(|e| ProviderError::Decode(e.to_string()))?;

        Ok(enrichment.clamped())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use actix_web::{web, App, HttpRequest, HttpResponse, HttpServer};
    use serde_json::json;

    async fn enrich_handler(req: HttpRequest, body: web::Json<serde_json::Value>) -> HttpResponse {
        let authorized = req
            .headers()
            .get("Authorization")
            .and_then(|v| v.to_str().ok())
            == Some("Bearer secret");
        if !authorized {
            return HttpResponse::Unauthorized().body("missing key");
        }

        let name = body["contactInfo"]["name"].as_str().unwrap_or_default().to_string();
        match name.as_str() {
            "slow" => {
                tokio::time::sleep(Duration::from_millis(500)).await;
                HttpResponse::Ok().json(json!({}))
            }
            "garbage" => HttpResponse::Ok().body("not json"),
            _ => HttpResponse::Ok().json(json!({
                "enrichedContact": {"name": name.clone(), "email": body["contactInfo"]["email"], "title": "Engineer"},
                "confidenceScores": {"name": 99, "email": 99, "title": 250},
                "sources": {"title": "directory"},
                "enrichmentSummary": {"fieldsEnriched": ["title"], "fieldsNotFound": [], "overallConfidence": 88}
            })),
        }
    }

    fn start_provider() -> (actix_web::dev::ServerHandle, String) {
        let server = HttpServer::new(|| App::new().route("/enrich", web::post().to(enrich_handler)))
            .workers(1)
            .shutdown_timeout(1)
            .bind(("127.0.0.1", 0))
            .unwrap();
        let addr = server.addrs()[0];
        let server = server.run();
        let handle = server.handle();
        actix_web::rt::spawn(server);
        (handle, format!("http://{addr}/enrich"))
    }

    fn provider(url: String, api_key: Option<&str>, deadline: Duration) -> HttpEnrichmentProvider {
        let config = EnrichmentConfig {
            api_url: url,
            api_key: api_key.map(str::to_string),
            max_concurrent: None,
        };
        HttpEnrichmentProvider::new(&config, deadline).unwrap()
    }

    fn contact(name: &str) -> OriginalContact {
        OriginalContact {
            name: name.to_string(),
            email: "dev@example.com".to_string(),
            ..Default::default()
        }
    }

    #[actix_web::test]
    async fn test_enrich_success_is_clamped() {
        let (handle, url) = start_provider();
        let provider = provider(url, Some("secret"), Duration::from_secs(5));

        let response = provider.enrich(&contact("Dev")).await.unwrap();
        assert_eq!(response.enriched_contact.title.as_deref(), Some("Engineer"));
        assert_eq!(response.confidence_scores.title, Some(100));
        assert_eq!(response.enrichment_summary.overall_confidence, 88);

        handle.stop(true).await;
    }

    #[actix_web::test]
    async fn test_enrich_non_success_status() {
        let (handle, url) = start_provider();
        let provider = provider(url, None, Duration::from_secs(5));

        let err = provider.enrich(&contact("Dev")).await.unwrap_err();
        assert!(matches!(err, ProviderError::Status { status: 401, .. }));

        handle.stop(true).await;
    }

    #[actix_web::test]
    async fn test_enrich_timeout_and_decode_errors() {
        let (handle, url) = start_provider();
        let provider = provider(url, Some("secret"), Duration::from_millis(100));

        let err = provider.enrich(&contact("slow")).await.unwrap_err();
        assert!(matches!(err, ProviderError::Timeout(_)));

        let err = provider.enrich(&contact("garbage")).await.unwrap_err();
        assert!(matches!(err, ProviderError::Decode(_)));

        handle.stop(true).await;
    }
}
