/// API Module - HTTP front end
///
/// - `POST /api/v1/decode`  `{"hex": "..."}` -> transaction report
/// - `POST /api/v1/script`  `{"hex": "..."}` -> disassembly and classification
/// - `GET  /health`
/// - `GET  /metrics`        Prometheus text format

use std::sync::Arc;

use axum::{
    extract::State,
    http::{header, StatusCode},
    response::IntoResponse,
    routing::{get, post},
    Json, Router,
};
use serde::{Deserialize, Serialize};
use tokio::net::TcpListener;
use tower_http::cors::CorsLayer;
use tracing::{info, warn};

use crate::classify::{classify_script_pubkey, Classification};
use crate::codec::{AddressCodec, BitcoinAddressCodec, Network};
use crate::hasher::{Sha256dHasher, TxHasher};
use crate::metrics;
use crate::report::{decode_report, TransactionReport};
use crate::script::{disassemble, render_tokens};
use crate::telemetry::truncate_hex;

/// Shared handler state: the injected capabilities and the default network
#[derive(Clone)]
pub struct AppState {
    pub network: Network,
    pub codec: Arc<dyn AddressCodec + Send + Sync>,
    pub hasher: Arc<dyn TxHasher + Send + Sync>,
}

impl AppState {
    pub fn new(network: Network) -> Self {
        Self {
            network,
            codec: Arc::new(BitcoinAddressCodec),
            hasher: Arc::new(Sha256dHasher),
        }
    }
}

#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct ApiError {
    pub error: ErrorDetail,
}

#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct ErrorDetail {
    pub message: String,
}

impl ApiError {
    pub fn new(message: impl Into<String>) -> Self {
        ApiError {
            error: ErrorDetail {
                message: message.into(),
            },
        }
    }
}

type ApiResult<T> = Result<Json<T>, (StatusCode, Json<ApiError>)>;

fn bad_request(message: impl Into<String>) -> (StatusCode, Json<ApiError>) {
    (StatusCode::BAD_REQUEST, Json(ApiError::new(message)))
}

#[derive(Deserialize, Debug)]
pub struct HexRequest {
    pub hex: String,
    /// Overrides the server's network for this request
    #[serde(default)]
    pub network: Option<Network>,
}

#[derive(Serialize, Debug)]
pub struct ScriptResponse {
    pub hex: String,
    pub asm: String,
    pub tokens: Vec<String>,
    pub classification: Classification,
}

#[derive(Serialize, Debug)]
pub struct HealthResponse {
    pub status: &'static str,
    pub network: Network,
    pub version: &'static str,
}

/// Build the router over the given state
pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/api/v1/decode", post(decode_tx))
        .route("/api/v1/script", post(decode_script))
        .route("/health", get(health))
        .route("/metrics", get(metrics_text))
        .layer(CorsLayer::permissive())
        .with_state(state)
}

/// Bind and serve until the process is stopped
pub async fn serve(bind: &str, state: AppState) -> Result<(), Box<dyn std::error::Error>> {
    metrics::init_metrics()?;
    let listener = TcpListener::bind(bind).await?;
    info!(bind = %bind, network = %state.network, "HTTP server listening");
    axum::serve(listener, router(state)).await?;
    Ok(())
}

/// POST /api/v1/decode
pub async fn decode_tx(
    State(state): State<AppState>,
    Json(req): Json<HexRequest>,
) -> ApiResult<TransactionReport> {
    let network = req.network.unwrap_or(state.network);
    match decode_report(&req.hex, state.codec.as_ref(), state.hasher.as_ref(), network) {
        Ok(report) => {
            info!(txid = %report.txid, outputs = report.outputs.len(), "Decoded transaction");
            Ok(Json(report))
        }
        Err(e) => {
            warn!(hex = %truncate_hex(&req.hex, 64), error = %e, "Decode failed");
            Err(bad_request(e.to_string()))
        }
    }
}

/// POST /api/v1/script
pub async fn decode_script(
    State(state): State<AppState>,
    Json(req): Json<HexRequest>,
) -> ApiResult<ScriptResponse> {
    let network = req.network.unwrap_or(state.network);
    let script = hex::decode(req.hex.trim())
        .map_err(|e| bad_request(format!("invalid script hex: {}", e)))?;

    let tokens = disassemble(&script);
    let classification = classify_script_pubkey(&script, state.codec.as_ref(), network);

    Ok(Json(ScriptResponse {
        hex: hex::encode(&script),
        asm: render_tokens(&tokens),
        tokens: tokens.iter().map(|t| t.to_string()).collect(),
        classification,
    }))
}

/// GET /health
pub async fn health(State(state): State<AppState>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok",
        network: state.network,
        version: env!("CARGO_PKG_VERSION"),
    })
}

/// GET /metrics
pub async fn metrics_text() -> impl IntoResponse {
    (
        [(header::CONTENT_TYPE, "text/plain; version=0.0.4")],
        metrics::gather_metrics(),
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::classify::ScriptType;
    use crate::fixtures::{SEGWIT_TX, SEGWIT_TXID};

    fn request(hex: &str) -> Json<HexRequest> {
        Json(HexRequest { hex: hex.to_string(), network: None })
    }

    #[tokio::test]
    async fn test_decode_ok() {
        let state = AppState::new(Network::Mainnet);
        let Json(report) = decode_tx(State(state), request(SEGWIT_TX)).await.unwrap();
        assert_eq!(report.txid, SEGWIT_TXID);
        assert_eq!(report.vsize, 144);
    }

    #[tokio::test]
    async fn test_decode_bad_hex_is_400() {
        let state = AppState::new(Network::Mainnet);
        let (status, Json(body)) = decode_tx(State(state), request("xyz")).await.unwrap_err();
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert!(body.error.message.starts_with("invalid transaction hex"));
    }

    #[tokio::test]
    async fn test_decode_truncated_is_400() {
        let state = AppState::new(Network::Mainnet);
        let (status, Json(body)) = decode_tx(State(state), request("01000000")).await.unwrap_err();
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert!(body.error.message.contains("input count"));
    }

    #[tokio::test]
    async fn test_decode_network_override() {
        let state = AppState::new(Network::Mainnet);
        let req = Json(HexRequest { hex: SEGWIT_TX.to_string(), network: Some(Network::Testnet) });
        let Json(report) = decode_tx(State(state), req).await.unwrap();
        let address = report.outputs[0].classification.address.clone().unwrap();
        assert!(address.starts_with("tb1q"));
    }

    #[tokio::test]
    async fn test_script_endpoint() {
        let state = AppState::new(Network::Mainnet);
        let Json(resp) = decode_script(State(state), request("6a0474657374")).await.unwrap();
        assert_eq!(resp.asm, "OP_RETURN <74657374>");
        assert_eq!(resp.tokens, vec!["OP_RETURN", "<74657374>"]);
        assert_eq!(resp.classification.script_type, ScriptType::OpReturn);
    }

    #[tokio::test]
    async fn test_script_endpoint_bad_hex() {
        let state = AppState::new(Network::Mainnet);
        let (status, _) = decode_script(State(state), request("6a0")).await.unwrap_err();
        assert_eq!(status, StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_health() {
        let Json(resp) = health(State(AppState::new(Network::Regtest))).await;
        assert_eq!(resp.status, "ok");
        assert_eq!(resp.network, Network::Regtest);
    }

    #[test]
    fn test_error_body_shape() {
        let json = serde_json::to_value(ApiError::new("boom")).unwrap();
        assert_eq!(json, serde_json::json!({"error": {"message": "boom"}}));
    }
}
