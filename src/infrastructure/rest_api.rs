// REST adapter for the simulation backend
use crate::application::simulation_api::{SimulationApi, SpawnCommand, SubmissionError};
use async_trait::async_trait;

#[derive(Debug, Clone)]
pub struct RestSimulationApi {
    base_url: String,
    client: reqwest::Client,
}

impl RestSimulationApi {
    pub fn new(base_url: String) -> Self {
        Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            client: reqwest::Client::new(),
        }
    }

    fn spawn_url(&self, instance: &str) -> String {
        format!(
            "{}/instance/{}/vessel",
            self.base_url,
            urlencoding::encode(instance)
        )
    }
}

#[async_trait]
impl SimulationApi for RestSimulationApi {
    async fn spawn_vessel(&self, instance: &str, command: &SpawnCommand) -> Result<(), SubmissionError> {
        let url = self.spawn_url(instance);
        tracing::debug!("POST {}", url);

        let response = self
            .client
            .post(&url)
            .json(command)
            .send()
            .await
            .map_err(|e| SubmissionError::Network(e.to_string()))?;

        if !response.status().is_success() {
            let status = response.status().as_u16();
            let body = response.text().await.unwrap_or_default();
            return Err(SubmissionError::Rejected { status, body });
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::application::simulation_api::GeoPointWire;
    use axum::{
        Json, Router,
        extract::{Path, State},
        http::StatusCode,
        routing::post,
    };
    use std::sync::{Arc, Mutex};

    type Received = Arc<Mutex<Vec<(String, serde_json::Value)>>>;

    async fn spawn_backend(status: StatusCode) -> (String, Received) {
        let received: Received = Arc::default();
        let router = Router::new()
            .route(
                "/instance/:instance/vessel",
                post(
                    move |State(received): State<Received>,
                          Path(instance): Path<String>,
                          Json(body): Json<serde_json::Value>| async move {
                        received.lock().unwrap().push((instance, body));
                        (status, "vessel name taken")
                    },
                ),
            )
            .with_state(received.clone());

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, router).await.unwrap();
        });
        (format!("http://{}/", addr), received)
    }

    fn command() -> SpawnCommand {
        SpawnCommand {
            cmd_type: 0,
            sdf_string: "<lotus_param></lotus_param>".to_string(),
            model_name: "wamv".to_string(),
            vessel_name: "v1".to_string(),
            geo_point: GeoPointWire {
                latitude: 1.24,
                longitude: 103.71,
                altitude: 0.0,
            },
            heading: 90.0,
        }
    }

    #[test]
    fn test_spawn_url_encodes_instance() {
        let api = RestSimulationApi::new("http://10.0.0.5:8000/".to_string());
        assert_eq!(
            api.spawn_url("sea trial/2"),
            "http://10.0.0.5:8000/instance/sea%20trial%2F2/vessel"
        );
    }

    #[tokio::test]
    async fn test_spawn_posts_command() {
        let (base, received) = spawn_backend(StatusCode::OK).await;
        let api = RestSimulationApi::new(base);

        api.spawn_vessel("lotusim", &command()).await.unwrap();

        let received = received.lock().unwrap();
        assert_eq!(received.len(), 1);
        assert_eq!(received[0].0, "lotusim");
        assert_eq!(received[0].1["cmd_type"], 0);
        assert_eq!(received[0].1["sdf_string"], "<lotus_param></lotus_param>");
        assert_eq!(received[0].1["geo_point"]["longitude"], 103.71);
        assert_eq!(received[0].1["heading"], 90.0);
    }

    #[tokio::test]
    async fn test_rejection_is_reported() {
        let (base, _) = spawn_backend(StatusCode::CONFLICT).await;
        let api = RestSimulationApi::new(base);

        match api.spawn_vessel("lotusim", &command()).await {
            Err(SubmissionError::Rejected { status, body }) => {
                assert_eq!(status, 409);
                assert_eq!(body, "vessel name taken");
            }
            other => panic!("expected rejection, got {:?}", other),
        }
    }
}
