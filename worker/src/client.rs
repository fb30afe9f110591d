//! Llamadas tipadas al canal de control del coordinador.
//!
//! Las fallas de transporte nunca salen como error: los pedidos de tarea
//! devuelven `None` y los reportes `false`, y el que llama decide qué hacer.

use std::time::Duration;

use common::{
    routes, Ack, EmptyRequest, FinishedMapRequest, FinishedReduceRequest, MapTaskResponse,
    ReduceTaskResponse,
};
use reqwest::Client;
use serde::{de::DeserializeOwned, Serialize};
use tracing::warn;

#[derive(Clone)]
pub struct CoordinatorClient {
    http: Client,
    base_url: String,
}

impl CoordinatorClient {
    pub fn new(base_url: impl Into<String>, timeout: Duration) -> reqwest::Result<Self> {
        let http = Client::builder().timeout(timeout).build()?;
        Ok(Self {
            http,
            base_url: base_url.into().trim_end_matches('/').to_string(),
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub async fn get_map_task(&self) -> Option<MapTaskResponse> {
        self.call(routes::MAP_NEXT, &EmptyRequest::default()).await
    }

    pub async fn get_reduce_task(&self) -> Option<ReduceTaskResponse> {
        self.call(routes::REDUCE_NEXT, &EmptyRequest::default()).await
    }

    pub async fn finished_map_task(&self, req: &FinishedMapRequest) -> bool {
        self.report(routes::MAP_FINISHED, req).await
    }

    pub async fn finished_reduce_task(&self, req: &FinishedReduceRequest) -> bool {
        self.report(routes::REDUCE_FINISHED, req).await
    }

    async fn report<B: Serialize>(&self, route: &str, body: &B) -> bool {
        match self.call::<B, Ack>(route, body).await {
            Some(ack) => ack.ok,
            None => false,
        }
    }

    async fn call<B, R>(&self, route: &str, body: &B) -> Option<R>
    where
        B: Serialize,
        R: DeserializeOwned,
    {
        let url = format!("{}{}", self.base_url, route);

        let resp = match self.http.post(&url).json(body).send().await {
            Ok(resp) => resp,
            Err(e) => {
                warn!("falló la llamada a {}: {}", url, e);
                return None;
            }
        };

        if !resp.status().is_success() {
            warn!("{} respondió {}", url, resp.status());
            return None;
        }

        match resp.json::<R>().await {
            Ok(r) => Some(r),
            Err(e) => {
                warn!("{} devolvió un body ilegible: {}", url, e);
                None
            }
        }
    }
}
