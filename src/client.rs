use reqwest::Response;
use serde::de::DeserializeOwned;

use crate::api::{
    ErrorResponse, RegisterWorkerRequest, RegisterWorkerResponse, SubmitJobRequest,
    SubmitJobResponse,
};
use crate::error::{Result, SchedulerError};
use crate::scheduler::Job;
use crate::worker::Worker;

/// Thin HTTP client for the scheduler API, used by the CLI.
#[derive(Debug, Clone)]
pub struct ApiClient {
    base_url: String,
    http: reqwest::Client,
}

impl ApiClient {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into().trim_end_matches('/').to_string(),
            http: reqwest::Client::new(),
        }
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    pub async fn submit_job(
        &self,
        name: String,
        command: String,
        args: Vec<String>,
    ) -> Result<SubmitJobResponse> {
        let response = self
            .http
            .post(self.url("/jobs"))
            .json(&SubmitJobRequest {
                name,
                command,
                args,
            })
            .send()
            .await?;
        decode(response, SchedulerError::InvalidRequest).await
    }

    pub async fn get_job(&self, id: &str) -> Result<Job> {
        let response = self.http.get(self.url(&format!("/jobs/{id}"))).send().await?;
        decode(response, |_| SchedulerError::JobNotFound(id.to_string())).await
    }

    pub async fn list_jobs(&self) -> Result<Vec<Job>> {
        let response = self.http.get(self.url("/jobs")).send().await?;
        decode(response, SchedulerError::Internal).await
    }

    pub async fn register_worker(
        &self,
        name: String,
        cpu_cores: u32,
        memory_mb: u64,
    ) -> Result<RegisterWorkerResponse> {
        let response = self
            .http
            .post(self.url("/workers"))
            .json(&RegisterWorkerRequest {
                name,
                cpu_cores,
                memory_mb,
            })
            .send()
            .await?;
        decode(response, SchedulerError::InvalidRequest).await
    }

    pub async fn list_workers(&self) -> Result<Vec<Worker>> {
        let response = self.http.get(self.url("/workers")).send().await?;
        decode(response, SchedulerError::Internal).await
    }

    pub async fn heartbeat(&self, worker_id: &str) -> Result<Worker> {
        let response = self
            .http
            .post(self.url(&format!("/workers/{worker_id}/heartbeat")))
            .send()
            .await?;
        decode(response, |_| SchedulerError::WorkerNotFound(worker_id.to_string())).await
    }
}

/// Decode a success body, or turn an error status into a [`SchedulerError`].
/// `on_client_error` builds the error for 4xx responses from the server's message.
async fn decode<T, F>(response: Response, on_client_error: F) -> Result<T>
where
    T: DeserializeOwned,
    F: FnOnce(String) -> SchedulerError,
{
    let status = response.status();
    if status.is_success() {
        return Ok(response.json::<T>().await?);
    }

    let message = match response.json::<ErrorResponse>().await {
        Ok(body) => body.error,
        Err(_) => status.to_string(),
    };

    if status.is_client_error() {
        Err(on_client_error(message))
    } else {
        Err(SchedulerError::Internal(message))
    }
}
