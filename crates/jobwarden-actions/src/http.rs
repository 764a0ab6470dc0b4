//! The `Get` and `Post` actions: a single HTTP request per attempt, with
//! expanded URL and headers, success defined as "transport ok and
//! status < 400".

use crate::context::ExecContext;
use crate::error::ActionError;
use jobwarden_model::Task;

fn expand_headers(task: &Task, ctx: &ExecContext) -> reqwest::header::HeaderMap {
    let mut headers = reqwest::header::HeaderMap::new();
    for (key, value) in &task.headers {
        let expanded = jobwarden_template::evaluate_or_original(value, &ctx.vars);
        if let (Ok(name), Ok(value)) = (
            reqwest::header::HeaderName::from_bytes(key.as_bytes()),
            reqwest::header::HeaderValue::from_str(&expanded),
        ) {
            headers.insert(name, value);
        }
    }
    headers
}

async fn finish(response: reqwest::Response) -> Result<(), ActionError> {
    let status = response.status();
    #[cfg(feature = "tracing")]
    tracing::info!(status = status.as_u16(), "received http response");

    if tracing_is_debug() {
        let body = response.text().await.unwrap_or_default();
        #[cfg(feature = "tracing")]
        tracing::debug!(%body, "fetched response body");
        let _ = body;
    }

    if status.as_u16() >= 400 {
        return Err(ActionError::UnexpectedStatus(status.as_u16()));
    }
    Ok(())
}

#[cfg(feature = "tracing")]
fn tracing_is_debug() -> bool {
    tracing::enabled!(tracing::Level::DEBUG)
}

#[cfg(not(feature = "tracing"))]
fn tracing_is_debug() -> bool {
    false
}

pub async fn get(url: &str, task: &Task, ctx: &ExecContext) -> Result<(), ActionError> {
    let url = jobwarden_template::evaluate_or_original(url, &ctx.vars);
    let headers = expand_headers(task, ctx);

    tokio::select! {
        biased;
        _ = ctx.cancellation.cancelled() => Err(ActionError::Cancelled),
        result = run_get(&url, headers) => result,
    }
}

async fn run_get(url: &str, headers: reqwest::header::HeaderMap) -> Result<(), ActionError> {
    let response = reqwest::Client::new().get(url).headers(headers).send().await?;
    finish(response).await
}

pub async fn post(url: &str, task: &Task, ctx: &ExecContext) -> Result<(), ActionError> {
    let url = jobwarden_template::evaluate_or_original(url, &ctx.vars);
    let headers = expand_headers(task, ctx);
    let body = task.data.clone().unwrap_or(serde_json::Value::Null);

    tokio::select! {
        biased;
        _ = ctx.cancellation.cancelled() => Err(ActionError::Cancelled),
        result = run_post(&url, headers, body) => result,
    }
}

async fn run_post(url: &str, headers: reqwest::header::HeaderMap, body: serde_json::Value) -> Result<(), ActionError> {
    let response = reqwest::Client::new().post(url).headers(headers).json(&body).send().await?;
    finish(response).await
}
