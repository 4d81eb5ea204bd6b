//! バックエンドRESTクライアント
//!
//! 認証付きの呼び出しは全て `&Session` を受け取る。
//! 自動リトライはしない（再実行は利用者の操作）。

use crate::error::{Result, TracerError};
use crate::session::Session;
use reqwest::{RequestBuilder, Response, StatusCode};
use serde::de::DeserializeOwned;
use std::time::Duration;
use tracer_common::{
    ErrorBody, LinkRequest, LinkResponse, LogEntry, LogsResponse, MessageResponse,
    RentalRemoveRequest, RentalStatus, RentalsAddRequest, StatusResponse, WriteRequest,
};

/// 本文からメッセージが取れない時の文言
const GENERIC_FAILURE: &str = "Something went wrong, check logs for details.";

pub struct ApiClient {
    client: reqwest::Client,
    base_url: String,
}

impl ApiClient {
    pub fn new(base_url: &str, timeout_seconds: u64) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(timeout_seconds))
            .build()
            .map_err(|e| TracerError::Config(format!("HTTPクライアント作成失敗: {}", e)))?;

        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn url(&self, path: &str) -> String {
        format!("{}/{}", self.base_url, path.trim_start_matches('/'))
    }

    /// 端末をリンクしてセッションを得る（認証不要）
    pub async fn link(&self, key: &str) -> Result<Session> {
        let key = key.trim();
        if key.is_empty() {
            return Err(TracerError::Config("Key required".into()));
        }
        let request = self
            .client
            .post(self.url("link"))
            .json(&LinkRequest { key: key.to_string() });
        let resp: LinkResponse = self.send_json(request, "link").await?;
        Ok(Session::new(resp.token))
    }

    /// 貸出・返却ログを書き込む
    pub async fn write(&self, session: &Session, entry: &WriteRequest) -> Result<String> {
        let request = self.authed(self.client.post(self.url("write")), session).json(entry);
        let resp: MessageResponse = self.send_json(request, "write").await?;
        Ok(resp.message)
    }

    pub async fn add_rentals(&self, session: &Session, rentals: &[String]) -> Result<String> {
        let body = RentalsAddRequest { rentals: rentals.to_vec() };
        let request = self.authed(self.client.post(self.url("rentals/add")), session).json(&body);
        let resp: MessageResponse = self.send_json(request, "rentals/add").await?;
        Ok(resp.message)
    }

    pub async fn remove_rental(&self, session: &Session, rental: &str) -> Result<String> {
        let body = RentalRemoveRequest { rental: rental.to_string() };
        let request = self.authed(self.client.post(self.url("rentals/remove")), session).json(&body);
        let resp: MessageResponse = self.send_json(request, "rentals/remove").await?;
        Ok(resp.message)
    }

    pub async fn logs(&self, session: &Session) -> Result<Vec<LogEntry>> {
        let request = self.authed(self.client.get(self.url("logs")), session);
        let resp: LogsResponse = self.send_json(request, "logs").await?;
        Ok(resp.logs)
    }

    pub async fn status(&self, session: &Session) -> Result<Vec<RentalStatus>> {
        let request = self.authed(self.client.get(self.url("status")), session);
        let resp: StatusResponse = self.send_json(request, "status").await?;
        Ok(resp.status)
    }

    /// ログをCSVで取得
    pub async fn export_csv(&self, session: &Session) -> Result<String> {
        let request = self.authed(self.client.get(self.url("export")), session);
        let response = self.send(request, "export").await?;
        Ok(response.text().await?)
    }

    pub async fn clear_logs(&self, session: &Session) -> Result<String> {
        let request = self.authed(self.client.get(self.url("clear")), session);
        let resp: MessageResponse = self.send_json(request, "clear").await?;
        Ok(resp.message)
    }

    fn authed(&self, request: RequestBuilder, session: &Session) -> RequestBuilder {
        request.header(reqwest::header::AUTHORIZATION, session.bearer())
    }

    async fn send_json<T: DeserializeOwned>(&self, request: RequestBuilder, endpoint: &str) -> Result<T> {
        let response = self.send(request, endpoint).await?;
        let text = response.text().await?;
        serde_json::from_str(&text).map_err(|e| {
            tracing::error!(endpoint, error = %e, "unexpected response body");
            TracerError::JsonParse(e)
        })
    }

    async fn send(&self, request: RequestBuilder, endpoint: &str) -> Result<Response> {
        let response = request.send().await.map_err(|e| {
            tracing::error!(endpoint, error = %e, "request failed");
            TracerError::from(e)
        })?;

        let status = response.status();
        if status.is_success() {
            tracing::debug!(endpoint, status = status.as_u16(), "ok");
            return Ok(response);
        }

        let body = response.text().await.unwrap_or_default();
        let error = error_from_response(status, &body);
        tracing::error!(endpoint, status = status.as_u16(), body = %body, "backend error");
        Err(error)
    }
}

/// 失敗レスポンスをエラーに変換する
pub fn error_from_response(status: StatusCode, body: &str) -> TracerError {
    if status == StatusCode::UNAUTHORIZED {
        return TracerError::Unauthorized;
    }

    let message = serde_json::from_str::<ErrorBody>(body)
        .ok()
        .and_then(|b| b.best_message().map(str::to_string))
        .unwrap_or_else(|| GENERIC_FAILURE.to_string());

    TracerError::Api {
        status: status.as_u16(),
        message,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_url_join() {
        let client = ApiClient::new("http://localhost:9998/api/", 5).unwrap();
        assert_eq!(client.url("logs"), "http://localhost:9998/api/logs");
        assert_eq!(client.url("/rentals/add"), "http://localhost:9998/api/rentals/add");
    }

    #[test]
    fn test_error_from_json_body() {
        let err = error_from_response(StatusCode::NOT_FOUND, r#"{"error":"rental does not exist"}"#);
        match err {
            TracerError::Api { status, message } => {
                assert_eq!(status, 404);
                assert_eq!(message, "rental does not exist");
            }
            other => panic!("unexpected: {:?}", other),
        }
    }

    #[test]
    fn test_error_fallback_message() {
        let err = error_from_response(StatusCode::INTERNAL_SERVER_ERROR, "<html>oops</html>");
        assert_eq!(err.to_string(), format!("{} (HTTP 500)", GENERIC_FAILURE));
    }

    #[test]
    fn test_unauthorized() {
        let err = error_from_response(StatusCode::UNAUTHORIZED, r#"{"error":"Invalid token"}"#);
        assert!(matches!(err, TracerError::Unauthorized));
        assert!(err.needs_relink());
    }
}
