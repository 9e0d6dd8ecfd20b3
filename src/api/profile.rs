use super::ApiClient;
use crate::error::ApiError;
use crate::http::HttpRequest;
use crate::types::UserProfile;
use serde_json::json;

impl ApiClient {
    pub async fn profile(&self) -> Result<UserProfile, ApiError> {
        self.send_json(HttpRequest::get(self.url("/profile"))).await
    }

    pub async fn update_nickname(&self, nickname: &str) -> Result<(), ApiError> {
        let request =
            HttpRequest::patch(self.url("/profile")).json(&json!({ "newNickname": nickname }))?;
        self.send(request).await?;
        Ok(())
    }
}
