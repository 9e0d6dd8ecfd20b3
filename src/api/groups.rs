use super::ApiClient;
use crate::error::ApiError;
use crate::http::HttpRequest;
use crate::types::{GroupJoinRequests, GroupSummary, JoinDecision};
use serde_json::json;

impl ApiClient {
    pub async fn groups(&self) -> Result<Vec<GroupSummary>, ApiError> {
        self.send_json(HttpRequest::get(self.url("/group"))).await
    }

    pub async fn join_group(&self, invite_code: &str) -> Result<(), ApiError> {
        let request = HttpRequest::post(self.url("/group/join"))
            .json(&json!({ "inviteCode": invite_code.trim() }))?;
        self.send(request).await?;
        Ok(())
    }

    pub async fn rename_group(&self, group_id: i64, alias: &str) -> Result<(), ApiError> {
        let request = HttpRequest::patch(self.url(&format!("/group/{group_id}")))
            .json(&json!({ "newGroupTitleAlias": alias }))?;
        self.send(request).await?;
        Ok(())
    }

    /// Pending join requests for the groups the caller leads.
    pub async fn join_requests(&self) -> Result<Vec<GroupJoinRequests>, ApiError> {
        self.send_json(HttpRequest::get(self.url("/group/join"))).await
    }

    pub async fn decide_join_request(
        &self,
        group_id: i64,
        user_id: i64,
        decision: JoinDecision,
    ) -> Result<(), ApiError> {
        let path = format!(
            "/group/{group_id}/user/{user_id}?status={}",
            urlencoding::encode(decision.as_str())
        );
        self.send(HttpRequest::patch(self.url(&path))).await?;
        Ok(())
    }
}
