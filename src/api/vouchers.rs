use super::ApiClient;
use crate::error::ApiError;
use crate::http::{FormPart, HttpRequest};
use crate::types::{VoucherPage, VoucherStatus};
use chrono::NaiveDate;
use serde_json::json;

#[derive(Debug, Clone)]
pub struct NewVoucher {
    pub group_id: i64,
    pub name: String,
    pub expiration: NaiveDate,
    pub image: Vec<u8>,
    pub image_file_name: String,
    pub image_content_type: String,
}

impl NewVoucher {
    fn into_parts(self) -> Result<Vec<FormPart>, serde_json::Error> {
        let request = serde_json::to_vec(&json!({
            "groupId": self.group_id,
            "voucherName": self.name,
            "expiration": self.expiration.format("%Y-%m-%d").to_string(),
        }))?;
        Ok(vec![
            FormPart {
                name: "image".to_string(),
                bytes: self.image,
                file_name: Some(self.image_file_name),
                content_type: Some(self.image_content_type),
            },
            FormPart {
                name: "request".to_string(),
                bytes: request,
                file_name: None,
                content_type: Some("application/json".to_string()),
            },
        ])
    }
}

impl ApiClient {
    pub async fn voucher_page(
        &self,
        group_id: i64,
        page_size: u32,
        cursor_id: Option<i64>,
    ) -> Result<VoucherPage, ApiError> {
        let mut path = format!("/vouchers/{group_id}?pageSize={page_size}");
        if let Some(cursor) = cursor_id {
            path.push_str(&format!("&cursorId={cursor}"));
        }
        self.send_json(HttpRequest::get(self.url(&path))).await
    }

    pub async fn create_voucher(&self, voucher: NewVoucher) -> Result<(), ApiError> {
        let request = HttpRequest::post(self.url("/vouchers")).multipart(voucher.into_parts()?);
        self.send(request).await?;
        Ok(())
    }

    pub async fn set_voucher_status(
        &self,
        group_id: i64,
        voucher_id: i64,
        status: VoucherStatus,
    ) -> Result<(), ApiError> {
        let request =
            HttpRequest::patch(self.url(&format!("/vouchers/group/{group_id}/voucher/{voucher_id}")))
                .json(&json!({ "status": status }))?;
        self.send(request).await?;
        Ok(())
    }

    pub async fn mark_used(&self, group_id: i64, voucher_id: i64) -> Result<(), ApiError> {
        self.set_voucher_status(group_id, voucher_id, VoucherStatus::Used)
            .await
    }

    pub async fn mark_unused(&self, group_id: i64, voucher_id: i64) -> Result<(), ApiError> {
        self.set_voucher_status(group_id, voucher_id, VoucherStatus::Available)
            .await
    }

    pub async fn delete_voucher(&self, voucher_id: i64) -> Result<(), ApiError> {
        self.send(HttpRequest::delete(self.url(&format!("/vouchers/{voucher_id}"))))
            .await?;
        Ok(())
    }

    pub async fn toggle_wishlist(&self, group_id: i64, voucher_id: i64) -> Result<(), ApiError> {
        let path = format!("/wishList/group/{group_id}/voucher/{voucher_id}");
        self.send(HttpRequest::patch(self.url(&path))).await?;
        Ok(())
    }
}
