use crate::api::ApiClient;
use crate::error::ApiError;
use crate::types::{Voucher, VoucherPage, VoucherStatus};
use chrono::{Datelike, Months, NaiveDate};
use reqwest::Url;
use std::collections::HashSet;

pub const DEFAULT_PAGE_SIZE: u32 = 10;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SortOrder {
    #[default]
    Ascending,
    Descending,
}

/// Client-side narrowing of an already loaded voucher list.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VoucherFilter {
    pub statuses: HashSet<VoucherStatus>,
    pub order: SortOrder,
}

impl Default for VoucherFilter {
    fn default() -> Self {
        Self {
            statuses: HashSet::from([VoucherStatus::Available, VoucherStatus::Used]),
            order: SortOrder::Ascending,
        }
    }
}

impl VoucherFilter {
    pub fn toggle(&mut self, status: VoucherStatus) {
        if !self.statuses.remove(&status) {
            self.statuses.insert(status);
        }
    }

    /// Keeps the selected statuses, ordered by expiration date. Ties and
    /// unparsable dates keep their load order.
    pub fn apply(&self, vouchers: &[Voucher]) -> Vec<Voucher> {
        let mut out: Vec<Voucher> = vouchers
            .iter()
            .filter(|v| self.statuses.contains(&v.status))
            .cloned()
            .collect();
        out.sort_by(|a, b| {
            let ord = expiration_date(a).cmp(&expiration_date(b));
            match self.order {
                SortOrder::Ascending => ord,
                SortOrder::Descending => ord.reverse(),
            }
        });
        out
    }
}

fn expiration_date(voucher: &Voucher) -> Option<NaiveDate> {
    let raw = voucher.expiration.get(..10).unwrap_or(&voucher.expiration);
    NaiveDate::parse_from_str(raw, "%Y-%m-%d").ok()
}

/// Server-side listing window, mirrored from the backend defaults.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FilterCondition {
    pub statuses: Vec<VoucherStatus>,
    pub start_day: NaiveDate,
    pub end_day: NaiveDate,
}

impl FilterCondition {
    /// Today through the last day of next month.
    pub fn default_for(today: NaiveDate) -> Self {
        let first_of_month = today.with_day(1).unwrap_or(today);
        let end_day = first_of_month
            .checked_add_months(Months::new(2))
            .and_then(|d| d.pred_opt())
            .unwrap_or(today);
        Self {
            statuses: vec![VoucherStatus::Available, VoucherStatus::Used],
            start_day: today,
            end_day,
        }
    }

    pub fn start_day_string(&self) -> String {
        self.start_day.format("%Y-%m-%d").to_string()
    }

    pub fn end_day_string(&self) -> String {
        self.end_day.format("%Y-%m-%d").to_string()
    }
}

pub fn is_valid_image_url(url: Option<&str>) -> bool {
    match url.map(str::trim) {
        None | Some("") | Some("image") => false,
        Some(url) => Url::parse(url).is_ok(),
    }
}

/// Cursor state for one group's voucher listing.
#[derive(Debug, Clone)]
pub struct VoucherPager {
    group_id: i64,
    page_size: u32,
    cursor: Option<i64>,
    has_more: bool,
    group_title: Option<String>,
    invite_code: Option<String>,
    vouchers: Vec<Voucher>,
}

impl VoucherPager {
    pub fn new(group_id: i64) -> Self {
        Self::with_page_size(group_id, DEFAULT_PAGE_SIZE)
    }

    pub fn with_page_size(group_id: i64, page_size: u32) -> Self {
        Self {
            group_id,
            page_size: page_size.max(1),
            cursor: None,
            has_more: true,
            group_title: None,
            invite_code: None,
            vouchers: Vec::new(),
        }
    }

    pub fn has_more(&self) -> bool {
        self.has_more
    }

    pub fn cursor(&self) -> Option<i64> {
        self.cursor
    }

    pub fn group_title(&self) -> Option<&str> {
        self.group_title.as_deref()
    }

    pub fn invite_code(&self) -> Option<&str> {
        self.invite_code.as_deref()
    }

    pub fn vouchers(&self) -> &[Voucher] {
        &self.vouchers
    }

    /// Drops loaded state so the next load starts from the first page.
    pub fn reset(&mut self) {
        self.cursor = None;
        self.has_more = true;
        self.vouchers.clear();
    }

    /// Folds one page into the pager and returns the newly added vouchers.
    pub fn absorb(&mut self, page: VoucherPage) -> Vec<Voucher> {
        let Some(group) = page.content.into_iter().next() else {
            self.has_more = false;
            return Vec::new();
        };

        if self.cursor.is_none() {
            self.group_title = Some(group.group_title);
            self.invite_code = group.group_invite_code;
        }
        if let Some(last) = group.vouchers.last() {
            self.cursor = Some(last.id);
        }
        self.has_more = !page.last && !group.vouchers.is_empty();
        self.vouchers.extend(group.vouchers.iter().cloned());
        group.vouchers
    }

    pub async fn load_more(&mut self, api: &ApiClient) -> Result<Vec<Voucher>, ApiError> {
        if !self.has_more {
            return Ok(Vec::new());
        }
        let page = api
            .voucher_page(self.group_id, self.page_size, self.cursor)
            .await?;
        Ok(self.absorb(page))
    }
}
