use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::fmt;

const BEARER_SCHEME: &str = "Bearer";

/// Opaque bearer credential. Stored without the `Bearer ` scheme prefix.
#[derive(Clone, PartialEq, Eq)]
pub struct Token(String);

impl Token {
    /// Accepts either a bare token or a full `Bearer <token>` header value.
    /// Blank input yields `None`.
    pub fn parse(raw: &str) -> Option<Self> {
        let trimmed = raw.trim();
        let bare = match trimmed.split_once(char::is_whitespace) {
            Some((scheme, rest)) if scheme.eq_ignore_ascii_case(BEARER_SCHEME) => rest.trim(),
            None if trimmed.eq_ignore_ascii_case(BEARER_SCHEME) => "",
            _ => trimmed,
        };
        if bare.is_empty() {
            None
        } else {
            Some(Self(bare.to_string()))
        }
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn authorization_value(&self) -> String {
        format!("{BEARER_SCHEME} {}", self.0)
    }
}

impl fmt::Debug for Token {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("Token(REDACTED)")
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum SessionStatus {
    Unauthenticated,
    Authenticated,
    Expired,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum VoucherStatus {
    Available,
    Used,
    Expired,
}

impl VoucherStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Available => "AVAILABLE",
            Self::Used => "USED",
            Self::Expired => "EXPIRED",
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Voucher {
    pub id: i64,
    #[serde(default)]
    pub presigned_image: Option<String>,
    pub name: String,
    pub expiration: String,
    pub status: VoucherStatus,
    #[serde(default)]
    pub group_id: Option<i64>,
    #[serde(default)]
    pub registered_user_id: Option<i64>,
}

impl Voucher {
    /// Only the member who registered a voucher may delete it.
    pub fn can_delete(&self, user_id: i64) -> bool {
        self.registered_user_id == Some(user_id)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GroupVouchers {
    pub group_id: i64,
    pub group_title: String,
    #[serde(default)]
    pub group_invite_code: Option<String>,
    #[serde(default)]
    pub vouchers: Vec<Voucher>,
}

/// Slice of a cursor-paginated listing; only the fields the client reads.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VoucherPage {
    #[serde(default)]
    pub content: Vec<GroupVouchers>,
    #[serde(default = "default_true")]
    pub last: bool,
}

fn default_true() -> bool {
    true
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserProfile {
    pub user_id: i64,
    pub nick_name: String,
    pub email: String,
    #[serde(default)]
    pub join_group_count: u32,
    #[serde(default)]
    pub owned_voucher_count: u32,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct GroupSummary {
    pub group_id: i64,
    pub group_title_alias: String,
    pub member_count: u32,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct JoinRequest {
    pub apply_user_id: i64,
    pub apply_user_nickname: String,
    #[serde(default, skip_deserializing)]
    pub is_new: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct GroupJoinRequests {
    pub target_group_id: i64,
    pub leader_group_alias: String,
    #[serde(default)]
    pub pending_members: Vec<JoinRequest>,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum JoinDecision {
    Approved,
    Rejected,
}

impl JoinDecision {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Approved => "APPROVED",
            Self::Rejected => "REJECTED",
        }
    }
}

/// Flags every pending member whose applicant id has not been seen before.
pub fn mark_new_requests(
    groups: Vec<GroupJoinRequests>,
    last_checked: &HashSet<i64>,
) -> Vec<GroupJoinRequests> {
    groups
        .into_iter()
        .map(|mut group| {
            for member in group.pending_members.iter_mut() {
                member.is_new = !last_checked.contains(&member.apply_user_id);
            }
            group
        })
        .collect()
}
