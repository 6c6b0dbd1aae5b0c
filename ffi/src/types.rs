//! `#[repr(C)]` types for the FFI boundary.
//!
//! # Design
//! Each type mirrors a core type but uses C-compatible representations:
//! `*mut c_char` instead of `String`, raw pointers instead of `Vec`, and
//! tagged enums with explicit discriminants. Conversion functions live here
//! to keep `lib.rs` focused on the `extern "C"` surface.

use std::ffi::{c_void, CString};
use std::os::raw::c_char;

use pixel_core::error::ApiError;
use pixel_core::http::HttpMethod;
use pixel_core::types::{Account, Relationship, Status};
use pixel_core::{FollowToggle, FollowsKind, Notice};

/// Opaque handle to a `PixelfedClient`. C callers receive a pointer to this
/// and pass it back into every FFI function.
pub struct FfiPixelClient {
    pub(crate) inner: pixel_core::PixelfedClient,
}

/// Opaque handle to the follow button state machine of one profile screen.
pub struct FfiFollowToggle {
    pub(crate) inner: FollowToggle,
}

/// Copy `s` into a heap C string. Interior NULs cannot cross the boundary;
/// such strings come out empty.
pub(crate) fn c_string(s: impl Into<Vec<u8>>) -> *mut c_char {
    CString::new(s).unwrap_or_default().into_raw()
}

/// Hand a vector to C as a pointer plus length. Empty vectors become null.
pub(crate) fn into_raw_vec<T>(items: Vec<T>) -> (*mut T, u32) {
    let len = items.len() as u32;
    if items.is_empty() {
        return (std::ptr::null_mut(), 0);
    }
    let mut boxed = items.into_boxed_slice();
    let ptr = boxed.as_mut_ptr();
    std::mem::forget(boxed);
    (ptr, len)
}

// ---------------------------------------------------------------------------
// Request types
// ---------------------------------------------------------------------------

/// HTTP method as a C enum.
#[repr(C)]
pub enum FfiHttpMethod {
    Get = 0,
    Post = 1,
}

impl From<HttpMethod> for FfiHttpMethod {
    fn from(m: HttpMethod) -> Self {
        match m {
            HttpMethod::Get => FfiHttpMethod::Get,
            HttpMethod::Post => FfiHttpMethod::Post,
        }
    }
}

/// A single HTTP header as a key-value pair of C strings.
#[repr(C)]
pub struct FfiHeader {
    pub key: *mut c_char,
    pub value: *mut c_char,
}

/// An HTTP request described as C-compatible plain data.
///
/// Built by `pixel_build_*` functions. The C caller executes the request
/// and passes the response back through `pixel_parse_*`.
#[repr(C)]
pub struct FfiHttpRequest {
    pub method: FfiHttpMethod,
    pub path: *mut c_char,
    pub headers: *mut FfiHeader,
    pub headers_len: u32,
    pub body: *mut c_char,
}

impl FfiHttpRequest {
    /// Convert a core `HttpRequest` into a heap-allocated `FfiHttpRequest`.
    pub(crate) fn from_core(req: pixel_core::HttpRequest) -> *mut Self {
        let body = match req.body {
            Some(b) => c_string(b),
            None => std::ptr::null_mut(),
        };
        let (headers, headers_len) = into_raw_vec(
            req.headers
                .into_iter()
                .map(|(k, v)| FfiHeader {
                    key: c_string(k),
                    value: c_string(v),
                })
                .collect(),
        );
        Box::into_raw(Box::new(FfiHttpRequest {
            method: req.method.into(),
            path: c_string(req.path),
            headers,
            headers_len,
            body,
        }))
    }
}

// ---------------------------------------------------------------------------
// Response input (caller-provided, not heap-allocated by us)
// ---------------------------------------------------------------------------

/// An HTTP response described as C-compatible plain data.
///
/// The C caller constructs this on the stack after executing an HTTP request,
/// then passes a pointer to a `pixel_parse_*` function. The FFI layer reads
/// but does not free these fields.
#[repr(C)]
pub struct FfiHttpResponse {
    pub status: u16,
    pub body: *const c_char,
}

/// Which side of the follow graph `pixel_build_follows` lists.
#[repr(C)]
#[derive(Clone, Copy)]
pub enum FfiFollowsKind {
    Followers = 0,
    Following = 1,
}

impl From<FfiFollowsKind> for FollowsKind {
    fn from(kind: FfiFollowsKind) -> Self {
        match kind {
            FfiFollowsKind::Followers => FollowsKind::Followers,
            FfiFollowsKind::Following => FollowsKind::Following,
        }
    }
}

// ---------------------------------------------------------------------------
// Result types
// ---------------------------------------------------------------------------

/// Error codes returned in `FfiPixelResult`.
///
/// `Auth` means the session must be renewed, `Permission` that the server
/// refused this action. `Network` covers every other HTTP or transport
/// failure.
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FfiErrorCode {
    Ok = 0,
    Auth = 1,
    Permission = 2,
    Network = 3,
    Deserialization = 4,
    Serialization = 5,
    Panic = 6,
    NullArg = 7,
}

/// Tag that tells `pixel_free_result` what `FfiPixelResult::data` points to.
#[repr(C)]
pub enum FfiDataTag {
    None = 0,
    Account = 1,
    AccountList = 2,
    StatusList = 3,
    Relationship = 4,
}

#[repr(C)]
pub struct FfiAccount {
    pub id: *mut c_char,
    pub username: *mut c_char,
    pub acct: *mut c_char,
    pub display_name: *mut c_char,
    pub avatar: *mut c_char,
    pub note: *mut c_char,
    pub url: *mut c_char,
    pub statuses_count: u64,
    pub followers_count: u64,
    pub following_count: u64,
}

impl From<Account> for FfiAccount {
    fn from(a: Account) -> Self {
        FfiAccount {
            id: c_string(a.id),
            username: c_string(a.username),
            acct: c_string(a.acct),
            display_name: c_string(a.display_name),
            avatar: c_string(a.avatar),
            note: c_string(a.note),
            url: c_string(a.url),
            statuses_count: a.statuses_count,
            followers_count: a.followers_count,
            following_count: a.following_count,
        }
    }
}

#[repr(C)]
pub struct FfiAccountList {
    pub items: *mut FfiAccount,
    pub len: u32,
}

/// A post reduced to what the profile grid shows. `preview_url` is null
/// when the post has no previewable attachment.
#[repr(C)]
pub struct FfiStatus {
    pub id: *mut c_char,
    pub content: *mut c_char,
    pub preview_url: *mut c_char,
}

impl From<Status> for FfiStatus {
    fn from(s: Status) -> Self {
        let preview_url = s
            .preview_url()
            .map(c_string)
            .unwrap_or(std::ptr::null_mut());
        FfiStatus {
            id: c_string(s.id),
            content: c_string(s.content),
            preview_url,
        }
    }
}

#[repr(C)]
pub struct FfiStatusList {
    pub items: *mut FfiStatus,
    pub len: u32,
}

#[repr(C)]
pub struct FfiRelationship {
    pub id: *mut c_char,
    pub following: bool,
    pub followed_by: bool,
    pub requested: bool,
}

impl From<Relationship> for FfiRelationship {
    fn from(r: Relationship) -> Self {
        FfiRelationship {
            id: c_string(r.id),
            following: r.following,
            followed_by: r.followed_by,
            requested: r.requested,
        }
    }
}

/// Result envelope for all parse operations.
///
/// On success `error_code` is `Ok`, `error_message` is null, and `data`
/// points to the parsed payload (tagged by `data_tag`). A relationship
/// lookup that found nothing succeeds with `data_tag = None`.
/// On failure `error_code` describes the category, `error_message` is a
/// human-readable C string, and `data` is null.
#[repr(C)]
pub struct FfiPixelResult {
    pub error_code: FfiErrorCode,
    pub error_message: *mut c_char,
    pub http_status: u16,
    pub data_tag: FfiDataTag,
    pub data: *mut c_void,
}

impl FfiPixelResult {
    fn ok(data_tag: FfiDataTag, data: *mut c_void) -> *mut Self {
        Box::into_raw(Box::new(FfiPixelResult {
            error_code: FfiErrorCode::Ok,
            error_message: std::ptr::null_mut(),
            http_status: 200,
            data_tag,
            data,
        }))
    }

    fn err(error_code: FfiErrorCode, http_status: u16, msg: String) -> *mut Self {
        Box::into_raw(Box::new(FfiPixelResult {
            error_code,
            error_message: c_string(msg),
            http_status,
            data_tag: FfiDataTag::None,
            data: std::ptr::null_mut(),
        }))
    }

    pub(crate) fn ok_account(account: Account) -> *mut Self {
        let data = Box::into_raw(Box::new(FfiAccount::from(account)));
        Self::ok(FfiDataTag::Account, data as *mut c_void)
    }

    pub(crate) fn ok_account_list(accounts: Vec<Account>) -> *mut Self {
        let (items, len) = into_raw_vec(accounts.into_iter().map(FfiAccount::from).collect());
        let data = Box::into_raw(Box::new(FfiAccountList { items, len }));
        Self::ok(FfiDataTag::AccountList, data as *mut c_void)
    }

    pub(crate) fn ok_status_list(statuses: Vec<Status>) -> *mut Self {
        let (items, len) = into_raw_vec(statuses.into_iter().map(FfiStatus::from).collect());
        let data = Box::into_raw(Box::new(FfiStatusList { items, len }));
        Self::ok(FfiDataTag::StatusList, data as *mut c_void)
    }

    pub(crate) fn ok_relationship(relationship: Option<Relationship>) -> *mut Self {
        match relationship {
            Some(r) => {
                let data = Box::into_raw(Box::new(FfiRelationship::from(r)));
                Self::ok(FfiDataTag::Relationship, data as *mut c_void)
            }
            None => Self::ok(FfiDataTag::None, std::ptr::null_mut()),
        }
    }

    /// Build an error result from an `ApiError`.
    pub(crate) fn from_error(err: ApiError) -> *mut Self {
        let code = error_code(&err);
        let status = err.status().unwrap_or(0);
        Self::err(code, status, err.to_string())
    }

    /// Build an error result for a null argument.
    pub(crate) fn null_arg(name: &str) -> *mut Self {
        Self::err(FfiErrorCode::NullArg, 0, format!("null argument: {name}"))
    }

    /// Build an error result for a caught panic.
    pub(crate) fn panic(msg: &str) -> *mut Self {
        Self::err(FfiErrorCode::Panic, 0, msg.to_string())
    }
}

pub(crate) fn error_code(err: &ApiError) -> FfiErrorCode {
    match err {
        ApiError::NoSession | ApiError::Unauthorized { .. } => FfiErrorCode::Auth,
        ApiError::Forbidden { .. } => FfiErrorCode::Permission,
        ApiError::HttpError { .. } | ApiError::Transport(_) => FfiErrorCode::Network,
        ApiError::DeserializationError(_) => FfiErrorCode::Deserialization,
        ApiError::SerializationError(_) => FfiErrorCode::Serialization,
    }
}

/// Rebuild an error of the same category from a result envelope, so the
/// follow toggle can pick the right notice.
pub(crate) fn error_from_result(result: &FfiPixelResult, message: String) -> ApiError {
    match result.error_code {
        FfiErrorCode::Auth => ApiError::Unauthorized {
            status: result.http_status,
            body: message,
        },
        FfiErrorCode::Permission => ApiError::Forbidden { body: message },
        FfiErrorCode::Deserialization => ApiError::DeserializationError(message),
        FfiErrorCode::Serialization => ApiError::SerializationError(message),
        _ if result.http_status != 0 => ApiError::HttpError {
            status: result.http_status,
            body: message,
        },
        _ => ApiError::Transport(message),
    }
}

// ---------------------------------------------------------------------------
// Follow toggle
// ---------------------------------------------------------------------------

/// What a `pixel_follow_toggle_complete` call did.
///
/// `Changed` means the toggle switched state. `Ignored` means the answer
/// did not belong to the toggle in flight. The remaining values are
/// notices to show; the state is unchanged.
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FfiToggleOutcome {
    Changed = 0,
    Ignored = 1,
    AccessTokenInvalid = 2,
    ActionNotAllowed = 3,
    FollowFailed = 4,
    UnfollowFailed = 5,
}

impl FfiToggleOutcome {
    pub(crate) fn from_notice(notice: Notice) -> Self {
        match notice {
            Notice::AccessTokenInvalid => FfiToggleOutcome::AccessTokenInvalid,
            Notice::ActionNotAllowed => FfiToggleOutcome::ActionNotAllowed,
            Notice::UnfollowFailed => FfiToggleOutcome::UnfollowFailed,
            _ => FfiToggleOutcome::FollowFailed,
        }
    }

    pub(crate) fn notice(self) -> Option<Notice> {
        match self {
            FfiToggleOutcome::Changed | FfiToggleOutcome::Ignored => None,
            FfiToggleOutcome::AccessTokenInvalid => Some(Notice::AccessTokenInvalid),
            FfiToggleOutcome::ActionNotAllowed => Some(Notice::ActionNotAllowed),
            FfiToggleOutcome::FollowFailed => Some(Notice::FollowFailed),
            FfiToggleOutcome::UnfollowFailed => Some(Notice::UnfollowFailed),
        }
    }
}
