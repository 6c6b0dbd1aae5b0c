//! C-ABI wrapper around `pixel-core`.
//!
//! # Overview
//! Exposes the profile screen's account calls and the follow button state
//! machine through `extern "C"` functions, so a host UI written in any
//! language with a C FFI can build requests, execute them on its own HTTP
//! stack and feed the responses back without linking an async runtime.
//!
//! # Design
//! - Every `extern "C"` function wraps its body in `catch_unwind` so panics
//!   never cross the FFI boundary.
//! - Per-operation `build_*` / `parse_*` mirrors the core client 1:1.
//! - A single `FfiPixelResult` envelope with `FfiDataTag` + `void* data`
//!   conveys success payloads and errors uniformly.
//! - Request ids passed to the follow toggle are chosen by the host and must
//!   increase; answers to older requests are ignored.
//! - The C caller owns all returned pointers and must call the matching
//!   `pixel_free_*` function to release them.

pub mod types;

use std::ffi::{CStr, CString};
use std::os::raw::c_char;
use std::panic::{catch_unwind, UnwindSafe};

use pixel_core::http::HttpResponse;
use pixel_core::types::Relationship;
use pixel_core::{FollowToggle, PixelfedClient, RequestId};

use types::*;

/// Borrow a C string. `None` for null or non-UTF-8 input.
fn read_str<'a>(ptr: *const c_char) -> Option<&'a str> {
    if ptr.is_null() {
        return None;
    }
    unsafe { CStr::from_ptr(ptr) }.to_str().ok()
}

// ---------------------------------------------------------------------------
// Client lifecycle
// ---------------------------------------------------------------------------

/// Create a client for the instance at `base_url`, authenticated with
/// `access_token`.
///
/// Returns null if either argument is null or not UTF-8.
/// The caller must free the returned pointer with `pixel_client_free`.
#[unsafe(no_mangle)]
pub extern "C" fn pixel_client_new(
    base_url: *const c_char,
    access_token: *const c_char,
) -> *mut FfiPixelClient {
    catch_unwind(|| {
        let (Some(url), Some(token)) = (read_str(base_url), read_str(access_token)) else {
            return std::ptr::null_mut();
        };
        let client = PixelfedClient::new(url, token);
        Box::into_raw(Box::new(FfiPixelClient { inner: client }))
    })
    .unwrap_or(std::ptr::null_mut())
}

/// Free a client created by `pixel_client_new`. Safe to call with null.
#[unsafe(no_mangle)]
pub extern "C" fn pixel_client_free(client: *mut FfiPixelClient) {
    if !client.is_null() {
        let _ = catch_unwind(|| {
            drop(unsafe { Box::from_raw(client) });
        });
    }
}

/// URL of the instance's profile settings page, opened for "edit profile".
/// Free with `pixel_free_string`.
#[unsafe(no_mangle)]
pub extern "C" fn pixel_edit_profile_url(client: *const FfiPixelClient) -> *mut c_char {
    catch_unwind(|| {
        if client.is_null() {
            return std::ptr::null_mut();
        }
        let client = unsafe { &*client };
        c_string(client.inner.edit_profile_url())
    })
    .unwrap_or(std::ptr::null_mut())
}

// ---------------------------------------------------------------------------
// Build request functions
// ---------------------------------------------------------------------------

/// Run `build` against the client and convert the request. Null when the
/// client is null or `build` declines.
fn build_with(
    client: *const FfiPixelClient,
    build: impl FnOnce(&PixelfedClient) -> Option<pixel_core::HttpRequest> + UnwindSafe,
) -> *mut FfiHttpRequest {
    catch_unwind(|| {
        if client.is_null() {
            return std::ptr::null_mut();
        }
        let client = unsafe { &*client };
        match build(&client.inner) {
            Some(req) => FfiHttpRequest::from_core(req),
            None => std::ptr::null_mut(),
        }
    })
    .unwrap_or(std::ptr::null_mut())
}

/// Build the request resolving the logged-in account.
///
/// Returns null if `client` is null.
/// The caller must free the returned pointer with `pixel_free_request`.
#[unsafe(no_mangle)]
pub extern "C" fn pixel_build_verify_credentials(
    client: *const FfiPixelClient,
) -> *mut FfiHttpRequest {
    build_with(client, |c| Some(c.build_verify_credentials()))
}

/// Build the request listing an account's posts.
///
/// Returns null if `client` or `account_id` is null.
#[unsafe(no_mangle)]
pub extern "C" fn pixel_build_account_posts(
    client: *const FfiPixelClient,
    account_id: *const c_char,
) -> *mut FfiHttpRequest {
    build_with(client, |c| Some(c.build_account_posts(read_str(account_id)?)))
}

/// Build the relationship lookup for one account.
///
/// Returns null if `client` or `account_id` is null, or if serialization
/// fails.
#[unsafe(no_mangle)]
pub extern "C" fn pixel_build_check_relationship(
    client: *const FfiPixelClient,
    account_id: *const c_char,
) -> *mut FfiHttpRequest {
    build_with(client, |c| {
        c.build_check_relationships(&[read_str(account_id)?]).ok()
    })
}

/// Build a follow (`desired = true`) or unfollow request.
///
/// Returns null if `client` or `account_id` is null.
#[unsafe(no_mangle)]
pub extern "C" fn pixel_build_set_follow(
    client: *const FfiPixelClient,
    account_id: *const c_char,
    desired: bool,
) -> *mut FfiHttpRequest {
    build_with(client, |c| Some(c.build_set_follow(read_str(account_id)?, desired)))
}

/// Build the request listing an account's followers or followed accounts.
///
/// Returns null if `client` or `account_id` is null.
#[unsafe(no_mangle)]
pub extern "C" fn pixel_build_follows(
    client: *const FfiPixelClient,
    account_id: *const c_char,
    kind: FfiFollowsKind,
) -> *mut FfiHttpRequest {
    build_with(client, |c| Some(c.build_follows(read_str(account_id)?, kind.into())))
}

// ---------------------------------------------------------------------------
// Parse response functions
// ---------------------------------------------------------------------------

/// Convert an `FfiHttpResponse` to a core `HttpResponse`. A null body is
/// read as empty.
fn ffi_response_to_core(resp: &FfiHttpResponse) -> HttpResponse {
    let body = read_str(resp.body).unwrap_or_default().to_string();
    HttpResponse::new(resp.status, body)
}

fn parse_with(
    name: &str,
    client: *const FfiPixelClient,
    response: *const FfiHttpResponse,
    parse: impl FnOnce(&PixelfedClient, HttpResponse) -> *mut FfiPixelResult + UnwindSafe,
) -> *mut FfiPixelResult {
    catch_unwind(|| {
        if client.is_null() {
            return FfiPixelResult::null_arg("client");
        }
        if response.is_null() {
            return FfiPixelResult::null_arg("response");
        }
        let client = unsafe { &*client };
        let resp = unsafe { &*response };
        parse(&client.inner, ffi_response_to_core(resp))
    })
    .unwrap_or_else(|_| FfiPixelResult::panic(&format!("panic in {name}")))
}

/// Parse the `verify_credentials` response.
///
/// Returns a result with `data_tag = Account` on success. Any non-200
/// status is reported as `Auth`.
#[unsafe(no_mangle)]
pub extern "C" fn pixel_parse_verify_credentials(
    client: *const FfiPixelClient,
    response: *const FfiHttpResponse,
) -> *mut FfiPixelResult {
    parse_with("pixel_parse_verify_credentials", client, response, |c, resp| {
        match c.parse_verify_credentials(resp) {
            Ok(account) => FfiPixelResult::ok_account(account),
            Err(e) => FfiPixelResult::from_error(e),
        }
    })
}

/// Parse an account's posts.
///
/// Returns a result with `data_tag = StatusList` on success; an account
/// without posts yields an empty list.
#[unsafe(no_mangle)]
pub extern "C" fn pixel_parse_account_posts(
    client: *const FfiPixelClient,
    response: *const FfiHttpResponse,
) -> *mut FfiPixelResult {
    parse_with("pixel_parse_account_posts", client, response, |c, resp| {
        match c.parse_account_posts(resp) {
            Ok(statuses) => FfiPixelResult::ok_status_list(statuses),
            Err(e) => FfiPixelResult::from_error(e),
        }
    })
}

/// Parse the relationship lookup for `account_id`.
///
/// Returns `data_tag = Relationship` when the server reported one and
/// `data_tag = None` when it did not.
#[unsafe(no_mangle)]
pub extern "C" fn pixel_parse_check_relationship(
    client: *const FfiPixelClient,
    response: *const FfiHttpResponse,
    account_id: *const c_char,
) -> *mut FfiPixelResult {
    parse_with("pixel_parse_check_relationship", client, response, |c, resp| {
        let Some(id) = read_str(account_id) else {
            return FfiPixelResult::null_arg("account_id");
        };
        match c.parse_check_relationships(resp, id) {
            Ok(relationship) => FfiPixelResult::ok_relationship(relationship),
            Err(e) => FfiPixelResult::from_error(e),
        }
    })
}

/// Parse a follow or unfollow response.
///
/// Returns a result with `data_tag = Relationship` on success.
#[unsafe(no_mangle)]
pub extern "C" fn pixel_parse_set_follow(
    client: *const FfiPixelClient,
    response: *const FfiHttpResponse,
) -> *mut FfiPixelResult {
    parse_with("pixel_parse_set_follow", client, response, |c, resp| {
        match c.parse_set_follow(resp) {
            Ok(relationship) => FfiPixelResult::ok_relationship(Some(relationship)),
            Err(e) => FfiPixelResult::from_error(e),
        }
    })
}

/// Parse a followers/following list.
///
/// Returns a result with `data_tag = AccountList` on success.
#[unsafe(no_mangle)]
pub extern "C" fn pixel_parse_follows(
    client: *const FfiPixelClient,
    response: *const FfiHttpResponse,
) -> *mut FfiPixelResult {
    parse_with("pixel_parse_follows", client, response, |c, resp| {
        match c.parse_follows(resp) {
            Ok(accounts) => FfiPixelResult::ok_account_list(accounts),
            Err(e) => FfiPixelResult::from_error(e),
        }
    })
}

// ---------------------------------------------------------------------------
// Follow toggle
// ---------------------------------------------------------------------------

fn relationship_from_ffi(r: &FfiRelationship) -> Relationship {
    Relationship {
        id: read_str(r.id).unwrap_or_default().to_string(),
        following: r.following,
        followed_by: r.followed_by,
        requested: r.requested,
    }
}

fn error_message(result: &FfiPixelResult) -> String {
    read_str(result.error_message)
        .unwrap_or_default()
        .to_string()
}

/// Create a follow toggle in the unknown state (button hidden).
/// Free with `pixel_follow_toggle_free`.
#[unsafe(no_mangle)]
pub extern "C" fn pixel_follow_toggle_new() -> *mut FfiFollowToggle {
    catch_unwind(|| {
        Box::into_raw(Box::new(FfiFollowToggle {
            inner: FollowToggle::default(),
        }))
    })
    .unwrap_or(std::ptr::null_mut())
}

/// Free a toggle created by `pixel_follow_toggle_new`. Safe to call with null.
#[unsafe(no_mangle)]
pub extern "C" fn pixel_follow_toggle_free(toggle: *mut FfiFollowToggle) {
    if !toggle.is_null() {
        let _ = catch_unwind(|| {
            drop(unsafe { Box::from_raw(toggle) });
        });
    }
}

/// Feed the result of `pixel_parse_check_relationship` for `request`.
///
/// A relationship sets the state; a missing relationship or an error keeps
/// it. Returns false if the answer was stale or an argument was null.
#[unsafe(no_mangle)]
pub extern "C" fn pixel_follow_toggle_resolve(
    toggle: *mut FfiFollowToggle,
    request: u64,
    result: *const FfiPixelResult,
) -> bool {
    catch_unwind(|| {
        if toggle.is_null() || result.is_null() {
            return false;
        }
        let toggle = unsafe { &mut *toggle };
        let result = unsafe { &*result };
        let request = RequestId(request);
        match (result.error_code, &result.data_tag) {
            (FfiErrorCode::Ok, FfiDataTag::Relationship) if !result.data.is_null() => {
                let r = unsafe { &*(result.data as *const FfiRelationship) };
                toggle.inner.resolve(request, &relationship_from_ffi(r))
            }
            _ => toggle.inner.settle_without_relationship(request),
        }
    })
    .unwrap_or(false)
}

/// Start a toggle for `request`.
///
/// Returns `1` to send a follow, `0` to send an unfollow, and `-1` when the
/// click is ignored (state unknown, or another toggle is in flight).
#[unsafe(no_mangle)]
pub extern "C" fn pixel_follow_toggle_begin(toggle: *mut FfiFollowToggle, request: u64) -> i32 {
    catch_unwind(|| {
        if toggle.is_null() {
            return -1;
        }
        let toggle = unsafe { &mut *toggle };
        match toggle.inner.begin(RequestId(request)) {
            Ok(desired) => i32::from(desired),
            Err(_) => -1,
        }
    })
    .unwrap_or(-1)
}

/// Feed the result of `pixel_parse_set_follow` for the toggle started with
/// `request`.
#[unsafe(no_mangle)]
pub extern "C" fn pixel_follow_toggle_complete(
    toggle: *mut FfiFollowToggle,
    request: u64,
    result: *const FfiPixelResult,
) -> FfiToggleOutcome {
    catch_unwind(|| {
        if toggle.is_null() || result.is_null() {
            return FfiToggleOutcome::Ignored;
        }
        let toggle = unsafe { &mut *toggle };
        let result = unsafe { &*result };
        let request = RequestId(request);
        let outcome = if result.error_code == FfiErrorCode::Ok {
            let relationship = if result.data.is_null() {
                None
            } else {
                Some(relationship_from_ffi(unsafe {
                    &*(result.data as *const FfiRelationship)
                }))
            };
            match relationship {
                Some(r) => toggle.inner.complete(request, Ok(&r)),
                None => {
                    let err = pixel_core::ApiError::DeserializationError(
                        "missing relationship".to_string(),
                    );
                    toggle.inner.complete(request, Err(&err))
                }
            }
        } else {
            let err = error_from_result(result, error_message(result));
            toggle.inner.complete(request, Err(&err))
        };
        match outcome {
            None => FfiToggleOutcome::Ignored,
            Some(Ok(_)) => FfiToggleOutcome::Changed,
            Some(Err(notice)) => FfiToggleOutcome::from_notice(notice),
        }
    })
    .unwrap_or(FfiToggleOutcome::Ignored)
}

/// True while a follow/unfollow call is in flight.
#[unsafe(no_mangle)]
pub extern "C" fn pixel_follow_toggle_is_busy(toggle: *const FfiFollowToggle) -> bool {
    catch_unwind(|| !toggle.is_null() && unsafe { &*toggle }.inner.is_busy()).unwrap_or(false)
}

/// Current button label, `"Follow"` or `"Unfollow"`. Null while the state is
/// unknown and the button must stay hidden. Free with `pixel_free_string`.
#[unsafe(no_mangle)]
pub extern "C" fn pixel_follow_toggle_label(toggle: *const FfiFollowToggle) -> *mut c_char {
    catch_unwind(|| {
        if toggle.is_null() {
            return std::ptr::null_mut();
        }
        let toggle = unsafe { &*toggle };
        toggle
            .inner
            .button()
            .label()
            .map(c_string)
            .unwrap_or(std::ptr::null_mut())
    })
    .unwrap_or(std::ptr::null_mut())
}

/// User-facing message for a failed toggle. Null for `Changed` and
/// `Ignored`. Free with `pixel_free_string`.
#[unsafe(no_mangle)]
pub extern "C" fn pixel_toggle_outcome_message(outcome: FfiToggleOutcome) -> *mut c_char {
    catch_unwind(|| {
        outcome
            .notice()
            .map(|n| c_string(n.message()))
            .unwrap_or(std::ptr::null_mut())
    })
    .unwrap_or(std::ptr::null_mut())
}

// ---------------------------------------------------------------------------
// Free functions
// ---------------------------------------------------------------------------

/// Reclaim a pointer/length pair produced by `into_raw_vec`.
fn take_vec<T>(items: *mut T, len: u32) -> Vec<T> {
    if items.is_null() || len == 0 {
        return Vec::new();
    }
    let slice = std::ptr::slice_from_raw_parts_mut(items, len as usize);
    unsafe { Box::from_raw(slice) }.into_vec()
}

fn free_c_string(s: *mut c_char) {
    if !s.is_null() {
        drop(unsafe { CString::from_raw(s) });
    }
}

/// Free an `FfiHttpRequest` returned by any `pixel_build_*` function.
/// Safe to call with null.
#[unsafe(no_mangle)]
pub extern "C" fn pixel_free_request(req: *mut FfiHttpRequest) {
    if req.is_null() {
        return;
    }
    let _ = catch_unwind(|| {
        let req = unsafe { Box::from_raw(req) };
        free_c_string(req.path);
        free_c_string(req.body);
        for h in take_vec(req.headers, req.headers_len) {
            free_c_string(h.key);
            free_c_string(h.value);
        }
    });
}

fn free_account_fields(a: &FfiAccount) {
    for s in [a.id, a.username, a.acct, a.display_name, a.avatar, a.note, a.url] {
        free_c_string(s);
    }
}

/// Free an `FfiPixelResult` returned by any `pixel_parse_*` function.
/// Safe to call with null. Uses `data_tag` to determine what `data` points to.
#[unsafe(no_mangle)]
pub extern "C" fn pixel_free_result(result: *mut FfiPixelResult) {
    if result.is_null() {
        return;
    }
    let _ = catch_unwind(|| {
        let result = unsafe { Box::from_raw(result) };
        free_c_string(result.error_message);
        if result.data.is_null() {
            return;
        }
        match result.data_tag {
            FfiDataTag::Account => {
                let account = unsafe { Box::from_raw(result.data as *mut FfiAccount) };
                free_account_fields(&account);
            }
            FfiDataTag::AccountList => {
                let list = unsafe { Box::from_raw(result.data as *mut FfiAccountList) };
                for account in take_vec(list.items, list.len) {
                    free_account_fields(&account);
                }
            }
            FfiDataTag::StatusList => {
                let list = unsafe { Box::from_raw(result.data as *mut FfiStatusList) };
                for status in take_vec(list.items, list.len) {
                    free_c_string(status.id);
                    free_c_string(status.content);
                    free_c_string(status.preview_url);
                }
            }
            FfiDataTag::Relationship => {
                let r = unsafe { Box::from_raw(result.data as *mut FfiRelationship) };
                free_c_string(r.id);
            }
            FfiDataTag::None => {}
        }
    });
}

/// Free a C string allocated by this library. Safe to call with null.
#[unsafe(no_mangle)]
pub extern "C" fn pixel_free_string(s: *mut c_char) {
    if !s.is_null() {
        let _ = catch_unwind(|| free_c_string(s));
    }
}

// ---------------------------------------------------------------------------
// Unit tests
// ---------------------------------------------------------------------------
