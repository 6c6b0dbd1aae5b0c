//! Follow lifecycle through the C ABI against the live mock server.
//!
//! # Design
//! Starts the mock server on a random port, then plays the host's role:
//! builds requests with `pixel_build_*`, executes them with ureq, hands the
//! responses to `pixel_parse_*` and drives the follow toggle with the parsed
//! results. Every returned pointer is released with its `pixel_free_*`.

use std::ffi::{CStr, CString};
use std::os::raw::c_char;

use pixel_ffi::types::{
    FfiAccount, FfiAccountList, FfiDataTag, FfiErrorCode, FfiFollowsKind, FfiHttpMethod,
    FfiHttpRequest, FfiHttpResponse, FfiPixelClient, FfiPixelResult, FfiStatusList,
    FfiToggleOutcome,
};
use pixel_ffi::*;

fn str_at<'a>(ptr: *const c_char) -> &'a str {
    unsafe { CStr::from_ptr(ptr) }.to_str().unwrap()
}

/// Execute an `FfiHttpRequest` with ureq and return the status and body.
///
/// Disables ureq's automatic status-code-as-error behavior so 4xx/5xx
/// responses are returned as data for the parse functions to classify.
fn execute(req: *mut FfiHttpRequest) -> (u16, CString) {
    assert!(!req.is_null(), "build returned null");
    let r = unsafe { &*req };
    let agent = ureq::Agent::config_builder()
        .http_status_as_error(false)
        .build()
        .new_agent();

    let headers = unsafe { std::slice::from_raw_parts(r.headers, r.headers_len as usize) };
    let path = str_at(r.path);
    let mut response = match r.method {
        FfiHttpMethod::Get => {
            let mut builder = agent.get(path);
            for h in headers {
                builder = builder.header(str_at(h.key), str_at(h.value));
            }
            builder.call()
        }
        FfiHttpMethod::Post => {
            let mut builder = agent.post(path);
            for h in headers {
                builder = builder.header(str_at(h.key), str_at(h.value));
            }
            if r.body.is_null() {
                builder.send_empty()
            } else {
                builder.send(str_at(r.body).as_bytes())
            }
        }
    }
    .expect("HTTP transport error");

    let status = response.status().as_u16();
    let body = response.body_mut().read_to_string().unwrap_or_default();
    pixel_free_request(req);
    (status, CString::new(body).unwrap())
}

/// Execute a request and parse its response with `parse`.
fn round_trip(
    client: *const FfiPixelClient,
    req: *mut FfiHttpRequest,
    parse: impl FnOnce(*const FfiPixelClient, *const FfiHttpResponse) -> *mut FfiPixelResult,
) -> *mut FfiPixelResult {
    let (status, body) = execute(req);
    let resp = FfiHttpResponse {
        status,
        body: body.as_ptr(),
    };
    parse(client, &resp)
}

fn start_server() -> String {
    let std_listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
    let addr = std_listener.local_addr().unwrap();
    std_listener.set_nonblocking(true).unwrap();

    std::thread::spawn(move || {
        let rt = tokio::runtime::Builder::new_current_thread()
            .enable_all()
            .build()
            .unwrap();
        rt.block_on(async {
            let listener = tokio::net::TcpListener::from_std(std_listener).unwrap();
            mock_server::run(listener).await
        })
        .unwrap();
    });

    format!("http://{addr}")
}

#[test]
fn follow_lifecycle() {
    let base = CString::new(start_server()).unwrap();
    let token = CString::new(mock_server::VIEWER_TOKEN).unwrap();
    let client = pixel_client_new(base.as_ptr(), token.as_ptr());
    assert!(!client.is_null());
    let bob = CString::new(mock_server::PHOTOGRAPHER_ID).unwrap();

    // Step 1: resolve the viewer.
    let result = round_trip(
        client,
        pixel_build_verify_credentials(client),
        |c, resp| pixel_parse_verify_credentials(c, resp),
    );
    let r = unsafe { &*result };
    assert_eq!(r.error_code, FfiErrorCode::Ok);
    let me = unsafe { &*(r.data as *const FfiAccount) };
    assert_eq!(str_at(me.id), mock_server::VIEWER_ID);
    pixel_free_result(result);

    // Step 2: the photographer's posts.
    let result = round_trip(
        client,
        pixel_build_account_posts(client, bob.as_ptr()),
        |c, resp| pixel_parse_account_posts(c, resp),
    );
    let r = unsafe { &*result };
    assert!(matches!(r.data_tag, FfiDataTag::StatusList));
    let posts = unsafe { &*(r.data as *const FfiStatusList) };
    assert_eq!(posts.len, 2);
    pixel_free_result(result);

    // Step 3: relationship resolves the button to "Follow".
    let toggle = pixel_follow_toggle_new();
    let bob_ptr = bob.as_ptr();
    let lookup = round_trip(
        client,
        pixel_build_check_relationship(client, bob_ptr),
        |c, resp| pixel_parse_check_relationship(c, resp, bob_ptr),
    );
    assert!(pixel_follow_toggle_resolve(toggle, 1, lookup));
    pixel_free_result(lookup);
    let label = pixel_follow_toggle_label(toggle);
    assert_eq!(str_at(label), "Follow");
    pixel_free_string(label);

    // Step 4: follow.
    assert_eq!(pixel_follow_toggle_begin(toggle, 2), 1);
    let result = round_trip(
        client,
        pixel_build_set_follow(client, bob.as_ptr(), true),
        |c, resp| pixel_parse_set_follow(c, resp),
    );
    assert_eq!(
        pixel_follow_toggle_complete(toggle, 2, result),
        FfiToggleOutcome::Changed
    );
    pixel_free_result(result);
    let label = pixel_follow_toggle_label(toggle);
    assert_eq!(str_at(label), "Unfollow");
    pixel_free_string(label);

    // Step 5: the photographer's followers now include the viewer.
    let result = round_trip(
        client,
        pixel_build_follows(client, bob.as_ptr(), FfiFollowsKind::Followers),
        |c, resp| pixel_parse_follows(c, resp),
    );
    let r = unsafe { &*result };
    assert!(matches!(r.data_tag, FfiDataTag::AccountList));
    let list = unsafe { &*(r.data as *const FfiAccountList) };
    let followers = unsafe { std::slice::from_raw_parts(list.items, list.len as usize) };
    assert!(followers
        .iter()
        .any(|a| str_at(a.id) == mock_server::VIEWER_ID));
    pixel_free_result(result);

    // Step 6: unfollow.
    assert_eq!(pixel_follow_toggle_begin(toggle, 3), 0);
    let result = round_trip(
        client,
        pixel_build_set_follow(client, bob.as_ptr(), false),
        |c, resp| pixel_parse_set_follow(c, resp),
    );
    assert_eq!(
        pixel_follow_toggle_complete(toggle, 3, result),
        FfiToggleOutcome::Changed
    );
    pixel_free_result(result);
    let label = pixel_follow_toggle_label(toggle);
    assert_eq!(str_at(label), "Follow");
    pixel_free_string(label);

    pixel_follow_toggle_free(toggle);
    pixel_client_free(client);
}

#[test]
fn refused_follow_and_expired_token() {
    let base = CString::new(start_server()).unwrap();
    let token = CString::new(mock_server::VIEWER_TOKEN).unwrap();
    let client = pixel_client_new(base.as_ptr(), token.as_ptr());
    let carol = CString::new(mock_server::RESTRICTED_ID).unwrap();

    // The viewer already follows the restricted account; unfollow works.
    let toggle = pixel_follow_toggle_new();
    let carol_ptr = carol.as_ptr();
    let lookup = round_trip(
        client,
        pixel_build_check_relationship(client, carol_ptr),
        |c, resp| pixel_parse_check_relationship(c, resp, carol_ptr),
    );
    pixel_follow_toggle_resolve(toggle, 1, lookup);
    pixel_free_result(lookup);

    assert_eq!(pixel_follow_toggle_begin(toggle, 2), 0);
    let result = round_trip(
        client,
        pixel_build_set_follow(client, carol.as_ptr(), false),
        |c, resp| pixel_parse_set_follow(c, resp),
    );
    assert_eq!(
        pixel_follow_toggle_complete(toggle, 2, result),
        FfiToggleOutcome::Changed
    );
    pixel_free_result(result);

    // Following again is refused and the label stays.
    assert_eq!(pixel_follow_toggle_begin(toggle, 3), 1);
    let result = round_trip(
        client,
        pixel_build_set_follow(client, carol.as_ptr(), true),
        |c, resp| pixel_parse_set_follow(c, resp),
    );
    let r = unsafe { &*result };
    assert_eq!(r.error_code, FfiErrorCode::Permission);
    assert_eq!(r.http_status, 403);
    assert_eq!(
        pixel_follow_toggle_complete(toggle, 3, result),
        FfiToggleOutcome::ActionNotAllowed
    );
    pixel_free_result(result);
    let label = pixel_follow_toggle_label(toggle);
    assert_eq!(str_at(label), "Follow");
    pixel_free_string(label);
    pixel_follow_toggle_free(toggle);
    pixel_client_free(client);

    // An unknown token fails identity resolution as an auth error.
    let expired = CString::new("expired").unwrap();
    let client = pixel_client_new(base.as_ptr(), expired.as_ptr());
    let result = round_trip(
        client,
        pixel_build_verify_credentials(client),
        |c, resp| pixel_parse_verify_credentials(c, resp),
    );
    let r = unsafe { &*result };
    assert_eq!(r.error_code, FfiErrorCode::Auth);
    assert_eq!(r.http_status, 401);
    pixel_free_result(result);
    pixel_client_free(client);
}
