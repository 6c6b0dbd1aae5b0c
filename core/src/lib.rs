//! Client core for the profile screen of a Pixelfed client.
//!
//! # Overview
//! Builds `HttpRequest` values and parses `HttpResponse` values for the
//! account endpoints (host-does-IO pattern), then reconciles the
//! asynchronous answers into a single `ProfileViewModel` and drives the
//! follow/unfollow affordance.
//!
//! # Design
//! - `PixelfedClient` is stateless apart from the instance URL and token.
//! - `Transport` and `Gateway` are the async seams; hosts supply the HTTP
//!   stack, tests supply scripted gateways.
//! - `ProfileViewModel::apply` is a pure reducer; `ProfileController`
//!   issues the calls and publishes snapshots on a `watch` channel.
//! - DTOs are defined independently from the mock-server crate; integration
//!   tests catch schema drift.

pub mod client;
pub mod controller;
pub mod error;
pub mod follow;
pub mod follows;
pub mod gateway;
pub mod http;
pub mod profile;
pub mod session;
pub mod types;

pub use client::PixelfedClient;
pub use controller::{
    IntentOutcome, LoadOutcome, ProfileController, ProfileIntent, ProfileUpdates, ToggleOutcome,
};
pub use error::{ApiError, ErrorKind, SessionError};
pub use follow::{FollowButton, FollowState, FollowToggle};
pub use follows::{load_follows, FollowsRoute};
pub use gateway::{Gateway, HttpGateway, Transport};
pub use http::{HttpMethod, HttpRequest, HttpResponse};
pub use profile::{
    LoadStatus, Notice, ProfileEvent, ProfileTarget, ProfileViewModel, RequestId, Section,
    Transition,
};
pub use session::{FileSessionStore, MemorySessionStore, Session, SessionStore};
pub use types::{Account, Attachment, FollowsKind, Relationship, Status};
