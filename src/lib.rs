//! # crmdash (customer segmentation & campaign dashboard client)
//!
//! `crmdash` is the client core of a CRM dashboard. Identity, sessions and the
//! customer tables live in a hosted auth/database service (GoTrue + PostgREST);
//! segmentation and campaign delivery live in a separate analytics backend.
//! This crate owns what sits between them and the user.
//!
//! ## Authentication
//!
//! [`auth::AuthContext`] is the injectable provider: it owns a
//! [`session::SessionStore`], an [`auth::AuthClient`] and the listener
//! subscription that keeps the store in sync with auth-state events. Every
//! operation validates its input locally first and returns a structured
//! [`auth::AuthError`]; remote error payloads are classified once, in the
//! GoTrue adapter.
//!
//! ## Routing
//!
//! [`guard::RouteGuard`] turns store snapshots into one of four states
//! (loading, unauthenticated, unverified, verified). A session whose email is
//! not confirmed never reaches protected content; it gets the verification
//! interstitial instead.
//!
//! ## Uploads
//!
//! [`upload::UploadSession`] rejects non-CSV files before extraction, partitions
//! extracted rows into valid and invalid, and keeps an immutable
//! [`upload::UploadValidationReport`] until a new file is chosen.
//!
//! ## Campaigns
//!
//! [`campaign::launch`] validates the form, logs the campaign with the
//! analytics backend and then triggers its delivery workflow through the
//! backend proxy. Backend calls carry no user token.
//!
//! The `crmdash` binary ([`cli`]) drives all of the above from the terminal;
//! commands that touch backend data go through the route guard first.

pub mod api;
pub mod auth;
pub mod campaign;
pub mod cli;
pub mod guard;
pub mod otp;
pub mod routes;
pub mod scope;
pub mod session;
pub mod upload;

#[allow(clippy::doc_markdown, clippy::needless_raw_string_hashes)]
pub mod built_info {
    include!(concat!(env!("OUT_DIR"), "/built.rs"));
}

pub const GIT_COMMIT_HASH: &str = match built_info::GIT_COMMIT_HASH {
    Some(hash) => hash,
    None => "unknown",
};

pub const APP_USER_AGENT: &str = concat!(env!("CARGO_PKG_NAME"), "/", env!("CARGO_PKG_VERSION"),);
