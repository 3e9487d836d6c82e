//! GitLab gateway for tagvault.
//!
//! Thin, swappable client abstraction over the GitLab REST API:
//!
//! - [`GitLabGateway`] — the contract the intake pipeline and the
//!   processing worker depend on (project/tag/archive retrieval, webhook
//!   install/remove).
//! - [`GitLabClient`] — reqwest implementation, constructed per task
//!   with an explicit token.
//! - [`TokenStore`] — access-token lookup contract backed by the
//!   external account layer.

pub mod client;
pub mod token;
pub mod types;

pub use client::{
    ArchiveStream, GatewayFactory, GitLabClient, GitLabConfig, GitLabError, GitLabGateway,
    TokenGatewayFactory,
};
pub use token::{StaticTokenStore, TokenError, TokenStore};
