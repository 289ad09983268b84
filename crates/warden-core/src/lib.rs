//! Warden Core - the admin-permission gate behind the Warden moderation bot.
//!
//! Nothing here talks to Telegram directly. The chat platform is reached
//! through two seams, [`MembershipService`] for lookups and [`Responder`]
//! for replies, so the whole decision path can be exercised in-process.
//!
//! - **capability**: Fixed vocabulary of administrative permissions
//! - **membership**: Member records and the lookup seam
//! - **cache**: Per-chat admin list with a one hour lifetime
//! - **resolver**: Capability resolution and cached admin lists
//! - **gate**: Authorization pipeline, refusal feedback and fault containment
//! - **locale** / **language**: Built-in strings and per-chat language choice
//! - **cooldown**: Per-user command rate limiting
//! - **warns**: Warning counts with a ban at the limit
//! - **moderation**: Purge ranges, durations and target checks
//! - **config**: Environment-driven settings
//!
//! # Example
//!
//! ```no_run
//! use std::sync::Arc;
//! use warden_core::{
//!     AdminCache, AuthorizationGate, Capability, Catalog, GatePolicy, LanguageStore,
//!     MembershipService, PermissionResolver, Request, Responder,
//! };
//!
//! async fn run(
//!     membership: Arc<dyn MembershipService>,
//!     responder: Arc<dyn Responder>,
//!     request: Request,
//! ) {
//!     let resolver = Arc::new(PermissionResolver::new(membership, Arc::new(AdminCache::new())));
//!     let languages = Arc::new(LanguageStore::new("en-US", vec!["en-US".to_string()]));
//!     let gate = AuthorizationGate::new(resolver, responder, Arc::new(Catalog::builtin()), languages);
//!
//!     let policy = GatePolicy::require(Capability::RestrictMembers);
//!     gate.guard(&request, &policy, || async {
//!         // ban the target here
//!         Ok::<(), warden_core::WardenError>(())
//!     })
//!     .await;
//! }
//! ```

pub mod cache;
pub mod capability;
pub mod clock;
pub mod config;
pub mod cooldown;
pub mod error;
pub mod gate;
pub mod language;
pub mod locale;
pub mod membership;
pub mod moderation;
pub mod request;
pub mod resolver;
pub mod warns;

#[cfg(any(test, feature = "test-support"))]
pub mod mocks;

pub use cache::{AdminCache, AdminCacheEntry, DEFAULT_ADMIN_CACHE_TTL_SECS};
pub use capability::{join_names, Capability, PermissionSet, PrivilegeFlags};
pub use clock::{Clock, SystemClock};
pub use config::BotConfig;
pub use cooldown::{Cooldown, CooldownVerdict, DEFAULT_COOLDOWN_SECS};
pub use error::{Result, WardenError};
pub use gate::{
    AuthStage, AuthorizationDecision, AuthorizationGate, GatePolicy, GuardOutcome, PrivilegedIds,
    Verdict,
};
pub use language::LanguageStore;
pub use locale::{Catalog, Language, Localizer, DEFAULT_LANGUAGE};
pub use membership::{ChatMember, MemberStatus, MembershipChange, MembershipService};
pub use moderation::{check_target, parse_duration, purge_batches, purge_end, TargetRefusal};
pub use request::{CallbackRequest, ChatKind, ChatRef, MessageRequest, Request, Responder};
pub use resolver::{capabilities_of, PermissionResolver};
pub use warns::{WarnOutcome, WarnStore, MAX_WARNS};

#[cfg(any(test, feature = "test-support"))]
pub use clock::ManualClock;
