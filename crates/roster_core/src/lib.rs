//! Data-access core for the member/team roster.
//!
//! Entities, paging primitives, repositories over SQLite and the use-case
//! service built on them. Callers own the connection and the unit of work;
//! see [`db::unit_of_work`].

pub mod db;
pub mod logging;
pub mod model;
pub mod paging;
pub mod repo;
pub mod service;

pub use logging::{default_log_level, init_logging, logging_status, LoggingError};
pub use model::member::{Member, MemberId, MemberValidationError, TeamRef};
pub use model::member_dto::MemberDto;
pub use model::team::{Team, TeamId, TeamValidationError};
pub use paging::{Direction, MemberProperty, Order, Page, PageRequest, PagingError, Slice, Sort};
pub use repo::member_command_repo::{MemberCommandRepository, SqliteMemberCommandRepository};
pub use repo::member_repo::{MemberRepository, SqliteMemberRepository};
pub use repo::team_repo::{SqliteTeamRepository, TeamRepository};
pub use repo::{RepoError, RepoResult};
pub use service::member_service::MemberService;

/// Returns the core crate version.
pub fn core_version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}
