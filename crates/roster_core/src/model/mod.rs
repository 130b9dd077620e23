//! Domain model for the member/team roster.
//!
//! # Responsibility
//! - Define the persistent entities (`Member`, `Team`) and their identities.
//! - Define non-persistent read shapes (`MemberDto`).
//!
//! # Invariants
//! - Identities are assigned by the store on first save and never change.
//! - Entity equality is identity-based; transient entities compare unequal.
//! - The member -> team association is owned by `Member`; the inverse side is
//!   a repository query, so the object graph stays acyclic.

pub mod member;
pub mod member_dto;
pub mod team;
