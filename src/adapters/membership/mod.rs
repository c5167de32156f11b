//! Membership adapters - implementations of the `MembershipChecker` port.
//!
//! - `HistoryMembershipChecker` - answers from the history store's group members

mod history_membership_checker;

pub use history_membership_checker::HistoryMembershipChecker;
