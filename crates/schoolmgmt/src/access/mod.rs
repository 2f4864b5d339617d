//! Role-based visibility and write authorization.

pub mod policy;
pub mod resolve;
pub mod role;
pub mod scope;

pub use policy::{
    can_write, filter_visible, read_rule, write_rule, ReadRule, Visibility, WriteAction,
    WriteRule,
};
pub use resolve::{authenticate, ScopeResolver};
pub use role::{Actor, Principal, Role};
pub use scope::{Ownable, Ownership, ResourceKind, Scope};
