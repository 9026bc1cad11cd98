mod diagnostics;
mod follows;
mod notifications;
mod roles;

pub use diagnostics::{DiagnosticEvent, Diagnostics};
pub use follows::FollowRepository;
pub use notifications::{Notice, NoticeKind, UserNotifier};
pub use roles::RoleAssignmentRepository;
