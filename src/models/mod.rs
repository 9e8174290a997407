pub mod comment;
pub mod project;
pub mod task;
pub mod user;

pub use comment::{Comment, CommentInput};
pub use project::{Project, ProjectInput, TeamMember, TeamMemberInput};
pub use task::{
    PriorityLevel, SortField, SortOrder, Task, TaskInput, TaskQuery, TaskSort, TaskStatus,
    TaskStatusInput, TaskStatusSummary,
};
pub use user::{Profile, ProfileInput, User, UserInput};
