mod task;

pub use task::{Priority, Task, TaskStatus, UNASSIGNED};

pub(crate) use task::canonical_token;
