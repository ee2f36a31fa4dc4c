pub mod drag;
pub mod export;
pub mod task_ops;
pub mod view;
