pub mod problem;
pub mod quota;
pub mod settings;
pub mod twofactor;
