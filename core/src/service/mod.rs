pub mod reminder;
pub mod resolver;
pub mod task_service;
