//! `SeaORM` entities for the task manager schema.

pub mod task;
