//! `SeaORM` entities, one module per table.

pub mod column;
pub mod comment;
pub mod project;
pub mod task;
