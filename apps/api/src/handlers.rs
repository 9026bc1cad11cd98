pub mod follows;
pub mod health;
pub mod roles;
