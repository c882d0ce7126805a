pub mod leaves;
pub mod roles;
pub mod users;
