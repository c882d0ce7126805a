pub mod leave;
pub mod role;
pub mod staff_leave;
pub mod user;
