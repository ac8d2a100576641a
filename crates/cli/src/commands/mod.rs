pub mod check;
pub mod delete;
pub mod upload;
pub mod url;
