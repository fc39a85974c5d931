pub(crate) mod common;
mod admin;
