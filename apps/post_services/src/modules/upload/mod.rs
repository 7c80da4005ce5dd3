pub mod handler;
pub mod multipart;
pub mod storage;
