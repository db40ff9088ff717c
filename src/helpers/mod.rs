pub mod auth;
pub mod media;
pub mod multipart_parsing;
pub mod storage;
