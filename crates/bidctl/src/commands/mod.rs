pub mod distance;
pub mod evaluate;
pub mod init;
