pub mod db;
pub mod minio;
pub mod redis;
