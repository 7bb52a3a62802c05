//! 身份服务库
//! 用户注册、登录签发令牌、Bearer 令牌访问控制

pub mod auth;
pub mod config;
pub mod db;
pub mod error;
pub mod handlers;
pub mod middleware;
pub mod models;
pub mod repository;
pub mod routes;
pub mod services;
pub mod telemetry;
