//! Back office for the RCD accessible parking permit program: permit applications,
//! permit holders, physicians, staff accounts and reports, served over GraphQL.

pub mod config;
pub mod error;
pub mod graphql;
pub mod pagination;
pub mod storage;
pub mod telemetry;
pub mod workflows;
