mod common;
mod processing;
mod service;
