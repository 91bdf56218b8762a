//! Business logic and collaborator traits for Brandmind.
//!
//! This crate defines the "ports" (embedding model, similarity search and
//! repository traits) that the infrastructure layer implements, and the
//! services built on them. It depends only on `brandmind-types` -- never on
//! `brandmind-infra` or any database/IO crate.

pub mod brand;
pub mod cache;
pub mod embedding;
pub mod event;
pub mod learning;
pub mod retrieval;
pub mod storage;

#[cfg(test)]
mod scenarios;
#[cfg(test)]
pub(crate) mod test_support;
