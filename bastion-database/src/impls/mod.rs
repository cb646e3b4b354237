pub mod exemptions;
mod policy_source;
pub mod protections;
