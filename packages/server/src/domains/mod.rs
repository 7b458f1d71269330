// Business domains
pub mod registrants;
