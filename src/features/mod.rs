pub mod ad_filter;
pub mod antibot;
pub mod launch;
pub mod search;
