//! Command handlers grouped by concern.

pub(crate) mod date;
pub(crate) mod release;
