pub mod checkout;
pub mod mail;
pub mod pipeline;
pub mod report;
pub mod search;
pub mod source;
