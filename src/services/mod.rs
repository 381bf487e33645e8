pub mod activity_log;
pub mod expenses;
pub mod loss_analysis;
pub mod orders;
pub mod purchases;
pub mod reports;
pub mod returns;
pub mod stock;
