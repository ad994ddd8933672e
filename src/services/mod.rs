pub mod agencies;
pub mod contracts;
pub mod dashboard;
pub mod inventory;
pub mod reports;
pub mod sales_reps;
