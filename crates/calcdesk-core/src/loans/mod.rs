pub mod affordability;
pub mod amortization;
pub mod mortgage;
