pub mod amortization;
pub mod distributions;
