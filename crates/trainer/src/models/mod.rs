pub mod linear;
#[cfg(feature = "torch")]
pub mod torch;

pub use linear::LinearRegression;
#[cfg(feature = "torch")]
pub use torch::TchModel;
