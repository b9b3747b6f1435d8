pub mod http;
pub mod normalize;
pub mod output;
pub mod report;
pub mod ted;
pub mod wikipedia;

pub use http::{ApiClient, FetchError, RetryPolicy};
pub use report::{RunReport, UnitFailure};
