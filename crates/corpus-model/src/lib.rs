pub mod locale;
pub mod transcript;
pub mod wiki;

pub use locale::*;
pub use transcript::*;
pub use wiki::*;
