pub mod crop;
pub mod observation;
pub mod recommendation;
pub mod series;

pub use crop::*;
pub use observation::*;
pub use recommendation::*;
pub use series::*;
