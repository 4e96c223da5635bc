pub use echo::echo;
pub use get::get;
pub use serve::serve;

mod echo;
mod get;
mod serve;
