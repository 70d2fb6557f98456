pub mod asset;
pub mod error;
pub mod memory;
pub mod request;
pub mod signature;
pub mod traits;

pub mod prelude {
    pub use super::asset::*;
    pub use super::error::*;
    pub use super::memory::*;
    pub use super::request::*;
    pub use super::signature::*;
    pub use super::traits::*;
}
