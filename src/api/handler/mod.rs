mod caption;
mod feed;
mod gamification;
mod points;
mod publish;
mod qr;
mod review;
mod tracker;


pub use caption::*;
pub use feed::*;
pub use gamification::*;
pub use points::*;
pub use publish::*;
pub use qr::*;
pub use review::*;
pub use tracker::*;
