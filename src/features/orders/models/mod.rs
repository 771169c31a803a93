mod order;

pub use order::{CoverType, Lamination, Order, OrderStatus, PageType};
