mod cart_item;
mod order;

pub use cart_item::*;
pub use order::*;
