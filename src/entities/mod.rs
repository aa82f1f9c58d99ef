pub mod listing_link;
pub mod product;
pub mod product_variant;
pub mod stock_movement;
