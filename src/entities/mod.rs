pub mod bom;
pub mod bom_input;
pub mod bom_output;
pub mod product;
pub mod product_bom;
pub mod product_packaging;
pub mod product_template;
pub mod product_variety;
pub mod production_template;
pub mod production_template_input;
pub mod stock_location;
pub mod stock_move;
pub mod uom;
