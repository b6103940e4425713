use sea_orm::entity::prelude::*;

#[derive(Clone, Debug, PartialEq, DeriveEntityModel)]
#[sea_orm(table_name = "products")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: i64,
    /// Catalog number. Free text, required.
    pub product_no: String,
    pub cn_name: Option<String>,
    pub product_spec: Option<String>,
    /// Kept as a string to preserve tiered formats like
    /// "50UL|1300,100UL|2300". Never interpreted numerically.
    pub price: Option<String>,
    pub type_id: i64,
    /// Only present when the referenced product type has has_details = true.
    pub details: Option<Json>,
    pub created_at: i64,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}
