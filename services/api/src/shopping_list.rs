//! Shopping-list aggregation
//!
//! Every ingredient line of every recipe in a cart is grouped by
//! (ingredient name, measurement unit) and the amounts in a group are
//! summed. Groups come out ordered by name, byte-wise, so upper-case names
//! sort before lower-case ones.

use sqlx::FromRow;
use std::collections::BTreeMap;

/// Download file name for the rendered list
pub const FILE_NAME: &str = "shopping_cart.txt";

/// One ingredient line of one recipe in the cart
#[derive(Debug, Clone, PartialEq, Eq, FromRow)]
pub struct CartIngredientRow {
    pub name: String,
    pub measurement_unit: String,
    pub amount: i32,
}

/// Total amount of one ingredient across the cart
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ShoppingListItem {
    pub name: String,
    pub measurement_unit: String,
    pub total: i64,
}

/// Group rows by (name, unit) and sum their amounts
pub fn aggregate<I>(rows: I) -> Vec<ShoppingListItem>
where
    I: IntoIterator<Item = CartIngredientRow>,
{
    let mut totals: BTreeMap<(String, String), i64> = BTreeMap::new();
    for row in rows {
        *totals.entry((row.name, row.measurement_unit)).or_insert(0) += i64::from(row.amount);
    }

    totals
        .into_iter()
        .map(|((name, measurement_unit), total)| ShoppingListItem {
            name,
            measurement_unit,
            total,
        })
        .collect()
}

/// Render the list as plain text, one CRLF-terminated line per item
pub fn render(items: &[ShoppingListItem]) -> String {
    items
        .iter()
        .map(|item| {
            format!(
                "{} ({}) — {}\r\n",
                item.name, item.measurement_unit, item.total
            )
        })
        .collect()
}
