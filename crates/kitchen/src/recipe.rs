//! Recipe boundary: what the kitchen needs to know about menu items.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use galley_core::RecipeId;

use crate::order::Order;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Ingredient {
    /// Matched against inventory item names, case-insensitively.
    pub name: String,
    /// Amount per portion, in the inventory item's unit.
    pub quantity: Decimal,
    pub unit: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Recipe {
    pub id: RecipeId,
    pub name: String,
    pub price: Decimal,
    pub is_active: bool,
    pub ingredients: Vec<Ingredient>,
}

/// Read-only recipe lookup used by order placement and stock deduction.
pub trait RecipeCatalog: Send + Sync {
    fn recipe(&self, id: RecipeId) -> Option<Recipe>;
}

/// Ingredient quantity one order consumes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IngredientDemand {
    pub recipe_id: RecipeId,
    pub ingredient: String,
    /// Ingredient quantity multiplied by the order line quantity.
    pub quantity: Decimal,
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct DeductionPlan {
    pub demands: Vec<IngredientDemand>,
    /// Lines whose recipe no longer exists in the catalog.
    pub missing_recipes: Vec<RecipeId>,
}

/// Expand an order into per-ingredient demands, one per ingredient per line.
pub fn plan_deduction(order: &Order, catalog: &dyn RecipeCatalog) -> DeductionPlan {
    let mut plan = DeductionPlan::default();
    for line in order.items() {
        let Some(recipe) = catalog.recipe(line.recipe_id) else {
            plan.missing_recipes.push(line.recipe_id);
            continue;
        };
        for ingredient in &recipe.ingredients {
            if ingredient.quantity <= Decimal::ZERO {
                continue;
            }
            plan.demands.push(IngredientDemand {
                recipe_id: recipe.id,
                ingredient: ingredient.name.clone(),
                quantity: ingredient.quantity * Decimal::from(line.quantity),
            });
        }
    }
    plan
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::notes::OrderNotes;
    use crate::order::{NewOrder, NewOrderLine, OrderLine, OrderType};
    use crate::pricing::OrderTotals;
    use galley_core::OrderId;
    use chrono::Utc;
    use rust_decimal_macros::dec;
    use std::collections::HashMap;

    struct Menu(HashMap<RecipeId, Recipe>);

    impl RecipeCatalog for Menu {
        fn recipe(&self, id: RecipeId) -> Option<Recipe> {
            self.0.get(&id).cloned()
        }
    }

    #[test]
    fn demands_scale_with_line_quantity_and_missing_recipes_are_listed() {
        let burger = Recipe {
            id: RecipeId::new(),
            name: "Burger".to_string(),
            price: dec!(11),
            is_active: true,
            ingredients: vec![
                Ingredient {
                    name: "Beef Patty".to_string(),
                    quantity: dec!(1),
                    unit: None,
                },
                Ingredient {
                    name: "cheddar".to_string(),
                    quantity: dec!(0.05),
                    unit: Some("kg".to_string()),
                },
            ],
        };
        let ghost = RecipeId::new();
        let menu = Menu(HashMap::from([(burger.id, burger.clone())]));

        let items = vec![
            OrderLine {
                recipe_id: burger.id,
                name: burger.name.clone(),
                quantity: 3,
                unit_price: burger.price,
            },
            OrderLine {
                recipe_id: ghost,
                name: "gone".to_string(),
                quantity: 1,
                unit_price: dec!(1),
            },
        ];
        let cmd = NewOrder {
            order_type: OrderType::Takeaway,
            table_number: None,
            items: items
                .iter()
                .map(|l| NewOrderLine {
                    recipe_id: l.recipe_id,
                    quantity: l.quantity,
                })
                .collect(),
            notes: OrderNotes::default(),
            customer_name: None,
        };
        let order =
            Order::place(OrderId::new(), &cmd, items, OrderTotals::default(), Utc::now()).unwrap();

        let plan = plan_deduction(&order, &menu);
        assert_eq!(plan.demands.len(), 2);
        assert_eq!(plan.demands[0].quantity, dec!(3));
        assert_eq!(plan.demands[1].quantity, dec!(0.15));
        assert_eq!(plan.missing_recipes, vec![ghost]);
    }
}
