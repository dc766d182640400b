use rust_decimal_macros::dec;

use super::EstimateSchema;
use crate::models::{CostField, EstimateKind, LineItem};

pub(super) fn schema() -> EstimateSchema {
    let items = vec![
        LineItem::new(
            "Брус 40x190x6000 (Для перекрыт расстояние между балками 29см)",
            "шт",
            dec!(2),
            dec!(5800),
            dec!(11600),
        ),
        LineItem::new(
            "OSB 18 (Для перекрытия (пол второго этажа))",
            "лист",
            dec!(1),
            dec!(15500),
            dec!(15500),
        ),
        LineItem::new("Шурупы 4 крупная резьба", "пач", dec!(0), dec!(700), dec!(140)),
        LineItem::new("Гвозди 120", "кг", dec!(0), dec!(700), dec!(70)),
    ];

    EstimateSchema {
        kind: EstimateKind::Floor,
        items,
        synced_products: vec![
            "Брус 40x190x6000 (Для перекрыт расстояние между балками 29см)",
            "OSB 18 (Для перекрытия (пол второго этажа))",
            "Шурупы 4 крупная резьба",
            "Гвозди 120",
        ],
        extra_costs: vec![
            (CostField::Installation, dec!(0)),
            (CostField::Delivery, dec!(30000)),
        ],
    }
}
