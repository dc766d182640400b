use rust_decimal_macros::dec;

use super::EstimateSchema;
use crate::models::{CostField, EstimateKind, LineItem};

pub(super) fn schema() -> EstimateSchema {
    let items = vec![
        LineItem::new(
            "Гипсокартон 12,5мм стеновой (Для межкомнатных перегородок) пр-ва Knauf",
            "лист",
            dec!(10),
            dec!(2700),
            dec!(26100),
        ),
        LineItem::new(
            "Гипсокартон 12,5мм влагостойкий стеновой (Для межком перег) пр-ва Knauf",
            "лист",
            dec!(12),
            dec!(3000),
            dec!(35000),
        ),
        LineItem::new(
            "Профиль для перегородок 75x50x3000 пр-ва Stynergy",
            "шт",
            dec!(850),
            dec!(1700),
            dec!(1445000),
        ),
        LineItem::new(
            "Направляющие для перегородочного проф. 75x40x3000 пр-ва Stynergy",
            "шт",
            dec!(11),
            dec!(1500),
            dec!(16000),
        ),
        LineItem::new(
            "Мин вата Экотерм (Для заполнения меж-комнатных перегородок) (1рул-12м2)",
            "рул",
            dec!(3),
            dec!(6000),
            dec!(19333),
        ),
        LineItem::new(
            "Шурупы 3 мелкая резьба (Для монтажа гипсокартона к профилям) 1п на 5 лис",
            "пач",
            dec!(2),
            dec!(700),
            dec!(1353),
        ),
        LineItem::new(
            "Шурупы семечки (Для монтажа профилей межкомнатных перегородок)",
            "пач",
            dec!(1),
            dec!(700),
            dec!(700),
        ),
        LineItem::new("Вывоз мусора", "", dec!(0), dec!(0), dec!(20000)),
    ];

    EstimateSchema {
        kind: EstimateKind::Partition,
        items,
        synced_products: vec![
            "Гипсокартон 12,5мм стеновой (Для межкомнатных перегородок) пр-ва Knauf",
            "Гипсокартон 12,5мм влагостойкий стеновой (Для межком перег) пр-ва Knauf",
            "Профиль для перегородок 75x50x3000 пр-ва Stynergy",
            "Направляющие для перегородочного проф. 75x40x3000 пр-ва Stynergy",
            "Мин вата Экотерм (Для заполнения меж-комнатных перегородок) (1рул-12м2)",
            "Шурупы 3 мелкая резьба (Для монтажа гипсокартона к профилям) 1п на 5 лис",
            "Шурупы семечки (Для монтажа профилей межкомнатных перегородок)",
        ],
        extra_costs: vec![
            (CostField::Installation, dec!(0)),
            (CostField::Delivery, dec!(30000)),
        ],
    }
}
