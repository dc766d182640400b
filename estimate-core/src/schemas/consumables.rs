use rust_decimal_macros::dec;

use super::EstimateSchema;
use crate::models::{EstimateKind, LineItem};

pub(super) fn schema() -> EstimateSchema {
    let items = vec![
        LineItem::new("Нить строительная", "шт", dec!(1), dec!(300), dec!(300)),
        LineItem::new("Леска строительная", "шт", dec!(1), dec!(300), dec!(300)),
        LineItem::new(
            "Анкера 12x150 (Для крепления обвязки к фундаменту)",
            "шт",
            dec!(89.5),
            dec!(220),
            dec!(19690),
        ),
        LineItem::new(
            "Шурупы 3 крупная резьба (Для монтажа гипсокар к сип) 1 п на 5 лис",
            "пач",
            dec!(0),
            dec!(700),
            dec!(0),
        ),
        LineItem::new(
            "Металлические Скобы (Для монтажа стропил)",
            "шт",
            dec!(100),
            dec!(80),
            dec!(8000),
        ),
        LineItem::new(
            "Насадка 8 на шуруповерт (Для шурупов по металлочерепицы)",
            "шт",
            dec!(1),
            dec!(300),
            dec!(300),
        ),
        LineItem::new("Мешки мусорные", "шт", dec!(10), dec!(70), dec!(700)),
        LineItem::new(
            "Насадки крестовые на шуруповерт пр-ва ЗУБР",
            "шт",
            dec!(5),
            dec!(400),
            dec!(2000),
        ),
        LineItem::new("Диски 150мм Rodex на болгарку", "шт", dec!(5), dec!(400), dec!(2000)),
        LineItem::new("Пистолет для пены", "шт", dec!(1), dec!(3000), dec!(3000)),
        LineItem::new("Карандаши", "шт", dec!(5), dec!(100), dec!(500)),
        LineItem::new("Лезвия для строительного ножа", "шт", dec!(2), dec!(300), dec!(600)),
        LineItem::new("Перчатки", "шт", dec!(12), dec!(300), dec!(3600)),
        LineItem::new("Пленка от дождя самая плотная", "метр", dec!(7), dec!(400), dec!(2800)),
        LineItem::new("Диск на пчелку 180 по дереву", "шт", dec!(1), dec!(2000), dec!(2000)),
        LineItem::new("Силикон (Для вентиляции)", "шт", dec!(1), dec!(2500), dec!(2500)),
        LineItem::new("Скотч (Для монтажа биопленки)", "шт", dec!(1), dec!(500), dec!(500)),
        LineItem::new(
            "Разное + Износ инструмента + ЗП сотрудникам",
            "",
            dec!(0),
            dec!(0),
            dec!(470000),
        ),
    ];

    EstimateSchema {
        kind: EstimateKind::Consumables,
        items,
        synced_products: vec![
            "Нить строительная",
            "Леска строительная",
            "Анкера 12x150 (Для крепления обвязки к фундаменту)",
            "Шурупы 3 крупная резьба (Для монтажа гипсокар к сип) 1 п на 5 лис",
            "Металлические Скобы (Для монтажа стропил)",
            "Насадка 8 на шуруповерт (Для шурупов по металлочерепицы)",
            "Мешки мусорные",
            "Насадки крестовые на шуруповерт пр-ва ЗУБР",
            "Диски 150мм Rodex на болгарку",
            "Пистолет для пены",
            "Карандаши",
            "Лезвия для строительного ножа",
            "Перчатки",
            "Пленка от дождя самая плотная",
            "Диск на пчелку 180 по дереву",
            "Силикон (Для вентиляции)",
            "Скотч (Для монтажа биопленки)",
        ],
        extra_costs: Vec::new(),
    }
}
