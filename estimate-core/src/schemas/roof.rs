use rust_decimal_macros::dec;

use super::EstimateSchema;
use crate::models::{CostField, EstimateKind, LineItem};

pub(super) fn schema() -> EstimateSchema {
    let items = vec![
        LineItem::new("Брус 40x140x6000", "шт", dec!(15), dec!(3800), dec!(57000)),
        LineItem::new(
            "Брус 25x100x6000 (Для обрешетки)",
            "шт",
            dec!(15),
            dec!(1700),
            dec!(25500),
        ),
        LineItem::new(
            "Металлочерепица глянец (Сырье Россия) (Форм СуперМонтеррей толщ. 0,45мм)",
            "м2",
            dec!(0),
            dec!(3006),
            dec!(0),
        ),
        LineItem::new(
            "Паро. пленка (Под обрешетку) и (Для обшивки потолок 2эт.)",
            "рул",
            dec!(0),
            dec!(7000),
            dec!(0),
        ),
        LineItem::new(
            "Конек бочкообразный (Для металлочерепицы двухметровый)",
            "шт",
            dec!(0),
            dec!(2970),
            dec!(0),
        ),
        LineItem::new(
            "Заглушка конусная (Для бочкообразного конька)",
            "шт",
            dec!(0),
            dec!(2200),
            dec!(0),
        ),
        LineItem::new(
            "Тройник (Для стыков бочкообразных коньков)",
            "шт",
            dec!(0),
            dec!(2680),
            dec!(0),
        ),
        LineItem::new(
            "Ендова внешняя 80x80мм (Для металлочерепицы двухметровая)",
            "шт",
            dec!(0),
            dec!(2754),
            dec!(0),
        ),
        LineItem::new(
            "Ендова внутренняя 600x600мм (Под металлочереп 600x600 двухметровая)",
            "шт",
            dec!(0),
            dec!(11166),
            dec!(0),
        ),
        LineItem::new(
            "Планка примыкания к стене 150x150мм (В местах примык. мет. чер. к стене)",
            "шт",
            dec!(0),
            dec!(2816),
            dec!(0),
        ),
        LineItem::new(
            "Пенополистирол Толщ 150мм (Для Утепления пот. 2-го эт)",
            "лист",
            dec!(0),
            dec!(8640),
            dec!(0),
        ),
        LineItem::new("Гвозди 120", "кг", dec!(2), dec!(700), dec!(1575)),
        LineItem::new(
            "Гвозди 70 (Для монтажа обрешетки)",
            "кг",
            dec!(2),
            dec!(700),
            dec!(1743),
        ),
        LineItem::new(
            "Шурупы 4 (Для монтажа металлочерепицы)",
            "пач",
            dec!(0),
            dec!(1800),
            dec!(0),
        ),
        LineItem::new("Пена монтажная 70л", "шт", dec!(0), dec!(3700), dec!(0)),
        LineItem::new(
            "Скобы (Для крепления паро пленки)",
            "пач",
            dec!(0),
            dec!(400),
            dec!(0),
        ),
        LineItem::new("Шурупы 4 крупная резьба", "пач", dec!(0), dec!(700), dec!(280)),
        LineItem::new(
            "OSB 9мм (Для фронтона. Только для двух или односкатных крыш)",
            "лист",
            dec!(2),
            dec!(5300),
            dec!(10600),
        ),
    ];

    EstimateSchema {
        kind: EstimateKind::Roof,
        items,
        synced_products: vec![
            "Брус 40x140x6000",
            "Брус 25x100x6000 (Для обрешетки)",
            "Металлочерепица глянец (Сырье Россия) (Форм СуперМонтеррей толщ. 0,45мм)",
            "Паро. пленка (Под обрешетку) и (Для обшивки потолок 2эт.)",
            "Конек бочкообразный (Для металлочерепицы двухметровый)",
            "Заглушка конусная (Для бочкообразного конька)",
            "Тройник (Для стыков бочкообразных коньков)",
            "Ендова внешняя 80x80мм (Для металлочерепицы двухметровая)",
            "Ендова внутренняя 600x600мм (Под металлочереп 600x600 двухметровая)",
            "Планка примыкания к стене 150x150мм (В местах примык. мет. чер. к стене)",
            "Пенополистирол Толщ 150мм (Для Утепления пот. 2-го эт)",
            "Гвозди 70 (Для монтажа обрешетки)",
            "Шурупы 4 (Для монтажа металлочерепицы)",
            "Пена монтажная 70л",
            "Скобы (Для крепления паро пленки)",
            "OSB 9мм (Для фронтона. Только для двух или односкатных крыш)",
        ],
        extra_costs: vec![
            (CostField::RoofWork, dec!(0)),
            (CostField::Delivery, dec!(60000)),
        ],
    }
}
