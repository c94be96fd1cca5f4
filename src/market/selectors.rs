//! CSS selectors for each source's page shapes.
//!
//! Update the relevant module when a site changes its markup; nothing else
//! should need to move.

use scraper::Selector;
use std::sync::LazyLock;

pub mod keydrop {
    use super::*;

    /// Price table rows (present once the product table hydrated).
    pub static ROW: LazyLock<Selector> = LazyLock::new(|| Selector::parse("tr").unwrap());

    pub static CELL: LazyLock<Selector> = LazyLock::new(|| Selector::parse("td").unwrap());

    /// Sticker product pages render a single table with its own class.
    pub static STICKER_TABLE: LazyLock<Selector> =
        LazyLock::new(|| Selector::parse("table.grid").unwrap());

    /// Sticker page heading carrying the item name.
    pub static STICKER_TITLE: LazyLock<Selector> =
        LazyLock::new(|| Selector::parse("h2.text-xl").unwrap());
}

pub mod farmskins {
    use super::*;

    pub static ROW: LazyLock<Selector> = LazyLock::new(|| {
        Selector::parse(
            "div.item-statistics__row.item-statistics__padding.item-statistics__table",
        )
        .unwrap()
    });

    pub static COL: LazyLock<Selector> =
        LazyLock::new(|| Selector::parse("span.item-statistics__col").unwrap());

    pub static STICKER_SPAN: LazyLock<Selector> = LazyLock::new(|| {
        Selector::parse("span.item-statistics__col.item-statistics__span").unwrap()
    });

    pub static READY: LazyLock<Selector> =
        LazyLock::new(|| Selector::parse(".item-statistics__row").unwrap());
}

pub mod skinclub {
    use super::*;

    pub static CONTAINER: LazyLock<Selector> =
        LazyLock::new(|| Selector::parse(".bg-brand-700.rounded-lg").unwrap());

    /// One row per wear tier in the variant list.
    pub static ROW: LazyLock<Selector> =
        LazyLock::new(|| Selector::parse("div.flex.cursor-pointer").unwrap());

    pub static TIER_LABEL: LazyLock<Selector> =
        LazyLock::new(|| Selector::parse(".truncate.flex-1").unwrap());

    pub static PRICE: LazyLock<Selector> =
        LazyLock::new(|| Selector::parse(".truncate.text-primary-green-900.shrink-0").unwrap());

    pub static STATTRAK_PRICE: LazyLock<Selector> =
        LazyLock::new(|| Selector::parse(".truncate.text-rarity-stattrak.shrink-0").unwrap());

    pub static STICKER_PRICE: LazyLock<Selector> =
        LazyLock::new(|| Selector::parse("div.flex.items-center span.block.text-brand-300").unwrap());
}

pub mod casedrop {
    use super::*;

    pub static LIST: LazyLock<Selector> =
        LazyLock::new(|| Selector::parse(".shop_items_list").unwrap());

    pub static ITEM: LazyLock<Selector> =
        LazyLock::new(|| Selector::parse(".shop_items_list .item_container").unwrap());

    /// "NO ITEMS" placeholder shown for empty result sets.
    pub static EMPTY: LazyLock<Selector> =
        LazyLock::new(|| Selector::parse(".shop_items_list .itemEmpty").unwrap());

    pub static NAME: LazyLock<Selector> =
        LazyLock::new(|| Selector::parse(".info_name").unwrap());

    /// Badge present only on StatTrak listings.
    pub static TRACK_BADGE: LazyLock<Selector> =
        LazyLock::new(|| Selector::parse(".info_track").unwrap());

    pub static PRICE: LazyLock<Selector> =
        LazyLock::new(|| Selector::parse(".info_price").unwrap());
}

pub mod csgocases {
    use super::*;

    pub static ITEM: LazyLock<Selector> =
        LazyLock::new(|| Selector::parse(".item-content").unwrap());

    /// Item image; the alt text carries the full market name.
    pub static IMAGE: LazyLock<Selector> = LazyLock::new(|| Selector::parse("img").unwrap());

    pub static PRICE: LazyLock<Selector> =
        LazyLock::new(|| Selector::parse("span.resell-price-span").unwrap());
}

pub mod ggdrop {
    use super::*;

    // Class names are build-hashed ("item_price__aCda4"), so match on the
    // stable prefix.
    pub static ITEM: LazyLock<Selector> =
        LazyLock::new(|| Selector::parse("[class*='item_item__']").unwrap());

    pub static NAME: LazyLock<Selector> =
        LazyLock::new(|| Selector::parse("[class*='item_name__']").unwrap());

    pub static PRICE: LazyLock<Selector> =
        LazyLock::new(|| Selector::parse("[class*='item_price__']").unwrap());
}

#[cfg(test)]
mod tests {
    use super::*;
    use scraper::Html;

    #[test]
    fn test_selectors_compile() {
        let _ = &*keydrop::ROW;
        let _ = &*keydrop::STICKER_TABLE;
        let _ = &*farmskins::ROW;
        let _ = &*skinclub::CONTAINER;
        let _ = &*casedrop::ITEM;
        let _ = &*csgocases::PRICE;
        let _ = &*ggdrop::PRICE;
    }

    #[test]
    fn test_hashed_class_prefix_matching() {
        let html = Html::parse_document(
            r#"<div class="item_item__x8V9i">
                <div class="item_name__bQ21c">AK-47 | Redline (Field-Tested)</div>
                <div class="item_price__aCda4">12,34 $</div>
            </div>"#,
        );

        let items: Vec<_> = html.select(&ggdrop::ITEM).collect();
        assert_eq!(items.len(), 1);
        assert!(items[0].select(&ggdrop::PRICE).next().is_some());
    }
}
