// src/crawler/extractor.rs
//
// Turns one search-results page into listings. A page holds several
// building blocks (`div.cassetteitem`); each block holds one table row per
// vacant room, and every room becomes its own listing.

use crate::domain::parsers::{
    extract_listing_id, parse_age, parse_area, parse_floor, parse_rent, parse_station,
    parse_walk_minutes, ParseError,
};
use crate::domain::Listing;
use once_cell::sync::Lazy;
use scraper::{ElementRef, Html, Selector};
use tracing::debug;
use url::Url;

fn selector(css: &str) -> Selector {
    Selector::parse(css).unwrap()
}

static BLOCK: Lazy<Selector> = Lazy::new(|| selector("div.cassetteitem"));
static TITLE: Lazy<Selector> = Lazy::new(|| selector("div.cassetteitem_content-title"));
static ADDRESS: Lazy<Selector> = Lazy::new(|| selector("li.cassetteitem_detail-col1"));
static ACCESS: Lazy<Selector> =
    Lazy::new(|| selector("li.cassetteitem_detail-col2 div.cassetteitem_detail-text"));
static BUILDING: Lazy<Selector> = Lazy::new(|| selector("li.cassetteitem_detail-col3 div"));
static ROOM_ROW: Lazy<Selector> = Lazy::new(|| selector("table.cassetteitem_other tbody tr"));
static CELL: Lazy<Selector> = Lazy::new(|| selector("td"));
static RENT: Lazy<Selector> = Lazy::new(|| selector("span.cassetteitem_price--rent"));
static ADMIN_FEE: Lazy<Selector> =
    Lazy::new(|| selector("span.cassetteitem_price--administration"));
static DEPOSIT: Lazy<Selector> = Lazy::new(|| selector("span.cassetteitem_price--deposit"));
static KEY_MONEY: Lazy<Selector> = Lazy::new(|| selector("span.cassetteitem_price--gratuity"));
static LAYOUT: Lazy<Selector> = Lazy::new(|| selector("span.cassetteitem_madori"));
static AREA: Lazy<Selector> = Lazy::new(|| selector("span.cassetteitem_menseki"));
static DETAIL_LINK: Lazy<Selector> = Lazy::new(|| selector("td a[href]"));
static PAGINATION_LINK: Lazy<Selector> =
    Lazy::new(|| selector("div.pagination a, p.pagination-parts a"));

const NEXT_PAGE_TEXT: &str = "次へ";
const DETAIL_PATH: &str = "/chintai/";

/// Fields shared by every room in a building block.
#[derive(Debug, Default)]
struct BuildingFields {
    name: String,
    address: String,
    age: u32,
    building_floors: String,
    walk_minutes: u32,
    nearest_station: String,
}

pub struct ListingExtractor {
    site_root: Url,
}

impl ListingExtractor {
    /// `site_root` resolves the relative detail links found in rows.
    pub fn new(site_root: Url) -> Self {
        Self { site_root }
    }

    pub fn extract(&self, document: &Html) -> Vec<Listing> {
        document
            .select(&BLOCK)
            .flat_map(|block| self.extract_block(block))
            .collect()
    }

    fn extract_block(&self, block: ElementRef<'_>) -> Vec<Listing> {
        let mut building = block.select(&BUILDING).map(text_of);
        let age_text = building.next().unwrap_or_default();
        let building_floors = building.next().unwrap_or_default();

        // Only the first transit option counts.
        let access = block.select(&ACCESS).next().map(text_of).unwrap_or_default();

        let shared = BuildingFields {
            name: first_text(block, &TITLE),
            address: first_text(block, &ADDRESS),
            age: zero_fill(parse_age(&age_text)),
            building_floors,
            walk_minutes: zero_fill(parse_walk_minutes(&access)),
            nearest_station: parse_station(&access),
        };

        block
            .select(&ROOM_ROW)
            .filter_map(|row| self.extract_room(row, &shared))
            .collect()
    }

    fn extract_room(&self, row: ElementRef<'_>, shared: &BuildingFields) -> Option<Listing> {
        // Rows can carry other /chintai/ links (surroundings, maps) besides
        // the detail link; the first one yielding an id is the detail link.
        let Some((href, id)) = row
            .select(&DETAIL_LINK)
            .filter_map(|a| a.value().attr("href"))
            .filter(|href| href.contains(DETAIL_PATH))
            .map(|href| (href, extract_listing_id(href)))
            .find(|(_, id)| !id.is_empty())
        else {
            debug!("dropping room row without listing id");
            return None;
        };

        let url = self
            .site_root
            .join(href)
            .map(String::from)
            .unwrap_or_else(|_| href.to_string());

        let floor_text = row.select(&CELL).nth(2).map(text_of).unwrap_or_default();
        let mut floor = zero_fill(parse_floor(&floor_text));
        if floor == 0 && !shared.building_floors.is_empty() {
            floor = zero_fill(parse_floor(&shared.building_floors));
        }

        Some(Listing {
            id,
            name: shared.name.clone(),
            address: shared.address.clone(),
            age: shared.age,
            floor,
            rent: zero_fill(parse_rent(&first_text(row, &RENT))),
            management_fee: zero_fill(parse_rent(&first_text(row, &ADMIN_FEE))),
            deposit: first_text(row, &DEPOSIT),
            key_money: first_text(row, &KEY_MONEY),
            layout: first_text(row, &LAYOUT),
            area: zero_fill(parse_area(&first_text(row, &AREA))),
            walk_minutes: shared.walk_minutes,
            url,
            nearest_station: shared.nearest_station.clone(),
        })
    }
}

/// Whether the page shows a 次へ (next) pagination link.
pub fn has_next_page(document: &Html) -> bool {
    document
        .select(&PAGINATION_LINK)
        .any(|a| a.text().any(|t| t.contains(NEXT_PAGE_TEXT)))
}

fn text_of(el: ElementRef<'_>) -> String {
    el.text().collect::<String>().trim().to_string()
}

fn first_text(parent: ElementRef<'_>, selector: &Selector) -> String {
    parent.select(selector).next().map(text_of).unwrap_or_default()
}

fn zero_fill<T: Default>(parsed: Result<T, ParseError>) -> T {
    parsed.unwrap_or_else(|e| {
        debug!(field = e.field, raw = %e.raw, "zero-filling unparseable field");
        T::default()
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tests::utils::{page_html, room, RoomFixture, SAMPLE_PAGE};

    fn extractor() -> ListingExtractor {
        ListingExtractor::new(Url::parse("https://suumo.jp").unwrap())
    }

    #[test]
    fn extracts_every_room_of_every_block() {
        let doc = Html::parse_document(SAMPLE_PAGE);
        let listings = extractor().extract(&doc);

        assert_eq!(listings.len(), 3);

        let first = &listings[0];
        assert_eq!(first.id, "jnc_000102396492");
        assert_eq!(first.name, "テストマンション");
        assert_eq!(first.address, "東京都渋谷区渋谷1-1-1");
        assert_eq!(first.age, 5);
        assert_eq!(first.floor, 3);
        assert_eq!(first.rent, 79_000.0);
        assert_eq!(first.management_fee, 5_000.0);
        assert_eq!(first.deposit, "1ヶ月");
        assert_eq!(first.key_money, "1ヶ月");
        assert_eq!(first.layout, "1K");
        assert_eq!(first.area, 25.5);
        assert_eq!(first.walk_minutes, 8);
        assert_eq!(first.nearest_station, "新井薬師前駅");
        assert_eq!(first.url, "https://suumo.jp/chintai/jnc_000102396492/");

        let second = &listings[1];
        assert_eq!(second.deposit, "-");
        assert_eq!(second.floor, 2);

        let third = &listings[2];
        assert_eq!(third.name, "テストアパート");
        assert_eq!(third.age, 0);
        assert_eq!(third.rent, 100_000.0);
        assert_eq!(third.management_fee, 0.0);
        assert_eq!(third.nearest_station, "新宿駅");
        assert_eq!(third.walk_minutes, 5);
    }

    #[test]
    fn first_station_wins() {
        let doc = Html::parse_document(SAMPLE_PAGE);
        let listings = extractor().extract(&doc);

        // The block also lists 沼袋駅 歩10分 as a second option.
        assert!(listings[..2]
            .iter()
            .all(|l| l.nearest_station == "新井薬師前駅" && l.walk_minutes == 8));
    }

    #[test]
    fn row_without_id_is_dropped() {
        let html = page_html(
            &[vec![
                room("jnc_1", "2階", "7万円"),
                RoomFixture {
                    href: "/chintai/bc_999/".into(),
                    ..room("", "3階", "8万円")
                },
            ]],
            false,
        );

        let listings = extractor().extract(&Html::parse_document(&html));

        assert_eq!(listings.len(), 1);
        assert_eq!(listings[0].id, "jnc_1");
    }

    #[test]
    fn detail_link_found_after_other_chintai_links() {
        let html = r#"<html><body>
            <div class="cassetteitem">
              <div class="cassetteitem_content-title">ビル</div>
              <table class="cassetteitem_other"><tbody><tr>
                <td></td><td></td><td>2階</td>
                <td><span class="cassetteitem_price--rent">7万円</span></td>
                <td><a href="/jj/chintai/kankyo/">周辺環境</a></td>
                <td><a href="/chintai/jnc_1/">詳細を見る</a></td>
              </tr></tbody></table>
            </div>
        </body></html>"#;

        let listings = extractor().extract(&Html::parse_document(html));

        assert_eq!(listings.len(), 1);
        assert_eq!(listings[0].id, "jnc_1");
        assert_eq!(listings[0].url, "https://suumo.jp/chintai/jnc_1/");
        assert_eq!(listings[0].rent, 70_000.0);
    }

    #[test]
    fn unparseable_fields_are_zero_filled() {
        let html = page_html(
            &[vec![RoomFixture {
                area: "広め".into(),
                ..room("jnc_7", "-", "要問合せ")
            }]],
            false,
        );

        let listings = extractor().extract(&Html::parse_document(&html));

        assert_eq!(listings.len(), 1);
        assert_eq!(listings[0].rent, 0.0);
        assert_eq!(listings[0].area, 0.0);
    }

    #[test]
    fn floor_falls_back_to_building_floors() {
        let html = page_html(&[vec![room("jnc_2", "B1階", "6万円")]], false);

        let listings = extractor().extract(&Html::parse_document(&html));

        // Fixture blocks are "3階建" buildings.
        assert_eq!(listings[0].floor, 3);
    }

    #[test]
    fn detects_next_page_link() {
        assert!(has_next_page(&Html::parse_document(SAMPLE_PAGE)));
        assert!(!has_next_page(&Html::parse_document(&page_html(&[], false))));
        assert!(has_next_page(&Html::parse_document(&page_html(&[], true))));
    }
}
