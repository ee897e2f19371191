// Shared fixtures: search-result pages and an in-memory page source.

use crate::crawler::{DocumentSource, FetchError};
use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use tokio_util::sync::CancellationToken;
use url::Url;

/// Two buildings, three rooms, and a 次へ link.
pub const SAMPLE_PAGE: &str = r#"<!DOCTYPE html>
<html lang="ja">
<body>
<div id="js-bukkenList">
  <div class="cassetteitem">
    <div class="cassetteitem-detail">
      <div class="cassetteitem_content">
        <div class="cassetteitem_content-title">テストマンション</div>
      </div>
      <ul class="cassetteitem_detail">
        <li class="cassetteitem_detail-col1">東京都渋谷区渋谷1-1-1</li>
        <li class="cassetteitem_detail-col2">
          <div class="cassetteitem_detail-text">西武新宿線/新井薬師前駅 歩8分</div>
          <div class="cassetteitem_detail-text">西武新宿線/沼袋駅 歩10分</div>
        </li>
        <li class="cassetteitem_detail-col3">
          <div>築5年</div>
          <div>3階建</div>
        </li>
      </ul>
    </div>
    <div class="cassetteitem-item">
      <table class="cassetteitem_other">
        <tbody>
          <tr class="js-cassette_link">
            <td><input type="checkbox" /></td>
            <td><img src="/img/1.jpg" /></td>
            <td>3階</td>
            <td>
              <li><span class="cassetteitem_price cassetteitem_price--rent"><span>7.9万円</span></span></li>
              <li><span class="cassetteitem_price cassetteitem_price--administration">5000円</span></li>
            </td>
            <td>
              <li><span class="cassetteitem_price cassetteitem_price--deposit">1ヶ月</span></li>
              <li><span class="cassetteitem_price cassetteitem_price--gratuity">1ヶ月</span></li>
            </td>
            <td>
              <li><span class="cassetteitem_madori">1K</span></li>
              <li><span class="cassetteitem_menseki">25.5m<sup>2</sup></span></li>
            </td>
            <td><a href="/chintai/jnc_000102396492/" class="js-cassette_link_href">詳細を見る</a></td>
          </tr>
        </tbody>
        <tbody>
          <tr class="js-cassette_link">
            <td><input type="checkbox" /></td>
            <td><img src="/img/2.jpg" /></td>
            <td>2階</td>
            <td>
              <li><span class="cassetteitem_price cassetteitem_price--rent"><span>7.5万円</span></span></li>
              <li><span class="cassetteitem_price cassetteitem_price--administration">5000円</span></li>
            </td>
            <td>
              <li><span class="cassetteitem_price cassetteitem_price--deposit">-</span></li>
              <li><span class="cassetteitem_price cassetteitem_price--gratuity">-</span></li>
            </td>
            <td>
              <li><span class="cassetteitem_madori">1K</span></li>
              <li><span class="cassetteitem_menseki">22.1m<sup>2</sup></span></li>
            </td>
            <td><a href="/chintai/jnc_000102396493/" class="js-cassette_link_href">詳細を見る</a></td>
          </tr>
        </tbody>
      </table>
    </div>
  </div>
  <div class="cassetteitem">
    <div class="cassetteitem-detail">
      <div class="cassetteitem_content">
        <div class="cassetteitem_content-title">テストアパート</div>
      </div>
      <ul class="cassetteitem_detail">
        <li class="cassetteitem_detail-col1">東京都新宿区西新宿2-2-2</li>
        <li class="cassetteitem_detail-col2">
          <div class="cassetteitem_detail-text">JR山手線/新宿駅 歩5分</div>
        </li>
        <li class="cassetteitem_detail-col3">
          <div>新築</div>
          <div>10階建</div>
        </li>
      </ul>
    </div>
    <div class="cassetteitem-item">
      <table class="cassetteitem_other">
        <tbody>
          <tr class="js-cassette_link">
            <td><input type="checkbox" /></td>
            <td><img src="/img/3.jpg" /></td>
            <td>7階</td>
            <td>
              <li><span class="cassetteitem_price cassetteitem_price--rent"><span>10万円</span></span></li>
              <li><span class="cassetteitem_price cassetteitem_price--administration">-</span></li>
            </td>
            <td>
              <li><span class="cassetteitem_price cassetteitem_price--deposit">2ヶ月</span></li>
              <li><span class="cassetteitem_price cassetteitem_price--gratuity">1ヶ月</span></li>
            </td>
            <td>
              <li><span class="cassetteitem_madori">1LDK</span></li>
              <li><span class="cassetteitem_menseki">40.2m<sup>2</sup></span></li>
            </td>
            <td><a href="/chintai/jnc_000102396500/?bc=100402396500" class="js-cassette_link_href">詳細を見る</a></td>
          </tr>
        </tbody>
      </table>
    </div>
  </div>
</div>
<div class="pagination pagination_set-nav">
  <p class="pagination-parts"><a href="/jj/chintai/ichiran/FR301FC001/?page=2">次へ</a></p>
</div>
</body>
</html>
"#;

/// One room row inside a generated building block.
#[derive(Debug, Clone)]
pub struct RoomFixture {
    pub href: String,
    pub floor: String,
    pub rent: String,
    pub fee: String,
    pub deposit: String,
    pub key_money: String,
    pub layout: String,
    pub area: String,
}

pub fn room(id: &str, floor: &str, rent: &str) -> RoomFixture {
    RoomFixture {
        href: format!("/chintai/{id}/"),
        floor: floor.to_string(),
        rent: rent.to_string(),
        fee: "5000円".to_string(),
        deposit: "1ヶ月".to_string(),
        key_money: "-".to_string(),
        layout: "1K".to_string(),
        area: "25.5m2".to_string(),
    }
}

/// A results page with one "3階建" building block per entry in `blocks`.
pub fn page_html(blocks: &[Vec<RoomFixture>], has_next: bool) -> String {
    let mut html = String::from("<html><body><div id=\"js-bukkenList\">");

    for (i, rooms) in blocks.iter().enumerate() {
        html.push_str(&format!(
            r#"<div class="cassetteitem">
  <div class="cassetteitem_content-title">ビル{i}</div>
  <ul>
    <li class="cassetteitem_detail-col1">東京都中野区中野{i}</li>
    <li class="cassetteitem_detail-col2"><div class="cassetteitem_detail-text">JR中央線/中野駅 歩7分</div></li>
    <li class="cassetteitem_detail-col3"><div>築10年</div><div>3階建</div></li>
  </ul>
  <table class="cassetteitem_other">"#
        ));
        for r in rooms {
            html.push_str(&format!(
                r#"<tbody><tr>
    <td></td><td></td><td>{floor}</td>
    <td><span class="cassetteitem_price--rent">{rent}</span><span class="cassetteitem_price--administration">{fee}</span></td>
    <td><span class="cassetteitem_price--deposit">{deposit}</span><span class="cassetteitem_price--gratuity">{key_money}</span></td>
    <td><span class="cassetteitem_madori">{layout}</span><span class="cassetteitem_menseki">{area}</span></td>
    <td><a href="{href}">詳細を見る</a></td>
  </tr></tbody>"#,
                floor = r.floor,
                rent = r.rent,
                fee = r.fee,
                deposit = r.deposit,
                key_money = r.key_money,
                layout = r.layout,
                area = r.area,
                href = r.href,
            ));
        }
        html.push_str("</table></div>");
    }

    html.push_str("</div><div class=\"pagination\">");
    html.push_str("<p class=\"pagination-parts\"><a href=\"?page=1\">1</a></p>");
    if has_next {
        html.push_str("<p class=\"pagination-parts\"><a href=\"?page=next\">次へ</a></p>");
    }
    html.push_str("</div></body></html>");
    html
}

/// In-memory search results keyed by the `page` query parameter.
/// Pages with no body configured answer 404.
#[derive(Default)]
pub struct FakeSource {
    pages: HashMap<u32, String>,
    failures: HashMap<u32, FetchError>,
    cancel_on: Option<(u32, CancellationToken)>,
    requests: Arc<Mutex<Vec<u32>>>,
}

impl FakeSource {
    pub fn with_page(mut self, page: u32, html: impl Into<String>) -> Self {
        self.pages.insert(page, html.into());
        self
    }

    pub fn failing(mut self, page: u32, error: FetchError) -> Self {
        self.failures.insert(page, error);
        self
    }

    /// Cancels `token` while serving `page`; the page itself still loads.
    pub fn cancelling_on(mut self, page: u32, token: CancellationToken) -> Self {
        self.cancel_on = Some((page, token));
        self
    }

    /// Page numbers requested so far, in order, retries included.
    pub fn request_log(&self) -> Arc<Mutex<Vec<u32>>> {
        Arc::clone(&self.requests)
    }
}

fn page_number(url: &Url) -> u32 {
    url.query_pairs()
        .find(|(k, _)| k == "page")
        .and_then(|(_, v)| v.parse().ok())
        .unwrap_or(1)
}

#[async_trait]
impl DocumentSource for FakeSource {
    async fn get(&self, url: &Url) -> Result<String, FetchError> {
        let page = page_number(url);
        self.requests.lock().unwrap().push(page);

        if let Some((at, token)) = &self.cancel_on {
            if *at == page {
                token.cancel();
            }
        }
        if let Some(err) = self.failures.get(&page) {
            return Err(err.clone());
        }
        self.pages
            .get(&page)
            .cloned()
            .ok_or(FetchError::BadStatus(404))
    }
}
