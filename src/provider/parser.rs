//! Parsing of KoG website responses.
//!
//! The map catalog is only published as an HTML page of bootstrap cards; each card
//! holds the map name in its header, a list with star icons, difficulty, points and
//! author, and a "Released at" footer.

use super::models::{ApiEnvelope, PlayerRecord};
use super::{MapListing, PlayerSnapshot, ProviderError};
use scraper::{ElementRef, Html, Selector};

const FILLED_STAR_CLASS: &str = "bi-star-fill";

fn selector(css: &str) -> Result<Selector, ProviderError> {
    Selector::parse(css).map_err(|e| ProviderError::Parse {
        message: format!("invalid selector '{css}': {e:?}"),
    })
}

fn text_of(element: ElementRef<'_>) -> String {
    element.text().collect::<String>().trim().to_string()
}

fn missing(part: &str, map_name: &str) -> ProviderError {
    ProviderError::Parse {
        message: format!("map card '{map_name}' has no {part}"),
    }
}

/// Parses the map catalog page into listings, in page order.
pub fn parse_map_page(html: &str) -> Result<Vec<MapListing>, ProviderError> {
    let document = Html::parse_document(html);
    let card_sel = selector("div.card.mb-4.box-shadow")?;
    let title_sel = selector("div.card-header h4")?;
    let list_sel = selector("ul.list-group-flush")?;
    let item_sel = selector("li")?;
    let star_sel = selector("i[class*='bi-star']")?;
    let footer_sel = selector("div.card-footer")?;

    let mut maps = Vec::new();
    for card in document.select(&card_sel) {
        let name = card
            .select(&title_sel)
            .next()
            .map(text_of)
            .ok_or_else(|| missing("title", "?"))?;

        let list = card
            .select(&list_sel)
            .next()
            .ok_or_else(|| missing("detail list", &name))?;

        let filled = list
            .select(&star_sel)
            .filter(|star| star.value().classes().any(|c| c == FILLED_STAR_CLASS))
            .count();
        let stars = i32::try_from(filled).unwrap_or(i32::MAX).min(5);

        let items: Vec<String> = list.select(&item_sel).map(text_of).collect();
        let difficulty = items
            .get(1)
            .and_then(|text| text.split_whitespace().next())
            .ok_or_else(|| missing("difficulty", &name))?
            .to_string();
        let points_text = items.get(2).ok_or_else(|| missing("points", &name))?;
        let points = points_text
            .replace("points", "")
            .split_whitespace()
            .next()
            .and_then(|p| p.parse::<i32>().ok())
            .ok_or_else(|| ProviderError::Parse {
                message: format!("map card '{name}' has unreadable points '{points_text}'"),
            })?;
        let author = items
            .get(3)
            .cloned()
            .ok_or_else(|| missing("author", &name))?;

        let released_at = card
            .select(&footer_sel)
            .next()
            .map(text_of)
            .map(|t| t.replace("Released at ", ""))
            .unwrap_or_default();

        maps.push(MapListing {
            name,
            difficulty,
            stars,
            points,
            author,
            released_at,
        });
    }

    Ok(maps)
}

/// Decodes the doubly-wrapped players API response.
///
/// A non-200 status or a `null` payload means the website does not know the player.
pub fn parse_player_response(username: &str, body: &str) -> Result<PlayerSnapshot, ProviderError> {
    let envelope: ApiEnvelope = serde_json::from_str(body).map_err(|e| ProviderError::Parse {
        message: format!("invalid response envelope: {e}"),
    })?;

    let not_found = || ProviderError::NotFound {
        username: username.to_string(),
    };

    match envelope.status {
        200 => {}
        404 => return Err(not_found()),
        status => return Err(ProviderError::Status { status }),
    }

    let data = envelope.data.ok_or_else(not_found)?;
    let record: Option<PlayerRecord> =
        serde_json::from_str(&data).map_err(|e| ProviderError::Parse {
            message: format!("invalid player payload: {e}"),
        })?;

    record.map(PlayerSnapshot::from).ok_or_else(not_found)
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]
    #![allow(clippy::float_cmp)]
    use super::*;

    const MAP_PAGE: &str = r#"
        <html><body><div class="container"><div class="row">
          <div class="col-md-4">
            <div class="card mb-4 box-shadow">
              <div class="card-header"><h4 class="my-0">  Aip-Gores  </h4></div>
              <div class="card-body">
                <ul class="list-group list-group-flush">
                  <li class="list-group-item">
                    <i class="bi bi-star-fill"></i><i class="bi bi-star-fill"></i><i class="bi bi-star-fill"></i><i class="bi bi-star"></i><i class="bi bi-star"></i>
                  </li>
                  <li class="list-group-item">Hard Map</li>
                  <li class="list-group-item">15 points</li>
                  <li class="list-group-item">Silex</li>
                </ul>
              </div>
              <div class="card-footer text-muted">Released at 2021-06-12 18:00</div>
            </div>
          </div>
          <div class="col-md-4">
            <div class="card mb-4 box-shadow">
              <div class="card-header"><h4>Easy Peasy</h4></div>
              <ul class="list-group list-group-flush">
                <li><i class="bi bi-star"></i><i class="bi bi-star"></i><i class="bi bi-star"></i><i class="bi bi-star"></i><i class="bi bi-star"></i></li>
                <li>Easy</li>
                <li>2 points</li>
                <li>Pipou &amp; Ravie</li>
              </ul>
              <div class="card-footer">Released at 2020-01-01 00:00</div>
            </div>
          </div>
        </div></div></body></html>
    "#;

    #[test]
    fn test_parse_map_page_reads_every_card() {
        let maps = parse_map_page(MAP_PAGE).unwrap();
        assert_eq!(maps.len(), 2);

        assert_eq!(maps[0].name, "Aip-Gores");
        assert_eq!(maps[0].stars, 3);
        assert_eq!(maps[0].difficulty, "Hard");
        assert_eq!(maps[0].points, 15);
        assert_eq!(maps[0].author, "Silex");
        assert_eq!(maps[0].released_at, "2021-06-12 18:00");

        assert_eq!(maps[1].name, "Easy Peasy");
        assert_eq!(maps[1].stars, 0);
        assert_eq!(maps[1].difficulty, "Easy");
        assert_eq!(maps[1].points, 2);
        assert_eq!(maps[1].author, "Pipou & Ravie");
    }

    #[test]
    fn test_parse_map_page_without_cards_is_empty() {
        let maps = parse_map_page("<html><body><p>maintenance</p></body></html>").unwrap();
        assert!(maps.is_empty());
    }

    #[test]
    fn test_parse_map_page_rejects_bad_points() {
        let html = r#"
            <div class="card mb-4 box-shadow">
              <div class="card-header"><h4>Broken</h4></div>
              <ul class="list-group-flush"><li></li><li>Main</li><li>many points</li><li>Someone</li></ul>
            </div>
        "#;
        let result = parse_map_page(html);
        assert!(matches!(result, Err(ProviderError::Parse { .. })));
    }

    #[test]
    fn test_parse_player_response() {
        let payload = serde_json::json!({
            "points": {
                "Rank": 12, "Name": "Cheeser0613", "TPoints": 1500,
                "PvPpoints": 0.0, "Points": 1200, "Seasonpoints": 300,
                "RewardIndex": 0, "Powers": ""
            },
            "finishedMaps": [
                { "Map": "Aip-Gores", "Time": 123.45, "Timestamp": "2023-05-01 10:00:00" },
                { "Map": "Easy Peasy", "Time": 20.0, "Timestamp": "2023-05-02 11:00:00" }
            ]
        });
        let body = serde_json::json!({ "status": 200, "data": payload.to_string() }).to_string();

        let snapshot = parse_player_response("Cheeser0613", &body).unwrap();
        assert_eq!(snapshot.rank, 12);
        assert_eq!(snapshot.total_points, 1500);
        assert_eq!(snapshot.base_points, 1200);
        assert_eq!(snapshot.season_points, 300);
        assert_eq!(snapshot.completed_maps.len(), 2);
        assert_eq!(snapshot.completed_maps[0].map_name, "Aip-Gores");
        assert_eq!(snapshot.completed_maps[0].time, 123.45);
    }

    #[test]
    fn test_parse_player_response_null_payload_is_not_found() {
        let body = r#"{"status":200,"data":"null"}"#;
        let result = parse_player_response("ghost", body);
        assert!(matches!(result, Err(ProviderError::NotFound { username }) if username == "ghost"));
    }

    #[test]
    fn test_parse_player_response_error_status() {
        let body = r#"{"status":500,"data":null}"#;
        let result = parse_player_response("someone", body);
        assert!(matches!(result, Err(ProviderError::Status { status: 500 })));
    }

    #[test]
    fn test_parse_player_response_garbage() {
        let result = parse_player_response("someone", "<html>cloudflare</html>");
        assert!(matches!(result, Err(ProviderError::Parse { .. })));
    }
}
