//! String-level extraction from product pages.
//!
//! Product pages expose the same data several ways (Open Graph tags,
//! microdata, JSON-LD). Each extractor tries them in order and gives up
//! quietly; the caller decides which missing fields are fatal.

use sea_orm::prelude::Decimal;
use serde_json::Value;

/// Case-insensitive `find` that works on byte offsets of the original string.
fn find_ci(haystack: &str, needle: &str, from: usize) -> Option<usize> {
    let hay = haystack.get(from..)?.to_ascii_lowercase();
    hay.find(&needle.to_ascii_lowercase()).map(|i| i + from)
}

/// Value of the `content` attribute of the first tag containing `marker`,
/// e.g. `property="og:title"` or `itemprop="price"`.
pub fn meta_content(html: &str, marker: &str) -> Option<String> {
    let at = find_ci(html, marker, 0)?;
    let tag_start = html[..at].rfind('<')?;
    let tag_end = html[at..].find('>')? + at;
    let tag = &html[tag_start..tag_end];

    let attr = find_ci(tag, "content=", 0)? + "content=".len();
    let quote = tag[attr..].chars().next()?;
    if quote != '"' && quote != '\'' {
        return None;
    }
    let value_start = attr + 1;
    let value_end = tag[value_start..].find(quote)? + value_start;
    let value = decode_entities(tag[value_start..value_end].trim());
    (!value.is_empty()).then_some(value)
}

/// Text content of the first `<tag ...>...</tag>` block.
pub fn first_tag_text(html: &str, tag: &str) -> Option<String> {
    let open = find_ci(html, &format!("<{}", tag), 0)?;
    let inner_start = html[open..].find('>')? + open + 1;
    let inner_end = find_ci(html, &format!("</{}", tag), inner_start)?;
    let text = decode_entities(&strip_tags(&html[inner_start..inner_end]));
    (!text.is_empty()).then_some(text)
}

/// Parsed bodies of every `<script type="application/ld+json">` block.
/// Blocks that are not valid JSON are skipped.
pub fn ld_json_blocks(html: &str) -> Vec<Value> {
    let mut blocks = Vec::new();
    let mut from = 0;

    while let Some(open) = find_ci(html, "<script", from) {
        let Some(tag_end) = html[open..].find('>').map(|i| i + open) else {
            break;
        };
        let Some(close) = find_ci(html, "</script", tag_end) else {
            break;
        };

        if find_ci(&html[open..tag_end], "application/ld+json", 0).is_some() {
            match serde_json::from_str::<Value>(html[tag_end + 1..close].trim()) {
                Ok(block) => blocks.push(block),
                Err(e) => tracing::debug!(error = %e, "skipping malformed ld+json block"),
            }
        }
        from = close + "</script".len();
    }

    blocks
}

fn is_product(node: &Value) -> bool {
    match node.get("@type") {
        Some(Value::String(kind)) => kind.eq_ignore_ascii_case("product"),
        Some(Value::Array(kinds)) => kinds
            .iter()
            .any(|k| k.as_str().is_some_and(|k| k.eq_ignore_ascii_case("product"))),
        _ => false,
    }
}

/// `Product` nodes of a JSON-LD block, looking into top-level arrays and `@graph`.
fn product_nodes(block: &Value) -> Vec<&Value> {
    let nodes: Vec<&Value> = match block {
        Value::Array(items) => items.iter().collect(),
        Value::Object(map) => match map.get("@graph") {
            Some(Value::Array(graph)) => graph.iter().collect(),
            _ => vec![block],
        },
        _ => Vec::new(),
    };
    nodes.into_iter().filter(|node| is_product(node)).collect()
}

/// `offers` may be a single offer or a list of them.
fn offers(product: &Value) -> Vec<&Value> {
    match product.get("offers") {
        Some(Value::Array(list)) => list.iter().collect(),
        Some(offer @ Value::Object(_)) => vec![offer],
        _ => Vec::new(),
    }
}

fn json_price(value: &Value) -> Option<Decimal> {
    match value {
        Value::String(text) => parse_price(text),
        Value::Number(number) => number
            .to_string()
            .parse::<Decimal>()
            .ok()
            .filter(|price| *price > Decimal::ZERO),
        _ => None,
    }
}

fn seller_name(node: &Value) -> Option<String> {
    let name = node.get("seller")?.get("name")?.as_str()?.trim();
    (!name.is_empty()).then(|| decode_entities(name))
}

/// Offer price of the first product found in the page's JSON-LD.
pub fn ld_json_price(blocks: &[Value]) -> Option<Decimal> {
    blocks
        .iter()
        .flat_map(product_nodes)
        .flat_map(offers)
        .find_map(|offer| {
            offer
                .get("price")
                .and_then(json_price)
                .or_else(|| offer.get("lowPrice").and_then(json_price))
        })
}

/// Seller of the first product, either on the product itself or on an offer.
pub fn ld_json_seller(blocks: &[Value]) -> Option<String> {
    blocks
        .iter()
        .flat_map(product_nodes)
        .find_map(|product| seller_name(product).or_else(|| offers(product).into_iter().find_map(seller_name)))
}

/// Remove markup and collapse whitespace.
pub fn strip_tags(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    let mut in_tag = false;

    for ch in s.chars() {
        match ch {
            '<' => {
                in_tag = true;
            }
            '>' => {
                in_tag = false;
                out.push(' ');
            }
            _ if !in_tag => out.push(ch),
            _ => {}
        }
    }
    out.split_whitespace().collect::<Vec<_>>().join(" ")
}

fn decode_entities(s: &str) -> String {
    s.replace("&quot;", "\"")
        .replace("&#39;", "'")
        .replace("&nbsp;", " ")
        .replace("&lt;", "<")
        .replace("&gt;", ">")
        .replace("&amp;", "&")
}

/// Parse a displayed price such as `1 299 ₽`, `1,299.00 $` or `990,5`.
///
/// Group separators (spaces of any width, commas or dots followed by three
/// digits) are dropped; a final `,`/`.` followed by one or two digits is the
/// decimal point.
pub fn parse_price(text: &str) -> Option<Decimal> {
    let kept: String = text
        .chars()
        .filter(|c| c.is_ascii_digit() || *c == ',' || *c == '.')
        .collect();
    let kept = kept.trim_matches(|c| c == ',' || c == '.');
    if !kept.chars().any(|c| c.is_ascii_digit()) {
        return None;
    }

    let normalized = match kept.rfind([',', '.']) {
        Some(sep) if (1..=2).contains(&(kept.len() - sep - 1)) => {
            let int_part: String = kept[..sep].chars().filter(char::is_ascii_digit).collect();
            format!("{}.{}", int_part, &kept[sep + 1..])
        }
        _ => kept.chars().filter(char::is_ascii_digit).collect(),
    };

    let price: Decimal = normalized.parse().ok()?;
    (price > Decimal::ZERO).then_some(price)
}

/// Fields the scraper could find on a page.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PageData {
    pub name: Option<String>,
    pub price: Option<Decimal>,
    pub seller: Option<String>,
}

pub fn extract_page(html: &str) -> PageData {
    let ld_json = ld_json_blocks(html);

    let price = meta_content(html, "itemprop=\"price\"")
        .or_else(|| meta_content(html, "property=\"product:price:amount\""))
        .and_then(|raw| parse_price(&raw))
        .or_else(|| ld_json_price(&ld_json));

    let name = meta_content(html, "property=\"og:title\"").or_else(|| first_tag_text(html, "h1"));

    let seller = ld_json_seller(&ld_json).or_else(|| meta_content(html, "itemprop=\"seller\""));

    PageData { name, price, seller }
}

#[cfg(test)]
mod tests {
    use super::*;

    const PAGE: &str = r#"<html><head>
        <meta property="og:title" content="Blender X200 &amp; jug">
        <script type="application/ld+json">
        {"@type":"Product","name":"Blender X200","offers":{"@type":"Offer","price":"4599","priceCurrency":"RUB"},
         "seller":{"@type":"Organization","name":"Kitchen World"}}
        </script>
        </head><body><h1 class="title">Blender <b>X200</b></h1>
        <span class="price">4&#8201;599&#8201;₽</span></body></html>"#;

    #[test]
    fn test_extract_full_page() {
        let data = extract_page(PAGE);
        assert_eq!(data.name.as_deref(), Some("Blender X200 & jug"));
        assert_eq!(data.price, Some(Decimal::new(4599, 0)));
        assert_eq!(data.seller.as_deref(), Some("Kitchen World"));
    }

    #[test]
    fn test_microdata_price_wins_over_json() {
        let html = r#"<meta itemprop="price" content="1299.50"><script>{"price":"9999"}</script>"#;
        assert_eq!(extract_page(html).price, Some(Decimal::new(129950, 2)));
    }

    #[test]
    fn test_missing_fields_are_none() {
        let data = extract_page("<html><body>Out of stock</body></html>");
        assert_eq!(data, PageData::default());
    }

    #[test]
    fn test_first_tag_text_falls_back_to_h1() {
        let html = "<h1 class=\"x\">  Kettle <span>K1</span> </h1>";
        assert_eq!(first_tag_text(html, "h1").as_deref(), Some("Kettle K1"));
        assert_eq!(extract_page(html).name.as_deref(), Some("Kettle K1"));
    }

    #[test]
    fn test_unrelated_json_does_not_hide_offer_price() {
        let html = r#"<script>{"cart":{"price":"0"}}</script>
            <script type="application/ld+json">{"@type":"Product","offers":{"price":"4599"}}</script>"#;
        assert_eq!(extract_page(html).price, Some(Decimal::new(4599, 0)));
    }

    #[test]
    fn test_ld_json_graph_numbers_and_offer_lists() {
        let html = r#"<script type='application/ld+json'>
            {"@context":"https://schema.org","@graph":[
              {"@type":"BreadcrumbList","itemListElement":[]},
              {"@type":"Product","name":"Mug","offers":[
                {"@type":"Offer","price":1299.5,"seller":{"name":"Cups &amp; Co"}}
              ]}
            ]}</script>"#;
        let data = extract_page(html);
        assert_eq!(data.price, Some(Decimal::new(12995, 1)));
        assert_eq!(data.seller.as_deref(), Some("Cups & Co"));
    }

    #[test]
    fn test_malformed_ld_json_is_skipped() {
        let html = r#"<script type="application/ld+json">{"@type":"Product",</script>
            <script type="application/ld+json">{"@type":"Product","offers":{"lowPrice":"990"}}</script>"#;
        assert_eq!(ld_json_blocks(html).len(), 1);
        assert_eq!(extract_page(html).price, Some(Decimal::new(990, 0)));
    }

    #[test]
    fn test_parse_price_formats() {
        assert_eq!(parse_price("1\u{2009}299\u{2009}₽"), Some(Decimal::new(1299, 0)));
        assert_eq!(parse_price("1 299 ₽"), Some(Decimal::new(1299, 0)));
        assert_eq!(parse_price("12\u{a0}345 руб."), Some(Decimal::new(12345, 0)));
        assert_eq!(parse_price("1,299.00 $"), Some(Decimal::new(1299, 0)));
        assert_eq!(parse_price("990,5"), Some(Decimal::new(9905, 1)));
        assert_eq!(parse_price("1.299"), Some(Decimal::new(1299, 0)));
        assert_eq!(parse_price("₽"), None);
        assert_eq!(parse_price("0"), None);
    }
}
