use std::fs;
use std::path::PathBuf;

use chrono::NaiveDate;
use pricesync_core::StoreIdentifier;
use pricesync_feeds::{
    clean_item, normalize_city, parse_chain_file, parse_item_file, parse_price_file,
    parse_store_file, parse_store_identifier_file, FeedError,
};

const PRICE_FULL: &str = r#"<?xml version="1.0" encoding="utf-8"?>
<root>
  <ChainId>7290058140886</ChainId>
  <SubChainId>1</SubChainId>
  <StoreId>39</StoreId>
  <Items Count="2">
    <Item>
      <PriceUpdateDate>2024-01-01 08:15</PriceUpdateDate>
      <ItemCode>7290000000001</ItemCode>
      <ItemName>חלב 3% &amp; שמנת</ItemName>
      <ManufacturerName>תנובה</ManufacturerName>
      <ManufactureCountry>IL</ManufactureCountry>
      <UnitQty>ליטרים</UnitQty>
      <Quantity>1.00</Quantity>
      <UnitOfMeasure>100 מל</UnitOfMeasure>
      <bIsWeighted>0</bIsWeighted>
      <QtyInPackage>0</QtyInPackage>
      <ItemPrice>6.90</ItemPrice>
      <ItemStatus>true</ItemStatus>
    </Item>
    <Item>
      <ItemCode>7290000000002</ItemCode>
      <ItemName><![CDATA[עגבניות]]></ItemName>
      <bIsWeighted>1</bIsWeighted>
      <ItemPrice>8.50</ItemPrice>
    </Item>
  </Items>
</root>"#;

fn write(dir: &tempfile::TempDir, name: &str, body: &str) -> PathBuf {
    let path = dir.path().join(name);
    fs::write(&path, body).expect("write fixture");
    path
}

#[test]
fn price_full_file_yields_identifier_items_and_prices() {
    let dir = tempfile::tempdir().expect("tempdir");
    let path = write(&dir, "PriceFull7290058140886-001-039-202401010815.xml", PRICE_FULL);

    assert_eq!(
        parse_store_identifier_file(&path).expect("identifier"),
        Some(StoreIdentifier {
            chain_id: 7_290_058_140_886,
            sub_chain_id: 1,
            store_number: 39,
        })
    );

    let items: Vec<_> = parse_item_file(&path)
        .expect("items")
        .into_iter()
        .map(clean_item)
        .collect();
    assert_eq!(items.len(), 2);
    assert_eq!(items[0].name.as_deref(), Some("חלב 3% & שמנת"));
    assert_eq!(items[0].manufacture_country.as_deref(), Some("ישראל"));
    assert_eq!(items[0].unit_of_measure.as_deref(), Some("100 מ\"ל"));
    assert_eq!(items[0].is_weighted, Some(false));
    assert_eq!(items[1].name.as_deref(), Some("עגבניות"));
    assert_eq!(items[1].is_weighted, Some(true));

    let today = NaiveDate::from_ymd_opt(2024, 6, 1).expect("date");
    let prices = parse_price_file(&path, today).expect("prices");
    assert_eq!(prices.len(), 2);
    assert_eq!(prices[0].price.to_string(), "6.90");
    assert_eq!(prices[0].price_date, NaiveDate::from_ymd_opt(2024, 1, 1));
    assert_eq!(prices[1].price_date, None);
}

#[test]
fn chain_and_store_files_parse_and_cities_normalize() {
    let dir = tempfile::tempdir().expect("tempdir");
    let chains = write(
        &dir,
        "chains.xml",
        "<Chains><ChainId>1</ChainId><ChainName>X</ChainName>\
         <SubChains><SubChain><SubChainId>1</SubChainId><SubChainName>X1</SubChainName></SubChain></SubChains>\
         </Chains>",
    );
    let stores = write(
        &dir,
        "Stores1.xml",
        "<Root><ChainId>1</ChainId><SubChainId>1</SubChainId>\
         <Stores><Store><StoreId>100</StoreId><StoreName>Main</StoreName><City>ת\"א</City></Store></Stores>\
         </Root>",
    );

    let chains = parse_chain_file(&chains).expect("chains");
    assert_eq!(chains.len(), 1);
    assert_eq!(chains[0].chain_name.as_deref(), Some("X"));

    let stores = parse_store_file(&stores).expect("stores");
    assert_eq!(stores.len(), 1);
    assert_eq!(stores[0].chain_id, Some(1));
    assert_eq!(stores[0].store_number, 100);
    let city = stores[0].city.as_deref().and_then(normalize_city);
    assert_eq!(city.as_deref(), Some("תל אביב"));
}

#[test]
fn truncated_file_is_an_xml_error_and_missing_file_an_io_error() {
    let dir = tempfile::tempdir().expect("tempdir");
    let truncated = write(&dir, "bad.xml", "<root><Items><Item><ItemCode>1</Items>");
    assert!(matches!(
        parse_item_file(&truncated),
        Err(FeedError::Xml(_))
    ));
    assert!(matches!(
        parse_item_file(&dir.path().join("missing.xml")),
        Err(FeedError::Io { .. })
    ));
}
