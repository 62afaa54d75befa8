use std::hint::black_box;

use criterion::{criterion_group, criterion_main, Criterion};
use scraper::Html;

use menu_crawler::domain::model::canonical_product_url;
use menu_crawler::infrastructure::extract::listing::ListingContext;
use menu_crawler::infrastructure::extract::products::ProductContext;
use menu_crawler::infrastructure::extract::{
    ExtractorConfig, ListingParser, ProductParser, SnapshotParser,
};

fn listing_page(cards: usize) -> String {
    let mut html = String::from("<main>");
    for i in 0..cards {
        html.push_str(&format!(
            r#"<article class="styles_card__1se34">
                 <a href="/food/category-{i}"><h4>Category {i}</h4></a>
               </article>"#
        ));
    }
    html.push_str("</main>");
    html
}

fn category_page(products: usize) -> String {
    let mut html = String::from(r#"<article class="styles_product-list__3QLx5">"#);
    for i in 0..products {
        html.push_str(&format!(
            r#"<div class="styles_product-card__1-cAT">
                 <a class="styles_product-title__6KCyw" href="#"><h4>Product {i}®</h4></a>
                 <p class="styles_product-details__2VdYf"><span>$1.{i:02}</span><span>Description {i}.</span></p>
               </div>"#
        ));
    }
    html.push_str("</article>");
    html
}

fn bench_listing_extraction(c: &mut Criterion) {
    let parser = ListingParser::with_config(&ExtractorConfig::default().menu_board).unwrap();
    let context = ListingContext {
        page_url: "https://example.com/food".into(),
    };
    let html = Html::parse_document(&listing_page(30));

    c.bench_function("listing_extraction_30_cards", |b| {
        b.iter(|| parser.parse(black_box(&html), &context).unwrap())
    });
}

fn bench_product_extraction(c: &mut Criterion) {
    let parser = ProductParser::with_config(&ExtractorConfig::default().menu_board).unwrap();
    let context = ProductContext {
        parent_identifier: "burritos".into(),
        section_base: "https://example.com/food".into(),
    };
    let html = Html::parse_document(&category_page(25));

    c.bench_function("product_extraction_25_cards", |b| {
        b.iter(|| parser.parse(black_box(&html), &context).unwrap())
    });
}

fn bench_canonical_url(c: &mut Criterion) {
    c.bench_function("canonical_product_url", |b| {
        b.iter(|| {
            canonical_product_url(
                black_box("https://example.com/food"),
                black_box("burritos"),
                black_box("Grilled Cheese Burrito® Deluxe~"),
            )
        })
    });
}

criterion_group!(
    benches,
    bench_listing_extraction,
    bench_product_extraction,
    bench_canonical_url
);
criterion_main!(benches);
