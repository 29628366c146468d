// tests/feed_reader.rs
use market_digest::config::{FetchConfig, Source, SourceRegistry};
use market_digest::ingest::feed::parse_item_links;
use market_digest::ingest::{self, ArticleFetcher, Corpus, FeedOutcome, FeedReader};

const NO_ITEMS: &str = include_str!("fixtures/feed_no_items.xml");
const NO_LINKS: &str = include_str!("fixtures/feed_no_links.xml");
const RDF: &str = include_str!("fixtures/feed_rdf.xml");
const INTERLEAVED: &str = include_str!("fixtures/feed_interleaved.xml");

fn fetch_cfg() -> FetchConfig {
    FetchConfig {
        user_agent: "Mozilla/5.0".into(),
        timeout_secs: 5,
        feed_timeout_secs: 5,
        pacing_min_ms: 0,
        pacing_max_ms: 0,
    }
}

fn source(name: &str, endpoint: String, enabled: bool) -> Source {
    Source {
        name: name.into(),
        endpoint,
        enabled,
        selector: "p".into(),
    }
}

fn rss(links: &[String]) -> String {
    let items: String = links
        .iter()
        .map(|l| format!("<item><title>t</title><link>{l}</link></item>"))
        .collect();
    format!("<?xml version=\"1.0\"?><rss version=\"2.0\"><channel><title>Feed&nbsp;X</title>{items}</channel></rss>")
}

#[tokio::test]
async fn zero_items_is_its_own_outcome() {
    let mut server = mockito::Server::new_async().await;
    let feed = server
        .mock("GET", "/rss")
        .with_status(200)
        .with_body(NO_ITEMS)
        .create_async()
        .await;

    let reader = FeedReader::new(&fetch_cfg()).unwrap();
    let fetcher = ArticleFetcher::new(&fetch_cfg()).unwrap();
    let mut corpus = Corpus::in_memory();

    let out = reader
        .read(&source("quiet", format!("{}/rss", server.url()), true), &fetcher, &mut corpus)
        .await;

    feed.assert_async().await;
    assert_eq!(out, FeedOutcome::NoItems);
    assert!(corpus.is_empty());
}

#[tokio::test]
async fn items_without_links_are_distinguished() {
    let mut server = mockito::Server::new_async().await;
    server
        .mock("GET", "/rss")
        .with_status(200)
        .with_body(NO_LINKS)
        .create_async()
        .await;

    let reader = FeedReader::new(&fetch_cfg()).unwrap();
    let fetcher = ArticleFetcher::new(&fetch_cfg()).unwrap();
    let mut corpus = Corpus::in_memory();

    let out = reader
        .read(&source("heads", format!("{}/rss", server.url()), true), &fetcher, &mut corpus)
        .await;
    assert_eq!(out, FeedOutcome::NoLinks);
}

#[tokio::test]
async fn feed_http_error_skips_source() {
    let mut server = mockito::Server::new_async().await;
    server
        .mock("GET", "/rss")
        .with_status(500)
        .create_async()
        .await;

    let reader = FeedReader::new(&fetch_cfg()).unwrap();
    let fetcher = ArticleFetcher::new(&fetch_cfg()).unwrap();
    let mut corpus = Corpus::in_memory();

    let out = reader
        .read(&source("down", format!("{}/rss", server.url()), true), &fetcher, &mut corpus)
        .await;
    assert_eq!(out, FeedOutcome::Failed);
}

#[tokio::test]
async fn malformed_xml_skips_source() {
    let mut server = mockito::Server::new_async().await;
    server
        .mock("GET", "/rss")
        .with_status(200)
        .with_body("<html><body><p>maintenance<br></body></html>")
        .create_async()
        .await;

    let reader = FeedReader::new(&fetch_cfg()).unwrap();
    let fetcher = ArticleFetcher::new(&fetch_cfg()).unwrap();
    let mut corpus = Corpus::in_memory();

    let out = reader
        .read(&source("html", format!("{}/rss", server.url()), true), &fetcher, &mut corpus)
        .await;
    assert_eq!(out, FeedOutcome::Failed);
}

#[tokio::test]
async fn invalid_selector_skips_source_without_requests() {
    let mut server = mockito::Server::new_async().await;
    let feed = server
        .mock("GET", "/rss")
        .expect(0)
        .create_async()
        .await;

    let reader = FeedReader::new(&fetch_cfg()).unwrap();
    let fetcher = ArticleFetcher::new(&fetch_cfg()).unwrap();
    let mut corpus = Corpus::in_memory();

    let mut src = source("bad", format!("{}/rss", server.url()), true);
    src.selector = "p[".into();
    let out = reader.read(&src, &fetcher, &mut corpus).await;

    assert_eq!(out, FeedOutcome::Failed);
    feed.assert_async().await;
}

#[tokio::test]
async fn links_are_fetched_in_order_and_failures_shrink_corpus() {
    let mut server = mockito::Server::new_async().await;
    let base = server.url();
    let links = vec![format!("{base}/a"), format!("{base}/b"), format!("{base}/c")];

    server
        .mock("GET", "/rss")
        .with_status(200)
        .with_body(rss(&links))
        .create_async()
        .await;
    server
        .mock("GET", "/a")
        .with_status(200)
        .with_body("<html><p>Alpha</p></html>")
        .create_async()
        .await;
    server
        .mock("GET", "/b")
        .with_status(404)
        .create_async()
        .await;
    server
        .mock("GET", "/c")
        .with_status(200)
        .with_body("<html><p>Gamma</p><p>more</p></html>")
        .create_async()
        .await;

    let reader = FeedReader::new(&fetch_cfg()).unwrap();
    let fetcher = ArticleFetcher::new(&fetch_cfg()).unwrap();
    let mut corpus = Corpus::in_memory();

    let out = reader
        .read(&source("mixed", format!("{base}/rss"), true), &fetcher, &mut corpus)
        .await;

    assert_eq!(
        out,
        FeedOutcome::Read {
            candidates: 3,
            fetched: 2
        }
    );
    assert_eq!(
        corpus.snapshot(),
        format!("URL: {base}/a\nContent: Alpha\n\nURL: {base}/c\nContent: Gamma\nmore\n\n")
    );
}

#[tokio::test]
async fn disabled_sources_are_never_contacted() {
    let mut server = mockito::Server::new_async().await;
    let base = server.url();

    let off = server
        .mock("GET", "/off")
        .expect(0)
        .create_async()
        .await;
    let on = server
        .mock("GET", "/on")
        .with_status(200)
        .with_body(NO_ITEMS)
        .expect(1)
        .create_async()
        .await;

    let registry = SourceRegistry::new(vec![
        source("Off", format!("{base}/off"), false),
        source("On", format!("{base}/on"), true),
    ]);
    let reader = FeedReader::new(&fetch_cfg()).unwrap();
    let fetcher = ArticleFetcher::new(&fetch_cfg()).unwrap();
    let mut corpus = Corpus::in_memory();

    let outcomes = ingest::collect(&registry, &reader, &fetcher, &mut corpus).await;

    off.assert_async().await;
    on.assert_async().await;
    assert_eq!(outcomes, vec![("On".to_string(), FeedOutcome::NoItems)]);
}

#[test]
fn rdf_items_outside_the_channel_are_found() {
    let feed = parse_item_links(RDF).unwrap();
    assert_eq!(feed.item_count, 2);
    assert_eq!(
        feed.links,
        vec!["https://news.test/rdf/1", "https://news.test/rdf/2"]
    );
}

#[test]
fn items_interleaved_with_other_elements_are_all_kept() {
    let feed = parse_item_links(INTERLEAVED).unwrap();
    assert_eq!(feed.item_count, 3);
    assert_eq!(
        feed.links,
        vec![
            "https://news.test/x/1",
            "https://news.test/x/2",
            "https://news.test/x/3"
        ]
    );
}

#[tokio::test]
async fn rdf_feed_is_read_end_to_end() {
    let mut server = mockito::Server::new_async().await;
    let base = server.url();
    let rdf = format!(
        r##"<?xml version="1.0"?>
<rdf:RDF xmlns:rdf="http://www.w3.org/1999/02/22-rdf-syntax-ns#" xmlns="http://purl.org/rss/1.0/">
  <channel rdf:about="{base}/"><title>RDF</title><link>{base}/</link></channel>
  <item rdf:about="{base}/one"><title>One</title><link>{base}/one</link></item>
</rdf:RDF>"##
    );
    server
        .mock("GET", "/rdf")
        .with_status(200)
        .with_body(rdf)
        .create_async()
        .await;
    server
        .mock("GET", "/one")
        .with_status(200)
        .with_body("<p>First</p>")
        .create_async()
        .await;

    let reader = FeedReader::new(&fetch_cfg()).unwrap();
    let fetcher = ArticleFetcher::new(&fetch_cfg()).unwrap();
    let mut corpus = Corpus::in_memory();

    let out = reader
        .read(&source("rdf", format!("{base}/rdf"), true), &fetcher, &mut corpus)
        .await;
    assert_eq!(
        out,
        FeedOutcome::Read {
            candidates: 1,
            fetched: 1
        }
    );
    assert_eq!(corpus.snapshot(), format!("URL: {base}/one\nContent: First\n\n"));
}
