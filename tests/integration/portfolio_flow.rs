//! Library-level flow: CSV in, summary, roast and meme out.

use rand::rngs::mock::StepRng;

use memefolio::classify::meme::MemeCatalog;
use memefolio::classify::roast::{roast, RoastTier};
use memefolio::classify::Tier;
use memefolio::portfolio::normalize::{parse_csv, parse_csv_strict};
use memefolio::portfolio::wrapped::{build_deck, Card};
use memefolio::portfolio::{aggregate, sample_portfolio};
use memefolio::prices::ManualEntry;
use memefolio::storage::{delete_file, LeaderboardStore, LeaderboardSubmission, PortfolioStore};

use crate::stub_prices::stub_router;

const BROKER_EXPORT: &str = "\
Symbol,Quantity,cost,price
NVDA,10,450,890
TSLA,8,265,175
,5,1,1
AMD,0,95,158
";

fn temp_path(name: &str) -> String {
    let mut p = std::env::temp_dir();
    p.push(format!("memefolio_it_{name}_{}.json", uuid::Uuid::new_v4()));
    p.to_string_lossy().to_string()
}

#[test]
fn test_csv_to_meme() {
    let holdings = parse_csv(BROKER_EXPORT).unwrap();
    let tickers: Vec<&str> = holdings.iter().map(|h| h.ticker.as_str()).collect();
    assert_eq!(tickers, vec!["NVDA", "TSLA"]);

    let summary = aggregate(&holdings);
    assert_eq!(summary.total_invested, 6620.0);
    assert_eq!(summary.current_value, 10300.0);
    assert_eq!(summary.total_return, 3680.0);
    assert!((summary.percentage_return - 55.589).abs() < 0.001);

    let mut rng = StepRng::new(0, 0);
    let r = roast(summary.percentage_return, None, &mut rng);
    assert_eq!(r.tier, RoastTier::Good);

    let meme = MemeCatalog::default().render(summary.percentage_return, None, &mut rng);
    assert_eq!(meme.template_id, "leo-cheers");
    assert_eq!(meme.top_text, "Cheers to my portfolio");
    assert_eq!(meme.bottom_text, "+55.6% baby");
}

#[test]
fn test_strict_parse_accepts_clean_export() {
    let strict = parse_csv_strict(BROKER_EXPORT).unwrap();
    assert_eq!(strict, parse_csv(BROKER_EXPORT).unwrap());
}

#[test]
fn test_sample_portfolio_is_a_winner() {
    let summary = aggregate(&sample_portfolio());
    assert!(summary.percentage_return > 0.0);
    assert_eq!(RoastTier::classify(summary.percentage_return), RoastTier::Good);
    assert_eq!(summary.ranked_holdings()[0].ticker, "META");
}

#[tokio::test]
async fn test_manual_entry_flow() {
    let (router, calls) = stub_router();
    let entries = vec![
        ManualEntry {
            ticker: "gme".into(),
            shares: 10.0,
            purchase_price: 80.0,
        },
        ManualEntry {
            ticker: "DOGE".into(),
            shares: 1000.0,
            purchase_price: 0.2,
        },
        ManualEntry {
            ticker: "NOPE".into(),
            shares: 1.0,
            purchase_price: 1.0,
        },
    ];

    let resolution = router.build_holdings(&entries).await;
    assert_eq!(resolution.holdings.len(), 2);
    assert_eq!(resolution.errors.len(), 1);
    assert_eq!(resolution.errors[0].ticker, "NOPE");

    // DOGE goes to the crypto source, not the stock one
    let stock_calls = calls.lock().unwrap().clone();
    assert!(stock_calls.contains(&"GME".to_string()));
    assert!(!stock_calls.contains(&"DOGE".to_string()));

    // 800 + 200 invested, 200 + 80 now
    let summary = aggregate(&resolution.holdings);
    assert_eq!(summary.total_invested, 1000.0);
    assert!((summary.current_value - 280.0).abs() < 1e-9);
    assert!((summary.percentage_return + 72.0).abs() < 1e-9);

    let path = temp_path("leaderboard");
    let mut board = LeaderboardStore::open(path.as_str(), 50, -10.0).unwrap();
    let (entry, rank) = board
        .submit(LeaderboardSubmission {
            percentage_loss: summary.percentage_return,
            ticker: None,
            meme_text: Some("this is fine".into()),
        })
        .unwrap()
        .unwrap();
    assert_eq!(rank, 0);
    assert_eq!(entry.to_string(), "-72.0%");
    delete_file(&path).unwrap();
}

#[test]
fn test_saved_portfolio_round_trip_through_disk() {
    let path = temp_path("portfolios");
    let saved = {
        let mut store = PortfolioStore::open(path.as_str(), 10).unwrap();
        store.save("sample", sample_portfolio()).unwrap()
    };

    let store = PortfolioStore::open(path.as_str(), 10).unwrap();
    let loaded = store.get(&saved.id).unwrap();
    assert_eq!(loaded, &saved);
    assert_eq!(aggregate(&loaded.holdings), aggregate(&sample_portfolio()));
    delete_file(&path).unwrap();
}

#[test]
fn test_wrapped_deck_shape() {
    let deck = build_deck(&sample_portfolio(), &mut StepRng::new(0, 0));
    assert_eq!(deck.months.len(), 12);
    assert!(matches!(deck.cards.first(), Some(Card::Intro)));
    assert!(matches!(deck.cards.last(), Some(Card::Share { .. })));
}
