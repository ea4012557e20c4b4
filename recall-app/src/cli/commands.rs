use crate::cli::opts::*;

use anyhow::{anyhow, bail, Result};
use async_trait::async_trait;
use chrono::Utc;
use recall_core::{
    daily_streak, deck_analytics, describe_interval, preview_rating, summarize, Deck, Rating,
    Repository, ReviewLog, ReviewObserver, ReviewService,
};
use recall_json::JsonStore;
use std::io::{stdin, stdout, Write};
use std::sync::Arc;
use std::time::Instant;
use uuid::Uuid;

pub async fn run_cli(args: Cli) -> Result<()> {
    let repo = open_store(args.store_path.clone()).await?;
    match args.cmd {
        Command::Deck(cmd) => deck_cmd(repo, cmd).await,
        Command::Card(cmd) => card_cmd(repo, cmd).await,
        Command::Review(cmd) => review_cmd(repo, cmd).await,
        Command::Stats { deck } => stats_cmd(repo, deck).await,
        Command::Progress => progress_cmd(repo).await,
    }
}

async fn open_store(store_path: Option<std::path::PathBuf>) -> Result<Arc<JsonStore>> {
    let store = match store_path {
        Some(path) => {
            let backups = path
                .parent()
                .unwrap_or_else(|| std::path::Path::new("."))
                .join("backups");
            JsonStore::open_with(path, backups, 10).await?
        }
        None => JsonStore::open_default().await?,
    };
    Ok(Arc::new(store))
}

async fn deck_cmd(repo: Arc<JsonStore>, cmd: DeckCmd) -> Result<()> {
    match cmd {
        DeckCmd::Add { title, description } => {
            let d = repo.create_deck(&title, description.as_deref()).await?;
            println!("{}", d.id);
        }
        DeckCmd::List => {
            let mut v = repo.list_decks().await?;
            v.sort_by_key(|d| d.created_at);
            for d in v {
                println!(
                    "{}\t{}\tcards={}\tdue={}",
                    d.id, d.title, d.card_count, d.due_count
                );
            }
        }
        DeckCmd::Rm { deck } => {
            let d = resolve_deck(&*repo, &deck).await?;
            repo.delete_deck(d.id).await?;
            println!("ok");
        }
    }
    Ok(())
}

async fn card_cmd(repo: Arc<JsonStore>, cmd: CardCmd) -> Result<()> {
    match cmd {
        CardCmd::Add(a) => {
            let deck = resolve_deck(&*repo, &a.deck).await?;
            let c = repo.add_card(deck.id, &a.question, &a.answer).await?;
            println!("{}", c.id);
        }
        CardCmd::List { deck } => {
            let deck_id = if let Some(sel) = deck {
                Some(resolve_deck(&*repo, &sel).await?.id)
            } else {
                None
            };
            let mut cards = repo.list_cards(deck_id).await?;
            cards.sort_by_key(|c| c.created_at);
            for c in cards {
                let state = repo.get_review_state(c.id).await?;
                println!(
                    "{}\t{}\t{}\tdeck={}\tdue={}",
                    c.id,
                    c.question,
                    c.answer,
                    c.deck_id,
                    describe_interval(state.interval)
                );
            }
        }
        CardCmd::Rm { card_id } => {
            let id = parse_uuid(&card_id)?;
            repo.delete_card(id).await?;
            println!("ok");
        }
    }
    Ok(())
}

async fn review_cmd(repo: Arc<JsonStore>, cmd: ReviewCmd) -> Result<()> {
    let now = Utc::now();

    let deck_filter = if let Some(sel) = cmd.deck {
        Some(resolve_deck(&*repo, &sel).await?.id)
    } else {
        None
    };

    let due = repo.list_due_cards(deck_filter, now).await?;
    if due.is_empty() {
        println!("no cards due");
        return Ok(());
    }

    let mut service = ReviewService::new(repo.clone());
    service.add_observer(Arc::new(XpAwarder { repo: repo.clone() }));
    let total = due.len().min(cmd.max);
    let mut count = 0usize;

    for card in due.into_iter().take(cmd.max) {
        count += 1;
        let state = repo.get_review_state(card.id).await?;

        println!("\n[{}/{}] {}", count, total, card.id);
        println!("Q: {}", card.question);
        let started = Instant::now();
        prompt_enter("[enter=show]")?;
        println!("A: {}", card.answer);
        println!(
            "[1=again ({}), 2=hard ({}), 3=good ({}), 4=easy ({}), s=skip, q=quit]",
            preview_rating(Rating::Again, state.interval),
            preview_rating(Rating::Hard, state.interval),
            preview_rating(Rating::Good, state.interval),
            preview_rating(Rating::Easy, state.interval),
        );
        let rating = loop {
            let line = read_line("rating> ")?;
            match line.trim().to_lowercase().as_str() {
                "1" | "a" | "again" => break Some(Rating::Again),
                "2" | "h" | "hard" => break Some(Rating::Hard),
                "3" | "g" | "good" => break Some(Rating::Good),
                "4" | "e" | "easy" => break Some(Rating::Easy),
                "s" | "skip" => break None,
                "q" | "quit" => return Ok(()),
                _ => {
                    println!("enter 1/2/3/4, s, or q");
                }
            }
        };

        if let Some(rating) = rating {
            let response_time_ms = started.elapsed().as_millis() as u64;
            let state = service
                .process_review(card.id, rating, response_time_ms)
                .await?;
            println!("→ next due in {}", describe_interval(state.interval));
        }
    }

    println!("\nreviewed {}", count);
    Ok(())
}

async fn stats_cmd(repo: Arc<JsonStore>, deck: Option<String>) -> Result<()> {
    let deck = if let Some(sel) = deck {
        Some(resolve_deck(&*repo, &sel).await?)
    } else {
        None
    };
    let deck_id = deck.as_ref().map(|d| d.id);

    let logs = repo.list_review_logs(deck_id).await?;
    let summary = summarize(&logs);
    println!(
        "reviews={} again={} hard={} good={} easy={}",
        summary.totals.total,
        summary.totals.again,
        summary.totals.hard,
        summary.totals.good,
        summary.totals.easy
    );
    println!("accuracy={:.0}%", summary.totals.accuracy() * 100.0);
    println!("streak={}", daily_streak(&logs, Utc::now().date_naive()));

    if let Some(deck) = deck {
        let cards = repo.list_cards(Some(deck.id)).await?;
        let states = repo.list_review_states(Some(deck.id)).await?;
        let a = deck_analytics(&deck, &cards, &states, &logs);
        println!(
            "cards={} mastered={} learning={} new={} retention={}% avg_ease={:.2}",
            a.total_cards,
            a.mastered_cards,
            a.learning_cards,
            a.new_cards,
            a.retention_rate,
            a.average_ease_factor
        );
    }
    Ok(())
}

async fn progress_cmd(repo: Arc<JsonStore>) -> Result<()> {
    let p = repo.get_progress().await?;
    println!(
        "streak={} longest={} reviewed={}",
        p.current_streak, p.longest_streak, p.total_cards_reviewed
    );
    println!(
        "level={} xp={}/{}",
        p.level, p.xp, p.next_level_xp
    );
    if let Some(d) = p.last_study_date {
        println!("last study: {}", d);
    }
    Ok(())
}

const XP_CORRECT: u32 = 10;
const XP_LAPSE: u32 = 2;

/// Awards XP per processed review; a lapse still earns a little for showing up.
struct XpAwarder {
    repo: Arc<JsonStore>,
}

#[async_trait]
impl ReviewObserver for XpAwarder {
    async fn on_review_processed(&self, log: &ReviewLog) {
        let amount = if log.was_correct { XP_CORRECT } else { XP_LAPSE };
        if let Ok(mut progress) = self.repo.get_progress().await {
            progress.add_xp(amount);
            let _ = self.repo.save_progress(&progress).await;
        }
    }
}

// ===== Helpers =====
fn parse_uuid(s: &str) -> Result<Uuid> {
    Uuid::parse_str(s).map_err(|_| anyhow!("invalid uuid"))
}

async fn resolve_deck<R: Repository + ?Sized>(repo: &R, sel: &str) -> Result<Deck> {
    if let Ok(id) = Uuid::parse_str(sel) {
        if let Ok(d) = repo.get_deck(id).await {
            return Ok(d);
        }
    }
    let decks = repo.list_decks().await?;
    if let Some(d) = decks.into_iter().find(|d| d.title.eq_ignore_ascii_case(sel)) {
        return Ok(d);
    }
    bail!("deck not found: {}", sel)
}

fn prompt_enter(label: &str) -> Result<()> {
    print!("{label}");
    stdout().flush().ok();
    let mut s = String::new();
    stdin().read_line(&mut s)?;
    Ok(())
}

fn read_line(prompt: &str) -> Result<String> {
    print!("{prompt}");
    stdout().flush().ok();
    let mut s = String::new();
    stdin().read_line(&mut s)?;
    Ok(s)
}
