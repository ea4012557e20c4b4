use async_trait::async_trait;
use chrono::{DateTime, Duration, NaiveDate, Utc};
use parking_lot::RwLock;
use recall_core::{
    repo::{Repository, DAILY_STATS_RETENTION_DAYS},
    CardId, CoreError, DailyStats, Deck, DeckId, Flashcard, ReviewLog, ReviewState, UserProgress,
};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};
use std::fs;
use std::io::{Read, Write};
use std::path::{Path, PathBuf};
use tempfile::NamedTempFile;
use tokio::task;

pub mod paths;

const FILE_VERSION: u32 = 1;

#[derive(Clone, Serialize, Deserialize)]
struct FileImage {
    version: u32,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
    decks: Vec<Deck>,
    cards: Vec<Flashcard>,
    states: Vec<ReviewState>,
    logs: Vec<ReviewLog>,
    progress: UserProgress,
    daily_stats: Vec<DailyStats>,
}

#[derive(Clone)]
struct State {
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
    decks: HashMap<DeckId, Deck>,
    cards: HashMap<CardId, Flashcard>,
    states: HashMap<CardId, ReviewState>,
    logs: Vec<ReviewLog>,
    progress: UserProgress,
    daily: BTreeMap<NaiveDate, DailyStats>,
}

impl State {
    fn new_empty() -> Self {
        let now = Utc::now();
        Self {
            created_at: now,
            updated_at: now,
            decks: HashMap::new(),
            cards: HashMap::new(),
            states: HashMap::new(),
            logs: Vec::new(),
            progress: UserProgress::default(),
            daily: BTreeMap::new(),
        }
    }

    fn to_image(&self) -> FileImage {
        FileImage {
            version: FILE_VERSION,
            created_at: self.created_at,
            updated_at: self.updated_at,
            decks: self.decks.values().cloned().collect(),
            cards: self.cards.values().cloned().collect(),
            states: self.states.values().cloned().collect(),
            logs: self.logs.clone(),
            progress: self.progress.clone(),
            daily_stats: self.daily.values().cloned().collect(),
        }
    }

    fn from_image(img: FileImage) -> Self {
        let mut decks = HashMap::new();
        for d in img.decks {
            decks.insert(d.id, d);
        }
        let mut cards = HashMap::new();
        for c in img.cards {
            cards.insert(c.id, c);
        }
        let mut states = HashMap::new();
        for s in img.states {
            states.insert(s.card_id, s);
        }
        let mut daily = BTreeMap::new();
        for ds in img.daily_stats {
            daily.insert(ds.date, ds);
        }
        Self {
            created_at: img.created_at,
            updated_at: img.updated_at,
            decks,
            cards,
            states,
            logs: img.logs,
            progress: img.progress,
            daily,
        }
    }

    fn recount(&mut self, deck_id: DeckId) {
        let now = Utc::now();
        let deck_cards: Vec<CardId> = self
            .cards
            .values()
            .filter(|c| c.deck_id == deck_id)
            .map(|c| c.id)
            .collect();
        let due = deck_cards
            .iter()
            .filter(|id| self.states.get(id).map(|s| s.is_due(now)).unwrap_or(false))
            .count();
        if let Some(deck) = self.decks.get_mut(&deck_id) {
            deck.card_count = deck_cards.len() as u32;
            deck.due_count = due as u32;
            deck.updated_at = now;
        }
    }
}

pub struct JsonStore {
    path: PathBuf,
    backups_dir: PathBuf,
    max_backups: usize,
    state: RwLock<State>,
}

impl JsonStore {
    pub async fn open_default() -> Result<Self, CoreError> {
        let (file, backups) = paths::default_store_file();
        Self::open_with(file, backups, 10).await
    }

    pub async fn open_with(
        path: PathBuf,
        backups_dir: PathBuf,
        max_backups: usize,
    ) -> Result<Self, CoreError> {
        ensure_parent_dirs(&path)?;
        ensure_dir(&backups_dir)?;
        let state = load_or_init(&path).await?;
        Ok(Self {
            path,
            backups_dir,
            max_backups: max_backups.max(1),
            state: RwLock::new(state),
        })
    }

    async fn save(&self) -> Result<(), CoreError> {
        let snapshot = {
            let mut s = self.state.write();
            s.updated_at = Utc::now();
            s.to_image()
        };
        let path = self.path.clone();
        let backups = self.backups_dir.clone();
        let keep = self.max_backups;

        task::spawn_blocking(move || write_with_backup(&path, &backups, keep, &snapshot))
            .await
            .map_err(|_| CoreError::Storage("io"))?
            .map_err(|_| CoreError::Storage("io"))?;
        Ok(())
    }
}

fn ensure_parent_dirs(path: &Path) -> Result<(), CoreError> {
    if let Some(parent) = path.parent() {
        ensure_dir(parent)?;
    }
    Ok(())
}

fn ensure_dir(path: &Path) -> Result<(), CoreError> {
    fs::create_dir_all(path).map_err(|_| CoreError::Storage("io"))
}

async fn load_or_init(path: &Path) -> Result<State, CoreError> {
    if path.exists() {
        let p = path.to_path_buf();
        let img: FileImage = task::spawn_blocking(move || {
            let mut f = fs::File::open(&p)?;
            let mut buf = String::new();
            f.read_to_string(&mut buf)?;
            let v = serde_json::from_str::<FileImage>(&buf)?;
            Ok::<FileImage, std::io::Error>(v)
        })
        .await
        .map_err(|_| CoreError::Storage("io"))
        .and_then(|r| r.map_err(|_| CoreError::Storage("io")))?;
        let mut st = State::from_image(img);
        st.updated_at = Utc::now();
        Ok(st)
    } else {
        let st = State::new_empty();
        let img = st.to_image();
        write_with_backup(path, &path.with_extension("backups"), 1, &img)
            .map_err(|_| CoreError::Storage("io"))?;
        Ok(st)
    }
}

fn write_with_backup(
    path: &Path,
    backups_dir: &Path,
    max_backups: usize,
    img: &FileImage,
) -> Result<(), std::io::Error> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }
    fs::create_dir_all(backups_dir)?;

    let json = serde_json::to_vec_pretty(img).expect("serialize");
    let mut tmp = NamedTempFile::new_in(path.parent().unwrap_or_else(|| Path::new(".")))?;
    tmp.write_all(&json)?;
    tmp.flush()?;
    let _ = fs::remove_file(path);
    tmp.persist(path)?;

    // Backup rotation
    let ts = chrono::Local::now().format("%Y%m%d-%H%M%S");
    let backup_name = format!("recall-{ts}.json");
    let backup_path = backups_dir.join(backup_name);
    let mut btmp = NamedTempFile::new_in(backups_dir)?;
    btmp.write_all(&json)?;
    btmp.flush()?;
    let _ = fs::remove_file(&backup_path);
    btmp.persist(&backup_path)?;

    rotate_backups(backups_dir, max_backups)?;

    Ok(())
}

fn rotate_backups(dir: &Path, keep: usize) -> Result<(), std::io::Error> {
    let mut entries: Vec<_> = fs::read_dir(dir)?
        .filter_map(|e| e.ok())
        .filter(|e| e.path().extension().and_then(|s| s.to_str()) == Some("json"))
        .collect();
    entries.sort_by_key(|e| e.metadata().and_then(|m| m.modified()).ok());
    if entries.len() > keep {
        for e in &entries[0..entries.len() - keep] {
            let _ = fs::remove_file(e.path());
        }
    }
    Ok(())
}

#[async_trait]
impl Repository for JsonStore {
    async fn create_deck(
        &self,
        title: &str,
        description: Option<&str>,
    ) -> Result<Deck, CoreError> {
        let deck = Deck::new(title, description.map(|s| s.to_string()));
        {
            let mut s = self.state.write();
            if s.decks.values().any(|d| d.title.eq_ignore_ascii_case(title)) {
                return Err(CoreError::Conflict("deck title already exists"));
            }
            s.decks.insert(deck.id, deck.clone());
        }
        self.save().await?;
        Ok(deck)
    }

    async fn get_deck(&self, id: DeckId) -> Result<Deck, CoreError> {
        let s = self.state.read();
        s.decks.get(&id).cloned().ok_or(CoreError::NotFound("deck"))
    }

    async fn list_decks(&self) -> Result<Vec<Deck>, CoreError> {
        let s = self.state.read();
        Ok(s.decks.values().cloned().collect())
    }

    async fn delete_deck(&self, id: DeckId) -> Result<(), CoreError> {
        {
            let mut s = self.state.write();
            if s.decks.remove(&id).is_none() {
                return Err(CoreError::NotFound("deck"));
            }
            let to_remove: Vec<CardId> = s
                .cards
                .values()
                .filter(|c| c.deck_id == id)
                .map(|c| c.id)
                .collect();
            for cid in to_remove {
                s.cards.remove(&cid);
                s.states.remove(&cid);
            }
            s.logs.retain(|l| l.deck_id != id);
        }
        self.save().await
    }

    async fn refresh_deck_counts(&self, id: DeckId) -> Result<(), CoreError> {
        {
            let mut s = self.state.write();
            if !s.decks.contains_key(&id) {
                return Err(CoreError::NotFound("deck"));
            }
            s.recount(id);
        }
        self.save().await
    }

    async fn add_card(
        &self,
        deck_id: DeckId,
        question: &str,
        answer: &str,
    ) -> Result<Flashcard, CoreError> {
        let card = {
            let mut s = self.state.write();
            if !s.decks.contains_key(&deck_id) {
                return Err(CoreError::NotFound("deck"));
            }
            let card = Flashcard::new(deck_id, question, answer);
            s.states.insert(card.id, ReviewState::new(card.id));
            s.cards.insert(card.id, card.clone());
            s.recount(deck_id);
            card
        };
        self.save().await?;
        Ok(card)
    }

    async fn get_card(&self, id: CardId) -> Result<Flashcard, CoreError> {
        let s = self.state.read();
        s.cards.get(&id).cloned().ok_or(CoreError::NotFound("card"))
    }

    async fn list_cards(&self, deck_id: Option<DeckId>) -> Result<Vec<Flashcard>, CoreError> {
        let s = self.state.read();
        let mut v: Vec<Flashcard> = s.cards.values().cloned().collect();
        if let Some(did) = deck_id {
            v.retain(|c| c.deck_id == did);
        }
        Ok(v)
    }

    async fn delete_card(&self, id: CardId) -> Result<(), CoreError> {
        {
            let mut s = self.state.write();
            let Some(card) = s.cards.remove(&id) else {
                return Err(CoreError::NotFound("card"));
            };
            s.states.remove(&id);
            s.recount(card.deck_id);
        }
        self.save().await
    }

    async fn get_review_state(&self, card_id: CardId) -> Result<ReviewState, CoreError> {
        let s = self.state.read();
        s.states
            .get(&card_id)
            .cloned()
            .ok_or(CoreError::NotFound("review state"))
    }

    async fn save_review_state(&self, state: &ReviewState) -> Result<(), CoreError> {
        {
            let mut s = self.state.write();
            if !s.states.contains_key(&state.card_id) {
                return Err(CoreError::NotFound("review state"));
            }
            s.states.insert(state.card_id, state.clone());
        }
        self.save().await
    }

    async fn list_review_states(
        &self,
        deck_id: Option<DeckId>,
    ) -> Result<Vec<ReviewState>, CoreError> {
        let s = self.state.read();
        match deck_id {
            None => Ok(s.states.values().cloned().collect()),
            Some(did) => Ok(s
                .states
                .values()
                .filter(|st| {
                    s.cards
                        .get(&st.card_id)
                        .map(|c| c.deck_id == did)
                        .unwrap_or(false)
                })
                .cloned()
                .collect()),
        }
    }

    async fn list_due_cards(
        &self,
        deck_id: Option<DeckId>,
        now: DateTime<Utc>,
    ) -> Result<Vec<Flashcard>, CoreError> {
        let s = self.state.read();
        let mut due: Vec<Flashcard> = s
            .cards
            .values()
            .filter(|c| deck_id.map(|did| c.deck_id == did).unwrap_or(true))
            .filter(|c| s.states.get(&c.id).map(|st| st.is_due(now)).unwrap_or(true))
            .cloned()
            .collect();
        due.sort_by_key(|c| {
            (
                s.states.get(&c.id).map(|st| st.next_review).unwrap_or(now),
                c.created_at,
            )
        });
        Ok(due)
    }

    async fn append_review_log(&self, log: &ReviewLog) -> Result<(), CoreError> {
        {
            let mut s = self.state.write();
            s.logs.push(log.clone());
        }
        self.save().await
    }

    async fn list_review_logs(
        &self,
        deck_id: Option<DeckId>,
    ) -> Result<Vec<ReviewLog>, CoreError> {
        let s = self.state.read();
        Ok(s.logs
            .iter()
            .filter(|l| deck_id.map(|did| l.deck_id == did).unwrap_or(true))
            .cloned()
            .collect())
    }

    async fn get_progress(&self) -> Result<UserProgress, CoreError> {
        let s = self.state.read();
        Ok(s.progress.clone())
    }

    async fn save_progress(&self, progress: &UserProgress) -> Result<(), CoreError> {
        {
            let mut s = self.state.write();
            s.progress = progress.clone();
        }
        self.save().await
    }

    async fn get_daily_stats(&self, date: NaiveDate) -> Result<Option<DailyStats>, CoreError> {
        let s = self.state.read();
        Ok(s.daily.get(&date).cloned())
    }

    async fn upsert_daily_stats(&self, stats: &DailyStats) -> Result<(), CoreError> {
        {
            let mut s = self.state.write();
            s.daily.insert(stats.date, stats.clone());
            let cutoff = stats.date - Duration::days(DAILY_STATS_RETENTION_DAYS);
            s.daily.retain(|d, _| *d >= cutoff);
        }
        self.save().await
    }

    async fn list_daily_stats(&self) -> Result<Vec<DailyStats>, CoreError> {
        let s = self.state.read();
        Ok(s.daily.values().cloned().collect())
    }
}
