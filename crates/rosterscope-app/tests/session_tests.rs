// Session behavior against the shared CSV fixtures and a scripted assistant.

use std::path::PathBuf;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use tokio::sync::mpsc;

use rosterscope_app::Session;
use rosterscope_baseball::filter::{FilterRequest, Span};
use rosterscope_baseball::leaderboard::{GroupKey, SortOrder, OTHER_LABEL};
use rosterscope_baseball::record::{PlayerSeason, Role};
use rosterscope_baseball::stats::StatId;
use rosterscope_baseball::table::TableCache;
use rosterscope_core::config::*;
use rosterscope_llm::client::{Assistant, LlmClient};
use rosterscope_llm::protocol::LlmEvent;

// ===========================================================================
// Helpers
// ===========================================================================

/// Replays a fixed event sequence and records every prompt it receives.
struct Scripted {
    events: Vec<LlmEvent>,
    prompts: Arc<Mutex<Vec<String>>>,
}

#[async_trait]
impl Assistant for Scripted {
    async fn stream(&self, prompt: &str, tx: mpsc::Sender<LlmEvent>) -> anyhow::Result<()> {
        self.prompts.lock().unwrap().push(prompt.to_string());
        for event in &self.events {
            let _ = tx.send(event.clone()).await;
        }
        Ok(())
    }
}

/// Fails before producing any event.
struct Broken;

#[async_trait]
impl Assistant for Broken {
    async fn stream(&self, _prompt: &str, _tx: mpsc::Sender<LlmEvent>) -> anyhow::Result<()> {
        anyhow::bail!("connection reset")
    }
}

fn fixtures_dir() -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("../rosterscope-baseball/tests/fixtures")
}

fn test_config(history_limit: usize) -> Config {
    Config {
        base_dir: fixtures_dir(),
        data_paths: DataPaths {
            pitchers: "pitchers.csv".to_string(),
            hitters: "hitters.csv".to_string(),
        },
        leaderboard: LeaderboardConfig {
            top_n: 5,
            min_pa: 50.0,
            min_ip: 40.0,
            legend_top_k: 1,
        },
        filters: FilterDefaults::default(),
        assistant: AssistantConfig {
            endpoint: "http://127.0.0.1:9".to_string(),
            model: "grok-beta".to_string(),
            temperature: 0.5,
            max_tokens: 100,
            timeout_secs: 5,
            history_limit,
            sample_rows: 3,
        },
        credentials: CredentialsConfig::default(),
    }
}

fn session_with(assistant: Box<dyn Assistant>, history_limit: usize) -> Session {
    let opened = Session::open(test_config(history_limit), &mut TableCache::new()).unwrap();
    Session::new(test_config(history_limit), Arc::clone(opened.table()), assistant)
}

fn scripted(text: &str) -> (Box<dyn Assistant>, Arc<Mutex<Vec<String>>>) {
    let prompts = Arc::new(Mutex::new(Vec::new()));
    let assistant = Scripted {
        events: vec![
            LlmEvent::Token { text: text.to_string() },
            LlmEvent::Complete { full_text: text.to_string() },
        ],
        prompts: Arc::clone(&prompts),
    };
    (Box::new(assistant), prompts)
}

fn last_names(rows: &[&PlayerSeason]) -> Vec<String> {
    rows.iter().map(|r| r.last_name.clone()).collect()
}

fn ohio() -> FilterRequest {
    FilterRequest {
        states: vec!["OH".into()],
        ..Default::default()
    }
}

// ===========================================================================
// Table lifecycle
// ===========================================================================

#[test]
fn open_loads_fixtures_and_reuses_cached_table() {
    let mut cache = TableCache::new();
    let first = Session::open(test_config(10), &mut cache).unwrap();
    let second = Session::open(test_config(10), &mut cache).unwrap();

    assert_eq!(first.table().len(), 15);
    assert!(Arc::ptr_eq(first.table(), second.table()));
}

#[test]
fn open_reports_missing_data() {
    let mut config = test_config(10);
    config.data_paths.pitchers = "does-not-exist.csv".to_string();
    let err = Session::open(config, &mut TableCache::new()).err().unwrap();
    assert!(format!("{err:#}").contains("failed to load player data"));
}

// ===========================================================================
// Views
// ===========================================================================

#[test]
fn invalid_request_is_an_error() {
    let session = session_with(Box::new(LlmClient::Disabled), 10);
    let request = FilterRequest {
        years: Some(Span::new(2023, 2021)),
        ..Default::default()
    };
    assert!(session.filter(&request).is_err());
}

#[test]
fn draft_rounds_beyond_configured_limit_are_rejected() {
    let session = session_with(Box::new(LlmClient::Disabled), 10);
    let too_far = FilterRequest {
        draft_rounds: Some(Span::new(1, 71)),
        ..Default::default()
    };
    let err = session.filter(&too_far).err().unwrap();
    assert!(format!("{err:#}").contains("beyond the last round (70)"));

    let whole_draft = FilterRequest {
        draft_rounds: Some(Span::new(1, 70)),
        ..Default::default()
    };
    assert!(session.filter(&whole_draft).is_ok());
}

#[test]
fn hitting_rate_leaders_need_plate_appearances() {
    let session = session_with(Box::new(LlmClient::Disabled), 10);
    let leaders = session
        .leaders(&FilterRequest::default(), StatId::T90PerPa, None, None)
        .unwrap();

    assert_eq!(leaders[0].last_name, "Hale");
    assert!(leaders.len() <= 5);
    assert!(leaders.iter().all(|r| r.role == Role::Hitter));
    assert!(!last_names(&leaders).contains(&"Carver".to_string()));
}

#[test]
fn era_leaders_are_ascending_and_need_innings() {
    let session = session_with(Box::new(LlmClient::Disabled), 10);
    let leaders = session
        .leaders(&FilterRequest::default(), StatId::Era, Some(3), None)
        .unwrap();
    // Okafor (33.1 IP) and Reyes (22 IP) fall short of 40 innings.
    assert_eq!(last_names(&leaders), vec!["Carver", "Ames", "Haskins"]);

    let worst = session
        .leaders(
            &FilterRequest::default(),
            StatId::Era,
            Some(1),
            Some(SortOrder::Descending),
        )
        .unwrap();
    assert_eq!(last_names(&worst), vec!["Brandt"]);
}

#[test]
fn legend_respects_filter_and_fold() {
    let session = session_with(Box::new(LlmClient::Disabled), 10);
    let request = FilterRequest {
        years: Some(Span::new(2023, 2023)),
        ..Default::default()
    };
    let legend = session
        .legend(&request, GroupKey::Role, GroupKey::Team, None)
        .unwrap();

    let total: usize = legend.iter().map(|e| e.count).sum();
    assert_eq!(total, session.filter(&request).unwrap().len());
    assert!(legend.iter().any(|e| e.inner == OTHER_LABEL));
}

#[test]
fn export_writes_header_and_rows() {
    let session = session_with(Box::new(LlmClient::Disabled), 10);
    let path = std::env::temp_dir().join("rosterscope_session_export.csv");
    let _ = std::fs::remove_file(&path);

    let written = session.export(&ohio(), &path).unwrap();
    assert_eq!(written, 4);

    let text = std::fs::read_to_string(&path).unwrap();
    assert_eq!(text.lines().count(), 5);
    assert!(text.starts_with("firstname,lastname,role"));
    let _ = std::fs::remove_file(&path);
}

// ===========================================================================
// Assistant
// ===========================================================================

#[tokio::test]
async fn prompt_summarizes_filtered_view_only() {
    let (assistant, prompts) = scripted("Two pitchers, two hitters.");
    let mut session = session_with(assistant, 10);

    let exchange = session
        .ask("  What does Ohio look like? ", &ohio(), |_| {})
        .await
        .unwrap();

    assert_eq!(exchange.question, "What does Ohio look like?");
    assert_eq!(exchange.answer, "Two pitchers, two hitters.");
    assert!(!exchange.failed);

    let prompts = prompts.lock().unwrap();
    let prompt = &prompts[0];
    assert!(prompt.starts_with("Current filtered data: 4 players.\n"));
    assert!(prompt.contains("Role breakdown: Hitter: 2, Pitcher: 2\n"));
    assert!(prompt.contains("Year range: 2022 - 2023\n"));
    assert!(prompt.contains("Sample player names: Eli Brandt, Reid Okafor, Kyle Dunn\n"));
    assert!(prompt.contains("Question: What does Ohio look like?\n"));
}

#[tokio::test]
async fn tokens_reach_the_callback() {
    let prompts = Arc::new(Mutex::new(Vec::new()));
    let assistant = Scripted {
        events: vec![
            LlmEvent::Token { text: "Hale".into() },
            LlmEvent::Token { text: " leads.".into() },
            LlmEvent::Complete { full_text: "Hale leads.".into() },
        ],
        prompts,
    };
    let mut session = session_with(Box::new(assistant), 10);

    let mut streamed = String::new();
    let exchange = session
        .ask("Who leads?", &FilterRequest::default(), |t| streamed.push_str(t))
        .await
        .unwrap();
    assert_eq!(streamed, "Hale leads.");
    assert_eq!(exchange.answer, streamed);
}

#[tokio::test]
async fn assistant_failure_is_recorded_not_raised() {
    let mut session = session_with(Box::new(Broken), 10);

    let exchange = session
        .ask("Anything?", &FilterRequest::default(), |_| {})
        .await
        .unwrap();
    assert!(exchange.failed);
    assert!(exchange.answer.contains("connection reset"));
    assert_eq!(session.conversation().len(), 1);

    // The pipeline is untouched.
    assert_eq!(session.filter(&ohio()).unwrap().len(), 4);
}

#[tokio::test]
async fn disabled_assistant_answers_inline() {
    let mut session = session_with(Box::new(LlmClient::Disabled), 10);
    let exchange = session
        .ask("Anything?", &FilterRequest::default(), |_| {})
        .await
        .unwrap();
    assert!(exchange.failed);
    assert_eq!(exchange.answer, "assistant not configured");
}

#[tokio::test]
async fn history_is_bounded() {
    let (assistant, _) = scripted("ok");
    let mut session = session_with(assistant, 2);

    for q in ["first", "second", "third"] {
        session.ask(q, &FilterRequest::default(), |_| {}).await.unwrap();
    }

    let questions: Vec<_> = session
        .conversation()
        .iter()
        .map(|e| e.question.clone())
        .collect();
    assert_eq!(questions, vec!["second", "third"]);
}

#[tokio::test]
async fn history_accumulates_across_questions_and_clears() {
    let (assistant, prompts) = scripted("ok");
    let mut session = session_with(assistant, 10);

    session.ask("first", &ohio(), |_| {}).await.unwrap();
    session.ask("second", &FilterRequest::default(), |_| {}).await.unwrap();

    assert_eq!(session.conversation().len(), 2);
    assert_eq!(session.conversation().latest().unwrap().question, "second");
    assert_eq!(prompts.lock().unwrap().len(), 2);

    session.clear_history();
    assert!(session.conversation().is_empty());
}

#[tokio::test]
async fn empty_question_is_rejected() {
    let (assistant, prompts) = scripted("unused");
    let mut session = session_with(assistant, 10);

    assert!(session
        .ask("   ", &FilterRequest::default(), |_| {})
        .await
        .is_err());
    assert!(session.conversation().is_empty());
    assert!(prompts.lock().unwrap().is_empty());
}
